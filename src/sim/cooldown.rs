//! Cooldown timers
//!
//! Two flavors that must not be mixed up:
//! - `Cooldown` measures wall-clock milliseconds supplied by the caller
//! - `TickCooldown` counts simulation ticks (formation cadence)

use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;

use crate::Millis;

/// Source of wall-clock time for the runner
pub trait Clock {
    fn now_ms(&self) -> Millis;
}

/// Monotonic clock anchored at construction
#[derive(Debug, Clone)]
pub struct SystemClock {
    origin: std::time::Instant,
}

impl Default for SystemClock {
    fn default() -> Self {
        Self {
            origin: std::time::Instant::now(),
        }
    }
}

impl Clock for SystemClock {
    fn now_ms(&self) -> Millis {
        self.origin.elapsed().as_millis() as Millis
    }
}

/// Wall-clock gate: finished once `duration` has passed since the last reset.
/// A cooldown that was never reset is finished.
#[derive(Debug, Clone)]
pub struct Cooldown {
    duration: Millis,
    variance: Millis,
    /// Duration rolled at the last reset
    current: Millis,
    started_at: Option<Millis>,
    /// Only present when variance > 0
    rng: Option<Pcg32>,
}

impl Cooldown {
    pub fn new(duration: Millis) -> Self {
        Self {
            duration,
            variance: 0,
            current: duration,
            started_at: None,
            rng: None,
        }
    }

    /// Duration re-rolled within `duration ± variance` on every reset
    pub fn with_variance(duration: Millis, variance: Millis, seed: u64) -> Self {
        let variance = variance.min(duration);
        Self {
            duration,
            variance,
            current: duration,
            started_at: None,
            rng: (variance > 0).then(|| Pcg32::seed_from_u64(seed)),
        }
    }

    /// Restart the timer from `now`
    pub fn reset(&mut self, now: Millis) {
        self.started_at = Some(now);
        self.current = match self.rng.as_mut() {
            Some(rng) => {
                let low = self.duration - self.variance;
                let high = self.duration + self.variance;
                rng.random_range(low..=high)
            }
            None => self.duration,
        };
    }

    pub fn is_finished(&self, now: Millis) -> bool {
        match self.started_at {
            Some(start) => now >= start + self.current,
            None => true,
        }
    }

    /// Started and not yet finished
    pub fn is_running(&self, now: Millis) -> bool {
        self.started_at.is_some() && !self.is_finished(now)
    }

    /// Forget the last reset so the cooldown reads as finished
    pub fn clear(&mut self) {
        self.started_at = None;
    }

    pub fn duration(&self) -> Millis {
        self.duration
    }

    /// Duration in effect since the last reset
    pub fn current_duration(&self) -> Millis {
        self.current
    }
}

/// Tick-counted gate: finished once `tick()` was called `threshold` times
#[derive(Debug, Clone)]
pub struct TickCooldown {
    threshold: u32,
    count: u32,
}

impl TickCooldown {
    pub fn new(threshold: u32) -> Self {
        Self {
            threshold,
            count: 0,
        }
    }

    pub fn tick(&mut self) {
        self.count = self.count.saturating_add(1);
    }

    pub fn is_finished(&self) -> bool {
        self.count >= self.threshold
    }

    pub fn reset(&mut self) {
        self.count = 0;
    }

    /// Change the threshold without touching the accumulated count
    pub fn set_threshold(&mut self, threshold: u32) {
        self.threshold = threshold;
    }

    pub fn threshold(&self) -> u32 {
        self.threshold
    }
}
