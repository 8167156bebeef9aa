//! Session configuration
//!
//! Process-wide knobs that outlive a single level attempt: shop upgrades,
//! sound mute and the shared time-freeze deadline. Owned by the `GameModel`
//! for the duration of an attempt and handed back when it ends.

use serde::{Deserialize, Serialize};

use crate::Millis;
use crate::consts::*;

/// Stat multipliers bought in the shop. Read-only to the simulation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ShipUpgrades {
    /// Bullets emitted per shot
    pub bullet_count: u32,
    /// Horizontal gap between bullets of one shot (pixels)
    pub bullet_spacing: i32,
    /// Fraction shaved off the shooting interval (0.0 - 0.9)
    pub fire_rate_reduction: f32,
    /// Extra enemies a bullet may pass through
    pub penetration_cap: u32,
    /// Bullet speed multiplier
    pub bullet_speed: f32,
    /// Ship movement speed multiplier
    pub ship_speed: f32,
}

impl Default for ShipUpgrades {
    fn default() -> Self {
        Self {
            bullet_count: 1,
            bullet_spacing: 8,
            fire_rate_reduction: 0.0,
            penetration_cap: 0,
            bullet_speed: 1.0,
            ship_speed: 1.0,
        }
    }
}

impl ShipUpgrades {
    /// Shooting interval after the fire-rate reduction
    pub fn shooting_interval(&self) -> Millis {
        let reduction = self.fire_rate_reduction.clamp(0.0, 0.9);
        (SHOOTING_INTERVAL_MS as f32 * (1.0 - reduction)).round() as Millis
    }

    /// Signed vertical speed of a player bullet
    pub fn bullet_velocity(&self) -> i32 {
        ((PLAYER_BULLET_SPEED as f32) * self.bullet_speed.max(0.1)).round() as i32
    }

    /// Horizontal ship speed per tick
    pub fn movement_speed(&self) -> i32 {
        ((PLAYER_SPEED as f32) * self.ship_speed.max(0.1)).round().max(1.0) as i32
    }

    /// Horizontal offsets of each bullet in a shot, centered on the ship
    pub fn bullet_offsets(&self) -> Vec<i32> {
        let count = self.bullet_count.max(1) as i32;
        let span = (count - 1) * self.bullet_spacing;
        (0..count)
            .map(|i| i * self.bullet_spacing - span / 2)
            .collect()
    }
}

/// Session configuration context
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct SessionConfig {
    pub upgrades: ShipUpgrades,
    /// Suppresses sound notifications
    pub muted: bool,
    /// Shared time-freeze deadline. Whichever item set it, one deadline
    /// gates all non-special enemy movement.
    #[serde(skip)]
    pub freeze_until: Option<Millis>,
}

impl SessionConfig {
    pub fn new(upgrades: ShipUpgrades) -> Self {
        Self {
            upgrades,
            ..Default::default()
        }
    }

    /// Clear transient state at the start of a session
    pub fn reset(&mut self) {
        self.freeze_until = None;
    }

    /// Start (or restart) the time-freeze
    pub fn freeze(&mut self, now: Millis) {
        self.freeze_until = Some(now + FREEZE_MS);
    }

    /// Whether the freeze is active; clears it once the deadline has passed
    pub fn update_freeze(&mut self, now: Millis) -> bool {
        match self.freeze_until {
            Some(deadline) if now < deadline => true,
            Some(_) => {
                self.freeze_until = None;
                log::debug!("Time-freeze expired at {now}ms");
                false
            }
            None => false,
        }
    }

    pub fn is_frozen(&self, now: Millis) -> bool {
        self.freeze_until.is_some_and(|deadline| now < deadline)
    }
}
