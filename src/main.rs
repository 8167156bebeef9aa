//! Star Barrage headless runner
//!
//! Plays the level set with a simple autopilot and logs what happens.

use std::path::PathBuf;
use std::thread;
use std::time::Duration;

use anyhow::{Context, Result};
use clap::Parser;

use star_barrage::consts::*;
use star_barrage::sim::{
    Clock, GameModel, GameState, LogSink, NotificationSink, PlayerId, PlayerInput, SystemClock,
    TickInput, tick,
};
use star_barrage::{Millis, SessionConfig, load_levels_or_default};

/// Give up on a level after this many ticks (about three minutes)
const MAX_TICKS_PER_LEVEL: u64 = 11_250;

/// Clock that advances exactly one tick per call, for runs without sleeping
#[derive(Debug, Default)]
struct SteppedClock {
    now: std::cell::Cell<Millis>,
}

impl Clock for SteppedClock {
    fn now_ms(&self) -> Millis {
        let now = self.now.get() + TICK_MS;
        self.now.set(now);
        now
    }
}

#[derive(Parser, Debug)]
#[command(name = "star-barrage")]
#[command(about = "Headless Star Barrage runner driven by a simple autopilot")]
struct Cli {
    /// JSON level file; the built-in levels are used when absent or invalid
    levels: Option<PathBuf>,
    /// Step the clock one tick per frame instead of sleeping
    #[arg(long)]
    fast: bool,
    /// Add player two
    #[arg(long)]
    two_player: bool,
    /// Suppress sound notifications
    #[arg(long)]
    mute: bool,
}

/// Steer under the nearest live enemy and keep firing
fn autopilot(model: &GameModel, id: PlayerId) -> PlayerInput {
    let Some(ship) = model.player(id).filter(|s| s.is_alive()) else {
        return PlayerInput::default();
    };
    let x = ship.entity.center().x;
    let target = match model.boss() {
        Some(boss) if !boss.destroyed => Some(boss.entity.center().x),
        _ => model
            .formation()
            .live_ships()
            .map(|(_, enemy)| enemy.entity.center().x)
            .min_by(|a, b| (a - x).abs().total_cmp(&(b - x).abs())),
    };
    let dx = target.map_or(0.0, |t| t - x);
    PlayerInput {
        left: dx < -2.0,
        right: dx > 2.0,
        shoot: true,
    }
}

fn main() -> Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let json = match &cli.levels {
        Some(path) => Some(
            std::fs::read_to_string(path)
                .with_context(|| format!("Failed to read level file {}", path.display()))?,
        ),
        None => None,
    };
    let levels = load_levels_or_default(json.as_deref());
    log::info!("Star Barrage starting with {} levels", levels.len());

    let clock: Box<dyn Clock> = if cli.fast {
        Box::new(SteppedClock::default())
    } else {
        Box::new(SystemClock::default())
    };
    let mut sink = LogSink;
    let mut state = GameState::new(cli.two_player);
    let mut config = SessionConfig {
        muted: cli.mute,
        ..Default::default()
    };

    for (round, level) in levels.into_iter().enumerate() {
        let number = level.level;
        let seed = clock.now_ms() ^ (round as u64).wrapping_mul(0x9E37_79B9_7F4A_7C15);
        let mut model = GameModel::new(&state, level, config, seed, clock.now_ms());

        while !model.phase().is_finished() && model.time_ticks() < MAX_TICKS_PER_LEVEL {
            let input = TickInput {
                players: [
                    autopilot(&model, PlayerId::One),
                    autopilot(&model, PlayerId::Two),
                ],
            };
            tick(&mut model, &input, clock.now_ms());
            for notification in model.drain_notifications() {
                sink.notify(notification);
            }
            if !cli.fast {
                thread::sleep(Duration::from_millis(TICK_MS));
            }
        }

        state = model.snapshot();
        println!(
            "Level {number}: {:?} after {} ticks, score {} coins {}",
            model.phase(),
            model.time_ticks(),
            state.score,
            state.coins
        );
        if !model.is_level_complete() {
            break;
        }
        state.level += 1;
        config = model.into_config();
    }

    println!(
        "Final score {} ({} ships destroyed, {} bullets fired)",
        state.score, state.ships_destroyed, state.bullets_shot
    );
    Ok(())
}
