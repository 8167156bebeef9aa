//! Fire-and-forget notifications for achievement tracking and audio
//!
//! The model queues notifications during a tick; the host drains them and
//! forwards them to whatever sink it runs (achievements, sound).

use super::entity::{EnemyKind, PlayerId};

/// Sound cue names
pub mod sounds {
    pub const SHOOT: &str = "shoot";
    pub const ENEMY_EXPLOSION: &str = "enemy_explosion";
    pub const PLAYER_EXPLOSION: &str = "player_explosion";
    pub const ITEM_PICKUP: &str = "item_pickup";
    pub const BOSS_PHASE: &str = "boss_phase";
    pub const BOSS_EXPLOSION: &str = "boss_explosion";
    pub const LEVEL_COMPLETE: &str = "level_complete";
    pub const GAME_OVER: &str = "game_over";
}

/// What was taken down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Defeated {
    Ship(EnemyKind),
    Minion,
    Boss,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Notification {
    ShotFired { player: PlayerId },
    EnemyDefeated { defeated: Defeated, by: PlayerId },
    /// Whole seconds since the level attempt started
    ElapsedSeconds(u64),
    AchievementUnlocked(String),
    PlaySound(&'static str),
}

/// Receiver for drained notifications
pub trait NotificationSink {
    fn notify(&mut self, notification: Notification);
}

impl NotificationSink for Vec<Notification> {
    fn notify(&mut self, notification: Notification) {
        self.push(notification);
    }
}

/// Forwards everything to the log
#[derive(Debug, Default)]
pub struct LogSink;

impl NotificationSink for LogSink {
    fn notify(&mut self, notification: Notification) {
        match notification {
            Notification::AchievementUnlocked(name) => log::info!("Achievement unlocked: {name}"),
            other => log::trace!("{other:?}"),
        }
    }
}
