//! Star Barrage - simulation core of a two-player vertical shoot-'em-up
//!
//! Core modules:
//! - `sim`: Deterministic simulation (formation, bosses, collisions, scoring)
//! - `settings`: Session configuration (upgrades, mute, time-freeze)
//! - `level`: Level descriptors and the built-in level set

pub mod level;
pub mod settings;
pub mod sim;

pub use level::{LevelDescriptor, default_levels, load_levels_or_default};
pub use settings::{SessionConfig, ShipUpgrades};

/// Milliseconds on the caller's wall clock
pub type Millis = u64;

/// Game configuration constants
pub mod consts {
    /// Fixed simulation cadence (60 ticks per second)
    pub const TICK_MS: u64 = 16;

    /// Playfield dimensions
    pub const SCREEN_WIDTH: i32 = 448;
    pub const SCREEN_HEIGHT: i32 = 520;
    /// Top of the HUD-free playfield; formation never rises above it
    pub const TOP_MARGIN: i32 = 60;
    /// The formation never descends below this line
    pub const SEPARATION_LINE_HEIGHT: i32 = 400;
    pub const SIDE_MARGIN: i32 = 20;
    /// Bottom edge of the band bosses roam in
    pub const BOSS_ZONE_BOTTOM: i32 = 260;

    /// Player ship defaults
    pub const PLAYER_WIDTH: i32 = 26;
    pub const PLAYER_HEIGHT: i32 = 16;
    pub const PLAYER_Y: i32 = SCREEN_HEIGHT - 60;
    pub const PLAYER_SPEED: i32 = 3;
    pub const INITIAL_LIVES: u8 = 3;
    pub const MAX_LIVES: u8 = 5;
    pub const SHOOTING_INTERVAL_MS: u64 = 750;
    pub const RESPAWN_MS: u64 = 1000;
    pub const INVINCIBILITY_MS: u64 = 2000;

    /// Bullets
    pub const BULLET_WIDTH: i32 = 3;
    pub const BULLET_HEIGHT: i32 = 10;
    /// Player bullets travel up (negative)
    pub const PLAYER_BULLET_SPEED: i32 = -6;
    /// Enemy bullets travel down (positive)
    pub const ENEMY_BULLET_SPEED: i32 = 4;

    /// Enemy ships
    pub const SHIP_WIDTH: i32 = 24;
    pub const SHIP_HEIGHT: i32 = 16;
    pub const EXPLOSION_MS: u64 = 500;

    /// Special roamer
    pub const SPECIAL_WIDTH: i32 = 32;
    pub const SPECIAL_HEIGHT: i32 = 14;
    pub const SPECIAL_Y: i32 = TOP_MARGIN - 30;
    pub const SPECIAL_SPEED: i32 = 2;
    pub const SPECIAL_INTERVAL_MS: u64 = 20_000;
    pub const SPECIAL_VARIANCE_MS: u64 = 5_000;

    /// Drop items
    pub const ITEM_WIDTH: i32 = 12;
    pub const ITEM_HEIGHT: i32 = 12;
    pub const ITEM_SPEED: i32 = 2;
    pub const SHIELD_MS: u64 = 5_000;
    pub const FREEZE_MS: u64 = 4_000;
    pub const PUSH_DISTANCE: i32 = 40;
    pub const EXPLODE_RADIUS: f32 = 100.0;

    /// Level completion bonus per life beyond the last one
    pub const LIFE_BONUS_POINTS: u64 = 100;
}

/// Center of an axis-aligned box given by its top-left corner and size
#[inline]
pub fn center_of(x: i32, y: i32, width: i32, height: i32) -> glam::Vec2 {
    glam::Vec2::new(
        x as f32 + width as f32 / 2.0,
        y as f32 + height as f32 / 2.0,
    )
}
