//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed tick cadence, wall-clock time passed in by the caller
//! - Seeded RNG only
//! - Stable iteration order (arena index order)
//! - No rendering or platform dependencies

pub mod boss;
pub mod collision;
pub mod cooldown;
pub mod entity;
pub mod events;
pub mod formation;
pub mod pool;
pub mod render;
pub mod state;
pub mod tick;

pub use boss::{Boss, BossKind, Minion, PatternKind, Telegraph};
pub use collision::collides;
pub use cooldown::{Clock, Cooldown, SystemClock, TickCooldown};
pub use entity::{
    Bounded, Bullet, Color, DropItem, EnemyKind, EnemyShip, Entity, ItemKind, PlayerId,
    PlayerShip, Rect, SpriteKind,
};
pub use events::{Defeated, LogSink, Notification, NotificationSink};
pub use formation::{Direction, Formation};
pub use pool::{Handle, Pool};
pub use render::{RenderItem, render_list};
pub use state::{GameModel, GamePhase, GameState};
pub use tick::{PlayerInput, TickInput, tick};
