//! Entities and their bounding boxes
//!
//! Positions are top-left corners in integer pixels. Collision works on the
//! floating-point `Rect` view so sub-pixel projectiles compare exactly.

use glam::Vec2;
use rand::Rng;
use serde::{Deserialize, Serialize};

use super::cooldown::Cooldown;
use crate::Millis;
use crate::consts::*;

/// Floating-point box used by collision and pattern geometry
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rect {
    pub x: f32,
    pub y: f32,
    pub width: f32,
    pub height: f32,
}

impl Rect {
    pub fn new(x: f32, y: f32, width: f32, height: f32) -> Self {
        Self {
            x,
            y,
            width,
            height,
        }
    }

    pub fn center(&self) -> Vec2 {
        Vec2::new(self.x + self.width / 2.0, self.y + self.height / 2.0)
    }
}

/// Anything with a bounding box
pub trait Bounded {
    fn rect(&self) -> Rect;
}

impl Bounded for Rect {
    fn rect(&self) -> Rect {
        *self
    }
}

/// RGB tint applied on top of a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Color(pub u8, pub u8, pub u8);

impl Color {
    pub const WHITE: Color = Color(255, 255, 255);
    pub const GREEN: Color = Color(60, 220, 90);
    pub const CYAN: Color = Color(70, 200, 230);
    pub const RED: Color = Color(230, 60, 60);
    pub const ORANGE: Color = Color(240, 150, 40);
    pub const PURPLE: Color = Color(160, 80, 220);
    pub const YELLOW: Color = Color(240, 220, 60);
}

/// Visual tag the presentation layer maps to a sprite
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SpriteKind {
    Player1,
    Player2,
    Squid,
    Crab,
    Octopus,
    Tank,
    Special,
    Explosion,
    PlayerBullet,
    EnemyBullet,
    BossBullet,
    Boss,
    Minion,
    Item(ItemKind),
}

/// Position, size and visual tag shared by every entity
#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
    pub sprite: SpriteKind,
    pub color: Option<Color>,
}

impl Entity {
    pub fn new(x: i32, y: i32, width: i32, height: i32, sprite: SpriteKind) -> Self {
        Self {
            x,
            y,
            width,
            height,
            sprite,
            color: None,
        }
    }

    pub fn center(&self) -> Vec2 {
        crate::center_of(self.x, self.y, self.width, self.height)
    }

    /// Move so the box is centered on `center`
    pub fn set_center(&mut self, center: Vec2) {
        self.x = (center.x - self.width as f32 / 2.0).round() as i32;
        self.y = (center.y - self.height as f32 / 2.0).round() as i32;
    }

    /// Fully outside the playfield
    pub fn is_off_screen(&self) -> bool {
        self.y + self.height < 0
            || self.y > SCREEN_HEIGHT
            || self.x + self.width < 0
            || self.x > SCREEN_WIDTH
    }
}

impl Bounded for Entity {
    fn rect(&self) -> Rect {
        Rect::new(
            self.x as f32,
            self.y as f32,
            self.width as f32,
            self.height as f32,
        )
    }
}

/// Player slot
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PlayerId {
    One,
    Two,
}

impl PlayerId {
    pub fn index(self) -> usize {
        match self {
            PlayerId::One => 0,
            PlayerId::Two => 1,
        }
    }

    pub fn from_index(index: usize) -> Self {
        if index == 1 { PlayerId::Two } else { PlayerId::One }
    }
}

/// What a penetrating bullet already hit, so it is not counted twice
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TargetId {
    Formation(usize),
    Special(usize),
    Boss,
    Minion(u32),
}

/// A projectile. Negative speed travels up (players), positive down (enemies).
#[derive(Debug, Clone, PartialEq)]
pub struct Bullet {
    pub entity: Entity,
    pub speed: i32,
    /// `None` for neutral/legacy bullets, scored to player one
    pub owner: Option<PlayerId>,
    pub penetration_count: u32,
    pub penetration_cap: u32,
    /// Set once the bullet has spent its last hit
    pub spent: bool,
    hits: Vec<TargetId>,
}

impl Bullet {
    pub fn new(x: i32, y: i32, speed: i32, owner: Option<PlayerId>, penetration_cap: u32) -> Self {
        let sprite = if speed < 0 {
            SpriteKind::PlayerBullet
        } else {
            SpriteKind::EnemyBullet
        };
        Self {
            entity: Entity::new(x, y, BULLET_WIDTH, BULLET_HEIGHT, sprite),
            speed,
            owner,
            penetration_count: 0,
            penetration_cap,
            spent: false,
            hits: Vec::new(),
        }
    }

    pub fn is_player_bullet(&self) -> bool {
        self.speed < 0
    }

    pub fn update(&mut self) {
        self.entity.y += self.speed;
    }

    pub fn has_hit(&self, target: TargetId) -> bool {
        self.hits.contains(&target)
    }

    /// Record a hit. Returns true once the bullet is spent and must be
    /// recycled; the counter never exceeds the cap.
    pub fn register_hit(&mut self, target: TargetId) -> bool {
        self.hits.push(target);
        if self.penetration_count < self.penetration_cap {
            self.penetration_count += 1;
        } else {
            self.spent = true;
        }
        self.spent
    }
}

/// Formation and roamer enemy tiers
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EnemyKind {
    Tank,
    Squid,
    Crab,
    Octopus,
    Special,
}

impl EnemyKind {
    pub fn points(self) -> u32 {
        match self {
            EnemyKind::Tank => 40,
            EnemyKind::Squid => 30,
            EnemyKind::Crab => 20,
            EnemyKind::Octopus => 10,
            EnemyKind::Special => 100,
        }
    }

    pub fn health(self) -> u32 {
        match self {
            EnemyKind::Tank => 2,
            _ => 1,
        }
    }

    pub fn sprite(self) -> SpriteKind {
        match self {
            EnemyKind::Tank => SpriteKind::Tank,
            EnemyKind::Squid => SpriteKind::Squid,
            EnemyKind::Crab => SpriteKind::Crab,
            EnemyKind::Octopus => SpriteKind::Octopus,
            EnemyKind::Special => SpriteKind::Special,
        }
    }
}

/// An enemy ship in the formation or a lateral roamer
#[derive(Debug, Clone)]
pub struct EnemyShip {
    pub entity: Entity,
    pub kind: EnemyKind,
    pub points: u32,
    pub health: u32,
    pub destroyed: bool,
    explosion: Cooldown,
    /// Signed horizontal speed for roamers
    pub lateral_speed: Option<i32>,
}

impl EnemyShip {
    pub fn new(x: i32, y: i32, kind: EnemyKind) -> Self {
        Self {
            entity: Entity::new(x, y, SHIP_WIDTH, SHIP_HEIGHT, kind.sprite()),
            kind,
            points: kind.points(),
            health: kind.health(),
            destroyed: false,
            explosion: Cooldown::new(EXPLOSION_MS),
            lateral_speed: None,
        }
    }

    /// A special roamer entering from one side
    pub fn roamer(from_left: bool) -> Self {
        let x = if from_left {
            -SPECIAL_WIDTH
        } else {
            SCREEN_WIDTH
        };
        let speed = if from_left {
            SPECIAL_SPEED
        } else {
            -SPECIAL_SPEED
        };
        let mut ship = Self::new(x, SPECIAL_Y, EnemyKind::Special);
        ship.entity.width = SPECIAL_WIDTH;
        ship.entity.height = SPECIAL_HEIGHT;
        ship.lateral_speed = Some(speed);
        ship
    }

    pub fn is_alive(&self) -> bool {
        !self.destroyed
    }

    /// Apply one hit; returns true if it was lethal
    pub fn hit(&mut self, now: Millis) -> bool {
        if self.destroyed {
            return false;
        }
        self.health = self.health.saturating_sub(1);
        if self.health == 0 {
            self.destroy(now);
            true
        } else {
            false
        }
    }

    /// Flip to the exploding state
    pub fn destroy(&mut self, now: Millis) {
        self.destroyed = true;
        self.health = 0;
        self.entity.sprite = SpriteKind::Explosion;
        self.explosion.reset(now);
    }

    /// Destroyed and the explosion has played out
    pub fn is_removable(&self, now: Millis) -> bool {
        self.destroyed && self.explosion.is_finished(now)
    }

    /// Roamer lateral movement
    pub fn roam(&mut self) {
        if let Some(speed) = self.lateral_speed {
            self.entity.x += speed;
        }
    }
}

/// Effects a drop item applies on pickup
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ItemKind {
    Heal,
    Shield,
    Slow,
    Stop,
    Push,
    Explode,
}

impl ItemKind {
    /// Weighted pick: walks `table` accumulating probabilities until the roll
    /// falls under the running total. Leftover probability means no drop.
    pub fn roll<'a, R: Rng>(
        table: impl IntoIterator<Item = (&'a ItemKind, &'a f32)>,
        rng: &mut R,
    ) -> Option<ItemKind> {
        let roll: f32 = rng.random();
        let mut total = 0.0;
        for (kind, probability) in table {
            total += probability.max(0.0);
            if roll < total {
                return Some(*kind);
            }
        }
        None
    }
}

/// A falling pickup
#[derive(Debug, Clone, PartialEq)]
pub struct DropItem {
    pub entity: Entity,
    pub kind: ItemKind,
}

impl DropItem {
    /// Centered on the given point
    pub fn new(center: Vec2, kind: ItemKind) -> Self {
        let mut entity = Entity::new(0, 0, ITEM_WIDTH, ITEM_HEIGHT, SpriteKind::Item(kind));
        entity.set_center(center);
        Self { entity, kind }
    }

    pub fn update(&mut self) {
        self.entity.y += ITEM_SPEED;
    }
}

/// A player's ship. Lives are kept by the model; this is the body.
#[derive(Debug, Clone)]
pub struct PlayerShip {
    pub id: PlayerId,
    pub entity: Entity,
    pub destroyed: bool,
    shooting: Cooldown,
    respawn: Cooldown,
    invincibility: Cooldown,
    spawn_x: i32,
    /// Fractional pixels of external displacement not yet applied
    drift: Vec2,
}

impl PlayerShip {
    pub fn new(id: PlayerId, spawn_x: i32, shooting_interval: Millis) -> Self {
        let sprite = match id {
            PlayerId::One => SpriteKind::Player1,
            PlayerId::Two => SpriteKind::Player2,
        };
        Self {
            id,
            entity: Entity::new(spawn_x, PLAYER_Y, PLAYER_WIDTH, PLAYER_HEIGHT, sprite),
            destroyed: false,
            shooting: Cooldown::new(shooting_interval),
            respawn: Cooldown::new(RESPAWN_MS),
            invincibility: Cooldown::new(INVINCIBILITY_MS),
            spawn_x,
            drift: Vec2::ZERO,
        }
    }

    pub fn is_alive(&self) -> bool {
        !self.destroyed
    }

    pub fn is_invincible(&self, now: Millis) -> bool {
        self.invincibility.is_running(now)
    }

    /// Invincible for `duration` from `now`
    pub fn grant_invincibility(&mut self, now: Millis, duration: Millis) {
        self.invincibility = Cooldown::new(duration);
        self.invincibility.reset(now);
    }

    /// Horizontal move, clamped to the playfield
    pub fn move_by(&mut self, dx: i32) {
        self.entity.x = (self.entity.x + dx).clamp(0, SCREEN_WIDTH - self.entity.width);
    }

    /// Accumulate a sub-pixel push and move by the whole pixels built up so far
    pub fn drift(&mut self, displacement: Vec2) {
        let total = self.drift + displacement;
        let whole = total.trunc();
        self.entity.x += whole.x as i32;
        self.entity.y += whole.y as i32;
        self.drift = total - whole;
    }

    /// Keep the ship inside the player band after external displacement
    pub fn clamp_to_playfield(&mut self) {
        self.entity.x = self.entity.x.clamp(0, SCREEN_WIDTH - self.entity.width);
        self.entity.y = self
            .entity
            .y
            .clamp(SEPARATION_LINE_HEIGHT, SCREEN_HEIGHT - self.entity.height);
    }

    /// Whether a shot may be fired now; restarts the cooldown if so
    pub fn try_shoot(&mut self, now: Millis) -> bool {
        if self.destroyed || !self.shooting.is_finished(now) {
            return false;
        }
        self.shooting.reset(now);
        true
    }

    /// Mark the ship destroyed and start the respawn delay
    pub fn kill(&mut self, now: Millis) {
        self.destroyed = true;
        self.respawn.reset(now);
    }

    /// Bring the ship back once the respawn delay has passed
    pub fn try_respawn(&mut self, now: Millis) -> bool {
        if !self.destroyed || !self.respawn.is_finished(now) {
            return false;
        }
        self.destroyed = false;
        self.entity.x = self.spawn_x;
        self.entity.y = PLAYER_Y;
        self.drift = Vec2::ZERO;
        self.grant_invincibility(now, INVINCIBILITY_MS);
        true
    }
}

/// A free-flying boss projectile with sub-pixel position
#[derive(Debug, Clone, PartialEq)]
pub struct BossBullet {
    pub pos: Vec2,
    pub vel: Vec2,
    pub size: f32,
}

impl BossBullet {
    pub const SIZE: f32 = 6.0;

    /// Centered on `origin`
    pub fn new(origin: Vec2, vel: Vec2) -> Self {
        Self {
            pos: origin - Vec2::splat(Self::SIZE / 2.0),
            vel,
            size: Self::SIZE,
        }
    }

    pub fn update(&mut self) {
        self.pos += self.vel;
    }

    pub fn is_off_screen(&self) -> bool {
        self.pos.x + self.size < 0.0
            || self.pos.y + self.size < 0.0
            || self.pos.x > SCREEN_WIDTH as f32
            || self.pos.y > SCREEN_HEIGHT as f32
    }
}

impl Bounded for BossBullet {
    fn rect(&self) -> Rect {
        Rect::new(self.pos.x, self.pos.y, self.size, self.size)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rand::SeedableRng;
    use rand_pcg::Pcg32;
    use std::collections::BTreeMap;

    #[test]
    fn test_penetration_counter_capped() {
        let mut bullet = Bullet::new(0, 0, -6, Some(PlayerId::One), 1);
        assert!(!bullet.register_hit(TargetId::Formation(0)));
        assert_eq!(bullet.penetration_count, 1);
        assert!(bullet.register_hit(TargetId::Formation(1)));
        assert_eq!(bullet.penetration_count, 1);
        assert!(bullet.spent);
        assert!(bullet.has_hit(TargetId::Formation(0)));
    }

    #[test]
    fn test_tank_takes_two_hits() {
        let mut ship = EnemyShip::new(0, 0, EnemyKind::Tank);
        assert!(!ship.hit(0));
        assert!(ship.is_alive());
        assert!(ship.hit(0));
        assert!(!ship.is_alive());
        assert!(!ship.hit(0));
        assert!(!ship.is_removable(EXPLOSION_MS - 1));
        assert!(ship.is_removable(EXPLOSION_MS));
    }

    #[test]
    fn test_item_roll_respects_table() {
        let mut rng = Pcg32::seed_from_u64(3);
        let mut table = BTreeMap::new();
        table.insert(ItemKind::Heal, 1.0);
        for _ in 0..20 {
            assert_eq!(ItemKind::roll(&table, &mut rng), Some(ItemKind::Heal));
        }
        let empty: BTreeMap<ItemKind, f32> = BTreeMap::new();
        assert_eq!(ItemKind::roll(&empty, &mut rng), None);
    }

    #[test]
    fn test_player_respawn_grants_invincibility() {
        let mut ship = PlayerShip::new(PlayerId::Two, 100, 500);
        ship.entity.x = 10;
        ship.kill(1_000);
        assert!(!ship.try_respawn(1_000 + RESPAWN_MS - 1));
        assert!(ship.try_respawn(1_000 + RESPAWN_MS));
        assert_eq!(ship.entity.x, 100);
        assert!(ship.is_invincible(1_000 + RESPAWN_MS + 1));
        assert!(!ship.is_invincible(1_000 + RESPAWN_MS + INVINCIBILITY_MS));
    }

    #[test]
    fn test_player_shooting_cooldown() {
        let mut ship = PlayerShip::new(PlayerId::One, 100, 500);
        assert!(ship.try_shoot(0));
        assert!(!ship.try_shoot(499));
        assert!(ship.try_shoot(500));
    }

    #[test]
    fn test_drift_accumulates_sub_pixel_pushes() {
        let mut ship = PlayerShip::new(PlayerId::One, 100, 500);
        let start = (ship.entity.x, ship.entity.y);
        for _ in 0..60 {
            ship.drift(Vec2::new(0.0, -0.25));
        }
        assert_eq!((ship.entity.x, ship.entity.y), (start.0, start.1 - 15));

        // Both axes keep their share of a diagonal push
        let mut ship = PlayerShip::new(PlayerId::One, 100, 500);
        for _ in 0..8 {
            ship.drift(Vec2::new(0.75, -0.25));
        }
        assert_eq!((ship.entity.x, ship.entity.y), (start.0 + 6, start.1 - 2));
    }
}
