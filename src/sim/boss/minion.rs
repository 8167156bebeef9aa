//! Child minions spawned by the mid boss
//!
//! Minions bounce off the walls while healthy. Once damaged they orbit the
//! boss for a while and then dive straight down.

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::consts::*;
use crate::sim::entity::{Bounded, Entity, Rect, SpriteKind};

pub const MINION_SIZE: i32 = 18;
pub const MINION_HEALTH: u32 = 3;
pub const MINION_POINTS: u32 = 50;
pub const MINION_SPEED: f32 = 2.5;
pub const ORBIT_RADIUS: f32 = 70.0;
/// Radians per tick
pub const ORBIT_SPEED: f32 = 0.08;
pub const ORBIT_TICKS: u32 = 120;
pub const DESCEND_SPEED: f32 = 3.0;

/// HP ratios that trigger a wave, and the size of each wave
pub const WAVE_THRESHOLDS: [f32; 4] = [0.9, 0.7, 0.5, 0.2];
pub const WAVE_SIZES: [u32; 4] = [2, 3, 4, 6];

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum MinionMotion {
    Bounce { vel: Vec2 },
    Orbit { angle: f32, ticks_left: u32 },
    Descend,
}

#[derive(Debug, Clone)]
pub struct Minion {
    pub id: u32,
    pub entity: Entity,
    pos: Vec2,
    pub health: u32,
    pub max_health: u32,
    pub destroyed: bool,
    motion: MinionMotion,
}

impl Minion {
    pub fn new(id: u32, pos: Vec2, vel: Vec2) -> Self {
        let entity = Entity::new(
            pos.x.round() as i32,
            pos.y.round() as i32,
            MINION_SIZE,
            MINION_SIZE,
            SpriteKind::Minion,
        );
        Self {
            id,
            entity,
            pos,
            health: MINION_HEALTH,
            max_health: MINION_HEALTH,
            destroyed: false,
            motion: MinionMotion::Bounce { vel },
        }
    }

    pub fn motion(&self) -> MinionMotion {
        self.motion
    }

    /// Apply one hit; returns true if it was lethal
    pub fn hit(&mut self) -> bool {
        if self.destroyed {
            return false;
        }
        self.health = self.health.saturating_sub(1);
        self.destroyed = self.health == 0;
        self.destroyed
    }

    pub fn update(&mut self, boss_center: Vec2) {
        let size = Vec2::splat(MINION_SIZE as f32);
        self.motion = match self.motion {
            MinionMotion::Bounce { mut vel } => {
                self.pos += vel;
                let max = Vec2::new(SCREEN_WIDTH as f32, SEPARATION_LINE_HEIGHT as f32) - size;
                if self.pos.x <= 0.0 || self.pos.x >= max.x {
                    vel.x = -vel.x;
                }
                if self.pos.y <= TOP_MARGIN as f32 || self.pos.y >= max.y {
                    vel.y = -vel.y;
                }
                self.pos = self.pos.clamp(Vec2::new(0.0, TOP_MARGIN as f32), max);
                if self.health < self.max_health {
                    let offset = self.pos + size / 2.0 - boss_center;
                    MinionMotion::Orbit {
                        angle: offset.y.atan2(offset.x),
                        ticks_left: ORBIT_TICKS,
                    }
                } else {
                    MinionMotion::Bounce { vel }
                }
            }
            MinionMotion::Orbit { angle, ticks_left } => {
                let angle = angle + ORBIT_SPEED;
                self.pos = boss_center + Vec2::from_angle(angle) * ORBIT_RADIUS - size / 2.0;
                if ticks_left <= 1 {
                    MinionMotion::Descend
                } else {
                    MinionMotion::Orbit {
                        angle,
                        ticks_left: ticks_left - 1,
                    }
                }
            }
            MinionMotion::Descend => {
                self.pos.y += DESCEND_SPEED;
                MinionMotion::Descend
            }
        };
        self.entity.x = self.pos.x.round() as i32;
        self.entity.y = self.pos.y.round() as i32;
    }

    /// Destroyed or gone below the playfield
    pub fn is_prunable(&self) -> bool {
        self.destroyed || self.entity.y > SCREEN_HEIGHT
    }
}

impl Bounded for Minion {
    fn rect(&self) -> Rect {
        self.entity.rect()
    }
}

/// Hands out minion waves as the boss's health crosses each threshold once
#[derive(Debug, Clone, Default)]
pub struct MinionSpawner {
    next_wave: usize,
    next_id: u32,
}

impl MinionSpawner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sizes of every wave whose threshold `ratio` has reached, in order
    pub fn due_waves(&mut self, ratio: f32) -> Vec<u32> {
        let mut waves = Vec::new();
        while self.next_wave < WAVE_THRESHOLDS.len() && ratio <= WAVE_THRESHOLDS[self.next_wave] {
            waves.push(WAVE_SIZES[self.next_wave]);
            self.next_wave += 1;
        }
        waves
    }

    /// Minions fanned out around `origin` with random headings
    pub fn spawn_wave(&mut self, size: u32, origin: Vec2, rng: &mut Pcg32) -> Vec<Minion> {
        (0..size)
            .map(|i| {
                let spread = (i as f32 - (size as f32 - 1.0) / 2.0) * (MINION_SIZE as f32 + 6.0);
                let angle = rng.random_range(0.2..std::f32::consts::PI - 0.2);
                let vel = Vec2::from_angle(angle) * MINION_SPEED;
                let id = self.next_id;
                self.next_id += 1;
                Minion::new(id, origin + Vec2::new(spread, 0.0), vel)
            })
            .collect()
    }
}
