//! Boss attack and movement patterns
//!
//! A closed set of behaviors behind one `Pattern` enum. Each variant owns its
//! position and timers; the boss swaps the whole value when it crosses a
//! health threshold.

use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;

use crate::Millis;
use crate::consts::*;
use crate::sim::cooldown::Cooldown;
use crate::sim::entity::{BossBullet, Rect};

pub const ZIGZAG_SPEED: Vec2 = Vec2::new(2.0, 1.0);
pub const VOLLEY_INTERVAL_MS: Millis = 1_500;
pub const VOLLEY_SIZE: u32 = 12;
pub const VOLLEY_BULLET_SPEED: f32 = 3.0;
/// Rotation added to each successive volley (radians)
pub const VOLLEY_SPIN: f32 = 0.3;

pub const DASH_WARN_MS: Millis = 1_000;
pub const DASH_IDLE_MS: Millis = 1_500;
pub const DASH_SPEED: f32 = 12.0;
pub const DASH_RETURN_SPEED: f32 = 4.0;
pub const DASH_SHOT_INTERVAL_MS: Millis = 700;

pub const BLACK_HOLE_RADIUS: f32 = 150.0;
pub const PULL_CONSTANT: f32 = 0.05;
pub const BLACK_HOLE_ACTIVE_MS: Millis = 4_000;
pub const BLACK_HOLE_DORMANT_MS: Millis = 3_000;
pub const AIMED_SHOT_INTERVAL_MS: Millis = 1_200;
pub const AIMED_BULLET_SPEED: f32 = 4.0;

pub const LASER_IDLE_MS: Millis = 1_500;
pub const LASER_CHARGE_MS: Millis = 1_200;
pub const LASER_FIRE_MS: Millis = 600;
pub const LASER_DECAY_MS: Millis = 400;
pub const LASER_HALF_WIDTH: f32 = 6.0;

/// Which behavior a stage uses
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PatternKind {
    ZigZag,
    Dash,
    BlackHole,
    TimeGap,
}

/// Per-tick inputs a pattern may need
pub struct PatternContext<'a> {
    pub now: Millis,
    pub rng: &'a mut Pcg32,
}

/// Something for the presentation layer to draw ahead of an attack
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Telegraph {
    /// Warning line for a dash or a laser
    Line { from: Vec2, to: Vec2, firing: bool },
    /// Black hole pull area
    Ring { center: Vec2, radius: f32 },
}

/// Keeps a box of `size` inside `[min, max]`, reflecting `vel` on contact
fn bounce(pos: &mut Vec2, vel: &mut Vec2, size: Vec2, min: Vec2, max: Vec2) {
    if pos.x <= min.x || pos.x + size.x >= max.x {
        vel.x = -vel.x;
        pos.x = pos.x.clamp(min.x, (max.x - size.x).max(min.x));
    }
    if pos.y <= min.y || pos.y + size.y >= max.y {
        vel.y = -vel.y;
        pos.y = pos.y.clamp(min.y, (max.y - size.y).max(min.y));
    }
}

fn boss_zone() -> (Vec2, Vec2) {
    (
        Vec2::new(0.0, TOP_MARGIN as f32),
        Vec2::new(SCREEN_WIDTH as f32, BOSS_ZONE_BOTTOM as f32),
    )
}

/// Projectile from `origin` toward `target`, straight down if they coincide
fn aimed(origin: Vec2, target: Vec2, speed: f32) -> BossBullet {
    let dir = (target - origin).try_normalize().unwrap_or(Vec2::Y);
    BossBullet::new(origin, dir * speed)
}

/// Horizontal bounce in the boss band with periodic radial volleys
#[derive(Debug, Clone)]
pub struct ZigZagPattern {
    pos: Vec2,
    size: Vec2,
    vel: Vec2,
    volley: Cooldown,
    spin: f32,
}

impl ZigZagPattern {
    pub fn new(pos: Vec2, size: Vec2) -> Self {
        Self {
            pos,
            size,
            vel: ZIGZAG_SPEED,
            volley: Cooldown::new(VOLLEY_INTERVAL_MS),
            spin: 0.0,
        }
    }

    fn movement(&mut self) {
        self.pos += self.vel;
        let (min, max) = boss_zone();
        bounce(&mut self.pos, &mut self.vel, self.size, min, max);
    }

    fn attack(&mut self, now: Millis, out: &mut Vec<BossBullet>) {
        if !self.volley.is_finished(now) {
            return;
        }
        self.volley.reset(now);
        let origin = self.pos + self.size / 2.0;
        for i in 0..VOLLEY_SIZE {
            let angle = self.spin + TAU * i as f32 / VOLLEY_SIZE as f32;
            out.push(BossBullet::new(origin, Vec2::from_angle(angle) * VOLLEY_BULLET_SPEED));
        }
        self.spin = (self.spin + VOLLEY_SPIN) % TAU;
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum DashState {
    /// Waiting at home until the deadline
    Idle { until: Millis },
    /// Telegraphing a charge along `dir`
    Warning { dir: Vec2, until: Millis },
    Dashing { dir: Vec2 },
    /// Heading back to the home position
    Returning,
}

/// Telegraphed straight-line charge at the nearest living player
#[derive(Debug, Clone)]
pub struct DashPattern {
    pos: Vec2,
    size: Vec2,
    home: Vec2,
    state: DashState,
    targets: Vec<Vec2>,
    shot: Cooldown,
}

impl DashPattern {
    pub fn new(pos: Vec2, size: Vec2, now: Millis) -> Self {
        Self {
            pos,
            size,
            home: pos,
            state: DashState::Idle {
                until: now + DASH_IDLE_MS,
            },
            targets: Vec::new(),
            shot: Cooldown::new(DASH_SHOT_INTERVAL_MS),
        }
    }

    pub fn state(&self) -> DashState {
        self.state
    }

    fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    fn nearest_target(&self) -> Option<Vec2> {
        let center = self.center();
        self.targets
            .iter()
            .copied()
            .min_by(|a, b| a.distance_squared(center).total_cmp(&b.distance_squared(center)))
    }

    fn hits_wall(&self) -> bool {
        self.pos.x <= 0.0
            || self.pos.y <= 0.0
            || self.pos.x + self.size.x >= SCREEN_WIDTH as f32
            || self.pos.y + self.size.y >= SCREEN_HEIGHT as f32
    }

    fn movement(&mut self, now: Millis) {
        match self.state {
            DashState::Idle { until } => {
                if now < until {
                    return;
                }
                if let Some(target) = self.nearest_target() {
                    let dir = (target - self.center()).try_normalize().unwrap_or(Vec2::Y);
                    self.state = DashState::Warning {
                        dir,
                        until: now + DASH_WARN_MS,
                    };
                }
            }
            DashState::Warning { dir, until } => {
                if now >= until {
                    self.state = DashState::Dashing { dir };
                }
            }
            DashState::Dashing { dir } => {
                self.pos += dir * DASH_SPEED;
                if self.hits_wall() {
                    let max = Vec2::new(SCREEN_WIDTH as f32, SCREEN_HEIGHT as f32) - self.size;
                    self.pos = self.pos.clamp(Vec2::ZERO, max.max(Vec2::ZERO));
                    self.state = DashState::Returning;
                }
            }
            DashState::Returning => {
                let to_home = self.home - self.pos;
                if to_home.length() <= DASH_RETURN_SPEED {
                    self.pos = self.home;
                    self.state = DashState::Idle {
                        until: now + DASH_IDLE_MS,
                    };
                } else {
                    self.pos += to_home.normalize() * DASH_RETURN_SPEED;
                }
            }
        }
    }

    /// Aimed shots only while resting at home
    fn attack(&mut self, now: Millis, out: &mut Vec<BossBullet>) {
        if !matches!(self.state, DashState::Idle { .. }) || !self.shot.is_finished(now) {
            return;
        }
        if let Some(target) = self.nearest_target() {
            self.shot.reset(now);
            out.push(aimed(self.center(), target, AIMED_BULLET_SPEED));
        }
    }

    fn telegraph(&self) -> Option<Telegraph> {
        match self.state {
            DashState::Warning { dir, .. } => {
                let from = self.center();
                let reach = (SCREEN_WIDTH.max(SCREEN_HEIGHT) * 2) as f32;
                Some(Telegraph::Line {
                    from,
                    to: from + dir * reach,
                    firing: false,
                })
            }
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum BlackHoleState {
    Dormant { until: Millis },
    Active { center: Vec2, until: Millis },
}

/// Slow drift while a black hole pulls nearby ships toward its center
#[derive(Debug, Clone)]
pub struct BlackHolePattern {
    pos: Vec2,
    size: Vec2,
    vel: Vec2,
    state: BlackHoleState,
    targets: Vec<Vec2>,
    shot: Cooldown,
}

impl BlackHolePattern {
    pub fn new(pos: Vec2, size: Vec2, now: Millis) -> Self {
        Self {
            pos,
            size,
            vel: Vec2::new(1.0, 0.0),
            state: BlackHoleState::Dormant {
                until: now + BLACK_HOLE_DORMANT_MS,
            },
            targets: Vec::new(),
            shot: Cooldown::new(AIMED_SHOT_INTERVAL_MS),
        }
    }

    pub fn state(&self) -> BlackHoleState {
        self.state
    }

    /// Open a black hole at `center` right away
    pub fn open_at(&mut self, center: Vec2, now: Millis) {
        self.state = BlackHoleState::Active {
            center,
            until: now + BLACK_HOLE_ACTIVE_MS,
        };
    }

    fn movement(&mut self) {
        self.pos += self.vel;
        let (min, max) = boss_zone();
        bounce(&mut self.pos, &mut self.vel, self.size, min, max);
    }

    /// Open and close the hole on its own clock, frozen or not
    fn advance(&mut self, ctx: &mut PatternContext) {
        match self.state {
            BlackHoleState::Dormant { until } if ctx.now >= until => {
                let margin = BLACK_HOLE_RADIUS / 2.0;
                let center = Vec2::new(
                    ctx.rng.random_range(margin..SCREEN_WIDTH as f32 - margin),
                    ctx.rng
                        .random_range(SEPARATION_LINE_HEIGHT as f32 - margin..SCREEN_HEIGHT as f32),
                );
                self.open_at(center, ctx.now);
            }
            BlackHoleState::Active { until, .. } if ctx.now >= until => {
                self.state = BlackHoleState::Dormant {
                    until: ctx.now + BLACK_HOLE_DORMANT_MS,
                };
            }
            _ => {}
        }
    }

    fn attack(&mut self, ctx: &mut PatternContext, out: &mut Vec<BossBullet>) {
        self.advance(ctx);
        if self.targets.is_empty() || !self.shot.is_finished(ctx.now) {
            return;
        }
        self.shot.reset(ctx.now);
        let target = self.targets[ctx.rng.random_range(0..self.targets.len())];
        out.push(aimed(self.pos + self.size / 2.0, target, AIMED_BULLET_SPEED));
    }

    /// Sub-pixel displacement toward the hole: `(radius - distance) * PULL_CONSTANT`
    fn pull(&self, at: Vec2) -> Vec2 {
        let BlackHoleState::Active { center, .. } = self.state else {
            return Vec2::ZERO;
        };
        let offset = center - at;
        let distance = offset.length();
        if distance <= 0.0 || distance >= BLACK_HOLE_RADIUS {
            return Vec2::ZERO;
        }
        offset / distance * (BLACK_HOLE_RADIUS - distance) * PULL_CONSTANT
    }
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum LaserState {
    Idle { until: Millis },
    Charging { origin: Vec2, dir: Vec2, until: Millis },
    Firing { origin: Vec2, dir: Vec2, until: Millis },
    Decaying { origin: Vec2, dir: Vec2, until: Millis },
}

/// Laser locked onto a line through a random living player
#[derive(Debug, Clone)]
pub struct TimeGapPattern {
    pos: Vec2,
    size: Vec2,
    vel: Vec2,
    state: LaserState,
    targets: Vec<Vec2>,
}

impl TimeGapPattern {
    pub fn new(pos: Vec2, size: Vec2, now: Millis) -> Self {
        Self {
            pos,
            size,
            vel: Vec2::new(1.5, 0.0),
            state: LaserState::Idle {
                until: now + LASER_IDLE_MS,
            },
            targets: Vec::new(),
        }
    }

    pub fn state(&self) -> LaserState {
        self.state
    }

    /// The boss holds still once a line is locked
    fn movement(&mut self) {
        if matches!(self.state, LaserState::Idle { .. }) {
            self.pos += self.vel;
            let (min, max) = boss_zone();
            bounce(&mut self.pos, &mut self.vel, self.size, min, max);
        }
    }

    /// Charge, fire and decay on the wall clock; a freeze does not hold the beam
    fn attack(&mut self, ctx: &mut PatternContext) {
        let now = ctx.now;
        self.state = match self.state {
            LaserState::Idle { until } => {
                if now < until || self.targets.is_empty() {
                    return;
                }
                let target = self.targets[ctx.rng.random_range(0..self.targets.len())];
                let origin = self.pos + self.size / 2.0;
                let dir = (target - origin).try_normalize().unwrap_or(Vec2::Y);
                LaserState::Charging {
                    origin,
                    dir,
                    until: now + LASER_CHARGE_MS,
                }
            }
            LaserState::Charging { origin, dir, until } if now >= until => LaserState::Firing {
                origin,
                dir,
                until: now + LASER_FIRE_MS,
            },
            LaserState::Firing { origin, dir, until } if now >= until => LaserState::Decaying {
                origin,
                dir,
                until: now + LASER_DECAY_MS,
            },
            LaserState::Decaying { until, .. } if now >= until => LaserState::Idle {
                until: now + LASER_IDLE_MS,
            },
            state => state,
        };
    }

    /// Whether the firing beam crosses `rect`
    fn laser_hits(&self, rect: &Rect) -> bool {
        let LaserState::Firing { origin, dir, .. } = self.state else {
            return false;
        };
        let to_center = rect.center() - origin;
        let along = to_center.dot(dir);
        if along < 0.0 {
            return false;
        }
        let perpendicular = (to_center - dir * along).length();
        perpendicular < LASER_HALF_WIDTH + rect.width.min(rect.height) / 2.0
    }

    fn telegraph(&self) -> Option<Telegraph> {
        let reach = (SCREEN_WIDTH.max(SCREEN_HEIGHT) * 2) as f32;
        match self.state {
            LaserState::Charging { origin, dir, .. } | LaserState::Decaying { origin, dir, .. } => {
                Some(Telegraph::Line {
                    from: origin,
                    to: origin + dir * reach,
                    firing: false,
                })
            }
            LaserState::Firing { origin, dir, .. } => Some(Telegraph::Line {
                from: origin,
                to: origin + dir * reach,
                firing: true,
            }),
            LaserState::Idle { .. } => None,
        }
    }
}

/// The boss's current behavior
#[derive(Debug, Clone)]
pub enum Pattern {
    ZigZag(ZigZagPattern),
    Dash(DashPattern),
    BlackHole(BlackHolePattern),
    TimeGap(TimeGapPattern),
}

impl Pattern {
    /// Fresh pattern of `kind` starting at the boss's current position
    pub fn build(kind: PatternKind, pos: Vec2, size: Vec2, now: Millis) -> Self {
        match kind {
            PatternKind::ZigZag => Pattern::ZigZag(ZigZagPattern::new(pos, size)),
            PatternKind::Dash => Pattern::Dash(DashPattern::new(pos, size, now)),
            PatternKind::BlackHole => Pattern::BlackHole(BlackHolePattern::new(pos, size, now)),
            PatternKind::TimeGap => Pattern::TimeGap(TimeGapPattern::new(pos, size, now)),
        }
    }

    pub fn kind(&self) -> PatternKind {
        match self {
            Pattern::ZigZag(_) => PatternKind::ZigZag,
            Pattern::Dash(_) => PatternKind::Dash,
            Pattern::BlackHole(_) => PatternKind::BlackHole,
            Pattern::TimeGap(_) => PatternKind::TimeGap,
        }
    }

    /// Top-left corner of the boss
    pub fn position(&self) -> Vec2 {
        match self {
            Pattern::ZigZag(p) => p.pos,
            Pattern::Dash(p) => p.pos,
            Pattern::BlackHole(p) => p.pos,
            Pattern::TimeGap(p) => p.pos,
        }
    }

    /// Living player boxes the pattern may aim at
    pub fn set_target(&mut self, targets: &[Rect]) {
        let centers = targets.iter().map(Rect::center);
        match self {
            Pattern::ZigZag(_) => {}
            Pattern::Dash(p) => p.targets = centers.collect(),
            Pattern::BlackHole(p) => p.targets = centers.collect(),
            Pattern::TimeGap(p) => p.targets = centers.collect(),
        }
    }

    pub fn movement(&mut self, ctx: &mut PatternContext) {
        match self {
            Pattern::ZigZag(p) => p.movement(),
            Pattern::Dash(p) => p.movement(ctx.now),
            Pattern::BlackHole(p) => p.movement(),
            Pattern::TimeGap(p) => p.movement(),
        }
    }

    /// Queue projectiles into the boss's buffer
    pub fn attack(&mut self, ctx: &mut PatternContext, out: &mut Vec<BossBullet>) {
        match self {
            Pattern::ZigZag(p) => p.attack(ctx.now, out),
            Pattern::Dash(p) => p.attack(ctx.now, out),
            Pattern::BlackHole(p) => p.attack(ctx, out),
            Pattern::TimeGap(p) => p.attack(ctx),
        }
    }

    /// Field displacement for a ship centered at `at`, in fractional pixels
    pub fn pull(&self, at: Vec2) -> Vec2 {
        match self {
            Pattern::BlackHole(p) => p.pull(at),
            _ => Vec2::ZERO,
        }
    }

    pub fn laser_hits(&self, rect: &Rect) -> bool {
        match self {
            Pattern::TimeGap(p) => p.laser_hits(rect),
            _ => false,
        }
    }

    pub fn telegraph(&self) -> Option<Telegraph> {
        match self {
            Pattern::ZigZag(_) => None,
            Pattern::Dash(p) => p.telegraph(),
            Pattern::BlackHole(p) => match p.state {
                BlackHoleState::Active { center, .. } => Some(Telegraph::Ring {
                    center,
                    radius: BLACK_HOLE_RADIUS,
                }),
                BlackHoleState::Dormant { .. } => None,
            },
            Pattern::TimeGap(p) => p.telegraph(),
        }
    }
}
