//! Bosses: health-driven pattern stages and mid-boss minions
//!
//! A boss holds its current `Pattern` by value. When its health ratio falls
//! to the next stage's threshold the pattern is replaced for good; stages
//! never go back.

pub mod minion;
pub mod pattern;

pub use minion::{Minion, MinionSpawner};
pub use pattern::{Pattern, PatternContext, PatternKind, Telegraph};

use glam::Vec2;
use rand::SeedableRng;
use rand_pcg::Pcg32;

use super::cooldown::Cooldown;
use super::entity::{BossBullet, Bounded, Color, Entity, Rect, SpriteKind};
use crate::Millis;
use crate::consts::*;

pub const BOSS_WIDTH: i32 = 64;
pub const BOSS_HEIGHT: i32 = 40;
pub const BOSS_EXPLOSION_MS: Millis = 1_500;

/// Known boss identifiers
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BossKind {
    /// Final boss: zig-zag, then dash
    Omega,
    /// Final boss: zig-zag, black hole, time-gap laser
    Abyss,
    /// Mid boss with minion waves
    Hive,
}

impl BossKind {
    pub fn from_id(id: &str) -> Option<Self> {
        match id.to_ascii_lowercase().as_str() {
            "omega" => Some(BossKind::Omega),
            "abyss" => Some(BossKind::Abyss),
            "hive" => Some(BossKind::Hive),
            _ => None,
        }
    }

    pub fn max_health(self) -> u32 {
        match self {
            BossKind::Omega => 80,
            BossKind::Abyss => 100,
            BossKind::Hive => 60,
        }
    }

    pub fn points(self) -> u32 {
        match self {
            BossKind::Omega => 1_500,
            BossKind::Abyss => 2_000,
            BossKind::Hive => 1_000,
        }
    }

    /// Stages in order of descending threshold; the first always applies
    pub fn stages(self) -> Vec<Stage> {
        let stage = |threshold, pattern, color| Stage {
            threshold,
            pattern,
            color,
        };
        match self {
            BossKind::Omega => vec![
                stage(1.0, PatternKind::ZigZag, Color::WHITE),
                stage(0.5, PatternKind::Dash, Color::RED),
            ],
            BossKind::Abyss => vec![
                stage(1.0, PatternKind::ZigZag, Color::WHITE),
                stage(0.6, PatternKind::BlackHole, Color::PURPLE),
                stage(0.3, PatternKind::TimeGap, Color::CYAN),
            ],
            BossKind::Hive => vec![
                stage(1.0, PatternKind::ZigZag, Color::GREEN),
                stage(0.5, PatternKind::TimeGap, Color::ORANGE),
            ],
        }
    }

    fn has_minions(self) -> bool {
        self == BossKind::Hive
    }
}

/// A health band and the pattern used inside it
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Stage {
    /// Entered once `health / max_health <= threshold`
    pub threshold: f32,
    pub pattern: PatternKind,
    pub color: Color,
}

/// Per-tick world view handed to the boss
pub struct BossContext<'a> {
    pub now: Millis,
    /// Boxes of living player ships
    pub targets: &'a [Rect],
    pub frozen: bool,
}

#[derive(Debug, Clone)]
pub struct Boss {
    pub kind: BossKind,
    pub entity: Entity,
    pub health: u32,
    pub max_health: u32,
    pub points: u32,
    pub destroyed: bool,
    stage_index: usize,
    stages: Vec<Stage>,
    pattern: Pattern,
    /// Projectiles queued by the pattern, drained once per tick
    bullets: Vec<BossBullet>,
    minions: Vec<Minion>,
    spawner: Option<MinionSpawner>,
    explosion: Cooldown,
    rng: Pcg32,
}

impl Boss {
    /// Look up a boss by id. Unknown ids are logged and yield no boss.
    pub fn spawn(id: &str, seed: u64, now: Millis) -> Option<Self> {
        if id.is_empty() {
            return None;
        }
        let Some(kind) = BossKind::from_id(id) else {
            log::warn!("Unknown boss id '{id}', skipping boss wave");
            return None;
        };
        Some(Self::new(kind, seed, now))
    }

    pub fn new(kind: BossKind, seed: u64, now: Millis) -> Self {
        let stages = kind.stages();
        let start = Vec2::new(
            ((SCREEN_WIDTH - BOSS_WIDTH) / 2) as f32,
            (TOP_MARGIN + 10) as f32,
        );
        let size = Vec2::new(BOSS_WIDTH as f32, BOSS_HEIGHT as f32);
        let mut entity = Entity::new(
            start.x as i32,
            start.y as i32,
            BOSS_WIDTH,
            BOSS_HEIGHT,
            SpriteKind::Boss,
        );
        entity.color = Some(stages[0].color);
        log::info!("Boss {kind:?} enters");
        Self {
            kind,
            entity,
            health: kind.max_health(),
            max_health: kind.max_health(),
            points: kind.points(),
            destroyed: false,
            stage_index: 0,
            pattern: Pattern::build(stages[0].pattern, start, size, now),
            stages,
            bullets: Vec::new(),
            minions: Vec::new(),
            spawner: kind.has_minions().then(MinionSpawner::new),
            explosion: Cooldown::new(BOSS_EXPLOSION_MS),
            rng: Pcg32::seed_from_u64(seed),
        }
    }

    pub fn health_ratio(&self) -> f32 {
        if self.max_health == 0 {
            return 0.0;
        }
        self.health as f32 / self.max_health as f32
    }

    pub fn stage_index(&self) -> usize {
        self.stage_index
    }

    pub fn pattern(&self) -> &Pattern {
        &self.pattern
    }

    #[cfg(test)]
    pub(crate) fn pattern_mut(&mut self) -> &mut Pattern {
        &mut self.pattern
    }

    pub fn minions(&self) -> &[Minion] {
        &self.minions
    }

    pub fn minions_mut(&mut self) -> &mut [Minion] {
        &mut self.minions
    }

    /// Advance pattern and minions by one tick
    pub fn update(&mut self, ctx: &BossContext) {
        if self.destroyed {
            return;
        }
        self.pattern.set_target(ctx.targets);
        let mut pattern_ctx = PatternContext {
            now: ctx.now,
            rng: &mut self.rng,
        };
        if !ctx.frozen {
            self.pattern.movement(&mut pattern_ctx);
        }
        self.pattern.attack(&mut pattern_ctx, &mut self.bullets);

        let pos = self.pattern.position();
        self.entity.x = pos.x.round() as i32;
        self.entity.y = pos.y.round() as i32;

        if !ctx.frozen {
            let center = self.entity.center();
            for minion in &mut self.minions {
                minion.update(center);
            }
        }
    }

    /// Take the projectiles queued since the last drain
    pub fn drain_bullets(&mut self) -> Vec<BossBullet> {
        std::mem::take(&mut self.bullets)
    }

    /// Apply damage; returns true if it was lethal
    pub fn take_hit(&mut self, damage: u32, now: Millis) -> bool {
        if self.destroyed || damage == 0 {
            return false;
        }
        self.health = self.health.saturating_sub(damage);
        self.advance_stage(now);
        self.spawn_due_minions();
        if self.health == 0 {
            self.destroyed = true;
            self.entity.sprite = SpriteKind::Explosion;
            self.explosion.reset(now);
            self.minions.clear();
            log::info!("Boss {:?} destroyed", self.kind);
            return true;
        }
        false
    }

    /// Move forward through every stage whose threshold has been reached
    fn advance_stage(&mut self, now: Millis) {
        let ratio = self.health_ratio();
        let mut advanced = false;
        while self.stage_index + 1 < self.stages.len()
            && ratio <= self.stages[self.stage_index + 1].threshold
        {
            self.stage_index += 1;
            advanced = true;
        }
        if !advanced {
            return;
        }
        let stage = self.stages[self.stage_index];
        let size = Vec2::new(self.entity.width as f32, self.entity.height as f32);
        self.pattern = Pattern::build(stage.pattern, self.pattern.position(), size, now);
        self.entity.color = Some(stage.color);
        log::debug!(
            "Boss {:?} switches to {:?} at {:.0}% health",
            self.kind,
            stage.pattern,
            ratio * 100.0
        );
    }

    fn spawn_due_minions(&mut self) {
        let ratio = self.health_ratio();
        let origin = self.entity.center();
        let Some(spawner) = self.spawner.as_mut() else {
            return;
        };
        for size in spawner.due_waves(ratio) {
            log::debug!("Boss {:?} releases {size} minions", self.kind);
            let wave = spawner.spawn_wave(size, origin, &mut self.rng);
            self.minions.extend(wave);
        }
    }

    /// Apply one hit to a minion; returns its points if it was lethal
    pub fn hit_minion(&mut self, id: u32) -> Option<u32> {
        let minion = self.minions.iter_mut().find(|m| m.id == id)?;
        minion.hit().then_some(minion::MINION_POINTS)
    }

    /// Drop destroyed and departed minions
    pub fn prune_minions(&mut self) -> usize {
        let before = self.minions.len();
        self.minions.retain(|m| !m.is_prunable());
        before - self.minions.len()
    }

    /// Field displacement for a player ship centered at `at` (black hole)
    pub fn pull(&self, at: Vec2) -> Vec2 {
        if self.destroyed {
            Vec2::ZERO
        } else {
            self.pattern.pull(at)
        }
    }

    pub fn laser_hits(&self, rect: &Rect) -> bool {
        !self.destroyed && self.pattern.laser_hits(rect)
    }

    pub fn telegraph(&self) -> Option<Telegraph> {
        if self.destroyed {
            None
        } else {
            self.pattern.telegraph()
        }
    }

    /// Destroyed and the explosion has played out
    pub fn is_finished(&self, now: Millis) -> bool {
        self.destroyed && self.explosion.is_finished(now)
    }
}

impl Bounded for Boss {
    fn rect(&self) -> Rect {
        self.entity.rect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unknown_and_empty_ids_yield_no_boss() {
        assert!(Boss::spawn("", 1, 0).is_none());
        assert!(Boss::spawn("kraken", 1, 0).is_none());
        assert!(Boss::spawn("Omega", 1, 0).is_some());
    }

    #[test]
    fn test_stage_switch_is_permanent() {
        let mut boss = Boss::new(BossKind::Omega, 1, 0);
        assert_eq!(boss.pattern().kind(), PatternKind::ZigZag);
        boss.take_hit(39, 0);
        assert_eq!(boss.stage_index(), 0);
        boss.take_hit(1, 0);
        assert_eq!(boss.stage_index(), 1);
        assert_eq!(boss.pattern().kind(), PatternKind::Dash);
        assert_eq!(boss.entity.color, Some(Color::RED));
        boss.take_hit(1, 0);
        assert_eq!(boss.stage_index(), 1);
    }

    #[test]
    fn test_big_hit_skips_to_lowest_stage() {
        let mut boss = Boss::new(BossKind::Abyss, 1, 0);
        boss.take_hit(75, 0);
        assert_eq!(boss.stage_index(), 2);
        assert_eq!(boss.pattern().kind(), PatternKind::TimeGap);
    }

    #[test]
    fn test_health_never_increases_and_death_is_final() {
        let mut boss = Boss::new(BossKind::Hive, 1, 0);
        let mut last = boss.health;
        let mut lethal_hits = 0;
        for _ in 0..100 {
            if boss.take_hit(1, 10) {
                lethal_hits += 1;
            }
            assert!(boss.health <= last);
            last = boss.health;
        }
        assert_eq!(lethal_hits, 1);
        assert!(boss.destroyed);
        assert!(!boss.is_finished(10 + BOSS_EXPLOSION_MS - 1));
        assert!(boss.is_finished(10 + BOSS_EXPLOSION_MS));
    }

    #[test]
    fn test_hive_releases_growing_waves() {
        let mut boss = Boss::new(BossKind::Hive, 1, 0);
        boss.take_hit(6, 0);
        assert_eq!(boss.minions().len(), 2);
        boss.take_hit(12, 0);
        assert_eq!(boss.minions().len(), 5);
        let id = boss.minions()[0].id;
        assert_eq!(boss.hit_minion(id), None);
        assert_eq!(boss.hit_minion(id), None);
        assert_eq!(boss.hit_minion(id), Some(minion::MINION_POINTS));
        assert_eq!(boss.prune_minions(), 1);
        assert_eq!(boss.minions().len(), 4);
    }

    #[test]
    fn test_update_drains_volley() {
        let mut boss = Boss::new(BossKind::Omega, 1, 0);
        let targets = [Rect::new(200.0, 460.0, 26.0, 16.0)];
        boss.update(&BossContext {
            now: 0,
            targets: &targets,
            frozen: false,
        });
        assert_eq!(boss.drain_bullets().len(), pattern::VOLLEY_SIZE as usize);
        assert!(boss.drain_bullets().is_empty());
    }

    #[test]
    fn test_frozen_boss_holds_position() {
        let mut boss = Boss::new(BossKind::Omega, 1, 0);
        let (x, y) = (boss.entity.x, boss.entity.y);
        for now in 0..50 {
            boss.update(&BossContext {
                now,
                targets: &[],
                frozen: true,
            });
        }
        assert_eq!((boss.entity.x, boss.entity.y), (x, y));
    }

    #[test]
    fn test_freeze_does_not_extend_laser() {
        let mut boss = Boss::new(BossKind::Abyss, 1, 0);
        boss.take_hit(75, 0);
        assert_eq!(boss.pattern().kind(), PatternKind::TimeGap);
        let player = Rect::new(200.0, 460.0, 26.0, 16.0);

        let mut fired_at = None;
        let mut now = 0;
        while now < 10_000 {
            now += TICK_MS;
            boss.update(&BossContext {
                now,
                targets: &[player],
                frozen: true,
            });
            let firing = matches!(boss.telegraph(), Some(Telegraph::Line { firing: true, .. }));
            match fired_at {
                None if firing => fired_at = Some(now),
                Some(start) if !firing => {
                    assert!(now - start <= pattern::LASER_FIRE_MS + TICK_MS);
                    return;
                }
                _ => {}
            }
        }
        panic!("laser fired at {fired_at:?} and never stopped while frozen");
    }
}
