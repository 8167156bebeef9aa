//! Game model and snapshot types
//!
//! `GameModel` is the aggregate root for one level attempt. `GameState` is
//! the small snapshot carried from one attempt to the next.

use glam::Vec2;
use rand::{Rng, SeedableRng};
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::boss::Boss;
use super::cooldown::Cooldown;
use super::entity::{
    BossBullet, Bounded, Bullet, DropItem, EnemyKind, EnemyShip, ItemKind, PlayerId, PlayerShip,
    Rect,
};
use super::events::{Defeated, Notification, sounds};
use super::formation::Formation;
use super::pool::Pool;
use crate::Millis;
use crate::consts::*;
use crate::level::LevelDescriptor;
use crate::settings::SessionConfig;

/// Current phase of a level attempt
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum GamePhase {
    /// Formation combat
    Wave,
    /// Boss encounter after the formation is cleared
    BossWave,
    /// Level won by at least one surviving player
    LevelComplete,
    /// Every present player is out of lives
    GameOver,
}

impl GamePhase {
    pub fn is_finished(self) -> bool {
        matches!(self, GamePhase::LevelComplete | GamePhase::GameOver)
    }
}

/// Snapshot handed from one level attempt to the next
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct GameState {
    pub level: u32,
    /// Combined score of both players
    pub score: u64,
    pub lives_p1: u8,
    pub lives_p2: u8,
    pub bullets_shot: u32,
    pub ships_destroyed: u32,
    pub coins: u64,
    /// Player two takes part
    pub two_player: bool,
}

impl GameState {
    /// Fresh session at level 1
    pub fn new(two_player: bool) -> Self {
        Self {
            level: 1,
            score: 0,
            lives_p1: INITIAL_LIVES,
            lives_p2: if two_player { INITIAL_LIVES } else { 0 },
            bullets_shot: 0,
            ships_destroyed: 0,
            coins: 0,
            two_player,
        }
    }
}

/// Points earned by a kill, applied once the collision pass is over
#[derive(Debug, Clone, Copy)]
pub(crate) struct Kill {
    pub owner: Option<PlayerId>,
    pub points: u32,
    pub defeated: Defeated,
    /// Where a drop item may appear
    pub at: Vec2,
}

/// The simulation aggregate for one level attempt
#[derive(Debug)]
pub struct GameModel {
    pub(crate) level: LevelDescriptor,
    pub(crate) config: SessionConfig,
    pub(crate) rng: Pcg32,
    pub(crate) phase: GamePhase,
    pub(crate) two_player: bool,
    /// Player two is `None` in a single-player session
    pub(crate) players: [Option<PlayerShip>; 2],
    pub(crate) lives: [u8; 2],
    pub(crate) player_scores: [u64; 2],
    /// Combined total across both players
    pub(crate) score: u64,
    pub(crate) coins: u64,
    pub(crate) bullets_shot: u32,
    pub(crate) ships_destroyed: u32,
    pub(crate) formation: Formation,
    /// Lateral special roamers
    pub(crate) specials: Vec<EnemyShip>,
    pub(crate) special_spawn: Cooldown,
    pub(crate) boss: Option<Boss>,
    pub(crate) bullets: Pool<Bullet>,
    pub(crate) boss_bullets: Vec<BossBullet>,
    pub(crate) items: Pool<DropItem>,
    pub(crate) started_at: Millis,
    pub(crate) seconds_reported: u64,
    pub(crate) time_ticks: u64,
    notifications: Vec<Notification>,
}

impl GameModel {
    /// Start a level attempt from a snapshot
    pub fn new(
        state: &GameState,
        level: LevelDescriptor,
        mut config: SessionConfig,
        seed: u64,
        now: Millis,
    ) -> Self {
        config.reset();
        let mut rng = Pcg32::seed_from_u64(seed);
        let interval = config.upgrades.shooting_interval();

        let (p1_x, p2_x) = if state.two_player {
            (
                SCREEN_WIDTH / 3 - PLAYER_WIDTH / 2,
                SCREEN_WIDTH * 2 / 3 - PLAYER_WIDTH / 2,
            )
        } else {
            (SCREEN_WIDTH / 2 - PLAYER_WIDTH / 2, 0)
        };
        let players = [
            Some(PlayerShip::new(PlayerId::One, p1_x, interval)),
            state
                .two_player
                .then(|| PlayerShip::new(PlayerId::Two, p2_x, interval)),
        ];

        let formation = Formation::new(&level, rng.random());
        let mut special_spawn =
            Cooldown::with_variance(SPECIAL_INTERVAL_MS, SPECIAL_VARIANCE_MS, rng.random());
        special_spawn.reset(now);

        log::info!(
            "Level {} starts ({} player{})",
            level.level,
            if state.two_player { 2 } else { 1 },
            if state.two_player { "s" } else { "" }
        );

        Self {
            level,
            config,
            rng,
            phase: GamePhase::Wave,
            two_player: state.two_player,
            players,
            lives: [
                state.lives_p1,
                if state.two_player { state.lives_p2 } else { 0 },
            ],
            player_scores: [0, 0],
            score: state.score,
            coins: state.coins,
            bullets_shot: state.bullets_shot,
            ships_destroyed: state.ships_destroyed,
            formation,
            specials: Vec::new(),
            special_spawn,
            boss: None,
            bullets: Pool::new(),
            boss_bullets: Vec::new(),
            items: Pool::new(),
            started_at: now,
            seconds_reported: 0,
            time_ticks: 0,
            notifications: Vec::new(),
        }
    }

    pub fn phase(&self) -> GamePhase {
        self.phase
    }

    pub fn is_game_over(&self) -> bool {
        self.phase == GamePhase::GameOver
    }

    pub fn is_level_complete(&self) -> bool {
        self.phase == GamePhase::LevelComplete
    }

    /// Combined score
    pub fn score(&self) -> u64 {
        self.score
    }

    /// Score earned by one player during this attempt
    pub fn player_score(&self, id: PlayerId) -> u64 {
        self.player_scores[id.index()]
    }

    pub fn lives(&self, id: PlayerId) -> u8 {
        self.lives[id.index()]
    }

    pub fn coins(&self) -> u64 {
        self.coins
    }

    pub fn time_ticks(&self) -> u64 {
        self.time_ticks
    }

    pub fn level(&self) -> &LevelDescriptor {
        &self.level
    }

    pub fn config(&self) -> &SessionConfig {
        &self.config
    }

    /// Hand the session configuration back when the attempt is discarded
    pub fn into_config(self) -> SessionConfig {
        self.config
    }

    pub fn player(&self, id: PlayerId) -> Option<&PlayerShip> {
        self.players[id.index()].as_ref()
    }

    pub fn formation(&self) -> &Formation {
        &self.formation
    }

    pub fn specials(&self) -> &[EnemyShip] {
        &self.specials
    }

    pub fn boss(&self) -> Option<&Boss> {
        self.boss.as_ref()
    }

    pub fn bullets(&self) -> impl Iterator<Item = &Bullet> {
        self.bullets.iter()
    }

    pub fn boss_bullets(&self) -> &[BossBullet] {
        &self.boss_bullets
    }

    pub fn items(&self) -> impl Iterator<Item = &DropItem> {
        self.items.iter()
    }

    /// Take the notifications queued since the last drain
    pub fn drain_notifications(&mut self) -> Vec<Notification> {
        std::mem::take(&mut self.notifications)
    }

    /// Snapshot for the next attempt
    pub fn snapshot(&self) -> GameState {
        GameState {
            level: self.level.level,
            score: self.score,
            lives_p1: self.lives[0],
            lives_p2: self.lives[1],
            bullets_shot: self.bullets_shot,
            ships_destroyed: self.ships_destroyed,
            coins: self.coins,
            two_player: self.two_player,
        }
    }

    pub(crate) fn notify(&mut self, notification: Notification) {
        self.notifications.push(notification);
    }

    pub(crate) fn play_sound(&mut self, name: &'static str) {
        if !self.config.muted {
            self.notify(Notification::PlaySound(name));
        }
    }

    /// Boxes of player ships that are currently alive
    pub(crate) fn targets(&self) -> Vec<Rect> {
        self.players
            .iter()
            .flatten()
            .filter(|ship| ship.is_alive())
            .map(|ship| ship.entity.rect())
            .collect()
    }

    /// Credit points to a bullet's owner (neutral bullets count for player
    /// one), the combined total and the coin balance
    pub(crate) fn award(&mut self, owner: Option<PlayerId>, points: u32) {
        let id = owner.unwrap_or(PlayerId::One);
        self.player_scores[id.index()] += points as u64;
        self.score += points as u64;
        self.coins += (points / 10) as u64;
    }

    /// Book a kill: score, counters, notifications and a possible drop
    pub(crate) fn apply_kill(&mut self, kill: Kill) {
        self.award(kill.owner, kill.points);
        self.ships_destroyed += 1;
        self.notify(Notification::EnemyDefeated {
            defeated: kill.defeated,
            by: kill.owner.unwrap_or(PlayerId::One),
        });
        match kill.defeated {
            Defeated::Boss => self.play_sound(sounds::BOSS_EXPLOSION),
            _ => self.play_sound(sounds::ENEMY_EXPLOSION),
        }
        if let Defeated::Ship(kind) = kill.defeated {
            self.roll_drop(kind, kill.at);
        }
    }

    fn roll_drop(&mut self, kind: EnemyKind, at: Vec2) {
        let Some(table) = self.level.drops_for(kind) else {
            return;
        };
        if let Some(item) = ItemKind::roll(table, &mut self.rng) {
            log::debug!("{kind:?} dropped {item:?}");
            self.items.acquire(DropItem::new(at, item));
        }
    }

    /// A lethal touch on a player ship. Ignored while invincible or down.
    pub(crate) fn kill_player(&mut self, index: usize, now: Millis) {
        let Some(ship) = self.players[index].as_mut() else {
            return;
        };
        if ship.destroyed || ship.is_invincible(now) {
            return;
        }
        ship.kill(now);
        self.lives[index] = self.lives[index].saturating_sub(1);
        log::info!(
            "Player {} hit, {} lives left",
            index + 1,
            self.lives[index]
        );
        self.play_sound(sounds::PLAYER_EXPLOSION);
    }

    /// Present players that still have lives
    pub(crate) fn survivors(&self) -> Vec<usize> {
        (0..2)
            .filter(|&i| self.players[i].is_some() && self.lives[i] > 0)
            .collect()
    }

    pub(crate) fn enter_boss_wave(&mut self, now: Millis) {
        self.phase = GamePhase::BossWave;
        self.specials.clear();
        let seed = self.rng.random();
        self.boss = Boss::spawn(&self.level.boss_id, seed, now);
        log::info!("Level {}: formation cleared", self.level.level);
        if self.boss.is_none() {
            self.finish_level();
        }
    }

    /// Close the level: bonuses if anyone survived, game over otherwise
    pub(crate) fn finish_level(&mut self) {
        let survivors = self.survivors();
        if survivors.is_empty() {
            self.game_over();
            return;
        }
        for index in survivors {
            let bonus = self.lives[index].saturating_sub(1) as u64 * LIFE_BONUS_POINTS;
            self.player_scores[index] += bonus;
            self.score += bonus;
        }
        self.coins += self.level.completion_bonus;
        if !self.level.achievement.is_empty() {
            let name = self.level.achievement.clone();
            self.notify(Notification::AchievementUnlocked(name));
        }
        self.play_sound(sounds::LEVEL_COMPLETE);
        self.phase = GamePhase::LevelComplete;
        log::info!(
            "Level {} complete, score {} coins {}",
            self.level.level,
            self.score,
            self.coins
        );
    }

    pub(crate) fn game_over(&mut self) {
        self.phase = GamePhase::GameOver;
        self.play_sound(sounds::GAME_OVER);
        log::info!("Game over at level {}, score {}", self.level.level, self.score);
    }
}
