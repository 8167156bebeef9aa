//! Fixed-cadence simulation tick
//!
//! Each tick runs three ordered passes: update, collide, clean up. Phase
//! changes are evaluated last so a transition lands on the tick that caused it.

use rand::Rng;

use super::boss::BossContext;
use super::collision::collides;
use super::entity::{Bounded, Bullet, EnemyShip, ItemKind, PlayerId, TargetId};
use super::events::{Defeated, Notification, sounds};
use super::pool::Handle;
use super::state::{GameModel, GamePhase, Kill};
use crate::Millis;
use crate::consts::*;

/// Controls for one player during one tick
#[derive(Debug, Clone, Copy, Default)]
pub struct PlayerInput {
    pub left: bool,
    pub right: bool,
    pub shoot: bool,
}

/// Input commands for a single tick (deterministic)
#[derive(Debug, Clone, Default)]
pub struct TickInput {
    pub players: [PlayerInput; 2],
}

impl TickInput {
    /// Input for player one only
    pub fn single(input: PlayerInput) -> Self {
        Self {
            players: [input, PlayerInput::default()],
        }
    }
}

/// Advance the simulation by one tick at wall-clock time `now`
pub fn tick(model: &mut GameModel, input: &TickInput, now: Millis) {
    if model.phase.is_finished() {
        return;
    }
    model.time_ticks += 1;

    model.update(input, now);
    model.collide(now);
    model.clean_up(now);
    model.advance_phase(now);
}

impl GameModel {
    fn update(&mut self, input: &TickInput, now: Millis) {
        self.report_elapsed(now);
        let frozen = self.config.update_freeze(now);

        self.update_players(input, now);

        match self.phase {
            GamePhase::Wave => {
                self.formation.update(frozen);
                if let Some(bullet) = self.formation.shoot(now, &mut self.rng) {
                    self.bullets.acquire(bullet);
                }
                self.update_specials(now);
            }
            GamePhase::BossWave => self.update_boss(now, frozen),
            GamePhase::LevelComplete | GamePhase::GameOver => {}
        }

        for bullet in self.bullets.iter_mut() {
            bullet.update();
        }
        for bullet in &mut self.boss_bullets {
            bullet.update();
        }
        for item in self.items.iter_mut() {
            item.update();
        }
    }

    fn report_elapsed(&mut self, now: Millis) {
        let seconds = now.saturating_sub(self.started_at) / 1_000;
        if seconds > self.seconds_reported {
            self.seconds_reported = seconds;
            self.notify(Notification::ElapsedSeconds(seconds));
        }
    }

    fn update_players(&mut self, input: &TickInput, now: Millis) {
        let speed = self.config.upgrades.movement_speed();
        let mut shots = Vec::new();

        for index in 0..2 {
            let Some(ship) = self.players[index].as_mut() else {
                continue;
            };
            if ship.destroyed {
                if self.lives[index] > 0 && ship.try_respawn(now) {
                    log::debug!("Player {} respawned", index + 1);
                }
                continue;
            }
            let controls = input.players[index];
            if controls.left {
                ship.move_by(-speed);
            }
            if controls.right {
                ship.move_by(speed);
            }
            if controls.shoot && ship.try_shoot(now) {
                let entity = &ship.entity;
                shots.push((ship.id, entity.x + entity.width / 2, entity.y));
            }
        }

        for (owner, x, y) in shots {
            self.fire(owner, x, y);
        }
    }

    /// Emit one shot's worth of bullets centered on `x`
    fn fire(&mut self, owner: PlayerId, x: i32, y: i32) {
        let upgrades = &self.config.upgrades;
        let velocity = upgrades.bullet_velocity();
        let cap = upgrades.penetration_cap;
        for offset in upgrades.bullet_offsets() {
            let bullet = Bullet::new(
                x + offset - BULLET_WIDTH / 2,
                y - BULLET_HEIGHT,
                velocity,
                Some(owner),
                cap,
            );
            self.bullets.acquire(bullet);
            self.bullets_shot += 1;
        }
        self.notify(Notification::ShotFired { player: owner });
        self.play_sound(sounds::SHOOT);
    }

    fn update_specials(&mut self, now: Millis) {
        if self.specials.is_empty() && self.special_spawn.is_finished(now) {
            self.special_spawn.reset(now);
            let from_left = self.rng.random::<bool>();
            self.specials.push(EnemyShip::roamer(from_left));
            log::debug!("Special roamer enters");
        }
        // Roamers ignore the time-freeze
        for special in self.specials.iter_mut().filter(|s| s.is_alive()) {
            special.roam();
        }
    }

    fn update_boss(&mut self, now: Millis, frozen: bool) {
        let targets = self.targets();
        let Some(boss) = self.boss.as_mut() else {
            return;
        };
        boss.update(&BossContext {
            now,
            targets: &targets,
            frozen,
        });
        self.boss_bullets.extend(boss.drain_bullets());
        for ship in self.players.iter_mut().flatten() {
            if ship.is_alive() {
                ship.drift(boss.pull(ship.entity.center()));
                ship.clamp_to_playfield();
            }
        }
    }

    fn collide(&mut self, now: Millis) {
        self.collide_player_bullets(now);
        self.collide_enemy_bullets(now);
        self.collide_boss_attacks(now);
        self.collide_ships(now);
        self.collide_items(now);
    }

    /// Player bullets against formation, roamers, boss and minions
    fn collide_player_bullets(&mut self, now: Millis) {
        let mut kills = Vec::new();
        let mut spent: Vec<Handle> = Vec::new();
        let boss_stage = self.boss.as_ref().map(|b| b.stage_index());

        for handle in self.bullets.handles() {
            let Some(bullet) = self.bullets.get_mut(handle) else {
                continue;
            };
            if !bullet.is_player_bullet() || bullet.spent {
                continue;
            }
            let owner = bullet.owner;

            // Lowest ships first; bullets travel up
            let mut hits: Vec<(usize, i32)> = self
                .formation
                .live_ships()
                .filter(|(i, ship)| {
                    !bullet.has_hit(TargetId::Formation(*i)) && collides(&bullet.entity, &ship.entity)
                })
                .map(|(i, ship)| (i, ship.entity.y))
                .collect();
            hits.sort_by_key(|&(_, y)| std::cmp::Reverse(y));
            for (index, _) in hits {
                let Some(ship) = self.formation.ship(index) else {
                    continue;
                };
                let (kind, points, at) = (ship.kind, ship.points, ship.entity.center());
                if self.formation.hit(index, now) {
                    kills.push(Kill {
                        owner,
                        points,
                        defeated: Defeated::Ship(kind),
                        at,
                    });
                }
                if bullet.register_hit(TargetId::Formation(index)) {
                    break;
                }
            }

            for (i, special) in self.specials.iter_mut().enumerate() {
                if bullet.spent {
                    break;
                }
                let target = TargetId::Special(i);
                if special.is_alive()
                    && !bullet.has_hit(target)
                    && collides(&bullet.entity, &special.entity)
                {
                    let at = special.entity.center();
                    if special.hit(now) {
                        kills.push(Kill {
                            owner,
                            points: special.points,
                            defeated: Defeated::Ship(special.kind),
                            at,
                        });
                    }
                    bullet.register_hit(target);
                }
            }

            if let Some(boss) = self.boss.as_mut() {
                if !bullet.spent && !boss.destroyed && collides(&bullet.entity, &*boss) {
                    let at = boss.entity.center();
                    if boss.take_hit(1, now) {
                        kills.push(Kill {
                            owner,
                            points: boss.points,
                            defeated: Defeated::Boss,
                            at,
                        });
                    }
                    // Nothing passes through a boss
                    bullet.register_hit(TargetId::Boss);
                    bullet.spent = true;
                }

                let struck: Vec<(u32, glam::Vec2)> = boss
                    .minions()
                    .iter()
                    .filter(|m| {
                        !m.destroyed
                            && !bullet.has_hit(TargetId::Minion(m.id))
                            && collides(&bullet.entity, *m)
                    })
                    .map(|m| (m.id, m.entity.center()))
                    .collect();
                for (id, at) in struck {
                    if bullet.spent {
                        break;
                    }
                    if let Some(points) = boss.hit_minion(id) {
                        kills.push(Kill {
                            owner,
                            points,
                            defeated: Defeated::Minion,
                            at,
                        });
                    }
                    bullet.register_hit(TargetId::Minion(id));
                }
            }

            if bullet.spent {
                spent.push(handle);
            }
        }

        self.bullets.release_all(spent);
        for kill in kills {
            self.apply_kill(kill);
        }
        let new_stage = self.boss.as_ref().map(|b| b.stage_index());
        if boss_stage.is_some() && new_stage != boss_stage {
            self.play_sound(sounds::BOSS_PHASE);
        }
    }

    /// Enemy bullets against players
    fn collide_enemy_bullets(&mut self, now: Millis) {
        let mut victims = Vec::new();
        let mut spent = Vec::new();
        for handle in self.bullets.handles() {
            let Some(bullet) = self.bullets.get(handle) else {
                continue;
            };
            if bullet.is_player_bullet() {
                continue;
            }
            let victim = self.players.iter().flatten().find(|ship| {
                ship.is_alive() && !ship.is_invincible(now) && collides(&bullet.entity, &ship.entity)
            });
            if let Some(ship) = victim {
                victims.push(ship.id.index());
                spent.push(handle);
            }
        }
        self.bullets.release_all(spent);
        for index in victims {
            self.kill_player(index, now);
        }
    }

    /// Boss projectiles and laser against players
    fn collide_boss_attacks(&mut self, now: Millis) {
        let mut victims = Vec::new();
        let players = &self.players;
        self.boss_bullets.retain(|bullet| {
            let victim = players.iter().flatten().find(|ship| {
                ship.is_alive() && !ship.is_invincible(now) && collides(bullet, &ship.entity)
            });
            match victim {
                Some(ship) => {
                    victims.push(ship.id.index());
                    false
                }
                None => true,
            }
        });

        if let Some(boss) = self.boss.as_ref() {
            for ship in self.players.iter().flatten() {
                if ship.is_alive() && boss.laser_hits(&ship.entity.rect()) {
                    victims.push(ship.id.index());
                }
            }
        }

        for index in victims {
            self.kill_player(index, now);
        }
    }

    /// Body contact: any enemy touching a player ship destroys it
    fn collide_ships(&mut self, now: Millis) {
        let mut victims = Vec::new();
        for ship in self.players.iter().flatten() {
            if !ship.is_alive() || ship.is_invincible(now) {
                continue;
            }
            let body = &ship.entity;
            let touched = self
                .formation
                .live_ships()
                .any(|(_, enemy)| collides(body, &enemy.entity))
                || self
                    .specials
                    .iter()
                    .any(|s| s.is_alive() && collides(body, &s.entity))
                || self.boss.as_ref().is_some_and(|boss| {
                    (!boss.destroyed && collides(body, boss))
                        || boss
                            .minions()
                            .iter()
                            .any(|m| !m.destroyed && collides(body, m))
                });
            if touched {
                victims.push(ship.id.index());
            }
        }
        for index in victims {
            self.kill_player(index, now);
        }
    }

    /// Pickups: the first living ship to touch an item consumes it
    fn collide_items(&mut self, now: Millis) {
        let mut pickups = Vec::new();
        for handle in self.items.handles() {
            let Some(item) = self.items.get(handle) else {
                continue;
            };
            let picker = self
                .players
                .iter()
                .flatten()
                .find(|ship| ship.is_alive() && collides(&item.entity, &ship.entity));
            if let Some(ship) = picker {
                pickups.push((handle, ship.id, item.kind, item.entity.center()));
            }
        }
        for (handle, player, kind, at) in pickups {
            self.items.release(handle);
            self.apply_item(player, kind, at, now);
        }
    }

    fn apply_item(&mut self, player: PlayerId, kind: ItemKind, at: glam::Vec2, now: Millis) {
        let index = player.index();
        log::debug!("Player {} picked up {kind:?}", index + 1);
        match kind {
            ItemKind::Heal => {
                self.lives[index] = (self.lives[index] + 1).min(MAX_LIVES);
            }
            ItemKind::Shield => {
                if let Some(ship) = self.players[index].as_mut() {
                    ship.grant_invincibility(now, SHIELD_MS);
                }
            }
            ItemKind::Slow => self.formation.activate_slowdown(),
            ItemKind::Stop => self.config.freeze(now),
            ItemKind::Push => self.formation.push_up(PUSH_DISTANCE),
            ItemKind::Explode => {
                let caught: Vec<usize> = self
                    .formation
                    .live_ships()
                    .filter(|(_, ship)| ship.entity.center().distance(at) < EXPLODE_RADIUS)
                    .map(|(i, _)| i)
                    .collect();
                for index in caught {
                    let Some(ship) = self.formation.ship(index) else {
                        continue;
                    };
                    let (kind, points, center) = (ship.kind, ship.points, ship.entity.center());
                    if self.formation.destroy(index, now) {
                        self.apply_kill(Kill {
                            owner: Some(player),
                            points,
                            defeated: Defeated::Ship(kind),
                            at: center,
                        });
                    }
                }
            }
        }
        self.play_sound(sounds::ITEM_PICKUP);
    }

    /// Recycle what left the playfield and compact the dead
    fn clean_up(&mut self, now: Millis) {
        self.bullets.release_where(|b| b.spent || b.entity.is_off_screen());
        self.items.release_where(|item| item.entity.is_off_screen());
        self.boss_bullets.retain(|b| !b.is_off_screen());

        self.formation.clean_up(now);
        self.specials.retain(|s| {
            let departed = s.is_alive() && s.entity.is_off_screen();
            !(s.is_removable(now) || departed)
        });
        if let Some(boss) = self.boss.as_mut() {
            boss.prune_minions();
        }
    }

    fn advance_phase(&mut self, now: Millis) {
        if self.survivors().is_empty() {
            self.game_over();
            return;
        }
        match self.phase {
            GamePhase::Wave if self.formation.is_empty() => self.enter_boss_wave(now),
            GamePhase::BossWave if self.boss.as_ref().is_none_or(|b| b.is_finished(now)) => {
                self.finish_level();
            }
            _ => {}
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::level::{LevelDescriptor, default_levels};
    use crate::settings::{SessionConfig, ShipUpgrades};
    use crate::sim::boss::{BOSS_EXPLOSION_MS, Pattern, Telegraph};
    use crate::sim::entity::{BossBullet, DropItem, EnemyKind};
    use crate::sim::render::render_list;
    use crate::sim::state::GameState;
    use glam::Vec2;
    use std::collections::BTreeMap;

    /// 5x4 formation of one enemy kind, no drops, slow enemy fire
    fn level_of(kind: EnemyKind, boss_id: &str) -> LevelDescriptor {
        let mut level = default_levels().remove(0);
        level.formation_width = 5;
        level.formation_height = 4;
        level.base_speed = 60;
        level.shooting_interval = 1_000_000;
        level.shooting_variance = 0;
        level.enemies = BTreeMap::from([(kind, 20)]);
        level.item_drops = BTreeMap::new();
        level.boss_id = boss_id.to_string();
        level
    }

    fn model(two_player: bool, level: LevelDescriptor) -> GameModel {
        GameModel::new(
            &GameState::new(two_player),
            level,
            SessionConfig::default(),
            12345,
            0,
        )
    }

    /// Drop the enemies' opening shot so it cannot interfere
    fn clear_enemy_bullets(model: &mut GameModel) {
        model.bullets.release_where(|b| !b.is_player_bullet());
    }

    /// A bullet that overlaps a formation ship after this tick's move
    fn bullet_on_ship(model: &GameModel, index: usize, owner: Option<PlayerId>, cap: u32) -> Bullet {
        let ship = model.formation.ship(index).expect("ship exists");
        let center = ship.entity.center();
        let mut bullet = Bullet::new(
            center.x as i32 - BULLET_WIDTH / 2,
            center.y as i32,
            PLAYER_BULLET_SPEED,
            owner,
            cap,
        );
        bullet.entity.y -= PLAYER_BULLET_SPEED;
        bullet
    }

    fn live_indices(model: &GameModel) -> Vec<usize> {
        model.formation.live_ships().map(|(i, _)| i).collect()
    }

    fn place_player(model: &mut GameModel, id: PlayerId, center: Vec2) {
        let ship = model.players[id.index()].as_mut().expect("player present");
        ship.entity.set_center(center);
    }

    fn player_center(model: &GameModel, id: PlayerId) -> Vec2 {
        model.player(id).expect("player present").entity.center()
    }

    /// Single-player model that has just entered the boss wave at `EXPLOSION_MS`
    fn boss_wave(boss_id: &str) -> GameModel {
        let mut model = model(false, level_of(EnemyKind::Octopus, boss_id));
        for index in live_indices(&model) {
            model.formation.destroy(index, 0);
        }
        tick(&mut model, &TickInput::default(), EXPLOSION_MS);
        assert_eq!(model.phase(), GamePhase::BossWave);
        model
    }

    #[test]
    fn test_full_clear_moves_to_boss_wave() {
        let mut model = model(false, level_of(EnemyKind::Octopus, "omega"));
        let coins = model.coins();
        let indices = live_indices(&model);
        assert_eq!(indices.len(), 20);

        // Nineteen go down first
        for &index in &indices[..19] {
            let bullet = bullet_on_ship(&model, index, Some(PlayerId::One), 0);
            model.bullets.acquire(bullet);
        }
        tick(&mut model, &TickInput::default(), 16);
        clear_enemy_bullets(&mut model);
        assert_eq!(model.formation.live_count(), 1);

        tick(&mut model, &TickInput::default(), 16 + EXPLOSION_MS);
        assert_eq!(model.phase(), GamePhase::Wave);

        // The last one
        let bullet = bullet_on_ship(&model, indices[19], Some(PlayerId::One), 0);
        model.bullets.acquire(bullet);
        let killed_at = 2_000;
        tick(&mut model, &TickInput::default(), killed_at);
        assert_eq!(model.formation.live_count(), 0);
        assert_eq!(model.phase(), GamePhase::Wave, "still exploding");

        tick(&mut model, &TickInput::default(), killed_at + EXPLOSION_MS - 1);
        assert_eq!(model.phase(), GamePhase::Wave);
        tick(&mut model, &TickInput::default(), killed_at + EXPLOSION_MS);
        assert_eq!(model.phase(), GamePhase::BossWave);
        assert!(model.boss().is_some());

        assert_eq!(model.player_score(PlayerId::One), 200);
        assert_eq!(model.score(), 200);
        assert_eq!(model.coins(), coins + 20);
        assert_eq!(model.snapshot().ships_destroyed, 20);
    }

    #[test]
    fn test_score_goes_to_bullet_owner() {
        let mut model = model(true, level_of(EnemyKind::Crab, "omega"));
        let indices = live_indices(&model);

        let bullet = bullet_on_ship(&model, indices[0], Some(PlayerId::Two), 0);
        model.bullets.acquire(bullet);
        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.player_score(PlayerId::Two), 20);
        assert_eq!(model.player_score(PlayerId::One), 0);
        assert_eq!(model.score(), 20);

        let bullet = bullet_on_ship(&model, indices[1], None, 0);
        model.bullets.acquire(bullet);
        tick(&mut model, &TickInput::default(), 32);
        assert_eq!(model.player_score(PlayerId::One), 20);
        assert_eq!(model.player_score(PlayerId::Two), 20);
        assert_eq!(model.score(), 40);
        assert_eq!(model.coins(), 4);
    }

    #[test]
    fn test_penetrating_bullet_recycled_on_second_kill() {
        let mut level = level_of(EnemyKind::Octopus, "");
        level.formation_width = 1;
        level.formation_height = 2;
        level.enemies = BTreeMap::from([(EnemyKind::Octopus, 2)]);
        let mut model = model(false, level);
        let column = model.formation.column(0).expect("one column").to_vec();
        let (top, bottom) = (column[0], column[1]);

        let bullet = bullet_on_ship(&model, bottom, Some(PlayerId::One), 1);
        let handle = model.bullets.acquire(bullet);
        let mut now = 16;
        tick(&mut model, &TickInput::default(), now);
        clear_enemy_bullets(&mut model);
        assert!(!model.formation.ship(bottom).expect("bottom").is_alive());
        assert!(model.formation.ship(top).expect("top").is_alive());
        let bullet = model.bullets.get(handle).expect("bullet survives the first kill");
        assert_eq!(bullet.penetration_count, 1);

        while model.formation.ship(top).expect("top").is_alive() {
            assert!(model.bullets.is_active(handle), "bullet lost before second kill");
            now += 16;
            tick(&mut model, &TickInput::default(), now);
            assert!(now < 2_000, "bullet never reached the top ship");
        }
        assert!(!model.bullets.is_active(handle));
        assert_eq!(model.score(), 20);
    }

    #[test]
    fn test_enemy_bullet_costs_a_life_unless_invincible() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        clear_enemy_bullets(&mut model);
        let ship = model.player(PlayerId::One).expect("player one").entity.clone();
        let incoming = || {
            let mut bullet = Bullet::new(ship.x + 5, ship.y, ENEMY_BULLET_SPEED, None, 0);
            bullet.entity.y -= ENEMY_BULLET_SPEED;
            bullet
        };

        if let Some(p) = model.players[0].as_mut() {
            p.grant_invincibility(0, SHIELD_MS);
        }
        model.bullets.acquire(incoming());
        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES);

        model.bullets.release_where(|_| true);
        model.bullets.acquire(incoming());
        tick(&mut model, &TickInput::default(), SHIELD_MS + 16);
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES - 1);
        assert!(!model.player(PlayerId::One).expect("player one").is_alive());
        assert_eq!(model.phase(), GamePhase::Wave);
    }

    #[test]
    fn test_game_over_when_last_life_lost() {
        let mut state = GameState::new(false);
        state.lives_p1 = 1;
        let mut model = GameModel::new(
            &state,
            level_of(EnemyKind::Octopus, ""),
            SessionConfig::default(),
            1,
            0,
        );
        model.kill_player(0, 10);
        tick(&mut model, &TickInput::default(), 16);
        assert!(model.is_game_over());
        assert_eq!(model.snapshot().lives_p1, 0);
        // Finished models ignore further ticks
        let ticks = model.time_ticks();
        tick(&mut model, &TickInput::default(), 32);
        assert_eq!(model.time_ticks(), ticks);
    }

    #[test]
    fn test_two_players_need_both_out() {
        let mut state = GameState::new(true);
        state.lives_p1 = 1;
        let mut model = GameModel::new(
            &state,
            level_of(EnemyKind::Octopus, ""),
            SessionConfig::default(),
            1,
            0,
        );
        model.kill_player(0, 10);
        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.phase(), GamePhase::Wave);
        assert_eq!(model.lives(PlayerId::Two), INITIAL_LIVES);
    }

    #[test]
    fn test_no_boss_completes_level_with_bonuses() {
        let mut level = level_of(EnemyKind::Octopus, "kraken");
        level.formation_width = 1;
        level.formation_height = 1;
        level.enemies = BTreeMap::from([(EnemyKind::Octopus, 1)]);
        level.completion_bonus = 50;
        level.achievement = "first_steps".into();
        let mut model = model(false, level);

        model.formation.destroy(0, 0);
        tick(&mut model, &TickInput::default(), EXPLOSION_MS);
        assert!(model.is_level_complete());
        // Two spare lives worth of bonus, no kill points (destroyed directly)
        assert_eq!(model.score(), 2 * LIFE_BONUS_POINTS);
        assert_eq!(model.coins(), 50);
        let notes = model.drain_notifications();
        assert!(notes.contains(&Notification::AchievementUnlocked("first_steps".into())));
        assert!(notes.contains(&Notification::PlaySound(sounds::LEVEL_COMPLETE)));
    }

    #[test]
    fn test_boss_kill_finishes_level() {
        let mut model = model(false, level_of(EnemyKind::Octopus, "omega"));
        for index in live_indices(&model) {
            model.formation.destroy(index, 0);
        }
        tick(&mut model, &TickInput::default(), EXPLOSION_MS);
        assert_eq!(model.phase(), GamePhase::BossWave);

        let boss = model.boss.as_mut().expect("omega spawned");
        let health = boss.health;
        boss.take_hit(health - 1, EXPLOSION_MS);
        let center = boss.entity.center();
        let mut bullet = Bullet::new(
            center.x as i32,
            center.y as i32,
            PLAYER_BULLET_SPEED,
            Some(PlayerId::One),
            3,
        );
        bullet.entity.y -= PLAYER_BULLET_SPEED;
        let handle = model.bullets.acquire(bullet);
        // Frozen so the boss stays put under the bullet
        model.config.freeze(EXPLOSION_MS);
        tick(&mut model, &TickInput::default(), EXPLOSION_MS + 16);
        assert!(!model.bullets.is_active(handle), "a boss hit consumes the bullet");
        let boss = model.boss().expect("boss still exploding");
        assert!(boss.destroyed);
        assert_eq!(model.player_score(PlayerId::One), 1_500);
        assert!(!model.is_level_complete());

        tick(&mut model, &TickInput::default(), EXPLOSION_MS + BOSS_EXPLOSION_MS);
        assert!(!model.is_level_complete(), "still exploding");

        tick(&mut model, &TickInput::default(), EXPLOSION_MS + 16 + BOSS_EXPLOSION_MS);
        assert!(model.is_level_complete());
    }

    #[test]
    fn test_stop_item_freezes_formation() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        let ship = model.player(PlayerId::One).expect("player one").entity.center();
        model.items.acquire(DropItem::new(ship, ItemKind::Stop));
        tick(&mut model, &TickInput::default(), 16);
        assert!(model.config().is_frozen(16));
        assert_eq!(model.items().count(), 0);

        let start = (model.formation.x, model.formation.y);
        let mut now = 16;
        for _ in 0..200 {
            now += 16;
            tick(&mut model, &TickInput::default(), now.min(FREEZE_MS));
        }
        assert_eq!((model.formation.x, model.formation.y), start);

        now = 16 + FREEZE_MS;
        for _ in 0..200 {
            now += 16;
            tick(&mut model, &TickInput::default(), now);
        }
        assert!(!model.config().is_frozen(now));
        assert_ne!((model.formation.x, model.formation.y), start);
    }

    #[test]
    fn test_boss_bullet_costs_a_life_unless_invincible() {
        let vel = Vec2::new(0.0, 3.0);
        for shielded in [false, true] {
            let mut model = model(false, level_of(EnemyKind::Octopus, ""));
            if shielded {
                if let Some(p) = model.players[0].as_mut() {
                    p.grant_invincibility(0, SHIELD_MS);
                }
            }
            let center = player_center(&model, PlayerId::One);
            model.boss_bullets.push(BossBullet::new(center - vel, vel));
            tick(&mut model, &TickInput::default(), 16);
            if shielded {
                assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES);
                assert_eq!(model.boss_bullets().len(), 1, "bullet passes through");
            } else {
                assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES - 1);
                assert!(model.boss_bullets().is_empty(), "bullet consumed by the hit");
            }
        }
    }

    #[test]
    fn test_touching_formation_ship_kills_only_the_player() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        let index = live_indices(&model)[0];
        let at = model.formation.ship(index).expect("ship").entity.center();
        place_player(&mut model, PlayerId::One, at);
        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES - 1);
        assert!(!model.player(PlayerId::One).expect("player one").is_alive());
        assert_eq!(model.formation.live_count(), 20);
        assert_eq!(model.score(), 0);
    }

    #[test]
    fn test_invincible_player_survives_contact() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        let index = live_indices(&model)[0];
        let at = model.formation.ship(index).expect("ship").entity.center();
        place_player(&mut model, PlayerId::One, at);
        if let Some(p) = model.players[0].as_mut() {
            p.grant_invincibility(0, SHIELD_MS);
        }
        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES);
        assert!(model.player(PlayerId::One).expect("player one").is_alive());
    }

    #[test]
    fn test_touching_boss_kills_player() {
        let mut model = boss_wave("omega");
        // First boss tick fires the opening volley; clear it so only contact counts
        tick(&mut model, &TickInput::default(), EXPLOSION_MS + 16);
        model.boss_bullets.clear();
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES);

        let at = model.boss().expect("boss").entity.center();
        place_player(&mut model, PlayerId::One, at);
        tick(&mut model, &TickInput::default(), EXPLOSION_MS + 32);
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES - 1);
        assert!(!model.boss().expect("boss").destroyed);
    }

    #[test]
    fn test_touching_minion_kills_player() {
        let mut model = boss_wave("hive");
        let now = EXPLOSION_MS;
        let boss = model.boss.as_mut().expect("hive spawned");
        boss.take_hit(6, now);
        assert_eq!(boss.minions().len(), 2);
        tick(&mut model, &TickInput::default(), now + 16);
        model.boss_bullets.clear();

        // Frozen so the minion stays where it is put
        model.config.freeze(now + 16);
        let target = player_center(&model, PlayerId::One);
        if let Some(boss) = model.boss.as_mut() {
            boss.minions_mut()[0].entity.set_center(target);
        }
        tick(&mut model, &TickInput::default(), now + 32);
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES - 1);
    }

    #[test]
    fn test_laser_kills_player_while_firing() {
        let mut model = boss_wave("abyss");
        let mut now = EXPLOSION_MS;
        let boss = model.boss.as_mut().expect("abyss spawned");
        boss.take_hit(75, now);
        assert!(matches!(boss.pattern(), Pattern::TimeGap(_)));

        while model.lives(PlayerId::One) == INITIAL_LIVES {
            now += TICK_MS;
            tick(&mut model, &TickInput::default(), now);
            assert!(now < EXPLOSION_MS + 5_000, "laser never reached the player");
        }
        assert!(model.boss_bullets().is_empty());
        assert!(matches!(
            model.boss().and_then(|b| b.telegraph()),
            Some(Telegraph::Line { firing: true, .. })
        ));
    }

    #[test]
    fn test_black_hole_pulls_players() {
        let mut model = boss_wave("abyss");
        let now = EXPLOSION_MS;
        let start = player_center(&model, PlayerId::One);
        let boss = model.boss.as_mut().expect("abyss spawned");
        boss.take_hit(45, now);
        let Pattern::BlackHole(hole) = boss.pattern_mut() else {
            panic!("expected the black hole stage");
        };
        hole.open_at(start + Vec2::new(100.0, 0.0), now);

        for i in 1..=4 {
            tick(&mut model, &TickInput::default(), now + i * TICK_MS);
        }
        let end = player_center(&model, PlayerId::One);
        assert!(end.x - start.x >= 9.0, "pulled only {}px", end.x - start.x);
        assert_eq!(end.y, start.y);
    }

    #[test]
    fn test_slow_push_and_shield_pickups() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        let center = player_center(&model, PlayerId::One);

        model.items.acquire(DropItem::new(center, ItemKind::Slow));
        tick(&mut model, &TickInput::default(), 16);
        assert!(model.formation.is_slowed());

        let before = model.formation.y;
        model.items.acquire(DropItem::new(center, ItemKind::Push));
        tick(&mut model, &TickInput::default(), 32);
        assert_eq!(model.formation.y, (before - PUSH_DISTANCE).max(TOP_MARGIN));

        model.items.acquire(DropItem::new(center, ItemKind::Shield));
        tick(&mut model, &TickInput::default(), 48);
        let ship = model.player(PlayerId::One).expect("player one");
        assert!(ship.is_invincible(48 + SHIELD_MS - 1));
        assert!(!ship.is_invincible(48 + SHIELD_MS));
        assert_eq!(model.items().count(), 0);
    }

    #[test]
    fn test_explode_pickup_credits_picker() {
        let mut model = model(true, level_of(EnemyKind::Octopus, ""));
        let bottom_middle = *model
            .formation
            .column(2)
            .and_then(|c| c.last())
            .expect("middle column");
        let spot = model.formation.ship(bottom_middle).expect("ship").entity.center()
            + Vec2::new(0.0, 50.0);
        place_player(&mut model, PlayerId::Two, spot);
        let item = DropItem::new(spot, ItemKind::Explode);
        let blast = item.entity.center() + Vec2::new(0.0, ITEM_SPEED as f32);
        let caught: Vec<u32> = model
            .formation
            .live_ships()
            .filter(|(_, ship)| ship.entity.center().distance(blast) < EXPLODE_RADIUS)
            .map(|(_, ship)| ship.points)
            .collect();
        let expected = caught.len();
        assert!(expected >= 5);
        model.items.acquire(item);

        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.formation.live_count(), 20 - expected);
        let points: u64 = caught.iter().map(|&p| u64::from(p)).sum();
        assert_eq!(model.player_score(PlayerId::Two), points);
        assert_eq!(model.player_score(PlayerId::One), 0);
        assert_eq!(model.snapshot().ships_destroyed, expected as u32);
        assert!(model.player(PlayerId::Two).expect("player two").is_alive());
    }

    #[test]
    fn test_item_drop_and_heal_pickup() {
        let mut level = level_of(EnemyKind::Octopus, "");
        level.item_drops = BTreeMap::from([(
            EnemyKind::Octopus,
            BTreeMap::from([(ItemKind::Heal, 1.0)]),
        )]);
        let mut model = model(false, level);
        let bullet = bullet_on_ship(&model, 0, Some(PlayerId::One), 0);
        model.bullets.acquire(bullet);
        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.items().count(), 1);
        assert_eq!(model.items().next().map(|i| i.kind), Some(ItemKind::Heal));

        model.items.release_where(|_| true);
        let ship = model.player(PlayerId::One).expect("player one").entity.center();
        model.items.acquire(DropItem::new(ship, ItemKind::Heal));
        tick(&mut model, &TickInput::default(), 32);
        assert_eq!(model.lives(PlayerId::One), INITIAL_LIVES + 1);
    }

    #[test]
    fn test_shooting_uses_upgrades() {
        let config = SessionConfig::new(ShipUpgrades {
            bullet_count: 3,
            penetration_cap: 2,
            ..Default::default()
        });
        let mut model = GameModel::new(
            &GameState::new(false),
            level_of(EnemyKind::Octopus, ""),
            config,
            1,
            0,
        );
        clear_enemy_bullets(&mut model);
        let shoot = TickInput::single(PlayerInput {
            shoot: true,
            ..Default::default()
        });
        tick(&mut model, &shoot, 16);
        let shots: Vec<&Bullet> = model.bullets().filter(|b| b.is_player_bullet()).collect();
        assert_eq!(shots.len(), 3);
        assert!(shots.iter().all(|b| b.penetration_cap == 2 && b.owner == Some(PlayerId::One)));
        assert_eq!(model.snapshot().bullets_shot, 3);
        assert!(
            model
                .drain_notifications()
                .contains(&Notification::ShotFired { player: PlayerId::One })
        );

        // Cooldown holds the next shot back
        tick(&mut model, &shoot, 32);
        assert_eq!(model.bullets().filter(|b| b.is_player_bullet()).count(), 3);
    }

    #[test]
    fn test_bullets_recycled_off_screen() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        clear_enemy_bullets(&mut model);
        model
            .bullets
            .acquire(Bullet::new(5, -5, PLAYER_BULLET_SPEED, Some(PlayerId::One), 0));
        tick(&mut model, &TickInput::default(), 16);
        assert_eq!(model.bullets().filter(|b| b.is_player_bullet()).count(), 0);
        assert_eq!(model.bullets.free_len(), 1);
    }

    #[test]
    fn test_muted_session_has_no_sounds() {
        let config = SessionConfig {
            muted: true,
            ..Default::default()
        };
        let mut model = GameModel::new(
            &GameState::new(false),
            level_of(EnemyKind::Octopus, ""),
            config,
            1,
            0,
        );
        let shoot = TickInput::single(PlayerInput {
            shoot: true,
            ..Default::default()
        });
        tick(&mut model, &shoot, 16);
        let notes = model.drain_notifications();
        assert!(!notes.iter().any(|n| matches!(n, Notification::PlaySound(_))));
        assert!(notes.contains(&Notification::ShotFired { player: PlayerId::One }));
    }

    #[test]
    fn test_elapsed_seconds_reported_once() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        tick(&mut model, &TickInput::default(), 999);
        tick(&mut model, &TickInput::default(), 1_000);
        tick(&mut model, &TickInput::default(), 1_016);
        let seconds: Vec<_> = model
            .drain_notifications()
            .into_iter()
            .filter(|n| matches!(n, Notification::ElapsedSeconds(_)))
            .collect();
        assert_eq!(seconds, vec![Notification::ElapsedSeconds(1)]);
    }

    #[test]
    fn test_special_roamer_spawns_and_leaves() {
        let mut model = model(false, level_of(EnemyKind::Octopus, ""));
        let spawn_at = SPECIAL_INTERVAL_MS + SPECIAL_VARIANCE_MS;
        tick(&mut model, &TickInput::default(), spawn_at);
        assert_eq!(model.specials().len(), 1);
        let mut now = spawn_at;
        for _ in 0..400 {
            now += 16;
            tick(&mut model, &TickInput::default(), now);
            if model.specials().is_empty() {
                break;
            }
        }
        assert!(model.specials().is_empty(), "roamer never left the screen");
    }

    #[test]
    fn test_determinism() {
        let run = || {
            let mut model = model(true, default_levels().remove(2));
            let input = TickInput {
                players: [
                    PlayerInput {
                        left: true,
                        shoot: true,
                        ..Default::default()
                    },
                    PlayerInput {
                        right: true,
                        shoot: true,
                        ..Default::default()
                    },
                ],
            };
            for i in 1..=600 {
                tick(&mut model, &input, i * 16);
            }
            (model.snapshot(), render_list(&model))
        };
        assert_eq!(run(), run());
    }
}
