//! Enemy formation: diagonal bounce, speed scaling and shooter rotation
//!
//! Ships live in an arena that only grows for the life of the level. Columns
//! hold arena indices top to bottom; destroyed ships stay in their column as
//! tombstones until `clean_up` compacts them out after their explosion.

use rand::Rng;
use rand_pcg::Pcg32;

use super::cooldown::{Cooldown, TickCooldown};
use super::entity::{Bullet, EnemyShip};
use crate::Millis;
use crate::consts::*;
use crate::level::LevelDescriptor;

/// Ticks between steps at the thinnest formation
pub const MIN_SPEED: u32 = 10;
pub const ORIGINAL_X_SPEED: i32 = 8;
pub const SLOWED_X_SPEED: i32 = 4;
pub const Y_SPEED: i32 = 4;
/// Movement steps a slowdown lasts
pub const SLOWDOWN_STEPS: u32 = 30;
pub const INIT_POS_X: i32 = 20;
pub const INIT_POS_Y: i32 = 100;
/// Distance between neighbouring ships, origin to origin
pub const SEPARATION_DISTANCE: i32 = 40;

/// One of the four diagonal headings
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    DownRight,
    DownLeft,
    UpRight,
    UpLeft,
}

impl Direction {
    /// Unit step signs (x, y)
    pub fn signs(self) -> (i32, i32) {
        match self {
            Direction::DownRight => (1, 1),
            Direction::DownLeft => (-1, 1),
            Direction::UpRight => (1, -1),
            Direction::UpLeft => (-1, -1),
        }
    }
}

/// Which playfield limits the formation's box currently touches
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Boundaries {
    pub at_bottom: bool,
    pub at_top: bool,
    pub at_left: bool,
    pub at_right: bool,
}

/// Heading after checking the limits. A corner reverses both axes, an edge
/// reverses the axis that hit it, otherwise the heading is kept.
pub fn next_direction(direction: Direction, b: Boundaries) -> Direction {
    use Direction::*;
    match direction {
        DownRight => match (b.at_bottom, b.at_right) {
            (true, true) => UpLeft,
            (true, false) => UpRight,
            (false, true) => DownLeft,
            (false, false) => DownRight,
        },
        DownLeft => match (b.at_bottom, b.at_left) {
            (true, true) => UpRight,
            (true, false) => UpLeft,
            (false, true) => DownRight,
            (false, false) => DownLeft,
        },
        UpRight => match (b.at_top, b.at_right) {
            (true, true) => DownLeft,
            (true, false) => DownRight,
            (false, true) => UpLeft,
            (false, false) => UpRight,
        },
        UpLeft => match (b.at_top, b.at_left) {
            (true, true) => DownRight,
            (true, false) => DownLeft,
            (false, true) => UpRight,
            (false, false) => UpLeft,
        },
    }
}

/// Ticks between steps: `floor((live/total)^2 * base) + MIN_SPEED`.
/// An empty formation (total 0) moves at the minimum.
pub fn movement_speed(live: usize, total: usize, base_speed: u32) -> u32 {
    if total == 0 {
        return MIN_SPEED;
    }
    let live = live.min(total) as u64;
    let total = total as u64;
    // Integer form of the floor keeps exact boundaries exact
    let scaled = live * live * base_speed as u64 / (total * total);
    scaled as u32 + MIN_SPEED
}

/// The enemy grid
#[derive(Debug, Clone)]
pub struct Formation {
    ships: Vec<EnemyShip>,
    columns: Vec<Vec<usize>>,
    /// One arena index per non-empty column
    shooters: Vec<usize>,
    total: usize,
    base_speed: u32,
    direction: Direction,
    movement_speed: u32,
    step_counter: TickCooldown,
    shooting: Cooldown,
    slowdown_steps: u32,
    pub x: i32,
    pub y: i32,
    pub width: i32,
    pub height: i32,
}

impl Formation {
    /// Build the grid for a level; `seed` drives the shooting variance
    pub fn new(level: &LevelDescriptor, seed: u64) -> Self {
        let kinds = level.formation_kinds();
        let width = level.formation_width as usize;
        let mut ships = Vec::with_capacity(kinds.len());
        let mut columns: Vec<Vec<usize>> = vec![Vec::new(); width];

        for (i, kind) in kinds.into_iter().enumerate() {
            let row = (i / width.max(1)) as i32;
            let col = i % width.max(1);
            let x = INIT_POS_X + col as i32 * SEPARATION_DISTANCE;
            let y = INIT_POS_Y + row * SEPARATION_DISTANCE;
            ships.push(EnemyShip::new(x, y, kind));
            columns[col].push(i);
        }

        let shooters = columns
            .iter()
            .filter_map(|column| column.last().copied())
            .collect();

        let total = ships.len();
        let speed = movement_speed(total, total, level.base_speed);
        let mut formation = Self {
            ships,
            columns,
            shooters,
            total,
            base_speed: level.base_speed,
            direction: Direction::DownRight,
            movement_speed: speed,
            step_counter: TickCooldown::new(speed),
            shooting: Cooldown::with_variance(
                level.shooting_interval,
                level.shooting_variance,
                seed,
            ),
            slowdown_steps: 0,
            x: INIT_POS_X,
            y: INIT_POS_Y,
            width: 0,
            height: 0,
        };
        formation.recompute_bounds();
        log::debug!(
            "Formation {}x{} built with {} ships",
            level.formation_width,
            level.formation_height,
            formation.total
        );
        formation
    }

    /// Per-tick movement. A frozen formation still rescales its speed.
    pub fn update(&mut self, frozen: bool) {
        self.recompute_bounds();
        self.movement_speed = movement_speed(self.live_count(), self.total, self.base_speed);
        self.step_counter.set_threshold(self.movement_speed);

        if frozen {
            return;
        }

        self.step_counter.tick();
        if self.step_counter.is_finished() {
            self.step();
            self.step_counter.reset();
        }
    }

    /// One movement step along the current heading
    fn step(&mut self) {
        self.direction = next_direction(self.direction, self.boundaries());

        let x_speed = if self.slowdown_steps > 0 {
            self.slowdown_steps -= 1;
            SLOWED_X_SPEED
        } else {
            ORIGINAL_X_SPEED
        };

        let (sx, sy) = self.direction.signs();
        self.translate(sx * x_speed, sy * Y_SPEED);
    }

    pub fn boundaries(&self) -> Boundaries {
        Boundaries {
            at_bottom: self.y + self.height >= SEPARATION_LINE_HEIGHT,
            at_top: self.y <= TOP_MARGIN,
            at_left: self.x <= SIDE_MARGIN,
            at_right: self.x + self.width >= SCREEN_WIDTH - SIDE_MARGIN,
        }
    }

    fn translate(&mut self, dx: i32, dy: i32) {
        for column in &self.columns {
            for &index in column {
                let ship = &mut self.ships[index];
                ship.entity.x += dx;
                ship.entity.y += dy;
            }
        }
        self.x += dx;
        self.y += dy;
    }

    /// Aggregate box over ships that are still alive. Keeps the previous
    /// box when none are.
    pub fn recompute_bounds(&mut self) {
        let mut live = self.live_ships().map(|(_, ship)| &ship.entity).peekable();
        if live.peek().is_none() {
            return;
        }
        let (mut min_x, mut min_y, mut max_x, mut max_y) = (i32::MAX, i32::MAX, i32::MIN, i32::MIN);
        for entity in live {
            min_x = min_x.min(entity.x);
            min_y = min_y.min(entity.y);
            max_x = max_x.max(entity.x + entity.width);
            max_y = max_y.max(entity.y + entity.height);
        }
        self.x = min_x;
        self.y = min_y;
        self.width = max_x - min_x;
        self.height = max_y - min_y;
    }

    /// Pick a random shooter and fire if the shared cooldown allows
    pub fn shoot(&mut self, now: Millis, rng: &mut Pcg32) -> Option<Bullet> {
        if self.shooters.is_empty() {
            return None;
        }
        let pick = self.shooters[rng.random_range(0..self.shooters.len())];
        if !self.shooting.is_finished(now) {
            return None;
        }
        let shooter = self.ships.get(pick).filter(|ship| ship.is_alive())?;
        self.shooting.reset(now);
        let entity = &shooter.entity;
        Some(Bullet::new(
            entity.x + entity.width / 2 - BULLET_WIDTH / 2,
            entity.y + entity.height,
            ENEMY_BULLET_SPEED,
            None,
            0,
        ))
    }

    /// Apply one hit to a ship; returns true if it was lethal
    pub fn hit(&mut self, index: usize, now: Millis) -> bool {
        let lethal = match self.ships.get_mut(index) {
            Some(ship) => ship.hit(now),
            None => false,
        };
        if lethal {
            self.replace_shooter(index);
        }
        lethal
    }

    /// Destroy a ship outright; returns false if it was already down
    pub fn destroy(&mut self, index: usize, now: Millis) -> bool {
        match self.ships.get_mut(index) {
            Some(ship) if ship.is_alive() => ship.destroy(now),
            _ => return false,
        }
        self.replace_shooter(index);
        true
    }

    /// Hand the column's shooter slot to its lowest survivor, or drop it
    fn replace_shooter(&mut self, index: usize) {
        let Some(slot) = self.shooters.iter().position(|&s| s == index) else {
            return;
        };
        let Some(column) = self.columns.iter().find(|c| c.contains(&index)) else {
            self.shooters.remove(slot);
            return;
        };
        let survivor = column
            .iter()
            .rev()
            .copied()
            .find(|&i| self.ships[i].is_alive());
        match survivor {
            Some(next) => self.shooters[slot] = next,
            None => {
                self.shooters.remove(slot);
            }
        }
    }

    /// Compact exploded ships out of their columns; returns how many left
    pub fn clean_up(&mut self, now: Millis) -> usize {
        let ships = &self.ships;
        let mut removed = 0;
        for column in &mut self.columns {
            let before = column.len();
            column.retain(|&i| !ships[i].is_removable(now));
            removed += before - column.len();
        }
        self.columns.retain(|column| !column.is_empty());
        removed
    }

    /// Start a slowdown; reactivating restarts the step count
    pub fn activate_slowdown(&mut self) {
        self.slowdown_steps = SLOWDOWN_STEPS;
    }

    pub fn is_slowed(&self) -> bool {
        self.slowdown_steps > 0
    }

    /// Shove the whole formation up, never above the top margin
    pub fn push_up(&mut self, distance: i32) {
        self.recompute_bounds();
        let dy = distance.min(self.y - TOP_MARGIN).max(0);
        if dy > 0 {
            self.translate(0, -dy);
        }
    }

    /// No ships remain in any column (explosions included)
    pub fn is_empty(&self) -> bool {
        self.columns.iter().all(|column| column.is_empty())
    }

    /// Ships not yet destroyed
    pub fn live_count(&self) -> usize {
        self.live_ships().count()
    }

    pub fn total(&self) -> usize {
        self.total
    }

    pub fn movement_speed(&self) -> u32 {
        self.movement_speed
    }

    pub fn direction(&self) -> Direction {
        self.direction
    }

    pub fn set_direction(&mut self, direction: Direction) {
        self.direction = direction;
    }

    pub fn shooters(&self) -> &[usize] {
        &self.shooters
    }

    pub fn ship(&self, index: usize) -> Option<&EnemyShip> {
        self.ships.get(index)
    }

    /// Arena indices of one column, top to bottom
    pub fn column(&self, col: usize) -> Option<&[usize]> {
        self.columns.get(col).map(Vec::as_slice)
    }

    /// Every ship still held by a column, exploding ones included
    pub fn members(&self) -> impl Iterator<Item = (usize, &EnemyShip)> {
        self.columns
            .iter()
            .flatten()
            .map(move |&i| (i, &self.ships[i]))
    }

    /// Members that are not destroyed
    pub fn live_ships(&self) -> impl Iterator<Item = (usize, &EnemyShip)> {
        self.members().filter(|(_, ship)| ship.is_alive())
    }
}
