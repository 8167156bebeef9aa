//! Level descriptors
//!
//! The simulation assumes it always receives a valid descriptor. Loading
//! problems are handled here by falling back to the built-in levels.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::Millis;
use crate::sim::entity::{EnemyKind, ItemKind};

/// Everything the core needs to know about one level
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LevelDescriptor {
    pub level: u32,
    /// Formation columns
    pub formation_width: u32,
    /// Formation rows
    pub formation_height: u32,
    /// Movement cadence at full strength (ticks between steps, minus the minimum)
    pub base_speed: u32,
    /// Shared formation shooting interval
    pub shooting_interval: Millis,
    #[serde(default)]
    pub shooting_variance: Millis,
    /// Ships per enemy type
    pub enemies: BTreeMap<EnemyKind, u32>,
    /// Enemy type -> item -> probability
    #[serde(default)]
    pub item_drops: BTreeMap<EnemyKind, BTreeMap<ItemKind, f32>>,
    /// Empty means the level has no boss wave
    #[serde(default)]
    pub boss_id: String,
    /// Coins granted on completion
    #[serde(default)]
    pub completion_bonus: u64,
    /// Announced on completion when not empty
    #[serde(default)]
    pub achievement: String,
}

impl LevelDescriptor {
    /// Ship kinds in formation order, strongest rows first. The counts are
    /// padded with octopi or truncated to fill exactly `width * height`.
    pub fn formation_kinds(&self) -> Vec<EnemyKind> {
        let total = (self.formation_width * self.formation_height) as usize;
        let mut kinds: Vec<EnemyKind> = self
            .enemies
            .iter()
            .filter(|(kind, _)| **kind != EnemyKind::Special)
            .flat_map(|(kind, count)| std::iter::repeat_n(*kind, *count as usize))
            .collect();
        if kinds.len() != total {
            log::warn!(
                "Level {}: {} enemies listed for a {}x{} formation",
                self.level,
                kinds.len(),
                self.formation_width,
                self.formation_height
            );
        }
        kinds.resize(total, EnemyKind::Octopus);
        kinds
    }

    /// Drop table for one enemy type
    pub fn drops_for(&self, kind: EnemyKind) -> Option<&BTreeMap<ItemKind, f32>> {
        self.item_drops.get(&kind)
    }
}

fn level(
    number: u32,
    size: (u32, u32),
    base_speed: u32,
    shooting: (Millis, Millis),
    enemies: &[(EnemyKind, u32)],
    boss_id: &str,
    completion_bonus: u64,
) -> LevelDescriptor {
    let mut item_drops = BTreeMap::new();
    for kind in [EnemyKind::Octopus, EnemyKind::Crab, EnemyKind::Squid, EnemyKind::Tank] {
        let table = BTreeMap::from([
            (ItemKind::Heal, 0.02),
            (ItemKind::Shield, 0.03),
            (ItemKind::Slow, 0.03),
            (ItemKind::Stop, 0.02),
            (ItemKind::Push, 0.03),
            (ItemKind::Explode, 0.02),
        ]);
        item_drops.insert(kind, table);
    }
    item_drops.insert(EnemyKind::Special, BTreeMap::from([(ItemKind::Heal, 0.5)]));
    LevelDescriptor {
        level: number,
        formation_width: size.0,
        formation_height: size.1,
        base_speed,
        shooting_interval: shooting.0,
        shooting_variance: shooting.1,
        enemies: enemies.iter().copied().collect(),
        item_drops,
        boss_id: boss_id.to_string(),
        completion_bonus,
        achievement: format!("clear_level_{number}"),
    }
}

/// Small built-in campaign used when no level file is available
pub fn default_levels() -> Vec<LevelDescriptor> {
    use EnemyKind::*;
    vec![
        level(1, (5, 4), 60, (2_500, 1_500), &[(Crab, 10), (Octopus, 10)], "", 50),
        level(
            2,
            (6, 4),
            55,
            (2_000, 1_200),
            &[(Squid, 6), (Crab, 12), (Octopus, 6)],
            "hive",
            80,
        ),
        level(
            3,
            (7, 5),
            50,
            (1_600, 1_000),
            &[(Tank, 7), (Squid, 7), (Crab, 14), (Octopus, 7)],
            "omega",
            120,
        ),
        level(
            4,
            (8, 5),
            45,
            (1_300, 800),
            &[(Tank, 8), (Squid, 8), (Crab, 16), (Octopus, 8)],
            "abyss",
            200,
        ),
    ]
}

/// Decode a JSON array of level descriptors
pub fn parse_levels(json: &str) -> Result<Vec<LevelDescriptor>, serde_json::Error> {
    serde_json::from_str(json)
}

/// Decode levels, falling back to the built-in set on any problem
pub fn load_levels_or_default(json: Option<&str>) -> Vec<LevelDescriptor> {
    let Some(json) = json else {
        log::info!("No level file given, using built-in levels");
        return default_levels();
    };
    match parse_levels(json) {
        Ok(levels) if !levels.is_empty() => {
            log::info!("Loaded {} levels", levels.len());
            levels
        }
        Ok(_) => {
            log::warn!("Level file is empty, using built-in levels");
            default_levels()
        }
        Err(err) => {
            log::warn!("Failed to parse level file ({err}), using built-in levels");
            default_levels()
        }
    }
}
