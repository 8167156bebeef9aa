//! Flattened draw list for the presentation layer

use glam::Vec2;

use super::boss::Telegraph;
use super::entity::{BossBullet, Color, Entity, SpriteKind};
use super::state::GameModel;

/// One thing to draw. The core never draws; it only describes.
#[derive(Debug, Clone, PartialEq)]
pub enum RenderItem {
    Sprite {
        x: i32,
        y: i32,
        width: i32,
        height: i32,
        sprite: SpriteKind,
        color: Option<Color>,
    },
    /// Telegraphed dash path or laser beam
    Line { from: Vec2, to: Vec2, firing: bool },
    /// Black hole area
    Ring { center: Vec2, radius: f32 },
}

impl From<&Entity> for RenderItem {
    fn from(entity: &Entity) -> Self {
        RenderItem::Sprite {
            x: entity.x,
            y: entity.y,
            width: entity.width,
            height: entity.height,
            sprite: entity.sprite,
            color: entity.color,
        }
    }
}

impl From<&BossBullet> for RenderItem {
    fn from(bullet: &BossBullet) -> Self {
        RenderItem::Sprite {
            x: bullet.pos.x.round() as i32,
            y: bullet.pos.y.round() as i32,
            width: bullet.size as i32,
            height: bullet.size as i32,
            sprite: SpriteKind::BossBullet,
            color: None,
        }
    }
}

impl From<Telegraph> for RenderItem {
    fn from(telegraph: Telegraph) -> Self {
        match telegraph {
            Telegraph::Line { from, to, firing } => RenderItem::Line { from, to, firing },
            Telegraph::Ring { center, radius } => RenderItem::Ring { center, radius },
        }
    }
}

impl RenderItem {
    pub fn sprite(&self) -> Option<SpriteKind> {
        match self {
            RenderItem::Sprite { sprite, .. } => Some(*sprite),
            _ => None,
        }
    }
}

/// Everything visible this tick, back to front
pub fn render_list(model: &GameModel) -> Vec<RenderItem> {
    let mut items = Vec::new();

    for ship in model.players.iter().flatten().filter(|s| s.is_alive()) {
        items.push(RenderItem::from(&ship.entity));
    }
    items.extend(model.specials.iter().map(|s| RenderItem::from(&s.entity)));
    items.extend(
        model
            .formation
            .members()
            .map(|(_, ship)| RenderItem::from(&ship.entity)),
    );

    if let Some(boss) = &model.boss {
        items.push(RenderItem::from(&boss.entity));
        items.extend(boss.minions().iter().map(|m| RenderItem::from(&m.entity)));
        if let Some(telegraph) = boss.telegraph() {
            items.push(telegraph.into());
        }
    }

    items.extend(model.bullets.iter().map(|b| RenderItem::from(&b.entity)));
    items.extend(model.boss_bullets.iter().map(RenderItem::from));
    items.extend(model.items.iter().map(|item| RenderItem::from(&item.entity)));
    items
}
