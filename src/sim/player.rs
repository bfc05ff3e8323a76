//! The player's ship and its active powerup effects

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::powerup::PowerupKind;
use crate::tuning::Tuning;

/// Remaining duration of one powerup effect
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EffectTimer {
    pub active: bool,
    /// Ticks left before the effect expires
    pub remaining_frames: u32,
}

/// Independent timers for each powerup kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ActiveEffects {
    pub shield: EffectTimer,
    pub double_blaster: EffectTimer,
}

impl ActiveEffects {
    pub fn timer(&self, kind: PowerupKind) -> &EffectTimer {
        match kind {
            PowerupKind::Shield => &self.shield,
            PowerupKind::DoubleBlaster => &self.double_blaster,
        }
    }

    fn timer_mut(&mut self, kind: PowerupKind) -> &mut EffectTimer {
        match kind {
            PowerupKind::Shield => &mut self.shield,
            PowerupKind::DoubleBlaster => &mut self.double_blaster,
        }
    }

    pub fn is_active(&self, kind: PowerupKind) -> bool {
        self.timer(kind).active
    }

    /// Start (or restart) an effect for `frames` ticks
    pub fn activate(&mut self, kind: PowerupKind, frames: u32) {
        let timer = self.timer_mut(kind);
        timer.active = frames > 0;
        timer.remaining_frames = frames;
    }

    /// End an effect immediately
    pub fn deactivate(&mut self, kind: PowerupKind) {
        *self.timer_mut(kind) = EffectTimer::default();
    }

    /// Count every active effect down one tick, reporting each expiry
    pub fn tick(&mut self, mut on_expire: impl FnMut(PowerupKind)) {
        for kind in PowerupKind::ALL {
            let timer = self.timer_mut(kind);
            if !timer.active {
                continue;
            }
            timer.remaining_frames = timer.remaining_frames.saturating_sub(1);
            if timer.remaining_frames == 0 {
                timer.active = false;
                on_expire(kind);
            }
        }
    }

    pub fn clear(&mut self) {
        *self = Self::default();
    }
}

/// The player's ship (axis-aligned box, `pos` is the top-left corner)
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Player {
    pub pos: Vec2,
    pub size: Vec2,
    pub vel: Vec2,
    /// One-shot absolute position (ship center) from pointer/touch input
    pub pointer_override: Option<Vec2>,
    pub effects: ActiveEffects,
    /// Post-hit grace ticks during which asteroids pass through
    pub invulnerable_frames: u32,
}

impl Player {
    /// Ship centered horizontally near the bottom of the canvas
    pub fn new(tuning: &Tuning, width: f32, height: f32) -> Self {
        let size = Vec2::new(tuning.player_width, tuning.player_height);
        let mut player = Self {
            pos: Vec2::new((width - size.x) / 2.0, height - size.y * 2.0),
            size,
            vel: Vec2::ZERO,
            pointer_override: None,
            effects: ActiveEffects::default(),
            invulnerable_frames: 0,
        };
        player.clamp(width, height);
        player
    }

    pub fn center(&self) -> Vec2 {
        self.pos + self.size / 2.0
    }

    /// Muzzle position: top-center of the ship
    pub fn nose(&self) -> Vec2 {
        Vec2::new(self.pos.x + self.size.x / 2.0, self.pos.y)
    }

    /// (min, max) corners
    pub fn bounds(&self) -> (Vec2, Vec2) {
        (self.pos, self.pos + self.size)
    }

    pub fn is_shielded(&self) -> bool {
        self.effects.is_active(PowerupKind::Shield)
    }

    /// Apply one tick of input: a pending pointer override wins over the
    /// velocity axis. Position is clamped to the canvas afterwards.
    pub fn update(&mut self, axis: Vec2, tuning: &Tuning, width: f32, height: f32) {
        if let Some(target) = self.pointer_override.take() {
            self.vel = Vec2::ZERO;
            self.pos = target - self.size / 2.0;
        } else {
            self.vel = axis.clamp_length_max(1.0) * tuning.player_speed;
            self.pos += self.vel;
        }
        self.invulnerable_frames = self.invulnerable_frames.saturating_sub(1);
        self.clamp(width, height);
    }

    /// Keep the ship fully inside the canvas
    pub fn clamp(&mut self, width: f32, height: f32) {
        let max = Vec2::new(width - self.size.x, height - self.size.y).max(Vec2::ZERO);
        self.pos = self.pos.clamp(Vec2::ZERO, max);
    }
}
