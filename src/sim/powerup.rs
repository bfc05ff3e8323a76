//! Powerup store: periodic drops, pickup, and effect timers

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::player::Player;
use super::pool::{ObjectPool, Pooled};
use crate::tuning::Tuning;

/// Powerup types
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum PowerupKind {
    /// Temporary invulnerability
    #[default]
    Shield,
    /// Two bullets per shot
    DoubleBlaster,
}

impl PowerupKind {
    pub const ALL: [PowerupKind; 2] = [PowerupKind::Shield, PowerupKind::DoubleBlaster];
}

/// A falling pickup (`pos` is the center of a square of side `size`)
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Powerup {
    pub pos: Vec2,
    pub size: f32,
    pub vy: f32,
    pub kind: PowerupKind,
}

impl Pooled for Powerup {
    fn reset(&mut self) {
        *self = Powerup::default();
    }
}

impl Powerup {
    fn overlaps(&self, min: Vec2, max: Vec2) -> bool {
        let half = self.size / 2.0;
        self.pos.x - half < max.x
            && self.pos.x + half > min.x
            && self.pos.y - half < max.y
            && self.pos.y + half > min.y
    }
}

/// Something the HUD/audio should know about
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum PowerupEvent {
    Collected(PowerupKind),
    Expired(PowerupKind),
}

/// All live powerups and their pool
#[derive(Debug, Default)]
pub struct PowerupStore {
    active: Vec<Powerup>,
    pool: ObjectPool<Powerup>,
    last_spawn_ms: Option<f64>,
}

impl PowerupStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn as_slice(&self) -> &[Powerup] {
        &self.active
    }

    /// Drop one powerup of a random enabled kind at a random X on the top edge
    pub fn spawn(&mut self, width: f32, tuning: &Tuning, rng: &mut Pcg32) -> PowerupKind {
        let kinds = &tuning.powerup_kinds;
        let kind = kinds[rng.random_range(0..kinds.len())];
        let half = tuning.powerup_size / 2.0;
        let x = if width > tuning.powerup_size {
            rng.random_range(half..=width - half)
        } else {
            width / 2.0
        };

        let mut powerup = self.pool.acquire();
        powerup.pos = Vec2::new(x, -half);
        powerup.size = tuning.powerup_size;
        powerup.vy = tuning.powerup_speed;
        powerup.kind = kind;
        self.active.push(powerup);
        log::debug!("Spawned {:?} powerup at x={:.0}", kind, x);
        kind
    }

    /// Spawn once per `powerup_spawn_interval_ms`; the first drop comes one
    /// full interval after the clock starts
    pub fn maybe_spawn(
        &mut self,
        width: f32,
        now_ms: f64,
        tuning: &Tuning,
        rng: &mut Pcg32,
    ) -> Option<PowerupKind> {
        let last = *self.last_spawn_ms.get_or_insert(now_ms);
        if now_ms - last < tuning.powerup_spawn_interval_ms {
            return None;
        }
        self.last_spawn_ms = Some(now_ms);
        Some(self.spawn(width, tuning, rng))
    }

    /// Advance drops, tick effect timers, and resolve pickups
    ///
    /// Timers are counted down before pickups so a freshly collected effect
    /// keeps its full duration.
    pub fn update(
        &mut self,
        height: f32,
        player: &mut Player,
        tuning: &Tuning,
        mut on_event: impl FnMut(PowerupEvent),
    ) {
        player
            .effects
            .tick(|kind| on_event(PowerupEvent::Expired(kind)));

        let (min, max) = player.bounds();
        for i in (0..self.active.len()).rev() {
            let powerup = &mut self.active[i];
            powerup.pos.y += powerup.vy;

            if powerup.overlaps(min, max) {
                let kind = powerup.kind;
                player.effects.activate(kind, tuning.powerup_frames(kind));
                on_event(PowerupEvent::Collected(kind));
                log::info!("Collected {:?}", kind);
                self.release_at(i);
            } else if powerup.pos.y - powerup.size / 2.0 > height {
                self.release_at(i);
            }
        }
    }

    fn release_at(&mut self, index: usize) {
        let powerup = self.active.swap_remove(index);
        self.pool.release(powerup);
    }

    /// Pool every drop and restart the spawn clock
    pub fn clear_all(&mut self) {
        for powerup in self.active.drain(..) {
            self.pool.release(powerup);
        }
        self.last_spawn_ms = None;
    }
}
