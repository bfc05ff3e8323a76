//! Bullet store
//!
//! Bullets travel straight up at a fixed speed. Firing is rate limited by a
//! cooldown; the `fire` sound cue has its own, independent throttle so that
//! rapid fire does not flood the audio side-channel.

use glam::Vec2;
use serde::{Deserialize, Serialize};

use super::pool::{ObjectPool, Pooled};
use crate::tuning::Tuning;

/// Who fired a bullet
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum BulletOwner {
    #[default]
    Player,
    /// Second barrel while DoubleBlaster is active
    PlayerSecondary,
}

/// A projectile
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Bullet {
    pub pos: Vec2,
    pub radius: f32,
    /// Vertical velocity (negative = up)
    pub vy: f32,
    pub owner: Option<BulletOwner>,
}

impl Pooled for Bullet {
    fn reset(&mut self) {
        *self = Bullet::default();
    }
}

/// Result of a fire request
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Volley {
    /// Bullets actually spawned (0 if on cooldown or at cap)
    pub spawned: u32,
    /// Whether a `fire` sound cue should be emitted
    pub play_sound: bool,
}

/// All live bullets and their pool
#[derive(Debug, Default)]
pub struct BulletStore {
    active: Vec<Bullet>,
    pool: ObjectPool<Bullet>,
    last_fire_ms: Option<f64>,
    last_sound_ms: Option<f64>,
}

impl BulletStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn as_slice(&self) -> &[Bullet] {
        &self.active
    }

    pub fn pool(&self) -> &ObjectPool<Bullet> {
        &self.pool
    }

    /// Fire from `(x, y)`; `double` adds a second barrel
    ///
    /// Callers gate this on active play. Cooldown and the bullet cap are
    /// silent rejections.
    pub fn fire(&mut self, x: f32, y: f32, double: bool, now_ms: f64, tuning: &Tuning) -> Volley {
        if self
            .last_fire_ms
            .is_some_and(|last| now_ms - last < tuning.fire_cooldown_ms)
        {
            return Volley::default();
        }

        let mut volley = Volley::default();
        if double {
            let offset = tuning.double_blaster_offset;
            volley.spawned += self.spawn(x - offset, y, BulletOwner::Player, tuning) as u32;
            volley.spawned +=
                self.spawn(x + offset, y, BulletOwner::PlayerSecondary, tuning) as u32;
        } else {
            volley.spawned += self.spawn(x, y, BulletOwner::Player, tuning) as u32;
        }
        if volley.spawned == 0 {
            return volley;
        }
        self.last_fire_ms = Some(now_ms);

        if self
            .last_sound_ms
            .is_none_or(|last| now_ms - last >= tuning.fire_sound_interval_ms)
        {
            self.last_sound_ms = Some(now_ms);
            volley.play_sound = true;
        }
        volley
    }

    fn spawn(&mut self, x: f32, y: f32, owner: BulletOwner, tuning: &Tuning) -> bool {
        if self.active.len() >= tuning.bullet_cap {
            log::debug!("Bullet rejected: cap {} reached", tuning.bullet_cap);
            return false;
        }
        let mut bullet = self.pool.acquire();
        bullet.pos = Vec2::new(x, y);
        bullet.radius = tuning.bullet_radius;
        bullet.vy = -tuning.bullet_speed;
        bullet.owner = Some(owner);
        self.active.push(bullet);
        true
    }

    /// Advance and pool bullets that left the top edge; returns count removed
    pub fn update(&mut self) -> u32 {
        let mut removed = 0;
        for i in (0..self.active.len()).rev() {
            let bullet = &mut self.active[i];
            bullet.pos.y += bullet.vy;
            if bullet.pos.y + bullet.radius < 0.0 {
                self.despawn_at(i);
                removed += 1;
            }
        }
        removed
    }

    /// Pool the bullet at `index`; out-of-range is a no-op
    pub fn despawn_at(&mut self, index: usize) -> bool {
        if index >= self.active.len() {
            log::warn!(
                "despawn_at: index {} out of range ({} bullets)",
                index,
                self.active.len()
            );
            return false;
        }
        let bullet = self.active.swap_remove(index);
        self.pool.release(bullet);
        true
    }

    /// Pool every bullet (level change, restart)
    pub fn clear_all(&mut self) {
        for bullet in self.active.drain(..) {
            self.pool.release(bullet);
        }
    }

    /// Forget cooldown and sound timers (restart)
    pub fn reset_timers(&mut self) {
        self.last_fire_ms = None;
        self.last_sound_ms = None;
    }
}
