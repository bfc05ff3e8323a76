//! Data-driven game balance
//!
//! Every gameplay constant lives in [`Tuning`]. Defaults are compiled in;
//! a JSON document can override any subset of fields (missing keys fall
//! back to the defaults). Tuning is validated once at startup and then
//! read by the simulation before each computation that needs it.

use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::sim::PowerupKind;

/// Host class, used to pick caps and frame rate
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum DeviceProfile {
    #[default]
    Desktop,
    /// Phones, tablets, low-power laptops
    Constrained,
}

/// What happens to an active shield when it absorbs an asteroid
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum ShieldPolicy {
    /// Shield absorbs any number of hits until its timer runs out
    #[default]
    AbsorbUntilExpiry,
    /// Shield is consumed by the first absorbed hit
    BreakOnHit,
}

/// One entry of the asteroid size table, indexed by size level
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct SizeTier {
    pub radius: f32,
    pub score: u32,
}

/// All runtime-tunable gameplay values
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Tuning {
    // ── Timing ──────────────────────────────────────────────────────────
    /// Simulation ticks per second; velocities are in pixels per tick
    pub ticks_per_second: u32,
    pub target_fps_desktop: u32,
    pub target_fps_constrained: u32,

    // ── Asteroids: shape and size ───────────────────────────────────────
    /// Size level 0 is the largest tier; the last tier is minimal
    pub size_tiers: Vec<SizeTier>,
    pub vertex_min: usize,
    pub vertex_max: usize,
    /// Per-vertex radial perturbation (fraction of radius)
    pub jaggedness: f32,

    // ── Asteroids: motion ───────────────────────────────────────────────
    pub asteroid_base_speed: f32,
    pub asteroid_max_speed: f32,
    pub asteroid_drift: f32,
    pub asteroid_max_spin: f32,
    /// Levels covered by the eased speed ramp before the log ramp takes over
    pub speed_ease_levels: u32,
    pub speed_ease_gain: f32,
    pub speed_log_gain: f32,

    // ── Asteroids: lifecycle ────────────────────────────────────────────
    pub out_of_bounds_margin: f32,
    pub asteroid_max_lifetime_ms: f64,
    pub spawn_interval_ms: f64,
    pub min_spawn_interval_ms: f64,
    /// Spawn interval multiplier per level
    pub spawn_interval_decay: f64,
    pub asteroid_cap_desktop: usize,
    pub asteroid_cap_constrained: usize,

    // ── Fragmentation ───────────────────────────────────────────────────
    pub fragment_count_min: u32,
    pub fragment_count_max: u32,
    pub slow_scatter: f32,
    pub fast_scatter: f32,
    pub fast_scatter_chance: f64,
    pub fragment_clear_bonus: u32,

    // ── Bullets ─────────────────────────────────────────────────────────
    pub bullet_radius: f32,
    pub bullet_speed: f32,
    pub fire_cooldown_ms: f64,
    /// Minimum gap between two `fire` sound events
    pub fire_sound_interval_ms: f64,
    pub bullet_cap: usize,
    /// Horizontal offset of each barrel when DoubleBlaster is active
    pub double_blaster_offset: f32,

    // ── Powerups ────────────────────────────────────────────────────────
    pub powerup_kinds: Vec<PowerupKind>,
    pub powerup_size: f32,
    pub powerup_speed: f32,
    pub powerup_spawn_interval_ms: f64,
    pub shield_duration_ms: f64,
    pub double_blaster_duration_ms: f64,
    pub shield_policy: ShieldPolicy,

    // ── Player ──────────────────────────────────────────────────────────
    pub player_width: f32,
    pub player_height: f32,
    pub player_speed: f32,
    pub lives: u8,
    pub hit_invulnerability_ms: f64,

    // ── Level flow ──────────────────────────────────────────────────────
    pub asteroids_per_level: u32,
    pub level_grace_ms: f64,
    pub level_max_wait_ms: f64,

    // ── Collision grid ──────────────────────────────────────────────────
    pub grid_cell_size: f32,
}

impl Default for Tuning {
    fn default() -> Self {
        Self {
            ticks_per_second: 60,
            target_fps_desktop: 60,
            target_fps_constrained: 30,

            size_tiers: vec![
                SizeTier { radius: 40.0, score: 20 },
                SizeTier { radius: 24.0, score: 50 },
                SizeTier { radius: 14.0, score: 100 },
            ],
            vertex_min: 5,
            vertex_max: 11,
            jaggedness: 0.3,

            asteroid_base_speed: 1.2,
            asteroid_max_speed: 6.0,
            asteroid_drift: 0.6,
            asteroid_max_spin: 0.04,
            speed_ease_levels: 5,
            speed_ease_gain: 1.0,
            speed_log_gain: 0.6,

            out_of_bounds_margin: 100.0,
            asteroid_max_lifetime_ms: 30_000.0,
            spawn_interval_ms: 1200.0,
            min_spawn_interval_ms: 350.0,
            spawn_interval_decay: 0.9,
            asteroid_cap_desktop: 24,
            asteroid_cap_constrained: 14,

            fragment_count_min: 2,
            fragment_count_max: 3,
            slow_scatter: 1.0,
            fast_scatter: 3.5,
            fast_scatter_chance: 0.2,
            fragment_clear_bonus: 250,

            bullet_radius: 3.0,
            bullet_speed: 9.0,
            fire_cooldown_ms: 150.0,
            fire_sound_interval_ms: 90.0,
            bullet_cap: 64,
            double_blaster_offset: 12.0,

            powerup_kinds: vec![PowerupKind::Shield, PowerupKind::DoubleBlaster],
            powerup_size: 26.0,
            powerup_speed: 2.0,
            powerup_spawn_interval_ms: 15_000.0,
            shield_duration_ms: 8000.0,
            double_blaster_duration_ms: 10_000.0,
            shield_policy: ShieldPolicy::AbsorbUntilExpiry,

            player_width: 40.0,
            player_height: 40.0,
            player_speed: 6.0,
            lives: 3,
            hit_invulnerability_ms: 1500.0,

            asteroids_per_level: 10,
            level_grace_ms: 1500.0,
            level_max_wait_ms: 120_000.0,

            grid_cell_size: 60.0,
        }
    }
}

impl Tuning {
    /// Parse a JSON override document and validate the result
    pub fn from_json(json: &str) -> Result<Self, ConfigError> {
        let tuning: Tuning = serde_json::from_str(json)?;
        tuning.validate()?;
        Ok(tuning)
    }

    /// Read and validate a JSON tuning file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        let tuning = Self::from_json(&json)?;
        log::info!("Loaded tuning from {}", path.display());
        Ok(tuning)
    }

    /// Reject tables and values the simulation cannot run with
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.size_tiers.is_empty() {
            return Err(ConfigError::NoSizeTiers);
        }
        let mut previous = f32::INFINITY;
        for (level, tier) in self.size_tiers.iter().enumerate() {
            if !(tier.radius > 0.0) {
                return Err(ConfigError::InvalidRadius {
                    level,
                    radius: tier.radius,
                });
            }
            if tier.radius >= previous {
                return Err(ConfigError::TierOrder {
                    level,
                    radius: tier.radius,
                });
            }
            previous = tier.radius;
        }
        if self.powerup_kinds.is_empty() {
            return Err(ConfigError::NoPowerupKinds);
        }

        check(
            "ticks_per_second",
            self.ticks_per_second as f64,
            self.ticks_per_second > 0,
            "> 0",
        )?;
        check(
            "target_fps_desktop",
            self.target_fps_desktop as f64,
            self.target_fps_desktop > 0,
            "> 0",
        )?;
        check(
            "target_fps_constrained",
            self.target_fps_constrained as f64,
            self.target_fps_constrained > 0,
            "> 0",
        )?;
        check(
            "vertex_min",
            self.vertex_min as f64,
            self.vertex_min >= 3,
            ">= 3",
        )?;
        check(
            "vertex_max",
            self.vertex_max as f64,
            self.vertex_max >= self.vertex_min,
            ">= vertex_min",
        )?;
        check(
            "fragment_count_min",
            self.fragment_count_min as f64,
            self.fragment_count_min >= 1,
            ">= 1",
        )?;
        check(
            "fragment_count_max",
            self.fragment_count_max as f64,
            self.fragment_count_max >= self.fragment_count_min && self.fragment_count_max <= 8,
            "fragment_count_min..=8",
        )?;
        check(
            "fast_scatter_chance",
            self.fast_scatter_chance,
            (0.0..=1.0).contains(&self.fast_scatter_chance),
            "0..=1",
        )?;
        check(
            "asteroid_max_speed",
            self.asteroid_max_speed as f64,
            self.asteroid_max_speed > 0.0,
            "> 0",
        )?;
        check(
            "asteroid_base_speed",
            self.asteroid_base_speed as f64,
            self.asteroid_base_speed >= 0.0,
            ">= 0",
        )?;
        // Symmetric random ranges below: -x..=x must not be empty
        check(
            "asteroid_drift",
            self.asteroid_drift as f64,
            self.asteroid_drift >= 0.0,
            ">= 0",
        )?;
        check(
            "asteroid_max_spin",
            self.asteroid_max_spin as f64,
            self.asteroid_max_spin >= 0.0,
            ">= 0",
        )?;
        // Outline radii are radius * (1 +/- jaggedness)
        check(
            "jaggedness",
            self.jaggedness as f64,
            (0.0..1.0).contains(&self.jaggedness),
            "0 <= jaggedness < 1",
        )?;
        check(
            "slow_scatter",
            self.slow_scatter as f64,
            self.slow_scatter >= 0.0,
            ">= 0",
        )?;
        check(
            "fast_scatter",
            self.fast_scatter as f64,
            self.fast_scatter >= self.slow_scatter,
            ">= slow_scatter",
        )?;
        check(
            "powerup_size",
            self.powerup_size as f64,
            self.powerup_size > 0.0,
            "> 0",
        )?;
        check(
            "player_width",
            self.player_width as f64,
            self.player_width > 0.0,
            "> 0",
        )?;
        check(
            "player_height",
            self.player_height as f64,
            self.player_height > 0.0,
            "> 0",
        )?;
        check(
            "spawn_interval_ms",
            self.spawn_interval_ms,
            self.spawn_interval_ms > 0.0,
            "> 0",
        )?;
        check(
            "min_spawn_interval_ms",
            self.min_spawn_interval_ms,
            self.min_spawn_interval_ms > 0.0
                && self.min_spawn_interval_ms <= self.spawn_interval_ms,
            "0 < min <= spawn_interval_ms",
        )?;
        check(
            "spawn_interval_decay",
            self.spawn_interval_decay,
            self.spawn_interval_decay > 0.0 && self.spawn_interval_decay <= 1.0,
            "0 < decay <= 1",
        )?;
        check(
            "asteroid_cap_desktop",
            self.asteroid_cap_desktop as f64,
            self.asteroid_cap_desktop >= 1,
            ">= 1",
        )?;
        check(
            "asteroid_cap_constrained",
            self.asteroid_cap_constrained as f64,
            self.asteroid_cap_constrained >= 1,
            ">= 1",
        )?;
        check(
            "bullet_radius",
            self.bullet_radius as f64,
            self.bullet_radius > 0.0,
            "> 0",
        )?;
        // Bullets must fit well inside one cell for the 3x3 neighborhood query
        check(
            "grid_cell_size",
            self.grid_cell_size as f64,
            self.grid_cell_size > 2.0 * (self.bullet_radius + 1.0),
            "> 2 * (bullet_radius + 1)",
        )?;
        check(
            "asteroids_per_level",
            self.asteroids_per_level as f64,
            self.asteroids_per_level >= 1,
            ">= 1",
        )?;
        check(
            "level_grace_ms",
            self.level_grace_ms,
            self.level_grace_ms >= 0.0,
            ">= 0",
        )?;
        check(
            "level_max_wait_ms",
            self.level_max_wait_ms,
            self.level_max_wait_ms > self.level_grace_ms,
            "> level_grace_ms",
        )?;
        check("lives", self.lives as f64, self.lives >= 1, ">= 1")?;
        Ok(())
    }

    /// Duration of one simulation tick in milliseconds
    pub fn tick_ms(&self) -> f64 {
        1000.0 / self.ticks_per_second as f64
    }

    /// Convert a real-time duration to simulation ticks
    pub fn frames_for_ms(&self, ms: f64) -> u32 {
        (ms * self.ticks_per_second as f64 / 1000.0).round() as u32
    }

    /// Size level of the smallest tier
    pub fn minimal_level(&self) -> u8 {
        (self.size_tiers.len().saturating_sub(1)) as u8
    }

    /// Lookup table entry for a size level (clamped to the minimal tier)
    pub fn tier(&self, size_level: u8) -> SizeTier {
        let index = (size_level as usize).min(self.size_tiers.len().saturating_sub(1));
        self.size_tiers[index]
    }

    /// Hard cap on live asteroids for the given host class
    pub fn asteroid_cap(&self, profile: DeviceProfile) -> usize {
        match profile {
            DeviceProfile::Desktop => self.asteroid_cap_desktop,
            DeviceProfile::Constrained => self.asteroid_cap_constrained,
        }
    }

    /// Render frame rate target for the given host class
    pub fn target_fps(&self, profile: DeviceProfile) -> u32 {
        match profile {
            DeviceProfile::Desktop => self.target_fps_desktop,
            DeviceProfile::Constrained => self.target_fps_constrained,
        }
    }

    /// Root asteroids that must spawn before a level stops spawning
    pub fn root_quota(&self, level: u32) -> u32 {
        (level + 1).saturating_mul(self.asteroids_per_level)
    }

    /// Time between root spawns; shrinks geometrically per level
    pub fn spawn_interval_for_level(&self, level: u32) -> f64 {
        let scaled = self.spawn_interval_ms * self.spawn_interval_decay.powi(level as i32);
        scaled.max(self.min_spawn_interval_ms)
    }

    /// Base falling speed for a level (pixels per tick)
    ///
    /// Smoothstep ramp over the first `speed_ease_levels` levels, then a
    /// logarithmic ramp, always capped at `asteroid_max_speed`.
    pub fn asteroid_speed(&self, level: u32) -> f32 {
        let ease_levels = self.speed_ease_levels.max(1);
        let multiplier = if level < ease_levels {
            let t = level as f32 / ease_levels as f32;
            1.0 + self.speed_ease_gain * t * t * (3.0 - 2.0 * t)
        } else {
            let beyond = (level - ease_levels) as f32;
            1.0 + self.speed_ease_gain + self.speed_log_gain * (1.0 + beyond).ln()
        };
        (self.asteroid_base_speed * multiplier).min(self.asteroid_max_speed)
    }

    /// Effect duration in ticks for a powerup kind
    pub fn powerup_frames(&self, kind: PowerupKind) -> u32 {
        match kind {
            PowerupKind::Shield => self.frames_for_ms(self.shield_duration_ms),
            PowerupKind::DoubleBlaster => self.frames_for_ms(self.double_blaster_duration_ms),
        }
    }
}

fn check(name: &'static str, value: f64, ok: bool, expected: &'static str) -> Result<(), ConfigError> {
    if ok {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            name,
            value,
            expected,
        })
    }
}
