//! Level progression
//!
//! A level spawns a quota of root asteroids, halts spawning, waits for the
//! field to clear, then holds a short grace period before advancing. A
//! safety timeout measured from the start of the level forces the advance
//! if the field never clears.

use serde::{Deserialize, Serialize};

use crate::tuning::Tuning;

/// Where the current level is in its lifecycle
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum LevelPhase {
    /// Root asteroids may spawn
    Spawning,
    /// Quota reached; waiting for the field to empty
    SpawningHalted,
    /// Field is empty; level-up after the grace delay
    PendingLevelUp { cleared_at_ms: f64 },
}

/// Spawn gate and level-up timer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LevelFlow {
    pub phase: LevelPhase,
    /// Simulation time the current level (re)started
    pub level_started_ms: f64,
}

impl Default for LevelFlow {
    fn default() -> Self {
        Self::new(0.0)
    }
}

impl LevelFlow {
    pub fn new(now_ms: f64) -> Self {
        Self {
            phase: LevelPhase::Spawning,
            level_started_ms: now_ms,
        }
    }

    pub fn spawning_allowed(&self) -> bool {
        self.phase == LevelPhase::Spawning
    }

    /// Re-enable spawning and restart the safety timer
    pub fn rearm(&mut self, now_ms: f64) {
        self.phase = LevelPhase::Spawning;
        self.level_started_ms = now_ms;
    }

    /// Advance the state machine; returns true when the level should end
    ///
    /// Several transitions may happen in one call: a level whose last root
    /// spawned and whose field is already empty goes straight to pending.
    pub fn update(
        &mut self,
        now_ms: f64,
        level: u32,
        roots_spawned: u32,
        live_asteroids: usize,
        tuning: &Tuning,
    ) -> bool {
        if self.phase == LevelPhase::Spawning && roots_spawned >= tuning.root_quota(level) {
            log::debug!(
                "Level {}: {} roots spawned, spawning halted",
                level + 1,
                roots_spawned
            );
            self.phase = LevelPhase::SpawningHalted;
        }

        if self.phase == LevelPhase::SpawningHalted && live_asteroids == 0 {
            log::debug!("Level {}: field cleared at {:.0}ms", level + 1, now_ms);
            self.phase = LevelPhase::PendingLevelUp {
                cleared_at_ms: now_ms,
            };
        }

        if let LevelPhase::PendingLevelUp { cleared_at_ms } = self.phase {
            if now_ms - cleared_at_ms >= tuning.level_grace_ms {
                return true;
            }
        }

        if now_ms - self.level_started_ms >= tuning.level_max_wait_ms {
            log::warn!(
                "Level {}: forcing level-up after {:.0}ms ({:?}, {} asteroids live)",
                level + 1,
                now_ms - self.level_started_ms,
                self.phase,
                live_asteroids
            );
            return true;
        }
        false
    }
}
