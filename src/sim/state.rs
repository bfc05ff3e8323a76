//! Game state and mode machine
//!
//! [`GameState`] is the single owned context every subsystem reads and
//! writes. Nothing in the simulation keeps global state.

use rand::SeedableRng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::asteroid::{AsteroidField, FieldParams};
use super::bullet::BulletStore;
use super::collision::CollisionScratch;
use super::grid::SpatialGrid;
use super::level::LevelFlow;
use super::player::Player;
use super::powerup::{PowerupKind, PowerupStore};
use crate::tuning::{DeviceProfile, Tuning};

/// Top-level mode; only `Playing` advances the simulation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum GameMode {
    /// Title screen, waiting for start
    #[default]
    Start,
    Playing,
    Paused,
    /// Between levels, waiting for continue
    LevelTransition,
    GameOver,
}

/// Named audio cues for the host's sound sink
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SoundCue {
    Fire,
    Break,
    LevelUp,
    GameOver,
    PlayerHit,
    PowerupCollect,
    UiClick,
}

impl SoundCue {
    pub fn as_str(self) -> &'static str {
        match self {
            SoundCue::Fire => "fire",
            SoundCue::Break => "break",
            SoundCue::LevelUp => "levelup",
            SoundCue::GameOver => "gameover",
            SoundCue::PlayerHit => "player_hit",
            SoundCue::PowerupCollect => "powerup_collect",
            SoundCue::UiClick => "ui_click",
        }
    }
}

/// Something that happened during a tick or a mode change
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GameEvent {
    Fire,
    AsteroidDestroyed {
        id: u32,
        size_level: u8,
        score: u32,
        fragments: u32,
    },
    FragmentBonus {
        root_id: u32,
        bonus: u32,
    },
    ShieldAbsorbed {
        asteroid_id: u32,
    },
    PlayerHit {
        lives_left: u8,
    },
    PowerupCollected(PowerupKind),
    PowerupExpired(PowerupKind),
    LevelUp {
        level: u32,
    },
    GameOver {
        score: u64,
    },
    UiClick,
}

impl GameEvent {
    /// Sound to play for this event, if any
    pub fn cue(&self) -> Option<SoundCue> {
        match self {
            GameEvent::Fire => Some(SoundCue::Fire),
            GameEvent::AsteroidDestroyed { .. } => Some(SoundCue::Break),
            GameEvent::PlayerHit { .. } => Some(SoundCue::PlayerHit),
            GameEvent::PowerupCollected(_) => Some(SoundCue::PowerupCollect),
            GameEvent::LevelUp { .. } => Some(SoundCue::LevelUp),
            GameEvent::GameOver { .. } => Some(SoundCue::GameOver),
            GameEvent::UiClick => Some(SoundCue::UiClick),
            GameEvent::FragmentBonus { .. }
            | GameEvent::ShieldAbsorbed { .. }
            | GameEvent::PowerupExpired(_) => None,
        }
    }
}

/// Session values for the HUD
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Hud {
    pub score: u64,
    /// 1-based level number
    pub level: u32,
    pub lives: u8,
    pub mode: GameMode,
}

/// Complete simulation context
#[derive(Debug)]
pub struct GameState {
    pub tuning: Tuning,
    pub profile: DeviceProfile,
    pub mode: GameMode,
    /// Level index (0-based, never decreases within a run)
    pub level: u32,
    pub score: u64,
    pub lives: u8,
    /// Canvas size in pixels
    pub width: f32,
    pub height: f32,
    /// Simulated milliseconds of active play
    pub time_ms: f64,
    /// Simulation tick counter
    pub time_ticks: u64,
    pub seed: u64,
    pub player: Player,
    pub asteroids: AsteroidField,
    pub bullets: BulletStore,
    pub powerups: PowerupStore,
    pub level_flow: LevelFlow,
    pub grid: SpatialGrid,
    pub(crate) scratch: CollisionScratch,
    pub rng: Pcg32,
    /// Events since the last drain
    pub events: Vec<GameEvent>,
}

impl GameState {
    /// Create a state in `Start` mode. `tuning` is assumed validated.
    pub fn new(tuning: Tuning, profile: DeviceProfile, width: f32, height: f32, seed: u64) -> Self {
        let player = Player::new(&tuning, width, height);
        let grid = SpatialGrid::new(tuning.grid_cell_size);
        let lives = tuning.lives;
        Self {
            tuning,
            profile,
            mode: GameMode::Start,
            level: 0,
            score: 0,
            lives,
            width,
            height,
            time_ms: 0.0,
            time_ticks: 0,
            seed,
            player,
            asteroids: AsteroidField::new(),
            bullets: BulletStore::new(),
            powerups: PowerupStore::new(),
            level_flow: LevelFlow::new(0.0),
            grid,
            scratch: CollisionScratch::default(),
            rng: Pcg32::seed_from_u64(seed),
            events: Vec::new(),
        }
    }

    /// Asteroid store together with its call context and the RNG
    pub(crate) fn asteroid_ctx(&mut self) -> (&mut AsteroidField, FieldParams<'_>, &mut Pcg32) {
        let params = FieldParams {
            tuning: &self.tuning,
            width: self.width,
            height: self.height,
            level: self.level,
            now_ms: self.time_ms,
            cap: self.tuning.asteroid_cap(self.profile),
        };
        (&mut self.asteroids, params, &mut self.rng)
    }

    pub fn hud(&self) -> Hud {
        Hud {
            score: self.score,
            level: self.level + 1,
            lives: self.lives,
            mode: self.mode,
        }
    }

    /// Take all pending events
    pub fn drain_events(&mut self) -> Vec<GameEvent> {
        std::mem::take(&mut self.events)
    }

    /// Canvas resized; the ship is pulled back inside
    pub fn set_viewport(&mut self, width: f32, height: f32) {
        self.width = width;
        self.height = height;
        self.player.clamp(width, height);
    }

    /// START → PLAYING
    pub fn start(&mut self) -> bool {
        if self.mode != GameMode::Start {
            log::debug!("start ignored in {:?}", self.mode);
            return false;
        }
        self.mode = GameMode::Playing;
        self.level_flow.rearm(self.time_ms);
        self.events.push(GameEvent::UiClick);
        log::info!("Game started (seed {})", self.seed);
        true
    }

    /// PLAYING ↔ PAUSED
    pub fn toggle_pause(&mut self) -> bool {
        self.mode = match self.mode {
            GameMode::Playing => GameMode::Paused,
            GameMode::Paused => GameMode::Playing,
            other => {
                log::debug!("pause ignored in {:?}", other);
                return false;
            }
        };
        log::info!("Mode: {:?}", self.mode);
        true
    }

    /// LEVEL_TRANSITION → PLAYING, re-arming the level flow
    pub fn continue_level(&mut self) -> bool {
        if self.mode != GameMode::LevelTransition {
            log::debug!("continue ignored in {:?}", self.mode);
            return false;
        }
        self.mode = GameMode::Playing;
        self.level_flow.rearm(self.time_ms);
        self.events.push(GameEvent::UiClick);
        log::info!("Level {} begins", self.level + 1);
        true
    }

    /// Advance to the next level and enter LEVEL_TRANSITION
    pub fn level_up(&mut self) {
        self.level += 1;
        self.mode = GameMode::LevelTransition;
        self.bullets.clear_all();
        self.asteroids.reset_root_count();
        self.level_flow.rearm(self.time_ms);
        self.events.push(GameEvent::LevelUp { level: self.level + 1 });
        log::info!("Level up: now level {} (score {})", self.level + 1, self.score);
    }

    /// GAME_OVER → START with a full reset; pools keep their instances
    pub fn restart(&mut self) -> bool {
        if self.mode != GameMode::GameOver {
            log::debug!("restart ignored in {:?}", self.mode);
            return false;
        }
        self.asteroids.clear_all();
        self.bullets.clear_all();
        self.bullets.reset_timers();
        self.powerups.clear_all();
        self.player = Player::new(&self.tuning, self.width, self.height);
        self.level = 0;
        self.score = 0;
        self.lives = self.tuning.lives;
        self.time_ms = 0.0;
        self.time_ticks = 0;
        self.level_flow = LevelFlow::new(0.0);
        self.events.clear();
        self.events.push(GameEvent::UiClick);
        self.mode = GameMode::Start;
        log::info!("Game reset");
        true
    }
}
