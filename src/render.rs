//! Render consumer contract
//!
//! Renderers receive a [`Scene`]: shared borrows of the entity stores plus
//! the HUD values. They cannot mutate simulation state.

use crate::sim::{Asteroid, Bullet, GameMode, GameState, Hud, LevelPhase, Player, Powerup};

/// Read-only snapshot of everything drawable
#[derive(Debug, Clone, Copy)]
pub struct Scene<'a> {
    pub width: f32,
    pub height: f32,
    pub asteroids: &'a [Asteroid],
    pub bullets: &'a [Bullet],
    pub powerups: &'a [Powerup],
    pub player: &'a Player,
    pub hud: Hud,
    pub level_phase: LevelPhase,
    /// Simulation time, for blinking/animation
    pub time_ms: f64,
}

impl<'a> Scene<'a> {
    pub fn capture(state: &'a GameState) -> Self {
        Self {
            width: state.width,
            height: state.height,
            asteroids: state.asteroids.as_slice(),
            bullets: state.bullets.as_slice(),
            powerups: state.powerups.as_slice(),
            player: &state.player,
            hud: state.hud(),
            level_phase: state.level_flow.phase,
            time_ms: state.time_ms,
        }
    }

    /// Ship drawn blinking during post-hit grace
    pub fn player_visible(&self) -> bool {
        self.player.invulnerable_frames == 0 || (self.player.invulnerable_frames / 6) % 2 == 0
    }

    /// Overlay text for the current mode, if any
    pub fn banner(&self) -> Option<String> {
        match self.hud.mode {
            GameMode::Start => Some("ASTEROID RAIN - press Enter".to_string()),
            GameMode::Playing => None,
            GameMode::Paused => Some("PAUSED".to_string()),
            GameMode::LevelTransition => Some(format!("LEVEL {} - press Enter", self.hud.level)),
            GameMode::GameOver => Some(format!("GAME OVER - score {}", self.hud.score)),
        }
    }
}

/// Something that draws a scene once per stepped frame
pub trait Renderer {
    fn render(&mut self, scene: &Scene<'_>);
}

/// Renderer that only logs a periodic summary (headless runs)
#[derive(Debug, Default)]
pub struct LogRenderer {
    frames: u64,
    /// Log every `every` frames (0 = never)
    pub every: u64,
}

impl LogRenderer {
    pub fn new(every: u64) -> Self {
        Self { frames: 0, every }
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }
}

impl Renderer for LogRenderer {
    fn render(&mut self, scene: &Scene<'_>) {
        self.frames += 1;
        if self.every > 0 && self.frames % self.every == 0 {
            log::debug!(
                "frame {}: {} asteroids, {} bullets, {} powerups, level {} score {} lives {} ({:?})",
                self.frames,
                scene.asteroids.len(),
                scene.bullets.len(),
                scene.powerups.len(),
                scene.hud.level,
                scene.hud.score,
                scene.hud.lives,
                scene.level_phase
            );
        }
    }
}
