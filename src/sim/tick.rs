//! Fixed timestep simulation tick
//!
//! One call advances the game by exactly one tick. Phases run in a fixed
//! order: player, firing, asteroids, bullets, powerups, collisions, level
//! flow.

use glam::Vec2;

use super::collision::resolve_collisions;
use super::powerup::{PowerupEvent, PowerupKind};
use super::state::{GameEvent, GameMode, GameState};

/// Input for a single tick (plain data; one-shot flags are consumed)
#[derive(Debug, Clone, Default, PartialEq)]
pub struct TickInput {
    /// Desired movement direction; clamped to unit length
    pub axis: Vec2,
    /// Absolute ship position (pointer/touch), wins over `axis`
    pub pointer: Option<Vec2>,
    /// Fire held
    pub fire: bool,
    pub start: bool,
    /// Pause toggle
    pub pause: bool,
    pub continue_level: bool,
    pub restart: bool,
    /// Demo mode: steer and fire automatically
    pub autopilot: bool,
}

impl TickInput {
    /// Reset one-shot triggers after they were delivered to a tick
    pub fn clear_triggers(&mut self) {
        self.pointer = None;
        self.start = false;
        self.pause = false;
        self.continue_level = false;
        self.restart = false;
    }
}

/// Apply mode-changing triggers
pub fn apply_controls(state: &mut GameState, input: &TickInput) {
    if input.restart {
        state.restart();
    }
    if input.start {
        state.start();
    }
    if input.continue_level {
        state.continue_level();
    }
    if input.pause {
        state.toggle_pause();
    }
}

/// Advance the game state by one fixed timestep
pub fn tick(state: &mut GameState, input: &TickInput) {
    let mut input = input.clone();
    if input.autopilot {
        autopilot(state, &mut input);
    }

    apply_controls(state, &input);
    if state.mode != GameMode::Playing {
        return;
    }

    state.time_ticks += 1;
    state.time_ms += state.tuning.tick_ms();

    // Player
    if let Some(target) = input.pointer {
        state.player.pointer_override = Some(target);
    }
    state
        .player
        .update(input.axis, &state.tuning, state.width, state.height);

    // Fire
    if input.fire {
        let nose = state.player.nose();
        let double = state.player.effects.is_active(PowerupKind::DoubleBlaster);
        let volley = state
            .bullets
            .fire(nose.x, nose.y, double, state.time_ms, &state.tuning);
        if volley.play_sound {
            state.events.push(GameEvent::Fire);
        }
    }

    // Asteroids
    let spawn_interval = state.tuning.spawn_interval_for_level(state.level);
    let allow_spawning = state.level_flow.spawning_allowed();
    let (field, params, rng) = state.asteroid_ctx();
    field.update(&params, spawn_interval, allow_spawning, rng);

    // Bullets
    state.bullets.update();

    // Powerups
    state
        .powerups
        .maybe_spawn(state.width, state.time_ms, &state.tuning, &mut state.rng);
    let events = &mut state.events;
    state
        .powerups
        .update(state.height, &mut state.player, &state.tuning, |event| {
            events.push(match event {
                PowerupEvent::Collected(kind) => GameEvent::PowerupCollected(kind),
                PowerupEvent::Expired(kind) => GameEvent::PowerupExpired(kind),
            })
        });

    // Collisions (may end the game)
    resolve_collisions(state);
    if state.mode != GameMode::Playing {
        return;
    }

    // Level flow
    let level_done = state.level_flow.update(
        state.time_ms,
        state.level,
        state.asteroids.roots_spawned(),
        state.asteroids.len(),
        &state.tuning,
    );
    if level_done {
        state.level_up();
    }
}

/// Fill in movement, fire and menu input for demo play
fn autopilot(state: &GameState, input: &mut TickInput) {
    match state.mode {
        GameMode::Start => input.start = true,
        GameMode::LevelTransition => input.continue_level = true,
        GameMode::Playing => {}
        GameMode::Paused | GameMode::GameOver => return,
    }

    let ship = state.player.center();
    let danger = state.tuning.player_width * 2.0;

    // Sidestep anything about to land on the ship, otherwise line up under
    // the lowest rock still above us
    let threat = state
        .asteroids
        .iter()
        .filter(|a| a.pos.y < ship.y && ship.y - a.pos.y < danger + a.radius)
        .find(|a| (a.pos.x - ship.x).abs() < a.radius + state.player.size.x);
    let target_x = if let Some(rock) = threat {
        if rock.pos.x > ship.x {
            ship.x - danger
        } else {
            ship.x + danger
        }
    } else {
        state
            .asteroids
            .iter()
            .filter(|a| a.pos.y < ship.y && a.pos.y > 0.0)
            .max_by(|a, b| a.pos.y.total_cmp(&b.pos.y))
            .map(|a| a.pos.x)
            .or_else(|| state.powerups.as_slice().first().map(|p| p.pos.x))
            .unwrap_or(state.width / 2.0)
    };

    let dx = target_x - ship.x;
    input.axis = if dx.abs() > 2.0 {
        Vec2::new(dx.signum(), 0.0)
    } else {
        Vec2::ZERO
    };
    input.pointer = None;
    input.fire = true;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::asteroid::Asteroid;
    use crate::sim::level::LevelPhase;
    use crate::tuning::{DeviceProfile, SizeTier, Tuning};

    fn new_state(tuning: Tuning) -> GameState {
        GameState::new(tuning, DeviceProfile::Desktop, 800.0, 600.0, 12345)
    }

    fn started(tuning: Tuning) -> GameState {
        let mut state = new_state(tuning);
        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
        );
        state.drain_events();
        state
    }

    #[test]
    fn test_tick_start_to_playing() {
        let mut state = new_state(Tuning::default());
        tick(&mut state, &TickInput::default());
        assert_eq!(state.mode, GameMode::Start);
        assert_eq!(state.time_ticks, 0);

        tick(
            &mut state,
            &TickInput {
                start: true,
                ..Default::default()
            },
        );
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.time_ticks, 1);
        // First root spawns on the first playing tick
        assert_eq!(state.asteroids.len(), 1);
    }

    #[test]
    fn test_tick_pause_freezes_simulation() {
        let mut state = started(Tuning::default());
        let pause = TickInput {
            pause: true,
            ..Default::default()
        };
        tick(&mut state, &pause);
        assert_eq!(state.mode, GameMode::Paused);
        let ticks = state.time_ticks;
        let positions: Vec<Vec2> = state.asteroids.iter().map(|a| a.pos).collect();

        for _ in 0..10 {
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.time_ticks, ticks);
        let after: Vec<Vec2> = state.asteroids.iter().map(|a| a.pos).collect();
        assert_eq!(positions, after);

        tick(&mut state, &pause);
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.time_ticks, ticks + 1);
    }

    #[test]
    fn test_fire_emits_throttled_sound() {
        let mut state = started(Tuning::default());
        let fire = TickInput {
            fire: true,
            ..Default::default()
        };
        tick(&mut state, &fire);
        assert_eq!(state.bullets.len(), 1);
        assert_eq!(state.drain_events(), vec![GameEvent::Fire]);

        // Within the cooldown nothing fires
        tick(&mut state, &fire);
        assert_eq!(state.bullets.len(), 1);
        assert!(!state.drain_events().contains(&GameEvent::Fire));
    }

    #[test]
    fn test_double_blaster_tick() {
        let mut state = started(Tuning::default());
        state
            .player
            .effects
            .activate(PowerupKind::DoubleBlaster, 600);
        tick(
            &mut state,
            &TickInput {
                fire: true,
                ..Default::default()
            },
        );
        assert_eq!(state.bullets.len(), 2);
    }

    #[test]
    fn test_level_transition_timing() {
        // One tier, one root per level, so the level ends as soon as that
        // root is destroyed
        let tuning = Tuning {
            size_tiers: vec![SizeTier {
                radius: 20.0,
                score: 10,
            }],
            asteroids_per_level: 1,
            level_grace_ms: 1500.0,
            ..Default::default()
        };
        let tick_ms = tuning.tick_ms();
        let mut state = started(tuning);
        assert_eq!(state.asteroids.len(), 1);
        assert_eq!(state.level_flow.phase, LevelPhase::SpawningHalted);

        // Destroy the root outright
        let (field, params, rng) = state.asteroid_ctx();
        let outcome = field.destroy(0, &params, rng).unwrap();
        assert_eq!(outcome.fragments, 0);
        let cleared_at = state.time_ms;

        tick(&mut state, &TickInput::default());
        assert!(matches!(
            state.level_flow.phase,
            LevelPhase::PendingLevelUp { .. }
        ));
        assert_eq!(state.mode, GameMode::Playing);

        let mut elapsed_ticks = 1;
        while state.mode == GameMode::Playing {
            tick(&mut state, &TickInput::default());
            elapsed_ticks += 1;
            assert!(elapsed_ticks < 1000, "level never advanced");
        }
        assert_eq!(state.mode, GameMode::LevelTransition);
        assert_eq!(state.level, 1);

        let waited = state.time_ms - cleared_at;
        assert!(waited >= 1500.0, "advanced too early: {waited}ms");
        assert!(waited < 1500.0 + 3.0 * tick_ms, "advanced too late: {waited}ms");
        assert!(state.drain_events().contains(&GameEvent::LevelUp { level: 2 }));

        // Continue re-arms spawning for the next level
        tick(
            &mut state,
            &TickInput {
                continue_level: true,
                ..Default::default()
            },
        );
        assert_eq!(state.mode, GameMode::Playing);
        assert_eq!(state.asteroids.len(), 1);
    }

    #[test]
    fn test_level_flow_terminates_within_max_wait() {
        // Rocks that never leave the field and never expire
        let tuning = Tuning {
            asteroids_per_level: 1,
            asteroid_max_lifetime_ms: 1e12,
            level_max_wait_ms: 5000.0,
            ..Default::default()
        };
        let max_wait = tuning.level_max_wait_ms;
        let tick_ms = tuning.tick_ms();
        let mut state = started(tuning);
        let start_ms = state.time_ms - tick_ms;
        state.asteroids.get_mut(0).unwrap().vel = Vec2::ZERO;

        while state.mode == GameMode::Playing {
            // Keep the ship away from the parked rock
            state.player.invulnerable_frames = 10;
            tick(&mut state, &TickInput::default());
        }
        assert_eq!(state.mode, GameMode::LevelTransition);
        assert_eq!(state.asteroids.len(), 1);
        let waited = state.time_ms - start_ms;
        assert!(waited >= max_wait && waited < max_wait + 2.0 * tick_ms);
    }

    #[test]
    fn test_bullet_kill_scores_through_tick() {
        let mut state = started(Tuning::default());
        state.asteroids.clear_all();
        let nose = state.player.nose();
        let tier = state.tuning.tier(2);
        state.asteroids.adopt(Asteroid {
            id: 500,
            pos: nose - Vec2::new(0.0, 12.0),
            radius: tier.radius,
            score: tier.score,
            size_level: 2,
            parent_id: Some(500),
            ..Default::default()
        });
        state.player.invulnerable_frames = 100;

        tick(
            &mut state,
            &TickInput {
                fire: true,
                ..Default::default()
            },
        );
        assert_eq!(state.score, tier.score as u64);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::Fire));
        assert!(events.iter().any(|e| e.cue() == Some(crate::sim::SoundCue::Break)));
    }

    #[test]
    fn test_game_over_and_restart() {
        let tuning = Tuning {
            lives: 1,
            ..Default::default()
        };
        let mut state = started(tuning);
        let center = state.player.center();
        state.asteroids.get_mut(0).unwrap().pos = center;
        state.asteroids.get_mut(0).unwrap().vel = Vec2::ZERO;

        tick(&mut state, &TickInput::default());
        assert_eq!(state.mode, GameMode::GameOver);
        let score = state.score;
        assert!(state.drain_events().contains(&GameEvent::GameOver { score }));

        // Game over ignores everything but restart
        tick(
            &mut state,
            &TickInput {
                start: true,
                pause: true,
                ..Default::default()
            },
        );
        assert_eq!(state.mode, GameMode::GameOver);

        tick(
            &mut state,
            &TickInput {
                restart: true,
                ..Default::default()
            },
        );
        assert_eq!(state.mode, GameMode::Start);
        assert_eq!(state.lives, 1);
        assert!(state.asteroids.is_empty());
    }

    #[test]
    fn test_determinism() {
        let inputs = [
            TickInput {
                start: true,
                ..Default::default()
            },
            TickInput {
                axis: Vec2::new(1.0, 0.0),
                fire: true,
                ..Default::default()
            },
            TickInput {
                pointer: Some(Vec2::new(100.0, 500.0)),
                ..Default::default()
            },
            TickInput::default(),
        ];

        let mut a = new_state(Tuning::default());
        let mut b = new_state(Tuning::default());
        for _ in 0..200 {
            for input in &inputs {
                tick(&mut a, input);
                tick(&mut b, input);
            }
        }
        assert_eq!(a.time_ticks, b.time_ticks);
        assert_eq!(a.score, b.score);
        assert_eq!(a.asteroids.len(), b.asteroids.len());
        for (x, y) in a.asteroids.iter().zip(b.asteroids.iter()) {
            assert_eq!(x.id, y.id);
            assert_eq!(x.pos, y.pos);
        }
    }

    #[test]
    fn test_autopilot_plays_and_progresses() {
        let tuning = Tuning {
            asteroids_per_level: 2,
            ..Default::default()
        };
        let mut state = new_state(tuning);
        let input = TickInput {
            autopilot: true,
            ..Default::default()
        };
        for _ in 0..60 * 60 {
            tick(&mut state, &input);
            if state.mode == GameMode::GameOver {
                break;
            }
        }
        assert!(state.time_ticks > 0);
        assert!(state.score > 0);
    }

    #[test]
    fn test_clear_triggers_keeps_held_input() {
        let mut input = TickInput {
            axis: Vec2::X,
            pointer: Some(Vec2::ONE),
            fire: true,
            start: true,
            pause: true,
            continue_level: true,
            restart: true,
            autopilot: false,
        };
        input.clear_triggers();
        assert_eq!(
            input,
            TickInput {
                axis: Vec2::X,
                fire: true,
                ..Default::default()
            }
        );
    }
}
