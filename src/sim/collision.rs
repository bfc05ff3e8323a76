//! Collision tests and hit resolution
//!
//! Bullets against asteroids go through the [`SpatialGrid`]; the single
//! player ship is tested against every asteroid directly. All removals are
//! deferred until detection finishes and then applied in descending index
//! order, so `swap_remove` never moves an entry that is still pending.
//!
//! [`SpatialGrid`]: super::grid::SpatialGrid

use glam::Vec2;

use super::powerup::PowerupKind;
use super::state::{GameEvent, GameMode, GameState};
use crate::tuning::ShieldPolicy;

/// Strict circle overlap (touching circles do not collide)
#[inline]
pub fn circles_overlap(a: Vec2, ra: f32, b: Vec2, rb: f32) -> bool {
    let r = ra + rb;
    a.distance_squared(b) < r * r
}

/// Circle against an axis-aligned box given by its min/max corners
#[inline]
pub fn circle_rect_overlap(center: Vec2, radius: f32, min: Vec2, max: Vec2) -> bool {
    let closest = center.clamp(min, max);
    center.distance_squared(closest) < radius * radius
}

/// Index buffers reused across ticks by the collision passes
#[derive(Debug, Clone, Default)]
pub struct CollisionScratch {
    claimed: Vec<bool>,
    spent_bullets: Vec<usize>,
    doomed: Vec<usize>,
    hits: Vec<usize>,
    overlapping: Vec<usize>,
}

/// Run both collision passes for one tick
pub fn resolve_collisions(state: &mut GameState) {
    resolve_bullet_hits(state);
    resolve_player_hits(state);
}

/// Bullets against asteroids
///
/// Each bullet takes the first asteroid it overlaps that no earlier bullet
/// already claimed this tick, then stops testing.
pub fn resolve_bullet_hits(state: &mut GameState) {
    if state.bullets.is_empty() || state.asteroids.is_empty() {
        return;
    }

    state.grid.set_cell_size(state.tuning.grid_cell_size);
    state.grid.rebuild(state.asteroids.as_slice());

    let mut scratch = std::mem::take(&mut state.scratch);
    scratch.claimed.clear();
    scratch.claimed.resize(state.asteroids.len(), false);
    scratch.spent_bullets.clear();
    scratch.doomed.clear();

    for (bi, bullet) in state.bullets.as_slice().iter().enumerate() {
        state
            .grid
            .hits_for(bullet, state.asteroids.as_slice(), &mut scratch.hits);
        if let Some(&ai) = scratch.hits.iter().find(|&&ai| !scratch.claimed[ai]) {
            scratch.claimed[ai] = true;
            scratch.spent_bullets.push(bi);
            scratch.doomed.push(ai);
        }
    }

    scratch.doomed.sort_unstable_by(|a, b| b.cmp(a));
    for &index in &scratch.doomed {
        destroy_asteroid(state, index);
    }

    scratch.spent_bullets.sort_unstable_by(|a, b| b.cmp(a));
    for &index in &scratch.spent_bullets {
        state.bullets.despawn_at(index);
    }
    state.scratch = scratch;
}

/// Destroy one asteroid, awarding score and any fragment-clear bonus
fn destroy_asteroid(state: &mut GameState, index: usize) -> Option<u32> {
    let (field, params, rng) = state.asteroid_ctx();
    let outcome = field.destroy(index, &params, rng)?;

    state.score += outcome.total_score() as u64;
    state.events.push(GameEvent::AsteroidDestroyed {
        id: outcome.id,
        size_level: outcome.size_level,
        score: outcome.score,
        fragments: outcome.fragments,
    });
    if outcome.bonus > 0 {
        if let Some(root_id) = outcome.root_id {
            state.events.push(GameEvent::FragmentBonus {
                root_id,
                bonus: outcome.bonus,
            });
        }
    }
    Some(outcome.id)
}

/// Ship against asteroids (direct scan)
pub fn resolve_player_hits(state: &mut GameState) {
    if state.mode != GameMode::Playing || state.player.invulnerable_frames > 0 {
        return;
    }

    let (min, max) = state.player.bounds();
    let mut scratch = std::mem::take(&mut state.scratch);
    scratch.overlapping.clear();
    scratch.overlapping.extend(
        state
            .asteroids
            .iter()
            .enumerate()
            .filter(|(_, a)| circle_rect_overlap(a.pos, a.radius, min, max))
            .map(|(i, _)| i),
    );

    if let Some(&first) = scratch.overlapping.first() {
        if !state.player.is_shielded() {
            take_hit(state, first);
        } else {
            match state.tuning.shield_policy {
                ShieldPolicy::AbsorbUntilExpiry => {
                    scratch.overlapping.sort_unstable_by(|a, b| b.cmp(a));
                    for &index in &scratch.overlapping {
                        absorb(state, index);
                    }
                }
                ShieldPolicy::BreakOnHit => {
                    absorb(state, first);
                    state.player.effects.deactivate(PowerupKind::Shield);
                    // Fragments of the absorbed rock spawn on top of the ship
                    state.player.invulnerable_frames =
                        state.tuning.frames_for_ms(state.tuning.hit_invulnerability_ms);
                    log::info!("Shield broke absorbing a hit");
                }
            }
        }
    }
    state.scratch = scratch;
}

fn absorb(state: &mut GameState, index: usize) {
    if let Some(id) = destroy_asteroid(state, index) {
        state.events.push(GameEvent::ShieldAbsorbed { asteroid_id: id });
    }
}

/// Unshielded impact: the rock is removed without score and a life is lost
fn take_hit(state: &mut GameState, index: usize) {
    if !state.asteroids.discard(index, &state.tuning) {
        return;
    }
    state.lives = state.lives.saturating_sub(1);
    state.player.invulnerable_frames =
        state.tuning.frames_for_ms(state.tuning.hit_invulnerability_ms);
    state.events.push(GameEvent::PlayerHit {
        lives_left: state.lives,
    });
    log::info!("Player hit, {} lives left", state.lives);

    if state.lives == 0 {
        state.mode = GameMode::GameOver;
        state.events.push(GameEvent::GameOver { score: state.score });
        log::info!(
            "Game over at level {} with score {}",
            state.level + 1,
            state.score
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::asteroid::Asteroid;
    use crate::tuning::Tuning;

    fn playing_state(tuning: Tuning) -> GameState {
        let mut state = GameState::new(tuning, Default::default(), 800.0, 600.0, 11);
        state.start();
        state.drain_events();
        state
    }

    fn rock(id: u32, pos: Vec2, size_level: u8, tuning: &Tuning) -> Asteroid {
        let tier = tuning.tier(size_level);
        Asteroid {
            id,
            pos,
            radius: tier.radius,
            score: tier.score,
            size_level,
            parent_id: Some(id),
            ..Default::default()
        }
    }

    #[test]
    fn test_circles_overlap_is_strict() {
        assert!(circles_overlap(Vec2::ZERO, 1.0, Vec2::new(1.9, 0.0), 1.0));
        assert!(!circles_overlap(Vec2::ZERO, 1.0, Vec2::new(2.0, 0.0), 1.0));
    }

    #[test]
    fn test_circle_rect_overlap() {
        let (min, max) = (Vec2::new(0.0, 0.0), Vec2::new(10.0, 10.0));
        assert!(circle_rect_overlap(Vec2::new(5.0, 5.0), 1.0, min, max));
        assert!(circle_rect_overlap(Vec2::new(12.0, 5.0), 3.0, min, max));
        assert!(!circle_rect_overlap(Vec2::new(13.0, 13.0), 3.0, min, max));
    }

    #[test]
    fn test_bullet_destroys_asteroid_and_scores() {
        let tuning = Tuning::default();
        let mut state = playing_state(tuning.clone());
        let pos = Vec2::new(400.0, 200.0);
        state.asteroids.adopt(rock(7, pos, 2, &tuning));
        state.bullets.fire(pos.x, pos.y + 10.0, false, 0.0, &tuning);

        resolve_collisions(&mut state);

        assert!(state.asteroids.is_empty());
        assert!(state.bullets.is_empty());
        assert_eq!(state.score, tuning.size_tiers[2].score as u64);
        assert!(state.drain_events().iter().any(|e| matches!(
            e,
            GameEvent::AsteroidDestroyed { id: 7, .. }
        )));
    }

    #[test]
    fn test_bullet_pass_reuses_buffers() {
        let tuning = Tuning {
            fire_cooldown_ms: 0.0,
            ..Default::default()
        };
        let mut state = playing_state(tuning.clone());
        let volley = |state: &mut GameState, t: f64| {
            for i in 0..4 {
                let pos = Vec2::new(100.0 + 150.0 * i as f32, 200.0);
                state.asteroids.adopt(rock(10 + i, pos, 2, &tuning));
                state.bullets.fire(pos.x, pos.y, false, t + i as f64, &tuning);
            }
        };

        volley(&mut state, 0.0);
        resolve_collisions(&mut state);
        assert!(state.asteroids.is_empty());
        let claimed = (state.scratch.claimed.as_ptr(), state.scratch.claimed.capacity());
        let doomed = (state.scratch.doomed.as_ptr(), state.scratch.doomed.capacity());
        assert!(claimed.1 >= 4 && doomed.1 >= 4);

        volley(&mut state, 10.0);
        resolve_collisions(&mut state);
        assert!(state.asteroids.is_empty());
        assert!(state.bullets.is_empty());
        assert_eq!(
            (state.scratch.claimed.as_ptr(), state.scratch.claimed.capacity()),
            claimed
        );
        assert_eq!(
            (state.scratch.doomed.as_ptr(), state.scratch.doomed.capacity()),
            doomed
        );
    }

    #[test]
    fn test_two_bullets_one_asteroid() {
        let tuning = Tuning {
            fire_cooldown_ms: 0.0,
            ..Default::default()
        };
        let mut state = playing_state(tuning.clone());
        let pos = Vec2::new(400.0, 200.0);
        state.asteroids.adopt(rock(3, pos, 2, &tuning));
        state.bullets.fire(pos.x - 2.0, pos.y, false, 0.0, &tuning);
        state.bullets.fire(pos.x + 2.0, pos.y, false, 1.0, &tuning);

        resolve_collisions(&mut state);

        // The second bullet found nothing unclaimed and keeps flying
        assert!(state.asteroids.is_empty());
        assert_eq!(state.bullets.len(), 1);
    }

    #[test]
    fn test_one_bullet_stops_after_first_hit() {
        let tuning = Tuning::default();
        let mut state = playing_state(tuning.clone());
        let pos = Vec2::new(400.0, 200.0);
        state.asteroids.adopt(rock(1, pos, 2, &tuning));
        state.asteroids.adopt(rock(2, pos + Vec2::new(4.0, 0.0), 2, &tuning));
        state.bullets.fire(pos.x + 2.0, pos.y, false, 0.0, &tuning);

        resolve_collisions(&mut state);

        assert_eq!(state.asteroids.len(), 1);
        assert!(state.bullets.is_empty());
    }

    #[test]
    fn test_unshielded_hit_costs_life_without_score() {
        let tuning = Tuning::default();
        let mut state = playing_state(tuning.clone());
        let center = state.player.center();
        state.asteroids.adopt(rock(5, center, 0, &tuning));

        resolve_collisions(&mut state);

        assert_eq!(state.lives, tuning.lives - 1);
        assert_eq!(state.score, 0);
        assert!(state.asteroids.is_empty());
        assert!(state.player.invulnerable_frames > 0);
        assert_eq!(
            state.drain_events(),
            vec![GameEvent::PlayerHit {
                lives_left: tuning.lives - 1
            }]
        );
    }

    #[test]
    fn test_invulnerable_player_is_not_hit() {
        let tuning = Tuning::default();
        let mut state = playing_state(tuning.clone());
        state.player.invulnerable_frames = 10;
        let center = state.player.center();
        state.asteroids.adopt(rock(5, center, 0, &tuning));

        resolve_collisions(&mut state);

        assert_eq!(state.lives, tuning.lives);
        assert_eq!(state.asteroids.len(), 1);
    }

    #[test]
    fn test_last_life_ends_game() {
        let tuning = Tuning {
            lives: 1,
            ..Default::default()
        };
        let mut state = playing_state(tuning.clone());
        let center = state.player.center();
        state.asteroids.adopt(rock(5, center, 2, &tuning));

        resolve_collisions(&mut state);

        assert_eq!(state.mode, GameMode::GameOver);
        let events = state.drain_events();
        assert!(events.contains(&GameEvent::GameOver { score: 0 }));
    }

    #[test]
    fn test_shield_absorbs_until_expiry() {
        let tuning = Tuning::default();
        let mut state = playing_state(tuning.clone());
        state.player.effects.activate(PowerupKind::Shield, 100);
        let center = state.player.center();
        state.asteroids.adopt(rock(1, center, 2, &tuning));
        state.asteroids.adopt(rock(2, center + Vec2::new(5.0, 0.0), 2, &tuning));

        resolve_collisions(&mut state);

        assert_eq!(state.lives, tuning.lives);
        assert!(state.player.is_shielded());
        assert!(state.asteroids.is_empty());
        assert_eq!(state.score, 2 * tuning.size_tiers[2].score as u64);
        let absorbed = state
            .drain_events()
            .iter()
            .filter(|e| matches!(e, GameEvent::ShieldAbsorbed { .. }))
            .count();
        assert_eq!(absorbed, 2);
    }

    #[test]
    fn test_shield_break_on_hit() {
        let tuning = Tuning {
            shield_policy: ShieldPolicy::BreakOnHit,
            ..Default::default()
        };
        let mut state = playing_state(tuning.clone());
        state.player.effects.activate(PowerupKind::Shield, 100);
        let center = state.player.center();
        state.asteroids.adopt(rock(1, center, 0, &tuning));

        resolve_collisions(&mut state);

        assert_eq!(state.lives, tuning.lives);
        assert!(!state.player.is_shielded());
        // Fragments of the large rock spawned on the ship but grace applies
        assert!(!state.asteroids.is_empty());
        assert!(state.player.invulnerable_frames > 0);
        resolve_collisions(&mut state);
        assert_eq!(state.lives, tuning.lives);
    }
}
