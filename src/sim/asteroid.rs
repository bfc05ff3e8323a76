//! Asteroid store: spawning, fragmentation and lineage bookkeeping
//!
//! Asteroids live in a dense `Vec` (swap-remove on death) backed by an
//! [`ObjectPool`] so their outline buffers are reused. Each asteroid carries
//! the id of the root it descends from; the [`FragmentTracker`] counts live
//! lineage members per root to award the fragment-clear bonus.

use std::collections::HashMap;
use std::f32::consts::TAU;

use glam::Vec2;
use rand::Rng;
use rand_pcg::Pcg32;
use serde::{Deserialize, Serialize};

use super::pool::{ObjectPool, Pooled};
use crate::tuning::Tuning;

/// A falling rock
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Asteroid {
    pub id: u32,
    pub pos: Vec2,
    pub vel: Vec2,
    pub radius: f32,
    /// Current rotation (radians)
    pub rotation: f32,
    /// Rotation speed (radians per tick)
    pub spin: f32,
    /// Outline offsets relative to `pos`, unrotated
    pub shape: Vec<Vec2>,
    /// 0 = largest tier
    pub size_level: u8,
    pub score: u32,
    /// Root of this asteroid's lineage (its own id for roots)
    pub parent_id: Option<u32>,
    /// Simulation time of creation (ms)
    pub created_ms: f64,
}

impl Pooled for Asteroid {
    fn reset(&mut self) {
        let mut shape = std::mem::take(&mut self.shape);
        shape.clear();
        *self = Asteroid {
            shape,
            ..Default::default()
        };
    }
}

impl Asteroid {
    /// Lineage key used by the fragment tracker
    pub fn lineage(&self) -> u32 {
        self.parent_id.unwrap_or(self.id)
    }

    /// True once the center is strictly beyond `margin` outside the canvas
    pub fn is_out_of_bounds(&self, width: f32, height: f32, margin: f32) -> bool {
        self.pos.x < -margin
            || self.pos.x > width + margin
            || self.pos.y < -margin
            || self.pos.y > height + margin
    }

    /// Outline in world space, rotated (for renderers)
    pub fn world_outline(&self) -> impl Iterator<Item = Vec2> + '_ {
        let rot = Vec2::from_angle(self.rotation);
        self.shape.iter().map(move |&p| self.pos + rot.rotate(p))
    }

    /// Fill the outline with a jagged polygon around `radius`
    fn build_shape(&mut self, tuning: &Tuning, rng: &mut Pcg32) {
        let vertices = rng.random_range(tuning.vertex_min..=tuning.vertex_max);
        let step = TAU / vertices as f32;
        let jag = tuning.jaggedness.max(0.0);
        self.shape.clear();
        for i in 0..vertices {
            let angle = i as f32 * step + rng.random_range(-0.3..=0.3) * step;
            let r = self.radius * (1.0 + rng.random_range(-jag..=jag));
            self.shape.push(Vec2::from_angle(angle) * r);
        }
    }
}

/// Outcome of releasing one minimal fragment from a lineage
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MinimalRelease {
    /// Root has no tracker entry (e.g. parentless asteroid)
    Untracked,
    /// Minimal fragments of this root still alive
    Remaining(u32),
    /// Last minimal fragment gone, but larger lineage members remain
    Cleared,
    /// Last member of the whole lineage gone
    LineageCleared,
}

/// Per-root live counts for the fragment-clear bonus
///
/// `minimal` holds the count of live smallest-tier fragments per root;
/// `open` holds the count of live larger lineage members (root included)
/// that may still break into more minimal fragments.
#[derive(Debug, Clone, Default)]
pub struct FragmentTracker {
    minimal: HashMap<u32, u32>,
    open: HashMap<u32, u32>,
}

impl FragmentTracker {
    /// Live minimal fragments for a root (`None` when no entry exists)
    pub fn fragment_count(&self, root: u32) -> Option<u32> {
        self.minimal.get(&root).copied()
    }

    /// True while any member of the lineage is alive
    pub fn is_tracking(&self, root: u32) -> bool {
        self.minimal.contains_key(&root) || self.open.contains_key(&root)
    }

    /// Number of roots with live minimal fragments
    pub fn minimal_roots(&self) -> usize {
        self.minimal.len()
    }

    /// Number of lineages with any live member
    pub fn lineages(&self) -> usize {
        self.open
            .keys()
            .chain(self.minimal.keys().filter(|root| !self.open.contains_key(root)))
            .count()
    }

    /// True once no lineage has a live member
    pub fn is_empty(&self) -> bool {
        self.minimal.is_empty() && self.open.is_empty()
    }

    fn add_open(&mut self, root: u32, count: u32) {
        *self.open.entry(root).or_insert(0) += count;
    }

    fn close_open(&mut self, root: u32) {
        if let Some(count) = self.open.get_mut(&root) {
            *count = count.saturating_sub(1);
            if *count == 0 {
                self.open.remove(&root);
            }
        }
    }

    fn add_minimal(&mut self, root: u32, count: u32) {
        *self.minimal.entry(root).or_insert(0) += count;
    }

    fn release_minimal(&mut self, root: u32) -> MinimalRelease {
        let Some(count) = self.minimal.get_mut(&root) else {
            return MinimalRelease::Untracked;
        };
        *count = count.saturating_sub(1);
        if *count > 0 {
            return MinimalRelease::Remaining(*count);
        }
        self.minimal.remove(&root);
        if self.open.contains_key(&root) {
            MinimalRelease::Cleared
        } else {
            MinimalRelease::LineageCleared
        }
    }

    fn clear(&mut self) {
        self.minimal.clear();
        self.open.clear();
    }
}

/// Per-call context for asteroid operations
#[derive(Debug, Clone, Copy)]
pub struct FieldParams<'a> {
    pub tuning: &'a Tuning,
    pub width: f32,
    pub height: f32,
    pub level: u32,
    pub now_ms: f64,
    /// Hard cap on live asteroids
    pub cap: usize,
}

/// Result of destroying an asteroid by collision
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Destruction {
    pub id: u32,
    pub size_level: u8,
    pub pos: Vec2,
    /// Score value of the destroyed asteroid
    pub score: u32,
    /// Fragment-clear bonus (0 unless this kill cleared a lineage)
    pub bonus: u32,
    pub fragments: u32,
    pub root_id: Option<u32>,
}

impl Destruction {
    pub fn total_score(&self) -> u32 {
        self.score + self.bonus
    }
}

/// Summary of one `update` call
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FieldUpdate {
    /// Asteroids removed for leaving the field or expiring
    pub removed: u32,
    /// Id of the root spawned this call, if any
    pub spawned: Option<u32>,
}

/// All live asteroids plus their pool and lineage table
#[derive(Debug)]
pub struct AsteroidField {
    active: Vec<Asteroid>,
    pool: ObjectPool<Asteroid>,
    tracker: FragmentTracker,
    next_id: u32,
    /// Roots spawned since the last level reset
    roots_spawned: u32,
    last_spawn_ms: Option<f64>,
}

impl Default for AsteroidField {
    fn default() -> Self {
        Self::new()
    }
}

impl AsteroidField {
    pub fn new() -> Self {
        Self {
            active: Vec::new(),
            pool: ObjectPool::default(),
            tracker: FragmentTracker::default(),
            next_id: 1,
            roots_spawned: 0,
            last_spawn_ms: None,
        }
    }

    pub fn len(&self) -> usize {
        self.active.len()
    }

    pub fn is_empty(&self) -> bool {
        self.active.is_empty()
    }

    pub fn as_slice(&self) -> &[Asteroid] {
        &self.active
    }

    pub fn iter(&self) -> std::slice::Iter<'_, Asteroid> {
        self.active.iter()
    }

    pub fn index_of(&self, id: u32) -> Option<usize> {
        self.active.iter().position(|a| a.id == id)
    }

    pub fn tracker(&self) -> &FragmentTracker {
        &self.tracker
    }

    pub fn fragment_count(&self, root: u32) -> Option<u32> {
        self.tracker.fragment_count(root)
    }

    pub fn roots_spawned(&self) -> u32 {
        self.roots_spawned
    }

    pub fn pool(&self) -> &ObjectPool<Asteroid> {
        &self.pool
    }

    /// Start a new level's root count; the next spawn may happen immediately
    pub fn reset_root_count(&mut self) {
        self.roots_spawned = 0;
        self.last_spawn_ms = None;
    }

    fn allocate_id(&mut self) -> u32 {
        let id = self.next_id;
        self.next_id = self.next_id.wrapping_add(1).max(1);
        id
    }

    /// Spawn a level-0 asteroid at a random X along the top edge
    ///
    /// Returns `None` (no-op) once the live count has reached the cap.
    pub fn spawn_root(&mut self, params: &FieldParams<'_>, rng: &mut Pcg32) -> Option<u32> {
        if self.active.len() >= params.cap {
            log::debug!("Root spawn rejected: {} asteroids at cap", self.active.len());
            return None;
        }
        let tuning = params.tuning;
        let tier = tuning.tier(0);
        let id = self.allocate_id();

        let mut asteroid = self.pool.acquire();
        asteroid.id = id;
        asteroid.radius = tier.radius;
        asteroid.score = tier.score;
        asteroid.size_level = 0;
        asteroid.parent_id = Some(id);
        asteroid.created_ms = params.now_ms;

        let x = if params.width > 2.0 * tier.radius {
            rng.random_range(tier.radius..=params.width - tier.radius)
        } else {
            params.width / 2.0
        };
        asteroid.pos = Vec2::new(x, -tier.radius);

        let speed = tuning.asteroid_speed(params.level) * rng.random_range(0.8..=1.2);
        let drift = rng.random_range(-tuning.asteroid_drift..=tuning.asteroid_drift);
        asteroid.vel = Vec2::new(drift, speed).clamp_length_max(tuning.asteroid_max_speed);
        asteroid.rotation = rng.random_range(0.0..TAU);
        asteroid.spin = rng.random_range(-tuning.asteroid_max_spin..=tuning.asteroid_max_spin);
        asteroid.build_shape(tuning, rng);

        // A root already at the minimal tier has nothing to fragment into
        if tuning.minimal_level() > 0 {
            self.tracker.add_open(id, 1);
        }

        self.active.push(asteroid);
        self.roots_spawned += 1;
        self.last_spawn_ms = Some(params.now_ms);
        log::debug!("Spawned root asteroid {} at x={:.0}", id, x);
        Some(id)
    }

    /// Destroy the asteroid at `index` (bullet hit or shield impact)
    ///
    /// Non-minimal asteroids break into fragments of the next tier; the
    /// last minimal fragment of a lineage earns the fragment-clear bonus.
    /// An out-of-range index is a no-op.
    pub fn destroy(
        &mut self,
        index: usize,
        params: &FieldParams<'_>,
        rng: &mut Pcg32,
    ) -> Option<Destruction> {
        if index >= self.active.len() {
            log::warn!(
                "destroy: index {} out of range ({} asteroids)",
                index,
                self.active.len()
            );
            return None;
        }
        let tuning = params.tuning;
        let asteroid = self.active.swap_remove(index);
        let (pos, vel, size_level, lineage) =
            (asteroid.pos, asteroid.vel, asteroid.size_level, asteroid.lineage());
        let mut outcome = Destruction {
            id: asteroid.id,
            size_level,
            pos,
            score: asteroid.score,
            bonus: 0,
            fragments: 0,
            root_id: asteroid.parent_id,
        };
        let minimal = size_level >= tuning.minimal_level();
        self.pool.release(asteroid);

        if minimal {
            if let Some(root) = outcome.root_id {
                if self.tracker.release_minimal(root) == MinimalRelease::LineageCleared {
                    outcome.bonus = tuning.fragment_clear_bonus;
                    log::debug!("Lineage {} fully cleared, bonus {}", root, outcome.bonus);
                }
            }
            return Some(outcome);
        }

        self.tracker.close_open(lineage);
        outcome.fragments = self.spawn_fragments(pos, vel, size_level + 1, lineage, params, rng);
        Some(outcome)
    }

    /// Destroy by id; `None` if no such asteroid is alive
    pub fn destroy_id(
        &mut self,
        id: u32,
        params: &FieldParams<'_>,
        rng: &mut Pcg32,
    ) -> Option<Destruction> {
        let index = self.index_of(id)?;
        self.destroy(index, params, rng)
    }

    fn spawn_fragments(
        &mut self,
        pos: Vec2,
        vel: Vec2,
        size_level: u8,
        lineage: u32,
        params: &FieldParams<'_>,
        rng: &mut Pcg32,
    ) -> u32 {
        let tuning = params.tuning;
        let tier = tuning.tier(size_level);
        let count = rng.random_range(tuning.fragment_count_min..=tuning.fragment_count_max);

        for _ in 0..count {
            let id = self.allocate_id();
            let direction = Vec2::from_angle(rng.random_range(0.0..TAU));
            let scatter = if rng.random_bool(tuning.fast_scatter_chance) {
                tuning.fast_scatter
            } else {
                tuning.slow_scatter
            };

            let mut fragment = self.pool.acquire();
            fragment.id = id;
            fragment.radius = tier.radius;
            fragment.score = tier.score;
            fragment.size_level = size_level;
            fragment.parent_id = Some(lineage);
            fragment.created_ms = params.now_ms;
            fragment.pos = pos + direction * tier.radius * 0.5;
            fragment.vel = (vel + direction * scatter * rng.random_range(0.5..=1.0))
                .clamp_length_max(tuning.asteroid_max_speed);
            fragment.rotation = rng.random_range(0.0..TAU);
            fragment.spin =
                rng.random_range(-tuning.asteroid_max_spin..=tuning.asteroid_max_spin) * 1.5;
            fragment.build_shape(tuning, rng);
            self.active.push(fragment);
        }

        if size_level >= tuning.minimal_level() {
            self.tracker.add_minimal(lineage, count);
        } else {
            self.tracker.add_open(lineage, count);
        }
        log::debug!(
            "Lineage {}: {} fragments at size level {}",
            lineage,
            count,
            size_level
        );
        count
    }

    /// Remove without score or fragments (expiry, out of bounds, ship impact)
    ///
    /// Lineage counts are still decremented so trackers never get stuck.
    pub fn discard(&mut self, index: usize, tuning: &Tuning) -> bool {
        if index >= self.active.len() {
            log::warn!(
                "discard: index {} out of range ({} asteroids)",
                index,
                self.active.len()
            );
            return false;
        }
        let asteroid = self.active.swap_remove(index);
        if asteroid.size_level >= tuning.minimal_level() {
            if let Some(root) = asteroid.parent_id {
                self.tracker.release_minimal(root);
            }
        } else {
            self.tracker.close_open(asteroid.lineage());
        }
        self.pool.release(asteroid);
        true
    }

    /// Advance, cull, and maybe spawn one root
    pub fn update(
        &mut self,
        params: &FieldParams<'_>,
        spawn_interval_ms: f64,
        allow_spawning: bool,
        rng: &mut Pcg32,
    ) -> FieldUpdate {
        let tuning = params.tuning;
        let mut result = FieldUpdate::default();

        // Reverse order keeps swap_remove from skipping unvisited entries
        for i in (0..self.active.len()).rev() {
            let asteroid = &mut self.active[i];
            asteroid.pos += asteroid.vel;
            asteroid.rotation = (asteroid.rotation + asteroid.spin).rem_euclid(TAU);

            let out = asteroid.is_out_of_bounds(
                params.width,
                params.height,
                tuning.out_of_bounds_margin,
            );
            let expired = params.now_ms - asteroid.created_ms > tuning.asteroid_max_lifetime_ms;
            if out || expired {
                if expired && !out {
                    log::debug!("Asteroid {} expired", asteroid.id);
                }
                self.discard(i, tuning);
                result.removed += 1;
            }
        }

        let interval_elapsed = self
            .last_spawn_ms
            .is_none_or(|last| params.now_ms - last >= spawn_interval_ms);
        if allow_spawning && interval_elapsed && self.active.len() < params.cap {
            result.spawned = self.spawn_root(params, rng);
        }
        result
    }

    /// Return every asteroid to the pool and forget all lineages
    pub fn clear_all(&mut self) {
        for asteroid in self.active.drain(..) {
            self.pool.release(asteroid);
        }
        self.tracker.clear();
        self.roots_spawned = 0;
        self.last_spawn_ms = None;
    }

    /// Insert a hand-built asteroid (scenario setup)
    #[cfg(test)]
    pub(crate) fn adopt(&mut self, asteroid: Asteroid) {
        self.next_id = self.next_id.max(asteroid.id + 1);
        self.active.push(asteroid);
    }

    #[cfg(test)]
    pub(crate) fn set_next_id(&mut self, id: u32) {
        self.next_id = id;
    }

    #[cfg(test)]
    pub(crate) fn get_mut(&mut self, index: usize) -> Option<&mut Asteroid> {
        self.active.get_mut(index)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;
    use rand::SeedableRng;

    fn params(tuning: &Tuning) -> FieldParams<'_> {
        FieldParams {
            tuning,
            width: 800.0,
            height: 600.0,
            level: 0,
            now_ms: 0.0,
            cap: tuning.asteroid_cap_desktop,
        }
    }

    fn rng() -> Pcg32 {
        Pcg32::seed_from_u64(7)
    }

    #[test]
    fn test_spawn_root_sets_tier_fields_and_lineage() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let id = field.spawn_root(&params(&tuning), &mut rng).unwrap();

        let a = &field.as_slice()[0];
        assert_eq!(a.id, id);
        assert_eq!(a.parent_id, Some(id));
        assert_eq!(a.size_level, 0);
        assert_eq!(a.radius, tuning.size_tiers[0].radius);
        assert_eq!(a.score, tuning.size_tiers[0].score);
        assert!((5..=11).contains(&a.shape.len()));
        assert!(a.pos.x >= a.radius && a.pos.x <= 800.0 - a.radius);
        assert!(a.vel.y > 0.0);
        assert_eq!(field.roots_spawned(), 1);
        assert_eq!(field.fragment_count(id), None);
    }

    #[test]
    fn test_spawn_cap_rejects_fifteenth() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let p = FieldParams {
            cap: 14,
            ..params(&tuning)
        };
        for _ in 0..14 {
            assert!(field.spawn_root(&p, &mut rng).is_some());
        }
        assert_eq!(field.spawn_root(&p, &mut rng), None);
        assert_eq!(field.len(), 14);
        assert_eq!(field.roots_spawned(), 14);
    }

    #[test]
    fn test_basic_fragmentation() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        field.set_next_id(7);
        let root = field.spawn_root(&params(&tuning), &mut rng).unwrap();
        assert_eq!(root, 7);

        let outcome = field.destroy(0, &params(&tuning), &mut rng).unwrap();
        assert_eq!(outcome.score, tuning.size_tiers[0].score);
        assert_eq!(outcome.bonus, 0);
        assert!((2..=3).contains(&outcome.fragments));
        assert_eq!(field.len(), outcome.fragments as usize);
        for fragment in field.iter() {
            assert_eq!(fragment.size_level, 1);
            assert_eq!(fragment.parent_id, Some(7));
            assert_eq!(fragment.radius, tuning.size_tiers[1].radius);
            assert_ne!(fragment.id, 7);
        }
        // Non-minimal fragments do not register in the minimal tracker
        assert_eq!(field.fragment_count(7), None);
        assert!(field.tracker().is_tracking(7));
    }

    #[test]
    fn test_fragments_inherit_parent_velocity() {
        let tuning = Tuning {
            slow_scatter: 0.0,
            fast_scatter: 0.0,
            ..Default::default()
        };
        let mut field = AsteroidField::new();
        let mut rng = rng();
        field.spawn_root(&params(&tuning), &mut rng);
        let parent_vel = field.as_slice()[0].vel;
        field.destroy(0, &params(&tuning), &mut rng);
        for fragment in field.iter() {
            assert!((fragment.vel - parent_vel).length() < 1e-5);
        }
    }

    #[test]
    fn test_fragment_clear_bonus_awarded_once() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let root = field.spawn_root(&params(&tuning), &mut rng).unwrap();

        let mut score = 0u32;
        let mut expected = 0u32;
        let mut bonuses = 0;
        while !field.is_empty() {
            // Destroy the newest asteroid first: fragments of one branch are
            // cleared before their siblings are touched
            let idx = field.len() - 1;
            let value = field.as_slice()[idx].score;
            let outcome = field.destroy(idx, &params(&tuning), &mut rng).unwrap();
            expected += value;
            score += outcome.total_score();
            if outcome.bonus > 0 {
                bonuses += 1;
                assert_eq!(outcome.root_id, Some(root));
            }
        }
        assert_eq!(bonuses, 1);
        assert_eq!(score, expected + tuning.fragment_clear_bonus);
        assert!(!field.tracker().is_tracking(root));
        assert!(field.tracker().is_empty());
    }

    proptest! {
        /// Whatever order the lineage is shot down in, the bonus is paid
        /// exactly once, on the final kill.
        #[test]
        fn test_fragment_clear_bonus_once_in_any_order(
            seed in any::<u64>(),
            picks in prop::collection::vec(any::<u16>(), 1..32),
        ) {
            let tuning = Tuning::default();
            let mut field = AsteroidField::new();
            let mut rng = Pcg32::seed_from_u64(seed);
            let root = field.spawn_root(&params(&tuning), &mut rng).unwrap();

            let mut bonuses = 0;
            let mut kills = 0;
            while !field.is_empty() {
                let idx = picks[kills % picks.len()] as usize % field.len();
                let outcome = field.destroy(idx, &params(&tuning), &mut rng).unwrap();
                kills += 1;
                if outcome.bonus > 0 {
                    bonuses += 1;
                    prop_assert_eq!(outcome.root_id, Some(root));
                    prop_assert_eq!(outcome.bonus, tuning.fragment_clear_bonus);
                    prop_assert!(field.is_empty());
                }
                prop_assert!(kills <= 64, "lineage never cleared");
            }
            prop_assert_eq!(bonuses, 1);
            prop_assert!(field.tracker().is_empty());
            prop_assert_eq!(field.tracker().lineages(), 0);
        }
    }

    #[test]
    fn test_tracker_counts_agree_with_emptiness() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let root = field.spawn_root(&params(&tuning), &mut rng).unwrap();
        // Only a non-minimal root is alive: no minimal entries, one lineage
        assert_eq!(field.tracker().minimal_roots(), 0);
        assert_eq!(field.tracker().lineages(), 1);
        assert!(!field.tracker().is_empty());

        field.destroy(0, &params(&tuning), &mut rng);
        let medium = field.len() - 1;
        field.destroy(medium, &params(&tuning), &mut rng);
        assert_eq!(field.tracker().minimal_roots(), 1);
        assert_eq!(field.tracker().lineages(), 1);
        assert!(field.tracker().is_tracking(root));
    }

    #[test]
    fn test_zero_drift_and_spin_spawn() {
        let tuning = Tuning::from_json(r#"{ "asteroid_drift": 0.0, "asteroid_max_spin": 0.0 }"#).unwrap();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        field.spawn_root(&params(&tuning), &mut rng).unwrap();
        field.destroy(0, &params(&tuning), &mut rng).unwrap();
        assert!(field.iter().all(|a| a.spin == 0.0));
    }

    #[test]
    fn test_minimal_tracker_counts_live_fragments() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let root = field.spawn_root(&params(&tuning), &mut rng).unwrap();
        field.destroy(0, &params(&tuning), &mut rng);
        // Break one medium fragment into minimal ones
        let medium = field.len() - 1;
        let outcome = field.destroy(medium, &params(&tuning), &mut rng).unwrap();
        assert_eq!(field.fragment_count(root), Some(outcome.fragments));

        let minimal = field.index_of(field.iter().rev().find(|a| a.size_level == 2).unwrap().id);
        field.destroy(minimal.unwrap(), &params(&tuning), &mut rng);
        assert_eq!(field.fragment_count(root), Some(outcome.fragments - 1));
    }

    #[test]
    fn test_parentless_minimal_destroy_is_harmless() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        field.adopt(Asteroid {
            id: 42,
            radius: 14.0,
            size_level: tuning.minimal_level(),
            score: 100,
            parent_id: None,
            ..Default::default()
        });
        let outcome = field.destroy(0, &params(&tuning), &mut rng).unwrap();
        assert_eq!(outcome.bonus, 0);
        assert_eq!(outcome.fragments, 0);
        assert!(field.is_empty());
        assert!(field.tracker().is_empty());
    }

    #[test]
    fn test_destroy_out_of_range_is_noop() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        assert!(field.destroy(3, &params(&tuning), &mut rng).is_none());
        assert!(!field.discard(0, &tuning));
    }

    #[test]
    fn test_out_of_bounds_margin_boundary() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let margin = tuning.out_of_bounds_margin;
        field.adopt(Asteroid {
            id: 1,
            radius: 14.0,
            size_level: 2,
            pos: Vec2::new(400.0, 600.0 + margin - 2.0),
            vel: Vec2::new(0.0, 2.0),
            ..Default::default()
        });

        let update = field.update(&params(&tuning), 1e9, false, &mut rng);
        assert_eq!(update.removed, 0);
        assert_eq!(field.as_slice()[0].pos.y, 600.0 + margin);

        let update = field.update(&params(&tuning), 1e9, false, &mut rng);
        assert_eq!(update.removed, 1);
        assert!(field.is_empty());
    }

    #[test]
    fn test_expired_minimal_fragment_releases_tracker() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let root = field.spawn_root(&params(&tuning), &mut rng).unwrap();
        field.destroy(0, &params(&tuning), &mut rng);
        while let Some(idx) = field.iter().position(|a| a.size_level < 2) {
            field.destroy(idx, &params(&tuning), &mut rng);
        }
        let live = field.len() as u32;
        assert_eq!(field.fragment_count(root), Some(live));

        // Hold everything in place and let the lifetime run out
        for i in 0..field.len() {
            let a = field.get_mut(i).unwrap();
            a.pos = Vec2::new(400.0, 300.0);
            a.vel = Vec2::ZERO;
        }
        let late = FieldParams {
            now_ms: tuning.asteroid_max_lifetime_ms + 1.0,
            ..params(&tuning)
        };
        let update = field.update(&late, 1e9, false, &mut rng);
        assert_eq!(update.removed, live);
        assert_eq!(field.fragment_count(root), None);
        assert!(!field.tracker().is_tracking(root));
    }

    #[test]
    fn test_update_spawns_on_interval_only() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        let mut p = params(&tuning);

        assert!(field.update(&p, 1000.0, true, &mut rng).spawned.is_some());
        p.now_ms = 500.0;
        assert!(field.update(&p, 1000.0, true, &mut rng).spawned.is_none());
        p.now_ms = 1000.0;
        assert!(field.update(&p, 1000.0, true, &mut rng).spawned.is_some());
        p.now_ms = 5000.0;
        assert!(field.update(&p, 1000.0, false, &mut rng).spawned.is_none());
        assert_eq!(field.roots_spawned(), 2);
    }

    #[test]
    fn test_pool_recycles_destroyed_asteroids() {
        let tuning = Tuning::default();
        let mut field = AsteroidField::new();
        let mut rng = rng();
        field.spawn_root(&params(&tuning), &mut rng);
        field.destroy(0, &params(&tuning), &mut rng);
        // The root's instance was released before fragments were acquired
        assert!(field.pool().created() <= 1 + field.len());
        field.clear_all();
        assert_eq!(field.pool().available(), field.pool().created());
    }

    #[test]
    fn test_world_outline_rotates_shape() {
        let mut a = Asteroid {
            pos: Vec2::new(10.0, 10.0),
            shape: vec![Vec2::new(5.0, 0.0)],
            rotation: std::f32::consts::FRAC_PI_2,
            ..Default::default()
        };
        let p: Vec<Vec2> = a.world_outline().collect();
        assert!((p[0] - Vec2::new(10.0, 15.0)).length() < 1e-4);
        a.reset();
        assert!(a.shape.is_empty());
        assert_eq!(a.pos, Vec2::ZERO);
    }
}
