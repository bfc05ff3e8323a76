//! Uniform spatial grid for bullet/asteroid broad phase
//!
//! Asteroids are binned into every cell their (slightly padded) bounding box
//! touches. A bullet then only needs the 3x3 block of cells around its own
//! cell: bullets are much smaller than a cell, so any asteroid it can touch
//! has a bounding box reaching into that block.

use std::collections::HashMap;

use glam::Vec2;

use super::asteroid::Asteroid;
use super::bullet::Bullet;
use super::collision::circles_overlap;

/// Extra bounding-box padding so float rounding can never drop a candidate
const BIN_PADDING: f32 = 1.0;

/// Grid cell size used when none is configured (pixels)
pub const DEFAULT_CELL_SIZE: f32 = 60.0;

/// Cell → asteroid indices, rebuilt every tick
#[derive(Debug, Clone)]
pub struct SpatialGrid {
    cell_size: f32,
    cells: HashMap<(i32, i32), Vec<usize>>,
    /// Reused candidate buffer for queries
    scratch: Vec<usize>,
}

impl Default for SpatialGrid {
    fn default() -> Self {
        Self::new(DEFAULT_CELL_SIZE)
    }
}

impl SpatialGrid {
    pub fn new(cell_size: f32) -> Self {
        Self {
            cell_size,
            cells: HashMap::new(),
            scratch: Vec::new(),
        }
    }

    pub fn cell_size(&self) -> f32 {
        self.cell_size
    }

    /// Change the cell size (drops all binned entries)
    pub fn set_cell_size(&mut self, cell_size: f32) {
        if cell_size != self.cell_size {
            self.cell_size = cell_size;
            self.cells.clear();
        }
    }

    fn cell_of(&self, pos: Vec2) -> (i32, i32) {
        (
            (pos.x / self.cell_size).floor() as i32,
            (pos.y / self.cell_size).floor() as i32,
        )
    }

    /// Empty every cell, keeping allocations of cells that were used
    pub fn clear(&mut self) {
        for v in self.cells.values_mut() {
            v.clear();
        }
        self.cells.retain(|_, v| v.capacity() > 0);
    }

    /// Bin a circle into every cell its bounding box overlaps
    pub fn insert(&mut self, index: usize, center: Vec2, radius: f32) {
        let reach = Vec2::splat(radius + BIN_PADDING);
        let (x0, y0) = self.cell_of(center - reach);
        let (x1, y1) = self.cell_of(center + reach);
        for cx in x0..=x1 {
            for cy in y0..=y1 {
                self.cells.entry((cx, cy)).or_default().push(index);
            }
        }
    }

    /// Clear and re-bin all asteroids by index
    pub fn rebuild(&mut self, asteroids: &[Asteroid]) {
        self.clear();
        for (index, asteroid) in asteroids.iter().enumerate() {
            self.insert(index, asteroid.pos, asteroid.radius);
        }
    }

    /// Indices binned in the 3x3 block around `pos`, sorted and deduplicated
    pub fn neighborhood(&self, pos: Vec2, out: &mut Vec<usize>) {
        out.clear();
        let (cx, cy) = self.cell_of(pos);
        for dx in -1..=1 {
            for dy in -1..=1 {
                if let Some(indices) = self.cells.get(&(cx + dx, cy + dy)) {
                    out.extend_from_slice(indices);
                }
            }
        }
        out.sort_unstable();
        out.dedup();
    }

    /// Asteroid indices colliding with `bullet`, ascending
    pub fn hits_for(&mut self, bullet: &Bullet, asteroids: &[Asteroid], out: &mut Vec<usize>) {
        let mut candidates = std::mem::take(&mut self.scratch);
        self.neighborhood(bullet.pos, &mut candidates);
        out.clear();
        out.extend(candidates.iter().copied().filter(|&i| {
            let a = &asteroids[i];
            circles_overlap(bullet.pos, bullet.radius, a.pos, a.radius)
        }));
        self.scratch = candidates;
    }

    /// Non-empty cells (diagnostics)
    pub fn occupied_cells(&self) -> usize {
        self.cells.values().filter(|v| !v.is_empty()).count()
    }
}

/// Every colliding (bullet, asteroid) index pair found through the grid
///
/// The grid must have been rebuilt from `asteroids`.
pub fn grid_pairs(
    grid: &mut SpatialGrid,
    bullets: &[Bullet],
    asteroids: &[Asteroid],
) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    let mut hits = Vec::new();
    for (bi, bullet) in bullets.iter().enumerate() {
        grid.hits_for(bullet, asteroids, &mut hits);
        pairs.extend(hits.iter().map(|&ai| (bi, ai)));
    }
    pairs
}

/// Reference all-pairs test
pub fn brute_force_pairs(bullets: &[Bullet], asteroids: &[Asteroid]) -> Vec<(usize, usize)> {
    let mut pairs = Vec::new();
    for (bi, b) in bullets.iter().enumerate() {
        for (ai, a) in asteroids.iter().enumerate() {
            if circles_overlap(b.pos, b.radius, a.pos, a.radius) {
                pairs.push((bi, ai));
            }
        }
    }
    pairs
}
