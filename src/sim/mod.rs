//! Deterministic simulation module
//!
//! All gameplay logic lives here. This module must be pure and deterministic:
//! - Fixed timestep only (velocities are pixels per tick)
//! - Seeded RNG only
//! - Stable iteration order
//! - No rendering or platform dependencies

pub mod asteroid;
pub mod bullet;
pub mod collision;
pub mod grid;
pub mod level;
pub mod player;
pub mod pool;
pub mod powerup;
pub mod state;
pub mod tick;

pub use asteroid::{Asteroid, AsteroidField, Destruction, FieldParams, FragmentTracker};
pub use bullet::{Bullet, BulletOwner, BulletStore, Volley};
pub use collision::{circle_rect_overlap, circles_overlap, resolve_collisions};
pub use grid::{SpatialGrid, brute_force_pairs, grid_pairs};
pub use level::{LevelFlow, LevelPhase};
pub use player::{ActiveEffects, EffectTimer, Player};
pub use pool::{ObjectPool, Pooled};
pub use powerup::{Powerup, PowerupEvent, PowerupKind, PowerupStore};
pub use state::{GameEvent, GameMode, GameState, Hud, SoundCue};
pub use tick::{TickInput, apply_controls, tick};
