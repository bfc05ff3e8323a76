//! Asteroid Rain - a vertical asteroid shooter
//!
//! Core modules:
//! - `sim`: Deterministic simulation (entity stores, collisions, level flow)
//! - `frame_loop`: Fixed-timestep stepping and frame scheduling
//! - `render`: Read-only scene view handed to renderers
//! - `tuning`: Data-driven game balance
//! - `error`: Configuration errors

pub mod error;
pub mod frame_loop;
pub mod render;
pub mod sim;
pub mod tuning;

#[cfg(target_arch = "wasm32")]
pub mod audio;

pub use error::ConfigError;
pub use frame_loop::{FrameLoop, FrameScheduler, FrameStep, LoopDriver};
pub use render::{Renderer, Scene};
pub use sim::{GameEvent, GameMode, GameState, Hud, SoundCue, TickInput};
pub use tuning::{DeviceProfile, ShieldPolicy, Tuning};

/// Game configuration constants
pub mod consts {
    /// Maximum simulation ticks per animation frame to prevent spiral of death
    pub const MAX_SUBSTEPS: u32 = 8;
    /// Frames arriving this much early still count as due (ms)
    pub const FRAME_JITTER_MS: f64 = 1.0;
    /// Longest wall-clock gap fed into the accumulator (tab switches, GC)
    pub const MAX_FRAME_GAP_MS: f64 = 250.0;

    /// Logical canvas size used when the host has none
    pub const DEFAULT_WIDTH: f32 = 800.0;
    pub const DEFAULT_HEIGHT: f32 = 600.0;

    /// Seed for headless runs
    pub const DEFAULT_SEED: u64 = 0x5eed_a57e;
}
