//! Error types
//!
//! The simulation itself never returns errors mid-tick: invariant violations
//! degrade to logged no-ops. Only configuration loading can fail, and it
//! fails before the first frame.

use thiserror::Error;

/// Configuration rejected at startup
#[derive(Debug, Error)]
pub enum ConfigError {
    /// Tuning JSON could not be parsed (includes unknown powerup kinds)
    #[error("failed to parse tuning: {0}")]
    Parse(#[from] serde_json::Error),

    /// Tuning file could not be read
    #[error("failed to read tuning file {path}: {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// Size tier table is empty
    #[error("size tier table must contain at least one tier")]
    NoSizeTiers,

    /// Size tier has a non-positive radius
    #[error("size tier {level} has non-positive radius {radius}")]
    InvalidRadius { level: usize, radius: f32 },

    /// Tiers must shrink as the size level increases
    #[error("size tier {level} radius {radius} is not smaller than the previous tier")]
    TierOrder { level: usize, radius: f32 },

    /// A numeric tunable is outside its usable range
    #[error("tunable `{name}` = {value} is out of range ({expected})")]
    OutOfRange {
        name: &'static str,
        value: f64,
        expected: &'static str,
    },

    /// No powerup kinds enabled
    #[error("at least one powerup kind must be enabled")]
    NoPowerupKinds,
}
