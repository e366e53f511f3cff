//! # Simulation Error Types
//!
//! Errors are only raised at I/O and data-validation boundaries. Running
//! out of pool slots or asking for a missing component is not an error;
//! those paths return `None`.

use thiserror::Error;

/// Errors that can occur while configuring the simulation or loading a level.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum SluiceError {
    /// The configuration file could not be read.
    #[error("cannot read config {path}: {reason}")]
    ConfigRead {
        /// Path that was read.
        path: String,
        /// OS error message.
        reason: String,
    },

    /// The configuration file is not valid TOML for [`SimConfig`](crate::SimConfig).
    #[error("cannot parse config: {0}")]
    ConfigParse(String),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),

    /// The level has more tiles than the grid supports.
    #[error("level {width}x{height} exceeds {max_tiles} tiles")]
    LevelTooLarge {
        /// Width in tiles.
        width: u32,
        /// Height in tiles.
        height: u32,
        /// Tile limit.
        max_tiles: u32,
    },

    /// The tile array does not match the declared dimensions.
    #[error("level data has {actual} tiles, expected {expected}")]
    LevelDataMismatch {
        /// `width * height`.
        expected: usize,
        /// Tiles provided.
        actual: usize,
    },

    /// No level with that number is known.
    #[error("level not found: {0}")]
    LevelNotFound(u32),
}

/// Result type for simulation setup operations.
pub type SluiceResult<T> = Result<T, SluiceError>;
