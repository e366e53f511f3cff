//! # Simulation Configuration
//!
//! Loaded once at startup from TOML. Every section and field is optional;
//! missing values fall back to the stock constants.
//!
//! ```toml
//! [physics]
//! gravity = 1400.0
//!
//! [pools]
//! component_capacity = 512
//! ```

use std::path::Path;

use serde::Deserialize;
use sluice_core::PoolConfig;
use sluice_shared::constants::{
    ANIM_FRAME_RATE, COYOTE_TICKS, DELTA_T, GRAV_ACCEL, GROUND_X_FRICTION, GROUND_Y_FRICTION,
    LADDER_CLIMB_SPEED, LADDER_STRAFE_SPEED, MAX_COMP_POOL_SIZE, MAX_DELTA_T, MAX_ENTITIES,
    MAX_PLAYER_COMP_POOL_SIZE, MOVE_ACCEL, PLAYER_JUMP_SPEED, PLAYER_MAX_SPEED,
    RUNNER_MOVEMENT_DELAY, RUNNER_MOVEMENT_SPEED, UPTHRUST_RATIO, VELOCITY_EPSILON,
    WATER_FILL_RATE, WATER_FRICTION,
};

use crate::error::{SluiceError, SluiceResult};

/// Forces and limits shared by every body.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PhysicsConfig {
    /// Downward acceleration in px/s^2.
    pub gravity: f32,
    /// Buoyancy as a multiple of gravity.
    pub upthrust_ratio: f32,
    /// Speed cap in px/s.
    pub max_speed: f32,
    /// Friction coefficient in water.
    pub water_friction: f32,
    /// Horizontal friction coefficient out of water.
    pub ground_x_friction: f32,
    /// Vertical friction coefficient out of water.
    pub ground_y_friction: f32,
    /// Velocity components below this are flushed to zero.
    pub velocity_epsilon: f32,
}

impl Default for PhysicsConfig {
    fn default() -> Self {
        Self {
            gravity: GRAV_ACCEL,
            upthrust_ratio: UPTHRUST_RATIO,
            max_speed: PLAYER_MAX_SPEED,
            water_friction: WATER_FRICTION,
            ground_x_friction: GROUND_X_FRICTION,
            ground_y_friction: GROUND_Y_FRICTION,
            velocity_epsilon: VELOCITY_EPSILON,
        }
    }
}

/// Player controls.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct PlayerConfig {
    /// Movement acceleration in px/s^2.
    pub move_accel: f32,
    /// Take-off speed in px/s.
    pub jump_speed: f32,
    /// Climbing speed on ladders.
    pub ladder_climb_speed: f32,
    /// Sideways speed on ladders.
    pub ladder_strafe_speed: f32,
    /// Ticks after leaving a ledge in which jumping is still allowed.
    pub coyote_ticks: u8,
}

impl Default for PlayerConfig {
    fn default() -> Self {
        Self {
            move_accel: MOVE_ACCEL,
            jump_speed: PLAYER_JUMP_SPEED,
            ladder_climb_speed: LADDER_CLIMB_SPEED,
            ladder_strafe_speed: LADDER_STRAFE_SPEED,
            coyote_ticks: COYOTE_TICKS,
        }
    }
}

/// Pool capacities.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct PoolsConfig {
    /// Entity records.
    pub entity_capacity: usize,
    /// Slots per component pool.
    pub component_capacity: usize,
    /// Slots for player-only components.
    pub player_capacity: usize,
}

impl Default for PoolsConfig {
    fn default() -> Self {
        Self {
            entity_capacity: MAX_ENTITIES,
            component_capacity: MAX_COMP_POOL_SIZE,
            player_capacity: MAX_PLAYER_COMP_POOL_SIZE,
        }
    }
}

impl From<PoolsConfig> for PoolConfig {
    fn from(cfg: PoolsConfig) -> Self {
        Self {
            entity_capacity: cfg.entity_capacity,
            component_capacity: cfg.component_capacity,
            player_capacity: cfg.player_capacity,
        }
    }
}

/// Frame timing.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct FrameConfig {
    /// Step used by fixed-tick drivers such as the headless binary.
    pub fixed_dt: f32,
    /// Largest real delta handed to the simulation.
    pub max_delta: f32,
    /// Sprite animation ticks per second.
    pub anim_frame_rate: f32,
    /// Frames slower than this many milliseconds are logged.
    pub slow_frame_ms: f32,
}

impl Default for FrameConfig {
    fn default() -> Self {
        Self {
            fixed_dt: DELTA_T,
            max_delta: MAX_DELTA_T,
            anim_frame_rate: ANIM_FRAME_RATE,
            slow_frame_ms: 33.0,
        }
    }
}

/// Water runner tuning.
#[derive(Clone, Copy, Debug, PartialEq, Deserialize)]
#[serde(default)]
pub struct WaterConfig {
    /// Water units poured per second.
    pub fill_rate: f32,
    /// Frames between path steps.
    pub movement_delay: u8,
    /// Tiles per path step.
    pub movement_speed: u8,
}

impl Default for WaterConfig {
    fn default() -> Self {
        Self {
            fill_rate: WATER_FILL_RATE,
            movement_delay: RUNNER_MOVEMENT_DELAY,
            movement_speed: RUNNER_MOVEMENT_SPEED,
        }
    }
}

/// Complete runtime configuration.
#[derive(Clone, Copy, Debug, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct SimConfig {
    /// Physics tuning.
    pub physics: PhysicsConfig,
    /// Player controls.
    pub player: PlayerConfig,
    /// Pool capacities.
    pub pools: PoolsConfig,
    /// Frame timing.
    pub frame: FrameConfig,
    /// Water runners.
    pub water: WaterConfig,
}

impl SimConfig {
    /// Parses and validates a TOML document.
    ///
    /// # Errors
    ///
    /// Returns [`SluiceError::ConfigParse`] for malformed TOML and
    /// [`SluiceError::InvalidConfig`] for out-of-range values.
    pub fn from_toml_str(text: &str) -> SluiceResult<Self> {
        let config: Self =
            toml::from_str(text).map_err(|e| SluiceError::ConfigParse(e.to_string()))?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a TOML file.
    ///
    /// # Errors
    ///
    /// Returns [`SluiceError::ConfigRead`] if the file cannot be read, and
    /// the errors of [`from_toml_str`](Self::from_toml_str) otherwise.
    pub fn from_toml_file(path: impl AsRef<Path>) -> SluiceResult<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|e| SluiceError::ConfigRead {
            path: path.display().to_string(),
            reason: e.to_string(),
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns [`SluiceError::InvalidConfig`] naming the first bad field.
    pub fn validate(&self) -> SluiceResult<()> {
        let pools = &self.pools;
        if pools.entity_capacity == 0 || pools.component_capacity == 0 || pools.player_capacity == 0
        {
            return Err(SluiceError::InvalidConfig(
                "pool capacities must be greater than zero".into(),
            ));
        }
        if pools.entity_capacity > u32::MAX as usize || pools.component_capacity > u32::MAX as usize
        {
            return Err(SluiceError::InvalidConfig(
                "pool capacities must fit in 32 bits".into(),
            ));
        }
        if !(self.frame.max_delta > 0.0) {
            return Err(SluiceError::InvalidConfig(
                "frame.max_delta must be positive".into(),
            ));
        }
        if !(self.frame.fixed_dt > 0.0) {
            return Err(SluiceError::InvalidConfig(
                "frame.fixed_dt must be positive".into(),
            ));
        }
        if !(self.frame.anim_frame_rate > 0.0) {
            return Err(SluiceError::InvalidConfig(
                "frame.anim_frame_rate must be positive".into(),
            ));
        }
        if self.water.movement_delay == 0 {
            return Err(SluiceError::InvalidConfig(
                "water.movement_delay must be at least 1".into(),
            ));
        }
        Ok(())
    }

    /// Pool capacities for the entity manager.
    #[must_use]
    pub fn pool_config(&self) -> PoolConfig {
        self.pools.into()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_document_is_stock() {
        let config = SimConfig::from_toml_str("").unwrap();
        assert_eq!(config, SimConfig::default());
        assert_eq!(config.physics.gravity, GRAV_ACCEL);
        assert_eq!(config.pool_config(), PoolConfig::default());
    }

    #[test]
    fn test_partial_section_keeps_other_defaults() {
        let config = SimConfig::from_toml_str(
            "[physics]\ngravity = 1400.0\n\n[pools]\ncomponent_capacity = 64\n",
        )
        .unwrap();
        assert_eq!(config.physics.gravity, 1400.0);
        assert_eq!(config.physics.max_speed, PLAYER_MAX_SPEED);
        assert_eq!(config.pools.component_capacity, 64);
        assert_eq!(config.pools.entity_capacity, MAX_ENTITIES);
    }

    #[test]
    fn test_zero_capacity_rejected() {
        let err = SimConfig::from_toml_str("[pools]\nplayer_capacity = 0\n").unwrap_err();
        assert!(matches!(err, SluiceError::InvalidConfig(_)));
    }

    #[test]
    fn test_non_positive_delta_rejected() {
        let err = SimConfig::from_toml_str("[frame]\nmax_delta = 0.0\n").unwrap_err();
        assert!(matches!(err, SluiceError::InvalidConfig(_)));
    }

    #[test]
    fn test_malformed_toml_is_parse_error() {
        let err = SimConfig::from_toml_str("[physics\n").unwrap_err();
        assert!(matches!(err, SluiceError::ConfigParse(_)));
    }

    #[test]
    fn test_missing_file_is_read_error() {
        let err = SimConfig::from_toml_file("/nonexistent/sluice.toml").unwrap_err();
        assert!(matches!(err, SluiceError::ConfigRead { .. }));
    }
}
