//! Configuration validation.

use crate::error::{ConfigError, Result};

use super::axis::{AxisConfig, ExtruderConfig};
use super::PlannerConfig;

/// Validate a planner configuration.
///
/// Checks:
/// - At least one extruder is declared
/// - All steps-per-mm, feed, acceleration, and jerk values are positive
/// - The extrude multiplier is a sane percentage
pub fn validate_config(config: &PlannerConfig) -> Result<()> {
    validate_axis(&config.x)?;
    validate_axis(&config.y)?;
    validate_axis(&config.z)?;

    if config.extruders.is_empty() {
        return Err(ConfigError::NoExtruders);
    }
    for extruder in config.extruders.iter() {
        validate_extruder(extruder)?;
    }

    if config.acceleration.0 <= 0.0 {
        return Err(ConfigError::InvalidAcceleration(config.acceleration.0));
    }
    if config.max_xy_jerk.0 <= 0.0 {
        return Err(ConfigError::InvalidJerk(config.max_xy_jerk.0));
    }
    if config.max_z_jerk.0 <= 0.0 {
        return Err(ConfigError::InvalidJerk(config.max_z_jerk.0));
    }
    if config.extrude_multiplier == 0 || config.extrude_multiplier > 999 {
        return Err(ConfigError::InvalidExtrudeMultiplier(
            config.extrude_multiplier,
        ));
    }

    Ok(())
}

fn validate_axis(axis: &AxisConfig) -> Result<()> {
    if axis.steps_per_mm <= 0.0 {
        return Err(ConfigError::InvalidStepsPerMm(axis.steps_per_mm));
    }
    if axis.max_feedrate.0 <= 0.0 {
        return Err(ConfigError::InvalidMaxFeedrate(axis.max_feedrate.0));
    }
    if axis.max_acceleration.0 <= 0.0 {
        return Err(ConfigError::InvalidAcceleration(axis.max_acceleration.0));
    }
    Ok(())
}

fn validate_extruder(extruder: &ExtruderConfig) -> Result<()> {
    if extruder.steps_per_mm <= 0.0 {
        return Err(ConfigError::InvalidStepsPerMm(extruder.steps_per_mm));
    }
    if extruder.max_feedrate.0 <= 0.0 {
        return Err(ConfigError::InvalidMaxFeedrate(extruder.max_feedrate.0));
    }
    if extruder.max_acceleration.0 <= 0.0 {
        return Err(ConfigError::InvalidAcceleration(
            extruder.max_acceleration.0,
        ));
    }
    if extruder.retract_acceleration.0 <= 0.0 {
        return Err(ConfigError::InvalidAcceleration(
            extruder.retract_acceleration.0,
        ));
    }
    if extruder.max_jerk.0 <= 0.0 {
        return Err(ConfigError::InvalidJerk(extruder.max_jerk.0));
    }
    Ok(())
}
