//! Error types for motion-planner.
//!
//! Only configuration parsing and validation are fallible. The planner
//! operations themselves never report errors: over-speed requests are
//! clamped, sub-threshold moves are dropped, and a full queue is
//! backpressure, not a failure.

use core::fmt;

/// Result type alias using the library's error type.
pub type Result<T> = core::result::Result<T, ConfigError>;

/// Configuration parsing and validation errors.
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    /// Failed to parse TOML configuration
    ParseError(heapless::String<128>),
    /// Invalid steps-per-millimeter value (must be > 0)
    InvalidStepsPerMm(f32),
    /// Invalid maximum feed rate (must be > 0)
    InvalidMaxFeedrate(f32),
    /// Invalid acceleration limit (must be > 0)
    InvalidAcceleration(f32),
    /// Invalid jerk limit (must be > 0)
    InvalidJerk(f32),
    /// Invalid extrude multiplier percentage (must be 1-999)
    InvalidExtrudeMultiplier(u16),
    /// Configuration declares no extruders
    NoExtruders,
    /// File I/O error (std only)
    #[cfg(feature = "std")]
    IoError(heapless::String<128>),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::ParseError(msg) => write!(f, "Parse error: {}", msg),
            ConfigError::InvalidStepsPerMm(v) => {
                write!(f, "Invalid steps per mm: {}. Must be > 0", v)
            }
            ConfigError::InvalidMaxFeedrate(v) => {
                write!(f, "Invalid max feed rate: {}. Must be > 0", v)
            }
            ConfigError::InvalidAcceleration(v) => {
                write!(f, "Invalid acceleration: {}. Must be > 0", v)
            }
            ConfigError::InvalidJerk(v) => write!(f, "Invalid jerk limit: {}. Must be > 0", v),
            ConfigError::InvalidExtrudeMultiplier(v) => {
                write!(f, "Invalid extrude multiplier: {}%. Must be 1-999", v)
            }
            ConfigError::NoExtruders => write!(f, "Configuration declares no extruders"),
            #[cfg(feature = "std")]
            ConfigError::IoError(msg) => write!(f, "I/O error: {}", msg),
        }
    }
}

#[cfg(feature = "std")]
impl std::error::Error for ConfigError {}
