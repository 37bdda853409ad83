//! Configuration module for motion-planner.
//!
//! Provides types for loading and validating axis, extruder, and planner
//! limits from TOML files (with `std` feature) or pre-parsed data.

mod axis;
#[cfg(feature = "std")]
mod loader;
mod planner;
pub mod units;
mod validation;

pub use axis::{AxisConfig, ExtruderConfig};
pub use planner::{PlannerConfig, MAX_EXTRUDERS};
pub use validation::validate_config;

#[cfg(feature = "std")]
pub use loader::{load_config, parse_config};

// Re-export unit types at config level
pub use units::{MmPerSec, MmPerSecSq};
