//! # motion-planner
//!
//! Look-ahead trapezoidal motion planner for fused-filament printer firmware.
//!
//! The planner converts a stream of linear tool-path commands (absolute
//! targets in millimeters plus a requested feed rate) into a bounded queue of
//! motion blocks, each carrying a fully-resolved trapezoidal step-rate
//! profile for an interrupt-driven stepper engine to execute.
//!
//! ## Features
//!
//! - **Look-ahead junction planning**: reverse and forward passes maximize
//!   junction speeds under one global acceleration and per-axis jerk limits
//! - **Trapezoid resolution**: entry/exit speeds become integer step counts
//!   for the accelerate, cruise, and decelerate phases, collapsing to a
//!   triangle when no plateau fits
//! - **SPSC block queue**: power-of-two ring shared with the stepper engine;
//!   in-flight blocks stay re-plannable until the instant execution begins
//! - **Configuration-driven**: per-axis and per-extruder limits from TOML
//!   files (with `std`) or pre-built configuration structs
//! - **no_std compatible**: the planner core works without the standard
//!   library
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use motion_planner::{MachineIo, MmPerSec, Planner, PlannerConfig};
//!
//! let config: PlannerConfig = motion_planner::load_config("planner.toml")?;
//! let mut planner = Planner::new(config, io);
//!
//! // Enqueue one segment: 10 mm in X at 50 mm/s on extruder 0.
//! planner.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
//!
//! // The stepper engine pops blocks through the consumer handle.
//! if let Some(block) = planner.stepper().current_block() {
//!     // generate pulses from the resolved step-rate profile
//! }
//! ```
//!
//! ## Feature Flags
//!
//! - `std` (default): Enables TOML file loading and `std::error::Error`
//! - `defmt`: Enables defmt formatting for embedded targets

#![cfg_attr(not(feature = "std"), no_std)]
#![warn(missing_docs)]
#![warn(clippy::all)]
#![deny(unsafe_code)]

// Core modules
pub mod block;
pub mod config;
pub mod error;
pub mod io;
pub mod planner;
pub mod position;
pub mod queue;

// Re-exports for ergonomic API
pub use block::{Axis, AxisMask, Block, NUM_AXIS};
pub use config::{validate_config, AxisConfig, ExtruderConfig, PlannerConfig, MAX_EXTRUDERS};
pub use error::{ConfigError, Result};
pub use io::{EnablePin, MachineIo};
pub use planner::{Planner, DROP_SEGMENTS, MIN_PLANNER_SPEED, MIN_STEP_RATE};
pub use position::PositionRegister;
pub use queue::{BlockQueue, StepperHandle, BLOCK_BUFFER_SIZE};

// Configuration loading (std only)
#[cfg(feature = "std")]
pub use config::load_config;

// Unit types
pub use config::units::{MmPerSec, MmPerSecSq};
