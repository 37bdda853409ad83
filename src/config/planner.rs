//! Root planner configuration.
//!
//! All fields are runtime-mutable: the G-code dispatcher rewrites them in
//! place when it handles configuration commands, and the planner reads the
//! current values on every enqueue.

use heapless::Vec;
use serde::Deserialize;

use crate::block::Axis;

use super::axis::{AxisConfig, ExtruderConfig};
use super::units::{MmPerSec, MmPerSecSq};

/// Maximum number of extruder drives the planner supports.
pub const MAX_EXTRUDERS: usize = 3;

/// Complete planner configuration.
#[derive(Debug, Clone, Deserialize)]
pub struct PlannerConfig {
    /// X axis limits.
    pub x: AxisConfig,

    /// Y axis limits.
    pub y: AxisConfig,

    /// Z axis limits.
    pub z: AxisConfig,

    /// Per-extruder limits; at least one entry.
    pub extruders: Vec<ExtruderConfig, MAX_EXTRUDERS>,

    /// Default acceleration for coordinated moves, in mm/s².
    #[serde(rename = "acceleration_mm_per_sec2")]
    pub acceleration: MmPerSecSq,

    /// Instantaneous XY velocity step allowed across a junction, in mm/s.
    #[serde(rename = "max_xy_jerk_mm_per_sec")]
    pub max_xy_jerk: MmPerSec,

    /// Instantaneous Z velocity step allowed across a junction, in mm/s.
    #[serde(rename = "max_z_jerk_mm_per_sec")]
    pub max_z_jerk: MmPerSec,

    /// Feed-rate floor for extruding moves, in mm/s.
    #[serde(default, rename = "minimum_feedrate_mm_per_sec")]
    pub minimum_feedrate: MmPerSec,

    /// Feed-rate floor for travel moves, in mm/s.
    #[serde(default, rename = "min_travel_feedrate_mm_per_sec")]
    pub min_travel_feedrate: MmPerSec,

    /// Minimum segment time in microseconds for the slowdown heuristic.
    #[serde(default = "default_min_segment_time_us")]
    pub min_segment_time_us: u32,

    /// Junction deviation in mm. An alternative cornering model; the
    /// jerk-based junction policy does not consume it.
    #[serde(default = "default_junction_deviation")]
    pub junction_deviation: f32,

    /// Extrusion flow multiplier in percent.
    #[serde(default = "default_extrude_multiplier")]
    pub extrude_multiplier: u16,

    /// Stretch printing segments when the queue is draining.
    #[serde(default = "default_slowdown")]
    pub slowdown: bool,

    /// Cut extruder power when no queued block moves E.
    #[serde(default)]
    pub disable_e_on_idle: bool,
}

fn default_min_segment_time_us() -> u32 {
    20_000
}

fn default_junction_deviation() -> f32 {
    0.02
}

fn default_extrude_multiplier() -> u16 {
    100
}

fn default_slowdown() -> bool {
    true
}

impl PlannerConfig {
    /// Get the limit table for a Cartesian axis.
    ///
    /// # Panics
    ///
    /// Panics if called with [`Axis::E`]; extruder limits live in
    /// [`PlannerConfig::extruder`].
    pub fn axis(&self, axis: Axis) -> &AxisConfig {
        match axis {
            Axis::X => &self.x,
            Axis::Y => &self.y,
            Axis::Z => &self.z,
            Axis::E => panic!("extruder limits are per-extruder"),
        }
    }

    /// Get the limit table for an extruder, falling back to extruder 0 for
    /// out-of-range indices.
    pub fn extruder(&self, index: u8) -> &ExtruderConfig {
        self.extruders
            .get(index as usize)
            .unwrap_or_else(|| &self.extruders[0])
    }

    /// Steps per millimeter for any axis, E resolved per extruder.
    #[inline]
    pub fn steps_per_mm(&self, axis: Axis, extruder: u8) -> f32 {
        match axis {
            Axis::E => self.extruder(extruder).steps_per_mm,
            _ => self.axis(axis).steps_per_mm,
        }
    }

    /// Maximum feed rate in mm/s for any axis, E resolved per extruder.
    #[inline]
    pub fn max_feedrate(&self, axis: Axis, extruder: u8) -> f32 {
        match axis {
            Axis::E => self.extruder(extruder).max_feedrate.0,
            _ => self.axis(axis).max_feedrate.0,
        }
    }

    /// Per-axis acceleration cap in steps/s², E resolved per extruder.
    #[inline]
    pub fn max_acceleration_steps(&self, axis: Axis, extruder: u8) -> f32 {
        match axis {
            Axis::E => self.extruder(extruder).max_acceleration_steps(),
            _ => self.axis(axis).max_acceleration_steps(),
        }
    }

    /// Number of configured extruders.
    #[inline]
    pub fn extruder_count(&self) -> usize {
        self.extruders.len()
    }
}

impl Default for PlannerConfig {
    fn default() -> Self {
        let xy = AxisConfig {
            steps_per_mm: 80.0,
            max_feedrate: MmPerSec(500.0),
            max_acceleration: MmPerSecSq(9000.0),
            disable_on_idle: false,
        };
        let z = AxisConfig {
            steps_per_mm: 400.0,
            max_feedrate: MmPerSec(5.0),
            max_acceleration: MmPerSecSq(100.0),
            disable_on_idle: false,
        };
        let e = ExtruderConfig {
            steps_per_mm: 100.0,
            max_feedrate: MmPerSec(45.0),
            max_acceleration: MmPerSecSq(10_000.0),
            retract_acceleration: MmPerSecSq(3000.0),
            max_jerk: MmPerSec(5.0),
        };
        let mut extruders = Vec::new();
        let _ = extruders.push(e);

        Self {
            x: xy.clone(),
            y: xy,
            z,
            extruders,
            acceleration: MmPerSecSq(3000.0),
            max_xy_jerk: MmPerSec(20.0),
            max_z_jerk: MmPerSec(0.4),
            minimum_feedrate: MmPerSec(0.0),
            min_travel_feedrate: MmPerSec(0.0),
            min_segment_time_us: default_min_segment_time_us(),
            junction_deviation: default_junction_deviation(),
            extrude_multiplier: default_extrude_multiplier(),
            slowdown: default_slowdown(),
            disable_e_on_idle: false,
        }
    }
}
