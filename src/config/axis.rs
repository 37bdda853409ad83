//! Per-axis and per-extruder limit tables from TOML.

use serde::Deserialize;

use super::units::{MmPerSec, MmPerSecSq};

/// Kinematic limits for one Cartesian axis.
#[derive(Debug, Clone, Deserialize)]
pub struct AxisConfig {
    /// Steps per millimeter of axis travel.
    pub steps_per_mm: f32,

    /// Maximum feed rate in mm/s.
    #[serde(rename = "max_feedrate_mm_per_sec")]
    pub max_feedrate: MmPerSec,

    /// Maximum acceleration in mm/s².
    #[serde(rename = "max_acceleration_mm_per_sec2")]
    pub max_acceleration: MmPerSecSq,

    /// Cut motor power when no queued block moves this axis.
    #[serde(default)]
    pub disable_on_idle: bool,
}

impl AxisConfig {
    /// Acceleration limit converted to steps/s².
    #[inline]
    pub fn max_acceleration_steps(&self) -> f32 {
        self.max_acceleration.0 * self.steps_per_mm
    }
}

/// Kinematic limits for one extruder drive.
#[derive(Debug, Clone, Deserialize)]
pub struct ExtruderConfig {
    /// Steps per millimeter of filament.
    pub steps_per_mm: f32,

    /// Maximum feed rate in mm/s.
    #[serde(rename = "max_feedrate_mm_per_sec")]
    pub max_feedrate: MmPerSec,

    /// Maximum acceleration in mm/s² for coordinated moves.
    #[serde(rename = "max_acceleration_mm_per_sec2")]
    pub max_acceleration: MmPerSecSq,

    /// Acceleration in mm/s² for filament-only (retract/restore) moves.
    #[serde(rename = "retract_acceleration_mm_per_sec2")]
    pub retract_acceleration: MmPerSecSq,

    /// Instantaneous velocity step allowed across a junction, in mm/s.
    #[serde(rename = "max_jerk_mm_per_sec")]
    pub max_jerk: MmPerSec,
}

impl ExtruderConfig {
    /// Acceleration limit converted to steps/s².
    #[inline]
    pub fn max_acceleration_steps(&self) -> f32 {
        self.max_acceleration.0 * self.steps_per_mm
    }
}
