//! Axis position register.
//!
//! Tracks the current tool position in absolute steps for X/Y/Z/E. The block
//! builder advances it after each successful insertion; position-reset calls
//! overwrite it directly.

use libm::roundf;

use crate::block::{Axis, NUM_AXIS};
use crate::config::PlannerConfig;

/// Current tool position in absolute steps, plus the extruder the E
/// coordinate is scaled for.
#[derive(Debug, Clone, Copy, Default)]
pub struct PositionRegister {
    steps: [i32; NUM_AXIS],
    last_extruder: u8,
}

impl PositionRegister {
    /// Create a register at the origin.
    #[inline]
    pub fn new() -> Self {
        Self::default()
    }

    /// Current position in steps.
    #[inline]
    pub fn steps(&self) -> [i32; NUM_AXIS] {
        self.steps
    }

    /// Current position of one axis in steps.
    #[inline]
    pub fn get(&self, axis: Axis) -> i32 {
        self.steps[axis.index()]
    }

    /// Extruder index the E coordinate is currently scaled for.
    #[inline]
    pub fn last_extruder(&self) -> u8 {
        self.last_extruder
    }

    /// Quantize a millimeter target to absolute steps using the active
    /// extruder's steps-per-mm for E.
    pub fn quantize(
        config: &PlannerConfig,
        x: f32,
        y: f32,
        z: f32,
        e: f32,
        extruder: u8,
    ) -> [i32; NUM_AXIS] {
        [
            roundf(x * config.steps_per_mm(Axis::X, extruder)) as i32,
            roundf(y * config.steps_per_mm(Axis::Y, extruder)) as i32,
            roundf(z * config.steps_per_mm(Axis::Z, extruder)) as i32,
            roundf(e * config.steps_per_mm(Axis::E, extruder)) as i32,
        ]
    }

    /// Force the position from millimeter coordinates.
    pub fn set_from_mm(
        &mut self,
        config: &PlannerConfig,
        x: f32,
        y: f32,
        z: f32,
        e: f32,
        extruder: u8,
    ) {
        self.steps = Self::quantize(config, x, y, z, e, extruder);
        self.last_extruder = extruder;
    }

    /// Force the E position from a millimeter coordinate, leaving X/Y/Z
    /// untouched.
    pub fn set_e_from_mm(&mut self, config: &PlannerConfig, e: f32, extruder: u8) {
        self.steps[Axis::E.index()] =
            roundf(e * config.steps_per_mm(Axis::E, extruder)) as i32;
        self.last_extruder = extruder;
    }

    /// Overwrite the raw step position.
    #[inline]
    pub fn set_steps(&mut self, steps: [i32; NUM_AXIS]) {
        self.steps = steps;
    }

    /// Switch the register to a new active extruder, rescaling the E
    /// coordinate when the steps-per-mm differ so the physical filament
    /// position is preserved.
    pub fn sync_extruder(&mut self, config: &PlannerConfig, extruder: u8) {
        if self.last_extruder != extruder {
            let old = config.steps_per_mm(Axis::E, self.last_extruder);
            let new = config.steps_per_mm(Axis::E, extruder);
            if old != new {
                let factor = new / old;
                let e = Axis::E.index();
                self.steps[e] = roundf(self.steps[e] as f32 * factor) as i32;
            }
            self.last_extruder = extruder;
        }
    }

    /// Reset to the origin.
    pub fn reset(&mut self) {
        self.steps = [0; NUM_AXIS];
    }
}
