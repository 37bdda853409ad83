//! Motion block and axis vocabulary.
//!
//! A [`Block`] is one straight-line motion segment with a resolved step-rate
//! profile. Blocks live in the ring buffer and are consumed in order by the
//! stepper engine.

use core::sync::atomic::{AtomicBool, Ordering};

/// Number of motion axes (X, Y, Z plus the active extruder).
pub const NUM_AXIS: usize = 4;

/// A motion axis.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub enum Axis {
    /// X carriage.
    X,
    /// Y carriage.
    Y,
    /// Z carriage.
    Z,
    /// Extruder drive.
    E,
}

impl Axis {
    /// All axes in index order.
    pub const ALL: [Axis; NUM_AXIS] = [Axis::X, Axis::Y, Axis::Z, Axis::E];

    /// Array index of this axis.
    #[inline]
    pub const fn index(self) -> usize {
        self as usize
    }
}

/// A set of axes packed into one byte, one bit per axis.
///
/// Used for a block's direction bits: a set bit means the signed
/// displacement on that axis is negative.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[cfg_attr(feature = "defmt", derive(defmt::Format))]
pub struct AxisMask(u8);

impl AxisMask {
    /// The empty set.
    pub const EMPTY: Self = Self(0);

    /// Add an axis to the set.
    #[inline]
    pub fn insert(&mut self, axis: Axis) {
        self.0 |= 1 << axis.index();
    }

    /// Check whether an axis is in the set.
    #[inline]
    pub const fn contains(self, axis: Axis) -> bool {
        self.0 & (1 << axis.index()) != 0
    }

    /// Raw bit representation.
    #[inline]
    pub const fn bits(self) -> u8 {
        self.0
    }

    /// Check whether the set is empty.
    #[inline]
    pub const fn is_empty(self) -> bool {
        self.0 == 0
    }
}

/// One straight-line motion segment with a resolved trapezoid profile.
///
/// Fields fall into three groups: geometry fixed at insertion (step counts,
/// direction bits, distance), the speed plan the look-ahead keeps rewriting
/// (`entry_speed`, `max_entry_speed`), and the resolved profile the stepper
/// engine executes (`initial_rate` through `decelerate_after`). Once the
/// stepper sets [`Block::busy`], the profile fields are frozen.
#[derive(Debug)]
pub struct Block {
    /// Absolute step counts per axis.
    pub steps: [u32; NUM_AXIS],

    /// Step count of the master axis (the largest of `steps`); drives the
    /// Bresenham step-event counter.
    pub step_event_count: u32,

    /// Bit set per axis whose displacement is negative.
    pub direction_bits: AxisMask,

    /// Extruder selected when the block was built.
    pub active_extruder: u8,

    /// Fan PWM captured at insertion time.
    pub fan_speed: u8,

    /// No extrusion in this block.
    pub travel: bool,

    /// Filament-only move pulling filament back.
    pub retract: bool,

    /// Filament-only move pushing filament forward.
    pub restore: bool,

    /// The block can decelerate from nominal speed to zero within its own
    /// length; look-ahead skips speed-reduction checks on such blocks.
    pub nominal_length: bool,

    /// Entry or exit speed changed; the trapezoid needs recomputation.
    pub recalculate: bool,

    /// Segment length in mm (|ΔE| for filament-only moves).
    pub millimeters: f32,

    /// Block acceleration in mm/s².
    pub acceleration: f32,

    /// Block acceleration in steps/s² on the master axis.
    pub acceleration_st: u32,

    /// Target cruise speed in mm/s.
    pub nominal_speed: f32,

    /// Planned junction speed entering this block, in mm/s.
    pub entry_speed: f32,

    /// Upper bound on the entry speed from the jerk analysis, in mm/s.
    pub max_entry_speed: f32,

    /// Target cruise rate in steps/s.
    pub nominal_rate: u32,

    /// Step rate entering the block, in steps/s.
    pub initial_rate: u32,

    /// Step rate leaving the block, in steps/s.
    pub final_rate: u32,

    /// Step index where acceleration ends.
    pub accelerate_until: u32,

    /// Step index where deceleration begins.
    pub decelerate_after: u32,

    /// Set by the stepper when it claims the block; from then on the
    /// planner leaves the profile fields untouched.
    pub busy: AtomicBool,
}

impl Block {
    /// Create an empty block.
    pub fn new() -> Self {
        Self {
            steps: [0; NUM_AXIS],
            step_event_count: 0,
            direction_bits: AxisMask::EMPTY,
            active_extruder: 0,
            fan_speed: 0,
            travel: false,
            retract: false,
            restore: false,
            nominal_length: false,
            recalculate: false,
            millimeters: 0.0,
            acceleration: 0.0,
            acceleration_st: 0,
            nominal_speed: 0.0,
            entry_speed: 0.0,
            max_entry_speed: 0.0,
            nominal_rate: 0,
            initial_rate: 0,
            final_rate: 0,
            accelerate_until: 0,
            decelerate_after: 0,
            busy: AtomicBool::new(false),
        }
    }

    /// Whether the stepper has claimed this block.
    #[inline]
    pub fn is_busy(&self) -> bool {
        self.busy.load(Ordering::Acquire)
    }

    /// Direction sign for an axis: -1 for negative travel, +1 otherwise.
    #[inline]
    pub fn direction(&self, axis: Axis) -> i32 {
        if self.direction_bits.contains(axis) {
            -1
        } else {
            1
        }
    }
}

impl Default for Block {
    fn default() -> Self {
        Self::new()
    }
}
