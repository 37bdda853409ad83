//! The motion planner.
//!
//! [`Planner`] owns the configuration, the block ring buffer, the axis
//! position register, and the junction memory, and exposes the operations
//! the G-code dispatcher drives: enqueue a segment, force the position,
//! query the queue, and run the axis-activity scan. None of them can fail;
//! anomalies are clamped or dropped per the planner's no-error policy.

mod activity;
mod lookahead;
mod segment;
mod trapezoid;

use crate::block::{Axis, NUM_AXIS};
use crate::config::{MmPerSec, PlannerConfig, MAX_EXTRUDERS};
use crate::io::MachineIo;
use crate::position::PositionRegister;
use crate::queue::{next_index, BlockQueue, QueueIter, StepperHandle};

/// Moves whose master-axis step count is at or below this threshold are
/// silently discarded.
pub const DROP_SEGMENTS: u32 = 5;

/// Speed floor in mm/s the planner decelerates to at the end of the plan.
pub const MIN_PLANNER_SPEED: f32 = 0.05;

/// Hardware floor in steps/s; slower rates would overflow the step timer.
pub const MIN_STEP_RATE: u32 = 120;

/// The look-ahead motion planner.
///
/// Generic over [`MachineIo`], the seam to the stepper engine, motor power
/// switches, fans, and the keep-alive collaborators that run during the
/// full-buffer wait.
pub struct Planner<IO: MachineIo> {
    config: PlannerConfig,
    queue: BlockQueue,
    position: PositionRegister,
    /// Per-axis speed vector of the last enqueued block, in mm/s.
    previous_speed: [f32; NUM_AXIS],
    /// Nominal speed of the last enqueued block, in mm/s.
    previous_nominal_speed: f32,
    /// Fan PWM target per extruder.
    fan_speed: [u8; MAX_EXTRUDERS],
    allow_cold_extrude: bool,
    io: IO,
}

impl<IO: MachineIo> Planner<IO> {
    /// Create a planner with the given configuration and machine interface.
    pub fn new(config: PlannerConfig, io: IO) -> Self {
        Self {
            config,
            queue: BlockQueue::new(),
            position: PositionRegister::new(),
            previous_speed: [0.0; NUM_AXIS],
            previous_nominal_speed: 0.0,
            fan_speed: [0; MAX_EXTRUDERS],
            allow_cold_extrude: false,
            io,
        }
    }

    /// Reset the planner: empty the queue, zero the position, and forget
    /// the junction memory.
    pub fn reset(&mut self) {
        self.queue.clear();
        self.position.reset();
        self.previous_speed = [0.0; NUM_AXIS];
        self.previous_nominal_speed = 0.0;
    }

    /// Enqueue one linear segment to the absolute target `(x, y, z, e)` in
    /// millimeters at the requested feed rate.
    ///
    /// Blocks (cooperatively) while the queue is full: each wait iteration
    /// calls [`MachineIo::on_buffer_full`] so heaters, inactivity timers,
    /// and the display keep running until the stepper frees a slot. This is
    /// the planner's only suspension point.
    ///
    /// Sub-threshold moves are dropped and over-limit speeds clamped; the
    /// call itself never fails.
    pub fn buffer_line(&mut self, x: f32, y: f32, z: f32, e: f32, feed_rate: MmPerSec, extruder: u8) {
        let next_head = next_index(self.queue.head());
        while self.queue.tail() == next_head {
            self.io.on_buffer_full(self.queue.stepper());
        }

        // Quantize with the new extruder's scale, then bring the position
        // register onto the same scale before taking deltas.
        let target = PositionRegister::quantize(&self.config, x, y, z, e, extruder);
        self.position.sync_extruder(&self.config, extruder);

        let input = segment::SegmentInput {
            target,
            feed_rate: feed_rate.0,
            extruder,
            fan_speed: self.fan_speed[(extruder as usize).min(MAX_EXTRUDERS - 1)],
            moves_queued: self.queue.depth(),
        };

        let head = self.queue.head();
        let outcome = {
            let Self {
                config,
                queue,
                position,
                previous_speed,
                previous_nominal_speed,
                ..
            } = self;
            segment::fill_block(
                queue.block_mut(head),
                config,
                &position.steps(),
                previous_speed,
                *previous_nominal_speed,
                &input,
            )
        };

        let Some(outcome) = outcome else {
            return;
        };

        for axis in Axis::ALL {
            if self.queue.block(head).steps[axis.index()] != 0 {
                self.io.axis_enable(axis);
            }
        }

        self.previous_speed = outcome.current_speed;
        self.previous_nominal_speed = outcome.nominal_speed;
        self.position.set_steps(target);

        self.queue.publish_head(next_head);
        lookahead::recalculate(&mut self.queue);

        self.io.wake_stepper();
    }

    /// Force the current position to `(x, y, z, e)` millimeters and reset
    /// the junction memory.
    ///
    /// The queue must be empty; draining it first is the caller's job.
    pub fn set_position(&mut self, x: f32, y: f32, z: f32, e: f32) {
        debug_assert!(self.queue.is_empty(), "position reset with moves queued");

        let extruder = self.position.last_extruder();
        self.position.set_from_mm(&self.config, x, y, z, e, extruder);
        self.io.sync_stepper_position(self.position.steps());

        // Junction speeds restart from rest.
        self.previous_speed = [0.0; NUM_AXIS];
        self.previous_nominal_speed = 0.0;
    }

    /// Force the current E position to `e` millimeters, leaving X/Y/Z and
    /// the junction memory untouched.
    pub fn set_e_position(&mut self, e: f32) {
        let extruder = self.position.last_extruder();
        self.position.set_e_from_mm(&self.config, e, extruder);
        self.io.sync_stepper_e_position(self.position.get(Axis::E));
    }

    /// Number of blocks currently queued.
    #[inline]
    pub fn moves_planned(&self) -> usize {
        self.queue.depth()
    }

    /// Scan the queue for idle axes and latch fan outputs.
    pub fn check_axes_activity(&mut self) {
        let Self {
            config,
            queue,
            fan_speed,
            io,
            ..
        } = self;
        activity::scan(queue, config, fan_speed, io);
    }

    /// Set the policy flag consulted by upstream cold-extrusion guards.
    pub fn allow_cold_extrudes(&mut self, allow: bool) {
        self.allow_cold_extrude = allow;
    }

    /// Whether cold extrusion is currently permitted.
    #[inline]
    pub fn cold_extrudes_allowed(&self) -> bool {
        self.allow_cold_extrude
    }

    /// Set the fan PWM target stamped into subsequent blocks for an
    /// extruder.
    pub fn set_fan_speed(&mut self, extruder: u8, pwm: u8) {
        self.fan_speed[(extruder as usize).min(MAX_EXTRUDERS - 1)] = pwm;
    }

    /// Consumer-side handle for the stepper engine.
    #[inline]
    pub fn stepper(&self) -> StepperHandle<'_> {
        self.queue.stepper()
    }

    /// Iterate the queued blocks, oldest first.
    pub fn queued_blocks(&self) -> QueueIter<'_> {
        self.queue.iter()
    }

    /// Current position in absolute steps.
    #[inline]
    pub fn position_steps(&self) -> [i32; NUM_AXIS] {
        self.position.steps()
    }

    /// The active configuration.
    #[inline]
    pub fn config(&self) -> &PlannerConfig {
        &self.config
    }

    /// Mutable access for runtime configuration commands.
    #[inline]
    pub fn config_mut(&mut self) -> &mut PlannerConfig {
        &mut self.config
    }

    /// The machine interface.
    #[inline]
    pub fn io(&self) -> &IO {
        &self.io
    }

    /// Mutable access to the machine interface.
    #[inline]
    pub fn io_mut(&mut self) -> &mut IO {
        &mut self.io
    }
}
