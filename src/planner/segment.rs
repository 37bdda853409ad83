//! Block builder.
//!
//! Converts one line command into a prepared block: step deltas, direction
//! bits, move classification, nominal speed with per-axis clamping, the
//! acceleration cap, the jerk-based junction speed, and the initial
//! trapezoid. The caller owns the surrounding queue bookkeeping.

use libm::{ceilf, fabsf, roundf, sqrtf};

use crate::block::{Axis, AxisMask, Block, NUM_AXIS};
use crate::config::PlannerConfig;
use crate::queue::BLOCK_BUFFER_SIZE;

use super::trapezoid;
use super::{DROP_SEGMENTS, MIN_PLANNER_SPEED};

/// One line command, quantized and annotated with queue state.
pub(crate) struct SegmentInput {
    /// Target position in absolute steps.
    pub target: [i32; NUM_AXIS],
    /// Requested feed rate in mm/s.
    pub feed_rate: f32,
    /// Active extruder index.
    pub extruder: u8,
    /// Fan PWM to stamp into the block.
    pub fan_speed: u8,
    /// Queue depth before this insertion.
    pub moves_queued: usize,
}

/// Junction memory produced by a successful insertion.
pub(crate) struct SegmentOutcome {
    /// Per-axis speed vector of this move, in mm/s.
    pub current_speed: [f32; NUM_AXIS],
    /// Clamped nominal speed of this move, in mm/s.
    pub nominal_speed: f32,
}

/// Prepare `block` for the move from `position` to `input.target`.
///
/// Returns `None` (leaving the block unpublished) when the move is shorter
/// than the drop threshold on its master axis.
pub(crate) fn fill_block(
    block: &mut Block,
    config: &PlannerConfig,
    position: &[i32; NUM_AXIS],
    previous_speed: &[f32; NUM_AXIS],
    previous_nominal_speed: f32,
    input: &SegmentInput,
) -> Option<SegmentOutcome> {
    use core::sync::atomic::Ordering;

    block.busy.store(false, Ordering::Release);

    let xi = Axis::X.index();
    let yi = Axis::Y.index();
    let zi = Axis::Z.index();
    let ei = Axis::E.index();

    let mut delta = [0i32; NUM_AXIS];
    for (d, (target, current)) in delta
        .iter_mut()
        .zip(input.target.iter().zip(position.iter()))
    {
        *d = target - current;
    }

    block.steps[xi] = delta[xi].unsigned_abs();
    block.steps[yi] = delta[yi].unsigned_abs();
    block.steps[zi] = delta[zi].unsigned_abs();
    block.steps[ei] =
        (delta[ei].unsigned_abs() as u64 * config.extrude_multiplier as u64 / 100) as u32;
    block.step_event_count = block.steps.iter().copied().max().unwrap_or(0);

    // Sub-threshold move: not worth a block.
    if block.step_event_count <= DROP_SEGMENTS {
        return None;
    }

    block.fan_speed = input.fan_speed;
    block.active_extruder = input.extruder;

    block.direction_bits = AxisMask::EMPTY;
    for axis in Axis::ALL {
        if delta[axis.index()] < 0 {
            block.direction_bits.insert(axis);
        }
    }

    let extruder_cfg = config.extruder(input.extruder);

    // Feed-rate floor, travel moves and extruding moves separately.
    block.travel = block.steps[ei] == 0;
    let mut feed_rate = if block.travel {
        input.feed_rate.max(config.min_travel_feedrate.0)
    } else {
        input.feed_rate.max(config.minimum_feedrate.0)
    };
    feed_rate = feed_rate.max(MIN_PLANNER_SPEED);

    let mut delta_mm = [0.0f32; NUM_AXIS];
    delta_mm[xi] = delta[xi] as f32 / config.x.steps_per_mm;
    delta_mm[yi] = delta[yi] as f32 / config.y.steps_per_mm;
    delta_mm[zi] = delta[zi] as f32 / config.z.steps_per_mm;
    delta_mm[ei] = (delta[ei] as f32 / extruder_cfg.steps_per_mm) * config.extrude_multiplier as f32
        / 100.0;

    // Classify: a move whose XYZ content is below the drop threshold is a
    // filament-only move measured by |ΔE|.
    block.retract = false;
    block.restore = false;
    let no_move = block.steps[xi] <= DROP_SEGMENTS
        && block.steps[yi] <= DROP_SEGMENTS
        && block.steps[zi] <= DROP_SEGMENTS;
    if no_move {
        block.millimeters = fabsf(delta_mm[ei]);
        if block.steps[ei] != 0 {
            if block.direction_bits.contains(Axis::E) {
                block.retract = true;
            } else {
                block.restore = true;
            }
        }
    } else {
        block.millimeters = sqrtf(
            delta_mm[xi] * delta_mm[xi] + delta_mm[yi] * delta_mm[yi] + delta_mm[zi] * delta_mm[zi],
        );
    }

    let mut inverse_second = feed_rate / block.millimeters;

    // Slowdown: when the queue is draining and the segment is shorter than
    // the minimum segment time, stretch it so the pipe stays full. Applies
    // to printing moves only.
    if config.slowdown
        && delta_mm[ei] != 0.0
        && delta_mm[zi] == 0.0
        && (delta_mm[xi] != 0.0 || delta_mm[yi] != 0.0)
        && input.moves_queued > 1
        && input.moves_queued < BLOCK_BUFFER_SIZE / 2
    {
        let segment_time = roundf(1_000_000.0 / inverse_second);
        let min_segment_time = config.min_segment_time_us as f32;
        if segment_time < min_segment_time {
            let padding =
                roundf(2.0 * (min_segment_time - segment_time) / input.moves_queued as f32);
            inverse_second = 1_000_000.0 / (segment_time + padding);
        }
    }

    block.nominal_speed = block.millimeters * inverse_second;
    let mut nominal_rate = ceilf(block.step_event_count as f32 * inverse_second);

    // Vector speed limit: find the factor that keeps every axis at or below
    // its configured maximum.
    let mut current_speed = [0.0f32; NUM_AXIS];
    let mut speed_factor = 1.0f32;
    for axis in [Axis::X, Axis::Y, Axis::Z] {
        let i = axis.index();
        current_speed[i] = delta_mm[i] * inverse_second;
        let limit = config.axis(axis).max_feedrate.0;
        if fabsf(current_speed[i]) > limit {
            speed_factor = speed_factor.min(limit / fabsf(current_speed[i]));
        }
    }
    current_speed[ei] = delta_mm[ei] * inverse_second;
    if fabsf(current_speed[ei]) > extruder_cfg.max_feedrate.0 {
        speed_factor = speed_factor.min(extruder_cfg.max_feedrate.0 / fabsf(current_speed[ei]));
    }

    if speed_factor < 1.0 {
        for speed in current_speed.iter_mut() {
            *speed *= speed_factor;
        }
        block.nominal_speed *= speed_factor;
        nominal_rate *= speed_factor;
    }
    block.nominal_rate = nominal_rate as u32;

    // One acceleration scalar for the whole block, in steps/s² on the
    // master axis, clamped so no individual axis exceeds its cap.
    let steps_per_mm = block.step_event_count as f32 / block.millimeters;
    let acceleration_st = if no_move {
        ceilf(extruder_cfg.retract_acceleration.0 * steps_per_mm)
    } else {
        let mut accel = ceilf(config.acceleration.0 * steps_per_mm);
        for axis in Axis::ALL {
            let i = axis.index();
            let cap = config.max_acceleration_steps(axis, input.extruder);
            if accel * block.steps[i] as f32 / block.step_event_count as f32 > cap {
                accel = cap;
            }
        }
        accel
    };
    block.acceleration_st = acceleration_st as u32;
    block.acceleration = acceleration_st / steps_per_mm;

    // Junction speed from the jerk analysis. The safe floor doubles as the
    // exit speed for the initial trapezoid; the next enqueue widens it.
    let e_jerk = extruder_cfg.max_jerk.0;
    let vmax_junction;
    let safe_speed;
    if no_move {
        let v = e_jerk.min(block.nominal_speed);
        vmax_junction = v;
        safe_speed = v;
    } else {
        let max_xy_jerk = config.max_xy_jerk.0;
        let max_z_jerk = config.max_z_jerk.0;

        let mut junction = max_xy_jerk / 2.0;
        if fabsf(current_speed[zi]) > max_z_jerk / 2.0 {
            junction = junction.min(max_z_jerk / 2.0);
        }
        if fabsf(current_speed[ei]) > e_jerk / 2.0 {
            junction = junction.min(e_jerk / 2.0);
        }
        junction = junction.min(block.nominal_speed);
        safe_speed = junction;

        if input.moves_queued >= 1 && previous_nominal_speed > 0.0001 {
            let dvx = current_speed[xi] - previous_speed[xi];
            let dvy = current_speed[yi] - previous_speed[yi];
            let xy_jerk = sqrtf(dvx * dvx + dvy * dvy);
            let mut junction_factor = 1.0f32;

            junction = block.nominal_speed;
            if xy_jerk > max_xy_jerk {
                junction_factor = max_xy_jerk / xy_jerk;
            }
            let dvz = fabsf(current_speed[zi] - previous_speed[zi]);
            if dvz > max_z_jerk {
                junction_factor = junction_factor.min(max_z_jerk / dvz);
            }
            let dve = fabsf(current_speed[ei] - previous_speed[ei]);
            if dve > e_jerk {
                junction_factor = junction_factor.min(e_jerk / dve);
            }
            junction = previous_nominal_speed.min(junction * junction_factor);
        }
        vmax_junction = junction;
    }
    block.max_entry_speed = vmax_junction;

    // Highest entry speed that still allows decelerating to the minimum
    // planner speed within this block.
    let v_allowable = trapezoid::max_allowable_speed(
        -block.acceleration,
        MIN_PLANNER_SPEED,
        block.millimeters,
    );
    block.entry_speed = vmax_junction.min(v_allowable);
    block.nominal_length = block.nominal_speed <= v_allowable;
    block.recalculate = true;

    trapezoid::resolve(
        block,
        block.entry_speed / block.nominal_speed,
        safe_speed / block.nominal_speed,
    );

    Some(SegmentOutcome {
        current_speed,
        nominal_speed: block.nominal_speed,
    })
}
