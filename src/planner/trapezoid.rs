//! Trapezoid resolution.
//!
//! Turns a block's entry/exit speeds plus its constant acceleration into the
//! integer step counts of the accelerate, cruise, and decelerate phases. The
//! math follows the constant-acceleration kinematics
//! `v² = v0² + 2·a·d`; distances here are measured in master-axis steps and
//! rates in steps per second.

use core::sync::atomic::Ordering;

use libm::{ceilf, floorf, sqrtf};

use crate::block::Block;

use super::MIN_STEP_RATE;

/// Distance (in steps) needed to change from `initial_rate` to
/// `target_rate` at the given acceleration. Zero acceleration yields zero
/// distance.
#[inline]
pub(crate) fn accel_distance(initial_rate: f32, target_rate: f32, acceleration: f32) -> f32 {
    if acceleration != 0.0 {
        (target_rate * target_rate - initial_rate * initial_rate) / (2.0 * acceleration)
    } else {
        0.0
    }
}

/// Point (in steps) at which braking must begin so a block that accelerates
/// from `initial_rate` ends at exactly `final_rate` after `distance` steps
/// with no cruise plateau: the intersection of the acceleration and
/// deceleration parabolas.
#[inline]
pub(crate) fn intersection_distance(
    initial_rate: f32,
    final_rate: f32,
    acceleration: f32,
    distance: f32,
) -> f32 {
    if acceleration != 0.0 {
        (2.0 * acceleration * distance - initial_rate * initial_rate + final_rate * final_rate)
            / (4.0 * acceleration)
    } else {
        0.0
    }
}

/// Maximum speed from which `target_velocity` is still reachable within
/// `distance` at the given acceleration. Pass a negative acceleration for
/// the deceleration case.
#[inline]
pub(crate) fn max_allowable_speed(acceleration: f32, target_velocity: f32, distance: f32) -> f32 {
    sqrtf(target_velocity * target_velocity - 2.0 * acceleration * distance)
}

/// Fill a block's step-rate profile for the given entry and exit speed
/// factors (each in `(0, 1]`, relative to the nominal rate).
///
/// Returns `true` if the profile was committed. Commits are skipped when the
/// stepper has already claimed the block; the caller keeps the block's
/// `recalculate` flag set in that case.
pub(crate) fn resolve(block: &mut Block, entry_factor: f32, exit_factor: f32) -> bool {
    let nominal_rate = block.nominal_rate as f32;
    let mut initial_rate = ceilf(nominal_rate * entry_factor) as u32;
    let mut final_rate = ceilf(nominal_rate * exit_factor) as u32;

    // Hardware floor: slower rates would overflow the step timer. The floor
    // wins over the nominal ceiling when the whole move is below it.
    let rate_ceiling = block.nominal_rate.max(MIN_STEP_RATE);
    initial_rate = initial_rate.clamp(MIN_STEP_RATE, rate_ceiling);
    final_rate = final_rate.clamp(MIN_STEP_RATE, rate_ceiling);

    let acceleration = block.acceleration_st as f32;
    // Distances go negative when the clamped rates straddle a nominal rate
    // below the hardware floor; a phase can never have negative length.
    let mut accelerate_steps =
        (ceilf(accel_distance(initial_rate as f32, nominal_rate, acceleration)) as i32).max(0);
    let decelerate_steps =
        (floorf(accel_distance(nominal_rate, final_rate as f32, -acceleration)) as i32).max(0);

    let mut plateau_steps = block.step_event_count as i32 - accelerate_steps - decelerate_steps;

    // No room to cruise: accelerate to the parabola intersection, then brake.
    if plateau_steps < 0 {
        accelerate_steps = ceilf(intersection_distance(
            initial_rate as f32,
            final_rate as f32,
            acceleration,
            block.step_event_count as f32,
        )) as i32;
        // Round-off can push the intersection outside the block.
        accelerate_steps = accelerate_steps.clamp(0, block.step_event_count as i32);
        plateau_steps = 0;
    }

    // The stepper reads these fields; never touch them on a claimed block.
    if block.busy.load(Ordering::Acquire) {
        return false;
    }
    block.accelerate_until = accelerate_steps as u32;
    block.decelerate_after = (accelerate_steps + plateau_steps) as u32;
    block.initial_rate = initial_rate;
    block.final_rate = final_rate;
    true
}
