//! Axis-activity scan.
//!
//! Reads the current queue to decide which motors can be powered down and
//! what the fans should run at. Idle-axis disables follow the per-axis
//! `disable_on_idle` policy; fan PWM latches to the tail block's value (the
//! block now executing) and falls back to the configured target when the
//! queue is empty.

use crate::block::Axis;
use crate::config::{PlannerConfig, MAX_EXTRUDERS};
use crate::io::MachineIo;
use crate::queue::BlockQueue;

pub(crate) fn scan<IO: MachineIo>(
    queue: &BlockQueue,
    config: &PlannerConfig,
    fan_targets: &[u8; MAX_EXTRUDERS],
    io: &mut IO,
) {
    let mut active = [0u32; 4];
    let mut fan_out = *fan_targets;

    let mut tail_block = true;
    for block in queue.iter() {
        if tail_block {
            let extruder = (block.active_extruder as usize).min(MAX_EXTRUDERS - 1);
            fan_out[extruder] = block.fan_speed;
            tail_block = false;
        }
        for axis in Axis::ALL {
            if block.steps[axis.index()] != 0 {
                active[axis.index()] += 1;
            }
        }
    }

    if config.x.disable_on_idle && active[Axis::X.index()] == 0 {
        io.axis_disable(Axis::X);
    }
    if config.y.disable_on_idle && active[Axis::Y.index()] == 0 {
        io.axis_disable(Axis::Y);
    }
    if config.z.disable_on_idle && active[Axis::Z.index()] == 0 {
        io.axis_disable(Axis::Z);
    }
    if config.disable_e_on_idle && active[Axis::E.index()] == 0 {
        io.axis_disable(Axis::E);
    }

    for extruder in 0..config.extruder_count().min(MAX_EXTRUDERS) {
        io.write_fan(extruder as u8, fan_out[extruder]);
    }
}
