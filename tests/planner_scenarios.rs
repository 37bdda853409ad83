//! Integration tests for the motion planner.
//!
//! Exercises the complete enqueue → look-ahead → trapezoid pipeline with a
//! recording machine interface, covering the end-to-end junction scenarios,
//! the boundary behaviors, and the queue-wide invariants.

use motion_planner::{
    Axis, Block, MachineIo, MmPerSec, Planner, PlannerConfig, StepperHandle, BLOCK_BUFFER_SIZE,
    DROP_SEGMENTS, MIN_STEP_RATE,
};

// =============================================================================
// Test fixtures
// =============================================================================

/// Machine interface that records every callback.
#[derive(Default)]
struct RecordingIo {
    wakes: usize,
    enables: Vec<Axis>,
    disables: Vec<Axis>,
    fans: Vec<(u8, u8)>,
    synced_positions: Vec<[i32; 4]>,
    full_waits: usize,
    drain_on_full: bool,
}

impl MachineIo for RecordingIo {
    fn wake_stepper(&mut self) {
        self.wakes += 1;
    }

    fn sync_stepper_position(&mut self, steps: [i32; 4]) {
        self.synced_positions.push(steps);
    }

    fn axis_enable(&mut self, axis: Axis) {
        self.enables.push(axis);
    }

    fn axis_disable(&mut self, axis: Axis) {
        self.disables.push(axis);
    }

    fn write_fan(&mut self, extruder: u8, pwm: u8) {
        self.fans.push((extruder, pwm));
    }

    fn on_buffer_full(&mut self, stepper: StepperHandle<'_>) {
        self.full_waits += 1;
        if self.drain_on_full {
            stepper.current_block();
            stepper.finish_current();
        }
    }
}

fn planner() -> Planner<RecordingIo> {
    Planner::new(PlannerConfig::default(), RecordingIo::default())
}

fn two_extruder_config() -> PlannerConfig {
    let mut config = PlannerConfig::default();
    let mut second = config.extruders[0].clone();
    second.steps_per_mm = 140.0;
    config.extruders.push(second).unwrap();
    config
}

fn drain(p: &mut Planner<RecordingIo>) {
    while p.stepper().current_block().is_some() {
        p.stepper().finish_current();
    }
}

fn approx_eq(a: f32, b: f32, epsilon: f32) -> bool {
    (a - b).abs() < epsilon
}

/// Check the per-block invariants that must hold whenever a block is
/// visible to the stepper.
fn assert_block_invariants(block: &Block) {
    assert!(block.accelerate_until <= block.decelerate_after);
    assert!(block.decelerate_after <= block.step_event_count);
    assert!(block.step_event_count > DROP_SEGMENTS);

    let ceiling = block.nominal_rate.max(MIN_STEP_RATE);
    assert!(block.initial_rate >= MIN_STEP_RATE && block.initial_rate <= ceiling);
    assert!(block.final_rate >= MIN_STEP_RATE && block.final_rate <= ceiling);

    assert!(block.entry_speed <= block.max_entry_speed + 1e-3);
    assert!(block.max_entry_speed <= block.nominal_speed + 1e-3);
}

/// Check the forward and reverse feasibility laws for every adjacent pair.
fn assert_junction_feasibility(p: &Planner<RecordingIo>) {
    let blocks: Vec<&Block> = p.queued_blocks().collect();
    for pair in blocks.windows(2) {
        let (a, b) = (pair[0], pair[1]);
        let delta_v2 = 2.0 * a.acceleration * a.millimeters;

        // Forward: B's entry is reachable from A's entry
        let reachable = (a.entry_speed * a.entry_speed + delta_v2).sqrt();
        assert!(
            b.entry_speed <= reachable + 1e-2,
            "forward feasibility violated: {} > {}",
            b.entry_speed,
            reachable
        );

        // Reverse: A can decelerate to B's entry
        let brakeable = (b.entry_speed * b.entry_speed + delta_v2).sqrt();
        assert!(
            a.entry_speed <= brakeable + 1e-2,
            "reverse feasibility violated: {} > {}",
            a.entry_speed,
            brakeable
        );
    }
}

fn assert_queue_invariants(p: &Planner<RecordingIo>) {
    for block in p.queued_blocks() {
        assert_block_invariants(block);
    }
    assert_junction_feasibility(p);
}

// =============================================================================
// Configuration round trip
// =============================================================================

const MACHINE_CONFIG: &str = r#"
acceleration_mm_per_sec2 = 3000.0
max_xy_jerk_mm_per_sec = 20.0
max_z_jerk_mm_per_sec = 0.4

[x]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 500.0
max_acceleration_mm_per_sec2 = 9000.0

[y]
steps_per_mm = 80.0
max_feedrate_mm_per_sec = 500.0
max_acceleration_mm_per_sec2 = 9000.0

[z]
steps_per_mm = 400.0
max_feedrate_mm_per_sec = 5.0
max_acceleration_mm_per_sec2 = 100.0
disable_on_idle = true

[[extruders]]
steps_per_mm = 100.0
max_feedrate_mm_per_sec = 45.0
max_acceleration_mm_per_sec2 = 10000.0
retract_acceleration_mm_per_sec2 = 3000.0
max_jerk_mm_per_sec = 5.0
"#;

#[test]
fn toml_config_drives_the_planner() {
    let config: PlannerConfig = toml::from_str(MACHINE_CONFIG).unwrap();
    motion_planner::validate_config(&config).unwrap();

    let mut p = Planner::new(config, RecordingIo::default());
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);

    let block = p.queued_blocks().next().unwrap();
    assert_eq!(block.steps[0], 800);
    assert_eq!(block.nominal_rate, 4000);

    // Z idle-disable policy came through the TOML
    p.check_axes_activity();
    assert_eq!(p.io().disables, vec![Axis::Z]);
}

// =============================================================================
// End-to-end junction scenarios
// =============================================================================

#[test]
fn scenario_single_segment_at_rest() {
    let mut p = planner();
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);

    assert_eq!(p.moves_planned(), 1);
    let block = p.queued_blocks().next().unwrap();

    assert_eq!(block.steps[0], 800);
    assert_eq!(block.steps[1], 0);
    assert!(approx_eq(block.millimeters, 10.0, 1e-4));
    assert!(approx_eq(block.nominal_speed, 50.0, 1e-4));
    assert_eq!(block.nominal_rate, 4000);

    // Entry limited by the XY jerk floor: min(20/2, v_allowable) = 10 mm/s
    assert!(approx_eq(block.entry_speed, 10.0, 1e-4));
    assert_eq!(block.initial_rate, 800);

    // Exit pinned to the planner floor, below the hardware rate floor
    assert_eq!(block.final_rate, MIN_STEP_RATE);

    // 800 -> 4000 steps/s at 240000 steps/s²: 32 steps up, 33 down
    assert_eq!(block.accelerate_until, 32);
    assert_eq!(block.decelerate_after, 800 - 33);

    assert_eq!(p.io().wakes, 1);
    assert_queue_invariants(&p);
}

#[test]
fn scenario_two_collinear_segments() {
    let mut p = planner();
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    p.buffer_line(20.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);

    let blocks: Vec<&Block> = p.queued_blocks().collect();
    assert_eq!(blocks.len(), 2);

    // The junction saturates at nominal speed
    assert!(approx_eq(blocks[1].entry_speed, 50.0, 1e-3));
    assert!(approx_eq(blocks[1].max_entry_speed, 50.0, 1e-3));

    // First block now exits at full rate: no deceleration phase
    assert_eq!(blocks[0].final_rate, blocks[0].nominal_rate);
    assert_eq!(blocks[0].decelerate_after, blocks[0].step_event_count);

    // Second block enters at full rate and brakes only at its end
    assert_eq!(blocks[1].initial_rate, blocks[1].nominal_rate);
    assert_eq!(blocks[1].accelerate_until, 0);

    // Both cruise: a nonzero plateau separates the phases
    for block in &blocks {
        assert!(block.accelerate_until < block.decelerate_after);
    }
    assert_queue_invariants(&p);
}

#[test]
fn scenario_right_angle_corner() {
    let mut p = planner();
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    p.buffer_line(10.0, 10.0, 0.0, 0.0, MmPerSec(50.0), 0);

    let blocks: Vec<&Block> = p.queued_blocks().collect();

    // Junction jerk √(50² + 50²) ≈ 70.7 exceeds the 20 mm/s limit:
    // the corner runs at 50 · 20/70.7 ≈ 14.14 mm/s
    assert!(approx_eq(blocks[1].entry_speed, 14.142, 0.05));
    assert!(approx_eq(blocks[1].max_entry_speed, 14.142, 0.05));

    // At the junction speed the per-axis velocity step stays within the
    // jerk limit: |Δv| = √2 · 14.14 ≈ 20
    let junction = blocks[1].entry_speed;
    let jerk = (junction * junction * 2.0).sqrt();
    assert!(jerk <= 20.0 + 1e-2);

    // Both blocks still reach cruise
    for block in &blocks {
        assert!(block.accelerate_until < block.decelerate_after);
    }
    assert_queue_invariants(&p);
}

#[test]
fn scenario_corner_then_straight_continuation() {
    let mut p = planner();
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    p.buffer_line(10.0, 10.0, 0.0, 0.0, MmPerSec(50.0), 0);
    p.buffer_line(10.0, 20.0, 0.0, 0.0, MmPerSec(50.0), 0);

    let blocks: Vec<&Block> = p.queued_blocks().collect();
    assert_eq!(blocks.len(), 3);

    // The newest block's conservative exit must not drag the corner
    // junction below its jerk-derived maximum
    assert!(approx_eq(
        blocks[1].entry_speed,
        blocks[1].max_entry_speed,
        1e-3
    ));
    // The collinear junction saturates at nominal
    assert!(approx_eq(blocks[2].entry_speed, 50.0, 1e-3));
    assert_queue_invariants(&p);
}

#[test]
fn scenario_pure_retract() {
    let mut p = planner();
    p.set_position(5.0, 5.0, 1.0, 10.0);
    p.buffer_line(5.0, 5.0, 1.0, 8.0, MmPerSec(25.0), 0);

    let block = p.queued_blocks().next().unwrap();
    assert!(block.retract);
    assert!(!block.restore);
    assert!(approx_eq(block.millimeters, 2.0, 1e-4));
    assert!(approx_eq(block.nominal_speed, 25.0, 1e-4));

    // Filament-only moves take the retract acceleration:
    // 3000 mm/s² · 100 steps/mm
    assert_eq!(block.acceleration_st, 300_000);

    // Junction bound by the extruder jerk limit
    assert!(approx_eq(block.max_entry_speed, 5.0, 1e-4));
    assert_queue_invariants(&p);
}

#[test]
fn scenario_extruder_swap_rescales_e() {
    let mut p = Planner::new(two_extruder_config(), RecordingIo::default());
    p.set_position(0.0, 0.0, 0.0, 10.0);
    assert_eq!(p.position_steps()[3], 1000);

    // Same physical filament position on the new extruder: no motion
    p.buffer_line(0.0, 0.0, 0.0, 10.0, MmPerSec(25.0), 1);
    assert_eq!(p.moves_planned(), 0);
    assert_eq!(p.position_steps()[3], 1400);

    // One more millimeter of filament now quantizes at 140 steps/mm
    p.buffer_line(0.0, 0.0, 0.0, 11.0, MmPerSec(25.0), 1);
    let block = p.queued_blocks().next().unwrap();
    assert_eq!(block.steps[3], 140);
    assert_eq!(block.active_extruder, 1);
}

// =============================================================================
// Boundary behaviors
// =============================================================================

#[test]
fn boundary_drop_threshold() {
    let mut p = planner();

    // Exactly DROP_SEGMENTS master-axis steps: discarded
    p.buffer_line(DROP_SEGMENTS as f32 / 80.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    assert_eq!(p.moves_planned(), 0);
    assert_eq!(p.io().wakes, 0);

    // One step more: accepted
    p.buffer_line((DROP_SEGMENTS + 1) as f32 / 80.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    assert_eq!(p.moves_planned(), 1);
    assert_eq!(
        p.queued_blocks().next().unwrap().step_event_count,
        DROP_SEGMENTS + 1
    );
}

#[test]
fn boundary_min_step_rate() {
    let mut p = planner();
    // 800 steps over 10 mm at 1 mm/s: the requested rate is below the
    // hardware floor, so both profile rates pin to it
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(1.0), 0);

    let block = p.queued_blocks().next().unwrap();
    assert!(block.nominal_rate < MIN_STEP_RATE);
    assert_eq!(block.initial_rate, MIN_STEP_RATE);
    assert_eq!(block.final_rate, MIN_STEP_RATE);
}

#[test]
fn boundary_backpressure_blocks_producer() {
    let mut p = planner();
    p.io_mut().drain_on_full = true;

    // The ring holds capacity - 1 blocks without waiting
    for i in 0..BLOCK_BUFFER_SIZE - 1 {
        p.buffer_line((i as f32 + 1.0) * 10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    }
    assert_eq!(p.moves_planned(), BLOCK_BUFFER_SIZE - 1);
    assert_eq!(p.io().full_waits, 0);

    // The next enqueue waits until the stepper pops a block
    p.buffer_line(200.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    assert!(p.io().full_waits >= 1);
    assert_eq!(p.moves_planned(), BLOCK_BUFFER_SIZE - 1);
    assert_queue_invariants(&p);
}

#[test]
fn round_trip_position_yields_no_motion() {
    let mut p = planner();
    p.set_position(12.5, -3.25, 0.4, 7.0);
    p.buffer_line(12.5, -3.25, 0.4, 7.0, MmPerSec(50.0), 0);

    assert_eq!(p.moves_planned(), 0);
}

// =============================================================================
// Invariant sweep over a mixed command sequence
// =============================================================================

#[test]
fn invariants_hold_across_mixed_sequence() {
    let mut p = planner();
    p.io_mut().drain_on_full = true;

    // Zigzag print with varying feeds, Z hops, and retracts
    let commands: &[(f32, f32, f32, f32, f32)] = &[
        (10.0, 0.0, 0.0, 0.5, 30.0),
        (10.0, 10.0, 0.0, 1.0, 50.0),
        (0.0, 10.0, 0.0, 1.5, 80.0),
        (0.0, 0.0, 0.0, 2.0, 120.0),
        (0.0, 0.0, 0.0, 0.0, 25.0), // retract
        (0.0, 0.0, 0.4, 0.0, 5.0),  // z hop
        (5.0, 5.0, 0.4, 0.0, 200.0),
        (25.0, 5.0, 0.4, 1.0, 40.0),
        (25.0, 25.0, 0.4, 2.0, 40.0),
        (24.0, 25.0, 0.4, 2.1, 10.0),
        (0.0, 0.0, 0.4, 2.1, 300.0),
        (0.0, 0.0, 0.4, 4.0, 25.0), // restore
    ];

    for &(x, y, z, e, feed) in commands {
        p.buffer_line(x, y, z, e, MmPerSec(feed), 0);
        assert_queue_invariants(&p);
    }

    // Entry speeds stay planned after partial draining too
    p.stepper().current_block();
    p.stepper().finish_current();
    p.buffer_line(10.0, 0.0, 0.4, 4.5, MmPerSec(60.0), 0);
    assert_queue_invariants(&p);
}

// =============================================================================
// Axis activity and fan latching
// =============================================================================

#[test]
fn activity_scan_disables_idle_axes() {
    let mut p = planner();
    {
        let config = p.config_mut();
        config.x.disable_on_idle = true;
        config.y.disable_on_idle = true;
        config.z.disable_on_idle = true;
        config.disable_e_on_idle = true;
    }

    // Empty queue: everything is idle
    p.check_axes_activity();
    assert_eq!(
        p.io().disables,
        vec![Axis::X, Axis::Y, Axis::Z, Axis::E]
    );

    // An X+E move keeps those axes powered
    p.io_mut().disables.clear();
    p.buffer_line(10.0, 0.0, 0.0, 1.0, MmPerSec(50.0), 0);
    p.check_axes_activity();
    assert_eq!(p.io().disables, vec![Axis::Y, Axis::Z]);
}

#[test]
fn activity_scan_enables_moving_axes() {
    let mut p = planner();
    p.buffer_line(10.0, 0.0, 0.0, 1.0, MmPerSec(50.0), 0);

    assert!(p.io().enables.contains(&Axis::X));
    assert!(p.io().enables.contains(&Axis::E));
    assert!(!p.io().enables.contains(&Axis::Y));
}

#[test]
fn activity_scan_latches_tail_fan_speed() {
    let mut p = planner();
    p.set_fan_speed(0, 200);
    p.buffer_line(10.0, 0.0, 0.0, 1.0, MmPerSec(50.0), 0);

    // New target arrives while the old block is still queued
    p.set_fan_speed(0, 80);
    p.check_axes_activity();
    assert_eq!(p.io().fans.last(), Some(&(0, 200)));

    // Once the queue drains, the configured target applies
    drain(&mut p);
    p.check_axes_activity();
    assert_eq!(p.io().fans.last(), Some(&(0, 80)));
}

#[test]
fn activity_scan_is_idempotent() {
    let mut p = planner();
    p.config_mut().x.disable_on_idle = true;
    p.set_fan_speed(0, 128);
    p.buffer_line(0.0, 10.0, 0.0, 0.5, MmPerSec(50.0), 0);

    p.check_axes_activity();
    let first_disables = p.io().disables.clone();
    let first_fans = p.io().fans.clone();

    p.check_axes_activity();
    assert_eq!(p.io().disables.len(), first_disables.len() * 2);
    assert_eq!(p.io().fans.len(), first_fans.len() * 2);
    assert_eq!(&p.io().fans[first_fans.len()..], &first_fans[..]);
}

// =============================================================================
// Stepper handshake
// =============================================================================

#[test]
fn stepper_claim_freezes_profile() {
    let mut p = planner();
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);

    let (initial_rate, final_rate) = {
        let block = p.stepper().current_block().unwrap();
        assert!(block.is_busy());
        (block.initial_rate, block.final_rate)
    };

    // Re-planning around a claimed block must not alter its profile
    p.buffer_line(20.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    let tail = p.queued_blocks().next().unwrap();
    assert_eq!(tail.initial_rate, initial_rate);
    assert_eq!(tail.final_rate, final_rate);
}

#[test]
fn stepper_consumes_in_order() {
    let mut p = planner();
    p.buffer_line(10.0, 0.0, 0.0, 0.0, MmPerSec(50.0), 0);
    p.buffer_line(10.0, 10.0, 0.0, 0.0, MmPerSec(50.0), 0);

    let first_steps = p.stepper().current_block().unwrap().steps;
    assert_eq!(first_steps[0], 800);
    p.stepper().finish_current();

    let second_steps = p.stepper().current_block().unwrap().steps;
    assert_eq!(second_steps[1], 800);
    p.stepper().finish_current();

    assert!(p.stepper().current_block().is_none());
    assert_eq!(p.moves_planned(), 0);
}

#[test]
fn position_sync_reaches_stepper() {
    let mut p = planner();
    p.set_position(1.0, 2.0, 3.0, 4.0);

    assert_eq!(p.io().synced_positions.last(), Some(&[80, 160, 1200, 400]));
}
