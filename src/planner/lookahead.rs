//! Look-ahead speed planning.
//!
//! Re-plans the entry speeds of every queued, non-busy block after each
//! insertion: a reverse pass lowers entry speeds that cannot decelerate to
//! their successor's entry, a forward pass lowers entry speeds their
//! predecessor cannot accelerate to, and a final walk re-resolves the
//! trapezoid of every block whose junction changed. All three are single
//! linear scans over the queue.

use crate::queue::{next_index, prev_index, BlockQueue};

use super::trapezoid;
use super::MIN_PLANNER_SPEED;

/// Re-plan the whole queue. Called after every insertion, with the new
/// block already published at `head - 1`.
pub(crate) fn recalculate(queue: &mut BlockQueue) {
    reverse_pass(queue);
    forward_pass(queue);
    recompute_trapezoids(queue);
}

/// Walk newest → oldest, maximizing entry speeds subject to each block
/// being able to decelerate to its successor's entry speed.
///
/// The newest block is skipped (its exit is the safe floor by
/// construction), and the tail block is never touched: it may already be
/// executing.
fn reverse_pass(queue: &mut BlockQueue) {
    let head = queue.head();
    let tail = queue.tail();
    if head == tail {
        return;
    }

    let newest = prev_index(head);
    if newest == tail {
        return;
    }

    let mut next_idx = newest;
    let mut idx = prev_index(newest);
    while idx != tail {
        let next_entry = queue.block(next_idx).entry_speed;
        let current = queue.block_mut(idx);
        if !current.is_busy() && current.entry_speed != current.max_entry_speed {
            current.entry_speed = if !current.nominal_length
                && current.max_entry_speed > next_entry
            {
                // Highest entry from which the successor's entry is still
                // reachable by decelerating through this block.
                current.max_entry_speed.min(trapezoid::max_allowable_speed(
                    -current.acceleration,
                    next_entry,
                    current.millimeters,
                ))
            } else {
                current.max_entry_speed
            };
            current.recalculate = true;
        }
        next_idx = idx;
        idx = prev_index(idx);
    }
}

/// Walk oldest → newest, lowering entry speeds the predecessor cannot
/// accelerate to within its own length.
fn forward_pass(queue: &mut BlockQueue) {
    let head = queue.head();
    let tail = queue.tail();
    if head == tail {
        return;
    }

    let mut prev_idx = tail;
    let mut idx = next_index(tail);
    while idx != head {
        let prev = queue.block(prev_idx);
        let prev_nominal_length = prev.nominal_length;
        let prev_entry = prev.entry_speed;
        let prev_acceleration = prev.acceleration;
        let prev_millimeters = prev.millimeters;

        let current = queue.block_mut(idx);
        if !current.is_busy() && !prev_nominal_length && prev_entry < current.entry_speed {
            let reachable = trapezoid::max_allowable_speed(
                -prev_acceleration,
                prev_entry,
                prev_millimeters,
            );
            let entry = current.entry_speed.min(reachable);
            if entry != current.entry_speed {
                current.entry_speed = entry;
                current.recalculate = true;
            }
        }

        prev_idx = idx;
        idx = next_index(idx);
    }
}

/// Walk oldest → newest re-resolving the trapezoid of every block whose own
/// or successor's junction changed. The newest block is always re-resolved
/// with its exit pinned to the minimum planner speed; a later enqueue is
/// what widens it.
fn recompute_trapezoids(queue: &mut BlockQueue) {
    let head = queue.head();
    let tail = queue.tail();
    if head == tail {
        return;
    }

    let newest = prev_index(head);
    let mut idx = tail;
    while idx != newest {
        let successor = queue.block(next_index(idx));
        let next_entry = successor.entry_speed;
        let next_recalculate = successor.recalculate;

        let current = queue.block_mut(idx);
        if current.recalculate || next_recalculate {
            let nominal = current.nominal_speed;
            let committed = trapezoid::resolve(
                current,
                current.entry_speed / nominal,
                next_entry / nominal,
            );
            if committed {
                current.recalculate = false;
            }
        }
        idx = next_index(idx);
    }

    let current = queue.block_mut(newest);
    let nominal = current.nominal_speed;
    let committed = trapezoid::resolve(
        current,
        current.entry_speed / nominal,
        MIN_PLANNER_SPEED / nominal,
    );
    if committed {
        current.recalculate = false;
    }
}
