//! Fractional position allocation for task ordering.
//!
//! Tasks in a column are ordered by an `f64` sort key. Dropping a task at an
//! index allocates a key between its new neighbors without renumbering
//! anything else. The same function runs on the client (optimistic updates)
//! and on the server (authoritative recompute), so both sides derive the same
//! key from the same column snapshot.
//!
//! Repeated insertion at one boundary halves the available interval each
//! time, so keys eventually collide on `f64` precision. [`needs_rebalance`]
//! detects gaps below [`MIN_GAP`], and [`rebalanced_positions`] produces a
//! fresh evenly-spaced numbering for the column.

/// Gap left above the last task when appending to a column.
pub const APPEND_GAP: f64 = 1000.0;

/// Smallest adjacent gap tolerated before a column should be renumbered.
pub const MIN_GAP: f64 = 1e-6;

/// Computes the sort key for a task dropped at `drop_index` among
/// `neighbors`.
///
/// `neighbors` holds the positions of the destination column's tasks,
/// excluding the task being placed, sorted ascending. `drop_index` is the
/// 0-based target slot among those neighbors.
///
/// - Empty column: `0`.
/// - Dropped first: half the current head key, which stays strictly below
///   it for positive heads. A head at or below zero leaves no room under
///   halving, so the key steps down by [`APPEND_GAP`] instead.
/// - Dropped last (`drop_index >= neighbors.len()`): last key plus
///   [`APPEND_GAP`].
/// - Dropped between two tasks: their midpoint.
#[must_use]
pub fn compute_position(neighbors: &[f64], drop_index: usize) -> f64 {
    let Some(&first) = neighbors.first() else {
        return 0.0;
    };
    if drop_index == 0 {
        if first > 0.0 {
            return first / 2.0;
        }
        return first - APPEND_GAP;
    }
    if drop_index >= neighbors.len() {
        return neighbors[neighbors.len() - 1] + APPEND_GAP;
    }
    (neighbors[drop_index - 1] + neighbors[drop_index]) / 2.0
}

/// Returns true if any adjacent gap in `positions` (sorted ascending) has
/// shrunk below `min_gap`.
#[must_use]
pub fn needs_rebalance(positions: &[f64], min_gap: f64) -> bool {
    positions.windows(2).any(|pair| pair[1] - pair[0] < min_gap)
}

/// Produces a fresh evenly-spaced numbering for a column of `len` tasks:
/// `0, APPEND_GAP, 2 * APPEND_GAP, ...`.
#[must_use]
#[allow(clippy::cast_precision_loss)]
pub fn rebalanced_positions(len: usize) -> Vec<f64> {
    (0..len).map(|index| index as f64 * APPEND_GAP).collect()
}
