//! Property-based tests for position allocation and pagination.
//!
//! Uses proptest to verify:
//! 1. An allocated key always lands at the requested drop index, and any
//!    insertion sequence keeps the column strictly ordered.
//! 2. Head allocation stays strictly below the current head for any key
//!    sign.
//! 3. Renumbering produces evenly spaced keys that never trip the gap
//!    detector.
//! 4. The pagination envelope covers every item exactly once and keeps its
//!    cursors consistent.
//! 5. Task records survive a camelCase JSON round-trip.

use chrono::{TimeZone, Utc};
use proptest::prelude::*;

use flowboard_core::page::Paginated;
use flowboard_core::position::{
    APPEND_GAP, MIN_GAP, compute_position, needs_rebalance, rebalanced_positions,
};
use flowboard_core::task::{Assignee, Priority, Task, TaskColumn, TaskId};

// --- Strategies ---

/// Strategy for a strictly ascending column of sort keys. Gaps of at least
/// one keep midpoints exactly representable at these magnitudes.
fn arb_column() -> impl Strategy<Value = Vec<f64>> {
    (
        -1_000_000.0f64..1_000_000.0,
        prop::collection::vec(1.0f64..5000.0, 0..24),
    )
        .prop_map(|(base, gaps)| {
            let mut positions = Vec::with_capacity(gaps.len());
            let mut current = base;
            for gap in gaps {
                positions.push(current);
                current += gap;
            }
            positions
        })
}

/// Strategy for an ascending column that may contain collapsed gaps.
fn arb_crowded_column() -> impl Strategy<Value = Vec<f64>> {
    prop::collection::vec(prop_oneof![0.0f64..1e-5, 1e-5..1000.0], 0..24).prop_map(|gaps| {
        let mut positions = Vec::with_capacity(gaps.len());
        let mut current = 0.0;
        for gap in gaps {
            positions.push(current);
            current += gap;
        }
        positions
    })
}

/// Strategy for generating arbitrary `TaskColumn` values.
fn arb_task_column() -> impl Strategy<Value = TaskColumn> {
    prop_oneof![
        Just(TaskColumn::Backlog),
        Just(TaskColumn::InProgress),
        Just(TaskColumn::UnderReview),
        Just(TaskColumn::Completed),
    ]
}

/// Strategy for generating arbitrary `Priority` values.
fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![
        Just(Priority::Low),
        Just(Priority::Medium),
        Just(Priority::High),
    ]
}

/// Strategy for generating arbitrary UTC timestamps with sub-second parts.
fn arb_timestamp() -> impl Strategy<Value = chrono::DateTime<Utc>> {
    (0i64..4_000_000_000, 0u32..1_000_000_000).prop_map(|(secs, nanos)| {
        Utc.timestamp_opt(secs, nanos)
            .single()
            .expect("timestamp in range")
    })
}

/// Strategy for generating arbitrary `Task` records.
fn arb_task() -> impl Strategy<Value = Task> {
    (
        "[a-zA-Z0-9 ]{1,40}",
        "[a-zA-Z0-9 ]{1,120}",
        arb_task_column(),
        arb_priority(),
        prop::option::of("[a-z]{1,12}"),
        prop::option::of("[0-9]{1,2}h"),
        prop::option::of(Just("blue".to_string())),
        -1_000_000.0f64..1_000_000.0,
        arb_timestamp(),
    )
        .prop_map(
            |(title, description, column, priority, assignee, estimate, color, position, at)| {
                Task {
                    id: TaskId::new(),
                    title,
                    description,
                    column,
                    priority,
                    assignee: assignee.map(|name| Assignee {
                        name: Some(name),
                        avatar: None,
                    }),
                    time_estimate: estimate,
                    due_date: None,
                    color,
                    position,
                    created_at: at,
                    updated_at: at,
                }
            },
        )
}

// --- Property tests ---

proptest! {
    /// The allocated key sorts into the column exactly at the requested
    /// drop index (clamped to the column length) and collides with nothing.
    #[test]
    fn allocated_key_lands_at_drop_index(column in arb_column(), drop_index in 0usize..30) {
        let key = compute_position(&column, drop_index);
        prop_assert!(key.is_finite());
        prop_assert!(column.iter().all(|&p| p != key));
        let rank = column.iter().filter(|&&p| p < key).count();
        prop_assert_eq!(rank, drop_index.min(column.len()));
    }

    /// Inserting the allocated key keeps the column strictly ascending.
    #[test]
    fn allocation_preserves_strict_order(column in arb_column(), drop_index in 0usize..30) {
        let key = compute_position(&column, drop_index);
        let mut with_key = column;
        with_key.insert(drop_index.min(with_key.len()), key);
        for pair in with_key.windows(2) {
            prop_assert!(pair[0] < pair[1], "order broken: {:?}", with_key);
        }
    }

    /// Any sequence of drop-index insertions into an initially empty column
    /// keeps it strictly ascending.
    #[test]
    fn insertion_sequence_keeps_strict_order(drops in prop::collection::vec(0usize..12, 1..48)) {
        let mut column: Vec<f64> = Vec::new();
        for drop_index in drops {
            let key = compute_position(&column, drop_index);
            column.insert(drop_index.min(column.len()), key);
        }
        for pair in column.windows(2) {
            prop_assert!(pair[0] < pair[1], "order broken: {:?}", column);
        }
    }

    /// A head drop always lands strictly below the current head, whatever
    /// the head key's sign.
    #[test]
    fn head_allocation_stays_below_head(column in arb_column()) {
        prop_assume!(!column.is_empty());
        let key = compute_position(&column, 0);
        prop_assert!(key < column[0]);
    }

    /// Renumbering spaces keys by exactly the append gap and never leaves
    /// the column in need of another renumber.
    #[test]
    fn renumbering_is_evenly_spaced(len in 0usize..200) {
        let fresh = rebalanced_positions(len);
        prop_assert_eq!(fresh.len(), len);
        for pair in fresh.windows(2) {
            prop_assert_eq!(pair[1] - pair[0], APPEND_GAP);
        }
        prop_assert!(!needs_rebalance(&fresh, MIN_GAP));
    }

    /// The gap detector fires exactly when some adjacent gap is below the
    /// minimum.
    #[test]
    fn gap_detector_matches_manual_scan(column in arb_crowded_column()) {
        let tightest = column
            .windows(2)
            .map(|pair| pair[1] - pair[0])
            .fold(f64::INFINITY, f64::min);
        prop_assert_eq!(needs_rebalance(&column, MIN_GAP), tightest < MIN_GAP);
    }

    /// Walking the envelope page by page yields every item exactly once,
    /// in order.
    #[test]
    fn pagination_covers_all_items_exactly_once(
        items in prop::collection::vec(any::<u32>(), 0..60),
        per_page in 1u32..10,
    ) {
        let pages = Paginated::paginate(items.clone(), 1, per_page).pages;
        let mut walked = Vec::new();
        for page in 1..=pages {
            let envelope = Paginated::paginate(items.clone(), page, per_page);
            prop_assert!(envelope.data.len() <= per_page as usize);
            prop_assert_eq!(envelope.next, (page < pages).then(|| page + 1));
            prop_assert_eq!(envelope.prev, (page > 1).then(|| page - 1));
            walked.extend(envelope.data);
        }
        prop_assert_eq!(walked, items);
    }

    /// Envelope counters stay consistent for any page request, including
    /// ones past the end.
    #[test]
    fn pagination_envelope_counters_consistent(
        len in 0usize..60,
        page in 1u32..20,
        per_page in 1u32..10,
    ) {
        let items: Vec<usize> = (0..len).collect();
        let envelope = Paginated::paginate(items, page, per_page);
        prop_assert_eq!(envelope.items, len as u64);
        prop_assert_eq!(envelope.pages, len.div_ceil(per_page as usize) as u32);
        prop_assert_eq!(envelope.first, 1);
        prop_assert_eq!(envelope.last, envelope.pages);
        if page > envelope.pages {
            prop_assert!(envelope.data.is_empty());
        }
    }

    /// Any task record survives the camelCase JSON wire format.
    #[test]
    fn task_json_round_trip(task in arb_task()) {
        let json = serde_json::to_string(&task).expect("serialize");
        let back: Task = serde_json::from_str(&json).expect("deserialize");
        prop_assert_eq!(task, back);
    }
}
