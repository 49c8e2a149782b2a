//! Property-based tests for the CAE core.
//!
//! Uses proptest to generate random grids and edits, then verify the
//! invariants that hold for every rule set.

use std::collections::BTreeMap;

use cae_core::entity::EntityKind;
use cae_core::geometry::Point;
use cae_core::grid::Grid;
use cae_core::sim::scheduled_runs;
use cae_core::test_utils::*;
use proptest::prelude::*;

// ===========================================================================
// Generators
// ===========================================================================

fn arb_point(span: i32) -> impl Strategy<Value = Point> {
    (-span..=span, -span..=span).prop_map(|(x, y)| Point::new(x, y))
}

fn arb_kind() -> impl Strategy<Value = EntityKind> {
    (1u8..10).prop_map(|id| EntityKind::from_id(id).unwrap_or(EntityKind::Spark))
}

/// A grid built from up to `max_cells` random insertions.
fn arb_grid(max_cells: usize) -> impl Strategy<Value = Grid> {
    proptest::collection::vec((arb_point(12), arb_kind()), 0..=max_cells).prop_map(grid_with)
}

// ===========================================================================
// Properties
// ===========================================================================

proptest! {
    #[test]
    fn block_is_still_life(origin in arb_point(1000), ticks in 1usize..30) {
        let mut grid = block(origin);
        let before = grid.cells().clone();
        for _ in 0..ticks {
            grid.update();
        }
        prop_assert_eq!(grid.cells(), &before);
    }

    #[test]
    fn lone_spark_always_vanishes(pos in arb_point(1000)) {
        let mut grid = grid_with([(pos, EntityKind::Spark)]);
        grid.update();
        prop_assert!(grid.is_empty());
    }

    #[test]
    fn void_is_never_stored(grid in arb_grid(40), probes in proptest::collection::vec(arb_point(15), 1..20)) {
        let mut grid = grid;
        for _ in 0..3 {
            grid.update();
        }
        prop_assert!(grid.entities().all(|(_, kind)| kind != EntityKind::Void));
        for pos in probes {
            let stored = grid.cells().contains_key(&pos);
            prop_assert_eq!(stored, grid.kind_at(pos) != EntityKind::Void);
        }
    }

    #[test]
    fn inserting_void_equals_absence(grid in arb_grid(30), pos in arb_point(12)) {
        let mut with_void = grid.clone();
        with_void.insert(pos, EntityKind::Void);
        let mut expected: BTreeMap<Point, EntityKind> = grid.cells().clone();
        expected.remove(&pos);
        prop_assert_eq!(with_void.cells(), &expected);
    }

    #[test]
    fn store_load_reproduces_cells(grid in arb_grid(40)) {
        let json = grid.to_json_string().unwrap();
        let loaded = Grid::from_json_str(&json, ".").unwrap();
        prop_assert_eq!(loaded.cells(), grid.cells());
    }

    #[test]
    fn update_is_deterministic(grid in arb_grid(40), ticks in 1usize..10) {
        let mut a = grid.clone();
        let mut b = grid;
        for _ in 0..ticks {
            a.update();
            b.update();
        }
        prop_assert_eq!(a.state_hash(), b.state_hash());
        prop_assert_eq!(a.cells(), b.cells());
    }

    #[test]
    fn four_quarter_turns_restore_selection(grid in arb_grid(25)) {
        let mut grid = grid;
        let area: Vec<Point> = (-13..=13)
            .flat_map(|y| (-13..=13).map(move |x| Point::new(x, y)))
            .collect();
        grid.select_entities(area);
        let before = grid.entities_to_copy();
        for _ in 0..4 {
            grid.rotate(90);
        }
        prop_assert_eq!(grid.entities_to_copy(), before);
    }

    #[test]
    fn ratio_schedule_sums_to_child_speed(parent in 1u32..20, child in 1u32..20) {
        let total: u64 = (0..parent).map(|phase| scheduled_runs(parent, child, phase)).sum();
        prop_assert_eq!(total, u64::from(child));
    }
}
