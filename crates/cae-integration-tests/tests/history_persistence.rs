//! Cross-crate tests: undo/redo over stepping and editing of grids that
//! embed sub-grids, and persistence of edited histories.

use std::fs;

use cae_core::entity::EntityKind;
use cae_core::grid::Grid;
use cae_core::link::{LinkDirection, LinkTarget};
use cae_core::test_utils::*;
use cae_history::HistoryGrid;

/// A parent grid at `dir/main.cg` embedding `dir/wire.cg` through an IN
/// link at (10,0) and an OUT link at (20,0).
fn linked_parent(dir: &std::path::Path) -> Grid {
    wire_grid(2).store(dir.join("wire.cg")).unwrap();
    let mut grid = Grid::new();
    let id = grid.insert_grid(dir.join("wire.cg")).unwrap();
    grid.insert_link(
        p(10, 0),
        LinkDirection::In,
        LinkTarget::Foreign { grid: id, port: p(0, 0) },
    )
    .unwrap();
    grid.insert_link(
        p(20, 0),
        LinkDirection::Out,
        LinkTarget::Foreign { grid: id, port: p(4, 0) },
    )
    .unwrap();
    grid
}

#[test]
fn undo_restores_cells_but_keeps_links() {
    let dir = make_test_dir("undo_links");
    let mut grid = HistoryGrid::new(linked_parent(&dir));

    grid.insert(p(10, 0), EntityKind::Spark);
    grid.push_actions();
    grid.update();
    grid.update();
    grid.push_actions();
    assert_eq!(grid.kind_at(p(20, 0)), EntityKind::Spark);

    assert!(grid.undo());
    assert_eq!(grid.kind_at(p(10, 0)), EntityKind::Spark);
    assert_eq!(grid.kind_at(p(20, 0)), EntityKind::Void);
    assert_eq!(grid.grid().links().count(), 2);
    assert_eq!(grid.grid().linked_grids().len(), 1);

    cleanup(&dir);
}

#[test]
fn stored_history_state_reloads_with_sub_grids() {
    let dir = make_test_dir("history_store");
    let mut grid = HistoryGrid::new(linked_parent(&dir));

    for x in 0..4 {
        grid.insert(p(x, 5), EntityKind::ArrowDown);
        grid.push_actions();
    }
    grid.undo();
    grid.undo();

    let path = dir.join("main.cg");
    grid.grid().store(&path).unwrap();
    let loaded = Grid::from_file(&path).unwrap();
    assert_eq!(loaded.cells(), grid.grid().cells());
    assert_eq!(positions_of(&loaded, EntityKind::ArrowDown).len(), 2);
    assert_eq!(loaded.links().count(), 2);

    cleanup(&dir);
}

#[test]
fn edited_sub_grid_file_prunes_after_reload() {
    let dir = make_test_dir("history_reload");
    let mut grid = HistoryGrid::new(linked_parent(&dir));

    fs::write(
        dir.join("wire.cg"),
        r#"{"arrowright": [[1, 0], [3, 0]], "my_links": {"IN": [[0, 0]]}}"#,
    )
    .unwrap();
    assert_eq!(grid.grid_mut().update_linked_grids().unwrap(), 1);

    grid.insert(p(10, 0), EntityKind::Spark);
    for _ in 0..3 {
        grid.update();
    }
    assert_eq!(grid.kind_at(p(20, 0)), EntityKind::Void);

    cleanup(&dir);
}

#[test]
fn life_history_matches_fresh_run() {
    let mut with_history = HistoryGrid::new(blinker(p(0, 0)));
    let mut plain = blinker(p(0, 0));
    for _ in 0..7 {
        with_history.update();
        with_history.push_actions();
        plain.update();
    }
    assert_eq!(with_history.grid().state_hash(), plain.state_hash());

    for _ in 0..3 {
        assert!(with_history.undo());
    }
    let mut replay = blinker(p(0, 0));
    for _ in 0..4 {
        replay.update();
    }
    assert_eq!(with_history.grid().cells(), replay.cells());
}

#[test]
fn history_checkpoints_survive_json_round_trip() {
    let mut grid = HistoryGrid::new(Grid::new());
    grid.insert(p(0, 0), EntityKind::MonoOne);
    grid.push_actions();
    grid.update();
    grid.push_actions();

    let json = grid.grid().to_json_string().unwrap();
    let value: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(value["monoone"].as_array().map(Vec::len), Some(4));

    let mut restored = HistoryGrid::new(Grid::from_json_str(&json, ".").unwrap());
    assert_eq!(restored.grid().cells(), grid.grid().cells());
    assert!(!restored.undo());
}
