//! Shared test helpers for integration tests and benchmarks.
//!
//! Gated behind `#[cfg(any(test, feature = "test-utils"))]` so these helpers
//! are available in unit tests, integration tests, and benchmarks (via the
//! `test-utils` feature).

use std::path::{Path, PathBuf};

use crate::entity::EntityKind;
use crate::geometry::Point;
use crate::grid::Grid;
use crate::link::{LinkDirection, LinkTarget};

// ===========================================================================
// Grid builders
// ===========================================================================

pub fn p(x: i32, y: i32) -> Point {
    Point::new(x, y)
}

/// Build a grid by inserting each `(point, kind)` in order, with seeding.
pub fn grid_with(cells: impl IntoIterator<Item = (Point, EntityKind)>) -> Grid {
    let mut grid = Grid::new();
    for (pos, kind) in cells {
        grid.insert(pos, kind);
    }
    grid
}

/// A 2x2 block of living cells with its top-left corner at `origin`.
pub fn block(origin: Point) -> Grid {
    grid_with(
        [(0, 0), (1, 0), (0, 1), (1, 1)]
            .map(|(dx, dy)| (origin.shifted(dx, dy), EntityKind::LivingCell)),
    )
}

/// A horizontal blinker of three living cells centred on `centre`.
pub fn blinker(centre: Point) -> Grid {
    grid_with((-1..=1).map(|dx| (centre.shifted(dx, 0), EntityKind::LivingCell)))
}

/// A rightward arrow chain on even x in `0..2*len`, fed by a spark at (-1, 0).
pub fn arrow_chain(len: i32) -> Grid {
    let mut grid = grid_with((0..len).map(|i| (p(2 * i, 0), EntityKind::ArrowRight)));
    grid.insert(p(-1, 0), EntityKind::Spark);
    grid
}

/// A wire sub-grid: IN port at (0,0), `len` rightward arrows on odd x, and
/// an OUT port at (2*len, 0). A spark on the IN port reaches the OUT port
/// after `len` generations.
pub fn wire_grid(len: i32) -> Grid {
    let mut grid = grid_with((0..len).map(|i| (p(2 * i + 1, 0), EntityKind::ArrowRight)));
    // Local links cannot fail.
    let _ = grid.insert_link(p(0, 0), LinkDirection::In, LinkTarget::Local);
    let _ = grid.insert_link(p(2 * len, 0), LinkDirection::Out, LinkTarget::Local);
    grid
}

/// Positions of every cell holding `kind`.
pub fn positions_of(grid: &Grid, kind: EntityKind) -> Vec<Point> {
    grid.entities()
        .filter(|&(_, k)| k == kind)
        .map(|(pos, _)| pos)
        .collect()
}

/// Positions of every living cell.
pub fn living(grid: &Grid) -> Vec<Point> {
    positions_of(grid, EntityKind::LivingCell)
}

// ===========================================================================
// Filesystem helpers
// ===========================================================================

/// A fresh, empty directory under the system temp dir.
pub fn make_test_dir(suffix: &str) -> PathBuf {
    let dir = std::env::temp_dir().join(format!(
        "cae_test_{suffix}_{}",
        std::process::id()
    ));
    let _ = std::fs::remove_dir_all(&dir);
    std::fs::create_dir_all(&dir).unwrap();
    dir
}

pub fn cleanup(dir: &Path) {
    let _ = std::fs::remove_dir_all(dir);
}
