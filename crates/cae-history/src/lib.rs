//! Undo/redo for CAE grids.
//!
//! [`HistoryGrid`] wraps a [`Grid`] and records checkpoints of its cell
//! contents on demand. The plain `Grid` carries no history cost; only grids
//! wrapped here pay for checkpoints.
//!
//! ```rust,ignore
//! let mut grid = HistoryGrid::new(Grid::new());
//! grid.insert(Point::new(0, 0), EntityKind::Spark);
//! grid.push_actions();
//! grid.undo();
//! ```

use std::collections::{BTreeMap, VecDeque};

use cae_core::config::{DEFAULT_HISTORY_CAPACITY, EngineConfig};
use cae_core::entity::EntityKind;
use cae_core::geometry::Point;
use cae_core::grid::Grid;
use tracing::debug;

// ---------------------------------------------------------------------------
// Checkpoints
// ---------------------------------------------------------------------------

/// Cell contents of a grid at one point in its edit history.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Checkpoint {
    /// Generation of the grid when the checkpoint was taken.
    pub generation: u64,
    /// Every non-void cell.
    pub cells: BTreeMap<Point, EntityKind>,
}

impl Checkpoint {
    pub fn of(grid: &Grid) -> Self {
        Self {
            generation: grid.generation(),
            cells: grid.cells().clone(),
        }
    }
}

/// Bounded list of checkpoints with a cursor.
///
/// Checkpoints after the cursor are the redo branch; recording a new
/// checkpoint discards them. When full, the oldest checkpoint is evicted.
#[derive(Debug, Clone)]
pub struct History {
    entries: VecDeque<Checkpoint>,
    index: usize,
    capacity: usize,
    /// Total checkpoints ever recorded, including evicted ones.
    total_taken: u64,
}

impl History {
    /// Create a history holding `baseline` at index 0. A capacity of 0 is
    /// clamped to 1.
    pub fn new(baseline: Checkpoint, capacity: usize) -> Self {
        let capacity = capacity.max(1);
        let mut entries = VecDeque::with_capacity(capacity);
        entries.push_back(baseline);
        Self {
            entries,
            index: 0,
            capacity,
            total_taken: 1,
        }
    }

    /// Drop the redo branch and append `checkpoint` as the current entry.
    pub fn record(&mut self, checkpoint: Checkpoint) {
        self.entries.truncate(self.index + 1);
        self.entries.push_back(checkpoint);
        if self.entries.len() > self.capacity {
            self.entries.pop_front();
        }
        self.index = self.entries.len() - 1;
        self.total_taken += 1;
    }

    /// Move the cursor back one and return the checkpoint there.
    pub fn back(&mut self) -> Option<&Checkpoint> {
        if self.index == 0 {
            return None;
        }
        self.index -= 1;
        self.entries.get(self.index)
    }

    /// Move the cursor forward one and return the checkpoint there.
    pub fn forward(&mut self) -> Option<&Checkpoint> {
        if self.index + 1 >= self.entries.len() {
            return None;
        }
        self.index += 1;
        self.entries.get(self.index)
    }

    pub fn current(&self) -> Option<&Checkpoint> {
        self.entries.get(self.index)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn index(&self) -> usize {
        self.index
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn total_taken(&self) -> u64 {
        self.total_taken
    }
}

// ---------------------------------------------------------------------------
// HistoryGrid
// ---------------------------------------------------------------------------

/// A grid with bounded undo/redo over its cell contents.
#[derive(Debug, Clone)]
pub struct HistoryGrid {
    grid: Grid,
    history: History,
}

impl HistoryGrid {
    /// Wrap `grid` with the default capacity. The current contents become
    /// the first checkpoint.
    pub fn new(grid: Grid) -> Self {
        Self::with_capacity(grid, DEFAULT_HISTORY_CAPACITY)
    }

    pub fn with_capacity(grid: Grid, capacity: usize) -> Self {
        let history = History::new(Checkpoint::of(&grid), capacity);
        Self { grid, history }
    }

    pub fn with_config(grid: Grid, config: &EngineConfig) -> Self {
        Self::with_capacity(grid, config.history_capacity)
    }

    /// Record the current cell contents as a new checkpoint, discarding
    /// any redo branch.
    pub fn push_actions(&mut self) {
        self.history.record(Checkpoint::of(&self.grid));
        debug!(
            checkpoints = self.history.len(),
            index = self.history.index(),
            "checkpoint recorded"
        );
    }

    /// Restore the previous checkpoint. Returns whether anything changed.
    pub fn undo(&mut self) -> bool {
        let Some(checkpoint) = self.history.back() else {
            return false;
        };
        self.grid.restore_cells(&checkpoint.cells);
        debug!(index = self.history.index(), "undo");
        true
    }

    /// Restore the next checkpoint. Returns whether anything changed.
    pub fn redo(&mut self) -> bool {
        let Some(checkpoint) = self.history.forward() else {
            return false;
        };
        self.grid.restore_cells(&checkpoint.cells);
        debug!(index = self.history.index(), "redo");
        true
    }

    /// `(checkpoint count, current index)`.
    pub fn actions_status(&self) -> (usize, usize) {
        (self.history.len(), self.history.index())
    }

    pub fn can_undo(&self) -> bool {
        self.history.index() > 0
    }

    pub fn can_redo(&self) -> bool {
        self.history.index() + 1 < self.history.len()
    }

    /// Forget all checkpoints and start over from the current contents.
    pub fn reset(&mut self) {
        self.history = History::new(Checkpoint::of(&self.grid), self.history.capacity());
    }

    pub fn history(&self) -> &History {
        &self.history
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    /// Direct access to the wrapped grid. Edits made here are recorded only
    /// when [`HistoryGrid::push_actions`] is called.
    pub fn grid_mut(&mut self) -> &mut Grid {
        &mut self.grid
    }

    pub fn into_inner(self) -> Grid {
        self.grid
    }

    // -- Forwarded grid operations --

    pub fn insert(&mut self, pos: Point, kind: EntityKind) {
        self.grid.insert(pos, kind);
    }

    pub fn delete(&mut self, pos: Point) {
        self.grid.delete(pos);
    }

    pub fn update(&mut self) {
        self.grid.update();
    }

    pub fn kind_at(&self, pos: Point) -> EntityKind {
        self.grid.kind_at(pos)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cae_core::test_utils::*;

    #[test]
    fn starts_with_baseline_checkpoint() {
        let grid = HistoryGrid::new(Grid::new());
        assert_eq!(grid.actions_status(), (1, 0));
        assert!(!grid.can_undo());
        assert!(!grid.can_redo());
    }

    #[test]
    fn eleven_pushes_keep_ten_checkpoints() {
        let mut grid = HistoryGrid::new(Grid::new());
        for x in 0..11 {
            grid.insert(p(x, 0), EntityKind::Spark);
            grid.push_actions();
        }
        assert_eq!(grid.actions_status(), (10, 9));
        assert_eq!(grid.history().total_taken(), 12);
    }

    #[test]
    fn undo_all_then_redo_all_returns_to_tail() {
        let mut grid = HistoryGrid::new(Grid::new());
        for x in 0..11 {
            grid.insert(p(x, 0), EntityKind::Spark);
            grid.push_actions();
        }
        let tail = grid.grid().cells().clone();

        let undone = (0..10).filter(|_| grid.undo()).count();
        assert_eq!(undone, 9);
        assert_eq!(grid.actions_status(), (10, 0));
        // The oldest surviving checkpoint holds the first two sparks.
        assert_eq!(grid.grid().population(), 2);

        let redone = (0..10).filter(|_| grid.redo()).count();
        assert_eq!(redone, 9);
        assert_eq!(grid.grid().cells(), &tail);
    }

    #[test]
    fn undo_restores_exact_cells() {
        let mut grid = HistoryGrid::new(Grid::new());
        grid.insert(p(0, 0), EntityKind::LivingCell);
        grid.push_actions();
        grid.delete(p(0, 0));
        grid.push_actions();

        assert!(grid.undo());
        assert_eq!(grid.kind_at(p(0, 0)), EntityKind::LivingCell);
        assert_eq!(grid.grid().population(), 9);
        assert!(grid.undo());
        assert!(grid.grid().is_empty());
        assert!(!grid.undo());
    }

    #[test]
    fn push_after_undo_prunes_redo_branch() {
        let mut grid = HistoryGrid::new(Grid::new());
        grid.insert(p(0, 0), EntityKind::Spark);
        grid.push_actions();
        grid.insert(p(1, 0), EntityKind::Spark);
        grid.push_actions();

        assert!(grid.undo());
        grid.insert(p(5, 5), EntityKind::ArrowUp);
        grid.push_actions();

        assert!(!grid.can_redo());
        assert!(!grid.redo());
        assert_eq!(grid.actions_status(), (3, 2));
        assert_eq!(grid.kind_at(p(1, 0)), EntityKind::Void);
    }

    #[test]
    fn capacity_is_configurable() {
        let config = EngineConfig {
            history_capacity: 3,
            ..EngineConfig::default()
        };
        let mut grid = HistoryGrid::with_config(Grid::new(), &config);
        for _ in 0..5 {
            grid.push_actions();
        }
        assert_eq!(grid.actions_status(), (3, 2));
    }

    #[test]
    fn zero_capacity_is_clamped() {
        let mut grid = HistoryGrid::with_capacity(Grid::new(), 0);
        grid.push_actions();
        assert_eq!(grid.actions_status(), (1, 0));
        assert!(!grid.undo());
    }

    #[test]
    fn undo_over_stepping() {
        let mut grid = HistoryGrid::new(blinker(p(0, 0)));
        let start = grid.grid().cells().clone();
        grid.update();
        grid.push_actions();
        assert_ne!(grid.grid().cells(), &start);

        assert!(grid.undo());
        assert_eq!(grid.grid().cells(), &start);
        assert!(grid.redo());
        assert_eq!(living(grid.grid()), vec![p(0, -1), p(0, 0), p(0, 1)]);
    }

    #[test]
    fn reset_starts_over() {
        let mut grid = HistoryGrid::new(Grid::new());
        grid.push_actions();
        grid.push_actions();
        grid.reset();
        assert_eq!(grid.actions_status(), (1, 0));
    }
}
