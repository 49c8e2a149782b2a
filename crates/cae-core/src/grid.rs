//! The sparse cellular grid and its step/commit cycle.
//!
//! Each call to [`Grid::update`] advances the grid by one generation:
//!
//! 1. **Inbound links** -- push this grid's value at every IN link into the
//!    bound port of the sub-grid.
//! 2. **Sub-grids** -- step each embedded grid according to its speed ratio.
//! 3. **Evaluate** -- every non-void cell reads the pre-step snapshot and
//!    queues actions.
//! 4. **Commit** -- apply all queued deletions, then all insertions.
//! 5. **Clock** -- advance the phase counter and the generation count.
//! 6. **Outbound links** -- pull every OUT port value back into this grid.
//! 7. **Selection** -- refresh selected entities against the new state.

use std::collections::BTreeMap;
use std::path::PathBuf;

use slotmap::SlotMap;
use tracing::debug;

use crate::action::{Action, ActionQueue};
use crate::config::EngineConfig;
use crate::entity::EntityKind;
use crate::geometry::Point;
use crate::id::SubGridId;
use crate::link::{ForeignLink, LinkDirection, LinkedGrid};
use crate::selection::Selection;
use crate::sim::{self, StateHash};

// ---------------------------------------------------------------------------
// Grid
// ---------------------------------------------------------------------------

/// A sparse grid of entities. Positions not stored read as
/// [`EntityKind::Void`]; void is never stored.
#[derive(Debug, Clone)]
pub struct Grid {
    pub(crate) cells: BTreeMap<Point, EntityKind>,
    pub(crate) actions: ActionQueue,
    /// Ports owned by this grid, read and written by an embedding grid.
    pub(crate) my_links: BTreeMap<Point, LinkDirection>,
    /// Links bound to ports of embedded sub-grids.
    pub(crate) links: BTreeMap<Point, ForeignLink>,
    pub(crate) sub_grids: SlotMap<SubGridId, LinkedGrid>,
    pub(crate) speed: u32,
    pub(crate) phase: u32,
    pub(crate) generation: u64,
    /// File this grid was loaded from, if any.
    pub(crate) source: Option<PathBuf>,
    pub(crate) selection: Selection,
    pub(crate) max_nesting_depth: usize,
}

impl Default for Grid {
    fn default() -> Self {
        Self::new()
    }
}

impl Grid {
    /// Create an empty grid with speed 1.
    pub fn new() -> Self {
        Self::with_config(&EngineConfig::default())
    }

    /// Create an empty grid using the speed and nesting limit from `config`.
    pub fn with_config(config: &EngineConfig) -> Self {
        Self {
            cells: BTreeMap::new(),
            actions: ActionQueue::new(),
            my_links: BTreeMap::new(),
            links: BTreeMap::new(),
            sub_grids: SlotMap::with_key(),
            speed: config.default_speed.max(1),
            phase: 0,
            generation: 0,
            source: None,
            selection: Selection::default(),
            max_nesting_depth: config.max_nesting_depth,
        }
    }

    /// Create an empty grid with the given speed multiplier.
    pub fn with_speed(speed: u32) -> Self {
        let mut grid = Self::new();
        grid.set_speed(speed);
        grid
    }

    // -- Reads --

    /// The kind at `pos`, or `Void` if nothing is stored there.
    pub fn kind_at(&self, pos: Point) -> EntityKind {
        self.cells.get(&pos).copied().unwrap_or_default()
    }

    /// Every non-void cell, in position order. Each call starts over.
    pub fn entities(&self) -> impl Iterator<Item = (Point, EntityKind)> + '_ {
        self.cells.iter().map(|(&pos, &kind)| (pos, kind))
    }

    /// Number of non-void cells.
    pub fn population(&self) -> usize {
        self.cells.len()
    }

    pub fn is_empty(&self) -> bool {
        self.cells.is_empty()
    }

    /// Number of generations committed so far.
    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Position of this grid's clock within its speed cycle.
    pub fn phase(&self) -> u32 {
        self.phase
    }

    pub fn speed(&self) -> u32 {
        self.speed
    }

    /// Set the speed multiplier. Zero is clamped to 1. The phase restarts.
    pub fn set_speed(&mut self, speed: u32) {
        self.speed = speed.max(1);
        self.phase = 0;
    }

    /// File this grid was loaded from.
    pub fn source(&self) -> Option<&std::path::Path> {
        self.source.as_deref()
    }

    /// Deterministic hash of the cell contents.
    pub fn state_hash(&self) -> u64 {
        let mut hash = StateHash::new();
        for (&pos, &kind) in &self.cells {
            hash.write_cell(pos, kind);
        }
        hash.finish()
    }

    // -- Mutation --

    /// Insert a kind at `pos`, seeding its neighborhood.
    ///
    /// A no-op if the cell already holds `kind` or `pos` is outside
    /// [`COORD_LIMIT`](crate::geometry::COORD_LIMIT). Otherwise the kind is stored and, if it declares a
    /// neighborhood, every neighbor that is not already `kind` receives the
    /// companion kind. Neighbors past the limit are skipped.
    pub fn insert(&mut self, pos: Point, kind: EntityKind) {
        if self.kind_at(pos) == kind || !pos.in_bounds() {
            return;
        }
        self.place(pos, kind);

        let Some(seeding) = kind.seeding() else {
            return;
        };
        for &dir in seeding.neighborhood.directions() {
            let neighbor = pos.offset(dir);
            if self.kind_at(neighbor) != kind {
                self.place(neighbor, seeding.companion);
            }
        }
    }

    /// Delete the entity at `pos`. Living cells become dead cells, anything
    /// else becomes void. Deleting an empty cell does nothing.
    pub fn delete(&mut self, pos: Point) {
        if let Some(kind) = self.cells.remove(&pos) {
            self.place(pos, kind.residue());
        }
    }

    /// Remove every cell. Links and sub-grids are kept.
    pub fn clear(&mut self) {
        self.cells.clear();
    }

    /// Delete every spark on the grid.
    pub fn clear_sparks(&mut self) {
        self.cells.retain(|_, kind| *kind != EntityKind::Spark);
    }

    /// Translate every cell, port and link by `(dx, dy)`. Cells pushed past
    /// the coordinate limit are dropped.
    pub fn shift_all(&mut self, dx: i32, dy: i32) {
        self.cells = std::mem::take(&mut self.cells)
            .into_iter()
            .map(|(pos, kind)| (pos.shifted(dx, dy), kind))
            .filter(|(pos, _)| pos.in_bounds())
            .collect();
        self.my_links = std::mem::take(&mut self.my_links)
            .into_iter()
            .map(|(pos, dir)| (pos.shifted(dx, dy), dir))
            .collect();
        self.links = std::mem::take(&mut self.links)
            .into_iter()
            .map(|(pos, link)| (pos.shifted(dx, dy), link))
            .collect();
        self.selection.shift(dx, dy);
    }

    /// Store a kind without seeding. Void removes the cell. Positions
    /// outside [`COORD_LIMIT`](crate::geometry::COORD_LIMIT) are never stored.
    pub(crate) fn place(&mut self, pos: Point, kind: EntityKind) {
        if !pos.in_bounds() {
            debug!(at = %pos, kind = %kind, "out-of-range cell dropped");
            return;
        }
        if kind.is_void() {
            self.cells.remove(&pos);
        } else {
            self.cells.insert(pos, kind);
        }
    }

    /// Snapshot of every non-void cell.
    pub fn cells(&self) -> &BTreeMap<Point, EntityKind> {
        &self.cells
    }

    /// Replace the cell contents with exactly `cells`, without seeding.
    pub fn restore_cells(&mut self, cells: &BTreeMap<Point, EntityKind>) {
        self.cells.clear();
        for (&pos, &kind) in cells {
            self.place(pos, kind);
        }
        self.refresh_selection();
    }

    // -- Step --

    /// Advance the grid, and its sub-grids as scheduled, by one generation.
    pub fn update(&mut self) {
        self.push_inbound_links();
        self.step_sub_grids();

        let mut actions = std::mem::take(&mut self.actions);
        for (&pos, &kind) in &self.cells {
            kind.step(self, pos, &mut actions);
        }
        let queued = actions.len();
        for action in actions.drain() {
            match action {
                Action::Delete(pos) => self.delete(pos),
                Action::Insert(pos, kind) => self.insert(pos, kind),
            }
        }
        self.actions = actions;

        self.phase = sim::next_phase(self.phase, self.speed);
        self.generation += 1;

        self.pull_outbound_links();
        self.refresh_selection();

        debug!(
            generation = self.generation,
            population = self.cells.len(),
            actions = queued,
            "generation committed"
        );
    }

    /// Write this grid's value at every IN link into the bound sub-grid port.
    fn push_inbound_links(&mut self) {
        let Self {
            cells,
            links,
            sub_grids,
            ..
        } = self;
        for (pos, link) in links.iter() {
            if link.direction != LinkDirection::In {
                continue;
            }
            let kind = cells.get(pos).copied().unwrap_or_default();
            if let Some(linked) = sub_grids.get_mut(link.grid) {
                linked.grid.insert(link.port, kind);
            }
        }
    }

    fn step_sub_grids(&mut self) {
        let (speed, phase) = (self.speed, self.phase);
        for linked in self.sub_grids.values_mut() {
            let runs = sim::scheduled_runs(speed, linked.grid.speed, phase);
            for _ in 0..runs {
                linked.grid.update();
            }
        }
    }

    /// Copy every OUT port value of the sub-grids into this grid.
    fn pull_outbound_links(&mut self) {
        let incoming: Vec<(Point, EntityKind)> = self
            .links
            .iter()
            .filter(|(_, link)| link.direction == LinkDirection::Out)
            .filter_map(|(&pos, link)| {
                let linked = self.sub_grids.get(link.grid)?;
                Some((pos, linked.grid.kind_at(link.port)))
            })
            .collect();
        for (pos, kind) in incoming {
            self.insert(pos, kind);
        }
    }
}
