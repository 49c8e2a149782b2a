//! Pending action queue filled during the evaluation pass.
//!
//! Entities never touch the grid while it is being evaluated. They enqueue
//! deletions and insertions here, and the grid applies them atomically at
//! the commit: all deletions first, then all insertions.

use std::collections::{BTreeMap, BTreeSet};

use crate::entity::EntityKind;
use crate::geometry::Point;

// ---------------------------------------------------------------------------
// Action enum
// ---------------------------------------------------------------------------

/// A single grid mutation requested by an entity.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    /// Delete whatever occupies the position.
    Delete(Point),
    /// Insert a kind at the position.
    Insert(Point, EntityKind),
}

// ---------------------------------------------------------------------------
// ActionQueue
// ---------------------------------------------------------------------------

/// Deduplicated set of pending actions, keyed by position.
///
/// A position queued for deletion more than once is deleted once. For
/// insertions the first request for a position wins and later requests
/// for the same position are dropped.
#[derive(Debug, Clone, Default)]
pub struct ActionQueue {
    deletions: BTreeSet<Point>,
    insertions: BTreeMap<Point, EntityKind>,
}

impl ActionQueue {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a single action.
    pub fn push(&mut self, action: Action) {
        match action {
            Action::Delete(pos) => self.delete(pos),
            Action::Insert(pos, kind) => self.insert(pos, kind),
        }
    }

    /// Queue several actions at once.
    pub fn push_batch(&mut self, actions: impl IntoIterator<Item = Action>) {
        for action in actions {
            self.push(action);
        }
    }

    pub fn delete(&mut self, pos: Point) {
        self.deletions.insert(pos);
    }

    pub fn insert(&mut self, pos: Point, kind: EntityKind) {
        self.insertions.entry(pos).or_insert(kind);
    }

    /// Drain every pending action in commit order: deletions, then
    /// insertions, each sorted by position.
    pub fn drain(&mut self) -> Vec<Action> {
        let deletions = std::mem::take(&mut self.deletions);
        let insertions = std::mem::take(&mut self.insertions);
        deletions
            .into_iter()
            .map(Action::Delete)
            .chain(
                insertions
                    .into_iter()
                    .map(|(pos, kind)| Action::Insert(pos, kind)),
            )
            .collect()
    }

    /// Number of pending actions.
    pub fn len(&self) -> usize {
        self.deletions.len() + self.insertions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.deletions.is_empty() && self.insertions.is_empty()
    }

    /// Drop every pending action.
    pub fn clear(&mut self) {
        self.deletions.clear();
        self.insertions.clear();
    }
}

// ===========================================================================
// Tests
// ===========================================================================
