//! CAE Core -- a sparse cellular-automaton engine with embeddable sub-grids.
//!
//! A [`grid::Grid`] maps integer points to entity kinds. Kinds are stateless
//! rules: on every step each non-void cell reads the pre-step grid and
//! queues deletions and insertions, which are then committed together.
//!
//! # Tick Pipeline
//!
//! Each call to [`grid::Grid::update`] advances a grid by one generation:
//!
//! 1. **Inbound links** -- copy values into sub-grid IN ports.
//! 2. **Sub-grids** -- step each sub-grid by its speed ratio.
//! 3. **Evaluate** -- every cell queues actions against the snapshot.
//! 4. **Commit** -- all deletions, then all insertions.
//! 5. **Clock** -- advance the phase and generation counters.
//! 6. **Outbound links** -- copy sub-grid OUT ports back.
//!
//! # Key Types
//!
//! - [`grid::Grid`] -- Sparse cell map, step/commit cycle and editing.
//! - [`entity::EntityKind`] -- The closed catalog of cell kinds and rules.
//! - [`action::ActionQueue`] -- Deduplicated deletions and insertions.
//! - [`link::LinkDirection`] -- IN/OUT ports binding a grid to sub-grids.
//! - [`selection::Selection`] -- Selected cells and their transforms.
//! - [`persist::GridDocument`] -- The `.cg` JSON file format.
//! - [`config::EngineConfig`] -- TOML-loadable engine tunables.

pub mod action;
pub mod config;
pub mod entity;
pub mod geometry;
pub mod grid;
pub mod id;
pub mod link;
pub mod persist;
pub mod selection;
pub mod sim;

#[cfg(any(test, feature = "test-utils"))]
pub mod test_utils;
