//! Link fabric: ports, links to embedded sub-grids, and the sub-grid
//! registry.
//!
//! A grid exposes *my links* (ports on its own cells). An embedding grid
//! binds one of its own positions to such a port with a foreign link:
//!
//! - `In` -- before the sub-grid steps, the embedding grid's value at the
//!   link position is written into the sub-grid port.
//! - `Out` -- after the embedding grid commits, the sub-grid port value is
//!   written back into the link position.

use std::path::Path;

use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geometry::Point;
use crate::grid::Grid;
use crate::id::SubGridId;
use crate::persist::LoadError;

// ---------------------------------------------------------------------------
// Types
// ---------------------------------------------------------------------------

/// Direction of data flow through a port, seen from the sub-grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub enum LinkDirection {
    #[serde(rename = "IN")]
    In,
    #[serde(rename = "OUT")]
    Out,
}

impl LinkDirection {
    pub const fn name(self) -> &'static str {
        match self {
            LinkDirection::In => "IN",
            LinkDirection::Out => "OUT",
        }
    }
}

/// A link from a position on this grid to a port of an embedded sub-grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ForeignLink {
    pub direction: LinkDirection,
    pub grid: SubGridId,
    pub port: Point,
}

/// Where a new link points.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LinkTarget {
    /// A port of this grid.
    Local,
    /// A port of an embedded sub-grid.
    Foreign { grid: SubGridId, port: Point },
}

/// An embedded sub-grid and the name it is saved under.
#[derive(Debug, Clone)]
pub struct LinkedGrid {
    /// File name relative to the embedding grid's directory.
    pub name: String,
    pub grid: Grid,
}

/// Summary of an embedded sub-grid for listing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkedGridInfo<'a> {
    pub id: SubGridId,
    pub name: &'a str,
    pub ports: Vec<(Point, LinkDirection)>,
    pub speed: u32,
}

/// Errors from link operations.
#[derive(Debug, thiserror::Error)]
pub enum LinkError {
    #[error("sub-grid {0:?} is not registered")]
    UnknownGrid(SubGridId),
}

// ---------------------------------------------------------------------------
// Grid link operations
// ---------------------------------------------------------------------------

impl Grid {
    /// Record a port at `pos`. A position holds at most one link, so any
    /// previous link there is replaced.
    pub fn insert_link(
        &mut self,
        pos: Point,
        direction: LinkDirection,
        target: LinkTarget,
    ) -> Result<(), LinkError> {
        match target {
            LinkTarget::Local => {
                self.links.remove(&pos);
                self.my_links.insert(pos, direction);
            }
            LinkTarget::Foreign { grid, port } => {
                if !self.sub_grids.contains_key(grid) {
                    return Err(LinkError::UnknownGrid(grid));
                }
                self.my_links.remove(&pos);
                self.links.insert(
                    pos,
                    ForeignLink {
                        direction,
                        grid,
                        port,
                    },
                );
            }
        }
        Ok(())
    }

    /// Remove the link at `pos` from whichever table holds it. Returns
    /// whether anything was removed.
    pub fn delete_link(&mut self, pos: Point) -> bool {
        let local = self.my_links.remove(&pos).is_some();
        let foreign = self.links.remove(&pos).is_some();
        local || foreign
    }

    /// Remove every port, link and sub-grid.
    pub fn clear_links(&mut self) {
        self.my_links.clear();
        self.links.clear();
        self.sub_grids.clear();
    }

    /// Ports owned by this grid.
    pub fn my_links(&self) -> impl Iterator<Item = (Point, LinkDirection)> + '_ {
        self.my_links.iter().map(|(&pos, &dir)| (pos, dir))
    }

    /// Links bound to sub-grid ports.
    pub fn links(&self) -> impl Iterator<Item = (Point, ForeignLink)> + '_ {
        self.links.iter().map(|(&pos, &link)| (pos, link))
    }

    // -- Sub-grid registry --

    /// Load `path` and register it as a sub-grid. The sub-grid is saved
    /// under its file name.
    pub fn insert_grid(&mut self, path: impl AsRef<Path>) -> Result<SubGridId, LoadError> {
        let path = path.as_ref();
        let grid = self.load_sub_grid(path)?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        Ok(self.embed_grid(grid, name))
    }

    /// Register an in-memory grid as a sub-grid.
    pub fn embed_grid(&mut self, grid: Grid, name: impl Into<String>) -> SubGridId {
        let name = name.into();
        debug!(name = %name, speed = grid.speed, "sub-grid embedded");
        self.sub_grids.insert(LinkedGrid { name, grid })
    }

    /// Remove a sub-grid and every link that references it.
    pub fn delete_grid(&mut self, id: SubGridId) -> Option<LinkedGrid> {
        let removed = self.sub_grids.remove(id)?;
        self.links.retain(|_, link| link.grid != id);
        Some(removed)
    }

    /// Set the speed multiplier of a sub-grid.
    pub fn set_grid_speed(&mut self, id: SubGridId, speed: u32) -> Result<(), LinkError> {
        let linked = self
            .sub_grids
            .get_mut(id)
            .ok_or(LinkError::UnknownGrid(id))?;
        linked.grid.set_speed(speed);
        Ok(())
    }

    pub fn sub_grid(&self, id: SubGridId) -> Option<&Grid> {
        self.sub_grids.get(id).map(|linked| &linked.grid)
    }

    pub fn sub_grid_mut(&mut self, id: SubGridId) -> Option<&mut Grid> {
        self.sub_grids.get_mut(id).map(|linked| &mut linked.grid)
    }

    /// Every embedded sub-grid with its name, ports and speed.
    pub fn linked_grids(&self) -> Vec<LinkedGridInfo<'_>> {
        self.sub_grids
            .iter()
            .map(|(id, linked)| LinkedGridInfo {
                id,
                name: &linked.name,
                ports: linked.grid.my_links().collect(),
                speed: linked.grid.speed,
            })
            .collect()
    }

    /// Reload every file-backed sub-grid from disk and prune links whose
    /// port no longer exists. Returns the number of links pruned.
    ///
    /// Sub-grids that were embedded from memory are left untouched. If any
    /// file fails to load, no sub-grid is replaced.
    pub fn update_linked_grids(&mut self) -> Result<usize, LoadError> {
        let mut reloaded = Vec::new();
        for (id, linked) in &self.sub_grids {
            if let Some(source) = &linked.grid.source {
                reloaded.push((id, self.load_sub_grid(source)?));
            }
        }

        for (id, mut fresh) in reloaded {
            if let Some(linked) = self.sub_grids.get_mut(id) {
                fresh.set_speed(linked.grid.speed);
                linked.grid = fresh;
            }
        }

        Ok(self.prune_dangling_links())
    }

    /// Drop links whose target port is not a port of the sub-grid.
    pub(crate) fn prune_dangling_links(&mut self) -> usize {
        let Self {
            links, sub_grids, ..
        } = self;
        let before = links.len();
        links.retain(|pos, link| {
            let alive = sub_grids
                .get(link.grid)
                .is_some_and(|linked| linked.grid.my_links.contains_key(&link.port));
            if !alive {
                warn!(at = %pos, port = %link.port, "pruning link to missing port");
            }
            alive
        });
        before - links.len()
    }
}
