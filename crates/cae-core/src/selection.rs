//! Selection bookkeeping and the geometric transforms applied to it.
//!
//! The editor hands the engine a selection *area* (the cells under a drag
//! rectangle). From that area the grid selects the cells holding live
//! entities and, separately, any ports or links. Transforms pivot around
//! the bounding box of the area.

use tracing::debug;

use crate::entity::EntityKind;
use crate::geometry::{Bounds, Point, Rotation};
use crate::grid::Grid;

// ---------------------------------------------------------------------------
// Selection
// ---------------------------------------------------------------------------

/// Current selection of a grid.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Selection {
    /// Every point of the selection area.
    area: Vec<Point>,
    /// Area points holding a selectable entity.
    entities: Vec<Point>,
    /// Area points holding one of this grid's own ports.
    my_links: Vec<Point>,
    /// Area points holding a link to a sub-grid.
    links: Vec<Point>,
}

impl Selection {
    pub fn area(&self) -> &[Point] {
        &self.area
    }

    pub fn entities(&self) -> &[Point] {
        &self.entities
    }

    pub fn my_links(&self) -> &[Point] {
        &self.my_links
    }

    pub fn links(&self) -> &[Point] {
        &self.links
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty() && self.my_links.is_empty() && self.links.is_empty()
    }

    pub(crate) fn shift(&mut self, dx: i32, dy: i32) {
        for list in [
            &mut self.area,
            &mut self.entities,
            &mut self.my_links,
            &mut self.links,
        ] {
            for p in list.iter_mut() {
                *p = p.shifted(dx, dy);
            }
        }
    }
}

/// Dead cells are background and are never picked up by a selection.
fn selectable(kind: EntityKind) -> bool {
    !matches!(kind, EntityKind::Void | EntityKind::DeadCell)
}

// ---------------------------------------------------------------------------
// Grid selection operations
// ---------------------------------------------------------------------------

impl Grid {
    /// Select the live entities, ports and links inside `area`.
    pub fn select_entities(&mut self, area: impl IntoIterator<Item = Point>) {
        self.selection.area = area.into_iter().collect();
        self.refresh_selection();
    }

    /// Re-derive the selected points from the current area.
    pub(crate) fn refresh_selection(&mut self) {
        let Selection {
            area,
            entities,
            my_links,
            links,
        } = &mut self.selection;
        entities.clear();
        my_links.clear();
        links.clear();

        for &p in area.iter() {
            if selectable(self.cells.get(&p).copied().unwrap_or_default()) {
                if !entities.contains(&p) {
                    entities.push(p);
                }
            } else if self.my_links.contains_key(&p) {
                my_links.push(p);
            } else if self.links.contains_key(&p) {
                links.push(p);
            }
        }
    }

    pub fn selection(&self) -> &Selection {
        &self.selection
    }

    /// Positions of the selected entities.
    pub fn selected_points(&self) -> Vec<Point> {
        self.selection.entities.clone()
    }

    /// The selected entities with their kinds.
    pub fn entities_to_copy(&self) -> Vec<(Point, EntityKind)> {
        self.selection
            .entities
            .iter()
            .map(|&p| (p, self.kind_at(p)))
            .collect()
    }

    pub fn clear_selection(&mut self) {
        self.selection = Selection::default();
    }

    /// Delete the selected entities, or with `links` set the selected
    /// ports and links. Returns whether anything was selected.
    pub fn delete_selected(&mut self, links: bool) -> bool {
        let targets: Vec<Point> = if links {
            self.selection
                .my_links
                .iter()
                .chain(&self.selection.links)
                .copied()
                .collect()
        } else {
            self.selection.entities.clone()
        };
        for &p in &targets {
            if links {
                self.delete_link(p);
            } else {
                self.delete(p);
            }
        }
        self.refresh_selection();
        !targets.is_empty()
    }

    /// Rotate the selected entities around the selection area centre.
    /// Degrees that are not a multiple of 90 are ignored.
    pub fn rotate(&mut self, degrees: i32) {
        let Some(rotation) = Rotation::from_degrees(degrees) else {
            debug!(degrees, "unsupported rotation ignored");
            return;
        };
        self.transform_selection(
            |bounds, p| bounds.rotate_point(p, rotation),
            |kind| kind.rotated(rotation),
        );
    }

    /// Mirror the selected entities left-to-right.
    pub fn flip_horizontal(&mut self) {
        self.transform_selection(|bounds, p| bounds.mirror_x(p), EntityKind::flipped_horizontal);
    }

    /// Mirror the selected entities top-to-bottom.
    pub fn flip_vertical(&mut self) {
        self.transform_selection(|bounds, p| bounds.mirror_y(p), EntityKind::flipped_vertical);
    }

    /// Move the selected entities by `(dx, dy)`, overwriting the targets.
    pub fn move_selected(&mut self, dx: i32, dy: i32) {
        if dx == 0 && dy == 0 {
            return;
        }
        self.transform_selection(|_, p| p.shifted(dx, dy), |kind| kind);
    }

    /// Delete each selected entity and write its transformed kind at its
    /// transformed position. The selection area follows.
    fn transform_selection(
        &mut self,
        move_point: impl Fn(&Bounds, Point) -> Point,
        map_kind: impl Fn(EntityKind) -> EntityKind,
    ) {
        if self.selection.entities.is_empty() {
            return;
        }
        let Some(bounds) = Bounds::from_points(&self.selection.area) else {
            return;
        };

        let moved: Vec<(Point, EntityKind)> = self
            .selection
            .entities
            .iter()
            .map(|&p| (move_point(&bounds, p), map_kind(self.kind_at(p))))
            .collect();

        let old = std::mem::take(&mut self.selection.entities);
        for p in old {
            self.delete(p);
        }
        for &(p, kind) in &moved {
            self.place(p, kind);
        }

        self.selection.area = self
            .selection
            .area
            .iter()
            .map(|&p| move_point(&bounds, p))
            .collect();
        self.refresh_selection();
    }
}
