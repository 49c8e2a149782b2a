//! The entity catalog: the closed set of kinds a cell can hold.
//!
//! Kinds are stateless behavior descriptors. A cell stores only its kind;
//! everything a kind does is a pure function of the kind and the pre-step
//! grid it reads. [`EntityKind::step`] reads neighbors and enqueues actions,
//! it never writes to the grid.

use serde::{Deserialize, Serialize};

use crate::action::ActionQueue;
use crate::geometry::{Direction, Point, Rotation};
use crate::grid::Grid;

// ---------------------------------------------------------------------------
// Neighborhood seeding
// ---------------------------------------------------------------------------

/// Which neighbors get seeded when a kind is inserted.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Neighborhood {
    /// All 8 surrounding cells.
    Moore,
    /// The East and West cells only.
    OneD,
}

impl Neighborhood {
    pub fn directions(self) -> &'static [Direction] {
        match self {
            Neighborhood::Moore => &Direction::MOORE,
            Neighborhood::OneD => &Direction::ROW,
        }
    }
}

/// Seeding rule of a kind: its neighborhood and the companion kind written
/// into it.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Seeding {
    pub neighborhood: Neighborhood,
    pub companion: EntityKind,
}

// ---------------------------------------------------------------------------
// EntityKind
// ---------------------------------------------------------------------------

/// Every kind a cell can hold. Discriminants are the persisted type ids.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Default, Serialize, Deserialize,
)]
pub enum EntityKind {
    #[default]
    Void = 0,
    Spark = 1,
    ArrowUp = 2,
    ArrowDown = 3,
    ArrowRight = 4,
    ArrowLeft = 5,
    LivingCell = 6,
    DeadCell = 7,
    MonoOne = 8,
    MonoZero = 9,
}

impl EntityKind {
    /// All kinds in type-id order.
    pub const ALL: [EntityKind; 10] = [
        EntityKind::Void,
        EntityKind::Spark,
        EntityKind::ArrowUp,
        EntityKind::ArrowDown,
        EntityKind::ArrowRight,
        EntityKind::ArrowLeft,
        EntityKind::LivingCell,
        EntityKind::DeadCell,
        EntityKind::MonoOne,
        EntityKind::MonoZero,
    ];

    /// Stable numeric type id.
    pub const fn id(self) -> u8 {
        self as u8
    }

    pub fn from_id(id: u8) -> Option<Self> {
        Self::ALL.get(usize::from(id)).copied()
    }

    /// Stable lowercase name, used as the key in saved grids.
    pub const fn name(self) -> &'static str {
        match self {
            EntityKind::Void => "void",
            EntityKind::Spark => "spark",
            EntityKind::ArrowUp => "arrowup",
            EntityKind::ArrowDown => "arrowdown",
            EntityKind::ArrowRight => "arrowright",
            EntityKind::ArrowLeft => "arrowleft",
            EntityKind::LivingCell => "livingcell",
            EntityKind::DeadCell => "deadcell",
            EntityKind::MonoOne => "monoone",
            EntityKind::MonoZero => "monozero",
        }
    }

    pub fn from_name(name: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|kind| kind.name() == name)
    }

    pub const fn is_void(self) -> bool {
        matches!(self, EntityKind::Void)
    }

    /// Neighbor seeding performed when this kind is inserted, if any.
    pub const fn seeding(self) -> Option<Seeding> {
        match self {
            EntityKind::LivingCell => Some(Seeding {
                neighborhood: Neighborhood::Moore,
                companion: EntityKind::DeadCell,
            }),
            EntityKind::MonoOne => Some(Seeding {
                neighborhood: Neighborhood::OneD,
                companion: EntityKind::MonoZero,
            }),
            _ => None,
        }
    }

    /// What a deletion leaves behind. Living cells die instead of vanishing
    /// so they stay eligible for resurrection.
    pub const fn residue(self) -> EntityKind {
        match self {
            EntityKind::LivingCell => EntityKind::DeadCell,
            _ => EntityKind::Void,
        }
    }

    // -- Behavior --

    /// Evaluate this kind at `pos` against the pre-step `grid`, queueing any
    /// resulting actions.
    pub fn step(self, grid: &Grid, pos: Point, actions: &mut ActionQueue) {
        match self {
            EntityKind::Void => {}
            EntityKind::Spark => actions.delete(pos),
            EntityKind::ArrowUp
            | EntityKind::ArrowDown
            | EntityKind::ArrowRight
            | EntityKind::ArrowLeft => step_arrow(self, grid, pos, actions),
            EntityKind::LivingCell => {
                let alive = living_neighbors(grid, pos);
                if alive != 2 && alive != 3 {
                    actions.delete(pos);
                }
            }
            EntityKind::DeadCell => {
                if living_neighbors(grid, pos) == 3 {
                    actions.insert(pos, EntityKind::LivingCell);
                }
            }
            EntityKind::MonoOne => step_mono(true, grid, pos, actions),
            EntityKind::MonoZero => step_mono(false, grid, pos, actions),
        }
    }

    // -- Transformations --

    /// The kind after rotating its cell by a quarter turn.
    pub fn rotated(self, rotation: Rotation) -> Self {
        let mut kind = self;
        for _ in 0..rotation.quarter_turns() {
            kind = match kind {
                EntityKind::ArrowUp => EntityKind::ArrowRight,
                EntityKind::ArrowRight => EntityKind::ArrowDown,
                EntityKind::ArrowDown => EntityKind::ArrowLeft,
                EntityKind::ArrowLeft => EntityKind::ArrowUp,
                other => other,
            };
        }
        kind
    }

    /// The kind after mirroring its cell left-to-right.
    pub const fn flipped_horizontal(self) -> Self {
        match self {
            EntityKind::ArrowLeft => EntityKind::ArrowRight,
            EntityKind::ArrowRight => EntityKind::ArrowLeft,
            other => other,
        }
    }

    /// The kind after mirroring its cell top-to-bottom.
    pub const fn flipped_vertical(self) -> Self {
        match self {
            EntityKind::ArrowUp => EntityKind::ArrowDown,
            EntityKind::ArrowDown => EntityKind::ArrowUp,
            other => other,
        }
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

// ---------------------------------------------------------------------------
// Behavior helpers
// ---------------------------------------------------------------------------

fn living_neighbors(grid: &Grid, pos: Point) -> usize {
    Direction::MOORE
        .iter()
        .filter(|&&dir| grid.kind_at(pos.offset(dir)) == EntityKind::LivingCell)
        .count()
}

/// Leading direction, trailing direction and the two laterals of an arrow.
fn arrow_axes(kind: EntityKind) -> Option<(Direction, Direction, [Direction; 2])> {
    match kind {
        EntityKind::ArrowUp => Some((Direction::N, Direction::S, [Direction::E, Direction::W])),
        EntityKind::ArrowDown => Some((Direction::S, Direction::N, [Direction::E, Direction::W])),
        EntityKind::ArrowRight => Some((Direction::E, Direction::W, [Direction::N, Direction::S])),
        EntityKind::ArrowLeft => Some((Direction::W, Direction::E, [Direction::N, Direction::S])),
        _ => None,
    }
}

/// An arrow is armed by exactly one spark among its trailing and lateral
/// neighbors. When armed it fires a spark forward, provided the leading
/// cell is empty or already a spark.
fn step_arrow(kind: EntityKind, grid: &Grid, pos: Point, actions: &mut ActionQueue) {
    let Some((lead, trail, laterals)) = arrow_axes(kind) else {
        return;
    };

    let triggers = [trail, laterals[0], laterals[1]]
        .into_iter()
        .filter(|&dir| grid.kind_at(pos.offset(dir)) == EntityKind::Spark)
        .count();
    if triggers != 1 {
        return;
    }

    let target = pos.offset(lead);
    if matches!(grid.kind_at(target), EntityKind::Void | EntityKind::Spark) {
        actions.insert(target, EntityKind::Spark);
    }
}

/// Elementary automaton rule indexed by the (West, own, East) bits.
/// This is Wolfram rule 30.
const MONO_RULE: [bool; 8] = [
    false, // 000
    true,  // 001
    true,  // 010
    true,  // 011
    true,  // 100
    false, // 101
    false, // 110
    false, // 111
];

fn step_mono(own: bool, grid: &Grid, pos: Point, actions: &mut ActionQueue) {
    let below = pos.offset(Direction::S);
    if !grid.kind_at(below).is_void() {
        return;
    }

    // A neighbor that is neither mono nor void matches no pattern.
    let (Some(west), Some(east)) = (
        mono_bit(grid.kind_at(pos.offset(Direction::W))),
        mono_bit(grid.kind_at(pos.offset(Direction::E))),
    ) else {
        actions.insert(below, EntityKind::MonoZero);
        return;
    };
    let index = (usize::from(west) << 2) | (usize::from(own) << 1) | usize::from(east);

    let next = if MONO_RULE[index] {
        EntityKind::MonoOne
    } else {
        EntityKind::MonoZero
    };
    actions.insert(below, next);
}

/// Void reads as an empty mono cell.
fn mono_bit(kind: EntityKind) -> Option<bool> {
    match kind {
        EntityKind::MonoOne => Some(true),
        EntityKind::MonoZero | EntityKind::Void => Some(false),
        _ => None,
    }
}
