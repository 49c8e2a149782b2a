//! Clocking helpers: speed-ratio scheduling of sub-grids and the state hash.
//!
//! A grid with speed `S` keeps a phase counter in `[0, S)`. A sub-grid with
//! speed `Sg` is stepped so that it advances exactly `Sg` generations for
//! every `S` generations of its parent, spread as evenly as integer
//! division allows. No floating point is involved.

use crate::entity::EntityKind;
use crate::geometry::Point;

// ---------------------------------------------------------------------------
// Ratio scheduling
// ---------------------------------------------------------------------------

/// Number of sub-grid updates to run on the parent tick at `phase`.
///
/// `parent_speed` and `child_speed` are clamped to at least 1 and `phase`
/// is taken modulo `parent_speed`.
pub fn scheduled_runs(parent_speed: u32, child_speed: u32, phase: u32) -> u64 {
    let parent = u64::from(parent_speed.max(1));
    let child = u64::from(child_speed.max(1));
    let phase = u64::from(phase) % parent;
    ((phase + 1) * child) / parent - (phase * child) / parent
}

/// Advance a phase counter by one tick, wrapping at `speed`.
pub fn next_phase(phase: u32, speed: u32) -> u32 {
    let speed = speed.max(1);
    (phase + 1) % speed
}

// ---------------------------------------------------------------------------
// State hash
// ---------------------------------------------------------------------------

/// A simple deterministic hash of grid state for comparing runs.
///
/// Uses FNV-1a (64-bit) for speed and simplicity. Not cryptographic.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct StateHash(pub u64);

impl StateHash {
    const FNV_OFFSET: u64 = 0xcbf29ce484222325;
    const FNV_PRIME: u64 = 0x100000001b3;

    /// Start a new hash.
    pub fn new() -> Self {
        Self(Self::FNV_OFFSET)
    }

    /// Feed bytes into the hash.
    pub fn write(&mut self, bytes: &[u8]) {
        for &b in bytes {
            self.0 ^= b as u64;
            self.0 = self.0.wrapping_mul(Self::FNV_PRIME);
        }
    }

    /// Feed one cell into the hash.
    pub fn write_cell(&mut self, pos: Point, kind: EntityKind) {
        self.write(&pos.x.to_le_bytes());
        self.write(&pos.y.to_le_bytes());
        self.write(&[kind.id()]);
    }

    /// Finalize and return the hash value.
    pub fn finish(self) -> u64 {
        self.0
    }
}

impl Default for StateHash {
    fn default() -> Self {
        Self::new()
    }
}
