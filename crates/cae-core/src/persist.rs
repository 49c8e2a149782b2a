//! Saving and loading grids as `.cg` JSON documents.
//!
//! Document layout:
//!
//! ```json
//! {
//!   "livingcell": [[0, 0], [1, 0]],
//!   "my_links": { "IN": [[0, 5]], "OUT": [[9, 5]] },
//!   "links": { "3,4": ["IN", 1, [0, 5]] },
//!   "linked_names": { "1": "adder.cg" },
//!   "speed": 1,
//!   "linked_speeds": { "1": 2 }
//! }
//! ```
//!
//! One array per non-void kind present, keyed by the kind's name. Keys that
//! name no known kind are skipped on load. Sub-grid files in `linked_names`
//! resolve relative to the directory of the containing file and are loaded
//! recursively. Cells are restored by exact placement, without neighborhood
//! seeding, so a store/load round trip reproduces the cell set.

use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::Value;
use slotmap::Key;
use tracing::{debug, info, warn};

use crate::config::EngineConfig;
use crate::entity::EntityKind;
use crate::geometry::Point;
use crate::grid::Grid;
use crate::id::SubGridId;
use crate::link::{ForeignLink, LinkDirection};

// ---------------------------------------------------------------------------
// Error types
// ---------------------------------------------------------------------------

/// Errors that can occur while loading a grid.
#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to read {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid grid file {path}: {source}")]
    Json {
        path: PathBuf,
        source: serde_json::Error,
    },
    #[error("invalid grid document: {0}")]
    Parse(#[source] serde_json::Error),
    #[error("malformed cell list for '{key}': {source}")]
    MalformedCell {
        key: String,
        source: serde_json::Error,
    },
    #[error("position ({x}, {y}) under '{key}' is outside the coordinate limit")]
    CoordinateOutOfRange { key: String, x: i32, y: i32 },
    #[error("malformed link position '{key}'")]
    MalformedLinkKey { key: String },
    #[error("malformed sub-grid id '{key}'")]
    MalformedGridId { key: String },
    #[error("link references sub-grid {id} which has no linked name")]
    MissingLinkedName { id: u64 },
    #[error("sub-grid {path} embeds itself")]
    CyclicEmbedding { path: PathBuf },
    #[error("sub-grids nested deeper than {depth} levels")]
    NestingTooDeep { depth: usize },
}

/// Errors that can occur while storing a grid.
#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("serialization error: {0}")]
    Json(#[from] serde_json::Error),
}

// ---------------------------------------------------------------------------
// Document types
// ---------------------------------------------------------------------------

/// Serialized form of a grid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GridDocument {
    #[serde(default)]
    pub my_links: MyLinksDocument,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub links: BTreeMap<String, LinkRecord>,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub linked_names: BTreeMap<String, String>,
    #[serde(default = "default_speed")]
    pub speed: u32,
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    pub linked_speeds: BTreeMap<String, u32>,
    /// Cell lists keyed by kind name, plus any keys this version does not
    /// understand.
    #[serde(flatten)]
    pub entities: BTreeMap<String, Value>,
}

impl Default for GridDocument {
    fn default() -> Self {
        Self {
            my_links: MyLinksDocument::default(),
            links: BTreeMap::new(),
            linked_names: BTreeMap::new(),
            speed: default_speed(),
            linked_speeds: BTreeMap::new(),
            entities: BTreeMap::new(),
        }
    }
}

/// Ports of the grid itself, grouped by direction.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct MyLinksDocument {
    #[serde(rename = "IN", default, skip_serializing_if = "Vec::is_empty")]
    pub inbound: Vec<[i32; 2]>,
    #[serde(rename = "OUT", default, skip_serializing_if = "Vec::is_empty")]
    pub outbound: Vec<[i32; 2]>,
}

/// A link entry: direction, numeric sub-grid id, and the port position on
/// the sub-grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct LinkRecord(pub LinkDirection, pub u64, pub [i32; 2]);

fn default_speed() -> u32 {
    1
}

// ---------------------------------------------------------------------------
// Load context
// ---------------------------------------------------------------------------

/// Files currently being loaded, outermost first. Guards against files that
/// embed each other and against runaway nesting.
struct LoadContext {
    stack: Vec<PathBuf>,
    max_depth: usize,
}

impl LoadContext {
    fn new(max_depth: usize) -> Self {
        Self {
            stack: Vec::new(),
            max_depth: max_depth.max(1),
        }
    }

    fn enter(&mut self, path: &Path) -> Result<(), LoadError> {
        let canonical = path.canonicalize().map_err(|source| LoadError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        if self.stack.contains(&canonical) {
            return Err(LoadError::CyclicEmbedding {
                path: path.to_path_buf(),
            });
        }
        if self.stack.len() >= self.max_depth {
            return Err(LoadError::NestingTooDeep {
                depth: self.max_depth,
            });
        }
        self.stack.push(canonical);
        Ok(())
    }

    fn leave(&mut self) {
        self.stack.pop();
    }
}

fn read_grid(path: &Path, ctx: &mut LoadContext) -> Result<Grid, LoadError> {
    ctx.enter(path)?;
    let result = read_grid_entered(path, ctx);
    ctx.leave();
    if let Err(err) = &result {
        warn!(path = %path.display(), error = %err, "grid load failed");
    }
    result
}

fn read_grid_entered(path: &Path, ctx: &mut LoadContext) -> Result<Grid, LoadError> {
    let text = std::fs::read_to_string(path).map_err(|source| LoadError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let doc: GridDocument = serde_json::from_str(&text).map_err(|source| LoadError::Json {
        path: path.to_path_buf(),
        source,
    })?;

    let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
    let mut grid = build_grid(doc, base_dir, ctx)?;
    grid.source = Some(path.to_path_buf());

    info!(
        path = %path.display(),
        cells = grid.population(),
        sub_grids = grid.sub_grids.len(),
        "grid loaded"
    );
    Ok(grid)
}

fn build_grid(doc: GridDocument, base_dir: &Path, ctx: &mut LoadContext) -> Result<Grid, LoadError> {
    let mut grid = Grid::new();
    grid.max_nesting_depth = ctx.max_depth;
    grid.set_speed(doc.speed);

    for (key, value) in doc.entities {
        let Some(kind) = EntityKind::from_name(&key) else {
            debug!(key = %key, "unknown key skipped");
            continue;
        };
        let points: Vec<[i32; 2]> = match serde_json::from_value(value) {
            Ok(points) => points,
            Err(source) => return Err(LoadError::MalformedCell { key, source }),
        };
        for p in points {
            grid.place(checked_point(&key, p.into())?, kind);
        }
    }

    for p in doc.my_links.inbound {
        grid.my_links.insert(checked_point("my_links", p.into())?, LinkDirection::In);
    }
    for p in doc.my_links.outbound {
        grid.my_links.insert(checked_point("my_links", p.into())?, LinkDirection::Out);
    }

    let mut registered: BTreeMap<u64, SubGridId> = BTreeMap::new();
    for (key, name) in &doc.linked_names {
        let id: u64 = key
            .parse()
            .map_err(|_| LoadError::MalformedGridId { key: key.clone() })?;
        let mut sub = read_grid(&base_dir.join(name), ctx)?;
        if let Some(&speed) = doc.linked_speeds.get(key) {
            sub.set_speed(speed);
        }
        registered.insert(id, grid.embed_grid(sub, name.clone()));
    }

    for (key, LinkRecord(direction, id, port)) in doc.links {
        let pos = checked_point(&key, parse_link_key(&key)?)?;
        let port = checked_point(&key, Point::from(port))?;
        let sub_id = *registered
            .get(&id)
            .ok_or(LoadError::MissingLinkedName { id })?;
        grid.my_links.remove(&pos);
        grid.links.insert(
            pos,
            ForeignLink {
                direction,
                grid: sub_id,
                port,
            },
        );
    }
    grid.prune_dangling_links();

    Ok(grid)
}

/// Reject positions a grid could not step without overflowing.
fn checked_point(key: &str, p: Point) -> Result<Point, LoadError> {
    if p.in_bounds() {
        Ok(p)
    } else {
        Err(LoadError::CoordinateOutOfRange {
            key: key.to_string(),
            x: p.x,
            y: p.y,
        })
    }
}

/// Parse a `"x,y"` link key.
fn parse_link_key(key: &str) -> Result<Point, LoadError> {
    let malformed = || LoadError::MalformedLinkKey {
        key: key.to_string(),
    };
    let (x, y) = key.split_once(',').ok_or_else(malformed)?;
    let x = x.trim().parse().map_err(|_| malformed())?;
    let y = y.trim().parse().map_err(|_| malformed())?;
    Ok(Point::new(x, y))
}

// ---------------------------------------------------------------------------
// Grid persistence methods
// ---------------------------------------------------------------------------

impl Grid {
    /// Build the serializable document for this grid. Sub-grid ids are
    /// numbered freshly on every call.
    pub fn to_document(&self) -> GridDocument {
        let mut by_kind: BTreeMap<EntityKind, Vec<Value>> = BTreeMap::new();
        for (&pos, &kind) in &self.cells {
            by_kind
                .entry(kind)
                .or_default()
                .push(Value::from(vec![pos.x, pos.y]));
        }
        let entities = by_kind
            .into_iter()
            .map(|(kind, points)| (kind.name().to_string(), Value::Array(points)))
            .collect();

        let mut my_links = MyLinksDocument::default();
        for (&pos, &dir) in &self.my_links {
            match dir {
                LinkDirection::In => my_links.inbound.push(pos.into()),
                LinkDirection::Out => my_links.outbound.push(pos.into()),
            }
        }

        let numeric = |id: SubGridId| id.data().as_ffi();
        let links = self
            .links
            .iter()
            .map(|(pos, link)| {
                (
                    pos.to_string(),
                    LinkRecord(link.direction, numeric(link.grid), link.port.into()),
                )
            })
            .collect();
        let linked_names = self
            .sub_grids
            .iter()
            .map(|(id, linked)| (numeric(id).to_string(), linked.name.clone()))
            .collect();
        let linked_speeds = self
            .sub_grids
            .iter()
            .filter(|(_, linked)| linked.grid.speed != default_speed())
            .map(|(id, linked)| (numeric(id).to_string(), linked.grid.speed))
            .collect();

        GridDocument {
            my_links,
            links,
            linked_names,
            speed: self.speed,
            linked_speeds,
            entities,
        }
    }

    /// Rebuild a grid from a document. Sub-grid files resolve against
    /// `base_dir`.
    pub fn from_document(doc: GridDocument, base_dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let mut ctx = LoadContext::new(EngineConfig::default().max_nesting_depth);
        build_grid(doc, base_dir.as_ref(), &mut ctx)
    }

    pub fn to_json_string(&self) -> Result<String, StoreError> {
        Ok(serde_json::to_string_pretty(&self.to_document())?)
    }

    pub fn from_json_str(json: &str, base_dir: impl AsRef<Path>) -> Result<Self, LoadError> {
        let doc: GridDocument = serde_json::from_str(json).map_err(LoadError::Parse)?;
        Self::from_document(doc, base_dir)
    }

    /// Save this grid to `path`. Sub-grid files are not written; they are
    /// referenced by name.
    pub fn store(&self, path: impl AsRef<Path>) -> Result<(), StoreError> {
        let path = path.as_ref();
        let json = self.to_json_string()?;
        std::fs::write(path, json).map_err(|source| StoreError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        info!(path = %path.display(), cells = self.population(), "grid stored");
        Ok(())
    }

    /// Load a grid and its sub-grids from `path`.
    pub fn from_file(path: impl AsRef<Path>) -> Result<Self, LoadError> {
        Self::from_file_with_config(path, &EngineConfig::default())
    }

    pub fn from_file_with_config(
        path: impl AsRef<Path>,
        config: &EngineConfig,
    ) -> Result<Self, LoadError> {
        let mut ctx = LoadContext::new(config.max_nesting_depth);
        read_grid(path.as_ref(), &mut ctx)
    }

    /// Replace this grid with the contents of `path`. On error the grid is
    /// left unchanged.
    pub fn load(&mut self, path: impl AsRef<Path>) -> Result<(), LoadError> {
        let mut ctx = LoadContext::new(self.max_nesting_depth);
        *self = read_grid(path.as_ref(), &mut ctx)?;
        Ok(())
    }

    /// Load a file to embed in this grid, refusing files that are already
    /// on this grid's own load chain.
    pub(crate) fn load_sub_grid(&self, path: &Path) -> Result<Grid, LoadError> {
        let mut ctx = LoadContext::new(self.max_nesting_depth);
        if let Some(own) = self.source.as_ref().and_then(|s| s.canonicalize().ok()) {
            ctx.stack.push(own);
        }
        read_grid(path, &mut ctx)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn p(x: i32, y: i32) -> Point {
        Point::new(x, y)
    }

    #[test]
    fn document_groups_cells_by_kind() {
        let mut grid = Grid::new();
        grid.insert(p(0, 0), EntityKind::Spark);
        grid.insert(p(2, 0), EntityKind::Spark);
        grid.insert(p(5, 5), EntityKind::ArrowUp);
        let doc = grid.to_document();
        assert_eq!(doc.entities.len(), 2);
        assert_eq!(doc.entities["spark"], serde_json::json!([[0, 0], [2, 0]]));
        assert_eq!(doc.entities["arrowup"], serde_json::json!([[5, 5]]));
        assert!(!doc.entities.contains_key("void"));
    }

    #[test]
    fn json_round_trip_keeps_cells_and_ports() {
        let mut grid = Grid::new();
        grid.insert(p(0, 0), EntityKind::LivingCell);
        grid.insert(p(1, 1), EntityKind::Spark);
        grid.insert_link(p(-4, 2), LinkDirection::In, crate::link::LinkTarget::Local)
            .unwrap();
        grid.insert_link(p(4, 2), LinkDirection::Out, crate::link::LinkTarget::Local)
            .unwrap();

        let json = grid.to_json_string().unwrap();
        let loaded = Grid::from_json_str(&json, ".").unwrap();
        assert_eq!(loaded.cells(), grid.cells());
        assert_eq!(
            loaded.my_links().collect::<Vec<_>>(),
            grid.my_links().collect::<Vec<_>>()
        );
    }

    #[test]
    fn unknown_keys_are_ignored() {
        let json = r#"{
            "spark": [[1, 2]],
            "teleporter": [[0, 0]],
            "comment": "made by hand",
            "my_links": {"IN": [[3, 3]], "BOTH": [[4, 4]]}
        }"#;
        let grid = Grid::from_json_str(json, ".").unwrap();
        assert_eq!(grid.population(), 1);
        assert_eq!(grid.kind_at(p(1, 2)), EntityKind::Spark);
        assert_eq!(grid.my_links().count(), 1);
    }

    #[test]
    fn void_entries_load_as_nothing() {
        let json = r#"{"void": [[0, 0], [1, 1]], "deadcell": [[2, 2]]}"#;
        let grid = Grid::from_json_str(json, ".").unwrap();
        assert_eq!(grid.population(), 1);
    }

    #[test]
    fn loading_does_not_seed_neighbors() {
        let json = r#"{"livingcell": [[0, 0]], "monoone": [[10, 10]]}"#;
        let grid = Grid::from_json_str(json, ".").unwrap();
        assert_eq!(grid.population(), 2);
    }

    #[test]
    fn malformed_structure_is_an_error() {
        assert!(matches!(
            Grid::from_json_str("[1, 2, 3]", "."),
            Err(LoadError::Parse(_))
        ));
        assert!(matches!(
            Grid::from_json_str(r#"{"spark": "everywhere"}"#, "."),
            Err(LoadError::MalformedCell { .. })
        ));
    }

    #[test]
    fn coordinates_past_the_limit_are_rejected() {
        let err = Grid::from_json_str(r#"{"livingcell": [[2147483647, 0]]}"#, ".").unwrap_err();
        assert!(matches!(
            err,
            LoadError::CoordinateOutOfRange { ref key, x: i32::MAX, y: 0 } if key == "livingcell"
        ));
        assert!(matches!(
            Grid::from_json_str(r#"{"my_links": {"OUT": [[0, -2147483648]]}}"#, "."),
            Err(LoadError::CoordinateOutOfRange { .. })
        ));
        assert!(matches!(
            Grid::from_json_str(r#"{"links": {"2147483647,0": ["IN", 1, [0, 0]]}}"#, "."),
            Err(LoadError::CoordinateOutOfRange { .. })
        ));

        let mut grid = Grid::from_json_str(r#"{"livingcell": [[1073741824, 0]]}"#, ".").unwrap();
        grid.update();
        assert!(grid.entities().all(|(pos, _)| pos.in_bounds()));
    }

    #[test]
    fn link_without_linked_name_is_an_error() {
        let json = r#"{"links": {"1,1": ["IN", 7, [0, 0]]}}"#;
        assert!(matches!(
            Grid::from_json_str(json, "."),
            Err(LoadError::MissingLinkedName { id: 7 })
        ));
    }

    #[test]
    fn link_key_parsing() {
        assert_eq!(parse_link_key("3,-4").unwrap(), p(3, -4));
        assert_eq!(parse_link_key(" 3, 4").unwrap(), p(3, 4));
        assert!(parse_link_key("3;4").is_err());
        assert!(parse_link_key("x,4").is_err());
    }

    #[test]
    fn speed_defaults_and_round_trips() {
        let grid = Grid::from_json_str("{}", ".").unwrap();
        assert_eq!(grid.speed(), 1);

        let fast = Grid::with_speed(5);
        let loaded = Grid::from_json_str(&fast.to_json_string().unwrap(), ".").unwrap();
        assert_eq!(loaded.speed(), 5);
    }

    #[test]
    fn missing_file_is_io_error() {
        assert!(matches!(
            Grid::from_file("/no/such/grid.cg"),
            Err(LoadError::Io { .. })
        ));
    }
}
