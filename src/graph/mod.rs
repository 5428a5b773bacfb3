//! Graph input model: blocks placed on a grid, their terminals, and the
//! wires between them.
//!
//! This is the read-only boundary with the editing/serialization layer.
//! The types derive serde so hosts and the CLI can exchange programs as
//! plain JSON; nothing here knows about the on-disk format.

pub mod build;
pub mod catalog;
pub mod implicit;
pub mod listing;
pub mod order;

use serde::{Deserialize, Serialize};

use crate::math::Vec3;
use crate::signal::WireType;

/// Voxels along each axis of one grid cell.
pub const VOXELS_PER_CELL: i32 = 8;

/// Default first id of user prefabs; lower ids are built-in blocks.
pub const DEFAULT_BUILTIN_THRESHOLD: u16 = 597;

/// Block type id.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct BlockId(pub u16);

impl std::fmt::Display for BlockId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "#{}", self.0)
    }
}

/// Grid cell of a block: x horizontal, y vertical, z depth.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct GridPos {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl GridPos {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }

    /// World voxel coordinate of a terminal of the block at this cell.
    pub fn voxel(self, key: TerminalKey) -> [i32; 3] {
        [
            self.x as i32 * VOXELS_PER_CELL + key.x as i32,
            self.y as i32 * VOXELS_PER_CELL + key.y as i32,
            self.z as i32 * VOXELS_PER_CELL + key.z as i32,
        ]
    }
}

impl From<(i16, i16, i16)> for GridPos {
    fn from((x, y, z): (i16, i16, i16)) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for GridPos {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "({}, {}, {})", self.x, self.y, self.z)
    }
}

/// Voxel position of a terminal relative to its block's origin cell.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct TerminalKey {
    pub x: i16,
    pub y: i16,
    pub z: i16,
}

impl TerminalKey {
    pub const fn new(x: i16, y: i16, z: i16) -> Self {
        Self { x, y, z }
    }
}

impl std::fmt::Display for TerminalKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "<{},{},{}>", self.x, self.y, self.z)
    }
}

/// Per-instance block setting, addressed by position in `Block::settings`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Setting {
    Number(f32),
    Vector(Vec3),
    Text(String),
    Bool(bool),
    Choice(u8),
    Object(u32),
}

/// A placed block.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Block {
    pub id: BlockId,
    pub pos: GridPos,
    #[serde(default)]
    pub settings: Vec<Setting>,
}

impl Block {
    pub fn new(id: BlockId, pos: GridPos) -> Self {
        Self {
            id,
            pos,
            settings: Vec::new(),
        }
    }

    pub fn with_setting(mut self, setting: Setting) -> Self {
        self.settings.push(setting);
        self
    }

    pub fn number(&self, index: usize) -> Option<f32> {
        match self.settings.get(index)? {
            Setting::Number(n) => Some(*n),
            Setting::Choice(c) => Some(*c as f32),
            _ => None,
        }
    }

    pub fn vector(&self, index: usize) -> Option<Vec3> {
        match self.settings.get(index)? {
            Setting::Vector(v) => Some(*v),
            _ => None,
        }
    }

    pub fn text(&self, index: usize) -> Option<&str> {
        match self.settings.get(index)? {
            Setting::Text(s) => Some(s),
            _ => None,
        }
    }

    pub fn flag(&self, index: usize) -> Option<bool> {
        match self.settings.get(index)? {
            Setting::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn choice(&self, index: usize) -> Option<u8> {
        match self.settings.get(index)? {
            Setting::Choice(c) => Some(*c),
            _ => None,
        }
    }

    pub fn object(&self, index: usize) -> Option<u32> {
        match self.settings.get(index)? {
            Setting::Object(o) => Some(*o),
            _ => None,
        }
    }
}

/// One end of a wire: a terminal of the block at `block`.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct Endpoint {
    pub block: GridPos,
    pub key: TerminalKey,
}

impl Endpoint {
    pub const fn new(block: GridPos, key: TerminalKey) -> Self {
        Self { block, key }
    }
}

/// An explicit wire. The pair is unordered; the compiler finds which
/// end is the output.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Connection {
    pub a: Endpoint,
    pub b: Endpoint,
}

impl Connection {
    pub const fn new(a: Endpoint, b: Endpoint) -> Self {
        Self { a, b }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PortDir {
    In,
    Out,
}

/// A terminal a prefab exposes when it is used as a custom block.
///
/// `key` is the terminal's key on the outer (custom) block; `inner` is the
/// terminal inside the prefab it stands for. An `In` port maps onto an
/// inner input (value or void), an `Out` port onto an inner output.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Port {
    pub name: String,
    pub key: TerminalKey,
    pub wire: WireType,
    pub dir: PortDir,
    pub inner: Endpoint,
}

/// A program: a level or a user-authored sub-program.
#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct Prefab {
    pub name: String,
    #[serde(default)]
    pub blocks: Vec<Block>,
    #[serde(default)]
    pub connections: Vec<Connection>,
    #[serde(default)]
    pub ports: Vec<Port>,
}

impl Prefab {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

fn default_threshold() -> u16 {
    DEFAULT_BUILTIN_THRESHOLD
}

/// All prefabs of a game. Block ids at or above `builtin_threshold` name
/// `prefabs[id - builtin_threshold]`.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PrefabList {
    #[serde(default = "default_threshold")]
    pub builtin_threshold: u16,
    pub prefabs: Vec<Prefab>,
}

impl Default for PrefabList {
    fn default() -> Self {
        Self {
            builtin_threshold: DEFAULT_BUILTIN_THRESHOLD,
            prefabs: Vec::new(),
        }
    }
}

impl PrefabList {
    pub fn new(prefabs: Vec<Prefab>) -> Self {
        Self {
            builtin_threshold: DEFAULT_BUILTIN_THRESHOLD,
            prefabs,
        }
    }

    pub fn is_builtin(&self, id: BlockId) -> bool {
        id.0 < self.builtin_threshold
    }

    /// Index into `prefabs` named by a custom block id.
    pub fn prefab_index(&self, id: BlockId) -> Option<usize> {
        if self.is_builtin(id) {
            return None;
        }
        let index = (id.0 - self.builtin_threshold) as usize;
        (index < self.prefabs.len()).then_some(index)
    }

    /// Block id under which `prefabs[index]` is placed, or `None` when
    /// the id space above the threshold cannot reach `index`.
    pub fn custom_id(&self, index: usize) -> Option<BlockId> {
        u16::try_from(index)
            .ok()
            .and_then(|i| self.builtin_threshold.checked_add(i))
            .map(BlockId)
    }

    pub fn find(&self, name: &str) -> Option<usize> {
        self.prefabs.iter().position(|p| p.name == name)
    }
}
