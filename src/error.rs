//! Error types for compilation, frame execution, configuration and the
//! graph builder.
//!
//! Compile errors abort compilation of the program; runtime errors abort
//! the current frame at the point of failure. A disconnected terminal is
//! an ordinary value and never an error.

use std::path::PathBuf;

use thiserror::Error;

use crate::graph::{BlockId, Endpoint, GridPos, TerminalKey};

/// Compile result type alias.
pub type Result<T> = std::result::Result<T, CompileError>;

/// Locates a block: the prefab it lives in, its type id and position.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct BlockRef {
    pub prefab: String,
    pub id: BlockId,
    pub pos: GridPos,
}

impl BlockRef {
    pub fn new(prefab: impl Into<String>, id: BlockId, pos: GridPos) -> Self {
        Self {
            prefab: prefab.into(),
            id,
            pos,
        }
    }
}

impl std::fmt::Display for BlockRef {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "block {} at {} in `{}`", self.id, self.pos, self.prefab)
    }
}

// ─── Compile Errors ────────────────────────────────────────────────

/// Structural errors found while building an AST.
#[derive(Debug, Error, PartialEq)]
pub enum CompileError {
    /// A prefab index (an entry point, or a custom block id) names no
    /// prefab in the list.
    #[error("no prefab with index {index}")]
    UnknownPrefab {
        index: usize,
        /// The custom block that referenced it, if any.
        block: Option<BlockRef>,
    },

    /// A node constructor was handed a block id outside its family.
    #[error("{block} is not a valid {family} block")]
    InvalidTypeId {
        block: BlockRef,
        family: &'static str,
    },

    /// Two blocks occupy one grid cell.
    #[error("two blocks at {pos} in `{prefab}`")]
    DuplicateBlock { prefab: String, pos: GridPos },

    /// A wire end names no block, or a key the block does not have.
    #[error("wire end {} {} in `{prefab}` names no terminal", .endpoint.block, .endpoint.key)]
    DanglingTerminal { prefab: String, endpoint: Endpoint },

    /// A wire does not join one output to one compatible input.
    #[error("bad wire {} {} -> {} {} in `{prefab}`: {reason}", .a.block, .a.key, .b.block, .b.key)]
    WireMismatch {
        prefab: String,
        a: Endpoint,
        b: Endpoint,
        reason: String,
    },

    /// More than one producer is wired into one value input.
    #[error("input `{terminal}` of {block} has {count} producers")]
    AmbiguousInput {
        block: BlockRef,
        terminal: String,
        count: usize,
    },

    /// The value wires form a cycle through this block.
    #[error("value wires form a cycle through {block}")]
    ValueCycle { block: BlockRef },

    #[error("goto `{label}` at {} has no matching label", .block.pos)]
    UnresolvedGoto { block: BlockRef, label: String },

    #[error("label `{label}` is defined {} times in `{prefab}`", .positions.len())]
    AmbiguousLabel {
        prefab: String,
        label: String,
        positions: Vec<GridPos>,
    },

    /// Following gotos comes back to label `first` without reaching any
    /// other statement.
    #[error("goto recursion in `{prefab}` starting at label `{first}`")]
    GotoRecursion {
        prefab: String,
        /// The label reached twice, where the loop closes.
        first: String,
        /// Labels in the order they were reached, lead-in included.
        chain: Vec<String>,
    },

    /// Custom blocks nest deeper than allowed, or a prefab contains itself.
    #[error("prefabs nest too deep (limit {limit}): {}", .chain.join(" > "))]
    NestingTooDeep { chain: Vec<String>, limit: usize },
}

impl CompileError {
    /// The block the error points at, when there is one.
    pub fn block(&self) -> Option<&BlockRef> {
        match self {
            CompileError::UnknownPrefab { block, .. } => block.as_ref(),
            CompileError::InvalidTypeId { block, .. }
            | CompileError::AmbiguousInput { block, .. }
            | CompileError::ValueCycle { block }
            | CompileError::UnresolvedGoto { block, .. } => Some(block),
            _ => None,
        }
    }

    /// Name of the prefab the error was found in.
    pub fn prefab(&self) -> Option<&str> {
        match self {
            CompileError::DuplicateBlock { prefab, .. }
            | CompileError::DanglingTerminal { prefab, .. }
            | CompileError::WireMismatch { prefab, .. }
            | CompileError::AmbiguousLabel { prefab, .. }
            | CompileError::GotoRecursion { prefab, .. } => Some(prefab),
            CompileError::NestingTooDeep { chain, .. } => chain.last().map(String::as_str),
            other => other.block().map(|b| b.prefab.as_str()),
        }
    }

    /// Grid position the error points at, when there is one.
    pub fn pos(&self) -> Option<GridPos> {
        match self {
            CompileError::DuplicateBlock { pos, .. } => Some(*pos),
            CompileError::DanglingTerminal { endpoint, .. } => Some(endpoint.block),
            CompileError::WireMismatch { a, .. } => Some(a.block),
            CompileError::AmbiguousLabel { positions, .. } => positions.first().copied(),
            other => other.block().map(|b| b.pos),
        }
    }
}

// ─── Compile Warnings ──────────────────────────────────────────────

/// Suspicious but compilable structure. Warnings never stop compilation.
#[derive(Clone, Debug, Error, PartialEq)]
pub enum CompileWarning {
    /// A label name is defined more than once. Harmless until a goto
    /// names it, which is then an [`CompileError::AmbiguousLabel`].
    #[error("label `{label}` is defined {} times in `{prefab}`", .positions.len())]
    DuplicateLabel {
        prefab: String,
        label: String,
        positions: Vec<GridPos>,
    },
}

impl CompileWarning {
    pub fn prefab(&self) -> &str {
        match self {
            CompileWarning::DuplicateLabel { prefab, .. } => prefab,
        }
    }

    pub fn pos(&self) -> Option<GridPos> {
        match self {
            CompileWarning::DuplicateLabel { positions, .. } => positions.first().copied(),
        }
    }
}

// ─── Runtime Errors ────────────────────────────────────────────────

/// Failures reported by the host physics backend.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum PhysicsError {
    #[error("geometry too complex")]
    GeometryTooComplex,
    #[error("physics backend: {0}")]
    Backend(String),
}

/// Errors that abort a frame.
#[derive(Debug, Error, PartialEq)]
pub enum RuntimeError {
    /// A vector or rotation input held NaN or an infinity.
    #[error("non-finite input to {block}")]
    NonFinite { block: BlockRef },

    /// A terminal was addressed that the compiled node does not have.
    /// Never happens against an AST built by this crate's compiler.
    #[error("{block} has no terminal {key}")]
    InvalidTerminal { block: BlockRef, key: TerminalKey },

    /// The frame executed more statements than its budget allows.
    #[error("frame exceeded its step budget ({steps} of {budget})")]
    Timeout { steps: u64, budget: u64 },

    /// Nested programs were entered deeper than the call-depth limit.
    #[error("nested programs entered {depth} deep (limit {limit}) at {block}")]
    DepthExceeded {
        block: BlockRef,
        depth: usize,
        limit: usize,
    },

    #[error("{block}: {source}")]
    Physics {
        block: BlockRef,
        #[source]
        source: PhysicsError,
    },
}

impl RuntimeError {
    pub fn block(&self) -> Option<&BlockRef> {
        match self {
            RuntimeError::NonFinite { block }
            | RuntimeError::InvalidTerminal { block, .. }
            | RuntimeError::DepthExceeded { block, .. }
            | RuntimeError::Physics { block, .. } => Some(block),
            RuntimeError::Timeout { .. } => None,
        }
    }
}

// ─── Config And Builder Errors ─────────────────────────────────────

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read {}: {source}", .path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid config {}: {source}", .path.display())]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}

/// Misuse of [`crate::graph::build::PrefabBuilder`].
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum BuildError {
    #[error("no block at {pos}")]
    UnknownBlock { pos: GridPos },

    #[error("block at {pos} has no terminal `{name}`")]
    UnknownTerminal { pos: GridPos, name: String },
}
