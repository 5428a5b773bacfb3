//! Compiler and per-frame interpreter for wire-connected voxel block
//! scripts.
//!
//! A program is a list of prefabs: blocks placed on a grid, joined by
//! value and execution wires. [`compile()`] turns one entry prefab (and
//! every prefab it nests) into an immutable [`Program`]; [`run_frame`]
//! executes it once against a host [`RuntimeContext`].

pub mod compile;
pub mod config;
pub mod diagnostic;
pub mod error;
pub mod graph;
pub mod math;
pub mod runtime;
pub mod signal;
pub mod span;
pub mod syntax;

pub use compile::{compile, compile_many, CompileOptions, Program};
pub use config::{Config, Limits};
pub use diagnostic::Diagnostic;
pub use error::{CompileError, CompileWarning, ConfigError, PhysicsError, RuntimeError};
pub use graph::{Prefab, PrefabList};
pub use runtime::{run_frame, FrameReport, RuntimeContext, SimContext};
