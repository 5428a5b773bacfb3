//! Compiled syntax: an arena of nodes per program, with value inputs
//! resolved to producer terminals and void outputs resolved to the
//! statements they continue into.
//!
//! Expressions are pulled for their outputs; statements are executed when
//! flow enters one of their void inputs. Both live in one arena and are
//! addressed by [`NodeId`].

pub mod ast;
pub mod node;

use std::collections::BTreeMap;

use crate::graph::{BlockId, GridPos, TerminalKey};
use crate::signal::{SignalKind, Variable, VariableId, WireType};

pub use ast::{Ast, Entry, PortLink, Root};
pub use node::NodeKind;

/// Handle of a node in its AST's arena.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct NodeId(pub u32);

impl NodeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

impl std::fmt::Display for NodeId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "n{}", self.0)
    }
}

/// A terminal of a node in the same AST.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct SyntaxTerminal {
    pub node: NodeId,
    pub key: TerminalKey,
}

impl SyntaxTerminal {
    pub fn new(node: NodeId, key: TerminalKey) -> Self {
        Self { node, key }
    }
}

/// Where a value input reads from.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Input {
    /// Reads the kind's zero value.
    Disconnected,
    Wire(SyntaxTerminal),
    /// An input port of the enclosing custom block, by its outer key.
    Port(TerminalKey),
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct InputSlot {
    pub key: TerminalKey,
    pub wire: WireType,
    pub source: Input,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct OutputSlot {
    pub key: TerminalKey,
    pub wire: WireType,
}

/// Where flow goes after leaving a void output.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Target {
    /// Enter a statement of the same AST at one of its void inputs.
    Node(SyntaxTerminal),
    /// Leave the nested program through the enclosing block's void
    /// output with this outer key.
    Exit(TerminalKey),
}

#[derive(Clone, Debug, PartialEq)]
pub struct VoidOutput {
    pub key: TerminalKey,
    /// Wired statements in spatial order, then any exit.
    pub targets: Vec<Target>,
}

/// One compiled block.
#[derive(Clone, Debug, PartialEq)]
pub struct SyntaxNode {
    pub block: BlockId,
    pub pos: GridPos,
    pub kind: NodeKind,
    /// Value inputs in layout order.
    pub inputs: Vec<InputSlot>,
    /// Value outputs in layout order.
    pub outputs: Vec<OutputSlot>,
    pub void_inputs: Vec<TerminalKey>,
    pub void_outputs: Vec<VoidOutput>,
}

impl SyntaxNode {
    /// The `i`th value input; missing slots read as disconnected.
    pub fn input(&self, i: usize) -> Input {
        self.inputs
            .get(i)
            .map(|slot| slot.source)
            .unwrap_or(Input::Disconnected)
    }

    pub fn input_by_key(&self, key: TerminalKey) -> Option<&InputSlot> {
        self.inputs.iter().find(|slot| slot.key == key)
    }

    pub fn output_index(&self, key: TerminalKey) -> Option<usize> {
        self.outputs.iter().position(|slot| slot.key == key)
    }

    /// Key of the `i`th void output.
    pub fn void_out(&self, i: usize) -> Option<TerminalKey> {
        self.void_outputs.get(i).map(|out| out.key)
    }

    pub fn is_statement(&self) -> bool {
        !self.void_inputs.is_empty() || !self.void_outputs.is_empty()
    }
}

/// Interns variables by (name, kind) for one compilation.
#[derive(Clone, Debug, Default)]
pub struct VariableTable {
    ids: BTreeMap<(String, SignalKind), VariableId>,
    variables: Vec<Variable>,
}

impl VariableTable {
    pub fn intern(&mut self, name: &str, kind: SignalKind) -> VariableId {
        if let Some(id) = self.ids.get(&(name.to_string(), kind)) {
            return *id;
        }
        let id = VariableId(self.variables.len() as u32);
        self.ids.insert((name.to_string(), kind), id);
        self.variables.push(Variable {
            id,
            name: name.to_string(),
            kind,
        });
        id
    }

    pub fn get(&self, id: VariableId) -> Option<&Variable> {
        self.variables.get(id.0 as usize)
    }

    pub fn into_vec(self) -> Vec<Variable> {
        self.variables
    }
}
