use std::collections::BTreeMap;
use std::fmt::Write as _;

use crate::graph::{GridPos, TerminalKey};
use crate::signal::VariableId;
use crate::syntax::{Input, NodeId, NodeKind, SyntaxNode, SyntaxTerminal, Target};

/// How flow starts at a root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Entry {
    /// Enter the statement at this void input.
    Enter(TerminalKey),
    /// Run the roots of a custom block's nested program.
    Frame,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct Root {
    pub node: NodeId,
    pub entry: Entry,
}

/// A port of a nested program: the key on the enclosing custom block and
/// the terminal inside the program it stands for.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct PortLink {
    pub outer: TerminalKey,
    pub inner: SyntaxTerminal,
}

/// One compiled program. Immutable once built; nested programs share
/// their AST by `Arc`.
#[derive(Clone, Debug, PartialEq)]
pub struct Ast {
    pub prefab: String,
    pub nodes: Vec<SyntaxNode>,
    /// Entry points in execution order.
    pub roots: Vec<Root>,
    pub by_pos: BTreeMap<GridPos, NodeId>,
    /// Variables referenced by nodes of this program (not nested ones).
    pub variables: Vec<VariableId>,
    pub void_inputs: Vec<PortLink>,
    pub void_outputs: Vec<PortLink>,
    pub value_outputs: Vec<PortLink>,
    /// Levels of custom blocks below this program; zero when it has none.
    pub height: usize,
}

impl Ast {
    pub fn empty(prefab: impl Into<String>) -> Self {
        Self {
            prefab: prefab.into(),
            nodes: Vec::new(),
            roots: Vec::new(),
            by_pos: BTreeMap::new(),
            variables: Vec::new(),
            void_inputs: Vec::new(),
            void_outputs: Vec::new(),
            value_outputs: Vec::new(),
            height: 0,
        }
    }

    pub fn get(&self, id: NodeId) -> Option<&SyntaxNode> {
        self.nodes.get(id.index())
    }

    pub fn node_at(&self, pos: GridPos) -> Option<NodeId> {
        self.by_pos.get(&pos).copied()
    }

    pub fn void_input(&self, outer: TerminalKey) -> Option<SyntaxTerminal> {
        self.void_inputs
            .iter()
            .find(|p| p.outer == outer)
            .map(|p| p.inner)
    }

    pub fn value_output(&self, outer: TerminalKey) -> Option<SyntaxTerminal> {
        self.value_outputs
            .iter()
            .find(|p| p.outer == outer)
            .map(|p| p.inner)
    }

    /// Stable textual listing of the program and its nested programs.
    pub fn dump(&self) -> String {
        let mut out = String::new();
        self.dump_into(&mut out, 0);
        out
    }

    fn dump_into(&self, out: &mut String, depth: usize) {
        let pad = "  ".repeat(depth);
        let _ = writeln!(out, "{pad}prefab {}", self.prefab);
        if !self.roots.is_empty() {
            let roots: Vec<String> = self
                .roots
                .iter()
                .map(|r| match r.entry {
                    Entry::Enter(key) => format!("{}{}", r.node, key),
                    Entry::Frame => format!("{}:frame", r.node),
                })
                .collect();
            let _ = writeln!(out, "{pad}  roots {}", roots.join(" "));
        }
        for port in &self.void_inputs {
            let _ = writeln!(out, "{pad}  port in {} -> {}{}", port.outer, port.inner.node, port.inner.key);
        }
        for port in &self.void_outputs {
            let _ = writeln!(out, "{pad}  port out {}{} -> {}", port.inner.node, port.inner.key, port.outer);
        }
        for port in &self.value_outputs {
            let _ = writeln!(out, "{pad}  value out {} <- {}{}", port.outer, port.inner.node, port.inner.key);
        }
        for (i, node) in self.nodes.iter().enumerate() {
            let _ = writeln!(
                out,
                "{pad}  n{i} {} {} {}",
                node.block,
                node.pos,
                node.kind.name()
            );
            for slot in &node.inputs {
                let source = match slot.source {
                    Input::Disconnected => "-".to_string(),
                    Input::Wire(t) => format!("{}{}", t.node, t.key),
                    Input::Port(key) => format!("port{}", key),
                };
                let _ = writeln!(out, "{pad}    in {} {} <- {}", slot.key, slot.wire, source);
            }
            for exit in &node.void_outputs {
                if exit.targets.is_empty() {
                    continue;
                }
                let targets: Vec<String> = exit
                    .targets
                    .iter()
                    .map(|t| match t {
                        Target::Node(t) => format!("{}{}", t.node, t.key),
                        Target::Exit(key) => format!("exit{}", key),
                    })
                    .collect();
                let _ = writeln!(out, "{pad}    out {} -> {}", exit.key, targets.join(" "));
            }
            if let NodeKind::Custom { ast, .. } = &node.kind {
                ast.dump_into(out, depth + 2);
            }
        }
    }
}
