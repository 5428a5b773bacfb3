//! Building one prefab's AST: block indexing, wire validation, node
//! instantiation, terminal resolution, ports and roots.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BlockRef, CompileError, Result};
use crate::graph::catalog::{self, Family, Terminal};
use crate::graph::implicit::{self, ExplicitVoidPairs};
use crate::graph::order::spatial_cmp;
use crate::graph::{Block, Connection, Endpoint, GridPos, PortDir, Prefab, TerminalKey};
use crate::syntax::node::Site;
use crate::syntax::{
    Ast, Entry, Input, InputSlot, NodeId, NodeKind, OutputSlot, PortLink, Root, SyntaxNode,
    SyntaxTerminal, Target, VoidOutput,
};

use super::{cycles, goto, instantiate, Compiler};

/// A block with its laid-out terminals.
struct Placed<'p> {
    block: &'p Block,
    terminals: Vec<Terminal>,
}

type Placement<'p> = BTreeMap<GridPos, Placed<'p>>;

fn terminal_at<'t>(placed: &'t Placement<'_>, prefab: &str, at: Endpoint) -> Result<&'t Terminal> {
    placed
        .get(&at.block)
        .and_then(|p| p.terminals.iter().find(|t| t.key == at.key))
        .ok_or_else(|| CompileError::DanglingTerminal {
            prefab: prefab.to_string(),
            endpoint: at,
        })
}

fn mismatch(prefab: &str, c: &Connection, reason: impl Into<String>) -> CompileError {
    CompileError::WireMismatch {
        prefab: prefab.to_string(),
        a: c.a,
        b: c.b,
        reason: reason.into(),
    }
}

/// Explicit and implicit wires, oriented output → input.
#[derive(Default)]
struct Wires {
    /// Value input → every producer wired into it.
    producers: BTreeMap<Endpoint, Vec<Endpoint>>,
    /// Void output → every void input it continues into.
    targets: BTreeMap<Endpoint, Vec<Endpoint>>,
    /// Void inputs some wire enters.
    entered: BTreeSet<Endpoint>,
}

impl Wires {
    fn collect(prefab: &str, placed: &Placement<'_>, connections: &[Connection]) -> Result<Self> {
        let mut wires = Wires::default();
        let mut seen = BTreeSet::new();
        let mut explicit = ExplicitVoidPairs::default();

        for c in connections {
            let ta = terminal_at(placed, prefab, c.a)?;
            let tb = terminal_at(placed, prefab, c.b)?;
            let (from, out, to, inp) = match (ta.dir, tb.dir) {
                (PortDir::Out, PortDir::In) => (c.a, ta, c.b, tb),
                (PortDir::In, PortDir::Out) => (c.b, tb, c.a, ta),
                (PortDir::Out, PortDir::Out) => {
                    return Err(mismatch(prefab, c, "both ends are outputs"))
                }
                (PortDir::In, PortDir::In) => return Err(mismatch(prefab, c, "both ends are inputs")),
            };
            if !out.wire.feeds(inp.wire) {
                return Err(mismatch(
                    prefab,
                    c,
                    format!("{} output cannot feed {} input", out.wire, inp.wire),
                ));
            }
            if !seen.insert((from, to)) {
                continue;
            }
            if out.wire.is_void() {
                explicit.insert(from.block, to.block);
                wires.void_wire(from, to);
            } else {
                wires.producers.entry(to).or_default().push(from);
            }
        }

        let layouts = placed
            .iter()
            .map(|(pos, p)| (*pos, p.terminals.as_slice()));
        for wire in implicit::synthesize(layouts, &explicit) {
            wires.void_wire(wire.from, wire.to);
        }
        Ok(wires)
    }

    fn void_wire(&mut self, from: Endpoint, to: Endpoint) {
        self.targets.entry(from).or_default().push(to);
        self.entered.insert(to);
    }
}

/// The prefab's ports, indexed by the inner terminal they stand for.
#[derive(Default)]
struct Ports {
    value_inputs: BTreeMap<Endpoint, TerminalKey>,
    void_inputs: Vec<(TerminalKey, Endpoint)>,
    void_outputs: Vec<(TerminalKey, Endpoint)>,
    value_outputs: Vec<(TerminalKey, Endpoint)>,
}

impl Ports {
    fn collect(prefab: &Prefab, placed: &Placement<'_>) -> Result<Self> {
        let mut ports = Ports::default();
        for port in &prefab.ports {
            let inner = terminal_at(placed, &prefab.name, port.inner)?;
            if inner.dir != port.dir || inner.wire != port.wire {
                return Err(CompileError::WireMismatch {
                    prefab: prefab.name.clone(),
                    a: port.inner,
                    b: port.inner,
                    reason: format!(
                        "port `{}` ({} {:?}) does not match its terminal ({} {:?})",
                        port.name, port.wire, port.dir, inner.wire, inner.dir
                    ),
                });
            }
            let entry = (port.key, port.inner);
            match (port.dir, port.wire.is_void()) {
                (PortDir::In, true) => ports.void_inputs.push(entry),
                (PortDir::In, false) => {
                    ports.value_inputs.insert(port.inner, port.key);
                }
                (PortDir::Out, true) => ports.void_outputs.push(entry),
                (PortDir::Out, false) => ports.value_outputs.push(entry),
            }
        }
        Ok(ports)
    }

    fn exits(&self, at: Endpoint) -> impl Iterator<Item = TerminalKey> + '_ {
        self.void_outputs
            .iter()
            .filter(move |(_, inner)| *inner == at)
            .map(|(outer, _)| *outer)
    }

    fn exposes_input(&self, at: Endpoint) -> bool {
        self.void_inputs.iter().any(|(_, inner)| *inner == at)
    }
}

fn empty_node(block: &Block, kind: NodeKind, terminals: &[Terminal]) -> SyntaxNode {
    let mut node = SyntaxNode {
        block: block.id,
        pos: block.pos,
        kind,
        inputs: Vec::new(),
        outputs: Vec::new(),
        void_inputs: Vec::new(),
        void_outputs: Vec::new(),
    };
    for t in terminals {
        match (t.dir, t.wire.is_void()) {
            (PortDir::In, true) => node.void_inputs.push(t.key),
            (PortDir::Out, true) => node.void_outputs.push(VoidOutput {
                key: t.key,
                targets: Vec::new(),
            }),
            (PortDir::In, false) => node.inputs.push(InputSlot {
                key: t.key,
                wire: t.wire,
                source: Input::Disconnected,
            }),
            (PortDir::Out, false) => node.outputs.push(OutputSlot {
                key: t.key,
                wire: t.wire,
            }),
        }
    }
    node
}

impl<'a> Compiler<'a> {
    pub(super) fn build(&mut self, index: usize) -> Result<Ast> {
        let list = self.list;
        let prefab = &list.prefabs[index];
        let name = prefab.name.as_str();

        // Block indexing.
        let mut placed: Placement<'a> = BTreeMap::new();
        for block in &prefab.blocks {
            let terminals =
                catalog::terminals(list, block.id).ok_or_else(|| CompileError::UnknownPrefab {
                    index: block.id.0.saturating_sub(list.builtin_threshold) as usize,
                    block: Some(BlockRef::new(name, block.id, block.pos)),
                })?;
            if placed.insert(block.pos, Placed { block, terminals }).is_some() {
                return Err(CompileError::DuplicateBlock {
                    prefab: name.to_string(),
                    pos: block.pos,
                });
            }
        }

        let wires = Wires::collect(name, &placed, &prefab.connections)?;
        let ports = Ports::collect(prefab, &placed)?;

        // Node instantiation, in spatial order so ids are stable.
        let mut order: Vec<&Placed<'a>> = placed.values().collect();
        order.sort_by(|a, b| spatial_cmp(&a.block.pos, &b.block.pos));

        let mut nodes: Vec<SyntaxNode> = Vec::new();
        let mut by_pos: BTreeMap<GridPos, NodeId> = BTreeMap::new();
        for p in order {
            let site = Site::new(name, p.block);
            let kind = match list.prefab_index(p.block.id) {
                Some(nested) => {
                    let ast = self.prefab(nested, Some(site.block_ref()))?;
                    NodeKind::custom(site, list.builtin_threshold, nested, ast)?
                }
                None => {
                    let family = catalog::lookup(p.block.id)
                        .map(|def| def.family)
                        .unwrap_or(Family::Inert);
                    match instantiate::builtin_kind(site, family, &mut self.vars)? {
                        Some(kind) => kind,
                        None => continue,
                    }
                }
            };
            by_pos.insert(p.block.pos, NodeId(nodes.len() as u32));
            nodes.push(empty_node(p.block, kind, &p.terminals));
        }

        let node_of = |at: Endpoint| -> Result<NodeId> {
            by_pos
                .get(&at.block)
                .copied()
                .ok_or_else(|| CompileError::DanglingTerminal {
                    prefab: name.to_string(),
                    endpoint: at,
                })
        };

        // Terminal resolution.
        for node in nodes.iter_mut() {
            let pos = node.pos;
            for slot in node.inputs.iter_mut() {
                let at = Endpoint::new(pos, slot.key);
                slot.source = match wires.producers.get(&at).map(Vec::as_slice) {
                    Some([from]) => Input::Wire(SyntaxTerminal::new(node_of(*from)?, from.key)),
                    Some(many) if many.len() > 1 => {
                        let terminal = terminal_at(&placed, name, at)?.name.to_string();
                        return Err(CompileError::AmbiguousInput {
                            block: BlockRef::new(name, node.block, pos),
                            terminal,
                            count: many.len(),
                        });
                    }
                    _ => match ports.value_inputs.get(&at) {
                        Some(outer) => Input::Port(*outer),
                        None => Input::Disconnected,
                    },
                };
            }
            for out in node.void_outputs.iter_mut() {
                let at = Endpoint::new(pos, out.key);
                let mut to = wires.targets.get(&at).cloned().unwrap_or_default();
                to.sort_by(|a, b| spatial_cmp(&a.block, &b.block).then(a.key.cmp(&b.key)));
                for t in to {
                    out.targets
                        .push(Target::Node(SyntaxTerminal::new(node_of(t)?, t.key)));
                }
                out.targets.extend(ports.exits(at).map(Target::Exit));
            }
        }

        let link = |(outer, inner): &(TerminalKey, Endpoint)| -> Result<PortLink> {
            Ok(PortLink {
                outer: *outer,
                inner: SyntaxTerminal::new(node_of(*inner)?, inner.key),
            })
        };
        let void_inputs = ports.void_inputs.iter().map(link).collect::<Result<Vec<_>>>()?;
        let void_outputs = ports.void_outputs.iter().map(link).collect::<Result<Vec<_>>>()?;
        let value_outputs = ports.value_outputs.iter().map(link).collect::<Result<Vec<_>>>()?;

        // Root discovery: statements nothing enters, labels, and nested
        // programs with roots of their own.
        let mut roots = Vec::new();
        for (i, node) in nodes.iter().enumerate() {
            let id = NodeId(i as u32);
            if let Some(&first) = node.void_inputs.first() {
                let free = node.void_inputs.iter().all(|key| {
                    let at = Endpoint::new(node.pos, *key);
                    !wires.entered.contains(&at) && !ports.exposes_input(at)
                });
                if free {
                    roots.push(Root {
                        node: id,
                        entry: Entry::Enter(first),
                    });
                }
            }
            // Labels have no input to be entered through, so each one
            // starts a chain of its own.
            if let NodeKind::Label(_) = node.kind {
                roots.push(Root {
                    node: id,
                    entry: Entry::Frame,
                });
            }
            if let NodeKind::Custom { ast, .. } = &node.kind {
                if !ast.roots.is_empty() {
                    roots.push(Root {
                        node: id,
                        entry: Entry::Frame,
                    });
                }
            }
        }
        roots.sort_by(|a, b| spatial_cmp(&nodes[a.node.index()].pos, &nodes[b.node.index()].pos));

        cycles::check(name, &nodes)?;
        goto::resolve(name, &mut nodes, &mut self.warnings)?;

        let mut variables: Vec<_> = nodes
            .iter()
            .filter_map(|n| match n.kind {
                NodeKind::GetVariable(v) | NodeKind::SetVariable(v) => Some(v),
                _ => None,
            })
            .collect();
        variables.sort();
        variables.dedup();

        let height = nodes
            .iter()
            .filter_map(|n| match &n.kind {
                NodeKind::Custom { ast, .. } => Some(ast.height + 1),
                _ => None,
            })
            .max()
            .unwrap_or(0);

        Ok(Ast {
            prefab: name.to_string(),
            nodes,
            roots,
            by_pos,
            variables,
            void_inputs,
            void_outputs,
            value_outputs,
            height,
        })
    }
}
