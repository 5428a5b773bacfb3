//! Value-graph acyclicity: every pull chain must terminate.

use petgraph::algo::toposort;
use petgraph::graph::{DiGraph, NodeIndex};

use crate::error::{BlockRef, CompileError, Result};
use crate::syntax::{Input, NodeId, SyntaxNode};

fn cycle_at(prefab: &str, node: &SyntaxNode) -> CompileError {
    CompileError::ValueCycle {
        block: BlockRef::new(prefab, node.block, node.pos),
    }
}

/// Fails with `ValueCycle` naming a block on a cycle of value wires.
pub(super) fn check(prefab: &str, nodes: &[SyntaxNode]) -> Result<()> {
    let mut graph: DiGraph<NodeId, ()> = DiGraph::with_capacity(nodes.len(), nodes.len());
    let indices: Vec<NodeIndex> = (0..nodes.len())
        .map(|i| graph.add_node(NodeId(i as u32)))
        .collect();

    for (i, node) in nodes.iter().enumerate() {
        for slot in &node.inputs {
            if let Input::Wire(t) = slot.source {
                if t.node.index() == i {
                    return Err(cycle_at(prefab, node));
                }
                graph.add_edge(indices[t.node.index()], indices[i], ());
            }
        }
    }

    toposort(&graph, None).map(|_| ()).map_err(|cycle| {
        let id = graph[cycle.node_id()];
        cycle_at(prefab, &nodes[id.index()])
    })
}
