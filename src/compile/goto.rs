//! Goto/label binding and static goto-recursion detection.

use std::collections::{BTreeMap, BTreeSet};

use crate::error::{BlockRef, CompileError, CompileWarning, Result};
use crate::syntax::{NodeId, NodeKind, SyntaxNode, Target};

/// Bind every goto to its label, then reject chains of labels that lead
/// only to gotos and come back to a label already on the chain. Labels
/// defined more than once but never jumped to are reported in `warnings`.
pub(super) fn resolve(
    prefab: &str,
    nodes: &mut [SyntaxNode],
    warnings: &mut Vec<CompileWarning>,
) -> Result<()> {
    let mut labels: BTreeMap<String, Vec<NodeId>> = BTreeMap::new();
    for (i, node) in nodes.iter().enumerate() {
        if let NodeKind::Label(name) = &node.kind {
            labels.entry(name.clone()).or_default().push(NodeId(i as u32));
        }
    }

    let mut gotos = Vec::new();
    let mut referenced = BTreeSet::new();
    for i in 0..nodes.len() {
        let NodeKind::Goto { label, .. } = &nodes[i].kind else {
            continue;
        };
        let target = match labels.get(label).map(Vec::as_slice) {
            Some([one]) => *one,
            Some(many) if many.len() > 1 => {
                return Err(CompileError::AmbiguousLabel {
                    prefab: prefab.to_string(),
                    label: label.clone(),
                    positions: many.iter().map(|id| nodes[id.index()].pos).collect(),
                })
            }
            _ => {
                return Err(CompileError::UnresolvedGoto {
                    block: BlockRef::new(prefab, nodes[i].block, nodes[i].pos),
                    label: label.clone(),
                })
            }
        };
        referenced.insert(label.clone());
        if let NodeKind::Goto { target: slot, .. } = &mut nodes[i].kind {
            *slot = Some(target);
        }
        gotos.push(target);
    }

    for (label, ids) in &labels {
        if ids.len() > 1 && !referenced.contains(label) {
            warnings.push(CompileWarning::DuplicateLabel {
                prefab: prefab.to_string(),
                label: label.clone(),
                positions: ids.iter().map(|id| nodes[id.index()].pos).collect(),
            });
        }
    }

    let name = |id: NodeId| match &nodes[id.index()].kind {
        NodeKind::Label(name) => name.clone(),
        _ => String::new(),
    };
    let mut done = BTreeSet::new();
    for first in gotos {
        let mut chain = Vec::new();
        if let Some(again) = walk(nodes, first, &mut chain, &mut done) {
            return Err(CompileError::GotoRecursion {
                prefab: prefab.to_string(),
                first: name(again),
                chain: chain.into_iter().map(name).collect(),
            });
        }
    }
    Ok(())
}

/// Labels a label continues into when everything after it is a goto;
/// `None` once flow reaches any other statement, an exit or nothing.
fn jumps(nodes: &[SyntaxNode], label: NodeId) -> Option<Vec<NodeId>> {
    let targets = &nodes[label.index()].void_outputs.first()?.targets;
    if targets.is_empty() {
        return None;
    }
    targets
        .iter()
        .map(|t| match t {
            Target::Node(t) => match &nodes[t.node.index()].kind {
                NodeKind::Goto { target, .. } => *target,
                _ => None,
            },
            Target::Exit(_) => None,
        })
        .collect()
}

/// Depth-first walk over label → goto → label edges. Returns the label
/// that was reached twice, leaving `chain` holding every label from the
/// start of the walk up to the repeat. Labels in `done` are known to lead
/// out of every chain and are not entered again.
fn walk(
    nodes: &[SyntaxNode],
    label: NodeId,
    chain: &mut Vec<NodeId>,
    done: &mut BTreeSet<NodeId>,
) -> Option<NodeId> {
    if chain.contains(&label) {
        return Some(label);
    }
    if done.contains(&label) {
        return None;
    }
    chain.push(label);
    for next in jumps(nodes, label).unwrap_or_default() {
        if let Some(again) = walk(nodes, next, chain, done) {
            return Some(again);
        }
    }
    chain.pop();
    done.insert(label);
    None
}
