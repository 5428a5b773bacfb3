//! Implicit void connections from spatial adjacency.
//!
//! Stacking a statement directly in front of another wires the back
//! block's void output to the front block's void input without an explicit
//! wire: the input sits one voxel in -z from the output.

use std::collections::{BTreeMap, BTreeSet};

use crate::graph::catalog::Terminal;
use crate::graph::{Endpoint, GridPos, PortDir};

/// A synthesized wire, already oriented output → input.
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
pub struct ImplicitWire {
    pub from: Endpoint,
    pub to: Endpoint,
}

fn block_pair(a: GridPos, b: GridPos) -> (GridPos, GridPos) {
    if a <= b {
        (a, b)
    } else {
        (b, a)
    }
}

/// Pairs of blocks that explicit void wires already join, in canonical
/// (unordered) form.
#[derive(Clone, Debug, Default)]
pub struct ExplicitVoidPairs(BTreeSet<(GridPos, GridPos)>);

impl ExplicitVoidPairs {
    pub fn insert(&mut self, a: GridPos, b: GridPos) {
        self.0.insert(block_pair(a, b));
    }

    pub fn contains(&self, a: GridPos, b: GridPos) -> bool {
        self.0.contains(&block_pair(a, b))
    }
}

/// Synthesize adjacency wires for `blocks` (position and terminal layout).
///
/// A block never wires to itself, and no wire is made between two blocks
/// that an explicit void wire already joins. The result is sorted.
pub fn synthesize<'a>(
    blocks: impl IntoIterator<Item = (GridPos, &'a [Terminal])>,
    explicit: &ExplicitVoidPairs,
) -> Vec<ImplicitWire> {
    let mut inputs: BTreeMap<[i32; 3], Endpoint> = BTreeMap::new();
    let mut outputs: Vec<([i32; 3], Endpoint)> = Vec::new();

    for (pos, terminals) in blocks {
        for t in terminals.iter().filter(|t| t.wire.is_void()) {
            let voxel = pos.voxel(t.key);
            let endpoint = Endpoint::new(pos, t.key);
            match t.dir {
                PortDir::In => {
                    inputs.insert(voxel, endpoint);
                }
                PortDir::Out => outputs.push((voxel, endpoint)),
            }
        }
    }

    let mut wires: Vec<ImplicitWire> = outputs
        .into_iter()
        .filter_map(|([x, y, z], from)| {
            let to = *inputs.get(&[x, y, z - 1])?;
            if to.block == from.block || explicit.contains(from.block, to.block) {
                return None;
            }
            Some(ImplicitWire { from, to })
        })
        .collect();
    wires.sort();
    wires
}
