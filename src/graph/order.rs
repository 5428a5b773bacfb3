//! Spatial ordering of blocks.
//!
//! Code reads top-to-bottom, back-to-front: depth (z) descending, then
//! height (y) descending, then horizontal (x) ascending.

use std::cmp::Ordering;

use crate::graph::GridPos;

/// Total order over grid positions used for roots and fan-out.
pub fn spatial_cmp(a: &GridPos, b: &GridPos) -> Ordering {
    b.z.cmp(&a.z)
        .then_with(|| b.y.cmp(&a.y))
        .then_with(|| a.x.cmp(&b.x))
}

/// Sort items by the spatial order of the position `key` extracts.
pub fn sort_spatially<T>(items: &mut [T], key: impl Fn(&T) -> GridPos) {
    items.sort_by(|a, b| spatial_cmp(&key(a), &key(b)));
}
