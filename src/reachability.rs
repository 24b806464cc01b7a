// pcg-core: Product Construction Graph compiler core

//! # Reachability
//!
//! Plain DFS and postorder traversal over a [`Pcg`], in either edge direction. Used directly by
//! the [minimizer](crate::minimizer) (to find states no longer on any Start-to-End path) and as
//! the traversal backbone for [dominators](crate::dominators).

use crate::bitset::BitSet31;
use crate::graph::{CgId, Pcg};
use std::collections::HashSet;

/// Direction to traverse a [`Pcg`] in.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Direction {
    /// Follow outgoing edges.
    Down,
    /// Follow incoming edges.
    Up,
}

fn step(pcg: &Pcg, id: CgId, dir: Direction) -> Vec<CgId> {
    match dir {
        Direction::Down => pcg.out_neighbors(id).collect(),
        Direction::Up => pcg.in_neighbors(id).collect(),
    }
}

/// Every state reachable from `src` (inclusive), following `dir`. Marks each node at most once.
pub fn dfs(pcg: &Pcg, src: CgId, dir: Direction) -> HashSet<CgId> {
    let mut seen = HashSet::new();
    let mut stack = vec![src];
    seen.insert(src);
    while let Some(u) = stack.pop() {
        for v in step(pcg, u, dir) {
            if seen.insert(v) {
                stack.push(v);
            }
        }
    }
    seen
}

/// The same reachable set as [`dfs`], ordered so that every node appears after all nodes it can
/// reach in direction `dir` (a postorder of the DFS forest), the order [dominators](crate::dominators)
/// needs for its iterative fixpoint.
pub fn post_order(pcg: &Pcg, src: CgId, dir: Direction) -> Vec<CgId> {
    let mut visited = HashSet::new();
    let mut order = Vec::new();

    // Explicit stack holding (node, iterator-position) to avoid recursion depth on large PCGs.
    let mut stack: Vec<(CgId, std::vec::IntoIter<CgId>)> = Vec::new();
    visited.insert(src);
    stack.push((src, step(pcg, src, dir).into_iter()));

    while let Some((u, iter)) = stack.last_mut() {
        match iter.next() {
            Some(v) => {
                if visited.insert(v) {
                    let children = step(pcg, v, dir).into_iter();
                    stack.push((v, children));
                }
            }
            None => {
                order.push(*u);
                stack.pop();
            }
        }
    }
    order
}

/// The union of `Accept` over every state reachable from `src` in direction `dir` (inclusive of
/// `src`).
pub fn src_accepting(pcg: &Pcg, src: CgId, dir: Direction) -> BitSet31 {
    dfs(pcg, src, dir).into_iter().fold(BitSet31::empty(), |acc, id| acc.union(pcg.state(id).accept))
}
