// pcg-core: Product Construction Graph compiler core

//! # Failure analyzer
//!
//! Enumerates failure combinations over a topology (§4.6), materializes the corresponding failed
//! PCG, and approximates a minimum edge cut by repeatedly removing a shortest path between two
//! states until none remains, the same `itertools::combinations` approach the teacher uses
//! elsewhere for exhaustive small-scale enumeration (e.g. `permutators`), paired with the
//! `Pcg::shortest_path` BFS already used by [dominators](crate::dominators)'s traversal backbone.

use crate::graph::{CgId, Pcg};
use crate::topology::Topology;
use itertools::Itertools;
use std::collections::HashSet;

/// A single failure: either a node going down, or a link between two locations.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Failure {
    /// An inside node at this location fails.
    Node(String),
    /// The link between these two locations fails (order-independent).
    Link(String, String),
}

/// All size-`n` combinations of failures drawn from inside-node failures and links with at least
/// one inside endpoint.
pub fn all_failures(n: usize, topo: &Topology) -> Vec<Vec<Failure>> {
    let mut candidates: Vec<Failure> = Vec::new();
    for id in topo.vertices() {
        if topo.is_inside(id) {
            candidates.push(Failure::Node(topo.node(id).loc.clone()));
        }
    }
    let mut seen_links: HashSet<(String, String)> = HashSet::new();
    for (u, v) in topo.edges() {
        if topo.is_inside(u) || topo.is_inside(v) {
            let (lu, lv) = (topo.node(u).loc.clone(), topo.node(v).loc.clone());
            let key = if lu <= lv { (lu.clone(), lv.clone()) } else { (lv.clone(), lu.clone()) };
            if seen_links.insert(key) {
                candidates.push(Failure::Link(lu, lv));
            }
        }
    }
    candidates.into_iter().combinations(n).collect()
}

/// Clone `cg` and apply a set of failures: remove vertices whose location appears among failed
/// nodes, and remove edges whose location pair (either direction) matches a failed link.
pub fn failed_graph(cg: &Pcg, failures: &[Failure]) -> Pcg {
    let failed_nodes: HashSet<&str> = failures
        .iter()
        .filter_map(|f| match f {
            Failure::Node(loc) => Some(loc.as_str()),
            Failure::Link(..) => None,
        })
        .collect();
    let failed_links: HashSet<(String, String)> = failures
        .iter()
        .filter_map(|f| match f {
            Failure::Link(a, b) => {
                Some(if a <= b { (a.clone(), b.clone()) } else { (b.clone(), a.clone()) })
            }
            Failure::Node(_) => None,
        })
        .collect();

    let mut out = cg.copy_graph();
    out.remove_vertices_where(|s| failed_nodes.contains(s.node.loc.as_str()));

    let locs: std::collections::HashMap<CgId, String> =
        out.vertices().map(|id| (id, out.state(id).node.loc.clone())).collect();
    out.remove_edges_where(|u, v| {
        let (lu, lv) = (&locs[&u], &locs[&v]);
        let key = if lu <= lv { (lu.clone(), lv.clone()) } else { (lv.clone(), lu.clone()) };
        failed_links.contains(&key)
    });
    out
}

/// Repeatedly remove a shortest path between `src` and `dst` until none remains; returns the
/// iteration count, an approximation of the minimum edge cut between the two states.
pub fn disconnect(cg: &mut Pcg, src: CgId, dst: CgId) -> usize {
    let mut count = 0;
    while let Some(path) = cg.shortest_path(src, dst) {
        if path.is_empty() {
            break;
        }
        let doomed: HashSet<(CgId, CgId)> = path.into_iter().collect();
        cg.remove_edges_where(|u, v| doomed.contains(&(u, v)));
        count += 1;
    }
    count
}

/// Over all `(src, dst)` pairs with `dst` at `dst_loc`, the minimum [`disconnect`] count minus
/// one, with the witness pair's locations; `None` when either side is empty.
pub fn disconnect_locs(
    cg: &Pcg,
    srcs: &[CgId],
    dst_loc: &str,
) -> Option<(usize, String, String)> {
    let dsts: Vec<CgId> =
        cg.vertices().filter(|&id| cg.state(id).node.loc == dst_loc).collect();
    if srcs.is_empty() || dsts.is_empty() {
        return None;
    }

    let mut best: Option<(usize, String, String)> = None;
    for &src in srcs {
        for &dst in &dsts {
            if src == dst {
                continue;
            }
            let mut copy = cg.copy_graph();
            let k = disconnect(&mut copy, src, dst);
            let candidate = (k.saturating_sub(1), cg.state(src).node.loc.clone(), dst_loc.to_string());
            best = Some(match best {
                Some(b) if b.0 <= candidate.0 => b,
                _ => candidate,
            });
        }
    }
    best
}
