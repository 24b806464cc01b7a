// pcg-core: Product Construction Graph compiler core

//! # Minimizer
//!
//! Applies the reductions of §4.3 to fixpoint: unreachable/cannot-reach pruning, redundant
//! external nodes, connections to repeated-out states, and dominated states/edges. Every pass is
//! monotone (removes vertices/edges, never adds), so the `|V| + |E|` monovariant guarantees
//! termination; the loop itself mirrors the convergence-loop logging style the teacher uses in
//! `netsim::Network` (`log::debug!`/`log::info!` at each step with running counts).

use crate::dominators::DomTree;
use crate::graph::{CgId, Pcg};
use crate::reachability::{self, Direction};
use log::info;
use std::collections::HashSet;

/// Apply every reduction to fixpoint, mutating `pcg` in place.
pub fn minimize(pcg: &mut Pcg) {
    loop {
        let before = pcg.vertex_count() + pcg.edge_count();

        remove_unreachable_from_end(pcg);
        remove_cannot_reach_from_start(pcg);
        remove_redundant_external(pcg);
        remove_connections_to_out_star(pcg);
        remove_dominated(pcg);

        let after = pcg.vertex_count() + pcg.edge_count();
        info!(
            "minimizer pass: |V|+|E| {} -> {} ({} vertices, {} edges)",
            before,
            after,
            pcg.vertex_count(),
            pcg.edge_count()
        );
        if after == before {
            break;
        }
        debug_assert!(after <= before, "minimization passes must be monotone");
    }
}

/// Remove real topology nodes from which End is not reachable via outgoing edges.
fn remove_unreachable_from_end(pcg: &mut Pcg) {
    let can_reach_end = reachability::dfs(pcg, pcg.end(), Direction::Up);
    pcg.remove_vertices_where(|s| s.is_topo_state() && !can_reach_end.contains(&lookup_id(s)));
}

/// Remove real topology nodes Start cannot reach.
fn remove_cannot_reach_from_start(pcg: &mut Pcg) {
    let reachable = reachability::dfs(pcg, pcg.start(), Direction::Down);
    pcg.remove_vertices_where(|s| s.is_topo_state() && !reachable.contains(&lookup_id(s)));
}

/// `CgState::id` and its `NodeIndex` are the same number, by the whole-crate `Id == NodeIndex`
/// invariant; this just spells that out at the type level for closures that only see a `&CgState`.
fn lookup_id(s: &crate::graph::CgState) -> CgId {
    CgId::new(s.id as usize)
}

/// Remove external neighbors of a repeated-out state that are indistinguishable from continuing
/// through its self-loop.
fn remove_redundant_external(pcg: &mut Pcg) {
    let repeated_outs: Vec<CgId> =
        pcg.vertices().filter(|&id| pcg.is_repeated_out(id)).collect();

    let mut doomed: HashSet<CgId> = HashSet::new();
    for os in repeated_outs {
        let os_in: HashSet<CgId> = pcg.in_neighbors(os).collect();
        let os_out: HashSet<CgId> = pcg.out_neighbors(os).collect();
        let neighbors: HashSet<CgId> = os_in.iter().chain(os_out.iter()).copied().collect();

        for n in neighbors {
            if n == os || !pcg.state(n).node.kind.is_outside() {
                continue;
            }
            let n_in: HashSet<CgId> = pcg.in_neighbors(n).collect();
            let n_out: HashSet<CgId> = pcg.out_neighbors(n).collect();

            let redundant_by_out = pcg.out_degree(n) == 1 && n_in.is_subset(&os_in);
            let redundant_by_in = pcg.in_degree(n) == 1 && n_out.is_subset(&os_out);
            if redundant_by_out || redundant_by_in {
                doomed.insert(n);
            }
        }
    }
    pcg.remove_vertices_where(|s| doomed.contains(&lookup_id(s)));
}

/// Remove edges into/out of repeated-out states per the (non-obviously-symmetric, mirrored
/// verbatim from the spec) `removeConnectionsToOutStar` rules; see the Open Question in §9.
fn remove_connections_to_out_star(pcg: &mut Pcg) {
    let edges: Vec<(CgId, CgId)> = pcg.edges().collect();
    let mut doomed: HashSet<(CgId, CgId)> = HashSet::new();

    for (x, y) in edges {
        if !pcg.state(x).is_topo_state() || !pcg.state(y).is_topo_state() {
            continue;
        }
        let remove = if pcg.is_repeated_out(x) {
            pcg.in_neighbors(y).any(|n| pcg.state(n).node.kind.is_inside())
        } else if pcg.is_repeated_out(y) {
            let has_inside_out_neighbor = pcg.out_neighbors(x).any(|n| pcg.state(n).node.kind.is_inside());
            let start_in_y = pcg.in_neighbors(y).any(|n| n == pcg.start());
            let start_in_x = pcg.in_neighbors(x).any(|n| n == pcg.start());
            has_inside_out_neighbor && (start_in_y || !start_in_x)
        } else {
            false
        };
        if remove {
            doomed.insert((x, y));
        }
    }
    pcg.remove_edges_where(|u, v| doomed.contains(&(u, v)));
}

/// Remove states and edges dominated by a shadowing ancestor, for concrete (non-repeated-out)
/// topology states.
fn remove_dominated(pcg: &mut Pcg) {
    let dom_fwd = DomTree::forward(pcg);
    let dom_bwd = DomTree::backward(pcg);

    // Step 1: dominated vertices.
    let mut doomed_vertices: HashSet<CgId> = HashSet::new();
    for v in pcg.vertices() {
        if !pcg.state(v).is_topo_state() || pcg.is_repeated_out(v) {
            continue;
        }
        let loc = pcg.state(v).node.loc.clone();
        let shadows_v = |anc: CgId| pcg.state(anc).node.loc == loc;
        if dom_fwd.first_ancestor_matching(v, shadows_v).is_some()
            || dom_bwd.first_ancestor_matching(v, shadows_v).is_some()
        {
            doomed_vertices.insert(v);
        }
    }
    pcg.remove_vertices_where(|s| doomed_vertices.contains(&lookup_id(s)));

    // Step 2: reverse edges shadowed by their own forward counterpart.
    let edges: Vec<(CgId, CgId)> = pcg.edges().collect();
    let edge_set: HashSet<(CgId, CgId)> = edges.iter().copied().collect();
    let mut doomed_edges: HashSet<(CgId, CgId)> = HashSet::new();
    for &(y, x) in &edges {
        if edge_set.contains(&(x, y))
            && !pcg.is_repeated_out(y)
            && !pcg.is_repeated_out(x)
            && (dom_fwd.dominates(y, x) || dom_bwd.dominates(x, y))
        {
            doomed_edges.insert((y, x));
        }
    }

    // Step 3: edges into states backward-dominated by a shadow of their source.
    let vertices: Vec<CgId> = pcg.vertices().collect();
    for &(x, y) in &edges {
        if doomed_edges.contains(&(x, y)) {
            continue;
        }
        let loc = pcg.state(x).node.loc.clone();
        let shadowed_by_dom = vertices.iter().any(|&v| {
            v != x && pcg.state(v).node.loc == loc && dom_bwd.dominates(v, y)
        });
        if shadowed_by_dom {
            doomed_edges.insert((x, y));
        }
    }

    pcg.remove_edges_where(|u, v| doomed_edges.contains(&(u, v)));
}
