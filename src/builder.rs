// pcg-core: Product Construction Graph compiler core

//! # PCG builder
//!
//! Performs the product construction of §4.1: a worklist-driven exploration of the topology
//! crossed with up to 31 per-preference DFAs, deduplicated by `(composite state, location)` and
//! pruned of states that can only ever reach garbage. Grounded in the teacher's own pattern of
//! building a graph incrementally while consulting a dedup table keyed on structural identity
//! (`used_labels`/`node_lookup` in its GML parser), generalized here into the
//! [`Reindexer`](crate::reindex::Reindexer).

use crate::bitset::BitSet31;
use crate::dfa::Dfa;
use crate::error::Error;
use crate::graph::{CgState, Pcg};
use crate::reindex::Reindexer;
use crate::topology::{NodeKind, Topology, TopoNode};
use log::debug;
use petgraph::stable_graph::StableGraph;
use std::collections::HashMap;
use std::collections::VecDeque;
use std::rc::Rc;

const MAX_PREFERENCES: usize = 31;

/// A not-yet-finalized PCG vertex, built up while exploring the product.
#[derive(Debug, Clone)]
struct Wip {
    composite: Vec<u32>,
    node: TopoNode,
    accept: BitSet31,
}

/// Build the PCG recognizing exactly the router-location words accepted by every automaton in
/// `autos`, labeling each state with the preference levels it satisfies. See §4.1.
pub fn build_from_automata(topo: Rc<Topology>, autos: &[Dfa]) -> Result<Pcg, Error> {
    if autos.len() > MAX_PREFERENCES {
        return Err(Error::TooManyPreferences(autos.len()));
    }
    if !topo.is_well_formed() {
        return Err(Error::MalformedTopology);
    }

    let garbage: Vec<std::collections::HashSet<u32>> =
        autos.iter().map(Dfa::garbage_states).collect();

    let mut wips: Vec<Wip> = Vec::new();
    let mut edges: Vec<(usize, usize)> = Vec::new();
    let mut dedup: HashMap<(Vec<u32>, String), usize> = HashMap::new();

    let start_idx = wips.len();
    wips.push(Wip {
        composite: autos.iter().map(Dfa::q0).collect(),
        node: TopoNode::new("$start", NodeKind::Start),
        accept: BitSet31::empty(),
    });

    let mut worklist: VecDeque<usize> = VecDeque::new();
    worklist.push_back(start_idx);

    while let Some(cur_idx) = worklist.pop_front() {
        let cur = wips[cur_idx].clone();

        let mut adj: Vec<TopoNode> = match cur.node.kind {
            NodeKind::Start => topo
                .originators()
                .map(|id| topo.node(id).clone())
                .collect(),
            _ => topo.neighbor_nodes(&cur.node.loc),
        };
        if cur.node.kind == NodeKind::Unknown {
            adj.push(cur.node.clone());
        }

        for c in adj {
            let mut next_composite = Vec::with_capacity(autos.len());
            let mut total = true;
            for (i, auto) in autos.iter().enumerate() {
                match auto.transition(cur.composite[i], &c.loc) {
                    Some(ns) => next_composite.push(ns),
                    None => {
                        total = false;
                        break;
                    }
                }
            }
            if !total {
                // No automaton defines a transition for this symbol: there is no valid successor
                // state, so this branch contributes no path.
                continue;
            }

            let is_dead = (0..autos.len()).all(|i| garbage[i].contains(&next_composite[i]));
            if is_dead {
                continue;
            }

            let key = (next_composite.clone(), c.loc.clone());
            let succ_idx = if let Some(&idx) = dedup.get(&key) {
                idx
            } else {
                let can_originate = topo
                    .node_by_loc(&c.loc)
                    .map(|id| topo.can_originate_traffic(id))
                    .unwrap_or(false);
                let accept: BitSet31 = (0..autos.len())
                    .filter(|&i| can_originate && autos[i].is_accepting(next_composite[i]))
                    .map(|i| (i + 1) as u32)
                    .collect();
                let idx = wips.len();
                wips.push(Wip { composite: next_composite, node: c.clone(), accept });
                dedup.insert(key, idx);
                worklist.push_back(idx);
                idx
            };
            edges.push((cur_idx, succ_idx));
        }
    }

    let end_idx = wips.len();
    wips.push(Wip {
        composite: Vec::new(),
        node: TopoNode::new("$end", NodeKind::End),
        accept: BitSet31::empty(),
    });
    for (idx, wip) in wips.iter().enumerate() {
        if idx != end_idx && !wip.accept.is_empty() {
            edges.push((idx, end_idx));
        }
    }

    debug!(
        "pcg builder: explored {} states ({} edges) before reindexing",
        wips.len(),
        edges.len()
    );

    // Final order: Start=0, End=1, everything else from 2, in first-discovered (wip) order.
    let mut final_order: Vec<usize> = vec![start_idx, end_idx];
    for idx in 0..wips.len() {
        if idx != start_idx && idx != end_idx {
            final_order.push(idx);
        }
    }
    let mut wip_to_final: HashMap<usize, u32> = HashMap::new();
    for (final_id, &wip_idx) in final_order.iter().enumerate() {
        wip_to_final.insert(wip_idx, final_id as u32);
    }

    let mut composite_reindex: Reindexer<Vec<u32>> = Reindexer::new();
    let mut graph: StableGraph<CgState, (), petgraph::Directed, u32> = StableGraph::default();
    for &wip_idx in &final_order {
        let wip = &wips[wip_idx];
        let state = if wip_idx == end_idx {
            // assigned after every real composite is reindexed, see below.
            u32::MAX
        } else {
            composite_reindex.get_or_insert(wip.composite.clone())
        };
        graph.add_node(CgState {
            id: wip_to_final[&wip_idx],
            state,
            accept: wip.accept,
            node: wip.node.clone(),
        });
    }
    // End has no meaningful composite state; give it a fresh id past every real one.
    let end_state = composite_reindex.len() as u32;
    graph[petgraph::graph::NodeIndex::new(wip_to_final[&end_idx] as usize)].state = end_state;

    for (src, dst) in edges {
        let src_id = petgraph::graph::NodeIndex::new(wip_to_final[&src] as usize);
        let dst_id = petgraph::graph::NodeIndex::new(wip_to_final[&dst] as usize);
        graph.add_edge(src_id, dst_id, ());
    }

    Ok(Pcg::from_parts(graph, topo))
}
