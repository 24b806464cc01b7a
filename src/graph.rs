// pcg-core: Product Construction Graph compiler core

//! # PCG state and graph container
//!
//! `CgState` is the vertex type of a Product Construction Graph; `Pcg` is the graph itself,
//! wrapping a `petgraph` `StableGraph` the same way the teacher wraps `IgpNetwork` inside
//! `netsim::Network` (graph plus a little side bookkeeping, never a bare graph type exposed to
//! callers).
//!
//! By construction, a `CgState`'s `id` always equals the `NodeIndex` it lives at in the
//! `StableGraph`: states are inserted in `Id` order at build time and `StableGraph` never
//! resequences surviving indices when nodes are removed, so `NodeIndex::new(id as usize)` is
//! always the right lookup and no separate id-to-index table is needed.

use crate::bitset::BitSet31;
use crate::topology::{weakly_connected_components, NodeId as TopoNodeId, Topology, TopoNode};
use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::{Directed, Direction};
use std::collections::{HashMap, HashSet, VecDeque};
use std::rc::Rc;

/// Dense index of a [`CgState`] within a [`Pcg`]'s graph; equal to `CgState::id`.
pub type CgId = petgraph::graph::NodeIndex<u32>;

/// `Id` of the unique Start state in any [`Pcg`].
pub const START_ID: u32 = 0;
/// `Id` of the unique End state in any [`Pcg`].
pub const END_ID: u32 = 1;

/// A single PCG vertex.
///
/// Identity, equality, hashing, and ordering are all by `id` alone: two `CgState`s with the
/// same `id` are the same vertex, regardless of what their other fields say (they never should
/// differ, short of a bug).
#[derive(Debug, Clone)]
pub struct CgState {
    /// Unique id, assigned at construction; `0` is Start, `1` is End.
    pub id: u32,
    /// The product-DFA composite state, reindexed into a dense integer.
    pub state: u32,
    /// Preference levels accepted in this state.
    pub accept: BitSet31,
    /// The topology location this state sits at.
    pub node: TopoNode,
}

impl PartialEq for CgState {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}
impl Eq for CgState {}
impl std::hash::Hash for CgState {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        self.id.hash(state);
    }
}
impl PartialOrd for CgState {
    fn partial_cmp(&self, other: &Self) -> Option<std::cmp::Ordering> {
        Some(self.cmp(other))
    }
}
impl Ord for CgState {
    fn cmp(&self, other: &Self) -> std::cmp::Ordering {
        self.id.cmp(&other.id)
    }
}

impl CgState {
    /// Returns `true` if this state shadows `other`: they are distinct states at the same
    /// topology location.
    pub fn shadows(&self, other: &Self) -> bool {
        self.id != other.id && self.node.loc == other.node.loc
    }

    /// Returns `true` if this is an `Unknown`-typed state with a self-loop, i.e. stands in for an
    /// unbounded collection of external ASes. Computed by the caller via [`Pcg::is_repeated_out`]
    /// since it needs edge information this type alone doesn't carry.
    pub fn is_unknown(&self) -> bool {
        self.node.kind == crate::topology::NodeKind::Unknown
    }

    /// Returns `true` unless this is the synthetic Start or End state.
    pub fn is_topo_state(&self) -> bool {
        self.node.kind.is_topo_kind()
    }
}

type Backing = StableGraph<CgState, (), Directed, u32>;

/// The Product Construction Graph: Start, End, a directed graph of [`CgState`]s, and the
/// underlying (shared, read-only) topology.
#[derive(Debug, Clone)]
pub struct Pcg {
    pub(crate) graph: Backing,
    pub(crate) topo: Rc<Topology>,
}

impl Pcg {
    /// Construct a PCG directly from a graph whose node ids already satisfy the `Id`-equals-
    /// `NodeIndex` invariant. Used only by [`crate::builder`].
    pub(crate) fn from_parts(graph: Backing, topo: Rc<Topology>) -> Self {
        debug_assert!(graph.node_indices().all(|idx| graph[idx].id == idx.index() as u32));
        Self { graph, topo }
    }

    /// The Start state (`Id = 0`).
    pub fn start(&self) -> CgId {
        CgId::new(START_ID as usize)
    }

    /// The End state (`Id = 1`).
    pub fn end(&self) -> CgId {
        CgId::new(END_ID as usize)
    }

    /// The underlying topology.
    pub fn topology(&self) -> &Topology {
        &self.topo
    }

    /// Look up a state by id.
    pub fn state(&self, id: CgId) -> &CgState {
        &self.graph[id]
    }

    /// All state ids currently in the PCG.
    pub fn vertices(&self) -> impl Iterator<Item = CgId> + '_ {
        self.graph.node_indices()
    }

    /// Number of states.
    pub fn vertex_count(&self) -> usize {
        self.graph.node_count()
    }

    /// Number of edges.
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }

    /// `true` if the PCG has no real states left beyond Start/End (e.g. after minimization prunes
    /// everything, which is not an error condition, per §7, just a result the caller must check).
    pub fn is_empty(&self) -> bool {
        self.vertex_count() <= 2
    }

    /// All edges, as `(source, target)` id pairs.
    pub fn edges(&self) -> impl Iterator<Item = (CgId, CgId)> + '_ {
        self.graph.edge_references().map(|e| (e.source(), e.target()))
    }

    /// Add an edge `from -> to`.
    pub fn add_edge(&mut self, from: CgId, to: CgId) {
        self.graph.add_edge(from, to, ());
    }

    /// Out-neighbors of `id`.
    pub fn out_neighbors(&self, id: CgId) -> impl Iterator<Item = CgId> + '_ {
        self.graph.neighbors_directed(id, Direction::Outgoing)
    }

    /// In-neighbors of `id`.
    pub fn in_neighbors(&self, id: CgId) -> impl Iterator<Item = CgId> + '_ {
        self.graph.neighbors_directed(id, Direction::Incoming)
    }

    /// Out-degree of `id`.
    pub fn out_degree(&self, id: CgId) -> usize {
        self.graph.neighbors_directed(id, Direction::Outgoing).count()
    }

    /// In-degree of `id`.
    pub fn in_degree(&self, id: CgId) -> usize {
        self.graph.neighbors_directed(id, Direction::Incoming).count()
    }

    /// `true` if `id` is an `Unknown`-typed state with an edge to itself.
    pub fn is_repeated_out(&self, id: CgId) -> bool {
        self.state(id).is_unknown() && self.graph.find_edge(id, id).is_some()
    }

    /// Remove every vertex matching `pred`. Removing a vertex also removes its incident edges
    /// (`StableGraph::remove_node`'s own behavior). Start and End are never removed even if
    /// `pred` matches them.
    pub fn remove_vertices_where(&mut self, mut pred: impl FnMut(&CgState) -> bool) {
        let start = self.start();
        let end = self.end();
        let doomed: Vec<CgId> = self
            .graph
            .node_indices()
            .filter(|&id| id != start && id != end && pred(&self.graph[id]))
            .collect();
        for id in doomed {
            self.graph.remove_node(id);
        }
    }

    /// Remove every edge matching `pred`.
    pub fn remove_edges_where(&mut self, mut pred: impl FnMut(CgId, CgId) -> bool) {
        let doomed: Vec<_> = self
            .graph
            .edge_references()
            .filter(|e| pred(e.source(), e.target()))
            .map(|e| e.id())
            .collect();
        for e in doomed {
            self.graph.remove_edge(e);
        }
    }

    /// Number of weakly-connected components of the PCG graph.
    pub fn weakly_connected_components(&self) -> usize {
        weakly_connected_components(&self.graph)
    }

    /// Shortest path (fewest edges, unit weights) from `src` to `dst`, as the sequence of edges
    /// traversed (`(u, v)` pairs), via BFS. `None` if `dst` is unreachable from `src`.
    pub fn shortest_path(&self, src: CgId, dst: CgId) -> Option<Vec<(CgId, CgId)>> {
        if src == dst {
            return Some(Vec::new());
        }
        let mut prev: HashMap<CgId, CgId> = HashMap::new();
        let mut visited: HashSet<CgId> = HashSet::new();
        visited.insert(src);
        let mut queue = VecDeque::new();
        queue.push_back(src);
        while let Some(u) = queue.pop_front() {
            for v in self.out_neighbors(u) {
                if visited.insert(v) {
                    prev.insert(v, u);
                    if v == dst {
                        let mut path = Vec::new();
                        let mut cur = dst;
                        while let Some(&p) = prev.get(&cur) {
                            path.push((p, cur));
                            cur = p;
                        }
                        path.reverse();
                        return Some(path);
                    }
                    queue.push_back(v);
                }
            }
        }
        None
    }

    /// Structural clone: a fresh, independently owned copy of this PCG, with identical ids and
    /// edges, sharing the same (read-only) topology. Establishes an owner-exclusive copy before
    /// destructive passes (`restrict`, failure analysis, regex extraction), per §5.
    pub fn copy_graph(&self) -> Self {
        self.clone()
    }

    /// Structural clone with every edge reversed; vertex set and `Id`s are identical, and `(u, v)`
    /// is an edge of the copy iff `(v, u)` was an edge of `self`.
    pub fn copy_reverse_graph(&self) -> Self {
        let mut reversed = self.clone();
        reversed.graph.clear_edges();
        for (u, v) in self.edges() {
            reversed.graph.add_edge(v, u, ());
        }
        reversed
    }

    /// The union of `Accept` over every state.
    pub fn preferences(&self) -> BitSet31 {
        self.vertices().fold(BitSet31::empty(), |acc, id| acc.union(self.state(id).accept))
    }

    /// The set of topology locations with at least one accepting state.
    pub fn accepting_locations(&self) -> HashSet<String> {
        self.vertices()
            .filter(|&id| !self.state(id).accept.is_empty())
            .map(|id| self.state(id).node.loc.clone())
            .collect()
    }

    /// A copy restricted to states whose minimum accepted preference is `<= i` (states with an
    /// empty accept set, i.e. `minimum() == None`, are never removed by this rule since they
    /// can't exceed `i`). Removes exactly those states whose minimum accepted preference is
    /// `> i` (subtly different from "no accepted preference `<= i`"; see §9).
    pub fn restrict(&self, i: u32) -> Self {
        let mut out = self.copy_graph();
        out.remove_vertices_where(|s| matches!(s.accept.minimum(), Some(m) if m > i));
        out
    }

    /// Group every vertex (other than Start/End) by its topology location.
    pub fn by_location(&self) -> HashMap<String, Vec<CgId>> {
        let mut map: HashMap<String, Vec<CgId>> = HashMap::new();
        for id in self.vertices() {
            let s = self.state(id);
            if s.is_topo_state() {
                map.entry(s.node.loc.clone()).or_default().push(id);
            }
        }
        map
    }

    /// Original topology node id backing a given state's location, if still present in the
    /// topology (used by passes that need to cross-reference topology adjacency).
    pub fn topo_node_of(&self, id: CgId) -> Option<TopoNodeId> {
        self.topo.node_by_loc(&self.state(id).node.loc)
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::topology::NodeKind;

    fn tiny_pcg() -> Pcg {
        let mut topo = Topology::new();
        let a = topo.add_node("A", NodeKind::InsideOriginates);
        topo.add_edge(a, a);
        let topo = Rc::new(topo);

        let mut graph: Backing = StableGraph::default();
        let start = graph.add_node(CgState {
            id: 0,
            state: 0,
            accept: BitSet31::empty(),
            node: TopoNode::new("$start", NodeKind::Start),
        });
        let end = graph.add_node(CgState {
            id: 1,
            state: 0,
            accept: BitSet31::empty(),
            node: TopoNode::new("$end", NodeKind::End),
        });
        let mid = graph.add_node(CgState {
            id: 2,
            state: 1,
            accept: BitSet31::singleton(1),
            node: TopoNode::new("A", NodeKind::InsideOriginates),
        });
        graph.add_edge(start, mid, ());
        graph.add_edge(mid, end, ());

        Pcg::from_parts(graph, topo)
    }

    #[test]
    fn start_end_ids_are_fixed() {
        let pcg = tiny_pcg();
        assert_eq!(pcg.start().index() as u32, START_ID);
        assert_eq!(pcg.end().index() as u32, END_ID);
    }

    #[test]
    fn degrees_and_neighbors() {
        let pcg = tiny_pcg();
        assert_eq!(pcg.out_degree(pcg.start()), 1);
        assert_eq!(pcg.in_degree(pcg.end()), 1);
        assert_eq!(pcg.out_neighbors(pcg.start()).collect::<Vec<_>>(), vec![CgId::new(2)]);
    }

    #[test]
    fn shortest_path_bfs() {
        let pcg = tiny_pcg();
        let path = pcg.shortest_path(pcg.start(), pcg.end()).unwrap();
        assert_eq!(path.len(), 2);
    }

    #[test]
    fn copy_graph_preserves_ids_and_edges() {
        let pcg = tiny_pcg();
        let copy = pcg.copy_graph();
        assert_eq!(copy.vertex_count(), pcg.vertex_count());
        assert_eq!(
            copy.edges().collect::<HashSet<_>>(),
            pcg.edges().collect::<HashSet<_>>()
        );
    }

    #[test]
    fn copy_reverse_graph_flips_edges() {
        let pcg = tiny_pcg();
        let rev = pcg.copy_reverse_graph();
        for (u, v) in pcg.edges() {
            assert!(rev.graph.find_edge(v, u).is_some());
        }
        assert_eq!(rev.vertex_count(), pcg.vertex_count());
    }

    #[test]
    fn restrict_keeps_only_low_enough_minimum() {
        let pcg = tiny_pcg();
        let restricted = pcg.restrict(1);
        assert_eq!(restricted.vertex_count(), 3);
        let restricted0 = pcg.restrict(0);
        // the mid state's minimum accepted preference is 1, which is > 0, so it is removed.
        assert_eq!(restricted0.vertex_count(), 2);
    }

    #[test]
    fn preferences_and_accepting_locations() {
        let pcg = tiny_pcg();
        assert_eq!(pcg.preferences(), BitSet31::singleton(1));
        assert_eq!(pcg.accepting_locations(), ["A".to_string()].into_iter().collect());
    }
}
