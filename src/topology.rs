// pcg-core: Product Construction Graph compiler core

//! # Topology
//!
//! The concrete input type satisfying the "Topology" contract of the specification (§3, §6).
//! In the full system this is supplied by an external topology loader; this crate only needs the
//! read-only query surface enumerated below; consistent with the teacher's own `netsim` types, the
//! graph is stored as a `petgraph` `StableGraph` indexed by dense `NodeIndex`es, with per-node
//! metadata (`Loc`, `Typ`) carried as node weights.

use petgraph::stable_graph::StableGraph;
use petgraph::visit::EdgeRef;
use petgraph::Directed;
use std::collections::{HashMap, HashSet};

/// Dense index into a [`Topology`]'s graph; stable for the lifetime of the topology.
pub type NodeId = petgraph::graph::NodeIndex<u32>;

/// The kind of a topology node.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NodeKind {
    /// The synthetic start node of a PCG (never a real topology node).
    Start,
    /// The synthetic end node of a PCG (never a real topology node).
    End,
    /// An internal node that cannot originate traffic.
    Inside,
    /// An internal node that can originate traffic.
    InsideOriginates,
    /// An external node.
    Outside,
    /// A node standing in for an unbounded collection of external ASes ("repeated-out").
    Unknown,
}

impl NodeKind {
    /// Returns `true` for `Inside` and `InsideOriginates`.
    pub fn is_inside(self) -> bool {
        matches!(self, NodeKind::Inside | NodeKind::InsideOriginates)
    }

    /// Returns `true` for `Outside` and `Unknown`.
    pub fn is_outside(self) -> bool {
        matches!(self, NodeKind::Outside | NodeKind::Unknown)
    }

    /// Returns `true` if a node of this kind may originate traffic.
    pub fn can_originate(self) -> bool {
        matches!(self, NodeKind::InsideOriginates)
    }

    /// Returns `true` unless this is a synthetic `Start`/`End` kind.
    pub fn is_topo_kind(self) -> bool {
        !matches!(self, NodeKind::Start | NodeKind::End)
    }
}

/// A single topology node: a router location and its kind.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct TopoNode {
    /// The router-location word this node contributes to accepted paths.
    pub loc: String,
    /// The kind of this node.
    pub kind: NodeKind,
}

impl TopoNode {
    /// Create a new topology node.
    pub fn new(loc: impl Into<String>, kind: NodeKind) -> Self {
        Self { loc: loc.into(), kind }
    }
}

/// A network topology: a directed graph of [`TopoNode`]s.
///
/// Links are represented as directed edges; a bidirectional link is simply two edges, one in
/// each direction, matching how the teacher represents IGP links in `netsim::Network::add_link`.
#[derive(Debug, Clone, Default)]
pub struct Topology {
    graph: StableGraph<TopoNode, (), Directed, u32>,
    by_loc: HashMap<String, NodeId>,
}

impl Topology {
    /// Create an empty topology.
    pub fn new() -> Self {
        Self { graph: StableGraph::default(), by_loc: HashMap::new() }
    }

    /// Add a node, returning its id. Panics if the location is already present.
    pub fn add_node(&mut self, loc: impl Into<String>, kind: NodeKind) -> NodeId {
        let loc = loc.into();
        assert!(!self.by_loc.contains_key(&loc), "duplicate topology location: {}", loc);
        let id = self.graph.add_node(TopoNode::new(loc.clone(), kind));
        self.by_loc.insert(loc, id);
        id
    }

    /// Add a directed edge `from -> to`.
    pub fn add_edge(&mut self, from: NodeId, to: NodeId) {
        self.graph.add_edge(from, to, ());
    }

    /// Add both directions of a link between `a` and `b`.
    pub fn add_link(&mut self, a: NodeId, b: NodeId) {
        self.add_edge(a, b);
        self.add_edge(b, a);
    }

    /// Look up a node by its location string.
    pub fn node_by_loc(&self, loc: &str) -> Option<NodeId> {
        self.by_loc.get(loc).copied()
    }

    /// The node weight for `id`.
    pub fn node(&self, id: NodeId) -> &TopoNode {
        &self.graph[id]
    }

    /// All node ids in the topology.
    pub fn vertices(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.node_indices()
    }

    /// All directed edges in the topology, as `(source, target)` pairs.
    pub fn edges(&self) -> impl Iterator<Item = (NodeId, NodeId)> + '_ {
        self.graph.edge_references().map(|e| (e.source(), e.target()))
    }

    /// Out-neighbors of `id` (the successor locations a path through `id` may continue to).
    pub fn neighbors(&self, id: NodeId) -> impl Iterator<Item = NodeId> + '_ {
        self.graph.neighbors(id)
    }

    /// Out-neighbor nodes of the node at `loc`, looked up by location string. Empty if `loc` is
    /// not a known location.
    pub fn neighbor_nodes(&self, loc: &str) -> Vec<TopoNode> {
        match self.node_by_loc(loc) {
            Some(id) => self.neighbors(id).map(|n| self.node(n).clone()).collect(),
            None => Vec::new(),
        }
    }

    /// Returns `true` if `id` is an internal node (`Inside` or `InsideOriginates`).
    pub fn is_inside(&self, id: NodeId) -> bool {
        self.node(id).kind.is_inside()
    }

    /// Returns `true` if `id` is an external node (`Outside` or `Unknown`).
    pub fn is_outside(&self, id: NodeId) -> bool {
        self.node(id).kind.is_outside()
    }

    /// Returns `true` if `id` can originate traffic.
    pub fn can_originate_traffic(&self, id: NodeId) -> bool {
        self.node(id).kind.can_originate()
    }

    /// Returns `true` unless `id`'s kind is the synthetic `Start`/`End` (always true here, since
    /// only real topology nodes are ever added to a `Topology`; kept for symmetry with the PCG's
    /// own `is_topo_node` on `CgState`, which must also account for the synthetic endpoints).
    pub fn is_topo_node(&self, id: NodeId) -> bool {
        self.node(id).kind.is_topo_kind()
    }

    /// `(inside locations, outside locations)`, deduplicated.
    pub fn alphabet(&self) -> (HashSet<String>, HashSet<String>) {
        let mut inside = HashSet::new();
        let mut outside = HashSet::new();
        for id in self.vertices() {
            let node = self.node(id);
            if node.kind.is_inside() {
                inside.insert(node.loc.clone());
            } else {
                outside.insert(node.loc.clone());
            }
        }
        (inside, outside)
    }

    /// All nodes capable of originating traffic.
    pub fn originators(&self) -> impl Iterator<Item = NodeId> + '_ {
        self.vertices().filter(move |&id| self.can_originate_traffic(id))
    }

    /// Returns `true` if the topology is weakly connected (treating edges as undirected), or if
    /// it is empty.
    pub fn is_well_formed(&self) -> bool {
        if self.graph.node_count() <= 1 {
            return true;
        }
        weakly_connected_components(&self.graph) == 1
    }
}

/// Number of weakly-connected components of a directed graph, via a hand-rolled union-find keyed
/// by node id directly (rather than `petgraph::unionfind::UnionFind`, which needs a contiguous
/// `0..n` index space `StableGraph` does not guarantee once nodes are removed). Shared by
/// [`Topology::is_well_formed`] and the [graph container](crate::graph)'s own component labeling.
pub(crate) fn weakly_connected_components<N, E>(g: &StableGraph<N, E, Directed, u32>) -> usize {
    let mut parent: HashMap<NodeId, NodeId> = g.node_indices().map(|id| (id, id)).collect();

    fn find(parent: &mut HashMap<NodeId, NodeId>, x: NodeId) -> NodeId {
        if parent[&x] != x {
            let root = find(parent, parent[&x]);
            parent.insert(x, root);
        }
        parent[&x]
    }

    for edge in g.edge_references() {
        let (a, b) = (edge.source(), edge.target());
        let (ra, rb) = (find(&mut parent, a), find(&mut parent, b));
        if ra != rb {
            parent.insert(ra, rb);
        }
    }

    let roots: HashSet<NodeId> =
        g.node_indices().map(|id| find(&mut parent, id)).collect();
    roots.len()
}

#[cfg(test)]
mod test {
    use super::*;

    fn line_topo() -> (Topology, NodeId, NodeId, NodeId) {
        let mut t = Topology::new();
        let a = t.add_node("A", NodeKind::InsideOriginates);
        let b = t.add_node("B", NodeKind::Inside);
        let c = t.add_node("C", NodeKind::InsideOriginates);
        t.add_link(a, b);
        t.add_link(b, c);
        (t, a, b, c)
    }

    #[test]
    fn well_formed_line() {
        let (t, ..) = line_topo();
        assert!(t.is_well_formed());
    }

    #[test]
    fn disconnected_is_not_well_formed() {
        let mut t = Topology::new();
        t.add_node("A", NodeKind::InsideOriginates);
        t.add_node("B", NodeKind::InsideOriginates);
        assert!(!t.is_well_formed());
    }

    #[test]
    fn neighbors_and_originators() {
        let (t, a, b, c) = line_topo();
        assert_eq!(t.neighbors(b).collect::<HashSet<_>>(), [a, c].into_iter().collect());
        assert_eq!(t.originators().collect::<HashSet<_>>(), [a, c].into_iter().collect());
    }

    #[test]
    fn alphabet_splits_inside_outside() {
        let mut t = Topology::new();
        let a = t.add_node("A", NodeKind::InsideOriginates);
        let e = t.add_node("E", NodeKind::Outside);
        t.add_link(a, e);
        let (inside, outside) = t.alphabet();
        assert_eq!(inside, ["A".to_string()].into_iter().collect());
        assert_eq!(outside, ["E".to_string()].into_iter().collect());
    }
}
