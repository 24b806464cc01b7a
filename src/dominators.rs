// pcg-core: Product Construction Graph compiler core

//! # Dominators
//!
//! Forward and backward dominator trees over a [`Pcg`], built with `petgraph::algo::dominators`
//! (Cooper/Harvey/Kennedy's iterative algorithm, the same graph-algorithms crate the teacher
//! already depends on) rather than a hand-rolled Lengauer-Tarjan implementation. Backward
//! dominance is obtained for free by running the same algorithm over a `Reversed` view of the
//! graph, petgraph's own adaptor for flipping edge direction without copying.

use crate::graph::{CgId, Pcg};
use petgraph::algo::dominators::{self, Dominators};
use petgraph::visit::Reversed;

/// A dominator tree, either forward (from Start, following outgoing edges) or backward (from
/// End, following incoming edges).
#[derive(Debug, Clone)]
pub struct DomTree {
    dominators: Dominators<CgId>,
}

impl DomTree {
    /// The forward dominator tree, rooted at Start.
    pub fn forward(pcg: &Pcg) -> Self {
        Self { dominators: dominators::simple_fast(&pcg.graph, pcg.start()) }
    }

    /// The backward dominator tree, rooted at End (dominance over incoming edges).
    pub fn backward(pcg: &Pcg) -> Self {
        Self { dominators: dominators::simple_fast(Reversed(&pcg.graph), pcg.end()) }
    }

    /// The immediate dominator of `node`, or `None` for the root or for unreachable nodes.
    pub fn idom(&self, node: CgId) -> Option<CgId> {
        let root = self.dominators.root();
        if node == root {
            return None;
        }
        self.dominators.immediate_dominator(node)
    }

    /// Returns `true` if `dom` dominates `node` (reflexively: every node dominates itself).
    pub fn dominates(&self, dom: CgId, node: CgId) -> bool {
        if dom == node {
            return true;
        }
        let mut cur = self.idom(node);
        while let Some(d) = cur {
            if d == dom {
                return true;
            }
            cur = self.idom(d);
        }
        false
    }

    /// Climbs the immediate-dominator chain of `node`, starting at its immediate dominator (so
    /// `node` itself is never tested), and returns the first strict ancestor matching `pred`, if
    /// any. This is the "dominated by any ancestor matching predicate" query of §9, implemented
    /// as an iterative loop over `idom[·]`.
    pub fn first_ancestor_matching(
        &self,
        node: CgId,
        mut pred: impl FnMut(CgId) -> bool,
    ) -> Option<CgId> {
        let mut cur = self.idom(node);
        while let Some(d) = cur {
            if pred(d) {
                return Some(d);
            }
            cur = self.idom(d);
        }
        None
    }
}
