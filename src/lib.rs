// pcg-core: Product Construction Graph compiler core

#![deny(missing_docs)]

//! # pcg_core: Product Construction Graph compiler core
//!
//! Builds, minimizes, and analyzes the Product Construction Graph (PCG) used to compile
//! per-location routing preferences from a set of per-preference-level path DFAs crossed with a
//! network topology.
//!
//! ## Structure
//!
//! - **[`topology`]** / **[`dfa`]**: the concrete input types: a network topology and the DFAs
//!   compiled from per-preference path expressions.
//! - **[`bitset`]**: `BitSet31`, the compact preference-level set carried by every PCG state.
//! - **[`reindex`]**: `Reindexer`, the hash-consing table used to assign dense ids.
//! - **[`graph`]**: `CgState`/`Pcg`, the Product Construction Graph itself.
//! - **[`builder`]**: product construction (topology × up to 31 DFAs → raw PCG).
//! - **[`reachability`]**: DFS/postorder traversal, in either edge direction.
//! - **[`dominators`]**: forward and backward dominator trees.
//! - **[`minimizer`]**: the fixpoint reduction passes that shrink a raw PCG.
//! - **[`consistency`]**: the preference-ordering core: `protect`, per-location ordering.
//! - **[`regex`]**: state-elimination extraction of a location regex from a PCG.
//! - **[`failure`]**: failure enumeration, failed-graph materialization, min-cut approximation.
//! - **[`dot`]**: Graphviz DOT rendering (a pure string transform) and PNG export.
//!
//! ## Usage
//!
//! ```
//! use pcg_core::builder::build_from_automata;
//! use pcg_core::dfa::Dfa;
//! use pcg_core::minimizer::minimize;
//! use pcg_core::consistency::find_ordering;
//! use pcg_core::topology::{NodeKind, Topology};
//! use std::rc::Rc;
//!
//! let mut topo = Topology::new();
//! let a = topo.add_node("A", NodeKind::InsideOriginates);
//! let b = topo.add_node("B", NodeKind::InsideOriginates);
//! topo.add_link(a, b);
//!
//! let d1 = Dfa::new(0, [1], [
//!     ((0, "A".to_string()), 1), ((0, "B".to_string()), 0),
//!     ((1, "A".to_string()), 1), ((1, "B".to_string()), 1),
//! ]);
//!
//! let mut pcg = build_from_automata(Rc::new(topo), &[d1])?;
//! minimize(&mut pcg);
//! let _ordering = find_ordering(&pcg)?;
//! # Ok::<(), pcg_core::Error>(())
//! ```

pub mod bitset;
pub mod builder;
pub mod consistency;
pub mod dfa;
pub mod dominators;
pub mod dot;
mod error;
pub mod failure;
pub mod graph;
pub mod minimizer;
pub mod reachability;
pub mod regex;
mod reindex;
pub mod topology;

pub use error::Error;
pub use reindex::Reindexer;
