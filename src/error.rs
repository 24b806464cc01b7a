// pcg-core: Product Construction Graph compiler core

//! Error types returned by the core's public entry points.

use crate::graph::CgState;
use thiserror::Error;

/// Main error type returned by the core's public entry points.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum Error {
    /// More than 31 preference levels were requested; see [`crate::bitset::BitSet31`].
    #[error("at most 31 preference levels are supported, got {0}")]
    TooManyPreferences(usize),
    /// The supplied topology is not weakly connected.
    #[error("topology is not well-formed (not weakly connected)")]
    MalformedTopology,
    /// Two states at the same location are incomparable under `protect`.
    #[error("states {0:?} and {1:?} are incomparable at their shared location")]
    Inconsistent(CgState, CgState),
    /// A required preference (`mustPrefer`) was not established by simulation.
    #[error("state {0:?} must be preferred over {1:?}, but simulation does not show it")]
    SimplePath(CgState, CgState),
}
