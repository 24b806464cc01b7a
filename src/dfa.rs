// pcg-core: Product Construction Graph compiler core

//! # Dfa
//!
//! The concrete input type satisfying the "DFA" contract of the specification (§3, §6). In the
//! full system these are produced by a regex-to-DFA compiler operating on policy ASTs; this crate
//! only needs the state-transition query surface, supplied here as a flat map, matching the
//! spec's `trans : map<(int, set<string>), int>` directly.

use std::collections::{HashMap, HashSet};

/// A deterministic finite automaton over router-location words.
#[derive(Debug, Clone)]
pub struct Dfa {
    q0: u32,
    accepting: HashSet<u32>,
    trans: HashMap<(u32, String), u32>,
    alphabet: HashSet<String>,
}

impl Dfa {
    /// Build a DFA from its initial state, accepting states, and transition table.
    pub fn new(
        q0: u32,
        accepting: impl IntoIterator<Item = u32>,
        trans: impl IntoIterator<Item = ((u32, String), u32)>,
    ) -> Self {
        let trans: HashMap<(u32, String), u32> = trans.into_iter().collect();
        let alphabet = trans.keys().map(|(_, loc)| loc.clone()).collect();
        Self { q0, accepting: accepting.into_iter().collect(), trans, alphabet }
    }

    /// The initial state.
    pub fn q0(&self) -> u32 {
        self.q0
    }

    /// Returns `true` if `state` is accepting.
    pub fn is_accepting(&self, state: u32) -> bool {
        self.accepting.contains(&state)
    }

    /// The locations this DFA has any transition for.
    pub fn alphabet(&self) -> &HashSet<String> {
        &self.alphabet
    }

    /// The transition function: the next state from `state` reading `loc`, or `None` if
    /// undefined (treated as an implicit non-accepting sink by the builder).
    pub fn transition(&self, state: u32, loc: &str) -> Option<u32> {
        self.trans.get(&(state, loc.to_string())).copied()
    }

    /// All states mentioned anywhere in the transition table or the accepting set, plus `q0`.
    fn states(&self) -> HashSet<u32> {
        let mut states: HashSet<u32> = HashSet::new();
        states.insert(self.q0);
        states.extend(self.accepting.iter().copied());
        for (&(src, _), &dst) in self.trans.iter() {
            states.insert(src);
            states.insert(dst);
        }
        states
    }

    /// The garbage states of this DFA: non-accepting states whose only outgoing transition (over
    /// the full alphabet) is a self-loop. Any PCG successor for which every automaton's next
    /// state lands in its own garbage set is pruned by the builder (§4.1 step 3): such a
    /// successor has no accepting future.
    pub fn garbage_states(&self) -> HashSet<u32> {
        let mut garbage = HashSet::new();
        for state in self.states() {
            if self.accepting.contains(&state) {
                continue;
            }
            let mut destinations: HashSet<u32> = HashSet::new();
            let mut has_transition = false;
            for loc in &self.alphabet {
                if let Some(dst) = self.transition(state, loc) {
                    has_transition = true;
                    destinations.insert(dst);
                }
            }
            if has_transition && destinations == [state].into_iter().collect() {
                garbage.insert(state);
            }
        }
        garbage
    }
}

#[cfg(test)]
mod test {
    use super::*;

    /// `.*A` over alphabet {A, B}: q0 loops on B, moves to accepting q1 on A; q1 loops on
    /// everything (it is accepting, so it is never garbage).
    fn dot_star_a() -> Dfa {
        Dfa::new(
            0,
            [1],
            [
                ((0, "A".to_string()), 1),
                ((0, "B".to_string()), 0),
                ((1, "A".to_string()), 1),
                ((1, "B".to_string()), 1),
            ],
        )
    }

    #[test]
    fn accepting_and_transition() {
        let d = dot_star_a();
        assert_eq!(d.q0(), 0);
        assert!(!d.is_accepting(0));
        assert!(d.is_accepting(1));
        assert_eq!(d.transition(0, "A"), Some(1));
        assert_eq!(d.transition(0, "Z"), None);
    }

    #[test]
    fn no_garbage_states_when_every_path_can_still_accept() {
        let d = dot_star_a();
        assert!(d.garbage_states().is_empty());
    }

    #[test]
    fn sink_state_is_garbage() {
        // q0 --A--> q1 (accept); q0 --B--> q2 (sink, self-loops forever, never accepts)
        let d = Dfa::new(
            0,
            [1],
            [
                ((0, "A".to_string()), 1),
                ((0, "B".to_string()), 2),
                ((1, "A".to_string()), 1),
                ((1, "B".to_string()), 1),
                ((2, "A".to_string()), 2),
                ((2, "B".to_string()), 2),
            ],
        );
        assert_eq!(d.garbage_states(), [2].into_iter().collect());
    }
}
