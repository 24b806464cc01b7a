// pcg-core: Product Construction Graph compiler core

//! # Regex extractor
//!
//! Classical state-elimination construction (§4.5): augment the reversed PCG with an artificial
//! `ε`-edge from End to the state of interest, then eliminate every real node one at a time,
//! folding its self-loop and through-paths into the regex labeling every remaining pair, until
//! only Start and End are left.

use crate::graph::{CgId, Pcg};
use std::collections::{HashMap, HashSet};
use std::fmt;

/// A regular expression over topology locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Regex {
    /// The empty language (no path).
    Empty,
    /// The empty word.
    Epsilon,
    /// A single location symbol.
    Loc(String),
    /// Concatenation.
    Concat(Box<Regex>, Box<Regex>),
    /// Union (alternation).
    Union(Box<Regex>, Box<Regex>),
    /// Kleene star.
    Star(Box<Regex>),
}

impl fmt::Display for Regex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Regex::Empty => write!(f, "\u{2205}"),
            Regex::Epsilon => write!(f, "\u{03b5}"),
            Regex::Loc(loc) => write!(f, "{}", loc),
            Regex::Concat(a, b) => write!(f, "{}{}", a, b),
            Regex::Union(a, b) => write!(f, "({}|{})", a, b),
            Regex::Star(a) => write!(f, "({})*", a),
        }
    }
}

fn merge(r: &mut HashMap<(CgId, CgId), Regex>, key: (CgId, CgId), value: Regex) {
    match r.remove(&key) {
        Some(existing) => {
            r.insert(key, Regex::Union(Box::new(existing), Box::new(value)));
        }
        None => {
            r.insert(key, value);
        }
    }
}

/// Construct a regex over locations describing the paths to `s` in the (reversed, ε-augmented)
/// PCG, by eliminating every real state in ascending `Id` order and returning `R(End, Start)`.
/// See §4.5.
pub fn construct_regex(pcg: &Pcg, s: CgId) -> Regex {
    let rev = pcg.copy_reverse_graph();
    let end = rev.end();
    let start = rev.start();

    let mut r: HashMap<(CgId, CgId), Regex> = HashMap::new();
    for (u, v) in rev.edges() {
        let label = if rev.state(v).is_topo_state() {
            Regex::Loc(rev.state(v).node.loc.clone())
        } else {
            // `v` is the synthetic Start (the only non-topo state that can appear as a rev-edge
            // target, since End has out-degree 0 in the original graph): contributes no symbol.
            Regex::Epsilon
        };
        merge(&mut r, (u, v), label);
    }
    merge(&mut r, (end, s), Regex::Epsilon);

    let mut remaining: HashSet<CgId> = rev.vertices().collect();
    let mut order: Vec<CgId> =
        remaining.iter().copied().filter(|&q| q != end && q != start).collect();
    order.sort();

    for q in order {
        remaining.remove(&q);
        let star = match r.get(&(q, q)) {
            Some(loop_regex) => Regex::Star(Box::new(loop_regex.clone())),
            None => Regex::Epsilon,
        };
        let incoming: Vec<CgId> =
            remaining.iter().copied().filter(|&q1| r.contains_key(&(q1, q))).collect();
        let outgoing: Vec<CgId> =
            remaining.iter().copied().filter(|&q2| r.contains_key(&(q, q2))).collect();
        for &q1 in &incoming {
            for &q2 in &outgoing {
                let via = Regex::Concat(
                    Box::new(r[&(q1, q)].clone()),
                    Box::new(Regex::Concat(Box::new(star.clone()), Box::new(r[&(q, q2)].clone()))),
                );
                merge(&mut r, (q1, q2), via);
            }
        }
        r.retain(|&(a, b), _| a != q && b != q);
    }

    r.get(&(end, start)).cloned().unwrap_or(Regex::Empty)
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::builder::build_from_automata;
    use crate::dfa::Dfa;
    use crate::topology::{NodeKind, Topology};
    use std::rc::Rc;

    fn line_topo() -> Topology {
        let mut t = Topology::new();
        let a = t.add_node("A", NodeKind::InsideOriginates);
        let b = t.add_node("B", NodeKind::Inside);
        let c = t.add_node("C", NodeKind::InsideOriginates);
        t.add_link(a, b);
        t.add_link(b, c);
        t
    }

    fn dot_star(loc: &str, alphabet: &[&str]) -> Dfa {
        let mut trans = Vec::new();
        for &l in alphabet {
            trans.push(((0u32, l.to_string()), if l == loc { 1 } else { 0 }));
            trans.push(((1u32, l.to_string()), 1));
        }
        Dfa::new(0, [1], trans)
    }

    /// `true` iff `word` (over the `Regex` alphabet of locations) is in the language of `re`,
    /// via repeated Brzozowski differentiation.
    fn nullable(re: &Regex) -> bool {
        match re {
            Regex::Empty => false,
            Regex::Epsilon => true,
            Regex::Loc(_) => false,
            Regex::Concat(a, b) => nullable(a) && nullable(b),
            Regex::Union(a, b) => nullable(a) || nullable(b),
            Regex::Star(_) => true,
        }
    }

    fn derivative(re: &Regex, sym: &str) -> Regex {
        match re {
            Regex::Empty => Regex::Empty,
            Regex::Epsilon => Regex::Empty,
            Regex::Loc(loc) => {
                if loc == sym {
                    Regex::Epsilon
                } else {
                    Regex::Empty
                }
            }
            Regex::Concat(a, b) => {
                let via_a = Regex::Concat(Box::new(derivative(a, sym)), b.clone());
                if nullable(a) {
                    Regex::Union(Box::new(via_a), Box::new(derivative(b, sym)))
                } else {
                    via_a
                }
            }
            Regex::Union(a, b) => Regex::Union(Box::new(derivative(a, sym)), Box::new(derivative(b, sym))),
            Regex::Star(a) => Regex::Concat(Box::new(derivative(a, sym)), Box::new(Regex::Star(a.clone()))),
        }
    }

    fn accepts(re: &Regex, word: &[&str]) -> bool {
        let mut cur = re.clone();
        for &sym in word {
            cur = derivative(&cur, sym);
        }
        nullable(&cur)
    }

    #[test]
    fn regex_for_accepting_state_accepts_the_direct_path() {
        let topo = Rc::new(line_topo());
        let d1 = dot_star("A", &["A", "B", "C"]);
        let pcg = build_from_automata(topo, &[d1]).unwrap();

        let accepting = pcg.vertices().find(|&id| !pcg.state(id).accept.is_empty()).unwrap();
        let re = construct_regex(&pcg, accepting);
        assert_ne!(re, Regex::Empty);
        assert!(accepts(&re, &["A"]));
    }

    /// Regex extraction on the line topology with `D1` alone (§8 scenario 6): the word reaching
    /// the single-preference accepting state directly ("A") and the word reaching it by
    /// originating at `C` and crossing `B` ("C","B","A") must both be in the extracted language,
    /// while the empty word and an unterminated "B" must not (`B` never originates traffic, so no
    /// accepted path can end there).
    #[test]
    fn construct_regex_accepts_scenario_six_words() {
        let topo = Rc::new(line_topo());
        let d1 = dot_star("A", &["A", "B", "C"]);
        let pcg = build_from_automata(topo, &[d1]).unwrap();

        let re = construct_regex(&pcg, pcg.start());
        assert_ne!(re, Regex::Empty);
        assert!(accepts(&re, &["A"]));
        assert!(accepts(&re, &["C", "B", "A"]));
        assert!(!accepts(&re, &[]));
        assert!(!accepts(&re, &["B"]));

        let rendered = re.to_string();
        assert!(!rendered.contains('$'), "regex must not leak synthetic Start/End markers: {}", rendered);
    }
}
