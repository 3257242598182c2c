use std::{collections::VecDeque, time::Instant};

use itertools::Itertools;
use tracing::debug;

use crate::{automaton::TransitionMap, prelude::*};

impl Automaton {
    /// Existentially quantifies the coordinates carrying the given labels. Their values are projected
    /// away, which in general makes the automaton non-deterministic, and the result is minimized.
    /// Quantifying every coordinate gives a trivial automaton which is `true` iff the language of
    /// `self` is not empty.
    ///
    /// Afterwards, representations that only differ in zero padding are identified: if every remaining
    /// coordinate is msd, [`Self::fix_leading_zeros`] is applied, if every remaining coordinate is lsd,
    /// [`Self::fix_trailing_zeros`]. If there are coordinates without number system or the directions
    /// are mixed, nothing is done.
    ///
    /// Fails with [`AutomatonError::NotLabeled`] for unlabeled automata and with
    /// [`AutomatonError::UnknownLabel`] if some label does not occur.
    pub fn quantify<S: AsRef<str>>(&self, labels: &[S]) -> Result<Automaton> {
        if labels.is_empty() {
            return Ok(self.clone());
        }
        let indices: Vec<usize> = labels
            .iter()
            .map(|l| self.label_index(l.as_ref()))
            .collect::<Result<Vec<_>>>()?
            .into_iter()
            .sorted()
            .dedup()
            .collect();
        let start = Instant::now();
        debug!(
            "quantifying {}: {} states",
            labels.iter().map(|l| l.as_ref()).join(","),
            self.state_count()
        );
        if indices.len() == self.arity() {
            return Ok(Automaton::trivial(!self.is_empty()));
        }

        let coordinates = self.coordinates().without(&indices);
        let mapping: Vec<Option<Symbol>> = self
            .coordinates()
            .symbols()
            .map(|a| {
                let remaining = self
                    .coordinates()
                    .decode(a)
                    .into_iter()
                    .enumerate()
                    .filter(|(i, _)| !indices.contains(i))
                    .map(|(_, v)| v)
                    .collect_vec();
                coordinates.encode(&remaining).ok()
            })
            .collect();
        let remaining_labels = self
            .require_labels()?
            .iter()
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, l)| l.clone())
            .collect_vec();
        let projected = self
            .relabel_symbols(coordinates, &mapping)
            .with_labels_of(Some(remaining_labels.as_slice()))
            .minimize();
        let out = match projected.coordinates().uniform_direction() {
            Some(true) => projected.fix_leading_zeros(),
            Some(false) => projected.fix_trailing_zeros(),
            None => projected,
        };
        debug!(
            "quantified: {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }

    /// Returns the states that can be reached from `initial` by reading only the all-zero symbol.
    fn zero_reachable_states(&self, zero: Symbol) -> Vec<StateIndex> {
        let mut seen = vec![false; self.state_count()];
        let mut queue = VecDeque::from([self.initial_state()]);
        seen[self.initial_state()] = true;
        let mut out = vec![];
        while let Some(q) = queue.pop_front() {
            out.push(q);
            for &p in self.successors(q, zero) {
                if !seen[p] {
                    seen[p] = true;
                    queue.push_back(p);
                }
            }
        }
        out
    }

    /// Makes the accepted language closed under adding and removing leading zeros (all-zero symbols
    /// at the front of a word). A self-loop on the zero symbol is added to the initial state and the
    /// automaton is determinized from the set of states that can be reached by reading zeros.
    pub fn fix_leading_zeros(&self) -> Automaton {
        if self.is_trivial().is_some() {
            return self.clone();
        }
        let Some(zero) = self.coordinates().zero_symbol() else {
            return self.clone();
        };
        let start = Instant::now();
        let initial = self.initial_state();
        let mut transitions: Vec<TransitionMap> = self.transitions().to_vec();
        let loops = transitions[initial].entry(zero).or_default();
        if let Err(position) = loops.binary_search(&initial) {
            loops.insert(position, initial);
        }
        let looped = Automaton::from_parts(
            self.coordinates().clone(),
            initial,
            self.outputs().to_vec(),
            transitions,
        );
        let out = looped
            .determinize_from(looped.zero_reachable_states(zero))
            .minimize()
            .with_labels_of(self.labels());
        debug!(
            "fixed leading zeros: {} states to {} states - {}ms",
            self.state_count(),
            out.state_count(),
            start.elapsed().as_millis()
        );
        out
    }

    /// Makes the accepted language closed under adding and removing trailing zeros. Every state from
    /// which an accepting state can be reached by reading zeros becomes accepting.
    pub fn fix_trailing_zeros(&self) -> Automaton {
        if self.is_trivial().is_some() {
            return self.clone();
        }
        let Some(zero) = self.coordinates().zero_symbol() else {
            return self.clone();
        };
        let start = Instant::now();
        let mut predecessors = vec![vec![]; self.state_count()];
        for (q, map) in self.transitions().iter().enumerate() {
            for &p in map.get(&zero).into_iter().flatten() {
                predecessors[p].push(q);
            }
        }
        let mut accepting: Vec<bool> = self.outputs().iter().map(|&o| o != 0).collect();
        let mut queue: VecDeque<StateIndex> = (0..self.state_count())
            .filter(|&q| accepting[q])
            .collect();
        while let Some(q) = queue.pop_front() {
            for &p in &predecessors[q] {
                if !accepting[p] {
                    accepting[p] = true;
                    queue.push_back(p);
                }
            }
        }
        let outputs = accepting.into_iter().map(Output::from).collect();
        let out = self.with_outputs(outputs).minimize();
        debug!(
            "fixed trailing zeros: {} states to {} states - {}ms",
            self.state_count(),
            out.state_count(),
            start.elapsed().as_millis()
        );
        out
    }

    /// Restricts the automaton to words in which at least one of the given coordinates does not
    /// have a leading zero (for msd coordinates) or a trailing zero (for lsd coordinates). A listed
    /// coordinate without number system does not restrict anything.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let binary = Coordinates::arithmetic(&NumberSystem::msd(2), 1);
    /// let all = Automaton::universal(binary).bind(&["x"]).unwrap();
    /// let canonical = all.remove_leading_zeroes(&["x"]).unwrap();
    /// assert!(canonical.accepts(&[vec![1], vec![0]]).unwrap());
    /// assert!(!canonical.accepts(&[vec![0], vec![1]]).unwrap());
    /// ```
    pub fn remove_leading_zeroes<S: AsRef<str>>(&self, labels: &[S]) -> Result<Automaton> {
        if labels.is_empty() {
            return Ok(self.clone());
        }
        let indices = labels
            .iter()
            .map(|l| self.label_index(l.as_ref()))
            .collect::<Result<Vec<_>>>()?;
        let start = Instant::now();
        let mut restriction = Automaton::trivial(false);
        for n in indices {
            restriction = restriction.or(&self.nonzero_end(n)?)?;
        }
        let out = self.and(&restriction)?;
        debug!(
            "removed leading zeroes: {} states to {} states - {}ms",
            self.state_count(),
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }

    /// The automaton over the coordinates of `self` which accepts the words whose significant end
    /// in coordinate `n` is not zero, as well as the empty word.
    fn nonzero_end(&self, n: usize) -> Result<Automaton> {
        let Some(ns) = self.coordinates().number_system(n) else {
            return Ok(Automaton::trivial(true));
        };
        let coordinates = self.coordinates();
        let first: TransitionMap = coordinates
            .symbols()
            .filter(|&a| coordinates.decode(a)[n] != 0)
            .map(|a| (a, vec![1]))
            .collect();
        let rest: TransitionMap = coordinates.symbols().map(|a| (a, vec![1])).collect();
        let msd = Automaton::new(coordinates.clone(), 0, vec![1, 1], vec![first, rest])?
            .with_labels_of(self.labels());
        Ok(if ns.is_msd() { msd } else { msd.reverse(false) })
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn labeled(text: &str, labels: &[&str]) -> Automaton {
        text.parse::<Automaton>().unwrap().bind(labels).unwrap()
    }

    fn word(values: &[i64]) -> Vec<Vec<Value>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test_log::test]
    fn projection() {
        // x and y differ in every position
        let differ = labeled("{0,1} {0,1}\n0 1\n0 1 -> 0\n1 0 -> 0\n", &["x", "y"]);
        let projected = differ.quantify(&["y"]).unwrap();
        assert_eq!(projected.labels().unwrap(), &["x"]);
        let universal = Automaton::universal(projected.coordinates().clone());
        assert!(projected.equals(&universal).unwrap());

        // every accepted word survives the projection
        for length in 0..4 {
            for accepted in differ.accepted_words(length) {
                let x: Vec<Vec<Value>> = accepted.iter().map(|t| vec![t[0]]).collect();
                assert!(projected.accepts(&x).unwrap());
            }
        }

        assert_eq!(differ.quantify::<&str>(&[]).unwrap(), differ);
        assert_eq!(differ.quantify(&["x", "y"]).unwrap().is_trivial(), Some(true));
        let nothing = labeled("{0,1} {0,1}\n0 0\n* * -> 0\n", &["x", "y"]);
        assert_eq!(nothing.quantify(&["y", "x"]).unwrap().is_trivial(), Some(false));
    }

    #[test_log::test]
    fn quantifying_unknown_labels() {
        let differ = labeled("{0,1} {0,1}\n0 1\n0 1 -> 0\n", &["x", "y"]);
        assert!(matches!(
            differ.quantify(&["z"]),
            Err(AutomatonError::UnknownLabel(_))
        ));
        assert!(matches!(
            differ.without_labels().quantify(&["x"]),
            Err(AutomatonError::NotLabeled)
        ));
    }

    #[test_log::test]
    fn leading_zeros_are_fixed() {
        // x = 1 and y = 4 in msd_2, so x is padded to 001
        let aut = labeled(
            "msd_2 msd_2\n0 0\n0 0 -> 0\n0 1 -> 1\n1 0\n0 0 -> 2\n2 0\n1 0 -> 3\n3 1\n",
            &["x", "y"],
        );
        let one = aut.quantify(&["y"]).unwrap();
        assert!(one.accepts(&word(&[1])).unwrap());
        assert!(one.accepts(&word(&[0, 1])).unwrap());
        assert!(one.accepts(&word(&[0, 0, 0, 1])).unwrap());
        assert!(!one.accepts(&word(&[1, 0])).unwrap());
        assert!(!one.accepts(&word(&[])).unwrap());
    }

    #[test_log::test]
    fn trailing_zeros_are_fixed() {
        // x = 1 and y = 4 in lsd_2
        let aut = labeled(
            "lsd_2 lsd_2\n0 0\n1 0 -> 1\n1 0\n0 0 -> 2\n2 0\n0 1 -> 3\n3 1\n0 0 -> 3\n",
            &["x", "y"],
        );
        let one = aut.quantify(&["y"]).unwrap();
        assert!(one.accepts(&word(&[1])).unwrap());
        assert!(one.accepts(&word(&[1, 0])).unwrap());
        assert!(!one.accepts(&word(&[0, 1])).unwrap());
    }

    #[test_log::test]
    fn removing_leading_zeroes() {
        let msd = Automaton::universal(Coordinates::arithmetic(&NumberSystem::msd(2), 1))
            .bind(&["x"])
            .unwrap();
        let canonical = msd.remove_leading_zeroes(&["x"]).unwrap();
        assert!(canonical.accepts(&word(&[])).unwrap());
        assert!(canonical.accepts(&word(&[1, 0, 1])).unwrap());
        assert!(!canonical.accepts(&word(&[0, 1])).unwrap());

        let lsd = Automaton::universal(Coordinates::arithmetic(&NumberSystem::lsd(2), 1))
            .bind(&["x"])
            .unwrap();
        let canonical = lsd.remove_leading_zeroes(&["x"]).unwrap();
        assert!(canonical.accepts(&word(&[0, 1])).unwrap());
        assert!(!canonical.accepts(&word(&[1, 0])).unwrap());

        assert!(matches!(
            msd.remove_leading_zeroes(&["y"]),
            Err(AutomatonError::UnknownLabel(_))
        ));
        let plain = labeled("{0,1}\n0 1\n* -> 0\n", &["x"]);
        assert!(plain
            .remove_leading_zeroes(&["x"])
            .unwrap()
            .equals(&plain)
            .unwrap());
    }
}
