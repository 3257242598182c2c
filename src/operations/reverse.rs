use std::time::Instant;

use tracing::debug;

use crate::{
    automaton::{report_progress, DeterministicTable, TransitionMap},
    math::OrderedMap,
    prelude::*,
};

/// A state of the reversed automaton with output: for every state of the original automaton, the
/// output that is reached from there by reading the reversal of the input read so far.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
struct OutputMap(Vec<Output>);

impl Automaton {
    fn with_reversed_number_systems(mut self, flip: bool) -> Self {
        if flip {
            let labels = self.labels().map(<[String]>::to_vec);
            self = Automaton::from_parts(
                self.coordinates().reversed_number_systems(),
                self.initial_state(),
                self.outputs().to_vec(),
                self.transitions().to_vec(),
            )
            .with_labels_of(labels.as_deref());
        }
        self
    }

    /// Returns the minimal automaton accepting the reversals of the words accepted by `self`. If
    /// `flip` is set, every number system changes its reading direction, e.g. from `msd_2` to `lsd_2`.
    ///
    /// Every non-zero output counts as accepting, use [`Self::reverse_with_output`] to reverse an
    /// automaton with output.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// // accepts 0 followed by any number of 1s
    /// let aut: Automaton = "{0,1}\n0 0\n0 -> 1\n1 1\n1 -> 1\n".parse().unwrap();
    /// let reversed = aut.reverse(false);
    /// assert!(reversed.accepts(&[vec![1], vec![1], vec![0]]).unwrap());
    /// assert!(!reversed.accepts(&[vec![0], vec![1]]).unwrap());
    /// ```
    pub fn reverse(&self, flip: bool) -> Automaton {
        if self.is_trivial().is_some() {
            return self.clone();
        }
        let start = Instant::now();
        debug!("reversing: {} states", self.state_count());
        let mut flipped = vec![TransitionMap::new(); self.state_count()];
        for (q, map) in self.transitions().iter().enumerate() {
            for (&a, successors) in map {
                for &p in successors {
                    flipped[p].entry(a).or_default().push(q);
                }
            }
        }
        let finals: Vec<StateIndex> = (0..self.state_count())
            .filter(|&q| self.is_accepting(q))
            .collect();
        let mut outputs = vec![0; self.state_count()];
        outputs[self.initial_state()] = 1;

        let out = Automaton::from_parts(
            self.coordinates().clone(),
            self.initial_state(),
            outputs,
            flipped,
        )
        .with_labels_of(self.labels())
        .determinize_from(finals)
        .minimize()
        .with_reversed_number_systems(flip);
        debug!(
            "reversed: {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        out
    }

    /// Reverses an automaton with output: the result assigns to a word the output that `self`
    /// assigns to its reversal. The states of the result are maps from the states of `self` to
    /// outputs, discovered breadth first.
    ///
    /// Missing transitions are first directed into a dead state whose output differs from all others,
    /// and the states carrying that output are removed again after minimization, so undefined runs
    /// stay undefined.
    ///
    /// Fails with [`AutomatonError::NotDeterministic`] if `self` is not deterministic.
    pub fn reverse_with_output(&self, flip: bool) -> Result<Automaton> {
        if self.is_trivial().is_some() {
            return Ok(self.clone());
        }
        let start = Instant::now();
        debug!("reversing with output: {} states", self.state_count());
        let (total, added) = self.add_distinguished_dead_state();
        let table = total.total_table()?;
        let initial = total.initial_state();

        let first = OutputMap(total.outputs().to_vec());
        let mut maps = vec![first.clone()];
        let mut index: Map<OutputMap, StateIndex> = Map::default();
        index.insert(first, 0);
        let mut reversed: DeterministicTable = vec![];
        let mut outputs = vec![];

        let mut current = 0;
        while current < maps.len() {
            report_progress("reversal with output", current + 1, maps.len(), start);
            let map = maps[current].clone();
            outputs.push(map.0[initial]);
            let mut row = OrderedMap::new();
            for a in total.coordinates().symbols() {
                let next = OutputMap(table.iter().map(|successors| map.0[successors[&a]]).collect());
                let target = *index.entry(next.clone()).or_insert_with(|| {
                    maps.push(next);
                    maps.len() - 1
                });
                row.insert(a, target);
            }
            reversed.push(row);
            current += 1;
        }

        let minimized = Automaton::from_table(self.coordinates().clone(), 0, outputs, reversed)
            .with_labels_of(self.labels())
            .with_reversed_number_systems(flip)
            .minimize_with_output();
        let out = if added {
            minimized.strip_states_with_output(total.output(total.state_count() - 1))
        } else {
            minimized
        };
        debug!(
            "reversed with output: {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn word(values: &[i64]) -> Vec<Vec<Value>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test_log::test]
    fn reversal_is_an_involution() {
        let aut: Automaton = "{0,1}\n0 0\n0 -> 1\n1 1\n1 -> 1\n".parse().unwrap();
        let reversed = aut.reverse(false);
        assert!(reversed.accepts(&word(&[1, 0])).unwrap());
        assert!(!reversed.accepts(&word(&[0, 1])).unwrap());
        assert!(reversed.reverse(false).equals(&aut).unwrap());

        let empty: Automaton = "{0,1}\n0 0\n* -> 0\n".parse().unwrap();
        assert!(empty.reverse(false).is_empty());
        assert_eq!(Automaton::trivial(true).reverse(true).is_trivial(), Some(true));
    }

    #[test_log::test]
    fn flipping_number_systems() {
        let aut: Automaton = "msd_2\n0 1\n1 -> 0\n".parse().unwrap();
        let reversed = aut.bind(&["x"]).unwrap().reverse(true);
        assert_eq!(
            reversed.coordinates().number_system(0),
            Some(&NumberSystem::lsd(2))
        );
        assert_eq!(reversed.labels().unwrap(), &["x"]);
        assert!(reversed.accepts(&word(&[1, 1])).unwrap());
    }

    #[test_log::test]
    fn reversal_with_output() {
        // 5 if the word starts with 0, 7 if it starts with 1
        let first_letter: Automaton = "{0,1}\n0 0\n0 -> 1\n1 -> 2\n1 5\n* -> 1\n2 7\n* -> 2\n"
            .parse()
            .unwrap();
        let last_letter = first_letter.reverse_with_output(false).unwrap();
        assert_eq!(last_letter.output_on(&word(&[])).unwrap(), 0);
        assert_eq!(last_letter.output_on(&word(&[1, 1, 0])).unwrap(), 5);
        assert_eq!(last_letter.output_on(&word(&[0, 0, 1])).unwrap(), 7);
        assert!(last_letter
            .reverse_with_output(false)
            .unwrap()
            .equals(&first_letter)
            .unwrap());
    }

    #[test_log::test]
    fn undefined_runs_stay_undefined() {
        let partial: Automaton = "{0,1}\n0 0\n0 -> 1\n1 3\n".parse().unwrap();
        let reversed = partial.reverse_with_output(false).unwrap();
        assert_eq!(reversed.output_on(&word(&[0])).unwrap(), 3);
        assert_eq!(reversed.output_on(&word(&[1])).unwrap(), 0);
        assert_eq!(reversed.output_on(&word(&[0, 0])).unwrap(), 0);
        assert!(!reversed.is_total());
        assert!(reversed.outputs().iter().all(|&o| o >= 0));

        let nfa: Automaton = "{0,1}\n0 0\n0 -> 0 1\n1 1\n".parse().unwrap();
        assert!(matches!(
            nfa.reverse_with_output(false),
            Err(AutomatonError::NotDeterministic)
        ));
    }
}
