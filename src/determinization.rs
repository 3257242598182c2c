use std::time::Instant;

use bit_set::BitSet;
use itertools::Itertools;
use tracing::debug;

use crate::{
    automaton::{report_progress, DeterministicTable, TransitionMap},
    math::OrderedMap,
    prelude::*,
};

/// The result of a subset construction. State `0` is the initial subset.
#[derive(Debug, Clone)]
pub struct SubsetConstruction {
    /// For each new state the set of original states it stands for.
    pub subsets: Vec<BitSet>,
    /// The new outputs, `1` if a subset contains an accepting state and `0` otherwise.
    pub outputs: Vec<Output>,
    /// The deterministic transitions between the subsets.
    pub table: DeterministicTable,
}

/// Runs the subset construction on the given transition relation starting from the set `initial`.
///
/// The worklist is processed breadth first. A destination subset is the union of the successors of
/// all members on a symbol, and empty subsets are never materialized, so the result is in general
/// not total. The transition relation is consumed and released as soon as the worklist is empty.
pub fn subset_construction<I: IntoIterator<Item = StateIndex>>(
    transitions: Vec<TransitionMap>,
    outputs: &[Output],
    initial: I,
) -> SubsetConstruction {
    let start = Instant::now();
    let size = transitions.len();
    let make_set = || BitSet::with_capacity(size);

    let mut initial_set = make_set();
    initial_set.extend(initial);

    let mut subsets = vec![initial_set.clone()];
    let mut index: Map<BitSet, StateIndex> = Map::default();
    index.insert(initial_set, 0);
    let mut table: DeterministicTable = vec![];

    let mut current = 0;
    while current < subsets.len() {
        report_progress("subset construction", current + 1, subsets.len(), start);
        let mut destinations: OrderedMap<Symbol, BitSet> = OrderedMap::new();
        for q in subsets[current].iter() {
            for (&a, successors) in &transitions[q] {
                destinations
                    .entry(a)
                    .or_insert_with(make_set)
                    .extend(successors.iter().copied());
            }
        }
        let mut row = OrderedMap::new();
        for (a, set) in destinations {
            if set.is_empty() {
                continue;
            }
            let target = match index.get(&set) {
                Some(&target) => target,
                None => {
                    let target = subsets.len();
                    index.insert(set.clone(), target);
                    subsets.push(set);
                    target
                }
            };
            row.insert(a, target);
        }
        table.push(row);
        current += 1;
    }
    drop(index);
    drop(transitions);

    let outputs = subsets
        .iter()
        .map(|set| set.iter().any(|q| outputs[q] != 0) as Output)
        .collect();
    debug!(
        "subset construction: {size} states to {} subsets - {}ms",
        subsets.len(),
        start.elapsed().as_millis()
    );
    SubsetConstruction {
        subsets,
        outputs,
        table,
    }
}

impl Automaton {
    /// Returns a deterministic automaton that accepts the same language. Its states are the
    /// subsets reachable from the initial state. Outputs other than 0 and 1 are lost.
    pub fn determinize(&self) -> Self {
        self.determinize_from([self.initial_state()])
    }

    /// Like [`Self::determinize`] but starts from an arbitrary set of states.
    pub fn determinize_from<I: IntoIterator<Item = StateIndex>>(&self, initial: I) -> Self {
        if self.is_trivial().is_some() {
            return self.clone();
        }
        let construction = subset_construction(self.transitions().to_vec(), self.outputs(), initial);
        Automaton::from_table(
            self.coordinates().clone(),
            0,
            construction.outputs,
            construction.table,
        )
        .with_labels_of(self.labels())
    }
}

/// Gives the elements of a subset, mostly useful for logging.
pub fn show_subset(set: &BitSet) -> String {
    format!("{{{}}}", set.iter().join(", "))
}

#[cfg(test)]
mod tests {
    use super::show_subset;
    use crate::prelude::*;

    #[test_log::test]
    fn subset_construction() {
        // accepts words over {a=0, b=1} whose second to last letter is a
        let nfa: Automaton = "{0,1}\n0 0\n0 -> 0 1\n1 -> 0\n1 0\n* -> 2\n2 1\n"
            .parse()
            .unwrap();
        assert!(!nfa.is_deterministic());
        let dfa = nfa.determinize();
        assert!(dfa.is_deterministic());
        assert_eq!(dfa.state_count(), 4);
        assert!(dfa.is_total());
        assert!(dfa.equals(&nfa).unwrap());
        for word in [vec![0, 0], vec![1, 0, 1], vec![0, 1, 0, 0]] {
            let word: Vec<Vec<Value>> = word.into_iter().map(|v| vec![v]).collect();
            assert_eq!(nfa.accepts(&word).unwrap(), dfa.accepts(&word).unwrap());
        }
    }

    #[test_log::test]
    fn empty_destinations_are_not_materialized() {
        let nfa: Automaton = "{0,1}\n0 1\n0 -> 0\n1 0\n1 -> 1\n".parse().unwrap();
        let construction = super::subset_construction(
            nfa.transitions().to_vec(),
            nfa.outputs(),
            [nfa.initial_state()],
        );
        assert_eq!(construction.subsets.len(), 1);
        assert_eq!(show_subset(&construction.subsets[0]), "{0}");
        assert_eq!(construction.table[0].len(), 1);
        assert_eq!(construction.outputs, vec![1]);
    }
}
