pub(crate) mod partition_refinement;
mod valmari;

use std::time::Instant;

use itertools::Itertools;
use tracing::debug;

use crate::{determinization::subset_construction, prelude::*};

impl Automaton {
    /// Returns the unique minimal deterministic automaton that accepts the same language as `self`.
    ///
    /// If `self` is not deterministic, it is determinized first. The minimization itself is done with
    /// Valmari's partition refinement algorithm. Since states from which no accepting state can be
    /// reached are removed, the result is in general not total. Outputs are treated as accept/reject,
    /// use [`Self::minimize_with_output`] for automata with output.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let aut: Automaton = "{0,1}\n0 1\n* -> 1\n1 1\n* -> 0\n".parse().unwrap();
    /// let minimal = aut.minimize();
    /// assert_eq!(minimal.state_count(), 1);
    /// ```
    pub fn minimize(&self) -> Self {
        if self.is_trivial().is_some() {
            return self.clone();
        }
        let start = Instant::now();
        debug!("minimizing: {} states", self.state_count());
        let (initial, outputs, table) = match self.deterministic_table() {
            Some(table) => valmari::minimize(self.initial_state(), self.outputs(), &table),
            None => {
                let construction = subset_construction(
                    self.transitions().to_vec(),
                    self.outputs(),
                    [self.initial_state()],
                );
                valmari::minimize(0, &construction.outputs, &construction.table)
            }
        };
        let out = Automaton::from_table(self.coordinates().clone(), initial, outputs, table)
            .with_labels_of(self.labels());
        debug!(
            "minimized: {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        out
    }

    /// Minimizes an automaton with output. The automaton is split into one automaton per distinct
    /// output value (see [`Self::uncombine`]), each of which is minimized as a plain automaton, before
    /// they are combined again. Only outputs of reachable states are considered and undefined
    /// transitions count as leading to a state with output 0, so the result is total.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let aut: Automaton = "{0,1}\n0 0\n0 -> 1\n1 -> 2\n1 3\n* -> 1\n2 3\n* -> 2\n".parse().unwrap();
    /// let minimal = aut.minimize_with_output();
    /// assert_eq!(minimal.state_count(), 2);
    /// assert_eq!(minimal.output_on(&[vec![1], vec![0]]).unwrap(), 3);
    /// ```
    pub fn minimize_with_output(&self) -> Self {
        if self.is_trivial().is_some() {
            return self.clone();
        }
        let start = Instant::now();
        debug!("minimizing with output: {} states", self.state_count());
        // every word has to land in exactly one non-empty piece
        let total = self.totalize();
        let values: Vec<Output> = total
            .reachable_states()
            .into_iter()
            .map(|q| total.output(q))
            .unique()
            .collect();
        let pieces: Vec<Automaton> = total
            .uncombine(&values)
            .iter()
            .map(Automaton::minimize)
            .collect();
        let out = Automaton::combine_pieces(&pieces, &values).with_labels_of(self.labels());
        debug!(
            "minimized with output: {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        out
    }
}
