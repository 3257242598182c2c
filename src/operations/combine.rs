use std::time::Instant;

use tracing::debug;

use super::product::aligned_product;
use crate::prelude::*;

impl Automaton {
    /// Splits an automaton with output into one plain automaton per given value. The automaton for
    /// `values[i]` accepts exactly the words on which `self` outputs `values[i]`.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let aut: Automaton = "{0,1}\n0 4\n1 -> 1\n1 -2\n* -> 1\n".parse().unwrap();
    /// let pieces = aut.uncombine(&[4, -2]);
    /// assert!(pieces[0].accepts(&[]).unwrap());
    /// assert!(pieces[1].accepts(&[vec![1], vec![0]]).unwrap());
    /// assert!(!pieces[1].accepts(&[]).unwrap());
    /// ```
    pub fn uncombine(&self, values: &[Output]) -> Vec<Automaton> {
        if let Some(value) = self.is_trivial() {
            return values
                .iter()
                .map(|&v| Automaton::trivial(Output::from(value) == v))
                .collect();
        }
        values
            .iter()
            .map(|&v| {
                let outputs = self
                    .outputs()
                    .iter()
                    .map(|&o| Output::from(o == v))
                    .collect();
                self.with_outputs(outputs)
            })
            .collect()
    }

    /// Combines plain automata over the same coordinates into one automaton with output. A word
    /// gets `outputs[i]` where `i` is the last automaton that accepts it, and `0` if none does.
    ///
    /// Fails with [`AutomatonError::ArityMismatch`] if the number of automata and outputs differ
    /// and with [`AutomatonError::IncompatibleAlphabet`] if the coordinates of the automata do
    /// not agree.
    pub fn combine(automata: &[Automaton], outputs: &[Output]) -> Result<Automaton> {
        if automata.len() != outputs.len() || automata.is_empty() {
            return Err(AutomatonError::ArityMismatch {
                expected: automata.len().max(1),
                found: outputs.len(),
            });
        }
        let coordinates = automata
            .iter()
            .find(|a| a.is_trivial().is_none())
            .map(|a| a.coordinates().clone())
            .unwrap_or_default();
        let pieces = automata
            .iter()
            .enumerate()
            .map(|(i, aut)| match aut.is_trivial() {
                Some(true) => Ok(Automaton::universal(coordinates.clone())),
                Some(false) => Ok(Automaton::empty(coordinates.clone())),
                None if aut.coordinates() == &coordinates => Ok(aut.clone()),
                None => Err(AutomatonError::IncompatibleAlphabet(i.to_string())),
            })
            .collect::<Result<Vec<_>>>()?;
        Ok(Automaton::combine_pieces(&pieces, outputs))
    }

    /// Does the work of [`Self::combine`] on automata that are known to share their coordinates.
    pub(crate) fn combine_pieces(pieces: &[Automaton], outputs: &[Output]) -> Automaton {
        let Some((first, rest)) = pieces.split_first() else {
            return Automaton::trivial(false);
        };
        let start = Instant::now();
        let first = first.totalize();
        let mapped = first
            .outputs()
            .iter()
            .map(|&o| if o != 0 { outputs[0] } else { 0 })
            .collect();
        let mut combined = first.with_outputs(mapped);
        for (next, &value) in rest.iter().zip(&outputs[1..]) {
            combined = aligned_product(&combined, &next.totalize(), Operator::Combine(value));
        }
        let out = combined.totalize();
        debug!(
            "combined {} automata into {} states - {}ms",
            pieces.len(),
            out.state_count(),
            start.elapsed().as_millis()
        );
        out
    }

    /// Joins automata with output from left to right: a word gets the first non-zero output that
    /// `self` or one of `others` assigns to it. After every step the intermediate result is
    /// minimized.
    pub fn join(&self, others: &[Automaton]) -> Result<Automaton> {
        let start = Instant::now();
        let mut first = self.clone();
        for next in others {
            debug!(
                "joining: {} states - {} states",
                first.state_count(),
                next.state_count()
            );
            first = first
                .totalize()
                .product(&next.totalize(), Operator::First)?
                .minimize_with_output();
        }
        debug!(
            "joined {} automata: {} states - {}ms",
            others.len() + 1,
            first.state_count(),
            start.elapsed().as_millis()
        );
        Ok(first)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn parse(text: &str) -> Automaton {
        text.parse().unwrap()
    }

    #[test_log::test]
    fn combine_and_uncombine() {
        let ends_in_zero = parse("{0,1}\n0 0\n0 -> 1\n1 -> 0\n1 1\n0 -> 1\n1 -> 0\n");
        let ends_in_one = parse("{0,1}\n0 0\n0 -> 0\n1 -> 1\n1 1\n0 -> 0\n1 -> 1\n");
        let only_empty = parse("{0,1}\n0 1\n");
        let parts = [ends_in_zero, ends_in_one, only_empty];

        let combined = Automaton::combine(&parts, &[1, 2, 3]).unwrap();
        assert!(combined.is_total());
        assert_eq!(combined.output_on(&[]).unwrap(), 3);
        assert_eq!(combined.output_on(&[vec![0]]).unwrap(), 1);
        assert_eq!(combined.output_on(&[vec![0], vec![1]]).unwrap(), 2);

        let pieces = combined.uncombine(&[1, 2, 3]);
        assert_eq!(pieces.len(), 3);
        for (piece, part) in pieces.iter().zip(&parts) {
            assert!(piece.equals(part).unwrap());
        }
    }

    #[test_log::test]
    fn later_automata_take_precedence() {
        let everything = Automaton::trivial(true);
        let ones = parse("{0,1}\n0 1\n1 -> 0\n");
        let combined = Automaton::combine(&[everything, ones], &[5, 6]).unwrap();
        assert_eq!(combined.output_on(&[vec![0]]).unwrap(), 5);
        assert_eq!(combined.output_on(&[vec![1], vec![1]]).unwrap(), 6);
        assert_eq!(combined.output_on(&[]).unwrap(), 6);
    }

    #[test_log::test]
    fn invalid_combinations() {
        let ones = parse("{0,1}\n0 1\n1 -> 0\n");
        assert!(matches!(
            Automaton::combine(&[ones.clone()], &[1, 2]),
            Err(AutomatonError::ArityMismatch { .. })
        ));
        assert!(matches!(
            Automaton::combine(&[], &[]),
            Err(AutomatonError::ArityMismatch { .. })
        ));
        let other = parse("{0,2}\n0 1\n");
        assert!(matches!(
            Automaton::combine(&[ones, other], &[1, 2]),
            Err(AutomatonError::IncompatibleAlphabet(_))
        ));
    }

    #[test_log::test]
    fn joining_takes_the_first_nonzero_output() {
        let partial = parse("{0,1}\n0 0\n0 -> 0\n1 -> 1\n1 4\n* -> 1\n")
            .bind(&["n"])
            .unwrap();
        let constant = parse("{0,1}\n0 7\n* -> 0\n").bind(&["n"]).unwrap();
        let joined = partial.join(&[constant.clone()]).unwrap();
        assert_eq!(joined.output_on(&[vec![0]]).unwrap(), 7);
        assert_eq!(joined.output_on(&[vec![0], vec![1]]).unwrap(), 4);

        let reversed = constant.join(&[partial]).unwrap();
        assert_eq!(reversed.output_on(&[vec![1]]).unwrap(), 7);
        assert_eq!(reversed.state_count(), 1);
        assert_eq!(constant.join(&[]).unwrap(), constant);
    }
}
