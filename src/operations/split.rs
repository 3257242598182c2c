use std::time::Instant;

use itertools::Itertools;
use tracing::{debug, trace};

use crate::prelude::*;

/// Says how a coordinate is treated by [`Automaton::split`] and [`Automaton::reverse_split`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum SplitInput {
    /// The coordinate is kept as it is.
    #[default]
    Unchanged,
    /// The coordinate is replaced by the same number in the other number system.
    Positive,
    /// The coordinate is replaced by the negated number in the other number system.
    Negative,
}

/// Supplies the automata that relate a number system to its counterpart with negative base, for
/// example `msd_2` and `msd_neg_2`. Both automata have two unlabeled coordinates.
pub trait BaseChange {
    /// Accepts `(x, y)` iff `x` is a representation in the positive system and `y` a representation
    /// of the same number in the negative system. `ns` is the number system of the coordinate that is
    /// being split, which may be either of the two.
    fn base_change(&self, ns: &NumberSystem) -> Result<Automaton>;

    /// Accepts `(x, y)` iff `x + y = 0`, where both are read in the negative system belonging to `ns`.
    fn negation(&self, ns: &NumberSystem) -> Result<Automaton>;
}

impl Automaton {
    /// Replaces coordinates in a negative base by coordinates in the corresponding positive base.
    /// On the coordinates marked [`SplitInput::Positive`] the result reads `x` and behaves like
    /// `self` on the negative base representation of `x`, on those marked [`SplitInput::Negative`] it
    /// behaves like `self` on the representation of `-x`.
    ///
    /// The coordinates of the result are labeled by their position.
    pub fn split(&self, inputs: &[SplitInput], provider: &dyn BaseChange) -> Result<Automaton> {
        self.split_coordinates(inputs, provider, false)
    }

    /// The inverse of [`Self::split`]: replaces coordinates in a positive base by coordinates in
    /// the corresponding negative base. Numbers that have no representation in the positive base
    /// are rejected.
    pub fn reverse_split(&self, inputs: &[SplitInput], provider: &dyn BaseChange) -> Result<Automaton> {
        self.split_coordinates(inputs, provider, true)
    }

    fn split_coordinates(
        &self,
        inputs: &[SplitInput],
        provider: &dyn BaseChange,
        reverse: bool,
    ) -> Result<Automaton> {
        if self.is_trivial().is_some() || inputs.len() != self.arity() {
            return Err(AutomatonError::ArityMismatch {
                expected: self.arity(),
                found: inputs.len(),
            });
        }
        let start = Instant::now();
        debug!(
            "{}splitting [{}]: {} states",
            if reverse { "reverse " } else { "" },
            inputs.iter().map(|i| format!("{i:?}")).join(","),
            self.state_count()
        );

        let positional: Vec<String> = (0..self.arity()).map(|i| format!("b{i}")).collect();
        let mut current = self.bind(&positional)?;
        let mut quantified = vec![];
        for (i, input) in inputs.iter().enumerate() {
            if *input == SplitInput::Unchanged {
                continue;
            }
            let ns = self
                .coordinates()
                .number_system(i)
                .ok_or(AutomatonError::MissingNumberSystem(i))?;
            let (a, b, c) = (format!("a{i}"), format!("b{i}"), format!("c{i}"));
            let change = provider.base_change(ns)?;
            trace!("splitting coordinate {i} in {ns} as {input:?}");
            match (*input == SplitInput::Negative, reverse) {
                (false, false) => {
                    current = current.and(&change.bind(&[&a, &b])?)?;
                    quantified.push(b);
                }
                (true, false) => {
                    current = current
                        .and(&change.bind(&[&a, &c])?)?
                        .and(&provider.negation(ns)?.bind(&[&b, &c])?)?;
                    quantified.extend([b, c]);
                }
                (false, true) => {
                    current = current.and(&change.bind(&[&b, &a])?)?;
                    quantified.push(b);
                }
                (true, true) => {
                    current = current
                        .and(&change.bind(&[&b, &c])?)?
                        .and(&provider.negation(ns)?.bind(&[&a, &c])?)?;
                    quantified.extend([b, c]);
                }
            }
        }
        let projected = current.quantify(&quantified)?;

        // every remaining label is a{i} or b{i}, restore the positional order of the coordinates
        let width = self.arity().to_string().len();
        let ordered: Vec<String> = projected
            .require_labels()?
            .iter()
            .map(|l| format!("{:0>width$}", &l[1..]))
            .collect();
        let out = projected.bind(&ordered)?.sort_labels().with_positional_labels();
        debug!(
            "split: {} states - {}ms",
            out.state_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn digits(arity: usize) -> Coordinates {
        Coordinates::new(
            vec![Alphabet::new([-1, 0, 1]).unwrap(); arity],
            vec![Some(NumberSystem::new("msd_bal3")); arity],
        )
        .unwrap()
    }

    /// Automaton with a single state accepting all pairs of digits for which `accept` holds.
    fn digitwise(accept: impl Fn(Value, Value) -> bool) -> Automaton {
        let coordinates = digits(2);
        let loops = coordinates
            .symbols()
            .filter(|&a| {
                let pair = coordinates.decode(a);
                accept(pair[0], pair[1])
            })
            .map(|a| (a, vec![0]))
            .collect();
        Automaton::new(coordinates, 0, vec![1], vec![loops]).unwrap()
    }

    /// Balanced ternary, where both the base change and the negation work digit by digit.
    struct Balanced;

    impl BaseChange for Balanced {
        fn base_change(&self, _ns: &NumberSystem) -> Result<Automaton> {
            Ok(digitwise(|x, y| x == y))
        }

        fn negation(&self, _ns: &NumberSystem) -> Result<Automaton> {
            Ok(digitwise(|x, y| x == -y))
        }
    }

    fn word(values: &[i64]) -> Vec<Vec<Value>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    /// Accepts the words starting with the digit 1.
    fn leading_one() -> Automaton {
        let coordinates = digits(1);
        let one = coordinates.encode(&[1]).unwrap();
        let all = coordinates.symbols().map(|a| (a, vec![1])).collect();
        Automaton::new(
            coordinates,
            0,
            vec![0, 1],
            vec![[(one, vec![1])].into_iter().collect(), all],
        )
        .unwrap()
    }

    #[test_log::test]
    fn splitting_single_coordinates() {
        let aut = leading_one();
        let positive = aut.split(&[SplitInput::Positive], &Balanced).unwrap();
        assert_eq!(positive.labels().unwrap(), &["0"]);
        assert!(positive.accepts(&word(&[1, -1])).unwrap());
        assert!(positive.accepts(&word(&[0, 1])).unwrap());
        assert!(!positive.accepts(&word(&[-1])).unwrap());

        let negative = aut.split(&[SplitInput::Negative], &Balanced).unwrap();
        assert!(negative.accepts(&word(&[-1, 1])).unwrap());
        assert!(negative.accepts(&word(&[0, -1])).unwrap());
        assert!(!negative.accepts(&word(&[1])).unwrap());

        let back = negative
            .reverse_split(&[SplitInput::Negative], &Balanced)
            .unwrap();
        assert!(back.accepts(&word(&[1, 0])).unwrap());
        assert!(!back.accepts(&word(&[-1])).unwrap());
    }

    #[test_log::test]
    fn coordinates_keep_their_position() {
        let equal = digitwise(|x, y| x == y);
        let split = equal
            .split(&[SplitInput::Negative, SplitInput::Unchanged], &Balanced)
            .unwrap();
        assert_eq!(split.labels().unwrap(), &["0", "1"]);
        assert!(split.accepts(&[vec![1, -1], vec![0, 0]]).unwrap());
        assert!(!split.accepts(&[vec![1, 1]]).unwrap());

        let unchanged = equal
            .split(&[SplitInput::Unchanged, SplitInput::Unchanged], &Balanced)
            .unwrap();
        assert!(unchanged.equals(&equal).unwrap());
    }

    #[test_log::test]
    fn invalid_splits() {
        let aut = leading_one();
        assert!(matches!(
            aut.split(&[SplitInput::Positive, SplitInput::Positive], &Balanced),
            Err(AutomatonError::ArityMismatch { .. })
        ));
        assert!(matches!(
            Automaton::trivial(true).split(&[], &Balanced),
            Err(AutomatonError::ArityMismatch { .. })
        ));
        let plain: Automaton = "{0,1}\n0 1\n* -> 0\n".parse().unwrap();
        assert!(matches!(
            plain.split(&[SplitInput::Negative], &Balanced),
            Err(AutomatonError::MissingNumberSystem(0))
        ));
    }
}
