use std::time::Instant;

use tracing::{debug, trace};

use crate::{
    automaton::{report_progress, DeterministicTable},
    math::{common_root, integer_log, OrderedMap},
    prelude::*,
};

/// State of the digit splitting construction: a state of the automaton over the large base
/// together with the digits of the current large digit that have been read so far.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
struct Pending {
    state: StateIndex,
    value: u64,
    count: u32,
}

fn incompatible(message: impl Into<String>) -> AutomatonError {
    AutomatonError::IncompatibleBases(message.into())
}

impl Automaton {
    /// Changes the number system of a single arithmetic coordinate from `msd_k`/`lsd_k` to
    /// `msd_j`/`lsd_j`, where `to_msd` selects the reading direction and `to_base` is `j`. The
    /// result represents the same set of numbers (or the same function, for automata with output).
    ///
    /// The conversion goes through the largest common root `r` of `k` and `j`: every digit in base
    /// `k` is split into digits of base `r`, which are then grouped into digits of base `j`.
    ///
    /// Fails with [`AutomatonError::IncompatibleBases`] if the automaton does not have exactly one
    /// coordinate with an integer base, if `k` and `j` are not powers of a common root or if the
    /// alphabet of the coordinate is not `{0, ..., k-1}`.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// // even numbers in base 4
    /// let even: Automaton = "msd_4\n0 1\n0 -> 0\n2 -> 0\n1 -> 1\n3 -> 1\n1 0\n0 -> 0\n2 -> 0\n1 -> 1\n3 -> 1\n"
    ///     .parse()
    ///     .unwrap();
    /// let binary = even.convert(true, 2).unwrap();
    /// assert!(binary.accepts(&[vec![1], vec![1], vec![0]]).unwrap());
    /// assert!(!binary.accepts(&[vec![1], vec![0], vec![1]]).unwrap());
    /// ```
    pub fn convert(&self, to_msd: bool, to_base: u64) -> Result<Automaton> {
        if self.is_trivial().is_some() {
            return Ok(self.clone());
        }
        if self.arity() != 1 {
            return Err(incompatible(format!(
                "conversion needs exactly one coordinate, found {}",
                self.arity()
            )));
        }
        let ns = self
            .coordinates()
            .number_system(0)
            .ok_or_else(|| incompatible("the coordinate has no number system"))?;
        let from = ns
            .base()
            .ok_or_else(|| incompatible(format!("{ns} has no integer base")))?;
        if to_base < 2 {
            return Err(incompatible(format!("cannot convert to base {to_base}")));
        }
        let start = Instant::now();
        debug!(
            "converting {ns} to {}_{to_base}: {} states",
            if to_msd { "msd" } else { "lsd" },
            self.state_count()
        );

        let mut current = self.clone();
        if from == to_base {
            if ns.is_msd() != to_msd {
                current = current.reverse_with_output(true)?;
            }
            return Ok(current);
        }
        let root = common_root(from, to_base)
            .ok_or_else(|| incompatible(format!("{from} and {to_base} have no common root")))?;

        if from != root {
            // a partial block of digits is padded with zeros at its most significant end, which
            // requires reading the least significant digit first
            if ns.is_msd() {
                current = current.reverse_with_output(true)?;
            }
            let exponent = integer_log(from, root)
                .ok_or_else(|| incompatible(format!("{from} is no power of {root}")))?;
            current = current.digit_split(root, exponent)?;
        }
        if to_base != root {
            let exponent = integer_log(to_base, root)
                .ok_or_else(|| incompatible(format!("{to_base} is no power of {root}")))?;
            current = current.digit_group(exponent)?;
        }
        if current.coordinates().uniform_direction() != Some(to_msd) {
            current = current.reverse_with_output(true)?;
        }

        debug!(
            "converted to {}: {} states - {}ms",
            current
                .coordinates()
                .number_system(0)
                .map(NumberSystem::name)
                .unwrap_or_default(),
            current.state_count(),
            start.elapsed().as_millis()
        );
        Ok(current)
    }

    /// Checks that the only coordinate is arithmetic with digits `{0, ..., base - 1}` and returns
    /// its number system.
    fn digit_system(&self, base: u64) -> Result<NumberSystem> {
        let coordinates = self.coordinates();
        match coordinates.number_system(0) {
            Some(ns) if coordinates.alphabet(0).same_values(&Alphabet::range(base)) => {
                Ok(ns.clone())
            }
            Some(ns) => Err(incompatible(format!(
                "the alphabet {} of {ns} is not {}",
                coordinates.alphabet(0),
                Alphabet::range(base)
            ))),
            None => Err(incompatible("the coordinate has no number system")),
        }
    }

    /// Turns an lsd automaton over base `root^exponent` into an lsd automaton over base `root`.
    fn digit_split(&self, root: u64, exponent: u32) -> Result<Automaton> {
        let start = Instant::now();
        let base = root
            .checked_pow(exponent)
            .ok_or_else(|| incompatible(format!("{root}^{exponent} is too large")))?;
        let ns = self.digit_system(base)?;
        debug_assert!(!ns.is_msd());
        trace!("splitting digits of {ns} into {exponent} digits of base {root}");

        let (total, added) = self.add_distinguished_dead_state();
        let table = total.total_table()?;
        let old = (0..base)
            .map(|v| total.coordinates().encode(&[v as Value]))
            .collect::<Result<Vec<_>>>()?;
        let coordinates = Coordinates::arithmetic(&NumberSystem::lsd(root), 1);
        let digits = (0..root)
            .map(|d| coordinates.encode(&[d as Value]))
            .collect::<Result<Vec<_>>>()?;

        let first = Pending {
            state: total.initial_state(),
            value: 0,
            count: 0,
        };
        let mut queue = vec![first];
        let mut index: Map<Pending, StateIndex> = Map::default();
        index.insert(first, 0);
        let mut outputs = vec![];
        let mut split: DeterministicTable = vec![];

        let mut current = 0;
        while current < queue.len() {
            report_progress("digit splitting", current + 1, queue.len(), start);
            let pending = queue[current];
            let reached = if pending.count == 0 {
                pending.state
            } else {
                table[pending.state][&old[pending.value as usize]]
            };
            outputs.push(total.output(reached));

            let mut row = OrderedMap::new();
            let weight = root.pow(pending.count);
            for (d, &digit) in digits.iter().enumerate() {
                let value = pending.value + d as u64 * weight;
                let next = if pending.count + 1 == exponent {
                    Pending {
                        state: table[pending.state][&old[value as usize]],
                        value: 0,
                        count: 0,
                    }
                } else {
                    Pending {
                        state: pending.state,
                        value,
                        count: pending.count + 1,
                    }
                };
                let target = *index.entry(next).or_insert_with(|| {
                    queue.push(next);
                    queue.len() - 1
                });
                row.insert(digit, target);
            }
            split.push(row);
            current += 1;
        }

        let minimized = Automaton::from_table(coordinates, 0, outputs, split)
            .with_labels_of(self.labels())
            .minimize_with_output();
        Ok(if added {
            minimized.strip_states_with_output(total.output(total.state_count() - 1))
        } else {
            minimized
        })
    }

    /// Reads `exponent` digits at once, so the base `k` of the only coordinate becomes `k^exponent`.
    /// The reading direction stays the same.
    fn digit_group(&self, exponent: u32) -> Result<Automaton> {
        let ns = self
            .coordinates()
            .number_system(0)
            .cloned()
            .ok_or_else(|| incompatible("the coordinate has no number system"))?;
        let root = ns
            .base()
            .ok_or_else(|| incompatible(format!("{ns} has no integer base")))?;
        self.digit_system(root)?;
        let base = root
            .checked_pow(exponent)
            .ok_or_else(|| incompatible(format!("{root}^{exponent} is too large")))?;
        trace!("grouping {exponent} digits of {ns} into one");

        let (total, added) = self.add_distinguished_dead_state();
        let table = total.total_table()?;
        let old = (0..root)
            .map(|d| total.coordinates().encode(&[d as Value]))
            .collect::<Result<Vec<_>>>()?;
        let target = if ns.is_msd() {
            NumberSystem::msd(base)
        } else {
            NumberSystem::lsd(base)
        };
        let coordinates = Coordinates::arithmetic(&target, 1);

        let mut grouped: DeterministicTable = vec![OrderedMap::new(); total.state_count()];
        for v in 0..base {
            let symbol = coordinates.encode(&[v as Value])?;
            let mut word: Vec<Symbol> = (0..exponent)
                .map(|i| old[((v / root.pow(i)) % root) as usize])
                .collect();
            if ns.is_msd() {
                word.reverse();
            }
            for (q, row) in grouped.iter_mut().enumerate() {
                let reached = word.iter().fold(q, |p, a| table[p][a]);
                row.insert(symbol, reached);
            }
        }

        let minimized = Automaton::from_table(
            coordinates,
            total.initial_state(),
            total.outputs().to_vec(),
            grouped,
        )
        .with_labels_of(self.labels())
        .minimize_with_output();
        Ok(if added {
            minimized.strip_states_with_output(total.output(total.state_count() - 1))
        } else {
            minimized
        })
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    const EVEN_BASE_FOUR: &str =
        "msd_4\n0 1\n0 -> 0\n2 -> 0\n1 -> 1\n3 -> 1\n1 0\n0 -> 0\n2 -> 0\n1 -> 1\n3 -> 1\n";
    const EVEN_BASE_TWO: &str = "msd_2\n0 1\n0 -> 0\n1 -> 1\n1 0\n0 -> 0\n1 -> 1\n";

    fn word(values: &[i64]) -> Vec<Vec<Value>> {
        values.iter().map(|&v| vec![v]).collect()
    }

    #[test_log::test]
    fn base_four_to_base_two() {
        let even: Automaton = EVEN_BASE_FOUR.parse().unwrap();
        let binary = even.convert(true, 2).unwrap();
        assert_eq!(
            binary.coordinates().number_system(0),
            Some(&NumberSystem::msd(2))
        );
        for accepted in [&[][..], &[1, 0], &[0, 1, 0], &[0]] {
            assert!(binary.accepts(&word(accepted)).unwrap());
        }
        for rejected in [&[1, 1][..], &[1], &[0, 0, 1]] {
            assert!(!binary.accepts(&word(rejected)).unwrap());
        }
        assert!(binary.equals(&EVEN_BASE_TWO.parse().unwrap()).unwrap());
    }

    #[test_log::test]
    fn base_two_to_base_four() {
        let even: Automaton = EVEN_BASE_TWO.parse().unwrap();
        let quaternary = even.convert(true, 4).unwrap();
        assert!(quaternary.accepts(&word(&[2])).unwrap());
        assert!(quaternary.accepts(&word(&[1, 0])).unwrap());
        assert!(!quaternary.accepts(&word(&[3])).unwrap());
        assert!(!quaternary.accepts(&word(&[1])).unwrap());
        assert!(quaternary.equals(&EVEN_BASE_FOUR.parse().unwrap()).unwrap());
    }

    #[test_log::test]
    fn through_a_common_root() {
        let even: Automaton = EVEN_BASE_FOUR.parse().unwrap();
        let octal = even.bind(&["n"]).unwrap().convert(true, 8).unwrap();
        assert_eq!(
            octal.coordinates().number_system(0),
            Some(&NumberSystem::msd(8))
        );
        assert_eq!(octal.labels().unwrap(), &["n"]);
        assert!(octal.accepts(&word(&[6])).unwrap());
        assert!(octal.accepts(&word(&[1, 2])).unwrap());
        assert!(!octal.accepts(&word(&[7])).unwrap());
        assert!(!octal.accepts(&word(&[1, 1])).unwrap());
    }

    #[test_log::test]
    fn changing_direction() {
        let even: Automaton = EVEN_BASE_TWO.parse().unwrap();
        let lsd = even.convert(false, 2).unwrap();
        assert_eq!(
            lsd.coordinates().number_system(0),
            Some(&NumberSystem::lsd(2))
        );
        assert!(lsd.accepts(&word(&[0, 1])).unwrap());
        assert!(!lsd.accepts(&word(&[1, 0])).unwrap());

        let lsd_four = even.convert(false, 4).unwrap();
        assert!(lsd_four.accepts(&word(&[2, 3])).unwrap());
        assert!(!lsd_four.accepts(&word(&[3, 2])).unwrap());

        assert_eq!(even.convert(true, 2).unwrap(), even);
    }

    #[test_log::test]
    fn incompatible_conversions() {
        let even: Automaton = EVEN_BASE_TWO.parse().unwrap();
        assert!(matches!(
            even.convert(true, 3),
            Err(AutomatonError::IncompatibleBases(_))
        ));
        assert!(matches!(
            even.convert(true, 1),
            Err(AutomatonError::IncompatibleBases(_))
        ));
        let pairs: Automaton = "msd_2 msd_2\n0 1\n0 0 -> 0\n".parse().unwrap();
        assert!(matches!(
            pairs.convert(true, 4),
            Err(AutomatonError::IncompatibleBases(_))
        ));
        let plain: Automaton = "{0,1}\n0 1\n* -> 0\n".parse().unwrap();
        assert!(matches!(
            plain.convert(true, 4),
            Err(AutomatonError::IncompatibleBases(_))
        ));
    }
}
