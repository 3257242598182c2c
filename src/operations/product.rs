use std::{borrow::Cow, fmt::Display, str::FromStr, time::Instant};

use itertools::Itertools;
use tracing::{debug, trace};

use crate::{
    automaton::{report_progress, TransitionMap},
    math::{self, Bijection},
    prelude::*,
};

/// The rule by which the output of a pair of states is computed from the outputs of its
/// components in a cross product.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operator {
    /// Both outputs are non-zero.
    And,
    /// At least one output is non-zero.
    Or,
    /// Exactly one output is non-zero.
    Xor,
    /// The left output is zero or the right one is non-zero.
    Implies,
    /// Both or neither of the outputs are non-zero.
    Iff,
    /// `lhs < rhs`
    Less,
    /// `lhs > rhs`
    Greater,
    /// `lhs == rhs`
    Equal,
    /// `lhs != rhs`
    NotEqual,
    /// `lhs <= rhs`
    LessEqual,
    /// `lhs >= rhs`
    GreaterEqual,
    /// `lhs + rhs`
    Plus,
    /// `lhs - rhs`
    Minus,
    /// `lhs * rhs`
    Times,
    /// `lhs / rhs` rounded towards negative infinity, fails on a zero divisor.
    Divide,
    /// Takes the carried value whenever the right side accepts and keeps the left output otherwise.
    /// This is what builds an automaton with output from several plain automata.
    Combine(Output),
    /// Takes the left output unless it is zero, in which case the right output is taken.
    First,
}

impl Operator {
    /// Computes the output of a pair whose components have outputs `lhs` and `rhs`.
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// assert_eq!(Operator::Implies.apply(3, 0).unwrap(), 0);
    /// assert_eq!(Operator::Divide.apply(-7, 2).unwrap(), -4);
    /// assert_eq!(Operator::Combine(5).apply(2, 1).unwrap(), 5);
    /// assert!(Operator::Divide.apply(1, 0).is_err());
    /// ```
    pub fn apply(&self, lhs: Output, rhs: Output) -> Result<Output> {
        let (l, r) = (lhs != 0, rhs != 0);
        Ok(match self {
            Operator::And => Output::from(l && r),
            Operator::Or => Output::from(l || r),
            Operator::Xor => Output::from(l != r),
            Operator::Implies => Output::from(!l || r),
            Operator::Iff => Output::from(l == r),
            Operator::Less => Output::from(lhs < rhs),
            Operator::Greater => Output::from(lhs > rhs),
            Operator::Equal => Output::from(lhs == rhs),
            Operator::NotEqual => Output::from(lhs != rhs),
            Operator::LessEqual => Output::from(lhs <= rhs),
            Operator::GreaterEqual => Output::from(lhs >= rhs),
            Operator::Plus => lhs.wrapping_add(rhs),
            Operator::Minus => lhs.wrapping_sub(rhs),
            Operator::Times => lhs.wrapping_mul(rhs),
            Operator::Divide => {
                if rhs == 0 {
                    return Err(AutomatonError::DivisionByZero);
                }
                math::floor_div(lhs, rhs)
            }
            Operator::Combine(carried) => {
                if r {
                    *carried
                } else {
                    lhs
                }
            }
            Operator::First => {
                if l {
                    lhs
                } else {
                    rhs
                }
            }
        })
    }

    /// Returns true for the logical connectives.
    pub fn is_logical(&self) -> bool {
        matches!(
            self,
            Operator::And | Operator::Or | Operator::Xor | Operator::Implies | Operator::Iff
        )
    }

    /// Returns true for the comparisons, which turn two automata with output into a plain one.
    pub fn is_comparison(&self) -> bool {
        matches!(
            self,
            Operator::Less
                | Operator::Greater
                | Operator::Equal
                | Operator::NotEqual
                | Operator::LessEqual
                | Operator::GreaterEqual
        )
    }

    /// Returns true for `+`, `-`, `*` and `/`.
    pub fn is_arithmetic(&self) -> bool {
        matches!(
            self,
            Operator::Plus | Operator::Minus | Operator::Times | Operator::Divide
        )
    }

    /// Whether both operands have to be total before the product is built. Only a conjunction
    /// can do without, since a missing transition on either side already rejects.
    pub fn requires_total(&self) -> bool {
        !matches!(self, Operator::And)
    }
}

impl Display for Operator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Operator::And => write!(f, "&"),
            Operator::Or => write!(f, "|"),
            Operator::Xor => write!(f, "^"),
            Operator::Implies => write!(f, "=>"),
            Operator::Iff => write!(f, "<=>"),
            Operator::Less => write!(f, "<"),
            Operator::Greater => write!(f, ">"),
            Operator::Equal => write!(f, "="),
            Operator::NotEqual => write!(f, "!="),
            Operator::LessEqual => write!(f, "<="),
            Operator::GreaterEqual => write!(f, ">="),
            Operator::Plus => write!(f, "+"),
            Operator::Minus => write!(f, "-"),
            Operator::Times => write!(f, "*"),
            Operator::Divide => write!(f, "/"),
            Operator::Combine(value) => write!(f, "combine({value})"),
            Operator::First => write!(f, "first"),
        }
    }
}

impl FromStr for Operator {
    type Err = String;

    /// Parses the symbolic form of every operator except [`Operator::Combine`].
    fn from_str(s: &str) -> std::result::Result<Self, Self::Err> {
        Ok(match s {
            "&" => Operator::And,
            "|" => Operator::Or,
            "^" => Operator::Xor,
            "=>" => Operator::Implies,
            "<=>" => Operator::Iff,
            "<" => Operator::Less,
            ">" => Operator::Greater,
            "=" => Operator::Equal,
            "!=" => Operator::NotEqual,
            "<=" => Operator::LessEqual,
            ">=" => Operator::GreaterEqual,
            "+" => Operator::Plus,
            "-" => Operator::Minus,
            "*" => Operator::Times,
            "/" => Operator::Divide,
            "first" => Operator::First,
            other => return Err(format!("unknown operator `{other}`")),
        })
    }
}

/// A state of the cross product, consisting of a state of the left and one of the right operand.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProductIndex(pub StateIndex, pub StateIndex);

/// How the coordinates of two labeled automata are merged.
#[derive(Debug, Clone)]
pub(crate) struct Join {
    /// The coordinates of the product, those of the left operand followed by the ones of the right
    /// operand whose label does not appear on the left.
    pub coordinates: Coordinates,
    pub labels: Vec<String>,
    /// Pairs of a right coordinate and the left coordinate carrying the same label.
    shared: Bijection<usize, usize>,
    right_size: usize,
    /// Maps `x * right_size + y` to the joint symbol, or `None` if `x` and `y` disagree on a
    /// shared coordinate.
    symbols: Vec<Option<Symbol>>,
}

impl Join {
    pub fn new(lhs: &Automaton, rhs: &Automaton) -> Result<Self> {
        let left_labels = lhs.require_labels()?;
        let right_labels = rhs.require_labels()?;
        let left = lhs.coordinates();
        let right = rhs.coordinates();

        let mut shared = Bijection::new();
        let mut alphabets = left.alphabets().to_vec();
        let mut number_systems = left.number_systems().to_vec();
        let mut labels = left_labels.to_vec();
        for (i, label) in right_labels.iter().enumerate() {
            match left_labels.iter().position(|l| l == label) {
                Some(j) => {
                    if !left.alphabet(j).same_values(right.alphabet(i)) {
                        return Err(AutomatonError::IncompatibleAlphabet(label.clone()));
                    }
                    if number_systems[j].is_none() {
                        number_systems[j] = right.number_system(i).cloned();
                    }
                    shared.insert(i, j);
                }
                None => {
                    alphabets.push(right.alphabet(i).clone());
                    number_systems.push(right.number_system(i).cloned());
                    labels.push(label.clone());
                }
            }
        }
        let coordinates = Coordinates::new(alphabets, number_systems)?;

        let mut symbols = Vec::with_capacity(left.alphabet_size() * right.alphabet_size());
        for x in left.symbols() {
            let tuple = left.decode(x);
            for y in right.symbols() {
                let other = right.decode(y);
                let agrees = shared.iter().all(|(&i, &j)| other[i] == tuple[j]);
                symbols.push(if agrees {
                    let joint = tuple
                        .iter()
                        .copied()
                        .chain(
                            other
                                .iter()
                                .enumerate()
                                .filter(|(i, _)| !shared.contains_left(i))
                                .map(|(_, &v)| v),
                        )
                        .collect_vec();
                    Some(coordinates.encode(&joint)?)
                } else {
                    None
                });
            }
        }
        trace!(
            "joined labels {} and {} into {}",
            left_labels.iter().join(","),
            right_labels.iter().join(","),
            labels.iter().join(",")
        );
        Ok(Self {
            coordinates,
            labels,
            shared,
            right_size: right.alphabet_size(),
            symbols,
        })
    }

    /// Returns the joint symbol for symbol `x` on the left and `y` on the right.
    pub fn symbol(&self, x: Symbol, y: Symbol) -> Option<Symbol> {
        self.symbols[x * self.right_size + y]
    }

    /// The number of coordinates both sides have in common.
    pub fn shared_count(&self) -> usize {
        self.shared.len()
    }
}

/// Builds the reachable part of the cross product, returns the pairs (indexed by their new state
/// index, the initial pair is `0`) together with the transitions between them. The function `joint`
/// gives the symbol of the product on which `x` is read on the left and `y` on the right, if any.
pub(crate) fn pair_product<F>(
    lhs: &Automaton,
    rhs: &Automaton,
    joint: F,
) -> (Vec<ProductIndex>, Vec<TransitionMap>)
where
    F: Fn(Symbol, Symbol) -> Option<Symbol>,
{
    let start = Instant::now();
    let initial = ProductIndex(lhs.initial_state(), rhs.initial_state());
    let mut pairs = vec![initial];
    let mut index: Map<ProductIndex, StateIndex> = Map::default();
    index.insert(initial, 0);
    let mut transitions = vec![];

    let mut current = 0;
    while current < pairs.len() {
        report_progress("cross product", current + 1, pairs.len(), start);
        let ProductIndex(p, q) = pairs[current];
        let mut map = TransitionMap::new();
        for (&x, left) in &lhs.transitions()[p] {
            for (&y, right) in &rhs.transitions()[q] {
                let Some(z) = joint(x, y) else {
                    continue;
                };
                let mut successors = Vec::with_capacity(left.len() * right.len());
                for (&l, &r) in left.iter().cartesian_product(right) {
                    let pair = ProductIndex(l, r);
                    let target = *index.entry(pair).or_insert_with(|| {
                        pairs.push(pair);
                        pairs.len() - 1
                    });
                    successors.push(target);
                }
                successors.sort_unstable();
                successors.dedup();
                map.insert(z, successors);
            }
        }
        transitions.push(map);
        current += 1;
    }
    (pairs, transitions)
}

/// The product of two automata over identical coordinates, where both sides read the same symbol.
/// The coordinates and labels of `lhs` are kept. Used for operators that cannot fail.
pub(crate) fn aligned_product(lhs: &Automaton, rhs: &Automaton, op: Operator) -> Automaton {
    debug_assert_eq!(lhs.coordinates(), rhs.coordinates());
    let (pairs, transitions) = pair_product(lhs, rhs, |x, y| (x == y).then_some(x));
    let outputs = pairs
        .iter()
        .map(|&ProductIndex(p, q)| {
            let left = lhs.output(p);
            op.apply(left, rhs.output(q)).unwrap_or(left)
        })
        .collect();
    Automaton::from_parts(lhs.coordinates().clone(), 0, outputs, transitions)
        .with_labels_of(lhs.labels())
}

impl Automaton {
    /// Trivial automata take part in products as a single state over no coordinates.
    pub(crate) fn as_explicit(&self) -> Cow<'_, Automaton> {
        match self.is_trivial() {
            Some(value) => {
                let single = if value {
                    Automaton::universal(Coordinates::empty())
                } else {
                    Automaton::empty(Coordinates::empty())
                };
                Cow::Owned(single.with_labels_of(Some(&[] as &[String])))
            }
            None => Cow::Borrowed(self),
        }
    }

    /// Computes the cross product of `self` and `other`. Both have to be labeled, coordinates that
    /// share a label are unified, which requires them to have the same alphabet. The output of a pair
    /// is given by applying `op` to the outputs of its components.
    ///
    /// Only the reachable pairs are built. Neither operand is totalized and the result is not
    /// minimized, this is left to the callers such as [`Automaton::and`].
    ///
    /// ```
    /// use autoseq::prelude::*;
    ///
    /// let a: Automaton = "{0,1}\n0 0\n1 -> 1\n1 1\n".parse().unwrap();
    /// let b: Automaton = "{0,1}\n0 0\n* -> 1\n1 1\n".parse().unwrap();
    /// let product = a.bind(&["x"]).unwrap().product(&b.bind(&["y"]).unwrap(), Operator::And).unwrap();
    /// assert_eq!(product.labels().unwrap(), &["x", "y"]);
    /// assert!(product.accepts(&[vec![1, 0]]).unwrap());
    /// assert!(!product.accepts(&[vec![0, 1]]).unwrap());
    /// ```
    pub fn product(&self, other: &Automaton, op: Operator) -> Result<Automaton> {
        let start = Instant::now();
        let lhs = self.as_explicit();
        let rhs = other.as_explicit();
        debug!(
            "computing cross product ({op}): {} states - {} states",
            lhs.state_count(),
            rhs.state_count()
        );
        let join = Join::new(&lhs, &rhs)?;
        let (pairs, transitions) = pair_product(&lhs, &rhs, |x, y| join.symbol(x, y));
        let outputs = pairs
            .iter()
            .map(|&ProductIndex(p, q)| op.apply(lhs.output(p), rhs.output(q)))
            .collect::<Result<Vec<_>>>()?;
        let out = Automaton::from_parts(join.coordinates.clone(), 0, outputs, transitions)
            .with_labels_of(Some(join.labels.as_slice()));
        debug!(
            "computed cross product ({op}): {} states, {} shared coordinates - {}ms",
            out.state_count(),
            join.shared_count(),
            start.elapsed().as_millis()
        );
        Ok(out)
    }
}

#[cfg(test)]
mod tests {
    use super::Join;
    use crate::prelude::*;

    fn labeled(text: &str, labels: &[&str]) -> Automaton {
        text.parse::<Automaton>().unwrap().bind(labels).unwrap()
    }

    #[test_log::test]
    fn operators() {
        for (op, expected) in [
            (Operator::And, [0, 0, 0, 1]),
            (Operator::Or, [0, 1, 1, 1]),
            (Operator::Xor, [0, 1, 1, 0]),
            (Operator::Implies, [1, 1, 0, 1]),
            (Operator::Iff, [1, 0, 0, 1]),
        ] {
            let table: Vec<Output> = [(0, 0), (0, 7), (-2, 0), (3, 1)]
                .into_iter()
                .map(|(l, r)| op.apply(l, r).unwrap())
                .collect();
            assert_eq!(table, expected, "{op}");
        }
        assert_eq!(Operator::LessEqual.apply(2, 2).unwrap(), 1);
        assert_eq!(Operator::Greater.apply(2, 2).unwrap(), 0);
        assert_eq!(Operator::Minus.apply(2, 5).unwrap(), -3);
        assert_eq!(Operator::Times.apply(-2, 5).unwrap(), -10);
        assert_eq!(Operator::First.apply(0, 4).unwrap(), 4);
        assert_eq!(Operator::First.apply(-1, 4).unwrap(), -1);
        assert_eq!(Operator::Combine(9).apply(3, 0).unwrap(), 3);
        assert!(matches!(
            Operator::Divide.apply(3, 0),
            Err(AutomatonError::DivisionByZero)
        ));
        for op in ["&", "<=>", "!=", "/", "first"] {
            assert_eq!(op.parse::<Operator>().unwrap().to_string(), op);
        }
        assert!("%".parse::<Operator>().is_err());
        assert!(Operator::Plus.is_arithmetic() && !Operator::Plus.is_comparison());
        assert!(!Operator::And.requires_total() && Operator::Or.requires_total());
    }

    #[test_log::test]
    fn joining_coordinates() {
        let a = labeled("{0,1} {4,5}\n0 1\n", &["x", "y"]);
        let b = labeled("{7,8,9} {0,1}\n0 1\n", &["z", "x"]);
        let join = Join::new(&a, &b).unwrap();
        assert_eq!(join.labels, vec!["x", "y", "z"]);
        assert_eq!(join.coordinates.alphabet_size(), 12);
        assert_eq!(join.shared_count(), 1);
        let x = a.coordinates().encode(&[1, 5]).unwrap();
        let y = b.coordinates().encode(&[9, 1]).unwrap();
        let joint = join.coordinates.encode(&[1, 5, 9]).unwrap();
        assert_eq!(join.symbol(x, y), Some(joint));
        let disagreeing = b.coordinates().encode(&[9, 0]).unwrap();
        assert_eq!(join.symbol(x, disagreeing), None);

        let c = labeled("{0,2}\n0 1\n", &["x"]);
        assert!(matches!(
            Join::new(&a, &c),
            Err(AutomatonError::IncompatibleAlphabet(_))
        ));
        let unlabeled: Automaton = "{0,1}\n0 1\n".parse().unwrap();
        assert!(matches!(
            a.product(&unlabeled, Operator::And),
            Err(AutomatonError::NotLabeled)
        ));
    }

    #[test_log::test]
    fn products() {
        // x ends in 1, y is never 1 (both over {0,1})
        let ends_in_one = labeled("{0,1}\n0 0\n0 -> 0\n1 -> 1\n1 1\n0 -> 0\n1 -> 1\n", &["x"]);
        let never_one = labeled("{0,1}\n0 1\n0 -> 0\n", &["y"]);
        let product = ends_in_one.product(&never_one, Operator::And).unwrap();
        assert_eq!(product.arity(), 2);
        assert!(product.accepts(&[vec![0, 0], vec![1, 0]]).unwrap());
        assert!(!product.accepts(&[vec![1, 1]]).unwrap());

        // sharing the label means reading the same word on both
        let shared = ends_in_one
            .product(&never_one.bind(&["x"]).unwrap(), Operator::And)
            .unwrap();
        assert_eq!(shared.arity(), 1);
        assert!(shared.is_empty());

        let with_true = ends_in_one
            .product(&Automaton::trivial(true), Operator::And)
            .unwrap();
        assert!(with_true.equals(&ends_in_one).unwrap());
    }

    #[test_log::test]
    fn division_by_reachable_zero() {
        let numerator = labeled("{0,1}\n0 6\n* -> 0\n", &["n"]);
        let denominator = labeled("{0,1}\n0 3\n1 -> 1\n0 -> 0\n1 0\n* -> 1\n", &["n"]);
        assert!(matches!(
            numerator.product(&denominator, Operator::Divide),
            Err(AutomatonError::DivisionByZero)
        ));
        let nonzero = labeled("{0,1}\n0 -4\n* -> 0\n", &["n"]);
        let quotient = numerator.product(&nonzero, Operator::Divide).unwrap();
        assert_eq!(quotient.outputs(), &[-2]);
    }
}
