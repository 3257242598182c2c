use std::fmt::{Debug, Display};

use itertools::Itertools;

use crate::{AutomatonError, Result, Symbol, Value};

/// The alphabet of a single coordinate, i.e. a finite, duplicate free and ordered collection
/// of integers. The position of a value in this collection is what the codec in [`Coordinates`]
/// works with, so the order matters.
#[derive(Clone, PartialEq, Eq, Hash)]
pub struct Alphabet(Vec<Value>);

impl Alphabet {
    /// Creates a new alphabet from the given values. Fails if the values are empty or if
    /// some value occurs more than once.
    pub fn new<I: IntoIterator<Item = Value>>(values: I) -> Result<Self> {
        let values: Vec<_> = values.into_iter().collect();
        if values.is_empty() {
            return Err(AutomatonError::EmptyAlphabet);
        }
        if let Some(duplicate) = values.iter().duplicates().next() {
            return Err(AutomatonError::DuplicateSymbol(*duplicate));
        }
        Ok(Self(values))
    }

    /// Like [`Alphabet::new`], but silently drops repeated values, keeping the first occurrence.
    pub fn deduplicated<I: IntoIterator<Item = Value>>(values: I) -> Result<Self> {
        Self::new(values.into_iter().unique())
    }

    /// The alphabet `{0, 1, ..., size - 1}`.
    pub fn range(size: u64) -> Self {
        Self((0..size as Value).collect())
    }

    /// Returns the number of values in the alphabet.
    pub fn size(&self) -> usize {
        self.0.len()
    }

    /// Returns the position of `value` in the alphabet.
    pub fn index_of(&self, value: Value) -> Option<usize> {
        self.0.iter().position(|&v| v == value)
    }

    /// Returns true if `value` is part of the alphabet.
    pub fn contains(&self, value: Value) -> bool {
        self.0.contains(&value)
    }

    /// Returns the value at the given position.
    pub fn get(&self, index: usize) -> Option<Value> {
        self.0.get(index).copied()
    }

    /// Gives an iterator over the values in order.
    pub fn values(&self) -> impl Iterator<Item = Value> + '_ {
        self.0.iter().copied()
    }

    /// Checks whether both alphabets contain the same values, ignoring the order.
    pub fn same_values(&self, other: &Alphabet) -> bool {
        self.size() == other.size() && self.values().all(|v| other.contains(v))
    }
}

impl Debug for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{{{}}}", self.0.iter().join(", "))
    }
}

impl Display for Alphabet {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        Debug::fmt(self, f)
    }
}

/// A number system attached to an arithmetic coordinate. It is identified by its name which
/// has the form `msd_<base>` or `lsd_<base>`, where the base is either an integer (e.g. `msd_2`) or
/// the name of some other numeration (e.g. `lsd_fib`, `msd_neg_2`).
///
/// The core only needs to know whether the system reads the most significant digit first and,
/// for base conversion, what the integer base is. Everything else is owned by the number system
/// module that supplies e.g. base change automata.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct NumberSystem {
    msd: bool,
    base: String,
}

impl NumberSystem {
    /// Parses a number system name of the form `msd_<base>` or `lsd_<base>`. A name
    /// without the prefix is interpreted as being msd, just like `2` stands for `msd_2`.
    pub fn new(name: &str) -> Self {
        let name = name.trim();
        match name.split_once('_') {
            Some(("msd", base)) => Self {
                msd: true,
                base: base.to_string(),
            },
            Some(("lsd", base)) => Self {
                msd: false,
                base: base.to_string(),
            },
            _ => Self {
                msd: true,
                base: name.to_string(),
            },
        }
    }

    /// The number system `msd_<base>`.
    pub fn msd(base: u64) -> Self {
        Self {
            msd: true,
            base: base.to_string(),
        }
    }

    /// The number system `lsd_<base>`.
    pub fn lsd(base: u64) -> Self {
        Self {
            msd: false,
            base: base.to_string(),
        }
    }

    /// Returns true if the most significant digit is read first.
    pub fn is_msd(&self) -> bool {
        self.msd
    }

    /// Returns the integer base, if the base of this system is an integer greater than one.
    pub fn base(&self) -> Option<u64> {
        self.base.parse().ok().filter(|&b| b > 1)
    }

    /// Returns the same numeration read in the other direction, so `msd_2` becomes `lsd_2`.
    pub fn reversed(&self) -> Self {
        Self {
            msd: !self.msd,
            base: self.base.clone(),
        }
    }

    /// Returns the name of the number system, e.g. `msd_2`.
    pub fn name(&self) -> String {
        format!("{}_{}", if self.msd { "msd" } else { "lsd" }, self.base)
    }

    /// The digits that a coordinate of this number system uses by default: `{0, ..., k-1}` for
    /// an integer base `k` and `{0, 1}` otherwise.
    pub fn default_alphabet(&self) -> Alphabet {
        Alphabet::range(self.base().unwrap_or(2))
    }
}

impl Display for NumberSystem {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

/// The input coordinates of an automaton. For each coordinate we store an [`Alphabet`] and,
/// for arithmetic coordinates, a [`NumberSystem`].
///
/// This type also implements the mixed-radix codec which maps an input tuple to a single
/// integer (the encoded symbol) and back. If the alphabets are `[A_0, ..., A_{n-1}]`, then the
/// tuple `(x_0, ..., x_{n-1})` is encoded as `sum_i w_i * index_of(x_i, A_i)` where the weights
/// are `w_0 = 1` and `w_{i+1} = w_i * |A_i|`. The weights are computed once on construction, so
/// they can never be out of date with respect to the alphabets.
#[derive(Clone, PartialEq, Eq, Hash, Debug)]
pub struct Coordinates {
    alphabets: Vec<Alphabet>,
    number_systems: Vec<Option<NumberSystem>>,
    weights: Vec<usize>,
    size: usize,
}

impl Default for Coordinates {
    fn default() -> Self {
        Self::empty()
    }
}

impl Coordinates {
    /// Creates coordinates from alphabets and number systems, which must be of equal length.
    /// Every arithmetic coordinate must have both 0 and 1 in its alphabet.
    pub fn new(alphabets: Vec<Alphabet>, number_systems: Vec<Option<NumberSystem>>) -> Result<Self> {
        if alphabets.len() != number_systems.len() {
            return Err(AutomatonError::ArityMismatch {
                expected: alphabets.len(),
                found: number_systems.len(),
            });
        }
        for (i, (alphabet, ns)) in alphabets.iter().zip(&number_systems).enumerate() {
            if ns.is_some() && (!alphabet.contains(0) || !alphabet.contains(1)) {
                return Err(AutomatonError::MissingZero(i));
            }
        }
        Ok(Self::assemble(alphabets, number_systems))
    }

    /// Computes the weights, the caller has to ensure that the parts are consistent.
    fn assemble(alphabets: Vec<Alphabet>, number_systems: Vec<Option<NumberSystem>>) -> Self {
        debug_assert_eq!(alphabets.len(), number_systems.len());
        let mut weights = Vec::with_capacity(alphabets.len());
        let mut size = 1usize;
        for alphabet in &alphabets {
            weights.push(size);
            size *= alphabet.size();
        }
        Self {
            alphabets,
            number_systems,
            weights,
            size,
        }
    }

    /// Creates coordinates which have no number systems attached.
    pub fn plain(alphabets: Vec<Alphabet>) -> Self {
        let n = alphabets.len();
        Self::assemble(alphabets, vec![None; n])
    }

    /// Creates `arity` arithmetic coordinates all using the given number system and its default alphabet.
    pub fn arithmetic(ns: &NumberSystem, arity: usize) -> Self {
        Self::assemble(
            vec![ns.default_alphabet(); arity],
            vec![Some(ns.clone()); arity],
        )
    }

    /// Coordinates of arity zero. The only tuple is the empty one, so the alphabet size is one.
    pub fn empty() -> Self {
        Self {
            alphabets: vec![],
            number_systems: vec![],
            weights: vec![],
            size: 1,
        }
    }

    /// Returns the number of coordinates.
    pub fn len(&self) -> usize {
        self.alphabets.len()
    }

    /// Returns true if there are no coordinates.
    pub fn is_empty(&self) -> bool {
        self.alphabets.is_empty()
    }

    /// The number of distinct input tuples, i.e. the product of all alphabet sizes.
    pub fn alphabet_size(&self) -> usize {
        self.size
    }

    /// The mixed-radix weights used for encoding.
    pub fn weights(&self) -> &[usize] {
        &self.weights
    }

    /// Returns the alphabet of coordinate `i`.
    pub fn alphabet(&self, i: usize) -> &Alphabet {
        &self.alphabets[i]
    }

    /// Returns all alphabets in order.
    pub fn alphabets(&self) -> &[Alphabet] {
        &self.alphabets
    }

    /// Returns the number system of coordinate `i`, if it is arithmetic.
    pub fn number_system(&self, i: usize) -> Option<&NumberSystem> {
        self.number_systems[i].as_ref()
    }

    /// Returns all number systems in order.
    pub fn number_systems(&self) -> &[Option<NumberSystem>] {
        &self.number_systems
    }

    /// Gives an iterator over all encoded symbols.
    pub fn symbols(&self) -> std::ops::Range<Symbol> {
        0..self.size
    }

    /// Encodes a tuple into a symbol.
    pub fn encode(&self, tuple: &[Value]) -> Result<Symbol> {
        if tuple.len() != self.len() {
            return Err(AutomatonError::ArityMismatch {
                expected: self.len(),
                found: tuple.len(),
            });
        }
        tuple
            .iter()
            .enumerate()
            .try_fold(0, |acc, (coordinate, &value)| {
                let index = self.alphabets[coordinate]
                    .index_of(value)
                    .ok_or(AutomatonError::InvalidSymbol { coordinate, value })?;
                Ok(acc + self.weights[coordinate] * index)
            })
    }

    /// Decodes a symbol into the corresponding tuple. The symbol must be smaller than
    /// [`Self::alphabet_size`].
    pub fn decode(&self, mut symbol: Symbol) -> Vec<Value> {
        debug_assert!(symbol < self.size, "symbol {symbol} out of range");
        self.alphabets
            .iter()
            .map(|alphabet| {
                let value = alphabet.0[symbol % alphabet.size()];
                symbol /= alphabet.size();
                value
            })
            .collect()
    }

    /// Takes a tuple where some positions may be wildcards (represented as `None`) and returns
    /// all tuples that are obtained by substituting every value of the respective alphabet
    /// for each wildcard.
    pub fn expand_wildcard(&self, tuple: &[Option<Value>]) -> Result<Vec<Vec<Value>>> {
        if tuple.len() != self.len() {
            return Err(AutomatonError::ArityMismatch {
                expected: self.len(),
                found: tuple.len(),
            });
        }
        if tuple.is_empty() {
            // the empty tuple is the one input of an automaton without coordinates
            return Ok(vec![vec![]]);
        }
        Ok(tuple
            .iter()
            .enumerate()
            .map(|(i, entry)| match entry {
                Some(value) => vec![*value],
                None => self.alphabets[i].0.clone(),
            })
            .multi_cartesian_product()
            .collect())
    }

    /// Returns the symbol that encodes the tuple consisting only of zeros, if every coordinate
    /// has 0 in its alphabet.
    pub fn zero_symbol(&self) -> Option<Symbol> {
        self.encode(&vec![0; self.len()]).ok()
    }

    /// Returns true if every coordinate is arithmetic.
    pub fn all_arithmetic(&self) -> bool {
        self.number_systems.iter().all(Option::is_some)
    }

    /// If every coordinate is arithmetic and all of them agree on the reading direction, returns
    /// whether they are msd. Otherwise returns `None`.
    pub fn uniform_direction(&self) -> Option<bool> {
        self.number_systems
            .iter()
            .map(|ns| ns.as_ref().map(NumberSystem::is_msd))
            .collect::<Option<Vec<_>>>()?
            .into_iter()
            .all_equal_value()
            .ok()
    }

    /// Returns the coordinates obtained by dropping those with the given indices.
    pub fn without(&self, indices: &[usize]) -> Self {
        let (alphabets, number_systems) = self
            .alphabets
            .iter()
            .zip(&self.number_systems)
            .enumerate()
            .filter(|(i, _)| !indices.contains(i))
            .map(|(_, (a, ns))| (a.clone(), ns.clone()))
            .unzip();
        Self::assemble(alphabets, number_systems)
    }

    /// Returns the coordinates where coordinate `i` is moved to position `permutation[i]`.
    pub fn permuted(&self, permutation: &[usize]) -> Self {
        let mut alphabets = self.alphabets.clone();
        let mut number_systems = self.number_systems.clone();
        for (i, &target) in permutation.iter().enumerate() {
            alphabets[target] = self.alphabets[i].clone();
            number_systems[target] = self.number_systems[i].clone();
        }
        Self::assemble(alphabets, number_systems)
    }

    /// Returns a copy in which the number system of coordinate `i` is replaced.
    pub fn with_number_system(&self, i: usize, ns: Option<NumberSystem>) -> Result<Self> {
        let mut number_systems = self.number_systems.clone();
        number_systems[i] = ns;
        Self::new(self.alphabets.clone(), number_systems)
    }

    /// Returns a copy in which every number system is read in the opposite direction.
    pub fn reversed_number_systems(&self) -> Self {
        Self {
            number_systems: self
                .number_systems
                .iter()
                .map(|ns| ns.as_ref().map(NumberSystem::reversed))
                .collect(),
            ..self.clone()
        }
    }
}

#[cfg(test)]
mod tests {
    use crate::prelude::*;

    fn mixed() -> Coordinates {
        Coordinates::plain(vec![
            Alphabet::new([0, 1]).unwrap(),
            Alphabet::new([-1, 2, 3]).unwrap(),
        ])
    }

    #[test_log::test]
    fn encoding_examples() {
        let coords = mixed();
        assert_eq!(coords.alphabet_size(), 6);
        assert_eq!(coords.weights(), &[1, 2]);
        assert_eq!(coords.encode(&[0, -1]).unwrap(), 0);
        assert_eq!(coords.encode(&[1, -1]).unwrap(), 1);
        assert_eq!(coords.encode(&[0, 2]).unwrap(), 2);
        assert_eq!(coords.encode(&[1, 3]).unwrap(), 5);
        assert_eq!(coords.decode(3), vec![1, 2]);
        assert_eq!(coords.decode(4), vec![0, 3]);
    }

    #[test_log::test]
    fn codec_round_trip() {
        let coords = Coordinates::plain(vec![
            Alphabet::new([-2, -1, -3]).unwrap(),
            Alphabet::new([0, 1]).unwrap(),
            Alphabet::new([-1, 0, 3]).unwrap(),
            Alphabet::new([7, 8]).unwrap(),
        ]);
        assert_eq!(coords.encode(&[-3, 1, -1, 7]).unwrap(), 5);
        for s in coords.symbols() {
            assert_eq!(coords.encode(&coords.decode(s)).unwrap(), s);
        }
        let tuples = coords.expand_wildcard(&[None; 4]).unwrap();
        assert_eq!(tuples.len(), coords.alphabet_size());
        for tuple in tuples {
            assert_eq!(coords.decode(coords.encode(&tuple).unwrap()), tuple);
        }
    }

    #[test_log::test]
    fn invalid_inputs() {
        let coords = mixed();
        assert!(matches!(
            coords.encode(&[0, 5]),
            Err(AutomatonError::InvalidSymbol {
                coordinate: 1,
                value: 5
            })
        ));
        assert!(matches!(
            coords.encode(&[0]),
            Err(AutomatonError::ArityMismatch {
                expected: 2,
                found: 1
            })
        ));
        assert!(matches!(
            Alphabet::new([1, 2, 1]),
            Err(AutomatonError::DuplicateSymbol(1))
        ));
        assert!(matches!(
            Coordinates::new(
                vec![Alphabet::new([1, 2]).unwrap()],
                vec![Some(NumberSystem::msd(2))]
            ),
            Err(AutomatonError::MissingZero(0))
        ));
    }

    #[test_log::test]
    fn wildcards() {
        let coords = Coordinates::plain(vec![
            Alphabet::new([1, 2]).unwrap(),
            Alphabet::new([0, -1]).unwrap(),
            Alphabet::new([3, 4, 5]).unwrap(),
        ]);
        let expanded = coords.expand_wildcard(&[Some(1), None, Some(4)]).unwrap();
        assert_eq!(expanded, vec![vec![1, 0, 4], vec![1, -1, 4]]);
        let all = coords.expand_wildcard(&[None, None, None]).unwrap();
        assert_eq!(all.len(), coords.alphabet_size());
        assert_eq!(
            Coordinates::empty().expand_wildcard(&[]).unwrap(),
            vec![Vec::<Value>::new()]
        );
    }

    #[test_log::test]
    fn number_systems() {
        let ns = NumberSystem::new("lsd_4");
        assert!(!ns.is_msd());
        assert_eq!(ns.base(), Some(4));
        assert_eq!(ns.reversed().name(), "msd_4");
        assert_eq!(NumberSystem::new("msd_fib").base(), None);
        assert_eq!(NumberSystem::new("msd_fib").default_alphabet().size(), 2);

        let coords = Coordinates::arithmetic(&NumberSystem::msd(3), 2);
        assert_eq!(coords.zero_symbol(), Some(0));
        assert_eq!(coords.uniform_direction(), Some(true));
        let mixed = coords
            .with_number_system(1, Some(NumberSystem::lsd(3)))
            .unwrap();
        assert_eq!(mixed.uniform_direction(), None);
    }
}
