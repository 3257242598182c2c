//! Library implementing the automaton engine behind a decision procedure for first-order
//! predicates over automatic sequences.
//!
//! Sets and relations over tuples of integers are represented as finite automata whose inputs are
//! tuples, one value per *coordinate*. Each coordinate has its own finite [`Alphabet`] and optionally
//! a [`NumberSystem`] (something like `msd_2` or `lsd_fib`) which marks the coordinate as arithmetic.
//! Internally every tuple is stored as a single integer, the *encoded symbol*, which is computed by the
//! mixed-radix codec implemented in [`Coordinates`].
//!
//! The central type is [`Automaton`], an immutable value: every operation such as [`Automaton::and`],
//! [`Automaton::quantify`], [`Automaton::reverse`] or [`Automaton::convert`] consumes references to its
//! operands and produces a completely new automaton. Beneath these operations sit the algorithmic
//! building blocks
//! - the subset construction in [`determinization`],
//! - Valmari's partition refinement based minimization in [`minimization`],
//! - the generic cross product in [`operations::product`], parametrized by an [`Operator`].
//!
//! Automata can carry arbitrary integer outputs on their states, in which case they are deterministic
//! finite automata with output (DFAO). For plain automata an output of `0` means rejecting and any other
//! value means accepting.
#![deny(missing_docs)]
#![deny(rustdoc::broken_intra_doc_links)]

/// The prelude is supposed to make using this package easier. Including everything, i.e.
/// `use autoseq::prelude::*;` should be enough to use the package.
pub mod prelude {
    pub use super::{
        alphabet::{Alphabet, Coordinates, NumberSystem},
        automaton::Automaton,
        error::{AutomatonError, Result},
        math,
        operations::{
            product::Operator,
            split::{BaseChange, SplitInput},
        },
        Map, Output, Set, StateIndex, Symbol, Value,
    };
    #[cfg(feature = "random")]
    pub use super::random;
}

/// Contains the error type that is shared by all operations of this crate.
pub mod error;
pub use error::{AutomatonError, Result};

/// This module contains some definitions of mathematical objects and integer helpers which are
/// used throughout the crate and do not really fit to the top level.
pub mod math;

/// Module that contains definitions for dealing with alphabets, number systems and the encoding
/// of input tuples into symbols.
pub mod alphabet;
pub use alphabet::{Alphabet, Coordinates, NumberSystem};

/// Defines the [`Automaton`] type together with its construction, canonical form, the textual
/// format and some elementary queries.
pub mod automaton;
pub use automaton::Automaton;

/// Implements the subset construction which turns a non-deterministic transition relation into
/// a deterministic transition table.
pub mod determinization;

/// Contains the implementation of Valmari's minimization algorithm.
pub mod minimization;

pub mod operations;
pub use operations::product::Operator;

pub mod regex;

/// Graphviz representation of automata.
pub mod dot;

/// Implements the generation of random automata.
#[cfg(feature = "random")]
pub mod random;

/// Index of a state in an automaton.
pub type StateIndex = usize;
/// An encoded symbol, i.e. a full input tuple encoded into a single integer.
pub type Symbol = usize;
/// The value of a single coordinate of an input tuple.
pub type Value = i64;
/// The output of a state. For automata without output, `0` means rejecting.
pub type Output = i64;

/// Type alias for sets, we use this to hide which type of `HashSet` we are actually using.
pub type Set<S> = fxhash::FxHashSet<S>;
/// Type alias for maps, we use this to hide which type of `HashMap` we are actually using.
pub type Map<K, V> = fxhash::FxHashMap<K, V>;
