//! Operations that take whole automata and produce new ones. Most of them are implemented as
//! methods on [`Automaton`](crate::Automaton) and are spread over the submodules by topic.

/// The cross product of two automata and the [`Operator`](product::Operator) that decides the
/// outputs of product states.
pub mod product;

/// Boolean connectives, comparisons and arithmetic on outputs.
pub mod boolean;

/// Splitting automata with output by value and putting them back together.
pub mod combine;

/// Existential quantification and the normalization of zero padding.
pub mod quantify;

/// Reversal of automata with and without output.
pub mod reverse;

/// Changing the base of a number system.
pub mod convert;

/// Replacing coordinates by coordinates in a related number system with negative base.
pub mod split;
