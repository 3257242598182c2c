use thiserror::Error;

use crate::{StateIndex, Symbol, Value};

/// Abstracts the types of errors that can occur when constructing or combining automata.
///
/// All of these abort the operation in progress. Since every operation produces a new
/// automaton, the operands are never left in a partially modified state.
#[derive(Debug, Error)]
#[allow(missing_docs)]
pub enum AutomatonError {
    #[error("value {value} is not in the alphabet of coordinate {coordinate}")]
    InvalidSymbol { coordinate: usize, value: Value },
    #[error("encoded symbol {symbol} is not below the alphabet size {size}")]
    SymbolOutOfRange { symbol: Symbol, size: usize },
    #[error("expected a {expected}-tuple but got {found} values")]
    ArityMismatch { expected: usize, found: usize },
    #[error("state {0} is used but never declared")]
    UndeclaredState(StateIndex),
    #[error("coordinates sharing the label `{0}` have different alphabets")]
    IncompatibleAlphabet(String),
    #[error("division by zero")]
    DivisionByZero,
    #[error("cannot convert between number systems: {0}")]
    IncompatibleBases(String),
    #[error("operation requires every coordinate to be labeled")]
    NotLabeled,
    #[error("operation requires a deterministic automaton")]
    NotDeterministic,
    #[error("no coordinate is labeled `{0}`")]
    UnknownLabel(String),
    #[error("arithmetic coordinate {0} requires 0 and 1 in its alphabet")]
    MissingZero(usize),
    #[error("alphabet contains the value {0} more than once")]
    DuplicateSymbol(Value),
    #[error("alphabets must not be empty")]
    EmptyAlphabet,
    #[error("coordinate {0} has no number system")]
    MissingNumberSystem(usize),
    #[error("line {line}: {message}")]
    Parse { line: usize, message: String },
    #[error("malformed regular expression at position {position}: {message}")]
    Regex { position: usize, message: String },
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

/// Shorthand for results whose error type is [`AutomatonError`].
pub type Result<T> = std::result::Result<T, AutomatonError>;

impl AutomatonError {
    pub(crate) fn parse<S: Into<String>>(line: usize, message: S) -> Self {
        Self::Parse {
            line,
            message: message.into(),
        }
    }
}
