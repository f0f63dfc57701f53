use thiserror::Error;

use crate::parser::ParseError;
use crate::Tick;

/// Error raised while evaluating a definition, proposition or reward rule.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum EvalError {
    #[error("Unknown name \"{0}\"")]
    UnknownName(String),

    #[error("Unknown object \"{0}\"")]
    UnknownObject(String),

    #[error("Object \"{object}\" has no attribute \"{attribute}\"")]
    UnknownAttribute { object: String, attribute: String },

    #[error("Expected \"{name}\" to be {expected}, found {found}")]
    TypeMismatch {
        name: String,
        expected: &'static str,
        found: &'static str,
    },

    #[error("Definitions are at tick {definitions} but propositions expected tick {propositions}")]
    OutOfSync { definitions: Tick, propositions: Tick },

    #[error("Rule \"{name}\" failed at tick {tick}: {source}")]
    Rule {
        name: String,
        tick: Tick,
        source: Box<EvalError>,
    },

    #[error("{0}")]
    Custom(String),
}

impl EvalError {
    pub fn custom(message: impl Into<String>) -> Self {
        Self::Custom(message.into())
    }
}

/// Error raised while building tables, checkers or episodes.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("Duplicate name \"{name}\" in {table}")]
    DuplicateName { table: &'static str, name: String },

    #[error("{count} propositions declared, but at most {capacity} are supported")]
    TooManyPropositions { count: usize, capacity: usize },

    #[error("Could not compile formula \"{formula}\": {source}")]
    Formula { formula: String, source: ParseError },

    #[error("Unknown property mode \"{0}\"")]
    UnknownMode(String),

    #[error("Initial evaluation failed: {0}")]
    Initial(#[source] EvalError),

    #[error("At most one ego agent is supported, found {0}")]
    MultipleEgos(usize),

    #[error("{count} agents declared, but at most {capacity} are supported")]
    TooManyAgents { count: usize, capacity: usize },
}

/// Error raised when a monitor is fed observations out of order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum MonitorError {
    #[error("Tick {tick} observed after tick {last}")]
    StaleTick { tick: Tick, last: Tick },
}

/// Umbrella error for operations that touch several layers at once.
#[derive(Debug, Error)]
pub enum Error {
    #[error(transparent)]
    Config(#[from] ConfigError),

    #[error(transparent)]
    Eval(#[from] EvalError),

    #[error(transparent)]
    Monitor(#[from] MonitorError),
}
