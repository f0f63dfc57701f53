use thiserror::Error;

/// Error produced while turning formula text into a [`crate::Formula`].
///
/// Positions are byte offsets into the original formula text.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    #[error("Unrecognized symbol '{symbol}' at position {position}")]
    UnrecognizedSymbol { position: usize, symbol: char },

    #[error("Unexpected \"{found}\" at position {position}, expected {expected}")]
    UnexpectedToken {
        position: usize,
        found: String,
        expected: &'static str,
    },

    #[error("Unexpected end of formula, expected {expected}")]
    UnexpectedEnd { expected: &'static str },

    #[error("Unknown proposition \"{name}\" at position {position}")]
    UnknownProposition { position: usize, name: String },

    #[error("Could not parse remaining input starting with \"{found}\" at position {position}")]
    TrailingInput { position: usize, found: String },

    #[error("Formula nests deeper than {limit} levels at position {position}")]
    NestingTooDeep { position: usize, limit: usize },
}
