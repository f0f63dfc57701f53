mod errors;
mod grammar;
mod lexer;

pub use errors::ParseError;
pub use grammar::MAX_DEPTH;
pub use lexer::{tokenize, Spanned, Token};

use crate::formula::Formula;

/// Ordered set of proposition names. The position of a name is the bit it occupies in an
/// observation.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Alphabet {
    names: Vec<String>,
}

impl Alphabet {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, name: impl Into<String>) -> usize {
        self.names.push(name.into());
        self.names.len() - 1
    }

    pub fn index_of(&self, name: &str) -> Option<usize> {
        self.names.iter().position(|candidate| candidate == name)
    }

    pub fn name(&self, index: usize) -> Option<&str> {
        self.names.get(index).map(String::as_str)
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }
}

impl<S> FromIterator<S> for Alphabet
where
    S: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = S>>(iter: I) -> Self {
        Self {
            names: iter.into_iter().map(Into::into).collect(),
        }
    }
}

/// Parse formula text over the propositions named in `alphabet`.
///
/// Formulas use the keywords `U`, `F`, `G`, `X`, `and`, `or`, `not`, `true`, `false`, the
/// implication arrow `=>` and parentheses. Parentheses and prefix operators may nest at most
/// [`MAX_DEPTH`] levels deep.
///
/// # Example
///
/// ```rust
/// use ltl_rewards::parser::{parse_formula, Alphabet};
/// use ltl_rewards::Formula;
///
/// let alphabet = Alphabet::from_iter(["a", "b"]);
/// let formula = parse_formula("a U not b", &alphabet).unwrap();
///
/// assert_eq!(formula, Formula::until(Formula::atom(0), Formula::not(Formula::atom(1))));
/// ```
pub fn parse_formula(input: &str, alphabet: &Alphabet) -> Result<Formula, ParseError> {
    grammar::Grammar::new(alphabet).parse(input)
}
