use std::fmt::{Display, Formatter};

use crate::bits::Bits;
use crate::parser::Alphabet;

/// Abstract syntax of a linear temporal logic formula over indexed propositions.
///
/// Conjunctions and disjunctions are n-ary so that [`Formula::simplify`] can flatten nested
/// operators and keep operands in a canonical order. Variants are declared in the order used to
/// sort those operands.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum Formula {
    False,
    True,
    Atom(usize),
    Not(Box<Formula>),
    And(Vec<Formula>),
    Or(Vec<Formula>),
    Implies(Box<(Formula, Formula)>),
    Next(Box<Formula>),
    Eventually(Box<Formula>),
    Always(Box<Formula>),
    Until(Box<(Formula, Formula)>),
}

impl Formula {
    pub fn atom(index: usize) -> Self {
        Self::Atom(index)
    }

    #[allow(clippy::should_implement_trait)]
    pub fn not(subformula: Self) -> Self {
        Self::Not(Box::new(subformula))
    }

    pub fn and(left: Self, right: Self) -> Self {
        Self::And(vec![left, right])
    }

    pub fn or(left: Self, right: Self) -> Self {
        Self::Or(vec![left, right])
    }

    pub fn implies(antecedent: Self, consequent: Self) -> Self {
        Self::Implies(Box::new((antecedent, consequent)))
    }

    pub fn next(subformula: Self) -> Self {
        Self::Next(Box::new(subformula))
    }

    pub fn eventually(subformula: Self) -> Self {
        Self::Eventually(Box::new(subformula))
    }

    pub fn always(subformula: Self) -> Self {
        Self::Always(Box::new(subformula))
    }

    pub fn until(left: Self, right: Self) -> Self {
        Self::Until(Box::new((left, right)))
    }

    /// True if any temporal operator appears anywhere in the formula.
    pub fn is_temporal(&self) -> bool {
        match self {
            Self::False | Self::True | Self::Atom(_) => false,
            Self::Not(inner) => inner.is_temporal(),
            Self::And(operands) | Self::Or(operands) => operands.iter().any(Formula::is_temporal),
            Self::Implies(operands) => operands.0.is_temporal() || operands.1.is_temporal(),
            Self::Next(_) | Self::Eventually(_) | Self::Always(_) | Self::Until(_) => true,
        }
    }

    /// Largest proposition index referenced by the formula.
    pub fn max_atom(&self) -> Option<usize> {
        match self {
            Self::False | Self::True => None,
            Self::Atom(index) => Some(*index),
            Self::Not(inner) | Self::Next(inner) | Self::Eventually(inner) | Self::Always(inner) => inner.max_atom(),
            Self::And(operands) | Self::Or(operands) => operands.iter().filter_map(Formula::max_atom).max(),
            Self::Implies(operands) | Self::Until(operands) => operands.0.max_atom().max(operands.1.max_atom()),
        }
    }

    /// Evaluate a formula without temporal operators against a single observation.
    ///
    /// Returns `None` if the formula contains a temporal operator.
    pub fn evaluate(&self, bits: Bits) -> Option<bool> {
        match self {
            Self::False => Some(false),
            Self::True => Some(true),
            Self::Atom(index) => Some(bits.get(*index)),
            Self::Not(inner) => inner.evaluate(bits).map(|value| !value),
            Self::And(operands) => operands.iter().try_fold(true, |acc, f| f.evaluate(bits).map(|v| acc && v)),
            Self::Or(operands) => operands.iter().try_fold(false, |acc, f| f.evaluate(bits).map(|v| acc || v)),
            Self::Implies(operands) => {
                let antecedent = operands.0.evaluate(bits)?;
                let consequent = operands.1.evaluate(bits)?;

                Some(!antecedent || consequent)
            }
            Self::Next(_) | Self::Eventually(_) | Self::Always(_) | Self::Until(_) => None,
        }
    }

    /// Consume one observation and return the obligation that remains for the rest of the trace.
    ///
    /// The result is simplified, so an obligation that has been discharged or violated collapses to
    /// [`Formula::True`] or [`Formula::False`].
    pub fn progress(&self, bits: Bits) -> Self {
        let progressed = match self {
            Self::False => Self::False,
            Self::True => Self::True,
            Self::Atom(index) => {
                if bits.get(*index) {
                    Self::True
                } else {
                    Self::False
                }
            }
            Self::Not(inner) => Self::not(inner.progress(bits)),
            Self::And(operands) => Self::And(operands.iter().map(|f| f.progress(bits)).collect()),
            Self::Or(operands) => Self::Or(operands.iter().map(|f| f.progress(bits)).collect()),
            Self::Implies(operands) => Self::implies(operands.0.progress(bits), operands.1.progress(bits)),
            Self::Next(inner) => (**inner).clone(),
            Self::Eventually(inner) => Self::or(inner.progress(bits), self.clone()),
            Self::Always(inner) => Self::and(inner.progress(bits), self.clone()),
            Self::Until(operands) => Self::or(
                operands.1.progress(bits),
                Self::and(operands.0.progress(bits), self.clone()),
            ),
        };

        progressed.simplify()
    }

    /// Rewrite the formula into an equivalent, smaller one.
    ///
    /// Nested conjunctions and disjunctions are flattened, constants are folded, operands are
    /// sorted and de-duplicated, and complementary literals are detected. Temporal operators with a
    /// constant argument are folded as well. Negation is pushed through `X`, `F` and `G`, and
    /// `true U φ` is rewritten to `F φ`, so equivalent obligations share one shape.
    pub fn simplify(self) -> Self {
        match self {
            Self::False | Self::True | Self::Atom(_) => self,
            Self::Not(inner) => match inner.simplify() {
                Self::True => Self::False,
                Self::False => Self::True,
                Self::Not(inner) => *inner,
                Self::Next(inner) => Self::next(Self::not(*inner)).simplify(),
                Self::Eventually(inner) => Self::always(Self::not(*inner)).simplify(),
                Self::Always(inner) => Self::eventually(Self::not(*inner)).simplify(),
                other => Self::not(other),
            },
            Self::And(operands) => simplify_junction(operands, Junction::And),
            Self::Or(operands) => simplify_junction(operands, Junction::Or),
            Self::Implies(operands) => {
                let (antecedent, consequent) = *operands;

                match (antecedent.simplify(), consequent.simplify()) {
                    (Self::False, _) | (_, Self::True) => Self::True,
                    (Self::True, consequent) => consequent,
                    (antecedent, Self::False) => Self::not(antecedent).simplify(),
                    (antecedent, consequent) if antecedent == consequent => Self::True,
                    (antecedent, consequent) => Self::implies(antecedent, consequent),
                }
            }
            Self::Next(inner) => match inner.simplify() {
                constant @ (Self::True | Self::False) => constant,
                other => Self::next(other),
            },
            Self::Eventually(inner) => match inner.simplify() {
                constant @ (Self::True | Self::False) => constant,
                other => Self::eventually(other),
            },
            Self::Always(inner) => match inner.simplify() {
                constant @ (Self::True | Self::False) => constant,
                other => Self::always(other),
            },
            Self::Until(operands) => {
                let (left, right) = *operands;

                match (left.simplify(), right.simplify()) {
                    (_, Self::True) => Self::True,
                    (_, Self::False) => Self::False,
                    (Self::False, right) => right,
                    (Self::True, right) => Self::eventually(right),
                    (left, right) if left == right => left,
                    (left, right) => Self::until(left, right),
                }
            }
        }
    }

    /// Render the formula using proposition names from `alphabet`.
    pub fn display<'a>(&'a self, alphabet: &'a Alphabet) -> Named<'a> {
        Named {
            formula: self,
            alphabet: Some(alphabet),
        }
    }
}

#[derive(Clone, Copy, PartialEq, Eq)]
enum Junction {
    And,
    Or,
}

impl Junction {
    /// The constant that absorbs every other operand.
    fn absorbing(self) -> Formula {
        match self {
            Junction::And => Formula::False,
            Junction::Or => Formula::True,
        }
    }

    fn identity(self) -> Formula {
        match self {
            Junction::And => Formula::True,
            Junction::Or => Formula::False,
        }
    }

    fn build(self, operands: Vec<Formula>) -> Formula {
        match self {
            Junction::And => Formula::And(operands),
            Junction::Or => Formula::Or(operands),
        }
    }

    fn flatten(self, formula: Formula, into: &mut Vec<Formula>) {
        match (self, formula) {
            (Junction::And, Formula::And(operands)) | (Junction::Or, Formula::Or(operands)) => into.extend(operands),
            (_, other) => into.push(other),
        }
    }
}

fn simplify_junction(operands: Vec<Formula>, junction: Junction) -> Formula {
    let absorbing = junction.absorbing();
    let identity = junction.identity();
    let mut flattened = Vec::with_capacity(operands.len());

    for operand in operands {
        junction.flatten(operand.simplify(), &mut flattened);
    }

    if flattened.contains(&absorbing) {
        return absorbing;
    }

    flattened.retain(|operand| operand != &identity);
    flattened.sort();
    flattened.dedup();

    let complementary = flattened.iter().any(|operand| match operand {
        Formula::Not(inner) => flattened.binary_search(inner).is_ok(),
        _ => false,
    });

    if complementary {
        return absorbing;
    }

    match flattened.len() {
        0 => identity,
        1 => flattened.remove(0),
        _ => junction.build(flattened),
    }
}

/// Display adapter returned by [`Formula::display`].
pub struct Named<'a> {
    formula: &'a Formula,
    alphabet: Option<&'a Alphabet>,
}

impl<'a> Named<'a> {
    fn child(&self, formula: &'a Formula) -> Self {
        Self {
            formula,
            alphabet: self.alphabet,
        }
    }

    fn write_junction(&self, f: &mut Formatter<'_>, operands: &'a [Formula], operator: &str) -> std::fmt::Result {
        write!(f, "(")?;

        for (index, operand) in operands.iter().enumerate() {
            if index > 0 {
                write!(f, " {} ", operator)?;
            }

            write!(f, "{}", self.child(operand))?;
        }

        write!(f, ")")
    }
}

impl<'a> Display for Named<'a> {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self.formula {
            Formula::False => write!(f, "false"),
            Formula::True => write!(f, "true"),
            Formula::Atom(index) => match self.alphabet.and_then(|alphabet| alphabet.name(*index)) {
                Some(name) => write!(f, "{}", name),
                None => write!(f, "p{}", index),
            },
            Formula::Not(inner) => write!(f, "not {}", self.child(inner)),
            Formula::And(operands) => self.write_junction(f, operands, "and"),
            Formula::Or(operands) => self.write_junction(f, operands, "or"),
            Formula::Implies(operands) => {
                write!(f, "({} => {})", self.child(&operands.0), self.child(&operands.1))
            }
            Formula::Next(inner) => write!(f, "X {}", self.child(inner)),
            Formula::Eventually(inner) => write!(f, "F {}", self.child(inner)),
            Formula::Always(inner) => write!(f, "G {}", self.child(inner)),
            Formula::Until(operands) => write!(f, "({} U {})", self.child(&operands.0), self.child(&operands.1)),
        }
    }
}

impl Display for Formula {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let named = Named {
            formula: self,
            alphabet: None,
        };

        Display::fmt(&named, f)
    }
}
