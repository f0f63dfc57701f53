use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{char, multispace0};
use nom::combinator::{cut, map, value, verify};
use nom::error::{ErrorKind, ParseError as NomParseError};
use nom::multi::many0;
use nom::sequence::{delimited, pair, preceded, terminated};
use nom::{Err, IResult, Parser};

use super::errors::ParseError;
use super::lexer::{self, Token};
use super::Alphabet;
use crate::formula::Formula;

const OPERAND: &str = "a proposition, a constant, a unary operator or '('";

/// Deepest nesting of parentheses and prefix operators a formula may use.
pub const MAX_DEPTH: usize = 64;

type Prefix = fn(Formula) -> Formula;

type Parsed<'i, O> = IResult<&'i str, O, Failure<'i>>;

/// Why a rule stopped, and the input left at that point.
#[derive(Debug, Clone, PartialEq, Eq)]
pub(super) enum Failure<'i> {
    Expected { rest: &'i str, expected: &'static str },
    Unknown { rest: &'i str, name: &'i str },
    TooDeep { rest: &'i str },
}

impl<'i> NomParseError<&'i str> for Failure<'i> {
    fn from_error_kind(rest: &'i str, _: ErrorKind) -> Self {
        Failure::Expected {
            rest,
            expected: OPERAND,
        }
    }

    fn append(_: &'i str, _: ErrorKind, other: Self) -> Self {
        other
    }
}

impl<'i> Failure<'i> {
    fn locate(self, input: &'i str) -> ParseError {
        match self {
            Failure::Expected { rest, expected } => unexpected(input, rest, expected),
            Failure::Unknown { rest, name } => ParseError::UnknownProposition {
                position: offset(input, rest),
                name: name.to_string(),
            },
            Failure::TooDeep { rest } => ParseError::NestingTooDeep {
                position: offset(input, lexer::skip_whitespace(rest)),
                limit: MAX_DEPTH,
            },
        }
    }
}

fn offset(input: &str, rest: &str) -> usize {
    input.len() - rest.len()
}

fn unrecognized(position: usize, rest: &str) -> ParseError {
    ParseError::UnrecognizedSymbol {
        position,
        symbol: rest.chars().next().unwrap_or_default(),
    }
}

fn unexpected(input: &str, rest: &str, expected: &'static str) -> ParseError {
    let rest = lexer::skip_whitespace(rest);
    let position = offset(input, rest);

    if rest.is_empty() {
        return ParseError::UnexpectedEnd { expected };
    }

    match lexer::token(rest) {
        Ok((_, token)) => ParseError::UnexpectedToken {
            position,
            found: token.to_string(),
            expected,
        },
        Err(_) => unrecognized(position, rest),
    }
}

fn trailing(input: &str, rest: &str) -> ParseError {
    let position = offset(input, rest);

    match lexer::token(rest) {
        Ok((_, token)) => ParseError::TrailingInput {
            position,
            found: token.to_string(),
        },
        Err(_) => unrecognized(position, rest),
    }
}

fn lexeme<'i, O, P>(parser: P) -> impl FnMut(&'i str) -> Parsed<'i, O>
where
    P: Parser<&'i str, O, Failure<'i>>,
{
    preceded(multispace0, parser)
}

/// Match `expected` as a whole word, so `F` does not match the start of `Fx`.
fn keyword<'i>(expected: &'static str) -> impl FnMut(&'i str) -> Parsed<'i, &'i str> {
    lexeme(verify(lexer::word, move |word: &str| word == expected))
}

/// Report a recoverable failure of `parser` as a missing `expected`.
fn expect<'i, O, P>(mut parser: P, expected: &'static str) -> impl FnMut(&'i str) -> Parsed<'i, O>
where
    P: Parser<&'i str, O, Failure<'i>>,
{
    move |input: &'i str| match parser.parse(input) {
        Err(Err::Error(_)) => Err(Err::Error(Failure::Expected { rest: input, expected })),
        other => other,
    }
}

fn junction(first: Formula, mut others: Vec<Formula>, build: fn(Vec<Formula>) -> Formula) -> Formula {
    if others.is_empty() {
        first
    } else {
        others.insert(0, first);
        build(others)
    }
}

fn fold_right(first: Formula, mut others: Vec<Formula>, build: fn(Formula, Formula) -> Formula) -> Formula {
    match others.pop() {
        Some(last) => {
            let tail = others.into_iter().rev().fold(last, |acc, operand| build(operand, acc));
            build(first, tail)
        }
        None => first,
    }
}

/// Formula grammar written as nom parsers over the formula text.
///
/// Binding strength from loosest to tightest: `=>` (right associative), `or`, `and`, `U` (right
/// associative), then the prefix operators `not`, `X`, `F` and `G`. Every parenthesis and prefix
/// operator adds a nesting level, up to [`MAX_DEPTH`].
pub(super) struct Grammar<'a> {
    alphabet: &'a Alphabet,
}

impl<'a> Grammar<'a> {
    pub(super) fn new(alphabet: &'a Alphabet) -> Self {
        Self { alphabet }
    }

    pub(super) fn parse<'i>(&self, input: &'i str) -> Result<Formula, ParseError> {
        let mut parser = terminated(move |rest: &'i str| self.implication(rest, 0), multispace0);

        match parser(input) {
            Ok((rest, formula)) if rest.is_empty() => Ok(formula),
            Ok((rest, _)) => Err(trailing(input, rest)),
            Err(Err::Error(failure) | Err::Failure(failure)) => Err(failure.locate(input)),
            Err(Err::Incomplete(_)) => Err(ParseError::UnexpectedEnd { expected: OPERAND }),
        }
    }

    fn implication<'i>(&self, input: &'i str, depth: usize) -> Parsed<'i, Formula> {
        let operand = move |rest: &'i str| self.disjunction(rest, depth);
        let mut parser = pair(operand, many0(preceded(lexeme(tag("=>")), cut(operand))));
        let (rest, (first, others)) = parser(input)?;

        Ok((rest, fold_right(first, others, Formula::implies)))
    }

    fn disjunction<'i>(&self, input: &'i str, depth: usize) -> Parsed<'i, Formula> {
        let operand = move |rest: &'i str| self.conjunction(rest, depth);
        let mut parser = pair(operand, many0(preceded(keyword("or"), cut(operand))));
        let (rest, (first, others)) = parser(input)?;

        Ok((rest, junction(first, others, Formula::Or)))
    }

    fn conjunction<'i>(&self, input: &'i str, depth: usize) -> Parsed<'i, Formula> {
        let operand = move |rest: &'i str| self.until(rest, depth);
        let mut parser = pair(operand, many0(preceded(keyword("and"), cut(operand))));
        let (rest, (first, others)) = parser(input)?;

        Ok((rest, junction(first, others, Formula::And)))
    }

    fn until<'i>(&self, input: &'i str, depth: usize) -> Parsed<'i, Formula> {
        let operand = move |rest: &'i str| self.unary(rest, depth);
        let mut parser = pair(operand, many0(preceded(keyword("U"), cut(operand))));
        let (rest, (first, others)) = parser(input)?;

        Ok((rest, fold_right(first, others, Formula::until)))
    }

    fn unary<'i>(&self, input: &'i str, depth: usize) -> Parsed<'i, Formula> {
        if depth > MAX_DEPTH {
            return Err(Err::Failure(Failure::TooDeep { rest: input }));
        }

        let operator = alt((
            value(Formula::not as Prefix, keyword("not")),
            value(Formula::next as Prefix, keyword("X")),
            value(Formula::eventually as Prefix, keyword("F")),
            value(Formula::always as Prefix, keyword("G")),
        ));
        let prefixed = map(
            pair(operator, cut(move |rest: &'i str| self.unary(rest, depth + 1))),
            |(operator, operand): (Prefix, Formula)| operator(operand),
        );
        let mut parser = alt((prefixed, move |rest: &'i str| self.primary(rest, depth)));

        parser(input)
    }

    fn primary<'i>(&self, input: &'i str, depth: usize) -> Parsed<'i, Formula> {
        let parenthesized = delimited(
            lexeme(char('(')),
            cut(move |rest: &'i str| self.implication(rest, depth + 1)),
            cut(expect(lexeme(char(')')), "')'")),
        );
        let mut parser = expect(alt((parenthesized, move |rest: &'i str| self.atom(rest))), OPERAND);

        parser(input)
    }

    fn atom<'i>(&self, input: &'i str) -> Parsed<'i, Formula> {
        let start = lexer::skip_whitespace(input);
        let parsed: Parsed<'i, &'i str> = lexer::word(start);
        let (rest, word) = parsed?;

        match lexer::keyword_or_ident(word) {
            Token::True => Ok((rest, Formula::True)),
            Token::False => Ok((rest, Formula::False)),
            Token::Ident(_) => match self.alphabet.index_of(word) {
                Some(index) => Ok((rest, Formula::atom(index))),
                None => Err(Err::Failure(Failure::Unknown { rest: start, name: word })),
            },
            _ => Err(Err::Error(Failure::Expected {
                rest: start,
                expected: OPERAND,
            })),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{Grammar, MAX_DEPTH};
    use crate::formula::Formula;
    use crate::parser::{Alphabet, ParseError};

    #[test]
    fn whitespace_is_optional_around_symbols() -> Result<(), Box<dyn Error>> {
        let alphabet = Alphabet::from_iter(["a", "b"]);
        let grammar = Grammar::new(&alphabet);

        let expected = Formula::implies(Formula::atom(0), Formula::next(Formula::atom(1)));
        assert_eq!(grammar.parse("(a)=>X(b)")?, expected);
        assert_eq!(grammar.parse("  a =>\tX b \n")?, expected);

        Ok(())
    }

    #[test]
    fn keywords_need_word_boundaries() -> Result<(), Box<dyn Error>> {
        let alphabet = Alphabet::from_iter(["Fa", "android", "a"]);
        let grammar = Grammar::new(&alphabet);

        assert_eq!(grammar.parse("Fa")?, Formula::atom(0));
        assert_eq!(grammar.parse("F a")?, Formula::eventually(Formula::atom(2)));
        assert_eq!(grammar.parse("android")?, Formula::atom(1));

        Ok(())
    }

    #[test]
    fn nesting_is_bounded() {
        let alphabet = Alphabet::from_iter(["a"]);
        let grammar = Grammar::new(&alphabet);

        let negations = format!("{}a", "not ".repeat(10_000));
        assert_eq!(
            grammar.parse(&negations),
            Err(ParseError::NestingTooDeep {
                position: 4 * (MAX_DEPTH + 1),
                limit: MAX_DEPTH
            })
        );

        let parentheses = format!("{}a{}", "(".repeat(10_000), ")".repeat(10_000));
        assert!(matches!(
            grammar.parse(&parentheses),
            Err(ParseError::NestingTooDeep { limit: MAX_DEPTH, .. })
        ));

        let shallow = format!("{}a{}", "(".repeat(MAX_DEPTH), ")".repeat(MAX_DEPTH));
        assert_eq!(grammar.parse(&shallow), Ok(Formula::atom(0)));
    }

    #[test]
    fn long_operator_chains_do_not_nest() {
        let alphabet = Alphabet::from_iter(["a"]);
        let grammar = Grammar::new(&alphabet);

        let chain = vec!["a"; 1_000].join(" U ");
        assert!(grammar.parse(&chain).is_ok());
    }
}
