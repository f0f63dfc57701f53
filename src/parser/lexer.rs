use std::fmt::{Display, Formatter};

use nom::branch::alt;
use nom::bytes::complete::tag;
use nom::character::complete::{alpha1, alphanumeric1, char, multispace0};
use nom::combinator::{map, recognize, value};
use nom::multi::many0_count;
use nom::sequence::pair;
use nom::IResult;

use super::errors::ParseError;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Token {
    Ident(String),
    True,
    False,
    Not,
    And,
    Or,
    Implies,
    Until,
    Eventually,
    Always,
    Next,
    LParen,
    RParen,
}

impl Display for Token {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        let text = match self {
            Token::Ident(name) => name.as_str(),
            Token::True => "true",
            Token::False => "false",
            Token::Not => "not",
            Token::And => "and",
            Token::Or => "or",
            Token::Implies => "=>",
            Token::Until => "U",
            Token::Eventually => "F",
            Token::Always => "G",
            Token::Next => "X",
            Token::LParen => "(",
            Token::RParen => ")",
        };

        write!(f, "{}", text)
    }
}

/// A token together with the byte offset it starts at.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Spanned {
    pub token: Token,
    pub position: usize,
}

/// A letter followed by letters, digits or underscores.
pub(super) fn word<'i, E>(input: &'i str) -> IResult<&'i str, &'i str, E>
where
    E: nom::error::ParseError<&'i str>,
{
    let mut parser = recognize(pair(alpha1, many0_count(alt((alphanumeric1, tag("_"))))));
    parser(input)
}

pub(super) fn keyword_or_ident(word: &str) -> Token {
    match word {
        "true" => Token::True,
        "false" => Token::False,
        "not" => Token::Not,
        "and" => Token::And,
        "or" => Token::Or,
        "U" => Token::Until,
        "F" => Token::Eventually,
        "G" => Token::Always,
        "X" => Token::Next,
        name => Token::Ident(name.to_string()),
    }
}

fn symbol(input: &str) -> IResult<&str, Token> {
    let mut parser = alt((
        value(Token::Implies, tag("=>")),
        value(Token::LParen, char('(')),
        value(Token::RParen, char(')')),
    ));

    parser(input)
}

pub(super) fn token(input: &str) -> IResult<&str, Token> {
    let mut parser = alt((map(word, keyword_or_ident), symbol));
    parser(input)
}

pub(super) fn skip_whitespace(input: &str) -> &str {
    match multispace0::<&str, nom::error::Error<&str>>(input) {
        Ok((rest, _)) => rest,
        Err(_) => input,
    }
}

/// Split formula text into tokens.
///
/// Identifiers start with a letter and continue with letters, digits or underscores. The words
/// `U`, `F`, `G`, `X`, `and`, `or`, `not`, `true` and `false` are reserved.
pub fn tokenize(input: &str) -> Result<Vec<Spanned>, ParseError> {
    let mut tokens = Vec::new();
    let mut rest = skip_whitespace(input);

    while !rest.is_empty() {
        let position = input.len() - rest.len();

        match token(rest) {
            Ok((next, token)) => {
                tokens.push(Spanned { token, position });
                rest = skip_whitespace(next);
            }
            Err(_) => {
                let symbol = rest.chars().next().unwrap_or_default();
                return Err(ParseError::UnrecognizedSymbol { position, symbol });
            }
        }
    }

    Ok(tokens)
}

#[cfg(test)]
mod tests {
    use std::error::Error;

    use super::{tokenize, Token};
    use crate::parser::ParseError;

    fn tokens(input: &str) -> Result<Vec<Token>, ParseError> {
        tokenize(input).map(|spanned| spanned.into_iter().map(|s| s.token).collect())
    }

    #[test]
    fn keywords_and_identifiers() -> Result<(), Box<dyn Error>> {
        let actual = tokens("G(in_lane => F reached_goal2) and not X Fx")?;
        let expected = vec![
            Token::Always,
            Token::LParen,
            Token::Ident("in_lane".to_string()),
            Token::Implies,
            Token::Eventually,
            Token::Ident("reached_goal2".to_string()),
            Token::RParen,
            Token::And,
            Token::Not,
            Token::Next,
            Token::Ident("Fx".to_string()),
        ];

        assert_eq!(actual, expected);
        Ok(())
    }

    #[test]
    fn positions() -> Result<(), Box<dyn Error>> {
        let spanned = tokenize("  a U\n b")?;
        let positions = spanned.iter().map(|s| s.position).collect::<Vec<_>>();

        assert_eq!(positions, vec![2, 4, 7]);
        Ok(())
    }

    #[test]
    fn unrecognized_symbols() {
        assert_eq!(
            tokenize("a & b"),
            Err(ParseError::UnrecognizedSymbol { position: 2, symbol: '&' })
        );
        assert_eq!(
            tokenize("a = b"),
            Err(ParseError::UnrecognizedSymbol { position: 2, symbol: '=' })
        );
        assert_eq!(tokenize("_a"), Err(ParseError::UnrecognizedSymbol { position: 0, symbol: '_' }));
    }

    #[test]
    fn empty_input() -> Result<(), Box<dyn Error>> {
        assert!(tokens("   ")?.is_empty());
        Ok(())
    }
}
