//! Lazy tokenizer for expression text.

use nom::{
    branch::alt,
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit0, digit1, multispace0, one_of},
    combinator::{opt, recognize},
    sequence::{pair, preceded, tuple},
};

use crate::transform::grammar::is_identifier_char;

use super::{
    error::{ExpressionError, NomGrammarResult},
    syntax::OperatorTable,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenKind {
    Identifier,
    Number,
    Operator,
    OpenParen,
    CloseParen,
    Comma,
    /// `.name`, where `text` holds `name`
    Member,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Token<'a> {
    pub kind: TokenKind,
    pub text: &'a str,
    /// Character offset into the source
    pub position: usize,
}

fn identifier(data: &str) -> NomGrammarResult<&str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_identifier_char),
    ))(data)
}

/// `1`, `1.`, `1.5`, `.5`, each with an optional exponent
fn number(data: &str) -> NomGrammarResult<&str> {
    recognize(pair(
        alt((
            recognize(pair(digit1, opt(pair(char('.'), digit0)))),
            recognize(pair(char('.'), digit1)),
        )),
        opt(tuple((one_of("eE"), opt(one_of("+-")), digit1))),
    ))(data)
}

fn member(data: &str) -> NomGrammarResult<&str> {
    preceded(char('.'), identifier)(data)
}

fn punctuation(data: &str) -> NomGrammarResult<(TokenKind, &str)> {
    let (rest, c) = alt((tag("("), tag(")"), tag(",")))(data)?;
    let kind = match c {
        "(" => TokenKind::OpenParen,
        ")" => TokenKind::CloseParen,
        _ => TokenKind::Comma,
    };
    Ok((rest, (kind, c)))
}

/// Iterator over the tokens of an expression.
///
/// Yields at most one error, after which it is exhausted.
pub struct Tokenizer<'a, 't> {
    source: &'a str,
    rest: &'a str,
    table: &'t OperatorTable,
}

impl<'a, 't> Tokenizer<'a, 't> {
    pub fn new(source: &'a str, table: &'t OperatorTable) -> Self {
        Self {
            source,
            rest: source,
            table,
        }
    }

    /// Character offset of the unconsumed input
    pub fn offset(&self) -> usize {
        self.source[..self.source.len() - self.rest.len()].chars().count()
    }

    fn operator(&self, data: &'a str) -> Option<(&'a str, &'a str)> {
        self.table
            .symbols()
            .find(|symbol| data.starts_with(symbol))
            .map(|symbol| (&data[symbol.len()..], &data[..symbol.len()]))
    }

    fn lex(&self, data: &'a str) -> Option<(&'a str, TokenKind, &'a str)> {
        if let Ok((rest, text)) = number(data) {
            return Some((rest, TokenKind::Number, text));
        }
        if let Ok((rest, text)) = identifier(data) {
            let kind = if self.table.binary(text).is_some() || self.table.unary(text).is_some() {
                TokenKind::Operator
            } else {
                TokenKind::Identifier
            };
            return Some((rest, kind, text));
        }
        if let Ok((rest, text)) = member(data) {
            return Some((rest, TokenKind::Member, text));
        }
        if let Ok((rest, (kind, text))) = punctuation(data) {
            return Some((rest, kind, text));
        }
        self.operator(data).map(|(rest, text)| (rest, TokenKind::Operator, text))
    }
}

impl<'a, 't> Iterator for Tokenizer<'a, 't> {
    type Item = Result<Token<'a>, ExpressionError>;

    fn next(&mut self) -> Option<Self::Item> {
        let skipped: NomGrammarResult<&str> = multispace0(self.rest);
        if let Ok((rest, _)) = skipped {
            self.rest = rest;
        }
        let first = self.rest.chars().next()?;
        let position = self.offset();

        match self.lex(self.rest) {
            Some((rest, kind, text)) => {
                self.rest = rest;
                Some(Ok(Token { kind, text, position }))
            }
            None => {
                self.rest = "";
                Some(Err(ExpressionError::UnexpectedCharacter { ch: first, position }))
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn kinds(source: &str) -> Vec<(TokenKind, &str)> {
        Tokenizer::new(source, OperatorTable::default_table())
            .map(|t| t.map(|t| (t.kind, t.text)))
            .collect::<Result<_, _>>()
            .unwrap()
    }

    #[test]
    fn numbers() {
        assert_eq!(
            kinds("1 1.5 .5 2e3 3.e-1"),
            vec![
                (TokenKind::Number, "1"),
                (TokenKind::Number, "1.5"),
                (TokenKind::Number, ".5"),
                (TokenKind::Number, "2e3"),
                (TokenKind::Number, "3.e-1"),
            ]
        );
    }

    #[test]
    fn longest_operator_wins() {
        assert_eq!(
            kinds("a<=b<c"),
            vec![
                (TokenKind::Identifier, "a"),
                (TokenKind::Operator, "<="),
                (TokenKind::Identifier, "b"),
                (TokenKind::Operator, "<"),
                (TokenKind::Identifier, "c"),
            ]
        );
    }

    #[test]
    fn members_and_calls() {
        assert_eq!(
            kinds("f(v).x, 1"),
            vec![
                (TokenKind::Identifier, "f"),
                (TokenKind::OpenParen, "("),
                (TokenKind::Identifier, "v"),
                (TokenKind::CloseParen, ")"),
                (TokenKind::Member, "x"),
                (TokenKind::Comma, ","),
                (TokenKind::Number, "1"),
            ]
        );
    }

    #[test]
    fn unexpected_character() {
        let tokens: Vec<_> = Tokenizer::new("a + $b", OperatorTable::default_table()).collect();
        assert_eq!(tokens.len(), 3);
        assert_eq!(
            tokens[2],
            Err(ExpressionError::UnexpectedCharacter { ch: '$', position: 4 })
        );
    }

    #[test]
    fn word_operators() {
        let mut table = OperatorTable::new();
        table.add_binary("mod", "fmod", 5, crate::expr::syntax::Associativity::Left);
        let tokens = Tokenizer::new("model mod 3", &table)
            .map(|t| t.map(|t| (t.kind, t.text)))
            .collect::<Result<Vec<_>, _>>()
            .unwrap();
        assert_eq!(
            tokens,
            vec![
                (TokenKind::Identifier, "model"),
                (TokenKind::Operator, "mod"),
                (TokenKind::Number, "3"),
            ]
        );
    }
}
