use nom::{
    error::{ErrorKind, ParseError},
    IResult,
};
use thiserror::Error;

use crate::functions::Type;

pub type NomGrammarResult<'a, T> = IResult<&'a str, T, GrammarError<&'a str>>;

/// Error type used inside the nom tokenizer. Never escapes the `expr` module.
#[derive(Debug, Error)]
pub enum GrammarError<I> {
    #[error("Internal Nom error: {1:?}")]
    Nom(I, ErrorKind),
}
impl<I> ParseError<I> for GrammarError<I> {
    fn from_error_kind(input: I, kind: ErrorKind) -> Self {
        GrammarError::Nom(input, kind)
    }

    fn append(_: I, _: ErrorKind, other: Self) -> Self {
        other
    }
}

fn type_list(types: &[Type]) -> String {
    types.iter().map(Type::to_string).collect::<Vec<_>>().join(", ")
}

/// Failure to compile an expression. Positions are character offsets into the expression text.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ExpressionError {
    #[error("unexpected character '{ch}' at {position}")]
    UnexpectedCharacter { ch: char, position: usize },
    #[error("malformed expression at {position} near '{token}': {reason}")]
    MalformedExpression {
        token: String,
        position: usize,
        reason: &'static str,
    },
    #[error("no overload of {name}({}) at {position}", type_list(.arg_types))]
    NoMatchingOverload {
        name: String,
        arg_types: Vec<Type>,
        position: usize,
    },
    #[error("unknown variable '{name}' at {position}")]
    UnknownVariable { name: String, position: usize },
}

impl ExpressionError {
    pub fn position(&self) -> usize {
        match self {
            ExpressionError::UnexpectedCharacter { position, .. }
            | ExpressionError::MalformedExpression { position, .. }
            | ExpressionError::NoMatchingOverload { position, .. }
            | ExpressionError::UnknownVariable { position, .. } => *position,
        }
    }
}
