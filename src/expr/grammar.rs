//! Precedence-climbing parser over the token stream.

use crate::functions::Value;

use super::{
    error::ExpressionError,
    syntax::{Associativity, Component, ExprNode, OperatorTable},
    tokens::{Token, TokenKind, Tokenizer},
};

fn malformed(token: Option<Token>, end: usize, reason: &'static str) -> ExpressionError {
    match token {
        Some(token) => ExpressionError::MalformedExpression {
            token: token.text.to_owned(),
            position: token.position,
            reason,
        },
        None => ExpressionError::MalformedExpression {
            token: String::new(),
            position: end,
            reason,
        },
    }
}

/// Deepest nesting of parentheses, arguments, prefix operators and right-associative chains
pub const MAX_DEPTH: usize = 256;

struct Parser<'a, 't> {
    tokens: Tokenizer<'a, 't>,
    table: &'t OperatorTable,
    lookahead: Option<Token<'a>>,
    /// Character offset of the end of the source
    end: usize,
    depth: usize,
}

impl<'a, 't> Parser<'a, 't> {
    fn peek(&mut self) -> Result<Option<Token<'a>>, ExpressionError> {
        if self.lookahead.is_none() {
            self.lookahead = self.tokens.next().transpose()?;
        }
        Ok(self.lookahead)
    }

    fn next(&mut self) -> Result<Option<Token<'a>>, ExpressionError> {
        let token = self.peek()?;
        self.lookahead = None;
        Ok(token)
    }

    fn expect(&mut self, kind: TokenKind, reason: &'static str) -> Result<Token<'a>, ExpressionError> {
        match self.next()? {
            Some(token) if token.kind == kind => Ok(token),
            other => Err(malformed(other, self.end, reason)),
        }
    }

    /// Run `parse` one nesting level deeper
    fn nested<T>(
        &mut self,
        parse: impl FnOnce(&mut Self) -> Result<T, ExpressionError>,
    ) -> Result<T, ExpressionError> {
        if self.depth >= MAX_DEPTH {
            let token = self.peek()?;
            return Err(malformed(token, self.end, "expression nested too deeply"));
        }
        self.depth += 1;
        let result = parse(self);
        self.depth -= 1;
        result
    }

    /// Parse a run of binary operators binding at least as tightly as `min_precedence`
    fn expression(&mut self, min_precedence: u8) -> Result<ExprNode, ExpressionError> {
        self.nested(|parser| parser.binary_run(min_precedence))
    }

    fn binary_run(&mut self, min_precedence: u8) -> Result<ExprNode, ExpressionError> {
        let table = self.table;
        let mut lhs = self.unary()?;
        while let Some(token) = self.peek()? {
            if token.kind != TokenKind::Operator {
                break;
            }
            let op = match table.binary(token.text) {
                Some(op) if op.precedence >= min_precedence => op,
                _ => break,
            };
            self.next()?;
            let next_min = match op.associativity {
                Associativity::Left => op.precedence + 1,
                Associativity::Right => op.precedence,
            };
            let rhs = self.expression(next_min)?;
            lhs = ExprNode::Binary {
                function: op.function.clone(),
                position: lhs.position(),
                lhs: Box::new(lhs),
                rhs: Box::new(rhs),
            };
        }
        Ok(lhs)
    }

    fn unary(&mut self) -> Result<ExprNode, ExpressionError> {
        let table = self.table;
        if let Some(token) = self.peek()? {
            if token.kind == TokenKind::Operator {
                if let Some(function) = table.unary(token.text) {
                    self.next()?;
                    if function == "negate" {
                        if let Some(number) = self.peek()?.filter(|t| t.kind == TokenKind::Number) {
                            self.next()?;
                            return Ok(ExprNode::Literal {
                                value: parse_number(number, true)?,
                                position: token.position,
                            });
                        }
                    }
                    let operand = self.nested(Self::unary)?;
                    return Ok(ExprNode::Unary {
                        function: function.to_owned(),
                        operand: Box::new(operand),
                        position: token.position,
                    });
                }
            }
        }
        self.postfix()
    }

    /// A primary expression followed by any number of member accesses
    fn postfix(&mut self) -> Result<ExprNode, ExpressionError> {
        let mut node = self.primary()?;
        while let Some(token) = self.peek()? {
            if token.kind != TokenKind::Member {
                break;
            }
            self.next()?;
            let component = Component::from_accessor(token.text)
                .ok_or_else(|| malformed(Some(token), self.end, "only single-component member access is supported"))?;
            node = ExprNode::Call {
                name: component.function_name(),
                position: token.position,
                args: vec![node],
            };
        }
        Ok(node)
    }

    fn primary(&mut self) -> Result<ExprNode, ExpressionError> {
        let token = self.next()?;
        let Some(token) = token else {
            let reason = if self.end == 0 { "empty expression" } else { "unexpected end of expression" };
            return Err(malformed(None, self.end, reason));
        };
        match token.kind {
            TokenKind::Number => Ok(ExprNode::Literal {
                value: parse_number(token, false)?,
                position: token.position,
            }),
            TokenKind::Identifier => match self.peek()? {
                Some(open) if open.kind == TokenKind::OpenParen => {
                    self.next()?;
                    Ok(ExprNode::Call {
                        name: token.text.to_owned(),
                        args: self.arguments()?,
                        position: token.position,
                    })
                }
                _ => Ok(ExprNode::Variable {
                    name: token.text.to_owned(),
                    position: token.position,
                }),
            },
            TokenKind::OpenParen => {
                let inner = self.expression(0)?;
                self.expect(TokenKind::CloseParen, "unbalanced parentheses")?;
                Ok(inner)
            }
            _ => Err(malformed(Some(token), self.end, "expected a value")),
        }
    }

    /// Comma-separated arguments, after the opening parenthesis
    fn arguments(&mut self) -> Result<Vec<ExprNode>, ExpressionError> {
        let mut args = vec![];
        if let Some(token) = self.peek()? {
            if token.kind == TokenKind::CloseParen {
                self.next()?;
                return Ok(args);
            }
        }
        loop {
            args.push(self.expression(0)?);
            match self.next()? {
                Some(token) if token.kind == TokenKind::Comma => continue,
                Some(token) if token.kind == TokenKind::CloseParen => return Ok(args),
                other => return Err(malformed(other, self.end, "unbalanced parentheses")),
            }
        }
    }
}

/// Negative literals are folded here so that `-2147483648` fits an int
fn parse_number(token: Token, negative: bool) -> Result<Value, ExpressionError> {
    let is_float = token.text.contains(|c: char| matches!(c, '.' | 'e' | 'E'));
    let value = if is_float {
        token
            .text
            .parse::<f32>()
            .ok()
            .map(|f| Value::Float(if negative { -f } else { f }))
    } else {
        token
            .text
            .parse::<i64>()
            .ok()
            .map(|i| if negative { -i } else { i })
            .and_then(|i| i32::try_from(i).ok())
            .map(Value::Int)
    };
    value.ok_or_else(|| malformed(Some(token), 0, "number out of range"))
}

/// Parse expression text into an untyped tree
pub fn parse(source: &str, table: &OperatorTable) -> Result<ExprNode, ExpressionError> {
    let mut parser = Parser {
        tokens: Tokenizer::new(source, table),
        table,
        lookahead: None,
        end: source.chars().count(),
        depth: 0,
    };
    let node = parser.expression(0)?;
    match parser.next()? {
        None => Ok(node),
        Some(token) => Err(malformed(Some(token), parser.end, "unexpected trailing token")),
    }
}
