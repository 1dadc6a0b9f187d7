//! The untyped expression tree, and the operator table that drives parsing.

use std::{
    collections::HashMap,
    fmt::{Display, Formatter},
};

use lazy_static::lazy_static;

use crate::functions::Value;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Associativity {
    Left,
    Right,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BinaryOperator {
    /// Name of the function the operator calls
    pub function: String,
    /// Higher binds tighter
    pub precedence: u8,
    pub associativity: Associativity,
}

/// Maps operator symbols onto the functions they call
#[derive(Debug, Clone, Default)]
pub struct OperatorTable {
    binary: HashMap<String, BinaryOperator>,
    unary: HashMap<String, String>,
    /// Every symbol, longest first
    symbols: Vec<String>,
}

lazy_static! {
    static ref DEFAULT_OPERATORS: OperatorTable = OperatorTable::standard();
}

impl OperatorTable {
    pub fn new() -> Self {
        Self::default()
    }

    /// The shared default table:
    /// `||` < `&&` < `==` `!=` < `<` `<=` `>` `>=` < `+` `-` < `*` `/` `%`, with prefix `-` and `!`
    pub fn default_table() -> &'static OperatorTable {
        &DEFAULT_OPERATORS
    }

    fn standard() -> Self {
        let mut table = Self::new();
        let binary: [(&str, &str, u8); 13] = [
            ("||", "or", 0),
            ("&&", "and", 1),
            ("==", "equals", 2),
            ("!=", "notEquals", 2),
            ("<", "lessThan", 3),
            ("<=", "lessThanOrEquals", 3),
            (">", "moreThan", 3),
            (">=", "moreThanOrEquals", 3),
            ("+", "add", 4),
            ("-", "subtract", 4),
            ("*", "multiply", 5),
            ("/", "divide", 5),
            ("%", "remainder", 5),
        ];
        for (symbol, function, precedence) in binary {
            table.add_binary(symbol, function, precedence, Associativity::Left);
        }
        table.add_unary("-", "negate");
        table.add_unary("!", "not");
        table
    }

    pub fn add_binary(&mut self, symbol: &str, function: &str, precedence: u8, associativity: Associativity) {
        self.binary.insert(
            symbol.to_owned(),
            BinaryOperator {
                function: function.to_owned(),
                precedence,
                associativity,
            },
        );
        self.add_symbol(symbol);
    }

    pub fn add_unary(&mut self, symbol: &str, function: &str) {
        self.unary.insert(symbol.to_owned(), function.to_owned());
        self.add_symbol(symbol);
    }

    pub fn binary(&self, symbol: &str) -> Option<&BinaryOperator> {
        self.binary.get(symbol)
    }

    pub fn unary(&self, symbol: &str) -> Option<&str> {
        self.unary.get(symbol).map(String::as_str)
    }

    /// All operator symbols, longest first, so the first prefix match is the longest one
    pub fn symbols(&self) -> impl Iterator<Item = &str> {
        self.symbols.iter().map(String::as_str)
    }

    fn add_symbol(&mut self, symbol: &str) {
        if !self.symbols.iter().any(|s| s == symbol) {
            self.symbols.push(symbol.to_owned());
            self.symbols.sort_by(|a, b| b.len().cmp(&a.len()));
        }
    }
}

/// A single vector component, selected with `.x`/`.r`/`.s` style member access
#[derive(Debug, Clone, Copy, PartialEq, Eq, FromPrimitive)]
pub enum Component {
    X = 0,
    Y = 1,
    Z = 2,
    W = 3,
}
impl Component {
    pub fn from_accessor(accessor: &str) -> Option<Self> {
        let c = match accessor {
            "x" | "r" | "s" => Component::X,
            "y" | "g" | "t" => Component::Y,
            "z" | "b" | "p" => Component::Z,
            "w" | "a" | "q" => Component::W,
            _ => return None,
        };
        Some(c)
    }

    /// Name of the function member access calls
    pub fn function_name(self) -> String {
        format!("<access${}>", self as u8)
    }
}

/// An untyped expression tree. `position` is the character offset of the node's first token
#[derive(Debug, Clone, PartialEq)]
pub enum ExprNode {
    Literal {
        value: Value,
        position: usize,
    },
    Variable {
        name: String,
        position: usize,
    },
    Unary {
        function: String,
        operand: Box<ExprNode>,
        position: usize,
    },
    Binary {
        function: String,
        lhs: Box<ExprNode>,
        rhs: Box<ExprNode>,
        position: usize,
    },
    Call {
        name: String,
        args: Vec<ExprNode>,
        position: usize,
    },
}

impl ExprNode {
    pub fn position(&self) -> usize {
        match self {
            ExprNode::Literal { position, .. }
            | ExprNode::Variable { position, .. }
            | ExprNode::Unary { position, .. }
            | ExprNode::Binary { position, .. }
            | ExprNode::Call { position, .. } => *position,
        }
    }
}

/// Renders every operator as the call it stands for, e.g. `1 + 2 * x` as `add(1, multiply(2, x))`
impl Display for ExprNode {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        match self {
            ExprNode::Literal { value, .. } => write!(f, "{}", value),
            ExprNode::Variable { name, .. } => write!(f, "{}", name),
            ExprNode::Unary { function, operand, .. } => write!(f, "{}({})", function, operand),
            ExprNode::Binary { function, lhs, rhs, .. } => write!(f, "{}({}, {})", function, lhs, rhs),
            ExprNode::Call { name, args, .. } => {
                write!(f, "{}(", name)?;
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    write!(f, "{}", arg)?;
                }
                write!(f, ")")
            }
        }
    }
}
