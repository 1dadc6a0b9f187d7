//! The expression language used by shader packs to compute custom uniforms.
//!
//! Compilation runs in three stages:
//! [tokens] splits the text, [grammar] builds an untyped [ExprNode] tree using an [OperatorTable],
//! and [resolve] types the tree against a [FunctionRegistry] and the uniforms available at evaluation.
//! The result is a [CompiledExpression], which owns its call-site function instances and its return slot.

use std::rc::Rc;

use crate::functions::{
    FunctionContext, FunctionRegistry, FunctionReturn, Type, TypedFunction, UniformValueProvider, Value,
};

pub mod error;
pub mod grammar;
pub mod resolve;
pub mod syntax;
pub mod tokens;

pub use error::ExpressionError;
pub use syntax::{Associativity, ExprNode, OperatorTable};

/// A node of a resolved expression tree
#[derive(Debug)]
pub enum Expression {
    Constant(Value),
    /// A uniform, read through [FunctionContext::uniforms] on every evaluation
    Variable { name: String, ty: Type },
    Call {
        function: Rc<dyn TypedFunction>,
        args: Vec<Expression>,
    },
}

impl Expression {
    /// Static type of the value this expression produces
    pub fn ty(&self) -> Type {
        match self {
            Expression::Constant(v) => v.ty(),
            Expression::Variable { ty, .. } => *ty,
            Expression::Call { function, .. } => function.signature().return_type,
        }
    }

    /// Evaluate into `out`. Only the field of `out` matching [Expression::ty] is meaningful afterwards.
    pub fn evaluate_to(&self, context: &FunctionContext, out: &mut FunctionReturn) {
        match self {
            Expression::Constant(v) => out.write(v),
            Expression::Variable { name, ty } => {
                // The provider may lose a uniform between compilation and evaluation
                if !context.uniforms.write_uniform(name, out) {
                    out.write(&Value::zero(*ty));
                }
            }
            Expression::Call { function, args } => function.evaluate(args, context, out),
        }
    }
}

/// A compiled expression, ready to be evaluated once per frame.
///
/// Holds per-call-site state (e.g. for `smooth`), so evaluating it more than once per frame changes its results.
#[derive(Debug)]
pub struct CompiledExpression {
    root: Expression,
    ty: Type,
    slot: FunctionReturn,
}

impl CompiledExpression {
    pub fn new(root: Expression) -> Self {
        Self {
            ty: root.ty(),
            root,
            slot: FunctionReturn::new(),
        }
    }

    pub fn ty(&self) -> Type {
        self.ty
    }

    pub fn evaluate(&mut self, context: &FunctionContext) -> Value {
        self.root.evaluate_to(context, &mut self.slot);
        self.slot.read(self.ty)
    }

    /// Convert the result to `ty`, if it already has that type or an implicit cast exists
    pub fn coerce(self, ty: Type, registry: &FunctionRegistry) -> Result<Self, Self> {
        if self.ty == ty {
            return Ok(self);
        }
        match registry.implicit_cast(self.ty, ty) {
            Some(function) => Ok(Self::new(Expression::Call {
                function,
                args: vec![self.root],
            })),
            None => Err(self),
        }
    }
}

/// Compile expression text.
///
/// Every variable must either be a constant of `registry` or be known to `uniforms`.
pub fn compile(
    text: &str,
    table: &OperatorTable,
    registry: &FunctionRegistry,
    uniforms: &dyn UniformValueProvider,
) -> Result<CompiledExpression, ExpressionError> {
    let node = grammar::parse(text, table)?;
    let root = resolve::Resolver::new(registry, uniforms).resolve(&node)?;
    Ok(CompiledExpression::new(root))
}
