//! Type resolution: turns an untyped [ExprNode] tree into an evaluable [Expression] tree.

use tracing::trace;

use crate::functions::{FunctionRegistry, Type, UniformValueProvider};

use super::{error::ExpressionError, syntax::ExprNode, Expression};

pub struct Resolver<'r> {
    registry: &'r FunctionRegistry,
    uniforms: &'r dyn UniformValueProvider,
}

impl<'r> Resolver<'r> {
    pub fn new(registry: &'r FunctionRegistry, uniforms: &'r dyn UniformValueProvider) -> Self {
        Self { registry, uniforms }
    }

    pub fn resolve(&self, node: &ExprNode) -> Result<Expression, ExpressionError> {
        match node {
            ExprNode::Literal { value, .. } => Ok(Expression::Constant(value.clone())),
            ExprNode::Variable { name, position } => {
                if let Some(value) = self.registry.constant(name) {
                    return Ok(Expression::Constant(value.clone()));
                }
                match self.uniforms.uniform_type(name) {
                    Some(ty) => Ok(Expression::Variable { name: name.clone(), ty }),
                    None => Err(ExpressionError::UnknownVariable {
                        name: name.clone(),
                        position: *position,
                    }),
                }
            }
            ExprNode::Unary {
                function,
                operand,
                position,
            } => self.call(function, [operand.as_ref()], *position),
            ExprNode::Binary {
                function,
                lhs,
                rhs,
                position,
            } => self.call(function, [lhs.as_ref(), rhs.as_ref()], *position),
            ExprNode::Call { name, args, position } => self.call(name, args, *position),
        }
    }

    fn call<'n>(
        &self,
        name: &str,
        args: impl IntoIterator<Item = &'n ExprNode>,
        position: usize,
    ) -> Result<Expression, ExpressionError> {
        let args = args
            .into_iter()
            .map(|arg| self.resolve(arg))
            .collect::<Result<Vec<_>, _>>()?;
        let arg_types: Vec<Type> = args.iter().map(Expression::ty).collect();

        let resolution = self
            .registry
            .find_overload(name, &arg_types)
            .ok_or_else(|| ExpressionError::NoMatchingOverload {
                name: name.to_owned(),
                arg_types: arg_types.clone(),
                position,
            })?;
        trace!(function = name, signature = %resolution.overload.signature(), "resolved call");

        let args = args
            .into_iter()
            .zip(resolution.casts)
            .map(|(arg, cast)| match cast {
                Some(function) => Expression::Call {
                    function,
                    args: vec![arg],
                },
                None => arg,
            })
            .collect();
        Ok(Expression::Call {
            function: resolution.overload.instantiate(),
            args,
        })
    }
}
