use std::rc::Rc;

use crate::{
    expr::Expression,
    functions::{
        pure::Fn3, FunctionContext, FunctionRegistry, FunctionReturn, Signature, Type, TypedFunction,
    },
};

/// Most conditions accepted by a single `if`
const MAX_IF_CONDITIONS: usize = 5;

/// `if(c1, a, c2, b, ..., otherwise)`.
///
/// Only the selected branch is evaluated.
#[derive(Debug)]
struct If {
    signature: Signature,
}
impl If {
    fn new(ty: Type, conditions: usize) -> Self {
        let mut parameters = Vec::with_capacity(conditions * 2 + 1);
        for _ in 0..conditions {
            parameters.push(Type::BOOL);
            parameters.push(ty);
        }
        parameters.push(ty);
        Self {
            signature: Signature::new(parameters, ty),
        }
    }
}
impl TypedFunction for If {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        for pair in args.chunks_exact(2) {
            pair[0].evaluate_to(context, out);
            if out.boolean_return {
                pair[1].evaluate_to(context, out);
                return;
            }
        }
        if let Some(otherwise) = args.last() {
            otherwise.evaluate_to(context, out);
        }
    }
}

/// `in(x, a, b, ...)`: true if `x` equals any of the following arguments
#[derive(Debug)]
struct In {
    signature: Signature,
}
impl TypedFunction for In {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        let ty = self.signature.parameters[0];
        let mut found = false;
        if let Some((first, candidates)) = args.split_first() {
            first.evaluate_to(context, out);
            let x = out.read(ty);
            for candidate in candidates {
                candidate.evaluate_to(context, out);
                if out.read(ty) == x {
                    found = true;
                    break;
                }
            }
        }
        out.boolean_return = found;
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    registry.add_scalar("between", Fn3::new(|x: i32, lo: i32, hi: i32| lo <= x && x <= hi));
    registry.add_scalar("between", Fn3::new(|x: f32, lo: f32, hi: f32| lo <= x && x <= hi));
    registry.add_scalar("equals", Fn3::new(|a: f32, b: f32, epsilon: f32| (a - b).abs() <= epsilon));

    for ty in [Type::INT, Type::FLOAT] {
        registry.add(
            "in",
            Rc::new(In {
                signature: Signature::variadic(vec![ty, ty], ty, Type::BOOL),
            }),
        );
    }

    for ty in Type::all() {
        for conditions in 1..=MAX_IF_CONDITIONS {
            registry.add("if", Rc::new(If::new(ty, conditions)));
        }
    }
}
