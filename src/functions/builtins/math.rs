use std::rc::Rc;

use arrayvec::ArrayVec;

use crate::{
    expr::Expression,
    functions::{
        pure::{Fn1, Fn2, Fn3, Vectorized},
        FunctionContext, FunctionRegistry, FunctionReturn, Primitive, ScalarType, Signature, Type, TypedFunction,
    },
};

fn float1(registry: &mut FunctionRegistry, name: &str, f: fn(f32) -> f32) {
    registry.add_pure(name, Fn1::new(f));
}

fn signum_f32(x: f32) -> f32 {
    if x > 0.0 {
        1.0
    } else if x < 0.0 {
        -1.0
    } else {
        x
    }
}

/// Modulo whose result takes the sign of the divisor
fn fmod_f32(a: f32, b: f32) -> f32 {
    ((a % b) + b) % b
}
fn fmod_i32(a: i32, b: i32) -> i32 {
    if b == 0 {
        0
    } else {
        a.wrapping_rem(b).wrapping_add(b).wrapping_rem(b)
    }
}

/// Left fold over any number of arguments of one type, applied per component
#[derive(Debug)]
struct Fold {
    signature: Signature,
    element: ScalarType,
    op: fn(Primitive, Primitive) -> Primitive,
}
impl Fold {
    fn new(ty: Type, op: fn(Primitive, Primitive) -> Primitive) -> Option<Self> {
        Some(Self {
            signature: Signature::variadic(vec![ty, ty], ty, ty),
            element: ty.scalar()?,
            op,
        })
    }
}
impl TypedFunction for Fold {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        let width = match self.signature.return_type {
            Type::Scalar(_) => None,
            ty => Some(ty.width() as usize),
        };
        let mut acc = ArrayVec::<Primitive, 4>::new();
        for (i, arg) in args.iter().enumerate() {
            arg.evaluate_to(context, out);
            let components: ArrayVec<Primitive, 4> = match width {
                None => [out.read_primitive(self.element)].into_iter().collect(),
                Some(w) => (0..w).map(|c| out.vector_component(self.element, c)).collect(),
            };
            if i == 0 {
                acc = components;
            } else {
                for (a, c) in acc.iter_mut().zip(components) {
                    *a = (self.op)(*a, c);
                }
            }
        }
        match width {
            None => out.write_primitive(acc[0]),
            Some(_) => out.write_vector(self.element, &acc),
        }
    }
}

fn min_primitive(a: Primitive, b: Primitive) -> Primitive {
    match (a, b) {
        (Primitive::Int(x), Primitive::Int(y)) => Primitive::Int(x.min(y)),
        (Primitive::Float(x), Primitive::Float(y)) => Primitive::Float(x.min(y)),
        _ => a,
    }
}
fn max_primitive(a: Primitive, b: Primitive) -> Primitive {
    match (a, b) {
        (Primitive::Int(x), Primitive::Int(y)) => Primitive::Int(x.max(y)),
        (Primitive::Float(x), Primitive::Float(y)) => Primitive::Float(x.max(y)),
        _ => a,
    }
}

/// A uniformly distributed float in [0, 1), different on every evaluation
#[derive(Debug)]
struct Random {
    signature: Signature,
}
impl TypedFunction for Random {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, _: &[Expression], _: &FunctionContext, out: &mut FunctionReturn) {
        out.float_return = rand::random::<f32>();
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    float1(registry, "sin", f32::sin);
    float1(registry, "cos", f32::cos);
    float1(registry, "tan", f32::tan);
    float1(registry, "asin", f32::asin);
    float1(registry, "acos", f32::acos);
    float1(registry, "atan", f32::atan);
    registry.add_pure("atan2", Fn2::new(|y: f32, x: f32| y.atan2(x)));
    float1(registry, "torad", f32::to_radians);
    float1(registry, "todeg", f32::to_degrees);

    registry.add_pure("abs", Fn1::new(|x: i32| x.wrapping_abs()));
    float1(registry, "abs", f32::abs);
    registry.add_pure("signum", Fn1::new(|x: i32| x.signum()));
    float1(registry, "signum", signum_f32);

    // Rounding keeps the argument's type
    for name in ["floor", "ceil", "round"] {
        registry.add_pure(name, Fn1::new(|x: i32| x));
    }
    float1(registry, "floor", f32::floor);
    float1(registry, "ceil", f32::ceil);
    float1(registry, "round", |x| (x + 0.5).floor());
    float1(registry, "frac", |x| x - x.floor());

    float1(registry, "exp", f32::exp);
    float1(registry, "exp2", f32::exp2);
    float1(registry, "log", f32::ln);
    float1(registry, "log2", f32::log2);
    float1(registry, "log10", f32::log10);
    registry.add_pure("pow", Fn2::new(f32::powf));
    float1(registry, "sqrt", f32::sqrt);

    registry.add_pure("fmod", Fn2::new(fmod_i32));
    registry.add_pure("fmod", Fn2::new(fmod_f32));

    // clamp(x, lo, hi) with hi < lo is unspecified
    let clamps = [
        Fn3::new(|x: i32, lo: i32, hi: i32| x.max(lo).min(hi)),
        Fn3::new(|x: f32, lo: f32, hi: f32| x.max(lo).min(hi)),
    ];
    for clamp in clamps {
        registry.add_pure("clamp", clamp.clone());
        for width in 2..=4 {
            let flags = [true, false, false].into_iter().collect();
            registry.add("clamp", Rc::new(Vectorized::with_broadcast(clamp.clone(), width, flags)));
        }
    }

    let mut fold_types = vec![Type::INT, Type::FLOAT];
    fold_types.extend((2..=4).map(Type::ivec));
    fold_types.extend((2..=4).map(Type::vec));
    for ty in fold_types {
        if let Some(min) = Fold::new(ty, min_primitive) {
            registry.add("min", Rc::new(min));
        }
        if let Some(max) = Fold::new(ty, max_primitive) {
            registry.add("max", Rc::new(max));
        }
    }

    registry.add(
        "random",
        Rc::new(Random {
            signature: Signature::new(vec![], Type::FLOAT),
        }),
    );
}
