//! Pure scalar functions, and the adapters that turn them into [TypedFunction]s.
//!
//! A [PureFunction] only ever sees primitive values, which is what allows [Vectorized] to lift it to vectors:
//! the vector arguments are evaluated once and the scalar function is applied to each component.

use std::rc::Rc;

use arrayvec::ArrayVec;

use crate::expr::Expression;

use super::{
    types::{ScalarType, Signature, Type},
    value::{FunctionReturn, Primitive},
    FunctionContext, TypedFunction,
};

/// Maximum number of parameters a pure function may take
pub const MAX_PURE_PARAMETERS: usize = 4;

pub trait PureFunction: std::fmt::Debug {
    fn parameters(&self) -> &[ScalarType];
    fn return_type(&self) -> ScalarType;
    /// Apply the function. `args` always matches [PureFunction::parameters].
    fn apply(&self, args: &[Primitive]) -> Primitive;
}

/// Rust scalar types that map onto a [ScalarType]
pub trait ScalarValue: Copy + std::fmt::Debug + 'static {
    const TYPE: ScalarType;
    fn from_primitive(p: Primitive) -> Self;
    fn into_primitive(self) -> Primitive;
}
impl ScalarValue for f32 {
    const TYPE: ScalarType = ScalarType::Float;
    fn from_primitive(p: Primitive) -> Self {
        match p {
            Primitive::Float(x) => x,
            Primitive::Int(i) => i as f32,
            Primitive::Bool(b) => b as i32 as f32,
        }
    }
    fn into_primitive(self) -> Primitive {
        Primitive::Float(self)
    }
}
impl ScalarValue for i32 {
    const TYPE: ScalarType = ScalarType::Int;
    fn from_primitive(p: Primitive) -> Self {
        match p {
            Primitive::Int(i) => i,
            Primitive::Float(x) => x as i32,
            Primitive::Bool(b) => b as i32,
        }
    }
    fn into_primitive(self) -> Primitive {
        Primitive::Int(self)
    }
}
impl ScalarValue for bool {
    const TYPE: ScalarType = ScalarType::Bool;
    fn from_primitive(p: Primitive) -> Self {
        match p {
            Primitive::Bool(b) => b,
            Primitive::Int(i) => i != 0,
            Primitive::Float(x) => x != 0.0,
        }
    }
    fn into_primitive(self) -> Primitive {
        Primitive::Bool(self)
    }
}

#[derive(Debug)]
pub struct Fn1<A: ScalarValue, R: ScalarValue> {
    f: fn(A) -> R,
    params: [ScalarType; 1],
}
impl<A: ScalarValue, R: ScalarValue> Fn1<A, R> {
    pub fn new(f: fn(A) -> R) -> Rc<dyn PureFunction> {
        Rc::new(Self { f, params: [A::TYPE] })
    }
}
impl<A: ScalarValue, R: ScalarValue> PureFunction for Fn1<A, R> {
    fn parameters(&self) -> &[ScalarType] {
        &self.params
    }
    fn return_type(&self) -> ScalarType {
        R::TYPE
    }
    fn apply(&self, args: &[Primitive]) -> Primitive {
        (self.f)(A::from_primitive(args[0])).into_primitive()
    }
}

#[derive(Debug)]
pub struct Fn2<A: ScalarValue, B: ScalarValue, R: ScalarValue> {
    f: fn(A, B) -> R,
    params: [ScalarType; 2],
}
impl<A: ScalarValue, B: ScalarValue, R: ScalarValue> Fn2<A, B, R> {
    pub fn new(f: fn(A, B) -> R) -> Rc<dyn PureFunction> {
        Rc::new(Self { f, params: [A::TYPE, B::TYPE] })
    }
}
impl<A: ScalarValue, B: ScalarValue, R: ScalarValue> PureFunction for Fn2<A, B, R> {
    fn parameters(&self) -> &[ScalarType] {
        &self.params
    }
    fn return_type(&self) -> ScalarType {
        R::TYPE
    }
    fn apply(&self, args: &[Primitive]) -> Primitive {
        (self.f)(A::from_primitive(args[0]), B::from_primitive(args[1])).into_primitive()
    }
}

#[derive(Debug)]
pub struct Fn3<A: ScalarValue, B: ScalarValue, C: ScalarValue, R: ScalarValue> {
    f: fn(A, B, C) -> R,
    params: [ScalarType; 3],
}
impl<A: ScalarValue, B: ScalarValue, C: ScalarValue, R: ScalarValue> Fn3<A, B, C, R> {
    pub fn new(f: fn(A, B, C) -> R) -> Rc<dyn PureFunction> {
        Rc::new(Self { f, params: [A::TYPE, B::TYPE, C::TYPE] })
    }
}
impl<A: ScalarValue, B: ScalarValue, C: ScalarValue, R: ScalarValue> PureFunction for Fn3<A, B, C, R> {
    fn parameters(&self) -> &[ScalarType] {
        &self.params
    }
    fn return_type(&self) -> ScalarType {
        R::TYPE
    }
    fn apply(&self, args: &[Primitive]) -> Primitive {
        (self.f)(
            A::from_primitive(args[0]),
            B::from_primitive(args[1]),
            C::from_primitive(args[2]),
        )
        .into_primitive()
    }
}

/// A pure function called with scalar arguments
#[derive(Debug)]
pub struct Scalar {
    inner: Rc<dyn PureFunction>,
    signature: Signature,
}
impl Scalar {
    pub fn new(inner: Rc<dyn PureFunction>) -> Self {
        let signature = Signature::new(
            inner.parameters().iter().map(|t| Type::Scalar(*t)).collect(),
            Type::Scalar(inner.return_type()),
        );
        Self { inner, signature }
    }
}
impl TypedFunction for Scalar {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        let mut values = ArrayVec::<Primitive, MAX_PURE_PARAMETERS>::new();
        for (arg, ty) in args.iter().zip(self.inner.parameters()) {
            arg.evaluate_to(context, out);
            values.push(out.read_primitive(*ty));
        }
        out.write_primitive(self.inner.apply(&values));
    }
}

/// A pure function applied component-wise over vectors of one width.
///
/// Each parameter is either a vector of the scalar parameter's type, or a scalar broadcast to every component.
/// Functions returning `bool` reduce to a single `bool`, which is true iff every component's result is true.
#[derive(Debug)]
pub struct Vectorized {
    inner: Rc<dyn PureFunction>,
    width: u8,
    vector_params: ArrayVec<bool, MAX_PURE_PARAMETERS>,
    signature: Signature,
}
impl Vectorized {
    /// Lift every parameter to a vector of `width`
    pub fn new(inner: Rc<dyn PureFunction>, width: u8) -> Self {
        let all_vectors = inner.parameters().iter().map(|_| true).collect();
        Self::with_broadcast(inner, width, all_vectors)
    }

    /// Lift the parameters marked `true` to vectors of `width`, and broadcast the others
    pub fn with_broadcast(inner: Rc<dyn PureFunction>, width: u8, vector_params: ArrayVec<bool, MAX_PURE_PARAMETERS>) -> Self {
        let parameters = inner
            .parameters()
            .iter()
            .zip(vector_params.iter())
            .map(|(t, is_vector)| if *is_vector { Type::Vector(*t, width) } else { Type::Scalar(*t) })
            .collect();
        let return_type = match inner.return_type() {
            ScalarType::Bool => Type::BOOL,
            other => Type::Vector(other, width),
        };
        Self {
            inner,
            width,
            vector_params,
            signature: Signature::new(parameters, return_type),
        }
    }
}
impl TypedFunction for Vectorized {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        let width = self.width as usize;
        let mut columns = ArrayVec::<ArrayVec<Primitive, 4>, MAX_PURE_PARAMETERS>::new();
        for ((arg, ty), is_vector) in args.iter().zip(self.inner.parameters()).zip(self.vector_params.iter()) {
            arg.evaluate_to(context, out);
            let column = if *is_vector {
                (0..width).map(|c| out.vector_component(*ty, c)).collect()
            } else {
                let p = out.read_primitive(*ty);
                (0..width).map(|_| p).collect()
            };
            columns.push(column);
        }

        let component = |c: usize| -> Primitive {
            let args: ArrayVec<Primitive, MAX_PURE_PARAMETERS> = columns.iter().map(|col| col[c]).collect();
            self.inner.apply(&args)
        };

        match self.inner.return_type() {
            ScalarType::Bool => {
                out.boolean_return = (0..width).all(|c| component(c) == Primitive::Bool(true));
            }
            ty => {
                let results: ArrayVec<Primitive, 4> = (0..width).map(component).collect();
                out.write_vector(ty, &results);
            }
        }
    }
}
