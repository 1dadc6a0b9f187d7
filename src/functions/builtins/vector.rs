use std::rc::Rc;

use arrayvec::ArrayVec;
use num_traits::FromPrimitive;

use crate::{
    expr::{syntax::Component, Expression},
    functions::{
        value::FloatVector, FunctionContext, FunctionRegistry, FunctionReturn, Matrix, Primitive, ScalarType,
        Signature, Type, TypedFunction, Value,
    },
};

/// `vecN(x, y, ...)` and `ivecN(x, y, ...)`
#[derive(Debug)]
struct Construct {
    signature: Signature,
    element: ScalarType,
}
impl TypedFunction for Construct {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        let mut components = ArrayVec::<Primitive, 4>::new();
        for arg in args {
            arg.evaluate_to(context, out);
            components.push(out.read_primitive(self.element));
        }
        out.write_vector(self.element, &components);
    }
}

/// A single component of a vector, the target of `.x`-style member access
#[derive(Debug)]
struct Access {
    signature: Signature,
    component: Component,
    element: ScalarType,
}
impl TypedFunction for Access {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        args[0].evaluate_to(context, out);
        let value = out.vector_component(self.element, self.component as usize);
        out.write_primitive(value);
    }
}

/// A function over whole values, for operations that don't work component-wise
#[derive(Debug)]
struct Native {
    signature: Signature,
    apply: fn(&[Value]) -> Value,
}
impl Native {
    fn new(parameters: Vec<Type>, return_type: Type, apply: fn(&[Value]) -> Value) -> Rc<Self> {
        Rc::new(Self {
            signature: Signature::new(parameters, return_type),
            apply,
        })
    }
}
impl TypedFunction for Native {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        let mut values = ArrayVec::<Value, 4>::new();
        for (arg, ty) in args.iter().zip(self.signature.parameters.iter()) {
            arg.evaluate_to(context, out);
            values.push(out.read(*ty));
        }
        out.write(&(self.apply)(&values));
    }
}

fn floats(value: &Value) -> &[f32] {
    match value {
        Value::FloatVector(v) => v.as_slice(),
        _ => &[],
    }
}
fn matrix(value: &Value) -> Matrix {
    match value {
        Value::Matrix(m) => *m,
        _ => Matrix::identity(4),
    }
}

fn dot_product(a: &[f32], b: &[f32]) -> f32 {
    a.iter().zip(b).map(|(x, y)| x * y).sum()
}

fn length(args: &[Value]) -> Value {
    let v = floats(&args[0]);
    Value::Float(dot_product(v, v).sqrt())
}
fn distance(args: &[Value]) -> Value {
    let d: FloatVector = floats(&args[0]).iter().zip(floats(&args[1])).map(|(a, b)| a - b).collect();
    Value::Float(dot_product(&d, &d).sqrt())
}
fn dot(args: &[Value]) -> Value {
    Value::Float(dot_product(floats(&args[0]), floats(&args[1])))
}
fn normalize(args: &[Value]) -> Value {
    let v = floats(&args[0]);
    let len = dot_product(v, v).sqrt();
    if len == 0.0 {
        return args[0].clone();
    }
    Value::FloatVector(v.iter().map(|x| x / len).collect())
}
fn cross(args: &[Value]) -> Value {
    match (floats(&args[0]), floats(&args[1])) {
        ([ax, ay, az], [bx, by, bz]) => Value::vec3(ay * bz - az * by, az * bx - ax * bz, ax * by - ay * bx),
        _ => Value::vec3(0.0, 0.0, 0.0),
    }
}
fn matrix_product(args: &[Value]) -> Value {
    let (a, b) = (matrix(&args[0]), matrix(&args[1]));
    let n = a.size as usize;
    let mut columns = [[0.0; 4]; 4];
    for (c, column) in columns.iter_mut().enumerate().take(n) {
        for (r, cell) in column.iter_mut().enumerate().take(n) {
            *cell = (0..n).map(|k| a.columns[k][r] * b.columns[c][k]).sum();
        }
    }
    Value::Matrix(Matrix { size: a.size, columns })
}
fn matrix_vector_product(args: &[Value]) -> Value {
    let (m, v) = (matrix(&args[0]), floats(&args[1]));
    let n = m.size as usize;
    Value::FloatVector(
        (0..n)
            .map(|r| (0..n).map(|k| m.columns[k][r] * v.get(k).copied().unwrap_or(0.0)).sum())
            .collect(),
    )
}

pub fn register(registry: &mut FunctionRegistry) {
    for width in 2..=4u8 {
        for (name, element) in [("vec", ScalarType::Float), ("ivec", ScalarType::Int)] {
            let ty = Type::Vector(element, width);
            registry.add(
                &format!("{}{}", name, width),
                Rc::new(Construct {
                    signature: Signature::new(vec![Type::Scalar(element); width as usize], ty),
                    element,
                }),
            );
        }
    }

    for idx in 0..4u8 {
        let Some(component) = Component::from_u8(idx) else { continue };
        let name = component.function_name();
        for element in [ScalarType::Float, ScalarType::Int, ScalarType::Bool] {
            for width in (idx + 1).max(2)..=4 {
                registry.add(
                    &name,
                    Rc::new(Access {
                        signature: Signature::new(vec![Type::Vector(element, width)], Type::Scalar(element)),
                        component,
                        element,
                    }),
                );
            }
        }
    }

    for width in 2..=4 {
        let v = Type::vec(width);
        registry.add("length", Native::new(vec![v], Type::FLOAT, length));
        registry.add("distance", Native::new(vec![v, v], Type::FLOAT, distance));
        registry.add("dot", Native::new(vec![v, v], Type::FLOAT, dot));
        registry.add("normalize", Native::new(vec![v], v, normalize));

        let m = Type::mat(width);
        registry.add("multiply", Native::new(vec![m, m], m, matrix_product));
        registry.add("multiply", Native::new(vec![m, v], v, matrix_vector_product));
    }
    registry.add("cross", Native::new(vec![Type::vec(3), Type::vec(3)], Type::vec(3), cross));
}
