//! Functions backing the operators of the default operator table.

use crate::functions::{
    pure::{Fn1, Fn2},
    FunctionRegistry,
};

/// Register an arithmetic operator for ints and floats, including vector and broadcast forms
fn arithmetic(registry: &mut FunctionRegistry, name: &str, int: fn(i32, i32) -> i32, float: fn(f32, f32) -> f32) {
    for f in [Fn2::new(int), Fn2::new(float)] {
        registry.add_pure(name, f.clone());
        registry.add_broadcast(name, f);
    }
}

fn comparison(registry: &mut FunctionRegistry, name: &str, int: fn(i32, i32) -> bool, float: fn(f32, f32) -> bool) {
    registry.add_pure(name, Fn2::new(int));
    registry.add_pure(name, Fn2::new(float));
}

pub fn register(registry: &mut FunctionRegistry) {
    arithmetic(registry, "add", |a, b| a.wrapping_add(b), |a, b| a + b);
    arithmetic(registry, "subtract", |a, b| a.wrapping_sub(b), |a, b| a - b);
    arithmetic(registry, "multiply", |a, b| a.wrapping_mul(b), |a, b| a * b);
    // Integer division by zero yields 0
    arithmetic(
        registry,
        "divide",
        |a, b| if b == 0 { 0 } else { a.wrapping_div(b) },
        |a, b| a / b,
    );
    arithmetic(
        registry,
        "remainder",
        |a, b| if b == 0 { 0 } else { a.wrapping_rem(b) },
        |a, b| a % b,
    );

    registry.add_pure("negate", Fn1::new(|x: i32| x.wrapping_neg()));
    registry.add_pure("negate", Fn1::new(|x: f32| -x));

    comparison(registry, "equals", |a, b| a == b, |a, b| a == b);
    comparison(registry, "notEquals", |a, b| a != b, |a, b| a != b);
    registry.add_scalar("equals", Fn2::new(|a: bool, b: bool| a == b));
    registry.add_scalar("notEquals", Fn2::new(|a: bool, b: bool| a != b));

    comparison(registry, "lessThan", |a, b| a < b, |a, b| a < b);
    comparison(registry, "lessThanOrEquals", |a, b| a <= b, |a, b| a <= b);
    comparison(registry, "moreThan", |a, b| a > b, |a, b| a > b);
    comparison(registry, "moreThanOrEquals", |a, b| a >= b, |a, b| a >= b);

    registry.add_scalar("not", Fn1::new(|x: bool| !x));
    registry.add_scalar("and", Fn2::new(|a: bool, b: bool| a && b));
    registry.add_scalar("or", Fn2::new(|a: bool, b: bool| a || b));
}
