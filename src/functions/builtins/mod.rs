//! The built-in function catalog.

use super::{FunctionRegistry, Value};

mod cast;
mod conditional;
mod math;
mod operators;
mod smooth;
mod vector;

pub use smooth::DEFAULT_HALF_LIFE;

/// Register every built-in function and constant into `registry`
pub fn register_all(registry: &mut FunctionRegistry) {
    cast::register(registry);
    operators::register(registry);
    math::register(registry);
    conditional::register(registry);
    vector::register(registry);
    smooth::register(registry);

    registry.add_constant("pi", Value::Float(std::f32::consts::PI));
    registry.add_constant("true", Value::Bool(true));
    registry.add_constant("false", Value::Bool(false));
}
