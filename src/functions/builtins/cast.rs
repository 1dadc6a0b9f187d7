use std::rc::Rc;

use crate::functions::{
    pure::{Fn1, Scalar, Vectorized},
    FunctionRegistry, Type,
};

pub fn register(registry: &mut FunctionRegistry) {
    let to_int = Fn1::new(|x: f32| x as i32);
    let to_float = Fn1::new(|x: i32| x as f32);

    registry.add_pure("toInt", to_int);
    registry.add_pure("toFloat", to_float.clone());

    registry.add_implicit_cast(Type::INT, Type::FLOAT, Rc::new(Scalar::new(to_float.clone())));
    for width in 2..=4 {
        registry.add_implicit_cast(
            Type::ivec(width),
            Type::vec(width),
            Rc::new(Vectorized::new(to_float.clone(), width)),
        );
    }
}
