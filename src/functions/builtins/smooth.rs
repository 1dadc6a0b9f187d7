//! Exponential smoothing, the stateful `smooth` family.
//!
//! Every `smooth(...)` call site gets its own accumulator. The first evaluation adopts its input as-is, and every
//! later one moves the accumulator towards the input by `1 - exp(-k * dt)`, where `k = ln(2) / half_life` and `dt` is
//! the last frame time. Separate half-lives apply when the input is above (up) or below (down) the accumulator.

use std::{cell::Cell, f32::consts::LN_2, rc::Rc};

use crate::{
    expr::Expression,
    functions::{FunctionContext, FunctionRegistry, FunctionReturn, Signature, Type, TypedFunction},
};

/// Half-life in seconds used when none is given
pub const DEFAULT_HALF_LIFE: f32 = 1.0;

/// Which arguments of a call hold the value and half-lives
#[derive(Debug, Clone, Copy)]
enum Form {
    /// `smooth(x)`
    Value,
    /// `smooth(x, half_life)`
    HalfLife,
    /// `smooth(x, up, down)`
    UpDown,
    /// `smooth(id, x, up, down)`, where `id` is ignored
    Identified,
}
impl Form {
    fn arity(self) -> usize {
        match self {
            Form::Value => 1,
            Form::HalfLife => 2,
            Form::UpDown => 3,
            Form::Identified => 4,
        }
    }

    /// Indices of (value, up half-life, down half-life)
    fn layout(self) -> (usize, Option<usize>, Option<usize>) {
        match self {
            Form::Value => (0, None, None),
            Form::HalfLife => (0, Some(1), Some(1)),
            Form::UpDown => (0, Some(1), Some(2)),
            Form::Identified => (1, Some(2), Some(3)),
        }
    }
}

#[derive(Debug)]
pub struct Smooth {
    signature: Signature,
    form: Form,
    accumulator: Cell<Option<f32>>,
}
impl Smooth {
    fn new(form: Form) -> Self {
        Self {
            signature: Signature::new(vec![Type::FLOAT; form.arity()], Type::FLOAT),
            form,
            accumulator: Cell::new(None),
        }
    }
}

/// Step `acc` towards `value` over `dt` seconds
fn step(acc: f32, value: f32, half_life: f32, dt: f32) -> f32 {
    if half_life == 0.0 {
        return value;
    }
    let k = LN_2 / half_life;
    let t = 1.0 - (-k * dt).exp();
    acc + (value - acc) * t
}

impl TypedFunction for Smooth {
    fn signature(&self) -> &Signature {
        &self.signature
    }

    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn) {
        let (value_idx, up_idx, down_idx) = self.form.layout();

        let mut read = |idx: Option<usize>| match idx {
            Some(i) => {
                args[i].evaluate_to(context, out);
                out.float_return
            }
            None => DEFAULT_HALF_LIFE,
        };
        let value = read(Some(value_idx));
        let up = read(up_idx);
        let down = if down_idx == up_idx { up } else { read(down_idx) };

        let next = match self.accumulator.get() {
            None => value,
            Some(acc) => {
                let half_life = if value > acc { up } else { down };
                step(acc, value, half_life, context.timer.last_frame_time_seconds())
            }
        };
        self.accumulator.set(Some(next));
        out.float_return = next;
    }
}

pub fn register(registry: &mut FunctionRegistry) {
    for form in [Form::Value, Form::HalfLife, Form::UpDown, Form::Identified] {
        let signature = Signature::new(vec![Type::FLOAT; form.arity()], Type::FLOAT);
        registry.add_dynamic("smooth", signature, move || Rc::new(Smooth::new(form)) as Rc<dyn TypedFunction>);
    }
}
