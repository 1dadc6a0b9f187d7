//! Typed functions and the registry that resolves calls against them.
//!
//! Every function has a fixed [Signature]. Functions sharing a name form an overload set, searched in registration
//! order by [FunctionRegistry::find_overload].

use std::{collections::HashMap, fmt::Debug, rc::Rc};

use crate::expr::Expression;

pub mod builtins;
pub mod pure;
pub mod types;
pub mod value;

pub use types::{ScalarType, Signature, Type};
pub use value::{FunctionReturn, Matrix, Primitive, Value};

use pure::{PureFunction, Scalar, Vectorized};

/// A function with a fixed signature that evaluates its argument expressions into a [FunctionReturn].
///
/// `args` always has a length accepted by [TypedFunction::signature], and each argument's static type is the
/// corresponding parameter type.
pub trait TypedFunction: Debug {
    fn signature(&self) -> &Signature;
    fn evaluate(&self, args: &[Expression], context: &FunctionContext, out: &mut FunctionReturn);
}

/// Supplies the current values of named uniforms.
pub trait UniformValueProvider {
    /// The type of the named uniform, or None if it doesn't exist
    fn uniform_type(&self, name: &str) -> Option<Type>;
    /// Write the current value of the named uniform into `out`. Returns false if it doesn't exist.
    fn write_uniform(&self, name: &str, out: &mut FunctionReturn) -> bool;
}

pub trait FrameTimer {
    fn last_frame_time_seconds(&self) -> f32;
}

/// Everything an expression can read while evaluating
pub struct FunctionContext<'a> {
    pub uniforms: &'a dyn UniformValueProvider,
    pub timer: &'a dyn FrameTimer,
}
impl<'a> FunctionContext<'a> {
    pub fn new(uniforms: &'a dyn UniformValueProvider, timer: &'a dyn FrameTimer) -> Self {
        Self { uniforms, timer }
    }
}

/// A [UniformValueProvider] backed by a map of values
#[derive(Debug, Clone, Default)]
pub struct UniformMap {
    values: HashMap<String, Value>,
}
impl UniformMap {
    pub fn new() -> Self {
        Self::default()
    }
    pub fn set(&mut self, name: impl Into<String>, value: Value) {
        self.values.insert(name.into(), value);
    }
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}
impl UniformValueProvider for UniformMap {
    fn uniform_type(&self, name: &str) -> Option<Type> {
        self.values.get(name).map(Value::ty)
    }
    fn write_uniform(&self, name: &str, out: &mut FunctionReturn) -> bool {
        match self.values.get(name) {
            Some(v) => {
                out.write(v);
                true
            }
            None => false,
        }
    }
}

/// Looks names up in `first`, then in `second`
pub struct ChainedUniforms<'a> {
    pub first: &'a dyn UniformValueProvider,
    pub second: &'a dyn UniformValueProvider,
}
impl<'a> UniformValueProvider for ChainedUniforms<'a> {
    fn uniform_type(&self, name: &str) -> Option<Type> {
        self.first.uniform_type(name).or_else(|| self.second.uniform_type(name))
    }
    fn write_uniform(&self, name: &str, out: &mut FunctionReturn) -> bool {
        self.first.write_uniform(name, out) || self.second.write_uniform(name, out)
    }
}

/// A [FrameTimer] that always reports the same frame time
#[derive(Debug, Clone, Copy)]
pub struct FixedFrameTimer(pub f32);
impl FrameTimer for FixedFrameTimer {
    fn last_frame_time_seconds(&self) -> f32 {
        self.0
    }
}

pub type FunctionFactory = Box<dyn Fn() -> Rc<dyn TypedFunction>>;

/// One entry of an overload set
pub enum Overload {
    /// A stateless function shared by every call site
    Static(Rc<dyn TypedFunction>),
    /// A stateful function, instantiated once per call site
    Dynamic { signature: Signature, factory: FunctionFactory },
}
impl Overload {
    pub fn signature(&self) -> &Signature {
        match self {
            Overload::Static(f) => f.signature(),
            Overload::Dynamic { signature, .. } => signature,
        }
    }

    /// The function instance for a new call site
    pub fn instantiate(&self) -> Rc<dyn TypedFunction> {
        match self {
            Overload::Static(f) => f.clone(),
            Overload::Dynamic { factory, .. } => factory(),
        }
    }
}
impl Debug for Overload {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Overload::Static(func) => write!(f, "Static{}", func.signature()),
            Overload::Dynamic { signature, .. } => write!(f, "Dynamic{}", signature),
        }
    }
}

/// A successfully resolved call: the chosen overload, plus the implicit cast (if any) to apply to each argument
#[derive(Debug)]
pub struct Resolution<'r> {
    pub overload: &'r Overload,
    pub casts: Vec<Option<Rc<dyn TypedFunction>>>,
}

#[derive(Debug, Default)]
pub struct FunctionRegistry {
    overloads: HashMap<String, Vec<Overload>>,
    constants: HashMap<String, Value>,
    implicit_casts: HashMap<(Type, Type), Rc<dyn TypedFunction>>,
}

impl FunctionRegistry {
    /// An empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// A registry holding the full built-in catalog
    pub fn with_builtins() -> Self {
        let mut registry = Self::new();
        builtins::register_all(&mut registry);
        registry
    }

    pub fn add(&mut self, name: &str, function: Rc<dyn TypedFunction>) {
        self.push(name, Overload::Static(function));
    }

    /// Register a stateful function. `factory` is called once for every call site that resolves to it.
    pub fn add_dynamic(&mut self, name: &str, signature: Signature, factory: impl Fn() -> Rc<dyn TypedFunction> + 'static) {
        self.push(
            name,
            Overload::Dynamic {
                signature,
                factory: Box::new(factory),
            },
        );
    }

    /// Register a pure function for scalars only
    pub fn add_scalar(&mut self, name: &str, function: Rc<dyn PureFunction>) {
        self.add(name, Rc::new(Scalar::new(function)));
    }

    /// Register a pure function for scalars, plus its component-wise lifts to vectors of width 2, 3 and 4
    pub fn add_pure(&mut self, name: &str, function: Rc<dyn PureFunction>) {
        self.add_scalar(name, function.clone());
        self.add_vectorized(name, function);
    }

    pub fn add_vectorized(&mut self, name: &str, function: Rc<dyn PureFunction>) {
        for width in 2..=4 {
            self.add(name, Rc::new(Vectorized::new(function.clone(), width)));
        }
    }

    /// Register the `vector op scalar` and `scalar op vector` forms of a two-parameter pure function
    pub fn add_broadcast(&mut self, name: &str, function: Rc<dyn PureFunction>) {
        for width in 2..=4 {
            for flags in [[true, false], [false, true]] {
                let flags = flags.into_iter().collect();
                self.add(name, Rc::new(Vectorized::with_broadcast(function.clone(), width, flags)));
            }
        }
    }

    /// Register a named constant, which takes precedence over uniforms of the same name
    pub fn add_constant(&mut self, name: &str, value: Value) {
        self.constants.insert(name.to_owned(), value);
    }

    /// Register a conversion the resolver may apply to an argument on its own
    pub fn add_implicit_cast(&mut self, from: Type, to: Type, function: Rc<dyn TypedFunction>) {
        self.implicit_casts.insert((from, to), function);
    }

    pub fn implicit_cast(&self, from: Type, to: Type) -> Option<Rc<dyn TypedFunction>> {
        self.implicit_casts.get(&(from, to)).cloned()
    }

    pub fn constant(&self, name: &str) -> Option<&Value> {
        self.constants.get(name)
    }

    pub fn overloads(&self, name: &str) -> &[Overload] {
        self.overloads.get(name).map_or(&[], Vec::as_slice)
    }

    /// Find the overload of `name` to call with arguments of `arg_types`.
    ///
    /// An exact match always wins.
    /// Otherwise, the first registered overload that becomes an exact match by applying one implicit cast to each
    /// mismatched argument is chosen.
    pub fn find_overload(&self, name: &str, arg_types: &[Type]) -> Option<Resolution<'_>> {
        let candidates = self.overloads(name);
        let arity = arg_types.len();
        let arity_matches = || candidates.iter().filter(move |o| o.signature().accepts_arity(arity));

        if let Some(overload) = arity_matches().find(|o| {
            arg_types
                .iter()
                .enumerate()
                .all(|(i, t)| o.signature().parameter(i) == Some(*t))
        }) {
            return Some(Resolution {
                overload,
                casts: arg_types.iter().map(|_| None).collect(),
            });
        }

        arity_matches().find_map(|overload| {
            let casts: Option<Vec<_>> = arg_types
                .iter()
                .enumerate()
                .map(|(i, from)| {
                    let to = overload.signature().parameter(i)?;
                    if to == *from {
                        Some(None)
                    } else {
                        self.implicit_casts.get(&(*from, to)).map(|cast| Some(cast.clone()))
                    }
                })
                .collect();
            casts.map(|casts| Resolution { overload, casts })
        })
    }

    fn push(&mut self, name: &str, overload: Overload) {
        self.overloads.entry(name.to_owned()).or_default().push(overload);
    }
}
