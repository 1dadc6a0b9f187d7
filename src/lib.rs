//! The crate rewrites shader pack GLSL into a single modern dialect, and compiles the small expression language
//! shader packs use to declare derived uniforms.
//!
//! Shader sources pass through a [transform::Transformations] buffer, which supports token replacement and line
//! injection at fixed anchors without parsing the GLSL grammar. The [patcher] module builds the three pipelines on
//! top of it:
//! - [patcher::patch_vanilla] - the vanilla renderer, one draw per chunk
//! - [patcher::patch_alternate] - the batched renderer, which packs many chunks into one draw call
//! - [patcher::patch_composite] - full-screen post-processing passes
//!
//! Expressions are tokenized and parsed by [expr], resolved against a [functions::FunctionRegistry]
//! into a typed tree, and evaluated once per frame through a shared [functions::FunctionReturn] slot.
//! [uniforms::CustomUniforms] ties that together for the uniform/variable declarations of a pack,
//! and [program] holds the glue to the host's shader compiler.

#[macro_use]
extern crate num_derive;

pub mod expr;
pub mod functions;
pub mod patcher;
pub mod program;
pub mod transform;
pub mod uniforms;

pub use expr::{compile, CompiledExpression, ExpressionError};
pub use functions::{FunctionContext, FunctionRegistry, Type, Value};
pub use patcher::{
    patch_alternate, patch_composite, patch_vanilla, PatchError, PatchErrorKind, PatchParameters,
    ShaderStage,
};
