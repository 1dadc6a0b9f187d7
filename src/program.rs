//! Glue between the patchers and the host's shader compiler.

use std::str::FromStr;

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    functions::Value,
    patcher::{
        patch_alternate, patch_composite, patch_vanilla, PatchError, PatchParameters, PatchedProgram, ProgramSource,
    },
};

/// Which renderer a program is patched for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Pipeline {
    Vanilla,
    Alternate,
    Composite,
}
impl FromStr for Pipeline {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "vanilla" => Ok(Pipeline::Vanilla),
            "alternate" => Ok(Pipeline::Alternate),
            "composite" => Ok(Pipeline::Composite),
            _ => Err(format!("unknown pipeline '{}'", s)),
        }
    }
}

/// The driver rejected a patched program
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("couldn't compile program '{program}':\n{info_log}")]
pub struct ShaderCompileFailure {
    pub program: String,
    pub info_log: String,
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ProgramError {
    #[error(transparent)]
    Patch(#[from] PatchError),
    #[error(transparent)]
    Compile(#[from] ShaderCompileFailure),
}

/// Compiles and links final GLSL sources
pub trait ShaderCompiler {
    type Handle;

    fn compile(&mut self, name: &str, sources: &PatchedProgram) -> Result<Self::Handle, ShaderCompileFailure>;
}

/// Sets uniforms of a compiled program by name
pub trait UniformBinder {
    fn bind(&mut self, name: &str, value: &Value);
}

/// Patch every stage of `program` for `pipeline`
pub fn patch(
    pipeline: Pipeline,
    program: &ProgramSource,
    parameters: &PatchParameters,
) -> Result<PatchedProgram, PatchError> {
    match pipeline {
        Pipeline::Vanilla => patch_vanilla(program, parameters),
        Pipeline::Alternate => patch_alternate(program, parameters),
        Pipeline::Composite => {
            if *parameters != PatchParameters::default() {
                warn!(program = %program.name, "composite programs ignore patch parameters");
            }
            program
                .stages()
                .map(|(stage, source)| patch_composite(&program.name, source, stage).map(|patched| (stage, patched)))
                .collect()
        }
    }
}

/// Patch a program and hand it to the compiler
pub fn build_program<C: ShaderCompiler>(
    compiler: &mut C,
    pipeline: Pipeline,
    program: &ProgramSource,
    parameters: &PatchParameters,
) -> Result<C::Handle, ProgramError> {
    let sources = patch(pipeline, program, parameters)?;
    let handle = compiler.compile(&program.name, &sources)?;
    debug!(program = %program.name, ?pipeline, stages = sources.len(), "built program");
    Ok(handle)
}
