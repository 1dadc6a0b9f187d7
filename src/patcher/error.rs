use thiserror::Error;

use crate::transform::TransformError;

use super::ShaderStage;

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum PatchErrorKind {
    #[error("shader source has no #version directive")]
    MissingVersionDirective,
    #[error("shader already declares the core profile")]
    AlreadyCoreProfile,
    #[error("line {line} uses the reserved iris_ prefix: {text}")]
    ReservedNamespaceCollision { line: usize, text: String },
    #[error("shader already defines irisMain")]
    DuplicateIrisMainSymbol,
}
impl From<TransformError> for PatchErrorKind {
    fn from(value: TransformError) -> Self {
        match value {
            TransformError::MissingVersionDirective => PatchErrorKind::MissingVersionDirective,
        }
    }
}

/// A stage of a program that couldn't be patched
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("couldn't patch the {stage} shader of program '{program}': {kind}")]
pub struct PatchError {
    pub program: String,
    pub stage: ShaderStage,
    pub kind: PatchErrorKind,
}
