//! Rewrites shader pack GLSL into the core-profile dialect the renderer consumes.
//!
//! All three pipelines share the same order of work on each stage:
//! 1. reject sources using the reserved `iris_` prefix
//! 2. rewrite the `#version` line to the core profile
//! 3. declare vertex inputs (per [Dialect]) and legacy varyings/outputs
//! 4. emulate fog, legacy matrices and texture functions
//! 5. wrap `main` for the alpha test, fog distance or line expansion
//!
//! Legacy built-ins are mostly provided as `#define`s, so code injected by the patcher can use them as well.

use std::{collections::BTreeMap, fmt::Display, str::FromStr};

use bitflags::bitflags;
use tracing::debug;

use crate::transform::{InjectionPoint, Transformations};

mod alternate;
mod common;
mod composite;
mod error;
mod vanilla;

pub use alternate::patch_alternate;
pub use composite::patch_composite;
pub use error::{PatchError, PatchErrorKind};
pub use vanilla::patch_vanilla;

use common::Matrices;

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum ShaderStage {
    Vertex,
    TessControl,
    TessEval,
    Geometry,
    Fragment,
}
impl ShaderStage {
    pub const ALL: [ShaderStage; 5] = [
        ShaderStage::Vertex,
        ShaderStage::TessControl,
        ShaderStage::TessEval,
        ShaderStage::Geometry,
        ShaderStage::Fragment,
    ];
}
impl Display for ShaderStage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            ShaderStage::Vertex => "vertex",
            ShaderStage::TessControl => "tess_control",
            ShaderStage::TessEval => "tess_eval",
            ShaderStage::Geometry => "geometry",
            ShaderStage::Fragment => "fragment",
        };
        write!(f, "{}", name)
    }
}
impl FromStr for ShaderStage {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        ShaderStage::ALL
            .into_iter()
            .find(|stage| stage.to_string() == s)
            .ok_or_else(|| format!("unknown shader stage '{}'", s))
    }
}

/// When fragments are discarded based on their alpha
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum AlphaTest {
    Off,
    /// Discard when alpha is exactly 0
    NonZero,
    /// Discard when alpha is at most the reference, which must be finite
    GreaterThan(f32),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FogMode {
    Off,
    /// Fog distance is computed per vertex and interpolated
    PerVertex,
    /// Fog distance is computed per fragment from the interpolated view position
    PerFragment,
}

bitflags! {
    /// The optional vertex attributes a draw provides
    pub struct VertexAttributes: u8 {
        const COLOR = 0b0000_0001;
        const TEXCOORD = 0b0000_0010;
        const OVERLAY = 0b0000_0100;
        const LIGHTMAP = 0b0000_1000;
        const NORMAL = 0b0001_0000;
    }
}

/// Describes the vertex layout of a draw
pub trait VertexFormatDescriptor {
    fn has_attribute(&self, attribute: VertexAttributes) -> bool;
}
impl VertexFormatDescriptor for VertexAttributes {
    fn has_attribute(&self, attribute: VertexAttributes) -> bool {
        self.contains(attribute)
    }
}

impl VertexAttributes {
    pub fn from_format(format: &dyn VertexFormatDescriptor) -> Self {
        [Self::COLOR, Self::TEXCOORD, Self::OVERLAY, Self::LIGHTMAP, Self::NORMAL]
            .into_iter()
            .filter(|a| format.has_attribute(*a))
            .fold(Self::empty(), |acc, a| acc | a)
    }
}

/// Per-program options shared by every stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchParameters {
    pub alpha: AlphaTest,
    /// The draw uses the line vertex format, and lines must be expanded to quads
    pub is_lines: bool,
    /// The vanilla renderer supplies the chunk position as `iris_ChunkOffset`
    pub has_chunk_offset: bool,
    pub attributes: VertexAttributes,
    pub fog: FogMode,
}
impl Default for PatchParameters {
    fn default() -> Self {
        Self {
            alpha: AlphaTest::Off,
            is_lines: false,
            has_chunk_offset: false,
            attributes: VertexAttributes::all(),
            fog: FogMode::Off,
        }
    }
}
impl PatchParameters {
    pub fn context(&self, stage: ShaderStage) -> PatchContext {
        PatchContext {
            stage,
            alpha: self.alpha,
            attributes: self.attributes,
            fog: self.fog,
            is_lines: self.is_lines,
            has_chunk_offset: self.has_chunk_offset,
        }
    }
}

/// Everything known while patching one stage
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PatchContext {
    pub stage: ShaderStage,
    pub alpha: AlphaTest,
    pub attributes: VertexAttributes,
    pub fog: FogMode,
    pub is_lines: bool,
    pub has_chunk_offset: bool,
}

/// The sources of one program, any stage of which may be missing
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProgramSource {
    pub name: String,
    pub vertex: Option<String>,
    pub tess_control: Option<String>,
    pub tess_eval: Option<String>,
    pub geometry: Option<String>,
    pub fragment: Option<String>,
}
impl ProgramSource {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }

    pub fn with_stage(mut self, stage: ShaderStage, source: impl Into<String>) -> Self {
        *self.stage_mut(stage) = Some(source.into());
        self
    }

    pub fn stage(&self, stage: ShaderStage) -> Option<&str> {
        match stage {
            ShaderStage::Vertex => self.vertex.as_deref(),
            ShaderStage::TessControl => self.tess_control.as_deref(),
            ShaderStage::TessEval => self.tess_eval.as_deref(),
            ShaderStage::Geometry => self.geometry.as_deref(),
            ShaderStage::Fragment => self.fragment.as_deref(),
        }
    }

    fn stage_mut(&mut self, stage: ShaderStage) -> &mut Option<String> {
        match stage {
            ShaderStage::Vertex => &mut self.vertex,
            ShaderStage::TessControl => &mut self.tess_control,
            ShaderStage::TessEval => &mut self.tess_eval,
            ShaderStage::Geometry => &mut self.geometry,
            ShaderStage::Fragment => &mut self.fragment,
        }
    }

    /// The supplied stages, in pipeline order
    pub fn stages(&self) -> impl Iterator<Item = (ShaderStage, &str)> {
        ShaderStage::ALL
            .into_iter()
            .filter_map(move |stage| self.stage(stage).map(|source| (stage, source)))
    }
}

/// One patched source per supplied stage
pub type PatchedProgram = BTreeMap<ShaderStage, String>;

/// The parts of patching that differ between renderers
pub(crate) trait Dialect {
    const NAME: &'static str;

    /// Declare the vertex inputs, defining `gl_Vertex` and the gated attribute built-ins
    fn declare_vertex_inputs(&self, t: &mut Transformations, ctx: &PatchContext);

    fn matrices(&self) -> &Matrices;

    fn supports_alpha_test(&self) -> bool {
        true
    }
}

/// Patch a single stage source
pub(crate) fn patch_stage<D: Dialect>(dialect: &D, source: &str, ctx: &PatchContext) -> Result<String, PatchErrorKind> {
    common::check_reserved_namespace(source)?;
    let mut t = Transformations::new(source)?;
    common::normalize_version(&mut t)?;

    // Statements appended to `main`, and functions they call
    let mut epilogue = vec![];
    // Injected code uses gl_ModelViewMatrix and gl_ProjectionMatrix
    let mut needs_transform = false;

    match ctx.stage {
        ShaderStage::Vertex => {
            t.replace_exact("attribute", "in");
            t.replace_exact("varying", "out");
            dialect.declare_vertex_inputs(&mut t, ctx);
            common::declare_vertex_outputs(&mut t);
            if t.contains_token("ftransform") {
                t.define("ftransform()", "(gl_ProjectionMatrix * gl_ModelViewMatrix * gl_Vertex)");
                needs_transform = true;
            }
        }
        ShaderStage::Fragment => {
            t.replace_exact("varying", "in");
            common::declare_fragment_inputs(&mut t);
            common::declare_fragment_outputs(&mut t);
        }
        _ => {}
    }

    needs_transform |= common::emulate_fog(&mut t, ctx, &mut epilogue);
    if ctx.stage == ShaderStage::Vertex && ctx.is_lines {
        common::expand_lines(&mut t, &mut epilogue);
        needs_transform = true;
    }
    common::declare_matrices(&mut t, dialect.matrices(), needs_transform);
    common::declare_texture_functions(&mut t, ctx.stage);

    if ctx.stage == ShaderStage::Fragment && dialect.supports_alpha_test() {
        if let Some(statement) = common::alpha_test_statement(&t, ctx.alpha) {
            epilogue.push(statement);
        }
    }
    if !epilogue.is_empty() {
        common::wrap_main(&mut t, &epilogue)?;
    }

    t.inject_line(InjectionPoint::AfterVersion, format!("// patched for the {} pipeline", D::NAME));
    Ok(t.finish())
}

/// Patch every supplied stage of a program
pub(crate) fn patch_program<D: Dialect>(
    dialect: &D,
    program: &ProgramSource,
    parameters: &PatchParameters,
) -> Result<PatchedProgram, PatchError> {
    let mut patched = PatchedProgram::new();
    for (stage, source) in program.stages() {
        let ctx = parameters.context(stage);
        let output = patch_stage(dialect, source, &ctx).map_err(|kind| PatchError {
            program: program.name.clone(),
            stage,
            kind,
        })?;
        debug!(program = %program.name, %stage, pipeline = D::NAME, "patched shader");
        patched.insert(stage, output);
    }
    Ok(patched)
}
