//! Patching for full-screen composite and final passes, which draw a single quad spanning [0, 1].

use crate::transform::{InjectionPoint, Transformations};

use super::{
    common::{self, MatrixSource, Matrices},
    patch_stage, Dialect, FogMode, PatchContext, PatchError, PatchParameters, ShaderStage,
};

const COMPOSITE_MATRICES: Matrices = Matrices {
    model_view: MatrixSource::Constant("mat4(1.0)"),
    // Maps [0, 1] to [-1, 1]
    projection: MatrixSource::Constant(
        "mat4(vec4(2.0, 0.0, 0.0, 0.0), vec4(0.0, 2.0, 0.0, 0.0), vec4(0.0), vec4(-1.0, -1.0, 0.0, 1.0))",
    ),
    normal: MatrixSource::Constant("mat3(1.0)"),
    texture: MatrixSource::Constant("mat4(1.0)"),
};

struct Composite;

impl Dialect for Composite {
    const NAME: &'static str = "composite";

    fn declare_vertex_inputs(&self, t: &mut Transformations, _ctx: &PatchContext) {
        t.inject_line(InjectionPoint::BeforeCode, "in vec3 iris_Position;");
        t.define("gl_Vertex", "vec4(iris_Position, 1.0)");
        t.define("gl_MultiTexCoord0", "vec4(iris_Position.xy, 0.0, 1.0)");
        common::define_fallbacks_except(t, &["gl_MultiTexCoord0"]);
    }

    fn matrices(&self) -> &Matrices {
        &COMPOSITE_MATRICES
    }

    fn supports_alpha_test(&self) -> bool {
        false
    }
}

/// Patch one stage of a composite program
pub fn patch_composite(name: &str, source: &str, stage: ShaderStage) -> Result<String, PatchError> {
    let parameters = PatchParameters {
        fog: FogMode::PerVertex,
        ..PatchParameters::default()
    };
    patch_stage(&Composite, source, &parameters.context(stage)).map_err(|kind| PatchError {
        program: name.to_owned(),
        stage,
        kind,
    })
}
