//! Patching for the vanilla renderer, which feeds each draw through its own vertex format.

use crate::transform::{InjectionPoint, Transformations};

use super::{
    common::{self, AttributeInput, MatrixSource, Matrices},
    patch_program, Dialect, PatchContext, PatchError, PatchParameters, PatchedProgram, ProgramSource,
};

const INPUTS: [AttributeInput; 5] = [
    AttributeInput {
        builtin: "gl_Color",
        declaration: "in vec4 iris_Color;",
        expression: "iris_Color",
    },
    AttributeInput {
        builtin: "gl_MultiTexCoord0",
        declaration: "in vec2 iris_UV0;",
        expression: "vec4(iris_UV0, 0.0, 1.0)",
    },
    AttributeInput {
        builtin: "gl_MultiTexCoord1",
        declaration: "in ivec2 iris_UV1;",
        expression: "vec4(iris_UV1, 0.0, 1.0)",
    },
    AttributeInput {
        builtin: "gl_MultiTexCoord2",
        declaration: "in ivec2 iris_UV2;",
        expression: "vec4(iris_UV2, 0.0, 1.0)",
    },
    AttributeInput {
        builtin: "gl_Normal",
        declaration: "in vec3 iris_Normal;",
        expression: "iris_Normal",
    },
];

struct Vanilla {
    matrices: Matrices,
}
impl Vanilla {
    fn new() -> Self {
        Self {
            matrices: Matrices {
                model_view: MatrixSource::Uniform("iris_ModelViewMat"),
                projection: MatrixSource::Uniform("iris_ProjMat"),
                normal: MatrixSource::Uniform("iris_NormalMat"),
                texture: MatrixSource::Uniform("iris_TextureMat"),
            },
        }
    }
}

impl Dialect for Vanilla {
    const NAME: &'static str = "vanilla";

    fn declare_vertex_inputs(&self, t: &mut Transformations, ctx: &PatchContext) {
        t.inject_line(InjectionPoint::BeforeCode, "in vec3 iris_Position;");
        if ctx.has_chunk_offset {
            t.inject_line(InjectionPoint::BeforeCode, "uniform vec3 iris_ChunkOffset;");
            t.define("gl_Vertex", "vec4(iris_Position + iris_ChunkOffset, 1.0)");
        } else {
            t.define("gl_Vertex", "vec4(iris_Position, 1.0)");
        }
        common::gate_attributes(t, ctx.attributes, &INPUTS);
    }

    fn matrices(&self) -> &Matrices {
        &self.matrices
    }
}

/// Patch a program for the vanilla renderer.
///
/// Attribute built-ins whose attribute is missing from `parameters.attributes` are replaced by constants.
pub fn patch_vanilla(program: &ProgramSource, parameters: &PatchParameters) -> Result<PatchedProgram, PatchError> {
    patch_program(&Vanilla::new(), program, parameters)
}
