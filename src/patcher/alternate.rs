//! Patching for the alternate (batched chunk) renderer.
//!
//! Chunk geometry is drawn in batches: each vertex carries its position relative to the chunk section, and the
//! index of its draw in `w`. The section offsets of the batch live in a uniform block.

use crate::transform::{InjectionPoint, Transformations};

use super::{
    common::{self, AttributeInput, MatrixSource, Matrices},
    patch_program, Dialect, PatchContext, PatchError, PatchParameters, PatchedProgram, ProgramSource,
};

/// Draws per batch
const MAX_BATCH_SIZE: usize = 256;

const INPUTS: [AttributeInput; 4] = [
    AttributeInput {
        builtin: "gl_Color",
        declaration: "in vec4 iris_Color;",
        expression: "iris_Color",
    },
    AttributeInput {
        builtin: "gl_MultiTexCoord0",
        declaration: "in vec2 iris_TexCoord;",
        expression: "vec4(iris_TexCoord, 0.0, 1.0)",
    },
    AttributeInput {
        builtin: "gl_MultiTexCoord2",
        declaration: "in vec2 iris_LightCoord;",
        expression: "vec4(iris_LightCoord, 0.0, 1.0)",
    },
    AttributeInput {
        builtin: "gl_Normal",
        declaration: "in vec3 iris_Normal;",
        expression: "iris_Normal",
    },
];

struct Alternate {
    matrices: Matrices,
}

impl Dialect for Alternate {
    const NAME: &'static str = "alternate";

    fn declare_vertex_inputs(&self, t: &mut Transformations, ctx: &PatchContext) {
        for line in [
            "in vec4 iris_Pos;".to_owned(),
            "struct iris_DrawParameters { vec4 offset; };".to_owned(),
            format!(
                "layout(std140) uniform iris_ChunkData {{ iris_DrawParameters iris_Chunks[{}]; }};",
                MAX_BATCH_SIZE
            ),
            "uniform vec3 iris_CameraTranslation;".to_owned(),
            "uniform float iris_ModelScale;".to_owned(),
        ] {
            t.inject_line(InjectionPoint::BeforeCode, line);
        }
        t.define(
            "gl_Vertex",
            "vec4(iris_Chunks[int(iris_Pos.w)].offset.xyz + iris_Pos.xyz * iris_ModelScale + iris_CameraTranslation, 1.0)",
        );
        // No overlay attribute in this format
        common::gate_attributes(t, ctx.attributes, &INPUTS);
    }

    fn matrices(&self) -> &Matrices {
        &self.matrices
    }
}

/// Patch a program for the alternate renderer
pub fn patch_alternate(program: &ProgramSource, parameters: &PatchParameters) -> Result<PatchedProgram, PatchError> {
    let dialect = Alternate {
        matrices: Matrices {
            model_view: MatrixSource::Uniform("iris_ModelViewMatrix"),
            projection: MatrixSource::Uniform("iris_ProjectionMatrix"),
            normal: MatrixSource::Uniform("iris_NormalMatrix"),
            texture: MatrixSource::Constant("mat4(1.0)"),
        },
    };
    patch_program(&dialect, program, parameters)
}
