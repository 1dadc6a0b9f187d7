//! Transformations shared by every pipeline.

use phf::phf_map;
use tracing::warn;

use crate::transform::{grammar::parse_location_zero_output, InjectionPoint, Transformations};

use super::{AlphaTest, FogMode, PatchContext, PatchErrorKind, ShaderStage, VertexAttributes};

/// Values legacy attribute built-ins take when the draw doesn't provide them
static ATTRIBUTE_FALLBACKS: phf::Map<&'static str, &'static str> = phf_map! {
    "gl_Color" => "vec4(1.0)",
    "gl_Normal" => "vec3(0.0, 0.0, 1.0)",
    "gl_MultiTexCoord0" => "vec4(0.0, 0.0, 0.0, 1.0)",
    // Overlay: no hurt or flash tint
    "gl_MultiTexCoord1" => "vec4(0.0, 10.0, 0.0, 1.0)",
    // Lightmap: full block and sky light
    "gl_MultiTexCoord2" => "vec4(240.0, 240.0, 0.0, 1.0)",
    "gl_MultiTexCoord3" => "vec4(0.0, 0.0, 0.0, 1.0)",
    "gl_MultiTexCoord4" => "vec4(0.0, 0.0, 0.0, 1.0)",
    "gl_MultiTexCoord5" => "vec4(0.0, 0.0, 0.0, 1.0)",
    "gl_MultiTexCoord6" => "vec4(0.0, 0.0, 0.0, 1.0)",
    "gl_MultiTexCoord7" => "vec4(0.0, 0.0, 0.0, 1.0)",
};

/// Legacy attribute built-ins backed by an optional vertex attribute, in declaration order
const GATED_BUILTINS: [(&str, VertexAttributes); 5] = [
    ("gl_Color", VertexAttributes::COLOR),
    ("gl_MultiTexCoord0", VertexAttributes::TEXCOORD),
    ("gl_MultiTexCoord1", VertexAttributes::OVERLAY),
    ("gl_MultiTexCoord2", VertexAttributes::LIGHTMAP),
    ("gl_Normal", VertexAttributes::NORMAL),
];

/// Texture coordinates no renderer provides
const UNGATED_TEXCOORDS: [&str; 5] = [
    "gl_MultiTexCoord3",
    "gl_MultiTexCoord4",
    "gl_MultiTexCoord5",
    "gl_MultiTexCoord6",
    "gl_MultiTexCoord7",
];

/// How a renderer supplies one of the gated built-ins
#[derive(Debug, Clone, Copy)]
pub(crate) struct AttributeInput {
    pub builtin: &'static str,
    pub declaration: &'static str,
    pub expression: &'static str,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum MatrixSource {
    /// A uniform of the given name
    Uniform(&'static str),
    /// A constant GLSL expression
    Constant(&'static str),
}
impl MatrixSource {
    fn expression(&self) -> &'static str {
        match self {
            MatrixSource::Uniform(e) | MatrixSource::Constant(e) => e,
        }
    }

    fn declare(&self, t: &mut Transformations, glsl_type: &str) {
        if let MatrixSource::Uniform(name) = self {
            t.inject_line(InjectionPoint::BeforeCode, format!("uniform {} {};", glsl_type, name));
        }
    }
}

/// Where a renderer's transform matrices come from
#[derive(Debug, Clone, Copy)]
pub(crate) struct Matrices {
    pub model_view: MatrixSource,
    pub projection: MatrixSource,
    pub normal: MatrixSource,
    /// The texture matrix of the first texture unit
    pub texture: MatrixSource,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum LegacyMatrix {
    ModelView,
    Projection,
    ModelViewProjection,
    Normal,
    ModelViewInverse,
    ProjectionInverse,
    ModelViewProjectionInverse,
}

static LEGACY_MATRICES: phf::Map<&'static str, LegacyMatrix> = phf_map! {
    "gl_ModelViewMatrix" => LegacyMatrix::ModelView,
    "gl_ProjectionMatrix" => LegacyMatrix::Projection,
    "gl_ModelViewProjectionMatrix" => LegacyMatrix::ModelViewProjection,
    "gl_NormalMatrix" => LegacyMatrix::Normal,
    "gl_ModelViewMatrixInverse" => LegacyMatrix::ModelViewInverse,
    "gl_ProjectionMatrixInverse" => LegacyMatrix::ProjectionInverse,
    "gl_ModelViewProjectionMatrixInverse" => LegacyMatrix::ModelViewProjectionInverse,
};

/// Scales lightmap coordinates in [0, 240] to texel centers of the 16x16 lightmap
const LIGHTMAP_TEXTURE_MATRIX: &str = "const mat4 iris_LightmapTextureMatrix = mat4(vec4(0.00390625, 0.0, 0.0, 0.0), vec4(0.0, 0.00390625, 0.0, 0.0), vec4(0.0, 0.0, 0.00390625, 0.0), vec4(0.03125, 0.03125, 0.03125, 1.0));";

struct TextureFunction {
    wrappers: &'static [&'static str],
    /// Overloads taking a LOD bias, which only fragment shaders may use
    fragment_wrappers: &'static [&'static str],
}

static TEXTURE_FUNCTIONS: phf::Map<&'static str, TextureFunction> = phf_map! {
    "texture2D" => TextureFunction {
        wrappers: &["vec4 texture2D(sampler2D s, vec2 c) { return texture(s, c); }"],
        fragment_wrappers: &["vec4 texture2D(sampler2D s, vec2 c, float b) { return texture(s, c, b); }"],
    },
    "texture2DLod" => TextureFunction {
        wrappers: &["vec4 texture2DLod(sampler2D s, vec2 c, float lod) { return textureLod(s, c, lod); }"],
        fragment_wrappers: &[],
    },
    "texture2DProj" => TextureFunction {
        wrappers: &[
            "vec4 texture2DProj(sampler2D s, vec3 c) { return textureProj(s, c); }",
            "vec4 texture2DProj(sampler2D s, vec4 c) { return textureProj(s, c); }",
        ],
        fragment_wrappers: &[],
    },
    "texture3D" => TextureFunction {
        wrappers: &["vec4 texture3D(sampler3D s, vec3 c) { return texture(s, c); }"],
        fragment_wrappers: &["vec4 texture3D(sampler3D s, vec3 c, float b) { return texture(s, c, b); }"],
    },
    "textureCube" => TextureFunction {
        wrappers: &["vec4 textureCube(samplerCube s, vec3 c) { return texture(s, c); }"],
        fragment_wrappers: &["vec4 textureCube(samplerCube s, vec3 c, float b) { return texture(s, c, b); }"],
    },
    "shadow2D" => TextureFunction {
        wrappers: &["vec4 shadow2D(sampler2DShadow s, vec3 c) { return vec4(texture(s, c)); }"],
        fragment_wrappers: &[],
    },
    "shadow2DLod" => TextureFunction {
        wrappers: &["vec4 shadow2DLod(sampler2DShadow s, vec3 c, float lod) { return vec4(textureLod(s, c, lod)); }"],
        fragment_wrappers: &[],
    },
};

const FOG_STRUCT: &str = "struct iris_FogParameters { vec4 color; float density; float start; float end; float scale; };";

const LINE_EXPANSION: [&str; 9] = [
    "void iris_ExpandLine() {",
    "    vec4 iris_LineEnd = gl_ProjectionMatrix * gl_ModelViewMatrix * vec4(gl_Vertex.xyz + gl_Normal, 1.0);",
    "    vec3 iris_NdcStart = gl_Position.xyz / gl_Position.w;",
    "    vec3 iris_NdcEnd = iris_LineEnd.xyz / iris_LineEnd.w;",
    "    vec2 iris_LineDirection = normalize((iris_NdcEnd.xy - iris_NdcStart.xy) * iris_ScreenSize);",
    "    vec2 iris_LineOffset = vec2(-iris_LineDirection.y, iris_LineDirection.x) * iris_LineWidth / iris_ScreenSize;",
    "    if (iris_LineOffset.x < 0.0 != (gl_VertexID % 2 != 0)) iris_LineOffset = -iris_LineOffset;",
    "    gl_Position = vec4((iris_NdcStart + vec3(iris_LineOffset, 0.0)) * gl_Position.w, gl_Position.w);",
    "}",
];

/// Fail if any line of the source uses the `iris_` prefix
pub(crate) fn check_reserved_namespace(source: &str) -> Result<(), PatchErrorKind> {
    match source.lines().enumerate().find(|(_, line)| line.contains("iris_")) {
        Some((idx, line)) => Err(PatchErrorKind::ReservedNamespaceCollision {
            line: idx + 1,
            text: line.trim().to_owned(),
        }),
        None => Ok(()),
    }
}

/// Rewrite `#version N [profile]` to `#version max(150, N) core`
pub(crate) fn normalize_version(t: &mut Transformations) -> Result<(), PatchErrorKind> {
    let directive = t.version().ok_or(PatchErrorKind::MissingVersionDirective)?;
    if directive.profile.as_deref() == Some("core") {
        return Err(PatchErrorKind::AlreadyCoreProfile);
    }
    t.set_version_line(&format!("#version {} core", directive.version.max(150)));
    Ok(())
}

fn define_fallback(t: &mut Transformations, builtin: &str) {
    if let Some(fallback) = ATTRIBUTE_FALLBACKS.get(builtin) {
        t.define(builtin, fallback);
    }
}

/// Declare each gated built-in as an input if the renderer supplies it and the draw has it, or define it to its
/// fallback otherwise
pub(crate) fn gate_attributes(t: &mut Transformations, available: VertexAttributes, inputs: &[AttributeInput]) {
    for (builtin, flag) in GATED_BUILTINS {
        match inputs.iter().find(|input| input.builtin == builtin) {
            Some(input) if available.contains(flag) => {
                t.inject_line(InjectionPoint::BeforeCode, input.declaration);
                t.define(builtin, input.expression);
            }
            _ => define_fallback(t, builtin),
        }
    }
    for builtin in UNGATED_TEXCOORDS {
        define_fallback(t, builtin);
    }
}

/// Define every attribute built-in except `supplied` to its fallback
pub(crate) fn define_fallbacks_except(t: &mut Transformations, supplied: &[&str]) {
    for (builtin, _) in GATED_BUILTINS {
        if !supplied.contains(&builtin) {
            define_fallback(t, builtin);
        }
    }
    for builtin in UNGATED_TEXCOORDS {
        define_fallback(t, builtin);
    }
}

/// Legacy varyings written by the vertex stage.
///
/// These are always declared, as the fragment stage may read them even if this stage never writes them.
pub(crate) fn declare_vertex_outputs(t: &mut Transformations) {
    t.inject_line(InjectionPoint::BeforeCode, "out vec4 iris_FrontColor;");
    t.define("gl_FrontColor", "iris_FrontColor");
    t.inject_line(InjectionPoint::BeforeCode, "out vec4 iris_TexCoords[8];");
    t.define("gl_TexCoord", "iris_TexCoords");
}

/// Legacy varyings read by the fragment stage, declared only when used
pub(crate) fn declare_fragment_inputs(t: &mut Transformations) {
    if t.contains_token("gl_Color") {
        t.inject_line(InjectionPoint::BeforeCode, "in vec4 iris_FrontColor;");
        t.define("gl_Color", "iris_FrontColor");
    }
    if t.contains_token("gl_TexCoord") {
        t.inject_line(InjectionPoint::BeforeCode, "in vec4 iris_TexCoords[8];");
        t.define("gl_TexCoord", "iris_TexCoords");
    }
}

pub(crate) fn declare_fragment_outputs(t: &mut Transformations) {
    if t.contains_token("gl_FragData") || t.contains_token("gl_FragColor") {
        t.inject_line(InjectionPoint::BeforeCode, "out vec4 iris_FragData[8];");
        t.define("gl_FragData", "iris_FragData");
        t.define("gl_FragColor", "iris_FragData[0]");
    }
}

/// Emulate `gl_Fog` and `gl_FogFragCoord`.
///
/// Returns true if the injected code needs the legacy transform matrices.
pub(crate) fn emulate_fog(t: &mut Transformations, ctx: &PatchContext, epilogue: &mut Vec<String>) -> bool {
    t.define("gl_Fog", "iris_Fog");
    t.inject_line(InjectionPoint::BeforeCode, FOG_STRUCT);
    if ctx.fog == FogMode::Off {
        t.define("iris_Fog", "iris_FogParameters(vec4(0.0), 0.0, 0.0, 1.0, 1.0)");
    } else {
        for uniform in [
            "uniform vec4 iris_FogColor;",
            "uniform float iris_FogDensity;",
            "uniform float iris_FogStart;",
            "uniform float iris_FogEnd;",
        ] {
            t.inject_line(InjectionPoint::BeforeCode, uniform);
        }
        t.define(
            "iris_Fog",
            "iris_FogParameters(iris_FogColor, iris_FogDensity, iris_FogStart, iris_FogEnd, 1.0 / (iris_FogEnd - iris_FogStart))",
        );
    }

    let uses_fog_coord = t.contains_token("gl_FogFragCoord");
    let declare_local = |t: &mut Transformations| {
        t.inject_line(InjectionPoint::BeforeCode, "float iris_FogFragCoord;");
        t.define("gl_FogFragCoord", "iris_FogFragCoord");
    };
    match (ctx.stage, ctx.fog) {
        (ShaderStage::Vertex, FogMode::PerVertex) => {
            t.inject_line(InjectionPoint::BeforeCode, "out float iris_FogFragCoord;");
            t.define("gl_FogFragCoord", "iris_FogFragCoord");
            if !uses_fog_coord {
                epilogue.push("iris_FogFragCoord = length((gl_ModelViewMatrix * gl_Vertex).xyz);".to_owned());
                return true;
            }
            false
        }
        (ShaderStage::Vertex, FogMode::PerFragment) => {
            t.inject_line(InjectionPoint::BeforeCode, "out vec3 iris_FogViewPos;");
            if uses_fog_coord {
                declare_local(t);
            }
            epilogue.push("iris_FogViewPos = (gl_ModelViewMatrix * gl_Vertex).xyz;".to_owned());
            true
        }
        (ShaderStage::Fragment, _) if !uses_fog_coord => false,
        (ShaderStage::Fragment, FogMode::Off) => {
            t.define("gl_FogFragCoord", "0.0");
            false
        }
        (ShaderStage::Fragment, FogMode::PerVertex) => {
            t.inject_line(InjectionPoint::BeforeCode, "in float iris_FogFragCoord;");
            t.define("gl_FogFragCoord", "iris_FogFragCoord");
            false
        }
        (ShaderStage::Fragment, FogMode::PerFragment) => {
            t.inject_line(InjectionPoint::BeforeCode, "in vec3 iris_FogViewPos;");
            t.define("gl_FogFragCoord", "length(iris_FogViewPos)");
            false
        }
        _ => {
            if uses_fog_coord {
                declare_local(t);
            }
            false
        }
    }
}

/// Expand each line vertex to one side of a screen-space quad, after the pack's `main` has set `gl_Position`.
///
/// `gl_Normal` holds the vector to the other end of the line.
pub(crate) fn expand_lines(t: &mut Transformations, epilogue: &mut Vec<String>) {
    t.inject_line(InjectionPoint::BeforeCode, "uniform float iris_LineWidth;");
    t.inject_line(InjectionPoint::BeforeCode, "uniform vec2 iris_ScreenSize;");
    for line in LINE_EXPANSION {
        t.inject_line(InjectionPoint::End, line);
    }
    epilogue.push("iris_ExpandLine();".to_owned());
}

/// Define the legacy matrices the source uses, declaring the uniforms they need.
///
/// With `force_transform`, the model-view and projection matrices are defined even if unused.
pub(crate) fn declare_matrices(t: &mut Transformations, matrices: &Matrices, force_transform: bool) {
    let mut used: Vec<(&str, LegacyMatrix)> = LEGACY_MATRICES
        .entries()
        .filter(|(name, matrix)| {
            t.contains_token(name)
                || (force_transform && matches!(matrix, LegacyMatrix::ModelView | LegacyMatrix::Projection))
        })
        .map(|(name, matrix)| (*name, *matrix))
        .collect();
    used.sort_by_key(|(name, _)| *name);

    let mv = matrices.model_view.expression();
    let p = matrices.projection.expression();
    let (mut uses_mv, mut uses_p, mut uses_normal) = (false, false, false);
    for (name, matrix) in used {
        let expression = match matrix {
            LegacyMatrix::ModelView => {
                uses_mv = true;
                mv.to_owned()
            }
            LegacyMatrix::Projection => {
                uses_p = true;
                p.to_owned()
            }
            LegacyMatrix::ModelViewProjection => {
                uses_mv = true;
                uses_p = true;
                format!("({} * {})", p, mv)
            }
            LegacyMatrix::Normal => {
                uses_normal = true;
                matrices.normal.expression().to_owned()
            }
            LegacyMatrix::ModelViewInverse => {
                uses_mv = true;
                format!("inverse({})", mv)
            }
            LegacyMatrix::ProjectionInverse => {
                uses_p = true;
                format!("inverse({})", p)
            }
            LegacyMatrix::ModelViewProjectionInverse => {
                uses_mv = true;
                uses_p = true;
                format!("inverse({} * {})", p, mv)
            }
        };
        t.define(name, &expression);
    }
    if uses_mv {
        matrices.model_view.declare(t, "mat4");
    }
    if uses_p {
        matrices.projection.declare(t, "mat4");
    }
    if uses_normal {
        matrices.normal.declare(t, "mat3");
    }

    if t.contains("gl_TextureMatrix[0]") {
        t.replace_exact("gl_TextureMatrix[0]", matrices.texture.expression());
        matrices.texture.declare(t, "mat4");
    }
    if t.contains("gl_TextureMatrix[1]") {
        t.replace_exact("gl_TextureMatrix[1]", "iris_LightmapTextureMatrix");
        t.inject_line(InjectionPoint::BeforeCode, LIGHTMAP_TEXTURE_MATRIX);
    }
}

/// Provide wrappers for the legacy texture functions the source calls
pub(crate) fn declare_texture_functions(t: &mut Transformations, stage: ShaderStage) {
    let mut used: Vec<(&str, &TextureFunction)> = TEXTURE_FUNCTIONS
        .entries()
        .filter(|(name, _)| t.contains_token(name))
        .map(|(name, function)| (*name, function))
        .collect();
    used.sort_by_key(|(name, _)| *name);

    for (_, function) in used {
        for wrapper in function.wrappers {
            t.inject_line(InjectionPoint::BeforeFunctions, *wrapper);
        }
        if stage == ShaderStage::Fragment {
            for wrapper in function.fragment_wrappers {
                t.inject_line(InjectionPoint::BeforeFunctions, *wrapper);
            }
        }
    }
}

/// The discard statement for an alpha test, or None if nothing should be tested
pub(crate) fn alpha_test_statement(t: &Transformations, alpha: AlphaTest) -> Option<String> {
    let condition = match alpha {
        AlphaTest::Off => return None,
        AlphaTest::NonZero => "== 0.0".to_owned(),
        AlphaTest::GreaterThan(reference) => format!("<= {:?}", reference),
    };
    let target = if t.contains_token("gl_FragData") || t.contains_token("gl_FragColor") {
        "iris_FragData[0]".to_owned()
    } else if let Some(name) = t.body().lines().find_map(parse_location_zero_output) {
        name.to_owned()
    } else {
        warn!("fragment shader has no output at location 0, skipping the alpha test");
        return None;
    };
    Some(format!("if ({}.a {}) discard;", target, condition))
}

/// Rename the pack's `main` to `irisMain`, and add a `main` that calls it followed by `epilogue`
pub(crate) fn wrap_main(t: &mut Transformations, epilogue: &[String]) -> Result<(), PatchErrorKind> {
    if t.contains_token("irisMain") {
        return Err(PatchErrorKind::DuplicateIrisMainSymbol);
    }
    t.replace_exact("main", "irisMain");
    t.inject_line(InjectionPoint::End, "void main() {");
    t.inject_line(InjectionPoint::End, "    irisMain();");
    for statement in epilogue {
        t.inject_line(InjectionPoint::End, format!("    {}", statement));
    }
    t.inject_line(InjectionPoint::End, "}");
    Ok(())
}
