use shaderpack_patcher::patcher::{
    patch_alternate, patch_composite, patch_vanilla, AlphaTest, FogMode, PatchError, PatchErrorKind,
    PatchParameters, ProgramSource, ShaderStage, VertexAttributes, VertexFormatDescriptor,
};

const VERTEX: &str = "#version 120

varying vec4 color;
varying vec3 normal;

void main() {
    gl_Position = ftransform();
    color = gl_Color;
    normal = gl_NormalMatrix * gl_Normal;
}
";

const FRAGMENT: &str = "#version 120

uniform sampler2D tex;
varying vec4 color;

void main() {
    gl_FragColor = texture2D(tex, gl_TexCoord[0].st) * color;
}
";

fn patch_stage(stage: ShaderStage, source: &str, parameters: &PatchParameters) -> Result<String, PatchError> {
    let program = ProgramSource::new("gbuffers_terrain").with_stage(stage, source);
    patch_vanilla(&program, parameters).map(|mut patched| patched.remove(&stage).unwrap())
}

fn patch_kind(stage: ShaderStage, source: &str) -> PatchErrorKind {
    patch_stage(stage, source, &PatchParameters::default()).unwrap_err().kind
}

#[test]
fn test_version_normalization() {
    let patched = patch_stage(ShaderStage::Vertex, VERTEX, &PatchParameters::default()).unwrap();
    assert!(patched.starts_with("#version 150 core\n"), "{}", patched);

    let patched = patch_stage(
        ShaderStage::Fragment,
        "#version 330 compatibility\nout vec4 c;\nvoid main() { c = vec4(1.0); }\n",
        &PatchParameters::default(),
    )
    .unwrap();
    assert!(patched.starts_with("#version 330 core\n"), "{}", patched);
}

#[test]
fn test_core_profile_rejected() {
    assert_eq!(
        patch_kind(ShaderStage::Fragment, "#version 330 core\nvoid main() {}\n"),
        PatchErrorKind::AlreadyCoreProfile
    );
}

#[test]
fn test_missing_version() {
    assert_eq!(
        patch_kind(ShaderStage::Fragment, "void main() {}\n"),
        PatchErrorKind::MissingVersionDirective
    );
}

#[test]
fn test_reserved_namespace_checked_first() {
    // No #version either, but the namespace guard runs before anything else
    assert_eq!(
        patch_kind(ShaderStage::Vertex, "uniform float a;\nuniform float iris_b;\n"),
        PatchErrorKind::ReservedNamespaceCollision {
            line: 2,
            text: "uniform float iris_b;".to_owned()
        }
    );
}

#[test]
fn test_error_names_program_and_stage() {
    let err = patch_stage(ShaderStage::Fragment, "#version 330 core\n", &PatchParameters::default()).unwrap_err();
    assert_eq!(err.program, "gbuffers_terrain");
    assert_eq!(err.stage, ShaderStage::Fragment);
    assert_eq!(
        err.to_string(),
        "couldn't patch the fragment shader of program 'gbuffers_terrain': shader already declares the core profile"
    );
}

#[test]
fn test_attribute_gating() {
    for has_color in [false, true] {
        for has_normal in [false, true] {
            let mut attributes = VertexAttributes::TEXCOORD | VertexAttributes::LIGHTMAP;
            attributes.set(VertexAttributes::COLOR, has_color);
            attributes.set(VertexAttributes::NORMAL, has_normal);
            let parameters = PatchParameters {
                attributes,
                ..PatchParameters::default()
            };
            let patched = patch_stage(ShaderStage::Vertex, VERTEX, &parameters).unwrap();

            assert_eq!(patched.contains("in vec4 iris_Color;"), has_color, "{}", patched);
            assert_eq!(patched.contains("#define gl_Color iris_Color\n"), has_color);
            assert_eq!(patched.contains("#define gl_Color vec4(1.0)\n"), !has_color);
            assert_eq!(patched.contains("in vec3 iris_Normal;"), has_normal);
            assert_eq!(patched.contains("#define gl_Normal iris_Normal\n"), has_normal);
            assert_eq!(patched.contains("#define gl_Normal vec3(0.0, 0.0, 1.0)\n"), !has_normal);
            assert!(patched.contains("#define gl_MultiTexCoord1 vec4(0.0, 10.0, 0.0, 1.0)\n"));
        }
    }
}

/// A position + texture + lightmap layout, as used by text rendering
struct TextVertexFormat;
impl VertexFormatDescriptor for TextVertexFormat {
    fn has_attribute(&self, attribute: VertexAttributes) -> bool {
        attribute == VertexAttributes::TEXCOORD || attribute == VertexAttributes::LIGHTMAP
    }
}

#[test]
fn test_attributes_from_format() {
    let attributes = VertexAttributes::from_format(&TextVertexFormat);
    assert_eq!(attributes, VertexAttributes::TEXCOORD | VertexAttributes::LIGHTMAP);

    let parameters = PatchParameters {
        attributes,
        ..PatchParameters::default()
    };
    let patched = patch_stage(ShaderStage::Vertex, VERTEX, &parameters).unwrap();
    assert!(patched.contains("#define gl_Color vec4(1.0)\n"), "{}", patched);
    assert!(patched.contains("#define gl_Normal vec3(0.0, 0.0, 1.0)\n"));
    assert!(patched.contains("#define gl_MultiTexCoord0 vec4(iris_UV0, 0.0, 1.0)\n"));
    assert!(!patched.contains("iris_Color;"));
}

#[test]
fn test_vertex_declarations() {
    let patched = patch_stage(ShaderStage::Vertex, VERTEX, &PatchParameters::default()).unwrap();
    assert!(patched.contains("out vec4 color;"));
    assert!(!patched.contains("varying"));
    assert!(patched.contains("in vec3 iris_Position;"));
    assert!(patched.contains("#define gl_Vertex vec4(iris_Position, 1.0)\n"));
    assert!(patched.contains("#define ftransform() (gl_ProjectionMatrix * gl_ModelViewMatrix * gl_Vertex)\n"));
    assert!(patched.contains("#define gl_ModelViewMatrix iris_ModelViewMat\n"));
    assert!(patched.contains("#define gl_ProjectionMatrix iris_ProjMat\n"));
    assert!(patched.contains("#define gl_NormalMatrix iris_NormalMat\n"));
    assert!(patched.contains("uniform mat4 iris_ModelViewMat;"));
    assert!(patched.contains("uniform mat3 iris_NormalMat;"));
    // Nothing to append to main
    assert!(!patched.contains("irisMain"));
}

#[test]
fn test_chunk_offset() {
    let parameters = PatchParameters {
        has_chunk_offset: true,
        ..PatchParameters::default()
    };
    let patched = patch_stage(ShaderStage::Vertex, VERTEX, &parameters).unwrap();
    assert!(patched.contains("uniform vec3 iris_ChunkOffset;"));
    assert!(patched.contains("#define gl_Vertex vec4(iris_Position + iris_ChunkOffset, 1.0)\n"));
}

#[test]
fn test_matrices_only_when_referenced() {
    let patched = patch_stage(
        ShaderStage::Vertex,
        "#version 150\nin vec3 p;\nvoid main() { gl_Position = gl_ModelViewProjectionMatrix * vec4(p, 1.0); }\n",
        &PatchParameters::default(),
    )
    .unwrap();
    assert!(patched.contains("#define gl_ModelViewProjectionMatrix (iris_ProjMat * iris_ModelViewMat)\n"));
    assert!(patched.contains("uniform mat4 iris_ProjMat;"));
    assert!(!patched.contains("iris_NormalMat"));
    assert!(!patched.contains("#define gl_ModelViewMatrix "));
}

#[test]
fn test_texture_matrices() {
    let patched = patch_stage(
        ShaderStage::Vertex,
        "#version 120\nvoid main() {\n    gl_TexCoord[0] = gl_TextureMatrix[0] * gl_MultiTexCoord0;\n    gl_TexCoord[1] = gl_TextureMatrix[1] * gl_MultiTexCoord2;\n}\n",
        &PatchParameters::default(),
    )
    .unwrap();
    assert!(patched.contains("gl_TexCoord[0] = iris_TextureMat * gl_MultiTexCoord0;"));
    assert!(patched.contains("gl_TexCoord[1] = iris_LightmapTextureMatrix * gl_MultiTexCoord2;"));
    assert!(patched.contains("uniform mat4 iris_TextureMat;"));
    assert!(patched.contains("const mat4 iris_LightmapTextureMatrix"));
    assert!(patched.contains("#define gl_MultiTexCoord2 vec4(iris_UV2, 0.0, 1.0)\n"));
}

#[test]
fn test_fragment_declarations() {
    let patched = patch_stage(ShaderStage::Fragment, FRAGMENT, &PatchParameters::default()).unwrap();
    assert!(patched.contains("in vec4 color;"));
    assert!(patched.contains("out vec4 iris_FragData[8];"));
    assert!(patched.contains("#define gl_FragColor iris_FragData[0]\n"));
    assert!(patched.contains("in vec4 iris_TexCoords[8];"));
    assert!(!patched.contains("iris_FrontColor"));

    let wrapper = "vec4 texture2D(sampler2D s, vec2 c) { return texture(s, c); }";
    let bias_wrapper = "vec4 texture2D(sampler2D s, vec2 c, float b) { return texture(s, c, b); }";
    assert!(patched.contains(wrapper));
    assert!(patched.contains(bias_wrapper));
    // Wrappers go right before the first function
    assert!(patched.find(wrapper).unwrap() < patched.find("void main()").unwrap());
    assert!(patched.find("varying").is_none());
    assert!(!patched.contains("texture2DLod"));
}

#[test]
fn test_bias_wrappers_are_fragment_only() {
    let patched = patch_stage(
        ShaderStage::Vertex,
        "#version 120\nuniform sampler2D t;\nvoid main() { gl_Position = texture2D(t, vec2(0.0)); }\n",
        &PatchParameters::default(),
    )
    .unwrap();
    assert!(patched.contains("vec4 texture2D(sampler2D s, vec2 c) {"));
    assert!(!patched.contains("float b)"));
}

#[test]
fn test_alpha_test_greater_than() {
    let parameters = PatchParameters {
        alpha: AlphaTest::GreaterThan(0.5),
        ..PatchParameters::default()
    };
    let patched = patch_stage(ShaderStage::Fragment, FRAGMENT, &parameters).unwrap();
    assert!(patched.contains("void irisMain() {"), "{}", patched);
    assert!(patched.ends_with(
        "void main() {\n    irisMain();\n    if (iris_FragData[0].a <= 0.5) discard;\n}\n"
    ));
}

#[test]
fn test_alpha_test_off() {
    let parameters = PatchParameters {
        alpha: AlphaTest::Off,
        ..PatchParameters::default()
    };
    let patched = patch_stage(ShaderStage::Fragment, FRAGMENT, &parameters).unwrap();
    assert!(!patched.contains("irisMain"));
    assert!(!patched.contains("discard"));
}

#[test]
fn test_alpha_test_location_zero_output() {
    let parameters = PatchParameters {
        alpha: AlphaTest::NonZero,
        ..PatchParameters::default()
    };
    let patched = patch_stage(
        ShaderStage::Fragment,
        "#version 330\nlayout(location = 0) out vec4 albedo;\nvoid main() { albedo = vec4(1.0); }\n",
        &parameters,
    )
    .unwrap();
    assert!(patched.contains("    if (albedo.a == 0.0) discard;\n"));
    assert!(!patched.contains("iris_FragData"));
}

#[test]
fn test_duplicate_iris_main() {
    let parameters = PatchParameters {
        alpha: AlphaTest::NonZero,
        ..PatchParameters::default()
    };
    let err = patch_stage(
        ShaderStage::Fragment,
        "#version 120\nvoid irisMain() {}\nvoid main() { irisMain(); gl_FragColor = vec4(1.0); }\n",
        &parameters,
    )
    .unwrap_err();
    assert_eq!(err.kind, PatchErrorKind::DuplicateIrisMainSymbol);
}

#[test]
fn test_fog_off() {
    let patched = patch_stage(
        ShaderStage::Fragment,
        "#version 120\nvoid main() { gl_FragColor = mix(vec4(1.0), gl_Fog.color, gl_FogFragCoord); }\n",
        &PatchParameters::default(),
    )
    .unwrap();
    assert!(patched.contains("#define gl_Fog iris_Fog\n"));
    assert!(patched.contains("struct iris_FogParameters {"));
    assert!(patched.contains("#define iris_Fog iris_FogParameters(vec4(0.0), 0.0, 0.0, 1.0, 1.0)\n"));
    assert!(patched.contains("#define gl_FogFragCoord 0.0\n"));
    assert!(!patched.contains("uniform vec4 iris_FogColor;"));
}

#[test]
fn test_fog_per_vertex() {
    let parameters = PatchParameters {
        fog: FogMode::PerVertex,
        ..PatchParameters::default()
    };
    let vertex = patch_stage(ShaderStage::Vertex, VERTEX, &parameters).unwrap();
    assert!(vertex.contains("uniform vec4 iris_FogColor;"));
    assert!(vertex.contains("out float iris_FogFragCoord;"));
    assert!(vertex.contains("    iris_FogFragCoord = length((gl_ModelViewMatrix * gl_Vertex).xyz);\n"));

    // A shader that writes the distance itself is left alone
    let vertex = patch_stage(
        ShaderStage::Vertex,
        "#version 120\nvoid main() { gl_Position = ftransform(); gl_FogFragCoord = 1.0; }\n",
        &parameters,
    )
    .unwrap();
    assert!(!vertex.contains("irisMain"));

    let fragment = patch_stage(
        ShaderStage::Fragment,
        "#version 120\nvoid main() { gl_FragColor = vec4(gl_FogFragCoord); }\n",
        &parameters,
    )
    .unwrap();
    assert!(fragment.contains("in float iris_FogFragCoord;"));
    assert!(fragment.contains("#define gl_FogFragCoord iris_FogFragCoord\n"));
}

#[test]
fn test_fog_per_fragment() {
    let parameters = PatchParameters {
        fog: FogMode::PerFragment,
        ..PatchParameters::default()
    };
    let vertex = patch_stage(ShaderStage::Vertex, VERTEX, &parameters).unwrap();
    assert!(vertex.contains("out vec3 iris_FogViewPos;"));
    assert!(vertex.contains("    iris_FogViewPos = (gl_ModelViewMatrix * gl_Vertex).xyz;\n"));

    let fragment = patch_stage(
        ShaderStage::Fragment,
        "#version 120\nvoid main() { gl_FragColor = vec4(gl_FogFragCoord); }\n",
        &parameters,
    )
    .unwrap();
    assert!(fragment.contains("in vec3 iris_FogViewPos;"));
    assert!(fragment.contains("#define gl_FogFragCoord length(iris_FogViewPos)\n"));
}

#[test]
fn test_line_expansion() {
    let parameters = PatchParameters {
        is_lines: true,
        ..PatchParameters::default()
    };
    let patched = patch_stage(ShaderStage::Vertex, VERTEX, &parameters).unwrap();
    assert!(patched.contains("uniform float iris_LineWidth;"));
    assert!(patched.contains("uniform vec2 iris_ScreenSize;"));
    assert!(patched.contains("void iris_ExpandLine() {"));
    assert!(patched.ends_with("void main() {\n    irisMain();\n    iris_ExpandLine();\n}\n"));
}

#[test]
fn test_extensions_stay_first() {
    let patched = patch_stage(
        ShaderStage::Fragment,
        "#version 120\n#extension GL_ARB_shader_texture_lod : require\nvoid main() { gl_FragColor = vec4(1.0); }\n",
        &PatchParameters::default(),
    )
    .unwrap();
    assert!(patched.starts_with("#version 150 core\n#extension GL_ARB_shader_texture_lod : require\n"));
}

#[test]
fn test_all_stages_are_patched() {
    let program = ProgramSource::new("gbuffers_basic")
        .with_stage(ShaderStage::Vertex, VERTEX)
        .with_stage(ShaderStage::Geometry, "#version 150\nvoid main() {}\n")
        .with_stage(ShaderStage::Fragment, FRAGMENT);
    let patched = patch_vanilla(&program, &PatchParameters::default()).unwrap();
    assert_eq!(
        patched.keys().copied().collect::<Vec<_>>(),
        vec![ShaderStage::Vertex, ShaderStage::Geometry, ShaderStage::Fragment]
    );
    assert!(patched[&ShaderStage::Geometry].starts_with("#version 150 core\n"));
}

#[test]
fn test_alternate_pipeline() {
    let program = ProgramSource::new("gbuffers_terrain").with_stage(ShaderStage::Vertex, VERTEX);
    let patched = patch_alternate(&program, &PatchParameters::default()).unwrap();
    let vertex = &patched[&ShaderStage::Vertex];
    assert!(vertex.contains("in vec4 iris_Pos;"));
    assert!(vertex.contains("layout(std140) uniform iris_ChunkData { iris_DrawParameters iris_Chunks[256]; };"));
    assert!(vertex.contains(
        "#define gl_Vertex vec4(iris_Chunks[int(iris_Pos.w)].offset.xyz + iris_Pos.xyz * iris_ModelScale + iris_CameraTranslation, 1.0)\n"
    ));
    assert!(vertex.contains("#define gl_Color iris_Color\n"));
    // Overlay is never available
    assert!(vertex.contains("#define gl_MultiTexCoord1 vec4(0.0, 10.0, 0.0, 1.0)\n"));
    assert!(vertex.contains("#define gl_ModelViewMatrix iris_ModelViewMatrix\n"));
    assert!(vertex.contains("uniform mat4 iris_ProjectionMatrix;"));
    assert!(vertex.contains("// patched for the alternate pipeline"));
}

#[test]
fn test_composite_pipeline() {
    let vertex = patch_composite(
        "composite",
        "#version 120\nvarying vec2 uv;\nvoid main() {\n    gl_Position = ftransform();\n    uv = gl_MultiTexCoord0.xy;\n}\n",
        ShaderStage::Vertex,
    )
    .unwrap();
    assert!(vertex.contains("#define gl_MultiTexCoord0 vec4(iris_Position.xy, 0.0, 1.0)\n"));
    assert!(vertex.contains("#define gl_ModelViewMatrix mat4(1.0)\n"));
    assert!(vertex.contains(
        "#define gl_ProjectionMatrix mat4(vec4(2.0, 0.0, 0.0, 0.0), vec4(0.0, 2.0, 0.0, 0.0), vec4(0.0), vec4(-1.0, -1.0, 0.0, 1.0))\n"
    ));
    assert!(!vertex.contains("uniform mat4"));
    assert!(!vertex.contains("in vec4 iris_Color;"));

    let fragment = patch_composite(
        "composite",
        "#version 120\nuniform sampler2D colortex0;\nvarying vec2 uv;\nvoid main() {\n    gl_FragData[0] = texture2D(colortex0, uv);\n}\n",
        ShaderStage::Fragment,
    )
    .unwrap();
    assert!(!fragment.contains("discard"));
    assert!(fragment.contains("#define gl_FragData iris_FragData\n"));
}
