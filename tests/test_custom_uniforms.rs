use std::collections::BTreeMap;

use shaderpack_patcher::expr::OperatorTable;
use shaderpack_patcher::functions::{
    FixedFrameTimer, FunctionContext, FunctionRegistry, Type, UniformMap, UniformValueProvider, Value,
};
use shaderpack_patcher::patcher::{PatchErrorKind, PatchParameters, PatchedProgram, ProgramSource, ShaderStage};
use shaderpack_patcher::program::{
    build_program, Pipeline, ProgramError, ShaderCompileFailure, ShaderCompiler, UniformBinder,
};
use shaderpack_patcher::uniforms::CustomUniforms;

const PROPERTIES: &str = "
# Derived uniforms
sliders = SUN_STRENGTH
variable.float.dayFactor = clamp(sunAngle * 4.0, 0.0, 1.0)
uniform.float.sunStrength = dayFactor * 2
uniform.vec3.skyTint = vec3(0.2, 0.4, 0.9) * \\
    dayFactor
uniform.int.frameParity = frameCounter % 2
uniform.vec2.broken = vec3(1.0)
uniform.float.unknown = missing + 1.0
uniform.float.sunStrength = 3.0
";

#[derive(Default)]
struct RecordingBinder {
    bound: BTreeMap<String, Value>,
}
impl UniformBinder for RecordingBinder {
    fn bind(&mut self, name: &str, value: &Value) {
        self.bound.insert(name.to_owned(), value.clone());
    }
}

fn host_uniforms(sun_angle: f32, frame: i32) -> UniformMap {
    let mut uniforms = UniformMap::new();
    uniforms.set("sunAngle", Value::Float(sun_angle));
    uniforms.set("frameCounter", Value::Int(frame));
    uniforms
}

fn compile_properties(host: &UniformMap) -> CustomUniforms {
    let registry = FunctionRegistry::with_builtins();
    CustomUniforms::from_properties(PROPERTIES, OperatorTable::default_table(), &registry, host)
}

#[test]
fn test_failed_entries_are_skipped() {
    let uniforms = compile_properties(&host_uniforms(0.0, 0));
    assert_eq!(
        uniforms.names().collect::<Vec<_>>(),
        vec!["dayFactor", "sunStrength", "skyTint", "frameParity"]
    );
}

#[test]
fn test_update_and_bind() {
    let host = host_uniforms(0.125, 3);
    let mut uniforms = compile_properties(&host);
    uniforms.update(&FunctionContext::new(&host, &FixedFrameTimer(0.016)));

    assert_eq!(uniforms.get("dayFactor"), Some(&Value::Float(0.5)));
    // The int literal is cast for the float multiply
    assert_eq!(uniforms.get("sunStrength"), Some(&Value::Float(1.0)));
    assert_eq!(uniforms.get("frameParity"), Some(&Value::Int(1)));
    assert_eq!(uniforms.uniform_type("skyTint"), Some(Type::vec(3)));

    let mut binder = RecordingBinder::default();
    uniforms.bind(&mut binder);
    // Variables stay internal
    assert_eq!(
        binder.bound.keys().map(String::as_str).collect::<Vec<_>>(),
        vec!["frameParity", "skyTint", "sunStrength"]
    );
    assert_eq!(binder.bound["skyTint"], Value::vec3(0.1, 0.2, 0.45));
}

#[test]
fn test_values_follow_host() {
    let host = host_uniforms(0.0, 0);
    let mut uniforms = compile_properties(&host);
    uniforms.update(&FunctionContext::new(&host, &FixedFrameTimer(0.016)));
    assert_eq!(uniforms.get("sunStrength"), Some(&Value::Float(0.0)));

    let host = host_uniforms(1.0, 0);
    uniforms.update(&FunctionContext::new(&host, &FixedFrameTimer(0.016)));
    assert_eq!(uniforms.get("dayFactor"), Some(&Value::Float(1.0)));
    assert_eq!(uniforms.get("sunStrength"), Some(&Value::Float(2.0)));
}

struct FakeCompiler {
    info_log: Option<String>,
    compiled: Vec<PatchedProgram>,
}
impl ShaderCompiler for FakeCompiler {
    type Handle = usize;

    fn compile(&mut self, name: &str, sources: &PatchedProgram) -> Result<usize, ShaderCompileFailure> {
        if let Some(info_log) = &self.info_log {
            return Err(ShaderCompileFailure {
                program: name.to_owned(),
                info_log: info_log.clone(),
            });
        }
        self.compiled.push(sources.clone());
        Ok(self.compiled.len())
    }
}

#[test]
fn test_build_program() {
    let program = ProgramSource::new("composite1")
        .with_stage(ShaderStage::Vertex, "#version 120\nvoid main() { gl_Position = ftransform(); }\n")
        .with_stage(ShaderStage::Fragment, "#version 120\nvoid main() { gl_FragData[0] = vec4(1.0); }\n");
    let mut compiler = FakeCompiler {
        info_log: None,
        compiled: vec![],
    };
    let handle = build_program(&mut compiler, Pipeline::Composite, &program, &PatchParameters::default()).unwrap();
    assert_eq!(handle, 1);
    assert_eq!(compiler.compiled[0].len(), 2);
    assert!(compiler.compiled[0][&ShaderStage::Fragment].contains("// patched for the composite pipeline"));

    compiler.info_log = Some("0:3: error".to_owned());
    let err = build_program(&mut compiler, Pipeline::Vanilla, &program, &PatchParameters::default()).unwrap_err();
    assert_eq!(
        err,
        ProgramError::Compile(ShaderCompileFailure {
            program: "composite1".to_owned(),
            info_log: "0:3: error".to_owned(),
        })
    );

    let broken = ProgramSource::new("gbuffers_water").with_stage(ShaderStage::Fragment, "#version 330 core\n");
    match build_program(&mut compiler, Pipeline::Alternate, &broken, &PatchParameters::default()) {
        Err(ProgramError::Patch(err)) => assert_eq!(err.kind, PatchErrorKind::AlreadyCoreProfile),
        other => panic!("unexpected result {:?}", other),
    }
}
