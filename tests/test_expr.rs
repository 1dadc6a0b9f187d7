use shaderpack_patcher::expr::{compile, grammar, Associativity, CompiledExpression, ExpressionError, OperatorTable};
use shaderpack_patcher::functions::pure::Fn2;
use shaderpack_patcher::functions::{
    FixedFrameTimer, FunctionContext, FunctionRegistry, Type, UniformMap, Value,
};

fn compile_with(text: &str, registry: &FunctionRegistry, uniforms: &UniformMap) -> CompiledExpression {
    compile(text, OperatorTable::default_table(), registry, uniforms).expect("Compile failure")
}

fn eval(text: &str) -> Value {
    let registry = FunctionRegistry::with_builtins();
    let uniforms = UniformMap::new();
    let mut expr = compile_with(text, &registry, &uniforms);
    expr.evaluate(&FunctionContext::new(&uniforms, &FixedFrameTimer(0.016)))
}

fn compile_err(text: &str) -> ExpressionError {
    let registry = FunctionRegistry::with_builtins();
    compile(text, OperatorTable::default_table(), &registry, &UniformMap::new()).unwrap_err()
}

#[test]
fn test_precedence() {
    assert_eq!(eval("1 + 2 * 3"), Value::Int(7));
    assert_eq!(eval("(1 + 2) * 3"), Value::Int(9));
    assert_eq!(eval("10 - 4 - 3"), Value::Int(3));
    assert_eq!(eval("-2 * 3 + 1"), Value::Int(-5));
    assert_eq!(eval("1 < 2 && 3 >= 3 || false"), Value::Bool(true));
    assert_eq!(eval("!(1 == 1)"), Value::Bool(false));
}

#[test]
fn test_parse_tree_display() {
    let node = grammar::parse("1 + 2 * x.y", OperatorTable::default_table()).unwrap();
    assert_eq!(node.to_string(), "add(1, multiply(2, <access$1>(x)))");
}

#[test]
fn test_custom_operator_table() {
    let mut table = OperatorTable::new();
    table.add_binary("+", "add", 1, Associativity::Left);
    table.add_binary("mod", "fmod", 2, Associativity::Left);
    table.add_binary("^", "pow", 3, Associativity::Right);
    table.add_unary("not", "not");

    let node = grammar::parse("2 ^ 3 ^ 2 + 7 mod 3", &table).unwrap();
    assert_eq!(node.to_string(), "add(pow(2, pow(3, 2)), fmod(7, 3))");

    let registry = FunctionRegistry::with_builtins();
    let uniforms = UniformMap::new();
    let context = FunctionContext::new(&uniforms, &FixedFrameTimer(0.0));
    let mut expr = compile("2 ^ 3 ^ 2 + 7 mod 3", &table, &registry, &uniforms).unwrap();
    assert_eq!(expr.evaluate(&context), Value::Float(513.0));
    let mut expr = compile("not false", &table, &registry, &uniforms).unwrap();
    assert_eq!(expr.evaluate(&context), Value::Bool(true));

    // Symbols of the default table mean nothing here
    assert!(matches!(
        compile("1 * 2", &table, &registry, &uniforms),
        Err(ExpressionError::UnexpectedCharacter { ch: '*', position: 2 })
    ));
}

#[test]
fn test_deep_nesting_is_an_error() {
    let nested = format!("{}1{}", "(".repeat(20000), ")".repeat(20000));
    assert!(matches!(
        compile_err(&nested),
        ExpressionError::MalformedExpression { reason: "expression nested too deeply", .. }
    ));
    assert_eq!(eval(&format!("{}1{}", "(".repeat(64), ")".repeat(64))), Value::Int(1));
}

#[test]
fn test_int_min_literal() {
    assert_eq!(eval("-2147483648"), Value::Int(i32::MIN));
    assert_eq!(eval("-2 * 3"), Value::Int(-6));
}

#[test]
fn test_fmod() {
    assert_eq!(eval("fmod(-1.0, 3.0)"), Value::Float(2.0));
    assert_eq!(eval("fmod(-1, 3)"), Value::Int(2));
    assert_eq!(eval("fmod(5.5, 2.0)"), Value::Float(1.5));
}

#[test]
fn test_integer_arithmetic() {
    assert_eq!(eval("7 / 2"), Value::Int(3));
    assert_eq!(eval("7 % 3"), Value::Int(1));
    assert_eq!(eval("7 / 0"), Value::Int(0));
    assert_eq!(eval("7 % 0"), Value::Int(0));
}

#[test]
fn test_rounding_keeps_type() {
    assert_eq!(eval("floor(2.7)"), Value::Float(2.0));
    assert_eq!(eval("ceil(2.2)"), Value::Float(3.0));
    assert_eq!(eval("round(2.5)"), Value::Float(3.0));
    assert_eq!(eval("round(-2.5)"), Value::Float(-2.0));
    assert_eq!(eval("floor(4)"), Value::Int(4));
}

#[test]
fn test_implicit_cast_resolution() {
    let mut registry = FunctionRegistry::with_builtins();
    registry.add_scalar("addFloats", Fn2::new(|a: f32, b: f32| a + b));

    let resolution = registry.find_overload("addFloats", &[Type::INT, Type::INT]).unwrap();
    assert_eq!(resolution.overload.signature().return_type, Type::FLOAT);
    assert!(resolution.casts.iter().all(Option::is_some));

    let uniforms = UniformMap::new();
    let mut expr = compile_with("addFloats(1, 2)", &registry, &uniforms);
    assert_eq!(expr.ty(), Type::FLOAT);
    assert_eq!(
        expr.evaluate(&FunctionContext::new(&uniforms, &FixedFrameTimer(0.0))),
        Value::Float(3.0)
    );
}

#[test]
fn test_exact_match_wins() {
    assert_eq!(eval("1 + 2"), Value::Int(3));
    assert_eq!(eval("1 + 2.5"), Value::Float(3.5));
    assert_eq!(eval("pow(2, 3)"), Value::Float(8.0));
}

#[test]
fn test_vectorized_equals_reduces() {
    assert_eq!(eval("equals(vec3(1.0, 2.0, 3.0), vec3(1.0, 2.0, 3.0))"), Value::Bool(true));
    assert_eq!(eval("equals(vec3(1.0, 2.0, 3.0), vec3(1.0, 2.0, 4.0))"), Value::Bool(false));
    assert_eq!(eval("vec3(1.0, 2.0, 3.0) == vec3(1.0, 2.0, 3.0)"), Value::Bool(true));
}

#[test]
fn test_vectors() {
    assert_eq!(eval("vec2(1, 2) * 2.0"), Value::vec2(2.0, 4.0));
    assert_eq!(eval("vec3(1.0, 2.0, 3.0).z"), Value::Float(3.0));
    assert_eq!(eval("vec4(1.0, 2.0, 3.0, 4.0).g"), Value::Float(2.0));
    assert_eq!(eval("dot(vec3(1.0, 0.0, 0.0), vec3(0.5, 1.0, 0.0))"), Value::Float(0.5));
    assert_eq!(eval("length(vec2(3.0, 4.0))"), Value::Float(5.0));
    assert_eq!(
        eval("cross(vec3(1.0, 0.0, 0.0), vec3(0.0, 1.0, 0.0))"),
        Value::vec3(0.0, 0.0, 1.0)
    );
}

#[test]
fn test_conditionals() {
    assert_eq!(eval("if(1 > 2, 10, 20)"), Value::Int(20));
    assert_eq!(eval("if(false, 1.0, true, 2.0, 3.0)"), Value::Float(2.0));
    assert_eq!(eval("between(5, 1, 10)"), Value::Bool(true));
    assert_eq!(eval("in(3, 1, 2, 3)"), Value::Bool(true));
    assert_eq!(eval("in(4, 1, 2, 3)"), Value::Bool(false));
    assert_eq!(eval("max(1, 7, 3)"), Value::Int(7));
    assert_eq!(eval("min(2.0, -1.0)"), Value::Float(-1.0));
    assert_eq!(eval("clamp(5.0, 0.0, 1.0)"), Value::Float(1.0));
}

#[test]
fn test_constants() {
    assert_eq!(eval("pi"), Value::Float(std::f32::consts::PI));
    assert_eq!(eval("true && !false"), Value::Bool(true));
}

#[test]
fn test_smooth_first_sample() {
    let registry = FunctionRegistry::with_builtins();
    let mut uniforms = UniformMap::new();
    uniforms.set("x", Value::Float(4.0));
    let mut expr = compile_with("smooth(x)", &registry, &uniforms);
    let timer = FixedFrameTimer(1.0);

    assert_eq!(expr.evaluate(&FunctionContext::new(&uniforms, &timer)), Value::Float(4.0));
    uniforms.set("x", Value::Float(0.0));
    // Default half-life of one second over one second halves the distance
    let halved = expr.evaluate(&FunctionContext::new(&uniforms, &timer)).as_float().unwrap();
    assert!((halved - 2.0).abs() < 1e-4, "{}", halved);
}

#[test]
fn test_smooth_zero_half_life_snaps() {
    let registry = FunctionRegistry::with_builtins();
    let mut uniforms = UniformMap::new();
    uniforms.set("x", Value::Float(0.0));
    let mut expr = compile_with("smooth(x, 0.0, 1.0)", &registry, &uniforms);
    let timer = FixedFrameTimer(1.0);
    let mut step = |uniforms: &mut UniformMap, x: f32| {
        uniforms.set("x", Value::Float(x));
        expr.evaluate(&FunctionContext::new(&*uniforms, &timer)).as_float().unwrap()
    };

    assert_eq!(step(&mut uniforms, 0.0), 0.0);
    assert_eq!(step(&mut uniforms, 10.0), 10.0);
    let down = step(&mut uniforms, 0.0);
    assert!((down - 5.0).abs() < 1e-4, "{}", down);
}

#[test]
fn test_smooth_state_is_per_call_site() {
    let registry = FunctionRegistry::with_builtins();
    let mut uniforms = UniformMap::new();
    uniforms.set("x", Value::Float(8.0));
    let mut expr = compile_with("smooth(x) - smooth(x, 0.0)", &registry, &uniforms);
    let timer = FixedFrameTimer(1.0);

    assert_eq!(expr.evaluate(&FunctionContext::new(&uniforms, &timer)), Value::Float(0.0));
    uniforms.set("x", Value::Float(0.0));
    let difference = expr.evaluate(&FunctionContext::new(&uniforms, &timer)).as_float().unwrap();
    assert!((difference - 4.0).abs() < 1e-4, "{}", difference);
}

#[test]
fn test_uniforms() {
    let registry = FunctionRegistry::with_builtins();
    let mut uniforms = UniformMap::new();
    uniforms.set("sunAngle", Value::Float(0.25));
    uniforms.set("cameraPosition", Value::vec3(1.0, 2.0, 3.0));
    let mut expr = compile_with("sunAngle * 4.0 + cameraPosition.y", &registry, &uniforms);
    assert_eq!(
        expr.evaluate(&FunctionContext::new(&uniforms, &FixedFrameTimer(0.0))),
        Value::Float(3.0)
    );
}

#[test]
fn test_errors() {
    assert_eq!(
        compile_err("1 + $"),
        ExpressionError::UnexpectedCharacter { ch: '$', position: 4 }
    );
    assert!(matches!(compile_err(""), ExpressionError::MalformedExpression { .. }));
    assert!(matches!(compile_err("(1 + 2"), ExpressionError::MalformedExpression { .. }));
    assert!(matches!(compile_err("1 2"), ExpressionError::MalformedExpression { position: 2, .. }));
    assert_eq!(
        compile_err("foo + 1"),
        ExpressionError::UnknownVariable {
            name: "foo".to_owned(),
            position: 0
        }
    );
    assert!(matches!(
        compile_err("sqrt(true)"),
        ExpressionError::NoMatchingOverload { position: 0, .. }
    ));
}
