//! Custom uniforms: values a shader pack derives from the host's uniforms with expressions.
//!
//! A pack declares them in its properties file as
//! ```text
//! uniform.float.sunHeight = sin(sunAngle * 2.0 * pi)
//! variable.vec3.skyTint = vec3(0.2, 0.4, 0.9) * smooth(rainStrength, 4.0)
//! ```
//! `uniform.*` entries are bound to programs, `variable.*` entries are only visible to later entries.

use thiserror::Error;
use tracing::{debug, warn};

use crate::{
    expr::{compile, syntax::OperatorTable, CompiledExpression, ExpressionError},
    functions::{
        ChainedUniforms, FunctionContext, FunctionRegistry, FunctionReturn, Type, UniformMap, UniformValueProvider,
        Value,
    },
    program::UniformBinder,
    transform::grammar::is_identifier_char,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EntryKind {
    /// Bound to every program
    Uniform,
    /// Only readable by other entries
    Variable,
}

/// One `<kind>.<type>.<name> = <expression>` line
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Declaration {
    pub kind: EntryKind,
    pub ty: Type,
    pub name: String,
    pub expression: String,
}

#[derive(Debug, Error, Clone, PartialEq)]
pub enum CustomUniformError {
    #[error("malformed declaration '{0}'")]
    MalformedDeclaration(String),
    #[error("'{name}' has unsupported type '{ty}'")]
    UnsupportedType { name: String, ty: String },
    #[error("'{0}' is already declared")]
    Redeclared(String),
    #[error("'{name}' is declared as {declared} but its expression has type {actual}")]
    TypeMismatch { name: String, declared: Type, actual: Type },
    #[error("in the expression of '{name}': {source}")]
    Expression { name: String, source: ExpressionError },
}

/// Types a custom uniform may be declared with
fn declared_type(name: &str) -> Option<Type> {
    match name {
        "bool" | "int" | "float" | "vec2" | "vec3" | "vec4" => Type::from_name(name),
        _ => None,
    }
}

/// Parse one properties line.
///
/// Returns None for lines that don't declare a custom uniform.
pub fn parse_declaration(line: &str) -> Option<Result<Declaration, CustomUniformError>> {
    let line = line.trim();
    let kind = if line.starts_with("uniform.") {
        EntryKind::Uniform
    } else if line.starts_with("variable.") {
        EntryKind::Variable
    } else {
        return None;
    };
    let malformed = || CustomUniformError::MalformedDeclaration(line.to_owned());

    let parse = || {
        let (key, expression) = line.split_once('=').ok_or_else(malformed)?;
        let mut parts = key.trim().splitn(3, '.').skip(1);
        let (ty, name) = match (parts.next(), parts.next()) {
            (Some(ty), Some(name)) => (ty, name),
            _ => return Err(malformed()),
        };
        if name.is_empty() || name.starts_with(|c: char| c.is_ascii_digit()) || !name.chars().all(is_identifier_char) {
            return Err(malformed());
        }
        let ty = declared_type(ty).ok_or_else(|| CustomUniformError::UnsupportedType {
            name: name.to_owned(),
            ty: ty.to_owned(),
        })?;
        Ok(Declaration {
            kind,
            ty,
            name: name.to_owned(),
            expression: expression.trim().to_owned(),
        })
    };
    Some(parse())
}

/// Split properties text into logical lines, joining lines continued with a trailing backslash
fn logical_lines(source: &str) -> Vec<String> {
    let mut lines = vec![];
    let mut current = String::new();
    for line in source.lines() {
        match line.trim_end().strip_suffix('\\') {
            Some(continued) => current.push_str(continued),
            None => {
                current.push_str(line);
                lines.push(std::mem::take(&mut current));
            }
        }
    }
    if !current.is_empty() {
        lines.push(current);
    }
    lines
}

#[derive(Debug)]
struct Entry {
    kind: EntryKind,
    name: String,
    expression: CompiledExpression,
}

/// The compiled custom uniforms of a pack, with their values as of the last [CustomUniforms::update]
#[derive(Debug, Default)]
pub struct CustomUniforms {
    entries: Vec<Entry>,
    values: UniformMap,
}

impl CustomUniforms {
    /// Compile every declaration in a properties file. Lines that aren't declarations are ignored.
    pub fn from_properties(
        source: &str,
        table: &OperatorTable,
        registry: &FunctionRegistry,
        host: &dyn UniformValueProvider,
    ) -> Self {
        let declarations = logical_lines(source)
            .iter()
            .filter(|line| !line.trim_start().starts_with('#'))
            .filter_map(|line| parse_declaration(line))
            .filter_map(|declaration| match declaration {
                Ok(declaration) => Some(declaration),
                Err(err) => {
                    warn!(error = %err, "skipping custom uniform");
                    None
                }
            })
            .collect::<Vec<_>>();
        Self::compile(declarations, table, registry, host)
    }

    /// Compile declarations in order.
    ///
    /// Each may reference the host's uniforms and the entries before it. Entries that fail to compile are logged and
    /// skipped.
    pub fn compile(
        declarations: impl IntoIterator<Item = Declaration>,
        table: &OperatorTable,
        registry: &FunctionRegistry,
        host: &dyn UniformValueProvider,
    ) -> Self {
        let mut uniforms = Self::default();
        for declaration in declarations {
            match uniforms.compile_entry(&declaration, table, registry, host) {
                Ok(entry) => {
                    debug!(uniform = %entry.name, ty = %declaration.ty, "compiled custom uniform");
                    // Placeholder so later entries resolve against the right type
                    uniforms.values.set(entry.name.clone(), Value::zero(declaration.ty));
                    uniforms.entries.push(entry);
                }
                Err(err) => warn!(uniform = %declaration.name, error = %err, "skipping custom uniform"),
            }
        }
        uniforms
    }

    fn compile_entry(
        &self,
        declaration: &Declaration,
        table: &OperatorTable,
        registry: &FunctionRegistry,
        host: &dyn UniformValueProvider,
    ) -> Result<Entry, CustomUniformError> {
        let name = &declaration.name;
        if self.values.get(name).is_some() {
            return Err(CustomUniformError::Redeclared(name.clone()));
        }
        let scope = ChainedUniforms {
            first: &self.values,
            second: host,
        };
        let expression = compile(&declaration.expression, table, registry, &scope).map_err(|source| {
            CustomUniformError::Expression {
                name: name.clone(),
                source,
            }
        })?;
        let expression =
            expression
                .coerce(declaration.ty, registry)
                .map_err(|expression| CustomUniformError::TypeMismatch {
                    name: name.clone(),
                    declared: declaration.ty,
                    actual: expression.ty(),
                })?;
        Ok(Entry {
            kind: declaration.kind,
            name: name.clone(),
            expression,
        })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Names of the compiled entries, in evaluation order
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.entries.iter().map(|e| e.name.as_str())
    }

    /// The value of an entry as of the last update
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.values.get(name)
    }

    /// Evaluate every entry once, in declaration order. Call once per frame.
    pub fn update(&mut self, context: &FunctionContext) {
        for entry in self.entries.iter_mut() {
            let value = {
                let scope = ChainedUniforms {
                    first: &self.values,
                    second: context.uniforms,
                };
                entry.expression.evaluate(&FunctionContext::new(&scope, context.timer))
            };
            self.values.set(entry.name.clone(), value);
        }
    }

    /// Push the current value of every `uniform.*` entry to a program
    pub fn bind(&self, binder: &mut dyn UniformBinder) {
        for entry in self.entries.iter().filter(|e| e.kind == EntryKind::Uniform) {
            if let Some(value) = self.values.get(&entry.name) {
                binder.bind(&entry.name, value);
            }
        }
    }
}

impl UniformValueProvider for CustomUniforms {
    fn uniform_type(&self, name: &str) -> Option<Type> {
        self.values.uniform_type(name)
    }

    fn write_uniform(&self, name: &str, out: &mut FunctionReturn) -> bool {
        self.values.write_uniform(name, out)
    }
}
