//! Text-level editing of a single shader source.
//!
//! A [Transformations] buffer splits a source into its prefix (everything up to and including the `#version` line)
//! and its body, and collects lines injected at fixed [InjectionPoint]s.
//! Injected lines are kept apart from the body until [Transformations::finish], so replacements only ever touch the
//! code that came from the shader pack.

use thiserror::Error;

pub mod grammar;

use grammar::{is_extension_line, is_function_header, is_identifier_char, parse_version_line, VersionDirective};

/// Named insertion points, in the order they are rendered
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum InjectionPoint {
    /// Directly after the `#version` line (and any hoisted `#extension` lines)
    AfterVersion,
    /// Where `#define`s go
    Defines,
    /// Declarations that must precede all of the pack's code
    BeforeCode,
    /// Immediately before the first top-level function of the body
    BeforeFunctions,
    /// After the body
    BeforeEof,
    /// The very end of the source
    End,
}
impl InjectionPoint {
    const COUNT: usize = 6;

    fn index(self) -> usize {
        self as usize
    }
}

#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum TransformError {
    #[error("shader source has no #version directive")]
    MissingVersionDirective,
}

#[derive(Debug, Clone)]
pub struct Transformations {
    prefix: String,
    body: String,
    injections: [Vec<String>; InjectionPoint::COUNT],
}

impl Transformations {
    /// Split a source at its `#version` line.
    ///
    /// `#extension` directives leading the body are moved into the prefix, because no declaration may precede them.
    pub fn new(source: &str) -> Result<Self, TransformError> {
        let mut offset = 0;
        let mut split = None;
        for line in source.split_inclusive('\n') {
            offset += line.len();
            if parse_version_line(line.trim_end()).is_some() {
                split = Some(offset);
                break;
            }
        }
        let split = split.ok_or(TransformError::MissingVersionDirective)?;

        let mut prefix = source[..split].to_owned();
        if !prefix.ends_with('\n') {
            prefix.push('\n');
        }
        let body = &source[split..];

        // Leading block of blank lines, line comments and #extension directives
        let mut hoist_len = 0;
        let mut has_extension = false;
        for line in body.split_inclusive('\n') {
            let trimmed = line.trim();
            if is_extension_line(trimmed) {
                has_extension = true;
            } else if !(trimmed.is_empty() || trimmed.starts_with("//")) {
                break;
            }
            hoist_len += line.len();
        }
        let body = if has_extension {
            prefix.push_str(&body[..hoist_len]);
            if !prefix.ends_with('\n') {
                prefix.push('\n');
            }
            &body[hoist_len..]
        } else {
            body
        };

        Ok(Self {
            prefix,
            body: body.to_owned(),
            injections: Default::default(),
        })
    }

    pub fn prefix(&self) -> &str {
        &self.prefix
    }
    pub fn set_prefix(&mut self, prefix: String) {
        self.prefix = prefix;
    }
    pub fn body(&self) -> &str {
        &self.body
    }

    /// The `#version` directive in the prefix
    pub fn version(&self) -> Option<VersionDirective> {
        self.prefix.lines().find_map(|line| parse_version_line(line.trim_end()))
    }

    /// Replace the `#version` line of the prefix, keeping everything around it
    pub fn set_version_line(&mut self, line: &str) {
        let mut prefix = String::with_capacity(self.prefix.len());
        for l in self.prefix.split_inclusive('\n') {
            if parse_version_line(l.trim_end()).is_some() {
                prefix.push_str(line);
                prefix.push('\n');
            } else {
                prefix.push_str(l);
            }
        }
        self.prefix = prefix;
    }

    /// Plain substring test over the prefix and body
    pub fn contains(&self, needle: &str) -> bool {
        self.prefix.contains(needle) || self.body.contains(needle)
    }

    /// Whole-token test over the body
    pub fn contains_token(&self, token: &str) -> bool {
        find_tokens(&self.body, token).next().is_some()
    }

    /// Replace every whole-token occurrence of `token` in the body
    pub fn replace_exact(&mut self, token: &str, replacement: &str) {
        let matches: Vec<usize> = find_tokens(&self.body, token).collect();
        if matches.is_empty() {
            return;
        }
        let mut body = String::with_capacity(self.body.len());
        let mut last = 0;
        for start in matches {
            body.push_str(&self.body[last..start]);
            body.push_str(replacement);
            last = start + token.len();
        }
        body.push_str(&self.body[last..]);
        self.body = body;
    }

    pub fn define(&mut self, name: &str, value: &str) {
        self.inject_line(InjectionPoint::Defines, format!("#define {} {}", name, value));
    }

    pub fn inject_line(&mut self, point: InjectionPoint, line: impl Into<String>) {
        self.injections[point.index()].push(line.into());
    }

    /// Render the final source
    pub fn finish(self) -> String {
        let Self { prefix, body, injections } = self;
        let [after_version, defines, before_code, before_functions, before_eof, end] = injections;

        let mut out = String::with_capacity(prefix.len() + body.len() + 1024);
        out.push_str(&prefix);
        for line in after_version.iter().chain(defines.iter()).chain(before_code.iter()) {
            out.push_str(line);
            out.push('\n');
        }

        let functions_at = first_function_offset(&body).unwrap_or(body.len());
        out.push_str(&body[..functions_at]);
        if !before_functions.is_empty() && !out.ends_with('\n') {
            out.push('\n');
        }
        for line in before_functions.iter() {
            out.push_str(line);
            out.push('\n');
        }
        out.push_str(&body[functions_at..]);

        if !out.ends_with('\n') {
            out.push('\n');
        }
        for line in before_eof.iter().chain(end.iter()) {
            out.push_str(line);
            out.push('\n');
        }
        out
    }
}

/// Iterate over the byte offsets of whole-token occurrences of `token` in `text`
fn find_tokens<'a>(text: &'a str, token: &'a str) -> impl Iterator<Item = usize> + 'a {
    let checks_end = token.chars().last().map_or(false, is_identifier_char);
    let checks_start = token.chars().next().map_or(false, is_identifier_char);
    text.match_indices(token).filter_map(move |(start, _)| {
        let before = text[..start].chars().next_back();
        let after = text[start + token.len()..].chars().next();
        let bad_start = checks_start && before.map_or(false, is_identifier_char);
        let bad_end = checks_end && after.map_or(false, is_identifier_char);
        if bad_start || bad_end {
            None
        } else {
            Some(start)
        }
    })
}

/// Byte offset of the first line at brace depth 0 that starts a function
fn first_function_offset(body: &str) -> Option<usize> {
    let mut depth: i32 = 0;
    let mut offset = 0;
    let mut in_block_comment = false;
    for line in body.split_inclusive('\n') {
        let start = offset;
        offset += line.len();

        let trimmed = line.trim_start();
        if in_block_comment {
            if let Some(end) = line.find("*/") {
                in_block_comment = false;
                depth += brace_delta(&line[end + 2..]);
            }
            continue;
        }
        if trimmed.starts_with('#') {
            continue;
        }
        if depth == 0 && is_function_header(trimmed) {
            return Some(start);
        }
        let code = trimmed.split("//").next().unwrap_or("");
        if let Some(open) = code.find("/*") {
            if !code[open..].contains("*/") {
                in_block_comment = true;
            }
            depth += brace_delta(&code[..open]);
        } else {
            depth += brace_delta(code);
        }
    }
    None
}

fn brace_delta(code: &str) -> i32 {
    code.chars().fold(0, |d, c| match c {
        '{' => d + 1,
        '}' => d - 1,
        _ => d,
    })
}

#[cfg(test)]
mod tests {
    use super::*;

    const SOURCE: &str = "// header\n#version 120\n#extension GL_EXT_gpu_shader4 : enable\n\nuniform float x;\nvoid main() {\n    gl_FragColor = vec4(x);\n}\n";

    #[test]
    fn splits_at_version_and_hoists_extensions() {
        let t = Transformations::new(SOURCE).unwrap();
        assert_eq!(t.prefix(), "// header\n#version 120\n#extension GL_EXT_gpu_shader4 : enable\n\n");
        assert!(t.body().starts_with("uniform float x;"));
        assert_eq!(t.version().unwrap().version, 120);
    }

    #[test]
    fn missing_version() {
        assert_eq!(
            Transformations::new("void main() {}").unwrap_err(),
            TransformError::MissingVersionDirective
        );
    }

    #[test]
    fn replace_exact_respects_token_boundaries() {
        let mut t = Transformations::new("#version 120\nvoid main() { mainColor = main2; main(); }\n").unwrap();
        t.replace_exact("main", "irisMain");
        assert_eq!(t.body(), "void irisMain() { mainColor = main2; irisMain(); }\n");
        assert!(t.contains_token("irisMain"));
        assert!(!t.contains_token("Main"));
    }

    #[test]
    fn injections_render_in_anchor_order() {
        let mut t = Transformations::new("#version 150\nuniform float y;\nfloat f() { return y; }\nvoid main() {}\n").unwrap();
        t.inject_line(InjectionPoint::End, "// end");
        t.inject_line(InjectionPoint::BeforeFunctions, "float g() { return 1.0; }");
        t.inject_line(InjectionPoint::BeforeCode, "uniform float z;");
        t.define("A", "1");
        t.inject_line(InjectionPoint::AfterVersion, "// after");
        t.inject_line(InjectionPoint::BeforeEof, "// eof");
        t.define("B", "2");
        assert_eq!(
            t.finish(),
            "#version 150\n// after\n#define A 1\n#define B 2\nuniform float z;\nuniform float y;\nfloat g() { return 1.0; }\nfloat f() { return y; }\nvoid main() {}\n// eof\n// end\n"
        );
    }

    #[test]
    fn functions_inside_braces_are_skipped() {
        let body = "struct S {\n    float a;\n};\n/* void fake() {\n*/\nvec3 real(vec3 c) {\n    return c;\n}\n";
        assert_eq!(first_function_offset(body), body.find("vec3 real"));
    }
}
