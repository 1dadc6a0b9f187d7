//! Line-level recognizers for the few pieces of GLSL syntax the transformations need to find.
//!
//! None of these parse GLSL properly: they match single lines of text, which is all the patchers rely on.

use nom::{
    bytes::complete::{tag, take_while, take_while1},
    character::complete::{char, digit1, multispace0, multispace1, space0, space1},
    combinator::{map_res, opt, recognize},
    sequence::{pair, preceded, tuple},
    IResult,
};

/// A parsed `#version` directive
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct VersionDirective {
    pub version: u32,
    /// `core`, `compatibility`, `es`, or None if no profile was given
    pub profile: Option<String>,
}

/// Keywords that can start a top-level declaration which looks like `a b(`, but isn't a function
const DECLARATION_KEYWORDS: &[&str] = &[
    "uniform", "in", "out", "inout", "attribute", "varying", "const", "struct", "layout", "return",
    "if", "else", "for", "while", "precision", "flat", "smooth", "noperspective", "centroid",
    "invariant", "highp", "mediump", "lowp",
];

pub fn is_identifier_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

pub fn identifier(data: &str) -> IResult<&str, &str> {
    recognize(pair(
        take_while1(|c: char| c.is_ascii_alphabetic() || c == '_'),
        take_while(is_identifier_char),
    ))(data)
}

fn version_directive(data: &str) -> IResult<&str, VersionDirective> {
    let (data, (_, _, _, _, _, version, profile, _)) = tuple((
        space0,
        char('#'),
        space0,
        tag("version"),
        space1,
        map_res(digit1, str::parse::<u32>),
        opt(preceded(space1, identifier)),
        space0,
    ))(data)?;
    Ok((
        data,
        VersionDirective {
            version,
            profile: profile.map(str::to_owned),
        },
    ))
}

/// Parse a whole line as a `#version` directive, allowing a trailing line comment
pub fn parse_version_line(line: &str) -> Option<VersionDirective> {
    match version_directive(line) {
        Ok((rest, directive)) if rest.is_empty() || rest.starts_with("//") => Some(directive),
        _ => None,
    }
}

/// Returns true if the line is an `#extension` directive
pub fn is_extension_line(line: &str) -> bool {
    let parsed: IResult<&str, _> = tuple((space0, char('#'), space0, tag("extension")))(line);
    parsed.is_ok()
}

/// Returns true if the line begins a function definition or prototype, i.e. `type name(`.
///
/// The line is expected to be at the top level (outside of any braces).
pub fn is_function_header(line: &str) -> bool {
    let parsed: IResult<&str, _> =
        tuple((space0, identifier, multispace1, identifier, multispace0, char('(')))(line);
    match parsed {
        Ok((_, (_, return_type, _, _, _, _))) => !DECLARATION_KEYWORDS.contains(&return_type),
        Err(_) => false,
    }
}

/// Match `layout(location = 0) out vec4 name;` and return `name`
pub fn parse_location_zero_output(line: &str) -> Option<&str> {
    let parsed: IResult<&str, _> = tuple((
        space0,
        tag("layout"),
        space0,
        char('('),
        space0,
        tag("location"),
        space0,
        char('='),
        space0,
        char('0'),
        space0,
        char(')'),
        space0,
        tag("out"),
        space1,
        tag("vec4"),
        space1,
        identifier,
        space0,
        char(';'),
    ))(line);
    parsed.ok().map(|(_, parts)| parts.17)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn version_lines() {
        assert_eq!(
            parse_version_line("#version 120"),
            Some(VersionDirective { version: 120, profile: None })
        );
        assert_eq!(
            parse_version_line("  # version 330 compatibility // comment"),
            Some(VersionDirective { version: 330, profile: Some("compatibility".into()) })
        );
        assert_eq!(parse_version_line("#versionx 120"), None);
        assert_eq!(parse_version_line("#define VERSION 120"), None);
    }

    #[test]
    fn function_headers() {
        assert!(is_function_header("void main() {"));
        assert!(is_function_header("vec3 toLinear (vec3 c);"));
        assert!(!is_function_header("uniform sampler2D tex;"));
        assert!(!is_function_header("vec3 color = vec3(1.0);"));
        assert!(!is_function_header("out vec4 color("));
    }

    #[test]
    fn location_zero_output() {
        assert_eq!(parse_location_zero_output("layout(location = 0) out vec4 outColor;"), Some("outColor"));
        assert_eq!(parse_location_zero_output("layout (location=0) out vec4 albedo ;"), Some("albedo"));
        assert_eq!(parse_location_zero_output("layout(location = 1) out vec4 normal;"), None);
    }
}
