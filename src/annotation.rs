//! Directive parsing for method doc comments.
//!
//! A doc line whose trimmed text starts with `@http` is a directive:
//!
//! ```text
//! /// Returns one item.
//! /// @http(op): GET /items/{id}
//! /// @http(param): verbose in=query
//! /// @http(error): item_error_to_response, item_error_from_response
//! /// @http(codec): msgpack
//! /// @http(trace)
//! ```
//!
//! Directives parse into the closed [`Directive`] type; unknown kinds are rejected.

use crate::error::{GenerationError, Result};
use crate::spec::{HttpMethod, Location};
use serde::Serialize;

const DIRECTIVE_PREFIX: &str = "@http";

/// One parsed directive line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Directive {
    Op { method: HttpMethod, pattern: String },
    Param { name: String, location: Location },
    Error { encoder: String, decoder: Option<String> },
    Codec(String),
    Trace,
}

/// An explicit location given by `@http(param)`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DeclaredLocation {
    pub param: String,
    pub location: Location,
    /// The directive line, kept for error messages
    pub line: String,
}

/// The directive bundle of one method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Annotation {
    pub method: HttpMethod,
    pub pattern: String,
    /// Placeholder names in pattern order
    pub placeholders: Vec<String>,
    pub declared_locations: Vec<DeclaredLocation>,
    pub error_encoder: Option<String>,
    pub error_decoder: Option<String>,
    pub codec: Option<String>,
    pub tracing: bool,
}

/// Parses the doc lines of `method_name` into an [`Annotation`].
pub fn parse_annotation(method_name: &str, docs: &[String]) -> Result<Annotation> {
    let mut route: Option<(HttpMethod, String, Vec<String>)> = None;
    let mut declared_locations: Vec<DeclaredLocation> = Vec::new();
    let mut error_encoder = None;
    let mut error_decoder = None;
    let mut codec = None;
    let mut tracing = false;

    for raw in docs {
        let line = raw.trim();
        if !line.starts_with(DIRECTIVE_PREFIX) {
            continue;
        }

        match parse_directive(method_name, line)? {
            Directive::Op { method, pattern } => {
                if route.is_some() {
                    return Err(syntax(method_name, line, "a method takes exactly one `op` directive"));
                }
                let placeholders = parse_pattern(method_name, line, &pattern)?;
                route = Some((method, pattern, placeholders));
            }
            Directive::Param { name, location } => {
                if let Some(previous) = declared_locations.iter().find(|d| d.param == name) {
                    if previous.location != location {
                        return Err(GenerationError::AmbiguousLocation {
                            method: method_name.to_string(),
                            param: name,
                            reason: format!(
                                "declared both in={} and in={}",
                                previous.location, location
                            ),
                        });
                    }
                    continue;
                }
                declared_locations.push(DeclaredLocation {
                    param: name,
                    location,
                    line: line.to_string(),
                });
            }
            Directive::Error { encoder, decoder } => {
                error_encoder = Some(encoder);
                error_decoder = decoder;
            }
            Directive::Codec(name) => codec = Some(name),
            Directive::Trace => tracing = true,
        }
    }

    let (method, pattern, placeholders) = route.ok_or_else(|| GenerationError::MissingRouteAnnotation {
        method: method_name.to_string(),
    })?;

    Ok(Annotation {
        method,
        pattern,
        placeholders,
        declared_locations,
        error_encoder,
        error_decoder,
        codec,
        tracing,
    })
}

/// Parses one directive line, already known to start with `@http`.
pub fn parse_directive(method_name: &str, line: &str) -> Result<Directive> {
    let rest = &line[DIRECTIVE_PREFIX.len()..];
    let rest = rest
        .strip_prefix('(')
        .ok_or_else(|| syntax(method_name, line, "expected `(` after `@http`"))?;
    let (kind, rest) = rest
        .split_once(')')
        .ok_or_else(|| syntax(method_name, line, "unterminated directive kind"))?;
    let kind = kind.trim();

    let rest = rest.trim();
    let args = if rest.is_empty() {
        None
    } else {
        let args = rest
            .strip_prefix(':')
            .ok_or_else(|| syntax(method_name, line, "expected `:` after the directive kind"))?
            .trim();
        if args.is_empty() {
            None
        } else {
            Some(args)
        }
    };

    let require_args = || args.ok_or_else(|| syntax(method_name, line, "missing arguments"));

    match kind {
        "op" => {
            let mut parts = require_args()?.split_whitespace();
            let verb = parts.next().unwrap_or_default();
            let method = HttpMethod::parse(verb)
                .ok_or_else(|| syntax(method_name, line, &format!("unknown HTTP method `{}`", verb)))?;
            let pattern = parts
                .next()
                .ok_or_else(|| syntax(method_name, line, "missing path pattern"))?;
            if parts.next().is_some() {
                return Err(syntax(method_name, line, "expected `<METHOD> <pattern>`"));
            }
            Ok(Directive::Op {
                method,
                pattern: pattern.to_string(),
            })
        }
        "param" => {
            let mut parts = require_args()?.split_whitespace();
            let name = parts.next().unwrap_or_default();
            if !is_identifier(name) {
                return Err(syntax(method_name, line, "expected a parameter name"));
            }
            let location = match (parts.next(), parts.next()) {
                (Some(spec), None) => match spec.strip_prefix("in=") {
                    Some("path") => Location::Path,
                    Some("query") => Location::Query,
                    Some("body") => Location::Body,
                    _ => {
                        return Err(syntax(
                            method_name,
                            line,
                            "expected `in=path`, `in=query` or `in=body`",
                        ))
                    }
                },
                _ => return Err(syntax(method_name, line, "expected `<name> in=<location>`")),
            };
            Ok(Directive::Param {
                name: name.to_string(),
                location,
            })
        }
        "error" => {
            let args = require_args()?;
            let mut functions = args.split(',').map(str::trim);
            let encoder = functions.next().unwrap_or_default();
            let decoder = functions.next();
            if functions.next().is_some() {
                return Err(syntax(method_name, line, "expected `<encoder>[, <decoder>]`"));
            }
            if !is_path(encoder) || !decoder.map(is_path).unwrap_or(true) {
                return Err(syntax(method_name, line, "error functions must be Rust paths"));
            }
            Ok(Directive::Error {
                encoder: encoder.to_string(),
                decoder: decoder.map(str::to_string),
            })
        }
        "codec" => {
            let name = require_args()?;
            if !is_identifier(name) {
                return Err(syntax(method_name, line, "codec names are identifiers"));
            }
            Ok(Directive::Codec(name.to_string()))
        }
        "trace" => match args {
            None => Ok(Directive::Trace),
            Some(_) => Err(syntax(method_name, line, "`trace` takes no arguments")),
        },
        other => Err(syntax(
            method_name,
            line,
            &format!("unknown directive kind `{}`", other),
        )),
    }
}

/// Validates a path pattern and returns its placeholder names in order.
fn parse_pattern(method_name: &str, line: &str, pattern: &str) -> Result<Vec<String>> {
    if !pattern.starts_with('/') {
        return Err(syntax(method_name, line, "path patterns must start with `/`"));
    }
    if pattern.contains('?') || pattern.contains('#') {
        return Err(syntax(
            method_name,
            line,
            "path patterns cannot contain a query or fragment",
        ));
    }

    let mut placeholders: Vec<String> = Vec::new();
    for segment in pattern.split('/').skip(1) {
        let opens = segment.matches('{').count();
        let closes = segment.matches('}').count();
        if opens == 0 && closes == 0 {
            continue;
        }
        let name = segment
            .strip_prefix('{')
            .and_then(|s| s.strip_suffix('}'))
            .filter(|_| opens == 1 && closes == 1)
            .ok_or_else(|| {
                syntax(
                    method_name,
                    line,
                    &format!("placeholder `{}` must occupy a whole path segment", segment),
                )
            })?;
        if !is_identifier(name) {
            return Err(syntax(
                method_name,
                line,
                &format!("invalid placeholder name `{}`", name),
            ));
        }
        if placeholders.iter().any(|p| p == name) {
            return Err(GenerationError::DuplicatePlaceholder {
                method: method_name.to_string(),
                pattern: pattern.to_string(),
                placeholder: name.to_string(),
            });
        }
        placeholders.push(name.to_string());
    }

    Ok(placeholders)
}

fn is_identifier(s: &str) -> bool {
    let mut chars = s.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_')
}

fn is_path(s: &str) -> bool {
    !s.is_empty() && s.split("::").all(is_identifier)
}

fn syntax(method_name: &str, line: &str, reason: &str) -> GenerationError {
    GenerationError::DirectiveSyntax {
        method: method_name.to_string(),
        line: line.to_string(),
        reason: reason.to_string(),
    }
}
