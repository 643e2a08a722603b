//! How operations map to the wire.
//!
//! Every backend goes through this module to decide how a parameter is carried, parsed
//! and printed, so the server and the client always agree on the route shape.

use crate::error::{GenerationError, Result};
use crate::spec::{HttpMethod, Location, Operation, ParamBinding, ServiceSpecification};
use serde::Serialize;
use std::fmt;

/// Scalars that can travel in a path segment or a query value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum ScalarKind {
    Str,
    Bool,
    Int { signed: bool, bits: u32 },
}

/// A decoded scalar value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum WireValue {
    Str(String),
    Bool(bool),
    Int(i128),
    UInt(u128),
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum WireError {
    #[error("`{value}` is not a valid {kind}")]
    Invalid { value: String, kind: ScalarKind },
    #[error("`{value}` does not fit in {kind}")]
    OutOfRange { value: String, kind: ScalarKind },
    #[error("expected {expected}, found `{found}`")]
    Mismatch { expected: String, found: String },
}

impl ScalarKind {
    /// Classifies the last path segment of a type name.
    pub fn from_type_name(name: &str) -> Option<Self> {
        let kind = match name {
            "String" => ScalarKind::Str,
            "bool" => ScalarKind::Bool,
            "i8" => ScalarKind::Int { signed: true, bits: 8 },
            "i16" => ScalarKind::Int { signed: true, bits: 16 },
            "i32" => ScalarKind::Int { signed: true, bits: 32 },
            "i64" | "isize" => ScalarKind::Int { signed: true, bits: 64 },
            "i128" => ScalarKind::Int { signed: true, bits: 128 },
            "u8" => ScalarKind::Int { signed: false, bits: 8 },
            "u16" => ScalarKind::Int { signed: false, bits: 16 },
            "u32" => ScalarKind::Int { signed: false, bits: 32 },
            "u64" | "usize" => ScalarKind::Int { signed: false, bits: 64 },
            "u128" => ScalarKind::Int { signed: false, bits: 128 },
            _ => return None,
        };
        Some(kind)
    }

    /// Parses `raw` the way the generated code does at runtime: base 10, bounded by the
    /// declared width and signedness.
    pub fn decode(&self, raw: &str) -> std::result::Result<WireValue, WireError> {
        let invalid = || WireError::Invalid {
            value: raw.to_string(),
            kind: *self,
        };
        let out_of_range = || WireError::OutOfRange {
            value: raw.to_string(),
            kind: *self,
        };

        match *self {
            ScalarKind::Str => Ok(WireValue::Str(raw.to_string())),
            ScalarKind::Bool => raw.parse::<bool>().map(WireValue::Bool).map_err(|_| invalid()),
            ScalarKind::Int { signed: true, bits } => {
                let value = raw.parse::<i128>().map_err(|e| match e.kind() {
                    std::num::IntErrorKind::PosOverflow | std::num::IntErrorKind::NegOverflow => {
                        out_of_range()
                    }
                    _ => invalid(),
                })?;
                if bits < 128 {
                    let max = (1i128 << (bits - 1)) - 1;
                    let min = -(1i128 << (bits - 1));
                    if value < min || value > max {
                        return Err(out_of_range());
                    }
                }
                Ok(WireValue::Int(value))
            }
            ScalarKind::Int { signed: false, bits } => {
                if raw.starts_with('-') {
                    return Err(if raw[1..].chars().all(|c| c.is_ascii_digit()) && raw.len() > 1 {
                        out_of_range()
                    } else {
                        invalid()
                    });
                }
                let value = raw.parse::<u128>().map_err(|e| match e.kind() {
                    std::num::IntErrorKind::PosOverflow => out_of_range(),
                    _ => invalid(),
                })?;
                if bits < 128 && value > (1u128 << bits) - 1 {
                    return Err(out_of_range());
                }
                Ok(WireValue::UInt(value))
            }
        }
    }

    /// Prints a value the way the generated client puts it on the wire.
    pub fn encode(&self, value: &WireValue) -> String {
        match value {
            WireValue::Str(s) => s.clone(),
            WireValue::Bool(b) => b.to_string(),
            WireValue::Int(i) => i.to_string(),
            WireValue::UInt(u) => u.to_string(),
        }
    }
}

impl fmt::Display for ScalarKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            ScalarKind::Str => f.write_str("String"),
            ScalarKind::Bool => f.write_str("bool"),
            ScalarKind::Int { signed, bits } => {
                write!(f, "{}{}", if *signed { "i" } else { "u" }, bits)
            }
        }
    }
}

/// Wire classification of a parameter type.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "shape", rename_all = "lowercase")]
pub enum WireType {
    /// A scalar; `ty` is the type as declared
    Scalar { kind: ScalarKind, ty: String },
    /// `Option` of a scalar; `ty` is the inner type as declared
    Optional { kind: ScalarKind, ty: String },
    /// Anything serde can carry; only valid in the body record
    Record { ty: String },
}

impl WireType {
    /// Classifies a printed Rust type. Returns `None` for borrowed, `impl` and
    /// trait-object types, which cannot be decoded into an owned request.
    pub fn classify(ty: &str) -> Option<Self> {
        let parsed: syn::Type = syn::parse_str(ty).ok()?;
        match &parsed {
            syn::Type::Reference(_) | syn::Type::ImplTrait(_) | syn::Type::TraitObject(_) => None,
            syn::Type::Path(_) => {
                if let Some(inner) = option_argument(&parsed) {
                    let inner_ty = crate::provider::type_to_string(inner);
                    return Some(match scalar_kind(inner) {
                        Some(kind) => WireType::Optional { kind, ty: inner_ty },
                        None => WireType::Record { ty: ty.to_string() },
                    });
                }
                Some(match scalar_kind(&parsed) {
                    Some(kind) => WireType::Scalar {
                        kind,
                        ty: ty.to_string(),
                    },
                    None => WireType::Record { ty: ty.to_string() },
                })
            }
            _ => Some(WireType::Record { ty: ty.to_string() }),
        }
    }
}

fn scalar_kind(ty: &syn::Type) -> Option<ScalarKind> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if !segment.arguments.is_none() {
        return None;
    }
    ScalarKind::from_type_name(&segment.ident.to_string())
}

fn option_argument(ty: &syn::Type) -> Option<&syn::Type> {
    let syn::Type::Path(type_path) = ty else {
        return None;
    };
    let segment = type_path.path.segments.last()?;
    if segment.ident != "Option" {
        return None;
    }
    let syn::PathArguments::AngleBracketed(args) = &segment.arguments else {
        return None;
    };
    match args.args.first()? {
        syn::GenericArgument::Type(inner) => Some(inner),
        _ => None,
    }
}

/// Classifies `param` of `operation` and checks it can travel in its location.
pub fn wire_type(operation: &str, param: &ParamBinding) -> Result<WireType> {
    let unsupported = || GenerationError::UnsupportedType {
        operation: operation.to_string(),
        param: param.name.clone(),
        ty: param.ty.clone(),
        location: param.location.to_string(),
    };

    let wire = WireType::classify(&param.ty).ok_or_else(unsupported)?;
    match (param.location, &wire) {
        (Location::Context, _) => Err(unsupported()),
        (Location::Path, WireType::Scalar { .. }) => Ok(wire),
        (Location::Path, _) => Err(unsupported()),
        (Location::Query, WireType::Scalar { .. } | WireType::Optional { .. }) => Ok(wire),
        (Location::Query, WireType::Record { .. }) => Err(unsupported()),
        (Location::Body, _) => Ok(wire),
    }
}

/// Server-side expression producing the value of `param` inside `decode_<op>_request`.
///
/// The generated decoder has `path`, `query` (both `HashMap<String, String>`) and, when
/// the operation has body parameters, the decoded `body` record in scope.
pub fn decode_expr(operation: &str, param: &ParamBinding) -> Result<String> {
    let expr = match (param.location, wire_type(operation, param)?) {
        (Location::Path, WireType::Scalar { ty, .. }) => format!(
            "parse_param::<{}>({:?}, path.get({:?}))?",
            ty, param.wire_name, param.wire_name
        ),
        (Location::Query, WireType::Scalar { ty, .. }) => format!(
            "parse_param::<{}>({:?}, query.get({:?}))?",
            ty, param.wire_name, param.wire_name
        ),
        (Location::Query, WireType::Optional { ty, .. }) => format!(
            "parse_optional_param::<{}>({:?}, query.get({:?}))?",
            ty, param.wire_name, param.wire_name
        ),
        (Location::Body, _) => format!("body.{}", param.name),
        _ => {
            return Err(GenerationError::UnsupportedType {
                operation: operation.to_string(),
                param: param.name.clone(),
                ty: param.ty.clone(),
                location: param.location.to_string(),
            })
        }
    };
    Ok(expr)
}

/// Operations sharing one pattern; registered on a single route.
#[derive(Debug, Clone, Serialize)]
pub struct RouteGroup<'a> {
    pub pattern: String,
    pub operations: Vec<&'a Operation>,
}

/// Groups operations by pattern, in order of first appearance.
pub fn route_groups(spec: &ServiceSpecification) -> Vec<RouteGroup<'_>> {
    let mut groups: Vec<RouteGroup<'_>> = Vec::new();
    for op in &spec.operations {
        match groups.iter_mut().find(|g| g.pattern == op.pattern) {
            Some(group) => group.operations.push(op),
            None => groups.push(RouteGroup {
                pattern: op.pattern.clone(),
                operations: vec![op],
            }),
        }
    }
    groups
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "value", rename_all = "lowercase")]
pub enum PathSegment {
    Literal(String),
    Placeholder(String),
}

/// Splits a pattern into its segments, leading slash excluded.
pub fn path_segments(pattern: &str) -> Vec<PathSegment> {
    pattern
        .trim_start_matches('/')
        .split('/')
        .filter(|segment| !segment.is_empty())
        .map(|segment| match segment.strip_prefix('{').and_then(|s| s.strip_suffix('}')) {
            Some(name) => PathSegment::Placeholder(name.to_string()),
            None => PathSegment::Literal(segment.to_string()),
        })
        .collect()
}

/// Client-side expression building the request path for `pattern`.
///
/// Placeholders go through the generated `encode_segment` helper.
pub fn client_path_expr(pattern: &str) -> String {
    let segments = path_segments(pattern);
    let placeholders: Vec<&str> = segments
        .iter()
        .filter_map(|s| match s {
            PathSegment::Placeholder(name) => Some(name.as_str()),
            PathSegment::Literal(_) => None,
        })
        .collect();

    let mut format_str = String::new();
    for segment in &segments {
        format_str.push('/');
        match segment {
            PathSegment::Literal(literal) => {
                format_str.push_str(&literal.replace('{', "{{").replace('}', "}}"))
            }
            PathSegment::Placeholder(_) => format_str.push_str("{}"),
        }
    }
    if format_str.is_empty() || (pattern.ends_with('/') && !segments.is_empty()) {
        format_str.push('/');
    }

    if placeholders.is_empty() {
        return format!("{:?}.to_string()", format_str);
    }
    let args: Vec<String> = placeholders
        .iter()
        .map(|name| format!("encode_segment(&{})", name))
        .collect();
    format!("format!({:?}, {})", format_str, args.join(", "))
}

/// One-line summary of the wire shape of an operation.
///
/// Every artifact carries the contracts of all operations; equal lines across the
/// server and client mean both sides agree on verb, pattern, names and types.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RouteContract {
    pub method: HttpMethod,
    pub pattern: String,
    pub path: Vec<String>,
    pub query: Vec<String>,
    pub body: Vec<String>,
}

impl RouteContract {
    pub fn of(op: &Operation) -> Self {
        let fields = |location: Location| {
            op.params_in(location)
                .map(|p| format!("{}:{}", p.wire_name, p.ty))
                .collect::<Vec<_>>()
        };
        Self {
            method: op.method,
            pattern: op.pattern.clone(),
            path: fields(Location::Path),
            query: fields(Location::Query),
            body: fields(Location::Body),
        }
    }
}

impl fmt::Display for RouteContract {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        write!(
            f,
            "{} {} path=[{}] query=[{}] body=[{}]",
            self.method,
            self.pattern,
            self.path.join(", "),
            self.query.join(", "),
            self.body.join(", ")
        )
    }
}

/// Renders a JSON fixture value as a Rust expression of type `ty`.
///
/// Scalars and optional scalars become literals after being checked against the
/// declared type; everything else is deserialized from its JSON text at test time.
pub fn rust_literal(ty: &str, value: &serde_json::Value) -> std::result::Result<String, WireError> {
    match WireType::classify(ty) {
        Some(WireType::Scalar { kind, .. }) => scalar_literal(kind, value),
        Some(WireType::Optional { kind, .. }) => match value {
            serde_json::Value::Null => Ok("None".to_string()),
            other => Ok(format!("Some({})", scalar_literal(kind, other)?)),
        },
        _ => Ok(format!(
            "serde_json::from_str::<{}>({}).unwrap()",
            ty,
            raw_string_literal(&value.to_string())
        )),
    }
}

fn scalar_literal(kind: ScalarKind, value: &serde_json::Value) -> std::result::Result<String, WireError> {
    let mismatch = || WireError::Mismatch {
        expected: kind.to_string(),
        found: value.to_string(),
    };
    let raw = match (kind, value) {
        (ScalarKind::Str, serde_json::Value::String(s)) => return Ok(format!("String::from({:?})", s)),
        (ScalarKind::Str, _) => return Err(mismatch()),
        (_, serde_json::Value::String(s)) => s.clone(),
        (ScalarKind::Bool, serde_json::Value::Bool(b)) => b.to_string(),
        (ScalarKind::Int { .. }, serde_json::Value::Number(n)) => n.to_string(),
        _ => return Err(mismatch()),
    };
    let literal = match kind.decode(&raw)? {
        WireValue::Bool(b) => b.to_string(),
        WireValue::Int(i) => format!("{}{}", i, kind),
        WireValue::UInt(u) => format!("{}{}", u, kind),
        WireValue::Str(s) => format!("String::from({:?})", s),
    };
    Ok(literal)
}

/// Wraps `text` in a raw string literal with enough `#`s to contain it.
pub fn raw_string_literal(text: &str) -> String {
    let mut hashes = 0;
    loop {
        let terminator = format!("\"{}", "#".repeat(hashes));
        if !text.contains(&terminator) {
            break;
        }
        hashes += 1;
    }
    let fence = "#".repeat(hashes);
    format!("r{fence}\"{text}\"{fence}")
}
