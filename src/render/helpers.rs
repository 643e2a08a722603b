//! Helpers shared by every template.

use crate::error::GenerationError;
use crate::spec::{Location, ParamBinding};
use crate::wire;
use heck::{ToLowerCamelCase, ToSnakeCase, ToUpperCamelCase};
use minijinja::value::{Rest, ViaDeserialize};
use minijinja::{Environment, Error, ErrorKind, Value};

pub fn register_shared(env: &mut Environment<'_>) {
    env.add_filter("pascal_case", pascal_case);
    env.add_filter("snake_case", snake_case);
    env.add_filter("camel_case", camel_case);
    env.add_filter("rust_str", rust_str);
    env.add_filter("raw_str", raw_str);
    env.add_function("params_in", params_in);
    env.add_function("join_params", join_params);
    env.add_function("wire_type", wire_type);
    env.add_function("decode_expr", decode_expr);
    env.add_function("client_path", client_path);
}

/// Carries a generation error through minijinja so the engine can hand it back as is.
pub fn helper_error(err: GenerationError) -> Error {
    Error::new(ErrorKind::InvalidOperation, err.to_string()).with_source(err)
}

fn pascal_case(value: &str) -> String {
    value.to_upper_camel_case()
}

fn snake_case(value: &str) -> String {
    value.to_snake_case()
}

fn camel_case(value: &str) -> String {
    value.to_lower_camel_case()
}

/// A Rust string literal.
fn rust_str(value: &str) -> String {
    format!("{:?}", value)
}

fn raw_str(value: &str) -> String {
    wire::raw_string_literal(value)
}

/// `params_in(op.params, "path", "query")` keeps the parameters in any of the given
/// locations, in declared order.
fn params_in(params: ViaDeserialize<Vec<ParamBinding>>, locations: Rest<String>) -> Result<Value, Error> {
    let mut wanted = Vec::with_capacity(locations.len());
    for location in locations.iter() {
        let parsed = match location.as_str() {
            "path" => Location::Path,
            "query" => Location::Query,
            "body" => Location::Body,
            "context" => Location::Context,
            other => {
                return Err(Error::new(
                    ErrorKind::InvalidOperation,
                    format!("unknown parameter location `{}`", other),
                ))
            }
        };
        wanted.push(parsed);
    }

    let filtered: Vec<&ParamBinding> = params
        .0
        .iter()
        .filter(|p| wanted.contains(&p.location))
        .collect();
    Ok(Value::from_serialize(&filtered))
}

/// Formats each parameter with `$name`, `$type` and `$wire` substituted, then joins them.
fn join_params(params: ViaDeserialize<Vec<ParamBinding>>, format: &str, separator: &str) -> String {
    params
        .0
        .iter()
        .map(|p| {
            format
                .replace("$name", &p.name)
                .replace("$type", &p.ty)
                .replace("$wire", &p.wire_name)
        })
        .collect::<Vec<_>>()
        .join(separator)
}

fn wire_type(operation: &str, param: ViaDeserialize<ParamBinding>) -> Result<Value, Error> {
    wire::wire_type(operation, &param.0)
        .map(|wire| Value::from_serialize(&wire))
        .map_err(helper_error)
}

fn decode_expr(operation: &str, param: ViaDeserialize<ParamBinding>) -> Result<String, Error> {
    wire::decode_expr(operation, &param.0).map_err(helper_error)
}

fn client_path(pattern: &str) -> String {
    wire::client_path_expr(pattern)
}
