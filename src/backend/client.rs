//! reqwest client backend.

use super::{Backend, BackendKind, CommonContext, GenerationInput};
use crate::error::Result;
use crate::render::helpers::helper_error;
use crate::render::{HelperRegistrar, TemplateAsset, CLIENT_TEMPLATE};
use crate::spec::ParamBinding;
use crate::wire::{self, WireType};
use minijinja::value::ViaDeserialize;
use minijinja::{Environment, Error, Value};

pub struct ClientBackend;

impl Backend for ClientBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Client
    }

    fn file_name(&self) -> &'static str {
        "http_client.rs"
    }

    fn default_template(&self) -> TemplateAsset {
        TemplateAsset::new("client.rs.j2", CLIENT_TEMPLATE)
    }

    fn helpers(&self) -> Option<HelperRegistrar> {
        Some(register)
    }

    fn context(&self, input: &GenerationInput<'_>) -> Result<Value> {
        Ok(Value::from_serialize(&CommonContext::new(input, &[])?))
    }
}

fn register(env: &mut Environment<'_>) {
    env.add_function("query_push", query_push);
}

/// Statement appending one query parameter to `query`; absent optionals are skipped.
fn query_push(operation: &str, param: ViaDeserialize<ParamBinding>) -> std::result::Result<String, Error> {
    let param = param.0;
    let statement = match wire::wire_type(operation, &param).map_err(helper_error)? {
        WireType::Optional { .. } => format!(
            "        if let Some(value) = &{name} {{\n            query.push(({wire:?}, value.to_string()));\n        }}",
            name = param.name,
            wire = param.wire_name,
        ),
        _ => format!(
            "        query.push(({wire:?}, {name}.to_string()));",
            name = param.name,
            wire = param.wire_name,
        ),
    };
    Ok(statement)
}
