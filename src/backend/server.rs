//! axum router backend.

use super::{Backend, BackendKind, CommonContext, GenerationInput};
use crate::error::Result;
use crate::render::{HelperRegistrar, TemplateAsset, SERVER_TEMPLATE};
use crate::wire::route_groups;
use minijinja::value::ViaDeserialize;
use minijinja::{Environment, Value};
use serde::{Deserialize, Serialize};

pub struct ServerBackend;

/// One verb of a route group.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HandlerRef {
    pub name: String,
    pub method_fn: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct RouteView {
    pub pattern: String,
    pub handlers: Vec<HandlerRef>,
}

#[derive(Debug, Clone, Serialize)]
struct ServerContext {
    #[serde(flatten)]
    common: CommonContext,
    routes: Vec<RouteView>,
    /// Whether any operation is traced
    tracing: bool,
}

impl Backend for ServerBackend {
    fn kind(&self) -> BackendKind {
        BackendKind::Server
    }

    fn file_name(&self) -> &'static str {
        "http.rs"
    }

    fn default_template(&self) -> TemplateAsset {
        TemplateAsset::new("server.rs.j2", SERVER_TEMPLATE)
    }

    fn helpers(&self) -> Option<HelperRegistrar> {
        Some(register)
    }

    fn context(&self, input: &GenerationInput<'_>) -> Result<Value> {
        let common = CommonContext::new(input, &[])?;
        let routes = route_groups(input.spec)
            .into_iter()
            .map(|group| RouteView {
                pattern: group.pattern,
                handlers: group
                    .operations
                    .iter()
                    .map(|op| HandlerRef {
                        name: op.name.clone(),
                        method_fn: op.method.as_str().to_ascii_lowercase(),
                    })
                    .collect(),
            })
            .collect();
        let tracing = common.operations.iter().any(|op| op.tracing);

        Ok(Value::from_serialize(&ServerContext {
            common,
            routes,
            tracing,
        }))
    }
}

fn register(env: &mut Environment<'_>) {
    env.add_function("method_router", method_router);
}

/// `routing::get(handle_a::<S>).delete(handle_b::<S>)` for the verbs of one route.
fn method_router(handlers: ViaDeserialize<Vec<HandlerRef>>) -> String {
    let chain = handlers
        .0
        .iter()
        .map(|h| format!("{}(handle_{}::<S>)", h.method_fn, h.name))
        .collect::<Vec<_>>()
        .join(".");
    format!("routing::{}", chain)
}
