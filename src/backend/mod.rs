//! Backends turn one Service Specification into source artifacts.
//!
//! Each backend contributes a template, optional helpers and a context; the view of an
//! operation ([`OperationView`]) and the wire rules are shared, which is what keeps the
//! server, client and tests describing the same routes.

pub mod client;
pub mod server;
pub mod test;

use crate::codec::{CodecEntry, CodecRegistry, JSON_CONTENT_TYPE};
use crate::error::Result;
use crate::fixture::FixtureFile;
use crate::render::{HelperRegistrar, RenderEngine, TemplateAsset};
use crate::spec::{Location, Operation, ParamBinding, ServiceSpecification};
use crate::wire::RouteContract;
use heck::ToUpperCamelCase;
use log::{debug, info};
use minijinja::Value;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, clap::ValueEnum,
)]
#[serde(rename_all = "lowercase")]
pub enum BackendKind {
    Server,
    Client,
    Test,
}

impl BackendKind {
    pub const ALL: [BackendKind; 3] = [BackendKind::Server, BackendKind::Client, BackendKind::Test];

    pub fn as_str(&self) -> &'static str {
        match self {
            BackendKind::Server => "server",
            BackendKind::Client => "client",
            BackendKind::Test => "test",
        }
    }
}

impl fmt::Display for BackendKind {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Options shared by all backends.
#[derive(Debug, Clone)]
pub struct GenerationOptions {
    /// Trace every operation, not only those marked `@http(trace)`
    pub enable_tracing: bool,
    /// Module path the generated tests import `new_http_router` from
    pub router_path: String,
    /// Extra `use` lines added to every artifact
    pub imports: Vec<String>,
    /// Replacement templates by backend
    pub templates: BTreeMap<BackendKind, TemplateAsset>,
}

impl Default for GenerationOptions {
    fn default() -> Self {
        Self {
            enable_tracing: false,
            router_path: "super::http".to_string(),
            imports: Vec::new(),
            templates: BTreeMap::new(),
        }
    }
}

/// Everything a backend may read.
pub struct GenerationInput<'a> {
    pub spec: &'a ServiceSpecification,
    pub codecs: &'a CodecRegistry,
    pub options: &'a GenerationOptions,
    pub fixtures: Option<&'a FixtureFile>,
}

/// One generated source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Artifact {
    pub backend: BackendKind,
    pub file_name: String,
    pub content: String,
}

pub trait Backend {
    fn kind(&self) -> BackendKind;

    fn file_name(&self) -> &'static str;

    /// The built-in template, used unless the options replace it.
    fn default_template(&self) -> TemplateAsset;

    fn helpers(&self) -> Option<HelperRegistrar> {
        None
    }

    fn context(&self, input: &GenerationInput<'_>) -> Result<Value>;
}

pub fn backend_for(kind: BackendKind) -> Box<dyn Backend> {
    match kind {
        BackendKind::Server => Box::new(server::ServerBackend),
        BackendKind::Client => Box::new(client::ClientBackend),
        BackendKind::Test => Box::new(test::TestBackend),
    }
}

/// Renders the artifacts of `kinds`, in order.
///
/// Fails on the first error; callers only write files once every artifact rendered.
pub fn generate(input: &GenerationInput<'_>, kinds: &[BackendKind]) -> Result<Vec<Artifact>> {
    let mut artifacts = Vec::with_capacity(kinds.len());
    for kind in kinds {
        let backend = backend_for(*kind);
        let template = input
            .options
            .templates
            .get(kind)
            .cloned()
            .unwrap_or_else(|| backend.default_template());
        debug!("Rendering {} backend with template {}", kind, template.name);

        let mut engine = RenderEngine::new();
        if let Some(helpers) = backend.helpers() {
            engine = engine.with_helpers(helpers);
        }
        let context = backend.context(input)?;
        let content = engine.render(&template, &context)?;

        info!(
            "Generated {} ({} bytes) for {}",
            backend.file_name(),
            content.len(),
            input.spec.package.service_trait
        );
        artifacts.push(Artifact {
            backend: *kind,
            file_name: backend.file_name().to_string(),
            content,
        });
    }
    Ok(artifacts)
}

/// A context parameter as the server handler extracts it.
#[derive(Debug, Clone, Serialize)]
pub struct ContextParamView {
    pub name: String,
    /// The declared type without a leading `&`
    pub extract_ty: String,
}

/// Per-operation data every template sees.
#[derive(Debug, Clone, Serialize)]
pub struct OperationView {
    pub name: String,
    pub type_name: String,
    pub method: String,
    /// Lowercase method, the name of axum's routing function
    pub method_fn: String,
    pub pattern: String,
    pub params: Vec<ParamBinding>,
    pub context_params: Vec<ContextParamView>,
    /// Arguments of the service call in the server handler
    pub call_args: Vec<String>,
    pub has_path: bool,
    pub has_body: bool,
    pub success_type: Option<String>,
    pub error_type: Option<String>,
    pub return_type: String,
    pub is_async: bool,
    pub codec: CodecEntry,
    pub tracing: bool,
    pub contract: String,
}

impl OperationView {
    pub fn new(op: &Operation, codecs: &CodecRegistry, options: &GenerationOptions) -> Result<Self> {
        let context_params = op
            .params_in(Location::Context)
            .map(|p| ContextParamView {
                name: p.name.clone(),
                extract_ty: p.ty.trim_start_matches('&').trim().to_string(),
            })
            .collect();

        let call_args = op
            .params
            .iter()
            .map(|p| match p.location {
                Location::Context if p.ty.starts_with('&') => format!("&{}", p.name),
                Location::Context => p.name.clone(),
                _ => format!("req.{}", p.name),
            })
            .collect();

        Ok(Self {
            name: op.name.clone(),
            type_name: op.name.to_upper_camel_case(),
            method: op.method.as_str().to_string(),
            method_fn: op.method.as_str().to_ascii_lowercase(),
            pattern: op.pattern.clone(),
            params: op.params.clone(),
            context_params,
            call_args,
            has_path: op.params_in(Location::Path).next().is_some(),
            has_body: op.params_in(Location::Body).next().is_some(),
            success_type: op.success().map(|r| r.ty.clone()),
            error_type: op.error().map(|r| r.ty.clone()),
            return_type: op.return_type.clone(),
            is_async: op.is_async,
            codec: codecs.resolve(op)?,
            tracing: options.enable_tracing || op.annotation.tracing,
            contract: RouteContract::of(op).to_string(),
        })
    }
}

/// Views of all operations, in declaration order.
pub fn operation_views(input: &GenerationInput<'_>) -> Result<Vec<OperationView>> {
    input
        .spec
        .operations
        .iter()
        .map(|op| OperationView::new(op, input.codecs, input.options))
        .collect()
}

/// Context fields every template shares.
#[derive(Debug, Clone, Serialize)]
pub struct CommonContext {
    pub package_name: String,
    pub service_trait: String,
    pub async_trait: bool,
    pub json_content_type: &'static str,
    pub imports: Vec<String>,
    pub operations: Vec<OperationView>,
}

impl CommonContext {
    /// `extra_imports` are appended after the service and configured imports;
    /// duplicates are dropped, first occurrence wins.
    pub fn new(input: &GenerationInput<'_>, extra_imports: &[String]) -> Result<Self> {
        let spec = input.spec;
        let service_import = format!("use {}::{};", spec.package.service_path, spec.package.service_trait);

        let mut imports: Vec<String> = Vec::new();
        for import in std::iter::once(&service_import)
            .chain(&spec.imports)
            .chain(&input.options.imports)
            .chain(extra_imports)
        {
            if !imports.contains(import) {
                imports.push(import.clone());
            }
        }

        Ok(Self {
            package_name: spec.package.name.clone(),
            service_trait: spec.package.service_trait.clone(),
            async_trait: spec.package.async_trait,
            json_content_type: JSON_CONTENT_TYPE,
            imports,
            operations: operation_views(input)?,
        })
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use crate::provider::{MethodDescriptor, Parameter, ReturnValue, ServiceDescriptor};
    use crate::spec::builder::{BuildOptions, SpecBuilder};
    use crate::spec::ServiceSpecification;

    fn param(name: &str, ty: &str) -> Parameter {
        Parameter {
            name: name.to_string(),
            ty: ty.to_string(),
            is_context: ty.trim_start_matches('&') == "Context",
        }
    }

    fn method(name: &str, params: Vec<Parameter>, ok: Option<&str>, docs: &[&str]) -> MethodDescriptor {
        let mut returns = Vec::new();
        if let Some(ok) = ok {
            returns.push(ReturnValue {
                name: "result".to_string(),
                ty: ok.to_string(),
                is_error: false,
            });
        }
        returns.push(ReturnValue {
            name: "err".to_string(),
            ty: "ItemError".to_string(),
            is_error: true,
        });
        MethodDescriptor {
            name: name.to_string(),
            params,
            returns,
            return_type: format!("Result<{}, ItemError>", ok.unwrap_or("()")),
            is_async: true,
            docs: docs.iter().map(|d| d.to_string()).collect(),
        }
    }

    /// A small service exercising every location.
    pub fn item_service() -> ServiceSpecification {
        let service = ServiceDescriptor {
            trait_name: "ItemService".to_string(),
            async_trait: true,
            methods: vec![
                method(
                    "list_items",
                    vec![param("ctx", "Context"), param("limit", "Option<i32>")],
                    Some("Vec<Item>"),
                    &["@http(op): GET /items", "@http(param): limit in=query"],
                ),
                method(
                    "get_item",
                    vec![param("ctx", "&Context"), param("id", "u32")],
                    Some("Item"),
                    &["@http(op): GET /items/{id}", "@http(trace)"],
                ),
                method(
                    "delete_item",
                    vec![param("id", "u32")],
                    None,
                    &["@http(op): DELETE /items/{id}"],
                ),
                method(
                    "upload",
                    vec![param("file_name", "String"), param("file", "FileData")],
                    None,
                    &["@http(op): POST /upload"],
                ),
            ],
            imports: vec!["use crate::model::{FileData, Item, ItemError};".to_string()],
            local_types: vec!["Context".to_string(), "Unused".to_string()],
        };
        SpecBuilder::new(BuildOptions {
            service_path: "crate::service".to_string(),
            ..BuildOptions::default()
        })
        .build(&service)
        .unwrap()
    }
}
