//! The Service Specification: the validated, ordered list of operations every backend
//! renders from.
//!
//! # Example
//!
//! ```no_run
//! use routekit::parser::AstParser;
//! use routekit::provider::{SynTraitProvider, TypeProvider};
//! use routekit::spec::builder::{BuildOptions, SpecBuilder};
//! use std::path::Path;
//!
//! let parsed = AstParser::parse_file(Path::new("src/service.rs")).unwrap();
//! let service = SynTraitProvider::new(&parsed, "ItemService", &["Context".to_string()])
//!     .describe()
//!     .unwrap();
//! let spec = SpecBuilder::new(BuildOptions::default()).build(&service).unwrap();
//! for op in &spec.operations {
//!     println!("{} {} -> {}", op.method, op.pattern, op.name);
//! }
//! ```

pub mod builder;

use crate::annotation::Annotation;
use crate::provider::ReturnValue;
use serde::{Deserialize, Serialize};
use std::fmt;

/// HTTP methods an operation can be routed on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
    Patch,
    Head,
    Options,
}

impl HttpMethod {
    /// Parses a verb, ignoring case.
    pub fn parse(verb: &str) -> Option<Self> {
        match verb.to_ascii_uppercase().as_str() {
            "GET" => Some(HttpMethod::Get),
            "POST" => Some(HttpMethod::Post),
            "PUT" => Some(HttpMethod::Put),
            "DELETE" => Some(HttpMethod::Delete),
            "PATCH" => Some(HttpMethod::Patch),
            "HEAD" => Some(HttpMethod::Head),
            "OPTIONS" => Some(HttpMethod::Options),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
            HttpMethod::Patch => "PATCH",
            HttpMethod::Head => "HEAD",
            HttpMethod::Options => "OPTIONS",
        }
    }

    /// Whether a request body on this method is unusual enough to warn about.
    pub fn discourages_body(&self) -> bool {
        matches!(self, HttpMethod::Get | HttpMethod::Head | HttpMethod::Delete)
    }
}

impl fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a parameter travels on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Location {
    /// Bound to a `{name}` placeholder of the pattern
    Path,
    /// Carried in the query string
    Query,
    /// A field of the implicit JSON request record
    Body,
    /// The request-context carrier; never on the wire
    Context,
}

impl Location {
    pub fn as_str(&self) -> &'static str {
        match self {
            Location::Path => "path",
            Location::Query => "query",
            Location::Body => "body",
            Location::Context => "context",
        }
    }
}

impl fmt::Display for Location {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A parameter with its resolved location.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ParamBinding {
    pub name: String,
    pub ty: String,
    pub location: Location,
    /// Key used on the wire: placeholder or query key, or body field name
    pub wire_name: String,
}

/// One HTTP-routable method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct Operation {
    pub name: String,
    pub method: HttpMethod,
    pub pattern: String,
    /// All parameters in declared order, context parameters included
    pub params: Vec<ParamBinding>,
    pub returns: Vec<ReturnValue>,
    /// The declared return type verbatim, empty for `()`
    pub return_type: String,
    pub is_async: bool,
    pub annotation: Annotation,
}

impl Operation {
    pub fn params_in(&self, location: Location) -> impl Iterator<Item = &ParamBinding> {
        self.params.iter().filter(move |p| p.location == location)
    }

    /// Parameters that appear on the wire, in declared order.
    pub fn wire_params(&self) -> impl Iterator<Item = &ParamBinding> {
        self.params.iter().filter(|p| p.location != Location::Context)
    }

    pub fn success(&self) -> Option<&ReturnValue> {
        self.returns.iter().find(|r| !r.is_error)
    }

    pub fn error(&self) -> Option<&ReturnValue> {
        self.returns.last().filter(|r| r.is_error)
    }
}

/// Metadata about the interface the operations come from.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageInfo {
    /// Snake-case name of the service, used in headers and span names
    pub name: String,
    pub service_trait: String,
    /// Module path the generated code imports the trait from
    pub service_path: String,
    pub async_trait: bool,
}

/// The validated operations of one interface, in declaration order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ServiceSpecification {
    pub package: PackageInfo,
    pub operations: Vec<Operation>,
    pub imports: Vec<String>,
}

impl ServiceSpecification {
    pub fn operation(&self, name: &str) -> Option<&Operation> {
        self.operations.iter().find(|op| op.name == name)
    }
}
