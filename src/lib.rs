//! routekit - HTTP bindings generated from an annotated Rust service trait.
//!
//! A service is described once, as a trait whose methods carry `@http` directives in
//! their doc comments:
//!
//! ```text
//! pub trait ItemService {
//!     /// @http(op): GET /items/{id}
//!     fn get_item(&self, ctx: &Context, id: u32) -> Result<Item, ItemError>;
//!
//!     /// @http(op): GET /items
//!     /// @http(param): limit in=query
//!     fn list_items(&self, limit: Option<i32>) -> Result<Vec<Item>, ItemError>;
//! }
//! ```
//!
//! From that trait the generator produces three artifacts that agree on every route:
//! an axum router dispatching to any implementation of the trait, a reqwest client
//! exposing the trait's operations, and HTTP tests driven by a fixture file.
//!
//! # Architecture
//!
//! 1. [`scanner`] / [`parser`] - Locate and parse the file declaring the trait
//! 2. [`provider`] - Describe the trait's methods from the syntax tree
//! 3. [`annotation`] - Parse the `@http` directives
//! 4. [`spec`] - Build the Service Specification: routes and parameter bindings
//! 5. [`wire`] / [`codec`] - Wire encoding rules and body/failure codecs
//! 6. [`render`] / [`backend`] - Render the server, client and test artifacts
//! 7. [`fixture`] - Load and validate test fixtures
//! 8. [`serializer`] - Dump the specification and write artifacts
//!
//! # Example Usage
//!
//! ```no_run
//! use routekit::backend::{generate, BackendKind, GenerationInput};
//! use routekit::config::GeneratorConfig;
//! use routekit::parser::AstParser;
//! use routekit::provider::{SynTraitProvider, TypeProvider};
//! use routekit::spec::builder::SpecBuilder;
//! use std::path::Path;
//!
//! let config = GeneratorConfig::default();
//! let parsed = AstParser::parse_file(Path::new("src/service.rs")).unwrap();
//! let service = SynTraitProvider::new(&parsed, "ItemService", &config.context_types)
//!     .describe()
//!     .unwrap();
//! let spec = SpecBuilder::new(config.build_options()).build(&service).unwrap();
//!
//! let codecs = config.codec_registry();
//! let options = config.generation_options().unwrap();
//! let input = GenerationInput { spec: &spec, codecs: &codecs, options: &options, fixtures: None };
//! for artifact in generate(&input, &BackendKind::ALL).unwrap() {
//!     println!("{}:\n{}", artifact.file_name, artifact.content);
//! }
//! ```
//!
//! # Command-Line Interface
//!
//! For command-line usage, see the [`cli`] module.

pub mod annotation;
pub mod backend;
pub mod cli;
pub mod codec;
pub mod config;
pub mod error;
pub mod fixture;
pub mod parser;
pub mod provider;
pub mod render;
pub mod scanner;
pub mod serializer;
pub mod spec;
pub mod wire;
