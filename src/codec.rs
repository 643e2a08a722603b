//! Codec resolution: which body and failure codecs each operation uses.
//!
//! The registry is built once from configuration and never changes afterwards;
//! [`CodecRegistry::resolve_all`] is a pure lookup that fails at generation time on any
//! reference to an undefined codec.

use crate::error::{GenerationError, Result};
use crate::spec::{Operation, ServiceSpecification};
use log::{debug, warn};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// Content type of the built-in JSON codec.
pub const JSON_CONTENT_TYPE: &str = "application/json; charset=utf-8";

/// Name under which the built-in codec can be referenced explicitly.
pub const DEFAULT_CODEC: &str = "json";

pub const DEFAULT_ERROR_ENCODER: &str = "error_to_response";
pub const DEFAULT_ERROR_DECODER: &str = "error_from_response";

/// A user-defined codec, as declared in configuration.
///
/// `module` names a Rust module exposing `decode_request_body`, `encode_request_body`,
/// `decode_response_body` and `encode_response_body`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CodecDefinition {
    pub name: String,
    pub module: String,
    pub content_type: String,
    #[serde(default)]
    pub failure_encoder: Option<String>,
    #[serde(default)]
    pub failure_decoder: Option<String>,
}

/// How a request or response body is encoded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "lowercase")]
pub enum BodyCodec {
    Json,
    Custom {
        name: String,
        module: String,
        content_type: String,
    },
}

impl BodyCodec {
    pub fn content_type(&self) -> &str {
        match self {
            BodyCodec::Json => JSON_CONTENT_TYPE,
            BodyCodec::Custom { content_type, .. } => content_type,
        }
    }

    pub fn name(&self) -> &str {
        match self {
            BodyCodec::Json => DEFAULT_CODEC,
            BodyCodec::Custom { name, .. } => name,
        }
    }
}

/// Functions mapping business errors to responses and back.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FailureCodec {
    /// Server side: `fn(E) -> (u16, impl Serialize)`
    pub encoder: String,
    /// Client side: `fn(u16, &[u8]) -> E`
    pub decoder: String,
}

/// The codecs resolved for one operation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct CodecEntry {
    pub request: BodyCodec,
    pub response: BodyCodec,
    pub failure: FailureCodec,
}

/// Operation name to resolved codecs.
pub type ResolvedCodecs = BTreeMap<String, CodecEntry>;

/// Immutable lookup table of codec definitions and per-operation overrides.
#[derive(Debug, Clone)]
pub struct CodecRegistry {
    definitions: BTreeMap<String, CodecDefinition>,
    overrides: BTreeMap<String, String>,
    default_failure: FailureCodec,
}

impl Default for CodecRegistry {
    fn default() -> Self {
        Self::new(Vec::new(), BTreeMap::new())
    }
}

impl CodecRegistry {
    /// `overrides` maps operation names to codec names and beats `@http(codec)`.
    pub fn new(definitions: Vec<CodecDefinition>, overrides: BTreeMap<String, String>) -> Self {
        let definitions = definitions
            .into_iter()
            .map(|definition| (definition.name.clone(), definition))
            .collect();
        Self {
            definitions,
            overrides,
            default_failure: FailureCodec {
                encoder: DEFAULT_ERROR_ENCODER.to_string(),
                decoder: DEFAULT_ERROR_DECODER.to_string(),
            },
        }
    }

    /// Replaces the package-wide failure functions used when nothing more specific applies.
    pub fn with_default_failure(mut self, encoder: &str, decoder: &str) -> Self {
        self.default_failure = FailureCodec {
            encoder: encoder.to_string(),
            decoder: decoder.to_string(),
        };
        self
    }

    pub fn resolve(&self, op: &Operation) -> Result<CodecEntry> {
        let codec_name = self
            .overrides
            .get(&op.name)
            .or(op.annotation.codec.as_ref());

        let (body, definition) = match codec_name.map(String::as_str) {
            None | Some(DEFAULT_CODEC) => (BodyCodec::Json, None),
            Some(name) => {
                let definition = self
                    .definitions
                    .get(name)
                    .ok_or_else(|| GenerationError::UnknownCodec {
                        operation: op.name.clone(),
                        codec: name.to_string(),
                    })?;
                (
                    BodyCodec::Custom {
                        name: definition.name.clone(),
                        module: definition.module.clone(),
                        content_type: definition.content_type.clone(),
                    },
                    Some(definition),
                )
            }
        };

        let encoder = op
            .annotation
            .error_encoder
            .clone()
            .or_else(|| definition.and_then(|d| d.failure_encoder.clone()))
            .unwrap_or_else(|| self.default_failure.encoder.clone());
        let decoder = op
            .annotation
            .error_decoder
            .clone()
            .or_else(|| definition.and_then(|d| d.failure_decoder.clone()))
            .unwrap_or_else(|| self.default_failure.decoder.clone());

        debug!("Operation {} uses codec {}", op.name, body.name());

        Ok(CodecEntry {
            request: body.clone(),
            response: body,
            failure: FailureCodec { encoder, decoder },
        })
    }

    /// Resolves every operation of `spec`.
    pub fn resolve_all(&self, spec: &ServiceSpecification) -> Result<ResolvedCodecs> {
        for (operation, codec) in &self.overrides {
            if spec.operation(operation).is_none() {
                warn!(
                    "Codec override {} -> {} names no operation of {}",
                    operation, codec, spec.package.service_trait
                );
            }
        }

        spec.operations
            .iter()
            .map(|op| Ok((op.name.clone(), self.resolve(op)?)))
            .collect()
    }
}
