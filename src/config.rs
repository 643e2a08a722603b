//! Generator configuration file.
//!
//! All fields are optional; command-line flags override what the file sets.
//!
//! ```yaml
//! service_path: crate::service
//! context_types: [Context, RequestContext]
//! enable_tracing: true
//! body_field_case: camel
//! error_encoder: crate::errors::error_to_response
//! error_decoder: crate::errors::error_from_response
//! router_path: super::http
//! imports:
//!   - use crate::model::*;
//! codecs:
//!   - name: msgpack
//!     module: crate::codecs::msgpack
//!     content_type: application/msgpack
//! codec_overrides:
//!   upload: msgpack
//! templates:
//!   client: templates/client.rs.j2
//! ```

use crate::backend::{BackendKind, GenerationOptions};
use crate::codec::{CodecDefinition, CodecRegistry, DEFAULT_ERROR_DECODER, DEFAULT_ERROR_ENCODER};
use crate::render::TemplateAsset;
use crate::spec::builder::{BuildOptions, FieldCase};
use anyhow::{Context, Result};
use log::debug;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct GeneratorConfig {
    /// Module path the generated code imports the service trait from
    pub service_path: String,
    /// Type names marking the request-context parameter
    pub context_types: Vec<String>,
    pub enable_tracing: bool,
    pub body_field_case: FieldCase,
    /// Package-wide failure encoder, `fn(E) -> (u16, impl Serialize)`
    pub error_encoder: String,
    /// Package-wide failure decoder, `fn(u16, &[u8]) -> E`
    pub error_decoder: String,
    /// Module path the generated tests import `new_http_router` from
    pub router_path: String,
    pub imports: Vec<String>,
    pub codecs: Vec<CodecDefinition>,
    /// Operation name to codec name
    pub codec_overrides: BTreeMap<String, String>,
    pub templates: TemplatePaths,
}

/// Replacement template files, relative to the configuration file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct TemplatePaths {
    pub server: Option<PathBuf>,
    pub client: Option<PathBuf>,
    pub test: Option<PathBuf>,
}

impl Default for GeneratorConfig {
    fn default() -> Self {
        Self {
            service_path: "crate".to_string(),
            context_types: vec!["Context".to_string()],
            enable_tracing: false,
            body_field_case: FieldCase::Snake,
            error_encoder: DEFAULT_ERROR_ENCODER.to_string(),
            error_decoder: DEFAULT_ERROR_DECODER.to_string(),
            router_path: "super::http".to_string(),
            imports: Vec::new(),
            codecs: Vec::new(),
            codec_overrides: BTreeMap::new(),
            templates: TemplatePaths::default(),
        }
    }
}

impl GeneratorConfig {
    /// Loads a configuration file; relative template paths are resolved against its
    /// directory.
    pub fn load(path: &Path) -> Result<Self> {
        debug!("Loading configuration from {}", path.display());
        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {}", path.display()))?;
        let mut config = Self::from_yaml(&content)
            .with_context(|| format!("Invalid config file: {}", path.display()))?;

        if let Some(base) = path.parent() {
            for template in [
                &mut config.templates.server,
                &mut config.templates.client,
                &mut config.templates.test,
            ]
            .into_iter()
            .flatten()
            {
                if template.is_relative() {
                    *template = base.join(&*template);
                }
            }
        }
        Ok(config)
    }

    pub fn from_yaml(content: &str) -> Result<Self> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        let config: GeneratorConfig = serde_yaml::from_str(content)?;
        Ok(config)
    }

    pub fn build_options(&self) -> BuildOptions {
        BuildOptions {
            service_path: self.service_path.clone(),
            body_field_case: self.body_field_case,
        }
    }

    pub fn codec_registry(&self) -> CodecRegistry {
        CodecRegistry::new(self.codecs.clone(), self.codec_overrides.clone())
            .with_default_failure(&self.error_encoder, &self.error_decoder)
    }

    /// Backend options, with replacement templates read from disk.
    pub fn generation_options(&self) -> Result<GenerationOptions> {
        let mut templates = BTreeMap::new();
        for (kind, path) in [
            (BackendKind::Server, &self.templates.server),
            (BackendKind::Client, &self.templates.client),
            (BackendKind::Test, &self.templates.test),
        ] {
            if let Some(path) = path {
                templates.insert(kind, TemplateAsset::from_file(path)?);
            }
        }

        Ok(GenerationOptions {
            enable_tracing: self.enable_tracing,
            router_path: self.router_path.clone(),
            imports: self.imports.clone(),
            templates,
        })
    }
}
