//! Template rendering engine.
//!
//! Templates are named assets handed in by the caller; helpers are plain functions
//! registered on a fresh [`minijinja::Environment`] for every render, so nothing leaks
//! between runs and identical inputs always produce identical text.

pub mod helpers;

use crate::error::{GenerationError, Result};
use anyhow::Context;
use minijinja::{AutoEscape, Environment, UndefinedBehavior};
use serde::Serialize;
use std::fs;
use std::path::Path;

pub const SERVER_TEMPLATE: &str = include_str!("../../templates/server.rs.j2");
pub const CLIENT_TEMPLATE: &str = include_str!("../../templates/client.rs.j2");
pub const TEST_TEMPLATE: &str = include_str!("../../templates/http_test.rs.j2");

/// A named template source.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TemplateAsset {
    pub name: String,
    pub source: String,
}

impl TemplateAsset {
    pub fn new(name: &str, source: &str) -> Self {
        Self {
            name: name.to_string(),
            source: source.to_string(),
        }
    }

    /// Loads a template from disk; the file name becomes the template name.
    pub fn from_file(path: &Path) -> anyhow::Result<Self> {
        let source = fs::read_to_string(path)
            .with_context(|| format!("Failed to read template: {}", path.display()))?;
        let name = path
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| path.display().to_string());
        Ok(Self { name, source })
    }
}

/// Registers helpers on an environment.
pub type HelperRegistrar = fn(&mut Environment<'_>);

/// Renders template assets against a serializable context.
pub struct RenderEngine {
    registrars: Vec<HelperRegistrar>,
}

impl Default for RenderEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RenderEngine {
    /// An engine with the shared helpers registered.
    pub fn new() -> Self {
        Self {
            registrars: vec![helpers::register_shared],
        }
    }

    /// Adds backend-specific helpers.
    pub fn with_helpers(mut self, registrar: HelperRegistrar) -> Self {
        self.registrars.push(registrar);
        self
    }

    pub fn render<S: Serialize>(&self, asset: &TemplateAsset, context: &S) -> Result<String> {
        let mut env = Environment::new();
        env.set_undefined_behavior(UndefinedBehavior::Strict);
        env.set_trim_blocks(true);
        env.set_lstrip_blocks(true);
        env.set_keep_trailing_newline(true);
        env.set_auto_escape_callback(|_| AutoEscape::None);
        for registrar in &self.registrars {
            registrar(&mut env);
        }

        env.add_template(&asset.name, &asset.source)
            .map_err(|e| surface_error(&asset.name, e))?;
        let template = env
            .get_template(&asset.name)
            .map_err(|e| surface_error(&asset.name, e))?;
        template
            .render(context)
            .map_err(|e| surface_error(&asset.name, e))
    }
}

/// Recovers a generation error raised inside a helper; anything else is a template
/// failure.
fn surface_error(template: &str, err: minijinja::Error) -> GenerationError {
    let mut source: Option<&(dyn std::error::Error + 'static)> = Some(&err);
    while let Some(current) = source {
        if let Some(generation) = current.downcast_ref::<GenerationError>() {
            return generation.clone();
        }
        source = current.source();
    }
    GenerationError::Template {
        template: template.to_string(),
        message: err.to_string(),
    }
}
