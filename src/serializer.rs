//! Serialization of the Service Specification and writing of generated artifacts.
//!
//! Dumping the specification lets a reader see exactly what the backends are fed: every
//! operation with its resolved parameter locations and wire names.

use crate::backend::Artifact;
use crate::spec::ServiceSpecification;
use anyhow::{Context, Result};
use log::{debug, info};
use std::fs;
use std::path::{Path, PathBuf};

/// Serializes a Service Specification to YAML.
///
/// # Example
///
/// ```no_run
/// use routekit::parser::AstParser;
/// use routekit::provider::{SynTraitProvider, TypeProvider};
/// use routekit::serializer::serialize_yaml;
/// use routekit::spec::builder::{BuildOptions, SpecBuilder};
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/service.rs")).unwrap();
/// let service = SynTraitProvider::new(&parsed, "ItemService", &[]).describe().unwrap();
/// let spec = SpecBuilder::new(BuildOptions::default()).build(&service).unwrap();
/// println!("{}", serialize_yaml(&spec).unwrap());
/// ```
pub fn serialize_yaml(spec: &ServiceSpecification) -> Result<String> {
    debug!("Serializing specification of {} to YAML", spec.package.service_trait);
    serde_yaml::to_string(spec).context("Failed to serialize specification to YAML")
}

/// Serializes a Service Specification to pretty-printed JSON.
pub fn serialize_json(spec: &ServiceSpecification) -> Result<String> {
    debug!("Serializing specification of {} to JSON", spec.package.service_trait);
    serde_json::to_string_pretty(spec).context("Failed to serialize specification to JSON")
}

/// Writes string content to a file, creating parent directories as needed.
pub fn write_to_file(content: &str, path: &Path) -> Result<()> {
    debug!("Writing content to file: {}", path.display());

    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent)
            .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
    }

    fs::write(path, content)
        .with_context(|| format!("Failed to write to file: {}", path.display()))?;

    debug!("Successfully wrote {} bytes to {}", content.len(), path.display());
    Ok(())
}

/// Writes every artifact below `out_dir` and returns the written paths.
pub fn write_artifacts(artifacts: &[Artifact], out_dir: &Path) -> Result<Vec<PathBuf>> {
    let mut written = Vec::with_capacity(artifacts.len());
    for artifact in artifacts {
        let path = out_dir.join(&artifact.file_name);
        write_to_file(&artifact.content, &path)?;
        info!("Wrote {} artifact to {}", artifact.backend, path.display());
        written.push(path);
    }
    Ok(written)
}
