//! Compiles the generated artifacts inside a scratch crate and runs its tests: the
//! fixture-driven `http_test.rs` plus a client round trip through the router.
//!
//! The scratch crate pulls axum, reqwest and tokio from crates.io, so this test is
//! ignored by default:
//!
//! ```bash
//! cargo test --test generated_crate_test -- --ignored
//! ```

use routekit::{
    backend::{generate, BackendKind, GenerationInput},
    config::GeneratorConfig,
    fixture::FixtureFile,
    parser::AstParser,
    provider::{SynTraitProvider, TypeProvider},
    serializer::{write_artifacts, write_to_file},
    spec::builder::SpecBuilder,
};
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

const SERVICE_SOURCE: &str = include_str!("fixtures/item_service.rs");
const FIXTURE_SOURCE: &str = include_str!("fixtures/item_service.test.yaml");
const CRATE_MANIFEST: &str = include_str!("fixtures/item_crate/Cargo.toml.in");
const CRATE_LIB: &str = include_str!("fixtures/item_crate/lib.rs");
const CRATE_MODEL: &str = include_str!("fixtures/item_crate/model.rs");
const CRATE_ROUND_TRIP: &str = include_str!("fixtures/item_crate/round_trip.rs");

/// Writes the scratch crate with freshly generated artifacts under `src/generated`.
fn write_item_crate(root: &Path) {
    let config = GeneratorConfig {
        service_path: "crate::service".to_string(),
        imports: vec!["use crate::model::{error_from_response, error_to_response};".to_string()],
        ..GeneratorConfig::default()
    };

    let parsed = AstParser::parse_source(Path::new("src/service.rs"), SERVICE_SOURCE).unwrap();
    let service = SynTraitProvider::new(&parsed, "ItemService", &config.context_types)
        .describe()
        .unwrap();
    let spec = SpecBuilder::new(config.build_options()).build(&service).unwrap();
    let fixtures = FixtureFile::from_yaml(FIXTURE_SOURCE).unwrap();
    let codecs = config.codec_registry();
    let options = config.generation_options().unwrap();
    let input = GenerationInput {
        spec: &spec,
        codecs: &codecs,
        options: &options,
        fixtures: Some(&fixtures),
    };
    let artifacts = generate(&input, &BackendKind::ALL).unwrap();

    write_to_file(CRATE_MANIFEST, &root.join("Cargo.toml")).unwrap();
    write_to_file(CRATE_LIB, &root.join("src/lib.rs")).unwrap();
    write_to_file(CRATE_MODEL, &root.join("src/model.rs")).unwrap();
    write_to_file(CRATE_ROUND_TRIP, &root.join("src/round_trip.rs")).unwrap();
    write_to_file(SERVICE_SOURCE, &root.join("src/service.rs")).unwrap();
    write_artifacts(&artifacts, &root.join("src/generated")).unwrap();
}

#[test]
fn test_scratch_crate_layout() {
    let temp_dir = TempDir::new().unwrap();
    write_item_crate(temp_dir.path());

    for file in [
        "Cargo.toml",
        "src/lib.rs",
        "src/model.rs",
        "src/service.rs",
        "src/generated/http.rs",
        "src/generated/http_client.rs",
        "src/generated/http_test.rs",
    ] {
        assert!(temp_dir.path().join(file).is_file(), "{file} should be written");
    }
}

#[test]
#[ignore = "builds a scratch crate against crates.io dependencies"]
fn test_generated_crate_compiles_and_passes() {
    let temp_dir = TempDir::new().unwrap();
    write_item_crate(temp_dir.path());

    let cargo = std::env::var("CARGO").unwrap_or_else(|_| "cargo".to_string());
    let target_dir = PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("target/item-crate");
    let output = Command::new(cargo)
        .arg("test")
        .arg("--manifest-path")
        .arg(temp_dir.path().join("Cargo.toml"))
        .env("CARGO_TARGET_DIR", target_dir)
        .output()
        .expect("Failed to run cargo");

    let stdout = String::from_utf8_lossy(&output.stdout);
    let stderr = String::from_utf8_lossy(&output.stderr);
    assert!(
        output.status.success(),
        "generated crate failed:\n{}\n{}",
        stdout,
        stderr
    );
    assert!(stdout.contains("test generated::http_test::test_http_upload ... ok"));
    assert!(stdout.contains("test generated::http_test::test_http_list_items ... ok"));
    assert!(stdout.contains("test round_trip::client_round_trips_through_router ... ok"));
}
