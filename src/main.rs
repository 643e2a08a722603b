//! routekit - Command-line front end of the HTTP binding generator.
//!
//! Reads a Rust source file (or crate directory) declaring an annotated service trait
//! and writes an axum router, a reqwest client and HTTP tests for it.
//!
//! # Usage
//!
//! ```bash
//! routekit [OPTIONS] --trait <NAME> <SOURCE>
//! ```
//!
//! # Examples
//!
//! Generate all artifacts into `src/gen`:
//! ```bash
//! routekit src/service.rs -t ItemService -o src/gen
//! ```
//!
//! Generate tests from a fixture file:
//! ```bash
//! routekit src/service.rs -t ItemService -b test --fixtures service.test.yaml -o src/gen
//! ```
//!
//! Inspect the specification the backends are fed:
//! ```bash
//! routekit src/service.rs -t ItemService --dump-spec yaml
//! ```

use anyhow::Result;
use clap::Parser;
use log::info;
use routekit::cli;

fn main() -> Result<()> {
    // Parse once to read the verbose flag before the logger exists
    let args_for_verbose = cli::CliArgs::parse();

    let log_level = if args_for_verbose.verbose {
        log::LevelFilter::Debug
    } else {
        log::LevelFilter::Info
    };

    env_logger::Builder::from_default_env()
        .filter_level(log_level)
        .init();

    info!("routekit starting...");

    let args = cli::parse_args_from_parsed(args_for_verbose)?;

    cli::run(args)?;

    Ok(())
}
