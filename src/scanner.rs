use crate::parser::{AstParser, ParsedFile};
use crate::provider::find_item_trait;
use anyhow::{bail, Result};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;
use walkdir::WalkDir;

/// Locates the source file that declares a service trait.
///
/// The scanner walks a crate directory, skipping `target` and hidden directories, and
/// visits `.rs` files in file-name order so repeated runs pick the same file.
///
/// # Example
///
/// ```no_run
/// use routekit::scanner::SourceScanner;
/// use std::path::PathBuf;
///
/// let scanner = SourceScanner::new(PathBuf::from("./my-service"));
/// let parsed = scanner.find_trait("ItemService").unwrap();
/// println!("ItemService is declared in {}", parsed.path.display());
/// ```
pub struct SourceScanner {
    root_path: PathBuf,
}

/// Result of a directory walk.
pub struct ScanResult {
    /// Every `.rs` file found, in walk order
    pub rust_files: Vec<PathBuf>,
    /// Paths that could not be accessed
    pub warnings: Vec<String>,
}

impl SourceScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Collects all `.rs` files below the root.
    pub fn scan(&self) -> Result<ScanResult> {
        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        let walker = WalkDir::new(&self.root_path)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            });

        for entry in walker {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(path.to_path_buf());
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }

    /// Returns the first file that declares `trait <trait_name>`.
    ///
    /// Files are filtered textually before parsing; files that fail to parse are skipped
    /// with a warning since they cannot contain a usable declaration anyway.
    pub fn find_trait(&self, trait_name: &str) -> Result<ParsedFile> {
        let scan = self.scan()?;
        debug!(
            "Looking for trait {} in {} files",
            trait_name,
            scan.rust_files.len()
        );

        let needle = format!("trait {}", trait_name);
        for path in &scan.rust_files {
            let content = match fs::read_to_string(path) {
                Ok(content) => content,
                Err(e) => {
                    warn!("Failed to read {}: {}", path.display(), e);
                    continue;
                }
            };
            if !content.contains(&needle) {
                continue;
            }

            match AstParser::parse_source(path, &content) {
                Ok(parsed) if declares_trait(&parsed, trait_name) => return Ok(parsed),
                Ok(_) => {}
                Err(e) => warn!("Skipping {}: {:#}", path.display(), e),
            }
        }

        bail!(
            "No file under {} declares trait {}",
            self.root_path.display(),
            trait_name
        )
    }
}

fn declares_trait(parsed: &ParsedFile, trait_name: &str) -> bool {
    find_item_trait(&parsed.syntax_tree, trait_name).is_some()
}
