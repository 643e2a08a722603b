use anyhow::{Context, Result};
use log::debug;
use std::fs;
use std::path::{Path, PathBuf};

/// Parser turning Rust source files into syntax trees.
///
/// The `AstParser` uses the `syn` crate so the service trait and its doc comments can be
/// inspected by the [`crate::provider`] module.
///
/// # Example
///
/// ```no_run
/// use routekit::parser::AstParser;
/// use std::path::Path;
///
/// let parsed = AstParser::parse_file(Path::new("src/service.rs")).unwrap();
/// println!("Parsed {} items", parsed.syntax_tree.items.len());
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug, Clone)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Reads and parses a single Rust source file.
    ///
    /// # Errors
    ///
    /// Returns an error if:
    /// - The file cannot be read
    /// - The file contains invalid Rust syntax
    pub fn parse_file(path: &Path) -> Result<ParsedFile> {
        debug!("Parsing file: {}", path.display());

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read file: {}", path.display()))?;

        Self::parse_source(path, &content)
    }

    /// Parses Rust source text that is already in memory.
    ///
    /// `path` is only recorded for error messages and logging.
    pub fn parse_source(path: &Path, content: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content)
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", path.display()))?;

        debug!(
            "Parsed {} top-level items from {}",
            syntax_tree.items.len(),
            path.display()
        );

        Ok(ParsedFile {
            path: path.to_path_buf(),
            syntax_tree,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;
    use tempfile::TempDir;

    fn create_temp_file(dir: &TempDir, name: &str, content: &str) -> PathBuf {
        let file_path = dir.path().join(name);
        let mut file = fs::File::create(&file_path).unwrap();
        file.write_all(content.as_bytes()).unwrap();
        file_path
    }

    #[test]
    fn test_parse_service_trait_file() {
        let temp_dir = TempDir::new().unwrap();
        let code = r#"
            use crate::model::Item;

            pub trait ItemService {
                /// @http(op): GET /items/{id}
                fn get_item(&self, id: u32) -> Result<Item, Error>;
            }
        "#;

        let file_path = create_temp_file(&temp_dir, "service.rs", code);
        let parsed = AstParser::parse_file(&file_path).unwrap();

        assert_eq!(parsed.path, file_path);
        assert_eq!(parsed.syntax_tree.items.len(), 2);
    }

    #[test]
    fn test_parse_invalid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let invalid_code = r#"
            pub trait Broken {
                fn get(&self, id: u32 -> u32;
            }
        "#;

        let file_path = create_temp_file(&temp_dir, "invalid.rs", invalid_code);
        let result = AstParser::parse_file(&file_path);

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to parse Rust syntax"));
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let result = AstParser::parse_file(Path::new("/nonexistent/service.rs"));

        assert!(result.is_err());
        let err_msg = result.unwrap_err().to_string();
        assert!(err_msg.contains("Failed to read file"));
    }

    #[test]
    fn test_parse_source_keeps_doc_attributes() {
        let code = r#"
            pub trait Svc {
                /// first line
                /// @http(op): POST /upload
                fn upload(&self);
            }
        "#;
        let parsed = AstParser::parse_source(Path::new("svc.rs"), code).unwrap();

        let syn::Item::Trait(item_trait) = &parsed.syntax_tree.items[0] else {
            panic!("expected a trait item");
        };
        let syn::TraitItem::Fn(method) = &item_trait.items[0] else {
            panic!("expected a method");
        };
        let docs = method
            .attrs
            .iter()
            .filter(|attr| attr.path().is_ident("doc"))
            .count();
        assert_eq!(docs, 2);
    }

    #[test]
    fn test_parse_empty_source() {
        let parsed = AstParser::parse_source(Path::new("empty.rs"), "").unwrap();
        assert!(parsed.syntax_tree.items.is_empty());
    }
}
