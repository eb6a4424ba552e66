use crate::error::Error;
use crate::scanner::SourceFile;
use anyhow::{Context, Result};
use log::{debug, warn};
use std::fs;
use std::path::PathBuf;

/// Parser turning Rust source files into `syn` syntax trees.
///
/// # Example
///
/// ```
/// use rest_doc_from_source::parser::AstParser;
///
/// let parsed = AstParser::parse_source("src/api.rs", "pub struct Api;").unwrap();
/// assert_eq!(parsed.syntax_tree.items.len(), 1);
/// ```
pub struct AstParser;

/// A successfully parsed Rust file with its abstract syntax tree.
#[derive(Debug)]
pub struct ParsedFile {
    /// Path to the source file
    pub path: PathBuf,
    /// `/`-separated path relative to the project root
    pub relative_path: String,
    /// The parsed abstract syntax tree
    pub syntax_tree: syn::File,
}

impl AstParser {
    /// Reads and parses one scanned file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or contains invalid Rust syntax.
    pub fn parse_file(file: &SourceFile) -> Result<ParsedFile> {
        debug!("Parsing file: {}", file.path.display());

        let content = fs::read_to_string(&file.path)
            .with_context(|| format!("Failed to read file: {}", file.path.display()))?;
        let mut parsed = Self::parse_source(&file.relative, &content)?;
        parsed.path = file.path.clone();
        Ok(parsed)
    }

    /// Parses in-memory source attributed to `relative_path`
    pub fn parse_source(relative_path: &str, content: &str) -> Result<ParsedFile> {
        let syntax_tree = syn::parse_file(content)
            .map_err(|e| Error::ParseError {
                file: PathBuf::from(relative_path),
                message: e.to_string(),
            })
            .with_context(|| format!("Failed to parse Rust syntax in file: {}", relative_path))?;

        Ok(ParsedFile {
            path: PathBuf::from(relative_path),
            relative_path: relative_path.to_string(),
            syntax_tree,
        })
    }

    /// Parses every file, logging failures and keeping only the successes
    pub fn parse_files(files: &[SourceFile]) -> Vec<ParsedFile> {
        debug!("Parsing {} files", files.len());

        let parsed: Vec<ParsedFile> = files
            .iter()
            .filter_map(|file| match Self::parse_file(file) {
                Ok(parsed) => Some(parsed),
                Err(e) => {
                    warn!("Skipping {}: {:#}", file.relative, e);
                    None
                }
            })
            .collect();

        debug!(
            "Parsing complete: {} succeeded, {} skipped",
            parsed.len(),
            files.len() - parsed.len()
        );
        parsed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn source_file(dir: &TempDir, name: &str, content: &str) -> SourceFile {
        let path = dir.path().join(name);
        fs::write(&path, content).unwrap();
        SourceFile::new(dir.path(), path)
    }

    #[test]
    fn test_parse_valid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = source_file(
            &temp_dir,
            "valid.rs",
            r#"
            pub struct User {
                pub id: u32,
                pub name: String,
            }
        "#,
        );

        let parsed = AstParser::parse_file(&file).unwrap();

        assert_eq!(parsed.path, file.path);
        assert_eq!(parsed.relative_path, "valid.rs");
        assert_eq!(parsed.syntax_tree.items.len(), 1);
    }

    #[test]
    fn test_parse_invalid_rust_file() {
        let temp_dir = TempDir::new().unwrap();
        let file = source_file(&temp_dir, "invalid.rs", "fn broken( {");

        let err = AstParser::parse_file(&file).unwrap_err();

        assert!(err.to_string().contains("Failed to parse Rust syntax"));
        let cause = err.downcast_ref::<Error>().unwrap();
        match cause {
            Error::ParseError { file, .. } => assert_eq!(file, &PathBuf::from("invalid.rs")),
            other => panic!("unexpected error: {}", other),
        }
    }

    #[test]
    fn test_parse_nonexistent_file() {
        let file = SourceFile {
            path: PathBuf::from("/nonexistent/file.rs"),
            relative: "file.rs".to_string(),
        };

        let err = AstParser::parse_file(&file).unwrap_err();
        assert!(err.to_string().contains("Failed to read file"));
    }

    #[test]
    fn test_parse_files_skips_failures() {
        let temp_dir = TempDir::new().unwrap();
        let files = vec![
            source_file(&temp_dir, "a.rs", "pub fn hello() {}"),
            source_file(&temp_dir, "b.rs", "pub fn broken( {"),
            source_file(&temp_dir, "c.rs", "pub struct World;"),
        ];

        let parsed = AstParser::parse_files(&files);

        let names: Vec<_> = parsed.iter().map(|p| p.relative_path.as_str()).collect();
        assert_eq!(names, vec!["a.rs", "c.rs"]);
    }

    #[test]
    fn test_parse_empty_source() {
        let parsed = AstParser::parse_source("empty.rs", "").unwrap();
        assert!(parsed.syntax_tree.items.is_empty());
    }
}
