use anyhow::{Context, Result};
use log::{debug, warn};
use std::path::{Path, PathBuf};
use walkdir::WalkDir;

/// File scanner for traversing project directories.
///
/// The `FileScanner` recursively walks through a project directory to find all Rust source files.
/// It skips the `target` directory and hidden directories (those starting with `.`), and records
/// each file's path relative to the project root so endpoints can link back to their source.
///
/// # Example
///
/// ```no_run
/// use rest_doc_from_source::scanner::FileScanner;
/// use std::path::PathBuf;
///
/// let scanner = FileScanner::new(PathBuf::from("./my-project"));
/// let result = scanner.scan().unwrap();
/// println!("Found {} Rust files", result.rust_files.len());
/// ```
pub struct FileScanner {
    root_path: PathBuf,
}

/// A discovered Rust source file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceFile {
    /// Path as found on disk
    pub path: PathBuf,
    /// `/`-separated path relative to the scanned root
    pub relative: String,
}

impl SourceFile {
    pub fn new(root: &Path, path: PathBuf) -> Self {
        let relative = relative_path(root, &path);
        Self { path, relative }
    }
}

/// Result of directory scanning operation.
pub struct ScanResult {
    /// Discovered `.rs` files, ordered by relative path
    pub rust_files: Vec<SourceFile>,
    /// Warning messages for any issues encountered (e.g., inaccessible directories)
    pub warnings: Vec<String>,
}

/// `root/src/demo/api.rs` → `src/demo/api.rs`
pub fn relative_path(root: &Path, path: &Path) -> String {
    let relative = path.strip_prefix(root).unwrap_or(path);
    relative
        .components()
        .map(|c| c.as_os_str().to_string_lossy())
        .collect::<Vec<_>>()
        .join("/")
}

impl FileScanner {
    pub fn new(root_path: PathBuf) -> Self {
        Self { root_path }
    }

    /// Scans the directory tree and collects all `.rs` files.
    ///
    /// Inaccessible entries are logged and reported as warnings; scanning continues.
    ///
    /// # Errors
    ///
    /// Returns an error if the root path does not exist.
    pub fn scan(&self) -> Result<ScanResult> {
        std::fs::metadata(&self.root_path)
            .with_context(|| format!("Cannot access project path: {}", self.root_path.display()))?;

        let mut rust_files = Vec::new();
        let mut warnings = Vec::new();

        for entry in WalkDir::new(&self.root_path)
            .into_iter()
            .filter_entry(|e| {
                if e.path() == self.root_path {
                    return true;
                }
                let file_name = e.file_name().to_string_lossy();
                !file_name.starts_with('.') && file_name != "target"
            })
        {
            match entry {
                Ok(entry) => {
                    let path = entry.path();
                    if path.is_file() && path.extension().and_then(|s| s.to_str()) == Some("rs") {
                        rust_files.push(SourceFile::new(&self.root_path, path.to_path_buf()));
                    }
                }
                Err(e) => {
                    let warning = format!("Failed to access path: {}", e);
                    warn!("{}", warning);
                    warnings.push(warning);
                }
            }
        }

        rust_files.sort_by(|l, r| l.relative.cmp(&r.relative));
        debug!(
            "Found {} Rust file(s) under {}",
            rust_files.len(),
            self.root_path.display()
        );

        Ok(ScanResult {
            rust_files,
            warnings,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    fn relatives(result: &ScanResult) -> Vec<&str> {
        result.rust_files.iter().map(|f| f.relative.as_str()).collect()
    }

    #[test]
    fn test_scan_records_relative_paths() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir_all(root.join("src/demo")).unwrap();
        fs::write(root.join("src/lib.rs"), "pub mod demo;").unwrap();
        fs::write(root.join("src/demo/api.rs"), "pub struct Api;").unwrap();
        fs::write(root.join("readme.md"), "# README").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(relatives(&result), vec!["src/demo/api.rs", "src/lib.rs"]);
        assert!(result.warnings.is_empty());
        assert_eq!(result.rust_files[0].path, root.join("src/demo/api.rs"));
    }

    #[test]
    fn test_scan_empty_directory() {
        let temp_dir = TempDir::new().unwrap();

        let result = FileScanner::new(temp_dir.path().to_path_buf()).scan().unwrap();

        assert!(result.rust_files.is_empty());
        assert!(result.warnings.is_empty());
    }

    #[test]
    fn test_scan_missing_root_fails() {
        let temp_dir = TempDir::new().unwrap();
        let missing = temp_dir.path().join("nope");

        let err = FileScanner::new(missing).scan().err().unwrap();
        assert!(err.to_string().contains("Cannot access project path"));
    }

    #[test]
    fn test_scan_skips_target_and_hidden_directories() {
        let temp_dir = TempDir::new().unwrap();
        let root = temp_dir.path();

        fs::create_dir(root.join("target")).unwrap();
        fs::write(root.join("target/build.rs"), "fn main() {}").unwrap();
        fs::create_dir(root.join(".git")).unwrap();
        fs::write(root.join(".git/config.rs"), "// config").unwrap();
        fs::write(root.join("main.rs"), "fn main() {}").unwrap();

        let result = FileScanner::new(root.to_path_buf()).scan().unwrap();

        assert_eq!(relatives(&result), vec!["main.rs"]);
    }

    #[test]
    fn test_relative_path_outside_root_is_kept() {
        let path = Path::new("other/file.rs");
        assert_eq!(relative_path(Path::new("/project"), path), "other/file.rs");
    }
}
