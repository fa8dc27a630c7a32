//! Temporary config files for tests

use assert_fs::TempDir;
use std::fs;
use std::path::PathBuf;

/// Create a temporary directory for testing
///
/// The directory will be automatically cleaned up when the `TempDir` is dropped.
pub fn temp_dir() -> TempDir {
    TempDir::new().expect("Failed to create temp directory")
}

/// Write `content` to `jlog.toml` in a fresh temp directory
///
/// # Returns
///
/// Tuple of (TempDir, PathBuf) where PathBuf is the path to the created file
///
/// # Example
///
/// ```rust
/// use jlog_test_helpers::workspace::config_file;
///
/// let (_dir, path) = config_file("print_correlation = false\n");
/// assert!(path.exists());
/// ```
pub fn config_file(content: &str) -> (TempDir, PathBuf) {
    let temp = temp_dir();
    let file_path = temp.path().join("jlog.toml");
    fs::write(&file_path, content).expect("Failed to write config file");
    (temp, file_path)
}
