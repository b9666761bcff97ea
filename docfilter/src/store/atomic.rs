//! Atomic file write operations.
//!
//! Collection files are rewritten whole, so every write goes to a temp file
//! that is renamed over the target.

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

/// Generate a temp path next to the target.
/// Format: {dir}/.tmp.{random}.{filename}
pub fn temp_path(final_path: &Path) -> PathBuf {
    let filename = final_path
        .file_name()
        .and_then(|s| s.to_str())
        .unwrap_or("file");
    let random: u64 = rand::random();
    let temp_name = format!(".tmp.{:016x}.{}", random, filename);
    final_path.with_file_name(temp_name)
}

/// Rename the temp file over the target, removing it on failure.
pub fn rename_into_place(temp_path: &Path, final_path: &Path) -> io::Result<()> {
    fs::rename(temp_path, final_path).inspect_err(|_| {
        let _ = fs::remove_file(temp_path);
    })
}

/// Replace the file's content atomically.
pub fn write_file(final_path: &Path, content: &[u8]) -> io::Result<()> {
    let temp = temp_path(final_path);
    fs::write(&temp, content)?;
    rename_into_place(&temp, final_path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_temp_path() {
        let final_path = Path::new("/tmp/test/users.jsonl");
        let temp = temp_path(final_path);

        // Temp path should be in same directory
        assert_eq!(temp.parent(), final_path.parent());

        let filename = temp.file_name().unwrap().to_str().unwrap();
        assert!(filename.starts_with(".tmp."));
        assert!(filename.ends_with(".users.jsonl"));
    }

    #[test]
    fn test_write_file_replaces_content() {
        let tmp = TempDir::new().unwrap();
        let final_path = tmp.path().join("users.jsonl");

        write_file(&final_path, b"first").unwrap();
        write_file(&final_path, b"second").unwrap();
        assert_eq!(fs::read(&final_path).unwrap(), b"second");

        // No temp files should remain
        let temps: Vec<_> = fs::read_dir(tmp.path())
            .unwrap()
            .filter_map(|e| e.ok())
            .filter(|e| e.file_name().to_str().unwrap_or("").starts_with(".tmp."))
            .collect();
        assert!(temps.is_empty(), "No temp files should remain");
    }

    #[test]
    fn test_write_into_missing_dir_fails() {
        let tmp = TempDir::new().unwrap();
        let final_path = tmp.path().join("nope").join("users.jsonl");
        assert!(write_file(&final_path, b"x").is_err());
    }
}
