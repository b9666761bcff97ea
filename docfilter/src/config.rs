//! Configuration for the document store.
//!
//! Root resolution order:
//! 1. Explicit path passed to Config::with_root()
//! 2. DOCFILTER_ROOT environment variable
//! 3. Default: platform data dir, falling back to ~/.local/share/docfilter

use std::path::{Path, PathBuf};

use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::{Error, Result};

/// Environment variable overriding the data root.
pub const ROOT_ENV_VAR: &str = "DOCFILTER_ROOT";

/// Store configuration.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Root directory for all store data.
    pub root: PathBuf,

    /// Field that receives auto-increment ids on create.
    #[serde(default = "default_id_field")]
    pub id_field: String,

    /// Limit applied to find when the caller gives none.
    #[serde(default)]
    pub default_limit: Option<usize>,
}

fn default_id_field() -> String {
    "id".to_string()
}

impl Config {
    /// Create a new config with the given root.
    pub fn with_root(root: impl Into<PathBuf>) -> Self {
        Self {
            root: root.into(),
            id_field: default_id_field(),
            default_limit: None,
        }
    }

    /// Create a config using default root resolution.
    pub fn default_location() -> Result<Self> {
        let root = resolve_root()?;
        Ok(Self::with_root(root))
    }

    /// Load config from ROOT/config.toml, or create default.
    pub fn load() -> Result<Self> {
        let root = resolve_root()?;
        Self::load_from(&root)
    }

    /// Load config from a specific root.
    pub fn load_from(root: &Path) -> Result<Self> {
        let config_path = root.join("config.toml");

        if config_path.exists() {
            let contents = std::fs::read_to_string(&config_path)?;
            let mut config: Config = toml::from_str(&contents)
                .map_err(|e| Error::Config(format!("Failed to parse config: {}", e)))?;
            // The directory we loaded from wins over a stale root entry
            config.root = root.to_path_buf();
            Ok(config)
        } else {
            Ok(Self::with_root(root))
        }
    }

    /// Save config to ROOT/config.toml.
    pub fn save(&self) -> Result<()> {
        std::fs::create_dir_all(&self.root)?;
        let contents = toml::to_string_pretty(self)
            .map_err(|e| Error::Config(format!("Failed to serialize config: {}", e)))?;
        std::fs::write(self.config_path(), contents)?;
        Ok(())
    }

    // Path helpers

    pub fn config_path(&self) -> PathBuf {
        self.root.join("config.toml")
    }

    /// Directory holding one file per collection.
    pub fn collections_dir(&self) -> PathBuf {
        self.root.join("collections")
    }

    /// JSON-lines file for a collection.
    pub fn collection_path(&self, name: &str) -> Result<PathBuf> {
        check_collection_name(name)?;
        Ok(self.collections_dir().join(format!("{}.jsonl", name)))
    }

    /// Auto-increment counters for all collections.
    pub fn sequences_path(&self) -> PathBuf {
        self.root.join("sequences.json")
    }
}

/// Collection names are used verbatim as file stems, so they must read back
/// unchanged: non-empty, letters, digits, '-', '_' and '.' only.
pub fn check_collection_name(name: &str) -> Result<()> {
    let valid = !name.is_empty()
        && name
            .chars()
            .all(|c| c.is_alphanumeric() || c == '-' || c == '_' || c == '.');
    if valid {
        Ok(())
    } else {
        Err(Error::Storage(format!(
            "invalid collection name {:?}: use letters, digits, '-', '_' or '.'",
            name
        )))
    }
}

/// Resolve the root using the standard resolution order.
fn resolve_root() -> Result<PathBuf> {
    // 1. Environment variable
    if let Ok(path) = std::env::var(ROOT_ENV_VAR) {
        return Ok(PathBuf::from(path));
    }

    // 2. XDG data directory (via directories crate)
    if let Some(proj_dirs) = ProjectDirs::from("", "", "docfilter") {
        return Ok(proj_dirs.data_dir().to_path_buf());
    }

    // 3. Fallback to ~/.local/share/docfilter
    let home = std::env::var("HOME")
        .map_err(|_| Error::Config("Could not determine home directory".to_string()))?;
    Ok(PathBuf::from(home).join(".local/share/docfilter"))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_with_root() {
        let config = Config::with_root("/tmp/test-docfilter");
        assert_eq!(config.root, PathBuf::from("/tmp/test-docfilter"));
        assert_eq!(config.id_field, "id");
        assert_eq!(config.default_limit, None);
    }

    #[test]
    fn test_config_paths() {
        let config = Config::with_root("/tmp/test-docfilter");
        assert_eq!(
            config.collection_path("users").unwrap(),
            PathBuf::from("/tmp/test-docfilter/collections/users.jsonl")
        );
        assert_eq!(
            config.sequences_path(),
            PathBuf::from("/tmp/test-docfilter/sequences.json")
        );
    }

    #[test]
    fn test_collection_name_rejected() {
        let config = Config::with_root("/tmp/d");
        for name in ["../etc/passwd", "a/b", "a b", ""] {
            assert!(
                matches!(config.collection_path(name), Err(Error::Storage(_))),
                "{:?} should be rejected",
                name
            );
        }
        assert_eq!(
            config.collection_path("v2.users-old_1").unwrap(),
            PathBuf::from("/tmp/d/collections/v2.users-old_1.jsonl")
        );
    }

    #[test]
    fn test_config_save_load() {
        let tmp = TempDir::new().unwrap();
        let root = tmp.path().to_path_buf();

        let mut config = Config::with_root(&root);
        config.id_field = "_id".to_string();
        config.default_limit = Some(50);
        config.save().unwrap();

        let loaded = Config::load_from(&root).unwrap();
        assert_eq!(loaded.id_field, "_id");
        assert_eq!(loaded.default_limit, Some(50));
        assert_eq!(loaded.root, root);
    }

    #[test]
    fn test_load_missing_config_uses_defaults() {
        let tmp = TempDir::new().unwrap();
        let loaded = Config::load_from(tmp.path()).unwrap();
        assert_eq!(loaded.id_field, "id");
    }

    #[test]
    fn test_load_invalid_config() {
        let tmp = TempDir::new().unwrap();
        std::fs::write(tmp.path().join("config.toml"), "id_field = [").unwrap();
        assert!(matches!(
            Config::load_from(tmp.path()),
            Err(Error::Config(_))
        ));
    }
}
