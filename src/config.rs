//! Configuration file handling for staffdesk.
//!
//! The configuration file is stored at `$STAFFDESK_HOME/config.json` and tells staffdesk where the
//! snapshot files of each source collection live, where exports go and how often watched
//! snapshot files are polled.

use crate::snapshot::SourceKey;
use crate::{utils, Result};
use anyhow::{bail, Context};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

const APP_NAME: &str = "staffdesk";
const CONFIG_VERSION: u8 = 1;
const POLL_INTERVAL_MS: u64 = 2000;
const SNAPSHOTS: &str = "snapshots";
const EXPORTS: &str = "exports";
const CONFIG_JSON: &str = "config.json";

/// The `Config` object represents the configuration of the app. You instantiate it by providing
/// the path to `$STAFFDESK_HOME` and from there it loads `$STAFFDESK_HOME/config.json`. It
/// resolves the snapshot and export directories, which may be configured relative to the home
/// directory.
#[derive(Debug, Clone)]
pub struct Config {
    root: PathBuf,
    config_path: PathBuf,
    config_file: ConfigFile,
    snapshots: PathBuf,
    exports: PathBuf,
}

impl Config {
    /// Creates the home directory, its `snapshots` and `exports` subdirectories, and an initial
    /// `config.json` with default settings.
    ///
    /// # Errors
    /// - Returns an error if any file operations fail, or if a config file already exists.
    pub async fn create(dir: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = dir.into();
        utils::make_dir(&maybe_relative)
            .await
            .context("Unable to create the staffdesk home directory")?;
        let root = utils::canonicalize(&maybe_relative).await?;

        let config_path = root.join(CONFIG_JSON);
        if config_path.exists() {
            bail!("A config file already exists at '{}'", config_path.display())
        }

        let config_file = ConfigFile::default();
        let config = Self::resolve(root, config_path, config_file);
        utils::make_dir(&config.snapshots).await?;
        utils::make_dir(&config.exports).await?;
        config.config_file.save(&config.config_path).await?;
        Ok(config)
    }

    /// This will
    /// - validate that the `home` exists and that the config file exists
    /// - load the config file
    /// - validate that the snapshots and exports directories exist
    /// - return the loaded configuration object
    pub async fn load(home: impl Into<PathBuf>) -> Result<Self> {
        let maybe_relative = home.into();
        let root = utils::canonicalize(&maybe_relative)
            .await
            .context("The staffdesk home directory is missing, run 'staffdesk init'")?;
        let _ = utils::read_dir(&root).await?;

        let config_path = root.join(CONFIG_JSON);
        if !config_path.is_file() {
            bail!("The config file is missing '{}'", config_path.display())
        }
        let config_file = ConfigFile::load(&config_path).await?;
        let config = Self::resolve(root, config_path, config_file);

        if !config.snapshots.is_dir() {
            bail!(
                "The snapshots directory is missing '{}'",
                config.snapshots.display()
            )
        }
        if !config.exports.is_dir() {
            bail!(
                "The exports directory is missing '{}'",
                config.exports.display()
            )
        }
        Ok(config)
    }

    fn resolve(root: PathBuf, config_path: PathBuf, config_file: ConfigFile) -> Self {
        let snapshots = resolve_path(&root, &config_file.snapshots_dir);
        let exports = resolve_path(&root, &config_file.exports_dir);
        Self {
            root,
            config_path,
            config_file,
            snapshots,
            exports,
        }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn config_path(&self) -> &Path {
        &self.config_path
    }

    pub fn snapshots(&self) -> &Path {
        &self.snapshots
    }

    pub fn exports(&self) -> &Path {
        &self.exports
    }

    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.config_file.poll_interval_ms.max(1))
    }

    /// The snapshot file of `key`: the configured override if there is one, otherwise
    /// `<snapshots>/<key>.json`.
    pub fn snapshot_path(&self, key: SourceKey) -> PathBuf {
        match self.config_file.sources.get(&key) {
            Some(p) => resolve_path(&self.snapshots, p),
            None => self.snapshots.join(key.file_name()),
        }
    }
}

/// Returns `p` unchanged if it is absolute, otherwise joins it to `base`.
fn resolve_path(base: &Path, p: &Path) -> PathBuf {
    if p.is_absolute() {
        return p.to_path_buf();
    }
    base.join(p)
}

/// Represents the serialization and deserialization format of the configuration file.
///
/// Example configuration:
/// ```json
/// {
///   "app_name": "staffdesk",
///   "config_version": 1,
///   "poll_interval_ms": 2000,
///   "snapshots_dir": "snapshots",
///   "exports_dir": "exports",
///   "sources": {
///     "petty-cash": "/mnt/export/pettyCash.json"
///   }
/// }
/// ```
#[derive(Debug, Clone, Serialize, Deserialize, Eq, PartialEq)]
struct ConfigFile {
    /// Application name, should always be "staffdesk"
    app_name: String,

    /// Configuration file version
    config_version: u8,

    /// How often watched snapshot files are checked for changes
    #[serde(default = "default_poll_interval_ms")]
    poll_interval_ms: u64,

    /// Directory of the snapshot files, relative to the home directory or absolute
    #[serde(default = "default_snapshots_dir")]
    snapshots_dir: PathBuf,

    /// Directory that CSV exports are written to, relative to the home directory or absolute
    #[serde(default = "default_exports_dir")]
    exports_dir: PathBuf,

    /// Per-source snapshot file overrides, relative to `snapshots_dir` or absolute
    #[serde(default, skip_serializing_if = "BTreeMap::is_empty")]
    sources: BTreeMap<SourceKey, PathBuf>,
}

fn default_poll_interval_ms() -> u64 {
    POLL_INTERVAL_MS
}

fn default_snapshots_dir() -> PathBuf {
    PathBuf::from(SNAPSHOTS)
}

fn default_exports_dir() -> PathBuf {
    PathBuf::from(EXPORTS)
}

impl Default for ConfigFile {
    fn default() -> Self {
        Self {
            app_name: APP_NAME.to_string(),
            config_version: CONFIG_VERSION,
            poll_interval_ms: POLL_INTERVAL_MS,
            snapshots_dir: default_snapshots_dir(),
            exports_dir: default_exports_dir(),
            sources: BTreeMap::new(),
        }
    }
}

impl ConfigFile {
    /// Loads a ConfigFile from the specified path.
    ///
    /// # Errors
    /// Returns an error if the file cannot be read or parsed, or names another application
    async fn load(path: impl AsRef<Path>) -> Result<Self> {
        let config: ConfigFile = utils::deserialize(path.as_ref()).await?;

        anyhow::ensure!(
            config.app_name == APP_NAME,
            "Invalid app_name in config file: expected '{}', got '{}'",
            APP_NAME,
            config.app_name
        );
        anyhow::ensure!(
            config.config_version <= CONFIG_VERSION,
            "Config version {} is unsupported. Is a newer version of staffdesk available?",
            config.config_version
        );

        Ok(config)
    }

    /// Saves the ConfigFile to the specified path.
    async fn save(&self, path: impl AsRef<Path>) -> Result<()> {
        let p = path.as_ref();
        let data = serde_json::to_string_pretty(self).context("Unable to serialize config")?;
        utils::write(p, data)
            .await
            .context("Unable to write config file")
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[tokio::test]
    async fn test_config_create() {
        let dir = TempDir::new().unwrap();
        let home_dir = dir.path().join("staffdesk_home");

        let config = Config::create(&home_dir).await.unwrap();

        assert!(config.snapshots().is_dir());
        assert!(config.exports().is_dir());
        assert!(config.config_path().is_file());
        assert_eq!(config.poll_interval(), Duration::from_millis(POLL_INTERVAL_MS));
        assert_eq!(
            config.snapshot_path(SourceKey::PettyCashEntries),
            config.snapshots().join("petty-cash-entries.json")
        );
    }

    #[tokio::test]
    async fn test_config_create_twice_fails() {
        let dir = TempDir::new().unwrap();
        Config::create(dir.path()).await.unwrap();
        assert!(Config::create(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_load() {
        let dir = TempDir::new().unwrap();
        let created = Config::create(dir.path()).await.unwrap();
        let loaded = Config::load(dir.path()).await.unwrap();
        assert_eq!(created.root(), loaded.root());
        assert_eq!(created.config_file, loaded.config_file);
    }

    #[tokio::test]
    async fn test_config_load_missing_home() {
        let dir = TempDir::new().unwrap();
        assert!(Config::load(dir.path().join("nope")).await.is_err());
        assert!(Config::load(dir.path()).await.is_err());
    }

    #[tokio::test]
    async fn test_config_file_load_with_minimal_config() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        let json = r#"{
            "app_name": "staffdesk",
            "config_version": 1,
            "sources": {"facilities": "/data/facilities.json", "staff": "office/staff.json"}
        }"#;
        utils::write(&config_path, json).await.unwrap();
        utils::make_dir(&dir.path().join(SNAPSHOTS)).await.unwrap();
        utils::make_dir(&dir.path().join(EXPORTS)).await.unwrap();

        let config = Config::load(dir.path()).await.unwrap();
        assert_eq!(config.poll_interval(), Duration::from_millis(POLL_INTERVAL_MS));
        assert_eq!(
            config.snapshot_path(SourceKey::Facilities),
            PathBuf::from("/data/facilities.json")
        );
        assert_eq!(
            config.snapshot_path(SourceKey::Staff),
            config.snapshots().join("office/staff.json")
        );
    }

    #[tokio::test]
    async fn test_config_file_load_invalid_app_name() {
        let dir = TempDir::new().unwrap();
        let config_path = dir.path().join("config.json");
        let json = r#"{ "app_name": "wrong_app", "config_version": 1 }"#;
        utils::write(&config_path, json).await.unwrap();

        let result = ConfigFile::load(&config_path).await;
        assert!(result.is_err());
        assert!(result.unwrap_err().to_string().contains("Invalid app_name"));
    }

    #[test]
    fn test_config_file_serialization_omits_empty_sources() {
        let json = serde_json::to_string(&ConfigFile::default()).unwrap();
        assert!(!json.contains("sources"));
        assert!(json.contains("\"snapshots_dir\":\"snapshots\""));
    }
}
