use std::path::{Path, PathBuf};
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::error::{LingoError, Result};
use crate::worker::DEFAULT_BATCH_SIZE;

/// Default directory name for lingomark settings.
const LINGOMARK_DIR: &str = ".lingomark";
/// Config filename.
const CONFIG_FILE: &str = "config.toml";
/// Milliseconds a worker request may stay pending.
pub const DEFAULT_TIMEOUT_MS: u64 = 8000;

/// Project-level configuration resolved from the working directory.
#[derive(Debug, Clone)]
pub struct Config {
    /// Directory the settings were resolved against.
    pub project_root: PathBuf,
    /// Path to the `.lingomark/` directory.
    pub lingomark_dir: PathBuf,
    /// Path to the config file.
    pub config_path: PathBuf,
    /// Settings loaded from config.toml.
    pub settings: UserSettings,
}

/// User-configurable settings from .lingomark/config.toml.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserSettings {
    pub worker: WorkerSettings,
    pub output: OutputSettings,
}

/// Background worker settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct WorkerSettings {
    /// Run parsing on a background worker. When false every request takes the
    /// synchronous path.
    pub enabled: bool,
    /// Segments per streamed batch.
    pub batch_size: usize,
    /// How long a request may wait for its final message.
    pub timeout_ms: u64,
}

impl Default for WorkerSettings {
    fn default() -> Self {
        Self {
            enabled: true,
            batch_size: DEFAULT_BATCH_SIZE,
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl WorkerSettings {
    /// Batch size with zero clamped to one.
    #[must_use]
    pub fn effective_batch_size(&self) -> usize {
        self.batch_size.max(1)
    }

    #[must_use]
    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

/// Output-related settings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OutputSettings {
    /// Output format: "minified" (default) or "pretty".
    pub format: String,
}

impl Default for OutputSettings {
    fn default() -> Self {
        Self {
            format: "minified".into(),
        }
    }
}

impl OutputSettings {
    #[must_use]
    pub fn is_pretty(&self) -> bool {
        self.format == "pretty"
    }
}

impl Config {
    /// Create config for a given project root.
    pub fn new(project_root: impl Into<PathBuf>) -> Self {
        let project_root = project_root.into();
        let lingomark_dir = project_root.join(LINGOMARK_DIR);
        let config_path = lingomark_dir.join(CONFIG_FILE);

        let settings = Self::load_settings(&config_path).unwrap_or_default();

        Self {
            project_root,
            lingomark_dir,
            config_path,
            settings,
        }
    }

    /// Create config from the current working directory.
    pub fn from_cwd() -> Result<Self> {
        let cwd = std::env::current_dir()
            .map_err(|e| LingoError::Config(format!("cannot get cwd: {e}")))?;
        Ok(Self::new(cwd))
    }

    /// Load settings from config.toml if it exists.
    fn load_settings(config_path: &Path) -> Option<UserSettings> {
        if !config_path.exists() {
            return None;
        }
        let content = std::fs::read_to_string(config_path).ok()?;
        match toml::from_str(&content) {
            Ok(settings) => Some(settings),
            Err(e) => {
                tracing::warn!(path = %config_path.display(), error = %e, "ignoring invalid config");
                None
            }
        }
    }

    /// Save current settings to config.toml.
    pub fn save_settings(&self) -> Result<()> {
        std::fs::create_dir_all(&self.lingomark_dir)?;
        let content = toml::to_string_pretty(&self.settings)
            .map_err(|e| LingoError::Config(format!("failed to serialize settings: {e}")))?;
        std::fs::write(&self.config_path, content)?;
        Ok(())
    }
}
