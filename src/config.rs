//! Loader configuration.
//!
//! ```ignore
//! let config = LoaderConfig::from_json(r#"{ "modulesDir": "lib/modules" }"#)?;
//! assert_eq!(config.topics_dir, "topics");
//! ```

use std::fmt;
use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

#[derive(Debug)]
pub enum ConfigError {
    Io { path: PathBuf, message: String },
    Parse(String),
    Invalid(String),
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Io { path, message } => {
                write!(f, "failed to read config {}: {}", path.display(), message)
            }
            ConfigError::Parse(msg) => write!(f, "failed to parse config: {}", msg),
            ConfigError::Invalid(msg) => write!(f, "invalid config: {}", msg),
        }
    }
}

impl std::error::Error for ConfigError {}

impl From<serde_json::Error> for ConfigError {
    fn from(err: serde_json::Error) -> Self {
        ConfigError::Parse(err.to_string())
    }
}

/// Where topic modules live on disk.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct LoaderConfig {
    /// Directory holding one sub-directory per module.
    pub modules_dir: PathBuf,

    /// Per-module directory holding topic files (default: "topics").
    #[serde(default = "default_topics_dir")]
    pub topics_dir: String,

    /// Extension of topic files, without the dot (default: "rs").
    #[serde(default = "default_extension")]
    pub extension: String,
}

fn default_topics_dir() -> String {
    "topics".to_string()
}

fn default_extension() -> String {
    "rs".to_string()
}

impl LoaderConfig {
    pub fn new(modules_dir: impl Into<PathBuf>) -> Self {
        LoaderConfig {
            modules_dir: modules_dir.into(),
            topics_dir: default_topics_dir(),
            extension: default_extension(),
        }
    }

    pub fn from_json(content: &str) -> Result<Self, ConfigError> {
        let config: LoaderConfig = serde_json::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let content = fs::read_to_string(path).map_err(|err| ConfigError::Io {
            path: path.to_path_buf(),
            message: err.to_string(),
        })?;
        Self::from_json(&content)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.topics_dir.is_empty() {
            return Err(ConfigError::Invalid("topicsDir must not be empty".into()));
        }
        if self.extension.starts_with('.') {
            return Err(ConfigError::Invalid(format!(
                "extension must not start with a dot (got {:?})",
                self.extension
            )));
        }
        Ok(())
    }

    /// `<modules_dir>/<module>/<topics_dir>`.
    pub fn topics_path(&self, module: &str) -> PathBuf {
        self.modules_dir.join(module).join(&self.topics_dir)
    }
}
