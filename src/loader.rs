//! Topic discovery by directory convention.
//!
//! Every module may keep its topics in `<modules_dir>/<module>/<topics_dir>/`,
//! one file per topic, named after the topic. The catalog only records which
//! module owns which topic name; definitions are still registered through
//! [`RegistryBuilder`](crate::RegistryBuilder), and
//! [`require_catalog`](crate::RegistryBuilder::require_catalog) fails the
//! build when a discovered topic was never defined.
//!
//! ```ignore
//! let config = LoaderConfig::new("lib/modules");
//! let mut catalog = TopicCatalog::new();
//! catalog.load_modules(&config)?;
//!
//! let registry = TypeRegistry::builder()
//!     .topic(player_topic())
//!     .require_catalog(&catalog)
//!     .build()?;
//! ```

use std::fmt;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use tracing::debug;

use crate::config::LoaderConfig;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum LoaderError {
    DuplicateTopic {
        topic: String,
        module: String,
        already_defined_by: String,
    },
    Io {
        path: PathBuf,
        message: String,
    },
}

impl fmt::Display for LoaderError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoaderError::DuplicateTopic {
                topic,
                module,
                already_defined_by,
            } => write!(
                f,
                "Topic is already defined! ({} in module {}, already set by module {})",
                topic, module, already_defined_by
            ),
            LoaderError::Io { path, message } => {
                write!(f, "failed to read {}: {}", path.display(), message)
            }
        }
    }
}

impl std::error::Error for LoaderError {}

/// A topic file found on disk.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DiscoveredTopic {
    pub name: String,
    pub module: String,
}

/// Topics discovered so far, in discovery order.
#[derive(Debug, Clone, Default)]
pub struct TopicCatalog {
    topics: Vec<DiscoveredTopic>,
}

impl TopicCatalog {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn topics(&self) -> impl Iterator<Item = &DiscoveredTopic> {
        self.topics.iter()
    }

    pub fn get(&self, name: &str) -> Option<&DiscoveredTopic> {
        self.topics.iter().find(|topic| topic.name == name)
    }

    pub fn len(&self) -> usize {
        self.topics.len()
    }

    pub fn is_empty(&self) -> bool {
        self.topics.is_empty()
    }

    /// Record a topic by hand, with the same duplicate check as discovery.
    pub fn insert(
        &mut self,
        name: impl Into<String>,
        module: impl Into<String>,
    ) -> Result<(), LoaderError> {
        let name = name.into();
        let module = module.into();
        if let Some(existing) = self.get(&name) {
            return Err(LoaderError::DuplicateTopic {
                topic: name,
                module,
                already_defined_by: existing.module.clone(),
            });
        }
        self.topics.push(DiscoveredTopic { name, module });
        Ok(())
    }

    /// Discover the topics of one module. A module without a topics
    /// directory (or without a directory at all) contributes nothing.
    /// Returns how many topics were added.
    pub fn load_module(&mut self, config: &LoaderConfig, module: &str) -> Result<usize, LoaderError> {
        let dir = config.topics_path(module);
        let Some(files) = sorted_entries(&dir)? else {
            debug!(module, path = %dir.display(), "no topics directory");
            return Ok(0);
        };

        let mut added = 0;
        for path in files {
            if !path.is_file() {
                continue;
            }
            if path.extension().and_then(|ext| ext.to_str()) != Some(config.extension.as_str()) {
                continue;
            }
            let Some(name) = path.file_stem().and_then(|stem| stem.to_str()) else {
                continue;
            };
            self.insert(name, module)?;
            debug!(topic = name, module, "topic discovered");
            added += 1;
        }
        Ok(added)
    }

    /// Discover the topics of every module under `config.modules_dir`,
    /// in module name order.
    pub fn load_modules(&mut self, config: &LoaderConfig) -> Result<usize, LoaderError> {
        let Some(entries) = sorted_entries(&config.modules_dir)? else {
            return Ok(0);
        };

        let mut added = 0;
        for path in entries {
            if !path.is_dir() {
                continue;
            }
            if let Some(module) = path.file_name().and_then(|name| name.to_str()) {
                added += self.load_module(config, module)?;
            }
        }
        debug!(modules_dir = %config.modules_dir.display(), topics = added, "modules loaded");
        Ok(added)
    }
}

/// Directory entries sorted by path; `None` when the directory is missing.
fn sorted_entries(dir: &Path) -> Result<Option<Vec<PathBuf>>, LoaderError> {
    let io_error = |err: io::Error| LoaderError::Io {
        path: dir.to_path_buf(),
        message: err.to_string(),
    };

    let entries = match fs::read_dir(dir) {
        Ok(entries) => entries,
        Err(err) if err.kind() == io::ErrorKind::NotFound => return Ok(None),
        Err(err) => return Err(io_error(err)),
    };

    let mut paths = Vec::new();
    for entry in entries {
        paths.push(entry.map_err(io_error)?.path());
    }
    paths.sort();
    Ok(Some(paths))
}
