// Editor configuration, stored as TOML in the platform config directory

use crate::history::DEFAULT_MAX_UNDO_DEPTH;
use crate::richtext::style::{ParagraphStyle, RunStyle};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};
use std::{
    fs,
    path::{Path, PathBuf},
};
use thiserror::Error;
use tracing::warn;

const QUALIFIER: &str = "net.flowdoc";
const ORGANIZATION: &str = "Flowdoc";
const APPLICATION: &str = "flowdoc";
const CONFIG_FILE_NAME: &str = "config.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to access config file {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
    #[error("toml serialization error: {0}")]
    Serialize(#[from] toml::ser::Error),
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct HistoryConfig {
    /// Oldest undo entries are dropped past this depth; 0 keeps everything
    pub max_undo_depth: usize,
    /// Fold consecutive keystrokes into one undo entry
    pub coalesce_typing: bool,
}

impl Default for HistoryConfig {
    fn default() -> Self {
        HistoryConfig {
            max_undo_depth: DEFAULT_MAX_UNDO_DEPTH,
            coalesce_typing: true,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct EditorConfig {
    pub history: HistoryConfig,
    pub default_run_style: RunStyle,
    pub default_paragraph_style: ParagraphStyle,
}

pub fn config_file_path() -> Option<PathBuf> {
    ProjectDirs::from(QUALIFIER, ORGANIZATION, APPLICATION)
        .map(|dirs| dirs.config_dir().join(CONFIG_FILE_NAME))
}

pub fn load_config(path: &Path) -> Result<EditorConfig, ConfigError> {
    let contents = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    toml::from_str(&contents).map_err(|source| ConfigError::Parse {
        path: path.to_path_buf(),
        source,
    })
}

/// Load the config at `path`, falling back to defaults when it is missing
/// or unreadable
pub fn load_or_default(path: &Path) -> EditorConfig {
    if !path.exists() {
        return EditorConfig::default();
    }
    match load_config(path) {
        Ok(config) => config,
        Err(err) => {
            warn!(target: "flowdoc::config", %err, "using default configuration");
            EditorConfig::default()
        }
    }
}

pub fn save_config(path: &Path, config: &EditorConfig) -> Result<(), ConfigError> {
    let io_error = |source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    };
    if let Some(parent) = path.parent() {
        fs::create_dir_all(parent).map_err(io_error)?;
    }
    let toml = toml::to_string_pretty(config)?;
    fs::write(path, toml).map_err(io_error)
}
