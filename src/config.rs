//! Engine configuration.
//!
//! Read from `config.toml` in the platform config directory:
//! - Linux/macOS: ~/.config/vuex-engine/config.toml
//! - Windows: %APPDATA%\vuex-engine\config.toml
//!
//! A missing file means defaults. Example:
//!
//! ```toml
//! [index]
//! max_file_size = 5242880
//!
//! [scanner]
//! lookback = 2000
//! memo_capacity = 512
//!
//! [logging]
//! level = "info"
//!
//! [aliases]
//! "@/*" = "src/*"
//! "~store" = ["src/store", "lib/store"]
//! ```

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use crate::alias::AliasMap;
use crate::context::{DEFAULT_LOOKBACK, DEFAULT_MEMO_CAPACITY};
use crate::error::{EngineError, Result};
use crate::fs_utils;
use crate::parsing::DEFAULT_MAX_FILE_SIZE;

/// Project files whose `compilerOptions.paths` feed the alias map, in order
const PROJECT_CONFIGS: [&str; 2] = ["jsconfig.json", "tsconfig.json"];

/// Engine configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub struct EngineConfig {
    #[serde(default)]
    pub index: IndexConfig,

    #[serde(default)]
    pub scanner: ScannerConfig,

    #[serde(default)]
    pub logging: LoggingConfig,

    /// Alias key -> target directories, relative to the workspace root
    #[serde(default)]
    pub aliases: BTreeMap<String, AliasTargets>,
}

/// Index pass settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct IndexConfig {
    /// Files larger than this many bytes contribute nothing
    #[serde(default = "default_max_file_size")]
    pub max_file_size: u64,
}

fn default_max_file_size() -> u64 {
    DEFAULT_MAX_FILE_SIZE
}

impl Default for IndexConfig {
    fn default() -> Self {
        Self {
            max_file_size: default_max_file_size(),
        }
    }
}

/// Cursor-context scanner settings
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScannerConfig {
    /// Characters before the cursor that are scanned
    #[serde(default = "default_lookback")]
    pub lookback: usize,

    #[serde(default = "default_memo_capacity")]
    pub memo_capacity: usize,
}

fn default_lookback() -> usize {
    DEFAULT_LOOKBACK
}

fn default_memo_capacity() -> usize {
    DEFAULT_MEMO_CAPACITY
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            lookback: default_lookback(),
            memo_capacity: default_memo_capacity(),
        }
    }
}

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Log level (error, warn, info, debug, trace)
    #[serde(default = "default_log_level")]
    pub level: String,
}

fn default_log_level() -> String {
    "info".to_string()
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
        }
    }
}

/// One target or an ordered list of targets
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum AliasTargets {
    One(String),
    Many(Vec<String>),
}

impl AliasTargets {
    pub fn to_vec(&self) -> Vec<String> {
        match self {
            Self::One(target) => vec![target.clone()],
            Self::Many(targets) => targets.clone(),
        }
    }
}

impl EngineConfig {
    /// Default location of the configuration file
    pub fn default_path() -> PathBuf {
        fs_utils::get_config_base_dir().join("config.toml")
    }

    /// Load configuration from the default path
    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Load configuration from a specific path
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            return Ok(Self::default());
        }

        let content = fs::read_to_string(path)?;
        let config: Self = toml::from_str(&content).map_err(|e| EngineError::ConfigError {
            message: format!("Failed to parse config {}: {}", path.display(), e),
        })?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        const LEVELS: [&str; 5] = ["error", "warn", "info", "debug", "trace"];
        if !LEVELS.contains(&self.logging.level.as_str()) {
            return Err(EngineError::ConfigError {
                message: format!(
                    "Invalid log level: {}. Must be one of: {}",
                    self.logging.level,
                    LEVELS.join(", ")
                ),
            });
        }
        Ok(())
    }

    /// Alias map for `workspace_root`: configured aliases first, then the
    /// `paths` of the project's jsconfig/tsconfig.
    ///
    /// An unreadable project config is logged and skipped.
    pub fn alias_map(&self, workspace_root: &Path) -> AliasMap {
        let mut aliases = AliasMap::from_pairs(
            workspace_root,
            self.aliases
                .iter()
                .map(|(key, targets)| (key.as_str(), targets.to_vec())),
        );

        for name in PROJECT_CONFIGS {
            let path = workspace_root.join(name);
            if !path.is_file() {
                continue;
            }
            match AliasMap::from_tsconfig(&path) {
                Ok(project) => {
                    tracing::debug!("[CONFIG] {} aliases from {}", project.len(), path.display());
                    aliases.extend(project);
                }
                Err(e) => tracing::warn!("[CONFIG] Skipping {}: {}", path.display(), e),
            }
        }

        aliases
    }

    /// Display configuration as formatted text
    pub fn display(&self) -> String {
        let mut output = String::new();

        output.push_str("[index]\n");
        output.push_str(&format!("max_file_size = {}\n", self.index.max_file_size));

        output.push_str("\n[scanner]\n");
        output.push_str(&format!("lookback = {}\n", self.scanner.lookback));
        output.push_str(&format!("memo_capacity = {}\n", self.scanner.memo_capacity));

        output.push_str("\n[logging]\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        output.push_str("\n[aliases]\n");
        if self.aliases.is_empty() {
            output.push_str("# none configured; jsconfig/tsconfig paths still apply\n");
        }
        for (key, targets) in &self.aliases {
            output.push_str(&format!("\"{}\" = {:?}\n", key, targets.to_vec()));
        }

        output
    }
}
