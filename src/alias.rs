//! Import alias maps (`@/*` -> `src/*`)
//!
//! Aliases come from the engine configuration or from the
//! `compilerOptions.paths` table of a `jsconfig.json` / `tsconfig.json`.
//! Matching rules:
//! - the longest matching prefix wins
//! - for the same prefix an exact key beats a wildcard key
//! - exact keys match the reference itself or the reference followed by `/`
//! - wildcard keys (`prefix*`) match anything starting with `prefix`

use serde::Deserialize;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

use crate::error::{EngineError, Result};

/// One alias key with its ordered targets
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AliasEntry {
    /// Key without the trailing `*`
    pub prefix: String,
    /// Whether the key ended in `*`
    pub wildcard: bool,
    /// Raw targets, relative to `base` unless absolute; may contain `*`
    pub targets: Vec<String>,
    pub base: PathBuf,
}

impl AliasEntry {
    pub fn new(key: &str, targets: Vec<String>, base: &Path) -> Self {
        let (prefix, wildcard) = match key.strip_suffix('*') {
            Some(prefix) => (prefix.to_string(), true),
            None => (key.to_string(), false),
        };
        Self {
            prefix,
            wildcard,
            targets,
            base: base.to_path_buf(),
        }
    }

    /// The part of `reference` after the matched prefix, if this key matches
    fn remainder<'r>(&self, reference: &'r str) -> Option<&'r str> {
        if self.wildcard {
            return reference.strip_prefix(self.prefix.as_str());
        }
        if reference == self.prefix {
            return Some("");
        }
        reference
            .strip_prefix(self.prefix.as_str())
            .filter(|rest| rest.starts_with('/'))
            .map(|rest| rest.trim_start_matches('/'))
    }

    /// Substitute the remainder into every target
    fn expand(&self, remainder: &str) -> Vec<PathBuf> {
        self.targets
            .iter()
            .map(|target| {
                let substituted = if target.contains('*') {
                    target.replacen('*', remainder, 1)
                } else if remainder.is_empty() {
                    target.clone()
                } else {
                    format!("{}/{}", target.trim_end_matches('/'), remainder)
                };
                self.base.join(substituted)
            })
            .collect()
    }
}

/// Loaded alias map
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct AliasMap {
    entries: Vec<AliasEntry>,
}

impl AliasMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from `(key, targets)` pairs, targets relative to `base`
    pub fn from_pairs<I, K>(base: &Path, pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<String>)>,
        K: AsRef<str>,
    {
        Self {
            entries: pairs
                .into_iter()
                .map(|(key, targets)| AliasEntry::new(key.as_ref(), targets, base))
                .collect(),
        }
    }

    pub fn insert(&mut self, entry: AliasEntry) {
        self.entries.push(entry);
    }

    /// Append every entry of `other`
    pub fn extend(&mut self, other: AliasMap) {
        self.entries.extend(other.entries);
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// Candidate paths for `reference`, best alias first.
    ///
    /// The paths still need suffix probing and boundary validation.
    pub fn candidates(&self, reference: &str) -> Vec<PathBuf> {
        let mut matches: Vec<(&AliasEntry, &str)> = self
            .entries
            .iter()
            .filter_map(|entry| entry.remainder(reference).map(|rest| (entry, rest)))
            .collect();

        matches.sort_by(|(a, _), (b, _)| {
            b.prefix
                .len()
                .cmp(&a.prefix.len())
                .then(a.wildcard.cmp(&b.wildcard))
        });

        matches
            .into_iter()
            .flat_map(|(entry, rest)| entry.expand(rest))
            .collect()
    }

    /// Load `compilerOptions.paths` from a jsconfig/tsconfig file.
    ///
    /// Targets are relative to `compilerOptions.baseUrl`, itself relative to
    /// the config file's directory. Comments and trailing commas are accepted.
    pub fn from_tsconfig(path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(path)?;
        Self::parse_tsconfig(&content, path.parent().unwrap_or_else(|| Path::new(".")))
    }

    /// Parse tsconfig content whose directory is `config_dir`
    pub fn parse_tsconfig(content: &str, config_dir: &Path) -> Result<Self> {
        let config: TsConfig = json5::from_str(content).map_err(|e| EngineError::ConfigError {
            message: format!("Failed to parse tsconfig: {}", e),
        })?;

        let Some(options) = config.compiler_options else {
            return Ok(Self::default());
        };
        let base = match options.base_url {
            Some(base_url) => config_dir.join(base_url),
            None => config_dir.to_path_buf(),
        };

        Ok(Self::from_pairs(&base, options.paths))
    }
}

#[derive(Debug, Deserialize)]
struct TsConfig {
    #[serde(rename = "compilerOptions")]
    compiler_options: Option<CompilerOptions>,
}

#[derive(Debug, Deserialize)]
struct CompilerOptions {
    #[serde(rename = "baseUrl")]
    base_url: Option<String>,
    #[serde(default)]
    paths: BTreeMap<String, Vec<String>>,
}
