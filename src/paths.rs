//! Module reference resolution confined to the workspace
//!
//! `PathResolver::resolve` turns an import string found in a store file into
//! the absolute path of the file it names:
//!
//! 1. relative (`./x`, `../x`) and absolute references are probed directly
//! 2. other references go through the alias map
//! 3. bare specifiers finally fall back to `node_modules` package lookup
//!
//! Every hit is canonicalized and must stay inside the workspace root. A
//! target outside the root is reported as not found even when it exists.

use std::collections::HashMap;
use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use parking_lot::Mutex;
use serde::Deserialize;

use crate::alias::AliasMap;
use crate::fs_utils::{canonical_or_same, FileSystem};

/// Suffixes probed, in order, after the bare candidate
pub const RESOLVE_SUFFIXES: [&str; 7] = [
    ".ts",
    ".js",
    ".vue",
    ".json",
    "/index.ts",
    "/index.js",
    "/index.vue",
];

type CacheKey = (String, PathBuf);

/// Resolves module references to workspace files
pub struct PathResolver {
    /// Canonical workspace root
    workspace_root: PathBuf,
    aliases: AliasMap,
    fs: Arc<dyn FileSystem>,
    /// `(reference, directory of importing file)` -> resolution
    cache: Mutex<HashMap<CacheKey, Option<PathBuf>>>,
}

impl PathResolver {
    pub fn new(workspace_root: &Path, aliases: AliasMap, fs: Arc<dyn FileSystem>) -> Self {
        let workspace_root = canonical_or_same(fs.as_ref(), workspace_root);
        Self {
            workspace_root,
            aliases,
            fs,
            cache: Mutex::new(HashMap::new()),
        }
    }

    pub fn workspace_root(&self) -> &Path {
        &self.workspace_root
    }

    pub fn file_system(&self) -> &Arc<dyn FileSystem> {
        &self.fs
    }

    /// Drop every cached resolution; called at the start of a full pass
    pub fn clear_cache(&self) {
        self.cache.lock().clear();
    }

    /// Number of cached resolutions (hits and misses)
    pub fn cache_len(&self) -> usize {
        self.cache.lock().len()
    }

    /// Resolve `reference` as written in `from_file`.
    ///
    /// Returns `None` when nothing matches or the match escapes the
    /// workspace root.
    pub fn resolve(&self, reference: &str, from_file: &Path) -> Option<PathBuf> {
        let from_dir = from_file
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.workspace_root.clone());
        let key = (reference.to_string(), from_dir.clone());

        if let Some(cached) = self.cache.lock().get(&key) {
            return cached.clone();
        }

        let resolved = self.resolve_uncached(reference, &from_dir);
        self.cache.lock().insert(key, resolved.clone());
        resolved
    }

    fn resolve_uncached(&self, reference: &str, from_dir: &Path) -> Option<PathBuf> {
        if reference.is_empty() {
            return None;
        }

        if is_relative(reference) {
            return self.probe_within(&from_dir.join(reference));
        }

        if Path::new(reference).is_absolute() {
            return self.probe_within(Path::new(reference));
        }

        for candidate in self.aliases.candidates(reference) {
            if let Some(found) = self.probe_within(&candidate) {
                return Some(found);
            }
        }

        self.resolve_package(reference, from_dir)
    }

    /// Look the specifier up in `node_modules` from `from_dir` up to the root
    fn resolve_package(&self, reference: &str, from_dir: &Path) -> Option<PathBuf> {
        for dir in from_dir.ancestors() {
            if !dir.starts_with(&self.workspace_root) {
                break;
            }

            let package_dir = dir.join("node_modules").join(reference);
            let manifest = package_dir.join("package.json");
            if self.fs.is_file(&manifest) {
                if let Some(entry) = self.package_entry(&manifest) {
                    if let Some(found) = self.probe_within(&package_dir.join(entry)) {
                        return Some(found);
                    }
                }
            }
            if let Some(found) = self.probe_within(&package_dir) {
                return Some(found);
            }
        }
        None
    }

    /// `module` or `main` field of a package manifest
    fn package_entry(&self, manifest: &Path) -> Option<String> {
        #[derive(Deserialize)]
        struct Manifest {
            module: Option<String>,
            main: Option<String>,
        }

        let bytes = self.fs.read(manifest).ok()?;
        let manifest: Manifest = serde_json::from_slice(&bytes).ok()?;
        manifest.module.or(manifest.main)
    }

    /// Probe `base` and its suffixed variants, keeping the first hit that
    /// stays inside the workspace
    fn probe_within(&self, base: &Path) -> Option<PathBuf> {
        self.probe_candidates(base)
            .into_iter()
            .filter(|candidate| self.fs.is_file(candidate))
            .find_map(|candidate| self.confine(&candidate))
    }

    fn probe_candidates(&self, base: &Path) -> Vec<PathBuf> {
        let mut candidates = Vec::with_capacity(RESOLVE_SUFFIXES.len() + 1);
        if base.extension().is_some() {
            candidates.push(base.to_path_buf());
        }
        for suffix in RESOLVE_SUFFIXES {
            let mut raw: OsString = base.as_os_str().to_owned();
            raw.push(suffix);
            candidates.push(PathBuf::from(raw));
        }
        candidates
    }

    /// Canonicalize and check the workspace boundary
    fn confine(&self, candidate: &Path) -> Option<PathBuf> {
        let canonical = self.fs.canonicalize(candidate).ok()?;
        if canonical.starts_with(&self.workspace_root) {
            Some(canonical)
        } else {
            tracing::debug!(
                "[RESOLVE] Rejected {} outside workspace {}",
                canonical.display(),
                self.workspace_root.display()
            );
            None
        }
    }
}

fn is_relative(reference: &str) -> bool {
    reference == "."
        || reference == ".."
        || reference.starts_with("./")
        || reference.starts_with("../")
}
