//! Filesystem access used by the resolver and the module graph parser
//!
//! This module provides:
//! - `FileSystem`: the byte-content read capability the indexer consumes
//! - `OsFileSystem`: the default implementation backed by `std::fs`
//! - `normalize_path`: Strips Windows `\\?\` prefix from canonicalized paths
//! - `get_config_base_dir`: Returns the platform-appropriate config directory

use std::io;
use std::path::{Path, PathBuf};

/// Read capability over the analyzed workspace.
///
/// Index passes run on tokio's blocking pool, so implementations may block.
/// Queries never touch the filesystem.
pub trait FileSystem: Send + Sync {
    /// Read the full byte content of a file
    fn read(&self, path: &Path) -> io::Result<Vec<u8>>;

    /// Size of a file in bytes
    fn len(&self, path: &Path) -> io::Result<u64>;

    /// Whether the path names an existing regular file
    fn is_file(&self, path: &Path) -> bool;

    /// Resolve symlinks and relative components
    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf>;
}

/// `FileSystem` backed by the real disk
#[derive(Debug, Default, Clone, Copy)]
pub struct OsFileSystem;

impl FileSystem for OsFileSystem {
    fn read(&self, path: &Path) -> io::Result<Vec<u8>> {
        std::fs::read(path)
    }

    fn len(&self, path: &Path) -> io::Result<u64> {
        Ok(std::fs::metadata(path)?.len())
    }

    fn is_file(&self, path: &Path) -> bool {
        std::fs::metadata(path).map(|m| m.is_file()).unwrap_or(false)
    }

    fn canonicalize(&self, path: &Path) -> io::Result<PathBuf> {
        path.canonicalize().map(|p| normalize_path(&p))
    }
}

/// Normalize Windows paths by removing the `\\?\` prefix if present.
///
/// On Windows, `Path::canonicalize()` returns paths with the extended-length path prefix
/// (`\\?\C:\...`), which breaks string comparisons against the workspace root
/// and the keys of the dependency graph.
///
/// This function strips the prefix on Windows while being a no-op on Unix.
///
/// # Examples
///
/// ```
/// use std::path::PathBuf;
/// use vuex_engine::fs_utils::normalize_path;
///
/// // On Unix, path is returned unchanged
/// let path = PathBuf::from("/home/user/repo");
/// assert_eq!(normalize_path(&path), path);
/// ```
pub fn normalize_path(path: &Path) -> PathBuf {
    #[cfg(windows)]
    {
        let s = path.to_string_lossy();
        // Handle UNC paths: \\?\UNC\server\share -> \\server\share
        if let Some(stripped) = s.strip_prefix(r"\\?\UNC\") {
            return PathBuf::from(format!(r"\\{}", stripped));
        }
        // Handle local paths: \\?\C:\path -> C:\path
        if let Some(stripped) = s.strip_prefix(r"\\?\") {
            return PathBuf::from(stripped);
        }
    }
    path.to_path_buf()
}

/// Canonicalize when possible, otherwise return the path unchanged.
///
/// Used for caller-supplied paths (entry file, changed files) so they line
/// up with the canonical paths the resolver produces.
pub fn canonical_or_same(fs: &dyn FileSystem, path: &Path) -> PathBuf {
    fs.canonicalize(path).unwrap_or_else(|_| path.to_path_buf())
}

/// Get platform-appropriate configuration base directory.
///
/// - **Windows**: `%APPDATA%\vuex-engine`
/// - **Unix**: `$XDG_CONFIG_HOME/vuex-engine` or `~/.config/vuex-engine`
/// - **Fallback**: System temp directory + `vuex-engine`
pub fn get_config_base_dir() -> PathBuf {
    if let Some(config) = dirs::config_dir() {
        return config.join("vuex-engine");
    }

    std::env::temp_dir().join("vuex-engine")
}
