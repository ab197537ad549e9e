//! Store index data structures
//!
//! An [`Entry`] is one declared store symbol. A [`StoreMap`] groups entries
//! by kind. Everything here is plain data and serializes to JSON for the
//! diagnostic binary.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// Kind of store symbol
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EntryKind {
    State,
    Getter,
    Mutation,
    Action,
}

impl EntryKind {
    /// All kinds, in section order
    pub const ALL: [EntryKind; 4] = [
        EntryKind::State,
        EntryKind::Getter,
        EntryKind::Mutation,
        EntryKind::Action,
    ];

    /// Name of the store option that declares this kind
    pub fn section(&self) -> &'static str {
        match self {
            Self::State => "state",
            Self::Getter => "getters",
            Self::Mutation => "mutations",
            Self::Action => "actions",
        }
    }

    /// Inverse of [`EntryKind::section`]
    pub fn from_section(section: &str) -> Option<Self> {
        match section {
            "state" => Some(Self::State),
            "getters" => Some(Self::Getter),
            "mutations" => Some(Self::Mutation),
            "actions" => Some(Self::Action),
            _ => None,
        }
    }

    /// Parse a user-facing kind name ("state", "getter", "mutation", "action")
    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "state" => Some(Self::State),
            "getter" | "getters" => Some(Self::Getter),
            "mutation" | "mutations" => Some(Self::Mutation),
            "action" | "actions" => Some(Self::Action),
            _ => None,
        }
    }
}

impl fmt::Display for EntryKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::State => "state",
            Self::Getter => "getter",
            Self::Mutation => "mutation",
            Self::Action => "action",
        };
        f.write_str(name)
    }
}

/// Ordered module key segments from the root store; empty means root
#[derive(Debug, Clone, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ModulePath(Vec<String>);

impl ModulePath {
    /// The root namespace
    pub fn root() -> Self {
        Self(Vec::new())
    }

    pub fn new(segments: Vec<String>) -> Self {
        Self(segments)
    }

    /// Split a `a/b/c` namespace string; empty segments are dropped
    pub fn parse(namespace: &str) -> Self {
        Self(
            namespace
                .split('/')
                .filter(|s| !s.is_empty())
                .map(str::to_string)
                .collect(),
        )
    }

    pub fn is_root(&self) -> bool {
        self.0.is_empty()
    }

    pub fn segments(&self) -> &[String] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Path of a sub-module registered under `key`
    pub fn child(&self, key: &str) -> Self {
        let mut segments = self.0.clone();
        segments.push(key.to_string());
        Self(segments)
    }

    /// Concatenate two paths
    pub fn join(&self, other: &ModulePath) -> Self {
        let mut segments = self.0.clone();
        segments.extend(other.0.iter().cloned());
        Self(segments)
    }

    /// Path without its last segment (root stays root)
    pub fn parent(&self) -> Self {
        let mut segments = self.0.clone();
        segments.pop();
        Self(segments)
    }

    /// Qualify a symbol name with this path: `a/b/name`
    pub fn qualify(&self, name: &str) -> String {
        if self.0.is_empty() {
            name.to_string()
        } else {
            format!("{}/{}", self.0.join("/"), name)
        }
    }
}

impl fmt::Display for ModulePath {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0.join("/"))
    }
}

impl From<Vec<String>> for ModulePath {
    fn from(segments: Vec<String>) -> Self {
        Self(segments)
    }
}

impl From<&[&str]> for ModulePath {
    fn from(segments: &[&str]) -> Self {
        Self(segments.iter().map(|s| s.to_string()).collect())
    }
}

/// Source position of a declaration
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    pub file: PathBuf,
    /// 1-indexed line
    pub line: usize,
    /// 0-indexed character column
    pub column: usize,
}

/// One indexed store symbol
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entry {
    pub name: String,
    pub kind: EntryKind,

    /// Structural module path, independent of `namespaced`
    pub module_path: ModulePath,

    /// Runtime namespace: only the keys of namespaced modules
    pub namespace: ModulePath,

    pub location: Location,

    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub documentation: Option<String>,

    /// Inferred literal type, state entries only
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub display_type: Option<String>,
}

impl Entry {
    /// Key under which the runtime registers a getter, mutation or action.
    ///
    /// State has no flat key; its qualified structural path is returned.
    pub fn runtime_key(&self) -> String {
        match self.kind {
            EntryKind::State => self.module_path.qualify(&self.name),
            _ => self.namespace.qualify(&self.name),
        }
    }

    /// Namespace used when matching an explicit or root namespace query
    pub fn lookup_namespace(&self) -> &ModulePath {
        match self.kind {
            EntryKind::State => &self.module_path,
            _ => &self.namespace,
        }
    }
}

/// The indexed result: one collection of entries per kind
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct StoreMap {
    pub state: Vec<Entry>,
    pub getters: Vec<Entry>,
    pub mutations: Vec<Entry>,
    pub actions: Vec<Entry>,
}

impl StoreMap {
    pub fn new() -> Self {
        Self::default()
    }

    /// Entries of one kind
    pub fn entries(&self, kind: EntryKind) -> &[Entry] {
        match kind {
            EntryKind::State => &self.state,
            EntryKind::Getter => &self.getters,
            EntryKind::Mutation => &self.mutations,
            EntryKind::Action => &self.actions,
        }
    }

    fn entries_mut(&mut self, kind: EntryKind) -> &mut Vec<Entry> {
        match kind {
            EntryKind::State => &mut self.state,
            EntryKind::Getter => &mut self.getters,
            EntryKind::Mutation => &mut self.mutations,
            EntryKind::Action => &mut self.actions,
        }
    }

    /// Add an entry to the collection of its kind
    pub fn push(&mut self, entry: Entry) {
        self.entries_mut(entry.kind).push(entry);
    }

    /// Iterate all entries, state first
    pub fn iter(&self) -> impl Iterator<Item = &Entry> {
        EntryKind::ALL
            .into_iter()
            .flat_map(move |kind| self.entries(kind).iter())
    }

    pub fn len(&self) -> usize {
        self.state.len() + self.getters.len() + self.mutations.len() + self.actions.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Entries declared in `file`
    pub fn entries_in_file<'a>(
        &'a self,
        file: &'a std::path::Path,
    ) -> impl Iterator<Item = &'a Entry> + 'a {
        self.iter().filter(move |e| e.location.file == file)
    }
}
