//! Symbol lookup against a published store map
//!
//! `find_item` applies an ordered precedence policy; the first step that
//! matches wins:
//!
//! 1. qualified name (`user/SET_NAME`): explicit namespace + name path
//! 2. explicit namespace
//! 3. local module (`prefer_local`, no explicit namespace, unqualified name)
//! 4. root namespace, when neither 2 nor 3 applied
//! 5. first entry of the kind with a matching name
//!
//! State entries compare namespaces by structural `module_path`; getters,
//! mutations and actions by runtime namespace. The last step compares the
//! full runtime key for non-state kinds, so a namespaced mutation is never
//! found by its bare name.

pub mod query;
pub mod root_option;

use serde::Serialize;

use crate::context::{ContextDescriptor, Invocation};
use crate::schema::{Entry, EntryKind, ModulePath, StoreMap};

pub use query::{candidate_namespace, split_name};
pub use root_option::{detect_root_option, detect_root_option_with};

/// A symbol query
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct LookupQuery {
    pub name: String,
    pub kind: EntryKind,
    pub explicit_namespace: Option<String>,
    /// Structural path of the module the query is made from
    pub current_namespace: Option<ModulePath>,
    pub prefer_local: bool,
    pub allow_root_fallback: bool,
}

impl LookupQuery {
    pub fn new(name: impl Into<String>, kind: EntryKind) -> Self {
        Self {
            name: name.into(),
            kind,
            explicit_namespace: None,
            current_namespace: None,
            prefer_local: false,
            allow_root_fallback: false,
        }
    }

    pub fn with_explicit_namespace(mut self, namespace: impl Into<String>) -> Self {
        self.explicit_namespace = Some(namespace.into());
        self
    }

    pub fn with_current_namespace(mut self, namespace: ModulePath) -> Self {
        self.current_namespace = Some(namespace);
        self
    }

    pub fn prefer_local(mut self, prefer_local: bool) -> Self {
        self.prefer_local = prefer_local;
        self
    }

    pub fn allow_root_fallback(mut self, allow: bool) -> Self {
        self.allow_root_fallback = allow;
        self
    }

    /// Query for `name` typed in the context `descriptor` describes.
    ///
    /// `current_namespace` is the module the consumer file declares (see
    /// `IndexSnapshot::namespace_for_file`); `root_option` is the result of
    /// [`detect_root_option`]. `commit`/`dispatch` take no namespace
    /// argument, so their first string is not used as one.
    pub fn from_context(
        descriptor: &ContextDescriptor,
        name: impl Into<String>,
        current_namespace: Option<ModulePath>,
        root_option: bool,
    ) -> Self {
        let call = matches!(descriptor.invocation, Invocation::Commit | Invocation::Dispatch);
        let explicit_namespace = if call {
            None
        } else {
            descriptor.explicit_namespace.clone()
        };

        Self {
            name: name.into(),
            kind: descriptor.kind,
            explicit_namespace,
            prefer_local: call && !root_option && current_namespace.is_some(),
            current_namespace,
            allow_root_fallback: true,
        }
    }
}

fn matching<'s>(entries: &'s [Entry], name: &str, namespace: &ModulePath) -> Option<&'s Entry> {
    entries
        .iter()
        .find(|entry| entry.name == name && entry.lookup_namespace() == namespace)
}

/// Best entry for `query`, or `None`
pub fn find_item<'s>(store: &'s StoreMap, query: &LookupQuery) -> Option<&'s Entry> {
    let entries = store.entries(query.kind);
    let explicit = query.explicit_namespace.as_deref().map(ModulePath::parse);
    let (from_name, leaf) = split_name(&query.name);

    if let Some(from_name) = &from_name {
        let namespace = candidate_namespace(explicit.as_ref(), from_name);
        if let Some(entry) = matching(entries, leaf, &namespace) {
            return Some(entry);
        }
    }

    if let Some(explicit) = &explicit {
        if let Some(entry) = matching(entries, &query.name, explicit) {
            return Some(entry);
        }
    }

    let local = match &query.current_namespace {
        Some(current) if query.prefer_local && explicit.is_none() && from_name.is_none() => {
            Some(current)
        }
        _ => None,
    };
    if let Some(current) = local {
        if let Some(entry) = entries
            .iter()
            .find(|entry| entry.name == query.name && entry.module_path == *current)
        {
            return Some(entry);
        }
    }

    if query.allow_root_fallback && explicit.is_none() && local.is_none() {
        if let Some(entry) = matching(entries, &query.name, &ModulePath::root()) {
            return Some(entry);
        }
    }

    let found = entries.iter().find(|entry| match entry.kind {
        EntryKind::State => entry.name == leaf,
        _ => entry.runtime_key() == query.name,
    });
    if found.is_none() {
        tracing::debug!("[LOOKUP] No {} named {}", query.kind, query.name);
    }
    found
}
