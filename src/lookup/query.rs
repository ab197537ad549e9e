//! Query name handling

use crate::schema::ModulePath;

/// Split `a/b/NAME` at the last `/` into `(Some([a, b]), "NAME")`.
///
/// Names without a separator come back unchanged with no namespace.
pub fn split_name(name: &str) -> (Option<ModulePath>, &str) {
    match name.rsplit_once('/') {
        Some((namespace, leaf)) => (Some(ModulePath::parse(namespace)), leaf),
        None => (None, name),
    }
}

/// Namespace a qualified name points at: explicit segments, then the
/// segments written in the name itself
pub fn candidate_namespace(explicit: Option<&ModulePath>, from_name: &ModulePath) -> ModulePath {
    match explicit {
        Some(explicit) => explicit.join(from_name),
        None => from_name.clone(),
    }
}
