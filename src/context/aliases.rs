//! Known helper names and alias discovery
//!
//! The scanner recognises the store helpers by the identifier that precedes a
//! call. Files routinely rename them (`import { mapState as ms } from
//! 'vuex'`) or bind them to a namespace through `createNamespacedHelpers`,
//! so aliases are discovered from the document source and merged with the
//! built-in names.

use std::collections::HashMap;

use once_cell::sync::Lazy;
use regex::Regex;

use crate::schema::EntryKind;

use super::scanner::Invocation;

/// What a helper identifier means
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperBinding {
    pub kind: EntryKind,
    pub invocation: Invocation,
    /// Namespace bound by `createNamespacedHelpers`
    pub namespace: Option<String>,
}

/// Built-in helper names
const BUILTIN_HELPERS: [(&str, EntryKind, Invocation); 6] = [
    ("mapState", EntryKind::State, Invocation::HelperCall),
    ("mapGetters", EntryKind::Getter, Invocation::HelperCall),
    ("mapMutations", EntryKind::Mutation, Invocation::HelperCall),
    ("mapActions", EntryKind::Action, Invocation::HelperCall),
    ("commit", EntryKind::Mutation, Invocation::Commit),
    ("dispatch", EntryKind::Action, Invocation::Dispatch),
];

static VUEX_IMPORT: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(r#"import\s*\{([^}]*)\}\s*from\s*['"]vuex['"]"#).ok()
});

static NAMESPACED_HELPERS: Lazy<Option<Regex>> = Lazy::new(|| {
    Regex::new(
        r#"(?:const|let|var)\s*\{([^}]*)\}\s*=\s*(?:[\w$]+\.)?createNamespacedHelpers\(\s*['"`]([^'"`]*)['"`]\s*\)"#,
    )
    .ok()
});

/// Helper identifiers the scanner reacts to
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HelperNames {
    bindings: HashMap<String, HelperBinding>,
}

impl HelperNames {
    /// The built-in helpers only
    pub fn new() -> Self {
        let bindings = BUILTIN_HELPERS
            .iter()
            .map(|(name, kind, invocation)| {
                (
                    name.to_string(),
                    HelperBinding {
                        kind: *kind,
                        invocation: *invocation,
                        namespace: None,
                    },
                )
            })
            .collect();
        Self { bindings }
    }

    /// Built-in helpers plus the aliases declared in `source`
    pub fn discover(source: &str) -> Self {
        let mut names = Self::new();

        if let Some(re) = VUEX_IMPORT.as_ref() {
            for caps in re.captures_iter(source) {
                for (helper, alias) in specifiers(&caps[1], " as ") {
                    names.add_alias(alias, helper, None);
                }
            }
        }

        if let Some(re) = NAMESPACED_HELPERS.as_ref() {
            for caps in re.captures_iter(source) {
                let namespace = caps[2].trim_matches('/');
                for (helper, alias) in specifiers(&caps[1], ":") {
                    names.add_alias(alias, helper, Some(namespace));
                }
            }
        }

        names
    }

    pub fn get(&self, name: &str) -> Option<&HelperBinding> {
        self.bindings.get(name)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.bindings.contains_key(name)
    }

    /// Bind `alias` to the built-in `helper`.
    ///
    /// Returns false when `helper` is not a built-in helper name.
    pub fn add_alias(&mut self, alias: &str, helper: &str, namespace: Option<&str>) -> bool {
        let Some((_, kind, invocation)) = BUILTIN_HELPERS.iter().find(|(name, ..)| *name == helper)
        else {
            return false;
        };
        self.bindings.insert(
            alias.to_string(),
            HelperBinding {
                kind: *kind,
                invocation: *invocation,
                namespace: namespace.filter(|ns| !ns.is_empty()).map(str::to_string),
            },
        );
        true
    }

    pub fn len(&self) -> usize {
        self.bindings.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bindings.is_empty()
    }
}

impl Default for HelperNames {
    fn default() -> Self {
        Self::new()
    }
}

/// `a as b, c` -> `[(a, b), (c, c)]`
fn specifiers<'s>(list: &'s str, separator: &str) -> Vec<(&'s str, &'s str)> {
    list.split(',')
        .map(str::trim)
        .filter(|item| !item.is_empty())
        .map(|item| match item.split_once(separator) {
            Some((name, alias)) => (name.trim(), alias.trim()),
            None => (item, item),
        })
        .collect()
}
