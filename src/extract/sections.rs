//! Store option objects: property flattening and section entries
//!
//! A section (`state`, `getters`, `mutations`, `actions`) is an object
//! literal, a function returning one, or anything resolving to either.
//! Spreads inside an object are expanded in place; for repeated keys the
//! last declaration wins, as at runtime.

use std::collections::HashSet;
use std::rc::Rc;

use crate::parsing::{Expr, ObjectLit, Position, PropKey, Property};
use crate::schema::{Entry, EntryKind, Location, ModulePath};

use super::scope::{Mode, Site, Value, ValueResolver};

/// One property after spread expansion and key resolution
#[derive(Debug, Clone)]
pub struct FlatProperty {
    pub name: String,
    pub value: Expr,
    pub site: Site,
    pub position: Position,
    pub doc: Option<String>,
}

/// Properties of `object` in declaration order with spreads expanded.
///
/// Computed keys that do not resolve to a string constant are dropped.
pub fn flatten_properties(
    resolver: &ValueResolver,
    object: &Rc<ObjectLit>,
    site: &Site,
) -> Vec<FlatProperty> {
    let mut flat = Vec::new();
    let mut expanding = HashSet::new();
    expand(resolver, object, site, &mut flat, &mut expanding);

    // keep the last declaration of each key
    let mut seen = HashSet::new();
    let mut deduped: Vec<FlatProperty> = flat
        .into_iter()
        .rev()
        .filter(|p| seen.insert(p.name.clone()))
        .collect();
    deduped.reverse();
    deduped
}

fn expand(
    resolver: &ValueResolver,
    object: &Rc<ObjectLit>,
    site: &Site,
    out: &mut Vec<FlatProperty>,
    expanding: &mut HashSet<usize>,
) {
    let identity = Rc::as_ptr(object) as usize;
    if !expanding.insert(identity) {
        return;
    }

    for property in &object.properties {
        match property {
            Property::Keyed {
                key,
                value,
                position,
                doc,
            } => {
                let name = match key {
                    PropKey::Name(name) => Some(name.clone()),
                    PropKey::Computed(expr) => resolver.resolve_str(expr, site),
                };
                let Some(name) = name else {
                    tracing::debug!(
                        "[PARSE] Skipping unresolved computed key at {}:{}",
                        site.file().display(),
                        position.line
                    );
                    continue;
                };
                out.push(FlatProperty {
                    name,
                    value: value.clone(),
                    site: site.clone(),
                    position: *position,
                    doc: doc.clone(),
                });
            }
            Property::Spread(source) => {
                if let Value::Object(inner, inner_site) = resolver.resolve(source, site, Mode::Follow) {
                    expand(resolver, &inner, &inner_site, out, expanding);
                }
            }
        }
    }

    expanding.remove(&identity);
}

/// Object literal declaring a section, if the value resolves to one
pub fn section_object(
    resolver: &ValueResolver,
    value: &Expr,
    site: &Site,
) -> Option<(Rc<ObjectLit>, Site)> {
    match resolver.resolve(value, site, Mode::Follow) {
        Value::Object(object, object_site) => Some((object, object_site)),
        Value::Function(function, function_site) => {
            resolver.returned_object(&function, &function_site)
        }
        _ => None,
    }
}

/// Module coordinates stamped onto every entry of a section
#[derive(Debug, Clone, Copy)]
pub struct SectionOwner<'m> {
    pub module_path: &'m ModulePath,
    pub namespace: &'m ModulePath,
}

/// Append one entry per declared property of a section
pub fn collect_section(
    resolver: &ValueResolver,
    kind: EntryKind,
    value: &Expr,
    site: &Site,
    owner: SectionOwner,
    entries: &mut Vec<Entry>,
) {
    let Some((object, object_site)) = section_object(resolver, value, site) else {
        tracing::debug!(
            "[PARSE] Section '{}' of module '{}' in {} is not statically resolvable",
            kind.section(),
            owner.module_path,
            site.file().display()
        );
        return;
    };

    for property in flatten_properties(resolver, &object, &object_site) {
        let display_type = match kind {
            EntryKind::State => property.value.display_type().map(str::to_string),
            _ => None,
        };
        entries.push(Entry {
            name: property.name,
            kind,
            module_path: owner.module_path.clone(),
            namespace: owner.namespace.clone(),
            location: Location {
                file: property.site.file().to_path_buf(),
                line: property.position.line,
                column: property.position.column,
            },
            documentation: property.doc,
            display_type,
        });
    }
}
