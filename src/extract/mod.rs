//! Module graph traversal
//!
//! Starting at the entry file, every module object is located, its sections
//! are turned into entries and its `modules` are visited recursively:
//!
//! - inline module objects are processed inside the current visit
//! - module values imported from another file open a child visit
//! - `registerModule` calls in visited files open root-level visits once
//!   the static tree is complete
//!
//! All per-pass state lives in the [`ParseContext`] (program cache, edge
//! sink) and the [`StoreBuilder`] (active files, visit order) handed down by
//! the caller.

pub mod scope;
pub mod sections;

use std::cell::{Cell, RefCell};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::error::EngineError;
use crate::indexing::builder::{
    Edge, IndexSnapshot, ModuleFrame, ModuleVisit, PassStats, RegistrationScan, StoreBuilder,
    VisitKey, VisitTarget,
};
use crate::indexing::incremental::ReindexPlan;
use crate::parsing::{load_program, CallSite, Expr, ObjectLit, Program};
use crate::paths::PathResolver;
use crate::schema::{EntryKind, ModulePath};

use scope::{Mode, Site, Value, ValueResolver};
use sections::{collect_section, flatten_properties, SectionOwner};

/// State shared by every visit of one pass
pub struct ParseContext<'a> {
    resolver: &'a PathResolver,
    max_file_size: u64,
    plan: Option<&'a ReindexPlan<'a>>,
    programs: RefCell<HashMap<PathBuf, Option<Rc<Program>>>>,
    edges: RefCell<Vec<Edge>>,
    unresolved: RefCell<Vec<PathBuf>>,
    files_parsed: Cell<usize>,
}

/// Positions in the per-pass edge and unresolved-reference sinks
#[derive(Debug, Clone, Copy)]
struct Mark {
    edges: usize,
    unresolved: usize,
}

impl<'a> ParseContext<'a> {
    pub fn new(resolver: &'a PathResolver, max_file_size: u64) -> Self {
        Self {
            resolver,
            max_file_size,
            plan: None,
            programs: RefCell::new(HashMap::new()),
            edges: RefCell::new(Vec::new()),
            unresolved: RefCell::new(Vec::new()),
            files_parsed: Cell::new(0),
        }
    }

    /// Reuse unaffected visits of a previous snapshot
    pub fn with_plan(mut self, plan: &'a ReindexPlan<'a>) -> Self {
        self.plan = Some(plan);
        self
    }

    pub fn plan(&self) -> Option<&'a ReindexPlan<'a>> {
        self.plan
    }

    /// Number of files read during this pass
    pub fn files_parsed(&self) -> usize {
        self.files_parsed.get()
    }

    /// Lowered program of `file`, read at most once per pass.
    ///
    /// Unreadable, oversized and unparsable files yield `None`.
    pub fn program(&self, file: &Path) -> Option<Rc<Program>> {
        if let Some(cached) = self.programs.borrow().get(file) {
            return cached.clone();
        }

        self.files_parsed.set(self.files_parsed.get() + 1);
        let loaded = match load_program(self.resolver.file_system().as_ref(), file, self.max_file_size) {
            Ok(program) => Some(Rc::new(program)),
            Err(err @ EngineError::ParseFailure { .. }) => {
                tracing::warn!("[PARSE] {}", err);
                None
            }
            Err(err) => {
                tracing::debug!("[PARSE] Skipping {}: {}", file.display(), err);
                None
            }
        };

        self.programs
            .borrow_mut()
            .insert(file.to_path_buf(), loaded.clone());
        loaded
    }

    /// Resolve an import and record the dependency edge, or the miss
    pub fn resolve_import(&self, reference: &str, from_file: &Path) -> Option<PathBuf> {
        let Some(resolved) = self.resolver.resolve(reference, from_file) else {
            self.unresolved.borrow_mut().push(from_file.to_path_buf());
            return None;
        };
        self.edges
            .borrow_mut()
            .push((from_file.to_path_buf(), resolved.clone()));
        Some(resolved)
    }

    fn mark(&self) -> Mark {
        Mark {
            edges: self.edges.borrow().len(),
            unresolved: self.unresolved.borrow().len(),
        }
    }

    /// Edges and unresolved-reference files recorded since `mark`, sorted
    /// and deduplicated
    fn take_since(&self, mark: Mark) -> (Vec<Edge>, Vec<PathBuf>) {
        let mut edges = self.edges.borrow_mut().split_off(mark.edges);
        edges.sort();
        edges.dedup();
        let mut unresolved = self.unresolved.borrow_mut().split_off(mark.unresolved);
        unresolved.sort();
        unresolved.dedup();
        (edges, unresolved)
    }
}

/// Run a pass from `entry`: the static module tree, then dynamic registrations
pub fn build_store(entry: &Path, ctx: &ParseContext) -> IndexSnapshot {
    let mut builder = StoreBuilder::new();
    let root = parse_module(entry, ModuleFrame::root(), VisitTarget::Root, ctx, &mut builder);
    let registrations = scan_registrations(ctx, &mut builder);

    let stats = PassStats {
        files_parsed: ctx.files_parsed(),
        visits_reused: builder.reused_visits(),
    };
    IndexSnapshot::from_visits(entry, root, registrations, stats)
}

/// Visit the module that `target` designates in `file`.
///
/// Returns `None` when `file` is already being visited (a cycle). A file
/// that cannot be read or parsed yields a visit without entries.
pub fn parse_module(
    file: &Path,
    frame: ModuleFrame,
    target: VisitTarget,
    ctx: &ParseContext,
    builder: &mut StoreBuilder,
) -> Option<ModuleVisit> {
    if builder.is_active(file) {
        tracing::debug!("[PARSE] Skipping cyclic reference to {}", file.display());
        return None;
    }

    let key = VisitKey {
        file: file.to_path_buf(),
        path: frame.path.clone(),
        runtime_base: frame.runtime_base.clone(),
        target,
    };

    if let Some(previous) = ctx.plan().and_then(|plan| plan.reusable_visit(&key, builder.active())) {
        let visit = previous.clone();
        builder.note_reused(&visit);
        return Some(visit);
    }

    builder.enter(file);
    let mark = ctx.mark();
    let mut visit = ModuleVisit::new(key);

    if let Some(program) = ctx.program(file) {
        match locate_module_object(ctx, &program, &visit.key.target) {
            Some((object, site)) => process_module(ctx, builder, &object, &site, &frame, &mut visit),
            None => tracing::debug!(
                "[PARSE] No module object for {:?} in {}",
                visit.key.target,
                file.display()
            ),
        }
    }

    (visit.edges, visit.unresolved) = ctx.take_since(mark);
    builder.leave(file);
    Some(visit)
}

/// Find the object literal a visit target designates
fn locate_module_object(
    ctx: &ParseContext,
    program: &Rc<Program>,
    target: &VisitTarget,
) -> Option<(Rc<ObjectLit>, Site)> {
    let resolver = ValueResolver::new(ctx);
    let as_object = |value: Value| match value {
        Value::Object(object, site) => Some((object, site)),
        _ => None,
    };

    match target {
        VisitTarget::Root => program
            .store_calls
            .iter()
            .find_map(|call| {
                let site = Site::with_frames(program.clone(), &call.frames);
                as_object(resolver.resolve(&call.call, &site, Mode::Follow))
            })
            .or_else(|| {
                let export = program.default_export.as_ref()?;
                as_object(resolver.resolve(export, &Site::top(program.clone()), Mode::Follow))
            }),
        VisitTarget::Export(export) => {
            let (expr, site) = resolver.export_of(&program.path, export)?;
            as_object(resolver.resolve(&expr, &site, Mode::Follow))
        }
        VisitTarget::Registered { .. } => None,
    }
}

/// Record the entries of one module object and visit its sub-modules
fn process_module(
    ctx: &ParseContext,
    builder: &mut StoreBuilder,
    object: &Rc<ObjectLit>,
    site: &Site,
    frame: &ModuleFrame,
    visit: &mut ModuleVisit,
) {
    let resolver = ValueResolver::new(ctx);
    let options = flatten_properties(&resolver, object, site);
    let option = |name: &str| options.iter().find(|p| p.name == name);

    let namespaced = option("namespaced")
        .map(|p| resolver.resolve(&p.value, &p.site, Mode::Follow).is_true())
        .unwrap_or(false);
    let namespace = match frame.path.segments().last() {
        Some(key) if namespaced => frame.runtime_base.child(key),
        _ => frame.runtime_base.clone(),
    };
    visit.namespaces.push((frame.path.clone(), namespace.clone()));
    builder.note_namespace(&frame.path, &namespace);

    let owner = SectionOwner {
        module_path: &frame.path,
        namespace: &namespace,
    };
    for kind in EntryKind::ALL {
        if let Some(section) = option(kind.section()) {
            collect_section(&resolver, kind, &section.value, &section.site, owner, &mut visit.entries);
        }
    }

    let Some(modules) = option("modules") else {
        return;
    };
    let Value::Object(map, map_site) = resolver.resolve(&modules.value, &modules.site, Mode::Follow)
    else {
        tracing::debug!(
            "[PARSE] 'modules' of '{}' in {} is not statically resolvable",
            frame.path,
            site.file().display()
        );
        return;
    };

    for child in flatten_properties(&resolver, &map, &map_site) {
        let child_frame = ModuleFrame {
            path: frame.path.child(&child.name),
            runtime_base: namespace.clone(),
        };
        match resolver.resolve(&child.value, &child.site, Mode::StopAtFile) {
            Value::Object(inner, inner_site) => {
                process_module(ctx, builder, &inner, &inner_site, &child_frame, visit)
            }
            Value::External { file, export } => {
                match parse_module(&file, child_frame, VisitTarget::Export(export), ctx, builder) {
                    Some(child_visit) => visit.children.push(child_visit),
                    None => visit.cycle_skips.push(file),
                }
            }
            _ => tracing::debug!(
                "[PARSE] Module '{}' in {} is not statically resolvable",
                child_frame.path,
                child.site.file().display()
            ),
        }
    }
}

// =============================================================================
// Dynamic registration
// =============================================================================

/// Scan every visited module file once for `registerModule` calls.
///
/// Files reached by registered modules are scanned too.
fn scan_registrations(ctx: &ParseContext, builder: &mut StoreBuilder) -> Vec<RegistrationScan> {
    let mut scans = Vec::new();
    let mut next = 0;

    while let Some(file) = builder.module_files().get(next).cloned() {
        next += 1;

        let reusable = ctx
            .plan()
            .and_then(|plan| plan.reusable_registrations(&file))
            .filter(|scan| registration_bases_hold(builder, scan));
        if let Some(previous) = reusable {
            for visit in &previous.visits {
                builder.note_reused(visit);
            }
            scans.push(previous.clone());
            continue;
        }

        scans.push(scan_file(ctx, builder, &file));
    }

    scans
}

/// Whether every module a previous scan registered would still get the same
/// runtime base; a parent module may have changed its `namespaced` flag
fn registration_bases_hold(builder: &StoreBuilder, scan: &RegistrationScan) -> bool {
    let mut registered: HashMap<&ModulePath, &ModulePath> = HashMap::new();
    scan.visits.iter().all(|visit| {
        let base = registered
            .get(&visit.key.path.parent())
            .map(|namespace| (*namespace).clone())
            .unwrap_or_else(|| builder.registration_base(&visit.key.path));
        for descendant in visit.walk() {
            for (path, namespace) in &descendant.namespaces {
                registered.insert(path, namespace);
            }
        }
        base == visit.key.runtime_base
    })
}

fn scan_file(ctx: &ParseContext, builder: &mut StoreBuilder, file: &Path) -> RegistrationScan {
    let mut scan = RegistrationScan {
        file: file.to_path_buf(),
        visits: Vec::new(),
        edges: Vec::new(),
        unresolved: Vec::new(),
    };
    let Some(program) = ctx.program(file) else {
        return scan;
    };

    let mark = ctx.mark();
    for call in &program.register_calls {
        if let Some(visit) = register_module(ctx, builder, &program, call) {
            scan.visits.push(visit);
        }
    }
    (scan.edges, scan.unresolved) = ctx.take_since(mark);
    scan
}

/// `store.registerModule(name, module)`: `name` gives the structural path,
/// the runtime base is the runtime namespace of the parent module
fn register_module(
    ctx: &ParseContext,
    builder: &mut StoreBuilder,
    program: &Rc<Program>,
    call: &CallSite,
) -> Option<ModuleVisit> {
    let [name_arg, module_arg, ..] = call.args() else {
        return None;
    };
    let resolver = ValueResolver::new(ctx);
    let site = Site::with_frames(program.clone(), &call.frames);

    let Some(segments) = registration_path(&resolver, name_arg, &site) else {
        tracing::debug!(
            "[PARSE] registerModule name at {}:{} is not a string or string array",
            program.path.display(),
            call.position.line
        );
        return None;
    };
    let path = ModulePath::new(segments);
    let frame = ModuleFrame {
        runtime_base: builder.registration_base(&path),
        path,
    };

    match resolver.resolve(module_arg, &site, Mode::StopAtFile) {
        Value::Object(object, object_site) => {
            let mut visit = ModuleVisit::new(VisitKey {
                file: program.path.clone(),
                path: frame.path.clone(),
                runtime_base: frame.runtime_base.clone(),
                target: VisitTarget::Registered {
                    line: call.position.line,
                },
            });
            builder.enter(&program.path);
            process_module(ctx, builder, &object, &object_site, &frame, &mut visit);
            builder.leave(&program.path);
            Some(visit)
        }
        Value::External { file, export } => {
            parse_module(&file, frame, VisitTarget::Export(export), ctx, builder)
        }
        _ => None,
    }
}

fn registration_path(resolver: &ValueResolver, name: &Expr, site: &Site) -> Option<Vec<String>> {
    match resolver.resolve(name, site, Mode::Follow) {
        Value::Str(name) => Some(vec![name]),
        Value::Array(items, items_site) => items
            .iter()
            .map(|item| resolver.resolve_str(item, &items_site))
            .collect::<Option<Vec<_>>>()
            .filter(|segments| !segments.is_empty()),
        _ => None,
    }
}
