//! Value resolution over explicit scope chains
//!
//! `ValueResolver::resolve` reduces an expression to the value the store
//! analysis cares about: an object literal, a function, a string constant,
//! or the boundary of another module file.
//!
//! Resolution is a loop over `(expression, site)` pairs. Member accesses and
//! calls are pushed onto an accessor stack and applied once the object they
//! select from is known. Every identifier binding and every cross-file export
//! is entered at most once per resolution; revisiting one ends the walk as
//! opaque. There is no depth limit.

use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::rc::Rc;

use crate::parsing::{
    Bindings, ExportName, Expr, Function, ImportName, ObjectLit, Program, PropKey, Property,
};

use super::ParseContext;

/// Where an expression is evaluated: its file and the lexical frames in scope
#[derive(Debug, Clone)]
pub struct Site {
    program: Rc<Program>,
    /// Outermost (file scope) first
    chain: Rc<Vec<Rc<Bindings>>>,
}

impl Site {
    /// File-level scope of `program`
    pub fn top(program: Rc<Program>) -> Self {
        let chain = Rc::new(vec![program.scope.clone()]);
        Self { program, chain }
    }

    /// File scope followed by the given function frames (outermost first)
    pub fn with_frames(program: Rc<Program>, frames: &[Rc<Bindings>]) -> Self {
        let mut chain = Vec::with_capacity(frames.len() + 1);
        chain.push(program.scope.clone());
        chain.extend(frames.iter().cloned());
        Self {
            program,
            chain: Rc::new(chain),
        }
    }

    /// Scope inside a function body defined at this site
    pub fn enter(&self, frame: Rc<Bindings>) -> Self {
        let mut chain = self.chain.as_ref().clone();
        chain.push(frame);
        Self {
            program: self.program.clone(),
            chain: Rc::new(chain),
        }
    }

    pub fn file(&self) -> &Path {
        &self.program.path
    }

    pub fn program(&self) -> &Rc<Program> {
        &self.program
    }

    /// Innermost binding of `name`, with the site it is evaluated in and an
    /// identity for cycle detection
    fn lookup(&self, name: &str) -> Option<(Expr, Site, Seen)> {
        self.chain.iter().enumerate().rev().find_map(|(depth, frame)| {
            frame.get(name).map(|bound| {
                let site = Site {
                    program: self.program.clone(),
                    chain: Rc::new(self.chain[..=depth].to_vec()),
                };
                let seen = Seen::Binding(Rc::as_ptr(frame) as usize, name.to_string());
                (bound.clone(), site, seen)
            })
        })
    }

    fn binds_function(&self, name: &str) -> bool {
        matches!(self.lookup(name), Some((Expr::Function(_), _, _)))
    }
}

/// Result of resolving an expression
#[derive(Debug, Clone)]
pub enum Value {
    Object(Rc<ObjectLit>, Site),
    Function(Rc<Function>, Site),
    Array(Rc<Vec<Expr>>, Site),
    Str(String),
    /// Number, boolean, null or template literal
    Literal(Expr),
    /// `import * as ns` namespace object
    Namespace(Rc<Program>),
    /// Module boundary reached in [`Mode::StopAtFile`]
    External { file: PathBuf, export: ExportName },
    Opaque,
}

impl Value {
    pub fn is_opaque(&self) -> bool {
        matches!(self, Value::Opaque)
    }

    pub fn is_true(&self) -> bool {
        matches!(self, Value::Literal(Expr::Bool(true)))
    }
}

/// Whether imports are followed into their files
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Mode {
    Follow,
    /// Return [`Value::External`] when the value itself is another file's export
    StopAtFile,
}

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum Seen {
    Binding(usize, String),
    Export(PathBuf, ExportName),
}

#[derive(Debug, Clone)]
enum Accessor {
    Property(Expr, Site),
    Call,
}

/// Resolves expressions against the programs of one pass
pub struct ValueResolver<'c, 'a> {
    ctx: &'c ParseContext<'a>,
}

impl<'c, 'a> ValueResolver<'c, 'a> {
    pub fn new(ctx: &'c ParseContext<'a>) -> Self {
        Self { ctx }
    }

    pub fn resolve(&self, expr: &Expr, site: &Site, mode: Mode) -> Value {
        let mut seen = HashSet::new();
        self.walk(expr.clone(), site.clone(), Vec::new(), mode, &mut seen)
    }

    /// Resolve to a string constant
    pub fn resolve_str(&self, expr: &Expr, site: &Site) -> Option<String> {
        match self.resolve(expr, site, Mode::Follow) {
            Value::Str(value) => Some(value),
            _ => None,
        }
    }

    /// Expression exported as `export` by `file`, following `export *`
    pub fn export_of(&self, file: &Path, export: &ExportName) -> Option<(Expr, Site)> {
        self.export_with(file, export, &mut HashSet::new())
    }

    /// Object returned by a function value, first matching return wins
    pub fn returned_object(&self, function: &Function, site: &Site) -> Option<(Rc<ObjectLit>, Site)> {
        let inner = site.enter(function.locals.clone());
        function
            .returns
            .iter()
            .find_map(|ret| match self.resolve(ret, &inner, Mode::Follow) {
                Value::Object(object, site) => Some((object, site)),
                _ => None,
            })
    }

    fn walk(
        &self,
        mut expr: Expr,
        mut site: Site,
        mut accessors: Vec<Accessor>,
        mode: Mode,
        seen: &mut HashSet<Seen>,
    ) -> Value {
        loop {
            match expr {
                Expr::Ident(name) => {
                    let Some((bound, bound_site, identity)) = site.lookup(&name) else {
                        return Value::Opaque;
                    };
                    if !seen.insert(identity) {
                        return Value::Opaque;
                    }
                    expr = bound;
                    site = bound_site;
                }
                Expr::Member { object, property } => {
                    accessors.push(Accessor::Property(*property, site.clone()));
                    expr = *object;
                }
                Expr::Call { callee, args } | Expr::New { callee, args } => {
                    if self.is_store_constructor(&callee, &args, &site) {
                        let Some(options) = args.first() else {
                            return Value::Opaque;
                        };
                        expr = options.clone();
                    } else {
                        accessors.push(Accessor::Call);
                        expr = *callee;
                    }
                }
                Expr::Import(import) => {
                    let Some(file) = self.ctx.resolve_import(&import.source, site.file()) else {
                        return Value::Opaque;
                    };
                    let export = match import.name {
                        ImportName::Export(export) => export,
                        ImportName::Namespace => match accessors.pop() {
                            None => {
                                return match self.ctx.program(&file) {
                                    Some(program) => Value::Namespace(program),
                                    None => Value::Opaque,
                                }
                            }
                            Some(Accessor::Property(property, property_site)) => {
                                match self.property_name(&property, &property_site, seen) {
                                    Some(name) => export_name(name),
                                    None => return Value::Opaque,
                                }
                            }
                            Some(Accessor::Call) => return Value::Opaque,
                        },
                    };
                    if mode == Mode::StopAtFile && accessors.is_empty() {
                        return Value::External { file, export };
                    }
                    let Some((exported, export_site)) = self.export_with(&file, &export, seen) else {
                        return Value::Opaque;
                    };
                    expr = exported;
                    site = export_site;
                }
                Expr::Function(function) => match accessors.pop() {
                    None => return Value::Function(function, site),
                    Some(Accessor::Call) => {
                        let inner = site.enter(function.locals.clone());
                        for ret in &function.returns {
                            let mut branch_seen = seen.clone();
                            let value = self.walk(
                                ret.clone(),
                                inner.clone(),
                                accessors.clone(),
                                mode,
                                &mut branch_seen,
                            );
                            if !value.is_opaque() {
                                return value;
                            }
                        }
                        return Value::Opaque;
                    }
                    Some(Accessor::Property(..)) => return Value::Opaque,
                },
                Expr::Object(object) => match accessors.pop() {
                    None => return Value::Object(object, site),
                    Some(Accessor::Property(property, property_site)) => {
                        let Some(name) = self.property_name(&property, &property_site, seen) else {
                            return Value::Opaque;
                        };
                        let Some((value, value_site)) = self.find_property(&object, &site, &name, seen)
                        else {
                            return Value::Opaque;
                        };
                        expr = value;
                        site = value_site;
                    }
                    Some(Accessor::Call) => return Value::Opaque,
                },
                Expr::Array(items) if accessors.is_empty() => return Value::Array(items, site),
                Expr::Str(value) if accessors.is_empty() => return Value::Str(value),
                literal @ (Expr::Number | Expr::Bool(_) | Expr::Null | Expr::Template)
                    if accessors.is_empty() =>
                {
                    return Value::Literal(literal)
                }
                _ => return Value::Opaque,
            }
        }
    }

    /// `new X.Store(..)`, `new Store(..)`, or `createStore(options)` that is
    /// not a call to a locally defined factory
    fn is_store_constructor(&self, callee: &Expr, args: &[Expr], site: &Site) -> bool {
        match callee.trailing_name() {
            Some("Store") => true,
            Some("createStore") => {
                let local_factory = matches!(callee, Expr::Ident(name) if site.binds_function(name));
                !local_factory && !args.is_empty()
            }
            _ => false,
        }
    }

    fn property_name(&self, property: &Expr, site: &Site, seen: &HashSet<Seen>) -> Option<String> {
        if let Expr::Str(name) = property {
            return Some(name.clone());
        }
        let mut branch_seen = seen.clone();
        match self.walk(property.clone(), site.clone(), Vec::new(), Mode::Follow, &mut branch_seen) {
            Value::Str(name) => Some(name),
            _ => None,
        }
    }

    /// Last property named `name`, looking through spreads
    fn find_property(
        &self,
        object: &ObjectLit,
        site: &Site,
        name: &str,
        seen: &HashSet<Seen>,
    ) -> Option<(Expr, Site)> {
        for property in object.properties.iter().rev() {
            match property {
                Property::Keyed { key, value, .. } => {
                    let matches = match key {
                        PropKey::Name(key) => key == name,
                        PropKey::Computed(key) => {
                            self.property_name(key, site, seen).as_deref() == Some(name)
                        }
                    };
                    if matches {
                        return Some((value.clone(), site.clone()));
                    }
                }
                Property::Spread(source) => {
                    let mut branch_seen = seen.clone();
                    if let Value::Object(inner, inner_site) =
                        self.walk(source.clone(), site.clone(), Vec::new(), Mode::Follow, &mut branch_seen)
                    {
                        if let Some(found) = self.find_property(&inner, &inner_site, name, &branch_seen) {
                            return Some(found);
                        }
                    }
                }
            }
        }
        None
    }

    fn export_with(
        &self,
        file: &Path,
        export: &ExportName,
        seen: &mut HashSet<Seen>,
    ) -> Option<(Expr, Site)> {
        if !seen.insert(Seen::Export(file.to_path_buf(), export.clone())) {
            return None;
        }
        let program = self.ctx.program(file)?;
        if let Some(expr) = program.export(export) {
            return Some((expr.clone(), Site::top(program.clone())));
        }
        if let ExportName::Named(_) = export {
            for source in &program.star_exports {
                if let Some(target) = self.ctx.resolve_import(source, &program.path) {
                    if let Some(found) = self.export_with(&target, export, seen) {
                        return Some(found);
                    }
                }
            }
        }
        None
    }
}

fn export_name(name: String) -> ExportName {
    if name == "default" {
        ExportName::Default
    } else {
        ExportName::Named(name)
    }
}
