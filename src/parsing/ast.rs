//! Tagged-variant model of the store-relevant subset of JavaScript
//!
//! The tree-sitter CST is lowered once per file into these types. Everything
//! downstream matches on enum variants instead of comparing node kind
//! strings. Expressions the store analysis cannot use lower to
//! [`Expr::Unknown`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::rc::Rc;

/// One lexical frame: name -> bound value
pub type Bindings = HashMap<String, Expr>;

/// Position in the original file (1-indexed line, 0-indexed character column)
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash)]
pub struct Position {
    pub line: usize,
    pub column: usize,
}

/// Which export of a module is referenced
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ExportName {
    Default,
    Named(String),
}

/// What an import binding refers to in its source module
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ImportName {
    Export(ExportName),
    /// `import * as ns from '...'`
    Namespace,
}

/// Reference to another module's export
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ImportRef {
    pub source: String,
    pub name: ImportName,
}

impl ImportRef {
    pub fn default_of(source: &str) -> Self {
        Self {
            source: source.to_string(),
            name: ImportName::Export(ExportName::Default),
        }
    }
}

/// Lowered expression
#[derive(Debug, Clone)]
pub enum Expr {
    Object(Rc<ObjectLit>),
    Array(Rc<Vec<Expr>>),
    Str(String),
    /// Template literal with substitutions
    Template,
    Number,
    Bool(bool),
    Null,
    Ident(String),
    /// `object.property` or `object[property]`
    Member {
        object: Box<Expr>,
        property: Box<Expr>,
    },
    Call {
        callee: Box<Expr>,
        args: Rc<Vec<Expr>>,
    },
    New {
        callee: Box<Expr>,
        args: Rc<Vec<Expr>>,
    },
    Function(Rc<Function>),
    Import(ImportRef),
    Unknown,
}

impl Expr {
    /// Last name of a callee chain: `Vuex.Store` -> `Store`
    pub fn trailing_name(&self) -> Option<&str> {
        match self {
            Expr::Ident(name) => Some(name),
            Expr::Member { property, .. } => match property.as_ref() {
                Expr::Str(name) => Some(name),
                _ => None,
            },
            _ => None,
        }
    }

    /// Display type of a literal value, used for state entries
    pub fn display_type(&self) -> Option<&'static str> {
        match self {
            Expr::Str(_) | Expr::Template => Some("string"),
            Expr::Number => Some("number"),
            Expr::Bool(_) => Some("boolean"),
            Expr::Null => Some("null"),
            Expr::Array(_) => Some("array"),
            Expr::Object(_) => Some("object"),
            Expr::Function(_) => Some("function"),
            _ => None,
        }
    }
}

/// A function, arrow or method body reduced to what resolution needs
#[derive(Debug, Clone, Default)]
pub struct Function {
    /// Parameters (bound to `Unknown`) and hoisted local declarations
    pub locals: Rc<Bindings>,
    /// Returned expressions in textual order; an expression-bodied arrow has one
    pub returns: Vec<Expr>,
}

/// Property key as written
#[derive(Debug, Clone)]
pub enum PropKey {
    Name(String),
    Computed(Expr),
}

/// Object literal member
#[derive(Debug, Clone)]
pub enum Property {
    Keyed {
        key: PropKey,
        value: Expr,
        position: Position,
        doc: Option<String>,
    },
    Spread(Expr),
}

#[derive(Debug, Clone, Default)]
pub struct ObjectLit {
    pub properties: Vec<Property>,
}

impl ObjectLit {
    /// Value of the last property literally named `name` (spreads ignored)
    pub fn get(&self, name: &str) -> Option<&Expr> {
        self.properties.iter().rev().find_map(|p| match p {
            Property::Keyed {
                key: PropKey::Name(key),
                value,
                ..
            } if key == name => Some(value),
            _ => None,
        })
    }
}

/// A call found anywhere in a file, with the function frames enclosing it
#[derive(Debug, Clone)]
pub struct CallSite {
    pub call: Expr,
    /// Enclosing function frames, outermost first
    pub frames: Vec<Rc<Bindings>>,
    pub position: Position,
}

impl CallSite {
    pub fn args(&self) -> &[Expr] {
        match &self.call {
            Expr::Call { args, .. } | Expr::New { args, .. } => args,
            _ => &[],
        }
    }
}

/// A lowered source file
#[derive(Debug, Default)]
pub struct Program {
    pub path: PathBuf,
    /// Top-level bindings: imports, declarations, functions
    pub scope: Rc<Bindings>,
    pub default_export: Option<Expr>,
    pub named_exports: HashMap<String, Expr>,
    /// Sources of `export * from '...'`
    pub star_exports: Vec<String>,
    /// `new X.Store(...)`, `new Store(...)`, `createStore(...)` in textual order
    pub store_calls: Vec<CallSite>,
    /// `<ref>.registerModule(...)` in textual order
    pub register_calls: Vec<CallSite>,
}

impl Program {
    /// Expression exported under `name`, if declared in this file
    pub fn export(&self, name: &ExportName) -> Option<&Expr> {
        match name {
            ExportName::Default => self.default_export.as_ref(),
            ExportName::Named(name) => self.named_exports.get(name),
        }
    }
}
