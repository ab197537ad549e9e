//! Lowering from the tree-sitter CST to the tagged model in [`super::ast`]
//!
//! One `Lowerer` walks one file. Function bodies are lowered once and
//! memoized by node id so that call sites found later can share the
//! frames of their enclosing functions.

use std::collections::HashMap;
use std::path::Path;
use std::rc::Rc;

use tree_sitter::Node;

use super::ast::{
    Bindings, CallSite, ExportName, Expr, Function, ImportName, ImportRef, ObjectLit, Program,
    PropKey, Property,
};
use super::common::{
    clean_doc_comment, first_named_child, get_node_text, has_token, is_doc_comment,
    is_function_kind, named_children, node_position, string_literal_value, visit_all,
};

pub(crate) struct Lowerer<'s> {
    source: &'s str,
    line_offset: usize,
    /// Characters prepended to the first line before parsing
    first_line_shift: usize,
    functions: HashMap<usize, Rc<Function>>,
}

impl<'s> Lowerer<'s> {
    pub(crate) fn new(source: &'s str, line_offset: usize, first_line_shift: usize) -> Self {
        Self {
            source,
            line_offset,
            first_line_shift,
            functions: HashMap::new(),
        }
    }

    fn text(&self, node: &Node) -> &'s str {
        get_node_text(node, self.source)
    }

    fn position(&self, node: &Node) -> super::ast::Position {
        let mut position = node_position(node, self.source, self.line_offset);
        if node.start_position().row == 0 {
            position.column = position.column.saturating_sub(self.first_line_shift);
        }
        position
    }

    // =========================================================================
    // Program
    // =========================================================================

    /// Lower a whole file. With `expression_module` the first top-level
    /// expression becomes the default export (JSON documents).
    pub(crate) fn lower_program(
        mut self,
        root: Node,
        path: &Path,
        expression_module: bool,
    ) -> Program {
        let mut scope = Bindings::new();
        let mut program = Program {
            path: path.to_path_buf(),
            ..Default::default()
        };

        for statement in named_children(&root) {
            match statement.kind() {
                "import_statement" => self.lower_import(statement, &mut scope),
                "export_statement" => self.lower_export(statement, &mut scope, &mut program),
                "expression_statement" if expression_module => {
                    if program.default_export.is_none() {
                        program.default_export =
                            first_named_child(&statement).map(|e| self.lower_expr(e));
                    }
                }
                "expression_statement" => self.lower_commonjs_export(statement, &mut program),
                _ => {
                    self.declare(statement, &mut scope);
                }
            }
        }

        self.collect_calls(root, &mut program);
        program.scope = Rc::new(scope);
        program
    }

    fn lower_import(&mut self, node: Node, scope: &mut Bindings) {
        let Some(source) = node
            .child_by_field_name("source")
            .map(|s| string_literal_value(&s, self.source))
        else {
            return;
        };
        let Some(clause) = named_children(&node)
            .into_iter()
            .find(|c| c.kind() == "import_clause")
        else {
            return;
        };

        for child in named_children(&clause) {
            match child.kind() {
                "identifier" => {
                    scope.insert(
                        self.text(&child).to_string(),
                        Expr::Import(ImportRef::default_of(&source)),
                    );
                }
                "namespace_import" => {
                    if let Some(local) = first_named_child(&child) {
                        scope.insert(
                            self.text(&local).to_string(),
                            Expr::Import(ImportRef {
                                source: source.clone(),
                                name: ImportName::Namespace,
                            }),
                        );
                    }
                }
                "named_imports" => {
                    for specifier in named_children(&child) {
                        if specifier.kind() != "import_specifier" {
                            continue;
                        }
                        let Some(name_node) = specifier.child_by_field_name("name") else {
                            continue;
                        };
                        let imported = self.name_value(&name_node);
                        let local = specifier
                            .child_by_field_name("alias")
                            .map(|a| self.text(&a).to_string())
                            .unwrap_or_else(|| imported.clone());
                        scope.insert(
                            local,
                            Expr::Import(ImportRef {
                                source: source.clone(),
                                name: ImportName::Export(export_name(&imported)),
                            }),
                        );
                    }
                }
                _ => {}
            }
        }
    }

    fn lower_export(&mut self, node: Node, scope: &mut Bindings, program: &mut Program) {
        let source = node
            .child_by_field_name("source")
            .map(|s| string_literal_value(&s, self.source));
        let is_default = has_token(&node, "default");

        if let Some(declaration) = node.child_by_field_name("declaration") {
            let names = self.declare(declaration, scope);
            if is_default {
                program.default_export = names.first().map(|name| Expr::Ident(name.clone()));
            } else {
                for name in names {
                    program
                        .named_exports
                        .insert(name.clone(), Expr::Ident(name));
                }
            }
            return;
        }

        if let Some(value) = node.child_by_field_name("value") {
            program.default_export = Some(self.lower_expr(value));
            return;
        }

        let children = named_children(&node);
        if let Some(clause) = children.iter().find(|c| c.kind() == "export_clause") {
            for specifier in named_children(clause) {
                if specifier.kind() != "export_specifier" {
                    continue;
                }
                let Some(name_node) = specifier.child_by_field_name("name") else {
                    continue;
                };
                let local = self.name_value(&name_node);
                let exported = specifier
                    .child_by_field_name("alias")
                    .map(|a| self.name_value(&a))
                    .unwrap_or_else(|| local.clone());
                let value = match &source {
                    Some(source) => Expr::Import(ImportRef {
                        source: source.clone(),
                        name: ImportName::Export(export_name(&local)),
                    }),
                    None => Expr::Ident(local),
                };
                match export_name(&exported) {
                    ExportName::Default => program.default_export = Some(value),
                    ExportName::Named(name) => {
                        program.named_exports.insert(name, value);
                    }
                }
            }
            return;
        }

        let Some(source) = source else {
            return;
        };
        if let Some(namespace) = children.iter().find(|c| c.kind() == "namespace_export") {
            if let Some(name) = first_named_child(namespace) {
                program.named_exports.insert(
                    self.name_value(&name),
                    Expr::Import(ImportRef {
                        source,
                        name: ImportName::Namespace,
                    }),
                );
            }
        } else if has_token(&node, "*") {
            program.star_exports.push(source);
        }
    }

    /// `module.exports = ...`, `exports.x = ...`, `module.exports.x = ...`
    fn lower_commonjs_export(&mut self, statement: Node, program: &mut Program) {
        let Some(expression) = first_named_child(&statement) else {
            return;
        };
        if expression.kind() != "assignment_expression" {
            return;
        }
        let (Some(left), Some(right)) = (
            expression.child_by_field_name("left"),
            expression.child_by_field_name("right"),
        ) else {
            return;
        };

        if self.text(&left) == "module.exports" {
            program.default_export = Some(self.lower_expr(right));
            return;
        }
        if left.kind() != "member_expression" {
            return;
        }
        let (Some(object), Some(property)) = (
            left.child_by_field_name("object"),
            left.child_by_field_name("property"),
        ) else {
            return;
        };
        if matches!(self.text(&object), "exports" | "module.exports") {
            let value = self.lower_expr(right);
            program
                .named_exports
                .insert(self.text(&property).to_string(), value);
        }
    }

    /// Bind the names a declaration introduces; returns them in order
    fn declare(&mut self, node: Node, bindings: &mut Bindings) -> Vec<String> {
        let mut names = Vec::new();
        match node.kind() {
            "lexical_declaration" | "variable_declaration" => {
                for declarator in named_children(&node) {
                    if declarator.kind() != "variable_declarator" {
                        continue;
                    }
                    let Some(name) = declarator.child_by_field_name("name") else {
                        continue;
                    };
                    if name.kind() == "identifier" {
                        let value = declarator
                            .child_by_field_name("value")
                            .map(|v| self.lower_expr(v))
                            .unwrap_or(Expr::Unknown);
                        let name = self.text(&name).to_string();
                        bindings.insert(name.clone(), value);
                        names.push(name);
                    } else {
                        for bound in pattern_names(name, self.source) {
                            bindings.insert(bound.clone(), Expr::Unknown);
                            names.push(bound);
                        }
                    }
                }
            }
            "function_declaration" | "generator_function_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let function = self.function(node);
                    let name = self.text(&name).to_string();
                    bindings.insert(name.clone(), Expr::Function(function));
                    names.push(name);
                }
            }
            "class_declaration" | "abstract_class_declaration" => {
                if let Some(name) = node.child_by_field_name("name") {
                    let name = self.text(&name).to_string();
                    bindings.insert(name.clone(), Expr::Unknown);
                    names.push(name);
                }
            }
            _ => {}
        }
        names
    }

    /// Bind every identifier of a destructuring or parameter pattern to `Unknown`
    fn bind_pattern(&self, pattern: Node, bindings: &mut Bindings) {
        for name in pattern_names(pattern, self.source) {
            bindings.insert(name, Expr::Unknown);
        }
    }

    // =========================================================================
    // Call sites
    // =========================================================================

    fn collect_calls(&mut self, root: Node, program: &mut Program) {
        let mut store_nodes = Vec::new();
        let mut register_nodes = Vec::new();

        visit_all(&root, |node| match node.kind() {
            "call_expression" => {
                let Some(callee) = node.child_by_field_name("function") else {
                    return;
                };
                match callee_name(&callee, self.source) {
                    Some("registerModule") if callee.kind() == "member_expression" => {
                        register_nodes.push(*node)
                    }
                    Some("createStore") => store_nodes.push(*node),
                    _ => {}
                }
            }
            "new_expression" => {
                let is_store = node
                    .child_by_field_name("constructor")
                    .and_then(|c| callee_name(&c, self.source))
                    == Some("Store");
                if is_store {
                    store_nodes.push(*node);
                }
            }
            _ => {}
        });

        program.store_calls = store_nodes
            .into_iter()
            .map(|node| self.call_site(node))
            .collect();
        program.register_calls = register_nodes
            .into_iter()
            .map(|node| self.call_site(node))
            .collect();
    }

    fn call_site(&mut self, node: Node) -> CallSite {
        let call = self.lower_expr(node);
        let mut frames = Vec::new();
        let mut current = node.parent();
        while let Some(ancestor) = current {
            if is_function_kind(ancestor.kind()) {
                frames.push(self.function(ancestor).locals.clone());
            }
            current = ancestor.parent();
        }
        frames.reverse();
        CallSite {
            call,
            frames,
            position: self.position(&node),
        }
    }

    // =========================================================================
    // Expressions
    // =========================================================================

    pub(crate) fn lower_expr(&mut self, node: Node) -> Expr {
        match node.kind() {
            "object" => Expr::Object(Rc::new(self.lower_object(node))),
            "array" => {
                let items = named_children(&node)
                    .into_iter()
                    .map(|item| self.lower_expr(item))
                    .collect();
                Expr::Array(Rc::new(items))
            }
            "string" => Expr::Str(string_literal_value(&node, self.source)),
            "template_string" => {
                let substituted = named_children(&node)
                    .iter()
                    .any(|c| c.kind() == "template_substitution");
                if substituted {
                    Expr::Template
                } else {
                    Expr::Str(string_literal_value(&node, self.source))
                }
            }
            "number" => Expr::Number,
            "true" => Expr::Bool(true),
            "false" => Expr::Bool(false),
            "null" | "undefined" => Expr::Null,
            "identifier" => Expr::Ident(self.text(&node).to_string()),
            "member_expression" => {
                let (Some(object), Some(property)) = (
                    node.child_by_field_name("object"),
                    node.child_by_field_name("property"),
                ) else {
                    return Expr::Unknown;
                };
                Expr::Member {
                    object: Box::new(self.lower_expr(object)),
                    property: Box::new(Expr::Str(self.text(&property).to_string())),
                }
            }
            "subscript_expression" => {
                let (Some(object), Some(index)) = (
                    node.child_by_field_name("object"),
                    node.child_by_field_name("index"),
                ) else {
                    return Expr::Unknown;
                };
                Expr::Member {
                    object: Box::new(self.lower_expr(object)),
                    property: Box::new(self.lower_expr(index)),
                }
            }
            "call_expression" => self.lower_call(node),
            "new_expression" => {
                let Some(callee) = node.child_by_field_name("constructor") else {
                    return Expr::Unknown;
                };
                let args = node
                    .child_by_field_name("arguments")
                    .map(|a| self.lower_arguments(a))
                    .unwrap_or_default();
                Expr::New {
                    callee: Box::new(self.lower_expr(callee)),
                    args: Rc::new(args),
                }
            }
            kind if is_function_kind(kind) => Expr::Function(self.function(node)),
            "parenthesized_expression"
            | "as_expression"
            | "satisfies_expression"
            | "non_null_expression"
            | "await_expression" => first_named_child(&node)
                .map(|inner| self.lower_expr(inner))
                .unwrap_or(Expr::Unknown),
            "type_assertion" => named_children(&node)
                .pop()
                .map(|inner| self.lower_expr(inner))
                .unwrap_or(Expr::Unknown),
            "assignment_expression" => node
                .child_by_field_name("right")
                .map(|right| self.lower_expr(right))
                .unwrap_or(Expr::Unknown),
            _ => Expr::Unknown,
        }
    }

    fn lower_call(&mut self, node: Node) -> Expr {
        let Some(callee) = node.child_by_field_name("function") else {
            return Expr::Unknown;
        };
        let Some(arguments) = node.child_by_field_name("arguments") else {
            return Expr::Unknown;
        };
        if arguments.kind() != "arguments" {
            // tagged template
            return Expr::Unknown;
        }
        let args = self.lower_arguments(arguments);

        if callee.kind() == "identifier" && self.text(&callee) == "require" {
            if let Some(Expr::Str(source)) = args.first() {
                return Expr::Import(ImportRef::default_of(source));
            }
        }

        Expr::Call {
            callee: Box::new(self.lower_expr(callee)),
            args: Rc::new(args),
        }
    }

    fn lower_arguments(&mut self, arguments: Node) -> Vec<Expr> {
        named_children(&arguments)
            .into_iter()
            .map(|arg| {
                if arg.kind() == "spread_element" {
                    Expr::Unknown
                } else {
                    self.lower_expr(arg)
                }
            })
            .collect()
    }

    fn lower_object(&mut self, node: Node) -> ObjectLit {
        let mut properties = Vec::new();
        let mut docs: Vec<String> = Vec::new();

        let mut cursor = node.walk();
        let children: Vec<Node> = node.named_children(&mut cursor).collect();

        for child in children {
            match child.kind() {
                "comment" => {
                    let text = self.text(&child);
                    if is_doc_comment(text) {
                        let cleaned = clean_doc_comment(text);
                        if !cleaned.is_empty() {
                            docs.push(cleaned);
                        }
                    } else {
                        // only a doc block directly above a property documents it
                        docs.clear();
                    }
                }
                "pair" => {
                    let (Some(key), Some(value)) = (
                        child.child_by_field_name("key"),
                        child.child_by_field_name("value"),
                    ) else {
                        docs.clear();
                        continue;
                    };
                    properties.push(Property::Keyed {
                        key: self.lower_key(key),
                        value: self.lower_expr(value),
                        position: self.position(&key),
                        doc: take_doc(&mut docs),
                    });
                }
                "shorthand_property_identifier" => {
                    let name = self.text(&child).to_string();
                    properties.push(Property::Keyed {
                        key: PropKey::Name(name.clone()),
                        value: Expr::Ident(name),
                        position: self.position(&child),
                        doc: take_doc(&mut docs),
                    });
                }
                "method_definition" => {
                    let Some(name) = child.child_by_field_name("name") else {
                        docs.clear();
                        continue;
                    };
                    properties.push(Property::Keyed {
                        key: self.lower_key(name),
                        value: Expr::Function(self.function(child)),
                        position: self.position(&name),
                        doc: take_doc(&mut docs),
                    });
                }
                "spread_element" => {
                    docs.clear();
                    if let Some(inner) = first_named_child(&child) {
                        properties.push(Property::Spread(self.lower_expr(inner)));
                    }
                }
                _ => docs.clear(),
            }
        }

        ObjectLit { properties }
    }

    fn lower_key(&mut self, key: Node) -> PropKey {
        match key.kind() {
            "string" => PropKey::Name(string_literal_value(&key, self.source)),
            "computed_property_name" => PropKey::Computed(
                first_named_child(&key)
                    .map(|inner| self.lower_expr(inner))
                    .unwrap_or(Expr::Unknown),
            ),
            _ => PropKey::Name(self.text(&key).to_string()),
        }
    }

    /// Identifier-or-string name used by import/export specifiers
    fn name_value(&self, node: &Node) -> String {
        if node.kind() == "string" {
            string_literal_value(node, self.source)
        } else {
            self.text(node).to_string()
        }
    }

    // =========================================================================
    // Functions
    // =========================================================================

    fn function(&mut self, node: Node) -> Rc<Function> {
        if let Some(function) = self.functions.get(&node.id()) {
            return function.clone();
        }

        let mut locals = Bindings::new();
        let mut returns = Vec::new();

        if let Some(parameters) = node.child_by_field_name("parameters") {
            self.bind_pattern(parameters, &mut locals);
        } else if let Some(parameter) = node.child_by_field_name("parameter") {
            self.bind_pattern(parameter, &mut locals);
        }

        if let Some(body) = node.child_by_field_name("body") {
            if body.kind() == "statement_block" {
                self.collect_block(body, &mut locals, &mut returns);
            } else {
                returns.push(self.lower_expr(body));
            }
        }

        let function = Rc::new(Function {
            locals: Rc::new(locals),
            returns,
        });
        self.functions.insert(node.id(), function.clone());
        function
    }

    /// Hoist declarations and gather `return` expressions of one function
    /// body, without entering nested functions or classes
    fn collect_block(&mut self, block: Node, locals: &mut Bindings, returns: &mut Vec<Expr>) {
        let mut stack: Vec<Node> = named_children(&block);
        stack.reverse();

        while let Some(node) = stack.pop() {
            match node.kind() {
                "return_statement" => {
                    if let Some(value) = first_named_child(&node) {
                        returns.push(self.lower_expr(value));
                    }
                }
                "lexical_declaration"
                | "variable_declaration"
                | "function_declaration"
                | "generator_function_declaration"
                | "class_declaration" => {
                    self.declare(node, locals);
                }
                kind if is_function_kind(kind) || kind == "class" || kind == "class_body" => {}
                _ => {
                    let mut children = named_children(&node);
                    children.reverse();
                    stack.extend(children);
                }
            }
        }
    }
}

fn take_doc(docs: &mut Vec<String>) -> Option<String> {
    if docs.is_empty() {
        None
    } else {
        Some(std::mem::take(docs).join("\n"))
    }
}

fn export_name(name: &str) -> ExportName {
    if name == "default" {
        ExportName::Default
    } else {
        ExportName::Named(name.to_string())
    }
}

/// Trailing name of a callee node: `Vuex.Store` -> `Store`
fn callee_name<'s>(callee: &Node, source: &'s str) -> Option<&'s str> {
    match callee.kind() {
        "identifier" => Some(get_node_text(callee, source)),
        "member_expression" => callee
            .child_by_field_name("property")
            .map(|p| get_node_text(&p, source)),
        _ => None,
    }
}

/// Identifiers bound by a parameter list or destructuring pattern
fn pattern_names(pattern: Node, source: &str) -> Vec<String> {
    let mut names = Vec::new();
    let mut stack = vec![pattern];

    while let Some(node) = stack.pop() {
        match node.kind() {
            "identifier" | "shorthand_property_identifier_pattern" => {
                names.push(get_node_text(&node, source).to_string());
            }
            "required_parameter" | "optional_parameter" => {
                if let Some(inner) = node.child_by_field_name("pattern") {
                    stack.push(inner);
                }
            }
            "assignment_pattern" | "object_assignment_pattern" => {
                if let Some(left) = node.child_by_field_name("left") {
                    stack.push(left);
                }
            }
            "pair_pattern" => {
                if let Some(value) = node.child_by_field_name("value") {
                    stack.push(value);
                }
            }
            "formal_parameters" | "object_pattern" | "array_pattern" | "rest_pattern" => {
                stack.extend(named_children(&node));
            }
            _ => {}
        }
    }
    names
}
