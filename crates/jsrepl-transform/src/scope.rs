//! Lexical scope bookkeeping for the redirect pass.
//!
//! [`ScopeStack`] manages a stack of scopes, each holding the names bound
//! there. The collectors below compute, for a statement list, the names a
//! scope binds on entry, following declaration instantiation: `var` and
//! function declarations belong to the nearest function (or program) scope,
//! `let`/`const`/`class` to the nearest block.

use std::collections::HashSet;

use oxc_ast::ast::{
    BindingPattern, BindingPatternKind, ForStatementInit, ForStatementLeft, FormalParameters,
    Statement, VariableDeclaration, VariableDeclarationKind,
};

// ══════════════════════════════════════════════════════════════════════════════
// ScopeStack
// ══════════════════════════════════════════════════════════════════════════════

/// A stack of scopes for name resolution inside one fragment.
///
/// The persistent store is not a scope here. It is what a name falls
/// through to when no pushed scope binds it.
#[derive(Debug, Default)]
pub(crate) struct ScopeStack {
    scopes: Vec<HashSet<String>>,
}

impl ScopeStack {
    pub fn new() -> Self {
        Self::default()
    }

    /// Push a scope binding `names`.
    pub fn push(&mut self, names: impl IntoIterator<Item = String>) {
        self.scopes.push(names.into_iter().collect());
    }

    /// Pop the innermost scope.
    pub fn pop(&mut self) {
        self.scopes.pop();
    }

    /// Whether any enclosing scope binds `name`.
    pub fn is_bound(&self, name: &str) -> bool {
        self.scopes.iter().rev().any(|scope| scope.contains(name))
    }
}

// ══════════════════════════════════════════════════════════════════════════════
// Declaration collectors
// ══════════════════════════════════════════════════════════════════════════════

/// Names bound by a binding pattern, in source order.
pub(crate) fn bound_names(pattern: &BindingPattern<'_>, out: &mut Vec<String>) {
    match &pattern.kind {
        BindingPatternKind::BindingIdentifier(ident) => out.push(ident.name.to_string()),
        BindingPatternKind::ObjectPattern(object) => {
            for property in &object.properties {
                bound_names(&property.value, out);
            }
            if let Some(rest) = &object.rest {
                bound_names(&rest.argument, out);
            }
        }
        BindingPatternKind::ArrayPattern(array) => {
            for element in array.elements.iter().flatten() {
                bound_names(element, out);
            }
            if let Some(rest) = &array.rest {
                bound_names(&rest.argument, out);
            }
        }
        BindingPatternKind::AssignmentPattern(assignment) => bound_names(&assignment.left, out),
    }
}

/// Names bound by every declarator of a declaration.
pub(crate) fn declared_names(decl: &VariableDeclaration<'_>, out: &mut Vec<String>) {
    for declarator in &decl.declarations {
        bound_names(&declarator.id, out);
    }
}

/// Names bound by a parameter list.
pub(crate) fn parameter_names(params: &FormalParameters<'_>) -> Vec<String> {
    let mut out = Vec::new();
    for param in &params.items {
        bound_names(&param.pattern, &mut out);
    }
    if let Some(rest) = &params.rest {
        bound_names(&rest.argument, &mut out);
    }
    out
}

pub(crate) fn is_lexical(kind: VariableDeclarationKind) -> bool {
    !matches!(kind, VariableDeclarationKind::Var)
}

/// Names a block-level statement list binds: `let`, `const`, `using`,
/// classes and block functions.
pub(crate) fn lexical_names(statements: &[Statement<'_>]) -> Vec<String> {
    let mut out = Vec::new();
    for statement in statements {
        match statement {
            Statement::VariableDeclaration(decl) if is_lexical(decl.kind) => {
                declared_names(decl, &mut out);
            }
            Statement::ClassDeclaration(class) => {
                if let Some(id) = &class.id {
                    out.push(id.name.to_string());
                }
            }
            Statement::FunctionDeclaration(func) => {
                if let Some(id) = &func.id {
                    out.push(id.name.to_string());
                }
            }
            _ => {}
        }
    }
    out
}

/// Names a function body (or the program) binds: its `var` declarations at
/// any depth outside nested functions, plus its own lexical names.
pub(crate) fn function_scope_names(statements: &[Statement<'_>]) -> Vec<String> {
    let mut out = Vec::new();
    for statement in statements {
        var_names(statement, &mut out);
    }
    out.extend(lexical_names(statements));
    out
}

/// `var` declarations reachable from `statement` without entering a nested
/// function, class or static block.
fn var_names(statement: &Statement<'_>, out: &mut Vec<String>) {
    match statement {
        Statement::VariableDeclaration(decl) if !is_lexical(decl.kind) => declared_names(decl, out),
        Statement::BlockStatement(block) => {
            for statement in &block.body {
                var_names(statement, out);
            }
        }
        Statement::IfStatement(stmt) => {
            var_names(&stmt.consequent, out);
            if let Some(alternate) = &stmt.alternate {
                var_names(alternate, out);
            }
        }
        Statement::ForStatement(stmt) => {
            if let Some(ForStatementInit::VariableDeclaration(decl)) = &stmt.init {
                if !is_lexical(decl.kind) {
                    declared_names(decl, out);
                }
            }
            var_names(&stmt.body, out);
        }
        Statement::ForInStatement(stmt) => {
            var_head_names(&stmt.left, out);
            var_names(&stmt.body, out);
        }
        Statement::ForOfStatement(stmt) => {
            var_head_names(&stmt.left, out);
            var_names(&stmt.body, out);
        }
        Statement::WhileStatement(stmt) => var_names(&stmt.body, out),
        Statement::DoWhileStatement(stmt) => var_names(&stmt.body, out),
        Statement::LabeledStatement(stmt) => var_names(&stmt.body, out),
        Statement::WithStatement(stmt) => var_names(&stmt.body, out),
        Statement::TryStatement(stmt) => {
            for statement in &stmt.block.body {
                var_names(statement, out);
            }
            if let Some(handler) = &stmt.handler {
                for statement in &handler.body.body {
                    var_names(statement, out);
                }
            }
            if let Some(finalizer) = &stmt.finalizer {
                for statement in &finalizer.body {
                    var_names(statement, out);
                }
            }
        }
        Statement::SwitchStatement(stmt) => {
            for case in &stmt.cases {
                for statement in &case.consequent {
                    var_names(statement, out);
                }
            }
        }
        _ => {}
    }
}

fn var_head_names(left: &ForStatementLeft<'_>, out: &mut Vec<String>) {
    if let ForStatementLeft::VariableDeclaration(decl) = left {
        if !is_lexical(decl.kind) {
            declared_names(decl, out);
        }
    }
}

/// Names a `for`/`for-in`/`for-of` head binds for the loop's own scope.
pub(crate) fn loop_head_names(decl: &VariableDeclaration<'_>) -> Vec<String> {
    let mut out = Vec::new();
    if is_lexical(decl.kind) {
        declared_names(decl, &mut out);
    }
    out
}
