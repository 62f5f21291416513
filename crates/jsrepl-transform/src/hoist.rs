//! Declaration hoisting: top-level bindings become plain assignments.
//!
//! A console fragment's declarations must outlive the fragment, so the
//! binding itself moves into the persistent store and only the assignment
//! stays behind:
//!
//! ```text
//! let a = 1, { b } = o;     →  void (a = 1, { b } = o);
//! let c;                    →  ;
//! for (var i = 0;;) {}      →  for (i = 0;;) {}
//! function f() {}           →  void (f = function f() {});   (moved to the front)
//! ```
//!
//! `var` is hoisted wherever it occurs outside a function; `let`, `const`
//! and function declarations only at the top level. `using` declarations
//! are left alone. A declarator without an initializer emits nothing, so a
//! re-declared name keeps the value already stored under it.

use std::collections::HashSet;

use jsrepl_types::TransformResult;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    BindingPatternKind, Expression, ForStatementInit, ForStatementLeft, Function, Statement,
    VariableDeclaration, VariableDeclarationKind,
};
use oxc_span::GetSpan;

use crate::parse::parse;
use crate::patch::{Patch, Patched};
use crate::scope::declared_names;

/// Output of the hoisting pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hoisted {
    pub code: String,
    /// Every name the fragment declares, deduplicated, in source order.
    pub declared: Vec<String>,
    /// Output offsets of the assignment statements this pass generated.
    /// Their values are not the fragment's completion value.
    pub discarded: Vec<u32>,
}

/// Hoist the declarations of `source` out of the fragment.
pub fn hoist(source: &str) -> TransformResult<Hoisted> {
    let allocator = Allocator::default();
    let program = parse(&allocator, source)?;

    let mut hoister = Hoister {
        patch: Patch::new(source),
        declared: Vec::new(),
    };
    for statement in &program.body {
        hoister.statement(statement, true);
    }

    let Hoister { patch, declared } = hoister;
    let Patched { code, marks } = patch.apply()?;
    let mut seen = HashSet::new();
    let declared: Vec<String> = declared
        .into_iter()
        .filter(|name| seen.insert(name.clone()))
        .collect();
    log::trace!("hoisted {} declaration(s): {declared:?}", declared.len());
    Ok(Hoisted {
        code,
        declared,
        discarded: marks,
    })
}

struct Hoister<'s> {
    patch: Patch<'s>,
    declared: Vec<String>,
}

impl Hoister<'_> {
    /// Walk statements without entering functions, classes or expressions.
    fn statement(&mut self, statement: &Statement<'_>, top_level: bool) {
        match statement {
            Statement::VariableDeclaration(decl) if hoists(decl.kind, top_level) => {
                self.declaration_statement(decl);
            }
            Statement::FunctionDeclaration(func) if top_level => self.function(func),
            Statement::BlockStatement(block) => {
                for statement in &block.body {
                    self.statement(statement, false);
                }
            }
            Statement::IfStatement(stmt) => {
                self.statement(&stmt.consequent, false);
                if let Some(alternate) = &stmt.alternate {
                    self.statement(alternate, false);
                }
            }
            Statement::ForStatement(stmt) => {
                if let Some(ForStatementInit::VariableDeclaration(decl)) = &stmt.init {
                    if decl.kind == VariableDeclarationKind::Var {
                        self.for_init(decl);
                    }
                }
                self.statement(&stmt.body, false);
            }
            Statement::ForInStatement(stmt) => {
                self.for_head(&stmt.left);
                self.statement(&stmt.body, false);
            }
            Statement::ForOfStatement(stmt) => {
                self.for_head(&stmt.left);
                self.statement(&stmt.body, false);
            }
            Statement::WhileStatement(stmt) => self.statement(&stmt.body, false),
            Statement::DoWhileStatement(stmt) => self.statement(&stmt.body, false),
            Statement::LabeledStatement(stmt) => self.statement(&stmt.body, false),
            Statement::WithStatement(stmt) => self.statement(&stmt.body, false),
            Statement::TryStatement(stmt) => {
                for statement in &stmt.block.body {
                    self.statement(statement, false);
                }
                if let Some(handler) = &stmt.handler {
                    for statement in &handler.body.body {
                        self.statement(statement, false);
                    }
                }
                if let Some(finalizer) = &stmt.finalizer {
                    for statement in &finalizer.body {
                        self.statement(statement, false);
                    }
                }
            }
            Statement::SwitchStatement(stmt) => {
                for case in &stmt.cases {
                    for statement in &case.consequent {
                        self.statement(statement, false);
                    }
                }
            }
            _ => {}
        }
    }

    fn declaration_statement(&mut self, decl: &VariableDeclaration<'_>) {
        declared_names(decl, &mut self.declared);
        let assignments = self.assignments(decl, false);
        if assignments.is_empty() {
            self.patch.replace(decl.span, ";");
        } else {
            self.patch
                .replace_marked(decl.span, format!("void ({});", assignments.join(", ")));
        }
    }

    fn for_init(&mut self, decl: &VariableDeclaration<'_>) {
        declared_names(decl, &mut self.declared);
        let assignments = self.assignments(decl, true);
        self.patch.replace(decl.span, assignments.join(", "));
    }

    fn for_head(&mut self, left: &ForStatementLeft<'_>) {
        let ForStatementLeft::VariableDeclaration(decl) = left else {
            return;
        };
        if decl.kind != VariableDeclarationKind::Var {
            return;
        }
        declared_names(decl, &mut self.declared);
        if let Some(declarator) = decl.declarations.first() {
            let target = self.patch.text(declarator.id.span());
            self.patch.replace(decl.span, target);
        }
    }

    /// `target = init` for every declarator that has an initializer.
    fn assignments(&self, decl: &VariableDeclaration<'_>, in_for_init: bool) -> Vec<String> {
        decl.declarations
            .iter()
            .filter_map(|declarator| {
                let init = declarator.init.as_ref()?;
                let target = self.patch.text(declarator.id.span());
                let value = self.patch.text(init.span());
                let value = match init {
                    Expression::SequenceExpression(_) => format!("({value})"),
                    _ => value.to_string(),
                };
                let assignment = format!("{target} = {value}");
                // Keep the loop head from opening with `{`.
                let object = matches!(declarator.id.kind, BindingPatternKind::ObjectPattern(_));
                Some(if in_for_init && object {
                    format!("({assignment})")
                } else {
                    assignment
                })
            })
            .collect()
    }

    fn function(&mut self, func: &Function<'_>) {
        let Some(id) = &func.id else {
            return;
        };
        self.declared.push(id.name.to_string());
        let text = self.patch.text(func.span);
        self.patch
            .insert_marked(0, format!("void ({} = {text});", id.name));
        self.patch.replace(func.span, "");
    }
}

fn hoists(kind: VariableDeclarationKind, top_level: bool) -> bool {
    match kind {
        VariableDeclarationKind::Var => true,
        VariableDeclarationKind::Let | VariableDeclarationKind::Const => top_level,
        _ => false,
    }
}
