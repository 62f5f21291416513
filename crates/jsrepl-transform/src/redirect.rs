//! Scope redirection and completion capture: the last pass.
//!
//! Every free reference to a persistent name is rewritten to a property
//! access on the scope parameter, and every top-level expression statement
//! stores its value in the completion variable:
//!
//! ```text
//! void (a = 1); f(a); a + 1;
//! →
//! let _completion;void (_scope.a = 1); _completion = ((0, _scope.f)(_scope.a)); _completion = (_scope.a + 1);
//! return _completion;
//! ```
//!
//! A loop, `if`, `switch` or `try` in completion position first resets the
//! completion variable, so one that produces no value leaves `undefined`
//! rather than the value of an earlier statement. Statements inside a
//! `finally` block never contribute.
//!
//! The result is a function body taking the scope object as its only
//! parameter. Async fragments return the promise of an inner async arrow.

use std::collections::BTreeSet;

use jsrepl_types::TransformResult;
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrowFunctionExpression, AssignmentTargetPropertyIdentifier, BlockStatement, CallExpression,
    CatchClause, Class, Expression, ExpressionStatement, ForInStatement, ForOfStatement,
    ForStatement, ForStatementInit, ForStatementLeft, Function, FunctionType,
    IdentifierReference, LabeledStatement, ObjectProperty, Statement, StaticBlock,
    SwitchStatement, TaggedTemplateExpression, TryStatement,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;
use oxc_syntax::scope::ScopeFlags;

use crate::names::{generate_uid, identifiers};
use crate::parse::parse;
use crate::patch::Patch;
use crate::scope::{
    bound_names, function_scope_names, lexical_names, loop_head_names, parameter_names,
    ScopeStack,
};

/// Output of the redirect pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Redirected {
    /// A function body over the parameter `scope_name`.
    pub code: String,
    pub scope_name: String,
    pub completion_name: String,
}

/// Redirect references to `keys` through the scope parameter and capture
/// the completion value.
///
/// `discarded` lists offsets of expression statements whose value must not
/// become the completion value.
pub fn redirect(
    source: &str,
    keys: &BTreeSet<String>,
    discarded: &[u32],
    is_async: bool,
) -> TransformResult<Redirected> {
    let allocator = Allocator::default();
    let program = parse(&allocator, source)?;

    let mut taken = identifiers(&program);
    taken.extend(keys.iter().cloned());
    let scope_name = generate_uid("scope", &mut taken);
    let completion_name = generate_uid("completion", &mut taken);

    let mut redirector = Redirector {
        patch: Patch::new(source),
        keys,
        discarded,
        scope_name: &scope_name,
        completion_name: &completion_name,
        scopes: ScopeStack::new(),
        function_depth: 0,
        finally_depth: 0,
        label_body: false,
    };
    redirector.scopes.push(function_scope_names(&program.body));
    redirector.visit_program(&program);
    redirector.scopes.pop();
    let body = redirector.patch.apply()?.code;

    let code = if is_async {
        format!(
            "return (async () => {{let {completion_name};{body}\nreturn {completion_name};\n}})();"
        )
    } else {
        format!("let {completion_name};{body}\nreturn {completion_name};")
    };
    Ok(Redirected {
        code,
        scope_name,
        completion_name,
    })
}

struct Redirector<'s, 'k> {
    patch: Patch<'s>,
    keys: &'k BTreeSet<String>,
    discarded: &'k [u32],
    scope_name: &'k str,
    completion_name: &'k str,
    scopes: ScopeStack,
    /// Functions and static blocks entered; 0 at the fragment's top level.
    function_depth: usize,
    /// `finally` blocks entered.
    finally_depth: usize,
    /// The next statement visited is the body of a labeled statement.
    label_body: bool,
}

impl Redirector<'_, '_> {
    /// Statements here produce the fragment's completion value.
    fn capturing(&self) -> bool {
        self.function_depth == 0 && self.finally_depth == 0
    }
    /// The member expression a free persistent reference to `name` becomes.
    fn redirected(&self, name: &str) -> Option<String> {
        (self.keys.contains(name) && !self.scopes.is_bound(name))
            .then(|| format!("{}.{name}", self.scope_name))
    }

    /// Redirect an identifier callee, keeping `this` undefined in the call.
    fn redirect_callee(&mut self, callee: &Expression<'_>) -> bool {
        let Expression::Identifier(ident) = callee else {
            return false;
        };
        let Some(target) = self.redirected(&ident.name) else {
            return false;
        };
        self.patch.replace(ident.span, format!("(0, {target})"));
        true
    }
}

impl<'a> Visit<'a> for Redirector<'_, '_> {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        if let Some(target) = self.redirected(&it.name) {
            self.patch.replace(it.span, target);
        }
    }

    fn visit_object_property(&mut self, it: &ObjectProperty<'a>) {
        if it.shorthand {
            if let Expression::Identifier(ident) = &it.value {
                if let Some(target) = self.redirected(&ident.name) {
                    self.patch
                        .replace(ident.span, format!("{}: {target}", ident.name));
                    return;
                }
            }
        }
        walk::walk_object_property(self, it);
    }

    fn visit_assignment_target_property_identifier(
        &mut self,
        it: &AssignmentTargetPropertyIdentifier<'a>,
    ) {
        match self.redirected(&it.binding.name) {
            Some(target) => {
                self.patch
                    .replace(it.binding.span, format!("{}: {target}", it.binding.name));
                if let Some(init) = &it.init {
                    self.visit_expression(init);
                }
            }
            None => walk::walk_assignment_target_property_identifier(self, it),
        }
    }

    fn visit_call_expression(&mut self, it: &CallExpression<'a>) {
        if self.redirect_callee(&it.callee) {
            for argument in &it.arguments {
                self.visit_argument(argument);
            }
        } else {
            walk::walk_call_expression(self, it);
        }
    }

    fn visit_tagged_template_expression(&mut self, it: &TaggedTemplateExpression<'a>) {
        if self.redirect_callee(&it.tag) {
            self.visit_template_literal(&it.quasi);
        } else {
            walk::walk_tagged_template_expression(self, it);
        }
    }

    fn visit_expression_statement(&mut self, it: &ExpressionStatement<'a>) {
        if self.capturing() && !self.discarded.contains(&it.span.start) {
            let expression = it.expression.span();
            self.patch
                .insert(expression.start, format!("{} = (", self.completion_name));
            self.patch.insert(expression.end, ")");
            if it.span.end == expression.end {
                self.patch.insert(expression.end, ";");
            }
        }
        walk::walk_expression_statement(self, it);
    }

    fn visit_statement(&mut self, it: &Statement<'a>) {
        let label_body = std::mem::take(&mut self.label_body);
        let resets = !label_body && self.capturing() && resets_completion(it);
        if resets {
            self.patch
                .insert(it.span().start, format!("{{{} = void 0; ", self.completion_name));
        }
        walk::walk_statement(self, it);
        if resets {
            self.patch.insert(it.span().end, "}");
        }
    }

    fn visit_labeled_statement(&mut self, it: &LabeledStatement<'a>) {
        // A labeled body is reset ahead of its label.
        self.label_body = true;
        walk::walk_labeled_statement(self, it);
    }

    fn visit_try_statement(&mut self, it: &TryStatement<'a>) {
        self.visit_block_statement(&it.block);
        if let Some(handler) = &it.handler {
            self.visit_catch_clause(handler);
        }
        if let Some(finalizer) = &it.finalizer {
            self.finally_depth += 1;
            self.visit_block_statement(finalizer);
            self.finally_depth -= 1;
        }
    }

    fn visit_function(&mut self, it: &Function<'a>, _flags: ScopeFlags) {
        self.function_depth += 1;
        // A function expression's own name is visible only inside it.
        let own_name = match (&it.r#type, &it.id) {
            (FunctionType::FunctionExpression, Some(id)) => vec![id.name.to_string()],
            _ => Vec::new(),
        };
        self.scopes.push(own_name);
        let mut params = parameter_names(&it.params);
        params.push("arguments".to_string());
        self.scopes.push(params);
        self.visit_formal_parameters(&it.params);
        if let Some(body) = &it.body {
            self.scopes.push(function_scope_names(&body.statements));
            self.visit_function_body(body);
            self.scopes.pop();
        }
        self.scopes.pop();
        self.scopes.pop();
        self.function_depth -= 1;
    }

    fn visit_arrow_function_expression(&mut self, it: &ArrowFunctionExpression<'a>) {
        self.function_depth += 1;
        self.scopes.push(parameter_names(&it.params));
        self.visit_formal_parameters(&it.params);
        self.scopes.push(function_scope_names(&it.body.statements));
        self.visit_function_body(&it.body);
        self.scopes.pop();
        self.scopes.pop();
        self.function_depth -= 1;
    }

    fn visit_static_block(&mut self, it: &StaticBlock<'a>) {
        self.function_depth += 1;
        self.scopes.push(function_scope_names(&it.body));
        walk::walk_static_block(self, it);
        self.scopes.pop();
        self.function_depth -= 1;
    }

    fn visit_class(&mut self, it: &Class<'a>) {
        self.scopes
            .push(it.id.as_ref().map(|id| id.name.to_string()));
        walk::walk_class(self, it);
        self.scopes.pop();
    }

    fn visit_block_statement(&mut self, it: &BlockStatement<'a>) {
        self.scopes.push(lexical_names(&it.body));
        walk::walk_block_statement(self, it);
        self.scopes.pop();
    }

    fn visit_for_statement(&mut self, it: &ForStatement<'a>) {
        let names = match &it.init {
            Some(ForStatementInit::VariableDeclaration(decl)) => loop_head_names(decl),
            _ => Vec::new(),
        };
        self.scopes.push(names);
        walk::walk_for_statement(self, it);
        self.scopes.pop();
    }

    fn visit_for_in_statement(&mut self, it: &ForInStatement<'a>) {
        self.scopes.push(head_names(&it.left));
        walk::walk_for_in_statement(self, it);
        self.scopes.pop();
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        self.scopes.push(head_names(&it.left));
        walk::walk_for_of_statement(self, it);
        self.scopes.pop();
    }

    fn visit_catch_clause(&mut self, it: &CatchClause<'a>) {
        let mut names = Vec::new();
        if let Some(param) = &it.param {
            bound_names(&param.pattern, &mut names);
        }
        self.scopes.push(names);
        walk::walk_catch_clause(self, it);
        self.scopes.pop();
    }

    fn visit_switch_statement(&mut self, it: &SwitchStatement<'a>) {
        // The discriminant is evaluated outside the case block.
        self.visit_expression(&it.discriminant);
        let mut names = Vec::new();
        for case in &it.cases {
            names.extend(lexical_names(&case.consequent));
        }
        self.scopes.push(names);
        for case in &it.cases {
            self.visit_switch_case(case);
        }
        self.scopes.pop();
    }
}

/// Statements whose completion is `undefined`, not empty, when their body
/// yields no value.
fn resets_completion(statement: &Statement<'_>) -> bool {
    match statement {
        Statement::IfStatement(_)
        | Statement::ForStatement(_)
        | Statement::ForInStatement(_)
        | Statement::ForOfStatement(_)
        | Statement::WhileStatement(_)
        | Statement::DoWhileStatement(_)
        | Statement::SwitchStatement(_)
        | Statement::TryStatement(_) => true,
        Statement::LabeledStatement(labeled) => resets_completion(&labeled.body),
        _ => false,
    }
}

fn head_names(left: &ForStatementLeft<'_>) -> Vec<String> {
    match left {
        ForStatementLeft::VariableDeclaration(decl) => loop_head_names(decl),
        _ => Vec::new(),
    }
}
