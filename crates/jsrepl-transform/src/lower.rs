//! Import/class lowering: the first pass over a fragment.
//!
//! ```text
//! import d, { a, b as c } from "m";   →  let { default: d, a, b: c } = await import("m");
//! import * as ns from "m";            →  let ns = await import("m");
//! class Point {}                      →  let Point = class Point {};
//! ```
//!
//! Static imports become ordinary top-level declarations so the hoisting
//! pass can move them into the binding store like any other `let`. The same
//! traversal decides whether the fragment needs an async wrapper.

use jsrepl_types::{SourceFile, Span, TransformError, TransformResult};
use oxc_allocator::Allocator;
use oxc_ast::ast::{
    ArrowFunctionExpression, AwaitExpression, Class, ForOfStatement, Function,
    ImportDeclaration, ImportDeclarationSpecifier, Statement, StaticBlock,
};
use oxc_ast_visit::{walk, Visit};
use oxc_span::GetSpan;
use oxc_syntax::scope::ScopeFlags;

use crate::parse::parse;
use crate::patch::Patch;

/// Text prefixed to every fragment so the program is never empty.
pub const FRAGMENT_PREFIX: &str = "void 0;";

/// Output of the lowering pass.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Lowered {
    /// The fragment, prefixed with [`FRAGMENT_PREFIX`], imports and top-level
    /// classes rewritten.
    pub code: String,
    /// The fragment contains an import, a top-level `await` or a `for await`.
    pub is_async: bool,
    /// Imports carrying a `with` (or `assert`) clause, located in the
    /// fragment's own text.
    pub attributed_imports: Vec<Span>,
}

/// Lower imports and top-level classes of a user fragment.
pub fn lower(fragment: &str) -> TransformResult<Lowered> {
    let text = format!("{FRAGMENT_PREFIX}{fragment}");
    let allocator = Allocator::default();
    let program = parse(&allocator, &text)?;

    let mut lowerer = Lowerer {
        patch: Patch::new(&text),
        file: SourceFile::new(fragment),
        is_async: false,
        attributed_imports: Vec::new(),
    };
    for statement in &program.body {
        match statement {
            Statement::ImportDeclaration(decl) => lowerer.lower_import(decl)?,
            Statement::ClassDeclaration(class) => {
                lowerer.lower_class(class);
                lowerer.visit_class(class);
            }
            Statement::ExportNamedDeclaration(_)
            | Statement::ExportDefaultDeclaration(_)
            | Statement::ExportAllDeclaration(_) => {
                return Err(TransformError::Unsupported {
                    construct: "export declaration".into(),
                    span: lowerer.user_span(statement.span()),
                });
            }
            _ => lowerer.visit_statement(statement),
        }
    }

    let Lowerer {
        patch,
        is_async,
        attributed_imports,
        ..
    } = lowerer;
    let code = patch.apply()?.code;
    log::debug!("lowered fragment (async: {is_async})");
    Ok(Lowered {
        code,
        is_async,
        attributed_imports,
    })
}

struct Lowerer<'s> {
    patch: Patch<'s>,
    /// The fragment without [`FRAGMENT_PREFIX`].
    file: SourceFile,
    is_async: bool,
    attributed_imports: Vec<Span>,
}

impl Lowerer<'_> {
    /// Locate a span of the prefixed text in the user's fragment.
    fn user_span(&self, span: oxc_span::Span) -> Span {
        let offset = FRAGMENT_PREFIX.len();
        self.file.span(
            (span.start as usize).saturating_sub(offset),
            (span.end as usize).saturating_sub(offset),
        )
    }

    fn lower_import(&mut self, decl: &ImportDeclaration<'_>) -> TransformResult<()> {
        let specifier = self.patch.text(decl.source.span);
        let import = match self.import_attributes(decl) {
            Some(attributes) => {
                let import = format!("await import({specifier}, {{ with: {attributes} }})");
                let span = self.user_span(decl.span);
                self.attributed_imports.push(span);
                import
            }
            None => format!("await import({specifier})"),
        };

        let specifiers: Vec<&ImportDeclarationSpecifier<'_>> =
            decl.specifiers.iter().flat_map(|list| list.iter()).collect();
        let namespace = specifiers.iter().find_map(|spec| match spec {
            ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => Some(ns.local.name.as_str()),
            _ => None,
        });

        let replacement = match namespace {
            Some(ns) => {
                // Only a default import may accompany a namespace import.
                let mut extra = Vec::new();
                for spec in &specifiers {
                    match spec {
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(_) => {}
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                            extra.push(format!("default: {}", default.local.name));
                        }
                        ImportDeclarationSpecifier::ImportSpecifier(named) => {
                            return Err(TransformError::invariant(format!(
                                "named import `{}` next to namespace import `{ns}`",
                                named.local.name
                            )));
                        }
                    }
                }
                if extra.is_empty() {
                    format!("let {ns} = {import};")
                } else {
                    format!("let {ns} = {import}, {{ {} }} = {ns};", extra.join(", "))
                }
            }
            None => {
                let mut properties = Vec::with_capacity(specifiers.len());
                for spec in &specifiers {
                    properties.push(match spec {
                        ImportDeclarationSpecifier::ImportSpecifier(named) => {
                            let imported = self.patch.text(named.imported.span());
                            let local = named.local.name.as_str();
                            if imported == local {
                                local.to_string()
                            } else {
                                format!("{imported}: {local}")
                            }
                        }
                        ImportDeclarationSpecifier::ImportDefaultSpecifier(default) => {
                            format!("default: {}", default.local.name)
                        }
                        ImportDeclarationSpecifier::ImportNamespaceSpecifier(ns) => {
                            return Err(TransformError::invariant(format!(
                                "namespace import `{}` reached destructuring",
                                ns.local.name
                            )));
                        }
                    });
                }
                if properties.is_empty() {
                    format!("let {{}} = {import};")
                } else {
                    format!("let {{ {} }} = {import};", properties.join(", "))
                }
            }
        };

        self.patch.replace(decl.span, replacement);
        self.is_async = true;
        Ok(())
    }

    /// The `{ … }` object of a `with { … }` (or legacy `assert { … }`) clause.
    fn import_attributes(&self, decl: &ImportDeclaration<'_>) -> Option<&str> {
        let source = self.patch.source();
        let tail = source.get(decl.source.span.end as usize..decl.span.end as usize)?;
        let tail = tail.trim().trim_end_matches(';').trim_end();
        let object = tail
            .strip_prefix("with")
            .or_else(|| tail.strip_prefix("assert"))?
            .trim_start();
        object.starts_with('{').then_some(object)
    }

    fn lower_class(&mut self, class: &Class<'_>) {
        if let Some(id) = &class.id {
            self.patch.insert(class.span.start, format!("let {} = ", id.name));
            self.patch.insert(class.span.end, ";");
        }
    }
}

impl<'a> Visit<'a> for Lowerer<'_> {
    // Nested function bodies keep their own scope and their own awaits.
    fn visit_function(&mut self, _it: &Function<'a>, _flags: ScopeFlags) {}

    fn visit_arrow_function_expression(&mut self, _it: &ArrowFunctionExpression<'a>) {}

    fn visit_static_block(&mut self, _it: &StaticBlock<'a>) {}

    fn visit_await_expression(&mut self, it: &AwaitExpression<'a>) {
        self.is_async = true;
        walk::walk_await_expression(self, it);
    }

    fn visit_for_of_statement(&mut self, it: &ForOfStatement<'a>) {
        if it.r#await {
            self.is_async = true;
        }
        walk::walk_for_of_statement(self, it);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lowered(fragment: &str) -> String {
        lower(fragment).unwrap().code
    }

    #[test]
    fn test_prefix_is_added() {
        let out = lower("1 + 1;").unwrap();
        assert_eq!(out.code, "void 0;1 + 1;");
        assert!(!out.is_async);
    }

    #[test]
    fn test_named_and_default_imports() {
        assert_eq!(
            lowered(r#"import d, { a, b as c } from "m";"#),
            r#"void 0;let { default: d, a, b: c } = await import("m");"#
        );
    }

    #[test]
    fn test_namespace_import() {
        assert_eq!(
            lowered(r#"import * as ns from "./mod.js";"#),
            r#"void 0;let ns = await import("./mod.js");"#
        );
    }

    #[test]
    fn test_namespace_with_default_import() {
        assert_eq!(
            lowered(r#"import d, * as ns from "m";"#),
            r#"void 0;let ns = await import("m"), { default: d } = ns;"#
        );
    }

    #[test]
    fn test_bare_import() {
        assert_eq!(
            lowered(r#"import "side-effect";"#),
            r#"void 0;let {} = await import("side-effect");"#
        );
    }

    #[test]
    fn test_string_named_import() {
        assert_eq!(
            lowered(r#"import { "kebab-name" as kebab } from "m";"#),
            r#"void 0;let { "kebab-name": kebab } = await import("m");"#
        );
    }

    #[test]
    fn test_import_attributes_are_forwarded() {
        assert_eq!(
            lowered(r#"import data from "./data.json" with { type: "json" };"#),
            r#"void 0;let { default: data } = await import("./data.json", { with: { type: "json" } });"#
        );
    }

    #[test]
    fn test_attributed_imports_are_located() {
        let out = lower("1;\nimport data from \"./data.json\" with { type: \"json\" };").unwrap();
        assert_eq!(out.attributed_imports.len(), 1);
        assert_eq!(out.attributed_imports[0].start_line, 2);
        assert_eq!(out.attributed_imports[0].start_col, 1);
        assert!(lower(r#"import d from "m";"#).unwrap().attributed_imports.is_empty());
    }

    #[test]
    fn test_import_sets_async_without_await() {
        assert!(lower(r#"import { x } from "m";"#).unwrap().is_async);
    }

    #[test]
    fn test_top_level_class_becomes_let() {
        assert_eq!(
            lowered("class Foo extends Bar { m() {} }"),
            "void 0;let Foo = class Foo extends Bar { m() {} };"
        );
    }

    #[test]
    fn test_nested_class_is_untouched() {
        assert_eq!(lowered("{ class Foo {} }"), "void 0;{ class Foo {} }");
    }

    #[test]
    fn test_await_detection() {
        assert!(lower("await Promise.resolve(7);").unwrap().is_async);
        assert!(lower("for await (const x of xs) {}").unwrap().is_async);
        assert!(lower("if (ok) { const v = await load(); }").unwrap().is_async);
    }

    #[test]
    fn test_await_inside_functions_is_ignored() {
        assert!(!lower("async function f() { await g(); }").unwrap().is_async);
        assert!(!lower("const f = async () => await g();").unwrap().is_async);
        assert!(!lower("class A { async m() { for await (const x of y) {} } }").unwrap().is_async);
    }

    #[test]
    fn test_exports_are_rejected() {
        let err = lower("1;\nexport const y = 1;").unwrap_err();
        match err {
            TransformError::Unsupported { construct, span } => {
                assert_eq!(construct, "export declaration");
                assert_eq!(span.start_line, 2);
                assert_eq!(span.start_col, 1);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_syntax_errors_are_parse_errors() {
        assert!(matches!(lower("let = ;"), Err(TransformError::Parse(_))));
    }
}
