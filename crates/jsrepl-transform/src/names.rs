//! Collision-free names for generated bindings.

use std::collections::BTreeSet;

use oxc_ast::ast::{BindingIdentifier, IdentifierReference, LabelIdentifier, Program};
use oxc_ast_visit::Visit;

/// Every identifier spelled in a program: references, bindings and labels.
pub(crate) fn identifiers(program: &Program<'_>) -> BTreeSet<String> {
    let mut collector = Collector::default();
    collector.visit_program(program);
    collector.names
}

#[derive(Default)]
struct Collector {
    names: BTreeSet<String>,
}

impl<'a> Visit<'a> for Collector {
    fn visit_identifier_reference(&mut self, it: &IdentifierReference<'a>) {
        self.names.insert(it.name.to_string());
    }

    fn visit_binding_identifier(&mut self, it: &BindingIdentifier<'a>) {
        self.names.insert(it.name.to_string());
    }

    fn visit_label_identifier(&mut self, it: &LabelIdentifier<'a>) {
        self.names.insert(it.name.to_string());
    }
}

/// Pick `_<hint>`, `_<hint>2`, `_<hint>3`, … — the first one not in `taken` —
/// and reserve it.
pub(crate) fn generate_uid(hint: &str, taken: &mut BTreeSet<String>) -> String {
    let mut candidate = format!("_{hint}");
    let mut counter = 1;
    while taken.contains(&candidate) {
        counter += 1;
        candidate = format!("_{hint}{counter}");
    }
    taken.insert(candidate.clone());
    candidate
}
