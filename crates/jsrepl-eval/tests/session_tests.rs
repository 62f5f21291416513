//! Session tests: fragments evaluated in sequence against one binding store.

use std::path::PathBuf;

use boa_engine::{js_string, JsValue};
use jsrepl_eval::{Completion, EvalError, LogEntry, Recall, ReplConfig, Session};
use jsrepl_types::{LogKind, TransformError};

// ══════════════════════════════════════════════════════════════════════════════
// Helpers
// ══════════════════════════════════════════════════════════════════════════════

fn session() -> Session {
    Session::new().expect("failed to create session")
}

/// A session whose imports resolve against `tests/fixtures`.
fn module_session() -> Session {
    let config = ReplConfig {
        module_root: Some(PathBuf::from(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures")),
        ..ReplConfig::default()
    };
    Session::with_config(config).expect("failed to create session")
}

fn eval(session: &mut Session, source: &str) -> JsValue {
    session
        .evaluate_settled(source)
        .unwrap_or_else(|e| panic!("{source:?} failed: {e}"))
}

fn number(value: &JsValue) -> f64 {
    value
        .as_number()
        .unwrap_or_else(|| panic!("expected a number, got {}", value.display()))
}

fn string(value: &JsValue) -> String {
    value
        .as_string()
        .map(|s| s.to_std_string_escaped())
        .unwrap_or_else(|| panic!("expected a string, got {}", value.display()))
}

fn kinds(session: &Session) -> Vec<LogKind> {
    session.entries().map(|entry| entry.kind).collect()
}

// ══════════════════════════════════════════════════════════════════════════════
// 1. Completion values
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn expression_completion() {
    let mut s = session();
    assert_eq!(number(&eval(&mut s, "1 + 1;")), 2.0);
}

#[test]
fn empty_fragment_is_undefined() {
    let mut s = session();
    assert!(eval(&mut s, "").is_undefined());
    assert!(eval(&mut s, "let unused = 1;").is_undefined());
}

#[test]
fn last_executed_statement_wins() {
    let mut s = session();
    assert_eq!(number(&eval(&mut s, "for (let i = 0; i < 3; i++) i;")), 2.0);
    assert_eq!(number(&eval(&mut s, "if (true) { 'a'; 5 } else { 6 }")), 5.0);
}

#[test]
fn finally_block_does_not_override_completion() {
    let mut s = session();
    assert_eq!(number(&eval(&mut s, "try { 1; } finally { 2; }")), 1.0);
}

#[test]
fn empty_control_flow_completes_undefined() {
    let mut s = session();
    assert!(eval(&mut s, "1; if (false) {}").is_undefined());
    assert!(eval(&mut s, "3; for (const q of []) {}").is_undefined());
    assert!(eval(&mut s, "4; outer: while (true) break outer;").is_undefined());
    assert_eq!(number(&eval(&mut s, "5; { }")), 5.0);
}

#[test]
fn function_bodies_do_not_set_completion() {
    let mut s = session();
    let value = eval(&mut s, "7; [1, 2].forEach((x) => { x; });");
    assert!(value.is_undefined());
}

// ══════════════════════════════════════════════════════════════════════════════
// 2. Persistent bindings
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn declaration_is_visible_to_later_fragments() {
    let mut s = session();
    eval(&mut s, "let x = 1;");
    assert_eq!(number(&eval(&mut s, "x")), 1.0);
    assert!(s.names().contains("x"));
}

#[test]
fn let_then_use_in_one_and_later_fragment() {
    let mut s = session();
    assert_eq!(number(&eval(&mut s, "let a = 5; a * 2;")), 10.0);
    assert_eq!(number(&eval(&mut s, "a;")), 5.0);
    assert_eq!(number(&eval(&mut s, "a * 2;")), 10.0);
}

#[test]
fn redeclaration_without_initializer_keeps_value() {
    let mut s = session();
    eval(&mut s, "let x = 1;");
    eval(&mut s, "let x;");
    assert_eq!(number(&eval(&mut s, "x")), 1.0);
}

#[test]
fn const_can_be_redeclared_across_fragments() {
    let mut s = session();
    eval(&mut s, "const limit = 3;");
    eval(&mut s, "const limit = 4;");
    assert_eq!(number(&eval(&mut s, "limit")), 4.0);
}

#[test]
fn class_declaration_persists() {
    let mut s = session();
    eval(&mut s, "class Foo { constructor() { this.v = 3; } }");
    assert_eq!(number(&eval(&mut s, "new Foo().v")), 3.0);
    assert_eq!(string(&eval(&mut s, "typeof Foo")), "function");
}

#[test]
fn function_declaration_is_callable_before_its_definition() {
    let mut s = session();
    assert_eq!(
        number(&eval(&mut s, "sq(4)\nfunction sq(n) { return n * n; }")),
        16.0
    );
    assert_eq!(number(&eval(&mut s, "sq(5)")), 25.0);
}

#[test]
fn closures_see_store_updates() {
    let mut s = session();
    eval(&mut s, "let n = 0; function inc() { return ++n; }");
    assert_eq!(number(&eval(&mut s, "inc(); inc();")), 2.0);
    let n = s.get("n").unwrap().unwrap();
    assert_eq!(number(&n), 2.0);
}

#[test]
fn parameters_shadow_store_names() {
    let mut s = session();
    eval(&mut s, "let x = 10;");
    eval(&mut s, "function f(x) { return x; }");
    assert_eq!(number(&eval(&mut s, "f(3)")), 3.0);
    assert_eq!(number(&eval(&mut s, "x")), 10.0);
}

#[test]
fn var_in_blocks_and_loops_persists() {
    let mut s = session();
    eval(&mut s, "var total = 0; for (var i = 1; i <= 4; i++) { var last = i; total += i; }");
    assert_eq!(number(&eval(&mut s, "total")), 10.0);
    assert_eq!(number(&eval(&mut s, "last")), 4.0);
    assert_eq!(number(&eval(&mut s, "i")), 5.0);
}

#[test]
fn destructuring_declarations_persist() {
    let mut s = session();
    eval(&mut s, "const { a, b: [c, d = 9] } = { a: 1, b: [2] };");
    assert_eq!(number(&eval(&mut s, "a + c + d")), 12.0);
}

#[test]
fn callee_is_called_without_store_as_this() {
    let mut s = session();
    eval(&mut s, "function who() { return this === undefined || this === globalThis; }");
    assert_eq!(eval(&mut s, "who()").as_boolean(), Some(true));
}

#[test]
fn scope_parameter_does_not_leak() {
    let mut s = session();
    eval(&mut s, "let a = 1;");
    assert_eq!(string(&eval(&mut s, "typeof _scope")), "undefined");
}

#[test]
fn store_accessors() {
    let mut s = session();
    s.set("answer", JsValue::from(42)).unwrap();
    assert_eq!(number(&eval(&mut s, "answer + 1")), 43.0);
    eval(&mut s, "let apple = 1, apricot = 2;");
    assert_eq!(s.store().complete("ap"), vec!["apple", "apricot"]);
    assert!(s.get("missing").unwrap().is_none());
}

#[test]
fn reset_forgets_bindings() {
    let mut s = session();
    eval(&mut s, "let gone = 1;");
    s.reset();
    assert!(s.names().is_empty());
    let err = s.evaluate_settled("gone").unwrap_err();
    assert!(matches!(err, EvalError::Evaluation { .. }));
}

#[test]
fn functions_assigned_through_the_store_keep_declared_names_only() {
    let mut s = session();
    eval(&mut s, "let anon = function () {}; function named() {}");
    assert_eq!(string(&eval(&mut s, "anon.name")), "");
    assert_eq!(string(&eval(&mut s, "named.name")), "named");
}

// ══════════════════════════════════════════════════════════════════════════════
// 3. Async fragments
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn top_level_await_is_pending_then_settles() {
    let mut s = session();
    let completion = s.evaluate("await Promise.resolve(7);").unwrap();
    assert!(completion.is_pending());
    assert_eq!(number(&s.settle(completion).unwrap()), 7.0);
}

#[test]
fn async_declarations_persist() {
    let mut s = session();
    eval(&mut s, "const v = await Promise.resolve('ok');");
    assert_eq!(string(&eval(&mut s, "v")), "ok");
}

#[test]
fn sync_fragment_is_ready() {
    let mut s = session();
    let completion = s.evaluate("3").unwrap();
    assert!(matches!(completion, Completion::Ready(_)));
}

#[test]
fn rejected_promise_is_an_evaluation_error() {
    let mut s = session();
    let err = s
        .evaluate_settled("await Promise.reject(new Error('nope'))")
        .unwrap_err();
    assert!(err.to_string().starts_with("Uncaught "));
    let reason = err.value().expect("rejection reason").clone();
    let message = reason
        .as_object()
        .expect("error object")
        .get(js_string!("message"), s.context_mut())
        .unwrap();
    assert_eq!(string(&message), "nope");
}

#[test]
fn never_settling_promise_stalls() {
    let mut s = session();
    let err = s.evaluate_settled("await new Promise(() => {})").unwrap_err();
    assert!(matches!(err, EvalError::Stalled));
}

#[test]
fn static_import_marks_fragment_async() {
    let s = session();
    let transformed = s.transform(r#"import { x } from "./x.js";"#).unwrap();
    assert!(transformed.is_async);
    assert_eq!(transformed.declared, vec!["x"]);
}

#[test]
fn named_import_binds_across_fragments() {
    let mut s = module_session();
    let value = eval(&mut s, r#"import { x } from "./math.js"; x + 1;"#);
    assert_eq!(number(&value), 42.0);
    assert_eq!(number(&eval(&mut s, "x")), 41.0);
}

#[test]
fn default_import_binds() {
    let mut s = module_session();
    eval(&mut s, r#"import greeting from "./math.js";"#);
    assert_eq!(string(&eval(&mut s, "greeting")), "hello");
}

#[test]
fn namespace_import_binds() {
    let mut s = module_session();
    eval(&mut s, r#"import * as math from "./math.js";"#);
    assert_eq!(number(&eval(&mut s, "math.double(math.x)")), 82.0);
}

#[test]
fn namespace_with_default_import_binds() {
    let mut s = module_session();
    eval(&mut s, r#"import greeting, * as math from "./math.js";"#);
    assert_eq!(string(&eval(&mut s, "greeting + math.x")), "hello41");
}

#[test]
fn import_attributes_are_rejected_before_running() {
    let mut s = module_session();
    let err = s
        .evaluate_settled(r#"import data from "./data.json" with { type: "json" };"#)
        .unwrap_err();
    match err {
        EvalError::Transform(TransformError::Unsupported { construct, span }) => {
            assert_eq!(construct, "import attributes");
            assert_eq!(span.start_line, 1);
        }
        other => panic!("unexpected error: {other}"),
    }
    assert!(!s.names().contains("data"));
}

// ══════════════════════════════════════════════════════════════════════════════
// 4. Failures
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn thrown_error_carries_value_and_leaves_store_unchanged() {
    let mut s = session();
    eval(&mut s, "let kept = 1;");
    let before = s.names().clone();

    let err = s.evaluate_settled(r#"throw new Error("boom");"#).unwrap_err();
    let value = err.value().expect("thrown value").clone();
    let message = value
        .as_object()
        .expect("error object")
        .get(js_string!("message"), s.context_mut())
        .unwrap();
    assert_eq!(string(&message), "boom");
    assert_eq!(s.names(), &before);
}

#[test]
fn effects_before_a_throw_persist() {
    let mut s = session();
    assert!(s.evaluate_settled("let r = 1; throw 0;").is_err());
    assert_eq!(number(&eval(&mut s, "r")), 1.0);
}

#[test]
fn rejected_fragment_declares_nothing() {
    let mut s = session();
    let err = s.evaluate_settled("let q = 1; export {};").unwrap_err();
    assert!(matches!(
        err,
        EvalError::Transform(TransformError::Unsupported { .. })
    ));
    assert!(!s.names().contains("q"));
}

#[test]
fn syntax_error_is_reported() {
    let mut s = session();
    let err = s.evaluate_settled("let = 1").unwrap_err();
    assert!(matches!(err, EvalError::Transform(TransformError::Parse(_))));
}

#[test]
fn missing_module_root_fails_setup() {
    let config = ReplConfig {
        module_root: Some("/definitely/not/a/real/dir".into()),
        ..ReplConfig::default()
    };
    assert!(matches!(
        Session::with_config(config),
        Err(EvalError::Setup(_))
    ));
}

// ══════════════════════════════════════════════════════════════════════════════
// 5. Log and recall
// ══════════════════════════════════════════════════════════════════════════════

#[test]
fn submit_records_input_console_and_output() {
    let mut s = session();
    let value = s.submit(r#"console.log("hi", 1); 40 + 2"#).unwrap().unwrap();
    assert_eq!(number(&value), 42.0);

    let entries: Vec<&LogEntry> = s.entries().collect();
    assert_eq!(kinds(&s), vec![LogKind::Input, LogKind::Log, LogKind::Output]);
    assert_eq!(entries[1].text, "hi 1");
    assert_eq!(entries[2].text, "42");
}

#[test]
fn submit_records_errors() {
    let mut s = session();
    assert!(s.submit("notDefinedAnywhere").is_err());
    assert_eq!(kinds(&s), vec![LogKind::Input, LogKind::Error]);

    assert!(s.submit("export default 1").is_err());
    let last = s.entries().last().unwrap();
    assert_eq!(last.kind, LogKind::Error);
    assert!(last.text.contains("not supported"));
}

#[test]
fn blank_submissions_are_ignored() {
    let mut s = session();
    assert!(s.submit("   \n\t").unwrap().is_none());
    assert_eq!(s.entries().count(), 0);
}

#[test]
fn log_is_bounded() {
    let config = ReplConfig {
        max_log_entries: 3,
        ..ReplConfig::default()
    };
    let mut s = Session::with_config(config).unwrap();
    for i in 0..3 {
        s.submit(&format!("{i}")).unwrap();
    }
    let texts: Vec<String> = s.entries().map(|e| e.text.clone()).collect();
    assert_eq!(texts, vec!["1", "2", "2"]);
    s.clear_log();
    assert_eq!(s.entries().count(), 0);
}

#[test]
fn recall_input_returns_text() {
    let mut s = session();
    s.submit("6 * 7").unwrap();
    let input = s.entries().next().unwrap().clone();
    assert_eq!(s.recall(&input).unwrap(), Recall::Edit("6 * 7".into()));
}

#[test]
fn recall_output_binds_temp_and_reuses_slot() {
    let mut s = session();
    s.submit("6 * 7").unwrap();
    let output = s.entries().last().unwrap().clone();

    assert_eq!(s.recall(&output).unwrap(), Recall::Bound("temp0".into()));
    assert_eq!(s.recall(&output).unwrap(), Recall::Bound("temp0".into()));
    assert_eq!(number(&eval(&mut s, "temp0 + 1")), 43.0);

    let other = s.bind_temp(JsValue::from(js_string!("x"))).unwrap();
    assert_eq!(other, "temp1");
}

#[test]
fn recall_console_entry_binds_all_values() {
    let mut s = session();
    s.submit("console.log('a', 'b')").unwrap();
    let logged = s
        .entries()
        .find(|e| e.kind == LogKind::Log)
        .unwrap()
        .clone();
    let Recall::Bound(name) = s.recall(&logged).unwrap() else {
        panic!("console entries bind their values");
    };
    assert_eq!(string(&eval(&mut s, &format!("{name}.join('')"))), "ab");
}
