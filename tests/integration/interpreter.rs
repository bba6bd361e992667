mod common;

use common::run;
use keel::config::Config;
use keel::diagnostics::CompileError;
use keel::interpreter::RuntimeError;

#[test]
fn hello_world() {
    assert_eq!(run("print(\"hello, world\")"), "hello, world\n");
}

#[test]
fn structures_and_defaults() {
    let src = "structure Point { x: Number, y = 0 }
const p = Point(3)
print(describe(p))
print(describe(p.y))";
    assert_eq!(run(src), "Point { x: 3, y: 0 }\n0\n");
}

#[test]
fn defaults_are_evaluated_at_declaration() {
    let src = "let label = \"first\"
structure Tag { name = label }
label = \"second\"
const tag = Tag()
print(tag.name)";
    assert_eq!(run(src), "first\n");
}

#[test]
fn closures_see_later_assignments() {
    let src = "let greeting = \"hi\"
function greet() { print(greeting) }
greeting = \"hello\"
greet()";
    assert_eq!(run(src), "hello\n");
}

#[test]
fn while_with_continue() {
    let src = "let first = true
let running = true
function stop() { running = false }
while running {
    if first {
        first = false
        continue
    }
    stop()
}
print(describe(first))";
    assert_eq!(run(src), "false\n");
}

#[test]
fn generic_functions_run() {
    let src = "function twice<T>(value: T) -> Pair<T, T> { return Pair(value, value) }
const p = twice(\"ab\")
print(p.first)
print(p.second)";
    assert_eq!(run(src), "ab\nab\n");
}

#[test]
fn trait_values_expose_their_fields() {
    let src = "structure Item is Describable { description: String }
function show(d: Describable) { print(d.description) }
show(Item(\"lamp\"))";
    assert_eq!(run(src), "lamp\n");
}

#[test]
fn failed_assertions_stop_the_program() {
    let err = keel::run_source("print(\"before\")\nassert(false)\nprint(\"after\")", &Config::defaults(), Vec::new())
        .err()
        .unwrap();
    assert!(matches!(err, CompileError::Runtime(RuntimeError::AssertionFailed)));
}
