mod common;

use common::{assert_clean, check, errors, warnings};

#[test]
fn stdlib_symbols_are_part_of_the_language() {
    assert_eq!(errors("print = print"), vec!["'print' is part of the language"]);
    assert_eq!(errors("identity = identity"), vec!["'identity' is part of the language"]);
}

#[test]
fn stdlib_types_cannot_be_redeclared_at_top_level() {
    assert_eq!(errors("type Describable { x: Number }"), vec!["'Describable' is part of the language"]);
}

#[test]
fn shadowing_stdlib_symbols_only_warns() {
    assert_eq!(warnings("let describe = 1"), vec!["'describe' shadows a standard library binding"]);
    assert!(errors("let describe = 1").is_empty());
}

#[test]
fn primitives_stay_private() {
    assert_eq!(errors("__assert(true)"), vec!["unknown symbol '__assert'"]);
}

#[test]
fn print_checks_its_argument() {
    assert_eq!(errors("print(1)"), vec!["argument 1 expects String, found Number"]);
}

#[test]
fn generic_stdlib_functions_bind_per_call() {
    assert_clean("const n: Number = identity(1)\nconst s: String = identity(\"s\")");
    assert_eq!(
        errors("const n: Number = identity(\"s\")"),
        vec!["cannot assign String to 'n' of type Number"]
    );
}

#[test]
fn passing_stdlib_generics_to_higher_order_functions() {
    let src = "function apply<T>(f: Function(T) -> T, x: T) -> T { return f(x) }
function both<T>(f: Function(T) -> T, g: Function(T) -> String, x: T) -> String { return g(f(x)) }
const a: Number = apply(identity, 1)
const b: String = apply(identity, \"s\")
const c: String = both(identity, describe, true)
const d: String = identity(\"s\")
const e: String = describe(1)";
    let checked = check(src);
    assert!(checked.findings.is_empty(), "{:?}", checked.findings);
    for name in ["identity", "describe"] {
        let ty = checked.ctx.lookup_symbol(name).unwrap();
        assert!(!checked.ctx.arena.is_complete(ty), "{name} was bound by a call");
    }
}

#[test]
fn pair_and_swap() {
    assert_clean("const p = swap(Pair(1, \"one\"))\nconst s: String = p.first\nconst n: Number = p.second");
}

#[test]
fn structures_can_implement_stdlib_traits() {
    assert_clean(
        "structure Item is Describable { description: String, price: Number }
function show(d: Describable) { print(d.description) }
show(Item(\"lamp\", 3))",
    );
}
