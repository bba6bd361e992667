mod common;

use common::{assert_clean, check, errors};

#[test]
fn structure_with_number_fields() {
    let checked = check("structure Point { x: Number, y: Number }\nconst p = Point(1, 2)\nconst x: Number = p.x");
    assert!(checked.findings.is_empty(), "{:?}", checked.findings);
    let point = checked.ctx.lookup_type("Point").unwrap();
    let c = checked.ctx.arena.as_composite(point).unwrap();
    let names: Vec<&str> = c.fields.iter().map(|(n, _)| n.as_str()).collect();
    assert_eq!(names, vec!["x", "y"]);
}

#[test]
fn generic_structure_instantiates_per_use() {
    assert_clean("structure Box<T> { value: T }\nconst b: Box<Number> = Box(1)\nconst n: Number = b.value");
    assert_clean("structure Box<T> { value: T }\nconst a = Box(1)\nconst b = Box(\"s\")\nconst s: String = b.value");
}

#[test]
fn generic_instances_with_different_arguments_are_incompatible() {
    assert_eq!(
        errors("structure Box<T> { value: T }\nconst b: Box<String> = Box(1)"),
        vec!["cannot assign Box<Number> to 'b' of type Box<String>"]
    );
}

#[test]
fn wrong_number_of_type_arguments() {
    assert_eq!(
        errors("structure Box<T> { value: T }\nlet b: Box<Number, String> = Box(1)"),
        vec!["'Box' expects 1 type argument(s), found 2"]
    );
}

#[test]
fn default_mismatch_is_reported_once() {
    assert_eq!(
        errors("structure Settings { retries: Number = \"three\" }"),
        vec!["default value of field 'retries' has type String, which is not assignable to declared type Number"]
    );
}

#[test]
fn failed_definition_publishes_no_constructor() {
    assert_eq!(
        errors("structure Settings { retries: Number = \"three\" }\nconst s = Settings(1)"),
        vec![
            "default value of field 'retries' has type String, which is not assignable to declared type Number",
            "unknown symbol 'Settings'",
        ]
    );
}

#[test]
fn self_referential_types_analyze() {
    assert_clean("type List<T> { head: T, tail: List<T> }");
    assert_clean("type Node { value: Number, next: Node }\nfunction next(n: Node) -> Node { return n.next }");
}

#[test]
fn missing_trait_field_is_reported_once() {
    assert_eq!(
        errors("type Named { name: String }\nstructure Dog is Named { age: Number }"),
        vec!["'Dog' is missing field 'name' required by trait 'Named'"]
    );
}

#[test]
fn trait_field_type_must_be_compatible() {
    assert_eq!(
        errors("type Named { name: String }\nstructure Dog is Named { name: Number }"),
        vec!["field 'name' of 'Dog' has type Number, which is not compatible with String required by trait 'Named'"]
    );
}

#[test]
fn conflicting_traits_are_reported() {
    let msgs = errors("type A { id: Number }\ntype B { id: String }\nstructure C is A, B { id: Number }");
    assert!(
        msgs[0].starts_with("traits 'A' and 'B' require field 'id' with incompatible types"),
        "{msgs:?}"
    );
}

#[test]
fn trait_implementors_are_accepted_where_the_trait_is_expected() {
    assert_clean(
        "type Named { name: String }
structure Dog is Named { name: String, age: Number }
function greet(n: Named) -> String { return n.name }
const s = greet(Dog(\"rex\", 3))",
    );
}

#[test]
fn self_instantiation_with_other_arguments_keeps_field_types() {
    let src = "type Node<T> { value: T, other: Node<String> }";
    assert_clean(&format!("{src}\nfunction f(n: Node<Number>) -> String {{ return n.other.value }}"));
    assert_clean(&format!("{src}\nfunction f(n: Node<Number>) -> String {{ return n.other.other.value }}"));
    assert_eq!(
        errors(&format!("{src}\nfunction f(n: Node<Number>) -> Number {{ return n.other.value }}")),
        vec!["cannot return String from a function returning Number"]
    );
    assert_eq!(
        errors(&format!("{src}\nfunction f(n: Node<Number>) -> String {{ return n.value }}")),
        vec!["cannot return Number from a function returning String"]
    );
}

#[test]
fn structurally_equal_types_are_still_distinct() {
    assert_eq!(
        errors("structure A { x: Number }\nstructure B { x: Number }\nconst b: B = A(1)"),
        vec!["cannot assign A to 'b' of type B"]
    );
}

#[test]
fn constructor_arity_accounts_for_defaults() {
    let src = "structure User { id: Number, name = \"anon\" }\nconst a = User(1)\nconst b = User(1, \"bo\")";
    assert_clean(src);
    assert_eq!(
        errors("structure User { id: Number, name = \"anon\" }\nconst c = User()"),
        vec!["expected 1 to 2 argument(s), found 0"]
    );
}

#[test]
fn definitions_inside_functions_are_scoped() {
    assert_eq!(
        errors("function f() { structure Local { x: Number } }\nconst l = Local(1)"),
        vec!["unknown symbol 'Local'"]
    );
}
