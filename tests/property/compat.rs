// Property tests for the type algebra:
// 1. Every type is compatible with itself.
// 2. A fork is compatible with its original in both directions.
// 3. Compatibility terminates on self-referential composites.
// 4. Passing a generic function to a generic call never binds the original.

use proptest::prelude::*;
use keel::config::Config;
use keel::typeck::types::{TypeArena, TypeId};

/// A recipe for building a type in a fresh arena.
#[derive(Debug, Clone)]
enum Shape {
    Number,
    String,
    Boolean,
    Generic(Box<Shape>),
    Record(Vec<Shape>),
    Function(Vec<Shape>, Box<Shape>),
    Recursive,
}

fn arb_shape() -> impl Strategy<Value = Shape> {
    let leaf = prop_oneof![
        Just(Shape::Number),
        Just(Shape::String),
        Just(Shape::Boolean),
        Just(Shape::Recursive),
    ];
    leaf.prop_recursive(4, 24, 4, |inner| {
        prop_oneof![
            inner.clone().prop_map(|s| Shape::Generic(Box::new(s))),
            prop::collection::vec(inner.clone(), 0..4).prop_map(Shape::Record),
            (prop::collection::vec(inner.clone(), 0..3), inner)
                .prop_map(|(params, ret)| Shape::Function(params, Box::new(ret))),
        ]
    })
}

fn build(arena: &mut TypeArena, shape: &Shape) -> TypeId {
    match shape {
        Shape::Number => arena.number,
        Shape::String => arena.string,
        Shape::Boolean => arena.boolean,
        Shape::Generic(arg) => {
            let t = arena.placeholder("T", false);
            let boxed = arena.composite("Box", vec![("value".to_string(), t)], vec![("T".to_string(), t)]);
            let arg = build(arena, arg);
            arena.instantiate(boxed, &[arg])
        }
        Shape::Record(fields) => {
            let fields = fields.iter().enumerate()
                .map(|(i, f)| (format!("f{i}"), build(arena, f)))
                .collect();
            arena.composite(&format!("Record{}", arena.len()), fields, Vec::new())
        }
        Shape::Function(params, ret) => {
            let params = params.iter().map(|p| build(arena, p)).collect();
            let ret = build(arena, ret);
            arena.function(params, ret, Vec::new())
        }
        Shape::Recursive => {
            let next = arena.preliminary("Node");
            let node = arena.composite("Node", vec![("next".to_string(), next)], Vec::new());
            arena.bind(next, node);
            node
        }
    }
}

fn arb_literal() -> impl Strategy<Value = (&'static str, &'static str)> {
    prop_oneof![
        Just(("1", "Number")),
        Just(("\"s\"", "String")),
        Just(("true", "Boolean")),
    ]
}

fn arb_generic_signature() -> impl Strategy<Value = (usize, usize)> {
    (1..4usize, 0..4usize)
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(200))]

    #[test]
    fn compatibility_is_reflexive(shape in arb_shape()) {
        let mut arena = TypeArena::new();
        let ty = build(&mut arena, &shape);
        prop_assert!(arena.is_compatible(ty, ty));
    }

    #[test]
    fn forks_are_compatible_with_their_original(shape in arb_shape()) {
        let mut arena = TypeArena::new();
        let ty = build(&mut arena, &shape);
        let forked = arena.fork(ty);
        prop_assert!(arena.is_compatible(forked, ty));
        prop_assert!(arena.is_compatible(ty, forked));
    }

    #[test]
    fn display_terminates(shape in arb_shape()) {
        let mut arena = TypeArena::new();
        let ty = build(&mut arena, &shape);
        prop_assert!(!arena.display(ty).is_empty());
    }

    #[test]
    fn forking_generic_signatures_leaves_originals_open((params, ret) in arb_generic_signature()) {
        let mut arena = TypeArena::new();
        let t = arena.placeholder("T", false);
        let param_types = vec![t; params];
        let ret_ty = if ret % 2 == 0 { t } else { arena.number };
        let f = arena.function(param_types, ret_ty, vec![("T".to_string(), t)]);

        let forked = arena.fork(f);
        let forked_t = arena.as_function(forked).unwrap().params[0];
        arena.bind_generic_arguments(forked_t, arena.string);

        prop_assert!(arena.is_unbound(t));
        prop_assert_eq!(arena.peel(forked_t), arena.string);
    }

    #[test]
    fn higher_order_calls_leave_generic_values_open(literals in prop::collection::vec(arb_literal(), 1..6)) {
        let mut src = String::from("function apply<T>(f: Function(T) -> T, x: T) -> T { return f(x) }\n");
        for (i, (literal, ty)) in literals.iter().enumerate() {
            src.push_str(&format!("const a{i}: {ty} = apply(identity, {literal})\n"));
            src.push_str(&format!("const b{i}: {ty} = identity({literal})\n"));
        }
        let checked = keel::check_source(&src, &Config::defaults()).unwrap();
        prop_assert!(checked.findings.is_empty(), "{:?}", checked.findings);
        let identity = checked.ctx.lookup_symbol("identity").unwrap();
        prop_assert!(!checked.ctx.arena.is_complete(identity));
    }
}
