// Property tests for the scoped table:
// 1. N pushes followed by N pops restore the original depth and bindings.
// 2. Restoring a snapshot undoes any sequence of pushes and declarations.

use proptest::prelude::*;
use keel::typeck::env::TypeTable;
use keel::typeck::types::TypeArena;

#[derive(Debug, Clone)]
enum Op {
    Push { is_loop: bool },
    Declare(String),
}

fn arb_name() -> impl Strategy<Value = String> {
    "[a-z]{1,6}"
}

fn arb_ops() -> impl Strategy<Value = Vec<Op>> {
    prop::collection::vec(
        prop_oneof![
            any::<bool>().prop_map(|is_loop| Op::Push { is_loop }),
            arb_name().prop_map(Op::Declare),
        ],
        0..32,
    )
}

proptest! {
    #![proptest_config(ProptestConfig::with_cases(100))]

    #[test]
    fn pushes_and_pops_balance(n in 0..64usize, names in prop::collection::vec(arb_name(), 0..8)) {
        let arena = TypeArena::new();
        let mut table = TypeTable::with_fundamentals(&arena);
        table.set_symbol("root", arena.number);

        for i in 0..n {
            table.push_scope(None, i % 2 == 0);
            for name in &names {
                table.set_symbol(name, arena.string);
            }
        }
        prop_assert_eq!(table.depth(), n + 1);
        for _ in 0..n {
            table.pop_scope();
        }

        prop_assert_eq!(table.depth(), 1);
        prop_assert_eq!(table.find_symbol("root").map(|e| e.value), Some(arena.number));
        for name in &names {
            if name != "root" {
                prop_assert!(table.find_symbol(name).is_none());
            }
        }
    }

    #[test]
    fn snapshots_undo_everything(ops in arb_ops()) {
        let arena = TypeArena::new();
        let mut table = TypeTable::with_fundamentals(&arena);
        let snapshot = table.create_snapshot();

        let mut declared = Vec::new();
        for op in &ops {
            match op {
                Op::Push { is_loop } => table.push_scope(None, *is_loop),
                Op::Declare(name) => {
                    table.set_symbol(name, arena.boolean);
                    declared.push(name.clone());
                }
            }
        }

        table.reset(Some(snapshot));
        prop_assert_eq!(table.depth(), 1);
        prop_assert!(!table.inside_loop());
        for name in &declared {
            prop_assert!(table.find_symbol(name).is_none());
        }
    }
}
