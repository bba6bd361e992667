mod common;

use common::{assert_clean, errors};
use keel::typeck::env::{EntryFlags, FlagOverride, TypeTable};
use keel::typeck::types::TypeArena;

fn table() -> (TypeArena, TypeTable) {
    let arena = TypeArena::new();
    let table = TypeTable::with_fundamentals(&arena);
    (arena, table)
}

#[test]
fn inner_declarations_vanish_on_pop() {
    let (arena, mut table) = table();
    table.set_symbol("outer", arena.number);
    table.push_scope(None, false);
    table.set_symbol("inner", arena.string);
    assert!(table.find_symbol("outer").is_some());
    assert!(table.find_symbol("inner").is_some());
    assert!(table.find_symbol_in_current_scope("outer").is_none());
    table.pop_scope();
    assert!(table.find_symbol("inner").is_none());
    assert_eq!(table.depth(), 1);
}

#[test]
fn scoped_override_ends_with_its_scope() {
    let (arena, mut table) = table();
    table.push_scope(None, false);
    table.set_scoped_flag_override(FlagOverride { readonly: Some(true), stdlib: None });
    table.set_symbol("frozen", arena.number);
    table.push_scope(None, false);
    assert!(table.effective_flags().readonly);
    table.pop_scope();
    table.pop_scope();
    table.set_symbol("free", arena.number);
    assert_eq!(table.find_symbol("free").unwrap().flags, EntryFlags::default());
}

#[test]
fn runtime_namespace_is_hidden_by_default() {
    let (arena, mut table) = table();
    table.set_runtime_symbol("__native", arena.number);
    assert!(table.find_symbol("__native").is_none());
    table.set_ignore_runtime_bindings(false);
    let entry = table.find_symbol("__native").unwrap();
    assert_eq!(entry.flags, EntryFlags::STDLIB);
}

#[test]
fn snapshot_restores_depth_and_overrides() {
    let (arena, mut table) = table();
    let snapshot = table.create_snapshot();
    table.set_global_flag_override(FlagOverride::STDLIB);
    table.push_scope(Some(arena.number), false);
    table.set_symbol("x", arena.number);
    table.reset(Some(snapshot));
    assert_eq!(table.depth(), 1);
    assert!(table.find_symbol("x").is_none());
    assert_eq!(table.effective_flags(), EntryFlags::default());
}

#[test]
fn reset_without_snapshot_keeps_the_outermost_scope() {
    let (arena, mut table) = table();
    table.set_symbol("kept", arena.number);
    table.push_scope(None, true);
    table.push_scope(None, false);
    table.reset(None);
    assert_eq!(table.depth(), 1);
    assert!(table.find_symbol("kept").is_some());
    assert!(table.find_type("Number").is_some());
}

#[test]
#[should_panic(expected = "cannot pop the outermost scope")]
fn popping_the_outermost_scope_panics() {
    let (_, mut table) = table();
    table.pop_scope();
}

#[test]
#[should_panic(expected = "cannot overwrite read-only entry 'Number'")]
fn overwriting_readonly_entries_panics() {
    let (arena, mut table) = table();
    table.set_type("Number", arena.string);
}

#[test]
fn blocks_introduce_scopes_in_programs() {
    assert_clean("let x = 1\nif true { let y = x\nlet x = \"s\" }\nlet y = 2");
    assert_eq!(errors("if true { let y = 1 }\nlet z = y"), vec!["unknown symbol 'y'"]);
}

#[test]
fn loop_bodies_see_enclosing_bindings() {
    assert_clean("let running = true\nwhile running { running = false }");
}

#[test]
fn function_bodies_reach_outer_bindings() {
    assert_clean("let count = 1\nfunction bump() { count = 2 }\nbump()");
}
