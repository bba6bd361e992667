use std::io::Write;

use tracing::debug;

use crate::diagnostics::{CompileError, Findings};
use crate::interpreter::value::{Native, Value};
use crate::interpreter::RuntimeError;
use crate::parser::ast::Program;
use crate::typeck::env::FlagOverride;
use crate::typeck::types::{TypeArena, TypeId};
use crate::typeck::{analyze_program, AnalysisContext};

pub const PRELUDE_SOURCE: &str = include_str!("../stdlib/prelude.keel");

/// File id carried by every span of the standard library.
pub const PRELUDE_FILE_ID: u32 = 1;

pub fn parse_prelude(source: &str) -> Result<Program, CompileError> {
    crate::parser::parse_file(source, PRELUDE_FILE_ID)
}

/// Interpreter primitives the prelude binds to public names.
pub fn natives() -> [Native; 4] {
    [
        Native { name: "__print", func: native_print },
        Native { name: "__identity", func: native_identity },
        Native { name: "__describe", func: native_describe },
        Native { name: "__assert", func: native_assert },
    ]
}

fn primitive_signatures(arena: &mut TypeArena) -> Vec<(&'static str, TypeId)> {
    let print = arena.function(vec![arena.string], arena.nothing, Vec::new());

    let t = arena.placeholder("T", false);
    let identity = arena.function(vec![t], t, vec![("T".to_string(), t)]);

    let t = arena.placeholder("T", false);
    let describe = arena.function(vec![t], arena.string, vec![("T".to_string(), t)]);

    let assert = arena.function(vec![arena.boolean], arena.nothing, Vec::new());

    vec![
        ("__print", print),
        ("__identity", identity),
        ("__describe", describe),
        ("__assert", assert),
    ]
}

/// Analyze the standard library into `ctx`.
///
/// Everything it declares is read-only and marked as part of the language.
/// On success one fresh scope is pushed, so user code may shadow standard
/// names but never overwrite them.
pub fn inject_stdlib(prelude: &Program, ctx: &mut AnalysisContext) -> Findings {
    for (name, ty) in primitive_signatures(&mut ctx.arena) {
        ctx.table.set_runtime_symbol(name, ty);
    }

    let ignored = ctx.table.ignores_runtime_bindings();
    ctx.table.set_global_flag_override(FlagOverride::STDLIB);
    ctx.table.set_ignore_runtime_bindings(false);
    let findings = analyze_program(prelude, ctx);
    ctx.table.set_ignore_runtime_bindings(ignored);
    ctx.table.clear_flag_overrides();

    if !findings.is_erroneous() {
        ctx.table.push_scope(None, false);
    }
    debug!(errors = findings.errors.len(), "standard library analyzed");
    findings
}

fn native_print(args: &[Value], out: &mut dyn Write) -> Result<Value, RuntimeError> {
    if let Some(value) = args.first() {
        writeln!(out, "{value}")?;
    }
    Ok(Value::Nothing)
}

fn native_identity(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    Ok(args.first().cloned().unwrap_or(Value::Nothing))
}

fn native_describe(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    let text = args.first().map(|v| v.to_string()).unwrap_or_default();
    Ok(Value::String(text))
}

fn native_assert(args: &[Value], _out: &mut dyn Write) -> Result<Value, RuntimeError> {
    match args.first() {
        Some(Value::Boolean(true)) => Ok(Value::Nothing),
        _ => Err(RuntimeError::AssertionFailed),
    }
}
