use std::collections::HashSet;

use crate::diagnostics::{Finding, Findings};
use crate::parser::ast::TypeExpr;
use crate::span::Spanned;
use super::types::{SymbolType, TypeId};
use super::AnalysisContext;

/// Generic parameters a resolved type can be instantiated with.
fn declared_placeholders(ctx: &AnalysisContext, id: TypeId) -> usize {
    match ctx.arena.get(id) {
        SymbolType::Composite(c) => c.placeholders.len(),
        SymbolType::Function(f) => f.placeholders.len(),
        _ => 0,
    }
}

pub(crate) fn resolve_type_expr(ty: &Spanned<TypeExpr>, ctx: &mut AnalysisContext) -> Result<TypeId, Findings> {
    let id = match &ty.node {
        TypeExpr::Named { name, type_args } => {
            let Some(entry) = ctx.table.find_type(&name.node) else {
                return Err(Findings::error(Finding::new(format!("unknown type '{}'", name.node), name.span)));
            };
            let base = entry.value;

            let expected = declared_placeholders(ctx, base);
            if type_args.len() != expected {
                return Err(Findings::error(
                    Finding::new(
                        format!("'{}' expects {expected} type argument(s), found {}", name.node, type_args.len()),
                        ty.span,
                    )
                    .with_secondary(name.span),
                ));
            }

            let mut findings = Findings::new();
            let mut args = Vec::with_capacity(type_args.len());
            for arg in type_args {
                match resolve_type_expr(arg, ctx) {
                    Ok(id) => args.push(id),
                    Err(f) => {
                        findings.extend(f);
                        args.push(ctx.arena.ignore);
                    }
                }
            }
            if findings.is_erroneous() {
                return Err(findings);
            }
            ctx.arena.instantiate(base, &args)
        }
        TypeExpr::Fn { type_params, params, return_type } => {
            ctx.table.push_scope(None, false);
            let resolved = resolve_fn_type(type_params, params, return_type.as_deref(), ctx);
            ctx.table.pop_scope();
            resolved?
        }
    };
    ctx.record(ty.span, id);
    Ok(id)
}

/// Resolve a function type inside a scope that already belongs to it.
fn resolve_fn_type(
    type_params: &[Spanned<String>],
    params: &[Spanned<TypeExpr>],
    return_type: Option<&Spanned<TypeExpr>>,
    ctx: &mut AnalysisContext,
) -> Result<TypeId, Findings> {
    let mut findings = Findings::new();
    let placeholders = declare_type_params(type_params, ctx, &mut findings);

    let mut param_ids = Vec::with_capacity(params.len());
    for p in params {
        match resolve_type_expr(p, ctx) {
            Ok(id) => param_ids.push(id),
            Err(f) => findings.extend(f),
        }
    }
    let ret = match return_type {
        Some(rt) => match resolve_type_expr(rt, ctx) {
            Ok(id) => id,
            Err(f) => {
                findings.extend(f);
                ctx.arena.ignore
            }
        },
        None => ctx.arena.nothing,
    };

    if findings.is_erroneous() {
        return Err(findings);
    }
    Ok(ctx.arena.function(param_ids, ret, placeholders))
}

/// Register fresh placeholders for `type_params` in the current scope.
/// Duplicates are reported and skipped.
pub(crate) fn declare_type_params(
    type_params: &[Spanned<String>],
    ctx: &mut AnalysisContext,
    findings: &mut Findings,
) -> Vec<(String, TypeId)> {
    let mut seen = HashSet::new();
    let mut placeholders = Vec::with_capacity(type_params.len());
    for tp in type_params {
        if !seen.insert(tp.node.as_str()) {
            findings.push_error(Finding::new(format!("duplicate type parameter '{}'", tp.node), tp.span));
            continue;
        }
        let id = ctx.arena.placeholder(&tp.node, false);
        ctx.table.set_type(&tp.node, id);
        placeholders.push((tp.node.clone(), id));
    }
    placeholders
}
