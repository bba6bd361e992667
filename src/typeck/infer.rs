use std::collections::HashMap;

use crate::diagnostics::{Finding, Findings};
use crate::parser::ast::Expr;
use crate::span::Spanned;
use super::types::{SymbolType, TypeId};
use super::AnalysisContext;

/// Infer the type of `expr`, recording it for every sub-expression.
///
/// Errors are pushed into `findings` and the expression is typed as
/// `Ignore` so that callers do not report follow-up mismatches.
pub(crate) fn infer_expr(expr: &Spanned<Expr>, ctx: &mut AnalysisContext, findings: &mut Findings) -> TypeId {
    let ty = match &expr.node {
        Expr::NumberLit(_) => ctx.arena.number,
        Expr::StringLit(_) => ctx.arena.string,
        Expr::BoolLit(_) => ctx.arena.boolean,
        Expr::Ident(name) => match ctx.table.find_symbol(name) {
            Some(entry) => entry.value,
            None => {
                findings.push_error(Finding::new(format!("unknown symbol '{name}'"), expr.span));
                ctx.arena.ignore
            }
        },
        Expr::FieldAccess { object, field } => {
            let object_ty = infer_expr(object, ctx, findings);
            infer_field_access(object_ty, field, ctx, findings)
        }
        Expr::Call { callee, args } => infer_call(expr, callee, args, ctx, findings),
    };
    ctx.record(expr.span, ty);
    ty
}

fn infer_field_access(
    object_ty: TypeId,
    field: &Spanned<String>,
    ctx: &mut AnalysisContext,
    findings: &mut Findings,
) -> TypeId {
    let peeled = ctx.arena.peel(object_ty);
    match ctx.arena.get(peeled) {
        SymbolType::Ignore => ctx.arena.ignore,
        SymbolType::Composite(c) => match c.field(&field.node) {
            Some(ty) => ty,
            None => {
                let msg = format!("'{}' has no field '{}'", ctx.arena.display(peeled), field.node);
                findings.push_error(Finding::new(msg, field.span));
                ctx.arena.ignore
            }
        },
        _ => {
            let msg = format!("cannot access field '{}' on {}", field.node, ctx.arena.display(peeled));
            findings.push_error(Finding::new(msg, field.span));
            ctx.arena.ignore
        }
    }
}

fn infer_call(
    expr: &Spanned<Expr>,
    callee: &Spanned<Expr>,
    args: &[Spanned<Expr>],
    ctx: &mut AnalysisContext,
    findings: &mut Findings,
) -> TypeId {
    let callee_ty = infer_expr(callee, ctx, findings);
    let arg_types: Vec<TypeId> = args.iter().map(|a| infer_expr(a, ctx, findings)).collect();

    let peeled = ctx.arena.peel(callee_ty);
    if ctx.arena.is_ignore(peeled) {
        return ctx.arena.ignore;
    }
    if ctx.arena.as_function(peeled).is_none() {
        findings.push_error(Finding::new(
            format!("{} is not callable", ctx.arena.display(peeled)),
            callee.span,
        ));
        return ctx.arena.ignore;
    }

    // Each call binds its own copy of a generic signature.
    let signature = if ctx.arena.is_complete(peeled) { peeled } else { ctx.arena.fork(peeled) };
    let Some(f) = ctx.arena.as_function(signature).cloned() else {
        return ctx.arena.ignore;
    };

    let max = f.params.len();
    let min = max - f.optional_params.min(max);
    if args.len() < min || args.len() > max {
        let expected = if min == max { format!("{max}") } else { format!("{min} to {max}") };
        findings.push_error(
            Finding::new(
                format!("expected {expected} argument(s), found {}", args.len()),
                expr.span,
            )
            .with_secondary(callee.span),
        );
        return ctx.arena.peel(f.return_type);
    }

    // Binding can reach through an argument's open cells, so bind against
    // copies. One memo keeps cells shared between arguments shared.
    let mut memo = HashMap::new();
    let arg_types: Vec<TypeId> = arg_types.iter()
        .map(|&arg| if ctx.arena.is_complete(arg) { arg } else { ctx.arena.fork_with(arg, &mut memo) })
        .collect();
    for (param, arg) in f.params.iter().zip(arg_types.iter()) {
        ctx.arena.bind_generic_arguments(*param, *arg);
    }
    for (index, ((param, arg), arg_expr)) in f.params.iter().zip(arg_types.iter()).zip(args).enumerate() {
        if let Err(mismatch) = ctx.arena.check_compatible(*arg, *param) {
            findings.push_error(
                Finding::new(
                    format!(
                        "argument {} expects {}, found {}",
                        index + 1,
                        ctx.arena.display(*param),
                        ctx.arena.display(*arg),
                    ),
                    arg_expr.span,
                )
                .with_highlight(mismatch.describe(&ctx.arena)),
            );
        }
    }

    ctx.arena.peel(f.return_type)
}
