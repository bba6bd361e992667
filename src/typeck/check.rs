use std::collections::HashSet;

use crate::diagnostics::{Finding, Findings};
use crate::parser::ast::{Block, Expr, Function, Stmt, TypeExpr};
use crate::span::{Span, Spanned};
use super::infer::infer_expr;
use super::resolve::{declare_type_params, resolve_type_expr};
use super::types::TypeId;
use super::{redeclaration, AnalysisContext, Analyze};

impl Analyze for Spanned<Stmt> {
    fn analyze(&self, ctx: &mut AnalysisContext) -> Findings {
        let mut findings = Findings::new();
        match &self.node {
            Stmt::TypeDecl(decl) => findings.extend(decl.analyze(ctx)),
            Stmt::Function(func) => findings.extend(func.analyze(ctx)),
            Stmt::Let { name, ty, value, is_const } => {
                check_let(name, ty.as_ref(), value, *is_const, ctx, &mut findings);
            }
            Stmt::Assign { target, value } => check_assign(target, value, ctx, &mut findings),
            Stmt::Return(value) => check_return(self.span, value.as_ref(), ctx, &mut findings),
            Stmt::While { condition, body } => {
                check_condition(condition, ctx, &mut findings);
                ctx.table.push_scope(None, true);
                findings.extend(body.node.analyze(ctx));
                ctx.table.pop_scope();
            }
            Stmt::If { condition, then_block, else_block } => {
                check_condition(condition, ctx, &mut findings);
                ctx.table.push_scope(None, false);
                findings.extend(then_block.node.analyze(ctx));
                ctx.table.pop_scope();
                if let Some(else_block) = else_block {
                    ctx.table.push_scope(None, false);
                    findings.extend(else_block.node.analyze(ctx));
                    ctx.table.pop_scope();
                }
            }
            Stmt::Break | Stmt::Continue => {
                if !ctx.table.inside_loop() {
                    let keyword = if matches!(self.node, Stmt::Break) { "break" } else { "continue" };
                    findings.push_error(Finding::new(format!("'{keyword}' outside of a loop"), self.span));
                }
            }
            Stmt::Expr(expr) => {
                infer_expr(expr, ctx, &mut findings);
            }
        }
        findings
    }
}

/// Analyze statements in the current scope. Callers own the scope.
impl Analyze for Block {
    fn analyze(&self, ctx: &mut AnalysisContext) -> Findings {
        let mut findings = Findings::new();
        for stmt in &self.stmts {
            findings.extend(stmt.analyze(ctx));
        }
        findings
    }
}

/// Report a name that cannot be declared in the current scope, or warn when
/// it hides a standard-library binding. Returns false on error.
fn check_declarable(name: &Spanned<String>, ctx: &AnalysisContext, findings: &mut Findings) -> bool {
    if let Some(entry) = ctx.table.find_symbol_in_current_scope(&name.node) {
        findings.push_error(Finding::new(redeclaration(&name.node, entry.flags), name.span));
        return false;
    }
    if ctx.table.find_symbol(&name.node).is_some_and(|e| e.flags.stdlib) {
        findings.push_warning(Finding::new(
            format!("'{}' shadows a standard library binding", name.node),
            name.span,
        ));
    }
    true
}

fn check_let(
    name: &Spanned<String>,
    annotation: Option<&Spanned<TypeExpr>>,
    value: &Spanned<Expr>,
    is_const: bool,
    ctx: &mut AnalysisContext,
    findings: &mut Findings,
) {
    let value_ty = infer_expr(value, ctx, findings);
    let ty = match annotation {
        Some(annotation) => match resolve_type_expr(annotation, ctx) {
            Ok(declared) => {
                if let Err(mismatch) = ctx.arena.check_compatible(value_ty, declared) {
                    findings.push_error(
                        Finding::new(
                            format!(
                                "cannot assign {} to '{}' of type {}",
                                ctx.arena.display(value_ty),
                                name.node,
                                ctx.arena.display(declared),
                            ),
                            value.span,
                        )
                        .with_secondary(annotation.span)
                        .with_highlight(mismatch.describe(&ctx.arena)),
                    );
                }
                declared
            }
            Err(f) => {
                findings.extend(f);
                ctx.arena.ignore
            }
        },
        None => value_ty,
    };

    if !check_declarable(name, ctx, findings) {
        return;
    }
    let mut flags = ctx.table.effective_flags();
    flags.readonly |= is_const;
    ctx.table.set_symbol_flagged(&name.node, ty, flags);
    ctx.record(name.span, ty);
}

fn check_assign(target: &Spanned<String>, value: &Spanned<Expr>, ctx: &mut AnalysisContext, findings: &mut Findings) {
    let value_ty = infer_expr(value, ctx, findings);
    let Some(entry) = ctx.table.find_symbol(&target.node) else {
        findings.push_error(Finding::new(format!("unknown symbol '{}'", target.node), target.span));
        return;
    };
    let (declared, flags) = (entry.value, entry.flags);

    if flags.readonly {
        let msg = if flags.stdlib {
            format!("'{}' is part of the language", target.node)
        } else {
            format!("cannot assign to constant '{}'", target.node)
        };
        findings.push_error(Finding::new(msg, target.span));
        return;
    }
    if let Err(mismatch) = ctx.arena.check_compatible(value_ty, declared) {
        findings.push_error(
            Finding::new(
                format!(
                    "cannot assign {} to '{}' of type {}",
                    ctx.arena.display(value_ty),
                    target.node,
                    ctx.arena.display(declared),
                ),
                value.span,
            )
            .with_highlight(mismatch.describe(&ctx.arena)),
        );
    }
}

fn check_return(span: Span, value: Option<&Spanned<Expr>>, ctx: &mut AnalysisContext, findings: &mut Findings) {
    let value_ty = match value {
        Some(expr) => infer_expr(expr, ctx, findings),
        None => ctx.arena.nothing,
    };
    let Some(expected) = ctx.table.current_return_type() else {
        findings.push_error(Finding::new("'return' outside of a function", span));
        return;
    };
    if let Err(mismatch) = ctx.arena.check_compatible(value_ty, expected) {
        findings.push_error(
            Finding::new(
                format!(
                    "cannot return {} from a function returning {}",
                    ctx.arena.display(value_ty),
                    ctx.arena.display(expected),
                ),
                value.map_or(span, |v| v.span),
            )
            .with_highlight(mismatch.describe(&ctx.arena)),
        );
    }
}

fn check_condition(condition: &Spanned<Expr>, ctx: &mut AnalysisContext, findings: &mut Findings) {
    let ty = infer_expr(condition, ctx, findings);
    if !ctx.arena.is_compatible(ty, ctx.arena.boolean) {
        findings.push_error(Finding::new(
            format!("condition must be Boolean, found {}", ctx.arena.display(ty)),
            condition.span,
        ));
    }
}

/// True when every path through `block` ends in a `return`.
fn always_returns(block: &Block) -> bool {
    block.stmts.iter().any(|stmt| match &stmt.node {
        Stmt::Return(_) => true,
        Stmt::If { then_block, else_block: Some(else_block), .. } => {
            always_returns(&then_block.node) && always_returns(&else_block.node)
        }
        _ => false,
    })
}

impl Analyze for Function {
    fn analyze(&self, ctx: &mut AnalysisContext) -> Findings {
        let mut findings = Findings::new();

        // The signature is resolved in its own scope so type parameters do
        // not leak into the enclosing one.
        ctx.table.push_scope(None, false);
        let placeholders = declare_type_params(&self.type_params, ctx, &mut findings);
        let mut params: Vec<TypeId> = Vec::with_capacity(self.params.len());
        for p in &self.params {
            match resolve_type_expr(&p.ty, ctx) {
                Ok(id) => params.push(id),
                Err(f) => {
                    findings.extend(f);
                    params.push(ctx.arena.ignore);
                }
            }
        }
        let return_type = match &self.return_type {
            Some(rt) => match resolve_type_expr(rt, ctx) {
                Ok(id) => id,
                Err(f) => {
                    findings.extend(f);
                    ctx.arena.ignore
                }
            },
            None => ctx.arena.nothing,
        };
        ctx.table.pop_scope();

        let fn_ty = ctx.arena.function(params.clone(), return_type, placeholders.clone());
        // Registered before the body so the function can call itself.
        if check_declarable(&self.name, ctx, &mut findings) {
            ctx.table.set_symbol(&self.name.node, fn_ty);
        }
        ctx.record(self.name.span, fn_ty);

        ctx.table.push_scope(Some(return_type), false);
        for (name, id) in &placeholders {
            ctx.table.set_type(name, *id);
        }
        let mut seen = HashSet::new();
        for (p, ty) in self.params.iter().zip(params) {
            if !seen.insert(p.name.node.as_str()) {
                findings.push_error(Finding::new(format!("duplicate parameter '{}'", p.name.node), p.name.span));
                continue;
            }
            ctx.table.set_symbol(&p.name.node, ty);
            ctx.record(p.name.span, ty);
        }
        findings.extend(self.body.node.analyze(ctx));
        ctx.table.pop_scope();

        let returns_nothing = ctx.arena.peel(return_type) == ctx.arena.nothing || ctx.arena.is_ignore(return_type);
        if !returns_nothing && !always_returns(&self.body.node) {
            findings.push_error(Finding::new(
                format!(
                    "function '{}' must return a value of type {}",
                    self.name.node,
                    ctx.arena.display(return_type),
                ),
                self.name.span,
            ));
        }
        findings
    }
}

#[cfg(test)]
mod tests {
    use crate::parser::parse_source;
    use crate::typeck::{analyze_program, AnalysisContext};

    fn errors(src: &str) -> Vec<String> {
        let program = parse_source(src).unwrap();
        let mut ctx = AnalysisContext::new();
        analyze_program(&program, &mut ctx).errors.into_iter().map(|f| f.message).collect()
    }

    #[test]
    fn let_annotation_mismatch() {
        assert_eq!(errors("let x: Number = true"), vec!["cannot assign Boolean to 'x' of type Number"]);
    }

    #[test]
    fn redeclaration_in_same_scope() {
        assert_eq!(errors("let x = 1\nlet x = 2"), vec!["'x' already exists"]);
    }

    #[test]
    fn shadowing_in_inner_scope_is_allowed() {
        assert!(errors("let x = 1\nif true { let x = \"s\" }").is_empty());
    }

    #[test]
    fn constants_cannot_be_assigned() {
        assert_eq!(errors("const x = 1\nx = 2"), vec!["cannot assign to constant 'x'"]);
    }

    #[test]
    fn assignment_must_match_type() {
        assert_eq!(errors("let x = 1\nx = \"s\""), vec!["cannot assign String to 'x' of type Number"]);
    }

    #[test]
    fn return_outside_function() {
        assert_eq!(errors("return 1"), vec!["'return' outside of a function"]);
    }

    #[test]
    fn return_type_mismatch() {
        assert_eq!(
            errors("function f() -> Number { return \"s\" }"),
            vec!["cannot return String from a function returning Number"]
        );
    }

    #[test]
    fn missing_return() {
        assert_eq!(
            errors("function f(b: Boolean) -> Number { if b { return 1 } }"),
            vec!["function 'f' must return a value of type Number"]
        );
        assert!(errors("function f(b: Boolean) -> Number { if b { return 1 } else { return 2 } }").is_empty());
    }

    #[test]
    fn break_only_inside_loops() {
        assert_eq!(errors("break"), vec!["'break' outside of a loop"]);
        assert!(errors("while true { if false { continue } break }").is_empty());
        assert_eq!(
            errors("while true { function f() { break } }"),
            vec!["'break' outside of a loop"]
        );
    }

    #[test]
    fn conditions_must_be_boolean() {
        assert_eq!(errors("if 1 { }"), vec!["condition must be Boolean, found Number"]);
    }

    #[test]
    fn recursive_function_sees_itself() {
        assert!(errors("function loop(n: Number) -> Number { return loop(n) }").is_empty());
    }

    #[test]
    fn duplicate_parameters() {
        assert_eq!(errors("function f(a: Number, a: Number) { }"), vec!["duplicate parameter 'a'"]);
    }

    #[test]
    fn type_parameters_do_not_leak() {
        assert_eq!(
            errors("function id<T>(x: T) -> T { return x }\nlet y: T = 1"),
            vec!["unknown type 'T'"]
        );
    }
}
