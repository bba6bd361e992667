//! Composite type definitions (`structure` and `type`).
//!
//! A definition is analyzed in phases so that fields may refer to the type
//! being defined:
//!
//! 1. barebones: register a composite whose fields are preliminary
//!    placeholders bound to `Ignore`;
//! 2. field pre-analysis: resolve annotations and default values;
//! 3. traits: merge the fields required by every trait and check them;
//! 4. completion: rebind each preliminary to its real type.
//!
//! If phase 1 or 2 fails the table is rolled back to the barebones state and
//! nothing else is published.

use std::collections::HashSet;

use serde::Serialize;
use tracing::debug;

use crate::diagnostics::{Finding, Findings};
use crate::parser::ast::{DeclKind, TypeDecl};
use crate::span::Span;
use super::infer::infer_expr;
use super::resolve::resolve_type_expr;
use super::types::TypeId;
use super::{redeclaration, AnalysisContext, Analyze};

/// One positional constructor argument.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ConstructorParam {
    pub name: String,
    pub has_default: bool,
}

/// What the evaluator needs to build instances of a `structure`.
///
/// `params` lists fields without a default first, then defaulted ones, each
/// group in declaration order.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstructorBinding {
    pub type_name: String,
    pub type_id: TypeId,
    pub params: Vec<ConstructorParam>,
}

struct Barebones {
    composite: TypeId,
    preliminaries: Vec<TypeId>,
}

struct RequiredField {
    ty: TypeId,
    trait_name: String,
    span: Span,
}

impl Analyze for TypeDecl {
    fn analyze(&self, ctx: &mut AnalysisContext) -> Findings {
        let barebones = match self.barebones(ctx) {
            Ok(b) => b,
            Err(findings) => return findings,
        };
        // Everything after this point rolls back to here on early abort.
        let snapshot = ctx.table.create_snapshot();
        ctx.table.push_scope(None, false);
        let placeholders = ctx.arena.as_composite(barebones.composite)
            .map(|c| c.placeholders.clone())
            .unwrap_or_default();
        for (name, id) in &placeholders {
            ctx.table.set_type(name, *id);
        }

        let mut findings = Findings::new();
        let field_types = match self.pre_analyze_fields(ctx, &mut findings) {
            Some(types) => types,
            None => {
                debug!(name = %self.name.node, "definition aborted, rolling back");
                ctx.table.reset(Some(snapshot));
                return findings;
            }
        };

        let traits = self.check_traits(ctx, &field_types, &mut findings);
        if let Some(c) = ctx.arena.composite_mut(barebones.composite) {
            c.traits = traits;
        }

        for (prelim, real) in barebones.preliminaries.iter().zip(field_types.iter()) {
            ctx.arena.complete_preliminary(*prelim, *real);
        }
        ctx.table.pop_scope();

        if self.kind == DeclKind::Structure {
            self.publish_constructor(ctx, barebones.composite);
        }
        debug!(name = %self.name.node, "definition complete");
        findings
    }
}

impl TypeDecl {
    fn barebones(&self, ctx: &mut AnalysisContext) -> Result<Barebones, Findings> {
        let mut findings = Findings::new();
        let name = &self.name.node;

        if let Some(entry) = ctx.table.find_type(name) {
            findings.push_error(Finding::new(redeclaration(name, entry.flags), self.name.span));
        } else if self.kind == DeclKind::Structure {
            if let Some(entry) = ctx.table.find_symbol_in_current_scope(name) {
                findings.push_error(Finding::new(redeclaration(name, entry.flags), self.name.span));
            }
        }

        let mut seen = HashSet::new();
        for tp in &self.type_params {
            if !seen.insert(tp.node.as_str()) {
                findings.push_error(Finding::new(format!("duplicate type parameter '{}'", tp.node), tp.span));
            } else if ctx.table.find_type(&tp.node).is_some() {
                findings.push_error(Finding::new(
                    format!("type parameter '{}' shadows an existing type", tp.node),
                    tp.span,
                ));
            }
        }

        let mut seen = HashSet::new();
        for field in &self.fields {
            if !seen.insert(field.name.node.as_str()) {
                findings.push_error(Finding::new(format!("duplicate field '{}'", field.name.node), field.name.span));
            }
        }

        if findings.is_erroneous() {
            return Err(findings);
        }

        let placeholders: Vec<(String, TypeId)> = self.type_params.iter()
            .map(|tp| (tp.node.clone(), ctx.arena.placeholder(&tp.node, false)))
            .collect();
        let preliminaries: Vec<TypeId> = self.fields.iter()
            .map(|f| ctx.arena.preliminary(&f.name.node))
            .collect();
        let fields = self.fields.iter()
            .zip(preliminaries.iter())
            .map(|(f, p)| (f.name.node.clone(), *p))
            .collect();
        let composite = ctx.arena.composite(name, fields, placeholders);
        ctx.table.set_type(name, composite);
        ctx.record(self.name.span, composite);
        debug!(name = %name, "registered barebones type");

        Ok(Barebones { composite, preliminaries })
    }

    /// Real field types in declaration order, or `None` when a field cannot
    /// be typed.
    fn pre_analyze_fields(&self, ctx: &mut AnalysisContext, findings: &mut Findings) -> Option<Vec<TypeId>> {
        let mut types = Vec::with_capacity(self.fields.len());
        let mut fatal = false;
        let mut seen_default = false;

        for field in &self.fields {
            let name = &field.name.node;

            let declared = match &field.ty {
                Some(ty) => match resolve_type_expr(ty, ctx) {
                    Ok(id) => Some(id),
                    Err(f) => {
                        findings.extend(f);
                        fatal = true;
                        continue;
                    }
                },
                None => None,
            };
            let default = match &field.default {
                Some(expr) => {
                    let mut expr_findings = Findings::new();
                    let id = infer_expr(expr, ctx, &mut expr_findings);
                    if expr_findings.is_erroneous() {
                        findings.extend(expr_findings);
                        fatal = true;
                        continue;
                    }
                    findings.extend(expr_findings);
                    Some(id)
                }
                None => None,
            };

            let ty = match (declared, default) {
                (None, None) => {
                    findings.push_error(Finding::new(
                        format!("field '{name}' needs a type annotation or a default value"),
                        field.name.span,
                    ));
                    fatal = true;
                    continue;
                }
                (Some(declared), Some(default)) => {
                    if let Err(mismatch) = ctx.arena.check_compatible(default, declared) {
                        let expr_span = field.default.as_ref().map_or(field.name.span, |d| d.span);
                        findings.push_error(
                            Finding::new(
                                format!(
                                    "default value of field '{name}' has type {}, which is not assignable to declared type {}",
                                    ctx.arena.display(default),
                                    ctx.arena.display(declared),
                                ),
                                expr_span,
                            )
                            .with_secondary(field.name.span)
                            .with_highlight(mismatch.describe(&ctx.arena)),
                        );
                        fatal = true;
                        continue;
                    }
                    declared
                }
                (Some(declared), None) => declared,
                (None, Some(default)) => default,
            };

            if field.default.is_some() {
                seen_default = true;
            } else if seen_default {
                findings.push_error(Finding::new(
                    format!("field '{name}' without a default value follows a field with one"),
                    field.name.span,
                ));
            }
            types.push(ty);
        }

        if fatal { None } else { Some(types) }
    }

    /// Check every declared trait against the fields. Returns the traits that
    /// resolved to composites.
    fn check_traits(&self, ctx: &mut AnalysisContext, field_types: &[TypeId], findings: &mut Findings) -> Vec<TypeId> {
        let mut traits = Vec::new();
        let mut required: Vec<(String, RequiredField)> = Vec::new();

        for tr in &self.traits {
            let id = match resolve_type_expr(tr, ctx) {
                Ok(id) => id,
                Err(f) => {
                    findings.extend(f);
                    continue;
                }
            };
            let trait_name = ctx.arena.display(id);
            let Some(fields) = ctx.arena.as_composite(ctx.arena.peel(id)).map(|c| c.fields.clone()) else {
                findings.push_error(Finding::new(format!("'{trait_name}' cannot be used as a trait"), tr.span));
                continue;
            };
            traits.push(id);

            for (field_name, ty) in fields {
                let entry = RequiredField { ty, trait_name: trait_name.clone(), span: tr.span };
                match required.iter_mut().find(|(n, _)| *n == field_name) {
                    Some((_, previous)) => {
                        if !ctx.arena.is_compatible(ty, previous.ty) {
                            findings.push_error(
                                Finding::new(
                                    format!(
                                        "traits '{}' and '{}' require field '{field_name}' with incompatible types {} and {}",
                                        previous.trait_name,
                                        trait_name,
                                        ctx.arena.display(previous.ty),
                                        ctx.arena.display(ty),
                                    ),
                                    tr.span,
                                )
                                .with_secondary(previous.span),
                            );
                        }
                        *previous = entry;
                    }
                    None => required.push((field_name, entry)),
                }
            }
        }

        let type_name = &self.name.node;
        for (field_name, req) in &required {
            let Some(index) = self.fields.iter().position(|f| &f.name.node == field_name) else {
                findings.push_error(
                    Finding::new(
                        format!("'{type_name}' is missing field '{field_name}' required by trait '{}'", req.trait_name),
                        self.name.span,
                    )
                    .with_secondary(req.span),
                );
                continue;
            };
            let actual = field_types[index];
            if let Err(mismatch) = ctx.arena.check_compatible(actual, req.ty) {
                findings.push_error(
                    Finding::new(
                        format!(
                            "field '{field_name}' of '{type_name}' has type {}, which is not compatible with {} required by trait '{}'",
                            ctx.arena.display(actual),
                            ctx.arena.display(req.ty),
                            req.trait_name,
                        ),
                        self.fields[index].name.span,
                    )
                    .with_secondary(req.span)
                    .with_highlight(mismatch.describe(&ctx.arena)),
                );
            }
        }

        traits
    }

    fn publish_constructor(&self, ctx: &mut AnalysisContext, composite: TypeId) {
        let Some(c) = ctx.arena.as_composite(composite).cloned() else {
            return;
        };
        let mut params = Vec::with_capacity(self.fields.len());
        let mut param_types = Vec::with_capacity(self.fields.len());
        for has_default in [false, true] {
            for (decl, (name, ty)) in self.fields.iter().zip(c.fields.iter()) {
                if decl.default.is_some() == has_default {
                    params.push(ConstructorParam { name: name.clone(), has_default });
                    param_types.push(*ty);
                }
            }
        }
        let optional = params.iter().filter(|p| p.has_default).count();

        let ctor = ctx.arena.function(param_types, composite, c.placeholders.clone());
        if let Some(f) = ctx.arena.function_mut(ctor) {
            f.optional_params = optional;
        }
        ctx.table.set_symbol(&self.name.node, ctor);
        ctx.constructors.insert(self.name.span, ConstructorBinding {
            type_name: self.name.node.clone(),
            type_id: composite,
            params,
        });
    }
}
