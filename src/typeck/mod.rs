pub mod check;
pub mod compat;
pub mod define;
pub mod env;
pub mod infer;
pub mod resolve;
pub mod types;

use std::collections::HashMap;

use tracing::debug;

use crate::diagnostics::{internal_error, Findings, InternalError};
use crate::parser::ast::Program;
use crate::span::Span;
use define::ConstructorBinding;
use env::{EntryFlags, TypeTable};
use types::{TypeArena, TypeId};

/// Everything analysis reads and writes, passed explicitly to every
/// `analyze` call.
#[derive(Debug, Clone)]
pub struct AnalysisContext {
    pub arena: TypeArena,
    pub table: TypeTable,
    /// Type recorded for each analyzed node, keyed by its span.
    resolved: HashMap<Span, TypeId>,
    /// Constructor bindings keyed by the span of the structure's name.
    pub constructors: HashMap<Span, ConstructorBinding>,
}

impl Default for AnalysisContext {
    fn default() -> Self {
        Self::new()
    }
}

impl AnalysisContext {
    pub fn new() -> Self {
        let arena = TypeArena::new();
        let table = TypeTable::with_fundamentals(&arena);
        Self {
            arena,
            table,
            resolved: HashMap::new(),
            constructors: HashMap::new(),
        }
    }

    pub(crate) fn record(&mut self, span: Span, ty: TypeId) {
        self.resolved.insert(span, ty);
    }

    /// The type analysis recorded for the node at `span`.
    ///
    /// Only valid after `analyze()` has run over that node.
    pub fn resolve_type(&self, span: Span) -> TypeId {
        match self.resolved.get(&span) {
            Some(ty) => *ty,
            None => internal_error(InternalError::UnresolvedNode { start: span.start, end: span.end }),
        }
    }

    pub fn try_resolve_type(&self, span: Span) -> Option<TypeId> {
        self.resolved.get(&span).copied()
    }

    pub fn lookup_type(&self, name: &str) -> Option<TypeId> {
        self.table.find_type(name).map(|e| e.value)
    }

    pub fn lookup_symbol(&self, name: &str) -> Option<TypeId> {
        self.table.find_symbol(name).map(|e| e.value)
    }

    pub fn constructor(&self, name_span: Span) -> Option<&ConstructorBinding> {
        self.constructors.get(&name_span)
    }
}

/// Static analysis of one AST node.
pub trait Analyze {
    fn analyze(&self, ctx: &mut AnalysisContext) -> Findings;
}

impl Analyze for Program {
    fn analyze(&self, ctx: &mut AnalysisContext) -> Findings {
        let mut findings = Findings::new();
        for item in &self.items {
            findings.extend(item.analyze(ctx));
        }
        findings
    }
}

/// Analyze a whole program in the table's current scope.
pub fn analyze_program(program: &Program, ctx: &mut AnalysisContext) -> Findings {
    let findings = program.analyze(ctx);
    debug!(errors = findings.errors.len(), warnings = findings.warnings.len(), "analysis finished");
    findings
}

/// Message for declaring a name that is already taken.
pub(crate) fn redeclaration(name: &str, flags: EntryFlags) -> String {
    if flags.readonly && flags.stdlib {
        format!("'{name}' is part of the language")
    } else {
        format!("'{name}' already exists")
    }
}
