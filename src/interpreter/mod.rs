//! Tree-walking evaluator.
//!
//! Programs must have been analyzed without errors first: lookups that
//! analysis already validated are treated as internal errors here.

pub mod value;

use std::collections::HashMap;
use std::io::Write;
use std::rc::Rc;

use thiserror::Error;
use tracing::debug;

use crate::diagnostics::{internal_error, InternalError};
use crate::parser::ast::{Block, DeclKind, Expr, Program, Stmt, TypeDecl};
use crate::span::Spanned;
use crate::stdlib;
use crate::typeck::env::{FlagOverride, ScopedTable};
use crate::typeck::AnalysisContext;
use value::{slot, Closure, Constructor, Instance, Slot, Value};

#[derive(Debug, Error)]
pub enum RuntimeError {
    #[error("assertion failed")]
    AssertionFailed,

    #[error("failed to write output: {0}")]
    Io(#[from] std::io::Error),
}

enum Flow {
    Normal,
    Return(Value),
    Break,
    Continue,
}

pub struct Interpreter<'a, W: Write> {
    ctx: &'a AnalysisContext,
    pub table: ScopedTable<Slot>,
    out: W,
}

impl<'a, W: Write> Interpreter<'a, W> {
    pub fn new(ctx: &'a AnalysisContext, out: W) -> Self {
        Self { ctx, table: ScopedTable::new(), out }
    }

    pub fn into_output(self) -> W {
        self.out
    }

    /// Run the already analyzed standard library, mirroring the analysis
    /// side: primitives are visible and every binding is read-only while it
    /// runs, then one scope is pushed for user code.
    pub fn inject_stdlib(&mut self, prelude: &Program) -> Result<(), RuntimeError> {
        for native in stdlib::natives() {
            self.table.set_runtime_symbol(native.name, slot(Value::Native(native)));
        }

        let ignored = self.table.ignores_runtime_bindings();
        self.table.set_global_flag_override(FlagOverride::STDLIB);
        self.table.set_ignore_runtime_bindings(false);
        let result = self.run(prelude);
        self.table.set_ignore_runtime_bindings(ignored);
        self.table.clear_flag_overrides();
        result?;

        self.table.push_scope(None, false);
        debug!("standard library loaded");
        Ok(())
    }

    pub fn run(&mut self, program: &Program) -> Result<(), RuntimeError> {
        for item in &program.items {
            match self.exec_stmt(item)? {
                Flow::Normal => {}
                // Analysis rejects these at the top level.
                Flow::Return(_) | Flow::Break | Flow::Continue => break,
            }
        }
        Ok(())
    }

    fn exec_block(&mut self, block: &Block) -> Result<Flow, RuntimeError> {
        for stmt in &block.stmts {
            match self.exec_stmt(stmt)? {
                Flow::Normal => {}
                other => return Ok(other),
            }
        }
        Ok(Flow::Normal)
    }

    fn exec_scoped(&mut self, block: &Block, is_loop: bool) -> Result<Flow, RuntimeError> {
        self.table.push_scope(None, is_loop);
        let flow = self.exec_block(block);
        self.table.pop_scope();
        flow
    }

    fn exec_stmt(&mut self, stmt: &Spanned<Stmt>) -> Result<Flow, RuntimeError> {
        match &stmt.node {
            Stmt::TypeDecl(decl) => self.declare_type(decl)?,
            Stmt::Function(func) => {
                let cell = slot(Value::Nothing);
                self.table.set_symbol(&func.name.node, Rc::clone(&cell));
                // The snapshot shares `cell`, so the body can call itself.
                let closure = Closure { decl: Rc::new(func.clone()), env: self.table.create_snapshot() };
                *cell.borrow_mut() = Value::Function(Rc::new(closure));
            }
            Stmt::Let { name, value, is_const, .. } => {
                let value = self.eval(value)?;
                let mut flags = self.table.effective_flags();
                flags.readonly |= *is_const;
                self.table.set_symbol_flagged(&name.node, slot(value), flags);
            }
            Stmt::Assign { target, value } => {
                let value = self.eval(value)?;
                let cell = self.lookup(&target.node);
                *cell.borrow_mut() = value;
            }
            Stmt::Return(value) => {
                let value = match value {
                    Some(expr) => self.eval(expr)?,
                    None => Value::Nothing,
                };
                return Ok(Flow::Return(value));
            }
            Stmt::While { condition, body } => {
                while self.eval_condition(condition)? {
                    match self.exec_scoped(&body.node, true)? {
                        Flow::Break => break,
                        Flow::Normal | Flow::Continue => {}
                        ret @ Flow::Return(_) => return Ok(ret),
                    }
                }
            }
            Stmt::If { condition, then_block, else_block } => {
                if self.eval_condition(condition)? {
                    return self.exec_scoped(&then_block.node, false);
                } else if let Some(else_block) = else_block {
                    return self.exec_scoped(&else_block.node, false);
                }
            }
            Stmt::Break => return Ok(Flow::Break),
            Stmt::Continue => return Ok(Flow::Continue),
            Stmt::Expr(expr) => {
                self.eval(expr)?;
            }
        }
        Ok(Flow::Normal)
    }

    fn declare_type(&mut self, decl: &TypeDecl) -> Result<(), RuntimeError> {
        let ctx = self.ctx;
        if let Some(ty) = ctx.try_resolve_type(decl.name.span) {
            self.table.set_type(&decl.name.node, ty);
        }
        if decl.kind != DeclKind::Structure {
            return Ok(());
        }
        let Some(binding) = ctx.constructor(decl.name.span) else {
            internal_error(InternalError::Other(format!("no constructor was recorded for '{}'", decl.name.node)));
        };

        let mut defaults = HashMap::new();
        for field in &decl.fields {
            if let Some(expr) = &field.default {
                let value = self.eval(expr)?;
                defaults.insert(field.name.node.clone(), value);
            }
        }
        let ctor = Constructor {
            type_name: binding.type_name.clone(),
            field_order: decl.fields.iter().map(|f| f.name.node.clone()).collect(),
            params: binding.params.clone(),
            defaults,
        };
        self.table.set_symbol(&decl.name.node, slot(Value::Constructor(Rc::new(ctor))));
        Ok(())
    }

    fn lookup(&self, name: &str) -> Slot {
        match self.table.find_symbol(name) {
            Some(entry) => Rc::clone(&entry.value),
            None => internal_error(InternalError::UnknownSymbol { name: name.to_string() }),
        }
    }

    fn eval_condition(&mut self, condition: &Spanned<Expr>) -> Result<bool, RuntimeError> {
        match self.eval(condition)? {
            Value::Boolean(b) => Ok(b),
            other => internal_error(InternalError::Other(format!("condition evaluated to {}", other.type_name()))),
        }
    }

    fn eval(&mut self, expr: &Spanned<Expr>) -> Result<Value, RuntimeError> {
        match &expr.node {
            Expr::NumberLit(n) => Ok(Value::Number(*n)),
            Expr::StringLit(s) => Ok(Value::String(s.clone())),
            Expr::BoolLit(b) => Ok(Value::Boolean(*b)),
            Expr::Ident(name) => {
                let cell = self.lookup(name);
                let value = cell.borrow().clone();
                Ok(value)
            }
            Expr::FieldAccess { object, field } => match self.eval(object)? {
                Value::Instance(inst) => match inst.field(&field.node) {
                    Some(value) => Ok(value.clone()),
                    None => internal_error(InternalError::Other(format!(
                        "'{}' has no field '{}'",
                        inst.type_name, field.node
                    ))),
                },
                other => internal_error(InternalError::Other(format!(
                    "field access on {}",
                    other.type_name()
                ))),
            },
            Expr::Call { callee, args } => {
                let callee = self.eval(callee)?;
                let mut values = Vec::with_capacity(args.len());
                for arg in args {
                    values.push(self.eval(arg)?);
                }
                self.call(callee, values)
            }
        }
    }

    /// Switch to the closure's captured table and bind its parameters.
    /// Flag overrides active when the closure was captured do not apply to
    /// the call.
    fn enter_closure(&mut self, closure: &Closure, args: Vec<Value>) {
        self.table.reset(Some(closure.env.clone()));
        self.table.clear_flag_overrides();
        self.table.push_scope(None, false);
        for (param, value) in closure.decl.params.iter().zip(args) {
            self.table.set_symbol(&param.name.node, slot(value));
        }
    }

    fn call(&mut self, callee: Value, args: Vec<Value>) -> Result<Value, RuntimeError> {
        match callee {
            Value::Function(closure) => {
                let saved = self.table.create_snapshot();
                self.enter_closure(&closure, args);
                let flow = self.exec_block(&closure.decl.body.node);
                self.table.reset(Some(saved));
                match flow? {
                    Flow::Return(value) => Ok(value),
                    _ => Ok(Value::Nothing),
                }
            }
            Value::Native(native) => (native.func)(&args, &mut self.out),
            Value::Constructor(ctor) => Ok(construct(&ctor, args)),
            other => internal_error(InternalError::Other(format!("{} is not callable", other.type_name()))),
        }
    }
}

fn construct(ctor: &Constructor, args: Vec<Value>) -> Value {
    let mut given: HashMap<&str, Value> = HashMap::new();
    let mut args = args.into_iter();
    for param in &ctor.params {
        match args.next() {
            Some(value) => {
                given.insert(param.name.as_str(), value);
            }
            None => break,
        }
    }
    let fields = ctor.field_order.iter()
        .map(|name| {
            let value = given.remove(name.as_str())
                .or_else(|| ctor.defaults.get(name).cloned())
                .unwrap_or(Value::Nothing);
            (name.clone(), value)
        })
        .collect();
    Value::Instance(Rc::new(Instance { type_name: ctor.type_name.clone(), fields }))
}
