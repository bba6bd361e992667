use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::io::Write;
use std::rc::Rc;

use crate::parser::ast::Function;
use crate::typeck::define::ConstructorParam;
use crate::typeck::env::Snapshot;
use super::RuntimeError;

/// A mutable variable cell. Scopes and closure snapshots share cells, so an
/// assignment is seen by every closure that captured the variable.
pub type Slot = Rc<RefCell<Value>>;

pub fn slot(value: Value) -> Slot {
    Rc::new(RefCell::new(value))
}

pub type NativeFn = fn(&[Value], &mut dyn Write) -> Result<Value, RuntimeError>;

#[derive(Clone)]
pub struct Native {
    pub name: &'static str,
    pub func: NativeFn,
}

pub struct Closure {
    pub decl: Rc<Function>,
    pub env: Snapshot<Slot>,
}

pub struct Instance {
    pub type_name: String,
    pub fields: Vec<(String, Value)>,
}

impl Instance {
    pub fn field(&self, name: &str) -> Option<&Value> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, v)| v)
    }
}

pub struct Constructor {
    pub type_name: String,
    /// Declaration order of the fields.
    pub field_order: Vec<String>,
    /// Positional order: required fields first, then defaulted ones.
    pub params: Vec<ConstructorParam>,
    pub defaults: HashMap<String, Value>,
}

#[derive(Clone)]
pub enum Value {
    Number(f64),
    String(String),
    Boolean(bool),
    Nothing,
    Instance(Rc<Instance>),
    Function(Rc<Closure>),
    Native(Native),
    Constructor(Rc<Constructor>),
}

impl Value {
    pub fn type_name(&self) -> &str {
        match self {
            Value::Number(_) => "Number",
            Value::String(_) => "String",
            Value::Boolean(_) => "Boolean",
            Value::Nothing => "Nothing",
            Value::Instance(i) => &i.type_name,
            Value::Function(_) | Value::Native(_) | Value::Constructor(_) => "Function",
        }
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Number(n) => write!(f, "{n}"),
            Value::String(s) => write!(f, "{s}"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Nothing => write!(f, "nothing"),
            Value::Instance(inst) => {
                write!(f, "{} {{ ", inst.type_name)?;
                for (i, (name, value)) in inst.fields.iter().enumerate() {
                    if i > 0 {
                        write!(f, ", ")?;
                    }
                    match value {
                        Value::String(s) => write!(f, "{name}: {s:?}")?,
                        other => write!(f, "{name}: {other}")?,
                    }
                }
                write!(f, " }}")
            }
            Value::Function(c) => write!(f, "<function {}>", c.decl.name.node),
            Value::Native(n) => write!(f, "<native {}>", n.name),
            Value::Constructor(c) => write!(f, "<constructor {}>", c.type_name),
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{self}")
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Number(a), Value::Number(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Nothing, Value::Nothing) => true,
            (Value::Instance(a), Value::Instance(b)) => {
                a.type_name == b.type_name && a.fields == b.fields
            }
            (Value::Function(a), Value::Function(b)) => Rc::ptr_eq(a, b),
            (Value::Native(a), Value::Native(b)) => a.name == b.name,
            (Value::Constructor(a), Value::Constructor(b)) => Rc::ptr_eq(a, b),
            _ => false,
        }
    }
}
