//! The type algebra.
//!
//! Every type node lives in a [`TypeArena`] and is addressed by a [`TypeId`].
//! A placeholder is an arena slot whose `reference` is mutated in place, so
//! binding it once is observed by every field, parameter or trait that holds
//! the same `TypeId`.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::{internal_error, InternalError};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(u32);

impl TypeId {
    pub fn index(self) -> usize {
        self.0 as usize
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct CompositeType {
    /// Nominal tag, the declared name.
    pub id: String,
    pub fields: Vec<(String, TypeId)>,
    /// Generic parameters in positional binding order.
    pub placeholders: Vec<(String, TypeId)>,
    pub traits: Vec<TypeId>,
}

impl CompositeType {
    pub fn field(&self, name: &str) -> Option<TypeId> {
        self.fields.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }

    pub fn placeholder(&self, name: &str) -> Option<TypeId> {
        self.placeholders.iter().find(|(n, _)| n == name).map(|(_, t)| *t)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FunctionType {
    pub params: Vec<TypeId>,
    pub return_type: TypeId,
    pub placeholders: Vec<(String, TypeId)>,
    /// Number of trailing parameters a call site may omit.
    pub optional_params: usize,
}

#[derive(Debug, Clone, PartialEq)]
pub struct Placeholder {
    pub name: String,
    pub reference: Option<TypeId>,
    pub rebinding_allowed: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub enum SymbolType {
    Composite(CompositeType),
    Function(FunctionType),
    Placeholder(Placeholder),
    /// Compatible with everything.
    Ignore,
    /// Fresh nonce used while unifying two open generic signatures.
    Unique(u64),
}

/// A copy of a preliminary cell made before its definition completed,
/// with the fork memo that produced it.
#[derive(Debug, Clone)]
struct DeferredFork {
    copy: TypeId,
    memo: HashMap<TypeId, TypeId>,
}

#[derive(Debug, Clone)]
pub struct TypeArena {
    nodes: Vec<SymbolType>,
    next_unique: u64,
    /// Copies waiting for the real type of a preliminary, keyed by the
    /// original cell.
    deferred: HashMap<TypeId, Vec<DeferredFork>>,
    pub ignore: TypeId,
    pub number: TypeId,
    pub string: TypeId,
    pub boolean: TypeId,
    pub nothing: TypeId,
}

impl Default for TypeArena {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeArena {
    pub fn new() -> Self {
        let mut arena = Self {
            nodes: Vec::new(),
            next_unique: 0,
            deferred: HashMap::new(),
            ignore: TypeId(0),
            number: TypeId(0),
            string: TypeId(0),
            boolean: TypeId(0),
            nothing: TypeId(0),
        };
        arena.ignore = arena.alloc(SymbolType::Ignore);
        arena.number = arena.composite("Number", Vec::new(), Vec::new());
        arena.string = arena.composite("String", Vec::new(), Vec::new());
        arena.boolean = arena.composite("Boolean", Vec::new(), Vec::new());
        arena.nothing = arena.composite("Nothing", Vec::new(), Vec::new());
        arena
    }

    /// The fundamental types, in the order they are seeded into a new table.
    pub fn fundamentals(&self) -> [(&'static str, TypeId); 4] {
        [
            ("Number", self.number),
            ("String", self.string),
            ("Boolean", self.boolean),
            ("Nothing", self.nothing),
        ]
    }

    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    fn alloc(&mut self, ty: SymbolType) -> TypeId {
        let id = TypeId(self.nodes.len() as u32);
        self.nodes.push(ty);
        id
    }

    pub fn get(&self, id: TypeId) -> &SymbolType {
        &self.nodes[id.index()]
    }

    fn get_mut(&mut self, id: TypeId) -> &mut SymbolType {
        &mut self.nodes[id.index()]
    }

    pub fn composite(&mut self, id: &str, fields: Vec<(String, TypeId)>, placeholders: Vec<(String, TypeId)>) -> TypeId {
        self.alloc(SymbolType::Composite(CompositeType {
            id: id.to_string(),
            fields,
            placeholders,
            traits: Vec::new(),
        }))
    }

    pub fn function(&mut self, params: Vec<TypeId>, return_type: TypeId, placeholders: Vec<(String, TypeId)>) -> TypeId {
        self.alloc(SymbolType::Function(FunctionType { params, return_type, placeholders, optional_params: 0 }))
    }

    pub fn placeholder(&mut self, name: &str, rebinding_allowed: bool) -> TypeId {
        self.alloc(SymbolType::Placeholder(Placeholder {
            name: name.to_string(),
            reference: None,
            rebinding_allowed,
        }))
    }

    /// A rebindable placeholder already bound to `Ignore`; stands in for a
    /// field type that is not known yet.
    pub fn preliminary(&mut self, name: &str) -> TypeId {
        let id = self.placeholder(name, true);
        self.bind(id, self.ignore);
        id
    }

    pub fn unique(&mut self) -> TypeId {
        let index = self.next_unique;
        self.next_unique += 1;
        self.alloc(SymbolType::Unique(index))
    }

    pub fn as_composite(&self, id: TypeId) -> Option<&CompositeType> {
        match self.get(id) {
            SymbolType::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub fn as_function(&self, id: TypeId) -> Option<&FunctionType> {
        match self.get(id) {
            SymbolType::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn as_placeholder(&self, id: TypeId) -> Option<&Placeholder> {
        match self.get(id) {
            SymbolType::Placeholder(p) => Some(p),
            _ => None,
        }
    }

    pub fn composite_mut(&mut self, id: TypeId) -> Option<&mut CompositeType> {
        match self.get_mut(id) {
            SymbolType::Composite(c) => Some(c),
            _ => None,
        }
    }

    pub fn function_mut(&mut self, id: TypeId) -> Option<&mut FunctionType> {
        match self.get_mut(id) {
            SymbolType::Function(f) => Some(f),
            _ => None,
        }
    }

    pub fn is_ignore(&self, id: TypeId) -> bool {
        matches!(self.get(id), SymbolType::Ignore)
    }

    /// Follow a chain of bound placeholders to the concrete type, or to the
    /// final unbound placeholder.
    pub fn peel(&self, mut id: TypeId) -> TypeId {
        let mut steps = 0usize;
        while let SymbolType::Placeholder(Placeholder { reference: Some(next), name, .. }) = self.get(id) {
            id = *next;
            steps += 1;
            if steps > self.nodes.len() {
                internal_error(InternalError::PlaceholderCycle { name: name.clone() });
            }
        }
        id
    }

    /// Like [`peel`](Self::peel) but stops at the last placeholder cell in the
    /// chain, returning `None` when `id` is not a placeholder.
    pub fn peel_to_cell(&self, mut id: TypeId) -> Option<TypeId> {
        if !matches!(self.get(id), SymbolType::Placeholder(_)) {
            return None;
        }
        while let SymbolType::Placeholder(Placeholder { reference: Some(next), .. }) = self.get(id) {
            if !matches!(self.get(*next), SymbolType::Placeholder(_)) {
                break;
            }
            id = *next;
        }
        Some(id)
    }

    /// True when `id` peels to a placeholder that is not bound to anything.
    pub fn is_unbound(&self, id: TypeId) -> bool {
        matches!(self.get(self.peel(id)), SymbolType::Placeholder(_))
    }

    /// True when no unbound placeholder is reachable from `id`.
    pub fn is_complete(&self, id: TypeId) -> bool {
        let mut visited = HashSet::new();
        self.complete_inner(id, &mut visited)
    }

    fn complete_inner(&self, id: TypeId, visited: &mut HashSet<TypeId>) -> bool {
        if !visited.insert(id) {
            return true;
        }
        match self.get(id) {
            SymbolType::Placeholder(p) => match p.reference {
                Some(next) => self.complete_inner(next, visited),
                None => false,
            },
            SymbolType::Composite(c) => {
                c.placeholders.iter().all(|(_, t)| self.complete_inner(*t, visited))
                    && c.fields.iter().all(|(_, t)| self.complete_inner(*t, visited))
            }
            SymbolType::Function(f) => {
                f.params.iter().all(|t| self.complete_inner(*t, visited))
                    && self.complete_inner(f.return_type, visited)
            }
            SymbolType::Ignore | SymbolType::Unique(_) => true,
        }
    }

    /// Bind a placeholder to `to`. A no-op for every other variant.
    pub fn bind(&mut self, id: TypeId, to: TypeId) {
        if self.peel(to) == id {
            let name = self.as_placeholder(id).map(|p| p.name.clone()).unwrap_or_default();
            internal_error(InternalError::PlaceholderCycle { name });
        }
        if let SymbolType::Placeholder(p) = self.get_mut(id) {
            if p.reference.is_some() && !p.rebinding_allowed {
                internal_error(InternalError::PlaceholderRebound { name: p.name.clone() });
            }
            tracing::trace!(placeholder = %p.name, "binding placeholder");
            p.reference = Some(to);
        }
    }

    /// A preliminary whose definition has not completed yet.
    pub fn is_pending(&self, id: TypeId) -> bool {
        match self.get(id) {
            SymbolType::Placeholder(p) => {
                p.rebinding_allowed && p.reference.is_some_and(|r| self.is_ignore(self.peel(r)))
            }
            _ => false,
        }
    }

    /// Bind a preliminary to the real type of its field, and give every copy
    /// forked from it in the meantime the matching copy of `real`.
    ///
    /// Copies of copies made while resolving are left bound to `Ignore`.
    pub fn complete_preliminary(&mut self, cell: TypeId, real: TypeId) {
        self.bind(cell, real);
        let Some(copies) = self.deferred.remove(&cell) else {
            return;
        };
        for DeferredFork { copy, mut memo } in copies {
            let target = if self.is_complete(real) { real } else { self.fork_with(real, &mut memo) };
            self.bind(copy, target);
        }
    }

    /// Deep-copy the graph reachable from `id`.
    pub fn fork(&mut self, id: TypeId) -> TypeId {
        let mut memo = HashMap::new();
        self.fork_with(id, &mut memo)
    }

    /// Fork through a caller-owned memo so several roots can share one copy
    /// of any node they have in common.
    pub fn fork_with(&mut self, id: TypeId, memo: &mut HashMap<TypeId, TypeId>) -> TypeId {
        if let Some(copy) = memo.get(&id) {
            return *copy;
        }
        match self.get(id).clone() {
            SymbolType::Ignore | SymbolType::Unique(_) => id,
            SymbolType::Placeholder(p) => {
                let pending = self.is_pending(id);
                let copy = self.alloc(SymbolType::Placeholder(Placeholder { reference: None, ..p.clone() }));
                memo.insert(id, copy);
                if pending {
                    self.deferred.entry(id).or_default().push(DeferredFork { copy, memo: memo.clone() });
                }
                if let Some(reference) = p.reference {
                    let forked = self.fork_with(reference, memo);
                    if let SymbolType::Placeholder(cell) = self.get_mut(copy) {
                        cell.reference = Some(forked);
                    }
                }
                copy
            }
            SymbolType::Composite(c) => {
                // Register the unfinished copy first so cycles land on it.
                let copy = self.alloc(SymbolType::Composite(c.clone()));
                memo.insert(id, copy);
                let placeholders = c.placeholders.iter()
                    .map(|(n, t)| (n.clone(), self.fork_with(*t, memo)))
                    .collect();
                let fields = c.fields.iter()
                    .map(|(n, t)| (n.clone(), self.fork_with(*t, memo)))
                    .collect();
                let traits = c.traits.iter().map(|t| self.fork_with(*t, memo)).collect();
                *self.get_mut(copy) = SymbolType::Composite(CompositeType {
                    id: c.id,
                    fields,
                    placeholders,
                    traits,
                });
                copy
            }
            SymbolType::Function(f) => {
                let copy = self.alloc(SymbolType::Function(f.clone()));
                memo.insert(id, copy);
                let placeholders = f.placeholders.iter()
                    .map(|(n, t)| (n.clone(), self.fork_with(*t, memo)))
                    .collect();
                let params = f.params.iter().map(|t| self.fork_with(*t, memo)).collect();
                let return_type = self.fork_with(f.return_type, memo);
                *self.get_mut(copy) = SymbolType::Function(FunctionType {
                    params,
                    return_type,
                    placeholders,
                    optional_params: f.optional_params,
                });
                copy
            }
        }
    }

    /// Instantiate a generic composite with concrete arguments.
    ///
    /// When the arguments are the type's own placeholders the original is
    /// returned unchanged so self-references stay a graph cycle.
    pub fn instantiate(&mut self, id: TypeId, args: &[TypeId]) -> TypeId {
        let own: Vec<TypeId> = match self.get(id) {
            SymbolType::Composite(c) => c.placeholders.iter().map(|(_, t)| *t).collect(),
            SymbolType::Function(f) => f.placeholders.iter().map(|(_, t)| *t).collect(),
            _ => return id,
        };
        if own.is_empty() || own.as_slice() == args {
            return id;
        }
        let copy = self.fork(id);
        let forked: Vec<TypeId> = match self.get(copy) {
            SymbolType::Composite(c) => c.placeholders.iter().map(|(_, t)| *t).collect(),
            SymbolType::Function(f) => f.placeholders.iter().map(|(_, t)| *t).collect(),
            _ => Vec::new(),
        };
        for (slot, arg) in forked.into_iter().zip(args.iter()) {
            self.bind(slot, *arg);
        }
        copy
    }

    pub fn display(&self, id: TypeId) -> String {
        let mut out = String::new();
        let mut visiting = HashSet::new();
        self.write_type(id, &mut out, &mut visiting);
        out
    }

    fn write_type(&self, id: TypeId, out: &mut String, visiting: &mut HashSet<TypeId>) {
        let id = self.peel(id);
        match self.get(id) {
            SymbolType::Ignore => out.push('?'),
            SymbolType::Unique(i) => out.push_str(&format!("'{i}")),
            SymbolType::Placeholder(p) => out.push_str(&p.name),
            SymbolType::Composite(c) => {
                out.push_str(&c.id);
                if !c.placeholders.is_empty() {
                    if !visiting.insert(id) {
                        out.push_str("<..>");
                        return;
                    }
                    out.push('<');
                    for (i, (_, t)) in c.placeholders.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        self.write_type(*t, out, visiting);
                    }
                    out.push('>');
                    visiting.remove(&id);
                }
            }
            SymbolType::Function(f) => {
                if !visiting.insert(id) {
                    out.push_str("Function(..)");
                    return;
                }
                out.push_str("Function");
                if !f.placeholders.is_empty() {
                    let names: Vec<&str> = f.placeholders.iter().map(|(n, _)| n.as_str()).collect();
                    out.push_str(&format!("<{}>", names.join(", ")));
                }
                out.push('(');
                for (i, p) in f.params.iter().enumerate() {
                    if i > 0 {
                        out.push_str(", ");
                    }
                    self.write_type(*p, out, visiting);
                }
                out.push_str(") -> ");
                self.write_type(f.return_type, out, visiting);
                visiting.remove(&id);
            }
        }
    }
}
