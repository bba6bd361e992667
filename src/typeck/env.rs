use std::collections::HashMap;

use tracing::{debug, trace};

use crate::diagnostics::{internal_error, InternalError};
use super::types::{TypeArena, TypeId};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct EntryFlags {
    pub readonly: bool,
    pub stdlib: bool,
}

impl EntryFlags {
    pub const STDLIB: EntryFlags = EntryFlags { readonly: true, stdlib: true };
}

/// Partial flags applied to every entry set while the override is active.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct FlagOverride {
    pub readonly: Option<bool>,
    pub stdlib: Option<bool>,
}

impl FlagOverride {
    pub const STDLIB: FlagOverride = FlagOverride { readonly: Some(true), stdlib: Some(true) };
}

#[derive(Debug, Clone)]
pub struct Entry<V> {
    pub value: V,
    pub flags: EntryFlags,
}

#[derive(Debug, Clone)]
struct Scope<V> {
    types: HashMap<String, Entry<TypeId>>,
    symbols: HashMap<String, Entry<V>>,
    /// Set for function bodies.
    return_type: Option<TypeId>,
    is_loop: bool,
    overrides: Option<FlagOverride>,
}

impl<V> Scope<V> {
    fn new(return_type: Option<TypeId>, is_loop: bool) -> Self {
        Self {
            types: HashMap::new(),
            symbols: HashMap::new(),
            return_type,
            is_loop,
            overrides: None,
        }
    }
}

/// Saved table state. Scopes are cloned but the types they name are arena
/// handles, so a type mutated after the snapshot is mutated in both.
#[derive(Debug, Clone)]
pub struct Snapshot<V> {
    scopes: Vec<Scope<V>>,
    global_override: FlagOverride,
    ignore_runtime_bindings: bool,
}

/// A lexical scope stack with a separate runtime-binding namespace.
///
/// `V` is what a symbol maps to: a `TypeId` during analysis, a runtime value
/// during interpretation.
#[derive(Debug, Clone)]
pub struct ScopedTable<V> {
    scopes: Vec<Scope<V>>,
    runtime_types: HashMap<String, Entry<TypeId>>,
    runtime_symbols: HashMap<String, Entry<V>>,
    ignore_runtime_bindings: bool,
    global_override: FlagOverride,
}

pub type TypeTable = ScopedTable<TypeId>;

impl<V: Clone> Default for ScopedTable<V> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V: Clone> ScopedTable<V> {
    pub fn new() -> Self {
        Self {
            scopes: vec![Scope::new(None, false)],
            runtime_types: HashMap::new(),
            runtime_symbols: HashMap::new(),
            ignore_runtime_bindings: true,
            global_override: FlagOverride::default(),
        }
    }

    pub fn depth(&self) -> usize {
        self.scopes.len()
    }

    pub fn push_scope(&mut self, return_type: Option<TypeId>, is_loop: bool) {
        self.scopes.push(Scope::new(return_type, is_loop));
        debug!(depth = self.scopes.len(), is_loop, "push scope");
    }

    pub fn pop_scope(&mut self) {
        if self.scopes.len() <= 1 {
            internal_error(InternalError::PopLastScope);
        }
        self.scopes.pop();
        debug!(depth = self.scopes.len(), "pop scope");
    }

    fn current(&mut self) -> &mut Scope<V> {
        let last = self.scopes.len() - 1;
        &mut self.scopes[last]
    }

    /// Flags for a new entry: scoped override, then global override, then false.
    pub fn effective_flags(&self) -> EntryFlags {
        let scoped = |pick: fn(&FlagOverride) -> Option<bool>| {
            self.scopes.iter().rev().find_map(|s| s.overrides.as_ref().and_then(pick))
        };
        let readonly = scoped(|o| o.readonly).or(self.global_override.readonly).unwrap_or(false);
        let stdlib = scoped(|o| o.stdlib).or(self.global_override.stdlib).unwrap_or(false);
        EntryFlags { readonly, stdlib }
    }

    pub fn set_global_flag_override(&mut self, flags: FlagOverride) {
        debug!(?flags, "global flag override");
        self.global_override = flags;
    }

    /// Override flags until the current scope is popped.
    pub fn set_scoped_flag_override(&mut self, flags: FlagOverride) {
        debug!(?flags, depth = self.scopes.len(), "scoped flag override");
        self.current().overrides = Some(flags);
    }

    pub fn clear_flag_overrides(&mut self) {
        self.global_override = FlagOverride::default();
        for scope in &mut self.scopes {
            scope.overrides = None;
        }
    }

    pub fn ignores_runtime_bindings(&self) -> bool {
        self.ignore_runtime_bindings
    }

    pub fn set_ignore_runtime_bindings(&mut self, ignore: bool) {
        self.ignore_runtime_bindings = ignore;
    }

    pub fn set_type(&mut self, name: &str, ty: TypeId) {
        let flags = self.effective_flags();
        self.set_type_flagged(name, ty, flags);
    }

    pub fn set_type_flagged(&mut self, name: &str, ty: TypeId, flags: EntryFlags) {
        let scope = self.current();
        if scope.types.get(name).is_some_and(|e| e.flags.readonly) {
            internal_error(InternalError::ReadonlyOverwrite { name: name.to_string() });
        }
        trace!(name, ?flags, "set type");
        scope.types.insert(name.to_string(), Entry { value: ty, flags });
    }

    pub fn set_symbol(&mut self, name: &str, value: V) {
        let flags = self.effective_flags();
        self.set_symbol_flagged(name, value, flags);
    }

    pub fn set_symbol_flagged(&mut self, name: &str, value: V, flags: EntryFlags) {
        let scope = self.current();
        if scope.symbols.get(name).is_some_and(|e| e.flags.readonly) {
            internal_error(InternalError::ReadonlyOverwrite { name: name.to_string() });
        }
        trace!(name, ?flags, "set symbol");
        scope.symbols.insert(name.to_string(), Entry { value, flags });
    }

    pub fn set_runtime_type(&mut self, name: &str, ty: TypeId) {
        self.runtime_types.insert(name.to_string(), Entry { value: ty, flags: EntryFlags::STDLIB });
    }

    pub fn set_runtime_symbol(&mut self, name: &str, value: V) {
        self.runtime_symbols.insert(name.to_string(), Entry { value, flags: EntryFlags::STDLIB });
    }

    pub fn find_type(&self, name: &str) -> Option<&Entry<TypeId>> {
        if !self.ignore_runtime_bindings {
            if let Some(entry) = self.runtime_types.get(name) {
                return Some(entry);
            }
        }
        self.scopes.iter().rev().find_map(|s| s.types.get(name))
    }

    pub fn find_symbol(&self, name: &str) -> Option<&Entry<V>> {
        if !self.ignore_runtime_bindings {
            if let Some(entry) = self.runtime_symbols.get(name) {
                return Some(entry);
            }
        }
        self.scopes.iter().rev().find_map(|s| s.symbols.get(name))
    }

    pub fn find_type_in_current_scope(&self, name: &str) -> Option<&Entry<TypeId>> {
        self.scopes.last().and_then(|s| s.types.get(name))
    }

    pub fn find_symbol_in_current_scope(&self, name: &str) -> Option<&Entry<V>> {
        self.scopes.last().and_then(|s| s.symbols.get(name))
    }

    /// Replace the value of an existing symbol in the scope that owns it.
    /// Returns false when no scope declares `name`.
    pub fn assign_symbol(&mut self, name: &str, value: V) -> bool {
        match self.scopes.iter_mut().rev().find_map(|s| s.symbols.get_mut(name)) {
            Some(entry) => {
                entry.value = value;
                true
            }
            None => false,
        }
    }

    pub fn current_return_type(&self) -> Option<TypeId> {
        self.scopes.iter().rev().find_map(|s| s.return_type)
    }

    pub fn current_scope_is_loop(&self) -> bool {
        self.scopes.last().is_some_and(|s| s.is_loop)
    }

    /// True when a loop encloses the current scope without an intervening
    /// function boundary.
    pub fn inside_loop(&self) -> bool {
        for scope in self.scopes.iter().rev() {
            if scope.is_loop {
                return true;
            }
            if scope.return_type.is_some() {
                return false;
            }
        }
        false
    }

    pub fn create_snapshot(&self) -> Snapshot<V> {
        Snapshot {
            scopes: self.scopes.clone(),
            global_override: self.global_override,
            ignore_runtime_bindings: self.ignore_runtime_bindings,
        }
    }

    /// Restore a snapshot, or with `None` drop everything above the
    /// outermost scope and clear the overrides.
    pub fn reset(&mut self, snapshot: Option<Snapshot<V>>) {
        match snapshot {
            Some(s) => {
                self.scopes = s.scopes;
                self.global_override = s.global_override;
                self.ignore_runtime_bindings = s.ignore_runtime_bindings;
            }
            None => {
                self.scopes.truncate(1);
                self.clear_flag_overrides();
            }
        }
        debug!(depth = self.scopes.len(), "table reset");
    }
}

impl TypeTable {
    /// A table whose outermost scope holds the fundamental types.
    pub fn with_fundamentals(arena: &TypeArena) -> Self {
        let mut table = Self::new();
        for (name, ty) in arena.fundamentals() {
            table.set_type_flagged(name, ty, EntryFlags::STDLIB);
        }
        table
    }
}
