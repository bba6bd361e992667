//! Structural "is assignable to" checks.
//!
//! `check_compatible(supplied, expected)` is directional: a composite is
//! compatible with any trait it declares, not the other way round.

use std::collections::{HashMap, HashSet};

use crate::diagnostics::{internal_error, InternalError};
use super::types::{SymbolType, TypeArena, TypeId};

/// Pairs already assumed compatible during one top-level comparison.
type Memo = HashMap<TypeId, HashSet<TypeId>>;

/// Why a comparison failed. `expected`/`found` are arena handles.
#[derive(Debug, Clone, PartialEq)]
pub enum Mismatch {
    /// Different kinds of type (composite vs function, ...).
    Kind { expected: TypeId, found: TypeId },
    /// Two composites with different nominal ids.
    Nominal { expected: TypeId, found: TypeId },
    PlaceholderCount { expected: usize, found: usize },
    MissingPlaceholder { name: String },
    /// A generic slot is open on one side and concrete on the other, or both
    /// are open but name different parameters.
    UnboundPlaceholder { expected: TypeId, found: TypeId },
    ParameterCount { expected: usize, found: usize },
    Parameter { index: usize, expected: TypeId, found: TypeId },
    ReturnType { expected: TypeId, found: TypeId },
    Unique { expected: TypeId, found: TypeId },
}

impl Mismatch {
    /// One-line explanation suitable for a diagnostic highlight.
    pub fn describe(&self, arena: &TypeArena) -> String {
        match self {
            Mismatch::Kind { expected, found } | Mismatch::Nominal { expected, found } => {
                format!("expected {}, found {}", arena.display(*expected), arena.display(*found))
            }
            Mismatch::PlaceholderCount { expected, found } => {
                format!("expected {expected} type argument(s), found {found}")
            }
            Mismatch::MissingPlaceholder { name } => format!("no type argument named '{name}'"),
            Mismatch::UnboundPlaceholder { expected, found } => format!(
                "generic {} is not interchangeable with {}",
                arena.display(*expected),
                arena.display(*found)
            ),
            Mismatch::ParameterCount { expected, found } => {
                format!("expected {expected} parameter(s), found {found}")
            }
            Mismatch::Parameter { index, expected, found } => format!(
                "parameter {} expected {}, found {}",
                index + 1,
                arena.display(*expected),
                arena.display(*found)
            ),
            Mismatch::ReturnType { expected, found } => format!(
                "return type expected {}, found {}",
                arena.display(*expected),
                arena.display(*found)
            ),
            Mismatch::Unique { .. } => "generic parameters do not line up".to_string(),
        }
    }
}

impl TypeArena {
    /// Is `supplied` assignable where `expected` is required?
    pub fn is_compatible(&mut self, supplied: TypeId, expected: TypeId) -> bool {
        self.check_compatible(supplied, expected).is_ok()
    }

    pub fn check_compatible(&mut self, supplied: TypeId, expected: TypeId) -> Result<(), Mismatch> {
        let mut memo = Memo::new();
        self.compatible(supplied, expected, &mut memo)
    }

    fn compatible(&mut self, a: TypeId, b: TypeId, memo: &mut Memo) -> Result<(), Mismatch> {
        let b = self.peel(b);
        if a == b {
            return Ok(());
        }
        if memo.get(&a).is_some_and(|seen| seen.contains(&b)) {
            return Ok(());
        }
        memo.entry(a).or_default().insert(b);

        if self.is_ignore(a) || self.is_ignore(b) {
            return Ok(());
        }

        match (self.get(a).clone(), self.get(b).clone()) {
            (SymbolType::Placeholder(_), _) | (_, SymbolType::Placeholder(_)) => {
                self.compatible_placeholders(a, b, memo)
            }
            (SymbolType::Function(_), SymbolType::Function(_)) => self.compatible_functions(a, b, memo),
            (SymbolType::Composite(_), SymbolType::Composite(_)) => self.compatible_composites(a, b, memo),
            (SymbolType::Unique(x), SymbolType::Unique(y)) => {
                if x == y {
                    Ok(())
                } else {
                    Err(Mismatch::Unique { expected: b, found: a })
                }
            }
            _ => Err(Mismatch::Kind { expected: b, found: a }),
        }
    }

    fn compatible_placeholders(&mut self, a: TypeId, b: TypeId, memo: &mut Memo) -> Result<(), Mismatch> {
        let pa = self.peel(a);
        let pb = self.peel(b);
        if self.is_ignore(pa) || self.is_ignore(pb) {
            return Ok(());
        }
        let a_open = matches!(self.get(pa), SymbolType::Placeholder(_));
        let b_open = matches!(self.get(pb), SymbolType::Placeholder(_));
        match (a_open, b_open) {
            (false, false) => self.compatible(pa, pb, memo),
            (true, true) => {
                let name = |id: TypeId| self.as_placeholder(id).map(|p| p.name.as_str());
                if pa == pb || name(pa) == name(pb) {
                    Ok(())
                } else {
                    Err(Mismatch::UnboundPlaceholder { expected: b, found: a })
                }
            }
            _ => Err(Mismatch::UnboundPlaceholder { expected: b, found: a }),
        }
    }

    fn compatible_functions(&mut self, a: TypeId, b: TypeId, memo: &mut Memo) -> Result<(), Mismatch> {
        // Binding below must never touch the caller's graph.
        let a = self.fork_if_open(a, memo);
        let b = self.fork_if_open(b, memo);

        let (fa, fb) = match (self.as_function(a), self.as_function(b)) {
            (Some(fa), Some(fb)) => (fa.clone(), fb.clone()),
            _ => return Err(Mismatch::Kind { expected: b, found: a }),
        };
        if fa.params.len() != fb.params.len() {
            return Err(Mismatch::ParameterCount { expected: fb.params.len(), found: fa.params.len() });
        }

        // The return type is the last pseudo-parameter.
        let slots_a: Vec<TypeId> = fa.params.iter().copied().chain(std::iter::once(fa.return_type)).collect();
        let slots_b: Vec<TypeId> = fb.params.iter().copied().chain(std::iter::once(fb.return_type)).collect();

        for (&sa, &sb) in slots_a.iter().zip(slots_b.iter()) {
            match (self.peel_to_open_cell(sa), self.peel_to_open_cell(sb)) {
                (Some(cell), None) => self.bind(cell, sb),
                (None, Some(cell)) => self.bind(cell, sa),
                (Some(ca), Some(cb)) => {
                    let u = self.unique();
                    self.bind(ca, u);
                    if cb != ca {
                        self.bind(cb, u);
                    }
                }
                (None, None) => {}
            }
        }

        let last = slots_a.len() - 1;
        for (index, (&sa, &sb)) in slots_a.iter().zip(slots_b.iter()).enumerate() {
            if self.compatible(sa, sb, memo).is_err() {
                let (expected, found) = (self.peel(sb), self.peel(sa));
                return Err(if index == last {
                    Mismatch::ReturnType { expected, found }
                } else {
                    Mismatch::Parameter { index, expected, found }
                });
            }
        }
        Ok(())
    }

    /// The unbound placeholder cell `id` resolves to, if any.
    fn peel_to_open_cell(&self, id: TypeId) -> Option<TypeId> {
        let peeled = self.peel(id);
        matches!(self.get(peeled), SymbolType::Placeholder(_)).then_some(peeled)
    }

    fn fork_if_open(&mut self, id: TypeId, memo: &mut Memo) -> TypeId {
        if self.is_complete(id) {
            return id;
        }
        let copy = self.fork(id);
        if let Some(assumed) = memo.get(&id).cloned() {
            memo.entry(copy).or_default().extend(assumed);
        }
        copy
    }

    fn compatible_composites(&mut self, a: TypeId, b: TypeId, memo: &mut Memo) -> Result<(), Mismatch> {
        let (ca, cb) = match (self.as_composite(a), self.as_composite(b)) {
            (Some(ca), Some(cb)) => (ca.clone(), cb.clone()),
            _ => return Err(Mismatch::Kind { expected: b, found: a }),
        };

        for &tr in &ca.traits {
            // A failed attempt must not leave assumptions behind for the next trait.
            let mut attempt = memo.clone();
            if self.compatible(tr, b, &mut attempt).is_ok() {
                return Ok(());
            }
        }

        if ca.id != cb.id {
            return Err(Mismatch::Nominal { expected: b, found: a });
        }
        if ca.placeholders.len() != cb.placeholders.len() {
            return Err(Mismatch::PlaceholderCount { expected: cb.placeholders.len(), found: ca.placeholders.len() });
        }
        for (name, pa) in &ca.placeholders {
            let pb = cb.placeholder(name).ok_or_else(|| Mismatch::MissingPlaceholder { name: name.clone() })?;
            self.compatible(*pa, pb, memo)?;
        }

        // Shape only; field types follow from the placeholders compared above.
        let same_shape = ca.fields.len() == cb.fields.len()
            && ca.fields.iter().zip(cb.fields.iter()).all(|((na, _), (nb, _))| na == nb);
        if !same_shape {
            internal_error(InternalError::InconsistentComposite { id: ca.id });
        }
        Ok(())
    }

    /// Bind the open placeholders of `param` (a forked call-site signature
    /// slot) so that it matches `arg`.
    pub fn bind_generic_arguments(&mut self, param: TypeId, arg: TypeId) {
        let mut visited = HashSet::new();
        self.bind_generic_inner(param, arg, &mut visited);
    }

    fn bind_generic_inner(&mut self, param: TypeId, arg: TypeId, visited: &mut HashSet<(TypeId, TypeId)>) {
        if !visited.insert((param, arg)) {
            return;
        }
        if let Some(cell) = self.peel_to_open_cell(param) {
            if self.peel(arg) != cell {
                self.bind(cell, arg);
            }
            return;
        }
        let param = self.peel(param);
        let arg = self.peel(arg);
        match (self.get(param).clone(), self.get(arg).clone()) {
            (SymbolType::Composite(cp), SymbolType::Composite(ca)) => {
                if cp.id == ca.id {
                    for (name, slot) in &cp.placeholders {
                        if let Some(actual) = ca.placeholder(name) {
                            self.bind_generic_inner(*slot, actual, visited);
                        }
                    }
                } else {
                    // Reach through declared traits, e.g. passing a Dog where Named<T> is expected.
                    for tr in &ca.traits {
                        self.bind_generic_inner(param, *tr, visited);
                    }
                }
            }
            (SymbolType::Function(fp), SymbolType::Function(fa)) if fp.params.len() == fa.params.len() => {
                for (p, a) in fp.params.iter().zip(fa.params.iter()) {
                    self.bind_generic_inner(*p, *a, visited);
                }
                self.bind_generic_inner(fp.return_type, fa.return_type, visited);
            }
            _ => {}
        }
    }
}
