//! Overload collection.
//!
//! Scans the relevant arguments of one call and builds the [`OverloadSet`]:
//! the candidates carrying an override, one per runtime type, with subclasses
//! ahead of the classes they specialize.
//!
//! ## Algorithm
//!
//! For each candidate, in input order:
//!
//! 1. Skip it unless the lookup reports an override.
//! 2. Skip it if an entry of the *exact same* type is already present. The
//!    first instance seen for a type is the one kept.
//! 3. Insert it before the first entry whose type it is an instance of, or
//!    append it when no such entry exists.
//!
//! Candidates of unrelated types therefore keep their input order. The scan
//! is quadratic in the number of relevant arguments, which is small.

use tracing::{debug, trace};

use torchfn_core::{OverrideLookup, TypeHash, Value};

/// Ordered, type-distinct list of override candidates for one call.
///
/// Holds borrowed candidates only; it lives as long as the call that built it.
#[derive(Debug, Clone, Default)]
pub struct OverloadSet<'a> {
    entries: Vec<&'a Value>,
}

impl<'a> OverloadSet<'a> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &'a Value> + '_ {
        self.entries.iter().copied()
    }

    pub fn as_slice(&self) -> &[&'a Value] {
        &self.entries
    }

    /// Runtime types of the entries, in order.
    pub fn types(&self) -> impl ExactSizeIterator<Item = TypeHash> + '_ {
        self.entries.iter().map(|entry| entry.type_hash())
    }

    /// Place a candidate known to carry an override.
    ///
    /// Returns `false` when an entry of the same exact type already covers it.
    pub fn insert<L>(&mut self, lookup: &L, candidate: &'a Value) -> bool
    where
        L: OverrideLookup + ?Sized,
    {
        let ty = candidate.type_hash();
        if self.entries.iter().any(|entry| entry.type_hash() == ty) {
            return false;
        }

        let position = self
            .entries
            .iter()
            .position(|entry| lookup.is_instance(candidate, entry.type_hash()))
            .unwrap_or(self.entries.len());
        self.entries.insert(position, candidate);
        true
    }
}

impl<'a> IntoIterator for OverloadSet<'a> {
    type Item = &'a Value;
    type IntoIter = std::vec::IntoIter<&'a Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.entries.into_iter()
    }
}

/// Build the overload set for a call's relevant arguments.
#[cfg_attr(feature = "profiling", profiling::function)]
pub fn collect<'a, L, I>(lookup: &L, relevant: I) -> OverloadSet<'a>
where
    L: OverrideLookup + ?Sized,
    I: IntoIterator<Item = &'a Value>,
{
    let mut overloads = OverloadSet::new();
    for candidate in relevant {
        if !lookup.has_override(candidate) {
            continue;
        }
        if !overloads.insert(lookup, candidate) {
            trace!(ty = %candidate.type_hash(), "type already in overload set");
        }
    }

    if !overloads.is_empty() {
        debug!(
            types = ?overloads.types().map(|ty| lookup.type_name(ty)).collect::<Vec<_>>(),
            "collected overloads"
        );
    }
    overloads
}
