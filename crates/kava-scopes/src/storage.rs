//! Session-owned cache of substitution overrides.
//!
//! One `SubstitutionOverrideCache` exists per scope key. Within a cache every
//! original member has a compute-once slot: the first caller synthesizes the
//! override, concurrent first callers block on the slot and observe the same
//! symbol, and the slot is never invalidated for the life of the session.

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, OnceLock};

use dashmap::DashMap;
use kava_types::{ClassId, TypeId};
use tracing::trace;

use crate::symbols::{CallableSymbol, SymbolId};

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Identity of a substitution scope: the class whose view is taken and the
/// dispatch receiver type supplying the substitution.
///
/// Scopes sharing a key must agree on their substitutor and private-member
/// filtering.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ScopeKey {
    pub owner: ClassId,
    pub dispatch_receiver: TypeId,
}

impl ScopeKey {
    pub const fn new(owner: ClassId, dispatch_receiver: TypeId) -> Self {
        Self {
            owner,
            dispatch_receiver,
        }
    }
}

type Slot = Arc<OnceLock<CallableSymbol>>;

/// Memoized overrides of one scope, one map per member family.
#[derive(Debug, Default)]
pub struct SubstitutionOverrideCache {
    functions: DashMap<SymbolId, Slot>,
    constructors: DashMap<SymbolId, Slot>,
    variables: DashMap<SymbolId, Slot>,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum MemberFamily {
    Functions,
    Constructors,
    Variables,
}

impl SubstitutionOverrideCache {
    fn family(&self, family: MemberFamily) -> &DashMap<SymbolId, Slot> {
        match family {
            MemberFamily::Functions => &self.functions,
            MemberFamily::Constructors => &self.constructors,
            MemberFamily::Variables => &self.variables,
        }
    }

    /// The cached override of `original`, computing it on first access.
    pub fn get_or_compute(
        &self,
        family: MemberFamily,
        original: &CallableSymbol,
        compute: impl FnOnce() -> CallableSymbol,
    ) -> CallableSymbol {
        // Clone the slot out so the shard lock is released before computing.
        let slot = self
            .family(family)
            .entry(original.id)
            .or_default()
            .value()
            .clone();
        let mut computed = false;
        let symbol = slot.get_or_init(|| {
            computed = true;
            compute()
        });
        trace!(
            target: "kava::scopes",
            original = original.id.0,
            result = symbol.id.0,
            ?family,
            hit = !computed,
            "substitution override cache"
        );
        Arc::clone(symbol)
    }

    /// Whether an override for `original` has been computed in this family.
    pub fn contains(&self, family: MemberFamily, original: SymbolId) -> bool {
        self.family(family)
            .get(&original)
            .is_some_and(|slot| slot.get().is_some())
    }

    pub fn len(&self, family: MemberFamily) -> usize {
        self.family(family).len()
    }

    pub fn is_empty(&self) -> bool {
        self.functions.is_empty() && self.constructors.is_empty() && self.variables.is_empty()
    }
}

/// All substitution-override caches of a session, keyed by scope.
#[derive(Debug)]
pub struct FakeOverrideStorage {
    instance_id: u64,
    caches: DashMap<ScopeKey, Arc<SubstitutionOverrideCache>>,
}

impl Default for FakeOverrideStorage {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeOverrideStorage {
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(target: "kava::scopes", instance_id, "FakeOverrideStorage::new");
        Self {
            instance_id,
            caches: DashMap::new(),
        }
    }

    /// The cache for `key`, created empty on first request.
    pub fn cache_for(&self, key: ScopeKey) -> Arc<SubstitutionOverrideCache> {
        let entry = self.caches.entry(key).or_insert_with(|| {
            trace!(
                target: "kava::scopes",
                instance_id = self.instance_id,
                ?key,
                "FakeOverrideStorage::cache_for - new scope cache"
            );
            Arc::default()
        });
        Arc::clone(entry.value())
    }

    pub fn scope_count(&self) -> usize {
        self.caches.len()
    }
}

#[cfg(test)]
#[path = "../tests/storage_tests.rs"]
mod tests;
