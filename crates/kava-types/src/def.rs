//! Classifier storage: classes and type parameters known to the session.
//!
//! The store answers the two questions the core asks about classifiers:
//!
//! - does a class id resolve at all (unresolvable classifiers become
//!   `TypeId::ERROR` instead of being enhanced)
//! - what are a type parameter's name and bounds (bounds drive the
//!   definitely-not-null promotion and get substituted when a member's type
//!   parameters are recreated for a substitution override)
//!
//! Uses `DashMap` for concurrent access from multiple resolution threads.

use crate::intern::TypeInterner;
use crate::platform::PlatformClassMap;
use crate::types::{ClassId, TypeId, TypeParamId};
use dashmap::DashMap;
use kava_common::Atom;
use std::sync::atomic::{AtomicU32, AtomicU64, Ordering};
use tracing::trace;

/// Global counter for assigning unique instance IDs to `ClassifierStore` instances.
static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// A registered class.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ClassInfo {
    pub id: ClassId,
    /// Declared type parameters, in order.
    pub type_params: Vec<TypeParamId>,
}

/// A registered type parameter.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct TypeParamInfo {
    pub name: Atom,
    /// Upper bounds. Empty means the implicit `Any?`.
    pub bounds: Vec<TypeId>,
}

/// Thread-safe storage for classes and type parameters.
pub struct ClassifierStore {
    instance_id: u64,
    classes: DashMap<ClassId, ClassInfo>,
    type_params: DashMap<TypeParamId, TypeParamInfo>,
    next_type_param: AtomicU32,
}

impl Default for ClassifierStore {
    fn default() -> Self {
        Self::new()
    }
}

impl ClassifierStore {
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::SeqCst);
        trace!(target: "kava::types", instance_id, "ClassifierStore::new");
        Self {
            instance_id,
            classes: DashMap::new(),
            type_params: DashMap::new(),
            next_type_param: AtomicU32::new(0),
        }
    }

    /// Register every Kotlin class the platform map can produce.
    ///
    /// Each generic class gets fresh type parameters with the implicit bound.
    pub fn register_platform_classes(&self, interner: &TypeInterner, map: &PlatformClassMap) {
        for &(class, arity) in map.kotlin_classes() {
            if self.contains_class(class) {
                continue;
            }
            let type_params = (0..arity)
                .map(|i| self.fresh_type_param(interner.intern_string(&format!("T{i}")), Vec::new()))
                .collect();
            self.register_class(ClassInfo {
                id: class,
                type_params,
            });
        }
    }

    /// Register a class; a later registration for the same id replaces it.
    pub fn register_class(&self, info: ClassInfo) {
        trace!(
            target: "kava::types",
            instance_id = self.instance_id,
            class = info.id.0.0,
            arity = info.type_params.len(),
            "ClassifierStore::register_class"
        );
        self.classes.insert(info.id, info);
    }

    pub fn contains_class(&self, id: ClassId) -> bool {
        self.classes.contains_key(&id)
    }

    pub fn get_class(&self, id: ClassId) -> Option<ClassInfo> {
        self.classes.get(&id).map(|r| r.clone())
    }

    pub fn class_type_params(&self, id: ClassId) -> Option<Vec<TypeParamId>> {
        self.classes.get(&id).map(|r| r.type_params.clone())
    }

    /// Allocate a type parameter with a fresh identity.
    pub fn fresh_type_param(&self, name: Atom, bounds: Vec<TypeId>) -> TypeParamId {
        let id = TypeParamId(self.next_type_param.fetch_add(1, Ordering::SeqCst));
        self.type_params.insert(id, TypeParamInfo { name, bounds });
        id
    }

    pub fn type_param(&self, id: TypeParamId) -> Option<TypeParamInfo> {
        self.type_params.get(&id).map(|r| r.clone())
    }

    pub fn type_param_name(&self, id: TypeParamId) -> Option<Atom> {
        self.type_params.get(&id).map(|r| r.name)
    }

    pub fn type_param_bounds(&self, id: TypeParamId) -> Vec<TypeId> {
        self.type_params
            .get(&id)
            .map(|r| r.bounds.clone())
            .unwrap_or_default()
    }

    /// Replace the bounds of an already-allocated type parameter.
    pub fn set_type_param_bounds(&self, id: TypeParamId, bounds: Vec<TypeId>) {
        if let Some(mut entry) = self.type_params.get_mut(&id) {
            entry.bounds = bounds;
        }
    }

    pub fn class_count(&self) -> usize {
        self.classes.len()
    }

    pub fn type_param_count(&self) -> usize {
        self.type_params.len()
    }
}

#[cfg(test)]
#[path = "../tests/def_tests.rs"]
mod tests;
