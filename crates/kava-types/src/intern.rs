//! Type interning for structural deduplication.
//!
//! Converts `TypeData` keys into `TypeId` handles. Two calls with equal keys
//! return the same handle, from any thread, for the lifetime of the session.
//!
//! Benefits:
//! - O(1) structural equality (compare `TypeId`s), which the enhancer relies on
//!   both for "no change" detection and for flexible-type collapse
//! - Each unique structure stored once

use crate::types::{
    ClassId, ClassType, FlexibleType, TypeArgs, TypeAttributes, TypeData, TypeId, TypeParamId,
    TypeParamType, TypeProjection,
};
use dashmap::DashMap;
use dashmap::mapref::entry::Entry;
use kava_common::{Atom, ShardedInterner};
use rustc_hash::FxBuildHasher;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, PoisonError, RwLock};
use tracing::trace;

static NEXT_INSTANCE_ID: AtomicU64 = AtomicU64::new(1);

/// Type interning table.
///
/// Key lookups go through a `DashMap`; the id→key table is append-only behind
/// an `RwLock`, so a poisoned lock still guards consistent data.
pub struct TypeInterner {
    instance_id: u64,
    /// String interner for class, annotation and member names
    pub string_interner: ShardedInterner,
    ids: DashMap<TypeData, TypeId, FxBuildHasher>,
    types: RwLock<Vec<TypeData>>,
}

impl Default for TypeInterner {
    fn default() -> Self {
        Self::new()
    }
}

impl TypeInterner {
    /// Create a new type interner with `TypeId::ERROR` pre-registered.
    pub fn new() -> Self {
        let instance_id = NEXT_INSTANCE_ID.fetch_add(1, Ordering::Relaxed);
        trace!(target: "kava::types", instance_id, "TypeInterner::new");
        let string_interner = ShardedInterner::new();
        string_interner.intern_common();

        let ids = DashMap::with_hasher(FxBuildHasher);
        ids.insert(TypeData::Error, TypeId::ERROR);
        TypeInterner {
            instance_id,
            string_interner,
            ids,
            types: RwLock::new(vec![TypeData::Error]),
        }
    }

    /// Intern a string into an Atom.
    pub fn intern_string(&self, s: &str) -> Atom {
        self.string_interner.intern(s)
    }

    /// Resolve an Atom back to its string value.
    pub fn resolve_atom(&self, atom: Atom) -> Arc<str> {
        self.string_interner.resolve(atom)
    }

    /// Intern a fully-qualified class name.
    pub fn class_id(&self, fq_name: &str) -> ClassId {
        ClassId(self.intern_string(fq_name))
    }

    /// Intern a type structure, returning its handle.
    pub fn intern(&self, data: TypeData) -> TypeId {
        if let Some(id) = self.ids.get(&data) {
            return *id;
        }
        match self.ids.entry(data) {
            Entry::Occupied(entry) => *entry.get(),
            Entry::Vacant(entry) => {
                let mut types = self.types.write().unwrap_or_else(PoisonError::into_inner);
                let id = TypeId(types.len() as u32);
                types.push(entry.key().clone());
                drop(types);
                entry.insert(id);
                id
            }
        }
    }

    /// Look up the structure behind a handle.
    pub fn lookup(&self, id: TypeId) -> Option<TypeData> {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(id.0 as usize)
            .cloned()
    }

    /// Number of interned types, `ERROR` included.
    pub fn len(&self) -> usize {
        self.types
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() <= 1
    }

    pub fn instance_id(&self) -> u64 {
        self.instance_id
    }

    // =========================================================================
    // Constructors
    // =========================================================================

    pub fn class_type(
        &self,
        classifier: ClassId,
        args: impl IntoIterator<Item = TypeProjection>,
        nullable: bool,
    ) -> TypeId {
        self.intern(TypeData::Class(ClassType {
            classifier,
            args: args.into_iter().collect(),
            nullable,
            attributes: TypeAttributes::empty(),
        }))
    }

    /// Non-null class type without arguments.
    pub fn simple_class(&self, classifier: ClassId) -> TypeId {
        self.class_type(classifier, std::iter::empty(), false)
    }

    pub fn type_param(&self, param: TypeParamId, nullable: bool) -> TypeId {
        self.intern(TypeData::TypeParameter(TypeParamType {
            param,
            nullable,
            attributes: TypeAttributes::empty(),
        }))
    }

    pub fn flexible(&self, lower: TypeId, upper: TypeId) -> TypeId {
        self.intern(TypeData::Flexible(FlexibleType {
            lower,
            upper,
            raw: false,
        }))
    }

    pub fn raw_flexible(&self, lower: TypeId, upper: TypeId) -> TypeId {
        self.intern(TypeData::Flexible(FlexibleType {
            lower,
            upper,
            raw: true,
        }))
    }

    /// Wrap a type-parameter use into `T & Any`.
    ///
    /// Returns `None` for anything that is not a type-parameter use; a
    /// definitely-not-null type is returned unchanged.
    pub fn definitely_not_null(&self, ty: TypeId) -> Option<TypeId> {
        match self.lookup(ty)? {
            TypeData::TypeParameter(mut param) => {
                param.nullable = false;
                let inner = self.intern(TypeData::TypeParameter(param));
                Some(self.intern(TypeData::DefinitelyNotNull(inner)))
            }
            TypeData::DefinitelyNotNull(_) => Some(ty),
            _ => None,
        }
    }

    /// Same type with the given nullability on its head.
    ///
    /// Flexible types get both bounds adjusted; `T & Any` made nullable
    /// becomes `T?`; error types are returned unchanged.
    pub fn with_nullability(&self, ty: TypeId, nullable: bool) -> TypeId {
        let Some(data) = self.lookup(ty) else {
            return ty;
        };
        match data {
            TypeData::Error => ty,
            TypeData::Class(mut class) => {
                if class.nullable == nullable {
                    return ty;
                }
                class.nullable = nullable;
                self.intern(TypeData::Class(class))
            }
            TypeData::TypeParameter(mut param) => {
                if param.nullable == nullable {
                    return ty;
                }
                param.nullable = nullable;
                self.intern(TypeData::TypeParameter(param))
            }
            TypeData::DefinitelyNotNull(inner) => {
                if nullable {
                    self.with_nullability(inner, true)
                } else {
                    ty
                }
            }
            TypeData::Flexible(flex) => {
                let lower = self.with_nullability(flex.lower, nullable);
                let upper = self.with_nullability(flex.upper, nullable);
                if lower == flex.lower && upper == flex.upper {
                    return ty;
                }
                self.intern(TypeData::Flexible(FlexibleType {
                    lower,
                    upper,
                    raw: flex.raw,
                }))
            }
        }
    }

    /// Same simple type with extra attributes merged in.
    pub fn with_attributes(&self, ty: TypeId, extra: TypeAttributes) -> TypeId {
        let Some(data) = self.lookup(ty) else {
            return ty;
        };
        match data {
            TypeData::Class(mut class) if !class.attributes.contains(extra) => {
                class.attributes |= extra;
                self.intern(TypeData::Class(class))
            }
            TypeData::TypeParameter(mut param) if !param.attributes.contains(extra) => {
                param.attributes |= extra;
                self.intern(TypeData::TypeParameter(param))
            }
            TypeData::Flexible(flex) => {
                let lower = self.with_attributes(flex.lower, extra);
                let upper = self.with_attributes(flex.upper, extra);
                if lower == flex.lower && upper == flex.upper {
                    return ty;
                }
                self.intern(TypeData::Flexible(FlexibleType {
                    lower,
                    upper,
                    raw: flex.raw,
                }))
            }
            _ => ty,
        }
    }

    // =========================================================================
    // Queries
    // =========================================================================

    /// Whether the head of a simple type is marked `?`.
    ///
    /// For a flexible type this answers for the lower bound.
    pub fn is_marked_nullable(&self, ty: TypeId) -> bool {
        match self.lookup(ty) {
            Some(TypeData::Class(class)) => class.nullable,
            Some(TypeData::TypeParameter(param)) => param.nullable,
            Some(TypeData::Flexible(flex)) => self.is_marked_nullable(flex.lower),
            _ => false,
        }
    }

    pub fn lower_bound_if_flexible(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            Some(TypeData::Flexible(flex)) => flex.lower,
            _ => ty,
        }
    }

    pub fn upper_bound_if_flexible(&self, ty: TypeId) -> TypeId {
        match self.lookup(ty) {
            Some(TypeData::Flexible(flex)) => flex.upper,
            _ => ty,
        }
    }

    /// Type arguments of the head; a flexible type answers with its lower bound.
    pub fn type_arguments(&self, ty: TypeId) -> TypeArgs {
        match self.lookup(ty) {
            Some(TypeData::Class(class)) => class.args,
            Some(TypeData::Flexible(flex)) => self.type_arguments(flex.lower),
            _ => TypeArgs::new(),
        }
    }

    /// Classifier of the head, if it is a class reference.
    pub fn classifier(&self, ty: TypeId) -> Option<ClassId> {
        match self.lookup(ty)? {
            TypeData::Class(class) => Some(class.classifier),
            TypeData::Flexible(flex) => self.classifier(flex.lower),
            _ => None,
        }
    }

    /// Type parameter of the head, looking through `T & Any`.
    pub fn type_param_of(&self, ty: TypeId) -> Option<TypeParamId> {
        match self.lookup(ty)? {
            TypeData::TypeParameter(param) => Some(param.param),
            TypeData::DefinitelyNotNull(inner) => self.type_param_of(inner),
            _ => None,
        }
    }

    pub fn attributes(&self, ty: TypeId) -> TypeAttributes {
        match self.lookup(ty) {
            Some(TypeData::Class(class)) => class.attributes,
            Some(TypeData::TypeParameter(param)) => param.attributes,
            _ => TypeAttributes::empty(),
        }
    }
}

#[cfg(test)]
#[path = "../tests/intern_tests.rs"]
mod tests;
