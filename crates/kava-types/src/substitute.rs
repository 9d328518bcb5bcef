//! Type-parameter substitution.
//!
//! A `Substitutor` replaces type-parameter uses inside a type. Every entry
//! point distinguishes "no change" exactly: `substitute_or_none` returns
//! `None` if and only if the result would be the input `TypeId`, which lets
//! callers keep the original object and take reference-equality fast paths.
//!
//! Substitutors compose with `chain`: `a.chain(b)` applies `a` first and then
//! `b` to the result, the shape produced when a member is viewed through two
//! levels of inheritance.

use crate::intern::TypeInterner;
use crate::types::{ClassType, FlexibleType, TypeData, TypeId, TypeParamId};
use rustc_hash::FxHashMap;
use std::sync::Arc;

/// A mapping from type-parameter identity to replacement type.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeSubstitution {
    map: FxHashMap<TypeParamId, TypeId>,
}

impl TypeSubstitution {
    pub fn new() -> Self {
        Self::default()
    }

    /// Pair up declared parameters with arguments; extra entries on either side are ignored.
    pub fn from_args(params: &[TypeParamId], args: &[TypeId]) -> Self {
        let map = params
            .iter()
            .zip(args)
            .map(|(&param, &arg)| (param, arg))
            .collect();
        Self { map }
    }

    pub fn insert(&mut self, param: TypeParamId, ty: TypeId) {
        self.map.insert(param, ty);
    }

    pub fn get(&self, param: TypeParamId) -> Option<TypeId> {
        self.map.get(&param).copied()
    }

    pub fn len(&self) -> usize {
        self.map.len()
    }

    pub fn is_empty(&self) -> bool {
        self.map.is_empty()
    }
}

/// A composable substitution.
#[derive(Clone, Debug, Default)]
pub enum Substitutor {
    /// Identity.
    #[default]
    Empty,
    Map(Arc<TypeSubstitution>),
    /// Layers applied left to right. Never nested, never contains `Empty`.
    Chained(Arc<[Substitutor]>),
}

impl Substitutor {
    pub fn from_map(substitution: TypeSubstitution) -> Self {
        if substitution.is_empty() {
            Substitutor::Empty
        } else {
            Substitutor::Map(Arc::new(substitution))
        }
    }

    pub fn is_empty(&self) -> bool {
        matches!(self, Substitutor::Empty)
    }

    /// Apply `self`, then `next`.
    pub fn chain(&self, next: &Substitutor) -> Substitutor {
        match (self, next) {
            (Substitutor::Empty, other) | (other, Substitutor::Empty) => other.clone(),
            _ => {
                let mut layers: Vec<Substitutor> = Vec::new();
                self.push_layers(&mut layers);
                next.push_layers(&mut layers);
                Substitutor::Chained(layers.into())
            }
        }
    }

    fn push_layers(&self, out: &mut Vec<Substitutor>) {
        match self {
            Substitutor::Empty => {}
            Substitutor::Map(_) => out.push(self.clone()),
            Substitutor::Chained(layers) => out.extend(layers.iter().cloned()),
        }
    }

    /// Substitute into `ty`; `None` means the result is exactly `ty`.
    pub fn substitute_or_none(&self, db: &TypeInterner, ty: TypeId) -> Option<TypeId> {
        let result = match self {
            Substitutor::Empty => return None,
            Substitutor::Map(map) => substitute_with_map(db, map, ty),
            Substitutor::Chained(layers) => layers
                .iter()
                .fold(ty, |current, layer| layer.substitute_or_self(db, current)),
        };
        (result != ty).then_some(result)
    }

    pub fn substitute_or_self(&self, db: &TypeInterner, ty: TypeId) -> TypeId {
        self.substitute_or_none(db, ty).unwrap_or(ty)
    }
}

impl PartialEq for Substitutor {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Substitutor::Empty, Substitutor::Empty) => true,
            (Substitutor::Map(a), Substitutor::Map(b)) => Arc::ptr_eq(a, b) || a == b,
            (Substitutor::Chained(a), Substitutor::Chained(b)) => a == b,
            _ => false,
        }
    }
}

fn substitute_with_map(db: &TypeInterner, map: &TypeSubstitution, ty: TypeId) -> TypeId {
    let Some(data) = db.lookup(ty) else {
        return ty;
    };
    match data {
        TypeData::Error => ty,
        TypeData::TypeParameter(param) => match map.get(param.param) {
            // `T?` with `T := X` is `X?`; `T` with `T := X` is exactly `X`.
            Some(replacement) if param.nullable => db.with_nullability(replacement, true),
            Some(replacement) => replacement,
            None => ty,
        },
        TypeData::DefinitelyNotNull(inner) => {
            let substituted = substitute_with_map(db, map, inner);
            if substituted == inner {
                return ty;
            }
            db.definitely_not_null(substituted)
                .unwrap_or_else(|| db.with_nullability(substituted, false))
        }
        TypeData::Class(class) => {
            let mut changed = false;
            let args = class
                .args
                .iter()
                .map(|arg| match arg.ty {
                    Some(arg_ty) => {
                        let substituted = substitute_with_map(db, map, arg_ty);
                        changed |= substituted != arg_ty;
                        arg.with_type(substituted)
                    }
                    None => *arg,
                })
                .collect();
            if !changed {
                return ty;
            }
            db.intern(TypeData::Class(ClassType { args, ..class }))
        }
        TypeData::Flexible(flex) => {
            let lower = substitute_with_map(db, map, flex.lower);
            let upper = substitute_with_map(db, map, flex.upper);
            if lower == flex.lower && upper == flex.upper {
                return ty;
            }
            db.intern(TypeData::Flexible(FlexibleType {
                lower: db.lower_bound_if_flexible(lower),
                upper: db.upper_bound_if_flexible(upper),
                raw: flex.raw,
            }))
        }
    }
}

#[cfg(test)]
#[path = "../tests/substitute_tests.rs"]
mod tests;
