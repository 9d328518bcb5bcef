//! Type enhancement.
//!
//! Walks a resolved type in depth-first index order and applies the qualifier
//! table node by node. Flexible types enhance each bound separately and then
//! collapse to a simple type when both bounds agree. The walk returns `None`
//! when nothing changed, so callers can keep the original `TypeId`.

use kava_common::limits::NODE_TABLE_INLINE;
use kava_types::{
    ClassId, ClassType, TypeArgs, TypeAttributes, TypeData, TypeFormatter, TypeId, TypeInterner,
    TypeParamId, TypeParamType,
};
use smallvec::SmallVec;
use tracing::trace;

use crate::env::EnhancementEnv;
use crate::qualifiers::{
    IndexedQualifiers, MutabilityQualifier, NullabilityQualifier, TypeComponentPosition,
    TypeQualifiers,
};

pub type SubtreeSizes = SmallVec<[usize; NODE_TABLE_INLINE]>;

/// Apply `qualifiers` to `ty`. Returns `None` when the result would be
/// identical to the input.
///
/// # Panics
///
/// If a flexible type's bounds have differently shaped argument trees.
pub fn enhance(env: &EnhancementEnv<'_>, ty: TypeId, qualifiers: &IndexedQualifiers) -> Option<TypeId> {
    let sizes = compute_subtree_sizes(env.db, ty);
    let enhancer = TypeEnhancer {
        env,
        qualifiers,
        sizes: &sizes,
    };
    let result = enhancer.enhance_possibly_flexible(ty, 0);
    trace!(
        target: "kava::enhance",
        nodes = sizes.len(),
        changed = result.is_some(),
        "enhance"
    );
    result
}

/// Node count of every subtree, indexed like `flatten_type_tree`.
pub fn compute_subtree_sizes(db: &TypeInterner, ty: TypeId) -> SubtreeSizes {
    let mut sizes = SubtreeSizes::new();
    push_subtree_size(db, Some(ty), &mut sizes);
    sizes
}

fn push_subtree_size(db: &TypeInterner, ty: Option<TypeId>, sizes: &mut SubtreeSizes) -> usize {
    let index = sizes.len();
    sizes.push(1);
    let Some(ty) = ty else {
        return 1;
    };
    if let Some(TypeData::Flexible(flex)) = db.lookup(ty) {
        assert!(
            same_shape(db, Some(flex.lower), Some(flex.upper)),
            "flexible bounds have different argument shapes: {}",
            TypeFormatter::new(db).format(ty)
        );
    }
    let mut size = 1;
    for arg in db.type_arguments(ty) {
        size += push_subtree_size(db, arg.ty, sizes);
    }
    sizes[index] = size;
    size
}

fn same_shape(db: &TypeInterner, a: Option<TypeId>, b: Option<TypeId>) -> bool {
    match (a, b) {
        (None, None) => true,
        (Some(a), Some(b)) => {
            let a_args = db.type_arguments(a);
            let b_args = db.type_arguments(b);
            a_args.len() == b_args.len()
                && a_args
                    .iter()
                    .zip(b_args.iter())
                    .all(|(x, y)| same_shape(db, x.ty, y.ty))
        }
        _ => false,
    }
}

struct TypeEnhancer<'a, 'env> {
    env: &'a EnhancementEnv<'env>,
    qualifiers: &'a IndexedQualifiers,
    sizes: &'a SubtreeSizes,
}

impl TypeEnhancer<'_, '_> {
    fn enhance_possibly_flexible(&self, ty: TypeId, index: usize) -> Option<TypeId> {
        let db = self.env.db;
        match db.lookup(ty)? {
            TypeData::Error => None,
            TypeData::Flexible(flex) => {
                let lower =
                    self.enhance_inflexible(flex.lower, TypeComponentPosition::FlexibleLower, index);
                let upper =
                    self.enhance_inflexible(flex.upper, TypeComponentPosition::FlexibleUpper, index);
                if lower.is_none() && upper.is_none() {
                    return None;
                }
                let lower = lower.unwrap_or(flex.lower);
                let upper = upper.unwrap_or(flex.upper);
                if flex.raw {
                    return Some(db.raw_flexible(lower, upper));
                }
                let is_not_null_type_parameter =
                    self.qualifiers.get(index).is_not_null_type_parameter;
                Some(self.flexible_or_simple(lower, upper, is_not_null_type_parameter))
            }
            _ => self.enhance_inflexible(ty, TypeComponentPosition::Inflexible, index),
        }
    }

    fn enhance_inflexible(
        &self,
        ty: TypeId,
        position: TypeComponentPosition,
        index: usize,
    ) -> Option<TypeId> {
        let db = self.env.db;
        let qualifiers = self.qualifiers.get(index);
        let (nullability, warning) = applied_nullability(qualifiers);

        match db.lookup(ty)? {
            TypeData::Class(class) => {
                let classifier = self.enhance_mutability(class.classifier, qualifiers, position);
                let nullable = nullability.map_or(class.nullable, |n| n == NullabilityQualifier::Nullable);
                let attributes = enhanced_attributes(class.attributes, nullability, warning);

                let mut args = TypeArgs::with_capacity(class.args.len());
                let mut args_changed = false;
                let mut global_index = index + 1;
                for arg in &class.args {
                    let arg_index = global_index;
                    global_index += self.sizes.get(arg_index).copied().unwrap_or(1);
                    match arg.ty.and_then(|arg_ty| self.enhance_possibly_flexible(arg_ty, arg_index)) {
                        Some(enhanced) => {
                            args_changed = true;
                            args.push(arg.with_type(enhanced));
                        }
                        None => args.push(*arg),
                    }
                }

                if classifier == class.classifier
                    && nullable == class.nullable
                    && attributes == class.attributes
                    && !args_changed
                {
                    return None;
                }
                Some(db.intern(TypeData::Class(ClassType {
                    classifier,
                    args,
                    nullable,
                    attributes,
                })))
            }
            TypeData::TypeParameter(param) => {
                let nullable = nullability.map_or(param.nullable, |n| n == NullabilityQualifier::Nullable);
                let attributes = enhanced_attributes(param.attributes, nullability, warning);
                if nullable == param.nullable && attributes == param.attributes {
                    return None;
                }
                Some(db.intern(TypeData::TypeParameter(TypeParamType {
                    param: param.param,
                    nullable,
                    attributes,
                })))
            }
            // `T & Any` is already as precise as enhancement can make it.
            TypeData::DefinitelyNotNull(_) | TypeData::Error => None,
            TypeData::Flexible(_) => {
                debug_assert!(false, "flexible type used as a flexible bound");
                None
            }
        }
    }

    fn enhance_mutability(
        &self,
        classifier: ClassId,
        qualifiers: TypeQualifiers,
        position: TypeComponentPosition,
    ) -> ClassId {
        let platform = self.env.platform;
        let mapped = match (position, qualifiers.mutability) {
            (TypeComponentPosition::FlexibleLower, Some(MutabilityQualifier::ReadOnly)) => {
                platform.mutable_to_read_only(classifier)
            }
            (TypeComponentPosition::FlexibleUpper, Some(MutabilityQualifier::Mutable)) => {
                platform.read_only_to_mutable(classifier)
            }
            _ => None,
        };
        mapped.unwrap_or(classifier)
    }

    /// Collapse enhanced bounds: identical bounds become one simple type, and
    /// a collapsed not-null type-parameter use whose parameter admits null
    /// becomes `T & Any`. Bounds that stay apart stay flexible.
    fn flexible_or_simple(
        &self,
        lower: TypeId,
        upper: TypeId,
        is_not_null_type_parameter: bool,
    ) -> TypeId {
        let db = self.env.db;
        if lower != upper {
            return db.flexible(lower, upper);
        }
        if is_not_null_type_parameter
            && let Some(TypeData::TypeParameter(param)) = db.lookup(lower)
            && !param.nullable
            && self.type_parameter_admits_null(param.param)
            && let Some(dnn) = db.definitely_not_null(lower)
        {
            return dnn;
        }
        lower
    }

    /// A parameter admits null when it has no declared bound (implicitly
    /// `Any?`), or one of its bounds is nullable or another type parameter.
    fn type_parameter_admits_null(&self, param: TypeParamId) -> bool {
        let db = self.env.db;
        let bounds = self.env.store.type_param_bounds(param);
        bounds.is_empty()
            || bounds.iter().any(|&bound| {
                db.type_param_of(db.lower_bound_if_flexible(bound)).is_some()
                    || db.is_marked_nullable(db.upper_bound_if_flexible(bound))
            })
    }
}

/// Nullability to apply and whether it was downgraded to a warning.
fn applied_nullability(qualifiers: TypeQualifiers) -> (Option<NullabilityQualifier>, bool) {
    match qualifiers.nullability {
        Some(_) if qualifiers.is_warning_only => (None, true),
        nullability => (nullability, false),
    }
}

fn enhanced_attributes(
    current: TypeAttributes,
    nullability: Option<NullabilityQualifier>,
    warning: bool,
) -> TypeAttributes {
    let mut attributes = current;
    if nullability == Some(NullabilityQualifier::NotNull) {
        attributes |= TypeAttributes::ENHANCED_NULLABILITY;
    }
    if warning {
        attributes |= TypeAttributes::NULLABILITY_WARNING;
    }
    attributes
}

#[cfg(test)]
#[path = "../tests/enhancer_tests.rs"]
mod tests;
