//! Per-node qualifier extraction.
//!
//! Both the declared type and every overridden type are flattened into the
//! same depth-first index space so that qualifiers line up node by node.

use kava_common::limits::NODE_TABLE_INLINE;
use kava_types::{TypeData, TypeId};
use smallvec::SmallVec;

use crate::annotations::{Annotation, DefaultQualifierContext, QualifierApplicability};
use crate::env::EnhancementEnv;
use crate::foreign::{
    EnhancedNullabilityRefs, ForeignTypeArg, ForeignTypeKind, ForeignTypeRef, TypeContainer,
    raw_arity, resolve_foreign_class,
};
use crate::qualifiers::{MutabilityQualifier, NullabilityQualifier, TypeQualifiers};

/// One slot of a flattened foreign type.
#[derive(Clone, Debug)]
pub enum IndexedNode<'a> {
    /// A written type, with the default context in effect for it.
    Type {
        ty: &'a ForeignTypeRef,
        context: DefaultQualifierContext,
    },
    /// `?` without bound.
    Star,
    /// An erased argument of a raw class use.
    RawArgument,
}

/// Flatten a foreign type in the same order `flatten_type_tree` uses for
/// resolved types. Each node's annotations extend the default context of its
/// own subtree.
pub fn index_foreign_type<'a>(
    env: &EnhancementEnv<'_>,
    ty: &'a ForeignTypeRef,
    context: &DefaultQualifierContext,
) -> Vec<IndexedNode<'a>> {
    let mut out = Vec::new();
    push_foreign(env, ty, context, &mut out);
    out
}

fn push_foreign<'a>(
    env: &EnhancementEnv<'_>,
    ty: &'a ForeignTypeRef,
    context: &DefaultQualifierContext,
    out: &mut Vec<IndexedNode<'a>>,
) {
    let context = context.with_annotations(env.resolver, &ty.annotations);
    out.push(IndexedNode::Type {
        ty,
        context: context.clone(),
    });
    match &ty.kind {
        // Converts to a single error node; its written arguments take no slots.
        ForeignTypeKind::Classifier { name, .. } if resolve_foreign_class(env, *name).is_none() => {}
        ForeignTypeKind::Classifier { name, args } if args.is_empty() => {
            for _ in 0..raw_arity(env, *name) {
                out.push(IndexedNode::RawArgument);
            }
        }
        ForeignTypeKind::Classifier { args, .. } => {
            for arg in args {
                match arg {
                    ForeignTypeArg::Type(arg) => push_foreign(env, arg, &context, out),
                    ForeignTypeArg::Wildcard(None) => out.push(IndexedNode::Star),
                    ForeignTypeArg::Wildcard(Some(wildcard)) => {
                        push_foreign(env, &wildcard.bound, &context, out)
                    }
                }
            }
        }
        ForeignTypeKind::Array(element) => push_foreign(env, element, &context, out),
        ForeignTypeKind::TypeParameter(_) | ForeignTypeKind::Primitive(_) => {}
    }
}

/// Qualifiers written on (or defaulted for) one foreign node.
///
/// The head also sees the container's annotations and falls back to the
/// container site's default. An explicit not-null annotation records the node
/// in `enhanced`.
pub fn extract_annotated_qualifiers(
    env: &EnhancementEnv<'_>,
    node: &IndexedNode<'_>,
    head: Option<(&TypeContainer, QualifierApplicability)>,
    enhanced: &mut EnhancedNullabilityRefs,
) -> TypeQualifiers {
    let IndexedNode::Type { ty, context } = node else {
        return TypeQualifiers::NONE;
    };

    let container_annotations: &[Annotation] = head.map_or(&[], |(c, _)| c.annotations.as_slice());
    let annotations = || container_annotations.iter().chain(ty.annotations.iter());

    let explicit = annotations().find_map(|a| env.resolver.nullability(a));
    let default = match head {
        Some((_, site)) => context.get_for_head(site),
        None => context.get(QualifierApplicability::TypeUse),
    };
    let nullability = explicit.or(default.map(|d| d.nullability));

    if let Some(explicit) = explicit
        && explicit.qualifier == NullabilityQualifier::NotNull
        && !explicit.is_for_warning_only
    {
        enhanced.insert(ty.id);
    }

    let mutability = unique(annotations().filter_map(|a| env.resolver.mutability(a)));
    let qualifier = nullability.map(|n| n.qualifier);
    let is_warning_only = nullability.is_some_and(|n| n.is_for_warning_only);

    TypeQualifiers {
        nullability: qualifier,
        mutability,
        is_not_null_type_parameter: qualifier == Some(NullabilityQualifier::NotNull)
            && !is_warning_only
            && ty.is_type_parameter(),
        is_warning_only,
    }
}

/// The single distinct value, or `None` when there are zero or several.
fn unique(values: impl Iterator<Item = MutabilityQualifier>) -> Option<MutabilityQualifier> {
    let mut found = None;
    for value in values {
        match found {
            None => found = Some(value),
            Some(existing) if existing == value => {}
            Some(_) => return None,
        }
    }
    found
}

/// Qualifiers a resolved type declares at its head.
///
/// A nullable lower bound means `Nullable`; a non-null upper bound means
/// `NotNull`; a flexible `(T..T?)` declares nothing. Read-only classifiers on
/// the lower bound and mutable ones on the upper bound declare mutability.
pub fn extract_resolved_qualifiers(env: &EnhancementEnv<'_>, ty: TypeId) -> TypeQualifiers {
    let db = env.db;
    if matches!(db.lookup(ty), None | Some(TypeData::Error)) {
        return TypeQualifiers::NONE;
    }
    let lower = db.lower_bound_if_flexible(ty);
    let upper = db.upper_bound_if_flexible(ty);

    let nullability = if db.is_marked_nullable(lower) {
        Some(NullabilityQualifier::Nullable)
    } else if !db.is_marked_nullable(upper) {
        Some(NullabilityQualifier::NotNull)
    } else {
        None
    };

    let mutability = if db
        .classifier(lower)
        .is_some_and(|c| env.platform.is_read_only(c))
    {
        Some(MutabilityQualifier::ReadOnly)
    } else if db
        .classifier(upper)
        .is_some_and(|c| env.platform.is_mutable(c))
    {
        Some(MutabilityQualifier::Mutable)
    } else {
        None
    };

    TypeQualifiers {
        nullability,
        mutability,
        is_not_null_type_parameter: matches!(
            db.lookup(lower),
            Some(TypeData::DefinitelyNotNull(_))
        ),
        is_warning_only: false,
    }
}

/// Flattened resolved type as a column of declared qualifiers; star slots
/// carry no qualifier.
pub fn index_resolved_qualifiers(
    env: &EnhancementEnv<'_>,
    ty: TypeId,
) -> SmallVec<[Option<TypeQualifiers>; NODE_TABLE_INLINE]> {
    kava_types::flatten_type_tree(env.db, ty)
        .into_iter()
        .map(|node| node.ty.map(|ty| extract_resolved_qualifiers(env, ty)))
        .collect()
}

#[cfg(test)]
#[path = "../tests/indexed_tests.rs"]
mod tests;
