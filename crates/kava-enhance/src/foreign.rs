//! Unresolved foreign type references and their plain conversion.
//!
//! A `ForeignTypeRef` is a type as written in a foreign declaration: a
//! classifier name with arguments, a type-parameter use, an array or a
//! primitive keyword, plus the annotations attached to it. Conversion maps it
//! to a resolved type without applying any qualifier: class and type-parameter
//! uses become flexible `(T..T?)`, platform collections become
//! `(MutableC..C?)`, primitives become non-null native types.

use std::cell::Cell;

use kava_common::Atom;
use kava_types::{ClassId, TypeAttributes, TypeId, TypeParamId, TypeProjection};
use rustc_hash::FxHashSet;
use smallvec::SmallVec;
use tracing::trace;

use crate::annotations::Annotation;
use crate::env::EnhancementEnv;

/// Identity of one foreign type node.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeRefId(pub u32);

/// Foreign type nodes whose nullability an explicit annotation fixed to
/// not-null. Filled while qualifiers are extracted and read by conversion.
pub type EnhancedNullabilityRefs = FxHashSet<TypeRefId>;

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum WildcardVariance {
    /// `? extends B`
    Extends,
    /// `? super B`
    Super,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct WildcardBound {
    pub variance: WildcardVariance,
    pub bound: ForeignTypeRef,
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForeignTypeArg {
    Type(ForeignTypeRef),
    /// `?` when the bound is absent.
    Wildcard(Option<Box<WildcardBound>>),
}

impl ForeignTypeArg {
    pub const STAR: ForeignTypeArg = ForeignTypeArg::Wildcard(None);

    pub fn extends(bound: ForeignTypeRef) -> Self {
        ForeignTypeArg::Wildcard(Some(Box::new(WildcardBound {
            variance: WildcardVariance::Extends,
            bound,
        })))
    }

    pub fn super_of(bound: ForeignTypeRef) -> Self {
        ForeignTypeArg::Wildcard(Some(Box::new(WildcardBound {
            variance: WildcardVariance::Super,
            bound,
        })))
    }
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub enum ForeignTypeKind {
    /// Class reference by fully qualified foreign name. No arguments on a
    /// generic class is a raw use.
    Classifier {
        name: Atom,
        args: Vec<ForeignTypeArg>,
    },
    TypeParameter(TypeParamId),
    Array(Box<ForeignTypeRef>),
    /// Primitive keyword such as `int`.
    Primitive(Atom),
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ForeignTypeRef {
    pub id: TypeRefId,
    pub kind: ForeignTypeKind,
    pub annotations: Vec<Annotation>,
}

impl ForeignTypeRef {
    pub fn annotated(mut self, annotations: impl IntoIterator<Item = Annotation>) -> Self {
        self.annotations.extend(annotations);
        self
    }

    pub fn is_type_parameter(&self) -> bool {
        matches!(self.kind, ForeignTypeKind::TypeParameter(_))
    }
}

/// The declaration a type is written on: its annotations apply to the head of
/// the type, and a vararg parameter's type is the array of its elements.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct TypeContainer {
    pub annotations: Vec<Annotation>,
    pub is_vararg: bool,
}

/// Builds foreign type references with unique ids.
pub struct ForeignTypeFactory<'a> {
    env: EnhancementEnv<'a>,
    next_id: Cell<u32>,
}

impl<'a> ForeignTypeFactory<'a> {
    pub fn new(env: EnhancementEnv<'a>) -> Self {
        Self {
            env,
            next_id: Cell::new(0),
        }
    }

    fn node(&self, kind: ForeignTypeKind) -> ForeignTypeRef {
        let id = self.next_id.get();
        self.next_id.set(id + 1);
        ForeignTypeRef {
            id: TypeRefId(id),
            kind,
            annotations: Vec::new(),
        }
    }

    pub fn class(&self, fq_name: &str, args: impl IntoIterator<Item = ForeignTypeArg>) -> ForeignTypeRef {
        self.node(ForeignTypeKind::Classifier {
            name: self.env.db.intern_string(fq_name),
            args: args.into_iter().collect(),
        })
    }

    pub fn simple(&self, fq_name: &str) -> ForeignTypeRef {
        self.class(fq_name, std::iter::empty())
    }

    pub fn type_param(&self, param: TypeParamId) -> ForeignTypeRef {
        self.node(ForeignTypeKind::TypeParameter(param))
    }

    pub fn array(&self, element: ForeignTypeRef) -> ForeignTypeRef {
        self.node(ForeignTypeKind::Array(Box::new(element)))
    }

    pub fn primitive(&self, keyword: &str) -> ForeignTypeRef {
        self.node(ForeignTypeKind::Primitive(self.env.db.intern_string(keyword)))
    }

    pub fn annotation(&self, fq_name: &str) -> Annotation {
        Annotation::new(self.env.db, fq_name)
    }
}

/// Native (lower, upper) classifiers for a foreign class name, if the class
/// is known to the session.
pub(crate) fn resolve_foreign_class(env: &EnhancementEnv<'_>, name: Atom) -> Option<(ClassId, ClassId)> {
    let (lower, upper) = match env.platform.map_foreign(name) {
        Some(mapping) => (mapping.lower(), mapping.upper()),
        None => (ClassId(name), ClassId(name)),
    };
    (env.store.contains_class(lower) && env.store.contains_class(upper)).then_some((lower, upper))
}

/// Number of type arguments a raw use of the foreign class stands for.
pub(crate) fn raw_arity(env: &EnhancementEnv<'_>, name: Atom) -> usize {
    resolve_foreign_class(env, name)
        .and_then(|(_, upper)| env.store.class_type_params(upper))
        .map_or(0, |params| params.len())
}

/// Convert a foreign reference without applying any qualifier.
///
/// Nodes listed in `enhanced` get `ENHANCED_NULLABILITY` on both bounds.
/// Unknown classes and type parameters become the error type.
pub fn convert_without_enhancement(
    env: &EnhancementEnv<'_>,
    ty: &ForeignTypeRef,
    enhanced: &EnhancedNullabilityRefs,
) -> TypeId {
    let db = env.db;
    let converted = match &ty.kind {
        ForeignTypeKind::Primitive(keyword) => match env.platform.map_primitive(*keyword) {
            Some(class) => db.simple_class(class),
            None => {
                trace!(target: "kava::enhance", keyword = %db.resolve_atom(*keyword), "unknown primitive");
                TypeId::ERROR
            }
        },
        ForeignTypeKind::TypeParameter(param) => {
            if env.store.type_param(*param).is_none() {
                trace!(target: "kava::enhance", param = param.0, "unknown type parameter");
                return TypeId::ERROR;
            }
            db.flexible(db.type_param(*param, false), db.type_param(*param, true))
        }
        ForeignTypeKind::Array(element) => {
            let element = convert_without_enhancement(env, element, enhanced);
            let array = env.platform.array();
            db.flexible(
                db.class_type(array, [TypeProjection::invariant(element)], false),
                db.class_type(array, [TypeProjection::out(element)], true),
            )
        }
        ForeignTypeKind::Classifier { name, args } => {
            let Some((lower, upper)) = resolve_foreign_class(env, *name) else {
                trace!(target: "kava::enhance", class = %db.resolve_atom(*name), "unresolved foreign class");
                return TypeId::ERROR;
            };
            let arity = env.store.class_type_params(upper).map_or(0, |p| p.len());
            if args.is_empty() && arity > 0 {
                let any = db.class_type(env.platform.any(), std::iter::empty(), true);
                let erased: SmallVec<[TypeProjection; 2]> =
                    (0..arity).map(|_| TypeProjection::invariant(any)).collect();
                db.raw_flexible(
                    db.class_type(lower, erased.iter().copied(), false),
                    db.class_type(upper, erased, true),
                )
            } else {
                let projections: SmallVec<[TypeProjection; 2]> = args
                    .iter()
                    .map(|arg| convert_argument(env, arg, enhanced))
                    .collect();
                db.flexible(
                    db.class_type(lower, projections.iter().copied(), false),
                    db.class_type(upper, projections, true),
                )
            }
        }
    };

    if enhanced.contains(&ty.id) {
        db.with_attributes(converted, TypeAttributes::ENHANCED_NULLABILITY)
    } else {
        converted
    }
}

fn convert_argument(
    env: &EnhancementEnv<'_>,
    arg: &ForeignTypeArg,
    enhanced: &EnhancedNullabilityRefs,
) -> TypeProjection {
    match arg {
        ForeignTypeArg::Type(ty) => TypeProjection::invariant(convert_without_enhancement(env, ty, enhanced)),
        ForeignTypeArg::Wildcard(None) => TypeProjection::STAR,
        ForeignTypeArg::Wildcard(Some(wildcard)) => {
            let bound = convert_without_enhancement(env, &wildcard.bound, enhanced);
            match wildcard.variance {
                WildcardVariance::Extends => TypeProjection::out(bound),
                WildcardVariance::Super => TypeProjection::contravariant(bound),
            }
        }
    }
}

#[cfg(test)]
#[path = "../tests/foreign_tests.rs"]
mod tests;
