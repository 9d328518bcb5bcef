//! Type representation.
//!
//! `TypeData` is the structural key that the `TypeInterner` deduplicates.
//! Anything that should distinguish two types for identity purposes
//! (nullability, attributes, raw-ness of a flexible type) lives in the key.

use bitflags::bitflags;
use kava_common::Atom;
use kava_common::limits::TYPE_ARGS_INLINE;
use smallvec::SmallVec;

/// Interned type handle.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeId(pub u32);

impl TypeId {
    /// The inert type produced for unresolvable classifiers.
    pub const ERROR: TypeId = TypeId(0);

    #[inline]
    pub const fn is_error(self) -> bool {
        self.0 == Self::ERROR.0
    }
}

/// Fully-qualified class identifier, e.g. `kotlin.collections.List`.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClassId(pub Atom);

/// Identity of a type parameter.
///
/// Two type parameters with the same name declared by different members (or
/// a member and its substitution override) are different parameters.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TypeParamId(pub u32);

bitflags! {
    /// Extra facts attached to a single type node.
    #[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
    pub struct TypeAttributes: u8 {
        /// Nullability was fixed to not-null by an explicit annotation.
        const ENHANCED_NULLABILITY = 1 << 0;
        /// Nullability came from a qualifier that only reports warnings.
        const NULLABILITY_WARNING = 1 << 1;
    }
}

/// Variance of a type argument.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum ProjectionKind {
    Invariant,
    In,
    Out,
    /// `*`: no type, one index slot.
    Star,
}

/// A type argument: a variance plus a type, or a star projection.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeProjection {
    pub kind: ProjectionKind,
    pub ty: Option<TypeId>,
}

impl TypeProjection {
    pub const STAR: TypeProjection = TypeProjection {
        kind: ProjectionKind::Star,
        ty: None,
    };

    pub const fn invariant(ty: TypeId) -> Self {
        Self {
            kind: ProjectionKind::Invariant,
            ty: Some(ty),
        }
    }

    pub const fn out(ty: TypeId) -> Self {
        Self {
            kind: ProjectionKind::Out,
            ty: Some(ty),
        }
    }

    pub const fn contravariant(ty: TypeId) -> Self {
        Self {
            kind: ProjectionKind::In,
            ty: Some(ty),
        }
    }

    /// Same variance, different type. Star stays star.
    pub const fn with_type(self, ty: TypeId) -> Self {
        match self.kind {
            ProjectionKind::Star => Self::STAR,
            kind => Self { kind, ty: Some(ty) },
        }
    }
}

pub type TypeArgs = SmallVec<[TypeProjection; TYPE_ARGS_INLINE]>;

/// A reference to a class with its type arguments.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct ClassType {
    pub classifier: ClassId,
    pub args: TypeArgs,
    pub nullable: bool,
    pub attributes: TypeAttributes,
}

/// A use of a type parameter.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct TypeParamType {
    pub param: TypeParamId,
    pub nullable: bool,
    pub attributes: TypeAttributes,
}

/// A `(lower..upper)` pair. Both bounds have the same argument tree shape.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub struct FlexibleType {
    pub lower: TypeId,
    pub upper: TypeId,
    /// Raw use of a generic foreign class; raw-ness survives enhancement.
    pub raw: bool,
}

/// Structural type key.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum TypeData {
    Error,
    Class(ClassType),
    TypeParameter(TypeParamType),
    /// `T & Any`: a type-parameter use that is definitely not null.
    DefinitelyNotNull(TypeId),
    Flexible(FlexibleType),
}

impl TypeData {
    /// Simple (inflexible) types are everything except `Flexible`.
    pub const fn is_flexible(&self) -> bool {
        matches!(self, TypeData::Flexible(_))
    }
}

#[cfg(test)]
#[path = "../tests/types_tests.rs"]
mod tests;
