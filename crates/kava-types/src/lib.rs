//! Resolved Type Model
//!
//! This crate holds the compiler-side representation of resolved types that
//! the enhancement and substitution engines read and produce:
//!
//! - **Interning**: every structurally distinct type is stored once and
//!   addressed by a `TypeId`, so structural identity is `TypeId` equality
//! - **Flexible types**: a `(lower..upper)` pair for values imported from an
//!   annotation-poor type system
//! - **Classifier store**: classes and type parameters, with fresh type
//!   parameter allocation for synthesized members
//! - **Substitution**: composable type-parameter substitutors with an exact
//!   "no change" signal
mod def;
mod format;
mod intern;
mod platform;
mod queries;
mod substitute;
pub mod types;

pub use def::{ClassInfo, ClassifierStore, TypeParamInfo};
pub use format::TypeFormatter;
pub use intern::TypeInterner;
pub use platform::{PlatformClassMap, PlatformMapping};
pub use queries::{FlattenedNode, flatten_type_tree};
pub use substitute::{Substitutor, TypeSubstitution};
pub use types::{
    ClassId, ClassType, FlexibleType, ProjectionKind, TypeArgs, TypeAttributes, TypeData,
    TypeId, TypeParamId, TypeParamType, TypeProjection,
};
