//! Foreign Type Enhancement
//!
//! Types imported from an annotation-poor foreign type system arrive as
//! flexible `(T..T?)` types. This crate sharpens them using qualifiers:
//!
//! - **Annotations**: nullability and mutability annotations, resolved through
//!   a configurable `AnnotationQualifierResolver`
//! - **Defaults**: default qualifiers declared on enclosing scopes, tracked in
//!   an immutable `DefaultQualifierContext` chain
//! - **Overrides**: qualifiers declared by overridden signatures, merged node
//!   by node with the member's own
//! - **Enhancement**: the resulting per-node table applied to the converted
//!   type, collapsing flexible types where the bounds agree
pub mod annotations;
pub mod config;
pub mod enhancer;
mod env;
pub mod foreign;
pub mod indexed;
pub mod qualifiers;
pub mod signature;

pub use annotations::{
    Annotation, AnnotationQualifierResolver, AnnotationTable, DefaultQualifierContext,
    DefaultQualifiers, QualifierApplicability,
};
pub use config::EnhancementConfig;
pub use env::EnhancementEnv;
pub use foreign::{
    ForeignTypeArg, ForeignTypeFactory, ForeignTypeKind, ForeignTypeRef, TypeContainer, TypeRefId,
    convert_without_enhancement,
};
pub use qualifiers::{
    IndexedQualifiers, MutabilityQualifier, NullabilityQualifier,
    NullabilityQualifierWithMigrationStatus, TypeComponentPosition, TypeQualifiers,
};
pub use signature::{EnhancementSignatureParts, PartEnhancementResult, PredefinedEnhancementInfo};
