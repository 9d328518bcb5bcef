//! Member Scopes and Substitution Overrides
//!
//! A generic supertype's members, seen from a concrete subtype, need their
//! owner's type parameters replaced. This crate provides:
//!
//! - **Symbols**: shared callable members with lazily resolved return types
//! - **Scopes**: name-based member lookup behind the `MemberScope` trait
//! - **Substitution scopes**: `ClassSubstitutionScope` specializes inherited
//!   members, keeping the original symbol when nothing changes
//! - **Storage**: a session-wide, concurrent, compute-once cache so every
//!   query for the same member in the same scope returns the same symbol
pub mod scope;
pub mod storage;
pub mod substitution;
pub mod symbols;

pub use scope::{DeclaredMemberScope, MemberScope, OverriddenProcessor, ProcessorAction};
pub use storage::{FakeOverrideStorage, MemberFamily, ScopeKey, SubstitutionOverrideCache};
pub use substitution::{ClassSubstitutionScope, ScopeEnv};
pub use symbols::{
    CallableBuilder, CallableKind, CallableMember, CallableOrigin, CallableSymbol,
    FakeOverrideSubstitution, ReturnTypeSlot, SymbolId, SymbolIdAllocator, ValueParameter,
    Visibility,
};
