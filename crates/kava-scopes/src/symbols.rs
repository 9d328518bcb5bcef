//! Callable member symbols.
//!
//! Symbols are shared as `Arc<CallableMember>`; identity of a symbol is its
//! `SymbolId`, and a synthesized substitution override keeps a handle to the
//! symbol it was derived from.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::{Arc, OnceLock};

use kava_common::Atom;
use kava_types::{ClassId, Substitutor, TypeId, TypeInterner, TypeParamId};
use tracing::trace;

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct SymbolId(pub u32);

/// Session-wide allocator of symbol ids.
#[derive(Debug, Default)]
pub struct SymbolIdAllocator {
    next: AtomicU32,
}

impl SymbolIdAllocator {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn alloc(&self) -> SymbolId {
        SymbolId(self.next.fetch_add(1, Ordering::Relaxed))
    }

    pub fn allocated(&self) -> u32 {
        self.next.load(Ordering::Relaxed)
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum Visibility {
    Public,
    Protected,
    Internal,
    Private,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub enum CallableKind {
    Function,
    Constructor,
    Property,
    Field,
    /// Synthetic property backed by a getter and an optional setter.
    Accessor,
    EnumEntry,
}

impl CallableKind {
    /// Variables that get substitution overrides.
    pub const fn is_overridable_variable(self) -> bool {
        matches!(
            self,
            CallableKind::Property | CallableKind::Field | CallableKind::Accessor
        )
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct ValueParameter {
    pub name: Atom,
    pub ty: TypeId,
    pub is_vararg: bool,
}

/// Substitution to run once the original member's return type is known.
#[derive(Clone, Debug)]
pub struct FakeOverrideSubstitution {
    pub substitutor: Substitutor,
    pub original: CallableSymbol,
}

#[derive(Debug)]
pub enum ReturnTypeSlot {
    /// Written on a declaration; may be filled in later by the pipeline.
    Declared(OnceLock<TypeId>),
    /// Computed when the symbol was synthesized.
    Resolved(TypeId),
    /// Computed on first access from the original's return type.
    Deferred {
        substitution: FakeOverrideSubstitution,
        resolved: OnceLock<TypeId>,
    },
}

#[derive(Clone, Debug)]
pub enum CallableOrigin {
    Source,
    SubstitutionOverride { original: CallableSymbol },
}

#[derive(Debug)]
pub struct CallableMember {
    pub id: SymbolId,
    pub name: Atom,
    pub kind: CallableKind,
    /// Dispatch receiver class.
    pub owner: ClassId,
    pub visibility: Visibility,
    /// Type parameters declared by the member itself.
    pub type_params: Vec<TypeParamId>,
    /// Extension receiver.
    pub receiver: Option<TypeId>,
    /// Value parameters; getter parameters for an accessor.
    pub params: Vec<ValueParameter>,
    /// Setter parameters of an accessor.
    pub setter_params: Vec<ValueParameter>,
    pub return_type: ReturnTypeSlot,
    pub origin: CallableOrigin,
}

pub type CallableSymbol = Arc<CallableMember>;

impl CallableMember {
    /// The return type, if it is known.
    ///
    /// A deferred slot resolves on the first call after the original's return
    /// type becomes known, and keeps that result.
    pub fn return_type(&self, db: &TypeInterner) -> Option<TypeId> {
        match &self.return_type {
            ReturnTypeSlot::Declared(slot) => slot.get().copied(),
            ReturnTypeSlot::Resolved(ty) => Some(*ty),
            ReturnTypeSlot::Deferred {
                substitution,
                resolved,
            } => {
                if let Some(ty) = resolved.get() {
                    return Some(*ty);
                }
                let original = substitution.original.return_type(db)?;
                let ty = *resolved
                    .get_or_init(|| substitution.substitutor.substitute_or_self(db, original));
                trace!(
                    target: "kava::scopes",
                    symbol = self.id.0,
                    original = substitution.original.id.0,
                    "resolved deferred return type"
                );
                Some(ty)
            }
        }
    }

    /// Fill in a declared return type. Returns `false` if the slot was
    /// already set or is not a declared slot.
    pub fn resolve_return_type(&self, ty: TypeId) -> bool {
        match &self.return_type {
            ReturnTypeSlot::Declared(slot) => slot.set(ty).is_ok(),
            _ => false,
        }
    }

    pub fn has_deferred_return_type(&self) -> bool {
        matches!(self.return_type, ReturnTypeSlot::Deferred { .. })
    }

    pub fn original_for_substitution_override(&self) -> Option<&CallableSymbol> {
        match &self.origin {
            CallableOrigin::SubstitutionOverride { original } => Some(original),
            CallableOrigin::Source => None,
        }
    }

    pub fn is_substitution_override(&self) -> bool {
        self.original_for_substitution_override().is_some()
    }
}

/// Builder for declared (source) members.
pub struct CallableBuilder {
    member: CallableMember,
}

impl CallableBuilder {
    pub fn new(id: SymbolId, name: Atom, kind: CallableKind, owner: ClassId) -> Self {
        Self {
            member: CallableMember {
                id,
                name,
                kind,
                owner,
                visibility: Visibility::Public,
                type_params: Vec::new(),
                receiver: None,
                params: Vec::new(),
                setter_params: Vec::new(),
                return_type: ReturnTypeSlot::Declared(OnceLock::new()),
                origin: CallableOrigin::Source,
            },
        }
    }

    pub fn visibility(mut self, visibility: Visibility) -> Self {
        self.member.visibility = visibility;
        self
    }

    pub fn type_params(mut self, type_params: impl IntoIterator<Item = TypeParamId>) -> Self {
        self.member.type_params.extend(type_params);
        self
    }

    pub fn receiver(mut self, ty: TypeId) -> Self {
        self.member.receiver = Some(ty);
        self
    }

    pub fn param(mut self, name: Atom, ty: TypeId) -> Self {
        self.member.params.push(ValueParameter {
            name,
            ty,
            is_vararg: false,
        });
        self
    }

    pub fn vararg_param(mut self, name: Atom, ty: TypeId) -> Self {
        self.member.params.push(ValueParameter {
            name,
            ty,
            is_vararg: true,
        });
        self
    }

    pub fn setter_param(mut self, name: Atom, ty: TypeId) -> Self {
        self.member.setter_params.push(ValueParameter {
            name,
            ty,
            is_vararg: false,
        });
        self
    }

    /// Declared return type. Without it the return type stays unresolved
    /// until `CallableMember::resolve_return_type`.
    pub fn returns(self, ty: TypeId) -> Self {
        // A fresh slot always accepts its first value.
        let _ = self.member.resolve_return_type(ty);
        self
    }

    pub fn build(self) -> CallableSymbol {
        Arc::new(self.member)
    }
}

#[cfg(test)]
#[path = "../tests/symbols_tests.rs"]
mod tests;
