//! Qualifier model.
//!
//! A `TypeQualifiers` value is the bundle of facts the enhancer applies to one
//! node of a type tree. Qualifiers are immutable once computed; merging with
//! overridden signatures produces a new value.

use serde::{Deserialize, Serialize};

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum NullabilityQualifier {
    NotNull,
    Nullable,
}

#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MutabilityQualifier {
    ReadOnly,
    Mutable,
}

/// A nullability qualifier plus whether it is only reported as a warning.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct NullabilityQualifierWithMigrationStatus {
    pub qualifier: NullabilityQualifier,
    pub is_for_warning_only: bool,
}

impl NullabilityQualifierWithMigrationStatus {
    pub const fn strict(qualifier: NullabilityQualifier) -> Self {
        Self {
            qualifier,
            is_for_warning_only: false,
        }
    }
}

/// Where a type component sits relative to a flexible type.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum TypeComponentPosition {
    FlexibleLower,
    FlexibleUpper,
    Inflexible,
}

/// Per-node qualifier facts. `None` fields are "unset".
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub struct TypeQualifiers {
    pub nullability: Option<NullabilityQualifier>,
    pub mutability: Option<MutabilityQualifier>,
    pub is_not_null_type_parameter: bool,
    pub is_warning_only: bool,
}

impl TypeQualifiers {
    pub const NONE: TypeQualifiers = TypeQualifiers {
        nullability: None,
        mutability: None,
        is_not_null_type_parameter: false,
        is_warning_only: false,
    };

    pub const fn new(
        nullability: Option<NullabilityQualifier>,
        mutability: Option<MutabilityQualifier>,
    ) -> Self {
        Self {
            nullability,
            mutability,
            is_not_null_type_parameter: false,
            is_warning_only: false,
        }
    }

    pub const fn is_none(&self) -> bool {
        self.nullability.is_none() && self.mutability.is_none() && !self.is_not_null_type_parameter
    }

    /// Merge own qualifiers with the declared qualifiers of the overridden
    /// signatures at the same index.
    ///
    /// Nullability follows the agreement rule everywhere: the result is the one
    /// value own and all overrides agree on, otherwise unset. It therefore
    /// never narrows a `Nullable` override to `NotNull`.
    ///
    /// Mutability follows the agreement rule except at the head of a
    /// covariant position or a vararg parameter, where the subtype's own
    /// choice wins unless it contradicts a `Mutable` override.
    pub fn compute_for_override(
        &self,
        from_supertypes: &[TypeQualifiers],
        is_covariant: bool,
        is_for_vararg: bool,
    ) -> TypeQualifiers {
        // A nullable annotation on a vararg declaration describes the elements.
        let own_nullability = self
            .nullability
            .filter(|&n| !(is_for_vararg && n == NullabilityQualifier::Nullable));
        let nullability = select_agreed(
            own_nullability,
            from_supertypes.iter().filter_map(|q| q.nullability),
        );

        let super_mutability = from_supertypes.iter().filter_map(|q| q.mutability);
        let mutability = if is_covariant || is_for_vararg {
            select_covariant_mutability(self.mutability, super_mutability)
        } else {
            select_agreed(self.mutability, super_mutability)
        };

        let any_not_null_type_parameter = self.is_not_null_type_parameter
            || from_supertypes.iter().any(|q| q.is_not_null_type_parameter);

        TypeQualifiers {
            nullability,
            mutability,
            is_not_null_type_parameter: any_not_null_type_parameter
                && nullability == Some(NullabilityQualifier::NotNull),
            is_warning_only: self.is_warning_only
                && nullability.is_some()
                && nullability == own_nullability,
        }
    }
}

/// The single value every present side agrees on, if there is one.
fn select_agreed<T: Copy + PartialEq>(own: Option<T>, supers: impl Iterator<Item = T>) -> Option<T> {
    let mut agreed = own;
    for value in supers {
        match agreed {
            None => agreed = Some(value),
            Some(existing) if existing == value => {}
            Some(_) => return None,
        }
    }
    agreed
}

fn select_covariant_mutability(
    own: Option<MutabilityQualifier>,
    supers: impl Iterator<Item = MutabilityQualifier>,
) -> Option<MutabilityQualifier> {
    let mut from_super = None;
    for value in supers {
        if value == MutabilityQualifier::Mutable {
            from_super = Some(value);
            break;
        }
        from_super = Some(value);
    }
    if from_super == Some(MutabilityQualifier::Mutable) && own == Some(MutabilityQualifier::ReadOnly)
    {
        return None;
    }
    own.or(from_super)
}

/// Qualifier table addressed by depth-first node index.
///
/// Index 0 is the head type constructor. Out-of-range indices read as
/// `TypeQualifiers::NONE`.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct IndexedQualifiers {
    data: Vec<TypeQualifiers>,
}

impl IndexedQualifiers {
    pub fn new(data: Vec<TypeQualifiers>) -> Self {
        Self { data }
    }

    pub fn from_fn(size: usize, compute: impl FnMut(usize) -> TypeQualifiers) -> Self {
        Self {
            data: (0..size).map(compute).collect(),
        }
    }

    pub fn get(&self, index: usize) -> TypeQualifiers {
        self.data.get(index).copied().unwrap_or(TypeQualifiers::NONE)
    }

    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// True when no node carries any qualifier.
    pub fn is_all_none(&self) -> bool {
        self.data.iter().all(TypeQualifiers::is_none)
    }
}

#[cfg(test)]
#[path = "../tests/qualifiers_tests.rs"]
mod tests;
