//! Enhancement of one part of a foreign member signature.
//!
//! A signature part is a receiver, a value parameter, a return type or a
//! field type. Its qualifiers come from its own annotations and defaults,
//! merged with the declared types of the same part in every overridden
//! signature, optionally replaced by predefined qualifiers for well-known
//! library members.

use kava_types::{TypeFormatter, TypeId};
use rustc_hash::FxHashMap;
use tracing::debug;

use crate::annotations::{DefaultQualifierContext, QualifierApplicability};
use crate::enhancer;
use crate::env::EnhancementEnv;
use crate::foreign::{
    EnhancedNullabilityRefs, ForeignTypeRef, TypeContainer, convert_without_enhancement,
};
use crate::indexed::{extract_annotated_qualifiers, index_foreign_type, index_resolved_qualifiers};
use crate::qualifiers::{IndexedQualifiers, TypeQualifiers};

/// Qualifiers fixed ahead of time for a well-known member, by node index.
/// They replace whatever the annotations and overrides would give.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct PredefinedEnhancementInfo {
    qualifiers: FxHashMap<usize, TypeQualifiers>,
}

impl PredefinedEnhancementInfo {
    pub fn new(qualifiers: impl IntoIterator<Item = (usize, TypeQualifiers)>) -> Self {
        Self {
            qualifiers: qualifiers.into_iter().collect(),
        }
    }

    pub fn get(&self, index: usize) -> Option<TypeQualifiers> {
        self.qualifiers.get(&index).copied()
    }

    fn max_index(&self) -> Option<usize> {
        self.qualifiers.keys().copied().max()
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PartEnhancementResult {
    pub ty: TypeId,
    /// Whether enhancement produced a type different from plain conversion.
    pub were_changes: bool,
    /// Whether the head classifier is the raw function-N marker class.
    pub contains_function_n: bool,
}

/// Inputs for enhancing one signature part.
pub struct EnhancementSignatureParts<'a> {
    pub current: &'a ForeignTypeRef,
    /// Declaration the type is written on; `None` for nested uses such as
    /// type-parameter bounds.
    pub container: Option<&'a TypeContainer>,
    /// Declared types of the same part in each overridden signature.
    pub from_overridden: &'a [TypeId],
    /// Return types and fields are covariant; parameters are not.
    pub is_covariant: bool,
    pub site: QualifierApplicability,
    pub context: &'a DefaultQualifierContext,
}

impl EnhancementSignatureParts<'_> {
    pub fn enhance(
        &self,
        env: &EnhancementEnv<'_>,
        predefined: Option<&PredefinedEnhancementInfo>,
    ) -> PartEnhancementResult {
        let mut enhanced_refs = EnhancedNullabilityRefs::default();
        let qualifiers = self.compute_indexed_qualifiers(env, predefined, &mut enhanced_refs);

        let converted = convert_without_enhancement(env, self.current, &enhanced_refs);
        let contains_function_n = env.db.classifier(converted) == Some(env.platform.function_n());
        let ty = enhancer::enhance(env, converted, &qualifiers).unwrap_or(converted);

        debug!(
            target: "kava::enhance",
            site = ?self.site,
            overridden = self.from_overridden.len(),
            predefined = predefined.is_some(),
            result = %TypeFormatter::new(env.db).with_store(env.store).format(ty),
            "enhanced signature part"
        );

        PartEnhancementResult {
            ty,
            were_changes: ty != converted,
            contains_function_n,
        }
    }

    /// Per-node qualifiers for the part, merged with the overridden types.
    ///
    /// When the part is covariant and has overrides, only the head is merged:
    /// argument qualifiers are left unset and the argument types stay as
    /// converted.
    pub fn compute_indexed_qualifiers(
        &self,
        env: &EnhancementEnv<'_>,
        predefined: Option<&PredefinedEnhancementInfo>,
        enhanced_refs: &mut EnhancedNullabilityRefs,
    ) -> IndexedQualifiers {
        let overridden: Vec<_> = self
            .from_overridden
            .iter()
            .map(|&ty| index_resolved_qualifiers(env, ty))
            .collect();
        let own = index_foreign_type(env, self.current, self.context);

        // TODO: merge argument qualifiers of covariant parts once overridden
        // argument types can be checked for interchangeability.
        let only_head = self.is_covariant && !overridden.is_empty();
        let computed_len = if only_head { 1 } else { own.len() };
        let is_vararg = self.container.is_some_and(|c| c.is_vararg);

        let mut supers = Vec::with_capacity(overridden.len());
        let mut computed = Vec::with_capacity(computed_len);
        for (index, node) in own.iter().take(computed_len).enumerate() {
            let head = (index == 0)
                .then_some(self.container)
                .flatten()
                .map(|container| (container, self.site));
            let own_qualifiers = extract_annotated_qualifiers(env, node, head, enhanced_refs);

            supers.clear();
            supers.extend(
                overridden
                    .iter()
                    .filter_map(|column| column.get(index).copied().flatten()),
            );
            computed.push(own_qualifiers.compute_for_override(
                &supers,
                index == 0 && self.is_covariant,
                index == 0 && is_vararg,
            ));
        }

        let Some(predefined) = predefined else {
            return IndexedQualifiers::new(computed);
        };
        let len = predefined
            .max_index()
            .map_or(computed.len(), |max| computed.len().max(max + 1));
        IndexedQualifiers::from_fn(len, |index| {
            predefined
                .get(index)
                .or_else(|| computed.get(index).copied())
                .unwrap_or(TypeQualifiers::NONE)
        })
    }
}

#[cfg(test)]
#[path = "../tests/signature_tests.rs"]
mod tests;
