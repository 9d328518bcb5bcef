//! Annotation-driven qualifier resolution.
//!
//! Annotations on foreign declarations and type uses are mapped to qualifiers
//! through an `AnnotationQualifierResolver`. Default qualifiers declared on
//! enclosing scopes are tracked by `DefaultQualifierContext`, an immutable
//! chain where each nested scope shadows the defaults of its parent for the
//! applicability sites it names.

use std::sync::Arc;

use kava_common::Atom;
use kava_types::TypeInterner;
use rustc_hash::{FxHashMap, FxHashSet};
use serde::{Deserialize, Serialize};
use smallvec::SmallVec;
use tracing::debug;

use crate::config::EnhancementConfig;
use crate::qualifiers::{MutabilityQualifier, NullabilityQualifierWithMigrationStatus};

/// A foreign annotation, identified by its fully qualified name.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct Annotation {
    pub name: Atom,
}

impl Annotation {
    pub fn new(interner: &TypeInterner, fq_name: &str) -> Self {
        Self {
            name: interner.intern_string(fq_name),
        }
    }
}

/// Declaration site a default qualifier can apply to.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum QualifierApplicability {
    TypeUse,
    ValueParameter,
    ReturnType,
    Field,
    TypeParameterBounds,
}

/// Qualifiers that apply to a site unless something more specific says otherwise.
#[derive(Copy, Clone, Debug, PartialEq, Eq, Hash)]
pub struct DefaultQualifiers {
    pub nullability: NullabilityQualifierWithMigrationStatus,
}

pub type DefaultQualifierEntries = SmallVec<[(QualifierApplicability, DefaultQualifiers); 4]>;

/// Maps annotations to the fixed set of qualifier facts the enhancer understands.
pub trait AnnotationQualifierResolver: Send + Sync {
    fn nullability(&self, annotation: &Annotation)
    -> Option<NullabilityQualifierWithMigrationStatus>;

    fn mutability(&self, annotation: &Annotation) -> Option<MutabilityQualifier>;

    /// Default qualifiers the annotation installs on the scope it annotates.
    fn default_qualifiers(
        &self,
        annotation: &Annotation,
    ) -> &[(QualifierApplicability, DefaultQualifiers)];
}

/// Annotation lookup tables compiled from an `EnhancementConfig`.
#[derive(Debug, Default)]
pub struct AnnotationTable {
    nullability: FxHashMap<Atom, NullabilityQualifierWithMigrationStatus>,
    read_only: FxHashSet<Atom>,
    mutable: FxHashSet<Atom>,
    defaults: FxHashMap<Atom, DefaultQualifierEntries>,
    root_defaults: DefaultQualifierEntries,
}

impl AnnotationTable {
    pub fn compile(config: &EnhancementConfig, interner: &TypeInterner) -> Self {
        let mut table = AnnotationTable::default();

        for entry in &config.nullability_annotations {
            table.nullability.insert(
                interner.intern_string(&entry.name),
                NullabilityQualifierWithMigrationStatus {
                    qualifier: entry.qualifier,
                    is_for_warning_only: entry.warning_only,
                },
            );
        }
        table.read_only.extend(
            config
                .read_only_annotations
                .iter()
                .map(|name| interner.intern_string(name)),
        );
        table.mutable.extend(
            config
                .mutable_annotations
                .iter()
                .map(|name| interner.intern_string(name)),
        );

        for entry in &config.default_qualifier_annotations {
            let qualifiers = DefaultQualifiers {
                nullability: NullabilityQualifierWithMigrationStatus {
                    qualifier: entry.nullability,
                    is_for_warning_only: entry.warning_only,
                },
            };
            let slot = table
                .defaults
                .entry(interner.intern_string(&entry.name))
                .or_default();
            slot.extend(entry.applicability.iter().map(|&site| (site, qualifiers)));
        }

        table.root_defaults = config
            .defaults
            .iter()
            .map(|(&site, entry)| {
                (
                    site,
                    DefaultQualifiers {
                        nullability: NullabilityQualifierWithMigrationStatus {
                            qualifier: entry.nullability,
                            is_for_warning_only: entry.warning_only,
                        },
                    },
                )
            })
            .collect();

        debug!(
            target: "kava::enhance",
            nullability = table.nullability.len(),
            read_only = table.read_only.len(),
            mutable = table.mutable.len(),
            default_annotations = table.defaults.len(),
            "compiled annotation table"
        );
        table
    }

    /// Context holding the session-wide defaults.
    pub fn root_context(&self) -> DefaultQualifierContext {
        DefaultQualifierContext::root(self.root_defaults.iter().copied())
    }
}

impl AnnotationQualifierResolver for AnnotationTable {
    fn nullability(
        &self,
        annotation: &Annotation,
    ) -> Option<NullabilityQualifierWithMigrationStatus> {
        self.nullability.get(&annotation.name).copied()
    }

    fn mutability(&self, annotation: &Annotation) -> Option<MutabilityQualifier> {
        if self.read_only.contains(&annotation.name) {
            Some(MutabilityQualifier::ReadOnly)
        } else if self.mutable.contains(&annotation.name) {
            Some(MutabilityQualifier::Mutable)
        } else {
            None
        }
    }

    fn default_qualifiers(
        &self,
        annotation: &Annotation,
    ) -> &[(QualifierApplicability, DefaultQualifiers)] {
        self.defaults
            .get(&annotation.name)
            .map(|entries| entries.as_slice())
            .unwrap_or(&[])
    }
}

#[derive(Debug)]
struct DefaultScope {
    parent: Option<Arc<DefaultScope>>,
    entries: DefaultQualifierEntries,
}

/// Immutable chain of default-qualifier scopes.
///
/// Cloning is a reference-count bump, so contexts can be handed to nested
/// declarations freely and shared across threads.
#[derive(Clone, Debug, Default)]
pub struct DefaultQualifierContext {
    scope: Option<Arc<DefaultScope>>,
}

impl DefaultQualifierContext {
    pub fn empty() -> Self {
        Self::default()
    }

    pub fn root(entries: impl IntoIterator<Item = (QualifierApplicability, DefaultQualifiers)>) -> Self {
        Self::empty().extend(entries)
    }

    /// Child context whose entries shadow this one's for the sites they name.
    pub fn extend(
        &self,
        entries: impl IntoIterator<Item = (QualifierApplicability, DefaultQualifiers)>,
    ) -> Self {
        let entries: DefaultQualifierEntries = entries.into_iter().collect();
        if entries.is_empty() {
            return self.clone();
        }
        Self {
            scope: Some(Arc::new(DefaultScope {
                parent: self.scope.clone(),
                entries,
            })),
        }
    }

    /// Child context extended with the defaults the given annotations declare.
    pub fn with_annotations(
        &self,
        resolver: &dyn AnnotationQualifierResolver,
        annotations: &[Annotation],
    ) -> Self {
        self.extend(
            annotations
                .iter()
                .flat_map(|annotation| resolver.default_qualifiers(annotation).iter().copied()),
        )
    }

    /// Innermost default for the site.
    pub fn get(&self, site: QualifierApplicability) -> Option<DefaultQualifiers> {
        let mut scope = self.scope.as_deref();
        while let Some(current) = scope {
            // Later entries in one scope win over earlier ones.
            if let Some((_, qualifiers)) = current.entries.iter().rev().find(|(s, _)| *s == site) {
                return Some(*qualifiers);
            }
            scope = current.parent.as_deref();
        }
        None
    }

    /// Default for a declaration head: the site's own default, else the
    /// type-use default.
    pub fn get_for_head(&self, site: QualifierApplicability) -> Option<DefaultQualifiers> {
        self.get(site)
            .or_else(|| self.get(QualifierApplicability::TypeUse))
    }

    pub fn depth(&self) -> usize {
        let mut depth = 0;
        let mut scope = self.scope.as_deref();
        while let Some(current) = scope {
            depth += 1;
            scope = current.parent.as_deref();
        }
        depth
    }
}

#[cfg(test)]
#[path = "../tests/annotations_tests.rs"]
mod tests;
