//! Enhancement configuration.
//!
//! Which annotations carry which qualifiers, and the session-wide defaults,
//! are data rather than code. A config is loaded from JSON or taken from
//! `EnhancementConfig::builtin()` and compiled into an `AnnotationTable`.

use std::collections::BTreeMap;
use std::path::Path;

use anyhow::{Context, Result, bail};
use rustc_hash::FxHashSet;
use serde::{Deserialize, Serialize};

use crate::annotations::QualifierApplicability;
use crate::qualifiers::NullabilityQualifier;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct NullabilityAnnotation {
    pub name: String,
    pub qualifier: NullabilityQualifier,
    #[serde(default)]
    pub warning_only: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DefaultQualifierAnnotation {
    pub name: String,
    pub applicability: Vec<QualifierApplicability>,
    pub nullability: NullabilityQualifier,
    #[serde(default)]
    pub warning_only: bool,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct SiteDefault {
    pub nullability: NullabilityQualifier,
    #[serde(default)]
    pub warning_only: bool,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct EnhancementConfig {
    pub nullability_annotations: Vec<NullabilityAnnotation>,
    pub read_only_annotations: Vec<String>,
    pub mutable_annotations: Vec<String>,
    pub default_qualifier_annotations: Vec<DefaultQualifierAnnotation>,
    /// Session-wide defaults per site; empty means "no defaults".
    pub defaults: BTreeMap<QualifierApplicability, SiteDefault>,
}

const NOT_NULL_ANNOTATIONS: &[&str] = &[
    "org.jetbrains.annotations.NotNull",
    "androidx.annotation.NonNull",
    "android.support.annotation.NonNull",
    "android.annotation.NonNull",
    "javax.annotation.Nonnull",
    "edu.umd.cs.findbugs.annotations.NonNull",
    "org.checkerframework.checker.nullness.qual.NonNull",
    "org.checkerframework.checker.nullness.compatqual.NonNullDecl",
    "org.eclipse.jdt.annotation.NonNull",
    "lombok.NonNull",
    "io.reactivex.annotations.NonNull",
    "io.reactivex.rxjava3.annotations.NonNull",
];

const NULLABLE_ANNOTATIONS: &[&str] = &[
    "org.jetbrains.annotations.Nullable",
    "androidx.annotation.Nullable",
    "android.support.annotation.Nullable",
    "android.annotation.Nullable",
    "javax.annotation.Nullable",
    "javax.annotation.CheckForNull",
    "edu.umd.cs.findbugs.annotations.Nullable",
    "edu.umd.cs.findbugs.annotations.CheckForNull",
    "edu.umd.cs.findbugs.annotations.PossiblyNull",
    "org.checkerframework.checker.nullness.qual.Nullable",
    "org.checkerframework.checker.nullness.compatqual.NullableDecl",
    "org.eclipse.jdt.annotation.Nullable",
    "io.reactivex.annotations.Nullable",
    "io.reactivex.rxjava3.annotations.Nullable",
];

const READ_ONLY_ANNOTATIONS: &[&str] = &[
    "org.jetbrains.annotations.ReadOnly",
    "kotlin.annotations.jvm.ReadOnly",
];

const MUTABLE_ANNOTATIONS: &[&str] = &[
    "org.jetbrains.annotations.Mutable",
    "kotlin.annotations.jvm.Mutable",
];

impl EnhancementConfig {
    /// The well-known annotation sets, with no session-wide defaults.
    pub fn builtin() -> Self {
        let nullability_annotations = NOT_NULL_ANNOTATIONS
            .iter()
            .map(|&name| (name, NullabilityQualifier::NotNull))
            .chain(
                NULLABLE_ANNOTATIONS
                    .iter()
                    .map(|&name| (name, NullabilityQualifier::Nullable)),
            )
            .map(|(name, qualifier)| NullabilityAnnotation {
                name: name.to_string(),
                qualifier,
                warning_only: false,
            })
            .collect();

        let default_qualifier_annotations = vec![
            DefaultQualifierAnnotation {
                name: "javax.annotation.ParametersAreNonnullByDefault".to_string(),
                applicability: vec![QualifierApplicability::ValueParameter],
                nullability: NullabilityQualifier::NotNull,
                warning_only: false,
            },
            DefaultQualifierAnnotation {
                name: "javax.annotation.ParametersAreNullableByDefault".to_string(),
                applicability: vec![QualifierApplicability::ValueParameter],
                nullability: NullabilityQualifier::Nullable,
                warning_only: false,
            },
            DefaultQualifierAnnotation {
                name: "org.eclipse.jdt.annotation.NonNullByDefault".to_string(),
                applicability: vec![
                    QualifierApplicability::ValueParameter,
                    QualifierApplicability::ReturnType,
                    QualifierApplicability::Field,
                    QualifierApplicability::TypeUse,
                ],
                nullability: NullabilityQualifier::NotNull,
                warning_only: false,
            },
        ];

        Self {
            nullability_annotations,
            read_only_annotations: READ_ONLY_ANNOTATIONS.iter().map(|s| s.to_string()).collect(),
            mutable_annotations: MUTABLE_ANNOTATIONS.iter().map(|s| s.to_string()).collect(),
            default_qualifier_annotations,
            defaults: BTreeMap::new(),
        }
    }

    pub fn from_json_str(source: &str) -> Result<Self> {
        let config: EnhancementConfig =
            serde_json::from_str(source).context("failed to parse enhancement config JSON")?;
        config.validate()?;
        Ok(config)
    }

    pub fn from_path(path: &Path) -> Result<Self> {
        let source = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read enhancement config: {}", path.display()))?;
        Self::from_json_str(&source)
            .with_context(|| format!("invalid enhancement config: {}", path.display()))
    }

    /// Reject configs whose annotation tables contradict themselves.
    pub fn validate(&self) -> Result<()> {
        let names = self
            .nullability_annotations
            .iter()
            .map(|a| a.name.as_str())
            .chain(self.read_only_annotations.iter().map(String::as_str))
            .chain(self.mutable_annotations.iter().map(String::as_str))
            .chain(self.default_qualifier_annotations.iter().map(|a| a.name.as_str()));
        for name in names {
            if name.is_empty() || name.starts_with('.') || name.ends_with('.') {
                bail!("invalid annotation name '{}'", name);
            }
        }

        let mut seen = FxHashSet::default();
        for annotation in &self.nullability_annotations {
            if !seen.insert(annotation.name.as_str()) {
                bail!(
                    "nullability annotation '{}' is listed more than once",
                    annotation.name
                );
            }
        }

        let read_only: FxHashSet<&str> =
            self.read_only_annotations.iter().map(String::as_str).collect();
        if let Some(both) = self
            .mutable_annotations
            .iter()
            .find(|name| read_only.contains(name.as_str()))
        {
            bail!("annotation '{}' is both read-only and mutable", both);
        }

        if let Some(empty) = self
            .default_qualifier_annotations
            .iter()
            .find(|a| a.applicability.is_empty())
        {
            bail!(
                "default qualifier annotation '{}' applies to no site",
                empty.name
            );
        }
        Ok(())
    }
}

#[cfg(test)]
#[path = "../tests/config_tests.rs"]
mod tests;
