//! Platform class mapping between the foreign (Java) and native (Kotlin)
//! classifier namespaces.
//!
//! Foreign collection interfaces map onto two native classifiers: a read-only
//! one used for the upper bound of the imported flexible type and a mutable
//! one used for the lower bound. The enhancer uses the read-only/mutable pairs
//! to rewrite a bound's classifier when a mutability qualifier applies.

use crate::intern::TypeInterner;
use crate::types::ClassId;
use kava_common::Atom;
use rustc_hash::FxHashMap;

/// Native classifiers a foreign class maps onto.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct PlatformMapping {
    /// Read-only (or only) native counterpart.
    pub read_only: ClassId,
    /// Mutable counterpart, for collection interfaces.
    pub mutable: Option<ClassId>,
}

impl PlatformMapping {
    /// Classifier used for the lower bound of an imported flexible type.
    pub fn lower(&self) -> ClassId {
        self.mutable.unwrap_or(self.read_only)
    }

    /// Classifier used for the upper bound of an imported flexible type.
    pub fn upper(&self) -> ClassId {
        self.read_only
    }
}

/// (foreign name, read-only native name, mutable native name, arity)
const CLASS_MAPPINGS: &[(&str, &str, Option<&str>, usize)] = &[
    ("java.lang.Object", "kotlin.Any", None, 0),
    ("java.lang.String", "kotlin.String", None, 0),
    ("java.lang.CharSequence", "kotlin.CharSequence", None, 0),
    ("java.lang.Number", "kotlin.Number", None, 0),
    ("java.lang.Throwable", "kotlin.Throwable", None, 0),
    ("java.lang.Integer", "kotlin.Int", None, 0),
    ("java.lang.Long", "kotlin.Long", None, 0),
    ("java.lang.Boolean", "kotlin.Boolean", None, 0),
    ("java.lang.Double", "kotlin.Double", None, 0),
    ("java.lang.Comparable", "kotlin.Comparable", None, 1),
    ("java.lang.Enum", "kotlin.Enum", None, 1),
    ("java.lang.annotation.Annotation", "kotlin.Annotation", None, 0),
    (
        "java.lang.Iterable",
        "kotlin.collections.Iterable",
        Some("kotlin.collections.MutableIterable"),
        1,
    ),
    (
        "java.util.Iterator",
        "kotlin.collections.Iterator",
        Some("kotlin.collections.MutableIterator"),
        1,
    ),
    (
        "java.util.ListIterator",
        "kotlin.collections.ListIterator",
        Some("kotlin.collections.MutableListIterator"),
        1,
    ),
    (
        "java.util.Collection",
        "kotlin.collections.Collection",
        Some("kotlin.collections.MutableCollection"),
        1,
    ),
    (
        "java.util.List",
        "kotlin.collections.List",
        Some("kotlin.collections.MutableList"),
        1,
    ),
    (
        "java.util.Set",
        "kotlin.collections.Set",
        Some("kotlin.collections.MutableSet"),
        1,
    ),
    (
        "java.util.Map",
        "kotlin.collections.Map",
        Some("kotlin.collections.MutableMap"),
        2,
    ),
    (
        "java.util.Map.Entry",
        "kotlin.collections.Map.Entry",
        Some("kotlin.collections.MutableMap.MutableEntry"),
        2,
    ),
];

/// Foreign primitive keywords and their native classes.
const PRIMITIVES: &[(&str, &str)] = &[
    ("boolean", "kotlin.Boolean"),
    ("byte", "kotlin.Byte"),
    ("char", "kotlin.Char"),
    ("short", "kotlin.Short"),
    ("int", "kotlin.Int"),
    ("long", "kotlin.Long"),
    ("float", "kotlin.Float"),
    ("double", "kotlin.Double"),
    ("void", "kotlin.Unit"),
];

/// Native-only classes the core refers to directly, with their arity.
const NATIVE_CLASSES: &[(&str, usize)] = &[
    ("kotlin.Nothing", 0),
    ("kotlin.Unit", 0),
    ("kotlin.Byte", 0),
    ("kotlin.Char", 0),
    ("kotlin.Short", 0),
    ("kotlin.Float", 0),
    ("kotlin.Array", 1),
    ("kotlin.jvm.functions.FunctionN", 1),
];

/// Foreign-to-native classifier table, built once per session.
pub struct PlatformClassMap {
    foreign_to_native: FxHashMap<Atom, PlatformMapping>,
    primitives: FxHashMap<Atom, ClassId>,
    read_only_to_mutable: FxHashMap<ClassId, ClassId>,
    mutable_to_read_only: FxHashMap<ClassId, ClassId>,
    kotlin_classes: Vec<(ClassId, usize)>,
    any: ClassId,
    array: ClassId,
    function_n: ClassId,
}

impl PlatformClassMap {
    /// Build the standard table, interning every name into `interner`.
    pub fn builtin(interner: &TypeInterner) -> Self {
        let mut foreign_to_native = FxHashMap::default();
        let mut read_only_to_mutable = FxHashMap::default();
        let mut mutable_to_read_only = FxHashMap::default();
        let mut kotlin_classes = Vec::new();

        for &(foreign, read_only, mutable, arity) in CLASS_MAPPINGS {
            let read_only = interner.class_id(read_only);
            let mutable = mutable.map(|name| interner.class_id(name));
            kotlin_classes.push((read_only, arity));
            if let Some(mutable) = mutable {
                kotlin_classes.push((mutable, arity));
                read_only_to_mutable.insert(read_only, mutable);
                mutable_to_read_only.insert(mutable, read_only);
            }
            foreign_to_native.insert(
                interner.intern_string(foreign),
                PlatformMapping { read_only, mutable },
            );
        }

        let primitives = PRIMITIVES
            .iter()
            .map(|&(keyword, native)| (interner.intern_string(keyword), interner.class_id(native)))
            .collect();

        for &(name, arity) in NATIVE_CLASSES {
            kotlin_classes.push((interner.class_id(name), arity));
        }

        Self {
            foreign_to_native,
            primitives,
            read_only_to_mutable,
            mutable_to_read_only,
            kotlin_classes,
            any: interner.class_id("kotlin.Any"),
            array: interner.class_id("kotlin.Array"),
            function_n: interner.class_id("kotlin.jvm.functions.FunctionN"),
        }
    }

    /// Native counterpart of a foreign class name, if it is a platform class.
    pub fn map_foreign(&self, foreign: Atom) -> Option<PlatformMapping> {
        self.foreign_to_native.get(&foreign).copied()
    }

    /// Native class for a foreign primitive keyword.
    pub fn map_primitive(&self, keyword: Atom) -> Option<ClassId> {
        self.primitives.get(&keyword).copied()
    }

    pub fn is_read_only(&self, class: ClassId) -> bool {
        self.read_only_to_mutable.contains_key(&class)
    }

    pub fn is_mutable(&self, class: ClassId) -> bool {
        self.mutable_to_read_only.contains_key(&class)
    }

    pub fn read_only_to_mutable(&self, class: ClassId) -> Option<ClassId> {
        self.read_only_to_mutable.get(&class).copied()
    }

    pub fn mutable_to_read_only(&self, class: ClassId) -> Option<ClassId> {
        self.mutable_to_read_only.get(&class).copied()
    }

    /// Every native class the table can produce, with its arity.
    pub fn kotlin_classes(&self) -> &[(ClassId, usize)] {
        &self.kotlin_classes
    }

    pub fn any(&self) -> ClassId {
        self.any
    }

    pub fn array(&self) -> ClassId {
        self.array
    }

    /// `kotlin.jvm.functions.FunctionN`, the raw function type marker.
    pub fn function_n(&self) -> ClassId {
        self.function_n
    }
}

#[cfg(test)]
#[path = "../tests/platform_tests.rs"]
mod tests;
