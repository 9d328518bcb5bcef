use super::*;
use crate::annotations::AnnotationTable;
use crate::config::EnhancementConfig;
use kava_types::{ClassifierStore, PlatformClassMap, TypeProjection};

struct Fixture {
    db: TypeInterner,
    store: ClassifierStore,
    platform: PlatformClassMap,
    table: AnnotationTable,
}

impl Fixture {
    fn new() -> Self {
        let db = TypeInterner::new();
        let platform = PlatformClassMap::builtin(&db);
        let store = ClassifierStore::new();
        store.register_platform_classes(&db, &platform);
        let table = AnnotationTable::compile(&EnhancementConfig::builtin(), &db);
        Self {
            db,
            store,
            platform,
            table,
        }
    }

    fn env(&self) -> EnhancementEnv<'_> {
        EnhancementEnv::new(&self.db, &self.store, &self.platform, &self.table)
    }

    fn fmt(&self, ty: TypeId) -> String {
        TypeFormatter::new(&self.db).with_store(&self.store).format(ty)
    }

    /// `(C..C?)` for a class without arguments.
    fn flexible_class(&self, name: &str) -> TypeId {
        let lower = self.db.simple_class(self.db.class_id(name));
        self.db.flexible(lower, self.db.with_nullability(lower, true))
    }

    /// `(MutableList<E>..List<E>?)`
    fn flexible_list(&self, element: TypeProjection) -> TypeId {
        let db = &self.db;
        db.flexible(
            db.class_type(db.class_id("kotlin.collections.MutableList"), [element], false),
            db.class_type(db.class_id("kotlin.collections.List"), [element], true),
        )
    }

    fn enhance(&self, ty: TypeId, qualifiers: Vec<TypeQualifiers>) -> Option<TypeId> {
        enhance(&self.env(), ty, &IndexedQualifiers::new(qualifiers))
    }
}

fn not_null() -> TypeQualifiers {
    TypeQualifiers::new(Some(NullabilityQualifier::NotNull), None)
}

fn nullable() -> TypeQualifiers {
    TypeQualifiers::new(Some(NullabilityQualifier::Nullable), None)
}

fn mutability(m: MutabilityQualifier) -> TypeQualifiers {
    TypeQualifiers::new(None, Some(m))
}

#[test]
fn test_subtree_sizes() {
    let db = TypeInterner::new();
    let leaf = |name: &str| db.simple_class(db.class_id(name));
    let b = db.class_type(
        db.class_id("B"),
        [
            TypeProjection::invariant(leaf("C")),
            TypeProjection::invariant(leaf("D")),
        ],
        false,
    );
    let e = db.class_type(db.class_id("E"), [TypeProjection::invariant(leaf("F"))], false);
    let a = db.class_type(
        db.class_id("A"),
        [TypeProjection::invariant(b), TypeProjection::invariant(e)],
        false,
    );
    assert_eq!(compute_subtree_sizes(&db, a).as_slice(), &[6, 3, 1, 1, 2, 1]);
}

#[test]
fn test_subtree_sizes_star_is_one_slot() {
    let db = TypeInterner::new();
    let map = db.class_type(
        db.class_id("Map"),
        [TypeProjection::STAR, TypeProjection::STAR],
        false,
    );
    assert_eq!(compute_subtree_sizes(&db, map).as_slice(), &[3, 1, 1]);
}

#[test]
fn test_not_null_collapses_flexible() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    let enhanced = fx.enhance(string, vec![not_null()]).expect("changed");
    assert_eq!(fx.fmt(enhanced), "String");
    assert!(
        fx.db
            .attributes(enhanced)
            .contains(TypeAttributes::ENHANCED_NULLABILITY)
    );
}

#[test]
fn test_nullable_collapses_flexible() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    let enhanced = fx.enhance(string, vec![nullable()]).expect("changed");
    assert_eq!(fx.fmt(enhanced), "String?");
}

#[test]
fn test_no_qualifiers_is_no_change() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    assert_eq!(fx.enhance(string, vec![]), None);
    assert_eq!(fx.enhance(string, vec![TypeQualifiers::NONE]), None);
    assert_eq!(fx.enhance(TypeId::ERROR, vec![not_null()]), None);
}

#[test]
fn test_read_only_rewrites_lower_bound() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    let list = fx.flexible_list(TypeProjection::invariant(string));
    let enhanced = fx
        .enhance(list, vec![mutability(MutabilityQualifier::ReadOnly)])
        .expect("changed");
    assert_eq!(
        fx.fmt(enhanced),
        "(List<(String..String?)>..List<(String..String?)>?)"
    );
}

#[test]
fn test_mutable_rewrites_upper_bound() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    let list = fx.flexible_list(TypeProjection::invariant(string));
    let enhanced = fx
        .enhance(list, vec![mutability(MutabilityQualifier::Mutable)])
        .expect("changed");
    assert_eq!(
        fx.fmt(enhanced),
        "(MutableList<(String..String?)>..MutableList<(String..String?)>?)"
    );
}

#[test]
fn test_mutability_ignored_on_inflexible_type() {
    let fx = Fixture::new();
    let db = &fx.db;
    let list = db.class_type(
        db.class_id("kotlin.collections.List"),
        [TypeProjection::STAR],
        false,
    );
    assert_eq!(
        fx.enhance(list, vec![mutability(MutabilityQualifier::Mutable)]),
        None
    );
}

#[test]
fn test_read_only_with_not_null_collapses_list() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    let list = fx.flexible_list(TypeProjection::invariant(string));
    let head = TypeQualifiers::new(
        Some(NullabilityQualifier::NotNull),
        Some(MutabilityQualifier::ReadOnly),
    );
    let enhanced = fx.enhance(list, vec![head, not_null()]).expect("changed");
    assert_eq!(fx.fmt(enhanced), "List<String>");
}

#[test]
fn test_argument_indices_skip_subtrees() {
    let fx = Fixture::new();
    let db = &fx.db;
    let string = fx.flexible_class("kotlin.String");
    let inner = fx.flexible_list(TypeProjection::invariant(string));
    let map = db.flexible(
        db.class_type(
            db.class_id("kotlin.collections.MutableMap"),
            [TypeProjection::invariant(inner), TypeProjection::invariant(string)],
            false,
        ),
        db.class_type(
            db.class_id("kotlin.collections.Map"),
            [TypeProjection::invariant(inner), TypeProjection::invariant(string)],
            true,
        ),
    );
    // [Map, List, String, String]: only the map's value argument is not-null.
    let enhanced = fx
        .enhance(
            map,
            vec![TypeQualifiers::NONE, TypeQualifiers::NONE, TypeQualifiers::NONE, not_null()],
        )
        .expect("changed");
    assert_eq!(
        fx.fmt(enhanced),
        "(MutableMap<(MutableList<(String..String?)>..List<(String..String?)>?), String>..\
         Map<(MutableList<(String..String?)>..List<(String..String?)>?), String>?)"
    );
}

#[test]
fn test_star_argument_is_left_alone() {
    let fx = Fixture::new();
    let db = &fx.db;
    let string = fx.flexible_class("kotlin.String");
    let map = db.class_type(
        db.class_id("kotlin.collections.Map"),
        [TypeProjection::STAR, TypeProjection::invariant(string)],
        false,
    );
    let enhanced = fx
        .enhance(map, vec![TypeQualifiers::NONE, not_null(), nullable()])
        .expect("changed");
    assert_eq!(fx.fmt(enhanced), "Map<*, String?>");
}

#[test]
fn test_not_null_type_parameter_becomes_definitely_not_null() {
    let fx = Fixture::new();
    let db = &fx.db;
    let t = fx.store.fresh_type_param(db.intern_string("T"), Vec::new());
    let ty = db.flexible(db.type_param(t, false), db.type_param(t, true));
    let q = TypeQualifiers {
        is_not_null_type_parameter: true,
        ..not_null()
    };
    let enhanced = fx.enhance(ty, vec![q]).expect("changed");
    assert_eq!(fx.fmt(enhanced), "T & Any");
}

#[test]
fn test_not_null_type_parameter_with_non_null_bound_stays_simple() {
    let fx = Fixture::new();
    let db = &fx.db;
    let any = db.simple_class(db.class_id("kotlin.Any"));
    let t = fx.store.fresh_type_param(db.intern_string("T"), vec![any]);
    let ty = db.flexible(db.type_param(t, false), db.type_param(t, true));
    let q = TypeQualifiers {
        is_not_null_type_parameter: true,
        ..not_null()
    };
    let enhanced = fx.enhance(ty, vec![q]).expect("changed");
    assert_eq!(fx.fmt(enhanced), "T");
}

#[test]
fn test_raw_type_stays_raw() {
    let fx = Fixture::new();
    let db = &fx.db;
    let any_q = db.class_type(db.class_id("kotlin.Any"), std::iter::empty(), true);
    let raw = db.raw_flexible(
        db.class_type(
            db.class_id("kotlin.collections.MutableList"),
            [TypeProjection::invariant(any_q)],
            false,
        ),
        db.class_type(
            db.class_id("kotlin.collections.List"),
            [TypeProjection::invariant(any_q)],
            true,
        ),
    );
    let enhanced = fx.enhance(raw, vec![not_null()]).expect("changed");
    assert_eq!(
        fx.fmt(enhanced),
        "raw (MutableList<Any?>..List<Any?>)"
    );
}

#[test]
fn test_enhancement_is_idempotent() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    let list = fx.flexible_list(TypeProjection::invariant(string));
    let tables = [
        vec![not_null(), nullable()],
        vec![mutability(MutabilityQualifier::ReadOnly), not_null()],
        vec![mutability(MutabilityQualifier::Mutable)],
        vec![nullable(), TypeQualifiers::NONE],
    ];
    for table in tables {
        let once = fx.enhance(list, table.clone()).expect("changed");
        assert_eq!(fx.enhance(once, table), None, "{}", fx.fmt(once));
    }
}

#[test]
fn test_warning_only_keeps_flexibility() {
    let fx = Fixture::new();
    let string = fx.flexible_class("kotlin.String");
    let q = TypeQualifiers {
        is_warning_only: true,
        ..not_null()
    };
    let enhanced = fx.enhance(string, vec![q]).expect("changed");
    assert_eq!(fx.fmt(enhanced), "(String..String?)");
    let lower = fx.db.lower_bound_if_flexible(enhanced);
    assert!(
        fx.db
            .attributes(lower)
            .contains(TypeAttributes::NULLABILITY_WARNING)
    );
    assert_eq!(fx.enhance(enhanced, vec![q]), None);
}

#[test]
fn test_warning_only_type_parameter_is_not_definitely_not_null() {
    let fx = Fixture::new();
    let db = &fx.db;
    let t = fx.store.fresh_type_param(db.intern_string("T"), Vec::new());
    let ty = db.flexible(db.type_param(t, false), db.type_param(t, true));
    let q = TypeQualifiers {
        is_warning_only: true,
        is_not_null_type_parameter: true,
        ..not_null()
    };
    let enhanced = fx.enhance(ty, vec![q]).expect("changed");
    assert!(!matches!(db.lookup(enhanced), Some(TypeData::DefinitelyNotNull(_))));
    assert_eq!(fx.fmt(enhanced), "(T..T?)");
    let lower = db.lower_bound_if_flexible(enhanced);
    assert!(db.attributes(lower).contains(TypeAttributes::NULLABILITY_WARNING));
}

#[test]
fn test_definitely_not_null_is_unchanged() {
    let fx = Fixture::new();
    let db = &fx.db;
    let t = fx.store.fresh_type_param(db.intern_string("T"), Vec::new());
    let dnn = db.definitely_not_null(db.type_param(t, false)).expect("type parameter");
    assert_eq!(fx.enhance(dnn, vec![nullable()]), None);
}

#[test]
#[should_panic(expected = "different argument shapes")]
fn test_mismatched_flexible_bounds_panic() {
    let fx = Fixture::new();
    let db = &fx.db;
    let string = db.simple_class(db.class_id("kotlin.String"));
    let broken = db.flexible(
        db.class_type(
            db.class_id("kotlin.collections.MutableList"),
            [TypeProjection::invariant(string)],
            false,
        ),
        db.class_type(
            db.class_id("kotlin.collections.Map"),
            [TypeProjection::invariant(string), TypeProjection::invariant(string)],
            true,
        ),
    );
    let _ = fx.enhance(broken, vec![not_null()]);
}
