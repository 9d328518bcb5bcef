use super::*;
use crate::types::TypeProjection;

struct Fixture {
    db: TypeInterner,
    t: TypeParamId,
    u: TypeParamId,
    string: TypeId,
    int: TypeId,
    list: crate::types::ClassId,
}

fn fixture() -> Fixture {
    let db = TypeInterner::new();
    let string = db.simple_class(db.class_id("kotlin.String"));
    let int = db.simple_class(db.class_id("kotlin.Int"));
    let list = db.class_id("kotlin.collections.List");
    Fixture {
        db,
        t: TypeParamId(0),
        u: TypeParamId(1),
        string,
        int,
        list,
    }
}

#[test]
fn test_substitution_basic() {
    let f = fixture();
    let mut subst = TypeSubstitution::new();
    assert!(subst.is_empty());

    subst.insert(f.t, f.string);
    assert_eq!(subst.get(f.t), Some(f.string));
    assert_eq!(subst.get(f.u), None);
    assert_eq!(subst.len(), 1);
}

#[test]
fn test_substitution_from_args() {
    let f = fixture();
    let subst = TypeSubstitution::from_args(&[f.t, f.u], &[f.string, f.int]);
    assert_eq!(subst.get(f.t), Some(f.string));
    assert_eq!(subst.get(f.u), Some(f.int));
}

#[test]
fn test_empty_substitutor_is_identity() {
    let f = fixture();
    let t = f.db.type_param(f.t, false);
    assert!(Substitutor::Empty.is_empty());
    assert!(Substitutor::from_map(TypeSubstitution::new()).is_empty());
    assert_eq!(Substitutor::Empty.substitute_or_none(&f.db, t), None);
}

#[test]
fn test_substitute_type_parameter() {
    let f = fixture();
    let subst = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[f.string]));
    let t = f.db.type_param(f.t, false);
    let u = f.db.type_param(f.u, false);

    assert_eq!(subst.substitute_or_none(&f.db, t), Some(f.string));
    assert_eq!(subst.substitute_or_none(&f.db, u), None);
}

#[test]
fn test_substitute_nullable_use_makes_replacement_nullable() {
    let f = fixture();
    let subst = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[f.string]));
    let t_q = f.db.type_param(f.t, true);

    let result = subst.substitute_or_self(&f.db, t_q);
    assert_eq!(result, f.db.with_nullability(f.string, true));
}

#[test]
fn test_substitute_definitely_not_null_makes_replacement_not_null() {
    let f = fixture();
    let string_q = f.db.with_nullability(f.string, true);
    let subst = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[string_q]));
    let dnn = f
        .db
        .definitely_not_null(f.db.type_param(f.t, false))
        .expect("type parameter wraps");

    assert_eq!(subst.substitute_or_self(&f.db, dnn), f.string);
}

#[test]
fn test_substitute_into_arguments() {
    let f = fixture();
    let t = f.db.type_param(f.t, false);
    let list_t = f.db.class_type(f.list, [TypeProjection::out(t)], false);
    let subst = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[f.int]));

    let expected = f.db.class_type(f.list, [TypeProjection::out(f.int)], false);
    assert_eq!(subst.substitute_or_none(&f.db, list_t), Some(expected));

    let list_string = f.db.class_type(f.list, [TypeProjection::out(f.string)], false);
    assert_eq!(subst.substitute_or_none(&f.db, list_string), None);
}

#[test]
fn test_substitute_flexible_bound_by_bound() {
    let f = fixture();
    let lower = f.db.type_param(f.t, false);
    let upper = f.db.type_param(f.t, true);
    let flexible = f.db.flexible(lower, upper);
    let subst = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[f.string]));

    let result = subst.substitute_or_self(&f.db, flexible);
    assert_eq!(f.db.lower_bound_if_flexible(result), f.string);
    assert_eq!(
        f.db.upper_bound_if_flexible(result),
        f.db.with_nullability(f.string, true)
    );
}

#[test]
fn test_chain_applies_left_then_right() {
    let f = fixture();
    let t = f.db.type_param(f.t, false);
    let u = f.db.type_param(f.u, false);
    let first = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[u]));
    let second = Substitutor::from_map(TypeSubstitution::from_args(&[f.u], &[f.string]));

    let chained = first.chain(&second);
    assert_eq!(chained.substitute_or_none(&f.db, t), Some(f.string));

    let reversed = second.chain(&first);
    assert_eq!(reversed.substitute_or_none(&f.db, t), Some(u));
}

#[test]
fn test_chain_with_empty_is_the_other_side() {
    let f = fixture();
    let subst = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[f.int]));
    assert_eq!(Substitutor::Empty.chain(&subst), subst);
    assert_eq!(subst.chain(&Substitutor::Empty), subst);
    assert!(Substitutor::Empty.chain(&Substitutor::Empty).is_empty());
}

#[test]
fn test_chain_that_round_trips_reports_no_change() {
    let f = fixture();
    let t = f.db.type_param(f.t, false);
    let u = f.db.type_param(f.u, false);
    let there = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[u]));
    let back = Substitutor::from_map(TypeSubstitution::from_args(&[f.u], &[t]));

    assert_eq!(there.chain(&back).substitute_or_none(&f.db, t), None);
}

#[test]
fn test_error_type_is_never_substituted() {
    let f = fixture();
    let subst = Substitutor::from_map(TypeSubstitution::from_args(&[f.t], &[f.int]));
    assert_eq!(subst.substitute_or_none(&f.db, TypeId::ERROR), None);
}
