use super::*;
use crate::scope::DeclaredMemberScope;
use crate::symbols::CallableBuilder;
use kava_types::{ClassInfo, TypeFormatter, TypeProjection};
use rayon::prelude::*;

struct Fixture {
    db: TypeInterner,
    store: ClassifierStore,
    symbols: SymbolIdAllocator,
    storage: FakeOverrideStorage,
    base: ClassId,
    derived: ClassId,
    t: TypeParamId,
}

impl Fixture {
    fn new() -> Self {
        let db = TypeInterner::new();
        let store = ClassifierStore::new();
        let t = store.fresh_type_param(db.intern_string("T"), Vec::new());
        let base = db.class_id("test.Base");
        let derived = db.class_id("test.Derived");
        store.register_class(ClassInfo {
            id: base,
            type_params: vec![t],
        });
        store.register_class(ClassInfo {
            id: derived,
            type_params: Vec::new(),
        });
        Self {
            db,
            store,
            symbols: SymbolIdAllocator::new(),
            storage: FakeOverrideStorage::new(),
            base,
            derived,
            t,
        }
    }

    fn env(&self) -> ScopeEnv<'_> {
        ScopeEnv {
            db: &self.db,
            store: &self.store,
            symbols: &self.symbols,
            storage: &self.storage,
        }
    }

    fn fmt(&self, ty: TypeId) -> String {
        TypeFormatter::new(&self.db).with_store(&self.store).format(ty)
    }

    fn t_type(&self) -> TypeId {
        self.db.type_param(self.t, false)
    }

    fn string(&self) -> TypeId {
        self.db.simple_class(self.db.class_id("kotlin.String"))
    }

    fn int(&self) -> TypeId {
        self.db.simple_class(self.db.class_id("kotlin.Int"))
    }

    fn list_of(&self, ty: TypeId) -> TypeId {
        self.db.class_type(
            self.db.class_id("kotlin.collections.List"),
            [TypeProjection::invariant(ty)],
            false,
        )
    }

    /// `T := String`, the view of `Base<T>` from `Derived : Base<String>`.
    fn t_to_string(&self) -> Substitutor {
        Substitutor::from_map(TypeSubstitution::from_args(&[self.t], &[self.string()]))
    }

    fn member(&self, name: &str, kind: CallableKind) -> CallableBuilder {
        CallableBuilder::new(self.symbols.alloc(), self.db.intern_string(name), kind, self.base)
    }

    fn scope<'a>(
        &'a self,
        use_site: &'a DeclaredMemberScope,
        owner: ClassId,
        substitutor: Substitutor,
    ) -> ClassSubstitutionScope<'a> {
        let key = ScopeKey::new(owner, self.db.simple_class(owner));
        ClassSubstitutionScope::new(self.env(), use_site, key, substitutor, true)
    }

    fn derived_scope<'a>(&'a self, use_site: &'a DeclaredMemberScope) -> ClassSubstitutionScope<'a> {
        self.scope(use_site, self.derived, self.t_to_string())
    }
}

fn functions(scope: &dyn MemberScope, name: Atom) -> Vec<CallableSymbol> {
    let mut out = Vec::new();
    scope.process_functions_by_name(name, &mut |s| out.push(Arc::clone(s)));
    out
}

fn properties(scope: &dyn MemberScope, name: Atom) -> Vec<CallableSymbol> {
    let mut out = Vec::new();
    scope.process_properties_by_name(name, &mut |s| out.push(Arc::clone(s)));
    out
}

#[test]
fn test_function_return_type_is_substituted() {
    let f = Fixture::new();
    let get = f
        .member("get", CallableKind::Function)
        .param(f.db.intern_string("index"), f.int())
        .returns(f.t_type())
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(get.clone());
    let scope = f.derived_scope(&base);

    let result = functions(&scope, get.name);
    assert_eq!(result.len(), 1);
    let derived_get = &result[0];
    assert!(!Arc::ptr_eq(derived_get, &get));
    assert_eq!(f.fmt(derived_get.return_type(&f.db).expect("resolved")), "String");
    assert_eq!(derived_get.params, get.params);
    assert_eq!(derived_get.owner, f.derived);
    assert!(Arc::ptr_eq(
        derived_get.original_for_substitution_override().expect("override"),
        &get
    ));
}

#[test]
fn test_repeated_queries_return_the_same_symbol() {
    let f = Fixture::new();
    let get = f.member("get", CallableKind::Function).returns(f.t_type()).build();
    let mut base = DeclaredMemberScope::new();
    base.add(get.clone());
    let scope = f.derived_scope(&base);

    let first = functions(&scope, get.name);
    let second = functions(&scope, get.name);
    assert!(Arc::ptr_eq(&first[0], &second[0]));

    // A second scope with the same key shares the cache.
    let again = f.derived_scope(&base);
    assert!(Arc::ptr_eq(&functions(&again, get.name)[0], &first[0]));
    assert_eq!(f.storage.scope_count(), 1);
}

#[test]
fn test_unaffected_function_keeps_original() {
    let f = Fixture::new();
    let size = f.member("size", CallableKind::Function).returns(f.int()).build();
    let mut base = DeclaredMemberScope::new();
    base.add(size.clone());
    let scope = f.derived_scope(&base);

    let result = functions(&scope, size.name);
    assert!(Arc::ptr_eq(&result[0], &size));
}

#[test]
fn test_empty_substitutor_is_identity() {
    let f = Fixture::new();
    let get = f.member("get", CallableKind::Function).returns(f.t_type()).build();
    let value = f.member("value", CallableKind::Property).returns(f.t_type()).build();
    let mut base = DeclaredMemberScope::new();
    base.add(get.clone());
    base.add(value.clone());
    let scope = f.scope(&base, f.derived, Substitutor::Empty);

    assert!(Arc::ptr_eq(&functions(&scope, get.name)[0], &get));
    assert!(Arc::ptr_eq(&properties(&scope, value.name)[0], &value));
}

#[test]
fn test_private_members_are_skipped() {
    let f = Fixture::new();
    let secret = f
        .member("secret", CallableKind::Function)
        .visibility(Visibility::Private)
        .returns(f.t_type())
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(secret.clone());
    let scope = f.derived_scope(&base);

    assert!(Arc::ptr_eq(&functions(&scope, secret.name)[0], &secret));
}

#[test]
fn test_type_parameters_are_recreated_with_substituted_bounds() {
    let f = Fixture::new();
    let r = f.store.fresh_type_param(f.db.intern_string("R"), vec![f.t_type()]);
    let r_type = f.db.type_param(r, false);
    let map = f
        .member("map", CallableKind::Function)
        .type_params([r])
        .param(f.db.intern_string("item"), r_type)
        .returns(f.list_of(r_type))
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(map.clone());
    let scope = f.derived_scope(&base);

    let derived_map = &functions(&scope, map.name)[0];
    assert_eq!(derived_map.type_params.len(), 1);
    let fresh = derived_map.type_params[0];
    assert_ne!(fresh, r);
    assert_eq!(f.store.type_param_name(fresh), Some(f.db.intern_string("R")));
    assert_eq!(f.store.type_param_bounds(fresh), vec![f.string()]);
    // The original parameter is untouched.
    assert_eq!(f.store.type_param_bounds(r), vec![f.t_type()]);

    let fresh_type = f.db.type_param(fresh, false);
    assert_eq!(derived_map.params[0].ty, fresh_type);
    assert_eq!(derived_map.return_type(&f.db), Some(f.list_of(fresh_type)));
}

#[test]
fn test_type_parameters_are_recreated_when_owner_changes() {
    let f = Fixture::new();
    let r = f.store.fresh_type_param(f.db.intern_string("R"), Vec::new());
    let r_type = f.db.type_param(r, false);
    let identity = f
        .member("identity", CallableKind::Function)
        .type_params([r])
        .param(f.db.intern_string("item"), r_type)
        .returns(r_type)
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(identity.clone());

    let scope = f.derived_scope(&base);
    let derived = &functions(&scope, identity.name)[0];
    assert!(!Arc::ptr_eq(derived, &identity));
    assert_ne!(derived.type_params[0], r);
    assert_eq!(
        derived.return_type(&f.db),
        Some(f.db.type_param(derived.type_params[0], false))
    );
}

#[test]
fn test_same_owner_without_changes_keeps_original() {
    let f = Fixture::new();
    let r = f.store.fresh_type_param(f.db.intern_string("R"), Vec::new());
    let r_type = f.db.type_param(r, false);
    let identity = f
        .member("identity", CallableKind::Function)
        .type_params([r])
        .returns(r_type)
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(identity.clone());

    let scope = f.scope(&base, f.base, f.t_to_string());
    assert!(Arc::ptr_eq(&functions(&scope, identity.name)[0], &identity));
}

#[test]
fn test_extension_receiver_is_substituted() {
    let f = Fixture::new();
    let ext = f
        .member("ext", CallableKind::Function)
        .receiver(f.list_of(f.t_type()))
        .returns(f.int())
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(ext.clone());
    let scope = f.derived_scope(&base);

    let derived = &functions(&scope, ext.name)[0];
    assert_eq!(derived.receiver, Some(f.list_of(f.string())));
    assert_eq!(derived.return_type(&f.db), Some(f.int()));
}

#[test]
fn test_unresolved_return_type_is_deferred() {
    let f = Fixture::new();
    let items = f.member("items", CallableKind::Property).build();
    let mut base = DeclaredMemberScope::new();
    base.add(items.clone());
    let scope = f.derived_scope(&base);

    let derived = &properties(&scope, items.name)[0];
    assert!(!Arc::ptr_eq(derived, &items));
    assert!(derived.has_deferred_return_type());
    assert_eq!(derived.return_type(&f.db), None);

    assert!(items.resolve_return_type(f.list_of(f.t_type())));
    assert_eq!(f.fmt(derived.return_type(&f.db).expect("resolved")), "List<String>");
}

#[test]
fn test_field_override() {
    let f = Fixture::new();
    let value = f.member("value", CallableKind::Field).returns(f.t_type()).build();
    let count = f.member("count", CallableKind::Field).returns(f.int()).build();
    let pending = f.member("pending", CallableKind::Field).build();
    let mut base = DeclaredMemberScope::new();
    base.add(value.clone());
    base.add(count.clone());
    base.add(pending.clone());
    let scope = f.derived_scope(&base);

    let derived_value = &properties(&scope, value.name)[0];
    assert_eq!(derived_value.return_type(&f.db), Some(f.string()));
    assert_eq!(derived_value.kind, CallableKind::Field);
    assert!(Arc::ptr_eq(&properties(&scope, count.name)[0], &count));
    assert!(Arc::ptr_eq(&properties(&scope, pending.name)[0], &pending));
}

#[test]
fn test_accessor_override() {
    let f = Fixture::new();
    let list_t = f.list_of(f.t_type());
    let items = f
        .member("items", CallableKind::Accessor)
        .returns(list_t)
        .setter_param(f.db.intern_string("value"), list_t)
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(items.clone());
    let scope = f.derived_scope(&base);

    let derived = &properties(&scope, items.name)[0];
    assert_eq!(derived.return_type(&f.db), Some(f.list_of(f.string())));
    assert_eq!(derived.setter_params.len(), 1);
    assert_eq!(derived.setter_params[0].ty, f.list_of(f.string()));
    assert_eq!(derived.setter_params[0].name, f.db.intern_string("value"));
}

#[test]
fn test_enum_entries_pass_through() {
    let f = Fixture::new();
    let red = f.member("RED", CallableKind::EnumEntry).returns(f.t_type()).build();
    let mut base = DeclaredMemberScope::new();
    base.add(red.clone());
    let scope = f.derived_scope(&base);

    assert!(Arc::ptr_eq(&properties(&scope, red.name)[0], &red));
    assert!(!scope.cache().contains(MemberFamily::Variables, red.id));
}

#[test]
fn test_constructor_override_ignores_visibility() {
    let f = Fixture::new();
    let ctor = f
        .member("<init>", CallableKind::Constructor)
        .visibility(Visibility::Private)
        .param(f.db.intern_string("value"), f.t_type())
        .returns(f.db.simple_class(f.base))
        .build();
    let mut base = DeclaredMemberScope::new();
    base.add(ctor.clone());
    let scope = f.derived_scope(&base);

    let mut seen = Vec::new();
    scope.process_declared_constructors(&mut |s| seen.push(Arc::clone(s)));
    assert_eq!(seen.len(), 1);
    assert!(!Arc::ptr_eq(&seen[0], &ctor));
    assert_eq!(seen[0].params[0].ty, f.string());
    assert!(scope.cache().contains(MemberFamily::Constructors, ctor.id));
}

#[test]
fn test_direct_overridden_maps_back_to_original() {
    let f = Fixture::new();
    let get = f.member("get", CallableKind::Function).returns(f.t_type()).build();
    let mut base = DeclaredMemberScope::new();
    base.add(get.clone());
    let scope = f.derived_scope(&base);
    let derived = Arc::clone(&functions(&scope, get.name)[0]);

    let mut seen = Vec::new();
    let action =
        scope.process_direct_overridden_functions_with_base_scope(&derived, &mut |overridden, _| {
            seen.push(overridden.id);
            ProcessorAction::Next
        });
    assert_eq!(action, ProcessorAction::Next);
    assert_eq!(seen, vec![get.id]);
}

#[test]
fn test_direct_overridden_delegates_for_foreign_symbols() {
    let f = Fixture::new();
    let get = f.member("get", CallableKind::Function).returns(f.t_type()).build();
    let parent = f.member("get", CallableKind::Function).returns(f.t_type()).build();
    let mut base = DeclaredMemberScope::new();
    base.add(get.clone());
    base.add_overridden(get.id, parent.clone());
    let scope = f.derived_scope(&base);

    let mut seen = Vec::new();
    let _ = scope.process_direct_overridden_functions_with_base_scope(&get, &mut |overridden, _| {
        seen.push(overridden.id);
        ProcessorAction::Next
    });
    assert_eq!(seen, vec![parent.id]);
}

#[test]
fn test_classifiers_are_seen_through_scope_substitution() {
    let f = Fixture::new();
    let mut base = DeclaredMemberScope::new();
    let name = f.db.intern_string("Entry");
    base.add_classifier(name, f.db.class_id("test.Base.Entry"));
    let scope = f.derived_scope(&base);

    let mut seen = Vec::new();
    scope.process_classifiers_by_name_with_substitution(name, &mut |_, substitutor| {
        seen.push(substitutor.substitute_or_self(&f.db, f.t_type()));
    });
    assert_eq!(seen, vec![f.string()]);
    assert_eq!(scope.classifier_names(), vec![name]);
}

#[test]
fn test_parallel_queries_share_one_override() {
    let f = Fixture::new();
    let get = f.member("get", CallableKind::Function).returns(f.t_type()).build();
    let mut base = DeclaredMemberScope::new();
    base.add(get.clone());
    let allocated_before = f.symbols.allocated();

    let results: Vec<CallableSymbol> = (0..64)
        .into_par_iter()
        .map(|_| {
            let scope = f.derived_scope(&base);
            functions(&scope, get.name).remove(0)
        })
        .collect();

    assert!(results.iter().all(|s| Arc::ptr_eq(s, &results[0])));
    assert_eq!(f.symbols.allocated(), allocated_before + 1);
}
