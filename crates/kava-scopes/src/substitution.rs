//! Substitution-override synthesis.
//!
//! A `ClassSubstitutionScope` views the members of a generic supertype through
//! a concrete subtype. Each inherited member is specialized by substituting
//! its owner's type parameters; when nothing changes the original symbol is
//! returned as is. Results are memoized per scope key in the session's
//! `FakeOverrideStorage`, so repeated queries return the same symbol.

use std::sync::{Arc, OnceLock};

use kava_common::Atom;
use kava_types::{
    ClassId, ClassifierStore, Substitutor, TypeId, TypeInterner, TypeParamId, TypeSubstitution,
};
use tracing::debug;

use crate::scope::{MemberScope, OverriddenProcessor, ProcessorAction};
use crate::storage::{FakeOverrideStorage, MemberFamily, ScopeKey, SubstitutionOverrideCache};
use crate::symbols::{
    CallableKind, CallableMember, CallableOrigin, CallableSymbol, FakeOverrideSubstitution,
    ReturnTypeSlot, SymbolIdAllocator, ValueParameter, Visibility,
};

/// Borrowed view of the session tables the scopes need.
#[derive(Clone, Copy)]
pub struct ScopeEnv<'a> {
    pub db: &'a TypeInterner,
    pub store: &'a ClassifierStore,
    pub symbols: &'a SymbolIdAllocator,
    pub storage: &'a FakeOverrideStorage,
}

struct SubstitutedData {
    type_params: Vec<TypeParamId>,
    type_params_recreated: bool,
    substitutor: Substitutor,
    receiver: Option<TypeId>,
    return_type: Option<TypeId>,
    deferred: Option<FakeOverrideSubstitution>,
}

/// Everything that goes into a synthesized member besides the copied identity.
struct OverrideParts {
    type_params: Vec<TypeParamId>,
    receiver: Option<TypeId>,
    params: Vec<ValueParameter>,
    setter_params: Vec<ValueParameter>,
    return_type: ReturnTypeSlot,
}

pub struct ClassSubstitutionScope<'a> {
    env: ScopeEnv<'a>,
    use_site: &'a dyn MemberScope,
    key: ScopeKey,
    cache: Arc<SubstitutionOverrideCache>,
    substitutor: Substitutor,
    skip_private_members: bool,
}

impl<'a> ClassSubstitutionScope<'a> {
    /// Scope over `use_site` whose members are owned by `key.owner` after
    /// substitution.
    pub fn new(
        env: ScopeEnv<'a>,
        use_site: &'a dyn MemberScope,
        key: ScopeKey,
        substitutor: Substitutor,
        skip_private_members: bool,
    ) -> Self {
        let cache = env.storage.cache_for(key);
        Self {
            env,
            use_site,
            key,
            cache,
            substitutor,
            skip_private_members,
        }
    }

    pub fn key(&self) -> ScopeKey {
        self.key
    }

    pub fn substitutor(&self) -> &Substitutor {
        &self.substitutor
    }

    pub fn new_owner(&self) -> ClassId {
        self.key.owner
    }

    pub fn cache(&self) -> &SubstitutionOverrideCache {
        &self.cache
    }

    /// The memoized substitution override of `original` in this scope.
    pub fn substitution_override(&self, original: &CallableSymbol) -> CallableSymbol {
        let (family, create): (MemberFamily, fn(&Self, &CallableSymbol) -> CallableSymbol) =
            match original.kind {
                CallableKind::Function => (
                    MemberFamily::Functions,
                    Self::create_substitution_override_function,
                ),
                CallableKind::Constructor => (
                    MemberFamily::Constructors,
                    Self::create_substitution_override_constructor,
                ),
                CallableKind::Property => (
                    MemberFamily::Variables,
                    Self::create_substitution_override_property,
                ),
                CallableKind::Field => (
                    MemberFamily::Variables,
                    Self::create_substitution_override_field,
                ),
                CallableKind::Accessor => (
                    MemberFamily::Variables,
                    Self::create_substitution_override_accessor,
                ),
                CallableKind::EnumEntry => return Arc::clone(original),
            };
        self.cache
            .get_or_compute(family, original, || create(self, original))
    }

    fn skips(&self, member: &CallableMember) -> bool {
        self.substitutor.is_empty()
            || (self.skip_private_members && member.visibility == Visibility::Private)
    }

    pub fn create_substitution_override_function(&self, original: &CallableSymbol) -> CallableSymbol {
        if self.skips(original) {
            return Arc::clone(original);
        }
        let data = self.create_substituted_data(original);
        let params = substitute_params(self.env.db, &data.substitutor, &original.params);

        if data.receiver.is_none()
            && data.return_type.is_none()
            && params.is_none()
            && !data.type_params_recreated
            && data.deferred.is_none()
        {
            return Arc::clone(original);
        }

        let return_type = self.return_slot(original, data.return_type, data.deferred);
        self.build_override(
            original,
            OverrideParts {
                type_params: data.type_params,
                receiver: data.receiver.or(original.receiver),
                params: params.unwrap_or_else(|| original.params.clone()),
                setter_params: Vec::new(),
                return_type,
            },
        )
    }

    /// Constructors are never filtered by visibility.
    pub fn create_substitution_override_constructor(
        &self,
        original: &CallableSymbol,
    ) -> CallableSymbol {
        if self.substitutor.is_empty() {
            return Arc::clone(original);
        }
        let data = self.create_substituted_data(original);
        let params = substitute_params(self.env.db, &data.substitutor, &original.params);

        if data.return_type.is_none()
            && params.is_none()
            && !data.type_params_recreated
            && data.deferred.is_none()
        {
            return Arc::clone(original);
        }

        let return_type = self.return_slot(original, data.return_type, data.deferred);
        self.build_override(
            original,
            OverrideParts {
                type_params: data.type_params,
                receiver: None,
                params: params.unwrap_or_else(|| original.params.clone()),
                setter_params: Vec::new(),
                return_type,
            },
        )
    }

    pub fn create_substitution_override_property(&self, original: &CallableSymbol) -> CallableSymbol {
        if self.skips(original) {
            return Arc::clone(original);
        }
        let data = self.create_substituted_data(original);

        if data.receiver.is_none()
            && data.return_type.is_none()
            && !data.type_params_recreated
            && data.deferred.is_none()
        {
            return Arc::clone(original);
        }

        let return_type = self.return_slot(original, data.return_type, data.deferred);
        self.build_override(
            original,
            OverrideParts {
                type_params: data.type_params,
                receiver: data.receiver.or(original.receiver),
                params: Vec::new(),
                setter_params: Vec::new(),
                return_type,
            },
        )
    }

    /// Fields only have a type; an unresolved or unchanged type keeps the
    /// original.
    pub fn create_substitution_override_field(&self, original: &CallableSymbol) -> CallableSymbol {
        if self.skips(original) {
            return Arc::clone(original);
        }
        let db = self.env.db;
        let Some(new_type) = original
            .return_type(db)
            .and_then(|ty| self.substitutor.substitute_or_none(db, ty))
        else {
            return Arc::clone(original);
        };
        self.build_override(
            original,
            OverrideParts {
                type_params: Vec::new(),
                receiver: None,
                params: Vec::new(),
                setter_params: Vec::new(),
                return_type: ReturnTypeSlot::Resolved(new_type),
            },
        )
    }

    pub fn create_substitution_override_accessor(&self, original: &CallableSymbol) -> CallableSymbol {
        if self.skips(original) {
            return Arc::clone(original);
        }
        let db = self.env.db;
        let declared_return = original.return_type(db);
        let deferred = declared_return.is_none().then(|| FakeOverrideSubstitution {
            substitutor: self.substitutor.clone(),
            original: Arc::clone(original),
        });
        let new_return = declared_return.and_then(|ty| self.substitutor.substitute_or_none(db, ty));
        let getter_params = substitute_params(db, &self.substitutor, &original.params);
        let setter_params = substitute_params(db, &self.substitutor, &original.setter_params);

        if new_return.is_none()
            && getter_params.is_none()
            && setter_params.is_none()
            && deferred.is_none()
        {
            return Arc::clone(original);
        }

        let return_type = self.return_slot(original, new_return, deferred);
        self.build_override(
            original,
            OverrideParts {
                type_params: original.type_params.clone(),
                receiver: original.receiver,
                params: getter_params.unwrap_or_else(|| original.params.clone()),
                setter_params: setter_params.unwrap_or_else(|| original.setter_params.clone()),
                return_type,
            },
        )
    }

    fn create_substituted_data(&self, member: &CallableSymbol) -> SubstitutedData {
        let db = self.env.db;
        let force_recreation = member.owner != self.new_owner();
        let (type_params, type_params_recreated, substitutor) =
            self.create_new_type_parameters_and_substitutor(member, force_recreation);

        let receiver = member
            .receiver
            .and_then(|ty| substitutor.substitute_or_none(db, ty));
        let declared_return = member.return_type(db);
        let deferred = declared_return.is_none().then(|| FakeOverrideSubstitution {
            substitutor: substitutor.clone(),
            original: Arc::clone(member),
        });
        let return_type = declared_return.and_then(|ty| substitutor.substitute_or_none(db, ty));

        SubstitutedData {
            type_params,
            type_params_recreated,
            substitutor,
            receiver,
            return_type,
            deferred,
        }
    }

    /// Fresh copies of the member's own type parameters, when any bound
    /// changes under substitution or the owner changes.
    ///
    /// The returned substitutor is the scope's, followed by the mapping from
    /// old to fresh parameters.
    fn create_new_type_parameters_and_substitutor(
        &self,
        member: &CallableMember,
        force_recreation: bool,
    ) -> (Vec<TypeParamId>, bool, Substitutor) {
        if member.type_params.is_empty() {
            return (Vec::new(), false, self.substitutor.clone());
        }
        let db = self.env.db;
        let store = self.env.store;

        let bounds: Vec<Vec<TypeId>> = member
            .type_params
            .iter()
            .map(|&param| store.type_param_bounds(param))
            .collect();
        let bounds_change = bounds
            .iter()
            .flatten()
            .any(|&bound| self.substitutor.substitute_or_none(db, bound).is_some());
        if !force_recreation && !bounds_change {
            return (member.type_params.clone(), false, self.substitutor.clone());
        }

        let fresh: Vec<TypeParamId> = member
            .type_params
            .iter()
            .map(|&param| {
                let name = store.type_param_name(param).unwrap_or(Atom::NONE);
                store.fresh_type_param(name, Vec::new())
            })
            .collect();
        let fresh_types: Vec<TypeId> = fresh.iter().map(|&p| db.type_param(p, false)).collect();
        let renaming = Substitutor::from_map(TypeSubstitution::from_args(
            &member.type_params,
            &fresh_types,
        ));
        let substitutor = self.substitutor.chain(&renaming);

        for (&param, old_bounds) in fresh.iter().zip(&bounds) {
            let new_bounds = old_bounds
                .iter()
                .map(|&bound| substitutor.substitute_or_self(db, bound))
                .collect();
            store.set_type_param_bounds(param, new_bounds);
        }
        (fresh, true, substitutor)
    }

    fn return_slot(
        &self,
        original: &CallableMember,
        substituted: Option<TypeId>,
        deferred: Option<FakeOverrideSubstitution>,
    ) -> ReturnTypeSlot {
        match (deferred, substituted) {
            (Some(substitution), _) => ReturnTypeSlot::Deferred {
                substitution,
                resolved: OnceLock::new(),
            },
            (None, Some(ty)) => ReturnTypeSlot::Resolved(ty),
            (None, None) => {
                ReturnTypeSlot::Resolved(original.return_type(self.env.db).unwrap_or(TypeId::ERROR))
            }
        }
    }

    fn build_override(&self, original: &CallableSymbol, parts: OverrideParts) -> CallableSymbol {
        let symbol = Arc::new(CallableMember {
            id: self.env.symbols.alloc(),
            name: original.name,
            kind: original.kind,
            owner: self.new_owner(),
            visibility: original.visibility,
            type_params: parts.type_params,
            receiver: parts.receiver,
            params: parts.params,
            setter_params: parts.setter_params,
            return_type: parts.return_type,
            origin: CallableOrigin::SubstitutionOverride {
                original: Arc::clone(original),
            },
        });
        debug!(
            target: "kava::scopes",
            original = original.id.0,
            symbol = symbol.id.0,
            kind = ?symbol.kind,
            deferred = symbol.has_deferred_return_type(),
            "created substitution override"
        );
        symbol
    }

    fn process_direct_overridden(
        &self,
        family: MemberFamily,
        symbol: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction {
        let original = symbol
            .original_for_substitution_override()
            .filter(|original| self.cache.contains(family, original.id));
        let Some(original) = original else {
            return delegate_overridden(self.use_site, family, symbol, processor);
        };
        if processor(original, self.use_site).is_stop() {
            return ProcessorAction::Stop;
        }
        delegate_overridden(self.use_site, family, original, processor)
    }
}

fn delegate_overridden(
    scope: &dyn MemberScope,
    family: MemberFamily,
    symbol: &CallableSymbol,
    processor: &mut OverriddenProcessor<'_>,
) -> ProcessorAction {
    match family {
        MemberFamily::Variables => {
            scope.process_direct_overridden_properties_with_base_scope(symbol, processor)
        }
        MemberFamily::Functions | MemberFamily::Constructors => {
            scope.process_direct_overridden_functions_with_base_scope(symbol, processor)
        }
    }
}

/// Substituted parameter list, or `None` when no parameter type changes.
fn substitute_params(
    db: &TypeInterner,
    substitutor: &Substitutor,
    params: &[ValueParameter],
) -> Option<Vec<ValueParameter>> {
    let substituted: Vec<Option<TypeId>> = params
        .iter()
        .map(|param| substitutor.substitute_or_none(db, param.ty))
        .collect();
    if substituted.iter().all(Option::is_none) {
        return None;
    }
    Some(
        params
            .iter()
            .zip(substituted)
            .map(|(param, new_ty)| ValueParameter {
                ty: new_ty.unwrap_or(param.ty),
                ..*param
            })
            .collect(),
    )
}

impl MemberScope for ClassSubstitutionScope<'_> {
    fn process_functions_by_name(&self, name: Atom, processor: &mut dyn FnMut(&CallableSymbol)) {
        self.use_site.process_functions_by_name(name, &mut |original| {
            processor(&self.substitution_override(original));
        });
    }

    fn process_properties_by_name(&self, name: Atom, processor: &mut dyn FnMut(&CallableSymbol)) {
        self.use_site.process_properties_by_name(name, &mut |original| {
            if original.kind.is_overridable_variable() {
                processor(&self.substitution_override(original));
            } else {
                processor(original);
            }
        });
    }

    fn process_declared_constructors(&self, processor: &mut dyn FnMut(&CallableSymbol)) {
        self.use_site.process_declared_constructors(&mut |original| {
            processor(&self.substitution_override(original));
        });
    }

    fn process_classifiers_by_name_with_substitution(
        &self,
        name: Atom,
        processor: &mut dyn FnMut(ClassId, &Substitutor),
    ) {
        self.use_site
            .process_classifiers_by_name_with_substitution(name, &mut |class, substitutor| {
                processor(class, &substitutor.chain(&self.substitutor));
            });
    }

    fn process_direct_overridden_functions_with_base_scope(
        &self,
        function: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction {
        self.process_direct_overridden(MemberFamily::Functions, function, processor)
    }

    fn process_direct_overridden_properties_with_base_scope(
        &self,
        property: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction {
        self.process_direct_overridden(MemberFamily::Variables, property, processor)
    }

    fn callable_names(&self) -> Vec<Atom> {
        self.use_site.callable_names()
    }

    fn classifier_names(&self) -> Vec<Atom> {
        self.use_site.classifier_names()
    }
}

#[cfg(test)]
#[path = "../tests/substitution_tests.rs"]
mod tests;
