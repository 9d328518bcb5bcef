//! Member scopes.

use kava_common::Atom;
use kava_types::{ClassId, Substitutor};
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::symbols::{CallableKind, CallableSymbol, SymbolId};

/// Whether a processor wants to see more results.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum ProcessorAction {
    Next,
    Stop,
}

impl ProcessorAction {
    pub const fn is_stop(self) -> bool {
        matches!(self, ProcessorAction::Stop)
    }
}

pub type OverriddenProcessor<'p> =
    dyn FnMut(&CallableSymbol, &dyn MemberScope) -> ProcessorAction + 'p;

/// Name-based access to the members visible in a class.
pub trait MemberScope: Send + Sync {
    fn process_functions_by_name(&self, name: Atom, processor: &mut dyn FnMut(&CallableSymbol));

    /// Properties, fields, accessors and enum entries.
    fn process_properties_by_name(&self, name: Atom, processor: &mut dyn FnMut(&CallableSymbol));

    fn process_declared_constructors(&self, processor: &mut dyn FnMut(&CallableSymbol));

    /// Classifiers with the substitution to view them through.
    fn process_classifiers_by_name_with_substitution(
        &self,
        name: Atom,
        processor: &mut dyn FnMut(ClassId, &Substitutor),
    );

    /// Functions `function` directly overrides, each with the scope it was
    /// found in.
    fn process_direct_overridden_functions_with_base_scope(
        &self,
        function: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction;

    fn process_direct_overridden_properties_with_base_scope(
        &self,
        property: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction;

    fn callable_names(&self) -> Vec<Atom>;

    fn classifier_names(&self) -> Vec<Atom>;
}

/// Scope over an explicit member list.
#[derive(Debug, Default)]
pub struct DeclaredMemberScope {
    functions: FxHashMap<Atom, SmallVec<[CallableSymbol; 1]>>,
    properties: FxHashMap<Atom, SmallVec<[CallableSymbol; 1]>>,
    constructors: Vec<CallableSymbol>,
    classifiers: FxHashMap<Atom, ClassId>,
    overridden: FxHashMap<SymbolId, Vec<CallableSymbol>>,
}

impl DeclaredMemberScope {
    pub fn new() -> Self {
        Self::default()
    }

    /// Add a member under its kind's family.
    pub fn add(&mut self, member: CallableSymbol) {
        let kind = member.kind;
        match kind {
            CallableKind::Function => self.functions.entry(member.name).or_default().push(member),
            CallableKind::Constructor => self.constructors.push(member),
            CallableKind::Property
            | CallableKind::Field
            | CallableKind::Accessor
            | CallableKind::EnumEntry => {
                self.properties.entry(member.name).or_default().push(member)
            }
        }
    }

    pub fn add_classifier(&mut self, name: Atom, class: ClassId) {
        self.classifiers.insert(name, class);
    }

    /// Record that `member` directly overrides `overridden`.
    pub fn add_overridden(&mut self, member: SymbolId, overridden: CallableSymbol) {
        self.overridden.entry(member).or_default().push(overridden);
    }

    fn process_overridden(
        &self,
        member: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction {
        for overridden in self.overridden.get(&member.id).into_iter().flatten() {
            if processor(overridden, self).is_stop() {
                return ProcessorAction::Stop;
            }
        }
        ProcessorAction::Next
    }
}

impl MemberScope for DeclaredMemberScope {
    fn process_functions_by_name(&self, name: Atom, processor: &mut dyn FnMut(&CallableSymbol)) {
        for function in self.functions.get(&name).into_iter().flatten() {
            processor(function);
        }
    }

    fn process_properties_by_name(&self, name: Atom, processor: &mut dyn FnMut(&CallableSymbol)) {
        for property in self.properties.get(&name).into_iter().flatten() {
            processor(property);
        }
    }

    fn process_declared_constructors(&self, processor: &mut dyn FnMut(&CallableSymbol)) {
        for constructor in &self.constructors {
            processor(constructor);
        }
    }

    fn process_classifiers_by_name_with_substitution(
        &self,
        name: Atom,
        processor: &mut dyn FnMut(ClassId, &Substitutor),
    ) {
        if let Some(&class) = self.classifiers.get(&name) {
            processor(class, &Substitutor::Empty);
        }
    }

    fn process_direct_overridden_functions_with_base_scope(
        &self,
        function: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction {
        self.process_overridden(function, processor)
    }

    fn process_direct_overridden_properties_with_base_scope(
        &self,
        property: &CallableSymbol,
        processor: &mut OverriddenProcessor<'_>,
    ) -> ProcessorAction {
        self.process_overridden(property, processor)
    }

    fn callable_names(&self) -> Vec<Atom> {
        let mut names: Vec<Atom> = self
            .functions
            .keys()
            .chain(self.properties.keys())
            .copied()
            .collect();
        names.sort_unstable();
        names.dedup();
        names
    }

    fn classifier_names(&self) -> Vec<Atom> {
        let mut names: Vec<Atom> = self.classifiers.keys().copied().collect();
        names.sort_unstable();
        names
    }
}

#[cfg(test)]
#[path = "../tests/scope_tests.rs"]
mod tests;
