//! Session-scoped state and the two entry points used by the resolution layer.

use std::path::Path;

use anyhow::{Context, Result};
use kava_enhance::{
    AnnotationTable, DefaultQualifierContext, EnhancementConfig, EnhancementEnv,
    EnhancementSignatureParts, ForeignTypeFactory, ForeignTypeRef, PredefinedEnhancementInfo,
    QualifierApplicability, TypeContainer,
};
use kava_scopes::{
    CallableSymbol, ClassSubstitutionScope, FakeOverrideStorage, MemberScope, ScopeEnv, ScopeKey,
    SymbolIdAllocator,
};
use kava_types::{ClassId, ClassifierStore, PlatformClassMap, Substitutor, TypeId, TypeInterner};
use tracing::{debug, info};

/// Everything that lives for one compilation session.
///
/// Caches held here are never shared with another session and are dropped
/// with it.
pub struct Session {
    pub interner: TypeInterner,
    pub store: ClassifierStore,
    pub platform: PlatformClassMap,
    pub annotations: AnnotationTable,
    pub symbols: SymbolIdAllocator,
    pub overrides: FakeOverrideStorage,
    root_context: DefaultQualifierContext,
}

impl Session {
    pub fn new(config: &EnhancementConfig) -> Self {
        let interner = TypeInterner::new();
        let platform = PlatformClassMap::builtin(&interner);
        let store = ClassifierStore::new();
        store.register_platform_classes(&interner, &platform);
        let annotations = AnnotationTable::compile(config, &interner);
        let root_context = annotations.root_context();
        info!(
            target: "kava::session",
            interner = interner.instance_id(),
            classes = store.class_count(),
            "session created"
        );
        Self {
            interner,
            store,
            platform,
            annotations,
            symbols: SymbolIdAllocator::new(),
            overrides: FakeOverrideStorage::new(),
            root_context,
        }
    }

    /// Session with the standard annotation table.
    pub fn with_builtin_config() -> Self {
        Self::new(&EnhancementConfig::builtin())
    }

    pub fn from_config_path(path: &Path) -> Result<Self> {
        let config = EnhancementConfig::from_path(path)
            .with_context(|| format!("failed to create session from {}", path.display()))?;
        Ok(Self::new(&config))
    }

    pub fn enhancement_env(&self) -> EnhancementEnv<'_> {
        EnhancementEnv::new(&self.interner, &self.store, &self.platform, &self.annotations)
    }

    pub fn scope_env(&self) -> ScopeEnv<'_> {
        ScopeEnv {
            db: &self.interner,
            store: &self.store,
            symbols: &self.symbols,
            storage: &self.overrides,
        }
    }

    /// Context carrying the session-wide default qualifiers.
    pub fn root_context(&self) -> &DefaultQualifierContext {
        &self.root_context
    }

    /// Builder for foreign type references in this session.
    pub fn foreign_types(&self) -> ForeignTypeFactory<'_> {
        ForeignTypeFactory::new(self.enhancement_env())
    }

    /// View of `use_site` from the class `owner`, whose type is `dispatch_receiver`.
    pub fn class_substitution_scope<'a>(
        &'a self,
        use_site: &'a dyn MemberScope,
        owner: ClassId,
        dispatch_receiver: TypeId,
        substitutor: Substitutor,
        skip_private_members: bool,
    ) -> ClassSubstitutionScope<'a> {
        ClassSubstitutionScope::new(
            self.scope_env(),
            use_site,
            ScopeKey::new(owner, dispatch_receiver),
            substitutor,
            skip_private_members,
        )
    }
}

/// One type position of a foreign declaration to enhance.
#[derive(Clone, Copy)]
pub struct EnhancementRequest<'a> {
    pub ty: &'a ForeignTypeRef,
    pub container: Option<&'a TypeContainer>,
    pub overridden_from: &'a [TypeId],
    pub is_covariant: bool,
    pub site: QualifierApplicability,
    /// Defaults from enclosing declarations; the session root when `None`.
    pub context: Option<&'a DefaultQualifierContext>,
    pub predefined: Option<&'a PredefinedEnhancementInfo>,
}

impl<'a> EnhancementRequest<'a> {
    pub fn new(ty: &'a ForeignTypeRef, site: QualifierApplicability) -> Self {
        Self {
            ty,
            container: None,
            overridden_from: &[],
            is_covariant: matches!(
                site,
                QualifierApplicability::ReturnType | QualifierApplicability::Field
            ),
            site,
            context: None,
            predefined: None,
        }
    }

    pub fn with_container(mut self, container: &'a TypeContainer) -> Self {
        self.container = Some(container);
        self
    }

    pub fn overriding(mut self, overridden_from: &'a [TypeId]) -> Self {
        self.overridden_from = overridden_from;
        self
    }

    pub fn covariant(mut self, is_covariant: bool) -> Self {
        self.is_covariant = is_covariant;
        self
    }

    pub fn in_context(mut self, context: &'a DefaultQualifierContext) -> Self {
        self.context = Some(context);
        self
    }

    pub fn with_predefined(mut self, predefined: &'a PredefinedEnhancementInfo) -> Self {
        self.predefined = Some(predefined);
        self
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct EnhancedType {
    pub ty: TypeId,
    /// Enhancement produced a different type than plain conversion.
    pub were_changes: bool,
    /// The unenhanced head classifier is `kotlin.jvm.functions.FunctionN`.
    pub contains_raw_function_type: bool,
}

/// Convert a foreign type and sharpen it with annotations, defaults and the
/// overridden declarations.
pub fn enhance(session: &Session, request: &EnhancementRequest<'_>) -> EnhancedType {
    let env = session.enhancement_env();
    let parts = EnhancementSignatureParts {
        current: request.ty,
        container: request.container,
        from_overridden: request.overridden_from,
        is_covariant: request.is_covariant,
        site: request.site,
        context: request.context.unwrap_or(session.root_context()),
    };
    let result = parts.enhance(&env, request.predefined);
    EnhancedType {
        ty: result.ty,
        were_changes: result.were_changes,
        contains_raw_function_type: result.contains_function_n,
    }
}

/// The member `original` as seen from `key.owner` through `substitutor`.
///
/// Repeated calls with the same key and member return the same symbol.
pub fn synthesize_override(
    session: &Session,
    use_site: &dyn MemberScope,
    original: &CallableSymbol,
    key: ScopeKey,
    substitutor: &Substitutor,
    skip_private_members: bool,
) -> CallableSymbol {
    let scope = ClassSubstitutionScope::new(
        session.scope_env(),
        use_site,
        key,
        substitutor.clone(),
        skip_private_members,
    );
    let symbol = scope.substitution_override(original);
    debug!(
        target: "kava::session",
        original = original.id.0,
        symbol = symbol.id.0,
        identity = std::sync::Arc::ptr_eq(&symbol, original),
        "synthesize_override"
    );
    symbol
}
