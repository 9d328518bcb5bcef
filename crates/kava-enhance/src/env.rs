//! Session tables the enhancement passes read.

use kava_types::{ClassifierStore, PlatformClassMap, TypeInterner};

use crate::annotations::AnnotationQualifierResolver;

/// Borrowed view of the session tables. Everything behind it is shared and
/// thread-safe; the view itself is `Copy`.
#[derive(Clone, Copy)]
pub struct EnhancementEnv<'a> {
    pub db: &'a TypeInterner,
    pub store: &'a ClassifierStore,
    pub platform: &'a PlatformClassMap,
    pub resolver: &'a dyn AnnotationQualifierResolver,
}

impl<'a> EnhancementEnv<'a> {
    pub fn new(
        db: &'a TypeInterner,
        store: &'a ClassifierStore,
        platform: &'a PlatformClassMap,
        resolver: &'a dyn AnnotationQualifierResolver,
    ) -> Self {
        Self {
            db,
            store,
            platform,
            resolver,
        }
    }
}
