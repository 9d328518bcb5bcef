//! Kava: Type-Resolution Core
//!
//! Two engines used by a compiler front end that imports declarations from an
//! annotation-poor foreign type system:
//!
//! - **Type enhancement** (`kava-enhance`): converts foreign type references to
//!   flexible types and sharpens them with nullability and mutability
//!   qualifiers from annotations, defaults and overridden declarations
//! - **Substitution overrides** (`kava-scopes`): specializes members inherited
//!   from generic supertypes, cached once per member and scope
//!
//! A `Session` owns the interner, classifier store, compiled annotation table
//! and override cache; `enhance` and `synthesize_override` are the entry
//! points for the resolution layer.

pub mod session;
pub use session::{EnhancedType, EnhancementRequest, Session, enhance, synthesize_override};

pub mod tracing_config;
pub use tracing_config::{LogFormat, init_tracing};

pub use kava_common as common;
pub use kava_enhance as enhancement;
pub use kava_scopes as scopes;
pub use kava_types as types;
