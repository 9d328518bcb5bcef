//! Human-readable rendering of resolved types for traces and test failures.
//!
//! Class names are shortened to their last segment. Flexible types render as
//! `(lower..upper)`, raw flexible types with a leading `raw `.

use crate::def::ClassifierStore;
use crate::intern::TypeInterner;
use crate::types::{ProjectionKind, TypeAttributes, TypeData, TypeId};
use std::fmt::Write;

pub struct TypeFormatter<'a> {
    db: &'a TypeInterner,
    store: Option<&'a ClassifierStore>,
    show_attributes: bool,
}

impl<'a> TypeFormatter<'a> {
    pub fn new(db: &'a TypeInterner) -> Self {
        Self {
            db,
            store: None,
            show_attributes: false,
        }
    }

    /// Use the store to print type-parameter names instead of ids.
    pub fn with_store(mut self, store: &'a ClassifierStore) -> Self {
        self.store = Some(store);
        self
    }

    /// Prefix types carrying enhanced nullability with `@EnhancedNullability `.
    pub fn with_attributes(mut self) -> Self {
        self.show_attributes = true;
        self
    }

    pub fn format(&self, ty: TypeId) -> String {
        let mut out = String::new();
        self.write_type(ty, &mut out);
        out
    }

    fn write_type(&self, ty: TypeId, out: &mut String) {
        let Some(data) = self.db.lookup(ty) else {
            out.push_str("<unknown>");
            return;
        };
        match data {
            TypeData::Error => out.push_str("<error>"),
            TypeData::Class(class) => {
                self.write_attributes(class.attributes, out);
                let name = self.db.resolve_atom(class.classifier.0);
                out.push_str(name.rsplit('.').next().unwrap_or(&*name));
                if !class.args.is_empty() {
                    out.push('<');
                    for (i, arg) in class.args.iter().enumerate() {
                        if i > 0 {
                            out.push_str(", ");
                        }
                        match (arg.kind, arg.ty) {
                            (ProjectionKind::Star, _) | (_, None) => out.push('*'),
                            (ProjectionKind::In, Some(arg_ty)) => {
                                out.push_str("in ");
                                self.write_type(arg_ty, out);
                            }
                            (ProjectionKind::Out, Some(arg_ty)) => {
                                out.push_str("out ");
                                self.write_type(arg_ty, out);
                            }
                            (ProjectionKind::Invariant, Some(arg_ty)) => {
                                self.write_type(arg_ty, out)
                            }
                        }
                    }
                    out.push('>');
                }
                if class.nullable {
                    out.push('?');
                }
            }
            TypeData::TypeParameter(param) => {
                self.write_attributes(param.attributes, out);
                match self.store.and_then(|s| s.type_param_name(param.param)) {
                    Some(name) => out.push_str(&self.db.resolve_atom(name)),
                    None => {
                        let _ = write!(out, "T#{}", param.param.0);
                    }
                }
                if param.nullable {
                    out.push('?');
                }
            }
            TypeData::DefinitelyNotNull(inner) => {
                self.write_type(inner, out);
                out.push_str(" & Any");
            }
            TypeData::Flexible(flex) => {
                if flex.raw {
                    out.push_str("raw ");
                }
                out.push('(');
                self.write_type(flex.lower, out);
                out.push_str("..");
                self.write_type(flex.upper, out);
                out.push(')');
            }
        }
    }

    fn write_attributes(&self, attributes: TypeAttributes, out: &mut String) {
        if self.show_attributes && attributes.contains(TypeAttributes::ENHANCED_NULLABILITY) {
            out.push_str("@EnhancedNullability ");
        }
    }
}
