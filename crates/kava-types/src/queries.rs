//! Structural queries over resolved types.

use crate::intern::TypeInterner;
use crate::types::TypeId;

/// One node of a depth-first type-tree walk.
///
/// `ty` is `None` for a star projection, which still occupies its slot.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct FlattenedNode {
    pub ty: Option<TypeId>,
}

/// Flatten a type tree in canonical depth-first order: head first, then each
/// argument subtree left to right. A flexible type contributes the argument
/// tree of its lower bound.
///
/// Example: `A<B<C, D>, E<F>>` flattens to `[A, B, C, D, E, F]`.
pub fn flatten_type_tree(db: &TypeInterner, ty: TypeId) -> Vec<FlattenedNode> {
    let mut out = Vec::new();
    push_node(db, Some(ty), &mut out);
    out
}

fn push_node(db: &TypeInterner, ty: Option<TypeId>, out: &mut Vec<FlattenedNode>) {
    out.push(FlattenedNode { ty });
    let Some(ty) = ty else {
        return;
    };
    for arg in db.type_arguments(ty) {
        push_node(db, arg.ty, out);
    }
}

#[cfg(test)]
#[path = "../tests/queries_tests.rs"]
mod tests;
