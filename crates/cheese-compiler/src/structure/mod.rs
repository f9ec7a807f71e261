//! Structure resolution.
//!
//! A structure declaration is translated in two steps. [`create_structure`]
//! allocates the type, groups functions into sets and records variables,
//! imports and extern functions as lazy members; [`populate_structure`] then
//! evaluates the field types. Splitting the two lets a variable whose
//! initializer is a structure install itself before its fields are read, so
//! `const Node = struct { next: *Node }` resolves.
//!
//! Lazy members are resolved on first lookup, exactly once. A failing member
//! raises its error and stays absent; other members are unaffected.
//!
//! ## Modules
//!
//! - [`translate`]: declaration to structure
//! - [`resolve`]: lazy member resolution and lookup
//!
//! [`create_structure`]: crate::CompilationContext::create_structure
//! [`populate_structure`]: crate::CompilationContext::populate_structure

pub mod resolve;
pub mod translate;

use crate::context::CompilationContext;
use crate::object::TypeRef;
use crate::types::Type;

impl<'ast> CompilationContext<'ast> {
    /// Structures reachable from `root` through compile-time type members,
    /// in discovery order.
    pub fn reachable_structures(&self, root: TypeRef<'ast>) -> Vec<TypeRef<'ast>> {
        let mut found = vec![root];
        let mut index = 0;
        while index < found.len() {
            let current = found[index];
            index += 1;
            let Some(structure) = self.structure(current) else {
                continue;
            };
            let mut nested: Vec<TypeRef<'ast>> = structure
                .comptime_variables
                .values()
                .filter_map(|variable| self.as_type(variable.value))
                .filter(|ty| matches!(self.ty(*ty), Type::Structure(_)))
                .collect();
            nested.sort();
            for ty in nested {
                if !found.contains(&ty) {
                    found.push(ty);
                }
            }
        }
        found
    }
}
