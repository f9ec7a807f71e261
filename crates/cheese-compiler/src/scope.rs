//! Lexical evaluation scopes.
//!
//! A scope maps names to compile-time or runtime bindings and links to its
//! parent. A scope opened for a structure body also answers lookups with the
//! structure's members, resolving lazy ones on demand.

use std::path::PathBuf;

use rustc_hash::FxHashMap;

use cheese_core::{Result, Scoped, Trace, Tracer};

use crate::context::CompilationContext;
use crate::object::{ScopeRef, TypeRef, ValueRef};
use crate::values::Value;

/// What a name is bound to in a scope.
#[derive(Debug, Clone, Copy)]
pub enum Binding<'ast> {
    Comptime {
        ty: TypeRef<'ast>,
        value: ValueRef<'ast>,
        constant: bool,
    },
    Runtime {
        ty: TypeRef<'ast>,
        constant: bool,
    },
}

#[derive(Debug, Default)]
pub struct Scope<'ast> {
    pub parent: Option<ScopeRef<'ast>>,
    /// Structure whose body this scope evaluates.
    pub structure: Option<TypeRef<'ast>>,
    /// Directory of the source file, set on file-level scopes.
    pub directory: Option<PathBuf>,
    pub bindings: FxHashMap<String, Binding<'ast>>,
}

impl<'ast> Scope<'ast> {
    pub fn root(directory: Option<PathBuf>) -> Self {
        Self {
            directory,
            ..Self::default()
        }
    }

    pub fn child(parent: ScopeRef<'ast>) -> Self {
        Self {
            parent: Some(parent),
            ..Self::default()
        }
    }

    pub fn for_structure(parent: ScopeRef<'ast>, structure: TypeRef<'ast>) -> Self {
        Self {
            parent: Some(parent),
            structure: Some(structure),
            ..Self::default()
        }
    }
}

impl Trace for Scope<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        self.parent.trace(tracer);
        self.structure.trace(tracer);
        for binding in self.bindings.values() {
            match binding {
                Binding::Comptime { ty, value, .. } => {
                    tracer.mark(*ty);
                    tracer.mark(*value);
                }
                Binding::Runtime { ty, .. } => tracer.mark(*ty),
            }
        }
    }
}

/// Result of a name lookup.
#[derive(Debug, Clone)]
pub enum Lookup<'ast> {
    Comptime(Scoped<Value<'ast>>),
    Runtime { ty: TypeRef<'ast>, constant: bool },
}

impl<'ast> CompilationContext<'ast> {
    pub fn bind_comptime(&mut self, scope: ScopeRef<'ast>, name: &str, value: ValueRef<'ast>, constant: bool) {
        let ty = self.value(value).ty;
        self.scope_mut(scope)
            .bindings
            .insert(name.to_string(), Binding::Comptime { ty, value, constant });
    }

    pub fn bind_runtime(&mut self, scope: ScopeRef<'ast>, name: &str, ty: TypeRef<'ast>, constant: bool) {
        self.scope_mut(scope)
            .bindings
            .insert(name.to_string(), Binding::Runtime { ty, constant });
    }

    /// Resolve `name` from `scope` outwards.
    ///
    /// Structure scopes answer with their members (resolving lazy members on
    /// first use) and with `Self`. Returns `Ok(None)` when nothing binds the
    /// name.
    pub fn lookup(&mut self, scope: ScopeRef<'ast>, name: &str) -> Result<Option<Lookup<'ast>>> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            let (binding, structure, parent) = {
                let data = self.scope(scope);
                (data.bindings.get(name).copied(), data.structure, data.parent)
            };
            match binding {
                Some(Binding::Comptime { value, .. }) => {
                    return Ok(Some(Lookup::Comptime(self.heap.scoped(value))));
                }
                Some(Binding::Runtime { ty, constant }) => {
                    return Ok(Some(Lookup::Runtime { ty, constant }));
                }
                None => {}
            }
            if let Some(structure) = structure {
                if name == "Self" {
                    return Ok(Some(Lookup::Comptime(self.type_value(structure))));
                }
                if let Some(found) = self.structure_member(structure, name)? {
                    return Ok(Some(found));
                }
            }
            current = parent;
        }
        Ok(None)
    }

    /// The structure enclosing `scope`, if any.
    pub fn enclosing_structure(&self, scope: ScopeRef<'ast>) -> Option<TypeRef<'ast>> {
        let mut current = Some(scope);
        while let Some(scope) = current {
            let data = self.scope(scope);
            if data.structure.is_some() {
                return data.structure;
            }
            current = data.parent;
        }
        None
    }
}
