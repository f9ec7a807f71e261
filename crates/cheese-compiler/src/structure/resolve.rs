//! Lookup and lazy resolution of structure members.
//!
//! ## Algorithm
//!
//! A lookup checks, in order: resolved compile-time variables, runtime
//! globals, members currently being resolved (a cycle), members that already
//! failed, pending lazy members and finally function sets. A pending member is
//! removed from the lazy list before its initializer runs, so it is resolved
//! at most once whatever the outcome.

use cheese_ast::{DeclFlags, Expr, ExternFunctionDecl, ImportDecl, Member, VariableDecl};
use cheese_core::{CompileError, ErrorCode, Result, Scoped};

use crate::backend::GlobalRecord;
use crate::context::CompilationContext;
use crate::mangle::{combine_names, mangle};
use crate::object::{ScopeRef, TypeRef, ValueRef};
use crate::scope::Lookup;
use crate::types::{ComptimeVariable, Comptimeness, INCOMPATIBLE, TopLevelVariable, Type};
use crate::values::ValueData;

impl<'ast> CompilationContext<'ast> {
    /// Look up a member of a structure, resolving it if it is still lazy.
    ///
    /// Fields are not members in this sense; they are reached through values.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn structure_member(&mut self, st: TypeRef<'ast>, name: &str) -> Result<Option<Lookup<'ast>>> {
        let Some(structure) = self.structure(st) else {
            return Ok(None);
        };
        if let Some(variable) = structure.comptime_variables.get(name) {
            let value = variable.value;
            return Ok(Some(Lookup::Comptime(self.heap.scoped(value))));
        }
        if let Some(variable) = structure.top_level_variables.get(name) {
            return Ok(Some(Lookup::Runtime {
                ty: variable.ty,
                constant: variable.constant,
            }));
        }
        if structure.resolving.iter().any(|pending| pending == name) {
            return Err(CompileError::new(
                ErrorCode::NotComptime,
                format!("circular definition of `{}`", combine_names(&structure.name, name)),
            ));
        }
        if structure.failed.iter().any(|failed| failed == name) {
            return Err(CompileError::new(
                ErrorCode::NotComptime,
                format!("`{}` could not be resolved", combine_names(&structure.name, name)),
            ));
        }
        if structure.is_lazy(name) {
            let qualified = combine_names(&structure.name, name);
            return match self.resolve_lazy(st, name) {
                Ok(()) => self.structure_member(st, name),
                Err(_) => Err(CompileError::new(
                    ErrorCode::NotComptime,
                    format!("`{qualified}` could not be resolved"),
                )),
            };
        }
        if let Some(set) = structure.function_sets.get(name).copied() {
            return Ok(Some(Lookup::Comptime(self.function_set_value(set))));
        }
        Ok(None)
    }

    /// Resolve the lazy member `name` of `st`.
    ///
    /// A failure is raised here, located at the member, and recorded so later
    /// lookups report the member as unresolvable without raising again.
    pub fn resolve_lazy(&mut self, st: TypeRef<'ast>, name: &str) -> Result<()> {
        let (member, structure_name, scope) = {
            let Some(structure) = self.structure_mut(st) else {
                return Err(CompileError::new(ErrorCode::Internal, "lazy member on a non-structure"));
            };
            let Some(position) = structure.lazies.iter().position(|lazy| lazy.name == name) else {
                return Err(CompileError::new(
                    ErrorCode::Internal,
                    format!("`{name}` is not a lazy member of `{}`", structure.name),
                ));
            };
            let lazy = structure.lazies.remove(position);
            structure.resolving.push(name.to_string());
            (lazy.member, structure.name.clone(), structure.scope)
        };
        tracing::debug!(structure = %structure_name, member = name, "resolving lazy member");

        let result = match (scope, member) {
            (None, _) => Err(CompileError::new(ErrorCode::Internal, "structure has no scope")),
            (Some(scope), Member::Variable(decl)) => self.resolve_variable(st, scope, &structure_name, decl),
            (Some(scope), Member::Import(decl)) => self.resolve_import(st, scope, decl),
            (Some(scope), Member::ExternFunction(decl)) => self.resolve_extern(st, scope, decl),
            (Some(_), _) => Err(CompileError::new(
                ErrorCode::Internal,
                format!("`{name}` cannot be a lazy member"),
            )),
        };

        if let Some(structure) = self.structure_mut(st) {
            structure.resolving.retain(|pending| pending != name);
        }
        if let Err(err) = result {
            let err = err.located(member.span());
            self.raise(err.clone());
            if let Some(structure) = self.structure_mut(st) {
                structure.failed.push(name.to_string());
            }
            return Err(err);
        }
        Ok(())
    }

    /// Resolve every lazy member left in `st`. Failures are raised, not
    /// returned.
    pub fn resolve_all_lazies(&mut self, st: TypeRef<'ast>) {
        loop {
            let next = self
                .structure(st)
                .and_then(|structure| structure.lazies.first().map(|lazy| lazy.name));
            let Some(name) = next else {
                break;
            };
            // Raised inside; the member is removed from the lazy list either way.
            let _ = self.resolve_lazy(st, name);
        }
    }

    fn resolve_variable(
        &mut self,
        st: TypeRef<'ast>,
        scope: ScopeRef<'ast>,
        structure_name: &str,
        decl: VariableDecl<'ast>,
    ) -> Result<()> {
        let name = decl.name.name;
        let public = decl.flags.contains(DeclFlags::PUBLIC);
        let constant = !decl.flags.contains(DeclFlags::MUTABLE);
        let declared = match decl.ty {
            Some(ty) => Some(self.exec_type(scope, ty)?),
            None => None,
        };
        let declared = declared.filter(|ty| !matches!(self.ty(ty.get()), Type::Any));

        if let Expr::Structure(inner) = decl.value {
            let wants_type = declared
                .as_ref()
                .is_none_or(|ty| matches!(self.ty(ty.get()), Type::TypeType));
            if wants_type {
                // Installed before population so fields may refer back to it.
                let nested = self.create_structure(scope, inner, &combine_names(structure_name, name));
                let value = self.type_value(nested.get());
                self.install_comptime(st, name, value.get(), public, true);
                self.populate_structure(nested.get(), inner);
                return Ok(());
            }
        }

        let forced = decl.flags.contains(DeclFlags::COMPTIME)
            || declared
                .as_ref()
                .is_some_and(|ty| self.comptimeness(ty.get()) == Comptimeness::Comptime);
        if forced {
            let value = self.exec(scope, decl.value)?;
            let value = match &declared {
                Some(ty) => self
                    .coerce(value.get(), ty.get())
                    .map_err(|e| e.located(decl.value.span()))?,
                None => value,
            };
            self.install_comptime(st, name, value.get(), public, constant);
            return Ok(());
        }

        let (ty, initial) = match declared {
            Some(ty) => match self.try_exec(scope, decl.value) {
                Some(value) => {
                    let converted = self
                        .coerce(value.get(), ty.get())
                        .map_err(|e| e.located(decl.value.span()))?;
                    (ty, Some(converted))
                }
                None => {
                    let given = self.type_of(scope, decl.value)?;
                    if self.compare(ty.get(), given.get(), true) == INCOMPATIBLE {
                        return Err(CompileError::at(
                            ErrorCode::InvalidCast,
                            format!(
                                "cannot initialize `{}` from `{}`",
                                self.type_name(ty.get()),
                                self.type_name(given.get())
                            ),
                            decl.value.span(),
                        ));
                    }
                    (ty, None)
                }
            },
            None => match self.try_exec(scope, decl.value) {
                Some(value) if self.comptimeness(self.value(value.get()).ty) != Comptimeness::Runtime => {
                    self.install_comptime(st, name, value.get(), public, constant);
                    return Ok(());
                }
                Some(value) => {
                    let ty = self.value(value.get()).ty;
                    (self.heap.scoped(ty), Some(value))
                }
                None => (self.type_of(scope, decl.value)?, None),
            },
        };

        let mangled_name = if decl.flags.intersects(DeclFlags::EXPORT | DeclFlags::EXTERN) {
            name.to_string()
        } else {
            mangle(&combine_names(structure_name, name))
        };
        let backend = self.backend_type(ty.get()).map_err(|e| e.located(decl.span))?;
        let initial = initial.as_ref().map(Scoped::get);
        self.program.globals.push(GlobalRecord {
            mangled_name: mangled_name.clone(),
            ty: backend,
            constant,
            initial,
        });
        tracing::debug!(global = %mangled_name, ty = %self.type_name(ty.get()), "declared runtime global");
        if let Some(structure) = self.structure_mut(st) {
            structure.top_level_variables.insert(
                name.to_string(),
                TopLevelVariable {
                    public,
                    constant,
                    ty: ty.get(),
                    mangled_name,
                    initial,
                },
            );
        }
        Ok(())
    }

    fn resolve_import(&mut self, st: TypeRef<'ast>, scope: ScopeRef<'ast>, decl: ImportDecl<'ast>) -> Result<()> {
        let directory = self.scope_directory(scope);
        let imported = self.import_structure(directory.as_deref(), decl.path)?;
        let value = self.type_value(imported);
        self.install_comptime(st, decl.name.name, value.get(), false, true);
        Ok(())
    }

    fn resolve_extern(
        &mut self,
        st: TypeRef<'ast>,
        scope: ScopeRef<'ast>,
        decl: &'ast ExternFunctionDecl<'ast>,
    ) -> Result<()> {
        let arguments = decl
            .arguments
            .iter()
            .map(|argument| self.exec_type(scope, *argument))
            .collect::<Result<Vec<_>>>()?;
        let return_type = self.exec_type(scope, decl.return_type)?;
        for ty in arguments.iter().chain(std::iter::once(&return_type)) {
            if self.comptimeness(ty.get()) != Comptimeness::Runtime {
                return Err(CompileError::new(
                    ErrorCode::NoBackendType,
                    format!("extern function `{}` cannot use `{}`", decl.name.name, self.type_name(ty.get())),
                ));
            }
        }
        let ty = self.imported_function_type(arguments.iter().map(Scoped::get).collect(), return_type.get());
        let value = self.alloc_value(
            ty,
            ValueData::ImportedFunction {
                name: decl.name.name.to_string(),
            },
        );
        let public = decl.flags.contains(DeclFlags::PUBLIC);
        self.install_comptime(st, decl.name.name, value.get(), public, true);
        Ok(())
    }

    fn install_comptime(&mut self, st: TypeRef<'ast>, name: &str, value: ValueRef<'ast>, public: bool, constant: bool) {
        let ty = self.value(value).ty;
        if let Some(structure) = self.structure_mut(st) {
            structure.comptime_variables.insert(
                name.to_string(),
                ComptimeVariable {
                    public,
                    constant,
                    ty,
                    value,
                },
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompilerConfig;
    use bumpalo::Bump;
    use cheese_ast::{AstBuilder, BinaryOp, StructureDecl};
    use cheese_core::Scoped;

    fn setup<'ast>(ctx: &mut CompilationContext<'ast>, decl: &'ast StructureDecl<'ast>) -> Scoped<Type<'ast>> {
        let scope = ctx.root_scope(None);
        let st = ctx.create_structure(scope.get(), decl, "main");
        ctx.heap_mut().add_root(st.get());
        ctx.populate_structure(st.get(), decl);
        st
    }

    fn comptime_text<'ast>(ctx: &mut CompilationContext<'ast>, st: TypeRef<'ast>, name: &str) -> Option<String> {
        match ctx.structure_member(st, name) {
            Ok(Some(Lookup::Comptime(value))) => Some(ctx.value_to_string(value.get())),
            _ => None,
        }
    }

    #[test]
    fn lazy_member_resolves_once() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[b.variable("x", None, b.binary(BinaryOp::Add, b.int(40), b.int(2)), DeclFlags::empty())]);
        let st = setup(&mut ctx, decl);

        assert!(ctx.structure(st.get()).is_some_and(|s| s.is_lazy("x")));
        let first = match ctx.structure_member(st.get(), "x") {
            Ok(Some(Lookup::Comptime(value))) => value.get(),
            _ => panic!("expected a compile-time member"),
        };
        assert!(ctx.structure(st.get()).is_some_and(|s| !s.is_lazy("x")));
        let second = match ctx.structure_member(st.get(), "x") {
            Ok(Some(Lookup::Comptime(value))) => value.get(),
            _ => panic!("expected a compile-time member"),
        };
        assert_eq!(first, second);
        assert_eq!(ctx.value_to_string(first), "42");
    }

    #[test]
    fn members_may_refer_to_later_members() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[
            b.variable("a", None, b.binary(BinaryOp::Mul, b.name("b"), b.int(2)), DeclFlags::empty()),
            b.variable("b", None, b.int(21), DeclFlags::empty()),
        ]);
        let st = setup(&mut ctx, decl);
        assert_eq!(comptime_text(&mut ctx, st.get(), "a").as_deref(), Some("42"));
        assert!(!ctx.errored());
    }

    #[test]
    fn circular_definitions_fail_without_hanging() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[
            b.variable("a", None, b.name("b"), DeclFlags::empty()),
            b.variable("b", None, b.name("a"), DeclFlags::empty()),
        ]);
        let st = setup(&mut ctx, decl);
        let err = ctx.structure_member(st.get(), "a").err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::NotComptime));
        assert!(ctx.errored());
        let raised = ctx.diagnostics().len();

        // Both members are now recorded as failed; asking again raises nothing.
        assert!(ctx.structure_member(st.get(), "b").is_err());
        assert_eq!(ctx.diagnostics().len(), raised);
    }

    #[test]
    fn self_referential_structure_member() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let node = b.structure(&[
            b.field("value", b.i32_type()),
            b.field("next", b.pointer(b.name("Node"), false)),
        ]);
        let decl = b.structure(&[b.variable("Node", None, b.structure_expr(node), DeclFlags::empty())]);
        let st = setup(&mut ctx, decl);
        let node_type = match ctx.structure_member(st.get(), "Node") {
            Ok(Some(Lookup::Comptime(value))) => ctx.as_type(value.get()),
            _ => None,
        };
        let Some(node_type) = node_type else {
            panic!("Node should resolve to a type");
        };
        assert_eq!(ctx.type_name(node_type), "main.Node");
        let next = ctx.structure(node_type).and_then(|s| s.field("next")).map(|(_, f)| f.ty);
        let pointee = next.and_then(|ty| match ctx.ty(ty) {
            Type::Pointer { child, .. } => Some(*child),
            _ => None,
        });
        assert_eq!(pointee, Some(node_type));
        assert!(!ctx.errored());
    }

    #[test]
    fn typed_runtime_global_is_recorded() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[b.variable("counter", Some(b.i32_type()), b.int(7), DeclFlags::MUTABLE)]);
        let st = setup(&mut ctx, decl);
        let found = ctx.structure_member(st.get(), "counter");
        assert!(matches!(found, Ok(Some(Lookup::Runtime { constant: false, .. }))));
        assert_eq!(ctx.program().globals.len(), 1);
        assert_eq!(ctx.program().globals[0].mangled_name, mangle("main.counter"));
        let initial = ctx.program().globals[0].initial;
        assert_eq!(initial.map(|v| ctx.value_to_string(v)).as_deref(), Some("7"));
    }

    #[test]
    fn failed_member_is_raised_once() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[
            b.variable("broken", Some(b.i32_type()), b.string("nope"), DeclFlags::COMPTIME),
            b.variable("fine", None, b.int(1), DeclFlags::empty()),
        ]);
        let st = setup(&mut ctx, decl);
        ctx.resolve_all_lazies(st.get());
        assert_eq!(ctx.diagnostics().len(), 1);
        assert!(ctx.structure_member(st.get(), "broken").is_err());
        assert_eq!(ctx.diagnostics().len(), 1);
        assert_eq!(comptime_text(&mut ctx, st.get(), "fine").as_deref(), Some("1"));
    }

    #[test]
    fn extern_function_member() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[b.extern_function("puts", &[b.i32_type()], b.i32_type())]);
        let st = setup(&mut ctx, decl);
        let value = match ctx.structure_member(st.get(), "puts") {
            Ok(Some(Lookup::Comptime(value))) => value,
            _ => panic!("extern function should resolve"),
        };
        let ty = ctx.value(value.get()).ty;
        assert!(matches!(ctx.ty(ty), Type::ImportedFunction { .. }));
    }

    #[test]
    fn unknown_member_is_none() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[]);
        let st = setup(&mut ctx, decl);
        assert!(matches!(ctx.structure_member(st.get(), "missing"), Ok(None)));
    }
}
