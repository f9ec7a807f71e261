//! Translation of structure declarations.

use rustc_hash::FxHashMap;

use cheese_ast::{DeclFlags, Member, StructureDecl};
use cheese_core::{CompileError, ErrorCode, Scoped};

use crate::context::CompilationContext;
use crate::functions::{FunctionSet, FunctionTemplate};
use crate::mangle::combine_names;
use crate::object::{ScopeRef, TypeRef};
use crate::scope::Scope;
use crate::types::{Field, LazyMember, Type, tuple_field_name};

/// What a member name is already used by.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Claim {
    Function,
    Other,
}

impl<'ast> CompilationContext<'ast> {
    /// Allocate the structure for `decl` and record its members.
    ///
    /// Fields are left empty until [`populate_structure`](Self::populate_structure).
    /// Duplicate names are raised and the later member is dropped.
    pub fn create_structure(
        &mut self,
        parent: ScopeRef<'ast>,
        decl: &'ast StructureDecl<'ast>,
        name: &str,
    ) -> Scoped<Type<'ast>> {
        let structure = self.declare_structure(name, decl.is_tuple);
        let registered = self
            .structure(structure.get())
            .map(|data| data.name.clone())
            .unwrap_or_default();
        let scope = self.heap.alloc(Scope::for_structure(parent, structure.get()));
        if let Some(data) = self.structure_mut(structure.get()) {
            data.scope = Some(scope.get());
        }

        let mut claims: FxHashMap<String, Claim> = FxHashMap::default();
        let mut sets: Vec<(String, Vec<Scoped<FunctionTemplate<'ast>>>)> = Vec::new();
        let mut lazies = Vec::new();
        let mut positional = 0usize;
        for member in decl.members {
            let (member_name, claim) = match member {
                Member::Field(field) => {
                    let name = match field.name {
                        Some(ident) => ident.name.to_string(),
                        None => tuple_field_name(positional),
                    };
                    positional += 1;
                    (name, Claim::Other)
                }
                Member::Function(function) => (function.name.name.to_string(), Claim::Function),
                Member::Variable(variable) => (variable.name.name.to_string(), Claim::Other),
                Member::Import(import) => (import.name.name.to_string(), Claim::Other),
                Member::ExternFunction(function) => (function.name.name.to_string(), Claim::Other),
            };
            match claims.get(&member_name) {
                Some(Claim::Function) if claim == Claim::Function => {}
                Some(_) => {
                    self.raise(CompileError::at(
                        ErrorCode::DuplicateName,
                        format!("`{member_name}` is already declared in `{registered}`"),
                        member.span(),
                    ));
                    continue;
                }
                None => {
                    claims.insert(member_name.clone(), claim);
                }
            }

            match member {
                Member::Field(_) => {}
                Member::Function(function) => {
                    let template = self.heap.alloc(FunctionTemplate {
                        name: combine_names(&registered, &member_name),
                        decl: *function,
                        scope: scope.get(),
                        structure: Some(structure.get()),
                        instances: Vec::new(),
                    });
                    if function.flags.contains(DeclFlags::ENTRY) {
                        self.register_entry(template.get(), function.span);
                    }
                    match sets.iter_mut().find(|(name, _)| *name == member_name) {
                        Some((_, templates)) => templates.push(template),
                        None => sets.push((member_name, vec![template])),
                    }
                }
                Member::Variable(_) | Member::Import(_) | Member::ExternFunction(_) => {
                    if let Some(lazy_name) = member.name() {
                        lazies.push(LazyMember {
                            name: lazy_name,
                            member: *member,
                        });
                    }
                }
            }
        }

        let mut function_sets = FxHashMap::default();
        for (member_name, templates) in &sets {
            let set = self.heap.alloc(FunctionSet {
                name: combine_names(&registered, member_name),
                templates: templates.iter().map(Scoped::get).collect(),
            });
            function_sets.insert(member_name.clone(), set);
        }
        if let Some(data) = self.structure_mut(structure.get()) {
            data.lazies = lazies;
            data.function_sets = function_sets.iter().map(|(name, set)| (name.clone(), set.get())).collect();
        }
        tracing::trace!(
            structure = %registered,
            functions = sets.len(),
            "translated structure"
        );
        structure
    }

    /// Evaluate the field types of a created structure.
    ///
    /// A field whose type fails to evaluate is raised and left out.
    pub fn populate_structure(&mut self, ty: TypeRef<'ast>, decl: &'ast StructureDecl<'ast>) {
        let Some(scope) = self.structure(ty).and_then(|data| data.scope) else {
            return;
        };
        let mut fields: Vec<Field<'ast>> = Vec::new();
        let mut keep = Vec::new();
        let mut positional = 0usize;
        for member in decl.members {
            let Member::Field(field) = member else {
                continue;
            };
            let name = match field.name {
                Some(ident) => ident.name.to_string(),
                None => tuple_field_name(positional),
            };
            positional += 1;
            if fields.iter().any(|existing| existing.name == name) {
                continue;
            }
            match self.exec_type(scope, field.ty) {
                Ok(field_type) => {
                    fields.push(Field {
                        name,
                        ty: field_type.get(),
                    });
                    keep.push(field_type);
                }
                Err(err) => self.raise(err.located(field.span)),
            }
        }
        if let Some(data) = self.structure_mut(ty) {
            data.fields = fields;
        }
    }

    fn register_entry(&mut self, template: crate::object::TemplateRef<'ast>, span: cheese_core::Span) {
        match self.entry {
            Some(existing) if existing != template => {
                let name = self.template(existing).name.clone();
                self.raise(CompileError::at(
                    ErrorCode::MultipleEntries,
                    format!("another entry function is already declared: `{name}`"),
                    span,
                ));
            }
            Some(_) => {}
            None => {
                self.heap.add_root(template);
                self.entry = Some(template);
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompilerConfig;
    use bumpalo::Bump;
    use cheese_ast::{AstBuilder, FunctionBody};

    #[test]
    fn members_are_sorted_into_kinds() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[
            b.field("x", b.i32_type()),
            b.variable("limit", None, b.int(3), DeclFlags::empty()),
            b.function("f", &[], b.void_type(), FunctionBody::Expr(b.none()), DeclFlags::empty()),
            b.function("f", &[b.param("a", b.i32_type())], b.void_type(), FunctionBody::Expr(b.none()), DeclFlags::empty()),
        ]);
        let scope = ctx.root_scope(None);
        let st = ctx.create_structure(scope.get(), decl, "main");
        ctx.populate_structure(st.get(), decl);
        let Some(data) = ctx.structure(st.get()) else {
            panic!("expected a structure");
        };
        assert_eq!(data.fields.len(), 1);
        assert!(data.is_lazy("limit"));
        let set = data.function_sets.get("f").copied();
        assert_eq!(set.map(|s| ctx.function_set(s).templates.len()), Some(2));
        assert_eq!(set.map(|s| ctx.function_set(s).name.clone()).as_deref(), Some("main.f"));
        assert!(!ctx.errored());
    }

    #[test]
    fn duplicate_names_are_raised() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[
            b.field("x", b.i32_type()),
            b.variable("x", None, b.int(3), DeclFlags::empty()),
        ]);
        let scope = ctx.root_scope(None);
        let st = ctx.create_structure(scope.get(), decl, "dup");
        assert!(ctx.structure(st.get()).is_some_and(|s| s.lazies.is_empty()));
        assert_eq!(ctx.diagnostics().first().map(|e| e.code), Some(ErrorCode::DuplicateName));
    }

    #[test]
    fn tuple_fields_are_positional() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.tuple_structure(&[b.positional_field(b.i32_type()), b.positional_field(b.f64_type())]);
        let scope = ctx.root_scope(None);
        let st = ctx.create_structure(scope.get(), decl, "Pair");
        ctx.populate_structure(st.get(), decl);
        let names: Vec<String> = ctx
            .structure(st.get())
            .map(|s| s.fields.iter().map(|f| f.name.clone()).collect())
            .unwrap_or_default();
        assert_eq!(names, vec!["_0", "_1"]);
    }

    #[test]
    fn bad_field_type_is_skipped() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[b.field("bad", b.int(3)), b.field("good", b.i32_type())]);
        let scope = ctx.root_scope(None);
        let st = ctx.create_structure(scope.get(), decl, "S");
        ctx.populate_structure(st.get(), decl);
        assert_eq!(ctx.structure(st.get()).map(|s| s.fields.len()), Some(1));
        assert_eq!(ctx.diagnostics().first().map(|e| e.code), Some(ErrorCode::ExpectedType));
    }

    #[test]
    fn second_entry_is_rejected() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let decl = b.structure(&[
            b.function("a", &[], b.void_type(), FunctionBody::Expr(b.none()), DeclFlags::ENTRY),
            b.function("b", &[], b.void_type(), FunctionBody::Expr(b.none()), DeclFlags::ENTRY),
        ]);
        let scope = ctx.root_scope(None);
        let _st = ctx.create_structure(scope.get(), decl, "main");
        assert!(ctx.entry().is_some_and(|entry| ctx.template(entry).name == "main.a"));
        assert_eq!(ctx.diagnostics().first().map(|e| e.code), Some(ErrorCode::MultipleEntries));
    }
}
