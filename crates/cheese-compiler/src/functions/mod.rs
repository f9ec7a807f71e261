//! Function templates, overload sets and monomorphization.
//!
//! A [`FunctionTemplate`] pairs a function declaration with the scope it was
//! declared in. Same-named templates of one structure form a [`FunctionSet`].
//! Calling a set scores every template against the arguments, picks the
//! closest one and instantiates it into a [`ConcreteFunction`] whose mangled
//! name encodes the argument types and compile-time argument values.
//!
//! ## Algorithm
//!
//! 1. Score each template positionally ([`scoring`]); a distance of `-1` on
//!    any parameter vetoes the template
//! 2. Select the lowest total closeness; ties are ambiguous ([`select`])
//! 3. Reuse a structurally identical instance or create a new one
//!    ([`monomorph`])
//!
//! ## Modules
//!
//! - [`scoring`]: per-template closeness and argument binding
//! - [`select`]: overload selection
//! - [`monomorph`]: instance reuse, mangling and emission

pub mod monomorph;
pub mod scoring;
pub mod select;

use cheese_ast::FunctionDecl;
use cheese_core::{Scoped, Trace, Tracer};

use crate::object::{ConcreteRef, ScopeRef, TemplateRef, TypeRef, ValueRef};
use crate::types::Type;
use crate::values::Value;

pub use scoring::{Candidate, ScoreMode};

/// An unresolved function declaration with its defining scope.
#[derive(Debug)]
pub struct FunctionTemplate<'ast> {
    /// Qualified declaration path, e.g. `main.Point.length`.
    pub name: String,
    pub decl: &'ast FunctionDecl<'ast>,
    pub scope: ScopeRef<'ast>,
    /// Structure the function is declared in; `self` binds to it.
    pub structure: Option<TypeRef<'ast>>,
    pub instances: Vec<ConcreteRef<'ast>>,
}

impl Trace for FunctionTemplate<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark(self.scope);
        self.structure.trace(tracer);
        self.instances.trace(tracer);
    }
}

/// Same-named overloads of one structure.
#[derive(Debug)]
pub struct FunctionSet<'ast> {
    pub name: String,
    pub templates: Vec<TemplateRef<'ast>>,
}

impl Trace for FunctionSet<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        self.templates.trace(tracer);
    }
}

/// One parameter after binding.
#[derive(Debug, Clone)]
pub struct BoundArgument<'ast> {
    pub name: String,
    pub ty: TypeRef<'ast>,
    /// Set for compile-time-bound parameters.
    pub value: Option<ValueRef<'ast>>,
}

/// A fully typed instantiation of a template.
#[derive(Debug)]
pub struct ConcreteFunction<'ast> {
    pub mangled_name: String,
    pub template: TemplateRef<'ast>,
    /// Scope holding the parameter bindings.
    pub scope: ScopeRef<'ast>,
    pub arguments: Vec<BoundArgument<'ast>>,
    pub return_type: TypeRef<'ast>,
    /// Evaluated by the interpreter and never emitted.
    pub comptime: bool,
}

impl Trace for ConcreteFunction<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark(self.template);
        tracer.mark(self.scope);
        for argument in &self.arguments {
            tracer.mark(argument.ty);
            argument.value.trace(tracer);
        }
        tracer.mark(self.return_type);
    }
}

/// An argument at a call site.
#[derive(Debug, Clone)]
pub enum CallArg<'ast> {
    /// Only the type is known.
    Runtime(Scoped<Type<'ast>>),
    /// A compile-time value.
    Comptime(Scoped<Value<'ast>>),
}

impl<'ast> CallArg<'ast> {
    pub fn is_comptime(&self) -> bool {
        matches!(self, CallArg::Comptime(_))
    }
}
