//! Scoring a template against a call's arguments.
//!
//! Parameters are processed left to right in a child of the template's
//! scope; every bound parameter is visible to the type expressions of the
//! parameters after it, so `fn f(comptime T: type, x: T)` works.

use cheese_ast::{DeclFlags, ParamKind};
use cheese_core::{Result, Scoped};

use super::{BoundArgument, CallArg};
use crate::context::CompilationContext;
use crate::object::{TemplateRef, TypeRef};
use crate::scope::Scope;
use crate::types::{ANY_DISTANCE, Comptimeness, INCOMPATIBLE, Type};

/// How the `any` penalty applies.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ScoreMode {
    /// An ordinary call.
    Call,
    /// A zero-argument probe, e.g. entry instantiation; `any` parameters
    /// cost nothing. Compile-time forcing still applies.
    Probe,
}

/// A template that accepts the arguments, with its bindings.
#[derive(Debug)]
pub struct Candidate<'ast> {
    pub template: TemplateRef<'ast>,
    /// Child of the template scope holding every parameter binding.
    pub scope: Scoped<Scope<'ast>>,
    pub arguments: Vec<BoundArgument<'ast>>,
    pub return_type: Scoped<Type<'ast>>,
    /// Summed conversion distance, never negative.
    pub closeness: i32,
}

/// Name a parameter binds under.
pub fn parameter_name(kind: &ParamKind<'_>, index: usize) -> String {
    match kind {
        ParamKind::SelfRef { .. } => "self".to_string(),
        ParamKind::Named { name: Some(name), .. } => name.name.to_string(),
        ParamKind::Named { name: None, .. } => format!("${index}"),
    }
}

impl<'ast> CompilationContext<'ast> {
    /// Type of a call argument.
    pub fn call_arg_type(&self, argument: &CallArg<'ast>) -> TypeRef<'ast> {
        match argument {
            CallArg::Runtime(ty) => ty.get(),
            CallArg::Comptime(value) => self.value(value.get()).ty,
        }
    }

    /// Score `template` against `arguments`.
    ///
    /// Returns `Ok(None)` when the template cannot accept the arguments.
    /// Errors come from evaluating parameter or return type expressions.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn score(
        &mut self,
        template: TemplateRef<'ast>,
        arguments: &[CallArg<'ast>],
        mode: ScoreMode,
    ) -> Result<Option<Candidate<'ast>>> {
        let (decl, parent, structure) = {
            let data = self.template(template);
            (data.decl, data.scope, data.structure)
        };
        if decl.params.len() != arguments.len() {
            return Ok(None);
        }
        let forced = decl.flags.contains(DeclFlags::COMPTIME);
        let scope = self.child_scope(parent);
        let mut bound = Vec::with_capacity(arguments.len());
        let mut closeness = 0i32;

        for (index, (param, argument)) in decl.params.iter().zip(arguments).enumerate() {
            let name = parameter_name(&param.kind, index);
            let given = self.call_arg_type(argument);
            let (expected, flagged) = match param.kind {
                ParamKind::SelfRef { constant } => {
                    let Some(structure) = structure else {
                        return Ok(None);
                    };
                    let reference = self.reference_type(structure, constant);
                    (self.heap.scoped(reference), false)
                }
                ParamKind::Named { ty, comptime, .. } => (self.exec_type(scope.get(), ty)?, comptime),
            };

            let (bound_type, distance) = if matches!(self.ty(expected.get()), Type::Any) {
                let penalty = if mode == ScoreMode::Probe { 0 } else { ANY_DISTANCE };
                (given, penalty)
            } else {
                (expected.get(), self.compare(expected.get(), given, true))
            };
            if distance == INCOMPATIBLE {
                return Ok(None);
            }
            closeness = closeness.saturating_add(distance);

            let comptime_bound = forced || flagged || self.comptimeness(bound_type) == Comptimeness::Comptime;
            if comptime_bound {
                let CallArg::Comptime(value) = argument else {
                    return Ok(None);
                };
                let Ok(converted) = self.cast(value.get(), bound_type) else {
                    return Ok(None);
                };
                self.bind_comptime(scope.get(), &name, converted.get(), true);
                bound.push(BoundArgument {
                    name,
                    ty: bound_type,
                    value: Some(converted.get()),
                });
            } else {
                self.bind_runtime(scope.get(), &name, bound_type, true);
                bound.push(BoundArgument {
                    name,
                    ty: bound_type,
                    value: None,
                });
            }
        }

        let return_type = self.exec_type(scope.get(), decl.return_type)?;
        if self.comptimeness(return_type.get()) == Comptimeness::Comptime
            && bound.iter().any(|argument| argument.value.is_none())
        {
            return Ok(None);
        }
        Ok(Some(Candidate {
            template,
            scope,
            arguments: bound,
            return_type,
            closeness,
        }))
    }
}
