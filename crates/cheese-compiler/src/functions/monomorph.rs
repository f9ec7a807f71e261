//! Instantiation of selected candidates.

use cheese_ast::DeclFlags;
use cheese_core::{CompileError, ErrorCode, Result, SymbolHash};

use super::{BoundArgument, Candidate, ConcreteFunction};
use crate::backend::FunctionRecord;
use crate::context::CompilationContext;
use crate::mangle::mangle_function;
use crate::object::{ConcreteRef, TypeRef};
use crate::types::Comptimeness;

impl<'ast> CompilationContext<'ast> {
    /// Turn a selected candidate into a concrete function.
    ///
    /// An existing instance of the same template with identical argument
    /// types and compile-time values is reused. New instances are permanent
    /// roots; runtime ones are recorded in the backend program.
    pub fn instantiate(&mut self, candidate: Candidate<'ast>) -> Result<ConcreteRef<'ast>> {
        let template = candidate.template;
        let instances = self.template(template).instances.clone();
        let matches: Vec<ConcreteRef<'ast>> = instances
            .into_iter()
            .filter(|instance| self.same_instance(*instance, &candidate.arguments, candidate.return_type.get()))
            .collect();
        match matches.as_slice() {
            [existing] => return Ok(*existing),
            [] => {}
            _ => {
                return Err(CompileError::new(
                    ErrorCode::AmbiguousFunctionCall,
                    format!(
                        "{} instances of `{}` match the call",
                        matches.len(),
                        self.template(template).name
                    ),
                ));
            }
        }

        let (decl, path) = {
            let data = self.template(template);
            (data.decl, data.name.clone())
        };
        let return_type = candidate.return_type.get();
        let mangled_name = if decl.flags.contains(DeclFlags::EXPORT) {
            decl.name.name.to_string()
        } else {
            let descriptions: Vec<String> = candidate
                .arguments
                .iter()
                .map(|argument| self.describe_bound(argument))
                .collect();
            mangle_function(&path, &descriptions, &self.type_name(return_type))
        };
        let comptime = decl.flags.contains(DeclFlags::COMPTIME)
            || self.comptimeness(return_type) == Comptimeness::Comptime;

        let record = if comptime {
            None
        } else {
            let mut arguments = Vec::new();
            for argument in candidate.arguments.iter().filter(|argument| argument.value.is_none()) {
                arguments.push((argument.name.clone(), self.backend_type(argument.ty)?));
            }
            Some((arguments, self.backend_type(return_type)?))
        };

        let concrete = self.heap.alloc_root(ConcreteFunction {
            mangled_name: mangled_name.clone(),
            template,
            scope: candidate.scope.get(),
            arguments: candidate.arguments,
            return_type,
            comptime,
        });
        self.template_mut(template).instances.push(concrete);
        self.concrete.insert(SymbolHash::function(&mangled_name), concrete);
        if let Some((arguments, backend_return)) = record {
            self.program.functions.push(FunctionRecord {
                mangled_name: mangled_name.clone(),
                arguments,
                return_type: backend_return,
                body: decl.body,
                scope: candidate.scope.get(),
            });
        }
        tracing::debug!(mangled = %mangled_name, comptime, "instantiated function");
        Ok(concrete)
    }

    /// Argument description used in mangled names.
    fn describe_bound(&self, argument: &BoundArgument<'ast>) -> String {
        let ty = self.type_name(argument.ty);
        match argument.value {
            Some(value) => format!("{ty}={}", self.value_to_string(value)),
            None => ty,
        }
    }

    fn same_instance(
        &self,
        instance: ConcreteRef<'ast>,
        arguments: &[BoundArgument<'ast>],
        return_type: TypeRef<'ast>,
    ) -> bool {
        let existing = self.concrete_function(instance);
        existing.arguments.len() == arguments.len()
            && self.identical(existing.return_type, return_type)
            && existing.arguments.iter().zip(arguments).all(|(a, b)| {
                self.identical(a.ty, b.ty)
                    && match (a.value, b.value) {
                        (None, None) => true,
                        (Some(x), Some(y)) => self.is_same_as(x, y),
                        _ => false,
                    }
            })
    }
}
