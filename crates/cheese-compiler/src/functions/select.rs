//! Overload selection.

use cheese_core::{CompileError, ErrorCode, Result, Span};

use super::{CallArg, Candidate, ScoreMode};
use crate::context::CompilationContext;
use crate::object::{ConcreteRef, FunctionSetRef};

impl<'ast> CompilationContext<'ast> {
    /// Resolve a call to `set` and instantiate the winning template.
    pub fn resolve_call(
        &mut self,
        set: FunctionSetRef<'ast>,
        arguments: &[CallArg<'ast>],
        span: Span,
        mode: ScoreMode,
    ) -> Result<ConcreteRef<'ast>> {
        let templates = self.function_set(set).templates.clone();
        let mut viable = Vec::new();
        for template in templates {
            if let Some(candidate) = self.score(template, arguments, mode).map_err(|e| e.located(span))? {
                viable.push(candidate);
            }
        }
        let best = self.find_best_match(set, viable, arguments, span)?;
        tracing::debug!(
            function = %self.function_set(set).name,
            closeness = best.closeness,
            "selected overload"
        );
        self.instantiate(best).map_err(|e| e.located(span))
    }

    /// Pick the candidate with the lowest closeness.
    ///
    /// More than one candidate at the minimum is an ambiguous call.
    pub fn find_best_match(
        &self,
        set: FunctionSetRef<'ast>,
        mut viable: Vec<Candidate<'ast>>,
        arguments: &[CallArg<'ast>],
        span: Span,
    ) -> Result<Candidate<'ast>> {
        let name = &self.function_set(set).name;
        let Some(best) = viable.iter().map(|candidate| candidate.closeness).min() else {
            return Err(CompileError::at(
                ErrorCode::NoOverloadFound,
                format!("no overload of `{name}` accepts ({})", self.describe_arguments(arguments)),
                span,
            ));
        };
        let tied = viable.iter().filter(|candidate| candidate.closeness == best).count();
        if tied > 1 {
            return Err(CompileError::at(
                ErrorCode::AmbiguousFunctionCall,
                format!(
                    "call to `{name}` with ({}) matches {tied} overloads equally well",
                    self.describe_arguments(arguments)
                ),
                span,
            ));
        }
        let index = viable
            .iter()
            .position(|candidate| candidate.closeness == best)
            .ok_or_else(|| CompileError::internal("best candidate vanished"))?;
        Ok(viable.swap_remove(index))
    }

    fn describe_arguments(&self, arguments: &[CallArg<'ast>]) -> String {
        arguments
            .iter()
            .map(|argument| match argument {
                CallArg::Runtime(ty) => self.type_name(ty.get()),
                CallArg::Comptime(value) => format!(
                    "{} = {}",
                    self.type_name(self.value(value.get()).ty),
                    self.value_to_string(value.get())
                ),
            })
            .collect::<Vec<_>>()
            .join(", ")
    }
}
