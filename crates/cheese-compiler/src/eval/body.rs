//! Interpretation of compile-time function bodies.

use cheese_ast::{Block, DeclFlags, FunctionBody, Stmt};
use cheese_core::{CompileError, ErrorCode, Result, Scoped};

use crate::context::CompilationContext;
use crate::object::{ScopeRef, TypeRef};
use crate::types::Type;
use crate::values::Value;

impl<'ast> CompilationContext<'ast> {
    /// Run a function body in a fresh child of `scope` and convert the
    /// result to `return_type`.
    pub fn run_body(
        &mut self,
        scope: ScopeRef<'ast>,
        body: FunctionBody<'ast>,
        return_type: TypeRef<'ast>,
    ) -> Result<Scoped<Value<'ast>>> {
        let frame = self.child_scope(scope);
        let result = match body {
            FunctionBody::Expr(expr) => self.exec(frame.get(), expr)?,
            FunctionBody::Block(block) => match self.run_block(frame.get(), block)? {
                Some(value) => value,
                None if matches!(self.ty(return_type), Type::Void) => self.void_value(),
                None => {
                    return Err(CompileError::at(
                        ErrorCode::InvalidReturn,
                        format!(
                            "function returning `{}` ends without a return",
                            self.type_name(return_type)
                        ),
                        block.span,
                    ));
                }
            },
        };
        self.coerce(result.get(), return_type)
    }

    /// Execute statements until a `return`; `None` when the block falls off
    /// the end.
    fn run_block(&mut self, scope: ScopeRef<'ast>, block: Block<'ast>) -> Result<Option<Scoped<Value<'ast>>>> {
        for stmt in block.stmts {
            match stmt {
                Stmt::Let(binding) => {
                    let mut value = self.exec(scope, binding.value)?;
                    if let Some(ty) = binding.ty {
                        let ty = self.exec_type(scope, ty)?;
                        value = self.coerce(value.get(), ty.get()).map_err(|e| e.located(binding.span))?;
                    }
                    let constant = !binding.flags.contains(DeclFlags::MUTABLE);
                    self.bind_comptime(scope, binding.name.name, value.get(), constant);
                }
                Stmt::Return(ret) => {
                    let value = match ret.value {
                        Some(expr) => self.exec(scope, expr)?,
                        None => self.void_value(),
                    };
                    return Ok(Some(value));
                }
                Stmt::Expr(statement) => {
                    self.exec(scope, statement.expr)?;
                }
            }
        }
        Ok(None)
    }
}
