//! Compiler builtins.

use cheese_ast::Expr;
use cheese_core::{CompileError, ErrorCode, Result, Scoped};

use crate::context::CompilationContext;
use crate::object::{ScopeRef, TypeRef};
use crate::values::{Builtin, Value};

impl<'ast> CompilationContext<'ast> {
    /// Call a builtin with unevaluated arguments.
    pub fn call_builtin(
        &mut self,
        scope: ScopeRef<'ast>,
        builtin: Builtin,
        args: &[Expr<'ast>],
    ) -> Result<Scoped<Value<'ast>>> {
        match (builtin, args) {
            (Builtin::Type, [argument]) => {
                let ty = self.type_of(scope, *argument)?;
                Ok(self.type_value(ty.get()))
            }
            (Builtin::IsComptime, [argument]) => {
                let known = self.try_exec(scope, *argument).is_some();
                Ok(self.bool_value(known))
            }
            (Builtin::Peer, [_, ..]) => {
                let types = args
                    .iter()
                    .map(|argument| self.exec_type(scope, *argument))
                    .collect::<Result<Vec<_>>>()?;
                let refs: Vec<TypeRef<'ast>> = types.iter().map(Scoped::get).collect();
                match self.peer_all(&refs) {
                    Some(peer) => Ok(self.type_value(peer.get())),
                    None => Err(CompileError::new(
                        ErrorCode::BadBuiltinCall,
                        format!(
                            "`$Peer` found no common type for {}",
                            refs.iter().map(|ty| format!("`{}`", self.type_name(*ty))).collect::<Vec<_>>().join(", ")
                        ),
                    )),
                }
            }
            _ => Err(CompileError::new(
                ErrorCode::BadBuiltinCall,
                format!("`{}` does not take {} arguments", builtin.as_str(), args.len()),
            )),
        }
    }
}
