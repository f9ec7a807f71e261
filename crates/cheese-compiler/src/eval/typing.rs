//! Types of expressions that may only be known at runtime.

use cheese_ast::{BinaryOp, Expr, UnaryOp};
use cheese_core::{CompileError, ErrorCode, Result, Scoped};

use crate::context::CompilationContext;
use crate::functions::{CallArg, ScoreMode};
use crate::object::{FunctionSetRef, ScopeRef, TypeRef};
use crate::scope::Lookup;
use crate::types::{Field, Type, tuple_field_name};
use crate::values::ValueData;

impl<'ast> CompilationContext<'ast> {
    /// Type of `expr`, evaluating it when possible.
    pub fn type_of(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Result<Scoped<Type<'ast>>> {
        if let Some(value) = self.try_exec(scope, expr) {
            let ty = self.value(value.get()).ty;
            return Ok(self.heap.scoped(ty));
        }
        self.runtime_type_of(scope, expr).map_err(|e| e.located(expr.span()))
    }

    fn runtime_type_of(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Result<Scoped<Type<'ast>>> {
        match expr {
            Expr::Name(ident) => match self.lookup(scope, ident.name)? {
                Some(Lookup::Runtime { ty, .. }) => Ok(self.heap.scoped(ty)),
                Some(Lookup::Comptime(value)) => {
                    let ty = self.value(value.get()).ty;
                    Ok(self.heap.scoped(ty))
                }
                None => Err(CompileError::new(
                    ErrorCode::UnknownName,
                    format!("`{}` is not defined", ident.name),
                )),
            },
            Expr::Member(member) => {
                let object = self.type_of(scope, member.object)?;
                let target = self.dereferenced(object.get());
                let field = self
                    .structure(target)
                    .and_then(|structure| structure.field(member.member.name))
                    .map(|(_, field)| field.ty);
                match field {
                    Some(ty) => Ok(self.heap.scoped(ty)),
                    None => Err(CompileError::new(
                        ErrorCode::UnknownName,
                        format!(
                            "`{}` has no field `{}`",
                            self.type_name(object.get()),
                            member.member.name
                        ),
                    )),
                }
            }
            Expr::Subscript(subscript) => {
                let object = self.type_of(scope, subscript.object)?;
                let index = self.type_of(scope, subscript.index)?;
                if !self.ty(index.get()).is_integer() && !matches!(self.ty(index.get()), Type::ComptimeInt) {
                    return Err(CompileError::new(
                        ErrorCode::InvalidSubscript,
                        format!("index must be an integer, found `{}`", self.type_name(index.get())),
                    ));
                }
                let target = self.dereferenced(object.get());
                match self.ty(target) {
                    Type::Array { child, .. } | Type::Pointer { child, .. } | Type::Slice { child, .. } => {
                        let child = *child;
                        Ok(self.heap.scoped(child))
                    }
                    _ => Err(CompileError::new(
                        ErrorCode::InvalidSubscript,
                        format!("`{}` cannot be subscripted", self.type_name(object.get())),
                    )),
                }
            }
            Expr::Call(call) => {
                let mut arguments = Vec::with_capacity(call.args.len() + 1);
                let set = match call.callee {
                    Expr::Member(member) => {
                        let object = self.type_of(scope, member.object)?;
                        let target = self.dereferenced(object.get());
                        match self.structure(target).map(|structure| structure.function_sets.get(member.member.name).copied()) {
                            Some(Some(set)) => {
                                arguments.push(CallArg::Runtime(object));
                                set
                            }
                            _ => self.callee_set(scope, call.callee)?,
                        }
                    }
                    callee => self.callee_set(scope, callee)?,
                };
                for argument in call.args {
                    arguments.push(self.call_argument(scope, *argument)?);
                }
                let concrete = self.resolve_call(set, &arguments, call.span, ScoreMode::Call)?;
                let return_type = self.concrete_function(concrete).return_type;
                Ok(self.heap.scoped(return_type))
            }
            Expr::Unary(unary) => {
                let operand = self.type_of(scope, unary.operand)?;
                let valid = match (unary.op, self.ty(operand.get())) {
                    (UnaryOp::Not, Type::Boolean) => true,
                    (UnaryOp::Not, ty) => ty.is_integer(),
                    (UnaryOp::Minus, Type::Integer { signed: false, .. }) => false,
                    (_, Type::Integer { .. } | Type::Float64 | Type::Complex64) => true,
                    _ => false,
                };
                if valid {
                    Ok(operand)
                } else {
                    Err(CompileError::new(
                        ErrorCode::InvalidComptimeOperation,
                        format!("`{}` cannot be applied to `{}`", unary.op, self.type_name(operand.get())),
                    ))
                }
            }
            Expr::Binary(binary) => {
                let left = self.type_of(scope, binary.left)?;
                let right = self.type_of(scope, binary.right)?;
                let Some(peer) = self.peer(left.get(), right.get()) else {
                    let code = if binary.op.is_comparison() {
                        ErrorCode::InvalidComparison
                    } else {
                        ErrorCode::InvalidCast
                    };
                    return Err(CompileError::new(
                        code,
                        format!(
                            "`{}` and `{}` have no common type for `{}`",
                            self.type_name(left.get()),
                            self.type_name(right.get()),
                            binary.op
                        ),
                    ));
                };
                if binary.op.is_comparison() {
                    let boolean = self.bool_type();
                    return Ok(self.heap.scoped(boolean));
                }
                // Logical on booleans, bitwise on integers.
                if matches!(binary.op, BinaryOp::And | BinaryOp::Or)
                    && !matches!(self.ty(peer.get()), Type::Boolean | Type::Integer { .. } | Type::ComptimeInt)
                {
                    return Err(CompileError::new(
                        ErrorCode::InvalidComptimeOperation,
                        format!("operator `{}` is not defined for `{}`", binary.op, self.type_name(peer.get())),
                    ));
                }
                Ok(peer)
            }
            Expr::Cast(cast) => {
                self.type_of(scope, cast.value)?;
                self.exec_type(scope, cast.target)
            }
            Expr::If(branch) => {
                let condition = self.type_of(scope, branch.condition)?;
                if !matches!(self.ty(condition.get()), Type::Boolean) {
                    return Err(CompileError::new(
                        ErrorCode::InvalidComparison,
                        format!("condition must be a bool, found `{}`", self.type_name(condition.get())),
                    ));
                }
                let then_type = self.type_of(scope, branch.then_branch)?;
                let else_type = self.type_of(scope, branch.else_branch)?;
                self.peer(then_type.get(), else_type.get()).ok_or_else(|| {
                    CompileError::new(
                        ErrorCode::InvalidCast,
                        format!(
                            "branches of type `{}` and `{}` have no common type",
                            self.type_name(then_type.get()),
                            self.type_name(else_type.get())
                        ),
                    )
                })
            }
            Expr::Tuple(tuple) => {
                let types = tuple
                    .elements
                    .iter()
                    .map(|element| self.type_of(scope, *element))
                    .collect::<Result<Vec<_>>>()?;
                let fields = types
                    .iter()
                    .enumerate()
                    .map(|(index, ty)| Field {
                        name: tuple_field_name(index),
                        ty: ty.get(),
                    })
                    .collect();
                Ok(self.implicit_structure(true, fields))
            }
            Expr::Object(object) => {
                let mut types = Vec::with_capacity(object.fields.len());
                for field in object.fields {
                    types.push((field.name.name.to_string(), self.type_of(scope, field.value)?));
                }
                let fields = types
                    .iter()
                    .map(|(name, ty)| Field {
                        name: name.clone(),
                        ty: ty.get(),
                    })
                    .collect();
                Ok(self.implicit_structure(false, fields))
            }
            Expr::Array(array) => {
                let types = array
                    .elements
                    .iter()
                    .map(|element| self.type_of(scope, *element))
                    .collect::<Result<Vec<_>>>()?;
                let refs: Vec<TypeRef<'ast>> = types.iter().map(Scoped::get).collect();
                let element = self.peer_all(&refs).ok_or_else(|| {
                    CompileError::new(ErrorCode::InvalidCast, "array elements have no common type")
                })?;
                let ty = self.array_type(element.get(), vec![refs.len()], false);
                Ok(self.heap.scoped(ty))
            }
            // Everything else is compile-time only; evaluate to surface the error.
            _ => {
                let value = self.exec(scope, expr)?;
                let ty = self.value(value.get()).ty;
                Ok(self.heap.scoped(ty))
            }
        }
    }

    /// Target of a reference, or the type itself.
    fn dereferenced(&self, ty: TypeRef<'ast>) -> TypeRef<'ast> {
        match self.ty(ty) {
            Type::Reference { child, .. } => *child,
            _ => ty,
        }
    }

    fn callee_set(&mut self, scope: ScopeRef<'ast>, callee: Expr<'ast>) -> Result<FunctionSetRef<'ast>> {
        let value = self.exec(scope, callee)?;
        match self.value(value.get()).data {
            ValueData::FunctionSet(set) => Ok(set),
            _ => Err(CompileError::new(
                ErrorCode::NotCallable,
                format!("{} is not callable", self.value_to_string(value.get())),
            )),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompilerConfig;
    use bumpalo::Bump;
    use cheese_ast::AstBuilder;

    #[test]
    fn runtime_names_have_their_bound_type() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let scope = ctx.root_scope(None);
        let u32_ty = ctx.integer_type(false, 32);
        ctx.bind_runtime(scope.get(), "n", u32_ty, true);

        let sum = b.binary(BinaryOp::Add, b.int(2), b.name("n"));
        let ty = ctx.type_of(scope.get(), sum).ok();
        assert_eq!(ty.map(|t| t.get()), Some(u32_ty));

        let compare = b.binary(BinaryOp::Lt, b.name("n"), b.int(10));
        let ty = ctx.type_of(scope.get(), compare).ok();
        assert_eq!(ty.map(|t| ctx.type_name(t.get())).as_deref(), Some("bool"));
    }

    #[test]
    fn and_or_follow_the_operand_type() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let scope = ctx.root_scope(None);
        let i32_ty = ctx.integer_type(true, 32);
        let bool_ty = ctx.bool_type();
        let f64_ty = ctx.f64_type();
        ctx.bind_runtime(scope.get(), "x", i32_ty, true);
        ctx.bind_runtime(scope.get(), "flag", bool_ty, true);
        ctx.bind_runtime(scope.get(), "ratio", f64_ty, true);
        let six = ctx.int_value(i32_ty, 6);
        ctx.bind_comptime(scope.get(), "y", six.get(), true);

        let runtime = b.binary(BinaryOp::And, b.name("x"), b.int(3));
        let folded = b.binary(BinaryOp::And, b.name("y"), b.int(3));
        let runtime_ty = ctx.type_of(scope.get(), runtime).ok().map(|t| t.get());
        let folded_ty = ctx.type_of(scope.get(), folded).ok().map(|t| t.get());
        assert_eq!(runtime_ty, Some(i32_ty));
        assert_eq!(runtime_ty, folded_ty);

        let logical = b.binary(BinaryOp::Or, b.name("flag"), b.boolean(false));
        assert_eq!(ctx.type_of(scope.get(), logical).ok().map(|t| t.get()), Some(bool_ty));

        let float = b.binary(BinaryOp::Or, b.name("ratio"), b.float(1.0));
        assert!(matches!(
            ctx.type_of(scope.get(), float),
            Err(e) if e.code == ErrorCode::InvalidComptimeOperation
        ));
    }

    #[test]
    fn runtime_tuple_gets_implicit_structure() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let scope = ctx.root_scope(None);
        let f64_ty = ctx.f64_type();
        ctx.bind_runtime(scope.get(), "x", f64_ty, true);
        let tuple = b.tuple(&[b.name("x"), b.name("x")]);
        let Ok(ty) = ctx.type_of(scope.get(), tuple) else {
            panic!("tuple should type");
        };
        let field = b.member(b.name("t"), "_1");
        ctx.bind_runtime(scope.get(), "t", ty.get(), true);
        assert_eq!(ctx.type_of(scope.get(), field).ok().map(|t| t.get()), Some(f64_ty));
    }

    #[test]
    fn unsigned_negation_is_rejected() {
        let arena = Bump::new();
        let b = AstBuilder::new(&arena);
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let scope = ctx.root_scope(None);
        let u8_ty = ctx.integer_type(false, 8);
        ctx.bind_runtime(scope.get(), "n", u8_ty, true);
        let negated = b.unary(UnaryOp::Minus, b.name("n"));
        let err = ctx.type_of(scope.get(), negated).err();
        assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidComptimeOperation));
    }
}
