//! Compile-time expression evaluation.
//!
//! [`CompilationContext::exec`] evaluates an expression to a [`Value`] or
//! fails; errors raised below it are located at the innermost expression.
//! [`CompilationContext::try_exec`] is the speculative variant: it swallows
//! every failure and never touches diagnostics, so callers can fall back to
//! treating the expression as runtime code.
//!
//! ## Modules
//!
//! - [`typing`]: types of possibly-runtime expressions
//! - [`builtins`]: `$Type`, `$Peer`, `$IsComptime`
//! - [`body`]: interpretation of compile-time function bodies

pub mod body;
pub mod builtins;
pub mod typing;

use num_bigint::BigInt;
use num_traits::ToPrimitive;

use cheese_ast::{EnumPayload, Expr, LiteralKind, PrimitiveType};
use cheese_core::{CompileError, ErrorCode, Result, Scoped, Span};

use crate::context::CompilationContext;
use crate::functions::{CallArg, ScoreMode};
use crate::object::{ConcreteRef, ScopeRef, TypeRef, ValueRef};
use crate::scope::Lookup;
use crate::types::{Field, Type, tuple_field_name};
use crate::values::{Builtin, EnumPayloadValue, Value, ValueData};

/// Deepest nesting of interpreted function calls.
pub const MAX_CALL_DEPTH: usize = 256;

impl<'ast> CompilationContext<'ast> {
    /// Evaluate `expr` at compile time.
    pub fn exec(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Result<Scoped<Value<'ast>>> {
        self.exec_inner(scope, expr).map_err(|e| e.located(expr.span()))
    }

    /// Evaluate `expr` if possible, without reporting anything.
    pub fn try_exec(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Option<Scoped<Value<'ast>>> {
        self.exec(scope, expr).ok()
    }

    /// Evaluate `expr` to a type.
    pub fn exec_type(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Result<Scoped<Type<'ast>>> {
        let value = self.exec(scope, expr)?;
        match self.as_type(value.get()) {
            Some(ty) => Ok(self.heap.scoped(ty)),
            None => Err(CompileError::at(
                ErrorCode::ExpectedType,
                format!("expected a type, found {}", self.value_to_string(value.get())),
                expr.span(),
            )),
        }
    }

    fn exec_inner(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Result<Scoped<Value<'ast>>> {
        match expr {
            Expr::Literal(literal) => Ok(match &literal.kind {
                LiteralKind::Integer(value) => self.comptime_int(value.clone()),
                LiteralKind::Float(value) => self.comptime_float(*value),
                LiteralKind::Imaginary(value) => {
                    let ty = self.comptime_complex_type();
                    self.complex_value(ty, 0.0, *value)
                }
                LiteralKind::Bool(value) => self.bool_value(*value),
                LiteralKind::String(value) => self.string_value(value.clone()),
                LiteralKind::Void => self.void_value(),
            }),
            Expr::Name(ident) => match self.lookup(scope, ident.name)? {
                Some(Lookup::Comptime(value)) => Ok(value),
                Some(Lookup::Runtime { .. }) => Err(CompileError::new(
                    ErrorCode::NotComptime,
                    format!("`{}` is only known at runtime", ident.name),
                )),
                None => Err(CompileError::new(
                    ErrorCode::UnknownName,
                    format!("`{}` is not defined", ident.name),
                )),
            },
            Expr::Member(member) => {
                let object = self.exec(scope, member.object)?;
                self.member_of(object, member.member.name)
            }
            Expr::Subscript(subscript) => {
                let object = self.exec(scope, subscript.object)?;
                let index = self.exec(scope, subscript.index)?;
                self.subscript(object, index)
            }
            Expr::Call(call) => {
                if let Expr::Builtin(ident) = call.callee {
                    let builtin = self.builtin_named(ident.name)?;
                    return self.call_builtin(scope, builtin, call.args);
                }
                let (callee, receiver) = self.callee(scope, call.callee)?;
                match self.value(callee.get()).data.clone() {
                    ValueData::Builtin(builtin) => self.call_builtin(scope, builtin, call.args),
                    ValueData::FunctionSet(set) => {
                        let mut arguments: Vec<CallArg<'ast>> = receiver.into_iter().collect();
                        for argument in call.args {
                            arguments.push(self.call_argument(scope, *argument)?);
                        }
                        let concrete = self.resolve_call(set, &arguments, call.span, ScoreMode::Call)?;
                        self.call_comptime(concrete, call.span)
                    }
                    ValueData::ImportedFunction { name } => Err(CompileError::new(
                        ErrorCode::NotComptime,
                        format!("extern function `{name}` cannot run at compile time"),
                    )),
                    _ => Err(CompileError::new(
                        ErrorCode::NotCallable,
                        format!("{} is not callable", self.value_to_string(callee.get())),
                    )),
                }
            }
            Expr::Unary(unary) => {
                let operand = self.exec(scope, unary.operand)?;
                self.unary_op(unary.op, operand.get())
            }
            Expr::Binary(binary) => {
                let left = self.exec(scope, binary.left)?;
                let right = self.exec(scope, binary.right)?;
                self.binary_op(binary.op, left.get(), right.get())
            }
            Expr::Cast(cast) => {
                let value = self.exec(scope, cast.value)?;
                let target = self.exec_type(scope, cast.target)?;
                self.cast(value.get(), target.get())
            }
            Expr::Tuple(tuple) => {
                let values = tuple
                    .elements
                    .iter()
                    .map(|element| self.exec(scope, *element))
                    .collect::<Result<Vec<_>>>()?;
                let named = values
                    .iter()
                    .enumerate()
                    .map(|(index, value)| (tuple_field_name(index), value.get()))
                    .collect();
                Ok(self.aggregate_literal(true, named))
            }
            Expr::Object(object) => {
                let mut named: Vec<(String, ValueRef<'ast>)> = Vec::with_capacity(object.fields.len());
                let mut keep = Vec::with_capacity(object.fields.len());
                for field in object.fields {
                    if named.iter().any(|(name, _)| name == field.name.name) {
                        return Err(CompileError::at(
                            ErrorCode::DuplicateName,
                            format!("field `{}` is given twice", field.name.name),
                            field.name.span,
                        ));
                    }
                    let value = self.exec(scope, field.value)?;
                    named.push((field.name.name.to_string(), value.get()));
                    keep.push(value);
                }
                let literal = self.aggregate_literal(false, named);
                drop(keep);
                Ok(literal)
            }
            Expr::Array(array) => self.array_literal(scope, array.elements),
            Expr::EnumLiteral(literal) => {
                let mut keep = Vec::new();
                let payload = match literal.payload {
                    EnumPayload::None => EnumPayloadValue::None,
                    EnumPayload::Tuple(values) => {
                        for value in values {
                            keep.push(self.exec(scope, *value)?);
                        }
                        EnumPayloadValue::Tuple(keep.iter().map(Scoped::get).collect())
                    }
                    EnumPayload::Object(fields) => {
                        let mut named = Vec::with_capacity(fields.len());
                        for field in fields {
                            let value = self.exec(scope, field.value)?;
                            named.push((field.name.name.to_string(), value.get()));
                            keep.push(value);
                        }
                        EnumPayloadValue::Object(named)
                    }
                };
                let ty = self.comptime_enum_type();
                let value = self.alloc_value(
                    ty,
                    ValueData::EnumTag {
                        tag: literal.tag.name.to_string(),
                        payload,
                    },
                );
                drop(keep);
                Ok(value)
            }
            Expr::If(branch) => {
                let condition = self.exec(scope, branch.condition)?;
                let flag = match self.value(condition.get()).data {
                    ValueData::Bool(flag) => Some(flag),
                    _ => None,
                };
                match flag {
                    Some(true) => self.exec(scope, branch.then_branch),
                    Some(false) => self.exec(scope, branch.else_branch),
                    None => Err(CompileError::at(
                        ErrorCode::InvalidComparison,
                        format!(
                            "condition must be a bool, found {}",
                            self.value_to_string(condition.get())
                        ),
                        branch.condition.span(),
                    )),
                }
            }
            Expr::Structure(decl) => {
                let name = self.names.anonymous();
                let structure = self.create_structure(scope, decl, &name);
                self.populate_structure(structure.get(), decl);
                Ok(self.type_value(structure.get()))
            }
            Expr::Builtin(ident) => {
                let builtin = self.builtin_named(ident.name)?;
                Ok(self.builtin_value(builtin))
            }
            Expr::Primitive(primitive) => {
                let ty = self.primitive_type(primitive.kind);
                Ok(self.type_value(ty))
            }
            Expr::Reference(indirect) | Expr::Pointer(indirect) | Expr::Slice(indirect) => {
                let child = self.exec_type(scope, indirect.child)?;
                let ty = match expr {
                    Expr::Reference(_) => self.reference_type(child.get(), indirect.constant),
                    Expr::Pointer(_) => self.pointer_type(child.get(), indirect.constant),
                    _ => self.slice_type(child.get(), indirect.constant),
                };
                Ok(self.type_value(ty))
            }
            Expr::ArrayType(array) => {
                let mut dimensions = Vec::with_capacity(array.dimensions.len());
                for dimension in array.dimensions {
                    dimensions.push(self.exec_dimension(scope, *dimension)?);
                }
                let child = self.exec_type(scope, array.child)?;
                let ty = self.array_type(child.get(), dimensions, array.constant);
                Ok(self.type_value(ty))
            }
            Expr::FunctionType(function) => {
                let arguments = function
                    .arguments
                    .iter()
                    .map(|argument| self.exec_type(scope, *argument))
                    .collect::<Result<Vec<_>>>()?;
                let return_type = self.exec_type(scope, function.return_type)?;
                let ty = self.function_pointer_type(arguments.iter().map(Scoped::get).collect(), return_type.get());
                Ok(self.type_value(ty))
            }
        }
    }

    /// The singleton for a primitive type keyword.
    pub fn primitive_type(&mut self, kind: PrimitiveType) -> TypeRef<'ast> {
        match kind {
            PrimitiveType::Integer { signed, bits } => self.integer_type(signed, bits),
            PrimitiveType::Float64 => self.f64_type(),
            PrimitiveType::Complex64 => self.c64_type(),
            PrimitiveType::Bool => self.bool_type(),
            PrimitiveType::Void => self.void_type(),
            PrimitiveType::NoReturn => self.noreturn_type(),
            PrimitiveType::Any => self.any_type(),
            PrimitiveType::Type => self.type_type(),
            PrimitiveType::ComptimeInt => self.comptime_int_type(),
            PrimitiveType::ComptimeFloat => self.comptime_float_type(),
            PrimitiveType::ComptimeComplex => self.comptime_complex_type(),
            PrimitiveType::ComptimeString => self.comptime_string_type(),
        }
    }

    fn builtin_named(&self, name: &str) -> Result<Builtin> {
        Builtin::from_name(name).ok_or_else(|| {
            CompileError::new(ErrorCode::UnknownName, format!("unknown builtin `{name}`"))
        })
    }

    fn exec_dimension(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Result<usize> {
        let value = self.exec(scope, expr)?;
        self.as_integer(value.get())
            .and_then(BigInt::to_usize)
            .ok_or_else(|| {
                CompileError::at(
                    ErrorCode::InvalidDimension,
                    format!(
                        "array dimension must be a non-negative integer, found {}",
                        self.value_to_string(value.get())
                    ),
                    expr.span(),
                )
            })
    }

    /// Evaluate one call argument, falling back to its runtime type.
    pub(crate) fn call_argument(&mut self, scope: ScopeRef<'ast>, expr: Expr<'ast>) -> Result<CallArg<'ast>> {
        match self.try_exec(scope, expr) {
            Some(value) => Ok(CallArg::Comptime(value)),
            None => Ok(CallArg::Runtime(self.type_of(scope, expr)?)),
        }
    }

    /// Evaluate a callee; method calls on aggregate values also yield the
    /// receiver as the leading argument.
    fn callee(
        &mut self,
        scope: ScopeRef<'ast>,
        callee: Expr<'ast>,
    ) -> Result<(Scoped<Value<'ast>>, Option<CallArg<'ast>>)> {
        let Expr::Member(member) = callee else {
            return Ok((self.exec(scope, callee)?, None));
        };
        let object = self.exec(scope, member.object)?;
        let receiver_type = self.value(object.get()).ty;
        let is_instance = matches!(self.value(object.get()).data, ValueData::Aggregate(_))
            && self.structure(receiver_type).is_some();
        if is_instance {
            if let Some(Lookup::Comptime(method)) = self.structure_member(receiver_type, member.member.name)? {
                if matches!(self.value(method.get()).data, ValueData::FunctionSet(_)) {
                    return Ok((method, Some(CallArg::Comptime(object))));
                }
            }
        }
        let value = self
            .member_of(object, member.member.name)
            .map_err(|e| e.located(member.span))?;
        Ok((value, None))
    }

    /// `object.name` on a compile-time value.
    pub fn member_of(&mut self, object: Scoped<Value<'ast>>, name: &str) -> Result<Scoped<Value<'ast>>> {
        let ty = self.value(object.get()).ty;
        let data = self.value(object.get()).data.clone();
        match data {
            ValueData::Type(inner) => self.child_comptime(inner, name),
            ValueData::Aggregate(elements) => {
                let found = self
                    .structure(ty)
                    .and_then(|structure| structure.field(name))
                    .map(|(index, _)| index);
                match found.and_then(|index| elements.get(index)) {
                    Some(element) => Ok(self.heap.scoped(*element)),
                    None => self.child_comptime(ty, name),
                }
            }
            _ => self.child_comptime(ty, name),
        }
    }

    /// `object[index]` on a compile-time aggregate.
    pub fn subscript(&mut self, object: Scoped<Value<'ast>>, index: Scoped<Value<'ast>>) -> Result<Scoped<Value<'ast>>> {
        let ValueData::Aggregate(elements) = &self.value(object.get()).data else {
            return Err(CompileError::new(
                ErrorCode::InvalidSubscript,
                format!("{} cannot be subscripted", self.value_to_string(object.get())),
            ));
        };
        let position = self.as_integer(index.get()).and_then(BigInt::to_usize);
        match position.and_then(|position| elements.get(position)) {
            Some(element) => {
                let element = *element;
                Ok(self.heap.scoped(element))
            }
            None => Err(CompileError::new(
                ErrorCode::InvalidSubscript,
                format!(
                    "index {} is out of range for {} elements",
                    self.value_to_string(index.get()),
                    elements.len()
                ),
            )),
        }
    }

    /// Build an implicit structure and its aggregate value.
    fn aggregate_literal(
        &mut self,
        is_tuple: bool,
        named: Vec<(String, ValueRef<'ast>)>,
    ) -> Scoped<Value<'ast>> {
        let fields = named
            .iter()
            .map(|(name, value)| Field {
                name: name.clone(),
                ty: self.value(*value).ty,
            })
            .collect();
        let ty = self.implicit_structure(is_tuple, fields);
        let value = self.alloc_value(ty.get(), ValueData::Aggregate(named.into_iter().map(|(_, v)| v).collect()));
        drop(ty);
        value
    }

    fn array_literal(&mut self, scope: ScopeRef<'ast>, elements: &[Expr<'ast>]) -> Result<Scoped<Value<'ast>>> {
        let values = elements
            .iter()
            .map(|element| self.exec(scope, *element))
            .collect::<Result<Vec<_>>>()?;
        let types: Vec<TypeRef<'ast>> = values.iter().map(|value| self.value(value.get()).ty).collect();
        let element_type = if types.is_empty() {
            let void = self.void_type();
            self.heap.scoped(void)
        } else {
            self.peer_all(&types).ok_or_else(|| {
                CompileError::new(ErrorCode::InvalidCast, "array elements have no common type")
            })?
        };
        let converted = values
            .iter()
            .map(|value| self.cast(value.get(), element_type.get()))
            .collect::<Result<Vec<_>>>()?;
        let ty = self.array_type(element_type.get(), vec![converted.len()], false);
        Ok(self.alloc_value(ty, ValueData::Aggregate(converted.iter().map(Scoped::get).collect())))
    }

    /// Run a concrete function at compile time.
    pub fn call_comptime(&mut self, concrete: ConcreteRef<'ast>, span: Span) -> Result<Scoped<Value<'ast>>> {
        let (comptime, name, scope, template, return_type) = {
            let data = self.concrete_function(concrete);
            (data.comptime, data.mangled_name.clone(), data.scope, data.template, data.return_type)
        };
        if !comptime {
            return Err(CompileError::at(
                ErrorCode::NotComptime,
                format!("`{}` runs at runtime", self.template(template).name),
                span,
            ));
        }
        if self.call_depth >= MAX_CALL_DEPTH {
            return Err(CompileError::at(
                ErrorCode::InvalidComptimeOperation,
                format!("compile-time call depth exceeded while calling `{name}`"),
                span,
            ));
        }
        let body = self.template(template).decl.body;
        self.call_depth += 1;
        let result = self.run_body(scope, body, return_type);
        self.call_depth -= 1;
        result.map_err(|e| e.located(span))
    }
}
