//! Explicit conversion of comptime values.
//!
//! [`CompilationContext::cast`] is the only way a value changes type. The
//! source type's [`cast_target_kinds`](crate::types::Type::cast_target_kinds)
//! is consulted first, then the payload is converted per target variant.
//! [`CompilationContext::coerce`] is the implicit form used by declared
//! types, `let` bindings and returns; it admits only what `compare` accepts
//! implicitly.

use num_bigint::BigInt;
use num_traits::{FromPrimitive, ToPrimitive, Zero};

use cheese_core::{CompileError, ErrorCode, Result, Scoped};

use super::ops::fits;
use super::{Value, ValueData};
use crate::context::CompilationContext;
use crate::object::{TypeRef, ValueRef};
use crate::types::Type;

/// Conversion target, detached from the type's heap borrow.
enum Target<'ast> {
    Integer(Option<(bool, u16)>),
    Float,
    Complex,
    Bool,
    String,
    Enum,
    Structure,
    Array { child: TypeRef<'ast>, count: usize },
    Type,
    Void,
    Other,
}

impl<'ast> CompilationContext<'ast> {
    /// Convert `value` to `target`.
    pub fn cast(&mut self, value: ValueRef<'ast>, target: TypeRef<'ast>) -> Result<Scoped<Value<'ast>>> {
        let source = self.value(value).ty;
        if source == target || matches!(self.ty(target), Type::Any) {
            return Ok(self.heap.scoped(value));
        }
        if !self.ty(source).cast_target_kinds().contains(self.ty(target).kind()) {
            return Err(self.bad_cast(value, target));
        }
        let kind = match self.ty(target) {
            Type::Integer { signed, bits } => Target::Integer(Some((*signed, *bits))),
            Type::ComptimeInt => Target::Integer(None),
            Type::Float64 | Type::ComptimeFloat => Target::Float,
            Type::Complex64 | Type::ComptimeComplex => Target::Complex,
            Type::Boolean => Target::Bool,
            Type::ComptimeString => Target::String,
            Type::ComptimeEnum => Target::Enum,
            Type::Structure(_) => Target::Structure,
            Type::Array { child, dimensions, .. } => Target::Array {
                child: *child,
                count: dimensions.iter().product(),
            },
            Type::TypeType => Target::Type,
            Type::Void => Target::Void,
            _ => Target::Other,
        };
        let data = self.value(value).data.clone();
        let converted = match (data, kind) {
            (ValueData::Integer(integer), Target::Integer(range)) => {
                self.check_range(&integer, range, target)?;
                ValueData::Integer(integer)
            }
            (ValueData::Integer(integer), Target::Float) => ValueData::Float(integer.to_f64().unwrap_or(f64::INFINITY)),
            (ValueData::Integer(integer), Target::Complex) => {
                ValueData::Complex(integer.to_f64().unwrap_or(f64::INFINITY), 0.0)
            }
            (ValueData::Integer(integer), Target::Bool) => ValueData::Bool(!integer.is_zero()),
            (ValueData::Float(float), Target::Integer(range)) => {
                let integer = (float.is_finite())
                    .then(|| BigInt::from_f64(float.trunc()))
                    .flatten()
                    .ok_or_else(|| {
                        CompileError::new(
                            ErrorCode::InvalidCast,
                            format!("{float} has no integer value"),
                        )
                    })?;
                self.check_range(&integer, range, target)?;
                ValueData::Integer(integer)
            }
            (ValueData::Float(float), Target::Float) => ValueData::Float(float),
            (ValueData::Float(float), Target::Complex) => ValueData::Complex(float, 0.0),
            (ValueData::Complex(re, im), Target::Complex) => ValueData::Complex(re, im),
            (ValueData::Bool(flag), Target::Bool) => ValueData::Bool(flag),
            (ValueData::Bool(flag), Target::Integer(range)) => {
                let integer = BigInt::from(u8::from(flag));
                self.check_range(&integer, range, target)?;
                ValueData::Integer(integer)
            }
            (ValueData::String(string), Target::String) => ValueData::String(string),
            (data @ ValueData::EnumTag { .. }, Target::Enum) => data,
            (ValueData::Type(ty), Target::Type) => ValueData::Type(ty),
            (ValueData::Void, Target::Void) => ValueData::Void,
            (ValueData::Aggregate(elements), Target::Structure) => {
                return self.cast_to_structure(source, &elements, target);
            }
            (ValueData::Aggregate(elements), Target::Array { child, count }) => {
                if elements.len() != count {
                    return Err(CompileError::new(
                        ErrorCode::InvalidCast,
                        format!(
                            "cannot cast {} elements to `{}`",
                            elements.len(),
                            self.type_name(target)
                        ),
                    ));
                }
                let converted = elements
                    .iter()
                    .map(|element| self.cast(*element, child))
                    .collect::<Result<Vec<_>>>()?;
                let refs = converted.iter().map(Scoped::get).collect();
                return Ok(self.alloc_value(target, ValueData::Aggregate(refs)));
            }
            _ => return Err(self.bad_cast(value, target)),
        };
        Ok(self.alloc_value(target, converted))
    }

    /// Implicitly convert `value` to `target`.
    pub fn coerce(&mut self, value: ValueRef<'ast>, target: TypeRef<'ast>) -> Result<Scoped<Value<'ast>>> {
        let source = self.value(value).ty;
        if self.compare(target, source, true) < 0 {
            return Err(CompileError::new(
                ErrorCode::InvalidCast,
                format!(
                    "cannot implicitly convert {} of type `{}` to `{}`",
                    self.value_to_string(value),
                    self.type_name(source),
                    self.type_name(target)
                ),
            ));
        }
        self.cast(value, target)
    }

    fn bad_cast(&self, value: ValueRef<'ast>, target: TypeRef<'ast>) -> CompileError {
        let source = self.value(value).ty;
        CompileError::new(
            ErrorCode::BadComptimeCast,
            format!(
                "cannot cast {} of type `{}` to `{}`",
                self.value_to_string(value),
                self.type_name(source),
                self.type_name(target)
            ),
        )
    }

    fn check_range(&self, integer: &BigInt, range: Option<(bool, u16)>, target: TypeRef<'ast>) -> Result<()> {
        if fits(integer, range) {
            Ok(())
        } else {
            Err(CompileError::new(
                ErrorCode::InvalidCast,
                format!("{integer} does not fit in `{}`", self.type_name(target)),
            ))
        }
    }

    /// Element-wise conversion of an aggregate into a structure.
    ///
    /// Object literals match fields by name; tuples and arrays are positional.
    fn cast_to_structure(
        &mut self,
        source: TypeRef<'ast>,
        elements: &[ValueRef<'ast>],
        target: TypeRef<'ast>,
    ) -> Result<Scoped<Value<'ast>>> {
        let source_names: Option<Vec<String>> = self
            .structure(source)
            .filter(|structure| !structure.is_tuple)
            .map(|structure| structure.fields.iter().map(|field| field.name.clone()).collect());
        let (fields, target_is_tuple) = match self.structure(target) {
            Some(structure) => (structure.fields.clone(), structure.is_tuple),
            None => return Err(CompileError::internal("structure cast to a non-structure")),
        };
        if fields.len() != elements.len() {
            return Err(CompileError::new(
                ErrorCode::InvalidCast,
                format!(
                    "`{}` has {} fields, the value has {}",
                    self.type_name(target),
                    fields.len(),
                    elements.len()
                ),
            ));
        }
        let mut converted = Vec::with_capacity(fields.len());
        for (index, field) in fields.iter().enumerate() {
            let element = match &source_names {
                Some(names) if !target_is_tuple => {
                    let position = names.iter().position(|name| *name == field.name).ok_or_else(|| {
                        CompileError::new(
                            ErrorCode::InvalidCast,
                            format!("missing field `{}` for `{}`", field.name, self.type_name(target)),
                        )
                    })?;
                    elements[position]
                }
                _ => elements[index],
            };
            converted.push(self.cast(element, field.ty)?);
        }
        let refs = converted.iter().map(Scoped::get).collect();
        Ok(self.alloc_value(target, ValueData::Aggregate(refs)))
    }
}
