//! Compile-time metadata of types (`T.__name__`, `T.__size__`, limits).

use num_bigint::BigInt;

use cheese_core::{CompileError, ErrorCode, Result, Scoped};

use super::{Comptimeness, Type};
use crate::context::CompilationContext;
use crate::object::TypeRef;
use crate::scope::Lookup;
use crate::values::Value;
use crate::values::ops::integer_bounds;

/// What a metadata lookup needs from the type, detached from the heap.
enum Shape<'ast> {
    Integer { signed: bool, bits: u16 },
    Float,
    Indirect { child: TypeRef<'ast> },
    Array { child: TypeRef<'ast>, rank: usize },
    Function { return_type: TypeRef<'ast> },
    Structure,
    Plain,
}

fn round_up(offset: u64, align: u64) -> u64 {
    offset.div_ceil(align.max(1)) * align.max(1)
}

impl<'ast> CompilationContext<'ast> {
    /// Look up a compile-time member of a type.
    pub fn child_comptime(&mut self, ty: TypeRef<'ast>, name: &str) -> Result<Scoped<Value<'ast>>> {
        if name == "__name__" {
            let type_name = self.type_name(ty);
            return Ok(self.string_value(type_name));
        }
        if name == "__size__" && self.comptimeness(ty) == Comptimeness::Runtime {
            let size = self.size_of(ty)?;
            return Ok(self.comptime_int(size));
        }
        let shape = match self.ty(ty) {
            Type::Integer { signed, bits } => Shape::Integer {
                signed: *signed,
                bits: *bits,
            },
            Type::Float64 => Shape::Float,
            Type::Reference { child, .. } | Type::Pointer { child, .. } | Type::Slice { child, .. } => {
                Shape::Indirect { child: *child }
            }
            Type::Array { child, dimensions, .. } => Shape::Array {
                child: *child,
                rank: dimensions.len(),
            },
            Type::FunctionPointer { return_type, .. } | Type::ImportedFunction { return_type, .. } => {
                Shape::Function {
                    return_type: *return_type,
                }
            }
            Type::Structure(_) => Shape::Structure,
            _ => Shape::Plain,
        };
        let found = match (shape, name) {
            (Shape::Integer { signed, bits }, "__min__") => Some(self.int_value(ty, integer_bounds(signed, bits).0)),
            (Shape::Integer { signed, bits }, "__max__") => Some(self.int_value(ty, integer_bounds(signed, bits).1)),
            (Shape::Integer { bits, .. }, "__bits__") => Some(self.comptime_int(bits)),
            (Shape::Integer { signed, .. }, "__signed__") => Some(self.bool_value(signed)),
            (Shape::Float, "__min__") => Some(self.float_value(ty, f64::MIN)),
            (Shape::Float, "__max__") => Some(self.float_value(ty, f64::MAX)),
            (Shape::Float, "__epsilon__") => Some(self.float_value(ty, f64::EPSILON)),
            (Shape::Indirect { child } | Shape::Array { child, .. }, "__child__") => Some(self.type_value(child)),
            (Shape::Array { rank, .. }, "__rank__") => Some(self.comptime_int(rank)),
            (Shape::Function { return_type }, "__return__") => Some(self.type_value(return_type)),
            (Shape::Structure, _) => match self.structure_member(ty, name)? {
                Some(Lookup::Comptime(value)) => Some(value),
                Some(Lookup::Runtime { .. }) => {
                    return Err(CompileError::new(
                        ErrorCode::NotComptime,
                        format!("`{}.{name}` is a runtime variable", self.type_name(ty)),
                    ));
                }
                None => None,
            },
            _ => None,
        };
        found.ok_or_else(|| {
            CompileError::new(
                ErrorCode::UnknownName,
                format!("`{}` has no compile-time member `{name}`", self.type_name(ty)),
            )
        })
    }

    /// Size in bytes of a runtime type.
    pub fn size_of(&self, ty: TypeRef<'ast>) -> Result<u64> {
        self.layout(ty, &mut Vec::new()).map(|(size, _)| size)
    }

    /// Alignment in bytes of a runtime type.
    pub fn align_of(&self, ty: TypeRef<'ast>) -> Result<u64> {
        self.layout(ty, &mut Vec::new()).map(|(_, align)| align)
    }

    fn layout(&self, ty: TypeRef<'ast>, visiting: &mut Vec<TypeRef<'ast>>) -> Result<(u64, u64)> {
        let pointer = self.config.pointer_size;
        Ok(match self.ty(ty) {
            Type::Integer { bits, .. } => {
                let bytes = u64::from(bits.div_ceil(8)).max(1).next_power_of_two();
                (bytes, bytes)
            }
            Type::Boolean => (1, 1),
            Type::Float64 => (8, 8),
            Type::Complex64 => (16, 8),
            Type::Void | Type::NoReturn => (0, 1),
            Type::Reference { .. } | Type::Pointer { .. } | Type::FunctionPointer { .. } => (pointer, pointer),
            Type::Slice { .. } => (2 * pointer, pointer),
            Type::Array { child, dimensions, .. } => {
                let (size, align) = self.layout(*child, visiting)?;
                let count: u64 = dimensions.iter().map(|d| *d as u64).product();
                (size * count, align)
            }
            Type::Structure(structure) => {
                if visiting.contains(&ty) {
                    return Err(CompileError::new(
                        ErrorCode::InvalidDimension,
                        format!("`{}` contains itself and has no finite size", structure.name),
                    ));
                }
                visiting.push(ty);
                let mut offset = 0u64;
                let mut align = 1u64;
                for field in &structure.fields {
                    let (field_size, field_align) = self.layout(field.ty, visiting)?;
                    offset = round_up(offset, field_align) + field_size;
                    align = align.max(field_align);
                }
                visiting.pop();
                (round_up(offset, align), align)
            }
            _ => {
                return Err(CompileError::new(
                    ErrorCode::NoBackendType,
                    format!("`{}` has no runtime layout", self.type_name(ty)),
                ));
            }
        })
    }

    /// Integer limit as a plain number, used by tests and diagnostics.
    pub fn integer_limit(&self, ty: TypeRef<'ast>, max: bool) -> Option<BigInt> {
        let (signed, bits) = self.integer_range(ty)?;
        let (min, maximum) = integer_bounds(signed, bits);
        Some(if max { maximum } else { min })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompilerConfig;
    use crate::types::Field;
    use crate::values::ValueData;

    fn ctx() -> CompilationContext<'static> {
        CompilationContext::new(CompilerConfig::default())
    }

    #[test]
    fn name_of_any_type() {
        let mut ctx = ctx();
        let literal = ctx.comptime_int_type();
        let name = ctx.child_comptime(literal, "__name__").ok();
        assert_eq!(name.map(|v| ctx.value_to_string(v.get())).as_deref(), Some("\"comptime_int\""));
    }

    #[test]
    fn integer_limits() {
        let mut ctx = ctx();
        let i8_ty = ctx.integer_type(true, 8);
        let min = ctx.child_comptime(i8_ty, "__min__").ok();
        let max = ctx.child_comptime(i8_ty, "__max__").ok();
        assert_eq!(min.map(|v| ctx.value_to_string(v.get())).as_deref(), Some("-128"));
        assert_eq!(max.map(|v| ctx.value_to_string(v.get())).as_deref(), Some("127"));
        assert_eq!(ctx.integer_limit(i8_ty, true), Some(BigInt::from(127)));
        let signed = ctx.child_comptime(i8_ty, "__signed__").ok();
        assert!(matches!(signed.map(|v| ctx.value(v.get()).data.clone()), Some(ValueData::Bool(true))));
    }

    #[test]
    fn sizes() {
        let mut ctx = ctx();
        let u8_ty = ctx.integer_type(false, 8);
        let i24 = ctx.integer_type(true, 24);
        let i32_ty = ctx.integer_type(true, 32);
        let slice = ctx.slice_type(u8_ty, false);
        let array = ctx.array_type(i32_ty, vec![2, 3], false);
        assert_eq!(ctx.size_of(i24).ok(), Some(4));
        assert_eq!(ctx.size_of(slice).ok(), Some(16));
        assert_eq!(ctx.size_of(array).ok(), Some(24));

        let padded = ctx.declare_structure("Padded", false);
        if let Some(structure) = ctx.structure_mut(padded.get()) {
            structure.fields = vec![
                Field {
                    name: "a".into(),
                    ty: u8_ty,
                },
                Field {
                    name: "b".into(),
                    ty: i32_ty,
                },
            ];
        }
        assert_eq!(ctx.size_of(padded.get()).ok(), Some(8));
        assert_eq!(ctx.align_of(padded.get()).ok(), Some(4));
        let size = ctx.child_comptime(padded.get(), "__size__").ok();
        assert_eq!(size.map(|v| ctx.value_to_string(v.get())).as_deref(), Some("8"));
    }

    #[test]
    fn comptime_types_have_no_size() {
        let mut ctx = ctx();
        let literal = ctx.comptime_int_type();
        let err = ctx.child_comptime(literal, "__size__");
        assert!(matches!(err, Err(e) if e.code == ErrorCode::UnknownName));
        assert!(matches!(ctx.size_of(literal), Err(e) if e.code == ErrorCode::NoBackendType));
    }

    #[test]
    fn child_of_indirect_types() {
        let mut ctx = ctx();
        let u8_ty = ctx.integer_type(false, 8);
        let pointer = ctx.pointer_type(u8_ty, true);
        let child = ctx.child_comptime(pointer, "__child__").ok();
        assert_eq!(child.and_then(|v| ctx.as_type(v.get())), Some(u8_ty));
    }
}
