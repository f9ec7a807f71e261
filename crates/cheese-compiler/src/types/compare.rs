//! Conversion distances between types.
//!
//! `compare(target, source, implicit)` is the cost of converting a value of
//! `source` into `target`: `0` for identical types, a positive promotion cost
//! for legal conversions and [`INCOMPATIBLE`] otherwise. Distances are
//! asymmetric and drive both operand promotion and overload scoring, so their
//! relative order matters more than their magnitude.

use super::Type;
use crate::context::CompilationContext;
use crate::object::TypeRef;

/// Distance of an illegal conversion.
pub const INCOMPATIBLE: i32 = -1;

/// Distance of binding anything to `any`; above every concrete conversion.
pub const ANY_DISTANCE: i32 = 131072;

/// Base cost of materializing a compile-time number into a runtime type.
pub const MATERIALIZE_BASE: i32 = 131071;

/// Cost of an explicit numeric conversion.
const EXPLICIT_NUMERIC: i32 = 1;

/// Cost of an explicit integer conversion that changes sign or narrows.
const EXPLICIT_INTEGER: i32 = 2;

fn constness_distance(target_const: bool, source_const: bool) -> i32 {
    match (target_const, source_const) {
        (a, b) if a == b => 0,
        (true, false) => 1,
        _ => INCOMPATIBLE,
    }
}

fn integer_distance(target: (bool, u16), source: (bool, u16), implicit: bool) -> i32 {
    let (target_signed, target_bits) = target;
    let (source_signed, source_bits) = source;
    let widening = if target_signed == source_signed {
        target_bits >= source_bits
    } else {
        target_signed && target_bits > source_bits
    };
    if widening {
        i32::from(target_bits - source_bits)
    } else if implicit {
        INCOMPATIBLE
    } else {
        EXPLICIT_INTEGER
    }
}

/// Cost of turning a `comptime_int` into a concrete integer; wider is cheaper.
fn materialize_integer(signed: bool, bits: u16) -> i32 {
    let cost = i64::from(MATERIALIZE_BASE) - (2 * i64::from(bits) + i64::from(signed));
    cost.max(1) as i32
}

/// Add one step to a legal distance.
fn step(distance: i32) -> i32 {
    if distance < 0 { INCOMPATIBLE } else { distance + 1 }
}

impl<'ast> CompilationContext<'ast> {
    /// Cost of converting a `source` value into `target`.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn compare(&self, target: TypeRef<'ast>, source: TypeRef<'ast>, implicit: bool) -> i32 {
        if target == source {
            return 0;
        }
        let target_ty = self.ty(target);
        let source_ty = self.ty(source);
        match (target_ty, source_ty) {
            (_, Type::NoReturn) => 0,
            (Type::Any, _) => ANY_DISTANCE,
            (_, Type::Any) => INCOMPATIBLE,

            (
                Type::Integer { signed, bits },
                Type::Integer {
                    signed: source_signed,
                    bits: source_bits,
                },
            ) => integer_distance((*signed, *bits), (*source_signed, *source_bits), implicit),
            (Type::Integer { signed, bits }, Type::ComptimeInt) => materialize_integer(*signed, *bits),
            (
                Type::Integer { .. } | Type::ComptimeInt,
                Type::Float64 | Type::ComptimeFloat | Type::Complex64 | Type::ComptimeComplex | Type::Boolean,
            ) if !implicit => EXPLICIT_NUMERIC,

            (Type::Float64, Type::Integer { .. } | Type::ComptimeInt) => MATERIALIZE_BASE,
            (Type::Float64, Type::ComptimeFloat) => MATERIALIZE_BASE - 64,
            (Type::Complex64, Type::Integer { .. } | Type::ComptimeInt) => MATERIALIZE_BASE,
            (Type::Complex64, Type::Float64 | Type::ComptimeFloat) => MATERIALIZE_BASE - 64,
            (Type::Complex64, Type::ComptimeComplex) => MATERIALIZE_BASE - 128,

            (Type::ComptimeInt, Type::Integer { .. }) if !implicit => EXPLICIT_NUMERIC,
            (Type::ComptimeFloat, Type::ComptimeInt) => 1,
            (Type::ComptimeComplex, Type::ComptimeInt | Type::ComptimeFloat) => 1,
            (Type::Boolean, Type::Integer { .. } | Type::ComptimeInt) if !implicit => EXPLICIT_NUMERIC,

            (
                Type::Reference { child, constant },
                Type::Reference {
                    child: source_child,
                    constant: source_constant,
                },
            ) if self.identical(*child, *source_child) => constness_distance(*constant, *source_constant),
            (Type::Reference { child, .. }, _) => step(self.compare(*child, source, implicit)),

            (
                Type::Pointer { child, constant },
                Type::Pointer {
                    child: source_child,
                    constant: source_constant,
                }
                | Type::Array {
                    child: source_child,
                    constant: source_constant,
                    ..
                },
            ) if self.identical(*child, *source_child) => {
                let distance = constness_distance(*constant, *source_constant);
                if matches!(source_ty, Type::Array { .. }) {
                    step(distance)
                } else {
                    distance
                }
            }
            (
                Type::Slice { child, constant },
                Type::Slice {
                    child: source_child,
                    constant: source_constant,
                }
                | Type::Pointer {
                    child: source_child,
                    constant: source_constant,
                }
                | Type::Array {
                    child: source_child,
                    constant: source_constant,
                    ..
                },
            ) if self.identical(*child, *source_child) => {
                let distance = constness_distance(*constant, *source_constant);
                if matches!(source_ty, Type::Slice { .. }) {
                    distance
                } else {
                    step(distance)
                }
            }
            (
                Type::Array {
                    child,
                    dimensions,
                    constant,
                },
                Type::Array {
                    child: source_child,
                    dimensions: source_dimensions,
                    constant: source_constant,
                },
            ) if dimensions == source_dimensions && self.identical(*child, *source_child) => {
                constness_distance(*constant, *source_constant)
            }

            (Type::Structure(_), Type::Structure(_)) => self.structure_distance(target, source, implicit),

            _ => INCOMPATIBLE,
        }
    }

    /// Whether two types convert into each other at no cost.
    pub fn identical(&self, a: TypeRef<'ast>, b: TypeRef<'ast>) -> bool {
        a == b || (self.compare(a, b, true) == 0 && self.compare(b, a, true) == 0)
    }

    /// Field-wise distance when either structure is an implicit literal type.
    fn structure_distance(&self, target: TypeRef<'ast>, source: TypeRef<'ast>, implicit: bool) -> i32 {
        let (Some(target_st), Some(source_st)) = (self.structure(target), self.structure(source)) else {
            return INCOMPATIBLE;
        };
        if !(target_st.implicit || source_st.implicit) {
            return INCOMPATIBLE;
        }
        if target_st.fields.len() != source_st.fields.len() {
            return INCOMPATIBLE;
        }
        let mut total = 0i32;
        for (target_field, source_field) in target_st.fields.iter().zip(&source_st.fields) {
            if target_field.name != source_field.name {
                return INCOMPATIBLE;
            }
            let distance = if target_st.is_tuple && source_st.is_tuple && !(target_st.implicit && source_st.implicit) {
                if self.identical(target_field.ty, source_field.ty) {
                    0
                } else {
                    INCOMPATIBLE
                }
            } else {
                self.compare(target_field.ty, source_field.ty, implicit)
            };
            if distance < 0 {
                return INCOMPATIBLE;
            }
            total = total.saturating_add(distance);
        }
        total
    }
}
