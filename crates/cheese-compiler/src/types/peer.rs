//! Peer types: the common type two operands promote to.
//!
//! Peering is symmetric. Compile-time numbers always lose against their
//! concrete counterparts, so `2 + x` materializes the literal instead of
//! generalizing `x`.

use cheese_core::Scoped;

use super::{Field, Structure, Type};
use crate::context::CompilationContext;
use crate::object::TypeRef;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Numeric {
    Int { signed: bool, bits: u16 },
    ComptimeInt,
    ComptimeFloat,
    Float,
    ComptimeComplex,
    Complex,
}

fn numeric(ty: &Type<'_>) -> Option<Numeric> {
    Some(match ty {
        Type::Integer { signed, bits } => Numeric::Int {
            signed: *signed,
            bits: *bits,
        },
        Type::ComptimeInt => Numeric::ComptimeInt,
        Type::ComptimeFloat => Numeric::ComptimeFloat,
        Type::Float64 => Numeric::Float,
        Type::ComptimeComplex => Numeric::ComptimeComplex,
        Type::Complex64 => Numeric::Complex,
        _ => return None,
    })
}

/// Signedness and width able to hold both integer ranges; `None` when the
/// signed width would not fit in `u16`.
fn integer_peer((signed_a, bits_a): (bool, u16), (signed_b, bits_b): (bool, u16)) -> Option<(bool, u16)> {
    if signed_a == signed_b {
        return Some((signed_a, bits_a.max(bits_b)));
    }
    let (signed_bits, unsigned_bits) = if signed_a { (bits_a, bits_b) } else { (bits_b, bits_a) };
    Some((true, signed_bits.max(unsigned_bits.checked_add(1)?)))
}

fn numeric_peer(a: Numeric, b: Numeric) -> Option<Numeric> {
    use Numeric::*;
    Some(match (a, b) {
        (Int { signed, bits }, Int { signed: other_signed, bits: other_bits }) => {
            let (signed, bits) = integer_peer((signed, bits), (other_signed, other_bits))?;
            Int { signed, bits }
        }
        (int @ Int { .. }, ComptimeInt) | (ComptimeInt, int @ Int { .. }) => int,
        (ComptimeInt, ComptimeInt) => ComptimeInt,
        (ComptimeFloat, ComptimeFloat) => ComptimeFloat,
        (ComptimeComplex, ComptimeComplex) => ComptimeComplex,
        (ComptimeInt, ComptimeFloat) | (ComptimeFloat, ComptimeInt) => ComptimeFloat,
        (ComptimeInt | ComptimeFloat, ComptimeComplex) | (ComptimeComplex, ComptimeInt | ComptimeFloat) => {
            ComptimeComplex
        }
        (Complex, _) | (_, Complex) | (ComptimeComplex, _) | (_, ComptimeComplex) => Complex,
        _ => Float,
    })
}

impl<'ast> CompilationContext<'ast> {
    /// Common type of two operands, or `None` when they have none.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn peer(&mut self, a: TypeRef<'ast>, b: TypeRef<'ast>) -> Option<Scoped<Type<'ast>>> {
        if a == b {
            return Some(self.heap.scoped(a));
        }
        let (ta, tb) = (self.ty(a), self.ty(b));
        match (ta, tb) {
            (Type::Any, _) => return Some(self.heap.scoped(b)),
            (_, Type::Any) => return Some(self.heap.scoped(a)),
            (Type::NoReturn, _) => return Some(self.heap.scoped(b)),
            (_, Type::NoReturn) => return Some(self.heap.scoped(a)),
            _ => {}
        }
        if let (Some(na), Some(nb)) = (numeric(ta), numeric(tb)) {
            let ty = match numeric_peer(na, nb)? {
                Numeric::Int { signed, bits } => self.integer_type(signed, bits),
                Numeric::ComptimeInt => self.comptime_int_type(),
                Numeric::ComptimeFloat => self.comptime_float_type(),
                Numeric::Float => self.f64_type(),
                Numeric::ComptimeComplex => self.comptime_complex_type(),
                Numeric::Complex => self.c64_type(),
            };
            return Some(self.heap.scoped(ty));
        }
        match (ta, tb) {
            (Type::Structure(sa), Type::Structure(sb)) => match (sa.implicit, sb.implicit) {
                (true, true) => self.peer_implicit_structures(a, b),
                (true, false) if self.compare(b, a, true) >= 0 => Some(self.heap.scoped(b)),
                (false, true) if self.compare(a, b, true) >= 0 => Some(self.heap.scoped(a)),
                _ => None,
            },
            (
                Type::Pointer { .. } | Type::Slice { .. } | Type::Array { .. },
                Type::Pointer { .. } | Type::Slice { .. } | Type::Array { .. },
            )
            | (Type::Reference { .. }, Type::Reference { .. }) => {
                if self.compare(a, b, true) >= 0 {
                    Some(self.heap.scoped(a))
                } else if self.compare(b, a, true) >= 0 {
                    Some(self.heap.scoped(b))
                } else {
                    None
                }
            }
            _ => None,
        }
    }

    /// Fresh implicit structure whose fields are the pairwise peers.
    fn peer_implicit_structures(&mut self, a: TypeRef<'ast>, b: TypeRef<'ast>) -> Option<Scoped<Type<'ast>>> {
        let (fields_a, fields_b, is_tuple) = {
            let sa = self.structure(a)?;
            let sb = self.structure(b)?;
            if sa.fields.len() != sb.fields.len() || sa.is_tuple != sb.is_tuple {
                return None;
            }
            (sa.fields.clone(), sb.fields.clone(), sa.is_tuple)
        };
        let mut fields = Vec::with_capacity(fields_a.len());
        let mut keep = Vec::with_capacity(fields_a.len());
        for (field_a, field_b) in fields_a.iter().zip(&fields_b) {
            if field_a.name != field_b.name {
                return None;
            }
            let ty = self.peer(field_a.ty, field_b.ty)?;
            fields.push(Field {
                name: field_a.name.clone(),
                ty: ty.get(),
            });
            keep.push(ty);
        }
        let name = self.names.register("::peer");
        let structure = Structure::implicit(name, is_tuple, fields);
        let peer = self.heap.alloc(Type::Structure(Box::new(structure)));
        drop(keep);
        Some(peer)
    }

    /// Fold [`peer`](Self::peer) over a list of types.
    pub fn peer_all(&mut self, types: &[TypeRef<'ast>]) -> Option<Scoped<Type<'ast>>> {
        let (first, rest) = types.split_first()?;
        let mut current = self.heap.scoped(*first);
        for ty in rest {
            current = self.peer(current.get(), *ty)?;
        }
        Some(current)
    }
}
