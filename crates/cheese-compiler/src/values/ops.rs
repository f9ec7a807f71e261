//! Operator dispatch.
//!
//! Binary operators share one protocol: find the operands' peer type, cast
//! the left side to it and retry when it is not already there, cast the right
//! side, then apply the primitive operation. The result is tagged with the
//! peer type (or `bool` for relational operators). Integer results are range
//! checked against the peer type after every operation.

use num_bigint::BigInt;
use num_traits::{One, Signed, ToPrimitive, Zero};

use cheese_ast::{BinaryOp, UnaryOp};
use cheese_core::{CompileError, ErrorCode, Result, Scoped};

use super::{Value, ValueData};
use crate::context::CompilationContext;
use crate::object::{TypeRef, ValueRef};

/// Inclusive bounds of an integer type.
pub fn integer_bounds(signed: bool, bits: u16) -> (BigInt, BigInt) {
    if bits == 0 {
        return (BigInt::zero(), BigInt::zero());
    }
    if signed {
        let half = BigInt::one() << (usize::from(bits) - 1);
        (-half.clone(), half - 1)
    } else {
        (BigInt::zero(), (BigInt::one() << usize::from(bits)) - 1)
    }
}

/// Whether `value` fits in the integer type, `None` meaning unbounded.
pub fn fits(value: &BigInt, range: Option<(bool, u16)>) -> bool {
    match range {
        None => true,
        Some((signed, bits)) => {
            let (min, max) = integer_bounds(signed, bits);
            *value >= min && *value <= max
        }
    }
}

/// Reduce to the width of the integer type, sign-extending signed results.
pub fn truncate(value: &BigInt, signed: bool, bits: u16) -> BigInt {
    if bits == 0 {
        return BigInt::zero();
    }
    let modulus = BigInt::one() << usize::from(bits);
    let mut reduced = ((value % &modulus) + &modulus) % &modulus;
    if signed && reduced >= (&modulus >> 1usize) {
        reduced -= &modulus;
    }
    reduced
}

fn unsupported(op: &str, ty: &str) -> CompileError {
    CompileError::new(
        ErrorCode::InvalidComptimeOperation,
        format!("operator `{op}` is not supported at compile time for `{ty}`"),
    )
}

fn overflow(value: &BigInt, ty: &str) -> CompileError {
    CompileError::new(
        ErrorCode::InvalidComptimeOperation,
        format!("result {value} is out of range for `{ty}`"),
    )
}

fn division_by_zero() -> CompileError {
    CompileError::new(ErrorCode::InvalidComptimeOperation, "division by zero at compile time")
}

/// Largest shift accepted at compile time.
const MAX_SHIFT: usize = 1 << 16;

fn shift_amount(amount: &BigInt) -> Result<usize> {
    amount.to_usize().filter(|amount| *amount <= MAX_SHIFT).ok_or_else(|| {
        CompileError::new(
            ErrorCode::InvalidComptimeOperation,
            format!("invalid shift amount {amount}"),
        )
    })
}

enum Outcome {
    Integer(BigInt),
    Float(f64),
    Complex(f64, f64),
    Bool(bool),
    String(String),
    /// A relational result.
    Relation(bool),
}

fn compare_ord<T: PartialOrd>(op: BinaryOp, a: &T, b: &T) -> Option<bool> {
    Some(match op {
        BinaryOp::Lt => a < b,
        BinaryOp::Gt => a > b,
        BinaryOp::Le => a <= b,
        BinaryOp::Ge => a >= b,
        BinaryOp::Eq => a == b,
        BinaryOp::Ne => a != b,
        _ => return None,
    })
}

fn complex_divide((a, b): (f64, f64), (c, d): (f64, f64)) -> (f64, f64) {
    let denominator = c * c + d * d;
    ((a * c + b * d) / denominator, (b * c - a * d) / denominator)
}

impl<'ast> CompilationContext<'ast> {
    /// Apply a unary operator.
    pub fn unary_op(&mut self, op: UnaryOp, operand: ValueRef<'ast>) -> Result<Scoped<Value<'ast>>> {
        let value = self.value(operand);
        let ty = value.ty;
        let range = self.integer_range(ty);
        let data = match (&value.data, op) {
            (_, UnaryOp::Plus) if matches!(value.data, ValueData::Integer(_) | ValueData::Float(_) | ValueData::Complex(..)) => {
                return Ok(self.heap.scoped(operand));
            }
            (ValueData::Integer(integer), UnaryOp::Minus) => {
                if matches!(range, Some((false, _))) {
                    return Err(unsupported("-", &self.type_name(ty)));
                }
                let negated = -integer;
                if !fits(&negated, range) {
                    return Err(overflow(&negated, &self.type_name(ty)));
                }
                ValueData::Integer(negated)
            }
            (ValueData::Integer(integer), UnaryOp::Not) => match range {
                Some((false, bits)) => {
                    let (_, mask) = integer_bounds(false, bits);
                    ValueData::Integer(integer ^ mask)
                }
                _ => ValueData::Integer(-integer - 1),
            },
            (ValueData::Float(float), UnaryOp::Minus) => ValueData::Float(-float),
            (ValueData::Complex(re, im), UnaryOp::Minus) => ValueData::Complex(-re, -im),
            (ValueData::Bool(flag), UnaryOp::Not) => ValueData::Bool(!flag),
            _ => return Err(unsupported(op.as_str(), &self.type_name(ty))),
        };
        Ok(self.alloc_value(ty, data))
    }

    /// Apply a binary operator with peer promotion.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn binary_op(&mut self, op: BinaryOp, lhs: ValueRef<'ast>, rhs: ValueRef<'ast>) -> Result<Scoped<Value<'ast>>> {
        let (lhs_ty, rhs_ty) = (self.value(lhs).ty, self.value(rhs).ty);
        let Some(peer) = self.peer(lhs_ty, rhs_ty) else {
            return Err(CompileError::new(
                ErrorCode::InvalidComptimeOperation,
                format!(
                    "no common type for `{}` {op} `{}`",
                    self.type_name(lhs_ty),
                    self.type_name(rhs_ty)
                ),
            ));
        };
        let peer_ty = peer.get();
        let distance = self.compare(peer_ty, lhs_ty, true);
        if distance < 0 {
            return Err(CompileError::new(
                ErrorCode::BadComptimeCast,
                format!(
                    "cannot promote `{}` to `{}`",
                    self.type_name(lhs_ty),
                    self.type_name(peer_ty)
                ),
            ));
        }
        if distance != 0 {
            let promoted = self.cast(lhs, peer_ty)?;
            return self.binary_op(op, promoted.get(), rhs);
        }
        let rhs = if self.compare(peer_ty, rhs_ty, true) == 0 {
            self.heap.scoped(rhs)
        } else {
            self.cast(rhs, peer_ty)?
        };
        self.primitive_binary(op, lhs, rhs.get(), peer_ty)
    }

    fn primitive_binary(
        &mut self,
        op: BinaryOp,
        lhs: ValueRef<'ast>,
        rhs: ValueRef<'ast>,
        peer: TypeRef<'ast>,
    ) -> Result<Scoped<Value<'ast>>> {
        let range = self.integer_range(peer);
        let outcome = match (&self.value(lhs).data, &self.value(rhs).data) {
            (ValueData::Integer(a), ValueData::Integer(b)) => Self::integer_binary(op, a, b, range)?,
            (ValueData::Float(a), ValueData::Float(b)) => match op {
                BinaryOp::Add => Outcome::Float(a + b),
                BinaryOp::Sub => Outcome::Float(a - b),
                BinaryOp::Mul => Outcome::Float(a * b),
                BinaryOp::Div => Outcome::Float(a / b),
                BinaryOp::Rem => Outcome::Float(a % b),
                _ => match compare_ord(op, a, b) {
                    Some(result) => Outcome::Relation(result),
                    None => return Err(unsupported(op.as_str(), &self.type_name(peer))),
                },
            },
            (ValueData::Complex(ar, ai), ValueData::Complex(br, bi)) => match op {
                BinaryOp::Add => Outcome::Complex(ar + br, ai + bi),
                BinaryOp::Sub => Outcome::Complex(ar - br, ai - bi),
                BinaryOp::Mul => Outcome::Complex(ar * br - ai * bi, ar * bi + ai * br),
                BinaryOp::Div => {
                    let (re, im) = complex_divide((*ar, *ai), (*br, *bi));
                    Outcome::Complex(re, im)
                }
                BinaryOp::Eq => Outcome::Relation(ar == br && ai == bi),
                BinaryOp::Ne => Outcome::Relation(ar != br || ai != bi),
                _ => return Err(unsupported(op.as_str(), &self.type_name(peer))),
            },
            (ValueData::Bool(a), ValueData::Bool(b)) => match op {
                BinaryOp::And => Outcome::Bool(*a && *b),
                BinaryOp::Or => Outcome::Bool(*a || *b),
                BinaryOp::Xor => Outcome::Bool(a != b),
                BinaryOp::Eq => Outcome::Relation(a == b),
                BinaryOp::Ne => Outcome::Relation(a != b),
                _ => return Err(unsupported(op.as_str(), &self.type_name(peer))),
            },
            (ValueData::String(a), ValueData::String(b)) => match op {
                BinaryOp::Add => Outcome::String(format!("{a}{b}")),
                BinaryOp::Eq => Outcome::Relation(a == b),
                BinaryOp::Ne => Outcome::Relation(a != b),
                _ => return Err(unsupported(op.as_str(), &self.type_name(peer))),
            },
            (
                ValueData::Type(_)
                | ValueData::EnumTag { .. }
                | ValueData::Aggregate(_)
                | ValueData::Void
                | ValueData::FunctionSet(_),
                _,
            ) if matches!(op, BinaryOp::Eq | BinaryOp::Ne) => {
                let same = self.is_same_as(lhs, rhs);
                Outcome::Relation(if op == BinaryOp::Eq { same } else { !same })
            }
            _ => return Err(unsupported(op.as_str(), &self.type_name(peer))),
        };
        let value = match outcome {
            Outcome::Integer(integer) => {
                if !fits(&integer, range) {
                    return Err(overflow(&integer, &self.type_name(peer)));
                }
                self.alloc_value(peer, ValueData::Integer(integer))
            }
            Outcome::Float(float) => self.alloc_value(peer, ValueData::Float(float)),
            Outcome::Complex(re, im) => self.alloc_value(peer, ValueData::Complex(re, im)),
            Outcome::Bool(flag) => self.alloc_value(peer, ValueData::Bool(flag)),
            Outcome::String(string) => self.alloc_value(peer, ValueData::String(string)),
            Outcome::Relation(flag) => self.bool_value(flag),
        };
        Ok(value)
    }

    fn integer_binary(op: BinaryOp, a: &BigInt, b: &BigInt, range: Option<(bool, u16)>) -> Result<Outcome> {
        Ok(Outcome::Integer(match op {
            BinaryOp::Add => a + b,
            BinaryOp::Sub => a - b,
            BinaryOp::Mul => a * b,
            BinaryOp::Div | BinaryOp::Rem if b.is_zero() => return Err(division_by_zero()),
            BinaryOp::Div => a / b,
            BinaryOp::Rem => a % b,
            BinaryOp::Shl => {
                let shifted = a << shift_amount(b)?;
                match range {
                    Some((signed, bits)) => truncate(&shifted, signed, bits),
                    None => shifted,
                }
            }
            BinaryOp::Shr => {
                let shifted = a >> shift_amount(b)?;
                match range {
                    Some((signed, bits)) => truncate(&shifted, signed, bits),
                    None => shifted,
                }
            }
            BinaryOp::And => a & b,
            BinaryOp::Or => a | b,
            BinaryOp::Xor => a ^ b,
            _ => {
                let result = compare_ord(op, a, b)
                    .ok_or_else(|| CompileError::internal(format!("unhandled integer operator `{op}`")))?;
                return Ok(Outcome::Relation(result));
            }
        }))
    }

    /// Whether an integer value is negative.
    pub fn is_negative(&self, value: ValueRef<'ast>) -> bool {
        self.as_integer(value).is_some_and(Signed::is_negative)
    }
}
