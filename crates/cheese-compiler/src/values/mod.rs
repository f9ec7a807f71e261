//! Comptime value engine.
//!
//! A [`Value`] is an immutable typed payload produced by compile-time
//! evaluation. Operators live in [`ops`], conversions in [`cast`].
//!
//! ## Modules
//!
//! - [`ops`]: unary and binary operator dispatch with peer promotion
//! - [`cast`]: the explicit conversion entry point

pub mod cast;
pub mod ops;

use std::fmt::Write as _;

use num_bigint::BigInt;
use ordered_float::OrderedFloat;

use cheese_core::{Scoped, Trace, Tracer};

use crate::context::CompilationContext;
use crate::object::{FunctionSetRef, TypeRef, ValueRef};
use crate::types::Type;

/// Compiler builtins reachable through `$Name`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Builtin {
    /// `$Type(expr)`: the type of an expression.
    Type,
    /// `$Peer(T, U, ...)`: the common type of a list of types.
    Peer,
    /// `$IsComptime(expr)`: whether an expression evaluates at compile time.
    IsComptime,
}

impl Builtin {
    pub fn from_name(name: &str) -> Option<Self> {
        match name.strip_prefix('$').unwrap_or(name) {
            "Type" => Some(Self::Type),
            "Peer" => Some(Self::Peer),
            "IsComptime" => Some(Self::IsComptime),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Type => "$Type",
            Self::Peer => "$Peer",
            Self::IsComptime => "$IsComptime",
        }
    }
}

/// Payload of an enum tag value.
#[derive(Debug, Clone)]
pub enum EnumPayloadValue<'ast> {
    None,
    Tuple(Vec<ValueRef<'ast>>),
    Object(Vec<(String, ValueRef<'ast>)>),
}

#[derive(Debug, Clone)]
pub enum ValueData<'ast> {
    Integer(BigInt),
    Float(f64),
    Complex(f64, f64),
    Bool(bool),
    String(String),
    EnumTag {
        tag: String,
        payload: EnumPayloadValue<'ast>,
    },
    /// Elements of a structure (in field order) or a flattened array.
    Aggregate(Vec<ValueRef<'ast>>),
    Type(TypeRef<'ast>),
    Void,
    Builtin(Builtin),
    ImportedFunction {
        name: String,
    },
    FunctionSet(FunctionSetRef<'ast>),
}

/// A compile-time value.
#[derive(Debug, Clone)]
pub struct Value<'ast> {
    pub ty: TypeRef<'ast>,
    pub data: ValueData<'ast>,
}

impl Trace for Value<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        tracer.mark(self.ty);
        match &self.data {
            ValueData::EnumTag { payload, .. } => match payload {
                EnumPayloadValue::None => {}
                EnumPayloadValue::Tuple(values) => values.trace(tracer),
                EnumPayloadValue::Object(fields) => {
                    for (_, value) in fields {
                        tracer.mark(*value);
                    }
                }
            },
            ValueData::Aggregate(values) => values.trace(tracer),
            ValueData::Type(ty) => tracer.mark(*ty),
            ValueData::FunctionSet(set) => tracer.mark(*set),
            _ => {}
        }
    }
}

fn render_float(value: f64) -> String {
    if value.is_finite() && value.fract() == 0.0 && value.abs() < 1e16 {
        format!("{value:.1}")
    } else {
        format!("{value}")
    }
}

impl<'ast> CompilationContext<'ast> {
    pub fn alloc_value(&mut self, ty: TypeRef<'ast>, data: ValueData<'ast>) -> Scoped<Value<'ast>> {
        self.heap.alloc(Value { ty, data })
    }

    pub fn comptime_int(&mut self, value: impl Into<BigInt>) -> Scoped<Value<'ast>> {
        let ty = self.comptime_int_type();
        self.alloc_value(ty, ValueData::Integer(value.into()))
    }

    /// An integer value of a concrete or comptime integer type.
    pub fn int_value(&mut self, ty: TypeRef<'ast>, value: impl Into<BigInt>) -> Scoped<Value<'ast>> {
        self.alloc_value(ty, ValueData::Integer(value.into()))
    }

    pub fn comptime_float(&mut self, value: f64) -> Scoped<Value<'ast>> {
        let ty = self.comptime_float_type();
        self.alloc_value(ty, ValueData::Float(value))
    }

    pub fn float_value(&mut self, ty: TypeRef<'ast>, value: f64) -> Scoped<Value<'ast>> {
        self.alloc_value(ty, ValueData::Float(value))
    }

    pub fn complex_value(&mut self, ty: TypeRef<'ast>, re: f64, im: f64) -> Scoped<Value<'ast>> {
        self.alloc_value(ty, ValueData::Complex(re, im))
    }

    pub fn bool_value(&mut self, value: bool) -> Scoped<Value<'ast>> {
        let ty = self.bool_type();
        self.alloc_value(ty, ValueData::Bool(value))
    }

    pub fn string_value(&mut self, value: impl Into<String>) -> Scoped<Value<'ast>> {
        let ty = self.comptime_string_type();
        self.alloc_value(ty, ValueData::String(value.into()))
    }

    pub fn void_value(&mut self) -> Scoped<Value<'ast>> {
        let ty = self.void_type();
        self.alloc_value(ty, ValueData::Void)
    }

    /// A value of type `type` wrapping `ty`.
    pub fn type_value(&mut self, ty: TypeRef<'ast>) -> Scoped<Value<'ast>> {
        let type_ty = self.type_type();
        self.alloc_value(type_ty, ValueData::Type(ty))
    }

    pub fn builtin_value(&mut self, builtin: Builtin) -> Scoped<Value<'ast>> {
        let ty = self.builtin_reference_type();
        self.alloc_value(ty, ValueData::Builtin(builtin))
    }

    pub fn function_set_value(&mut self, set: FunctionSetRef<'ast>) -> Scoped<Value<'ast>> {
        let ty = self.function_set_type();
        self.alloc_value(ty, ValueData::FunctionSet(set))
    }

    /// The type wrapped by a type value.
    pub fn as_type(&self, value: ValueRef<'ast>) -> Option<TypeRef<'ast>> {
        match self.value(value).data {
            ValueData::Type(ty) => Some(ty),
            _ => None,
        }
    }

    pub fn as_integer(&self, value: ValueRef<'ast>) -> Option<&BigInt> {
        match &self.value(value).data {
            ValueData::Integer(integer) => Some(integer),
            _ => None,
        }
    }

    /// Structural equality of type and payload.
    pub fn is_same_as(&self, a: ValueRef<'ast>, b: ValueRef<'ast>) -> bool {
        if a == b {
            return true;
        }
        let (va, vb) = (self.value(a), self.value(b));
        if !self.identical(va.ty, vb.ty) {
            return false;
        }
        match (&va.data, &vb.data) {
            (ValueData::Integer(x), ValueData::Integer(y)) => x == y,
            (ValueData::Float(x), ValueData::Float(y)) => OrderedFloat(*x) == OrderedFloat(*y),
            (ValueData::Complex(xr, xi), ValueData::Complex(yr, yi)) => {
                OrderedFloat(*xr) == OrderedFloat(*yr) && OrderedFloat(*xi) == OrderedFloat(*yi)
            }
            (ValueData::Bool(x), ValueData::Bool(y)) => x == y,
            (ValueData::String(x), ValueData::String(y)) => x == y,
            (
                ValueData::EnumTag { tag, payload },
                ValueData::EnumTag {
                    tag: other_tag,
                    payload: other_payload,
                },
            ) => tag == other_tag && self.same_payload(payload, other_payload),
            (ValueData::Aggregate(xs), ValueData::Aggregate(ys)) => self.same_values(xs, ys),
            (ValueData::Type(x), ValueData::Type(y)) => self.identical(*x, *y),
            (ValueData::Void, ValueData::Void) => true,
            (ValueData::Builtin(x), ValueData::Builtin(y)) => x == y,
            (ValueData::ImportedFunction { name }, ValueData::ImportedFunction { name: other }) => name == other,
            (ValueData::FunctionSet(x), ValueData::FunctionSet(y)) => x == y,
            _ => false,
        }
    }

    fn same_values(&self, xs: &[ValueRef<'ast>], ys: &[ValueRef<'ast>]) -> bool {
        xs.len() == ys.len() && xs.iter().zip(ys).all(|(x, y)| self.is_same_as(*x, *y))
    }

    fn same_payload(&self, a: &EnumPayloadValue<'ast>, b: &EnumPayloadValue<'ast>) -> bool {
        match (a, b) {
            (EnumPayloadValue::None, EnumPayloadValue::None) => true,
            (EnumPayloadValue::Tuple(xs), EnumPayloadValue::Tuple(ys)) => self.same_values(xs, ys),
            (EnumPayloadValue::Object(xs), EnumPayloadValue::Object(ys)) => {
                xs.len() == ys.len()
                    && xs
                        .iter()
                        .zip(ys)
                        .all(|((xn, xv), (yn, yv))| xn == yn && self.is_same_as(*xv, *yv))
            }
            _ => false,
        }
    }

    /// Source-like rendering of a value.
    pub fn value_to_string(&self, value: ValueRef<'ast>) -> String {
        let data = self.value(value);
        match &data.data {
            ValueData::Integer(integer) => integer.to_string(),
            ValueData::Float(float) => render_float(*float),
            ValueData::Complex(re, im) => {
                let sign = if *im < 0.0 { "" } else { "+" };
                format!("{}{sign}{}i", render_float(*re), render_float(*im))
            }
            ValueData::Bool(flag) => flag.to_string(),
            ValueData::String(string) => format!("{string:?}"),
            ValueData::EnumTag { tag, payload } => {
                let mut out = format!(".{tag}");
                match payload {
                    EnumPayloadValue::None => {}
                    EnumPayloadValue::Tuple(values) => {
                        let _ = write!(out, "({})", self.render_list(values));
                    }
                    EnumPayloadValue::Object(fields) => {
                        let _ = write!(out, "{{{}}}", self.render_fields(fields.iter().map(|(n, v)| (n.as_str(), *v))));
                    }
                }
                out
            }
            ValueData::Aggregate(values) => match self.ty(data.ty) {
                Type::Structure(structure) if structure.is_tuple => {
                    format!(".({})", self.render_list(values))
                }
                Type::Structure(structure) => {
                    let fields = structure.fields.iter().map(|f| f.name.as_str()).zip(values.iter().copied());
                    format!(".{{{}}}", self.render_fields(fields))
                }
                _ => format!(".[{}]", self.render_list(values)),
            },
            ValueData::Type(ty) => self.type_name(*ty),
            ValueData::Void => "none".to_string(),
            ValueData::Builtin(builtin) => builtin.as_str().to_string(),
            ValueData::ImportedFunction { name } => name.clone(),
            ValueData::FunctionSet(set) => self.function_set(*set).name.clone(),
        }
    }

    fn render_list(&self, values: &[ValueRef<'ast>]) -> String {
        values
            .iter()
            .map(|value| self.value_to_string(*value))
            .collect::<Vec<_>>()
            .join(", ")
    }

    fn render_fields<'a>(&self, fields: impl Iterator<Item = (&'a str, ValueRef<'ast>)>) -> String {
        fields
            .map(|(name, value)| format!("{name} = {}", self.value_to_string(value)))
            .collect::<Vec<_>>()
            .join(", ")
    }
}
