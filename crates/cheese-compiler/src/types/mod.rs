//! Type algebra.
//!
//! One closed sum, [`Type`], covers compile-time-only and runtime types alike.
//! Primitive variants are singletons per compilation unit and composite
//! shapes are pooled (see [`cache`]), so handle identity is type identity for
//! everything except structures, which compare structurally only when one side
//! is an implicit literal type.
//!
//! ## Modules
//!
//! - [`cache`]: singleton and shape pools
//! - [`compare`]: conversion distances
//! - [`peer`]: common type of two operands
//! - [`metadata`]: `__name__`/`__size__`/limit lookups and layout
//! - [`flatten`]: lowering to the backend type graph

pub mod cache;
pub mod compare;
pub mod flatten;
pub mod metadata;
pub mod peer;

use bitflags::bitflags;
use cheese_ast::Member;
use cheese_core::{Trace, Tracer};
use rustc_hash::FxHashMap;

use crate::context::CompilationContext;
use crate::object::{FunctionSetRef, ScopeRef, TypeRef, ValueRef};

pub use cache::TypeCache;
pub use compare::{ANY_DISTANCE, INCOMPATIBLE, MATERIALIZE_BASE};

/// Whether values of a type are known at compile time.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comptimeness {
    Comptime,
    ArgumentDepending,
    Runtime,
}

bitflags! {
    /// Set of type variants, used for explicit cast targets.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
    pub struct TypeKinds: u32 {
        const SIGNED_INTEGER    = 1 << 0;
        const UNSIGNED_INTEGER  = 1 << 1;
        const COMPTIME_INT      = 1 << 2;
        const COMPTIME_FLOAT    = 1 << 3;
        const COMPTIME_COMPLEX  = 1 << 4;
        const COMPTIME_STRING   = 1 << 5;
        const COMPTIME_ENUM     = 1 << 6;
        const FLOAT64           = 1 << 7;
        const COMPLEX64         = 1 << 8;
        const BOOLEAN           = 1 << 9;
        const VOID              = 1 << 10;
        const NORETURN          = 1 << 11;
        const ANY               = 1 << 12;
        const REFERENCE         = 1 << 13;
        const POINTER           = 1 << 14;
        const SLICE             = 1 << 15;
        const ARRAY             = 1 << 16;
        const STRUCTURE         = 1 << 17;
        const FUNCTION_POINTER  = 1 << 18;
        const IMPORTED_FUNCTION = 1 << 19;
        const BUILTIN_REFERENCE = 1 << 20;
        const TYPE              = 1 << 21;
        const ERROR             = 1 << 22;
        const FUNCTION_SET      = 1 << 23;

        const INTEGERS = Self::SIGNED_INTEGER.bits() | Self::UNSIGNED_INTEGER.bits() | Self::COMPTIME_INT.bits();
        const FLOATS = Self::FLOAT64.bits() | Self::COMPTIME_FLOAT.bits();
        const COMPLEXES = Self::COMPLEX64.bits() | Self::COMPTIME_COMPLEX.bits();
    }
}

/// A type. Allocated on the heap and referred to by [`TypeRef`].
#[derive(Debug)]
pub enum Type<'ast> {
    Integer { signed: bool, bits: u16 },
    ComptimeInt,
    ComptimeFloat,
    ComptimeComplex,
    ComptimeString,
    ComptimeEnum,
    Float64,
    Complex64,
    Boolean,
    Void,
    NoReturn,
    Any,
    Reference { child: TypeRef<'ast>, constant: bool },
    Pointer { child: TypeRef<'ast>, constant: bool },
    Slice { child: TypeRef<'ast>, constant: bool },
    Array { child: TypeRef<'ast>, dimensions: Vec<usize>, constant: bool },
    Structure(Box<Structure<'ast>>),
    FunctionPointer { arguments: Vec<TypeRef<'ast>>, return_type: TypeRef<'ast> },
    ImportedFunction { arguments: Vec<TypeRef<'ast>>, return_type: TypeRef<'ast> },
    BuiltinReference,
    /// The type of type values.
    TypeType,
    /// Type of function set values.
    FunctionSet,
    Error,
}

impl<'ast> Type<'ast> {
    /// The single kind flag of this variant.
    pub fn kind(&self) -> TypeKinds {
        match self {
            Type::Integer { signed: true, .. } => TypeKinds::SIGNED_INTEGER,
            Type::Integer { signed: false, .. } => TypeKinds::UNSIGNED_INTEGER,
            Type::ComptimeInt => TypeKinds::COMPTIME_INT,
            Type::ComptimeFloat => TypeKinds::COMPTIME_FLOAT,
            Type::ComptimeComplex => TypeKinds::COMPTIME_COMPLEX,
            Type::ComptimeString => TypeKinds::COMPTIME_STRING,
            Type::ComptimeEnum => TypeKinds::COMPTIME_ENUM,
            Type::Float64 => TypeKinds::FLOAT64,
            Type::Complex64 => TypeKinds::COMPLEX64,
            Type::Boolean => TypeKinds::BOOLEAN,
            Type::Void => TypeKinds::VOID,
            Type::NoReturn => TypeKinds::NORETURN,
            Type::Any => TypeKinds::ANY,
            Type::Reference { .. } => TypeKinds::REFERENCE,
            Type::Pointer { .. } => TypeKinds::POINTER,
            Type::Slice { .. } => TypeKinds::SLICE,
            Type::Array { .. } => TypeKinds::ARRAY,
            Type::Structure(_) => TypeKinds::STRUCTURE,
            Type::FunctionPointer { .. } => TypeKinds::FUNCTION_POINTER,
            Type::ImportedFunction { .. } => TypeKinds::IMPORTED_FUNCTION,
            Type::BuiltinReference => TypeKinds::BUILTIN_REFERENCE,
            Type::TypeType => TypeKinds::TYPE,
            Type::FunctionSet => TypeKinds::FUNCTION_SET,
            Type::Error => TypeKinds::ERROR,
        }
    }

    /// Kinds a value of this type may be explicitly cast to.
    pub fn cast_target_kinds(&self) -> TypeKinds {
        let numeric = TypeKinds::INTEGERS | TypeKinds::FLOATS | TypeKinds::COMPLEXES;
        let targets = match self {
            Type::Integer { .. } | Type::ComptimeInt => numeric | TypeKinds::BOOLEAN,
            Type::Float64 | Type::ComptimeFloat => numeric,
            Type::Complex64 | Type::ComptimeComplex => TypeKinds::COMPLEXES,
            Type::Boolean => TypeKinds::BOOLEAN | TypeKinds::INTEGERS,
            Type::Structure(_) | Type::Array { .. } => TypeKinds::STRUCTURE | TypeKinds::ARRAY,
            other => other.kind(),
        };
        targets | TypeKinds::ANY
    }

    pub fn is_integer(&self) -> bool {
        matches!(self, Type::Integer { .. } | Type::ComptimeInt)
    }

    pub fn as_structure(&self) -> Option<&Structure<'ast>> {
        match self {
            Type::Structure(structure) => Some(structure),
            _ => None,
        }
    }

    pub fn as_structure_mut(&mut self) -> Option<&mut Structure<'ast>> {
        match self {
            Type::Structure(structure) => Some(structure),
            _ => None,
        }
    }
}

impl Trace for Type<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        match self {
            Type::Reference { child, .. }
            | Type::Pointer { child, .. }
            | Type::Slice { child, .. }
            | Type::Array { child, .. } => tracer.mark(*child),
            Type::FunctionPointer { arguments, return_type }
            | Type::ImportedFunction { arguments, return_type } => {
                arguments.trace(tracer);
                tracer.mark(*return_type);
            }
            Type::Structure(structure) => structure.trace(tracer),
            _ => {}
        }
    }
}

/// A resolved field.
#[derive(Debug, Clone)]
pub struct Field<'ast> {
    pub name: String,
    pub ty: TypeRef<'ast>,
}

/// A member whose value is known at compile time.
#[derive(Debug, Clone)]
pub struct ComptimeVariable<'ast> {
    pub public: bool,
    pub constant: bool,
    pub ty: TypeRef<'ast>,
    pub value: ValueRef<'ast>,
}

/// A runtime global.
#[derive(Debug, Clone)]
pub struct TopLevelVariable<'ast> {
    pub public: bool,
    pub constant: bool,
    pub ty: TypeRef<'ast>,
    pub mangled_name: String,
    /// Comptime-evaluated initial value, when the initializer allowed it.
    pub initial: Option<ValueRef<'ast>>,
}

/// A member whose declaration has not been resolved yet.
#[derive(Debug, Clone, Copy)]
pub struct LazyMember<'ast> {
    pub name: &'ast str,
    pub member: Member<'ast>,
}

/// A named aggregate type and the namespace it declares.
#[derive(Debug, Default)]
pub struct Structure<'ast> {
    pub name: String,
    pub is_tuple: bool,
    /// Produced by an aggregate literal rather than a declaration.
    pub implicit: bool,
    pub fields: Vec<Field<'ast>>,
    pub comptime_variables: FxHashMap<String, ComptimeVariable<'ast>>,
    pub top_level_variables: FxHashMap<String, TopLevelVariable<'ast>>,
    /// Unresolved members in declaration order.
    pub lazies: Vec<LazyMember<'ast>>,
    /// Members whose initializer is currently executing.
    pub resolving: Vec<String>,
    /// Members whose resolution failed; their error was already raised.
    pub failed: Vec<String>,
    pub function_sets: FxHashMap<String, FunctionSetRef<'ast>>,
    /// Evaluation scope of the structure body.
    pub scope: Option<ScopeRef<'ast>>,
    pub cycles_broken: bool,
}

impl<'ast> Structure<'ast> {
    pub fn new(name: impl Into<String>, is_tuple: bool) -> Self {
        Self {
            name: name.into(),
            is_tuple,
            ..Self::default()
        }
    }

    /// Implicit structure for an aggregate literal.
    pub fn implicit(name: impl Into<String>, is_tuple: bool, fields: Vec<Field<'ast>>) -> Self {
        Self {
            name: name.into(),
            is_tuple,
            implicit: true,
            fields,
            ..Self::default()
        }
    }

    pub fn field(&self, name: &str) -> Option<(usize, &Field<'ast>)> {
        self.fields.iter().enumerate().find(|(_, field)| field.name == name)
    }

    pub fn is_lazy(&self, name: &str) -> bool {
        self.lazies.iter().any(|lazy| lazy.name == name)
    }

    /// Whether any member already uses `name`.
    pub fn declares(&self, name: &str) -> bool {
        self.fields.iter().any(|field| field.name == name)
            || self.comptime_variables.contains_key(name)
            || self.top_level_variables.contains_key(name)
            || self.function_sets.contains_key(name)
            || self.is_lazy(name)
            || self.failed.iter().any(|failed| failed == name)
    }
}

impl Trace for Structure<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        for field in &self.fields {
            tracer.mark(field.ty);
        }
        for variable in self.comptime_variables.values() {
            tracer.mark(variable.ty);
            tracer.mark(variable.value);
        }
        for variable in self.top_level_variables.values() {
            tracer.mark(variable.ty);
            variable.initial.trace(tracer);
        }
        for set in self.function_sets.values() {
            tracer.mark(*set);
        }
        self.scope.trace(tracer);
    }
}

/// Positional field name of a tuple element.
pub fn tuple_field_name(index: usize) -> String {
    format!("_{index}")
}

impl<'ast> CompilationContext<'ast> {
    /// Whether values of `ty` are compile-time only.
    pub fn comptimeness(&self, ty: TypeRef<'ast>) -> Comptimeness {
        self.comptimeness_guarded(ty, &mut Vec::new())
    }

    fn comptimeness_guarded(&self, ty: TypeRef<'ast>, visiting: &mut Vec<TypeRef<'ast>>) -> Comptimeness {
        match self.ty(ty) {
            Type::ComptimeInt
            | Type::ComptimeFloat
            | Type::ComptimeComplex
            | Type::ComptimeString
            | Type::ComptimeEnum
            | Type::TypeType
            | Type::BuiltinReference
            | Type::Error
            | Type::ImportedFunction { .. }
            | Type::FunctionSet => Comptimeness::Comptime,
            Type::Any => Comptimeness::ArgumentDepending,
            Type::Reference { child, .. }
            | Type::Pointer { child, .. }
            | Type::Slice { child, .. }
            | Type::Array { child, .. } => self.comptimeness_guarded(*child, visiting),
            Type::Structure(structure) => {
                if visiting.contains(&ty) {
                    return Comptimeness::Runtime;
                }
                visiting.push(ty);
                let comptime = structure
                    .fields
                    .iter()
                    .any(|field| self.comptimeness_guarded(field.ty, visiting) != Comptimeness::Runtime);
                visiting.pop();
                if comptime {
                    Comptimeness::Comptime
                } else {
                    Comptimeness::Runtime
                }
            }
            _ => Comptimeness::Runtime,
        }
    }

    pub fn is_comptime_type(&self, ty: TypeRef<'ast>) -> bool {
        self.comptimeness(ty) == Comptimeness::Comptime
    }

    /// Source-level spelling of a type.
    pub fn type_name(&self, ty: TypeRef<'ast>) -> String {
        let constness = |constant: bool| if constant { "~" } else { "" };
        match self.ty(ty) {
            Type::Integer { signed, bits } => format!("{}{bits}", if *signed { 'i' } else { 'u' }),
            Type::ComptimeInt => "comptime_int".to_string(),
            Type::ComptimeFloat => "comptime_float".to_string(),
            Type::ComptimeComplex => "comptime_complex".to_string(),
            Type::ComptimeString => "comptime_string".to_string(),
            Type::ComptimeEnum => "$ComptimeEnum".to_string(),
            Type::Float64 => "f64".to_string(),
            Type::Complex64 => "c64".to_string(),
            Type::Boolean => "bool".to_string(),
            Type::Void => "void".to_string(),
            Type::NoReturn => "noreturn".to_string(),
            Type::Any => "any".to_string(),
            Type::Reference { child, constant } => {
                format!("*{}{}", constness(*constant), self.type_name(*child))
            }
            Type::Pointer { child, constant } => {
                format!("[?]{}{}", constness(*constant), self.type_name(*child))
            }
            Type::Slice { child, constant } => {
                format!("<>{}{}", constness(*constant), self.type_name(*child))
            }
            Type::Array {
                child,
                dimensions,
                constant,
            } => {
                let dimensions: Vec<String> = dimensions.iter().map(usize::to_string).collect();
                format!(
                    "[{}]{}{}",
                    dimensions.join(","),
                    constness(*constant),
                    self.type_name(*child)
                )
            }
            Type::Structure(structure) => structure.name.clone(),
            Type::FunctionPointer { arguments, return_type } => {
                format!("*fn({})=>{}", self.type_list(arguments), self.type_name(*return_type))
            }
            Type::ImportedFunction { arguments, return_type } => {
                format!(
                    "fn({})=>{} import",
                    self.type_list(arguments),
                    self.type_name(*return_type)
                )
            }
            Type::BuiltinReference => "$BuiltinReference".to_string(),
            Type::TypeType => "type".to_string(),
            Type::FunctionSet => "$FunctionSet".to_string(),
            Type::Error => "ERROR!".to_string(),
        }
    }

    fn type_list(&self, types: &[TypeRef<'ast>]) -> String {
        types
            .iter()
            .map(|ty| self.type_name(*ty))
            .collect::<Vec<_>>()
            .join(",")
    }

    /// The structure payload of `ty`, if it is one.
    pub fn structure(&self, ty: TypeRef<'ast>) -> Option<&Structure<'ast>> {
        self.ty(ty).as_structure()
    }

    pub fn structure_mut(&mut self, ty: TypeRef<'ast>) -> Option<&mut Structure<'ast>> {
        self.ty_mut(ty).as_structure_mut()
    }

    /// Integer width and signedness, `None` for unbounded comptime integers.
    pub fn integer_range(&self, ty: TypeRef<'ast>) -> Option<(bool, u16)> {
        match self.ty(ty) {
            Type::Integer { signed, bits } => Some((*signed, *bits)),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::CompilerConfig;

    #[test]
    fn cast_targets_include_any() {
        let ty: Type<'_> = Type::ComptimeString;
        assert!(ty.cast_target_kinds().contains(TypeKinds::ANY));
        assert!(ty.cast_target_kinds().contains(TypeKinds::COMPTIME_STRING));
        assert!(!ty.cast_target_kinds().contains(TypeKinds::SIGNED_INTEGER));
    }

    #[test]
    fn integers_cast_to_numerics_and_bool() {
        let ty: Type<'_> = Type::Integer {
            signed: true,
            bits: 32,
        };
        let targets = ty.cast_target_kinds();
        assert!(targets.contains(TypeKinds::FLOAT64 | TypeKinds::BOOLEAN | TypeKinds::UNSIGNED_INTEGER));
        assert!(!targets.contains(TypeKinds::STRUCTURE));
    }

    #[test]
    fn complex_does_not_narrow() {
        let ty: Type<'_> = Type::Complex64;
        assert!(!ty.cast_target_kinds().contains(TypeKinds::FLOAT64));
    }

    #[test]
    fn type_names() {
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let i32_ty = ctx.integer_type(true, 32);
        let u8_ty = ctx.integer_type(false, 8);
        let reference = ctx.reference_type(i32_ty, true);
        let pointer = ctx.pointer_type(u8_ty, false);
        let slice = ctx.slice_type(u8_ty, false);
        let array = ctx.array_type(i32_ty, vec![2, 3], true);
        let function = ctx.function_pointer_type(vec![i32_ty, u8_ty], i32_ty);
        let imported = ctx.imported_function_type(vec![i32_ty], i32_ty);
        let error = ctx.error_type();

        assert_eq!(ctx.type_name(reference), "*~i32");
        assert_eq!(ctx.type_name(pointer), "[?]u8");
        assert_eq!(ctx.type_name(slice), "<>u8");
        assert_eq!(ctx.type_name(array), "[2,3]~i32");
        assert_eq!(ctx.type_name(function), "*fn(i32,u8)=>i32");
        assert_eq!(ctx.type_name(imported), "fn(i32)=>i32 import");
        assert_eq!(ctx.type_name(error), "ERROR!");
    }

    #[test]
    fn comptimeness_follows_children() {
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let comptime_int = ctx.comptime_int_type();
        let i32_ty = ctx.integer_type(true, 32);
        let any = ctx.any_type();
        let noreturn = ctx.noreturn_type();
        let comptime_ref = ctx.reference_type(comptime_int, false);
        let runtime_array = ctx.array_type(i32_ty, vec![4], false);

        assert_eq!(ctx.comptimeness(comptime_ref), Comptimeness::Comptime);
        assert_eq!(ctx.comptimeness(runtime_array), Comptimeness::Runtime);
        assert_eq!(ctx.comptimeness(any), Comptimeness::ArgumentDepending);
        assert_eq!(ctx.comptimeness(noreturn), Comptimeness::Runtime);
    }

    #[test]
    fn structure_comptimeness_from_fields() {
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let i32_ty = ctx.integer_type(true, 32);
        let type_ty = ctx.type_type();
        let runtime = ctx.implicit_structure(
            false,
            vec![Field {
                name: "x".into(),
                ty: i32_ty,
            }],
        );
        let comptime = ctx.implicit_structure(
            false,
            vec![Field {
                name: "t".into(),
                ty: type_ty,
            }],
        );
        assert_eq!(ctx.comptimeness(runtime.get()), Comptimeness::Runtime);
        assert_eq!(ctx.comptimeness(comptime.get()), Comptimeness::Comptime);
    }

    #[test]
    fn self_referential_structure_is_runtime() {
        let mut ctx = CompilationContext::new(CompilerConfig::default());
        let node = ctx.declare_structure("Node", false);
        let pointer = ctx.pointer_type(node.get(), false);
        if let Some(structure) = ctx.structure_mut(node.get()) {
            structure.fields.push(Field {
                name: "next".into(),
                ty: pointer,
            });
        }
        assert_eq!(ctx.comptimeness(node.get()), Comptimeness::Runtime);
    }
}
