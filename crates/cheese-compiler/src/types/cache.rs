//! Type singletons and shape pools.
//!
//! Primitive types are installed once per compilation unit under a descriptive
//! key; composite shapes (references, pointers, slices, arrays, function
//! types) are pooled by their children. Both pools are permanent roots, so a
//! handle returned from here never needs a [`Scoped`] guard.

use rustc_hash::FxHashMap;

use cheese_core::Scoped;

use super::{Field, Structure, Type};
use crate::context::CompilationContext;
use crate::object::TypeRef;

#[derive(Debug, Clone, PartialEq, Eq, Hash)]
enum ShapeKey<'ast> {
    Reference(TypeRef<'ast>, bool),
    Pointer(TypeRef<'ast>, bool),
    Slice(TypeRef<'ast>, bool),
    Array(TypeRef<'ast>, Vec<usize>, bool),
    FunctionPointer(Vec<TypeRef<'ast>>, TypeRef<'ast>),
    ImportedFunction(Vec<TypeRef<'ast>>, TypeRef<'ast>),
}

/// Per-unit pools of interned types.
#[derive(Debug, Default)]
pub struct TypeCache<'ast> {
    singletons: FxHashMap<String, TypeRef<'ast>>,
    shapes: FxHashMap<ShapeKey<'ast>, TypeRef<'ast>>,
}

impl<'ast> TypeCache<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn singleton_count(&self) -> usize {
        self.singletons.len()
    }

    pub fn shape_count(&self) -> usize {
        self.shapes.len()
    }
}

impl<'ast> CompilationContext<'ast> {
    fn singleton(&mut self, key: &str, make: impl FnOnce() -> Type<'ast>) -> TypeRef<'ast> {
        if let Some(ty) = self.types.singletons.get(key) {
            return *ty;
        }
        let ty = self.heap.alloc_root(make());
        self.types.singletons.insert(key.to_string(), ty);
        tracing::trace!(key, "installed type singleton");
        ty
    }

    fn shape(&mut self, key: ShapeKey<'ast>, make: impl FnOnce() -> Type<'ast>) -> TypeRef<'ast> {
        if let Some(ty) = self.types.shapes.get(&key) {
            return *ty;
        }
        let ty = self.heap.alloc_root(make());
        self.types.shapes.insert(key, ty);
        ty
    }

    pub fn integer_type(&mut self, signed: bool, bits: u16) -> TypeRef<'ast> {
        let key = format!("{}{bits}", if signed { 'i' } else { 'u' });
        self.singleton(&key, || Type::Integer { signed, bits })
    }

    pub fn comptime_int_type(&mut self) -> TypeRef<'ast> {
        self.singleton("comptime_int", || Type::ComptimeInt)
    }

    pub fn comptime_float_type(&mut self) -> TypeRef<'ast> {
        self.singleton("comptime_float", || Type::ComptimeFloat)
    }

    pub fn comptime_complex_type(&mut self) -> TypeRef<'ast> {
        self.singleton("comptime_complex", || Type::ComptimeComplex)
    }

    pub fn comptime_string_type(&mut self) -> TypeRef<'ast> {
        self.singleton("comptime_string", || Type::ComptimeString)
    }

    pub fn comptime_enum_type(&mut self) -> TypeRef<'ast> {
        self.singleton("$ComptimeEnum", || Type::ComptimeEnum)
    }

    pub fn f64_type(&mut self) -> TypeRef<'ast> {
        self.singleton("f64", || Type::Float64)
    }

    pub fn c64_type(&mut self) -> TypeRef<'ast> {
        self.singleton("c64", || Type::Complex64)
    }

    pub fn bool_type(&mut self) -> TypeRef<'ast> {
        self.singleton("bool", || Type::Boolean)
    }

    pub fn void_type(&mut self) -> TypeRef<'ast> {
        self.singleton("void", || Type::Void)
    }

    pub fn noreturn_type(&mut self) -> TypeRef<'ast> {
        self.singleton("noreturn", || Type::NoReturn)
    }

    pub fn any_type(&mut self) -> TypeRef<'ast> {
        self.singleton("any", || Type::Any)
    }

    pub fn type_type(&mut self) -> TypeRef<'ast> {
        self.singleton("type", || Type::TypeType)
    }

    pub fn error_type(&mut self) -> TypeRef<'ast> {
        self.singleton("error", || Type::Error)
    }

    pub fn builtin_reference_type(&mut self) -> TypeRef<'ast> {
        self.singleton("builtin_reference", || Type::BuiltinReference)
    }

    pub fn function_set_type(&mut self) -> TypeRef<'ast> {
        self.singleton("function_template", || Type::FunctionSet)
    }

    pub fn reference_type(&mut self, child: TypeRef<'ast>, constant: bool) -> TypeRef<'ast> {
        self.shape(ShapeKey::Reference(child, constant), || Type::Reference { child, constant })
    }

    pub fn pointer_type(&mut self, child: TypeRef<'ast>, constant: bool) -> TypeRef<'ast> {
        self.shape(ShapeKey::Pointer(child, constant), || Type::Pointer { child, constant })
    }

    pub fn slice_type(&mut self, child: TypeRef<'ast>, constant: bool) -> TypeRef<'ast> {
        self.shape(ShapeKey::Slice(child, constant), || Type::Slice { child, constant })
    }

    pub fn array_type(&mut self, child: TypeRef<'ast>, dimensions: Vec<usize>, constant: bool) -> TypeRef<'ast> {
        let key = ShapeKey::Array(child, dimensions.clone(), constant);
        self.shape(key, || Type::Array {
            child,
            dimensions,
            constant,
        })
    }

    pub fn function_pointer_type(&mut self, arguments: Vec<TypeRef<'ast>>, return_type: TypeRef<'ast>) -> TypeRef<'ast> {
        let key = ShapeKey::FunctionPointer(arguments.clone(), return_type);
        self.shape(key, || Type::FunctionPointer { arguments, return_type })
    }

    pub fn imported_function_type(&mut self, arguments: Vec<TypeRef<'ast>>, return_type: TypeRef<'ast>) -> TypeRef<'ast> {
        let key = ShapeKey::ImportedFunction(arguments.clone(), return_type);
        self.shape(key, || Type::ImportedFunction { arguments, return_type })
    }

    /// Allocate a new declared structure under a unique registered name.
    ///
    /// The structure is not rooted; keep the returned handle until it is
    /// reachable from a root.
    pub fn declare_structure(&mut self, name: &str, is_tuple: bool) -> Scoped<Type<'ast>> {
        let name = self.names.register(name);
        self.heap
            .alloc(Type::Structure(Box::new(Structure::new(name, is_tuple))))
    }

    /// Allocate the implicit structure type of an aggregate literal.
    pub fn implicit_structure(&mut self, is_tuple: bool, fields: Vec<Field<'ast>>) -> Scoped<Type<'ast>> {
        let name = self.names.literal();
        self.heap
            .alloc(Type::Structure(Box::new(Structure::implicit(name, is_tuple, fields))))
    }
}
