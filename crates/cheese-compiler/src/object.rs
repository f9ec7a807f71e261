//! Heap object model.
//!
//! Every semantic object lives in one [`Heap`] as a variant of [`Object`].
//! Typed handles (`TypeRef`, `ValueRef`, ...) are plain [`Gc`] indices; the
//! heap resolves them back to the concrete payload through [`Managed`].

use cheese_core::{Gc, Heap, Managed, Scoped, Trace, Tracer};

use crate::functions::{ConcreteFunction, FunctionSet, FunctionTemplate};
use crate::scope::Scope;
use crate::types::Type;
use crate::values::Value;

/// A managed allocation.
#[derive(Debug)]
pub enum Object<'ast> {
    Type(Type<'ast>),
    Value(Value<'ast>),
    Scope(Scope<'ast>),
    Template(FunctionTemplate<'ast>),
    FunctionSet(FunctionSet<'ast>),
    Concrete(ConcreteFunction<'ast>),
}

pub type ObjectHeap<'ast> = Heap<Object<'ast>>;

pub type TypeRef<'ast> = Gc<Type<'ast>>;
pub type ValueRef<'ast> = Gc<Value<'ast>>;
pub type ScopeRef<'ast> = Gc<Scope<'ast>>;
pub type TemplateRef<'ast> = Gc<FunctionTemplate<'ast>>;
pub type FunctionSetRef<'ast> = Gc<FunctionSet<'ast>>;
pub type ConcreteRef<'ast> = Gc<ConcreteFunction<'ast>>;

pub type ScopedType<'ast> = Scoped<Type<'ast>>;
pub type ScopedValue<'ast> = Scoped<Value<'ast>>;
pub type ScopedScope<'ast> = Scoped<Scope<'ast>>;

macro_rules! managed {
    ($variant:ident, $payload:ident) => {
        impl<'ast> Managed<Object<'ast>> for $payload<'ast> {
            fn into_object(self) -> Object<'ast> {
                Object::$variant(self)
            }

            fn downcast<'a>(object: &'a Object<'ast>) -> Option<&'a Self> {
                match object {
                    Object::$variant(payload) => Some(payload),
                    _ => None,
                }
            }

            fn downcast_mut<'a>(object: &'a mut Object<'ast>) -> Option<&'a mut Self> {
                match object {
                    Object::$variant(payload) => Some(payload),
                    _ => None,
                }
            }
        }
    };
}

managed!(Type, Type);
managed!(Value, Value);
managed!(Scope, Scope);
managed!(Template, FunctionTemplate);
managed!(FunctionSet, FunctionSet);
managed!(Concrete, ConcreteFunction);

impl Trace for Object<'_> {
    fn trace(&self, tracer: &mut Tracer<'_>) {
        match self {
            Object::Type(ty) => ty.trace(tracer),
            Object::Value(value) => value.trace(tracer),
            Object::Scope(scope) => scope.trace(tracer),
            Object::Template(template) => template.trace(tracer),
            Object::FunctionSet(set) => set.trace(tracer),
            Object::Concrete(concrete) => concrete.trace(tracer),
        }
    }
}
