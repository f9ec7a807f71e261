//! Lowering of types to the backend type graph.

use cheese_core::{CompileError, ErrorCode, Result};

use super::{Comptimeness, Type};
use crate::backend::{BackendType, BackendTypeId, Indirect};
use crate::context::CompilationContext;
use crate::object::TypeRef;

/// Child handles of a type, copied out before recursing.
enum Plan<'ast> {
    Leaf(BackendType),
    Indirect {
        child: TypeRef<'ast>,
        constant: bool,
        make: fn(Indirect) -> BackendType,
    },
    Array {
        child: TypeRef<'ast>,
        dimensions: Vec<usize>,
        constant: bool,
    },
    Structure {
        name: Option<String>,
        fields: Vec<TypeRef<'ast>>,
    },
    Function {
        arguments: Vec<TypeRef<'ast>>,
        return_type: TypeRef<'ast>,
    },
}

impl<'ast> CompilationContext<'ast> {
    /// Flattened descriptor of a runtime type.
    ///
    /// Descriptors are cached per type object. A structure's placeholder is
    /// cached before its fields are flattened, so self-referential fields
    /// find it; the cycle-breaking pass then runs once for that structure.
    #[cfg_attr(feature = "profiling", profiling::function)]
    pub fn backend_type(&mut self, ty: TypeRef<'ast>) -> Result<BackendTypeId> {
        if let Some(id) = self.backend_cache.get(&ty) {
            return Ok(*id);
        }
        if self.comptimeness(ty) != Comptimeness::Runtime {
            return Err(CompileError::new(
                ErrorCode::NoBackendType,
                format!("`{}` only exists at compile time", self.type_name(ty)),
            ));
        }
        let plan = match self.ty(ty) {
            Type::Integer { signed: true, bits } => Plan::Leaf(BackendType::SignedInteger(*bits)),
            Type::Integer { signed: false, bits } => Plan::Leaf(BackendType::UnsignedInteger(*bits)),
            Type::Boolean => Plan::Leaf(BackendType::UnsignedInteger(1)),
            Type::Float64 => Plan::Leaf(BackendType::Float64),
            Type::Complex64 => Plan::Leaf(BackendType::Complex64),
            Type::Void => Plan::Leaf(BackendType::Void),
            Type::NoReturn => Plan::Leaf(BackendType::NoReturn),
            Type::Reference { child, constant } => Plan::Indirect {
                child: *child,
                constant: *constant,
                make: BackendType::Reference,
            },
            Type::Pointer { child, constant } => Plan::Indirect {
                child: *child,
                constant: *constant,
                make: BackendType::Pointer,
            },
            Type::Slice { child, constant } => Plan::Indirect {
                child: *child,
                constant: *constant,
                make: BackendType::Slice,
            },
            Type::Array {
                child,
                dimensions,
                constant,
            } => Plan::Array {
                child: *child,
                dimensions: dimensions.clone(),
                constant: *constant,
            },
            Type::Structure(structure) => Plan::Structure {
                name: (!structure.implicit).then(|| structure.name.clone()),
                fields: structure.fields.iter().map(|field| field.ty).collect(),
            },
            Type::FunctionPointer { arguments, return_type } => Plan::Function {
                arguments: arguments.clone(),
                return_type: *return_type,
            },
            _ => {
                return Err(CompileError::new(
                    ErrorCode::NoBackendType,
                    format!("`{}` has no backend representation", self.type_name(ty)),
                ));
            }
        };

        let id = match plan {
            Plan::Leaf(leaf) => self.program.push(leaf),
            Plan::Indirect { child, constant, make } => {
                let target = self.backend_type(child)?;
                self.program.push(make(Indirect {
                    target,
                    constant,
                    weak: false,
                }))
            }
            Plan::Array {
                child,
                dimensions,
                constant,
            } => {
                let element = self.backend_type(child)?;
                self.program.push(BackendType::Array {
                    element,
                    dimensions,
                    constant,
                })
            }
            Plan::Function { arguments, return_type } => {
                let arguments = arguments
                    .into_iter()
                    .map(|argument| self.backend_type(argument))
                    .collect::<Result<Vec<_>>>()?;
                let return_type = self.backend_type(return_type)?;
                self.program.push(BackendType::FunctionPointer { arguments, return_type })
            }
            Plan::Structure { name, fields } => return self.flatten_structure(ty, name, fields),
        };
        self.backend_cache.insert(ty, id);
        Ok(id)
    }

    fn flatten_structure(
        &mut self,
        ty: TypeRef<'ast>,
        name: Option<String>,
        fields: Vec<TypeRef<'ast>>,
    ) -> Result<BackendTypeId> {
        let placeholder = self.program.push(BackendType::Opaque);
        self.backend_cache.insert(ty, placeholder);
        let mut children = Vec::with_capacity(fields.len());
        for field in fields {
            match self.backend_type(field) {
                Ok(child) => children.push(child),
                Err(err) => {
                    self.backend_cache.remove(&ty);
                    return Err(err);
                }
            }
        }
        if let Some(slot) = self.program.get_mut(placeholder) {
            *slot = BackendType::Aggregate { name, children };
        }
        let already = self.structure(ty).is_some_and(|structure| structure.cycles_broken);
        if !already {
            let rewritten = self.program.break_cycles(placeholder);
            if rewritten > 0 {
                tracing::trace!(structure = %self.type_name(ty), rewritten, "broke type cycles");
            }
            if let Some(structure) = self.structure_mut(ty) {
                structure.cycles_broken = true;
            }
        }
        Ok(placeholder)
    }
}
