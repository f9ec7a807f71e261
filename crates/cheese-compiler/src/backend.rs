//! Output handed to the lowering stage.
//!
//! [`BackendProgram`] is an arena of flattened type descriptors addressed by
//! [`BackendTypeId`], plus the concrete function and global records produced
//! during analysis. Descriptors reference each other by id; a reference,
//! pointer or slice that closes a cycle back to its structure carries
//! `weak = true` and must not be expanded.

use std::fmt::Write as _;

use cheese_ast::FunctionBody;

use crate::object::{ScopeRef, ValueRef};

/// Index of a descriptor in a [`BackendProgram`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct BackendTypeId(pub u32);

/// Target of a reference, pointer or slice.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Indirect {
    pub target: BackendTypeId,
    pub constant: bool,
    /// Identity-only edge that closes a structural cycle.
    pub weak: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum BackendType {
    Opaque,
    Void,
    NoReturn,
    SignedInteger(u16),
    UnsignedInteger(u16),
    Float64,
    Complex64,
    Array {
        element: BackendTypeId,
        dimensions: Vec<usize>,
        constant: bool,
    },
    Reference(Indirect),
    Pointer(Indirect),
    Slice(Indirect),
    Aggregate {
        /// `None` for anonymous literal structures.
        name: Option<String>,
        children: Vec<BackendTypeId>,
    },
    FunctionPointer {
        arguments: Vec<BackendTypeId>,
        return_type: BackendTypeId,
    },
}

impl BackendType {
    pub fn indirect(&self) -> Option<&Indirect> {
        match self {
            BackendType::Reference(indirect) | BackendType::Pointer(indirect) | BackendType::Slice(indirect) => {
                Some(indirect)
            }
            _ => None,
        }
    }

    fn indirect_mut(&mut self) -> Option<&mut Indirect> {
        match self {
            BackendType::Reference(indirect) | BackendType::Pointer(indirect) | BackendType::Slice(indirect) => {
                Some(indirect)
            }
            _ => None,
        }
    }
}

/// A runtime function ready for lowering.
#[derive(Debug, Clone)]
pub struct FunctionRecord<'ast> {
    pub mangled_name: String,
    /// Runtime-visible arguments in declaration order.
    pub arguments: Vec<(String, BackendTypeId)>,
    pub return_type: BackendTypeId,
    pub body: FunctionBody<'ast>,
    /// Scope holding the argument bindings the body is checked against.
    pub scope: ScopeRef<'ast>,
}

/// A runtime global.
#[derive(Debug, Clone)]
pub struct GlobalRecord<'ast> {
    pub mangled_name: String,
    pub ty: BackendTypeId,
    pub constant: bool,
    /// Compile-time initial value, when the initializer was evaluable.
    pub initial: Option<ValueRef<'ast>>,
}

#[derive(Debug, Default)]
pub struct BackendProgram<'ast> {
    types: Vec<BackendType>,
    pub functions: Vec<FunctionRecord<'ast>>,
    pub globals: Vec<GlobalRecord<'ast>>,
}

impl<'ast> BackendProgram<'ast> {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, ty: BackendType) -> BackendTypeId {
        self.types.push(ty);
        BackendTypeId((self.types.len() - 1) as u32)
    }

    pub fn get(&self, id: BackendTypeId) -> Option<&BackendType> {
        self.types.get(id.0 as usize)
    }

    pub(crate) fn get_mut(&mut self, id: BackendTypeId) -> Option<&mut BackendType> {
        self.types.get_mut(id.0 as usize)
    }

    pub fn type_count(&self) -> usize {
        self.types.len()
    }

    pub fn types(&self) -> impl Iterator<Item = (BackendTypeId, &BackendType)> {
        self.types
            .iter()
            .enumerate()
            .map(|(index, ty)| (BackendTypeId(index as u32), ty))
    }

    /// Rewrite every edge from the graph below `root` back into `root` as weak.
    ///
    /// Walks the graph with an explicit worklist and a visited set, so it
    /// terminates under mutual recursion. Returns the number of rewritten edges.
    pub fn break_cycles(&mut self, root: BackendTypeId) -> usize {
        let mut worklist = vec![root];
        let mut visited = rustc_hash::FxHashSet::default();
        let mut rewritten = 0;
        while let Some(id) = worklist.pop() {
            if !visited.insert(id) {
                continue;
            }
            let Some(ty) = self.get_mut(id) else {
                continue;
            };
            if let Some(indirect) = ty.indirect_mut() {
                if indirect.target == root {
                    if !indirect.weak {
                        indirect.weak = true;
                        rewritten += 1;
                    }
                } else {
                    worklist.push(indirect.target);
                }
                continue;
            }
            match ty {
                BackendType::Aggregate { children, .. } => worklist.extend(children.iter().copied()),
                BackendType::Array { element, .. } => worklist.push(*element),
                BackendType::FunctionPointer { arguments, return_type } => {
                    worklist.extend(arguments.iter().copied());
                    worklist.push(*return_type);
                }
                _ => {}
            }
        }
        rewritten
    }

    /// Readable form of a descriptor; weak edges print as `weak(...)` with
    /// the target's name only.
    pub fn render(&self, id: BackendTypeId) -> String {
        let mut out = String::new();
        self.render_into(id, &mut out, &mut Vec::new());
        out
    }

    fn render_into(&self, id: BackendTypeId, out: &mut String, stack: &mut Vec<BackendTypeId>) {
        let Some(ty) = self.get(id) else {
            out.push('?');
            return;
        };
        if stack.contains(&id) {
            out.push_str(&self.short_name(id));
            return;
        }
        stack.push(id);
        let constness = |constant: bool| if constant { "~" } else { "" };
        match ty {
            BackendType::Opaque => out.push_str("opaque"),
            BackendType::Void => out.push_str("void"),
            BackendType::NoReturn => out.push_str("noreturn"),
            BackendType::SignedInteger(bits) => {
                let _ = write!(out, "i{bits}");
            }
            BackendType::UnsignedInteger(bits) => {
                let _ = write!(out, "u{bits}");
            }
            BackendType::Float64 => out.push_str("f64"),
            BackendType::Complex64 => out.push_str("c64"),
            BackendType::Array {
                element,
                dimensions,
                constant,
            } => {
                let dimensions: Vec<String> = dimensions.iter().map(usize::to_string).collect();
                let _ = write!(out, "[{}]{}", dimensions.join(","), constness(*constant));
                self.render_into(*element, out, stack);
            }
            BackendType::Reference(indirect) | BackendType::Pointer(indirect) | BackendType::Slice(indirect) => {
                let prefix = match ty {
                    BackendType::Reference(_) => "*",
                    BackendType::Pointer(_) => "[?]",
                    _ => "<>",
                };
                out.push_str(prefix);
                out.push_str(constness(indirect.constant));
                if indirect.weak {
                    let _ = write!(out, "weak({})", self.short_name(indirect.target));
                } else {
                    self.render_into(indirect.target, out, stack);
                }
            }
            BackendType::Aggregate { name, children } => {
                if let Some(name) = name {
                    out.push_str(name);
                }
                out.push('{');
                for (index, child) in children.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    self.render_into(*child, out, stack);
                }
                out.push('}');
            }
            BackendType::FunctionPointer { arguments, return_type } => {
                out.push_str("fn(");
                for (index, argument) in arguments.iter().enumerate() {
                    if index > 0 {
                        out.push(',');
                    }
                    self.render_into(*argument, out, stack);
                }
                out.push_str(")=>");
                self.render_into(*return_type, out, stack);
            }
        }
        stack.pop();
    }

    fn short_name(&self, id: BackendTypeId) -> String {
        match self.get(id) {
            Some(BackendType::Aggregate { name: Some(name), .. }) => name.clone(),
            _ => format!("#{}", id.0),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn indirect(target: BackendTypeId) -> Indirect {
        Indirect {
            target,
            constant: false,
            weak: false,
        }
    }

    #[test]
    fn self_edge_becomes_weak() {
        let mut program = BackendProgram::new();
        let node = program.push(BackendType::Aggregate {
            name: Some("Node".into()),
            children: vec![],
        });
        let next = program.push(BackendType::Pointer(indirect(node)));
        let value = program.push(BackendType::SignedInteger(32));
        if let Some(BackendType::Aggregate { children, .. }) = program.get_mut(node) {
            *children = vec![value, next];
        }
        assert_eq!(program.break_cycles(node), 1);
        assert!(program.get(next).and_then(BackendType::indirect).is_some_and(|i| i.weak));
        assert_eq!(program.render(node), "Node{i32,[?]weak(Node)}");
        assert_eq!(program.break_cycles(node), 0);
    }

    #[test]
    fn mutual_recursion_terminates() {
        let mut program = BackendProgram::new();
        let a = program.push(BackendType::Aggregate {
            name: Some("A".into()),
            children: vec![],
        });
        let b = program.push(BackendType::Aggregate {
            name: Some("B".into()),
            children: vec![],
        });
        let to_a = program.push(BackendType::Reference(indirect(a)));
        let to_b = program.push(BackendType::Reference(indirect(b)));
        if let Some(BackendType::Aggregate { children, .. }) = program.get_mut(a) {
            children.push(to_b);
        }
        if let Some(BackendType::Aggregate { children, .. }) = program.get_mut(b) {
            children.push(to_a);
        }
        assert_eq!(program.break_cycles(a), 1);
        assert!(program.get(to_a).and_then(BackendType::indirect).is_some_and(|i| i.weak));
        assert!(!program.get(to_b).and_then(BackendType::indirect).is_some_and(|i| i.weak));
    }

    #[test]
    fn render_primitives() {
        let mut program = BackendProgram::new();
        let flag = program.push(BackendType::UnsignedInteger(1));
        let array = program.push(BackendType::Array {
            element: flag,
            dimensions: vec![2, 3],
            constant: true,
        });
        let function = program.push(BackendType::FunctionPointer {
            arguments: vec![array],
            return_type: flag,
        });
        assert_eq!(program.render(function), "fn([2,3]~u1)=>u1");
        assert_eq!(program.type_count(), 3);
    }
}
