//! Declaration AST nodes.
//!
//! A source file is a [`StructureDecl`]: its top-level declarations are the
//! members of an implicit structure. Nested `struct { ... }` expressions use
//! the same node.

use bitflags::bitflags;

use crate::expr::{Expr, Ident};
use crate::stmt::Block;
use cheese_core::Span;

bitflags! {
    /// Declaration modifiers.
    #[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
    pub struct DeclFlags: u8 {
        const PUBLIC   = 1 << 0;
        const COMPTIME = 1 << 1;
        const MUTABLE  = 1 << 2;
        /// Program entry point
        const ENTRY    = 1 << 3;
        /// Symbol defined outside the program, never mangled
        const EXTERN   = 1 << 4;
        const EXPORT   = 1 << 5;
        const INLINE   = 1 << 6;
    }
}

/// A structure body.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StructureDecl<'ast> {
    /// Tuple structures have unnamed positional fields.
    pub is_tuple: bool,
    pub members: &'ast [Member<'ast>],
    pub span: Span,
}

/// A member of a structure.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Member<'ast> {
    Field(FieldDecl<'ast>),
    Variable(VariableDecl<'ast>),
    Import(ImportDecl<'ast>),
    Function(&'ast FunctionDecl<'ast>),
    ExternFunction(&'ast ExternFunctionDecl<'ast>),
}

impl<'ast> Member<'ast> {
    pub fn span(&self) -> Span {
        match self {
            Self::Field(d) => d.span,
            Self::Variable(d) => d.span,
            Self::Import(d) => d.span,
            Self::Function(d) => d.span,
            Self::ExternFunction(d) => d.span,
        }
    }

    /// Name the member introduces into the structure's namespace.
    pub fn name(&self) -> Option<&'ast str> {
        match self {
            Self::Field(d) => d.name.map(|n| n.name),
            Self::Variable(d) => Some(d.name.name),
            Self::Import(d) => Some(d.name.name),
            Self::Function(d) => Some(d.name.name),
            Self::ExternFunction(d) => Some(d.name.name),
        }
    }
}

/// A data field (`x: i32`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FieldDecl<'ast> {
    /// `None` for positional tuple fields.
    pub name: Option<Ident<'ast>>,
    pub ty: Expr<'ast>,
    pub flags: DeclFlags,
    pub span: Span,
}

/// A named value (`let x: T = value`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableDecl<'ast> {
    pub name: Ident<'ast>,
    pub ty: Option<Expr<'ast>>,
    pub value: Expr<'ast>,
    pub flags: DeclFlags,
    pub span: Span,
}

/// An import (`import std/io as io`).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ImportDecl<'ast> {
    /// `/`-separated module path.
    pub path: &'ast str,
    /// Binding name.
    pub name: Ident<'ast>,
    pub span: Span,
}

/// A function declaration.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionDecl<'ast> {
    pub name: Ident<'ast>,
    pub params: &'ast [Param<'ast>],
    pub return_type: Expr<'ast>,
    pub body: FunctionBody<'ast>,
    pub flags: DeclFlags,
    pub span: Span,
}

/// A function parameter.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Param<'ast> {
    pub kind: ParamKind<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub enum ParamKind<'ast> {
    /// `self` or `const self`
    SelfRef { constant: bool },
    /// `[comptime] name: T`
    Named {
        name: Option<Ident<'ast>>,
        ty: Expr<'ast>,
        comptime: bool,
    },
}

/// The body of a function.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum FunctionBody<'ast> {
    /// `=> expr`
    Expr(Expr<'ast>),
    Block(Block<'ast>),
}

/// A function implemented outside the program.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ExternFunctionDecl<'ast> {
    pub name: Ident<'ast>,
    pub arguments: &'ast [Expr<'ast>],
    pub return_type: Expr<'ast>,
    pub flags: DeclFlags,
    pub span: Span,
}
