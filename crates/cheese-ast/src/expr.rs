//! Expression AST nodes.
//!
//! Types are ordinary expressions in this language (`i32`, `*Node`,
//! `[4]u8`), so type syntax lives here alongside value syntax.

use num_bigint::BigInt;

use crate::decl::StructureDecl;
use crate::ops::{BinaryOp, UnaryOp};
use cheese_core::Span;

/// An identifier with its location.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Ident<'ast> {
    pub name: &'ast str,
    pub span: Span,
}

impl<'ast> Ident<'ast> {
    pub fn new(name: &'ast str, span: Span) -> Self {
        Self { name, span }
    }
}

/// An expression.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Expr<'ast> {
    /// Literal value
    Literal(&'ast Literal),
    /// Name lookup (`x`, `Self`)
    Name(Ident<'ast>),
    /// Member access (`a.b`)
    Member(&'ast MemberExpr<'ast>),
    /// Subscript (`a[i]`)
    Subscript(&'ast SubscriptExpr<'ast>),
    /// Call (`f(a, b)`)
    Call(&'ast CallExpr<'ast>),
    /// Prefix operation
    Unary(&'ast UnaryExpr<'ast>),
    /// Infix operation
    Binary(&'ast BinaryExpr<'ast>),
    /// Explicit conversion (`x as T`)
    Cast(&'ast CastExpr<'ast>),
    /// Tuple literal (`.(a, b)`)
    Tuple(&'ast AggregateExpr<'ast>),
    /// Object literal (`.{x = a}`)
    Object(&'ast ObjectExpr<'ast>),
    /// Array literal (`.[a, b]`)
    Array(&'ast AggregateExpr<'ast>),
    /// Enum literal (`.tag`, `.tag(a)`, `.tag{x = a}`)
    EnumLiteral(&'ast EnumLiteralExpr<'ast>),
    /// Conditional expression
    If(&'ast IfExpr<'ast>),
    /// Inline structure declaration (`struct { ... }`)
    Structure(&'ast StructureDecl<'ast>),
    /// Builtin reference (`$Type`)
    Builtin(Ident<'ast>),
    /// Keyword type (`i32`, `f64`, `type`, ...)
    Primitive(PrimitiveTypeExpr),
    /// Reference type (`*T`, `*~T`)
    Reference(&'ast IndirectTypeExpr<'ast>),
    /// Pointer type (`[?]T`)
    Pointer(&'ast IndirectTypeExpr<'ast>),
    /// Slice type (`<>T`)
    Slice(&'ast IndirectTypeExpr<'ast>),
    /// Array type (`[2, 3]T`)
    ArrayType(&'ast ArrayTypeExpr<'ast>),
    /// Function pointer type (`*fn(i32)=>void`)
    FunctionType(&'ast FunctionTypeExpr<'ast>),
}

impl<'ast> Expr<'ast> {
    /// Get the span of this expression.
    pub fn span(&self) -> Span {
        match self {
            Self::Literal(e) => e.span,
            Self::Name(e) => e.span,
            Self::Member(e) => e.span,
            Self::Subscript(e) => e.span,
            Self::Call(e) => e.span,
            Self::Unary(e) => e.span,
            Self::Binary(e) => e.span,
            Self::Cast(e) => e.span,
            Self::Tuple(e) => e.span,
            Self::Object(e) => e.span,
            Self::Array(e) => e.span,
            Self::EnumLiteral(e) => e.span,
            Self::If(e) => e.span,
            Self::Structure(e) => e.span,
            Self::Builtin(e) => e.span,
            Self::Primitive(e) => e.span,
            Self::Reference(e) => e.span,
            Self::Pointer(e) => e.span,
            Self::Slice(e) => e.span,
            Self::ArrayType(e) => e.span,
            Self::FunctionType(e) => e.span,
        }
    }
}

/// A literal expression.
#[derive(Debug, Clone, PartialEq)]
pub struct Literal {
    pub kind: LiteralKind,
    pub span: Span,
}

/// The kind of literal.
#[derive(Debug, Clone, PartialEq)]
pub enum LiteralKind {
    /// Integer literal of any magnitude
    Integer(BigInt),
    Float(f64),
    /// Imaginary literal (`2.5i`)
    Imaginary(f64),
    Bool(bool),
    String(String),
    /// `none`
    Void,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct MemberExpr<'ast> {
    pub object: Expr<'ast>,
    pub member: Ident<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SubscriptExpr<'ast> {
    pub object: Expr<'ast>,
    pub index: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CallExpr<'ast> {
    pub callee: Expr<'ast>,
    pub args: &'ast [Expr<'ast>],
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct UnaryExpr<'ast> {
    pub op: UnaryOp,
    pub operand: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BinaryExpr<'ast> {
    pub op: BinaryOp,
    pub left: Expr<'ast>,
    pub right: Expr<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct CastExpr<'ast> {
    pub value: Expr<'ast>,
    pub target: Expr<'ast>,
    pub span: Span,
}

/// Positional aggregate (tuple or array literal).
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct AggregateExpr<'ast> {
    pub elements: &'ast [Expr<'ast>],
    pub span: Span,
}

/// A `name = value` pair inside an object literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectField<'ast> {
    pub name: Ident<'ast>,
    pub value: Expr<'ast>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ObjectExpr<'ast> {
    pub fields: &'ast [ObjectField<'ast>],
    pub span: Span,
}

/// Payload attached to an enum literal.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum EnumPayload<'ast> {
    None,
    Tuple(&'ast [Expr<'ast>]),
    Object(&'ast [ObjectField<'ast>]),
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EnumLiteralExpr<'ast> {
    pub tag: Ident<'ast>,
    pub payload: EnumPayload<'ast>,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IfExpr<'ast> {
    pub condition: Expr<'ast>,
    pub then_branch: Expr<'ast>,
    pub else_branch: Expr<'ast>,
    pub span: Span,
}

/// Keyword types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveType {
    Integer { signed: bool, bits: u16 },
    Float64,
    Complex64,
    Bool,
    Void,
    NoReturn,
    Any,
    Type,
    ComptimeInt,
    ComptimeFloat,
    ComptimeComplex,
    ComptimeString,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PrimitiveTypeExpr {
    pub kind: PrimitiveType,
    pub span: Span,
}

/// Reference, pointer or slice type syntax.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct IndirectTypeExpr<'ast> {
    pub child: Expr<'ast>,
    pub constant: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ArrayTypeExpr<'ast> {
    /// Dimension expressions, evaluated at compile time
    pub dimensions: &'ast [Expr<'ast>],
    pub child: Expr<'ast>,
    pub constant: bool,
    pub span: Span,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct FunctionTypeExpr<'ast> {
    pub arguments: &'ast [Expr<'ast>],
    pub return_type: Expr<'ast>,
    pub span: Span,
}
