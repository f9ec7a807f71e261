//! Arena-backed construction helpers for AST nodes.
//!
//! Every node created by an [`AstBuilder`] receives the builder's current
//! span, which callers move with [`AstBuilder::at`] as they walk the source.

use std::cell::Cell;

use bumpalo::Bump;
use num_bigint::BigInt;

use crate::decl::*;
use crate::expr::*;
use crate::ops::{BinaryOp, UnaryOp};
use crate::stmt::*;
use cheese_core::{FileId, Span};

pub struct AstBuilder<'ast> {
    arena: &'ast Bump,
    span: Cell<Span>,
}

impl<'ast> AstBuilder<'ast> {
    pub fn new(arena: &'ast Bump) -> Self {
        Self {
            arena,
            span: Cell::new(Span::new(1, 1, 0)),
        }
    }

    /// Builder whose spans point into `file`.
    pub fn for_file(arena: &'ast Bump, file: FileId) -> Self {
        Self {
            arena,
            span: Cell::new(Span::new(1, 1, 0).in_file(file)),
        }
    }

    pub fn arena(&self) -> &'ast Bump {
        self.arena
    }

    /// Move the current position; subsequent nodes are located there.
    pub fn at(&self, line: u32, col: u32) -> &Self {
        let file = self.span.get().file;
        self.span.set(Span::point(line, col).in_file(file));
        self
    }

    pub fn span(&self) -> Span {
        self.span.get()
    }

    pub fn ident(&self, name: &str) -> Ident<'ast> {
        Ident::new(self.arena.alloc_str(name), self.span())
    }

    fn exprs(&self, items: &[Expr<'ast>]) -> &'ast [Expr<'ast>] {
        self.arena.alloc_slice_copy(items)
    }

    fn object_fields(&self, fields: &[(&str, Expr<'ast>)]) -> &'ast [ObjectField<'ast>] {
        let fields: Vec<ObjectField<'ast>> = fields
            .iter()
            .map(|(name, value)| ObjectField {
                name: self.ident(name),
                value: *value,
            })
            .collect();
        self.arena.alloc_slice_copy(&fields)
    }

    fn literal(&self, kind: LiteralKind) -> Expr<'ast> {
        Expr::Literal(self.arena.alloc(Literal {
            kind,
            span: self.span(),
        }))
    }

    // Literals

    pub fn int(&self, value: i64) -> Expr<'ast> {
        self.literal(LiteralKind::Integer(BigInt::from(value)))
    }

    pub fn big_int(&self, value: BigInt) -> Expr<'ast> {
        self.literal(LiteralKind::Integer(value))
    }

    pub fn float(&self, value: f64) -> Expr<'ast> {
        self.literal(LiteralKind::Float(value))
    }

    pub fn imaginary(&self, value: f64) -> Expr<'ast> {
        self.literal(LiteralKind::Imaginary(value))
    }

    pub fn boolean(&self, value: bool) -> Expr<'ast> {
        self.literal(LiteralKind::Bool(value))
    }

    pub fn string(&self, value: &str) -> Expr<'ast> {
        self.literal(LiteralKind::String(value.to_string()))
    }

    pub fn none(&self) -> Expr<'ast> {
        self.literal(LiteralKind::Void)
    }

    // Value expressions

    pub fn name(&self, name: &str) -> Expr<'ast> {
        Expr::Name(self.ident(name))
    }

    pub fn member(&self, object: Expr<'ast>, member: &str) -> Expr<'ast> {
        Expr::Member(self.arena.alloc(MemberExpr {
            object,
            member: self.ident(member),
            span: self.span(),
        }))
    }

    pub fn subscript(&self, object: Expr<'ast>, index: Expr<'ast>) -> Expr<'ast> {
        Expr::Subscript(self.arena.alloc(SubscriptExpr {
            object,
            index,
            span: self.span(),
        }))
    }

    pub fn call(&self, callee: Expr<'ast>, args: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::Call(self.arena.alloc(CallExpr {
            callee,
            args: self.exprs(args),
            span: self.span(),
        }))
    }

    pub fn unary(&self, op: UnaryOp, operand: Expr<'ast>) -> Expr<'ast> {
        Expr::Unary(self.arena.alloc(UnaryExpr {
            op,
            operand,
            span: self.span(),
        }))
    }

    pub fn binary(&self, op: BinaryOp, left: Expr<'ast>, right: Expr<'ast>) -> Expr<'ast> {
        Expr::Binary(self.arena.alloc(BinaryExpr {
            op,
            left,
            right,
            span: self.span(),
        }))
    }

    pub fn cast(&self, value: Expr<'ast>, target: Expr<'ast>) -> Expr<'ast> {
        Expr::Cast(self.arena.alloc(CastExpr {
            value,
            target,
            span: self.span(),
        }))
    }

    pub fn tuple(&self, elements: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::Tuple(self.arena.alloc(AggregateExpr {
            elements: self.exprs(elements),
            span: self.span(),
        }))
    }

    pub fn array(&self, elements: &[Expr<'ast>]) -> Expr<'ast> {
        Expr::Array(self.arena.alloc(AggregateExpr {
            elements: self.exprs(elements),
            span: self.span(),
        }))
    }

    pub fn object(&self, fields: &[(&str, Expr<'ast>)]) -> Expr<'ast> {
        Expr::Object(self.arena.alloc(ObjectExpr {
            fields: self.object_fields(fields),
            span: self.span(),
        }))
    }

    pub fn enum_tag(&self, tag: &str) -> Expr<'ast> {
        self.enum_literal(tag, EnumPayload::None)
    }

    pub fn enum_tuple(&self, tag: &str, values: &[Expr<'ast>]) -> Expr<'ast> {
        let payload = EnumPayload::Tuple(self.exprs(values));
        self.enum_literal(tag, payload)
    }

    pub fn enum_object(&self, tag: &str, fields: &[(&str, Expr<'ast>)]) -> Expr<'ast> {
        let payload = EnumPayload::Object(self.object_fields(fields));
        self.enum_literal(tag, payload)
    }

    fn enum_literal(&self, tag: &str, payload: EnumPayload<'ast>) -> Expr<'ast> {
        Expr::EnumLiteral(self.arena.alloc(EnumLiteralExpr {
            tag: self.ident(tag),
            payload,
            span: self.span(),
        }))
    }

    pub fn if_expr(
        &self,
        condition: Expr<'ast>,
        then_branch: Expr<'ast>,
        else_branch: Expr<'ast>,
    ) -> Expr<'ast> {
        Expr::If(self.arena.alloc(IfExpr {
            condition,
            then_branch,
            else_branch,
            span: self.span(),
        }))
    }

    pub fn builtin(&self, name: &str) -> Expr<'ast> {
        Expr::Builtin(self.ident(name))
    }

    pub fn structure_expr(&self, decl: &'ast StructureDecl<'ast>) -> Expr<'ast> {
        Expr::Structure(decl)
    }

    // Type expressions

    pub fn primitive(&self, kind: PrimitiveType) -> Expr<'ast> {
        Expr::Primitive(PrimitiveTypeExpr {
            kind,
            span: self.span(),
        })
    }

    pub fn int_type(&self, signed: bool, bits: u16) -> Expr<'ast> {
        self.primitive(PrimitiveType::Integer { signed, bits })
    }

    pub fn i32_type(&self) -> Expr<'ast> {
        self.int_type(true, 32)
    }

    pub fn f64_type(&self) -> Expr<'ast> {
        self.primitive(PrimitiveType::Float64)
    }

    pub fn void_type(&self) -> Expr<'ast> {
        self.primitive(PrimitiveType::Void)
    }

    fn indirect(&self, child: Expr<'ast>, constant: bool) -> &'ast IndirectTypeExpr<'ast> {
        self.arena.alloc(IndirectTypeExpr {
            child,
            constant,
            span: self.span(),
        })
    }

    pub fn reference(&self, child: Expr<'ast>, constant: bool) -> Expr<'ast> {
        Expr::Reference(self.indirect(child, constant))
    }

    pub fn pointer(&self, child: Expr<'ast>, constant: bool) -> Expr<'ast> {
        Expr::Pointer(self.indirect(child, constant))
    }

    pub fn slice(&self, child: Expr<'ast>, constant: bool) -> Expr<'ast> {
        Expr::Slice(self.indirect(child, constant))
    }

    pub fn array_type(&self, dimensions: &[Expr<'ast>], child: Expr<'ast>, constant: bool) -> Expr<'ast> {
        Expr::ArrayType(self.arena.alloc(ArrayTypeExpr {
            dimensions: self.exprs(dimensions),
            child,
            constant,
            span: self.span(),
        }))
    }

    pub fn function_type(&self, arguments: &[Expr<'ast>], return_type: Expr<'ast>) -> Expr<'ast> {
        Expr::FunctionType(self.arena.alloc(FunctionTypeExpr {
            arguments: self.exprs(arguments),
            return_type,
            span: self.span(),
        }))
    }

    // Statements

    pub fn let_stmt(&self, name: &str, ty: Option<Expr<'ast>>, value: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Let(LetStmt {
            name: self.ident(name),
            ty,
            value,
            flags: DeclFlags::empty(),
            span: self.span(),
        })
    }

    pub fn return_stmt(&self, value: Option<Expr<'ast>>) -> Stmt<'ast> {
        Stmt::Return(ReturnStmt {
            value,
            span: self.span(),
        })
    }

    pub fn expr_stmt(&self, expr: Expr<'ast>) -> Stmt<'ast> {
        Stmt::Expr(ExprStmt {
            expr,
            span: self.span(),
        })
    }

    pub fn block(&self, stmts: &[Stmt<'ast>]) -> Block<'ast> {
        Block {
            stmts: self.arena.alloc_slice_copy(stmts),
            span: self.span(),
        }
    }

    // Declarations

    pub fn field(&self, name: &str, ty: Expr<'ast>) -> Member<'ast> {
        Member::Field(FieldDecl {
            name: Some(self.ident(name)),
            ty,
            flags: DeclFlags::empty(),
            span: self.span(),
        })
    }

    pub fn positional_field(&self, ty: Expr<'ast>) -> Member<'ast> {
        Member::Field(FieldDecl {
            name: None,
            ty,
            flags: DeclFlags::empty(),
            span: self.span(),
        })
    }

    pub fn variable(
        &self,
        name: &str,
        ty: Option<Expr<'ast>>,
        value: Expr<'ast>,
        flags: DeclFlags,
    ) -> Member<'ast> {
        Member::Variable(VariableDecl {
            name: self.ident(name),
            ty,
            value,
            flags,
            span: self.span(),
        })
    }

    /// Import binding the last path component (`std/io` binds `io`).
    pub fn import(&self, path: &str) -> Member<'ast> {
        let name = path.rsplit('/').next().unwrap_or(path);
        self.import_as(path, name)
    }

    pub fn import_as(&self, path: &str, name: &str) -> Member<'ast> {
        Member::Import(ImportDecl {
            path: self.arena.alloc_str(path),
            name: self.ident(name),
            span: self.span(),
        })
    }

    pub fn self_param(&self, constant: bool) -> Param<'ast> {
        Param {
            kind: ParamKind::SelfRef { constant },
            span: self.span(),
        }
    }

    pub fn param(&self, name: &str, ty: Expr<'ast>) -> Param<'ast> {
        Param {
            kind: ParamKind::Named {
                name: Some(self.ident(name)),
                ty,
                comptime: false,
            },
            span: self.span(),
        }
    }

    pub fn comptime_param(&self, name: &str, ty: Expr<'ast>) -> Param<'ast> {
        Param {
            kind: ParamKind::Named {
                name: Some(self.ident(name)),
                ty,
                comptime: true,
            },
            span: self.span(),
        }
    }

    pub fn unnamed_param(&self, ty: Expr<'ast>) -> Param<'ast> {
        Param {
            kind: ParamKind::Named {
                name: None,
                ty,
                comptime: false,
            },
            span: self.span(),
        }
    }

    pub fn function(
        &self,
        name: &str,
        params: &[Param<'ast>],
        return_type: Expr<'ast>,
        body: FunctionBody<'ast>,
        flags: DeclFlags,
    ) -> Member<'ast> {
        Member::Function(self.arena.alloc(FunctionDecl {
            name: self.ident(name),
            params: self.arena.alloc_slice_copy(params),
            return_type,
            body,
            flags,
            span: self.span(),
        }))
    }

    pub fn extern_function(&self, name: &str, arguments: &[Expr<'ast>], return_type: Expr<'ast>) -> Member<'ast> {
        Member::ExternFunction(self.arena.alloc(ExternFunctionDecl {
            name: self.ident(name),
            arguments: self.exprs(arguments),
            return_type,
            flags: DeclFlags::EXTERN,
            span: self.span(),
        }))
    }

    pub fn structure(&self, members: &[Member<'ast>]) -> &'ast StructureDecl<'ast> {
        self.arena.alloc(StructureDecl {
            is_tuple: false,
            members: self.arena.alloc_slice_copy(members),
            span: self.span(),
        })
    }

    pub fn tuple_structure(&self, members: &[Member<'ast>]) -> &'ast StructureDecl<'ast> {
        self.arena.alloc(StructureDecl {
            is_tuple: true,
            members: self.arena.alloc_slice_copy(members),
            span: self.span(),
        })
    }
}
