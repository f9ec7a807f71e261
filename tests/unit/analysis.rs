//! Whole-program analysis: lazy members, entry discovery and error recovery.

use bumpalo::Bump;
use cheese::ast::{AstBuilder, DeclFlags, FunctionBody, Member};
use cheese::compiler::Lookup;
use cheese::{CompilationContext, CompilerConfig, ErrorCode};

use crate::{analyze, arena, root_member};

fn entry<'ast>(b: &AstBuilder<'ast>) -> Member<'ast> {
    b.function("main", &[], b.void_type(), FunctionBody::Block(b.block(&[])), DeclFlags::ENTRY)
}

// ========================================================================
// Lazy members
// ========================================================================

#[test]
fn test_lazy_member_resolved_once() {
    let arena = arena();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.variable("counter", Some(b.i32_type()), b.int(0), DeclFlags::empty()),
        b.variable("limit", None, b.int(10), DeclFlags::empty()),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    assert_eq!(ctx.program().globals.len(), 1);

    let Some(st) = ctx.root() else {
        panic!("no root structure");
    };
    let first = ctx.structure_member(st, "counter");
    let second = ctx.structure_member(st, "counter");
    assert!(matches!(first, Ok(Some(Lookup::Runtime { .. }))));
    assert!(matches!(second, Ok(Some(Lookup::Runtime { .. }))));
    assert_eq!(ctx.program().globals.len(), 1);
    assert_eq!(root_member(&mut ctx, "limit").as_deref(), Some("10"));
}

#[test]
fn test_members_see_each_other_in_any_order() {
    let arena = arena();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.variable("total", None, b.binary(cheese::ast::BinaryOp::Add, b.name("base"), b.int(1)), DeclFlags::empty()),
        b.variable("base", None, b.int(41), DeclFlags::empty()),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());
    assert_eq!(root_member(&mut ctx, "total").as_deref(), Some("42"));
}

#[test]
fn test_circular_members_are_reported() {
    let arena = arena();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.variable("a", None, b.name("b"), DeclFlags::COMPTIME),
        b.variable("b", None, b.name("a"), DeclFlags::COMPTIME),
        entry(&b),
    ]);
    let ctx = analyze(root);
    assert!(ctx.errored());
    assert!(
        ctx.diagnostics()
            .iter()
            .any(|e| e.message.contains("circular definition"))
    );
}

// ========================================================================
// Nested structures
// ========================================================================

#[test]
fn test_self_referential_structure_flattens() {
    let arena = arena();
    let b = AstBuilder::new(&arena);
    let node = b.structure(&[
        b.field("value", b.i32_type()),
        b.field("next", b.pointer(b.name("Node"), false)),
    ]);
    let root = b.structure(&[
        b.variable("Node", None, b.structure_expr(node), DeclFlags::empty()),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());

    let Some(st) = ctx.root() else {
        panic!("no root structure");
    };
    let node_type = match ctx.structure_member(st, "Node") {
        Ok(Some(Lookup::Comptime(value))) => ctx.as_type(value.get()),
        _ => None,
    };
    let Some(node_type) = node_type else {
        panic!("Node should be a compile-time type");
    };
    let Ok(id) = ctx.backend_type(node_type) else {
        panic!("Node should flatten");
    };
    assert!(ctx.program().render(id).contains("weak("));
}

// ========================================================================
// Errors
// ========================================================================

#[test]
fn test_errors_do_not_stop_analysis() {
    let arena = arena();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.variable("broken", Some(b.i32_type()), b.string("no"), DeclFlags::COMPTIME),
        b.variable("unknown", None, b.name("nowhere"), DeclFlags::empty()),
        b.variable("fine", Some(b.i32_type()), b.int(3), DeclFlags::empty()),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    let output = ctx.finish();
    assert!(output.errored);
    assert_eq!(output.diagnostics.len(), 2);
    assert!(output.diagnostics.iter().all(|e| e.span.is_some()));
    assert_eq!(output.globals().len(), 1);
    assert_eq!(output.functions().len(), 1);
}

#[test]
fn test_declared_types_convert_implicitly_only() {
    let arena = arena();
    let b = AstBuilder::new(&arena);
    let comptime_int = b.primitive(cheese::ast::PrimitiveType::ComptimeInt);
    let narrowing = b.block(&[
        b.let_stmt("y", Some(b.i32_type()), b.float(1.5)),
        b.return_stmt(Some(b.name("n"))),
    ]);
    let root = b.structure(&[
        b.variable("x", Some(b.i32_type()), b.float(2.5), DeclFlags::COMPTIME),
        b.variable("flag", Some(b.primitive(cheese::ast::PrimitiveType::Bool)), b.int(5), DeclFlags::COMPTIME),
        b.function("half", &[], b.i32_type(), FunctionBody::Expr(b.float(2.9)), DeclFlags::COMPTIME),
        b.variable("h", None, b.call(b.name("half"), &[]), DeclFlags::COMPTIME),
        b.function(
            "narrow",
            &[b.comptime_param("n", comptime_int)],
            comptime_int,
            FunctionBody::Block(narrowing),
            DeclFlags::empty(),
        ),
        b.variable("m", None, b.call(b.name("narrow"), &[b.int(3)]), DeclFlags::COMPTIME),
        b.variable("ok", Some(b.i32_type()), b.int(7), DeclFlags::COMPTIME),
        b.variable("explicit", None, b.cast(b.float(2.5), b.i32_type()), DeclFlags::COMPTIME),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    let rejected = ctx
        .diagnostics()
        .iter()
        .filter(|e| e.code == ErrorCode::InvalidCast)
        .count();
    assert_eq!(rejected, 4, "{:?}", ctx.diagnostics());
    assert_eq!(root_member(&mut ctx, "x"), None);
    assert_eq!(root_member(&mut ctx, "ok").as_deref(), Some("7"));
    assert_eq!(root_member(&mut ctx, "explicit").as_deref(), Some("2"));
}

#[test]
fn test_missing_entry_is_fatal() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[b.variable("x", None, b.int(1), DeclFlags::empty())]);
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let err = ctx.analyze(root, None).err();
    assert_eq!(err.map(|e| e.code), Some(ErrorCode::MissingEntry));
}

#[test]
fn test_custom_entry_name() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[b.function(
        "start",
        &[],
        b.i32_type(),
        FunctionBody::Expr(b.int(0)),
        DeclFlags::empty(),
    )]);
    let config = CompilerConfig::default().with_entry_name("start");
    let mut ctx = CompilationContext::new(config);
    assert!(ctx.analyze(root, None).is_ok());
    assert_eq!(ctx.program().functions.len(), 1);
}

#[test]
fn test_entry_with_parameters_is_rejected() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[b.function(
        "main",
        &[b.param("argc", b.i32_type())],
        b.void_type(),
        FunctionBody::Block(b.block(&[])),
        DeclFlags::ENTRY,
    )]);
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    assert!(ctx.analyze(root, None).is_ok());
    assert_eq!(
        ctx.diagnostics().first().map(|e| e.code),
        Some(ErrorCode::MismatchedFunctionCall)
    );
}
