//! Overload selection, instantiation and compile-time calls.

use bumpalo::Bump;
use cheese::ast::{AstBuilder, BinaryOp, DeclFlags, FunctionBody, Member, PrimitiveType};
use cheese::compiler::mangle_function;
use cheese::{CompilationContext, ErrorCode};

use crate::{analyze, root_member};

fn entry<'ast>(b: &AstBuilder<'ast>) -> Member<'ast> {
    b.function("main", &[], b.void_type(), FunctionBody::Block(b.block(&[])), DeclFlags::ENTRY)
}

fn instance_count(ctx: &CompilationContext<'_>, set_name: &str) -> usize {
    let Some(root) = ctx.root() else {
        return 0;
    };
    let Some(set) = ctx.structure(root).and_then(|s| s.function_sets.get(set_name).copied()) else {
        return 0;
    };
    ctx.function_set(set)
        .templates
        .iter()
        .map(|template| ctx.template(*template).instances.len())
        .sum()
}

#[test]
fn test_overload_prefers_exact_match() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.function("f", &[b.param("x", b.i32_type())], b.i32_type(), FunctionBody::Expr(b.name("x")), DeclFlags::empty()),
        b.function("f", &[b.param("x", b.f64_type())], b.i32_type(), FunctionBody::Expr(b.int(0)), DeclFlags::empty()),
        b.variable("typed", None, b.call(b.name("f"), &[b.cast(b.int(5), b.i32_type())]), DeclFlags::empty()),
        entry(&b),
    ]);
    let ctx = analyze(root);
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());
    assert!(ctx.find_concrete(&mangle_function("main.f", &["i32"], "i32")).is_some());
    assert!(ctx.find_concrete(&mangle_function("main.f", &["f64"], "i32")).is_none());
}

#[test]
fn test_untyped_literal_picks_cheapest_materialization() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.function("f", &[b.param("x", b.i32_type())], b.i32_type(), FunctionBody::Expr(b.name("x")), DeclFlags::empty()),
        b.function("f", &[b.param("x", b.f64_type())], b.i32_type(), FunctionBody::Expr(b.int(0)), DeclFlags::empty()),
        b.function("g", &[b.param("x", b.f64_type())], b.f64_type(), FunctionBody::Expr(b.name("x")), DeclFlags::empty()),
        b.variable("from_int", None, b.call(b.name("f"), &[b.int(5)]), DeclFlags::empty()),
        b.variable("from_float", None, b.call(b.name("f"), &[b.float(2.5)]), DeclFlags::empty()),
        b.variable("widened", None, b.call(b.name("g"), &[b.int(1)]), DeclFlags::empty()),
        entry(&b),
    ]);
    let ctx = analyze(root);
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());
    assert!(ctx.find_concrete(&mangle_function("main.f", &["i32"], "i32")).is_some());
    assert!(ctx.find_concrete(&mangle_function("main.f", &["f64"], "i32")).is_some());
    assert!(ctx.find_concrete(&mangle_function("main.g", &["f64"], "f64")).is_some());
}

#[test]
fn test_identical_calls_share_an_instance() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let comptime_int = b.primitive(PrimitiveType::ComptimeInt);
    let twice = b.binary(BinaryOp::Mul, b.name("x"), b.int(2));
    let root = b.structure(&[
        b.function("twice", &[b.comptime_param("x", comptime_int)], comptime_int, FunctionBody::Expr(twice), DeclFlags::empty()),
        b.variable("a", None, b.call(b.name("twice"), &[b.int(4)]), DeclFlags::empty()),
        b.variable("b", None, b.call(b.name("twice"), &[b.int(4)]), DeclFlags::empty()),
        b.variable("c", None, b.call(b.name("twice"), &[b.int(5)]), DeclFlags::empty()),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());
    assert_eq!(root_member(&mut ctx, "a").as_deref(), Some("8"));
    assert_eq!(root_member(&mut ctx, "c").as_deref(), Some("10"));
    assert_eq!(instance_count(&ctx, "twice"), 2);
    // Compile-time instances never reach the backend.
    assert_eq!(ctx.program().functions.len(), 1);
}

#[test]
fn test_runtime_instances_are_emitted_once() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.function("f", &[b.param("x", b.i32_type())], b.i32_type(), FunctionBody::Expr(b.name("x")), DeclFlags::empty()),
        b.variable("one", None, b.call(b.name("f"), &[b.int(1)]), DeclFlags::empty()),
        b.variable("two", None, b.call(b.name("f"), &[b.int(2)]), DeclFlags::empty()),
        entry(&b),
    ]);
    let ctx = analyze(root);
    let name = mangle_function("main.f", &["i32"], "i32");
    let emitted = ctx.program().functions.iter().filter(|f| f.mangled_name == name).count();
    assert_eq!(emitted, 1);
    assert_eq!(instance_count(&ctx, "f"), 1);
    assert_eq!(ctx.program().globals.len(), 2);
}

#[test]
fn test_equal_candidates_are_ambiguous() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.function("f", &[b.param("a", b.i32_type())], b.i32_type(), FunctionBody::Expr(b.int(1)), DeclFlags::empty()),
        b.function("f", &[b.param("b", b.i32_type())], b.i32_type(), FunctionBody::Expr(b.int(2)), DeclFlags::empty()),
        b.variable("r", None, b.call(b.name("f"), &[b.cast(b.int(1), b.i32_type())]), DeclFlags::empty()),
        entry(&b),
    ]);
    let ctx = analyze(root);
    assert!(ctx.errored());
    assert!(
        ctx.diagnostics()
            .iter()
            .any(|e| e.code == ErrorCode::AmbiguousFunctionCall)
    );
}

#[test]
fn test_no_viable_overload() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[
        b.function("f", &[b.param("x", b.i32_type())], b.i32_type(), FunctionBody::Expr(b.name("x")), DeclFlags::empty()),
        b.variable("r", None, b.call(b.name("f"), &[b.boolean(true)]), DeclFlags::empty()),
        b.variable("s", None, b.call(b.name("f"), &[]), DeclFlags::empty()),
        entry(&b),
    ]);
    let ctx = analyze(root);
    let missing = ctx
        .diagnostics()
        .iter()
        .filter(|e| e.code == ErrorCode::NoOverloadFound)
        .count();
    assert_eq!(missing, 2);
}

#[test]
fn test_type_parameter_specializes() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let type_kind = b.primitive(PrimitiveType::Type);
    let root = b.structure(&[
        b.function(
            "id",
            &[b.comptime_param("T", type_kind), b.param("x", b.name("T"))],
            b.name("T"),
            FunctionBody::Expr(b.name("x")),
            DeclFlags::empty(),
        ),
        b.variable("small", None, b.call(b.name("id"), &[b.int_type(false, 8), b.int(7)]), DeclFlags::empty()),
        b.variable("wide", None, b.call(b.name("id"), &[b.f64_type(), b.int(7)]), DeclFlags::empty()),
        entry(&b),
    ]);
    let ctx = analyze(root);
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());
    assert!(ctx.find_concrete(&mangle_function("main.id", &["type=u8", "u8"], "u8")).is_some());
    assert!(ctx.find_concrete(&mangle_function("main.id", &["type=f64", "f64"], "f64")).is_some());
    assert_eq!(instance_count(&ctx, "id"), 2);
}

#[test]
fn test_recursive_comptime_function() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let comptime_int = b.primitive(PrimitiveType::ComptimeInt);
    let recurse = b.call(b.name("fact"), &[b.binary(BinaryOp::Sub, b.name("n"), b.int(1))]);
    let body = b.if_expr(
        b.binary(BinaryOp::Le, b.name("n"), b.int(1)),
        b.int(1),
        b.binary(BinaryOp::Mul, b.name("n"), recurse),
    );
    let root = b.structure(&[
        b.function("fact", &[b.comptime_param("n", comptime_int)], comptime_int, FunctionBody::Expr(body), DeclFlags::empty()),
        b.variable("value", None, b.call(b.name("fact"), &[b.int(10)]), DeclFlags::empty()),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    assert!(!ctx.errored(), "{:?}", ctx.diagnostics());
    assert_eq!(root_member(&mut ctx, "value").as_deref(), Some("3628800"));
}

#[test]
fn test_block_body_with_locals() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let comptime_int = b.primitive(PrimitiveType::ComptimeInt);
    let body = b.block(&[
        b.let_stmt("doubled", None, b.binary(BinaryOp::Mul, b.name("n"), b.int(2))),
        b.return_stmt(Some(b.binary(BinaryOp::Add, b.name("doubled"), b.int(1)))),
    ]);
    let root = b.structure(&[
        b.function("odd", &[b.comptime_param("n", comptime_int)], comptime_int, FunctionBody::Block(body), DeclFlags::empty()),
        b.variable("seven", None, b.call(b.name("odd"), &[b.int(3)]), DeclFlags::empty()),
        entry(&b),
    ]);
    let mut ctx = analyze(root);
    assert_eq!(root_member(&mut ctx, "seven").as_deref(), Some("7"));
}

#[test]
fn test_export_keeps_plain_name() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let root = b.structure(&[b.function(
        "main",
        &[],
        b.i32_type(),
        FunctionBody::Expr(b.int(0)),
        DeclFlags::ENTRY | DeclFlags::EXPORT,
    )]);
    let ctx = analyze(root);
    assert_eq!(ctx.program().functions[0].mangled_name, "main");
}
