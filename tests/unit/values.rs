//! Compile-time values: casts, operators and evaluation.

use bumpalo::Bump;
use cheese::ast::{AstBuilder, BinaryOp, UnaryOp};
use cheese::{CompilationContext, CompilerConfig, ErrorCode};

#[test]
fn test_cast_range_checks_integers() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let u8_ty = ctx.integer_type(false, 8);
    let too_big = ctx.comptime_int(300);
    let err = ctx.cast(too_big.get(), u8_ty).err();
    assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidCast));

    let fits = ctx.comptime_int(200);
    let value = ctx.cast(fits.get(), u8_ty).expect("200 fits in u8");
    assert_eq!(ctx.value(value.get()).ty, u8_ty);
    assert_eq!(ctx.value_to_string(value.get()), "200");
}

#[test]
fn test_comptime_addition_stays_comptime() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let five = ctx.comptime_int(5);
    let three = ctx.comptime_int(3);
    let sum = ctx.binary_op(BinaryOp::Add, five.get(), three.get()).expect("add");
    let comptime_int_ty = ctx.comptime_int_type();
    assert_eq!(ctx.value(sum.get()).ty, comptime_int_ty);
    assert_eq!(ctx.value_to_string(sum.get()), "8");
}

#[test]
fn test_literal_materializes_to_runtime_operand() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let u32_ty = ctx.integer_type(false, 32);
    let two = ctx.comptime_int(2);
    let forty = ctx.int_value(u32_ty, 40);
    let sum = ctx.binary_op(BinaryOp::Add, two.get(), forty.get()).expect("add");
    assert_eq!(ctx.value(sum.get()).ty, u32_ty);
    assert_eq!(ctx.value_to_string(sum.get()), "42");
}

#[test]
fn test_unsigned_overflow_is_reported() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let u8_ty = ctx.integer_type(false, 8);
    let high = ctx.int_value(u8_ty, 250);
    let more = ctx.int_value(u8_ty, 10);
    let err = ctx.binary_op(BinaryOp::Add, high.get(), more.get()).err();
    assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidComptimeOperation));

    let negated = ctx.unary_op(UnaryOp::Minus, high.get()).err();
    assert!(negated.is_some());
}

#[test]
fn test_division_by_zero() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let one = ctx.comptime_int(1);
    let zero = ctx.comptime_int(0);
    let err = ctx.binary_op(BinaryOp::Div, one.get(), zero.get()).err();
    assert_eq!(err.map(|e| e.code), Some(ErrorCode::InvalidComptimeOperation));
}

#[test]
fn test_string_concatenation_and_comparison() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let left = ctx.string_value("che");
    let right = ctx.string_value("ese");
    let joined = ctx.binary_op(BinaryOp::Add, left.get(), right.get()).expect("concat");
    assert_eq!(ctx.value_to_string(joined.get()), "\"cheese\"");
    let same = ctx.string_value("cheese");
    let equal = ctx.binary_op(BinaryOp::Eq, joined.get(), same.get()).expect("compare");
    assert_eq!(ctx.value_to_string(equal.get()), "true");
}

#[test]
fn test_float_to_integer_truncates() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let i32_ty = ctx.integer_type(true, 32);
    let value = ctx.comptime_float(-7.9);
    let truncated = ctx.cast(value.get(), i32_ty).expect("cast");
    assert_eq!(ctx.value_to_string(truncated.get()), "-7");
}

#[test]
fn test_bool_and_integer_casts() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let bool_ty = ctx.bool_type();
    let i8_ty = ctx.integer_type(true, 8);
    let zero = ctx.comptime_int(0);
    let flag = ctx.cast(zero.get(), bool_ty).expect("int to bool");
    assert_eq!(ctx.value_to_string(flag.get()), "false");
    let truth = ctx.bool_value(true);
    let one = ctx.cast(truth.get(), i8_ty).expect("bool to int");
    assert_eq!(ctx.value_to_string(one.get()), "1");
}

#[test]
fn test_structural_equality_of_values() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let a = ctx.comptime_int(12);
    let b = ctx.comptime_int(12);
    let c = ctx.comptime_float(12.0);
    assert!(ctx.is_same_as(a.get(), b.get()));
    assert!(!ctx.is_same_as(a.get(), c.get()));
}

#[test]
fn test_type_metadata_members() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let scope = ctx.root_scope(None);
    let cases = [
        (b.member(b.int_type(false, 8), "__max__"), "255"),
        (b.member(b.int_type(true, 8), "__min__"), "-128"),
        (b.member(b.i32_type(), "__name__"), "\"i32\""),
        (b.member(b.array_type(&[b.int(4)], b.i32_type(), false), "__size__"), "16"),
        (b.member(b.pointer(b.f64_type(), false), "__child__"), "f64"),
    ];
    for (expr, expected) in cases {
        let value = ctx.exec(scope.get(), expr).expect("metadata");
        assert_eq!(ctx.value_to_string(value.get()), expected);
    }
}

#[test]
fn test_try_exec_never_raises() {
    let arena = Bump::new();
    let b = AstBuilder::new(&arena);
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let scope = ctx.root_scope(None);
    let shift = b.binary(BinaryOp::Shl, b.int(1), b.int(-1));
    assert!(ctx.try_exec(scope.get(), shift).is_none());
    assert!(ctx.try_exec(scope.get(), b.name("undefined")).is_none());
    assert!(!ctx.errored());
}
