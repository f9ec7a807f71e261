//! Type algebra: identity, distances and peers.

use cheese::compiler::types::INCOMPATIBLE;
use cheese::compiler::{Comptimeness, Field, TypeRef};
use cheese::{CompilationContext, CompilerConfig};

fn sample_types<'ast>(ctx: &mut CompilationContext<'ast>) -> Vec<TypeRef<'ast>> {
    let i32_ty = ctx.integer_type(true, 32);
    let u8_ty = ctx.integer_type(false, 8);
    let f64_ty = ctx.f64_type();
    let structure = ctx.declare_structure("Point", false);
    ctx.heap_mut().add_root(structure.get());
    vec![
        i32_ty,
        u8_ty,
        ctx.comptime_int_type(),
        ctx.comptime_float_type(),
        ctx.comptime_complex_type(),
        ctx.comptime_string_type(),
        ctx.comptime_enum_type(),
        f64_ty,
        ctx.c64_type(),
        ctx.bool_type(),
        ctx.void_type(),
        ctx.noreturn_type(),
        ctx.any_type(),
        ctx.type_type(),
        ctx.reference_type(i32_ty, false),
        ctx.pointer_type(u8_ty, true),
        ctx.slice_type(f64_ty, false),
        ctx.array_type(i32_ty, vec![2, 3], false),
        ctx.function_pointer_type(vec![i32_ty], f64_ty),
        ctx.imported_function_type(vec![u8_ty], i32_ty),
        structure.get(),
    ]
}

#[test]
fn test_singletons_share_identity() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    assert_eq!(ctx.integer_type(true, 32), ctx.integer_type(true, 32));
    assert_eq!(ctx.f64_type(), ctx.f64_type());
    assert_eq!(ctx.type_type(), ctx.type_type());
    let i32_ty = ctx.integer_type(true, 32);
    assert_eq!(ctx.array_type(i32_ty, vec![4], true), ctx.array_type(i32_ty, vec![4], true));
    assert_ne!(ctx.array_type(i32_ty, vec![4], true), ctx.array_type(i32_ty, vec![4], false));
}

#[test]
fn test_compare_with_itself_is_zero() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    for ty in sample_types(&mut ctx) {
        assert_eq!(ctx.compare(ty, ty, true), 0, "{}", ctx.type_name(ty));
        assert_eq!(ctx.compare(ty, ty, false), 0, "{}", ctx.type_name(ty));
    }
}

#[test]
fn test_any_is_absorbed_by_peer() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let any = ctx.any_type();
    for ty in sample_types(&mut ctx) {
        assert_eq!(ctx.peer(any, ty).map(|p| p.get()), Some(ty), "{}", ctx.type_name(ty));
        assert_eq!(ctx.peer(ty, any).map(|p| p.get()), Some(ty), "{}", ctx.type_name(ty));
    }
}

#[test]
fn test_mixed_sign_peer_widens() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let u8_ty = ctx.integer_type(false, 8);
    let i16_ty = ctx.integer_type(true, 16);
    let peer = ctx.peer(u8_ty, i16_ty).map(|p| ctx.type_name(p.get()));
    assert_eq!(peer.as_deref(), Some("i16"));

    let u16_ty = ctx.integer_type(false, 16);
    let i8_ty = ctx.integer_type(true, 8);
    let peer = ctx.peer(u16_ty, i8_ty).map(|p| ctx.type_name(p.get()));
    assert_eq!(peer.as_deref(), Some("i17"));
}

#[test]
fn test_comptime_int_prefers_wider_integers() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let literal = ctx.comptime_int_type();
    let i8_ty = ctx.integer_type(true, 8);
    let i64_ty = ctx.integer_type(true, 64);
    let f64_ty = ctx.f64_type();
    let to_i8 = ctx.compare(i8_ty, literal, true);
    let to_i64 = ctx.compare(i64_ty, literal, true);
    let to_f64 = ctx.compare(f64_ty, literal, true);
    assert!(to_i64 < to_i8);
    assert!(to_i8 < to_f64);
}

#[test]
fn test_dropping_const_through_reference_is_incompatible() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let i32_ty = ctx.integer_type(true, 32);
    let mutable = ctx.reference_type(i32_ty, false);
    let constant = ctx.reference_type(i32_ty, true);
    assert_eq!(ctx.compare(constant, mutable, true), 1);
    assert_eq!(ctx.compare(mutable, constant, true), INCOMPATIBLE);
}

#[test]
fn test_implicit_structure_converts_to_declared() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let i32_ty = ctx.integer_type(true, 32);
    let literal = ctx.comptime_int_type();
    let declared = ctx.declare_structure("Point", false);
    ctx.structure_mut(declared.get()).expect("structure").fields = vec![
        Field { name: "x".into(), ty: i32_ty },
        Field { name: "y".into(), ty: i32_ty },
    ];
    let implicit = ctx.implicit_structure(
        false,
        vec![
            Field { name: "x".into(), ty: literal },
            Field { name: "y".into(), ty: literal },
        ],
    );
    assert!(ctx.compare(declared.get(), implicit.get(), true) > 0);
    let peer = ctx.peer(declared.get(), implicit.get()).map(|p| p.get());
    assert_eq!(peer, Some(declared.get()));
}

#[test]
fn test_comptimeness_follows_children() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let literal = ctx.comptime_int_type();
    let i32_ty = ctx.integer_type(true, 32);
    let any = ctx.any_type();
    let runtime_array = ctx.array_type(i32_ty, vec![3], false);
    let comptime_array = ctx.array_type(literal, vec![3], false);
    assert_eq!(ctx.comptimeness(runtime_array), Comptimeness::Runtime);
    assert_eq!(ctx.comptimeness(comptime_array), Comptimeness::Comptime);
    assert_eq!(ctx.comptimeness(any), Comptimeness::ArgumentDepending);
    let noreturn = ctx.noreturn_type();
    assert_eq!(ctx.comptimeness(noreturn), Comptimeness::Runtime);
}

#[test]
fn test_comptime_types_have_no_backend_type() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let literal = ctx.comptime_int_type();
    let err = ctx.backend_type(literal).err();
    assert_eq!(err.map(|e| e.code), Some(cheese::ErrorCode::NoBackendType));
    let boolean = ctx.bool_type();
    let id = ctx.backend_type(boolean).expect("bool lowers");
    assert_eq!(ctx.program().render(id), "u1");
}
