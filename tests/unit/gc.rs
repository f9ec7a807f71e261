//! Object heap reachability through the compilation context.

use cheese::compiler::{Field, TypeRef};
use cheese::{CompilationContext, CompilerConfig};

fn link<'ast>(ctx: &mut CompilationContext<'ast>, from: TypeRef<'ast>, name: &str, to: TypeRef<'ast>) {
    ctx.structure_mut(from)
        .expect("structure")
        .fields
        .push(Field { name: name.to_string(), ty: to });
}

#[test]
fn test_unrooted_cycle_is_collected() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let (a, b) = {
        let a = ctx.declare_structure("A", false);
        let b = ctx.declare_structure("B", false);
        link(&mut ctx, a.get(), "b", b.get());
        link(&mut ctx, b.get(), "a", a.get());
        (a.get(), b.get())
    };
    assert!(ctx.heap().contains(a));
    ctx.heap_mut().collect();
    assert!(!ctx.heap().contains(a));
    assert!(!ctx.heap().contains(b));
}

#[test]
fn test_scoped_handle_keeps_cycle_alive() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let a = ctx.declare_structure("A", false);
    let b = {
        let b = ctx.declare_structure("B", false);
        link(&mut ctx, a.get(), "b", b.get());
        link(&mut ctx, b.get(), "a", a.get());
        b.get()
    };
    ctx.heap_mut().collect();
    assert!(ctx.heap().contains(a.get()));
    assert!(ctx.heap().contains(b));

    drop(a);
    ctx.heap_mut().collect();
    assert!(!ctx.heap().contains(b));
}

#[test]
fn test_rooted_object_survives() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let kept = ctx.declare_structure("Kept", false).get();
    ctx.heap_mut().add_root(kept);
    let child = {
        let child = ctx.declare_structure("Child", false);
        link(&mut ctx, kept, "child", child.get());
        child.get()
    };
    ctx.heap_mut().collect();
    assert!(ctx.heap().contains(kept));
    assert!(ctx.heap().contains(child));

    ctx.heap_mut().remove_root(kept);
    ctx.heap_mut().collect();
    assert!(!ctx.heap().contains(kept));
}

#[test]
fn test_pooled_types_are_never_collected() {
    let mut ctx = CompilationContext::new(CompilerConfig::default());
    let i32_ty = ctx.integer_type(true, 32);
    let pointer = ctx.pointer_type(i32_ty, false);
    ctx.heap_mut().collect();
    assert!(ctx.heap().contains(i32_ty));
    assert!(ctx.heap().contains(pointer));
    assert_eq!(ctx.pointer_type(i32_ty, false), pointer);
}

#[test]
fn test_small_threshold_collects_during_allocation() {
    let mut ctx = CompilationContext::new(CompilerConfig::default().with_gc_threshold(8));
    let kept = ctx.declare_structure("Kept", false);
    for index in 0..64 {
        let _ = ctx.comptime_int(index);
    }
    assert!(ctx.heap().stats().collections > 0);
    assert!(ctx.heap().contains(kept.get()));
}
