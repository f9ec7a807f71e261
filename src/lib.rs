//! Cheese
//!
//! The semantic core of the cheese language compiler: a compile-time
//! evaluator, a structural type algebra and a monomorphizing function
//! resolver, built on a tracing garbage-collected object heap.
//!
//! This crate re-exports the workspace members:
//!
//! - [`core`]: source coordinates, diagnostics and the object heap
//! - [`ast`]: the arena-allocated syntax tree consumed by analysis
//! - [`compiler`]: the analysis itself
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cheese::ast::{AstBuilder, DeclFlags, FunctionBody};
//! use cheese::{CompilationContext, CompilerConfig};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let root = b.structure(&[b.function(
//!     "main",
//!     &[],
//!     b.i32_type(),
//!     FunctionBody::Expr(b.int(0)),
//!     DeclFlags::ENTRY,
//! )]);
//!
//! let mut ctx = CompilationContext::new(CompilerConfig::default());
//! ctx.analyze(root, None).expect("analysis failed");
//! let output = ctx.finish();
//! assert!(!output.errored);
//! assert_eq!(output.functions().len(), 1);
//! ```

pub use cheese_ast as ast;
pub use cheese_compiler as compiler;
pub use cheese_core as core;

pub use cheese_compiler::{
    BackendProgram, CompilationContext, CompilationOutput, CompilerConfig, FsImportResolver,
    ImportResolver, SourceParser, StaticImportResolver,
};
pub use cheese_core::{CompileError, ErrorCode, Result, Span};
