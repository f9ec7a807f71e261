//! Core types shared by every stage of the cheese compiler.
//!
//! This crate provides the pieces that the AST and the semantic core both
//! depend on:
//!
//! - [`Span`] / [`FileId`]: source coordinates carried by every AST node
//! - [`ErrorCode`] / [`CompileError`]: the closed diagnostic taxonomy
//! - [`gc`]: the tracing mark-and-sweep object substrate
//! - [`SymbolHash`]: xxh64 identities for mangled symbols

pub mod error;
pub mod gc;
pub mod span;
pub mod symbol;

pub use error::{CompileError, ErrorCode, Result};
pub use gc::{Gc, GcConfig, GcStats, Heap, Managed, RawGc, Scoped, Trace, Tracer};
pub use span::{FileId, Span};
pub use symbol::SymbolHash;
