//! Abstract syntax tree consumed by the cheese semantic core.
//!
//! Nodes are arena-allocated with [`bumpalo`] and borrow from it with the
//! `'ast` lifetime, so the whole tree is `Copy` and cheap to hand around. The
//! lexer and parser live outside this workspace; they (and the tests) build
//! trees through [`AstBuilder`].
//!
//! # Example
//!
//! ```
//! use bumpalo::Bump;
//! use cheese_ast::{AstBuilder, BinaryOp, Expr};
//!
//! let arena = Bump::new();
//! let b = AstBuilder::new(&arena);
//! let sum = b.binary(BinaryOp::Add, b.int(5), b.int(3));
//! assert!(matches!(sum, Expr::Binary(_)));
//! ```

pub mod builder;
pub mod decl;
pub mod expr;
pub mod ops;
pub mod stmt;

pub use builder::AstBuilder;
pub use cheese_core::{FileId, Span};
pub use decl::*;
pub use expr::*;
pub use ops::*;
pub use stmt::*;
