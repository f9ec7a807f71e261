//! Cheese Compiler
//!
//! The semantic core of the cheese compiler: compile-time evaluation, type
//! checking of declarations and monomorphization of function templates.
//!
//! ## Architecture
//!
//! Every type, value, scope and function object lives in one garbage-collected
//! heap owned by the [`CompilationContext`]. Analysis is demand driven:
//!
//! - **Translation**: each structure declaration becomes a structure type whose
//!   variables and imports stay lazy until first looked up
//! - **Entry discovery**: the entry function is found and instantiated, which
//!   pulls in whatever it depends on
//! - **Completion**: remaining lazy members of reachable structures are
//!   resolved so every declaration is checked
//!
//! The output is a [`BackendProgram`] of flattened types, runtime function
//! records and globals.
//!
//! ## Modules
//!
//! - [`analyze`]: the compilation driver
//! - [`backend`]: flattened output types and records
//! - [`config`]: compiler settings
//! - [`context`]: the compilation-wide context
//! - [`eval`]: compile-time expression and body evaluation
//! - [`functions`]: templates, overload selection and instantiation
//! - [`import`]: import location and loading
//! - [`mangle`]: symbol name mangling
//! - [`object`]: the heap object enum and handle aliases
//! - [`scope`]: lexical scopes and lookup
//! - [`structure`]: structure translation and lazy members
//! - [`types`]: the type algebra
//! - [`values`]: compile-time values and operators

pub mod analyze;
pub mod backend;
pub mod config;
pub mod context;
pub mod eval;
pub mod functions;
pub mod import;
pub mod mangle;
pub mod object;
pub mod scope;
pub mod structure;
pub mod types;
pub mod values;

pub use analyze::CompilationOutput;
pub use backend::{BackendProgram, BackendType, BackendTypeId, FunctionRecord, GlobalRecord};
pub use config::CompilerConfig;
pub use context::CompilationContext;
pub use functions::{CallArg, ConcreteFunction, FunctionSet, FunctionTemplate, ScoreMode};
pub use import::{FsImportResolver, ImportResolver, SourceParser, StaticImportResolver};
pub use mangle::{combine_names, mangle, mangle_function, unmangle};
pub use object::{ConcreteRef, FunctionSetRef, ScopeRef, TemplateRef, TypeRef, ValueRef};
pub use scope::{Lookup, Scope};
pub use types::{Comptimeness, Field, Structure, Type};
pub use values::{Builtin, Value, ValueData};

// Re-export the error types from core for convenience
pub use cheese_core::{CompileError, ErrorCode, Result};
