//! tabc
//!
//! Five-stage ahead-of-time compiler from a tab-indented statically-typed
//! scripting language to C: symbol table, type checker, IR generator,
//! C-AST builder, C emitter. See [`pipeline`] for the stage sequencing and
//! [`error`] for the stage-tagged error taxonomy shared across all of them.

// Prevent accidental debug output in library code.
// CLI binaries (bin/) may use eprintln!() for user-facing error messages.
#![deny(clippy::print_stderr)]

pub mod cast;
pub mod cast_builder;
pub mod emitter;
pub mod error;
pub mod ir;
pub mod pipeline;
pub mod symbol_table;
pub mod type_checker;

pub use error::{CompileError, CompileResult, Stage};
pub use pipeline::{compile_block, compile_source, dump_ir, CompileArtifacts};
