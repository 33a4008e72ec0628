//! Whole-program compiler for the Lat language.
//!
//! Lat is a small statically-typed object-oriented language with single
//! inheritance, virtual dispatch, and reference-semantic arrays and
//! strings. The pipeline runs in three sequential passes over an
//! in-memory tree:
//!
//! 1. [`latc_parser`] turns source text into a program tree.
//! 2. [`checker`] builds the global [`typeinfo`] tables, type-checks
//!    every function body and normalizes the tree in place (call
//!    classification, implicit `self`, constant folding, dead-code
//!    elision).
//! 3. [`codegen`] lowers the normalized tree to an x86-64 NASM listing
//!    linked against a minimal runtime.
//!
//! [`pipeline::compile`] is the text-to-text entry point; the `latc`
//! binary adds file handling and the `nasm`/`ld` invocation.

pub mod builtins;
pub mod checker;
pub mod codegen;
pub mod diagnostics;
pub mod driver;
pub mod pipeline;
pub mod typeinfo;

pub use checker::check_program;
pub use codegen::generate;
pub use pipeline::{compile, CompileError};
pub use typeinfo::{build_type_info, TypeError, TypeErrors, TypeInfo};
