//! The compile pipeline: tokenize → parse → check → emit.
//!
//! Pure text-to-text; file handling and external tools live in
//! [`crate::driver`].

use latc_parser::{parse, tokenize, LexError, ParseError};
use thiserror::Error;

use crate::checker::check_program;
use crate::codegen::{generate, EmitError};
use crate::typeinfo::TypeErrors;

/// Everything that can stop a compilation, one variant per stage.
#[derive(Error, Debug)]
pub enum CompileError {
    #[error(transparent)]
    Lex(#[from] LexError),
    #[error(transparent)]
    Parse(#[from] ParseError),
    #[error(transparent)]
    Check(#[from] TypeErrors),
    #[error(transparent)]
    Emit(#[from] EmitError),
}

/// Compile Lat source text into an x86-64 NASM listing.
pub fn compile(source: &str) -> Result<String, CompileError> {
    let tokens = tokenize(source)?;
    let mut program = parse(tokens)?;
    let info = check_program(&mut program)?;
    let listing = generate(&info, &program)?;
    Ok(listing)
}
