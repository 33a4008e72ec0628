//! Command-line driver: file handling, external assembler and linker.
//!
//! The compile-to-`.s` step is separated from the `nasm`/`ld` step so
//! the former stays testable on machines without the toolchain.

use std::path::{Path, PathBuf};
use std::process::Command;

use thiserror::Error;

use crate::diagnostics;
use crate::pipeline::compile;

#[derive(Error, Debug)]
pub enum DriverError {
    #[error("Expected .lat file!")]
    BadExtension,
    #[error("IO Error!\n{0}")]
    Io(#[from] std::io::Error),
    /// A rendered compiler diagnostic, printed verbatim after `ERROR`.
    #[error("{0}")]
    Compile(String),
    #[error("{0} execution error.")]
    Tool(&'static str),
}

/// Compile `<input>.lat` and write `<input>.s`; returns the listing path.
pub fn compile_file(input: &Path) -> Result<PathBuf, DriverError> {
    if input.extension().and_then(|e| e.to_str()) != Some("lat") {
        return Err(DriverError::BadExtension);
    }
    let source = std::fs::read_to_string(input)?;
    let listing = match compile(&source) {
        Ok(listing) => listing,
        Err(e) => return Err(DriverError::Compile(diagnostics::render(&e, &source))),
    };
    let asm_path = input.with_extension("s");
    std::fs::write(&asm_path, listing)?;
    Ok(asm_path)
}

/// Assemble and link the listing, then drop the intermediate object.
pub fn assemble_and_link(asm_path: &Path) -> Result<(), DriverError> {
    let status = Command::new("nasm")
        .arg("-f")
        .arg("elf64")
        .arg(asm_path)
        .status()
        .map_err(|_| DriverError::Tool("nasm"))?;
    if !status.success() {
        return Err(DriverError::Tool("nasm"));
    }
    let object = asm_path.with_extension("o");
    let binary = asm_path.with_extension("");
    let status = Command::new("ld")
        .arg("-o")
        .arg(&binary)
        .arg(&object)
        .arg("lib/runtime.o")
        .status()
        .map_err(|_| DriverError::Tool("ld"))?;
    if !status.success() {
        return Err(DriverError::Tool("ld"));
    }
    std::fs::remove_file(&object)?;
    Ok(())
}

/// CLI entry point; returns the process exit code. On success `OK` goes
/// to stderr, on failure `ERROR` plus the diagnostic.
pub fn run(args: &[String]) -> i32 {
    if args.len() != 2 {
        println!("USAGE: latc path_to_file.lat");
        return 1;
    }
    let result = compile_file(Path::new(&args[1])).and_then(|asm| assemble_and_link(&asm));
    match result {
        Ok(()) => {
            eprintln!("OK");
            0
        }
        Err(DriverError::Compile(diag)) => {
            eprint!("ERROR\n{}", diag);
            1
        }
        Err(other) => {
            eprintln!("ERROR\nDetails:\n{}", other);
            1
        }
    }
}
