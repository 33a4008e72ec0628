//! Lat compiler command-line interface.
//!
//! Usage:
//!   latc <source>.lat   # compile, assemble and link next to the source

use std::env;

fn main() {
    let args: Vec<String> = env::args().collect();
    std::process::exit(latc::driver::run(&args));
}
