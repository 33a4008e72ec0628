//! Reserved names and built-in free functions.

use std::collections::HashMap;

use latc_parser::Type;
use once_cell::sync::Lazy;

/// Runtime concatenation routine; string `+` lowers to a call to it.
pub const CONCAT_FUN: &str = "_concat";

/// The receiver name inside method bodies.
pub const SELF_NAME: &str = "self";

/// The only member available on array values.
pub const LENGTH_ATTR: &str = "length";

pub const MAIN_FUN: &str = "main";

/// Built-in free functions: name → (return type, parameter types).
/// Visible to name resolution but never stored in the function table.
pub static BUILTIN_FUNCTIONS: Lazy<HashMap<&'static str, (Type, Vec<Type>)>> = Lazy::new(|| {
    HashMap::from([
        ("printInt", (Type::Void, vec![Type::Int])),
        ("printString", (Type::Void, vec![Type::Str])),
        ("error", (Type::Void, Vec::new())),
        ("readInt", (Type::Int, Vec::new())),
        ("readString", (Type::Str, Vec::new())),
    ])
});

/// Order of the builtin `extern` lines in the emitted listing.
pub const BUILTIN_EMIT_ORDER: [&str; 5] =
    ["error", "printInt", "printString", "readInt", "readString"];
