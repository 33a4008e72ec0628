//! Lexer and recursive-descent parser for the Lat language.
//!
//! Lat is a small statically-typed object-oriented language with
//! classes, single inheritance, reference-semantic arrays and strings.
//! This crate turns source text into a [`Program`] tree whose expression
//! nodes carry an unset type annotation; the compiler crate's type
//! checker fills and rewrites the tree in place.
//!
//! ```
//! use latc_parser::{parse, tokenize};
//!
//! let tokens = tokenize("int main() { return 0; }").unwrap();
//! let program = parse(tokens).unwrap();
//! assert_eq!(program.functions[0].name, "main");
//! ```

pub mod ast;
pub mod error;
pub mod lexer;
pub mod parser;
pub mod span;
pub mod token;

pub use ast::{
    BinOp, ClassDecl, DefItem, Definition, Expr, ExprKind, Function, Param, Program, Stmt,
    StmtKind, Type, UnOp,
};
pub use error::{LexError, LexErrorKind, ParseError, ParseFrame, ParseResult};
pub use lexer::{tokenize, unescape, Lexer, SpannedToken};
pub use parser::{parse, Parser};
pub use span::{SourceMap, Span};
pub use token::Token;
