//! Rendering compile errors against the source text.
//!
//! The driver prints `ERROR\n` first and then one of these blocks.

use latc_parser::{LexErrorKind, SourceMap};

use crate::pipeline::CompileError;

/// Render a compile error into its diagnostic text.
pub fn render(error: &CompileError, source: &str) -> String {
    let map = SourceMap::new(source);
    match error {
        CompileError::Lex(e) => {
            let loc = map.locate(e.pos);
            match e.kind {
                LexErrorKind::Unrecognized => format!("Unrecognized token at {}\n", loc),
                LexErrorKind::InvalidEscape => format!("Invalid escape sequence at {}\n", loc),
                LexErrorKind::UnterminatedString => {
                    format!("Unterminated string literal starting at {}\n", loc)
                }
                LexErrorKind::UnterminatedComment => {
                    format!("Unterminated block comment starting at {}\n", loc)
                }
            }
        }
        CompileError::Parse(e) => {
            let mut out = format!("Parsing error at {}: {}\n", map.locate(e.pos), e.msg);
            for frame in &e.frames {
                out.push_str("while parsing ");
                out.push_str(frame.what);
                if let Some(name) = &frame.name {
                    out.push(' ');
                    out.push_str(name);
                }
                out.push_str(&format!(" starting at {}\n", map.locate(frame.start)));
            }
            out
        }
        CompileError::Check(errors) => {
            let mut out = String::from("Type checker error, details:\n");
            for e in &errors.0 {
                out.push_str(&format!(
                    "From {} to {}:\n{}\n",
                    map.locate(e.begin),
                    map.locate(e.end),
                    e.msg
                ));
            }
            out
        }
        CompileError::Emit(e) => format!("{}\n", e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pipeline::compile;

    fn diagnose(source: &str) -> String {
        let err = compile(source).expect_err("expected a compile error");
        render(&err, source)
    }

    #[test]
    fn test_lexer_diagnostic() {
        let out = diagnose("int main() { int _x; }");
        assert_eq!(out, "Unrecognized token at line 1, column 18\n");
    }

    #[test]
    fn test_parser_diagnostic_has_trace() {
        let out = diagnose("int main() { return + ; }");
        assert!(out.starts_with("Parsing error at line 1, column 21:"));
        assert!(out.contains("while parsing function main starting at line 1, column 1"));
        assert!(out.contains("while parsing statement starting at line 1, column 14"));
    }

    #[test]
    fn test_checker_diagnostic_lists_ranges() {
        let out = diagnose("int main() { return true; }");
        assert!(out.starts_with("Type checker error, details:\n"));
        assert!(out.contains("From line 1, column 14 to line 1, column 25:"));
        assert!(out.contains("cannot cast from boolean to int in the return statement."));
    }

    #[test]
    fn test_missing_main_renders_endfile() {
        let out = diagnose("int f() { return 0; }");
        assert!(out.contains("From endfile to endfile:\nmain() function not found."));
    }
}
