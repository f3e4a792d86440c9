//! Command line tokenizer
//!
//! Splits a shell-like command line into the argument vector handed to the
//! executor. Double quotes group words containing whitespace and are never
//! part of an argument.

use regex::Regex;
use std::sync::OnceLock;

/// A bare word, or a quoted run up to the next quote (or end of input).
const ARGUMENT_PATTERN: &str = r#"[^"\s]\S*|"[^"]*"?"#;

fn argument_regex() -> &'static Regex {
    static ARGUMENT: OnceLock<Regex> = OnceLock::new();
    ARGUMENT.get_or_init(|| Regex::new(ARGUMENT_PATTERN).expect("argument pattern is valid"))
}

/// Tokenize a command line into arguments.
///
/// - Whitespace between arguments is discarded.
/// - `"hello world"` is a single argument `hello world`.
/// - A quote with no closing partner swallows the rest of the line.
/// - Quote characters are stripped from every argument, so `""` yields an
///   empty argument and `a"b` yields `ab`.
pub fn tokenize(line: &str) -> Vec<String> {
    argument_regex()
        .find_iter(line)
        .map(|m| m.as_str().replace('"', ""))
        .collect()
}

/// Render arguments back into a command line that tokenizes to the same
/// vector.
///
/// Arguments that are empty or contain whitespace are wrapped in quotes.
/// Quote characters inside an argument cannot be represented and are
/// dropped by the tokenizer.
pub fn join<S: AsRef<str>>(args: &[S]) -> String {
    args.iter()
        .map(|arg| {
            let arg = arg.as_ref();
            if arg.is_empty() || arg.chars().any(char::is_whitespace) {
                format!("\"{}\"", arg)
            } else {
                arg.to_string()
            }
        })
        .collect::<Vec<_>>()
        .join(" ")
}
