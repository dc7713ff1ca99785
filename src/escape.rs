//! Quoting helpers for Vim's command line.
//!
//! These follow Vim's single-quoted string rules (`''` inside `'...'` is a
//! literal quote).  They are a whitelist-style escaper, not a POSIX shell
//! quoter: do not feed the result to `sh`.

use std::borrow::Cow;

/// Escape a single argument.
///
/// * `""` becomes `''`.
/// * Anything containing a space, a tab or a single quote, or starting with
///   `"`, is wrapped in single quotes with embedded quotes doubled.
/// * Everything else is returned unchanged.
pub fn escape_argument(arg: &str) -> Cow<'_, str> {
    if arg.is_empty() {
        return Cow::Borrowed("''");
    }
    if arg.contains([' ', '\t', '\'']) || arg.starts_with('"') {
        return Cow::Owned(format!("'{}'", double_quotes(arg)));
    }
    Cow::Borrowed(arg)
}

/// Escape every argument and join them with single spaces.
///
/// An empty argument list yields `''`, the same as a single empty argument.
pub fn join_arguments<S: AsRef<str>>(args: &[S]) -> String {
    if args.is_empty() {
        return escape_argument("").into_owned();
    }
    args.iter()
        .map(|a| escape_argument(a.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Double every single quote so `s` can sit inside `'...'`.
pub fn double_quotes(s: &str) -> String {
    s.replace('\'', "''")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn safe_arguments_pass_through() {
        for arg in ["echo", "a\"b", "/path/to/file.txt", "--flag=1", "日本"] {
            assert_eq!(escape_argument(arg), arg);
        }
    }

    #[test]
    fn empty_argument_is_quoted_empty() {
        assert_eq!(escape_argument(""), "''");
    }

    #[test]
    fn whitespace_is_wrapped() {
        assert_eq!(escape_argument("a b"), "'a b'");
        assert_eq!(escape_argument("a\tb"), "'a\tb'");
    }

    #[test]
    fn embedded_quotes_are_doubled() {
        assert_eq!(escape_argument("it's"), "'it''s'");
        assert_eq!(escape_argument("it's here"), "'it''s here'");
    }

    #[test]
    fn leading_quote_forces_wrapping() {
        assert_eq!(escape_argument("'quoted"), "'''quoted'");
        assert_eq!(escape_argument("\"dq"), "'\"dq'");
    }

    #[test]
    fn join_preserves_order() {
        let args = vec!["echo".to_string(), "hello world".to_string(), "x".to_string()];
        assert_eq!(join_arguments(&args), "echo 'hello world' x");
    }

    #[test]
    fn join_of_nothing_is_quoted_empty() {
        let args: Vec<String> = Vec::new();
        assert_eq!(join_arguments(&args), "''");
    }

    #[test]
    fn join_keeps_empty_arguments() {
        assert_eq!(join_arguments(&["e", "", "f"]), "e '' f");
    }

    #[test]
    fn double_quotes_only_touches_single_quotes() {
        assert_eq!(double_quotes("/tmp/it's \"x\""), "/tmp/it''s \"x\"");
    }
}
