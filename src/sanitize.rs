//! Sanitization primitives used throughout the host application to build SQL
//! safely.
//!
//! Every function here is pure and total: arbitrary input degrades to a safe
//! output instead of failing.

/// Escape an identifier (table or column name).
///
/// Names composed solely of ASCII letters, digits, and underscores pass
/// through unchanged; every other character is replaced with an underscore.
#[must_use]
pub fn escape_identifier(name: &str) -> String {
    name.chars()
        .map(|ch| {
            if ch.is_ascii_alphanumeric() || ch == '_' {
                ch
            } else {
                '_'
            }
        })
        .collect()
}

/// Escape a possibly-qualified `table.column` identifier.
///
/// Splits on the first dot, escapes each side independently, and rejoins; a
/// bare name is escaped as a plain identifier.
#[must_use]
pub fn escape_qualified_identifier(name: &str) -> String {
    match name.split_once('.') {
        Some((table, column)) => format!(
            "{}.{}",
            escape_identifier(table),
            escape_identifier(column)
        ),
        None => escape_identifier(name),
    }
}

/// Escape a string for embedding in a single-quoted MySQL literal, without
/// the surrounding quotes.
///
/// When `strip_four_byte` is set and the value is non-empty, 4-byte UTF-8
/// sequences (supplementary-plane characters) are dropped first; connections
/// using `utf8mb3`-class charsets cannot store them.
#[must_use]
pub fn escape_string(value: &str, strip_four_byte: bool) -> String {
    let mut out = String::with_capacity(value.len() + 2);
    for ch in value.chars() {
        if strip_four_byte && ch.len_utf8() == 4 {
            continue;
        }
        match ch {
            '\0' => out.push_str("\\0"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\x1a' => out.push_str("\\Z"),
            '\'' => out.push_str("\\'"),
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            _ => out.push(ch),
        }
    }
    out
}

/// Quote a string value as a MySQL literal, surrounding quotes included.
#[must_use]
pub fn quote(value: &str, strip_four_byte: bool) -> String {
    format!("'{}'", escape_string(value, strip_four_byte))
}

/// Escape a value for use inside a `LIKE` pattern so it matches literally:
/// string-escape first, then backslash-escape the `%` and `_` wildcards.
#[must_use]
pub fn escape_like_pattern(value: &str) -> String {
    let escaped = escape_string(value, false);
    let mut out = String::with_capacity(escaped.len());
    for ch in escaped.chars() {
        if ch == '%' || ch == '_' {
            out.push('\\');
        }
        out.push(ch);
    }
    out
}

/// Validate a comparison operator token.
///
/// Tokens are 1–2 characters. `bitwise` selects the accepted set: `Some(false)`
/// for the comparison operators only, `Some(true)` for the bitwise operators
/// only, `None` for both.
#[must_use]
pub fn is_comparison_operator(token: &str, bitwise: Option<bool>) -> bool {
    const COMPARISON: [&str; 7] = ["=", "<", ">", ">=", "<=", "<>", "!="];
    const BITWISE: [&str; 7] = ["&", "~", "&~", "|", "^", "<<", ">>"];

    if token.is_empty() || token.len() > 2 {
        return false;
    }
    match bitwise {
        Some(false) => COMPARISON.contains(&token),
        Some(true) => BITWISE.contains(&token),
        None => COMPARISON.contains(&token) || BITWISE.contains(&token),
    }
}
