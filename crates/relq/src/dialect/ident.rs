//! Identifier classification for the dialect formatters.
//!
//! Field and table text is split on `.` into parts. When every part is a plain
//! identifier (`[A-Za-z_][A-Za-z0-9_$]*`, with `*` allowed as the last part)
//! the text is treated as an identifier path and individual parts are quoted
//! only when they need it. Anything else (`COUNT(id)`, `price * 2`, already
//! quoted names) is an expression and is emitted verbatim.

/// Words that must be quoted when used as a bare identifier.
const RESERVED: &[&str] = &[
    "all", "and", "as", "asc", "between", "by", "case", "check", "column", "constraint",
    "create", "default", "delete", "desc", "distinct", "drop", "else", "end", "exists",
    "from", "group", "having", "in", "index", "insert", "into", "is", "join", "key", "like",
    "limit", "not", "null", "offset", "on", "or", "order", "primary", "references", "select",
    "set", "table", "then", "to", "union", "unique", "update", "user", "using", "values",
    "when", "where",
];

/// Whether `part` matches `[A-Za-z_][A-Za-z0-9_$]*`.
pub(crate) fn is_identifier(part: &str) -> bool {
    let mut chars = part.chars();
    match chars.next() {
        Some(c) if c == '_' || c.is_ascii_alphabetic() => {}
        _ => return false,
    }
    chars.all(|c| c == '_' || c == '$' || c.is_ascii_alphanumeric())
}

/// Split `text` into identifier parts, or `None` if it is an expression.
pub(crate) fn split_path(text: &str) -> Option<Vec<&str>> {
    let parts: Vec<&str> = text.split('.').collect();
    let last = parts.len() - 1;
    let valid = parts
        .iter()
        .enumerate()
        .all(|(i, part)| is_identifier(part) || (i == last && *part == "*"));
    valid.then_some(parts)
}

/// Whether a plain identifier part must be quoted to survive case folding or
/// keyword parsing.
pub(crate) fn needs_quoting(part: &str) -> bool {
    if part == "*" {
        return false;
    }
    part.chars().any(|c| c.is_ascii_uppercase())
        || RESERVED.contains(&part.to_ascii_lowercase().as_str())
}

/// Append `part` wrapped in `quote`, doubling any embedded quote character.
pub(crate) fn write_quoted(out: &mut String, part: &str, quote: char) {
    out.push(quote);
    for ch in part.chars() {
        if ch == quote {
            out.push(quote);
        }
        out.push(ch);
    }
    out.push(quote);
}
