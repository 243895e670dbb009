//! Positional marker substitution for raw SQL fragments.
//!
//! A signature such as `"price > {0} AND price < {1}"` is filled by replacing
//! each `{n}` with a freshly allocated placeholder for `values[n]`. Markers
//! are visited left to right, so placeholder numbering follows their position
//! in the text. A marker that appears twice binds its value twice. Markers
//! whose index has no value, and braces that do not form a marker, are copied
//! verbatim.

use crate::bound::Bound;
use crate::dialect::Dialect;
use crate::value::Value;

/// Fill `signature` against `values`, appending every used value to `bound`.
pub fn fill<D>(dialect: &D, bound: &mut Bound, signature: &str, values: &[Value]) -> String
where
    D: Dialect + ?Sized,
{
    let mut out = String::with_capacity(signature.len() + values.len() * 2);
    let mut rest = signature;

    while let Some(start) = rest.find('{') {
        out.push_str(&rest[..start]);
        let after = &rest[start + 1..];
        let digits = after.bytes().take_while(|b| b.is_ascii_digit()).count();

        if digits > 0 && after.as_bytes().get(digits) == Some(&b'}') {
            let marker = &rest[start..start + digits + 2];
            let value = after[..digits]
                .parse::<usize>()
                .ok()
                .and_then(|idx| values.get(idx));
            match value {
                Some(value) => out.push_str(&dialect.value(bound, value)),
                None => out.push_str(marker),
            }
            rest = &rest[start + digits + 2..];
        } else {
            out.push('{');
            rest = after;
        }
    }

    out.push_str(rest);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dialect::{MySqlDialect, PostgresDialect};

    #[test]
    fn markers_fill_in_text_order() {
        let mut bound = Bound::new();
        let sql = fill(
            &PostgresDialect::new(),
            &mut bound,
            "b = {1} AND a = {0}",
            &[Value::Int(1), Value::Int(2)],
        );
        assert_eq!(sql, "b = $1 AND a = $2");
        assert_eq!(bound.into_values(), vec![Value::Int(2), Value::Int(1)]);
    }

    #[test]
    fn continues_numbering_from_existing_bound() {
        let mut bound = Bound::new();
        bound.push(Value::from("outer"));
        let sql = fill(&PostgresDialect::new(), &mut bound, "x = {0}", &[Value::Int(9)]);
        assert_eq!(sql, "x = $2");
        assert_eq!(bound.len(), 2);
    }

    #[test]
    fn unmatched_markers_are_left_verbatim() {
        let mut bound = Bound::new();
        let sql = fill(
            &MySqlDialect::new(),
            &mut bound,
            "a = {0} AND b = {3} AND c = '{x}' AND d = {",
            &[Value::Int(1)],
        );
        assert_eq!(sql, "a = ? AND b = {3} AND c = '{x}' AND d = {");
        assert_eq!(bound.len(), 1);
    }

    #[test]
    fn repeated_marker_binds_twice() {
        let mut bound = Bound::new();
        let sql = fill(
            &PostgresDialect::new(),
            &mut bound,
            "lo <= {0} AND hi >= {0}",
            &[Value::Int(5)],
        );
        assert_eq!(sql, "lo <= $1 AND hi >= $2");
        assert_eq!(bound.into_values(), vec![Value::Int(5), Value::Int(5)]);
    }

    #[test]
    fn non_ascii_text_survives() {
        let mut bound = Bound::new();
        let sql = fill(
            &PostgresDialect::new(),
            &mut bound,
            "name = {0} -- naïve {é}",
            &[Value::from("zoë")],
        );
        assert_eq!(sql, "name = $1 -- naïve {é}");
    }
}
