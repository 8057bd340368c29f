//! Numeric literal handling
//!
//! MESA model files are written by Fortran and use `D` exponents
//! (`1.0D+05`). Everything is rewritten to `E` form before conversion.

use crate::types::{Column, Value};
use std::borrow::Cow;

/// Rewrite Fortran exponents (`D+`, `D-`, `d+`, `d-`) as `E+`/`E-`.
///
/// Only a `d`/`D` followed by a sign is touched; other tokens pass
/// through unchanged.
pub fn normalize_exponent(token: &str) -> Cow<'_, str> {
    let bytes = token.as_bytes();
    let needs_rewrite = bytes
        .windows(2)
        .any(|w| matches!(w[0], b'd' | b'D') && matches!(w[1], b'+' | b'-'));
    if !needs_rewrite {
        return Cow::Borrowed(token);
    }

    let mut out = String::with_capacity(token.len());
    let mut chars = token.chars().peekable();
    while let Some(c) = chars.next() {
        if matches!(c, 'd' | 'D') && matches!(chars.peek(), Some('+') | Some('-')) {
            out.push('E');
        } else {
            out.push(c);
        }
    }
    Cow::Owned(out)
}

/// Parse a float, accepting Fortran exponents
#[inline]
pub fn parse_f64(token: &str) -> Option<f64> {
    normalize_exponent(token).parse().ok()
}

/// Strip one layer of matching single or double quotes
fn unquote(token: &str) -> Option<&str> {
    let inner = token
        .strip_prefix('"')
        .and_then(|t| t.strip_suffix('"'))
        .or_else(|| token.strip_prefix('\'').and_then(|t| t.strip_suffix('\'')))?;
    Some(inner)
}

/// Parse a header token: quoted text, integer, float, or the literal token
pub fn parse_value(token: &str) -> Value {
    if token.len() >= 2 {
        if let Some(inner) = unquote(token) {
            return Value::Text(inner.to_string());
        }
    }
    if let Ok(v) = token.parse::<i64>() {
        return Value::Int(v);
    }
    match parse_f64(token) {
        Some(v) => Value::Float(v),
        None => Value::Text(token.to_string()),
    }
}

/// Build a column from raw tokens, picking the narrowest type that fits
/// every token: integer, then float, then text.
pub fn infer_column(tokens: &[&str]) -> Column {
    let ints: Option<Vec<i64>> = tokens.iter().map(|t| t.parse().ok()).collect();
    if let Some(v) = ints {
        return Column::Int(v);
    }
    let floats: Option<Vec<f64>> = tokens.iter().map(|t| parse_f64(t)).collect();
    if let Some(v) = floats {
        return Column::Float(v);
    }
    Column::Text(tokens.iter().map(|t| t.to_string()).collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_exponent() {
        assert_eq!(normalize_exponent("1.0D+05"), "1.0E+05");
        assert_eq!(normalize_exponent("2.3d-02"), "2.3E-02");
        assert_eq!(normalize_exponent("-4.5D-10"), "-4.5E-10");
        assert_eq!(normalize_exponent("1.5E+00"), "1.5E+00");
        assert!(matches!(normalize_exponent("12"), Cow::Borrowed(_)));
        // no sign, left alone
        assert_eq!(normalize_exponent("1.0D5"), "1.0D5");
        assert_eq!(normalize_exponent("d"), "d");
    }

    #[test]
    fn test_parse_value() {
        assert_eq!(parse_value("42"), Value::Int(42));
        assert_eq!(parse_value("-7"), Value::Int(-7));
        assert_eq!(parse_value("1.5"), Value::Float(1.5));
        assert_eq!(parse_value("1.0D+02"), Value::Float(100.0));
        assert_eq!(parse_value("2.5e-1"), Value::Float(0.25));
        assert_eq!(parse_value("\"r23.05.1\""), Value::Text("r23.05.1".into()));
        assert_eq!(parse_value("'gfortran'"), Value::Text("gfortran".into()));
        assert_eq!(parse_value("abc"), Value::Text("abc".into()));
        assert_eq!(parse_value("\""), Value::Text("\"".into()));
    }

    #[test]
    fn test_infer_column() {
        assert_eq!(infer_column(&["1", "2", "3"]), Column::Int(vec![1, 2, 3]));
        assert_eq!(
            infer_column(&["1", "2.5", "1D+01"]),
            Column::Float(vec![1.0, 2.5, 10.0])
        );
        assert_eq!(
            infer_column(&["1", "x"]),
            Column::Text(vec!["1".into(), "x".into()])
        );
        assert_eq!(infer_column(&[]), Column::Int(vec![]));
    }
}
