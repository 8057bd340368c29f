//! Derived field resolution
//!
//! MESA writes many quantities only as logarithms (`log_L`, `lnR`) or only
//! linearly. A requested key that is not a column is resolved against the
//! columns that are present, in this order:
//!
//! 1. the column itself
//! 2. `10**` of a `log_`/`log`/`lg_`/`lg` prefixed column
//! 3. `e**` of a `ln_`/`ln` prefixed column
//! 4. `log10` of the linear column named by stripping `^lo?g_?`
//! 5. `ln` of the linear column named by stripping `^ln_?`

use crate::types::{Column, MesaError, Result};
use std::borrow::Cow;

const LOG10_PREFIXES: [&str; 4] = ["log_", "log", "lg_", "lg"];
const LN_PREFIXES: [&str; 2] = ["ln_", "ln"];

/// Transform applied to a source column
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    Identity,
    /// `10**x`
    Exp10,
    /// `e**x`
    Exp,
    /// `log10(x)`
    Log10,
    /// `ln(x)`
    Ln,
}

impl Transform {
    #[inline]
    pub fn apply(self, x: f64) -> f64 {
        match self {
            Transform::Identity => x,
            Transform::Exp10 => 10f64.powf(x),
            Transform::Exp => x.exp(),
            Transform::Log10 => x.log10(),
            Transform::Ln => x.ln(),
        }
    }
}

/// How a key maps onto a stored column
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Resolution {
    /// Name of the stored column
    pub source: String,
    pub transform: Transform,
}

/// Linear name behind a `^lo?g_?(.+)` key
fn strip_log10_prefix(key: &str) -> Option<&str> {
    let rest = key.strip_prefix("log").or_else(|| key.strip_prefix("lg"))?;
    strip_separator(rest)
}

/// Linear name behind a `^ln_?(.+)` key
fn strip_ln_prefix(key: &str) -> Option<&str> {
    strip_separator(key.strip_prefix("ln")?)
}

/// Drop one leading `_` unless that would leave nothing
fn strip_separator(rest: &str) -> Option<&str> {
    let rest = match rest.strip_prefix('_') {
        Some(stripped) if !stripped.is_empty() => stripped,
        _ => rest,
    };
    (!rest.is_empty()).then_some(rest)
}

/// Resolve `key` against the set of stored column names
pub fn resolve<F>(key: &str, has_column: F) -> Option<Resolution>
where
    F: Fn(&str) -> bool,
{
    let found = |source: String, transform| Some(Resolution { source, transform });

    if has_column(key) {
        return found(key.to_string(), Transform::Identity);
    }
    for prefix in LOG10_PREFIXES {
        let name = format!("{}{}", prefix, key);
        if has_column(&name) {
            return found(name, Transform::Exp10);
        }
    }
    for prefix in LN_PREFIXES {
        let name = format!("{}{}", prefix, key);
        if has_column(&name) {
            return found(name, Transform::Exp);
        }
    }
    if let Some(linear) = strip_log10_prefix(key).filter(|name| has_column(name)) {
        return found(linear.to_string(), Transform::Log10);
    }
    if let Some(linear) = strip_ln_prefix(key).filter(|name| has_column(name)) {
        return found(linear.to_string(), Transform::Ln);
    }
    None
}

/// Apply a resolution to its source column
pub fn derive<'a>(key: &str, column: &'a Column, transform: Transform) -> Result<Cow<'a, Column>> {
    if transform == Transform::Identity {
        return Ok(Cow::Borrowed(column));
    }
    let values = column
        .to_f64_vec()
        .ok_or_else(|| MesaError::NonNumericColumn {
            key: key.to_string(),
        })?;
    Ok(Cow::Owned(Column::Float(
        values.into_iter().map(|x| transform.apply(x)).collect(),
    )))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn columns<'a>(names: &'a [&'a str]) -> impl Fn(&str) -> bool + 'a {
        move |key| names.contains(&key)
    }

    #[test]
    fn test_literal_wins() {
        let has = columns(&["L", "log_L"]);
        let r = resolve("L", &has).unwrap();
        assert_eq!(r.source, "L");
        assert_eq!(r.transform, Transform::Identity);
    }

    #[test]
    fn test_log_prefix_order() {
        let has = columns(&["logL", "lg_L", "ln_L"]);
        let r = resolve("L", &has).unwrap();
        assert_eq!((r.source.as_str(), r.transform), ("logL", Transform::Exp10));

        let has = columns(&["lnR"]);
        let r = resolve("R", &has).unwrap();
        assert_eq!((r.source.as_str(), r.transform), ("lnR", Transform::Exp));
    }

    #[test]
    fn test_linear_to_log() {
        let has = columns(&["T"]);
        for key in ["log_T", "logT", "lgT", "lg_T"] {
            let r = resolve(key, &has).unwrap();
            assert_eq!((r.source.as_str(), r.transform), ("T", Transform::Log10));
        }
        let r = resolve("ln_T", &has).unwrap();
        assert_eq!((r.source.as_str(), r.transform), ("T", Transform::Ln));
        assert!(resolve("log", &has).is_none());
        assert!(resolve("X", &has).is_none());
    }

    #[test]
    fn test_log_of_self_before_linear() {
        // "log_x" could be 10**log_log_x or log10(x); the former comes first
        let has = columns(&["log_log_x", "x"]);
        let r = resolve("log_x", &has).unwrap();
        assert_eq!(r.transform, Transform::Exp10);
    }

    #[test]
    fn test_strip_prefixes() {
        assert_eq!(strip_log10_prefix("log_L"), Some("L"));
        assert_eq!(strip_log10_prefix("logRho"), Some("Rho"));
        assert_eq!(strip_log10_prefix("lg_"), Some("_"));
        assert_eq!(strip_log10_prefix("log"), None);
        assert_eq!(strip_log10_prefix("L"), None);
        assert_eq!(strip_ln_prefix("ln_E"), Some("E"));
        assert_eq!(strip_ln_prefix("lnd"), Some("d"));
    }

    #[test]
    fn test_derive() {
        let col = Column::Int(vec![0, 1, 2]);
        let out = derive("x", &col, Transform::Exp10).unwrap();
        let expected = [1.0, 10.0, 100.0];
        for (got, want) in out.as_float().unwrap().iter().zip(expected) {
            assert!((got - want).abs() < 1e-12);
        }

        let out = derive("x", &col, Transform::Identity).unwrap();
        assert!(matches!(out, Cow::Borrowed(_)));

        let text = Column::Text(vec!["a".into()]);
        assert!(matches!(
            derive("x", &text, Transform::Log10),
            Err(MesaError::NonNumericColumn { .. })
        ));
    }
}
