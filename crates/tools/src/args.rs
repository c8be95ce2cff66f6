//! Lenient argument extraction.
//!
//! Model output is loose: ids arrive as `1`, `1.0` or `"1"`, names arrive
//! with stray whitespace. These helpers normalize what can be normalized and
//! report the rest as [`ArgError`].

use minijira_core::Args;
use serde_json::Value;

/// Why an argument could not be read.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArgError {
    /// Absent, `null`, or a blank string.
    Missing(&'static str),
    /// Present but not coercible to the expected type.
    Invalid(&'static str),
}

/// An integer argument: JSON integers, integral floats, numeric strings.
pub fn int(args: &Args, key: &'static str) -> Result<i64, ArgError> {
    match args.get(key) {
        None | Some(Value::Null) => Err(ArgError::Missing(key)),
        Some(Value::Number(n)) => n
            .as_i64()
            .or_else(|| {
                n.as_f64()
                    .filter(|f| f.fract() == 0.0 && f.abs() < i64::MAX as f64)
                    .map(|f| f as i64)
            })
            .ok_or(ArgError::Invalid(key)),
        Some(Value::String(s)) if s.trim().is_empty() => Err(ArgError::Missing(key)),
        Some(Value::String(s)) => s.trim().parse().map_err(|_| ArgError::Invalid(key)),
        Some(_) => Err(ArgError::Invalid(key)),
    }
}

/// A trimmed, non-empty string argument.
pub fn string(args: &Args, key: &'static str) -> Result<String, ArgError> {
    optional_string(args, key)?.ok_or(ArgError::Missing(key))
}

/// Like [`string`], but absence is not an error.
pub fn optional_string(args: &Args, key: &'static str) -> Result<Option<String>, ArgError> {
    match args.get(key) {
        None | Some(Value::Null) => Ok(None),
        Some(Value::String(s)) => {
            let trimmed = s.trim();
            Ok((!trimmed.is_empty()).then(|| trimmed.to_string()))
        }
        Some(_) => Err(ArgError::Invalid(key)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn args(value: Value) -> Args {
        match value {
            Value::Object(map) => map,
            _ => unreachable!(),
        }
    }

    #[test]
    fn ints_are_coerced() {
        let a = args(json!({"a": 1, "b": 2.0, "c": "3", "d": " 7 "}));
        assert_eq!(int(&a, "a"), Ok(1));
        assert_eq!(int(&a, "b"), Ok(2));
        assert_eq!(int(&a, "c"), Ok(3));
        assert_eq!(int(&a, "d"), Ok(7));
    }

    #[test]
    fn bad_ints_are_classified() {
        let a = args(json!({"frac": 1.5, "word": "one", "bool": true, "null": null, "blank": " "}));
        assert_eq!(int(&a, "frac"), Err(ArgError::Invalid("frac")));
        assert_eq!(int(&a, "word"), Err(ArgError::Invalid("word")));
        assert_eq!(int(&a, "bool"), Err(ArgError::Invalid("bool")));
        assert_eq!(int(&a, "null"), Err(ArgError::Missing("null")));
        assert_eq!(int(&a, "blank"), Err(ArgError::Missing("blank")));
        assert_eq!(int(&a, "absent"), Err(ArgError::Missing("absent")));
    }

    #[test]
    fn strings_are_trimmed() {
        let a = args(json!({"name": "  Alice ", "empty": "", "num": 5}));
        assert_eq!(string(&a, "name"), Ok("Alice".into()));
        assert_eq!(string(&a, "empty"), Err(ArgError::Missing("empty")));
        assert_eq!(string(&a, "num"), Err(ArgError::Invalid("num")));
        assert_eq!(optional_string(&a, "absent"), Ok(None));
    }
}
