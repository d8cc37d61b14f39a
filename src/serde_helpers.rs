use std::fmt::Display;
use std::str::FromStr;

use serde::de::{Deserializer, Error};
use serde::Deserialize;

/// Feed values that are sometimes quoted and sometimes not
#[derive(Clone, Debug, Deserialize, PartialEq)]
#[serde(untagged)]
pub enum MaybeStringWrapped<T> {
    Str(String),
    Val(T),
}

impl<T: FromStr> MaybeStringWrapped<T> {
    pub fn into_inner(self) -> Result<T, T::Err> {
        match self {
            MaybeStringWrapped::Str(s) => s.trim().parse(),
            MaybeStringWrapped::Val(v) => Ok(v),
        }
    }
}

/// Numbers that may arrive as JSON strings, e.g. `"33442322"` or `33442322`
pub fn deserialize_lenient_number<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: FromStr + Deserialize<'de>,
    T::Err: Display,
{
    let wrapped: MaybeStringWrapped<T> = Deserialize::deserialize(deserializer)?;
    wrapped.into_inner().map_err(D::Error::custom)
}

/// Identifiers and labels that may arrive as JSON numbers.
/// Kept as text so they are carried through without reformatting.
pub fn deserialize_lenient_string<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    match value {
        serde_json::Value::String(s) => Ok(s),
        serde_json::Value::Number(n) => Ok(n.to_string()),
        serde_json::Value::Bool(b) => Ok(b.to_string()),
        other => Err(D::Error::custom(format!("expected string or number, got {}", other))),
    }
}

#[cfg(test)]
mod test {

    use super::*;

    #[derive(Deserialize)]
    struct Sample {
        #[serde(deserialize_with = "deserialize_lenient_number")]
        n: i64,
        #[serde(deserialize_with = "deserialize_lenient_string")]
        s: String,
    }

    #[test]
    fn test_quoted_and_bare_values() {
        let quoted: Sample = serde_json::from_str(r#"{"n": "-765174211", "s": "A1"}"#).unwrap();
        assert_eq!(quoted.n, -765174211);
        assert_eq!(quoted.s, "A1");

        let bare: Sample = serde_json::from_str(r#"{"n": 33442322, "s": 16}"#).unwrap();
        assert_eq!(bare.n, 33442322);
        assert_eq!(bare.s, "16");
    }

    #[test]
    fn test_rejects_garbage() {
        assert!(serde_json::from_str::<Sample>(r#"{"n": "abc", "s": "x"}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"n": 1, "s": null}"#).is_err());
        assert!(serde_json::from_str::<Sample>(r#"{"s": "x"}"#).is_err());
    }
}
