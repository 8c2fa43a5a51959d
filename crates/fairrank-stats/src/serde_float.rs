//! Serde helpers for floats that may be infinite.
//!
//! JSON has no representation for `inf` or `NaN`, and `serde_json` writes them
//! as `null`, which cannot be read back into an `f64`. Use with
//! `#[serde(with = "fairrank_stats::serde_float")]`: finite values stay plain
//! numbers, non-finite values become the strings `"inf"`, `"-inf"` and `"nan"`.
//!
//! ```
//! use serde::{Deserialize, Serialize};
//!
//! #[derive(Debug, PartialEq, Serialize, Deserialize)]
//! struct Statistic {
//!     #[serde(with = "fairrank_stats::serde_float")]
//!     t: f64,
//! }
//!
//! let json = serde_json::to_string(&Statistic { t: f64::NEG_INFINITY }).unwrap();
//! assert_eq!(json, r#"{"t":"-inf"}"#);
//! let back: Statistic = serde_json::from_str(&json).unwrap();
//! assert_eq!(back.t, f64::NEG_INFINITY);
//! ```

use serde::{Deserialize, Deserializer, Serializer, de::Error as _};

#[derive(Deserialize)]
#[serde(untagged)]
enum Repr {
    Number(f64),
    Text(String),
}

#[allow(clippy::trivially_copy_pass_by_ref)]
pub fn serialize<S>(value: &f64, serializer: S) -> Result<S::Ok, S::Error>
where
    S: Serializer,
{
    if value.is_finite() {
        serializer.serialize_f64(*value)
    } else if value.is_nan() {
        serializer.serialize_str("nan")
    } else if value.is_sign_positive() {
        serializer.serialize_str("inf")
    } else {
        serializer.serialize_str("-inf")
    }
}

pub fn deserialize<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    match Repr::deserialize(deserializer)? {
        Repr::Number(value) => Ok(value),
        Repr::Text(text) => match text.as_str() {
            "inf" => Ok(f64::INFINITY),
            "-inf" => Ok(f64::NEG_INFINITY),
            "nan" => Ok(f64::NAN),
            other => Err(D::Error::custom(format!(
                "expected a number, \"inf\", \"-inf\" or \"nan\", got {other:?}"
            ))),
        },
    }
}
