//! Lenient readers for stored records.
//!
//! Records written by the browser build keep form input as text: ranges are
//! `""` or `"3.5"`, ages may be `"45"`, and measurements may be bare strings.

use serde::{Deserialize, Deserializer};

#[derive(Deserialize)]
#[serde(untagged)]
enum NumberOrText {
    Number(f64),
    Text(String),
}

/// A number, a numeric string, or nothing. Blank or unparseable text is `None`.
pub(crate) fn optional_number<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<NumberOrText>::deserialize(deserializer)?;
    Ok(match raw {
        Some(NumberOrText::Number(n)) => Some(n),
        Some(NumberOrText::Text(s)) => s.trim().parse().ok(),
        None => None,
    }
    .filter(|n: &f64| n.is_finite()))
}

/// Text, or a number rendered as text.
pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) => n.to_string(),
        NumberOrText::Text(s) => s,
    })
}

/// A whole number of years, as a number or numeric string.
pub(crate) fn age<'de, D>(deserializer: D) -> Result<u32, D::Error>
where
    D: Deserializer<'de>,
{
    use serde::de::Error;

    match NumberOrText::deserialize(deserializer)? {
        NumberOrText::Number(n) if n >= 0.0 && n.fract() == 0.0 && n <= u32::MAX as f64 => {
            Ok(n as u32)
        }
        NumberOrText::Number(n) => Err(D::Error::custom(format!("invalid age: {n}"))),
        NumberOrText::Text(s) => s
            .trim()
            .parse()
            .map_err(|_| D::Error::custom(format!("invalid age: {s:?}"))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Deserialize)]
    struct Fields {
        #[serde(default, deserialize_with = "optional_number")]
        range: Option<f64>,
        #[serde(default, deserialize_with = "age")]
        age: u32,
    }

    fn read(json: &str) -> Fields {
        serde_json::from_str(json).unwrap()
    }

    #[test]
    fn test_ranges_accept_numbers_and_text() {
        assert_eq!(read(r#"{"range": 3.5}"#).range, Some(3.5));
        assert_eq!(read(r#"{"range": "3.5"}"#).range, Some(3.5));
        assert_eq!(read(r#"{"range": ""}"#).range, None);
        assert_eq!(read(r#"{"range": "n/a"}"#).range, None);
        assert_eq!(read(r#"{"range": null}"#).range, None);
        assert_eq!(read("{}").range, None);
    }

    #[test]
    fn test_age_accepts_numeric_text() {
        assert_eq!(read(r#"{"age": 45}"#).age, 45);
        assert_eq!(read(r#"{"age": "45"}"#).age, 45);
        assert!(serde_json::from_str::<Fields>(r#"{"age": ""}"#).is_err());
        assert!(serde_json::from_str::<Fields>(r#"{"age": -3}"#).is_err());
    }
}
