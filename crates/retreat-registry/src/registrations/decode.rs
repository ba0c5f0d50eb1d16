//! Forgiving field decoders for registry documents.
//!
//! Scalar fields take whatever the data layer stored: flags follow JSON
//! truthiness, amounts accept numeric strings, and `null` reads as absent.
//! List entries decode one at a time so a single malformed rule, condition,
//! or record is dropped or neutralised instead of failing its whole document.

use std::collections::BTreeMap;

use chrono::{DateTime, NaiveDate};
use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer};
use serde_json::Value;
use tracing::warn;

use super::domain::{truthy, value_number, value_text};

pub(crate) fn flag<'de, D>(deserializer: D) -> Result<bool, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(truthy(&Value::deserialize(deserializer)?))
}

pub(crate) fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_number(&Value::deserialize(deserializer)?).unwrap_or(0.0))
}

pub(crate) fn text<'de, D>(deserializer: D) -> Result<String, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(&Value::deserialize(deserializer)?).unwrap_or_default())
}

pub(crate) fn optional_text<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(&Value::deserialize(deserializer)?).filter(|text| !text.trim().is_empty()))
}

/// Calendar date from a plain date or any RFC 3339 timestamp; anything else
/// reads as unknown.
pub(crate) fn optional_date<'de, D>(deserializer: D) -> Result<Option<NaiveDate>, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(value_text(&Value::deserialize(deserializer)?).and_then(|raw| parse_date(&raw)))
}

fn parse_date(raw: &str) -> Option<NaiveDate> {
    let trimmed = raw.trim();
    if let Ok(date) = NaiveDate::parse_from_str(trimmed, "%Y-%m-%d") {
        return Some(date);
    }
    DateTime::parse_from_rfc3339(trimmed)
        .ok()
        .map(|timestamp| timestamp.date_naive())
}

/// Container fields where `null` means "nothing recorded".
pub(crate) fn nullable<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

pub(crate) fn flag_map<'de, D>(deserializer: D) -> Result<IndexMap<String, bool>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<IndexMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|(key, value)| (key, truthy(&value)))
        .collect())
}

pub(crate) fn text_map<'de, D>(deserializer: D) -> Result<BTreeMap<String, String>, D::Error>
where
    D: Deserializer<'de>,
{
    let entries = Option::<BTreeMap<String, Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|(key, value)| value_text(&value).map(|text| (key, text)))
        .collect())
}

/// Decodes each entry on its own; entries that do not fit become
/// `T::default()`.
pub(crate) fn each_or_default<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .map(|entry| {
            serde_json::from_value(entry).unwrap_or_else(|error| {
                warn!(%error, "malformed entry neutralised");
                T::default()
            })
        })
        .collect())
}

/// Decodes each entry on its own and drops the ones that do not fit.
pub(crate) fn skip_malformed<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned,
{
    let entries = Option::<Vec<Value>>::deserialize(deserializer)?.unwrap_or_default();
    Ok(entries
        .into_iter()
        .filter_map(|entry| match serde_json::from_value(entry) {
            Ok(decoded) => Some(decoded),
            Err(error) => {
                warn!(%error, "malformed entry skipped");
                None
            }
        })
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "flag")]
        flag: bool,
        #[serde(default, deserialize_with = "amount")]
        amount: f64,
        #[serde(default, deserialize_with = "optional_date")]
        date: Option<NaiveDate>,
        #[serde(default, deserialize_with = "flag_map")]
        picks: IndexMap<String, bool>,
    }

    fn sample(value: Value) -> Sample {
        serde_json::from_value(value).expect("sample decodes")
    }

    #[test]
    fn flags_follow_truthiness() {
        assert!(!sample(serde_json::json!({ "flag": null })).flag);
        assert!(sample(serde_json::json!({ "flag": 1 })).flag);
        assert!(sample(serde_json::json!({ "flag": "yes" })).flag);
        assert!(!sample(serde_json::json!({})).flag);
    }

    #[test]
    fn amounts_accept_numeric_strings() {
        assert_eq!(sample(serde_json::json!({ "amount": "100" })).amount, 100.0);
        assert_eq!(sample(serde_json::json!({ "amount": " 12.5 " })).amount, 12.5);
        assert_eq!(sample(serde_json::json!({ "amount": "n/a" })).amount, 0.0);
        assert_eq!(sample(serde_json::json!({ "amount": null })).amount, 0.0);
    }

    #[test]
    fn dates_accept_timestamps() {
        let expected = NaiveDate::from_ymd_opt(2025, 7, 5);
        assert_eq!(sample(serde_json::json!({ "date": "2025-07-05" })).date, expected);
        assert_eq!(
            sample(serde_json::json!({ "date": "2025-07-05T09:00:00Z" })).date,
            expected
        );
        assert_eq!(sample(serde_json::json!({ "date": "next summer" })).date, None);
    }

    #[test]
    fn flag_maps_keep_order_and_tolerate_null() {
        let picks = sample(serde_json::json!({ "picks": { "b": 1, "a": null, "c": true } })).picks;
        assert_eq!(
            picks.into_iter().collect::<Vec<_>>(),
            vec![
                ("b".to_string(), true),
                ("a".to_string(), false),
                ("c".to_string(), true)
            ]
        );
        assert!(sample(serde_json::json!({ "picks": null })).picks.is_empty());
    }
}
