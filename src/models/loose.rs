//! Lenient field deserializers for records written by older front-ends.
//!
//! Identifiers arrive as strings or numbers and amounts as numbers or
//! numeric strings. Anything else (null, blank, objects) becomes `None`.
//! Lists may be written as `null`.

use serde::{Deserialize, Deserializer};
use serde_json::Value;

use super::InvoiceStatus;

/// Deserializes an optional identifier or label from a string or number.
pub(crate) fn opt_string<'de, D>(deserializer: D) -> Result<Option<String>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(match value {
        Some(Value::String(text)) if !text.trim().is_empty() => Some(text),
        Some(Value::Number(num)) => Some(num.to_string()),
        Some(_) | None => None,
    })
}

/// Deserializes an optional amount from a number or numeric string.
pub(crate) fn opt_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    Ok(value.as_ref().and_then(amount_from_value))
}

/// Deserializes an amount that defaults to zero when absent or malformed.
pub(crate) fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    opt_amount(deserializer).map(|parsed| parsed.unwrap_or(0.0_f64))
}

/// Deserializes a list that may be stored as `null`.
pub(crate) fn list<'de, D, T>(deserializer: D) -> Result<Vec<T>, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de>,
{
    Option::<Vec<T>>::deserialize(deserializer).map(Option::unwrap_or_default)
}

/// Deserializes a payment status label, reading unknown labels
/// (`"Overdue"`, `"Draft"`, null) as `Pending`.
pub(crate) fn status<'de, D>(deserializer: D) -> Result<InvoiceStatus, D::Error>
where
    D: Deserializer<'de>,
{
    let value = Option::<Value>::deserialize(deserializer)?;
    let label = value
        .as_ref()
        .and_then(Value::as_str)
        .map(str::trim)
        .unwrap_or_default()
        .to_ascii_lowercase();
    Ok(match label.as_str() {
        "paid" => InvoiceStatus::Paid,
        "partial" | "partially paid" => InvoiceStatus::Partial,
        _ => InvoiceStatus::Pending,
    })
}

/// Extracts a finite amount from a JSON value.
fn amount_from_value(value: &Value) -> Option<f64> {
    let parsed = match *value {
        Value::Number(ref num) => num.as_f64(),
        Value::String(ref text) => text.trim().parse::<f64>().ok(),
        Value::Null | Value::Bool(_) | Value::Array(_) | Value::Object(_) => None,
    };
    parsed.filter(|amount| amount.is_finite())
}

#[cfg(test)]
mod tests {
    use serde::Deserialize;

    /// Record exercising each helper.
    #[derive(Debug, Deserialize)]
    struct Sample {
        /// Identifier.
        #[serde(default, deserialize_with = "super::opt_string")]
        id: Option<String>,
        /// Optional amount.
        #[serde(default, deserialize_with = "super::opt_amount")]
        tax: Option<f64>,
        /// Defaulted amount.
        #[serde(default, deserialize_with = "super::amount")]
        total: f64,
        /// Nullable list.
        #[serde(default, deserialize_with = "super::list")]
        tags: Vec<String>,
    }

    #[test]
    fn numeric_id_becomes_string() {
        let sample: Sample = serde_json::from_str(r#"{"id": 42}"#).unwrap();
        assert_eq!(sample.id.as_deref(), Some("42"));
    }

    #[test]
    fn blank_id_is_none() {
        let sample: Sample = serde_json::from_str(r#"{"id": "   "}"#).unwrap();
        assert!(sample.id.is_none());
    }

    #[test]
    fn numeric_string_amount_parses() {
        let sample: Sample = serde_json::from_str(r#"{"tax": "1500.5", "total": "3000"}"#).unwrap();
        assert_eq!(sample.tax, Some(1500.5));
        assert!((sample.total - 3000.0).abs() < f64::EPSILON);
    }

    #[test]
    fn garbage_amount_is_none_and_total_defaults() {
        let sample: Sample = serde_json::from_str(r#"{"tax": "n/a", "total": null}"#).unwrap();
        assert!(sample.tax.is_none());
        assert!(sample.total.abs() < f64::EPSILON);
    }

    #[test]
    fn missing_fields_default() {
        let sample: Sample = serde_json::from_str("{}").unwrap();
        assert!(sample.id.is_none());
        assert!(sample.tax.is_none());
        assert!(sample.tags.is_empty());
    }

    #[test]
    fn null_list_is_empty() {
        let sample: Sample = serde_json::from_str(r#"{"tags": null}"#).unwrap();
        assert!(sample.tags.is_empty());
        let filled: Sample = serde_json::from_str(r#"{"tags": ["a"]}"#).unwrap();
        assert_eq!(filled.tags, ["a"]);
    }
}
