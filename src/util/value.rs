//! Text round-trip for record values in the edit surface.
//!
//! The editor works on text; these helpers turn fetched values into their
//! canonical text form and classify user input as a record literal, a plain
//! value, or neither.

#[cfg(test)]
#[path = "value_test.rs"]
mod tests;

use serde_json::Value;

use crate::state::record::RecordReference;

/// Classification of user-entered text.
#[derive(Clone, Debug, PartialEq)]
pub enum ParsedValue {
    Record(RecordReference),
    Value(Value),
    Invalid,
}

/// Serialize a value to its canonical text form.
#[must_use]
pub fn format_value(value: &Value, pretty: bool) -> String {
    let formatted = if pretty { serde_json::to_string_pretty(value) } else { serde_json::to_string(value) };
    formatted.unwrap_or_default()
}

/// Parse text as a record literal first, then as a JSON value.
#[must_use]
pub fn parse_value(text: &str) -> ParsedValue {
    let text = text.trim();
    if text.is_empty() {
        return ParsedValue::Invalid;
    }
    if let Ok(reference) = RecordReference::parse(text) {
        return ParsedValue::Record(reference);
    }
    serde_json::from_str(text).map_or(ParsedValue::Invalid, ParsedValue::Value)
}

/// Parse an edited record body. Only JSON objects are valid record content.
#[must_use]
pub fn validate_body(text: &str) -> Option<Value> {
    match serde_json::from_str::<Value>(text) {
        Ok(value @ Value::Object(_)) => Some(value),
        _ => None,
    }
}
