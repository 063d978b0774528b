//! Record identity and the view-model of the inspected record.
//!
//! SYSTEM CONTEXT
//! ==============
//! `RecordReference` is the value pushed onto the inspector history and
//! interpolated into statements as a record literal. `ActiveRecord` is the
//! projection of one fetch: it is rebuilt whenever a fetch result is applied
//! and reset to its default whenever no record is targeted.

#[cfg(test)]
#[path = "record_test.rs"]
mod tests;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Deserializer, Serialize, Serializer};
use serde_json::Value;

use crate::util::value::format_value;

/// Error returned when text is not a record literal.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid record reference: {0}")]
pub struct ParseRecordError(pub String);

/// Key part of a record reference.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RecordKey {
    Number(i64),
    String(String),
}

/// Identifies one database record: a table and a key.
#[derive(Clone, Debug, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct RecordReference {
    table: String,
    key: RecordKey,
}

impl RecordReference {
    /// # Errors
    ///
    /// Returns [`ParseRecordError`] for an empty table or string key.
    pub fn new(table: impl Into<String>, key: RecordKey) -> Result<Self, ParseRecordError> {
        let table = table.into();
        if table.is_empty() || matches!(&key, RecordKey::String(s) if s.is_empty()) {
            return Err(ParseRecordError(format!("{table}:{key:?}")));
        }
        Ok(Self { table, key })
    }

    #[must_use]
    pub fn table(&self) -> &str {
        &self.table
    }

    #[must_use]
    pub fn key(&self) -> &RecordKey {
        &self.key
    }

    /// Parse a record literal such as `person:1`, `person:tobie`,
    /// ``person:⟨a b⟩`` or `` `my table`:`x y` ``. Inside escaped parts a
    /// backslash escapes the closing delimiter or another backslash.
    ///
    /// # Errors
    ///
    /// Returns [`ParseRecordError`] when the text is not exactly one
    /// complete literal.
    pub fn parse(text: &str) -> Result<Self, ParseRecordError> {
        let invalid = || ParseRecordError(text.to_owned());
        let input = text.trim();

        let (table, rest) = split_table(input).ok_or_else(invalid)?;
        let rest = rest.strip_prefix(':').ok_or_else(invalid)?;
        let key = parse_key(rest).ok_or_else(invalid)?;

        Self::new(table, key).map_err(|_| invalid())
    }
}

fn is_ident_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || c == '_'
}

fn is_plain_ident(s: &str) -> bool {
    !s.is_empty() && s.chars().all(is_ident_char)
}

/// Read up to the unescaped `close`. Returns the unescaped content and the
/// text after the delimiter.
fn take_escaped(input: &str, close: char) -> Option<(String, &str)> {
    let mut out = String::new();
    let mut chars = input.char_indices();
    while let Some((i, c)) = chars.next() {
        match c {
            '\\' => match chars.next() {
                Some((_, next)) if next == close || next == '\\' => out.push(next),
                _ => return None,
            },
            c if c == close => return Some((out, &input[i + c.len_utf8()..])),
            c => out.push(c),
        }
    }
    None
}

fn split_table(input: &str) -> Option<(String, &str)> {
    if let Some(quoted) = input.strip_prefix('`') {
        return take_escaped(quoted, '`');
    }

    let end = input.find(|c: char| !is_ident_char(c)).unwrap_or(input.len());
    if end == 0 {
        return None;
    }
    Some((input[..end].to_owned(), &input[end..]))
}

fn parse_key(rest: &str) -> Option<RecordKey> {
    let escaped = if let Some(inner) = rest.strip_prefix('⟨') {
        Some(take_escaped(inner, '⟩')?)
    } else if let Some(inner) = rest.strip_prefix('`') {
        Some(take_escaped(inner, '`')?)
    } else {
        None
    };
    if let Some((key, trailing)) = escaped {
        return (trailing.is_empty() && !key.is_empty()).then_some(RecordKey::String(key));
    }

    if let Ok(n) = rest.parse::<i64>() {
        return Some(RecordKey::Number(n));
    }
    is_plain_ident(rest).then(|| RecordKey::String(rest.to_owned()))
}

fn write_escaped(f: &mut fmt::Formatter<'_>, text: &str, open: char, close: char) -> fmt::Result {
    use fmt::Write;

    f.write_char(open)?;
    for c in text.chars() {
        if c == close || c == '\\' {
            f.write_char('\\')?;
        }
        f.write_char(c)?;
    }
    f.write_char(close)
}

impl fmt::Display for RecordKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Number(n) => write!(f, "{n}"),
            // Digit-only strings would read back as numbers.
            Self::String(s) if is_plain_ident(s) && !s.chars().all(|c| c.is_ascii_digit()) => f.write_str(s),
            Self::String(s) => write_escaped(f, s, '⟨', '⟩'),
        }
    }
}

impl fmt::Display for RecordReference {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if is_plain_ident(&self.table) {
            f.write_str(&self.table)?;
        } else {
            write_escaped(f, &self.table, '`', '`')?;
        }
        write!(f, ":{}", self.key)
    }
}

impl FromStr for RecordReference {
    type Err = ParseRecordError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s)
    }
}

impl Serialize for RecordReference {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for RecordReference {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let text = String::deserialize(deserializer)?;
        Self::parse(&text).map_err(serde::de::Error::custom)
    }
}

// =============================================================================
// ACTIVE RECORD
// =============================================================================

/// View-model of the currently inspected record.
#[derive(Clone, Debug, Default, PartialEq)]
pub struct ActiveRecord {
    /// Whether the reference resolved to a record.
    pub exists: bool,
    /// True when the content carries both an `in` and an `out` link.
    pub is_edge: bool,
    /// Canonical serialized content at the last fetch.
    pub initial_body: String,
    /// Records linking into this one.
    pub inbound_links: Vec<RecordReference>,
    /// Records this one links out to.
    pub outbound_links: Vec<RecordReference>,
}

impl ActiveRecord {
    /// Build the view-model from the three results of one fetch batch.
    #[must_use]
    pub fn from_fetch(content: &Value, inbound: &Value, outbound: &Value, pretty: bool) -> Self {
        if !has_content(content) {
            return Self::default();
        }

        Self {
            exists: true,
            is_edge: is_truthy(content.get("in")) && is_truthy(content.get("out")),
            initial_body: format_value(content, pretty),
            inbound_links: collect_links(inbound),
            outbound_links: collect_links(outbound),
        }
    }
}

fn has_content(content: &Value) -> bool {
    match content {
        Value::Null => false,
        Value::Array(items) => !items.is_empty(),
        _ => true,
    }
}

fn is_truthy(value: Option<&Value>) -> bool {
    match value {
        None | Some(Value::Null | Value::Bool(false)) => false,
        Some(Value::Number(n)) => n.as_f64().is_some_and(|n| n != 0.0),
        Some(Value::String(s)) => !s.is_empty(),
        Some(_) => true,
    }
}

fn collect_links(value: &Value) -> Vec<RecordReference> {
    let mut links = Vec::new();
    push_links(value, &mut links);
    links
}

fn push_links(value: &Value, out: &mut Vec<RecordReference>) {
    match value {
        Value::String(text) => match RecordReference::parse(text) {
            Ok(reference) => out.push(reference),
            Err(err) => tracing::debug!(error = %err, "skipping unparsable link"),
        },
        Value::Array(items) => items.iter().for_each(|item| push_links(item, out)),
        _ => {}
    }
}
