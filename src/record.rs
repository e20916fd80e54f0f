// 📄 Transaction Record - one row of the failed-transactions table
// Column order is preserved so details and fix reports read like the source row

use serde::ser::{Serialize, SerializeMap, Serializer};
use std::fmt;

// ============================================================================
// SCHEMA
// ============================================================================

pub const TRANSACTION_ID: &str = "transaction_id";
pub const ERROR_CODE: &str = "error_code";

/// Demographic and policy fields every enrollment transaction must carry.
/// Order matters: diagnostics list missing fields in this order.
pub const REQUIRED_FIELDS: [&str; 8] = [
    "member_id",
    "first_name",
    "last_name",
    "date_of_birth",
    "ssn",
    "address",
    "policy_number",
    "enrollment_date",
];

// ============================================================================
// TRANSACTION RECORD
// ============================================================================

/// A failed transaction as loaded from the source table.
///
/// Every column is kept, in source order, as `(column, value)`. A value of
/// `None` means the cell was absent; present values are kept verbatim.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct TransactionRecord {
    fields: Vec<(String, Option<String>)>,
}

impl TransactionRecord {
    pub fn new(fields: Vec<(String, Option<String>)>) -> Self {
        TransactionRecord { fields }
    }

    /// Build a record from `(column, value)` pairs
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, Option<V>)>,
        K: Into<String>,
        V: Into<String>,
    {
        TransactionRecord {
            fields: pairs
                .into_iter()
                .map(|(k, v)| (k.into(), v.map(Into::into)))
                .collect(),
        }
    }

    /// Value of a column. Absent cells and unknown columns both yield `None`.
    pub fn get(&self, column: &str) -> Option<&str> {
        self.fields
            .iter()
            .find(|(name, _)| name == column)
            .and_then(|(_, value)| value.as_deref())
    }

    pub fn transaction_id(&self) -> Option<&str> {
        self.get(TRANSACTION_ID)
    }

    /// Error code as text; an absent code renders as an empty string
    pub fn error_code(&self) -> &str {
        self.get(ERROR_CODE).unwrap_or("")
    }

    /// Column names in source order
    pub fn columns(&self) -> impl Iterator<Item = &str> {
        self.fields.iter().map(|(name, _)| name.as_str())
    }

    pub fn fields(&self) -> &[(String, Option<String>)] {
        &self.fields
    }

    /// Derived copy with `column` set to `value`.
    /// Unknown columns are appended at the end.
    pub fn with_value(&self, column: &str, value: impl Into<String>) -> TransactionRecord {
        let mut next = self.clone();
        let value = Some(value.into());

        match next.fields.iter_mut().find(|(name, _)| name == column) {
            Some((_, slot)) => *slot = value,
            None => next.fields.push((column.to_string(), value)),
        }

        next
    }

    /// Required fields that are absent or blank, in `REQUIRED_FIELDS` order
    pub fn missing_fields(&self) -> Vec<&'static str> {
        REQUIRED_FIELDS
            .iter()
            .copied()
            .filter(|field| is_missing(self.get(field)))
            .collect()
    }

    /// Whether the record has a usable transaction id
    pub fn has_transaction_id(&self) -> bool {
        !is_missing(self.transaction_id())
    }

    /// The record as a JSON object; absent values become `null`
    pub fn to_json(&self) -> serde_json::Value {
        let map: serde_json::Map<String, serde_json::Value> = self
            .fields
            .iter()
            .map(|(name, value)| {
                let value = match value {
                    Some(v) => serde_json::Value::String(v.clone()),
                    None => serde_json::Value::Null,
                };
                (name.clone(), value)
            })
            .collect();
        serde_json::Value::Object(map)
    }
}

impl fmt::Display for TransactionRecord {
    /// Renders as a field→value mapping, e.g. `{"transaction_id": "1001", "ssn": null}`
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{{")?;
        for (i, (name, value)) in self.fields.iter().enumerate() {
            if i > 0 {
                write!(f, ", ")?;
            }
            let rendered = match value {
                Some(v) => serde_json::Value::String(v.clone()),
                None => serde_json::Value::Null,
            };
            write!(f, "{}: {}", serde_json::Value::String(name.clone()), rendered)?;
        }
        write!(f, "}}")
    }
}

impl Serialize for TransactionRecord {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut map = serializer.serialize_map(Some(self.fields.len()))?;
        for (name, value) in &self.fields {
            map.serialize_entry(name, value)?;
        }
        map.end()
    }
}

// ============================================================================
// FIELD HELPERS
// ============================================================================

/// A value is missing when absent or blank after trimming
pub fn is_missing(value: Option<&str>) -> bool {
    match value {
        None => true,
        Some(v) => v.trim().is_empty(),
    }
}

/// Cell texts that spreadsheet and dataframe exports use for "no value".
/// Matched exactly and case-sensitively, so `none` or `Null` stay as text.
pub const NA_TOKENS: [&str; 19] = [
    "", "#N/A", "#N/A N/A", "#NA", "-1.#IND", "-1.#QNAN", "-NaN", "-nan", "1.#IND", "1.#QNAN",
    "<NA>", "N/A", "NA", "NULL", "NaN", "None", "n/a", "nan", "null",
];

/// Interpret a raw CSV cell: empty cells and NA tokens are absent values
pub fn cell_value(raw: &str) -> Option<String> {
    if NA_TOKENS.contains(&raw) {
        None
    } else {
        Some(raw.to_string())
    }
}

/// Canonical form of a transaction identifier.
///
/// Identifiers are compared as strings, but numeric-looking ids match their
/// integer text: `"123"`, `" 123 "`, `"+123"`, `"0123"` and `"123.0"` all
/// normalize to `"123"`. Anything else is just trimmed.
pub fn normalize_id(raw: &str) -> String {
    let trimmed = raw.trim();

    if let Ok(n) = trimmed.parse::<i64>() {
        return n.to_string();
    }

    if let Ok(n) = trimmed.parse::<f64>() {
        // Beyond 2^53 floats no longer name a single integer
        if n.is_finite() && n.fract() == 0.0 && n.abs() < 9.0e15 {
            return (n as i64).to_string();
        }
    }

    trimmed.to_string()
}

// ============================================================================
// TESTS
// ============================================================================
