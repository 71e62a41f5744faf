//! The store's weakly typed attribute value
//!
//! Every attribute of a record holds one `StorageValue`. A missing attribute
//! reads as `Null`.
//!
//! Ordering is defined within a family only:
//! - integers of every width and doubles compare numerically
//! - strings lexicographically, dates chronologically
//! - booleans false < true, UUIDs and record ids bytewise
//!
//! Values of different families are incomparable.

use std::cmp::Ordering;
use std::fmt;

use chrono::{DateTime, SecondsFormat, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::record::RecordId;

/// A primitive value as held by the store
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", content = "value", rename_all = "snake_case")]
pub enum StorageValue {
    Null,
    Bool(bool),
    Int16(i16),
    Int32(i32),
    Int64(i64),
    Double(f64),
    String(String),
    Binary(Vec<u8>),
    Date(DateTime<Utc>),
    Uuid(Uuid),
    /// To-one relationship
    Reference(RecordId),
    /// Ordered to-many relationship
    References(Vec<RecordId>),
}

impl Default for StorageValue {
    fn default() -> Self {
        StorageValue::Null
    }
}

impl StorageValue {
    /// Returns true for `Null`
    pub fn is_null(&self) -> bool {
        matches!(self, StorageValue::Null)
    }

    /// Returns the kind name for error messages
    pub fn type_name(&self) -> &'static str {
        match self {
            StorageValue::Null => "null",
            StorageValue::Bool(_) => "bool",
            StorageValue::Int16(_) => "int16",
            StorageValue::Int32(_) => "int32",
            StorageValue::Int64(_) => "int64",
            StorageValue::Double(_) => "double",
            StorageValue::String(_) => "string",
            StorageValue::Binary(_) => "binary",
            StorageValue::Date(_) => "date",
            StorageValue::Uuid(_) => "uuid",
            StorageValue::Reference(_) => "reference",
            StorageValue::References(_) => "references",
        }
    }

    fn as_integer(&self) -> Option<i64> {
        match self {
            StorageValue::Int16(v) => Some(i64::from(*v)),
            StorageValue::Int32(v) => Some(i64::from(*v)),
            StorageValue::Int64(v) => Some(*v),
            _ => None,
        }
    }

    /// Numeric view of integer and double values
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            StorageValue::Double(v) => Some(*v),
            other => other.as_integer().map(|v| v as f64),
        }
    }

    /// String view of string values
    pub fn as_str(&self) -> Option<&str> {
        match self {
            StorageValue::String(s) => Some(s),
            _ => None,
        }
    }

    /// Compares two values of the same family.
    ///
    /// Returns `None` for incomparable pairs (different families, NaN,
    /// binaries and reference lists). Two nulls compare equal.
    pub fn compare(&self, other: &StorageValue) -> Option<Ordering> {
        use StorageValue::*;

        if let (Some(a), Some(b)) = (self.as_integer(), other.as_integer()) {
            return Some(a.cmp(&b));
        }
        if let (Some(a), Some(b)) = (self.as_f64(), other.as_f64()) {
            return a.partial_cmp(&b);
        }

        match (self, other) {
            (Null, Null) => Some(Ordering::Equal),
            (Bool(a), Bool(b)) => Some(a.cmp(b)),
            (String(a), String(b)) => Some(a.cmp(b)),
            (Date(a), Date(b)) => Some(a.cmp(b)),
            (Uuid(a), Uuid(b)) => Some(a.cmp(b)),
            (Reference(a), Reference(b)) => Some(a.cmp(b)),
            _ => None,
        }
    }

    /// Value equality across integer widths and doubles
    pub fn matches(&self, other: &StorageValue) -> bool {
        match (self, other) {
            (StorageValue::Binary(a), StorageValue::Binary(b)) => a == b,
            (StorageValue::References(a), StorageValue::References(b)) => a == b,
            _ => self.compare(other) == Some(Ordering::Equal),
        }
    }

    /// Renders the value as a predicate literal: strings quoted and escaped,
    /// numbers in their shortest decimal form.
    pub fn literal(&self) -> String {
        match self {
            StorageValue::String(s) => quote(s),
            StorageValue::Date(d) => format!(
                "CAST({}, \"Date\")",
                quote(&d.to_rfc3339_opts(SecondsFormat::AutoSi, true))
            ),
            StorageValue::Uuid(u) => quote(&u.to_string()),
            StorageValue::Reference(id) => quote(&id.to_string()),
            StorageValue::References(ids) => {
                let items: Vec<String> = ids.iter().map(|id| quote(&id.to_string())).collect();
                format!("{{{}}}", items.join(", "))
            }
            other => other.to_string(),
        }
    }
}

fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

/// Plain rendering, used in messages: strings are not quoted
impl fmt::Display for StorageValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            StorageValue::Null => write!(f, "nil"),
            StorageValue::Bool(v) => write!(f, "{}", v),
            StorageValue::Int16(v) => write!(f, "{}", v),
            StorageValue::Int32(v) => write!(f, "{}", v),
            StorageValue::Int64(v) => write!(f, "{}", v),
            StorageValue::Double(v) => write!(f, "{}", v),
            StorageValue::String(v) => write!(f, "{}", v),
            StorageValue::Binary(bytes) => {
                write!(f, "<")?;
                for byte in bytes {
                    write!(f, "{:02x}", byte)?;
                }
                write!(f, ">")
            }
            StorageValue::Date(d) => write!(f, "{}", d.to_rfc3339()),
            StorageValue::Uuid(u) => write!(f, "{}", u),
            StorageValue::Reference(id) => write!(f, "{}", id),
            StorageValue::References(ids) => write!(f, "{} references", ids.len()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_numeric_families_compare() {
        assert_eq!(
            StorageValue::Int16(10).compare(&StorageValue::Int64(10)),
            Some(Ordering::Equal)
        );
        assert_eq!(
            StorageValue::Int32(3).compare(&StorageValue::Double(3.5)),
            Some(Ordering::Less)
        );
        assert!(StorageValue::Int64(10).matches(&StorageValue::Double(10.0)));
    }

    #[test]
    fn test_cross_family_incomparable() {
        assert_eq!(
            StorageValue::String("10".into()).compare(&StorageValue::Int64(10)),
            None
        );
        assert!(!StorageValue::Bool(true).matches(&StorageValue::Int16(1)));
        assert_eq!(StorageValue::Double(f64::NAN).compare(&StorageValue::Double(1.0)), None);
    }

    #[test]
    fn test_literal_rendering() {
        assert_eq!(StorageValue::String("Donald".into()).literal(), "\"Donald\"");
        assert_eq!(StorageValue::Double(20.0).literal(), "20");
        assert_eq!(StorageValue::Double(10.5).literal(), "10.5");
        assert_eq!(StorageValue::Int16(-3).literal(), "-3");
        assert_eq!(StorageValue::Null.literal(), "nil");
        assert_eq!(
            StorageValue::String("say \"hi\"".into()).literal(),
            "\"say \\\"hi\\\"\""
        );
    }

    #[test]
    fn test_display_is_unquoted() {
        assert_eq!(StorageValue::String("Donald".into()).to_string(), "Donald");
        assert_eq!(StorageValue::Binary(vec![0xab, 0x01]).to_string(), "<ab01>");
    }

    #[test]
    fn test_serde_tagged() {
        let json = serde_json::to_string(&StorageValue::Int16(7)).unwrap();
        assert_eq!(json, r#"{"type":"int16","value":7}"#);
        let back: StorageValue = serde_json::from_str(&json).unwrap();
        assert_eq!(back, StorageValue::Int16(7));
    }
}
