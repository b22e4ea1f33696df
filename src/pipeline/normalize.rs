//! Result normalisation: partial field mapping to the canonical record.
//!
//! [`normalize`] is a pure, total function: it cannot fail, performs no
//! I/O, and for *any* input (including the empty mapping) produces a record
//! with exactly the seven canonical fields, each holding either a meaningful
//! value or the `"-"` placeholder. Callers can therefore render the record
//! unconditionally; absence is a value, never a missing key.

use crate::pipeline::fields::StructuredFields;
use serde::{Deserialize, Serialize};

/// Sentinel substituted for any missing or unresolvable field.
pub const PLACEHOLDER: &str = "-";

/// The canonical extracted record returned to callers. Every field is always
/// present in serialised output.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LicenseRecord {
    pub document_type: String,
    pub name: String,
    pub date_of_birth: String,
    pub license_number: String,
    pub issue_date: String,
    pub expiry_date: String,
    pub address: String,
}

impl LicenseRecord {
    /// A record with every field set to the placeholder.
    pub fn placeholder() -> Self {
        Self {
            document_type: PLACEHOLDER.into(),
            name: PLACEHOLDER.into(),
            date_of_birth: PLACEHOLDER.into(),
            license_number: PLACEHOLDER.into(),
            issue_date: PLACEHOLDER.into(),
            expiry_date: PLACEHOLDER.into(),
            address: PLACEHOLDER.into(),
        }
    }
}

/// Map a loosely structured mapping onto the canonical record, substituting
/// the placeholder for every absent or blank field.
pub fn normalize(fields: &StructuredFields) -> LicenseRecord {
    LicenseRecord {
        document_type: or_placeholder(&fields.document_type),
        name: or_placeholder(&fields.name),
        date_of_birth: or_placeholder(&fields.date_of_birth),
        license_number: or_placeholder(&fields.license_number),
        issue_date: or_placeholder(&fields.issue_date),
        expiry_date: or_placeholder(&fields.expiry_date),
        address: or_placeholder(&fields.address),
    }
}

/// Case-insensitive substring match of the record's `document_type` against
/// the expected-type token. A placeholder type never matches; callers treat
/// that as "not the expected document", a warning rather than an error.
pub fn matches_expected_type(record: &LicenseRecord, token: &str) -> bool {
    if record.document_type == PLACEHOLDER {
        return false;
    }
    record
        .document_type
        .to_lowercase()
        .contains(&token.to_lowercase())
}

fn or_placeholder(value: &Option<String>) -> String {
    match value {
        Some(s) if !s.trim().is_empty() => s.trim().to_string(),
        _ => PLACEHOLDER.to_string(),
    }
}
