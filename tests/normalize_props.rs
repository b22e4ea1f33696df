//! Property tests for the tolerant half of the pipeline: response parsing
//! must never panic, and normalisation must always produce a complete
//! record, whatever the model answered.

use docintel::pipeline::fields::{canonical_license_number, parse_response, StructuredFields};
use docintel::pipeline::normalize::{matches_expected_type, normalize, PLACEHOLDER};
use proptest::prelude::*;
use serde_json::json;

/// Strategy for JSON-ish values the model could plausibly put in a field.
fn scalar_value() -> impl Strategy<Value = serde_json::Value> {
    prop_oneof![
        any::<String>().prop_map(serde_json::Value::String),
        any::<i64>().prop_map(|n| json!(n)),
        any::<bool>().prop_map(serde_json::Value::Bool),
        Just(serde_json::Value::Null),
    ]
}

proptest! {
    /// Whatever string the model returns, parsing yields a mapping and
    /// normalisation yields exactly seven non-empty fields.
    #[test]
    fn any_response_normalizes_to_a_complete_record(response in ".{0,400}") {
        let fields = parse_response(&response);
        let record = normalize(&fields);

        let value = serde_json::to_value(&record).unwrap();
        let object = value.as_object().unwrap();
        prop_assert_eq!(object.len(), 7);
        for (_key, field) in object {
            let s = field.as_str().unwrap();
            prop_assert!(!s.is_empty());
            prop_assert_eq!(s.trim(), s, "normalized fields are trimmed");
        }
    }

    /// Arbitrary JSON objects (any keys, scalar values) never break
    /// construction, and unknown keys are discarded.
    #[test]
    fn arbitrary_objects_construct_cleanly(
        entries in proptest::collection::hash_map("[a-z_]{1,20}", scalar_value(), 0..10)
    ) {
        let value = serde_json::Value::Object(
            entries.into_iter().collect::<serde_json::Map<_, _>>(),
        );
        let fields = StructuredFields::from_value(&value);
        let record = normalize(&fields);
        prop_assert!(!record.name.is_empty());
        prop_assert!(!record.document_type.is_empty());
    }

    /// Normalisation is idempotent: feeding a normalized record's values
    /// back through produces the same record.
    #[test]
    fn normalize_is_idempotent(
        document_type in proptest::option::of(".{0,40}"),
        name in proptest::option::of(".{0,40}"),
        license in proptest::option::of(".{0,40}"),
    ) {
        let first = normalize(&StructuredFields {
            document_type,
            name,
            license_number: license,
            ..StructuredFields::default()
        });
        let second = normalize(&StructuredFields {
            document_type: Some(first.document_type.clone()),
            name: Some(first.name.clone()),
            date_of_birth: Some(first.date_of_birth.clone()),
            license_number: Some(first.license_number.clone()),
            issue_date: Some(first.issue_date.clone()),
            expiry_date: Some(first.expiry_date.clone()),
            address: Some(first.address.clone()),
        });
        prop_assert_eq!(first, second);
    }

    /// Canonical license numbers contain only uppercase letters and digits.
    #[test]
    fn canonical_license_is_uppercase_alphanumeric(raw in ".{0,60}") {
        let canonical = canonical_license_number(&raw);
        prop_assert!(canonical.chars().all(|c| c.is_ascii_uppercase() || c.is_ascii_digit()));
    }

    /// A placeholder document type never matches any expected-type token.
    #[test]
    fn placeholder_type_never_matches(token in "[a-zA-Z]{1,20}") {
        let record = normalize(&StructuredFields::default());
        prop_assert_eq!(record.document_type, PLACEHOLDER);
        let record = normalize(&StructuredFields::default());
        prop_assert!(!matches_expected_type(&record, &token));
    }
}
