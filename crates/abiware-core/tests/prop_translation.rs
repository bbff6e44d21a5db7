//! Property-based tests for composite field decoding and body assembly
//!
//! These tests verify invariants that should hold for any inbound string,
//! not just the hand-picked cases of the unit tests.

use abiware_core::translation::{
    build_case_body, split_composite, CONTACT_FIELDS, CONTACT_SCHEMA, DELIMITER,
    DOSSIER_SCHEMA, USER_REQUEST_SCHEMA,
};
use abiware_core::{Error, InboundPayload};
use proptest::prelude::*;
use serde_json::Value;

// Strategy functions for property testing

/// A sub-value as a caller would type it: no delimiter, no surrounding
/// whitespace, possibly with dots
fn word_strategy() -> impl Strategy<Value = String> {
    "[A-Za-z0-9éè][A-Za-z0-9éè .,/-]{0,12}[A-Za-z0-9éè.]"
}

/// One slot per dossier position, `None` meaning an empty slot
fn dossier_slots_strategy() -> impl Strategy<Value = Vec<Option<String>>> {
    proptest::collection::vec(proptest::option::of(word_strategy()), 0..=9)
}

/// A complete contact string for `kind`
fn contact_strategy(kind: &'static str) -> impl Strategy<Value = String> {
    proptest::collection::vec(proptest::option::of(word_strategy()), 10..=12).prop_map(
        move |rest| {
            std::iter::once(kind.to_string())
                .chain(rest.into_iter().map(Option::unwrap_or_default))
                .collect::<Vec<_>>()
                .join(DELIMITER)
        },
    )
}

/// A subset of the contact groups in arbitrary order
fn contact_groups_strategy() -> impl Strategy<Value = Vec<&'static str>> {
    proptest::sample::subsequence(CONTACT_FIELDS.to_vec(), 0..=CONTACT_FIELDS.len())
        .prop_shuffle()
}

fn join_slots(slots: &[Option<String>]) -> String {
    slots
        .iter()
        .map(|slot| slot.as_deref().unwrap_or(""))
        .collect::<Vec<_>>()
        .join(DELIMITER)
}

proptest! {
    /// Property: dossier and request groups decode any string without error
    #[test]
    fn prop_optional_groups_never_fail(raw in ".{0,200}") {
        prop_assert!(DOSSIER_SCHEMA.decode("dossier_data", &raw).is_ok());
        prop_assert!(USER_REQUEST_SCHEMA.decode("user_request", &raw).is_ok());
    }

    /// Property: decoded values are never empty, never padded and never
    /// split again
    #[test]
    fn prop_decoded_values_are_trimmed_and_non_empty(raw in "[a-z .|]{0,80}") {
        for schema in [DOSSIER_SCHEMA, USER_REQUEST_SCHEMA] {
            let decoded = schema.decode(schema.name, &raw).unwrap();
            for value in decoded.values() {
                let value = value.as_str().unwrap();
                prop_assert!(!value.is_empty());
                prop_assert_eq!(value, value.trim());
                prop_assert_eq!(split_composite(value), vec![value]);
            }
        }
    }

    /// Property: exactly the filled positions come out, and only the
    /// coordinates are rewritten
    #[test]
    fn prop_dossier_keeps_filled_positions(slots in dossier_slots_strategy()) {
        let decoded = DOSSIER_SCHEMA.decode("dossier_data", &join_slots(&slots)).unwrap();

        let filled = slots.iter().filter(|slot| slot.is_some()).count();
        prop_assert_eq!(decoded.len(), filled);

        for (entry, slot) in DOSSIER_SCHEMA.fields.iter().zip(&slots) {
            match slot {
                None => prop_assert!(!decoded.contains_key(entry.attribute)),
                Some(word) => {
                    let expected = if entry.transform.is_some() {
                        word.replace('.', ",")
                    } else {
                        word.clone()
                    };
                    prop_assert_eq!(&decoded[entry.attribute], &Value::String(expected));
                }
            }
        }
    }

    /// Property: a contact decodes if and only if positions 0 to 10 exist
    #[test]
    fn prop_contact_requires_eleven_positions(
        slots in proptest::collection::vec(word_strategy(), 1..=13)
    ) {
        let raw = slots.join(DELIMITER);
        match CONTACT_SCHEMA.decode("contact_contact", &raw) {
            Ok(contact) => {
                prop_assert!(slots.len() >= 11);
                prop_assert_eq!(contact.len(), slots.len());
            }
            Err(Error::IncompleteField { required, actual, .. }) => {
                prop_assert!(slots.len() < 11);
                prop_assert_eq!(required, 11);
                prop_assert_eq!(actual, slots.len());
            }
            Err(other) => prop_assert!(false, "unexpected error: {}", other),
        }
    }

    /// Property: decoding the encoded form of a decoded map is stable
    #[test]
    fn prop_encode_decode_is_stable(slots in dossier_slots_strategy()) {
        let decoded = USER_REQUEST_SCHEMA.decode("user_request", &join_slots(&slots)).unwrap();
        let reencoded = USER_REQUEST_SCHEMA.encode(&decoded);
        prop_assert_eq!(USER_REQUEST_SCHEMA.decode("user_request", &reencoded).unwrap(), decoded);
    }

    /// Property: contacts appear in the order their groups appear in the
    /// payload, one per group
    #[test]
    fn prop_contacts_follow_payload_order(
        groups in contact_groups_strategy(),
        seed_contact in contact_strategy("physical")
    ) {
        let mut payload = InboundPayload::new()
            .with("dossier_data", "Maison")
            .with("user_request", "REF1");
        for group in &groups {
            // Tag each contact with its group name in the type position
            let tagged = seed_contact.replacen("physical", group, 1);
            payload.insert(*group, tagged);
        }

        let body = build_case_body(&payload).unwrap();
        let types: Vec<&str> = body
            .contacts
            .iter()
            .map(|contact| contact["type"].as_str().unwrap())
            .collect();
        prop_assert_eq!(types, groups);
    }
}
