//! Assembly of the case request body from an inbound payload

use serde_json::{Map, Value};
use tracing::debug;

use super::schema::{FieldSchema, CONTACT_SCHEMA, DOSSIER_SCHEMA, USER_REQUEST_SCHEMA};
use crate::types::json_type;
use crate::{CaseRequestBody, Error, InboundPayload, Result};

/// Top-level keys copied verbatim into the case body
pub const GENERAL_FIELDS: [&str; 4] = [
    "partnerExternalId",
    "dossierExternalId",
    "zoneExternalId",
    "dossierCode",
];

/// Inbound field group holding the dossier location
pub const DOSSIER_FIELD: &str = "dossier_data";

/// Inbound field group holding the user request
pub const USER_REQUEST_FIELD: &str = "user_request";

/// Inbound field groups that each encode one contact
pub const CONTACT_FIELDS: [&str; 4] = [
    "contact_contact",
    "contact_demandeur",
    "contact_facturation",
    "contact_proprietaire",
];

/// Build the body for `dossiers/request`.
///
/// `dossier_data` and `user_request` must be present. Contacts are decoded
/// in the order their groups appear in `payload`.
pub fn build_case_body(payload: &InboundPayload) -> Result<CaseRequestBody> {
    let general = general_fields(payload);
    let dossier = decode_group(payload, DOSSIER_FIELD, &DOSSIER_SCHEMA)?;
    let request = decode_group(payload, USER_REQUEST_FIELD, &USER_REQUEST_SCHEMA)?;
    let contacts = decode_contacts(payload)?;

    debug!(
        general = general.len(),
        dossier = dossier.len(),
        request = request.len(),
        contacts = contacts.len(),
        "Case body assembled"
    );

    Ok(CaseRequestBody {
        general,
        dossier,
        request,
        contacts,
    })
}

/// Allow-listed general keys, in payload order
pub fn general_fields(payload: &InboundPayload) -> Map<String, Value> {
    payload
        .iter()
        .filter(|(key, _)| GENERAL_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| (key.clone(), value.clone()))
        .collect()
}

/// Decode every contact group present in `payload`, in payload order
pub fn decode_contacts(payload: &InboundPayload) -> Result<Vec<Map<String, Value>>> {
    payload
        .iter()
        .filter(|(key, _)| CONTACT_FIELDS.contains(&key.as_str()))
        .map(|(key, value)| {
            let raw = composite_str(key, value)?;
            CONTACT_SCHEMA.decode(key, raw)
        })
        .collect()
}

fn decode_group(
    payload: &InboundPayload,
    field: &str,
    schema: &FieldSchema,
) -> Result<Map<String, Value>> {
    let value = payload.get(field).ok_or_else(|| Error::MissingField {
        field: field.to_string(),
    })?;
    schema.decode(field, composite_str(field, value)?)
}

fn composite_str<'a>(field: &str, value: &'a Value) -> Result<&'a str> {
    value.as_str().ok_or_else(|| Error::Validation {
        field: field.to_string(),
        message: format!("composite field must be a string, got {}", json_type(value)),
        expected: Some("string".to_string()),
    })
}
