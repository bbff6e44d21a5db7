//! Positional schemas for composite field groups
//!
//! A composite field is a single string holding several attributes separated
//! by [`DELIMITER`]. Each field group has a fixed table mapping positions to
//! output attribute names; [`FieldSchema::decode`] walks that table and keeps
//! only the positions that are present and non-empty.

use serde_json::{Map, Value};

use crate::{Error, Result};

/// Separator between positional sub-values
pub const DELIMITER: &str = " || ";

/// Whether a position must exist in the split result
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Presence {
    /// The split result must reach this position, otherwise decoding fails
    /// with [`Error::IncompleteField`]. An empty value is still omitted.
    Required,
    /// Silently omitted when the split result is too short
    Optional,
}

/// Value rewrite applied after extraction
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Transform {
    /// Replace every `.` with `,` (decimal comma expected by the platform)
    DecimalComma,
}

impl Transform {
    pub fn apply(&self, value: &str) -> String {
        match self {
            Transform::DecimalComma => value.replace('.', ","),
        }
    }
}

/// One entry of a positional schema
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSpec {
    pub position: usize,
    pub attribute: &'static str,
    pub presence: Presence,
    pub transform: Option<Transform>,
}

impl FieldSpec {
    pub const fn required(position: usize, attribute: &'static str) -> Self {
        Self {
            position,
            attribute,
            presence: Presence::Required,
            transform: None,
        }
    }

    pub const fn optional(position: usize, attribute: &'static str) -> Self {
        Self {
            position,
            attribute,
            presence: Presence::Optional,
            transform: None,
        }
    }

    pub const fn with_transform(mut self, transform: Transform) -> Self {
        self.transform = Some(transform);
        self
    }
}

/// Ordered positional schema for one kind of field group
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct FieldSchema {
    /// Name used in error messages when no concrete group name is given
    pub name: &'static str,
    pub fields: &'static [FieldSpec],
}

/// `dossier_data`: location of the case
pub const DOSSIER_SCHEMA: FieldSchema = FieldSchema {
    name: "dossier_data",
    fields: &[
        FieldSpec::optional(0, "name"),
        FieldSpec::optional(1, "street"),
        FieldSpec::optional(2, "houseNumber"),
        FieldSpec::optional(3, "poBoxNumber"),
        FieldSpec::optional(4, "zipCode"),
        FieldSpec::optional(5, "municipality"),
        FieldSpec::optional(6, "cadastralNumber"),
        FieldSpec::optional(7, "longitude").with_transform(Transform::DecimalComma),
        FieldSpec::optional(8, "latitude").with_transform(Transform::DecimalComma),
    ],
};

/// `user_request`: what the citizen asks for. `invoiceAddres` is the
/// platform's own spelling.
pub const USER_REQUEST_SCHEMA: FieldSchema = FieldSchema {
    name: "user_request",
    fields: &[
        FieldSpec::optional(0, "reference"),
        FieldSpec::optional(1, "type"),
        FieldSpec::optional(2, "date"),
        FieldSpec::optional(3, "description"),
        FieldSpec::optional(4, "remarks"),
        FieldSpec::optional(5, "invoiceAddres"),
    ],
};

/// One contact entity. Positions 0 to 10 must be present in the encoded
/// string; the company and national registry numbers may be cut off.
pub const CONTACT_SCHEMA: FieldSchema = FieldSchema {
    name: "contact",
    fields: &[
        FieldSpec::required(0, "type"),
        FieldSpec::required(1, "firstName"),
        FieldSpec::required(2, "name"),
        FieldSpec::required(3, "street"),
        FieldSpec::required(4, "houseNumber"),
        FieldSpec::required(5, "poBoxNumber"),
        FieldSpec::required(6, "zipCode"),
        FieldSpec::required(7, "municipality"),
        FieldSpec::required(8, "countryCode"),
        FieldSpec::required(9, "phone"),
        FieldSpec::required(10, "email"),
        FieldSpec::optional(11, "companyNumber"),
        FieldSpec::optional(12, "nationalRegistryNumber"),
    ],
};

/// Split a composite string into its positional sub-values.
///
/// A `||` token separates positions only when whitespace or the edge of the
/// string sits on both sides of it, so `"a || || b"` has an empty middle slot
/// while `"a||b"` stays a single value. Elements are trimmed and an empty
/// slot is always `""`.
pub fn split_composite(raw: &str) -> Vec<&str> {
    let token = DELIMITER.trim();
    let bounded = |c: Option<char>| c.map_or(true, char::is_whitespace);

    let mut parts = Vec::new();
    let mut start = 0;
    for (index, _) in raw.match_indices(token) {
        let before = raw[..index].chars().next_back();
        let after = raw[index + token.len()..].chars().next();
        if bounded(before) && bounded(after) {
            parts.push(raw[start..index].trim());
            start = index + token.len();
        }
    }
    parts.push(raw[start..].trim());
    parts
}

impl FieldSchema {
    /// Number of elements the split result must have
    pub fn required_len(&self) -> usize {
        self.fields
            .iter()
            .filter(|entry| entry.presence == Presence::Required)
            .map(|entry| entry.position + 1)
            .max()
            .unwrap_or(0)
    }

    /// Number of positions the schema knows about
    pub fn len(&self) -> usize {
        self.fields
            .iter()
            .map(|entry| entry.position + 1)
            .max()
            .unwrap_or(0)
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    pub fn attributes(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.fields.iter().map(|entry| entry.attribute)
    }

    /// Decode `raw` into an attribute map. `field` names the inbound group
    /// in errors.
    pub fn decode(&self, field: &str, raw: &str) -> Result<Map<String, Value>> {
        let parts = split_composite(raw);

        let required = self.required_len();
        if parts.len() < required {
            return Err(Error::IncompleteField {
                field: field.to_string(),
                required,
                actual: parts.len(),
            });
        }

        let mut attributes = Map::new();
        for entry in self.fields {
            let Some(value) = parts.get(entry.position).filter(|v| !v.is_empty()) else {
                continue;
            };
            let value = match entry.transform {
                Some(transform) => transform.apply(value),
                None => value.to_string(),
            };
            attributes.insert(entry.attribute.to_string(), Value::String(value));
        }

        Ok(attributes)
    }

    /// Inverse of [`decode`](Self::decode) for attributes without
    /// delimiters: joins the attribute values by position, padding missing
    /// ones with empty slots. Unknown keys and non-string values are
    /// ignored. Transforms are not reverted.
    pub fn encode(&self, attributes: &Map<String, Value>) -> String {
        let mut slots = vec![""; self.required_len()];
        for entry in self.fields {
            let Some(value) = attributes.get(entry.attribute).and_then(Value::as_str) else {
                continue;
            };
            if slots.len() <= entry.position {
                slots.resize(entry.position + 1, "");
            }
            slots[entry.position] = value;
        }
        slots.join(DELIMITER)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_split_composite() {
        assert_eq!(split_composite("a || b || c"), vec!["a", "b", "c"]);
        assert_eq!(split_composite("12 ||  || 4000"), vec!["12", "", "4000"]);
        assert_eq!(split_composite("x || || 5.1"), vec!["x", "", "5.1"]);
        assert_eq!(split_composite("desc || || "), vec!["desc", "", ""]);
        assert_eq!(split_composite(""), vec![""]);
        assert_eq!(split_composite("|| a ||"), vec!["", "a", ""]);
    }

    #[test]
    fn test_bare_token_stays_inside_value() {
        assert_eq!(split_composite("a||b || c"), vec!["a||b", "c"]);
        assert_eq!(split_composite("a ||b|| c"), vec!["a ||b|| c"]);
        assert_eq!(split_composite("x ||| y"), vec!["x ||| y"]);

        let decoded = DOSSIER_SCHEMA
            .decode("dossier_data", "Maison||Annexe || Rue A")
            .unwrap();
        assert_eq!(
            Value::Object(decoded),
            json!({"name": "Maison||Annexe", "street": "Rue A"})
        );
    }

    #[test]
    fn test_schema_lengths() {
        assert_eq!(DOSSIER_SCHEMA.len(), 9);
        assert_eq!(DOSSIER_SCHEMA.required_len(), 0);
        assert_eq!(USER_REQUEST_SCHEMA.len(), 6);
        assert_eq!(CONTACT_SCHEMA.len(), 13);
        assert_eq!(CONTACT_SCHEMA.required_len(), 11);
    }

    #[test]
    fn test_decimal_comma() {
        assert_eq!(Transform::DecimalComma.apply("4.123"), "4,123");
        assert_eq!(Transform::DecimalComma.apply("4123"), "4123");
        assert_eq!(Transform::DecimalComma.apply("1.2.3"), "1,2,3");
    }

    #[test]
    fn test_decode_dossier_omits_empty_and_missing() {
        let dossier = DOSSIER_SCHEMA
            .decode("dossier_data", "Maison || Rue A || 12 ||  || 4000")
            .unwrap();
        assert_eq!(
            Value::Object(dossier),
            json!({
                "name": "Maison",
                "street": "Rue A",
                "houseNumber": "12",
                "zipCode": "4000"
            })
        );
    }

    #[test]
    fn test_decode_only_transforms_coordinates() {
        let dossier = DOSSIER_SCHEMA
            .decode("dossier_data", "A.B || || || || 4.000 || || 12.3 || 5.5 || 50.25")
            .unwrap();
        assert_eq!(dossier["name"], "A.B");
        assert_eq!(dossier["zipCode"], "4.000");
        assert_eq!(dossier["cadastralNumber"], "12.3");
        assert_eq!(dossier["longitude"], "5,5");
        assert_eq!(dossier["latitude"], "50,25");
    }

    #[test]
    fn test_decode_ignores_extra_positions() {
        let request = USER_REQUEST_SCHEMA
            .decode("user_request", "R || t || d || desc || rem || inv || extra")
            .unwrap();
        assert_eq!(request.len(), 6);
        assert_eq!(request["invoiceAddres"], "inv");
        assert!(!request.values().any(|v| v == "extra"));
    }

    #[test]
    fn test_decode_contact_optional_tail() {
        let base = "physical || Jean || Dupont || Rue B || 3 || || 4000 || Liège || BE || || jean@example.com";

        let contact = CONTACT_SCHEMA.decode("contact_contact", base).unwrap();
        assert_eq!(contact["email"], "jean@example.com");
        assert!(!contact.contains_key("phone"));
        assert!(!contact.contains_key("companyNumber"));
        assert!(!contact.contains_key("nationalRegistryNumber"));

        let with_company = format!("{base} || BE0123456789");
        let contact = CONTACT_SCHEMA.decode("contact_contact", &with_company).unwrap();
        assert_eq!(contact["companyNumber"], "BE0123456789");
        assert!(!contact.contains_key("nationalRegistryNumber"));

        let with_both = format!("{base} ||  || 85.01.01-123.45");
        let contact = CONTACT_SCHEMA.decode("contact_contact", &with_both).unwrap();
        assert!(!contact.contains_key("companyNumber"));
        assert_eq!(contact["nationalRegistryNumber"], "85.01.01-123.45");
    }

    #[test]
    fn test_decode_short_contact_is_an_error() {
        // Positions 0 to 10 are assumed present; a truncated contact is
        // rejected rather than decoded partially.
        let err = CONTACT_SCHEMA
            .decode("contact_demandeur", "physical || Jean || Dupont")
            .unwrap_err();
        match err {
            Error::IncompleteField { field, required, actual } => {
                assert_eq!(field, "contact_demandeur");
                assert_eq!(required, 11);
                assert_eq!(actual, 3);
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_encode_pads_missing_positions() {
        let mut attributes = Map::new();
        attributes.insert("name".to_string(), json!("Maison"));
        attributes.insert("zipCode".to_string(), json!("4000"));
        attributes.insert("unknown".to_string(), json!("ignored"));

        assert_eq!(
            DOSSIER_SCHEMA.encode(&attributes),
            "Maison ||  ||  ||  || 4000"
        );
    }

    #[test]
    fn test_encode_contact_keeps_required_width() {
        let mut attributes = Map::new();
        attributes.insert("type".to_string(), json!("moral"));
        let encoded = CONTACT_SCHEMA.encode(&attributes);
        assert_eq!(split_composite(&encoded).len(), 11);
        assert!(CONTACT_SCHEMA.decode("contact_contact", &encoded).is_ok());
    }
}
