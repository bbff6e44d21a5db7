//! Translation of inbound flat payloads into the platform's case body
//!
//! The inbound request carries a handful of field groups, most of them
//! composite strings (see [`schema`]). [`build_case_body`] decodes each group
//! with its positional schema and assembles the nested body expected by
//! `dossiers/request`.

pub mod builder;
pub mod schema;

pub use builder::{
    build_case_body, decode_contacts, general_fields, CONTACT_FIELDS, DOSSIER_FIELD,
    GENERAL_FIELDS, USER_REQUEST_FIELD,
};
pub use schema::{
    split_composite, FieldSchema, FieldSpec, Presence, Transform, CONTACT_SCHEMA, DELIMITER,
    DOSSIER_SCHEMA, USER_REQUEST_SCHEMA,
};
