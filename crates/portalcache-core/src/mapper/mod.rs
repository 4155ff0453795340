//! Conversions between wire payloads, stored rows, and domain values.
//!
//! Everything here is pure. The flow is always wire → domain on fetch,
//! domain → rows on write, rows → domain on read. For every entity kind
//! `from_row(to_row(x)) == x`.

pub mod attendee;
pub mod event;
pub mod schedule;

use chrono::{DateTime, FixedOffset};
use thiserror::Error;

use crate::cache::{EntityKind, StoredRow};
use crate::models::{Language, LocalizedText};

pub use attendee::attendee_from_wire;
pub use event::{
    config_from_row, config_from_wire, config_to_row, event_from_row, event_from_wire,
    event_to_row, events_from_rows,
};
pub use schedule::{
    room_from_row, room_to_row, schedule_from_tables, schedule_from_wire, schedule_to_tables,
    session_from_row, session_to_row, session_type_from_row, session_type_to_row,
    speaker_from_row, speaker_to_row, tag_from_row, tag_to_row,
};

#[derive(Error, Debug)]
pub enum MapperError {
    #[error("Invalid timestamp {value:?} in {field}: {source}")]
    InvalidTimestamp {
        field: &'static str,
        value: String,
        #[source]
        source: chrono::ParseError,
    },

    #[error("Time window {0} has a start or an end but not both")]
    IncompleteWindow(&'static str),

    #[error("Invalid {column} column: {source}")]
    InvalidColumn {
        column: &'static str,
        #[source]
        source: serde_json::Error,
    },

    #[error("Expected a {expected} row, found {found}")]
    UnexpectedRow { expected: EntityKind, found: EntityKind },

    #[error("No {0} row in snapshot")]
    MissingRow(EntityKind),
}

/// Resolve bilingual text for display using a language-preference callback
/// returning a language code ("zh-TW", "en", ...).
pub fn localize<'a>(text: &'a LocalizedText, preference: &dyn Fn() -> String) -> &'a str {
    text.get(Language::from_code(&preference()))
}

pub(crate) fn parse_instant(field: &'static str, value: &str) -> Result<DateTime<FixedOffset>, MapperError> {
    DateTime::parse_from_rfc3339(value.trim()).map_err(|source| MapperError::InvalidTimestamp {
        field,
        value: value.to_string(),
        source,
    })
}

/// Serialize an id list into a text column
pub(crate) fn encode_ids(ids: &[String]) -> String {
    serde_json::Value::from(ids.to_vec()).to_string()
}

pub(crate) fn decode_ids(column: &'static str, text: &str) -> Result<Vec<String>, MapperError> {
    serde_json::from_str(text).map_err(|source| MapperError::InvalidColumn { column, source })
}

pub(crate) fn unexpected(expected: EntityKind, row: &StoredRow) -> MapperError {
    MapperError::UnexpectedRow {
        expected,
        found: row.kind(),
    }
}
