//! Normalized row layout of the local store.
//!
//! One logical table per entity kind. Bilingual text is split into `_en`/`_zh`
//! columns; list-valued fields are serialized JSON text columns.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntityKind {
    Event,
    EventConfig,
    Room,
    Tag,
    SessionType,
    Speaker,
    Session,
}

impl EntityKind {
    /// All kinds making up one schedule snapshot
    pub const SCHEDULE: [EntityKind; 5] = [
        EntityKind::Room,
        EntityKind::Tag,
        EntityKind::SessionType,
        EntityKind::Speaker,
        EntityKind::Session,
    ];

    pub fn table_name(&self) -> &'static str {
        match self {
            EntityKind::Event => "events",
            EntityKind::EventConfig => "event_configs",
            EntityKind::Room => "rooms",
            EntityKind::Tag => "tags",
            EntityKind::SessionType => "session_types",
            EntityKind::Speaker => "speakers",
            EntityKind::Session => "sessions",
        }
    }

    /// The event list is the only table not keyed by event id
    pub fn is_global(&self) -> bool {
        matches!(self, EntityKind::Event)
    }
}

impl std::fmt::Display for EntityKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.table_name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventRow {
    pub id: String,
    pub name_en: String,
    pub name_zh: String,
    pub logo_url: String,
    pub is_logo_tinted: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfigRow {
    pub id: String,
    pub name_en: String,
    pub name_zh: String,
    pub logo_url: String,
    pub date_start: Option<String>,
    pub date_end: Option<String>,
    pub website: Option<String>,
    pub publish_start: Option<String>,
    pub publish_end: Option<String>,
    /// JSON array of feature records
    pub features: String,
}

/// Row shape shared by rooms, tags and session types
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedRow {
    pub event_id: String,
    pub id: String,
    pub name_en: String,
    pub name_zh: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerRow {
    pub event_id: String,
    pub id: String,
    pub name_en: String,
    pub name_zh: String,
    pub bio_en: String,
    pub bio_zh: String,
    pub avatar_url: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionRow {
    pub event_id: String,
    pub id: String,
    pub title_en: String,
    pub title_zh: String,
    pub description_en: String,
    pub description_zh: String,
    pub start: String,
    pub end: String,
    pub room_id: String,
    /// JSON array of speaker ids
    pub speaker_ids: String,
    /// JSON array of tag ids
    pub tag_ids: Option<String>,
    pub type_id: Option<String>,
    pub language: Option<String>,
    pub qa: Option<String>,
    pub record: Option<String>,
    pub slide: Option<String>,
    pub live_url: Option<String>,
    pub url: Option<String>,
    pub co_write_url: Option<String>,
    /// JSON array of room ids the session is broadcast to
    pub broadcast_ids: Option<String>,
}

/// A row of any table
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum StoredRow {
    Event(EventRow),
    EventConfig(EventConfigRow),
    Room(NamedRow),
    Tag(NamedRow),
    SessionType(NamedRow),
    Speaker(SpeakerRow),
    Session(SessionRow),
}

impl StoredRow {
    pub fn kind(&self) -> EntityKind {
        match self {
            StoredRow::Event(_) => EntityKind::Event,
            StoredRow::EventConfig(_) => EntityKind::EventConfig,
            StoredRow::Room(_) => EntityKind::Room,
            StoredRow::Tag(_) => EntityKind::Tag,
            StoredRow::SessionType(_) => EntityKind::SessionType,
            StoredRow::Speaker(_) => EntityKind::Speaker,
            StoredRow::Session(_) => EntityKind::Session,
        }
    }

    pub fn id(&self) -> &str {
        match self {
            StoredRow::Event(row) => &row.id,
            StoredRow::EventConfig(row) => &row.id,
            StoredRow::Room(row) | StoredRow::Tag(row) | StoredRow::SessionType(row) => &row.id,
            StoredRow::Speaker(row) => &row.id,
            StoredRow::Session(row) => &row.id,
        }
    }
}
