//! Response shapes of the portal and schedule endpoints.
//!
//! These mirror the JSON as delivered; `mapper` turns them into stored rows
//! and domain values.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::models::LocalizedText;

/// An id the server may send as a number or a string
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum WireId {
    Number(serde_json::Number),
    Text(String),
}

impl WireId {
    /// Canonical string form used everywhere past the wire
    pub fn canonical(&self) -> String {
        match self {
            WireId::Number(n) => n.to_string(),
            WireId::Text(s) => s.clone(),
        }
    }

    /// Inverse of `canonical`: integers in canonical form go back out as numbers
    pub fn from_canonical(id: &str) -> Self {
        match id.parse::<i64>() {
            Ok(n) if n.to_string() == id => WireId::Number(n.into()),
            _ => WireId::Text(id.to_string()),
        }
    }
}

// ===== Portal: GET /events/ =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventWire {
    #[serde(rename = "event_id", alias = "id")]
    pub id: String,
    #[serde(rename = "display_name", alias = "name", default)]
    pub name: LocalizedText,
    #[serde(alias = "logoUrl", default)]
    pub logo_url: String,
    #[serde(alias = "isLogoTinted", default)]
    pub logo_tinted: bool,
}

// ===== Portal: GET /events/{id}/ =====

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindowWire {
    pub start: String,
    pub end: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiWire {
    #[serde(rename = "SSID", alias = "ssid")]
    pub ssid: String,
    #[serde(default)]
    pub password: String,
}

/// One entry of an event's feature list. Also the stored form of features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeatureWire {
    pub feature: String,
    #[serde(default)]
    pub display_text: LocalizedText,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub icon: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub visible_roles: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wifi: Option<Vec<WifiWire>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfigWire {
    #[serde(rename = "event_id", alias = "id")]
    pub id: String,
    #[serde(rename = "display_name", alias = "name", default)]
    pub name: LocalizedText,
    #[serde(alias = "logoUrl", default)]
    pub logo_url: String,
    #[serde(rename = "event_date", default)]
    pub date: Option<TimeWindowWire>,
    #[serde(rename = "event_website", default)]
    pub website: Option<String>,
    #[serde(default)]
    pub publish: Option<TimeWindowWire>,
    #[serde(default)]
    pub features: Vec<FeatureWire>,
}

// ===== Schedule bundle: GET {schedule feature url} =====

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct NameBlock {
    #[serde(default)]
    pub name: String,
}

/// Rooms, tags and session types all share this shape
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct NamedWire {
    pub id: String,
    #[serde(default)]
    pub en: NameBlock,
    #[serde(default)]
    pub zh: NameBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerBlock {
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub bio: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SpeakerWire {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub avatar: String,
    #[serde(default)]
    pub en: SpeakerBlock,
    #[serde(default)]
    pub zh: SpeakerBlock,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionBlock {
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionWire {
    pub id: WireId,
    #[serde(rename = "type", default)]
    pub type_id: Option<String>,
    pub room: String,
    pub start: String,
    pub end: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub en: SessionBlock,
    #[serde(default)]
    pub zh: SessionBlock,
    #[serde(default)]
    pub speakers: Vec<String>,
    #[serde(default)]
    pub tags: Option<Vec<String>>,
    #[serde(default)]
    pub co_write: Option<String>,
    #[serde(default)]
    pub qa: Option<String>,
    #[serde(default)]
    pub slide: Option<String>,
    #[serde(default)]
    pub live: Option<String>,
    #[serde(default)]
    pub record: Option<String>,
    #[serde(default)]
    pub uri: Option<String>,
    #[serde(default)]
    pub broadcast: Option<Vec<String>>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScheduleWire {
    #[serde(default)]
    pub sessions: Vec<SessionWire>,
    #[serde(default)]
    pub speakers: Vec<SpeakerWire>,
    #[serde(default)]
    pub session_types: Vec<NamedWire>,
    #[serde(default)]
    pub rooms: Vec<NamedWire>,
    #[serde(default)]
    pub tags: Vec<NamedWire>,
}

// ===== Portal: GET /events/{id}/status?token= =====

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioWire {
    pub id: String,
    #[serde(default)]
    pub order: i32,
    #[serde(default)]
    pub display_text: LocalizedText,
    #[serde(default)]
    pub available_time: i64,
    #[serde(default)]
    pub expire_time: i64,
    #[serde(default)]
    pub used: Option<i64>,
    #[serde(alias = "disable", default)]
    pub disabled: Option<String>,
    #[serde(default)]
    pub attr: BTreeMap<String, serde_json::Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AttendeeWire {
    pub event_id: String,
    pub token: String,
    #[serde(default)]
    pub user_id: Option<WireId>,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub first_use: Option<i64>,
    #[serde(default)]
    pub scenarios: Vec<ScenarioWire>,
}
