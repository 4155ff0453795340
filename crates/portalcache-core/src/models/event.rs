use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// An entry of the portal's event list
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Event {
    pub id: String,
    pub name: LocalizedText,
    pub logo_url: String,
    pub is_logo_tinted: bool,
}

/// A closed start/end interval
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeWindow {
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
}

impl TimeWindow {
    pub fn contains(&self, instant: DateTime<FixedOffset>) -> bool {
        self.start <= instant && instant <= self.end
    }
}

/// Per-event configuration: dates, website, and the enabled features.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventConfig {
    pub id: String,
    pub name: LocalizedText,
    pub logo_url: String,
    pub date_range: Option<TimeWindow>,
    pub website: Option<String>,
    pub features: Vec<Feature>,
    pub publish_window: Option<TimeWindow>,
}

impl EventConfig {
    /// First feature whose kind has the given wire name
    pub fn feature(&self, name: &str) -> Option<&Feature> {
        self.features.iter().find(|f| f.kind.name() == name)
    }

    /// Where the schedule bundle lives, if the event has a schedule at all
    pub fn schedule_url(&self) -> Option<&str> {
        self.features
            .iter()
            .find(|f| matches!(f.kind, FeatureKind::Schedule))
            .and_then(|f| f.url.as_deref())
            .filter(|url| !url.trim().is_empty())
    }

    /// Events without a publish window are always visible
    pub fn is_published_at(&self, instant: DateTime<FixedOffset>) -> bool {
        self.publish_window
            .map(|window| window.contains(instant))
            .unwrap_or(true)
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WifiNetwork {
    pub ssid: String,
    pub password: String,
}

/// The kinds of feature an event can enable.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum FeatureKind {
    Announcement,
    Fastpass,
    Im,
    Puzzle,
    Schedule,
    Sponsors,
    Staffs,
    Telegram,
    Ticket,
    Venue,
    Webview,
    Wifi { networks: Vec<WifiNetwork> },
    Unavailable,
}

impl FeatureKind {
    /// Build a kind from its wire name. Unknown names become `Unavailable`;
    /// the network list is only kept for `wifi`.
    pub fn from_name(name: &str, networks: Vec<WifiNetwork>) -> Self {
        match name.trim().to_ascii_lowercase().as_str() {
            "announcement" => FeatureKind::Announcement,
            "fastpass" => FeatureKind::Fastpass,
            "im" => FeatureKind::Im,
            "puzzle" => FeatureKind::Puzzle,
            "schedule" => FeatureKind::Schedule,
            "sponsors" => FeatureKind::Sponsors,
            "staffs" => FeatureKind::Staffs,
            "telegram" => FeatureKind::Telegram,
            "ticket" => FeatureKind::Ticket,
            "venue" => FeatureKind::Venue,
            "webview" => FeatureKind::Webview,
            "wifi" => FeatureKind::Wifi { networks },
            _ => FeatureKind::Unavailable,
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            FeatureKind::Announcement => "announcement",
            FeatureKind::Fastpass => "fastpass",
            FeatureKind::Im => "im",
            FeatureKind::Puzzle => "puzzle",
            FeatureKind::Schedule => "schedule",
            FeatureKind::Sponsors => "sponsors",
            FeatureKind::Staffs => "staffs",
            FeatureKind::Telegram => "telegram",
            FeatureKind::Ticket => "ticket",
            FeatureKind::Venue => "venue",
            FeatureKind::Webview => "webview",
            FeatureKind::Wifi { .. } => "wifi",
            FeatureKind::Unavailable => "unavailable",
        }
    }

    pub fn wifi_networks(&self) -> &[WifiNetwork] {
        match self {
            FeatureKind::Wifi { networks } => networks,
            _ => &[],
        }
    }
}

impl std::fmt::Display for FeatureKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Feature {
    pub kind: FeatureKind,
    pub label: LocalizedText,
    pub icon: Option<String>,
    pub url: Option<String>,
    /// Roles allowed to see the feature; `None` means everyone.
    pub visible_roles: Option<Vec<String>>,
}

impl Feature {
    pub fn is_visible_to(&self, role: Option<&str>) -> bool {
        match (&self.visible_roles, role) {
            (None, _) => true,
            (Some(roles), Some(role)) => roles.iter().any(|r| r == role),
            (Some(_), None) => false,
        }
    }
}
