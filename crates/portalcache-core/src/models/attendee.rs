use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use super::LocalizedText;

/// A verified ticket holder. Only ever held in memory.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Attendee {
    pub event_id: String,
    pub token: String,
    pub user_id: String,
    pub role: String,
    /// Unix seconds of the first check-in, 0 if the ticket was never used
    pub first_use_timestamp: i64,
    pub scenarios: Vec<Scenario>,
}

impl Attendee {
    pub fn has_checked_in(&self) -> bool {
        self.first_use_timestamp > 0
    }

    pub fn scenario(&self, id: &str) -> Option<&Scenario> {
        self.scenarios.iter().find(|s| s.id == id)
    }
}

/// A redeemable item on a ticket (check-in, lunch, kit, ...)
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    pub id: String,
    pub order: i32,
    pub label: LocalizedText,
    pub available_time: i64,
    pub expire_time: i64,
    pub used: Option<i64>,
    /// Reason the scenario was disabled by staff
    pub disabled: Option<String>,
    pub attributes: BTreeMap<String, serde_json::Value>,
}

impl Scenario {
    pub fn is_redeemable_at(&self, unix_secs: i64) -> bool {
        self.used.is_none()
            && self.disabled.is_none()
            && self.available_time <= unix_secs
            && unix_secs <= self.expire_time
    }
}
