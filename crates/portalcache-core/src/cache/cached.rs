use std::collections::BTreeMap;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::rows::{EntityKind, StoredRow};

/// A value with the time it was written to the cache
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age_minutes(&self) -> i64 {
        (Utc::now() - self.cached_at).num_minutes()
    }

    pub fn age_display(&self) -> String {
        age_display(self.cached_at, Utc::now())
    }
}

/// Human-readable age such as "just now", "5m ago", "2h ago", "3d ago"
pub fn age_display(cached_at: DateTime<Utc>, now: DateTime<Utc>) -> String {
    let minutes = (now - cached_at).num_minutes();
    if minutes < 1 {
        // Includes clock skew
        "just now".to_string()
    } else if minutes < 60 {
        format!("{}m ago", minutes)
    } else if minutes < 1440 {
        let hours = minutes / 60;
        // Round up: 1h 30m+ becomes 2h
        if minutes % 60 >= 30 {
            format!("{}h ago", hours + 1)
        } else {
            format!("{}h ago", hours)
        }
    } else {
        let days = minutes / 1440;
        // Round up: 1d 12h+ becomes 2d
        if (minutes % 1440) / 60 >= 12 {
            format!("{}d ago", days + 1)
        } else {
            format!("{}d ago", days)
        }
    }
}

/// All tables of one scope, as persisted together
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ScopeDocument {
    #[serde(default)]
    tables: BTreeMap<String, Vec<StoredRow>>,
}

impl ScopeDocument {
    pub fn rows(&self, kind: EntityKind) -> Vec<StoredRow> {
        self.tables
            .get(kind.table_name())
            .cloned()
            .unwrap_or_default()
    }

    pub fn set(&mut self, kind: EntityKind, rows: Vec<StoredRow>) {
        self.tables.insert(kind.table_name().to_string(), rows);
    }
}
