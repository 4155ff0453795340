//! In-memory attendee sessions.
//!
//! Ticket status is personal data; it is kept for the life of the process
//! only and never reaches the local store.

use std::collections::HashMap;
use std::sync::{Mutex, MutexGuard, PoisonError};

use crate::cache::CachedData;
use crate::models::Attendee;

type Key = (String, String);

/// Attendees keyed by (event id, ticket token)
#[derive(Default)]
pub struct AttendeeSessions {
    entries: Mutex<HashMap<Key, CachedData<Attendee>>>,
}

impl AttendeeSessions {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> MutexGuard<'_, HashMap<Key, CachedData<Attendee>>> {
        // A panic mid-insert cannot leave the map inconsistent
        self.entries.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn get(&self, event_id: &str, token: &str) -> Option<CachedData<Attendee>> {
        self.entries()
            .get(&(event_id.to_string(), token.to_string()))
            .cloned()
    }

    /// Held under the requested key; the server may spell the event id differently
    pub fn update(&self, event_id: &str, token: &str, attendee: Attendee) {
        let key = (event_id.to_string(), token.to_string());
        self.entries().insert(key, CachedData::new(attendee));
    }

    /// Drop one ticket, returning whether it was held
    pub fn forget(&self, event_id: &str, token: &str) -> bool {
        self.entries()
            .remove(&(event_id.to_string(), token.to_string()))
            .is_some()
    }

    /// Drop every ticket of an event
    pub fn forget_event(&self, event_id: &str) {
        self.entries().retain(|(event, _), _| event != event_id);
    }

    pub fn clear(&self) {
        self.entries().clear();
    }

    pub fn len(&self) -> usize {
        self.entries().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
