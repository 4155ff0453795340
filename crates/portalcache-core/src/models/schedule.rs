use std::collections::BTreeMap;

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};

use super::LocalizedText;

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Room {
    pub id: String,
    pub name: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tag {
    pub id: String,
    pub name: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionType {
    pub id: String,
    pub name: LocalizedText,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Speaker {
    pub id: String,
    pub name: LocalizedText,
    pub bio: LocalizedText,
    pub avatar_url: String,
}

/// A schedule slot. Rooms, speakers, tags and the session type are referenced
/// by id; `room` is only filled in when a schedule is handed to a caller.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Session {
    pub id: String,
    pub title: LocalizedText,
    pub description: LocalizedText,
    pub start: DateTime<FixedOffset>,
    pub end: DateTime<FixedOffset>,
    pub room_id: String,
    pub speaker_ids: Vec<String>,
    pub tag_ids: Option<Vec<String>>,
    pub type_id: Option<String>,
    pub language: Option<String>,
    pub qa: Option<String>,
    pub record: Option<String>,
    pub slide: Option<String>,
    pub live_url: Option<String>,
    pub url: Option<String>,
    pub co_write_url: Option<String>,
    pub broadcast_ids: Option<Vec<String>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub room: Option<Room>,
}

impl Session {
    pub fn duration_minutes(&self) -> i64 {
        (self.end - self.start).num_minutes()
    }

    pub fn tag_ids(&self) -> &[String] {
        self.tag_ids.as_deref().unwrap_or_default()
    }
}

/// One event's schedule snapshot. Every part is replaced together.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Schedule {
    pub rooms: BTreeMap<String, Room>,
    pub tags: BTreeMap<String, Tag>,
    pub session_types: BTreeMap<String, SessionType>,
    pub speakers: BTreeMap<String, Speaker>,
    /// Ordered by start time, then id
    pub sessions: Vec<Session>,
}

impl Schedule {
    pub fn is_empty(&self) -> bool {
        self.rooms.is_empty()
            && self.tags.is_empty()
            && self.session_types.is_empty()
            && self.speakers.is_empty()
            && self.sessions.is_empty()
    }

    pub fn session(&self, id: &str) -> Option<&Session> {
        self.sessions.iter().find(|s| s.id == id)
    }

    /// Fill in each session's `room` from this snapshot's rooms
    pub fn resolve_rooms(&mut self) {
        for session in &mut self.sessions {
            session.room = self.rooms.get(&session.room_id).cloned();
        }
    }

    pub fn with_resolved_rooms(mut self) -> Self {
        self.resolve_rooms();
        self
    }

    pub fn sessions_by_speaker<'a>(&'a self, speaker_id: &'a str) -> impl Iterator<Item = &'a Session> {
        self.sessions
            .iter()
            .filter(move |s| s.speaker_ids.iter().any(|id| id == speaker_id))
    }

    pub fn sessions_in_room<'a>(&'a self, room_id: &'a str) -> impl Iterator<Item = &'a Session> {
        self.sessions.iter().filter(move |s| s.room_id == room_id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(id: &str, room_id: &str, speakers: &[&str]) -> Session {
        Session {
            id: id.to_string(),
            title: LocalizedText::uniform(id),
            description: LocalizedText::default(),
            start: DateTime::parse_from_rfc3339("2025-03-08T09:00:00+08:00").unwrap(),
            end: DateTime::parse_from_rfc3339("2025-03-08T09:40:00+08:00").unwrap(),
            room_id: room_id.to_string(),
            speaker_ids: speakers.iter().map(|s| s.to_string()).collect(),
            tag_ids: None,
            type_id: None,
            language: None,
            qa: None,
            record: None,
            slide: None,
            live_url: None,
            url: None,
            co_write_url: None,
            broadcast_ids: None,
            room: None,
        }
    }

    #[test]
    fn test_resolve_rooms() {
        let mut schedule = Schedule::default();
        schedule.rooms.insert(
            "r1".to_string(),
            Room {
                id: "r1".to_string(),
                name: LocalizedText::uniform("Room A"),
            },
        );
        schedule.sessions.push(session("s1", "r1", &["sp1"]));
        schedule.sessions.push(session("s2", "r9", &[]));

        let schedule = schedule.with_resolved_rooms();
        let room = schedule.session("s1").and_then(|s| s.room.as_ref()).unwrap();
        assert_eq!(room.name.en, "Room A");
        // Dangling reference stays unresolved
        assert!(schedule.session("s2").unwrap().room.is_none());
    }

    #[test]
    fn test_session_queries() {
        let mut schedule = Schedule::default();
        assert!(schedule.is_empty());
        schedule.sessions.push(session("s1", "r1", &["sp1", "sp2"]));
        schedule.sessions.push(session("s2", "r1", &["sp2"]));
        schedule.sessions.push(session("s3", "r2", &[]));

        assert!(!schedule.is_empty());
        assert_eq!(schedule.sessions_by_speaker("sp2").count(), 2);
        assert_eq!(schedule.sessions_in_room("r1").count(), 2);
        assert_eq!(schedule.session("s3").unwrap().duration_minutes(), 40);
        assert!(schedule.session("s3").unwrap().tag_ids().is_empty());
    }
}
