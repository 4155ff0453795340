use std::collections::BTreeMap;

use crate::api::wire::{NamedWire, ScheduleWire, SessionWire, SpeakerWire};
use crate::cache::{EntityKind, NamedRow, SessionRow, SpeakerRow, StoredRow, Tables};
use crate::models::{LocalizedText, Room, Schedule, Session, SessionType, Speaker, Tag};

use super::{decode_ids, encode_ids, parse_instant, unexpected, MapperError};

/// Ids handed to speakers the server sent without one
fn local_speaker_id() -> String {
    format!("local-{:016x}", rand::random::<u64>())
}

fn named_text(wire: &NamedWire) -> LocalizedText {
    LocalizedText::new(wire.en.name.clone(), wire.zh.name.clone())
}

fn speaker_from_wire(wire: SpeakerWire) -> Speaker {
    let id = match wire.id {
        Some(id) if !id.trim().is_empty() => id,
        _ => local_speaker_id(),
    };
    Speaker {
        id,
        name: LocalizedText::new(wire.en.name, wire.zh.name),
        bio: LocalizedText::new(wire.en.bio, wire.zh.bio),
        avatar_url: wire.avatar,
    }
}

fn session_from_wire(wire: SessionWire) -> Result<Session, MapperError> {
    Ok(Session {
        id: wire.id.canonical(),
        title: LocalizedText::new(wire.en.title, wire.zh.title),
        description: LocalizedText::new(wire.en.description, wire.zh.description),
        start: parse_instant("start", &wire.start)?,
        end: parse_instant("end", &wire.end)?,
        room_id: wire.room,
        speaker_ids: wire.speakers,
        tag_ids: wire.tags,
        type_id: wire.type_id,
        language: wire.language,
        qa: wire.qa,
        record: wire.record,
        slide: wire.slide,
        live_url: wire.live,
        url: wire.uri,
        co_write_url: wire.co_write,
        broadcast_ids: wire.broadcast,
        room: None,
    })
}

/// Convert a schedule bundle. Sessions come out ordered by start, then id.
pub fn schedule_from_wire(wire: ScheduleWire) -> Result<Schedule, MapperError> {
    let rooms = wire
        .rooms
        .iter()
        .map(|r| (r.id.clone(), Room { id: r.id.clone(), name: named_text(r) }))
        .collect();
    let tags = wire
        .tags
        .iter()
        .map(|t| (t.id.clone(), Tag { id: t.id.clone(), name: named_text(t) }))
        .collect();
    let session_types = wire
        .session_types
        .iter()
        .map(|t| (t.id.clone(), SessionType { id: t.id.clone(), name: named_text(t) }))
        .collect();
    let speakers = wire
        .speakers
        .into_iter()
        .map(speaker_from_wire)
        .map(|s| (s.id.clone(), s))
        .collect();

    let mut sessions = wire
        .sessions
        .into_iter()
        .map(session_from_wire)
        .collect::<Result<Vec<_>, _>>()?;
    sessions.sort_by(|a, b| a.start.cmp(&b.start).then_with(|| a.id.cmp(&b.id)));

    Ok(Schedule {
        rooms,
        tags,
        session_types,
        speakers,
        sessions,
    })
}

// ===== Rows =====

fn named_row(event_id: &str, id: &str, name: &LocalizedText) -> NamedRow {
    NamedRow {
        event_id: event_id.to_string(),
        id: id.to_string(),
        name_en: name.en.clone(),
        name_zh: name.zh.clone(),
    }
}

fn named_from_row(row: NamedRow) -> (String, LocalizedText) {
    (row.id, LocalizedText::new(row.name_en, row.name_zh))
}

pub fn room_to_row(event_id: &str, room: &Room) -> StoredRow {
    StoredRow::Room(named_row(event_id, &room.id, &room.name))
}

pub fn room_from_row(row: StoredRow) -> Result<Room, MapperError> {
    match row {
        StoredRow::Room(row) => {
            let (id, name) = named_from_row(row);
            Ok(Room { id, name })
        }
        other => Err(unexpected(EntityKind::Room, &other)),
    }
}

pub fn tag_to_row(event_id: &str, tag: &Tag) -> StoredRow {
    StoredRow::Tag(named_row(event_id, &tag.id, &tag.name))
}

pub fn tag_from_row(row: StoredRow) -> Result<Tag, MapperError> {
    match row {
        StoredRow::Tag(row) => {
            let (id, name) = named_from_row(row);
            Ok(Tag { id, name })
        }
        other => Err(unexpected(EntityKind::Tag, &other)),
    }
}

pub fn session_type_to_row(event_id: &str, session_type: &SessionType) -> StoredRow {
    StoredRow::SessionType(named_row(event_id, &session_type.id, &session_type.name))
}

pub fn session_type_from_row(row: StoredRow) -> Result<SessionType, MapperError> {
    match row {
        StoredRow::SessionType(row) => {
            let (id, name) = named_from_row(row);
            Ok(SessionType { id, name })
        }
        other => Err(unexpected(EntityKind::SessionType, &other)),
    }
}

pub fn speaker_to_row(event_id: &str, speaker: &Speaker) -> StoredRow {
    StoredRow::Speaker(SpeakerRow {
        event_id: event_id.to_string(),
        id: speaker.id.clone(),
        name_en: speaker.name.en.clone(),
        name_zh: speaker.name.zh.clone(),
        bio_en: speaker.bio.en.clone(),
        bio_zh: speaker.bio.zh.clone(),
        avatar_url: speaker.avatar_url.clone(),
    })
}

pub fn speaker_from_row(row: StoredRow) -> Result<Speaker, MapperError> {
    match row {
        StoredRow::Speaker(row) => Ok(Speaker {
            id: row.id,
            name: LocalizedText::new(row.name_en, row.name_zh),
            bio: LocalizedText::new(row.bio_en, row.bio_zh),
            avatar_url: row.avatar_url,
        }),
        other => Err(unexpected(EntityKind::Speaker, &other)),
    }
}

/// The resolved `room` is not stored; it is rebuilt from the rooms table.
pub fn session_to_row(event_id: &str, session: &Session) -> StoredRow {
    StoredRow::Session(SessionRow {
        event_id: event_id.to_string(),
        id: session.id.clone(),
        title_en: session.title.en.clone(),
        title_zh: session.title.zh.clone(),
        description_en: session.description.en.clone(),
        description_zh: session.description.zh.clone(),
        start: session.start.to_rfc3339(),
        end: session.end.to_rfc3339(),
        room_id: session.room_id.clone(),
        speaker_ids: encode_ids(&session.speaker_ids),
        tag_ids: session.tag_ids.as_deref().map(encode_ids),
        type_id: session.type_id.clone(),
        language: session.language.clone(),
        qa: session.qa.clone(),
        record: session.record.clone(),
        slide: session.slide.clone(),
        live_url: session.live_url.clone(),
        url: session.url.clone(),
        co_write_url: session.co_write_url.clone(),
        broadcast_ids: session.broadcast_ids.as_deref().map(encode_ids),
    })
}

pub fn session_from_row(row: StoredRow) -> Result<Session, MapperError> {
    let row = match row {
        StoredRow::Session(row) => row,
        other => return Err(unexpected(EntityKind::Session, &other)),
    };

    Ok(Session {
        id: row.id,
        title: LocalizedText::new(row.title_en, row.title_zh),
        description: LocalizedText::new(row.description_en, row.description_zh),
        start: parse_instant("start", &row.start)?,
        end: parse_instant("end", &row.end)?,
        room_id: row.room_id,
        speaker_ids: decode_ids("speaker_ids", &row.speaker_ids)?,
        tag_ids: row
            .tag_ids
            .map(|text| decode_ids("tag_ids", &text))
            .transpose()?,
        type_id: row.type_id,
        language: row.language,
        qa: row.qa,
        record: row.record,
        slide: row.slide,
        live_url: row.live_url,
        url: row.url,
        co_write_url: row.co_write_url,
        broadcast_ids: row
            .broadcast_ids
            .map(|text| decode_ids("broadcast_ids", &text))
            .transpose()?,
        room: None,
    })
}

/// Rows for every schedule table of one event
pub fn schedule_to_tables(event_id: &str, schedule: &Schedule) -> Tables {
    Tables::new()
        .with(
            EntityKind::Room,
            schedule.rooms.values().map(|r| room_to_row(event_id, r)).collect(),
        )
        .with(
            EntityKind::Tag,
            schedule.tags.values().map(|t| tag_to_row(event_id, t)).collect(),
        )
        .with(
            EntityKind::SessionType,
            schedule
                .session_types
                .values()
                .map(|t| session_type_to_row(event_id, t))
                .collect(),
        )
        .with(
            EntityKind::Speaker,
            schedule.speakers.values().map(|s| speaker_to_row(event_id, s)).collect(),
        )
        .with(
            EntityKind::Session,
            schedule.sessions.iter().map(|s| session_to_row(event_id, s)).collect(),
        )
}

fn keyed<T>(
    rows: Vec<StoredRow>,
    convert: fn(StoredRow) -> Result<T, MapperError>,
    id: fn(&T) -> &str,
) -> Result<BTreeMap<String, T>, MapperError> {
    rows.into_iter()
        .map(|row| convert(row).map(|value| (id(&value).to_string(), value)))
        .collect()
}

/// Rebuild a schedule from its tables. Session order is kept as stored.
pub fn schedule_from_tables(mut tables: Tables) -> Result<Schedule, MapperError> {
    Ok(Schedule {
        rooms: keyed(tables.take(EntityKind::Room), room_from_row, |r| r.id.as_str())?,
        tags: keyed(tables.take(EntityKind::Tag), tag_from_row, |t| t.id.as_str())?,
        session_types: keyed(
            tables.take(EntityKind::SessionType),
            session_type_from_row,
            |t| t.id.as_str(),
        )?,
        speakers: keyed(tables.take(EntityKind::Speaker), speaker_from_row, |s| s.id.as_str())?,
        sessions: tables
            .take(EntityKind::Session)
            .into_iter()
            .map(session_from_row)
            .collect::<Result<_, _>>()?,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::DateTime;

    const BUNDLE: &str = r#"{
        "sessions": [
            {"id": "s2", "room": "r1", "start": "2025-03-08T10:00:00+08:00", "end": "2025-03-08T10:40:00+08:00",
             "en": {"title": "Second"}, "zh": {"title": "第二場"}, "speakers": []},
            {"id": 7, "type": "K", "room": "r1", "start": "2025-03-08T09:00:00+08:00", "end": "2025-03-08T09:40:00+08:00",
             "en": {"title": "Opening", "description": "Welcome"}, "zh": {"title": "開幕", "description": "歡迎"},
             "speakers": ["sp1"], "tags": ["t1"], "broadcast": ["r2"], "co_write": "https://hackmd.io/x"},
            {"id": "s1", "room": "r2", "start": "2025-03-08T10:00:00+08:00", "end": "2025-03-08T10:30:00+08:00",
             "speakers": ["sp1"]}
        ],
        "speakers": [
            {"id": "sp1", "avatar": "https://example.org/a.png", "en": {"name": "Alice", "bio": "Hi"}, "zh": {"name": "愛麗絲", "bio": "嗨"}},
            {"avatar": "", "en": {"name": "Anonymous"}}
        ],
        "session_types": [{"id": "K", "en": {"name": "Keynote"}, "zh": {"name": "主題演講"}}],
        "rooms": [{"id": "r1", "en": {"name": "Hall"}, "zh": {"name": "大廳"}},
                  {"id": "r2", "en": {"name": "Room 2"}, "zh": {"name": "二號廳"}}],
        "tags": [{"id": "t1", "en": {"name": "Beginner"}, "zh": {"name": "入門"}}]
    }"#;

    fn bundle() -> Schedule {
        let wire: ScheduleWire = serde_json::from_str(BUNDLE).unwrap();
        schedule_from_wire(wire).unwrap()
    }

    #[test]
    fn test_schedule_from_wire() {
        let schedule = bundle();

        let ids: Vec<&str> = schedule.sessions.iter().map(|s| s.id.as_str()).collect();
        assert_eq!(ids, vec!["7", "s1", "s2"]);

        let opening = schedule.session("7").unwrap();
        assert_eq!(opening.title.zh, "開幕");
        assert_eq!(opening.type_id.as_deref(), Some("K"));
        assert_eq!(opening.tag_ids().to_vec(), vec!["t1".to_string()]);
        assert_eq!(opening.co_write_url.as_deref(), Some("https://hackmd.io/x"));
        assert_eq!(opening.duration_minutes(), 40);

        assert_eq!(schedule.rooms["r2"].name.en, "Room 2");
        assert_eq!(schedule.speakers.len(), 2);
        assert_eq!(schedule.speakers["sp1"].bio.zh, "嗨");
    }

    #[test]
    fn test_missing_speaker_ids_are_generated() {
        let schedule = bundle();
        let generated: Vec<&String> = schedule.speakers.keys().filter(|id| *id != "sp1").collect();
        assert_eq!(generated.len(), 1);
        assert!(generated[0].starts_with("local-"));
        assert_eq!(schedule.speakers[generated[0]].name.en, "Anonymous");

        // A second conversion of the same bundle picks a fresh id
        let again = bundle();
        assert!(!again.speakers.contains_key(generated[0].as_str()));
    }

    #[test]
    fn test_bad_session_time_fails_whole_bundle() {
        let json = r#"{"sessions": [{"id": "s1", "room": "r1", "start": "nine o'clock", "end": "2025-03-08T10:00:00+08:00"}]}"#;
        let wire: ScheduleWire = serde_json::from_str(json).unwrap();
        assert!(matches!(
            schedule_from_wire(wire),
            Err(MapperError::InvalidTimestamp { field: "start", .. })
        ));
    }

    #[test]
    fn test_schedule_tables_round_trip() {
        let schedule = bundle();
        let tables = schedule_to_tables("sitcon2025", &schedule);

        assert_eq!(tables.get(EntityKind::Session).len(), 3);
        assert!(tables.validate(&crate::cache::Scope::event("sitcon2025")).is_ok());
        match &tables.get(EntityKind::Speaker)[0] {
            StoredRow::Speaker(row) => assert_eq!(row.event_id, "sitcon2025"),
            other => panic!("unexpected row {:?}", other),
        }

        assert_eq!(schedule_from_tables(tables).unwrap(), schedule);
    }

    #[test]
    fn test_empty_tables_give_empty_schedule() {
        let schedule = schedule_from_tables(Tables::new()).unwrap();
        assert!(schedule.is_empty());
    }

    #[test]
    fn test_session_row_round_trip() {
        let minimal = Session {
            id: "42".to_string(),
            title: LocalizedText::default(),
            description: LocalizedText::default(),
            start: DateTime::parse_from_rfc3339("2025-03-08T09:00:00Z").unwrap(),
            end: DateTime::parse_from_rfc3339("2025-03-08T09:30:00+08:00").unwrap(),
            room_id: "r1".to_string(),
            speaker_ids: vec![],
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
        };
        assert_eq!(session_from_row(session_to_row("e", &minimal)).unwrap(), minimal);

        let full = Session {
            tag_ids: Some(vec![]),
            type_id: Some("K".to_string()),
            language: Some("漢語".to_string()),
            qa: Some("https://example.org/qa".to_string()),
            record: Some("https://example.org/record".to_string()),
            slide: Some("https://example.org/slide".to_string()),
            live_url: Some("https://example.org/live".to_string()),
            url: Some("https://example.org/s/42".to_string()),
            co_write_url: Some("https://hackmd.io/x".to_string()),
            broadcast_ids: Some(vec!["r2".to_string(), "r3".to_string()]),
            speaker_ids: vec!["sp1".to_string(), "sp2".to_string()],
            ..minimal.clone()
        };
        assert_eq!(session_from_row(session_to_row("e", &full)).unwrap(), full);
    }

    #[test]
    fn test_named_and_speaker_rows_round_trip() {
        let room = Room {
            id: "r1".to_string(),
            name: LocalizedText::new("Hall", "大廳"),
        };
        assert_eq!(room_from_row(room_to_row("e", &room)).unwrap(), room);

        let tag = Tag {
            id: "t1".to_string(),
            name: LocalizedText::default(),
        };
        assert_eq!(tag_from_row(tag_to_row("e", &tag)).unwrap(), tag);

        let session_type = SessionType {
            id: "K".to_string(),
            name: LocalizedText::uniform("Keynote"),
        };
        assert_eq!(
            session_type_from_row(session_type_to_row("e", &session_type)).unwrap(),
            session_type
        );

        let speaker = Speaker {
            id: "sp1".to_string(),
            name: LocalizedText::new("Alice", "愛麗絲"),
            bio: LocalizedText::default(),
            avatar_url: String::new(),
        };
        assert_eq!(speaker_from_row(speaker_to_row("e", &speaker)).unwrap(), speaker);

        // Same row shape, different table
        assert!(matches!(
            tag_from_row(room_to_row("e", &room)),
            Err(MapperError::UnexpectedRow { expected: EntityKind::Tag, found: EntityKind::Room })
        ));
    }

    #[test]
    fn test_corrupt_id_column() {
        let mut row = match session_to_row("e", &bundle().sessions[0]) {
            StoredRow::Session(row) => row,
            _ => unreachable!(),
        };
        row.speaker_ids = "sp1".to_string();
        assert!(matches!(
            session_from_row(StoredRow::Session(row)),
            Err(MapperError::InvalidColumn { column: "speaker_ids", .. })
        ));
    }
}
