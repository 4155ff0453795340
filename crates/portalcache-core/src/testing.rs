//! In-crate fakes for exercising the sync layer without a network or disk.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::Mutex;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::api::wire::{
    AttendeeWire, EventConfigWire, EventWire, FeatureWire, NameBlock, NamedWire, ScheduleWire,
    SessionBlock, SessionWire, SpeakerBlock, SpeakerWire, WireId,
};
use crate::api::{ApiError, RemoteClient};
use crate::cache::{EntityKind, LocalStore, MemoryStore, Scope, StoreError, Tables};
use crate::models::LocalizedText;

pub const SCHEDULE_URL: &str = "https://example.org/sitcon2025/session.json";

/// Scripted `RemoteClient` counting every call
#[derive(Default)]
pub struct FakeRemote {
    events: Mutex<Vec<EventWire>>,
    configs: Mutex<HashMap<String, EventConfigWire>>,
    schedules: Mutex<HashMap<String, ScheduleWire>>,
    attendees: Mutex<HashMap<(String, String), AttendeeWire>>,
    fail: AtomicBool,
    delay: Mutex<Duration>,
    event_calls: AtomicUsize,
    config_calls: AtomicUsize,
    schedule_calls: AtomicUsize,
    attendee_calls: AtomicUsize,
}

impl FakeRemote {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn set_events(&self, events: Vec<EventWire>) {
        *self.events.lock().unwrap() = events;
    }

    pub fn set_config(&self, config: EventConfigWire) {
        self.configs.lock().unwrap().insert(config.id.clone(), config);
    }

    pub fn set_schedule(&self, url: &str, schedule: ScheduleWire) {
        self.schedules.lock().unwrap().insert(url.to_string(), schedule);
    }

    pub fn set_attendee(&self, attendee: AttendeeWire) {
        let key = (attendee.event_id.clone(), attendee.token.clone());
        self.attendees.lock().unwrap().insert(key, attendee);
    }

    /// Make every request fail with a server error
    pub fn fail_all(&self, fail: bool) {
        self.fail.store(fail, Ordering::SeqCst);
    }

    /// Delay every response
    pub fn set_delay(&self, delay: Duration) {
        *self.delay.lock().unwrap() = delay;
    }

    pub fn event_calls(&self) -> usize {
        self.event_calls.load(Ordering::SeqCst)
    }

    pub fn config_calls(&self) -> usize {
        self.config_calls.load(Ordering::SeqCst)
    }

    pub fn schedule_calls(&self) -> usize {
        self.schedule_calls.load(Ordering::SeqCst)
    }

    pub fn attendee_calls(&self) -> usize {
        self.attendee_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.event_calls() + self.config_calls() + self.schedule_calls() + self.attendee_calls()
    }

    async fn respond<T>(&self, counter: &AtomicUsize, found: Option<T>, path: &str) -> Result<T, ApiError> {
        counter.fetch_add(1, Ordering::SeqCst);
        let delay = *self.delay.lock().unwrap();
        if !delay.is_zero() {
            tokio::time::sleep(delay).await;
        }
        if self.fail.load(Ordering::SeqCst) {
            return Err(ApiError::ServerError("scripted failure".to_string()));
        }
        found.ok_or_else(|| ApiError::NotFound(path.to_string()))
    }
}

#[async_trait]
impl RemoteClient for FakeRemote {
    async fn fetch_events(&self) -> Result<Vec<EventWire>, ApiError> {
        let events = self.events.lock().unwrap().clone();
        self.respond(&self.event_calls, Some(events), "/events/").await
    }

    async fn fetch_event_config(&self, event_id: &str) -> Result<EventConfigWire, ApiError> {
        let config = self.configs.lock().unwrap().get(event_id).cloned();
        self.respond(&self.config_calls, config, event_id).await
    }

    async fn fetch_schedule(&self, url: &str) -> Result<ScheduleWire, ApiError> {
        let schedule = self.schedules.lock().unwrap().get(url).cloned();
        self.respond(&self.schedule_calls, schedule, url).await
    }

    async fn fetch_attendee(&self, event_id: &str, token: &str) -> Result<AttendeeWire, ApiError> {
        let key = (event_id.to_string(), token.to_string());
        let attendee = self.attendees.lock().unwrap().get(&key).cloned();
        self.respond(&self.attendee_calls, attendee, event_id).await
    }
}

/// `MemoryStore` whose reads and writes can be made to fail
#[derive(Default)]
pub struct FlakyStore {
    inner: MemoryStore,
    fail_reads: AtomicBool,
    fail_writes: AtomicBool,
}

impl FlakyStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fail_reads(&self, fail: bool) {
        self.fail_reads.store(fail, Ordering::SeqCst);
    }

    pub fn fail_writes(&self, fail: bool) {
        self.fail_writes.store(fail, Ordering::SeqCst);
    }

    fn check(flag: &AtomicBool) -> Result<(), StoreError> {
        if flag.load(Ordering::SeqCst) {
            Err(StoreError::Poisoned)
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl LocalStore for FlakyStore {
    async fn replace_many(&self, scope: &Scope, tables: Tables) -> Result<(), StoreError> {
        Self::check(&self.fail_writes)?;
        self.inner.replace_many(scope, tables).await
    }

    async fn read_many(&self, scope: &Scope, kinds: &[EntityKind]) -> Result<Tables, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.read_many(scope, kinds).await
    }

    async fn cached_at(&self, scope: &Scope) -> Result<Option<DateTime<Utc>>, StoreError> {
        Self::check(&self.fail_reads)?;
        self.inner.cached_at(scope).await
    }
}

// ===== Fixtures =====

pub fn sitcon_config() -> EventConfigWire {
    EventConfigWire {
        id: "sitcon2025".to_string(),
        name: LocalizedText::new("SITCON 2025", "SITCON 2025"),
        logo_url: "https://example.org/sitcon.png".to_string(),
        date: None,
        website: None,
        publish: None,
        features: vec![],
    }
}

/// `sitcon_config` with a schedule feature pointing at `SCHEDULE_URL`
pub fn sitcon_config_with_schedule() -> EventConfigWire {
    EventConfigWire {
        features: vec![FeatureWire {
            feature: "schedule".to_string(),
            display_text: LocalizedText::new("Schedule", "議程"),
            icon: None,
            url: Some(SCHEDULE_URL.to_string()),
            visible_roles: None,
            wifi: None,
        }],
        ..sitcon_config()
    }
}

pub fn named(id: &str, en: &str, zh: &str) -> NamedWire {
    NamedWire {
        id: id.to_string(),
        en: NameBlock { name: en.to_string() },
        zh: NameBlock { name: zh.to_string() },
    }
}

/// One session `s1` in room `r1` ("Room A") given by speaker `sp1`
pub fn sample_schedule_wire() -> ScheduleWire {
    ScheduleWire {
        sessions: vec![SessionWire {
            id: WireId::Text("s1".to_string()),
            type_id: Some("talk".to_string()),
            room: "r1".to_string(),
            start: "2025-03-08T10:00:00+08:00".to_string(),
            end: "2025-03-08T10:40:00+08:00".to_string(),
            language: None,
            en: SessionBlock {
                title: "Intro to Rust".to_string(),
                description: String::new(),
            },
            zh: SessionBlock {
                title: "Rust 入門".to_string(),
                description: String::new(),
            },
            speakers: vec!["sp1".to_string()],
            tags: Some(vec!["t1".to_string()]),
            co_write: None,
            qa: None,
            slide: None,
            live: None,
            record: None,
            uri: None,
            broadcast: None,
        }],
        speakers: vec![SpeakerWire {
            id: Some("sp1".to_string()),
            avatar: "https://example.org/sp1.png".to_string(),
            en: SpeakerBlock {
                name: "Alice".to_string(),
                bio: "Rustacean".to_string(),
            },
            zh: SpeakerBlock {
                name: "愛麗絲".to_string(),
                bio: "Rust 愛好者".to_string(),
            },
        }],
        session_types: vec![named("talk", "Talk", "演講")],
        rooms: vec![named("r1", "Room A", "A 廳")],
        tags: vec![named("t1", "Beginner", "入門")],
    }
}
