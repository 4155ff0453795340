//! The entry point for UI-layer consumers.
//!
//! `PortalFacade` wraps the sync coordinator with the portal's resources,
//! resolves cross-references at the read boundary, and serves sub-entity
//! lookups straight from the local store.

use std::sync::Arc;

use anyhow::Context;
use chrono::Utc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::api::{ApiClient, RemoteClient};
use crate::cache::{age_display, EntityKind, FileStore, LocalStore, Scope, StoredRow, Tables};
use crate::config::Config;
use crate::error::PortalError;
use crate::mapper::{self, MapperError};
use crate::models::{
    Attendee, Event, EventConfig, Language, LocalizedText, Room, Schedule, Session, SessionType,
    Speaker, Tag,
};
use crate::session::AttendeeSessions;
use crate::sync::{EventConfigResource, EventList, Outcome, ScheduleResource, SyncCoordinator, Update};

/// Returns the preferred language code ("en", "zh-TW", ...)
pub type LanguagePreference = Arc<dyn Fn() -> String + Send + Sync>;

pub struct PortalFacade {
    sync: SyncCoordinator,
    attendees: AttendeeSessions,
    language: LanguagePreference,
}

impl PortalFacade {
    /// Display language follows `LANG` until `with_language` is called
    pub fn new(remote: Arc<dyn RemoteClient>, store: Arc<dyn LocalStore>) -> Self {
        Self {
            sync: SyncCoordinator::new(remote, store),
            attendees: AttendeeSessions::new(),
            language: Arc::new(|| std::env::var("LANG").unwrap_or_default()),
        }
    }

    /// HTTP client and on-disk store as described by `config`
    pub fn open(config: &Config) -> anyhow::Result<Self> {
        let remote = ApiClient::with_base_url(&config.portal_base_url, config.request_timeout_secs)
            .context("Failed to create API client")?;
        let cache_dir = config.cache_dir()?;
        let store = FileStore::new(cache_dir.clone())
            .with_context(|| format!("Failed to open cache at {}", cache_dir.display()))?;
        let language = config.language_code();

        Ok(Self::new(Arc::new(remote), Arc::new(store)).with_language(move || language.clone()))
    }

    pub fn with_language(mut self, preference: impl Fn() -> String + Send + Sync + 'static) -> Self {
        self.language = Arc::new(preference);
        self
    }

    pub fn coordinator(&self) -> &SyncCoordinator {
        &self.sync
    }

    // ===== Events =====

    pub async fn get_events(&self, force_reload: bool) -> Result<Vec<Event>, PortalError> {
        self.sync.fetch(&EventList, force_reload).await
    }

    pub async fn watch_events(
        &self,
        updates: &mpsc::Sender<Update<Vec<Event>>>,
    ) -> Result<Outcome<Vec<Event>, PortalError>, PortalError> {
        self.sync.fetch_racing(&EventList, updates).await
    }

    // ===== Event config =====

    pub async fn get_event_config(&self, event_id: &str, force_reload: bool) -> Result<EventConfig, PortalError> {
        self.sync
            .fetch(&EventConfigResource::new(event_id), force_reload)
            .await
    }

    pub async fn watch_event_config(
        &self,
        event_id: &str,
        updates: &mpsc::Sender<Update<EventConfig>>,
    ) -> Result<Outcome<EventConfig, PortalError>, PortalError> {
        self.sync
            .fetch_racing(&EventConfigResource::new(event_id), updates)
            .await
    }

    // ===== Schedule =====

    /// The schedule's location comes from the event config, read cache-first.
    /// `None` when the event has no schedule feature.
    async fn schedule_resource(&self, event_id: &str) -> Result<Option<ScheduleResource>, PortalError> {
        let config = self.get_event_config(event_id, false).await?;
        match config.schedule_url() {
            Some(url) => Ok(Some(ScheduleResource::new(event_id, url))),
            None => {
                debug!(event_id, "Event has no schedule feature");
                Ok(None)
            }
        }
    }

    /// Sessions come back with `room` resolved
    pub async fn get_schedule(&self, event_id: &str, force_reload: bool) -> Result<Option<Schedule>, PortalError> {
        let Some(resource) = self.schedule_resource(event_id).await? else {
            return Ok(None);
        };
        self.sync.fetch(&resource, force_reload).await.map(Some)
    }

    pub async fn watch_schedule(
        &self,
        event_id: &str,
        updates: &mpsc::Sender<Update<Schedule>>,
    ) -> Result<Option<Outcome<Schedule, PortalError>>, PortalError> {
        let Some(resource) = self.schedule_resource(event_id).await? else {
            return Ok(None);
        };
        self.sync.fetch_racing(&resource, updates).await.map(Some)
    }

    /// Force-refresh config and schedule of each event, concurrently, so
    /// they can be read offline later. Failures are per event.
    pub async fn prefetch(&self, event_ids: &[String]) -> Vec<(String, Result<(), PortalError>)> {
        info!(count = event_ids.len(), "Prefetching events");
        let tasks = event_ids.iter().map(|event_id| async move {
            let result = self.prefetch_event(event_id).await;
            if let Err(e) = &result {
                warn!(event_id = %event_id, error = %e, "Prefetch failed");
            }
            (event_id.clone(), result)
        });
        futures::future::join_all(tasks).await
    }

    async fn prefetch_event(&self, event_id: &str) -> Result<(), PortalError> {
        let config = self.get_event_config(event_id, true).await?;
        if let Some(url) = config.schedule_url() {
            self.sync.refresh(&ScheduleResource::new(event_id, url)).await?;
        }
        Ok(())
    }

    // ===== Lookups (cache only) =====

    async fn lookup<T>(
        &self,
        event_id: &str,
        kind: EntityKind,
        id: &str,
        convert: fn(StoredRow) -> Result<T, MapperError>,
    ) -> Option<T> {
        let scope = Scope::event(event_id);
        let row = match self.sync.store().read(&scope, kind, id).await {
            Ok(row) => row?,
            Err(e) => {
                warn!(%scope, %kind, id, error = %e, "Cache read failed");
                return None;
            }
        };
        match convert(row) {
            Ok(value) => Some(value),
            Err(e) => {
                warn!(%scope, %kind, id, error = %e, "Cached row unreadable");
                None
            }
        }
    }

    pub async fn get_speaker(&self, event_id: &str, speaker_id: &str) -> Option<Speaker> {
        self.lookup(event_id, EntityKind::Speaker, speaker_id, mapper::speaker_from_row)
            .await
    }

    /// The session with its room resolved, if the room is cached. Both come
    /// from the same snapshot.
    pub async fn get_session(&self, event_id: &str, session_id: &str) -> Option<Session> {
        let scope = Scope::event(event_id);
        let mut tables = match self
            .sync
            .store()
            .read_many(&scope, &[EntityKind::Session, EntityKind::Room])
            .await
        {
            Ok(tables) => tables,
            Err(e) => {
                warn!(%scope, id = session_id, error = %e, "Cache read failed");
                return None;
            }
        };

        let row = take_row(&mut tables, EntityKind::Session, session_id)?;
        let mut session = match mapper::session_from_row(row) {
            Ok(session) => session,
            Err(e) => {
                warn!(%scope, id = session_id, error = %e, "Cached session unreadable");
                return None;
            }
        };
        session.room = take_row(&mut tables, EntityKind::Room, &session.room_id)
            .and_then(|row| mapper::room_from_row(row).ok());
        Some(session)
    }

    pub async fn get_room(&self, event_id: &str, room_id: &str) -> Option<Room> {
        self.lookup(event_id, EntityKind::Room, room_id, mapper::room_from_row)
            .await
    }

    pub async fn get_tag(&self, event_id: &str, tag_id: &str) -> Option<Tag> {
        self.lookup(event_id, EntityKind::Tag, tag_id, mapper::tag_from_row)
            .await
    }

    pub async fn get_session_type(&self, event_id: &str, type_id: &str) -> Option<SessionType> {
        self.lookup(event_id, EntityKind::SessionType, type_id, mapper::session_type_from_row)
            .await
    }

    // ===== Attendee =====

    /// Ticket status, held in memory per (event, token)
    pub async fn get_attendee(&self, event_id: &str, token: &str, force_reload: bool) -> Result<Attendee, PortalError> {
        if !force_reload {
            if let Some(cached) = self.attendees.get(event_id, token) {
                debug!(event_id, age = %cached.age_display(), "Attendee from session");
                return Ok(cached.data);
            }
        }

        let wire = self.sync.remote().fetch_attendee(event_id, token).await?;
        let attendee = mapper::attendee_from_wire(wire);
        self.attendees.update(event_id, token, attendee.clone());
        Ok(attendee)
    }

    pub fn forget_attendee(&self, event_id: &str, token: &str) -> bool {
        self.attendees.forget(event_id, token)
    }

    // ===== Display =====

    pub fn language(&self) -> Language {
        Language::from_code(&(self.language)())
    }

    pub fn display<'a>(&self, text: &'a LocalizedText) -> &'a str {
        mapper::localize(text, self.language.as_ref())
    }

    /// Age of the cached event list (`None`) or of one event's data
    pub async fn cache_age(&self, event_id: Option<&str>) -> Option<String> {
        let scope = event_id.map(Scope::event).unwrap_or(Scope::Global);
        match self.sync.store().cached_at(&scope).await {
            Ok(cached_at) => cached_at.map(|at| age_display(at, Utc::now())),
            Err(e) => {
                warn!(%scope, error = %e, "Failed to read cache age");
                None
            }
        }
    }
}

fn take_row(tables: &mut Tables, kind: EntityKind, id: &str) -> Option<StoredRow> {
    tables.take(kind).into_iter().find(|row| row.id() == id)
}
