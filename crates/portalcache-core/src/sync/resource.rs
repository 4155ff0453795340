//! The cacheable resources of the portal.
//!
//! A `Resource` knows where its rows live in the local store, how to fetch
//! itself from the server, and how to move between its domain value and rows.

use async_trait::async_trait;

use crate::api::RemoteClient;
use crate::cache::{EntityKind, Scope, Tables};
use crate::error::PortalError;
use crate::mapper::{self, MapperError};
use crate::models::{Event, EventConfig, Schedule};

#[async_trait]
pub trait Resource: Send + Sync {
    type Output: Clone + Send + Sync + 'static;

    /// Store partition holding the rows
    fn scope(&self) -> Scope;

    /// Tables replaced together on refresh
    fn kinds(&self) -> &'static [EntityKind];

    /// Fetch from the server and convert to a domain value
    async fn download(&self, remote: &dyn RemoteClient) -> Result<Self::Output, PortalError>;

    fn to_tables(&self, value: &Self::Output) -> Result<Tables, MapperError>;

    /// Rebuild the value from stored rows. `None` means nothing is cached.
    fn from_tables(&self, tables: Tables) -> Result<Option<Self::Output>, MapperError>;
}

/// The global event list
#[derive(Debug, Clone, Copy, Default)]
pub struct EventList;

#[async_trait]
impl Resource for EventList {
    type Output = Vec<Event>;

    fn scope(&self) -> Scope {
        Scope::Global
    }

    fn kinds(&self) -> &'static [EntityKind] {
        &[EntityKind::Event]
    }

    async fn download(&self, remote: &dyn RemoteClient) -> Result<Vec<Event>, PortalError> {
        let events = remote.fetch_events().await?;
        Ok(events.into_iter().map(mapper::event_from_wire).collect())
    }

    fn to_tables(&self, events: &Vec<Event>) -> Result<Tables, MapperError> {
        Ok(Tables::new().with(
            EntityKind::Event,
            events.iter().map(mapper::event_to_row).collect(),
        ))
    }

    fn from_tables(&self, mut tables: Tables) -> Result<Option<Vec<Event>>, MapperError> {
        let events = mapper::events_from_rows(tables.take(EntityKind::Event))?;
        Ok((!events.is_empty()).then_some(events))
    }
}

/// One event's configuration
#[derive(Debug, Clone)]
pub struct EventConfigResource {
    pub event_id: String,
}

impl EventConfigResource {
    pub fn new(event_id: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
        }
    }
}

#[async_trait]
impl Resource for EventConfigResource {
    type Output = EventConfig;

    fn scope(&self) -> Scope {
        Scope::event(&self.event_id)
    }

    fn kinds(&self) -> &'static [EntityKind] {
        &[EntityKind::EventConfig]
    }

    async fn download(&self, remote: &dyn RemoteClient) -> Result<EventConfig, PortalError> {
        let wire = remote.fetch_event_config(&self.event_id).await?;
        Ok(mapper::config_from_wire(wire)?)
    }

    fn to_tables(&self, config: &EventConfig) -> Result<Tables, MapperError> {
        Ok(Tables::new().with(EntityKind::EventConfig, vec![mapper::config_to_row(config)?]))
    }

    fn from_tables(&self, mut tables: Tables) -> Result<Option<EventConfig>, MapperError> {
        tables
            .take(EntityKind::EventConfig)
            .into_iter()
            .next()
            .map(mapper::config_from_row)
            .transpose()
    }
}

/// One event's schedule. Values come out with session rooms resolved.
#[derive(Debug, Clone)]
pub struct ScheduleResource {
    pub event_id: String,
    /// Where the bundle is fetched from, taken from the schedule feature
    pub url: String,
}

impl ScheduleResource {
    pub fn new(event_id: impl Into<String>, url: impl Into<String>) -> Self {
        Self {
            event_id: event_id.into(),
            url: url.into(),
        }
    }
}

#[async_trait]
impl Resource for ScheduleResource {
    type Output = Schedule;

    fn scope(&self) -> Scope {
        Scope::event(&self.event_id)
    }

    fn kinds(&self) -> &'static [EntityKind] {
        &EntityKind::SCHEDULE
    }

    async fn download(&self, remote: &dyn RemoteClient) -> Result<Schedule, PortalError> {
        let wire = remote.fetch_schedule(&self.url).await?;
        Ok(mapper::schedule_from_wire(wire)?.with_resolved_rooms())
    }

    fn to_tables(&self, schedule: &Schedule) -> Result<Tables, MapperError> {
        Ok(mapper::schedule_to_tables(&self.event_id, schedule))
    }

    fn from_tables(&self, tables: Tables) -> Result<Option<Schedule>, MapperError> {
        let schedule = mapper::schedule_from_tables(tables)?;
        Ok((!schedule.is_empty()).then(|| schedule.with_resolved_rooms()))
    }
}
