//! Domain models for conference portal data.
//!
//! These are the values handed to callers. They are immutable snapshots:
//! a refresh replaces them, nothing mutates them in place.
//!
//! - `Event`, `EventConfig`, `Feature`: the event list and per-event setup
//! - `Schedule` with `Session`, `Speaker`, `Room`, `Tag`, `SessionType`
//! - `Attendee`, `Scenario`: ticket status, never persisted
//! - `LocalizedText`, `Language`: bilingual strings and display language

pub mod attendee;
pub mod event;
pub mod localized;
pub mod schedule;

pub use attendee::{Attendee, Scenario};
pub use event::{Event, EventConfig, Feature, FeatureKind, TimeWindow, WifiNetwork};
pub use localized::{Language, LocalizedText};
pub use schedule::{Room, Schedule, Session, SessionType, Speaker, Tag};
