//! Cache/remote orchestration.
//!
//! - `SyncCoordinator`: cache-first reads, forced reloads, racing reads
//! - `Resource`: one cacheable unit (event list, event config, schedule)
//! - `race`: the first-then-authoritative combinator behind racing reads

pub mod coordinator;
pub mod race;
pub mod resource;

pub use coordinator::SyncCoordinator;
pub use race::{first_then_authoritative, Outcome, Update};
pub use resource::{EventConfigResource, EventList, Resource, ScheduleResource};
