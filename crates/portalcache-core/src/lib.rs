//! Offline-first data layer for a conference portal.
//!
//! Event lists, event configurations and schedules are fetched from the
//! portal, normalized into a local store, and served cache-first. Racing
//! reads publish the cached value immediately and supersede it with the
//! server's answer.
//!
//! - `api`: the `RemoteClient` capability and its HTTP implementation
//! - `cache`: the `LocalStore` capability, on disk or in memory
//! - `mapper`: wire ↔ domain ↔ row conversions
//! - `sync`: cache/remote orchestration
//! - `portal`: `PortalFacade`, the entry point for consumers

pub mod api;
pub mod cache;
pub mod config;
pub mod error;
pub mod mapper;
pub mod models;
pub mod portal;
pub mod session;
pub mod sync;

#[cfg(test)]
mod testing;

pub use config::Config;
pub use error::PortalError;
pub use portal::{LanguagePreference, PortalFacade};
pub use sync::{Outcome, Update};
