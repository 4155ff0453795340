//! Local caching module for offline data access.
//!
//! `LocalStore` is the storage capability: whole-table replacement and reads
//! of normalized rows, partitioned by `Scope` (the global event list, or one
//! event). Two backends are provided:
//!
//! - `FileStore`: one JSON document per scope on disk, atomically replaced
//! - `MemoryStore`: process memory only
//!
//! Tables: events, event_configs, rooms, tags, session_types, speakers,
//! sessions. Attendees are never stored here.

pub mod cached;
pub mod file_store;
pub mod memory_store;
pub mod rows;
pub mod store;

pub use cached::{age_display, CachedData};
pub use file_store::FileStore;
pub use memory_store::MemoryStore;
pub use rows::{EntityKind, EventConfigRow, EventRow, NamedRow, SessionRow, SpeakerRow, StoredRow};
pub use store::{LocalStore, Scope, StoreError, Tables};
