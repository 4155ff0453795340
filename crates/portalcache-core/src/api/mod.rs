//! REST API client module for the conference portal.
//!
//! This module provides the `RemoteClient` capability, its HTTP
//! implementation `ApiClient`, and the raw response shapes in `wire`.
//!
//! None of the endpoints used here require authentication except the
//! attendee status lookup, which takes the ticket token as a query parameter.

pub mod client;
pub mod error;
pub mod wire;

pub use client::{ApiClient, RemoteClient, DEFAULT_BASE_URL, DEFAULT_REQUEST_TIMEOUT_SECS};
pub use error::ApiError;
