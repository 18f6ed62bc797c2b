//! Persistence layer.
//!
//! SQLite through sync Diesel with r2d2 pooling, wrapped in `spawn_blocking`
//! for use from async code. One repository struct per aggregate; timestamps
//! are stored as RFC 3339 text.

pub mod diesel_feed;
pub mod diesel_import;
pub mod diesel_models;
pub mod diesel_pool;
pub mod diesel_video;
pub mod migrations;

pub use diesel_feed::{FeedRepository, SiteRepository};
pub use diesel_import::ImportRepository;
pub use diesel_pool::{create_pool, create_pool_from_url, DbPool};
pub use diesel_video::VideoRepository;

use chrono::{DateTime, Utc};

/// Parse a stored RFC 3339 timestamp, falling back to now for unparseable
/// values (which only appear if the database was edited by hand).
pub(crate) fn parse_datetime(value: &str) -> DateTime<Utc> {
    DateTime::parse_from_rfc3339(value)
        .map(|parsed| parsed.with_timezone(&Utc))
        .unwrap_or_else(|_| Utc::now())
}

pub(crate) fn parse_datetime_opt(value: Option<String>) -> Option<DateTime<Utc>> {
    value
        .as_deref()
        .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
        .map(|parsed| parsed.with_timezone(&Utc))
}
