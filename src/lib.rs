//! vidsync: video feed import, deduplication, and publication.
//!
//! The core is the feed import engine
//! ([`services::ImportService`]): it pulls remote video records from an
//! external feed reader, skips previously-seen content via per-feed
//! fingerprints, converts new items into durable video rows with their file
//! variants, logs a step per outcome, and batch-transitions each run's
//! videos into `published` or `needs moderation` depending on the feed's
//! moderation policy.
//!
//! Feed fetching and parsing are delegated to a [`feeds::FeedReader`]
//! implementation; persistence is SQLite through Diesel.

pub mod config;
pub mod error;
pub mod feeds;
pub mod models;
pub mod repository;
pub mod schema;
pub mod services;

pub use error::Error;
