//! Feed reader abstraction.
//!
//! vidsync does not parse third-party feed formats itself. Fetching and
//! parsing are delegated to a [`FeedReader`] implementation, which hands the
//! import engine a lazy, forward-only cursor of remote video records. Two
//! implementations ship with the crate: [`json`] for feed documents over HTTP
//! or on disk, and [`memory`] for scripted feeds in tests.

pub mod json;
pub mod memory;

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Errors from the feed reading collaborator.
#[derive(Debug, Error)]
pub enum FeedError {
    #[error("failed to open feed: {0}")]
    Open(String),

    #[error("failed to load feed: {0}")]
    Load(String),

    #[error("failed to load feed item: {0}")]
    Item(String),

    #[error(transparent)]
    Http(#[from] reqwest::Error),

    #[error(transparent)]
    Io(#[from] std::io::Error),

    #[error("failed to parse feed document: {0}")]
    Parse(#[from] serde_json::Error),
}

/// Parameters for opening a remote feed.
#[derive(Debug, Clone, Default)]
pub struct FeedRequest {
    pub url: String,
    /// Cap on the number of items the cursor will yield.
    pub max_results: Option<u32>,
    /// Service API keys, passed through to readers that need them.
    pub api_keys: HashMap<String, String>,
    /// Conditional-fetch tokens cached from the previous import.
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
}

/// Feed-level data available once a feed has been loaded.
#[derive(Debug, Clone, Default)]
pub struct FeedMetadata {
    pub etag: Option<String>,
    pub last_modified: Option<DateTime<Utc>>,
    pub title: Option<String>,
    pub webpage: Option<String>,
    pub description: Option<String>,
}

/// One file variant offered by a remote video record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteVideoFile {
    pub url: String,
    #[serde(default)]
    pub length: Option<u64>,
    #[serde(default)]
    pub mime_type: Option<String>,
    /// Expiring URLs are unstable; they contribute neither fingerprints nor
    /// stored file rows.
    #[serde(default)]
    pub expires: Option<DateTime<Utc>>,
}

/// The data of one remote video record.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct RemoteVideoRecord {
    #[serde(default)]
    pub url: Option<String>,
    #[serde(default)]
    pub link: Option<String>,
    #[serde(default)]
    pub embed_code: Option<String>,
    #[serde(default)]
    pub flash_enclosure_url: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub guid: Option<String>,
    #[serde(default)]
    pub user: Option<String>,
    #[serde(default)]
    pub user_url: Option<String>,
    #[serde(default)]
    pub thumbnail_url: Option<String>,
    #[serde(default)]
    pub publish_datetime: Option<DateTime<Utc>>,
    #[serde(default)]
    pub files: Vec<RemoteVideoFile>,
}

/// One element yielded by a feed cursor.
///
/// Feeds may yield lightweight stubs; callers must [`load`](RemoteVideo::load)
/// an item before reading its record.
#[async_trait]
pub trait RemoteVideo: Send {
    /// Fetch the item's full data.
    async fn load(&mut self) -> Result<(), FeedError>;

    fn record(&self) -> &RemoteVideoRecord;

    fn record_mut(&mut self) -> &mut RemoteVideoRecord;
}

/// A lazy, forward-only, finite sequence of remote video records.
#[async_trait]
pub trait RemoteFeed: Send {
    /// Fetch feed-level data. Must be called before [`metadata`](Self::metadata)
    /// or [`next`](Self::next).
    async fn load(&mut self) -> Result<(), FeedError>;

    fn metadata(&self) -> &FeedMetadata;

    /// Advance the cursor. `Ok(None)` marks the end of the sequence.
    async fn next(&mut self) -> Result<Option<Box<dyn RemoteVideo>>, FeedError>;
}

/// Factory for remote feed cursors.
#[async_trait]
pub trait FeedReader: Send + Sync {
    async fn open_feed(&self, request: FeedRequest) -> Result<Box<dyn RemoteFeed>, FeedError>;
}
