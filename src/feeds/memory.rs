//! Scripted in-memory feed reader.
//!
//! Serves pre-built records and injected failures without any I/O. Used by
//! the engine's own tests; also handy for exercising downstream listeners.

use std::collections::{HashMap, VecDeque};
use std::sync::Mutex;

use async_trait::async_trait;

use super::{
    FeedError, FeedMetadata, FeedReader, FeedRequest, RemoteFeed, RemoteVideo, RemoteVideoRecord,
};

/// One scripted element of a feed.
#[derive(Debug, Clone)]
pub enum ScriptedItem {
    /// A record that loads successfully.
    Video(RemoteVideoRecord),
    /// An item whose detail load fails with the given message.
    LoadFailure(String),
    /// The cursor itself fails at this position.
    CursorFailure(String),
}

/// Script for a single feed URL.
#[derive(Debug, Clone, Default)]
pub struct FeedScript {
    pub metadata: FeedMetadata,
    pub items: Vec<ScriptedItem>,
    /// Fail the feed-level load with this message.
    pub fail_load: Option<String>,
}

/// Scripted reader. Each `open_feed` re-serves the script from the start, so
/// repeated runs against the same URL see the same sequence.
#[derive(Default)]
pub struct MemoryFeedReader {
    scripts: Mutex<HashMap<String, FeedScript>>,
}

impl MemoryFeedReader {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_feed(&self, url: &str, script: FeedScript) {
        self.scripts
            .lock()
            .expect("feed script lock poisoned")
            .insert(url.to_string(), script);
    }
}

#[async_trait]
impl FeedReader for MemoryFeedReader {
    async fn open_feed(&self, request: FeedRequest) -> Result<Box<dyn RemoteFeed>, FeedError> {
        let script = self
            .scripts
            .lock()
            .expect("feed script lock poisoned")
            .get(&request.url)
            .cloned()
            .ok_or_else(|| FeedError::Open(format!("no feed scripted for {}", request.url)))?;

        let mut items: VecDeque<ScriptedItem> = script.items.into();
        if let Some(max_results) = request.max_results {
            items.truncate(max_results as usize);
        }

        Ok(Box::new(MemoryFeed {
            metadata: script.metadata,
            fail_load: script.fail_load,
            items,
        }))
    }
}

struct MemoryFeed {
    metadata: FeedMetadata,
    fail_load: Option<String>,
    items: VecDeque<ScriptedItem>,
}

#[async_trait]
impl RemoteFeed for MemoryFeed {
    async fn load(&mut self) -> Result<(), FeedError> {
        match self.fail_load.take() {
            Some(message) => Err(FeedError::Load(message)),
            None => Ok(()),
        }
    }

    fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    async fn next(&mut self) -> Result<Option<Box<dyn RemoteVideo>>, FeedError> {
        match self.items.pop_front() {
            None => Ok(None),
            Some(ScriptedItem::CursorFailure(message)) => Err(FeedError::Load(message)),
            Some(ScriptedItem::Video(record)) => Ok(Some(Box::new(MemoryRemoteVideo {
                record,
                fail_load: None,
            }))),
            Some(ScriptedItem::LoadFailure(message)) => Ok(Some(Box::new(MemoryRemoteVideo {
                record: RemoteVideoRecord::default(),
                fail_load: Some(message),
            }))),
        }
    }
}

struct MemoryRemoteVideo {
    record: RemoteVideoRecord,
    fail_load: Option<String>,
}

#[async_trait]
impl RemoteVideo for MemoryRemoteVideo {
    async fn load(&mut self) -> Result<(), FeedError> {
        match self.fail_load.take() {
            Some(message) => Err(FeedError::Item(message)),
            None => Ok(()),
        }
    }

    fn record(&self) -> &RemoteVideoRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut RemoteVideoRecord {
        &mut self.record
    }
}
