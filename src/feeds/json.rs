//! JSON feed reader.
//!
//! Reads a feed document from a local path or an HTTP URL. This is vidsync's
//! own ingest format rather than a third-party feed protocol: a single JSON
//! object carrying feed metadata and fully-populated video records. HTTP
//! fetches send the cached conditional tokens and a `304 Not Modified`
//! response yields an empty cursor.

use std::collections::VecDeque;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use reqwest::header;
use reqwest::StatusCode;
use serde::Deserialize;
use tracing::debug;

use super::{
    FeedError, FeedMetadata, FeedReader, FeedRequest, RemoteFeed, RemoteVideo, RemoteVideoRecord,
};

/// Wire format of a feed document.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct FeedDocument {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub webpage: Option<String>,
    #[serde(default)]
    pub description: Option<String>,
    #[serde(default)]
    pub videos: Vec<RemoteVideoRecord>,
}

/// Reader for JSON feed documents.
pub struct JsonFeedReader {
    client: reqwest::Client,
}

impl JsonFeedReader {
    pub fn new(user_agent: &str, timeout: Duration) -> Result<Self, reqwest::Error> {
        let client = reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl FeedReader for JsonFeedReader {
    async fn open_feed(&self, request: FeedRequest) -> Result<Box<dyn RemoteFeed>, FeedError> {
        Ok(Box::new(JsonFeed {
            client: self.client.clone(),
            request,
            metadata: FeedMetadata::default(),
            items: VecDeque::new(),
        }))
    }
}

struct JsonFeed {
    client: reqwest::Client,
    request: FeedRequest,
    metadata: FeedMetadata,
    items: VecDeque<RemoteVideoRecord>,
}

impl JsonFeed {
    fn is_http(&self) -> bool {
        self.request.url.starts_with("http://") || self.request.url.starts_with("https://")
    }

    /// Conditional GET of the feed document. Returns `None` on 304.
    async fn fetch_http(&mut self) -> Result<Option<FeedDocument>, FeedError> {
        let mut request = self.client.get(&self.request.url);
        if let Some(etag) = self.request.etag.as_deref() {
            request = request.header(header::IF_NONE_MATCH, etag);
        }
        if let Some(last_modified) = self.request.last_modified {
            request = request.header(header::IF_MODIFIED_SINCE, last_modified.to_rfc2822());
        }

        let response = request.send().await?;
        if response.status() == StatusCode::NOT_MODIFIED {
            debug!(url = %self.request.url, "feed not modified");
            return Ok(None);
        }
        if !response.status().is_success() {
            return Err(FeedError::Load(format!(
                "{} returned {}",
                self.request.url,
                response.status()
            )));
        }

        self.metadata.etag = header_string(&response, header::ETAG);
        self.metadata.last_modified = header_string(&response, header::LAST_MODIFIED)
            .and_then(|value| DateTime::parse_from_rfc2822(&value).ok())
            .map(|value| value.with_timezone(&Utc));

        Ok(Some(response.json::<FeedDocument>().await?))
    }
}

fn header_string(response: &reqwest::Response, name: header::HeaderName) -> Option<String> {
    response
        .headers()
        .get(name)
        .and_then(|value| value.to_str().ok())
        .map(str::to_string)
}

#[async_trait]
impl RemoteFeed for JsonFeed {
    async fn load(&mut self) -> Result<(), FeedError> {
        let document = if self.is_http() {
            match self.fetch_http().await? {
                Some(document) => document,
                None => return Ok(()),
            }
        } else {
            let raw = tokio::fs::read_to_string(&self.request.url).await?;
            serde_json::from_str(&raw)?
        };

        self.metadata.title = document.title;
        self.metadata.webpage = document.webpage;
        self.metadata.description = document.description;

        let mut videos = document.videos;
        if let Some(max_results) = self.request.max_results {
            videos.truncate(max_results as usize);
        }
        self.items = videos.into();
        Ok(())
    }

    fn metadata(&self) -> &FeedMetadata {
        &self.metadata
    }

    async fn next(&mut self) -> Result<Option<Box<dyn RemoteVideo>>, FeedError> {
        Ok(self
            .items
            .pop_front()
            .map(|record| Box::new(JsonRemoteVideo { record }) as Box<dyn RemoteVideo>))
    }
}

struct JsonRemoteVideo {
    record: RemoteVideoRecord,
}

#[async_trait]
impl RemoteVideo for JsonRemoteVideo {
    async fn load(&mut self) -> Result<(), FeedError> {
        // Feed documents carry full records; nothing further to fetch.
        Ok(())
    }

    fn record(&self) -> &RemoteVideoRecord {
        &self.record
    }

    fn record_mut(&mut self) -> &mut RemoteVideoRecord {
        &mut self.record
    }
}
