//! The feed import engine.
//!
//! One [`ImportService::start_import`] call executes one run against a feed:
//! open the remote cursor, walk it item by item, convert new items into
//! video rows, log an outcome step per event, then finalize the batch's
//! publication state. A run always reaches completion; failures along the
//! way become durable step records instead of surfacing to the caller.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};

use super::builder::{BuildOptions, RecordBuilder};
use super::identity::IdentifierIndex;
use super::listeners::ImportHooks;
use super::publish::PublicationGate;
use crate::error::Error;
use crate::feeds::{FeedReader, FeedRequest, RemoteFeed, RemoteVideo};
use crate::models::{Feed, FeedImport, Site, StepKind, ValidationError, Video, VideoStatus};
use crate::repository::diesel_pool::DbPool;
use crate::repository::{FeedRepository, ImportRepository, VideoRepository};

/// Engine-level options shared by every run.
#[derive(Debug, Clone)]
pub struct ImportOptions {
    /// Cap on items pulled per run; `None` walks the whole feed.
    pub max_results: Option<u32>,
    /// Service API keys handed to the feed reader.
    pub api_keys: HashMap<String, String>,
    /// Site associated with imported videos when their feed has none.
    pub default_site: Site,
}

enum ItemOutcome {
    Imported,
    Seen,
}

/// Runs feed imports.
///
/// Runs for the same feed are serialized by an in-process lock; exclusion
/// across processes is the caller's responsibility. Runs for different
/// feeds may execute concurrently from separate tasks.
pub struct ImportService {
    feeds: FeedRepository,
    videos: VideoRepository,
    imports: ImportRepository,
    identity: IdentifierIndex,
    builder: RecordBuilder,
    gate: PublicationGate,
    hooks: ImportHooks,
    reader: Arc<dyn FeedReader>,
    options: ImportOptions,
    feed_locks: tokio::sync::Mutex<HashMap<String, Arc<tokio::sync::Mutex<()>>>>,
}

impl ImportService {
    pub fn new(
        pool: DbPool,
        reader: Arc<dyn FeedReader>,
        hooks: ImportHooks,
        options: ImportOptions,
    ) -> Self {
        let imports = ImportRepository::new(pool.clone());
        Self {
            feeds: FeedRepository::new(pool.clone()),
            videos: VideoRepository::new(pool),
            identity: IdentifierIndex::new(imports.clone()),
            imports,
            builder: RecordBuilder::new(hooks.clone(), options.default_site.clone()),
            gate: PublicationGate::new(hooks.clone()),
            hooks,
            reader,
            options,
            feed_locks: tokio::sync::Mutex::new(HashMap::new()),
        }
    }

    /// Create and execute one import run for the feed, returning the
    /// completed run. Item-level failures are recorded as steps, not
    /// returned; only a missing feed or a storage failure surfaces here.
    pub async fn start_import(&self, feed_id: &str) -> Result<FeedImport, Error> {
        let feed = self
            .feeds
            .get(feed_id)
            .await?
            .ok_or_else(|| Error::FeedNotFound(feed_id.to_string()))?;

        let lock = self.feed_lock(feed_id).await;
        let _guard = lock.lock().await;

        let mut run = self.imports.create_run(feed_id).await?;
        info!(feed = %feed.id, run = run.id, url = %feed.original_url, "starting feed import");
        self.execute(feed, &mut run).await?;
        info!(run = run.id, "feed import finished: {}", run.summary());
        Ok(run)
    }

    async fn execute(&self, mut feed: Feed, run: &mut FeedImport) -> Result<(), Error> {
        match self.open_cursor(&mut feed).await {
            Ok(mut cursor) => loop {
                match cursor.next().await {
                    Ok(Some(mut item)) => {
                        let outcome = self.import_item(&feed, run, item.as_mut()).await;
                        if let Err(ref error) = outcome {
                            self.record_step(run, StepKind::VideoErrored, None, &error.to_string())
                                .await?;
                        }
                        // Persist counters and timestamp after every item so
                        // progress survives a crash mid-run.
                        self.touch_run(run).await?;
                        if matches!(outcome, Ok(ItemOutcome::Seen)) && feed.stop_if_seen {
                            debug!(run = run.id, "stopping at first seen item");
                            break;
                        }
                    }
                    Ok(None) => break,
                    Err(error) => {
                        self.record_step(run, StepKind::ImportErrored, None, &error.to_string())
                            .await?;
                        self.touch_run(run).await?;
                        break;
                    }
                }
            },
            Err(error) => {
                self.record_step(run, StepKind::ImportErrored, None, &error.to_string())
                    .await?;
            }
        }

        self.finalize(&feed, run).await
    }

    /// Open the remote cursor, force feed-level metadata, and fold it back
    /// into the feed.
    async fn open_cursor(&self, feed: &mut Feed) -> Result<Box<dyn RemoteFeed>, Error> {
        let request = FeedRequest {
            url: feed.original_url.clone(),
            max_results: self.options.max_results,
            api_keys: self.options.api_keys.clone(),
            etag: (!feed.external_etag.is_empty()).then(|| feed.external_etag.clone()),
            last_modified: feed.external_last_modified,
        };

        let mut cursor = self.reader.open_feed(request).await?;
        cursor.load().await?;

        if feed.apply_feed_metadata(cursor.metadata()) {
            feed.updated_at = Utc::now();
            self.feeds.save(feed).await?;
        }

        Ok(cursor)
    }

    async fn import_item(
        &self,
        feed: &Feed,
        run: &mut FeedImport,
        item: &mut dyn RemoteVideo,
    ) -> Result<ItemOutcome, Error> {
        // The cursor may yield lightweight stubs needing a second fetch.
        item.load().await?;

        if self.identity.is_seen(&feed.id, item.record()).await? {
            debug!(feed = %feed.id, "item already seen");
            self.record_step(run, StepKind::VideoSeen, None, "").await?;
            return Ok(ItemOutcome::Seen);
        }

        let sites = self.feeds.sites_for_feed(&feed.id).await?;
        let (video, attachment) = self.builder.build(
            item.record_mut(),
            BuildOptions {
                // Imported videos are never published directly; publication
                // happens only in the finalize phase.
                status: Some(VideoStatus::Unpublished),
                feed_id: Some(feed.id.clone()),
                sites,
                owner: feed.owner.clone(),
                owner_email: feed.owner_email.clone(),
                owner_session: feed.owner_session.clone(),
            },
        );

        match self.validate(&video).await {
            Ok(()) => {}
            Err(Error::Validation(problems)) => {
                // Invalid rows are still saved; the step log carries the
                // problems for the moderation queue to sort out.
                self.record_step(run, StepKind::VideoInvalid, None, &problems.to_string())
                    .await?;
            }
            Err(other) => return Err(other),
        }

        self.videos.save(&video).await?;

        if let Err(error) = attachment.commit(&video, &self.videos).await {
            // No video row without its attachments: drop the row and let the
            // per-item guard record the failure.
            self.videos.delete(&video.id).await?;
            return Err(error.into());
        }

        self.identity.mark_seen(&feed.id, item.record()).await?;
        self.record_step(run, StepKind::VideoImported, Some(video.id.clone()), "")
            .await?;
        Ok(ItemOutcome::Imported)
    }

    async fn validate(&self, video: &Video) -> Result<(), Error> {
        let mut problems = match video.validate_fields() {
            Ok(()) => Vec::new(),
            Err(error) => error.problems,
        };

        if !video.guid.is_empty() {
            if let Some(feed_id) = video.feed_id.as_deref() {
                if self
                    .videos
                    .guid_exists(feed_id, &video.guid, &video.id)
                    .await?
                {
                    problems.push(format!(
                        "guid {:?} already imported for this feed",
                        video.guid
                    ));
                }
            }
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { problems }.into())
        }
    }

    /// The `running -> complete` transition: publish or queue the run's
    /// videos, then mark the run complete. Reached no matter how the item
    /// loop ended.
    async fn finalize(&self, feed: &Feed, run: &mut FeedImport) -> Result<(), Error> {
        if !feed.moderate_imported_videos {
            let candidates = self.videos.unpublished_for_run(run.id).await?;
            let selected = self.gate.select_for_publication(&candidates);
            let published_rows = self.videos.publish(&selected, Utc::now()).await?;
            debug!(run = run.id, published = published_rows, "published import batch");

            let published: Vec<_> = self
                .videos
                .get_many(&selected)
                .await?
                .into_iter()
                .filter(|video| video.status == VideoStatus::Published)
                .collect();
            self.hooks.after_publish(&published);
        }

        self.videos.mark_needs_moderation_for_run(run.id).await?;

        run.is_complete = true;
        self.touch_run(run).await
    }

    async fn record_step(
        &self,
        run: &mut FeedImport,
        kind: StepKind,
        video_id: Option<String>,
        failure: &str,
    ) -> Result<(), Error> {
        if kind.is_error() {
            warn!(run = run.id, kind = kind.as_str(), failure, "import step");
        } else {
            debug!(run = run.id, kind = kind.as_str(), "import step");
        }
        run.apply_step(kind);
        self.imports.add_step(run.id, kind, video_id, failure).await?;
        Ok(())
    }

    async fn touch_run(&self, run: &mut FeedImport) -> Result<(), Error> {
        run.updated_at = Utc::now();
        self.imports.save_run(run).await?;
        Ok(())
    }

    async fn feed_lock(&self, feed_id: &str) -> Arc<tokio::sync::Mutex<()>> {
        let mut locks = self.feed_locks.lock().await;
        locks
            .entry(feed_id.to_string())
            .or_insert_with(|| Arc::new(tokio::sync::Mutex::new(())))
            .clone()
    }
}
