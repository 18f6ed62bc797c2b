//! End-to-end tests for the feed import engine.
//!
//! Each test wires the engine against a scripted in-memory feed reader and a
//! temporary SQLite database, then asserts on the persisted videos, the step
//! log, and the run counters.

use std::collections::HashMap;
use std::sync::{Arc, Mutex};

use vidsync::error::Error;
use vidsync::feeds::memory::{FeedScript, MemoryFeedReader, ScriptedItem};
use vidsync::feeds::{FeedMetadata, RemoteVideoFile, RemoteVideoRecord};
use vidsync::models::{Feed, StepKind, Video, VideoStatus};
use vidsync::repository::diesel_pool::run_blocking;
use vidsync::repository::{
    create_pool_from_url, migrations, DbPool, FeedRepository, ImportRepository, SiteRepository,
    VideoRepository,
};
use vidsync::services::{
    IdentifierIndex, ImportHooks, ImportListener, ImportOptions, ImportService,
};

struct Harness {
    pool: DbPool,
    reader: Arc<MemoryFeedReader>,
    service: ImportService,
    feeds: FeedRepository,
    videos: VideoRepository,
    imports: ImportRepository,
    _dir: tempfile::TempDir,
}

/// Engine over a fresh temp database and an empty scripted reader.
async fn setup(hooks: ImportHooks) -> Harness {
    let dir = tempfile::tempdir().expect("Failed to create temp dir");
    let db_path = dir.path().join("test.db");
    let pool = create_pool_from_url(&db_path.display().to_string()).unwrap();
    migrations::init_schema(pool.clone()).await.unwrap();

    let default_site = SiteRepository::new(pool.clone())
        .ensure_default("example.com", "Example")
        .await
        .unwrap();

    let reader = Arc::new(MemoryFeedReader::new());
    let service = ImportService::new(
        pool.clone(),
        reader.clone(),
        hooks,
        ImportOptions {
            max_results: None,
            api_keys: HashMap::new(),
            default_site,
        },
    );

    Harness {
        feeds: FeedRepository::new(pool.clone()),
        videos: VideoRepository::new(pool.clone()),
        imports: ImportRepository::new(pool.clone()),
        pool,
        reader,
        service,
        _dir: dir,
    }
}

async fn add_feed(harness: &Harness, url: &str) -> Feed {
    let feed = Feed::new(url);
    harness.feeds.save(&feed).await.unwrap();
    feed
}

fn record(guid: &str, title: &str) -> RemoteVideoRecord {
    RemoteVideoRecord {
        guid: Some(guid.to_string()),
        link: Some(format!("https://example.com/watch/{guid}")),
        title: Some(title.to_string()),
        ..Default::default()
    }
}

fn video_item(guid: &str, title: &str) -> ScriptedItem {
    ScriptedItem::Video(record(guid, title))
}

fn step_kinds(steps: &[vidsync::models::FeedImportStep]) -> Vec<StepKind> {
    steps.iter().map(|step| step.kind).collect()
}

// ============================================================================
// Happy path and moderation
// ============================================================================

#[tokio::test]
async fn unmoderated_imports_publish_at_the_end_of_the_run() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://publish").await;
    harness.reader.add_feed(
        "mem://publish",
        FeedScript {
            items: vec![video_item("g-1", "First"), video_item("g-2", "Second")],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert!(run.is_complete);
    assert_eq!(run.import_count, 2);
    assert_eq!(run.error_count, 0);

    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos.len(), 2);
    for video in &videos {
        assert_eq!(video.status, VideoStatus::Published);
        assert!(video.published_at.is_some());
    }

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoImported, StepKind::VideoImported]
    );
}

#[tokio::test]
async fn moderated_imports_queue_for_moderation() {
    let harness = setup(ImportHooks::new()).await;
    let mut feed = Feed::new("mem://moderated");
    feed.moderate_imported_videos = true;
    harness.feeds.save(&feed).await.unwrap();
    harness.reader.add_feed(
        "mem://moderated",
        FeedScript {
            items: vec![video_item("g-1", "First"), video_item("g-2", "Second")],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert!(run.is_complete);
    assert_eq!(run.import_count, 2);

    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos.len(), 2);
    for video in &videos {
        assert_eq!(video.status, VideoStatus::NeedsModeration);
        assert!(video.published_at.is_none());
    }
}

#[tokio::test]
async fn imported_videos_carry_feed_ownership_and_sites() {
    let harness = setup(ImportHooks::new()).await;
    let mut feed = Feed::new("mem://owned");
    feed.owner_email = "curator@example.com".to_string();
    harness.feeds.save(&feed).await.unwrap();
    harness.reader.add_feed(
        "mem://owned",
        FeedScript {
            items: vec![ScriptedItem::Video(RemoteVideoRecord {
                files: vec![RemoteVideoFile {
                    url: "https://example.com/1.mp4".to_string(),
                    length: Some(2048),
                    ..Default::default()
                }],
                ..record("g-1", "First")
            })],
            ..Default::default()
        },
    );

    harness.service.start_import(&feed.id).await.unwrap();

    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].owner_email, "curator@example.com");

    let files = harness.videos.files_for_video(&videos[0].id).await.unwrap();
    assert_eq!(files.len(), 1);
    assert_eq!(files[0].mime_type, "video/mp4");

    // No explicit feed sites, so the default site was attached.
    let sites = harness.videos.sites_for_video(&videos[0].id).await.unwrap();
    assert_eq!(sites.len(), 1);
}

// ============================================================================
// Dedup and the stop-if-seen policy
// ============================================================================

#[tokio::test]
async fn stop_if_seen_breaks_at_the_first_seen_item() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://stop").await;

    // seen-1 was imported some time in the past.
    let index = IdentifierIndex::new(harness.imports.clone());
    index
        .mark_seen(&feed.id, &record("seen-1", "Old"))
        .await
        .unwrap();

    harness.reader.add_feed(
        "mem://stop",
        FeedScript {
            items: vec![
                video_item("new-1", "Newest"),
                video_item("seen-1", "Old"),
                video_item("new-2", "Should never be reached"),
            ],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert!(run.is_complete);
    assert_eq!(run.import_count, 1);

    // new-2 was never attempted: the log ends at the seen step.
    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoImported, StepKind::VideoSeen]
    );

    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].name, "Newest");
}

#[tokio::test]
async fn full_scans_skip_seen_items_and_continue() {
    let harness = setup(ImportHooks::new()).await;
    let mut feed = Feed::new("mem://full-scan");
    feed.stop_if_seen = false;
    harness.feeds.save(&feed).await.unwrap();

    let index = IdentifierIndex::new(harness.imports.clone());
    index
        .mark_seen(&feed.id, &record("seen-1", "Old"))
        .await
        .unwrap();

    harness.reader.add_feed(
        "mem://full-scan",
        FeedScript {
            items: vec![video_item("seen-1", "Old"), video_item("new-1", "New")],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert_eq!(run.import_count, 1);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoSeen, StepKind::VideoImported]
    );
}

#[tokio::test]
async fn one_shared_facet_marks_an_item_seen_within_a_run() {
    let harness = setup(ImportHooks::new()).await;
    let mut feed = Feed::new("mem://shared-facet");
    feed.stop_if_seen = false;
    harness.feeds.save(&feed).await.unwrap();

    let shared_file = RemoteVideoFile {
        url: "https://example.com/shared.mp4".to_string(),
        ..Default::default()
    };
    harness.reader.add_feed(
        "mem://shared-facet",
        FeedScript {
            items: vec![
                ScriptedItem::Video(RemoteVideoRecord {
                    files: vec![shared_file.clone()],
                    ..record("g-1", "First")
                }),
                // Different guid and link, same file URL.
                ScriptedItem::Video(RemoteVideoRecord {
                    files: vec![shared_file],
                    ..record("g-2", "Second")
                }),
            ],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert_eq!(run.import_count, 1);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoImported, StepKind::VideoSeen]
    );
}

#[tokio::test]
async fn facetless_items_are_reimported_every_run() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://facetless").await;
    harness.reader.add_feed(
        "mem://facetless",
        FeedScript {
            items: vec![ScriptedItem::Video(RemoteVideoRecord {
                title: Some("No identifying facets".to_string()),
                ..Default::default()
            })],
            ..Default::default()
        },
    );

    let first = harness.service.start_import(&feed.id).await.unwrap();
    let second = harness.service.start_import(&feed.id).await.unwrap();
    assert_eq!(first.import_count, 1);
    // Nothing could be marked seen, so the item imports again.
    assert_eq!(second.import_count, 1);

    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos.len(), 2);
}

// ============================================================================
// Validation leniency
// ============================================================================

#[tokio::test]
async fn invalid_items_are_flagged_but_still_saved() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://invalid").await;
    harness.reader.add_feed(
        "mem://invalid",
        FeedScript {
            items: vec![ScriptedItem::Video(RemoteVideoRecord {
                guid: Some("g-1".to_string()),
                // No title: fails field validation.
                ..Default::default()
            })],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert_eq!(run.import_count, 1);
    assert_eq!(run.error_count, 0);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoInvalid, StepKind::VideoImported]
    );
    assert!(steps[0].failure.contains("name is required"));

    // The row was saved despite the validation failure.
    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos.len(), 1);
    assert_eq!(videos[0].name, "");
}

#[tokio::test]
async fn duplicate_guid_against_existing_rows_is_invalid_but_saved() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://dup-guid").await;

    // A video with this guid already exists but was never fingerprinted
    // (e.g. created by hand), so the dedup index does not catch it.
    let mut existing = Video {
        feed_id: Some(feed.id.clone()),
        guid: "g-dup".to_string(),
        name: "Manual entry".to_string(),
        ..blank_video()
    };
    existing.status = VideoStatus::Published;
    harness.videos.save(&existing).await.unwrap();

    harness.reader.add_feed(
        "mem://dup-guid",
        FeedScript {
            items: vec![video_item("g-dup", "Imported twin")],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert_eq!(run.import_count, 1);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoInvalid, StepKind::VideoImported]
    );
    assert!(steps[0].failure.contains("already imported"));

    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos.len(), 2);
}

// ============================================================================
// Failure isolation
// ============================================================================

#[tokio::test]
async fn fetch_failure_records_an_import_error_and_still_completes() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://fetch-fail").await;
    harness.reader.add_feed(
        "mem://fetch-fail",
        FeedScript {
            fail_load: Some("connection refused".to_string()),
            items: vec![video_item("g-1", "Unreachable")],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert!(run.is_complete);
    assert_eq!(run.import_count, 0);
    assert_eq!(run.error_count, 1);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(step_kinds(&steps), [StepKind::ImportErrored]);
    assert!(steps[0].failure.contains("connection refused"));
}

#[tokio::test]
async fn unknown_feeds_error_before_a_run_exists() {
    let harness = setup(ImportHooks::new()).await;
    let result = harness.service.start_import("missing").await;
    assert!(matches!(result, Err(Error::FeedNotFound(_))));
}

#[tokio::test]
async fn item_failures_are_isolated_to_the_item() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://item-fail").await;
    harness.reader.add_feed(
        "mem://item-fail",
        FeedScript {
            items: vec![
                ScriptedItem::LoadFailure("detail fetch timed out".to_string()),
                video_item("g-1", "Fine"),
            ],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert!(run.is_complete);
    assert_eq!(run.import_count, 1);
    assert_eq!(run.error_count, 1);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoErrored, StepKind::VideoImported]
    );
}

#[tokio::test]
async fn cursor_failure_ends_the_loop_with_an_import_error() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://cursor-fail").await;
    harness.reader.add_feed(
        "mem://cursor-fail",
        FeedScript {
            items: vec![
                video_item("g-1", "First"),
                ScriptedItem::CursorFailure("stream reset".to_string()),
                video_item("g-2", "Never reached"),
            ],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert!(run.is_complete);
    assert_eq!(run.import_count, 1);
    assert_eq!(run.error_count, 1);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(
        step_kinds(&steps),
        [StepKind::VideoImported, StepKind::ImportErrored]
    );
}

#[tokio::test]
async fn attachment_failure_leaves_no_video_row_behind() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://attach-fail").await;
    harness.reader.add_feed(
        "mem://attach-fail",
        FeedScript {
            items: vec![ScriptedItem::Video(RemoteVideoRecord {
                files: vec![RemoteVideoFile {
                    url: "https://example.com/1.mp4".to_string(),
                    ..Default::default()
                }],
                ..record("g-1", "First")
            })],
            ..Default::default()
        },
    );

    // Make file-variant inserts fail mid-attachment.
    run_blocking(harness.pool.clone(), |conn| {
        diesel::RunQueryDsl::execute(
            diesel::sql_query(
                "CREATE TRIGGER fail_video_files BEFORE INSERT ON video_files \
                 BEGIN SELECT RAISE(ABORT, 'file attachment refused'); END",
            ),
            conn,
        )?;
        Ok(())
    })
    .await
    .unwrap();

    let run = harness.service.start_import(&feed.id).await.unwrap();
    assert!(run.is_complete);
    assert_eq!(run.import_count, 0);
    assert_eq!(run.error_count, 1);

    let steps = harness.imports.steps_for_run(run.id).await.unwrap();
    assert_eq!(step_kinds(&steps), [StepKind::VideoErrored]);

    // The half-built row was deleted, and nothing was marked seen.
    assert!(harness
        .videos
        .list(None, Some(feed.id.as_str()))
        .await
        .unwrap()
        .is_empty());
    let index = IdentifierIndex::new(harness.imports.clone());
    assert!(!index
        .is_seen(&feed.id, &record("g-1", "First"))
        .await
        .unwrap());
}

// ============================================================================
// Counters and metadata
// ============================================================================

#[tokio::test]
async fn counters_reconcile_with_the_step_log() {
    let harness = setup(ImportHooks::new()).await;
    let mut feed = Feed::new("mem://mixed");
    feed.stop_if_seen = false;
    harness.feeds.save(&feed).await.unwrap();

    let index = IdentifierIndex::new(harness.imports.clone());
    index
        .mark_seen(&feed.id, &record("seen-1", "Old"))
        .await
        .unwrap();

    harness.reader.add_feed(
        "mem://mixed",
        FeedScript {
            items: vec![
                video_item("g-1", "Good"),
                ScriptedItem::LoadFailure("flaky".to_string()),
                video_item("seen-1", "Old"),
                video_item("g-2", "Also good"),
            ],
            ..Default::default()
        },
    );

    let run = harness.service.start_import(&feed.id).await.unwrap();
    let counts = harness.imports.step_counts(run.id).await.unwrap();

    let imported = counts.get("video imported").copied().unwrap_or(0);
    let errored = counts.get("video errored").copied().unwrap_or(0)
        + counts.get("import errored").copied().unwrap_or(0);
    assert_eq!(run.import_count as u64, imported);
    assert_eq!(run.error_count as u64, errored);
    assert_eq!(imported, 2);
    assert_eq!(errored, 1);
    assert_eq!(counts.get("video seen"), Some(&1));
}

#[tokio::test]
async fn feed_metadata_and_conditional_tokens_are_cached() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://metadata").await;
    harness.reader.add_feed(
        "mem://metadata",
        FeedScript {
            metadata: FeedMetadata {
                etag: Some("\"v1\"".to_string()),
                title: Some("Example Videos".to_string()),
                webpage: Some("https://example.com/videos".to_string()),
                description: Some("All the videos".to_string()),
                ..Default::default()
            },
            ..Default::default()
        },
    );

    harness.service.start_import(&feed.id).await.unwrap();

    let feed = harness.feeds.get(&feed.id).await.unwrap().unwrap();
    assert_eq!(feed.name, "Example Videos");
    assert_eq!(feed.web_url, "https://example.com/videos");
    assert_eq!(feed.external_etag, "\"v1\"");
    assert!(!feed.update_metadata_next_import);

    // Display metadata refreshes only once; tokens keep updating.
    harness.reader.add_feed(
        "mem://metadata",
        FeedScript {
            metadata: FeedMetadata {
                etag: Some("\"v2\"".to_string()),
                title: Some("Renamed".to_string()),
                ..Default::default()
            },
            ..Default::default()
        },
    );
    harness.service.start_import(&feed.id).await.unwrap();

    let feed = harness.feeds.get(&feed.id).await.unwrap().unwrap();
    assert_eq!(feed.name, "Example Videos");
    assert_eq!(feed.external_etag, "\"v2\"");
}

#[tokio::test]
async fn concurrent_runs_for_one_feed_import_each_item_once() {
    let harness = setup(ImportHooks::new()).await;
    let feed = add_feed(&harness, "mem://concurrent").await;
    harness.reader.add_feed(
        "mem://concurrent",
        FeedScript {
            items: vec![video_item("g-1", "First"), video_item("g-2", "Second")],
            ..Default::default()
        },
    );

    let (first, second) = tokio::join!(
        harness.service.start_import(&feed.id),
        harness.service.start_import(&feed.id),
    );
    let first = first.unwrap();
    let second = second.unwrap();

    assert!(first.is_complete && second.is_complete);
    assert_eq!(first.import_count + second.import_count, 2);
    assert_eq!(
        harness.videos.list(None, Some(feed.id.as_str())).await.unwrap().len(),
        2
    );
}

// ============================================================================
// Listener hooks
// ============================================================================

#[derive(Default)]
struct Recorder {
    published: Mutex<Vec<String>>,
    attached: Mutex<Vec<String>>,
}

impl ImportListener for Recorder {
    fn after_video_attach(
        &self,
        video: &Video,
        _record: &RemoteVideoRecord,
    ) -> anyhow::Result<()> {
        self.attached.lock().unwrap().push(video.id.clone());
        Ok(())
    }

    fn after_publish(&self, published: &[Video]) -> anyhow::Result<()> {
        self.published
            .lock()
            .unwrap()
            .extend(published.iter().map(|video| video.id.clone()));
        Ok(())
    }
}

#[tokio::test]
async fn listeners_observe_attachment_and_publication() {
    let recorder = Arc::new(Recorder::default());
    let mut hooks = ImportHooks::new();
    hooks.register(recorder.clone());

    let harness = setup(hooks).await;
    let feed = add_feed(&harness, "mem://observed").await;
    harness.reader.add_feed(
        "mem://observed",
        FeedScript {
            items: vec![video_item("g-1", "First"), video_item("g-2", "Second")],
            ..Default::default()
        },
    );

    harness.service.start_import(&feed.id).await.unwrap();

    let attached = recorder.attached.lock().unwrap().clone();
    let published = recorder.published.lock().unwrap().clone();
    assert_eq!(attached.len(), 2);
    let mut published_sorted = published.clone();
    let mut attached_sorted = attached.clone();
    published_sorted.sort();
    attached_sorted.sort();
    assert_eq!(published_sorted, attached_sorted);
}

#[tokio::test]
async fn moderated_feeds_never_reach_the_publish_hooks() {
    let recorder = Arc::new(Recorder::default());
    let mut hooks = ImportHooks::new();
    hooks.register(recorder.clone());

    let harness = setup(hooks).await;
    let mut feed = Feed::new("mem://quiet");
    feed.moderate_imported_videos = true;
    harness.feeds.save(&feed).await.unwrap();
    harness.reader.add_feed(
        "mem://quiet",
        FeedScript {
            items: vec![video_item("g-1", "First")],
            ..Default::default()
        },
    );

    harness.service.start_import(&feed.id).await.unwrap();
    assert!(recorder.published.lock().unwrap().is_empty());
}

struct KeepOnly(&'static str);

impl ImportListener for KeepOnly {
    fn before_publish(&self, candidates: &[Video]) -> anyhow::Result<Option<Vec<String>>> {
        Ok(Some(
            candidates
                .iter()
                .filter(|video| video.name == self.0)
                .map(|video| video.id.clone())
                .collect(),
        ))
    }
}

#[tokio::test]
async fn publish_filters_narrow_the_batch_and_the_rest_queue_for_moderation() {
    let mut hooks = ImportHooks::new();
    hooks.register(Arc::new(KeepOnly("First")));

    let harness = setup(hooks).await;
    let feed = add_feed(&harness, "mem://filtered").await;
    harness.reader.add_feed(
        "mem://filtered",
        FeedScript {
            items: vec![video_item("g-1", "First"), video_item("g-2", "Second")],
            ..Default::default()
        },
    );

    harness.service.start_import(&feed.id).await.unwrap();

    let published = harness
        .videos
        .list(Some(VideoStatus::Published), Some(feed.id.as_str()))
        .await
        .unwrap();
    assert_eq!(published.len(), 1);
    assert_eq!(published[0].name, "First");

    let queued = harness
        .videos
        .list(Some(VideoStatus::NeedsModeration), Some(feed.id.as_str()))
        .await
        .unwrap();
    assert_eq!(queued.len(), 1);
    assert_eq!(queued[0].name, "Second");
}

struct Retitle;

impl ImportListener for Retitle {
    fn before_video_build(&self, record: &mut RemoteVideoRecord) -> anyhow::Result<()> {
        if let Some(title) = record.title.as_mut() {
            *title = format!("[curated] {title}");
        }
        Ok(())
    }
}

#[tokio::test]
async fn before_build_listeners_shape_the_stored_video() {
    let mut hooks = ImportHooks::new();
    hooks.register(Arc::new(Retitle));

    let harness = setup(hooks).await;
    let feed = add_feed(&harness, "mem://retitled").await;
    harness.reader.add_feed(
        "mem://retitled",
        FeedScript {
            items: vec![video_item("g-1", "First")],
            ..Default::default()
        },
    );

    harness.service.start_import(&feed.id).await.unwrap();

    let videos = harness.videos.list(None, Some(feed.id.as_str())).await.unwrap();
    assert_eq!(videos[0].name, "[curated] First");
}

fn blank_video() -> Video {
    let now = chrono::Utc::now();
    Video {
        id: uuid::Uuid::new_v4().to_string(),
        feed_id: None,
        original_url: String::new(),
        web_url: String::new(),
        embed_code: String::new(),
        flash_enclosure_url: String::new(),
        name: String::new(),
        description: String::new(),
        thumbnail: String::new(),
        guid: String::new(),
        owner: String::new(),
        owner_email: String::new(),
        owner_session: None,
        external_user_name: String::new(),
        external_user_url: String::new(),
        external_thumbnail_url: String::new(),
        external_thumbnail_tries: 0,
        external_published_at: None,
        status: VideoStatus::Unpublished,
        published_at: None,
        created_at: now,
        updated_at: now,
    }
}
