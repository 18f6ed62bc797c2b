//! Domain models for feeds, imports, and videos.
//!
//! These are plain in-memory values; persistence lives in [`crate::repository`].

use chrono::{DateTime, Utc};
use thiserror::Error;
use url::Url;
use uuid::Uuid;

use crate::feeds::FeedMetadata;

/// Publication state of a video.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum VideoStatus {
    Unpublished,
    NeedsModeration,
    Published,
    Hidden,
}

impl VideoStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoStatus::Unpublished => "unpublished",
            VideoStatus::NeedsModeration => "needs moderation",
            VideoStatus::Published => "published",
            VideoStatus::Hidden => "hidden",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "unpublished" => Some(VideoStatus::Unpublished),
            "needs moderation" => Some(VideoStatus::NeedsModeration),
            "published" => Some(VideoStatus::Published),
            "hidden" => Some(VideoStatus::Hidden),
            _ => None,
        }
    }
}

/// Kind of event recorded during an import run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StepKind {
    /// Something errored on the import level.
    ImportErrored,
    /// A video was found to already be in the database.
    VideoSeen,
    /// Something semi-expected is wrong with the video.
    VideoInvalid,
    /// Something unexpected happened while importing a video.
    VideoErrored,
    /// A video was successfully imported.
    VideoImported,
}

impl StepKind {
    pub fn as_str(&self) -> &'static str {
        match self {
            StepKind::ImportErrored => "import errored",
            StepKind::VideoSeen => "video seen",
            StepKind::VideoInvalid => "video invalid",
            StepKind::VideoErrored => "video errored",
            StepKind::VideoImported => "video imported",
        }
    }

    pub fn from_str(value: &str) -> Option<Self> {
        match value {
            "import errored" => Some(StepKind::ImportErrored),
            "video seen" => Some(StepKind::VideoSeen),
            "video invalid" => Some(StepKind::VideoInvalid),
            "video errored" => Some(StepKind::VideoErrored),
            "video imported" => Some(StepKind::VideoImported),
            _ => None,
        }
    }

    /// Whether this kind counts toward a run's `error_count`.
    pub fn is_error(&self) -> bool {
        matches!(self, StepKind::ImportErrored | StepKind::VideoErrored)
    }
}

/// A site that feeds and videos can be associated with.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Site {
    pub id: String,
    pub domain: String,
    pub name: String,
    pub is_default: bool,
}

impl Site {
    pub fn new(domain: &str, name: &str) -> Self {
        Self {
            id: Uuid::new_v4().to_string(),
            domain: domain.to_string(),
            name: name.to_string(),
            is_default: false,
        }
    }
}

/// A subscription to one external video source.
#[derive(Debug, Clone)]
pub struct Feed {
    pub id: String,
    /// Original URL entered by a user when adding this feed.
    pub original_url: String,
    pub name: String,
    pub description: String,
    /// Webpage where the contents of this feed can be browsed.
    pub web_url: String,
    pub thumbnail: String,
    pub moderate_imported_videos: bool,
    pub enable_automatic_imports: bool,
    /// Feeds are expected to stay in newest-first order, so a seen item
    /// implies everything after it was already imported.
    pub stop_if_seen: bool,
    /// Refresh display metadata from the source on the next import.
    pub update_metadata_next_import: bool,
    pub external_etag: String,
    pub external_last_modified: Option<DateTime<Utc>>,
    pub owner: String,
    pub owner_email: String,
    pub owner_session: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Feed {
    pub fn new(original_url: &str) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4().to_string(),
            original_url: original_url.to_string(),
            name: String::new(),
            description: String::new(),
            web_url: String::new(),
            thumbnail: String::new(),
            moderate_imported_videos: false,
            enable_automatic_imports: true,
            stop_if_seen: true,
            update_metadata_next_import: true,
            external_etag: String::new(),
            external_last_modified: None,
            owner: String::new(),
            owner_email: String::new(),
            owner_session: None,
            created_at: now,
            updated_at: now,
        }
    }

    /// Fold feed-level data from a loaded iterator into this feed.
    ///
    /// Conditional-fetch tokens are always refreshed; display metadata only
    /// when `update_metadata_next_import` is set, and the flag is cleared so
    /// the refresh happens once. Returns whether anything changed and should
    /// be persisted.
    pub fn apply_feed_metadata(&mut self, metadata: &FeedMetadata) -> bool {
        let mut changed = false;

        if let Some(etag) = metadata.etag.as_deref() {
            if !etag.is_empty() && etag != self.external_etag {
                self.external_etag = etag.to_string();
                changed = true;
            }
        }

        if let Some(last_modified) = metadata.last_modified {
            self.external_last_modified = Some(last_modified);
            changed = true;
        }

        if self.update_metadata_next_import {
            self.name = metadata
                .title
                .clone()
                .unwrap_or_else(|| self.original_url.clone());
            self.web_url = metadata.webpage.clone().unwrap_or_default();
            self.description = metadata.description.clone().unwrap_or_default();
            self.update_metadata_next_import = false;
            changed = true;
        }

        changed
    }
}

/// One execution attempt against a feed.
#[derive(Debug, Clone)]
pub struct FeedImport {
    pub id: i64,
    pub feed_id: String,
    pub is_complete: bool,
    /// Denormalized count of errors during the import process.
    pub error_count: u32,
    /// Denormalized count of videos imported during the import process.
    pub import_count: u32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl FeedImport {
    /// Bump the denormalized counters for a step of the given kind.
    pub fn apply_step(&mut self, kind: StepKind) {
        if kind.is_error() {
            self.error_count += 1;
        }
        if kind == StepKind::VideoImported {
            self.import_count += 1;
        }
    }

    /// Operator-facing one-line summary of the run.
    pub fn summary(&self) -> String {
        format!(
            "{} videos imported, {} errors",
            self.import_count, self.error_count
        )
    }
}

/// An immutable outcome record for one event during an import run.
#[derive(Debug, Clone)]
pub struct FeedImportStep {
    pub id: i64,
    pub feed_import_id: i64,
    pub kind: StepKind,
    /// Back-reference to the created video; nulled if that video is later
    /// deleted. The step itself survives as an audit record.
    pub video_id: Option<String>,
    /// Captured failure text for errored/invalid steps.
    pub failure: String,
    pub created_at: DateTime<Utc>,
}

/// The canonical internal representation of one piece of content.
#[derive(Debug, Clone)]
pub struct Video {
    pub id: String,
    pub feed_id: Option<String>,
    /// URL a user gave as "the" URL for this video. May or may not match
    /// `web_url` or any file URL, and may be empty for embed-only videos.
    pub original_url: String,
    /// Canonical web home of the video as best as we can tell.
    pub web_url: String,
    pub embed_code: String,
    pub flash_enclosure_url: String,
    pub name: String,
    pub description: String,
    pub thumbnail: String,
    pub guid: String,
    pub owner: String,
    pub owner_email: String,
    pub owner_session: Option<String>,
    pub external_user_name: String,
    pub external_user_url: String,
    pub external_thumbnail_url: String,
    pub external_thumbnail_tries: u32,
    pub external_published_at: Option<DateTime<Utc>>,
    pub status: VideoStatus,
    /// Set when the video becomes published; never retroactively cleared.
    pub published_at: Option<DateTime<Utc>>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Video {
    /// Transition to a new status, stamping `published_at` on the first
    /// transition into `published`.
    pub fn set_status(&mut self, status: VideoStatus) {
        if status == VideoStatus::Published && self.published_at.is_none() {
            self.published_at = Some(Utc::now());
        }
        self.status = status;
        self.updated_at = Utc::now();
    }

    /// Field-level validation: required name, length limits, well-formed
    /// http(s) URLs. Does not touch storage; uniqueness checks live in the
    /// import service.
    pub fn validate_fields(&self) -> Result<(), ValidationError> {
        let mut problems = Vec::new();

        if self.name.trim().is_empty() {
            problems.push("name is required".to_string());
        } else if self.name.chars().count() > 250 {
            problems.push("name is longer than 250 characters".to_string());
        }

        if self.guid.chars().count() > 250 {
            problems.push("guid is longer than 250 characters".to_string());
        }

        for (field, value) in [
            ("original_url", &self.original_url),
            ("web_url", &self.web_url),
            ("flash_enclosure_url", &self.flash_enclosure_url),
            ("external_user_url", &self.external_user_url),
            ("external_thumbnail_url", &self.external_thumbnail_url),
        ] {
            check_url_field(field, value, &mut problems);
        }

        if !self.owner_email.is_empty() && !self.owner_email.contains('@') {
            problems.push("owner_email is not a valid email address".to_string());
        }

        if problems.is_empty() {
            Ok(())
        } else {
            Err(ValidationError { problems })
        }
    }
}

fn check_url_field(field: &str, value: &str, problems: &mut Vec<String>) {
    if value.is_empty() {
        return;
    }
    if value.chars().count() > 400 {
        problems.push(format!("{field} is longer than 400 characters"));
    }
    match Url::parse(value) {
        Ok(parsed) if matches!(parsed.scheme(), "http" | "https") => {}
        _ => problems.push(format!("{field} is not a valid http(s) URL")),
    }
}

/// Accumulated field validation problems.
#[derive(Debug, Clone, Error)]
#[error("{}", .problems.join("; "))]
pub struct ValidationError {
    pub problems: Vec<String>,
}

/// A playable/downloadable variant of a video.
#[derive(Debug, Clone)]
pub struct VideoFile {
    pub id: i64,
    pub video_id: String,
    pub url: String,
    pub length: Option<u64>,
    pub mime_type: String,
}
