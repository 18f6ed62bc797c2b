//! Two-phase construction of videos from remote records.
//!
//! Mapping produces the video value plus a [`VideoAttachment`] holding the
//! dependent rows (sites, file variants). The attachment is committed only
//! after the primary row is durably persisted, so a failure there can delete
//! the row and leave nothing half-built behind.

use chrono::Utc;
use uuid::Uuid;

use super::listeners::ImportHooks;
use crate::feeds::RemoteVideoRecord;
use crate::models::{Site, Video, VideoFile, VideoStatus};
use crate::repository::diesel_pool::DieselError;
use crate::repository::VideoRepository;

/// Options for building a video from a remote record.
#[derive(Debug, Clone, Default)]
pub struct BuildOptions {
    /// Defaults to `needs moderation` when unset.
    pub status: Option<VideoStatus>,
    pub feed_id: Option<String>,
    /// Sites to associate; empty means the default site.
    pub sites: Vec<Site>,
    pub owner: String,
    pub owner_email: String,
    pub owner_session: Option<String>,
}

/// Maps remote records into videos and their deferred attachments.
#[derive(Clone)]
pub struct RecordBuilder {
    hooks: ImportHooks,
    default_site: Site,
}

impl RecordBuilder {
    pub fn new(hooks: ImportHooks, default_site: Site) -> Self {
        Self {
            hooks,
            default_site,
        }
    }

    /// Build a video value from a remote record.
    ///
    /// Fires the before-build hook (observers may mutate the record), then
    /// maps every remote field, defaulting missing ones to empty. The
    /// returned attachment must be committed only after the video row has
    /// been saved.
    pub fn build(
        &self,
        record: &mut RemoteVideoRecord,
        options: BuildOptions,
    ) -> (Video, VideoAttachment) {
        self.hooks.before_video_build(record);

        let status = options.status.unwrap_or(VideoStatus::NeedsModeration);
        let now = Utc::now();

        let video = Video {
            id: Uuid::new_v4().to_string(),
            feed_id: options.feed_id,
            original_url: record.url.clone().unwrap_or_default(),
            web_url: record.link.clone().unwrap_or_default(),
            embed_code: record.embed_code.clone().unwrap_or_default(),
            flash_enclosure_url: record.flash_enclosure_url.clone().unwrap_or_default(),
            name: record.title.clone().unwrap_or_default(),
            description: record.description.clone().unwrap_or_default(),
            thumbnail: String::new(),
            guid: record.guid.clone().unwrap_or_default(),
            owner: options.owner,
            owner_email: options.owner_email,
            owner_session: options.owner_session,
            external_user_name: record.user.clone().unwrap_or_default(),
            external_user_url: record.user_url.clone().unwrap_or_default(),
            external_thumbnail_url: record.thumbnail_url.clone().unwrap_or_default(),
            external_thumbnail_tries: 0,
            external_published_at: record.publish_datetime,
            status,
            published_at: (status == VideoStatus::Published).then_some(now),
            created_at: now,
            updated_at: now,
        };

        let sites = if options.sites.is_empty() {
            vec![self.default_site.clone()]
        } else {
            options.sites
        };

        let attachment = VideoAttachment {
            video_id: video.id.clone(),
            sites,
            record: record.clone(),
            hooks: self.hooks.clone(),
        };

        (video, attachment)
    }
}

/// Deferred site and file attachment for a freshly built video.
pub struct VideoAttachment {
    video_id: String,
    sites: Vec<Site>,
    record: RemoteVideoRecord,
    hooks: ImportHooks,
}

impl VideoAttachment {
    /// Attach site links and one file row per non-expiring remote variant,
    /// then fire the after-attach hook (best-effort). Site/file write
    /// failures propagate to the caller; the video row is expected to be
    /// deleted in response.
    pub async fn commit(
        self,
        video: &Video,
        videos: &VideoRepository,
    ) -> Result<(), DieselError> {
        let site_ids: Vec<String> = self.sites.iter().map(|site| site.id.clone()).collect();
        videos.set_sites(&self.video_id, &site_ids).await?;

        for file in &self.record.files {
            if file.expires.is_some() {
                continue;
            }
            let mime_type = match file.mime_type.clone() {
                Some(mime_type) if !mime_type.is_empty() => mime_type,
                // Best-effort guess from the URL when the source says nothing.
                _ => mime_guess::from_path(&file.url)
                    .first()
                    .map(|guess| guess.essence_str().to_string())
                    .unwrap_or_default(),
            };
            videos
                .add_file(&VideoFile {
                    id: 0,
                    video_id: self.video_id.clone(),
                    url: file.url.clone(),
                    length: file.length,
                    mime_type,
                })
                .await?;
        }

        self.hooks.after_video_attach(video, &self.record);
        Ok(())
    }
}
