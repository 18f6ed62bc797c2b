//! Video repository: rows, file variants, site links, and the bulk status
//! transitions used by the import finalize phase.

use chrono::{DateTime, Utc};
use diesel::prelude::*;

use super::diesel_models::{NewVideo, VideoFileRecord, VideoRecord};
use super::diesel_pool::{run_blocking, DbPool, DieselError};
use super::{parse_datetime, parse_datetime_opt};
use crate::models::{Video, VideoFile, VideoStatus};
use crate::schema::{feed_import_steps, video_files, video_sites, videos};

impl From<VideoRecord> for Video {
    fn from(record: VideoRecord) -> Self {
        Video {
            id: record.id,
            feed_id: record.feed_id,
            original_url: record.original_url,
            web_url: record.web_url,
            embed_code: record.embed_code,
            flash_enclosure_url: record.flash_enclosure_url,
            name: record.name,
            description: record.description,
            thumbnail: record.thumbnail,
            guid: record.guid,
            owner: record.owner,
            owner_email: record.owner_email,
            owner_session: record.owner_session,
            external_user_name: record.external_user_name,
            external_user_url: record.external_user_url,
            external_thumbnail_url: record.external_thumbnail_url,
            external_thumbnail_tries: record.external_thumbnail_tries.max(0) as u32,
            external_published_at: parse_datetime_opt(record.external_published_at),
            status: VideoStatus::from_str(&record.status).unwrap_or(VideoStatus::Unpublished),
            published_at: parse_datetime_opt(record.published_at),
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<VideoFileRecord> for VideoFile {
    fn from(record: VideoFileRecord) -> Self {
        VideoFile {
            id: record.id as i64,
            video_id: record.video_id,
            url: record.url,
            length: record.length.map(|value| value.max(0) as u64),
            mime_type: record.mime_type,
        }
    }
}

/// Video storage.
#[derive(Clone)]
pub struct VideoRepository {
    pool: DbPool,
}

impl VideoRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Save a video (insert or update).
    pub async fn save(&self, video: &Video) -> Result<(), DieselError> {
        let video = video.clone();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let created_at = video.created_at.to_rfc3339();
            let updated_at = video.updated_at.to_rfc3339();
            let external_published_at =
                video.external_published_at.map(|value| value.to_rfc3339());
            let published_at = video.published_at.map(|value| value.to_rfc3339());

            let record = NewVideo {
                id: &video.id,
                feed_id: video.feed_id.as_deref(),
                original_url: &video.original_url,
                web_url: &video.web_url,
                embed_code: &video.embed_code,
                flash_enclosure_url: &video.flash_enclosure_url,
                name: &video.name,
                description: &video.description,
                thumbnail: &video.thumbnail,
                guid: &video.guid,
                owner: &video.owner,
                owner_email: &video.owner_email,
                owner_session: video.owner_session.as_deref(),
                external_user_name: &video.external_user_name,
                external_user_url: &video.external_user_url,
                external_thumbnail_url: &video.external_thumbnail_url,
                external_thumbnail_tries: video.external_thumbnail_tries as i32,
                external_published_at: external_published_at.as_deref(),
                status: video.status.as_str(),
                published_at: published_at.as_deref(),
                created_at: &created_at,
                updated_at: &updated_at,
            };

            diesel::replace_into(videos::table)
                .values(&record)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Video>, DieselError> {
        let id = id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            videos::table.find(&id).first::<VideoRecord>(conn).optional()
        })
        .await
        .map(|record| record.map(Video::from))
    }

    pub async fn get_many(&self, ids: &[String]) -> Result<Vec<Video>, DieselError> {
        let ids = ids.to_vec();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            videos::table
                .filter(videos::id.eq_any(&ids))
                .load::<VideoRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Video::from).collect())
    }

    /// Delete a video together with its file and site rows. Import step
    /// back-references are nulled; the steps themselves are audit records
    /// and survive.
    pub async fn delete(&self, id: &str) -> Result<bool, DieselError> {
        let id = id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::delete(video_files::table.filter(video_files::video_id.eq(&id)))
                    .execute(conn)?;
                diesel::delete(video_sites::table.filter(video_sites::video_id.eq(&id)))
                    .execute(conn)?;
                diesel::update(
                    feed_import_steps::table.filter(feed_import_steps::video_id.eq(&id)),
                )
                .set(feed_import_steps::video_id.eq(None::<String>))
                .execute(conn)?;
                let rows = diesel::delete(videos::table.find(&id)).execute(conn)?;
                Ok(rows > 0)
            })
        })
        .await
    }

    /// Whether another video of the same feed already carries this guid.
    pub async fn guid_exists(
        &self,
        feed_id: &str,
        guid: &str,
        exclude_id: &str,
    ) -> Result<bool, DieselError> {
        let feed_id = feed_id.to_string();
        let guid = guid.to_string();
        let exclude_id = exclude_id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            use diesel::dsl::count_star;
            let count: i64 = videos::table
                .filter(videos::feed_id.eq(&feed_id))
                .filter(videos::guid.eq(&guid))
                .filter(videos::id.ne(&exclude_id))
                .select(count_star())
                .first(conn)?;
            Ok(count > 0)
        })
        .await
    }

    pub async fn list(
        &self,
        status: Option<VideoStatus>,
        feed_id: Option<&str>,
    ) -> Result<Vec<Video>, DieselError> {
        let status = status.map(|value| value.as_str().to_string());
        let feed_id = feed_id.map(|value| value.to_string());
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let mut query = videos::table
                .order(videos::created_at.desc())
                .into_boxed();
            if let Some(ref status) = status {
                query = query.filter(videos::status.eq(status));
            }
            if let Some(ref feed_id) = feed_id {
                query = query.filter(videos::feed_id.eq(feed_id));
            }
            query.load::<VideoRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Video::from).collect())
    }

    /// Videos created by the given run that are still unpublished.
    pub async fn unpublished_for_run(&self, run_id: i64) -> Result<Vec<Video>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feed_import_steps::table
                .inner_join(videos::table)
                .filter(feed_import_steps::feed_import_id.eq(run_id as i32))
                .filter(videos::status.eq(VideoStatus::Unpublished.as_str()))
                .select(VideoRecord::as_select())
                .load::<VideoRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Video::from).collect())
    }

    /// Bulk-transition still-unpublished videos to published, stamping the
    /// publish time. Returns the number of rows that transitioned.
    pub async fn publish(
        &self,
        ids: &[String],
        published_at: DateTime<Utc>,
    ) -> Result<usize, DieselError> {
        let ids = ids.to_vec();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let now = published_at.to_rfc3339();
            diesel::update(
                videos::table
                    .filter(videos::id.eq_any(&ids))
                    .filter(videos::status.eq(VideoStatus::Unpublished.as_str())),
            )
            .set((
                videos::status.eq(VideoStatus::Published.as_str()),
                videos::published_at.eq(Some(now.as_str())),
                videos::updated_at.eq(now.as_str()),
            ))
            .execute(conn)
        })
        .await
    }

    /// Bulk-transition the run's leftover unpublished videos into the
    /// moderation queue. Returns the number of rows that transitioned.
    pub async fn mark_needs_moderation_for_run(&self, run_id: i64) -> Result<usize, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let ids: Vec<Option<String>> = feed_import_steps::table
                .filter(feed_import_steps::feed_import_id.eq(run_id as i32))
                .filter(feed_import_steps::video_id.is_not_null())
                .select(feed_import_steps::video_id)
                .load(conn)?;
            let ids: Vec<String> = ids.into_iter().flatten().collect();

            let now = chrono::Utc::now().to_rfc3339();
            diesel::update(
                videos::table
                    .filter(videos::id.eq_any(&ids))
                    .filter(videos::status.eq(VideoStatus::Unpublished.as_str())),
            )
            .set((
                videos::status.eq(VideoStatus::NeedsModeration.as_str()),
                videos::updated_at.eq(&now),
            ))
            .execute(conn)
        })
        .await
    }

    /// Create a file variant row, returning its id.
    pub async fn add_file(&self, file: &VideoFile) -> Result<i64, DieselError> {
        let file = file.clone();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            diesel::insert_into(video_files::table)
                .values((
                    video_files::video_id.eq(&file.video_id),
                    video_files::url.eq(&file.url),
                    video_files::length.eq(file.length.map(|value| value as i32)),
                    video_files::mime_type.eq(&file.mime_type),
                ))
                .execute(conn)?;

            diesel::sql_query("SELECT last_insert_rowid()")
                .get_result::<LastInsertRowId>(conn)
                .map(|row| row.id)
        })
        .await
    }

    pub async fn files_for_video(&self, video_id: &str) -> Result<Vec<VideoFile>, DieselError> {
        let video_id = video_id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            video_files::table
                .filter(video_files::video_id.eq(&video_id))
                .order(video_files::id.asc())
                .load::<VideoFileRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(VideoFile::from).collect())
    }

    /// Replace a video's site associations.
    pub async fn set_sites(&self, video_id: &str, site_ids: &[String]) -> Result<(), DieselError> {
        let video_id = video_id.to_string();
        let site_ids = site_ids.to_vec();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::delete(video_sites::table.filter(video_sites::video_id.eq(&video_id)))
                    .execute(conn)?;
                for site_id in &site_ids {
                    diesel::insert_into(video_sites::table)
                        .values((
                            video_sites::video_id.eq(&video_id),
                            video_sites::site_id.eq(site_id),
                        ))
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }

    pub async fn sites_for_video(&self, video_id: &str) -> Result<Vec<String>, DieselError> {
        let video_id = video_id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            video_sites::table
                .filter(video_sites::video_id.eq(&video_id))
                .select(video_sites::site_id)
                .load::<String>(conn)
        })
        .await
    }
}

#[derive(diesel::QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    id: i64,
}
