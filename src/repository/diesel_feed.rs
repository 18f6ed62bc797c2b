//! Feed and site repositories.

use diesel::prelude::*;

use super::diesel_models::{FeedRecord, NewFeed, SiteRecord};
use super::diesel_pool::{run_blocking, DbPool, DieselError};
use super::{parse_datetime, parse_datetime_opt};
use crate::models::{Feed, Site};
use crate::schema::{feed_sites, feeds, sites};

impl From<FeedRecord> for Feed {
    fn from(record: FeedRecord) -> Self {
        Feed {
            id: record.id,
            original_url: record.original_url,
            name: record.name,
            description: record.description,
            web_url: record.web_url,
            thumbnail: record.thumbnail,
            moderate_imported_videos: record.moderate_imported_videos != 0,
            enable_automatic_imports: record.enable_automatic_imports != 0,
            stop_if_seen: record.stop_if_seen != 0,
            update_metadata_next_import: record.update_metadata_next_import != 0,
            external_etag: record.external_etag,
            external_last_modified: parse_datetime_opt(record.external_last_modified),
            owner: record.owner,
            owner_email: record.owner_email,
            owner_session: record.owner_session,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<SiteRecord> for Site {
    fn from(record: SiteRecord) -> Self {
        Site {
            id: record.id,
            domain: record.domain,
            name: record.name,
            is_default: record.is_default != 0,
        }
    }
}

/// Feed storage.
#[derive(Clone)]
pub struct FeedRepository {
    pool: DbPool,
}

impl FeedRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Save a feed (insert or update).
    pub async fn save(&self, feed: &Feed) -> Result<(), DieselError> {
        let feed = feed.clone();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let created_at = feed.created_at.to_rfc3339();
            let updated_at = feed.updated_at.to_rfc3339();
            let external_last_modified =
                feed.external_last_modified.map(|value| value.to_rfc3339());

            let record = NewFeed {
                id: &feed.id,
                original_url: &feed.original_url,
                name: &feed.name,
                description: &feed.description,
                web_url: &feed.web_url,
                thumbnail: &feed.thumbnail,
                moderate_imported_videos: feed.moderate_imported_videos as i32,
                enable_automatic_imports: feed.enable_automatic_imports as i32,
                stop_if_seen: feed.stop_if_seen as i32,
                update_metadata_next_import: feed.update_metadata_next_import as i32,
                external_etag: &feed.external_etag,
                external_last_modified: external_last_modified.as_deref(),
                owner: &feed.owner,
                owner_email: &feed.owner_email,
                owner_session: feed.owner_session.as_deref(),
                created_at: &created_at,
                updated_at: &updated_at,
            };

            diesel::replace_into(feeds::table)
                .values(&record)
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Feed>, DieselError> {
        let id = id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feeds::table.find(&id).first::<FeedRecord>(conn).optional()
        })
        .await
        .map(|record| record.map(Feed::from))
    }

    pub async fn get_all(&self) -> Result<Vec<Feed>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feeds::table
                .order(feeds::created_at.asc())
                .load::<FeedRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Feed::from).collect())
    }

    pub async fn find_by_url(&self, original_url: &str) -> Result<Option<Feed>, DieselError> {
        let original_url = original_url.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feeds::table
                .filter(feeds::original_url.eq(&original_url))
                .first::<FeedRecord>(conn)
                .optional()
        })
        .await
        .map(|record| record.map(Feed::from))
    }

    /// Delete a feed and its site associations. Videos, runs, and seen
    /// identifiers are historical records and survive the feed.
    pub async fn delete(&self, id: &str) -> Result<bool, DieselError> {
        let id = id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::delete(feed_sites::table.filter(feed_sites::feed_id.eq(&id)))
                    .execute(conn)?;
                let rows = diesel::delete(feeds::table.find(&id)).execute(conn)?;
                Ok(rows > 0)
            })
        })
        .await
    }

    /// Replace a feed's site associations.
    pub async fn set_sites(&self, feed_id: &str, site_ids: &[String]) -> Result<(), DieselError> {
        let feed_id = feed_id.to_string();
        let site_ids = site_ids.to_vec();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            conn.transaction::<_, DieselError, _>(|conn| {
                diesel::delete(feed_sites::table.filter(feed_sites::feed_id.eq(&feed_id)))
                    .execute(conn)?;
                for site_id in &site_ids {
                    diesel::insert_into(feed_sites::table)
                        .values((
                            feed_sites::feed_id.eq(&feed_id),
                            feed_sites::site_id.eq(site_id),
                        ))
                        .execute(conn)?;
                }
                Ok(())
            })
        })
        .await
    }

    pub async fn sites_for_feed(&self, feed_id: &str) -> Result<Vec<Site>, DieselError> {
        let feed_id = feed_id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feed_sites::table
                .inner_join(sites::table)
                .filter(feed_sites::feed_id.eq(&feed_id))
                .select(SiteRecord::as_select())
                .load::<SiteRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Site::from).collect())
    }
}

/// Site storage.
#[derive(Clone)]
pub struct SiteRepository {
    pool: DbPool,
}

impl SiteRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    pub async fn save(&self, site: &Site) -> Result<(), DieselError> {
        let site = site.clone();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            diesel::replace_into(sites::table)
                .values((
                    sites::id.eq(&site.id),
                    sites::domain.eq(&site.domain),
                    sites::name.eq(&site.name),
                    sites::is_default.eq(site.is_default as i32),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn get(&self, id: &str) -> Result<Option<Site>, DieselError> {
        let id = id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            sites::table.find(&id).first::<SiteRecord>(conn).optional()
        })
        .await
        .map(|record| record.map(Site::from))
    }

    pub async fn get_all(&self) -> Result<Vec<Site>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            sites::table.order(sites::domain.asc()).load::<SiteRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(Site::from).collect())
    }

    /// Fetch the default site, creating it from the given domain/name on
    /// first use.
    pub async fn ensure_default(&self, domain: &str, name: &str) -> Result<Site, DieselError> {
        let domain = domain.to_string();
        let name = name.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let existing = sites::table
                .filter(sites::is_default.eq(1))
                .first::<SiteRecord>(conn)
                .optional()?;
            if let Some(record) = existing {
                return Ok(Site::from(record));
            }

            let mut site = Site::new(&domain, &name);
            site.is_default = true;
            diesel::insert_into(sites::table)
                .values((
                    sites::id.eq(&site.id),
                    sites::domain.eq(&site.domain),
                    sites::name.eq(&site.name),
                    sites::is_default.eq(1),
                ))
                .execute(conn)?;
            Ok(site)
        })
        .await
    }
}
