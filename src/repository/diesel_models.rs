//! Diesel ORM models for database tables.
//!
//! These models provide compile-time type checking for database operations.
//! Booleans are stored as integers, timestamps as RFC 3339 text.

use diesel::prelude::*;

use crate::schema;

/// Feed record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::feeds)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeedRecord {
    pub id: String,
    pub original_url: String,
    pub name: String,
    pub description: String,
    pub web_url: String,
    pub thumbnail: String,
    pub moderate_imported_videos: i32,
    pub enable_automatic_imports: i32,
    pub stop_if_seen: i32,
    pub update_metadata_next_import: i32,
    pub external_etag: String,
    pub external_last_modified: Option<String>,
    pub owner: String,
    pub owner_email: String,
    pub owner_session: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New feed for insertion (also used for upserts).
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::feeds)]
pub struct NewFeed<'a> {
    pub id: &'a str,
    pub original_url: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub web_url: &'a str,
    pub thumbnail: &'a str,
    pub moderate_imported_videos: i32,
    pub enable_automatic_imports: i32,
    pub stop_if_seen: i32,
    pub update_metadata_next_import: i32,
    pub external_etag: &'a str,
    pub external_last_modified: Option<&'a str>,
    pub owner: &'a str,
    pub owner_email: &'a str,
    pub owner_session: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Site record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::sites)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct SiteRecord {
    pub id: String,
    pub domain: String,
    pub name: String,
    pub is_default: i32,
}

/// Import run record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::feed_imports)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeedImportRecord {
    pub id: i32,
    pub feed_id: String,
    pub is_complete: i32,
    pub error_count: i32,
    pub import_count: i32,
    pub created_at: String,
    pub updated_at: String,
}

/// Import step record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::feed_import_steps)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct FeedImportStepRecord {
    pub id: i32,
    pub feed_import_id: i32,
    pub step_kind: String,
    pub video_id: Option<String>,
    pub failure: String,
    pub created_at: String,
}

/// Video record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::videos)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VideoRecord {
    pub id: String,
    pub feed_id: Option<String>,
    pub original_url: String,
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
    pub external_thumbnail_tries: i32,
    pub external_published_at: Option<String>,
    pub status: String,
    pub published_at: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

/// New video for insertion (also used for upserts).
#[derive(Insertable, Debug)]
#[diesel(table_name = schema::videos)]
pub struct NewVideo<'a> {
    pub id: &'a str,
    pub feed_id: Option<&'a str>,
    pub original_url: &'a str,
    pub web_url: &'a str,
    pub embed_code: &'a str,
    pub flash_enclosure_url: &'a str,
    pub name: &'a str,
    pub description: &'a str,
    pub thumbnail: &'a str,
    pub guid: &'a str,
    pub owner: &'a str,
    pub owner_email: &'a str,
    pub owner_session: Option<&'a str>,
    pub external_user_name: &'a str,
    pub external_user_url: &'a str,
    pub external_thumbnail_url: &'a str,
    pub external_thumbnail_tries: i32,
    pub external_published_at: Option<&'a str>,
    pub status: &'a str,
    pub published_at: Option<&'a str>,
    pub created_at: &'a str,
    pub updated_at: &'a str,
}

/// Video file record from the database.
#[derive(Queryable, Selectable, Identifiable, Debug, Clone)]
#[diesel(table_name = schema::video_files)]
#[diesel(check_for_backend(diesel::sqlite::Sqlite))]
pub struct VideoFileRecord {
    pub id: i32,
    pub video_id: String,
    pub url: String,
    pub length: Option<i32>,
    pub mime_type: String,
}
