//! Schema creation.
//!
//! The schema is small enough to manage as idempotent DDL executed at
//! startup; every statement is `CREATE ... IF NOT EXISTS`.

use diesel::prelude::*;

use super::diesel_pool::{init_connection_pragmas, run_blocking, DbPool, DieselError};

const SCHEMA: &[&str] = &[
    r#"CREATE TABLE IF NOT EXISTS sites (
        id TEXT PRIMARY KEY,
        domain TEXT NOT NULL UNIQUE,
        name TEXT NOT NULL,
        is_default INTEGER NOT NULL DEFAULT 0
    )"#,
    r#"CREATE TABLE IF NOT EXISTS feeds (
        id TEXT PRIMARY KEY,
        original_url TEXT NOT NULL,
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        web_url TEXT NOT NULL DEFAULT '',
        thumbnail TEXT NOT NULL DEFAULT '',
        moderate_imported_videos INTEGER NOT NULL DEFAULT 0,
        enable_automatic_imports INTEGER NOT NULL DEFAULT 1,
        stop_if_seen INTEGER NOT NULL DEFAULT 1,
        update_metadata_next_import INTEGER NOT NULL DEFAULT 1,
        external_etag TEXT NOT NULL DEFAULT '',
        external_last_modified TEXT,
        owner TEXT NOT NULL DEFAULT '',
        owner_email TEXT NOT NULL DEFAULT '',
        owner_session TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS feed_sites (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        feed_id TEXT NOT NULL,
        site_id TEXT NOT NULL,
        UNIQUE(feed_id, site_id)
    )"#,
    r#"CREATE TABLE IF NOT EXISTS feed_imports (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        feed_id TEXT NOT NULL,
        is_complete INTEGER NOT NULL DEFAULT 0,
        error_count INTEGER NOT NULL DEFAULT 0,
        import_count INTEGER NOT NULL DEFAULT 0,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS feed_import_steps (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        feed_import_id INTEGER NOT NULL,
        step_kind TEXT NOT NULL,
        video_id TEXT,
        failure TEXT NOT NULL DEFAULT '',
        created_at TEXT NOT NULL
    )"#,
    r#"CREATE TABLE IF NOT EXISTS feed_import_identifiers (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        feed_id TEXT NOT NULL,
        identifier_hash TEXT NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_feed_import_identifiers_feed_hash
        ON feed_import_identifiers (feed_id, identifier_hash)"#,
    r#"CREATE TABLE IF NOT EXISTS videos (
        id TEXT PRIMARY KEY,
        feed_id TEXT,
        original_url TEXT NOT NULL DEFAULT '',
        web_url TEXT NOT NULL DEFAULT '',
        embed_code TEXT NOT NULL DEFAULT '',
        flash_enclosure_url TEXT NOT NULL DEFAULT '',
        name TEXT NOT NULL DEFAULT '',
        description TEXT NOT NULL DEFAULT '',
        thumbnail TEXT NOT NULL DEFAULT '',
        guid TEXT NOT NULL DEFAULT '',
        owner TEXT NOT NULL DEFAULT '',
        owner_email TEXT NOT NULL DEFAULT '',
        owner_session TEXT,
        external_user_name TEXT NOT NULL DEFAULT '',
        external_user_url TEXT NOT NULL DEFAULT '',
        external_thumbnail_url TEXT NOT NULL DEFAULT '',
        external_thumbnail_tries INTEGER NOT NULL DEFAULT 0,
        external_published_at TEXT,
        status TEXT NOT NULL DEFAULT 'unpublished',
        published_at TEXT,
        created_at TEXT NOT NULL,
        updated_at TEXT NOT NULL
    )"#,
    r#"CREATE INDEX IF NOT EXISTS idx_videos_status ON videos (status)"#,
    r#"CREATE INDEX IF NOT EXISTS idx_videos_feed ON videos (feed_id)"#,
    r#"CREATE TABLE IF NOT EXISTS video_files (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        video_id TEXT NOT NULL,
        url TEXT NOT NULL,
        length INTEGER,
        mime_type TEXT NOT NULL DEFAULT ''
    )"#,
    r#"CREATE TABLE IF NOT EXISTS video_sites (
        id INTEGER PRIMARY KEY AUTOINCREMENT,
        video_id TEXT NOT NULL,
        site_id TEXT NOT NULL,
        UNIQUE(video_id, site_id)
    )"#,
];

/// Apply pragmas and create any missing tables.
pub async fn init_schema(pool: DbPool) -> Result<(), DieselError> {
    run_blocking(pool, |conn| {
        init_connection_pragmas(conn)?;
        for statement in SCHEMA {
            diesel::sql_query(*statement).execute(conn)?;
        }
        Ok(())
    })
    .await
}
