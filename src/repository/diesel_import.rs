//! Import run, step, and seen-identifier storage.

use std::collections::HashMap;

use chrono::Utc;
use diesel::prelude::*;

use super::diesel_models::{FeedImportRecord, FeedImportStepRecord};
use super::diesel_pool::{run_blocking, DbPool, DieselError};
use super::parse_datetime;
use crate::models::{FeedImport, FeedImportStep, StepKind};
use crate::schema::{feed_import_identifiers, feed_import_steps, feed_imports};

impl From<FeedImportRecord> for FeedImport {
    fn from(record: FeedImportRecord) -> Self {
        FeedImport {
            id: record.id as i64,
            feed_id: record.feed_id,
            is_complete: record.is_complete != 0,
            error_count: record.error_count.max(0) as u32,
            import_count: record.import_count.max(0) as u32,
            created_at: parse_datetime(&record.created_at),
            updated_at: parse_datetime(&record.updated_at),
        }
    }
}

impl From<FeedImportStepRecord> for FeedImportStep {
    fn from(record: FeedImportStepRecord) -> Self {
        FeedImportStep {
            id: record.id as i64,
            feed_import_id: record.feed_import_id as i64,
            kind: StepKind::from_str(&record.step_kind).unwrap_or(StepKind::VideoErrored),
            video_id: record.video_id,
            failure: record.failure,
            created_at: parse_datetime(&record.created_at),
        }
    }
}

/// Storage for import runs, their step logs, and seen identifiers.
#[derive(Clone)]
pub struct ImportRepository {
    pool: DbPool,
}

impl ImportRepository {
    pub fn new(pool: DbPool) -> Self {
        Self { pool }
    }

    /// Create a fresh run row for a feed.
    pub async fn create_run(&self, feed_id: &str) -> Result<FeedImport, DieselError> {
        let feed_id = feed_id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let now = Utc::now().to_rfc3339();
            diesel::insert_into(feed_imports::table)
                .values((
                    feed_imports::feed_id.eq(&feed_id),
                    feed_imports::is_complete.eq(0),
                    feed_imports::error_count.eq(0),
                    feed_imports::import_count.eq(0),
                    feed_imports::created_at.eq(&now),
                    feed_imports::updated_at.eq(&now),
                ))
                .execute(conn)?;

            let id = diesel::sql_query("SELECT last_insert_rowid()")
                .get_result::<LastInsertRowId>(conn)?
                .id;
            feed_imports::table
                .find(id as i32)
                .first::<FeedImportRecord>(conn)
        })
        .await
        .map(FeedImport::from)
    }

    /// Persist a run's counters, timestamp, and completion flag.
    pub async fn save_run(&self, run: &FeedImport) -> Result<(), DieselError> {
        let run = run.clone();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            diesel::update(feed_imports::table.find(run.id as i32))
                .set((
                    feed_imports::is_complete.eq(run.is_complete as i32),
                    feed_imports::error_count.eq(run.error_count as i32),
                    feed_imports::import_count.eq(run.import_count as i32),
                    feed_imports::updated_at.eq(run.updated_at.to_rfc3339()),
                ))
                .execute(conn)?;
            Ok(())
        })
        .await
    }

    pub async fn get_run(&self, id: i64) -> Result<Option<FeedImport>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feed_imports::table
                .find(id as i32)
                .first::<FeedImportRecord>(conn)
                .optional()
        })
        .await
        .map(|record| record.map(FeedImport::from))
    }

    /// Runs for a feed, most recent first.
    pub async fn runs_for_feed(&self, feed_id: &str) -> Result<Vec<FeedImport>, DieselError> {
        let feed_id = feed_id.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feed_imports::table
                .filter(feed_imports::feed_id.eq(&feed_id))
                .order(feed_imports::created_at.desc())
                .load::<FeedImportRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(FeedImport::from).collect())
    }

    /// Append a step to a run's log.
    pub async fn add_step(
        &self,
        run_id: i64,
        kind: StepKind,
        video_id: Option<String>,
        failure: &str,
    ) -> Result<FeedImportStep, DieselError> {
        let failure = failure.to_string();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let now = Utc::now().to_rfc3339();
            diesel::insert_into(feed_import_steps::table)
                .values((
                    feed_import_steps::feed_import_id.eq(run_id as i32),
                    feed_import_steps::step_kind.eq(kind.as_str()),
                    feed_import_steps::video_id.eq(video_id.as_deref()),
                    feed_import_steps::failure.eq(&failure),
                    feed_import_steps::created_at.eq(&now),
                ))
                .execute(conn)?;

            let id = diesel::sql_query("SELECT last_insert_rowid()")
                .get_result::<LastInsertRowId>(conn)?
                .id;
            feed_import_steps::table
                .find(id as i32)
                .first::<FeedImportStepRecord>(conn)
        })
        .await
        .map(FeedImportStep::from)
    }

    /// A run's step log, oldest first.
    pub async fn steps_for_run(&self, run_id: i64) -> Result<Vec<FeedImportStep>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            feed_import_steps::table
                .filter(feed_import_steps::feed_import_id.eq(run_id as i32))
                .order(feed_import_steps::id.asc())
                .load::<FeedImportStepRecord>(conn)
        })
        .await
        .map(|records| records.into_iter().map(FeedImportStep::from).collect())
    }

    /// Step counts per kind, for reconciling a run's denormalized counters
    /// against its log.
    pub async fn step_counts(&self, run_id: i64) -> Result<HashMap<String, u64>, DieselError> {
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            let rows: Vec<StepCount> = diesel::sql_query(
                "SELECT step_kind, COUNT(*) as count FROM feed_import_steps \
                 WHERE feed_import_id = ? GROUP BY step_kind",
            )
            .bind::<diesel::sql_types::Integer, _>(run_id as i32)
            .load(conn)?;

            let mut counts = HashMap::new();
            for StepCount { step_kind, count } in rows {
                counts.insert(step_kind, count as u64);
            }
            Ok(counts)
        })
        .await
    }

    /// Whether any of the given fingerprints is recorded for the feed.
    pub async fn has_identifier(
        &self,
        feed_id: &str,
        hashes: &[String],
    ) -> Result<bool, DieselError> {
        let feed_id = feed_id.to_string();
        let hashes = hashes.to_vec();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            use diesel::dsl::count_star;
            let count: i64 = feed_import_identifiers::table
                .filter(feed_import_identifiers::feed_id.eq(&feed_id))
                .filter(feed_import_identifiers::identifier_hash.eq_any(&hashes))
                .select(count_star())
                .first(conn)?;
            Ok(count > 0)
        })
        .await
    }

    /// Record fingerprints for a feed. Input duplicates are dropped;
    /// duplicate rows from concurrent writers are benign.
    pub async fn add_identifiers(
        &self,
        feed_id: &str,
        hashes: &[String],
    ) -> Result<(), DieselError> {
        let feed_id = feed_id.to_string();
        let mut hashes = hashes.to_vec();
        hashes.sort();
        hashes.dedup();
        let pool = self.pool.clone();

        run_blocking(pool, move |conn| {
            for hash in &hashes {
                diesel::insert_into(feed_import_identifiers::table)
                    .values((
                        feed_import_identifiers::feed_id.eq(&feed_id),
                        feed_import_identifiers::identifier_hash.eq(hash),
                    ))
                    .execute(conn)?;
            }
            Ok(())
        })
        .await
    }
}

#[derive(diesel::QueryableByName)]
struct LastInsertRowId {
    #[diesel(sql_type = diesel::sql_types::BigInt, column_name = "last_insert_rowid()")]
    id: i64,
}

#[derive(diesel::QueryableByName)]
struct StepCount {
    #[diesel(sql_type = diesel::sql_types::Text)]
    step_kind: String,
    #[diesel(sql_type = diesel::sql_types::BigInt)]
    count: i64,
}
