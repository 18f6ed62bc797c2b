//! Content fingerprinting and per-feed dedup.
//!
//! A remote record is "the same content" as a previously imported one when
//! any single identifying facet matches, so each facet is hashed on its own
//! and membership is checked against the whole set.

use std::collections::HashSet;

use sha2::{Digest, Sha256};

use crate::feeds::RemoteVideoRecord;
use crate::repository::diesel_pool::DieselError;
use crate::repository::ImportRepository;

/// Derives and tracks content fingerprints per feed.
#[derive(Clone)]
pub struct IdentifierIndex {
    imports: ImportRepository,
}

impl IdentifierIndex {
    pub fn new(imports: ImportRepository) -> Self {
        Self { imports }
    }

    /// Stable fingerprints for a remote record: one digest per non-empty
    /// identifying facet (guid, canonical link, flash enclosure, embed
    /// markup, each non-expiring file URL). Deduplicated, facet order kept.
    pub fn fingerprints(record: &RemoteVideoRecord) -> Vec<String> {
        let mut facets: Vec<&str> = Vec::new();
        for facet in [
            record.guid.as_deref(),
            record.link.as_deref(),
            record.flash_enclosure_url.as_deref(),
            record.embed_code.as_deref(),
        ]
        .into_iter()
        .flatten()
        {
            if !facet.is_empty() {
                facets.push(facet);
            }
        }
        for file in &record.files {
            if file.expires.is_none() && !file.url.is_empty() {
                facets.push(&file.url);
            }
        }

        let mut seen = HashSet::new();
        let mut hashes = Vec::with_capacity(facets.len());
        for facet in facets {
            let digest = hex::encode(Sha256::digest(facet.as_bytes()));
            if seen.insert(digest.clone()) {
                hashes.push(digest);
            }
        }
        hashes
    }

    /// Whether the record matches anything previously imported for the feed.
    ///
    /// A record yielding no fingerprints is never considered seen: novelty
    /// cannot be proven either way, so it keeps its chance to import.
    pub async fn is_seen(
        &self,
        feed_id: &str,
        record: &RemoteVideoRecord,
    ) -> Result<bool, DieselError> {
        let hashes = Self::fingerprints(record);
        if hashes.is_empty() {
            return Ok(false);
        }
        self.imports.has_identifier(feed_id, &hashes).await
    }

    /// Record every fingerprint of the record against the feed. Call only
    /// after the derived video has been durably persisted.
    pub async fn mark_seen(
        &self,
        feed_id: &str,
        record: &RemoteVideoRecord,
    ) -> Result<(), DieselError> {
        let hashes = Self::fingerprints(record);
        if hashes.is_empty() {
            return Ok(());
        }
        self.imports.add_identifiers(feed_id, &hashes).await
    }
}
