//! End-of-run publication batch filtering.

use std::collections::HashSet;

use tracing::warn;

use super::listeners::ImportHooks;
use crate::models::Video;

/// Resolves which of a run's candidate videos actually get published.
#[derive(Clone)]
pub struct PublicationGate {
    hooks: ImportHooks,
}

impl PublicationGate {
    pub fn new(hooks: ImportHooks) -> Self {
        Self { hooks }
    }

    /// Resolve the final set of video ids to publish.
    ///
    /// Defaults to the whole candidate batch. Every before-publish listener
    /// is consulted; a listener returning ids outside the batch, or failing
    /// outright, is ignored with a warning. When several listeners respond,
    /// the LAST valid response wins — an ordering sensitivity inherited from
    /// the original system and kept on purpose (see DESIGN.md).
    pub fn select_for_publication(&self, candidates: &[Video]) -> Vec<String> {
        let candidate_ids: HashSet<&str> =
            candidates.iter().map(|video| video.id.as_str()).collect();
        let mut selected: Vec<String> =
            candidates.iter().map(|video| video.id.clone()).collect();

        for listener in self.hooks.listeners() {
            match listener.before_publish(candidates) {
                Ok(None) => {}
                Ok(Some(replacement)) => {
                    if replacement
                        .iter()
                        .all(|id| candidate_ids.contains(id.as_str()))
                    {
                        selected = replacement;
                    } else {
                        warn!("before_publish listener returned ids outside the candidate batch");
                    }
                }
                Err(error) => {
                    warn!(%error, "before_publish listener failed");
                }
            }
        }

        selected
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::VideoStatus;
    use crate::services::ImportListener;
    use chrono::Utc;
    use std::sync::Arc;

    fn candidate(id: &str) -> Video {
        let now = Utc::now();
        Video {
            id: id.to_string(),
            feed_id: None,
            original_url: String::new(),
            web_url: String::new(),
            embed_code: String::new(),
            flash_enclosure_url: String::new(),
            name: id.to_string(),
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

    struct Narrow(Vec<String>);
    impl ImportListener for Narrow {
        fn before_publish(&self, _candidates: &[Video]) -> anyhow::Result<Option<Vec<String>>> {
            Ok(Some(self.0.clone()))
        }
    }

    struct Failing;
    impl ImportListener for Failing {
        fn before_publish(&self, _candidates: &[Video]) -> anyhow::Result<Option<Vec<String>>> {
            anyhow::bail!("listener broke")
        }
    }

    #[test]
    fn defaults_to_the_full_batch() {
        let gate = PublicationGate::new(ImportHooks::new());
        let candidates = vec![candidate("a"), candidate("b")];
        assert_eq!(gate.select_for_publication(&candidates), ["a", "b"]);
    }

    #[test]
    fn valid_overrides_narrow_the_batch() {
        let mut hooks = ImportHooks::new();
        hooks.register(Arc::new(Narrow(vec!["b".to_string()])));
        let gate = PublicationGate::new(hooks);

        let candidates = vec![candidate("a"), candidate("b")];
        assert_eq!(gate.select_for_publication(&candidates), ["b"]);
    }

    #[test]
    fn overrides_outside_the_batch_are_ignored() {
        let mut hooks = ImportHooks::new();
        hooks.register(Arc::new(Narrow(vec!["z".to_string()])));
        let gate = PublicationGate::new(hooks);

        let candidates = vec![candidate("a"), candidate("b")];
        assert_eq!(gate.select_for_publication(&candidates), ["a", "b"]);
    }

    #[test]
    fn failing_listeners_are_ignored() {
        let mut hooks = ImportHooks::new();
        hooks.register(Arc::new(Failing));
        let gate = PublicationGate::new(hooks);

        let candidates = vec![candidate("a")];
        assert_eq!(gate.select_for_publication(&candidates), ["a"]);
    }

    #[test]
    fn last_valid_response_wins() {
        let mut hooks = ImportHooks::new();
        hooks.register(Arc::new(Narrow(vec!["a".to_string()])));
        hooks.register(Arc::new(Failing));
        hooks.register(Arc::new(Narrow(vec!["b".to_string()])));
        let gate = PublicationGate::new(hooks);

        let candidates = vec![candidate("a"), candidate("b")];
        assert_eq!(gate.select_for_publication(&candidates), ["b"]);
    }
}
