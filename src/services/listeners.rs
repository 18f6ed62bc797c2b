//! Import notification hooks.
//!
//! External observers plug into four points of the import lifecycle through
//! one typed trait, invoked synchronously in registration order. A failing
//! listener is logged and skipped; listeners can influence the engine only
//! through the documented channels (mutating a record before build,
//! replacing the publish batch).

use std::sync::Arc;

use tracing::warn;

use crate::feeds::RemoteVideoRecord;
use crate::models::Video;

/// Observer of the import lifecycle. All methods default to no-ops;
/// implementations override the points they care about.
pub trait ImportListener: Send + Sync {
    /// Called with each remote record before it is mapped to a video. The
    /// record may be mutated in place.
    fn before_video_build(&self, _record: &mut RemoteVideoRecord) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called once a video's row and attachments exist.
    fn after_video_attach(
        &self,
        _video: &Video,
        _record: &RemoteVideoRecord,
    ) -> anyhow::Result<()> {
        Ok(())
    }

    /// Called with the batch of videos about to be published. Return
    /// `Some(ids)` to replace the batch (ids must come from the candidate
    /// set), or `None` to leave it unchanged.
    fn before_publish(&self, _candidates: &[Video]) -> anyhow::Result<Option<Vec<String>>> {
        Ok(None)
    }

    /// Called with the finally-published batch.
    fn after_publish(&self, _published: &[Video]) -> anyhow::Result<()> {
        Ok(())
    }
}

/// The registered listener set.
#[derive(Default, Clone)]
pub struct ImportHooks {
    listeners: Vec<Arc<dyn ImportListener>>,
}

impl ImportHooks {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register(&mut self, listener: Arc<dyn ImportListener>) {
        self.listeners.push(listener);
    }

    pub(crate) fn listeners(&self) -> &[Arc<dyn ImportListener>] {
        &self.listeners
    }

    pub(crate) fn before_video_build(&self, record: &mut RemoteVideoRecord) {
        for listener in &self.listeners {
            if let Err(error) = listener.before_video_build(record) {
                warn!(%error, "before_video_build listener failed");
            }
        }
    }

    pub(crate) fn after_video_attach(&self, video: &Video, record: &RemoteVideoRecord) {
        for listener in &self.listeners {
            if let Err(error) = listener.after_video_attach(video, record) {
                warn!(%error, "after_video_attach listener failed");
            }
        }
    }

    pub(crate) fn after_publish(&self, published: &[Video]) {
        for listener in &self.listeners {
            if let Err(error) = listener.after_publish(published) {
                warn!(%error, "after_publish listener failed");
            }
        }
    }
}
