use tracing::info;

/// Receives the opaque tracking profile chosen for a session.
/// The location-tracking collaborator behind it is not controlled by this crate.
pub trait ProfileSink: Send + Sync {
    fn apply(&self, profile_id: u32);
}

/// Default sink: nothing to forward to, so just log.
#[derive(Debug, Clone, Copy, Default)]
pub struct LoggingProfileSink;

impl ProfileSink for LoggingProfileSink {
    fn apply(&self, profile_id: u32) {
        info!(profile_id, "tracking profile requested");
    }
}
