//! Optional push notification port for job row changes.

use crate::generation::domain::GenerationJob;
use tokio::sync::broadcast;

/// Row-level change notifications published by a job store.
///
/// Stores that cannot push changes simply do not implement this port;
/// watchers then rely on polling alone.
pub trait JobChangeFeed: Send + Sync {
    /// Subscribes to every subsequent job write.
    ///
    /// Slow receivers may observe [`broadcast::error::RecvError::Lagged`].
    fn subscribe(&self) -> broadcast::Receiver<GenerationJob>;
}
