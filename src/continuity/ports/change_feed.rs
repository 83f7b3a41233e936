//! Optional push notification port for scene row changes.

use crate::continuity::domain::SceneRecord;
use tokio::sync::broadcast;

/// Row-level change notifications published by a scene store.
pub trait SceneChangeFeed: Send + Sync {
    /// Subscribes to every subsequent scene write.
    fn subscribe(&self) -> broadcast::Receiver<SceneRecord>;
}
