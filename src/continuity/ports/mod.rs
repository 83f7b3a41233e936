//! Port contracts for scene persistence.

pub mod change_feed;
pub mod repository;

pub use change_feed::SceneChangeFeed;
pub use repository::{SceneRepository, SceneRepositoryError, SceneRepositoryResult};
