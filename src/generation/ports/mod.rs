//! Port contracts for generation job persistence.
//!
//! Ports define infrastructure-agnostic interfaces used by generation
//! services.

pub mod change_feed;
pub mod repository;

pub use change_feed::JobChangeFeed;
pub use repository::{JobRepository, JobRepositoryError, JobRepositoryResult};
