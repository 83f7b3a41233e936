//! Port contracts for workspace persistence.

pub mod storage;

pub use storage::{SessionStorage, SessionStorageError, SessionStorageResult};
