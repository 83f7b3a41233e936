//! Application services for the workspace.

mod cache;

pub use cache::{
    AddOutcome, ITEMS_KEY, PersistenceStatus, SESSION_KEY, WorkspaceCache, WorkspaceConfig,
    WorkspaceError, WorkspaceResult,
};
