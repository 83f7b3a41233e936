//! Domain model for the session-local workspace.
//!
//! A workspace item is an ephemeral view of one output of a completed
//! generation job. Items are unique by output URL within a session.

mod error;
mod item;
mod session;

pub use error::WorkspaceDomainError;
pub use item::{WorkspaceItem, WorkspaceItemId};
pub use session::{SessionId, WorkspaceSession};
