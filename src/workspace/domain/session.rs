//! Session marker persisted next to the workspace items.

use crate::generation::domain::OwnerId;
use chrono::{DateTime, Utc};
use mockable::Clock;
use serde::{Deserialize, Serialize};
use std::fmt;
use uuid::Uuid;

/// Identifier of one workspace session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(Uuid);

impl SessionId {
    /// Creates a new random session identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for SessionId {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Marker recording which owner the stored workspace belongs to.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WorkspaceSession {
    owner_id: OwnerId,
    session_id: SessionId,
    started_at: DateTime<Utc>,
}

impl WorkspaceSession {
    /// Starts a new session for `owner_id`.
    #[must_use]
    pub fn start(owner_id: OwnerId, clock: &impl Clock) -> Self {
        Self {
            owner_id,
            session_id: SessionId::new(),
            started_at: clock.utc(),
        }
    }

    /// Returns the session owner.
    #[must_use]
    pub const fn owner_id(&self) -> OwnerId {
        self.owner_id
    }

    /// Returns the session identifier.
    #[must_use]
    pub const fn session_id(&self) -> SessionId {
        self.session_id
    }

    /// Returns when the session started.
    #[must_use]
    pub const fn started_at(&self) -> DateTime<Utc> {
        self.started_at
    }

    /// Returns whether this marker belongs to `owner_id`.
    #[must_use]
    pub fn belongs_to(&self, owner_id: OwnerId) -> bool {
        self.owner_id == owner_id
    }
}
