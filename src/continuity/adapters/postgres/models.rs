//! Diesel row models for scene persistence.

use super::schema::scenes;
use chrono::{DateTime, Utc};
use diesel::prelude::*;

/// Query result row for scenes.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = scenes)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct SceneRow {
    /// Internal scene identifier.
    pub id: uuid::Uuid,
    /// Owning conversation.
    pub conversation_id: String,
    /// Job generating the image.
    pub job_id: Option<uuid::Uuid>,
    /// Generated image.
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for scenes.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = scenes)]
pub struct NewSceneRow {
    /// Internal scene identifier.
    pub id: uuid::Uuid,
    /// Owning conversation.
    pub conversation_id: String,
    /// Job generating the image.
    pub job_id: Option<uuid::Uuid>,
    /// Generated image.
    pub image_url: Option<String>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
