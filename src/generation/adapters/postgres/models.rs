//! Diesel row models for generation job persistence.

use super::schema::generation_jobs;
use chrono::{DateTime, Utc};
use diesel::prelude::*;
use serde_json::Value;

/// Query result row for generation jobs.
#[derive(Debug, Clone, Queryable, Selectable)]
#[diesel(table_name = generation_jobs)]
#[diesel(check_for_backend(diesel::pg::Pg))]
pub struct JobRow {
    /// Internal job identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Output modality.
    pub kind: String,
    /// Lifecycle status.
    pub status: String,
    /// Chosen model identifier.
    pub model_id: String,
    /// Prompt text.
    pub prompt: String,
    /// Canonical parameters payload.
    pub parameters: Value,
    /// Provider handle.
    pub provider_handle: Option<String>,
    /// Generated outputs.
    pub outputs: Value,
    /// Failure payload.
    pub failure: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Processing start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}

/// Insert model for generation jobs.
#[derive(Debug, Clone, Insertable)]
#[diesel(table_name = generation_jobs)]
pub struct NewJobRow {
    /// Internal job identifier.
    pub id: uuid::Uuid,
    /// Owning user.
    pub owner_id: uuid::Uuid,
    /// Output modality.
    pub kind: String,
    /// Lifecycle status.
    pub status: String,
    /// Chosen model identifier.
    pub model_id: String,
    /// Prompt text.
    pub prompt: String,
    /// Canonical parameters payload.
    pub parameters: Value,
    /// Provider handle.
    pub provider_handle: Option<String>,
    /// Generated outputs.
    pub outputs: Value,
    /// Failure payload.
    pub failure: Option<Value>,
    /// Creation timestamp.
    pub created_at: DateTime<Utc>,
    /// Processing start timestamp.
    pub started_at: Option<DateTime<Utc>>,
    /// Terminal timestamp.
    pub completed_at: Option<DateTime<Utc>>,
    /// Last update timestamp.
    pub updated_at: DateTime<Utc>,
}
