//! Diesel schema for generation job persistence.

diesel::table! {
    /// Generation jobs with canonical parameters and provider results.
    generation_jobs (id) {
        /// Internal job identifier.
        id -> Uuid,
        /// Owning user.
        owner_id -> Uuid,
        /// Output modality.
        #[max_length = 20]
        kind -> Varchar,
        /// Lifecycle status.
        #[max_length = 20]
        status -> Varchar,
        /// Chosen model identifier.
        #[max_length = 255]
        model_id -> Varchar,
        /// Prompt text, duplicated from the parameters for querying.
        prompt -> Text,
        /// Canonical parameters payload.
        parameters -> Jsonb,
        /// Provider-side handle assigned on submission.
        #[max_length = 255]
        provider_handle -> Nullable<Varchar>,
        /// Generated outputs.
        outputs -> Jsonb,
        /// Failure payload for failed jobs.
        failure -> Nullable<Jsonb>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Processing start timestamp.
        started_at -> Nullable<Timestamptz>,
        /// Terminal timestamp.
        completed_at -> Nullable<Timestamptz>,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
