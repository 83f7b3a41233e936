//! Diesel schema for scene persistence.

diesel::table! {
    /// Conversation scenes with their generated images.
    scenes (id) {
        /// Internal scene identifier.
        id -> Uuid,
        /// Owning conversation.
        #[max_length = 255]
        conversation_id -> Varchar,
        /// Job generating the image.
        job_id -> Nullable<Uuid>,
        /// Generated image; null while pending.
        image_url -> Nullable<Text>,
        /// Creation timestamp.
        created_at -> Timestamptz,
        /// Last update timestamp.
        updated_at -> Timestamptz,
    }
}
