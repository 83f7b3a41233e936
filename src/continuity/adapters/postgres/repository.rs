//! `PostgreSQL` repository implementation for scenes.

use super::{
    models::{NewSceneRow, SceneRow},
    schema::scenes,
};
use crate::continuity::{
    domain::{ConversationId, PersistedSceneData, SceneId, SceneRecord},
    ports::{SceneRepository, SceneRepositoryError, SceneRepositoryResult},
};
use crate::generation::domain::{AssetUrl, JobId};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};

/// `PostgreSQL` connection pool type used by scene adapters.
pub type ScenePgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed scene repository.
#[derive(Debug, Clone)]
pub struct PostgresSceneRepository {
    pool: ScenePgPool,
}

impl PostgresSceneRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: ScenePgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> SceneRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> SceneRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(SceneRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(SceneRepositoryError::persistence)?
    }

    async fn latest(
        &self,
        conversation_id: &ConversationId,
        ready_only: bool,
    ) -> SceneRepositoryResult<Option<SceneRecord>> {
        let conversation = conversation_id.as_str().to_owned();
        self.run_blocking(move |connection| {
            let mut query = scenes::table
                .filter(scenes::conversation_id.eq(conversation))
                .into_boxed();
            if ready_only {
                query = query.filter(scenes::image_url.is_not_null());
            }
            let row = query
                .order(scenes::created_at.desc())
                .select(SceneRow::as_select())
                .first::<SceneRow>(connection)
                .optional()
                .map_err(SceneRepositoryError::persistence)?;
            row.map(row_to_scene).transpose()
        })
        .await
    }
}

#[async_trait]
impl SceneRepository for PostgresSceneRepository {
    async fn store(&self, scene: &SceneRecord) -> SceneRepositoryResult<()> {
        let scene_id = scene.id();
        let new_row = to_new_row(scene);
        self.run_blocking(move |connection| {
            diesel::insert_into(scenes::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        SceneRepositoryError::DuplicateScene(scene_id)
                    }
                    _ => SceneRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(&self, scene: &SceneRecord) -> SceneRepositoryResult<()> {
        let scene_id = scene.id();
        let row = to_new_row(scene);
        self.run_blocking(move |connection| {
            let updated = diesel::update(scenes::table.filter(scenes::id.eq(row.id)))
                .set((
                    scenes::job_id.eq(row.job_id),
                    scenes::image_url.eq(&row.image_url),
                    scenes::updated_at.eq(row.updated_at),
                ))
                .execute(connection)
                .map_err(SceneRepositoryError::persistence)?;
            if updated == 0 {
                return Err(SceneRepositoryError::NotFound(scene_id));
            }
            Ok(())
        })
        .await
    }

    async fn delete(&self, id: SceneId) -> SceneRepositoryResult<bool> {
        self.run_blocking(move |connection| {
            let deleted = diesel::delete(scenes::table.filter(scenes::id.eq(id.into_inner())))
                .execute(connection)
                .map_err(SceneRepositoryError::persistence)?;
            Ok(deleted > 0)
        })
        .await
    }

    async fn find_by_id(&self, id: SceneId) -> SceneRepositoryResult<Option<SceneRecord>> {
        self.run_blocking(move |connection| {
            let row = scenes::table
                .filter(scenes::id.eq(id.into_inner()))
                .select(SceneRow::as_select())
                .first::<SceneRow>(connection)
                .optional()
                .map_err(SceneRepositoryError::persistence)?;
            row.map(row_to_scene).transpose()
        })
        .await
    }

    async fn latest_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> SceneRepositoryResult<Option<SceneRecord>> {
        self.latest(conversation_id, false).await
    }

    async fn latest_ready_scene(
        &self,
        conversation_id: &ConversationId,
    ) -> SceneRepositoryResult<Option<SceneRecord>> {
        self.latest(conversation_id, true).await
    }
}

pub(crate) fn to_new_row(scene: &SceneRecord) -> NewSceneRow {
    NewSceneRow {
        id: scene.id().into_inner(),
        conversation_id: scene.conversation_id().as_str().to_owned(),
        job_id: scene.job_id().map(JobId::into_inner),
        image_url: scene.image_url().map(|url| url.as_str().to_owned()),
        created_at: scene.created_at(),
        updated_at: scene.updated_at(),
    }
}

pub(crate) fn row_to_scene(row: SceneRow) -> SceneRepositoryResult<SceneRecord> {
    let conversation_id = ConversationId::new(row.conversation_id)
        .map_err(SceneRepositoryError::invalid_persisted_data)?;
    let image_url = row
        .image_url
        .map(AssetUrl::new)
        .transpose()
        .map_err(SceneRepositoryError::invalid_persisted_data)?;

    Ok(SceneRecord::from_persisted(PersistedSceneData {
        id: SceneId::from_uuid(row.id),
        conversation_id,
        job_id: row.job_id.map(JobId::from_uuid),
        image_url,
        created_at: row.created_at,
        updated_at: row.updated_at,
    }))
}
