//! `PostgreSQL` repository implementation for generation jobs.

use super::{
    models::{JobRow, NewJobRow},
    schema::generation_jobs,
};
use crate::generation::{
    domain::{
        CanonicalParams, GenerationJob, JobFailure, JobId, JobKind, JobOutput, JobStatus,
        OwnerId, PersistedJobData, ProviderHandle,
    },
    ports::{JobRepository, JobRepositoryError, JobRepositoryResult},
};
use async_trait::async_trait;
use diesel::pg::PgConnection;
use diesel::prelude::*;
use diesel::r2d2::{ConnectionManager, Pool};
use diesel::result::{DatabaseErrorKind, Error as DieselError};
use thiserror::Error;

/// A denormalized column disagrees with the stored parameters payload.
#[derive(Debug, Error)]
#[error("column `{column}` holds {stored:?} but the parameters say {expected:?}")]
struct ColumnMismatch {
    column: &'static str,
    stored: String,
    expected: String,
}

/// `PostgreSQL` connection pool type used by generation adapters.
pub type JobPgPool = Pool<ConnectionManager<PgConnection>>;

/// `PostgreSQL`-backed generation job repository.
#[derive(Debug, Clone)]
pub struct PostgresJobRepository {
    pool: JobPgPool,
}

impl PostgresJobRepository {
    /// Creates a new repository from a `PostgreSQL` connection pool.
    #[must_use]
    pub const fn new(pool: JobPgPool) -> Self {
        Self { pool }
    }

    async fn run_blocking<F, T>(&self, f: F) -> JobRepositoryResult<T>
    where
        F: FnOnce(&mut PgConnection) -> JobRepositoryResult<T> + Send + 'static,
        T: Send + 'static,
    {
        let pool = self.pool.clone();
        tokio::task::spawn_blocking(move || {
            let mut connection = pool.get().map_err(JobRepositoryError::persistence)?;
            f(&mut connection)
        })
        .await
        .map_err(JobRepositoryError::persistence)?
    }
}

#[async_trait]
impl JobRepository for PostgresJobRepository {
    async fn store(&self, job: &GenerationJob) -> JobRepositoryResult<()> {
        let job_id = job.id();
        let new_row = to_new_row(job)?;

        self.run_blocking(move |connection| {
            diesel::insert_into(generation_jobs::table)
                .values(&new_row)
                .execute(connection)
                .map_err(|err| match err {
                    DieselError::DatabaseError(DatabaseErrorKind::UniqueViolation, _) => {
                        JobRepositoryError::DuplicateJob(job_id)
                    }
                    _ => JobRepositoryError::persistence(err),
                })?;
            Ok(())
        })
        .await
    }

    async fn update(
        &self,
        job: &GenerationJob,
        expected_status: JobStatus,
    ) -> JobRepositoryResult<()> {
        let job_id = job.id();
        let row = to_new_row(job)?;

        self.run_blocking(move |connection| {
            let updated = diesel::update(
                generation_jobs::table
                    .filter(generation_jobs::id.eq(row.id))
                    .filter(generation_jobs::status.eq(expected_status.as_str())),
            )
            .set((
                generation_jobs::status.eq(&row.status),
                generation_jobs::parameters.eq(&row.parameters),
                generation_jobs::provider_handle.eq(&row.provider_handle),
                generation_jobs::outputs.eq(&row.outputs),
                generation_jobs::failure.eq(&row.failure),
                generation_jobs::started_at.eq(row.started_at),
                generation_jobs::completed_at.eq(row.completed_at),
                generation_jobs::updated_at.eq(row.updated_at),
            ))
            .execute(connection)
            .map_err(JobRepositoryError::persistence)?;

            if updated > 0 {
                return Ok(());
            }

            let stored_status = generation_jobs::table
                .filter(generation_jobs::id.eq(row.id))
                .select(generation_jobs::status)
                .first::<String>(connection)
                .optional()
                .map_err(JobRepositoryError::persistence)?
                .ok_or(JobRepositoryError::NotFound(job_id))?;
            let actual = JobStatus::try_from(stored_status.as_str())
                .map_err(JobRepositoryError::invalid_persisted_data)?;
            Err(JobRepositoryError::StatusConflict {
                job_id,
                expected: expected_status,
                actual,
            })
        })
        .await
    }

    async fn find_by_id(&self, id: JobId) -> JobRepositoryResult<Option<GenerationJob>> {
        self.run_blocking(move |connection| {
            let row = generation_jobs::table
                .filter(generation_jobs::id.eq(id.into_inner()))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(JobRepositoryError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn find_by_provider_handle(
        &self,
        handle: &ProviderHandle,
    ) -> JobRepositoryResult<Option<GenerationJob>> {
        let lookup = handle.as_str().to_owned();
        self.run_blocking(move |connection| {
            let row = generation_jobs::table
                .filter(generation_jobs::provider_handle.eq(lookup))
                .select(JobRow::as_select())
                .first::<JobRow>(connection)
                .optional()
                .map_err(JobRepositoryError::persistence)?;
            row.map(row_to_job).transpose()
        })
        .await
    }

    async fn list_recent(
        &self,
        owner: OwnerId,
        kind: JobKind,
        limit: usize,
    ) -> JobRepositoryResult<Vec<GenerationJob>> {
        let row_limit = i64::try_from(limit).map_err(JobRepositoryError::persistence)?;
        self.run_blocking(move |connection| {
            let rows = generation_jobs::table
                .filter(generation_jobs::owner_id.eq(owner.into_inner()))
                .filter(generation_jobs::kind.eq(kind.as_str()))
                .order(generation_jobs::created_at.desc())
                .limit(row_limit)
                .select(JobRow::as_select())
                .load::<JobRow>(connection)
                .map_err(JobRepositoryError::persistence)?;
            rows.into_iter().map(row_to_job).collect()
        })
        .await
    }
}

pub(crate) fn to_new_row(job: &GenerationJob) -> JobRepositoryResult<NewJobRow> {
    let parameters =
        serde_json::to_value(job.params()).map_err(JobRepositoryError::persistence)?;
    let outputs = serde_json::to_value(job.outputs()).map_err(JobRepositoryError::persistence)?;
    let failure = job
        .failure()
        .map(serde_json::to_value)
        .transpose()
        .map_err(JobRepositoryError::persistence)?;

    Ok(NewJobRow {
        id: job.id().into_inner(),
        owner_id: job.owner_id().into_inner(),
        kind: job.kind().as_str().to_owned(),
        status: job.status().as_str().to_owned(),
        model_id: job.model_id().as_str().to_owned(),
        prompt: job.prompt().as_str().to_owned(),
        parameters,
        provider_handle: job.provider_handle().map(|handle| handle.as_str().to_owned()),
        outputs,
        failure,
        created_at: job.created_at(),
        started_at: job.started_at(),
        completed_at: job.completed_at(),
        updated_at: job.updated_at(),
    })
}

pub(crate) fn row_to_job(row: JobRow) -> JobRepositoryResult<GenerationJob> {
    let JobRow {
        id,
        owner_id,
        kind: persisted_kind,
        status: persisted_status,
        model_id: persisted_model,
        prompt: persisted_prompt,
        parameters: persisted_parameters,
        provider_handle: persisted_handle,
        outputs: persisted_outputs,
        failure: persisted_failure,
        created_at,
        started_at,
        completed_at,
        updated_at,
    } = row;

    let params = serde_json::from_value::<CanonicalParams>(persisted_parameters)
        .map_err(JobRepositoryError::invalid_persisted_data)?;
    check_column("kind", persisted_kind, params.kind.as_str())?;
    check_column("model_id", persisted_model, params.model_id.as_str())?;
    check_column("prompt", persisted_prompt, params.prompt.as_str())?;
    let status = JobStatus::try_from(persisted_status.as_str())
        .map_err(JobRepositoryError::invalid_persisted_data)?;
    let provider_handle = persisted_handle
        .map(ProviderHandle::new)
        .transpose()
        .map_err(JobRepositoryError::invalid_persisted_data)?;
    let outputs = serde_json::from_value::<Vec<JobOutput>>(persisted_outputs)
        .map_err(JobRepositoryError::invalid_persisted_data)?;
    let failure = persisted_failure
        .map(serde_json::from_value::<JobFailure>)
        .transpose()
        .map_err(JobRepositoryError::invalid_persisted_data)?;

    Ok(GenerationJob::from_persisted(PersistedJobData {
        id: JobId::from_uuid(id),
        owner_id: OwnerId::from_uuid(owner_id),
        params,
        status,
        provider_handle,
        outputs,
        failure,
        created_at,
        started_at,
        completed_at,
        updated_at,
    }))
}

fn check_column(column: &'static str, stored: String, expected: &str) -> JobRepositoryResult<()> {
    if stored == expected {
        return Ok(());
    }
    Err(JobRepositoryError::invalid_persisted_data(ColumnMismatch {
        column,
        stored,
        expected: expected.to_owned(),
    }))
}
