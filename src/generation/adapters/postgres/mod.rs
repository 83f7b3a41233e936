//! `PostgreSQL` adapters for generation job persistence.

mod models;
mod repository;
mod schema;

pub use repository::{JobPgPool, PostgresJobRepository};

#[cfg(test)]
pub(crate) use models::{JobRow, NewJobRow};
#[cfg(test)]
pub(crate) use repository::{row_to_job, to_new_row};
