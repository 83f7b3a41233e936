//! `PostgreSQL` adapters for scene persistence.

mod models;
mod repository;
mod schema;

pub use repository::{PostgresSceneRepository, ScenePgPool};

#[cfg(test)]
pub(crate) use models::{NewSceneRow, SceneRow};
#[cfg(test)]
pub(crate) use repository::{row_to_scene, to_new_row};
