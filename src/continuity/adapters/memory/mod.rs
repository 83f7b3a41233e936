//! In-memory scene adapters.

mod scene;

pub use scene::InMemorySceneRepository;
