//! In-memory generation job adapters.

mod job;

pub use job::InMemoryJobRepository;
