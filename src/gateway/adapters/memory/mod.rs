//! In-memory provider for tests and local runs.

mod provider;

pub use provider::InMemoryProvider;
