//! In-memory session storage.

mod storage;

pub use storage::InMemorySessionStorage;
