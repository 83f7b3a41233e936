//! Directory-backed session storage.

mod storage;

pub use storage::DirectorySessionStorage;
