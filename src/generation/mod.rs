//! Generation job lifecycle.
//!
//! Raw user requests are normalized into canonical parameters, persisted as
//! jobs with a monotonic status machine (`pending`, `processing`, then one of
//! `completed` or `failed`), and followed by cancellable watches until they
//! settle. The module follows hexagonal architecture:
//!
//! - Domain types in [`domain`]
//! - Port contracts in [`ports`]
//! - Adapter implementations in [`adapters`]
//! - Orchestration services in [`services`]

pub mod adapters;
pub mod domain;
pub mod ports;
pub mod services;

#[cfg(test)]
mod tests;
