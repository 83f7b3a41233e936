//! Scenecraft: generation job lifecycle for AI image and video studios.
//!
//! This crate tracks generation jobs from request to result, keeps a
//! session-scoped workspace of outputs, remembers the last image of each
//! conversation for scene continuity and maps canonical parameters onto
//! provider inputs.
//!
//! # Architecture
//!
//! Scenecraft follows hexagonal architecture principles:
//!
//! - **Domain**: Pure business logic with no infrastructure dependencies
//! - **Ports**: Abstract trait interfaces for external interactions
//! - **Adapters**: Concrete implementations of ports (database, HTTP, files)
//!
//! # Modules
//!
//! - [`generation`]: Request normalization, job store and job watches
//! - [`workspace`]: Session-scoped workspace cache
//! - [`continuity`]: Scene continuity tracking per conversation
//! - [`gateway`]: Model catalogue, parameter mapping and provider submission
//! - [`studio`]: Facade wiring the contexts into one session
//! - [`config`]: Runtime configuration

pub mod config;
pub mod continuity;
pub mod gateway;
pub mod generation;
pub mod studio;
pub mod workspace;
