//! Application services for generation job orchestration.

mod lifecycle;
mod normalizer;
mod watch;

pub use lifecycle::{JobLifecycleError, JobLifecycleResult, JobLifecycleService};
pub use normalizer::RequestNormalizer;
pub use watch::{JobEvent, JobWatch, JobWatcher, WatchConfig, WatchOutcome};
