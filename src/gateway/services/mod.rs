//! Application services for provider submission and callbacks.

mod callback;
mod error;
mod retry;
mod submission;

pub use callback::{CallbackOutcome, ProviderCallbackService};
pub use error::{GatewayError, GatewayResult};
pub use retry::RetryPolicy;
pub use submission::GenerationGateway;
