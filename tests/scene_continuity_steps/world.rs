//! Shared world state for scene continuity BDD scenarios.

use std::sync::Arc;

use mockable::DefaultClock;
use rstest::fixture;
use scenecraft::continuity::{
    adapters::memory::InMemorySceneRepository,
    domain::{ContinuitySeed, ConversationId, PreviousScene},
    services::{ContinuityConfig, SceneContinuityTracker},
};

/// Tracker type used by the BDD world.
pub type TestTracker = SceneContinuityTracker<InMemorySceneRepository, DefaultClock>;

/// Scenario world for scene continuity behaviour tests.
pub struct ContinuityWorld {
    pub tracker: TestTracker,
    pub conversation: Option<ConversationId>,
    pub previous: Option<PreviousScene>,
    pub seed: Option<Option<ContinuitySeed>>,
}

impl ContinuityWorld {
    /// Creates a world over an empty scene store.
    #[must_use]
    pub fn new() -> Self {
        Self {
            tracker: SceneContinuityTracker::new(
                Arc::new(InMemorySceneRepository::new()),
                Arc::new(DefaultClock),
                ContinuityConfig::default(),
            ),
            conversation: None,
            previous: None,
            seed: None,
        }
    }

    /// Returns the conversation under test.
    pub fn conversation(&self) -> Result<&ConversationId, eyre::Report> {
        self.conversation
            .as_ref()
            .ok_or_else(|| eyre::eyre!("missing conversation in scenario world"))
    }

    /// Returns the previous scene recorded by a when step.
    pub fn previous(&self) -> Result<&PreviousScene, eyre::Report> {
        self.previous
            .as_ref()
            .ok_or_else(|| eyre::eyre!("previous scene was never requested"))
    }

    /// Returns the seed recorded by a when step.
    pub fn seed(&self) -> Result<Option<&ContinuitySeed>, eyre::Report> {
        self.seed
            .as_ref()
            .map(Option::as_ref)
            .ok_or_else(|| eyre::eyre!("seed was never requested"))
    }
}

impl Default for ContinuityWorld {
    fn default() -> Self {
        Self::new()
    }
}

/// Fixture that creates a new scenario world.
#[fixture]
pub fn world() -> ContinuityWorld {
    ContinuityWorld::default()
}

/// Runs an async operation within sync step definitions.
pub fn run_async<T>(future: impl std::future::Future<Output = T>) -> T {
    tokio::task::block_in_place(|| tokio::runtime::Handle::current().block_on(future))
}
