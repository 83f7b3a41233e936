//! Scriptable in-memory generation provider.

use crate::gateway::ports::{
    GenerationProvider, PredictionStatus, ProviderError, ProviderPrediction, ProviderRequest,
    ProviderResult,
};
use crate::generation::domain::{AssetUrl, ProviderHandle};
use async_trait::async_trait;
use std::collections::{HashMap, VecDeque};
use std::sync::{Arc, Mutex, MutexGuard};

#[derive(Debug, Default)]
struct State {
    next_id: u64,
    submit_failures: VecDeque<ProviderError>,
    requests: Vec<ProviderRequest>,
    predictions: HashMap<ProviderHandle, ProviderPrediction>,
}

/// Provider that accepts every request and settles predictions on demand.
///
/// Clones share state, so a test can keep one handle while the gateway
/// holds another.
#[derive(Debug, Clone, Default)]
pub struct InMemoryProvider {
    state: Arc<Mutex<State>>,
}

impl InMemoryProvider {
    /// Creates a provider with no predictions.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Makes the next submission fail with `error`. Queued failures are
    /// consumed in order.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when the state lock is poisoned.
    pub fn fail_next_submit(&self, error: ProviderError) -> ProviderResult<()> {
        self.lock()?.submit_failures.push_back(error);
        Ok(())
    }

    /// Returns every request received, oldest first.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Transport`] when the state lock is poisoned.
    pub fn requests(&self) -> ProviderResult<Vec<ProviderRequest>> {
        Ok(self.lock()?.requests.clone())
    }

    /// Marks a prediction as succeeded with `outputs`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Rejected`] with status 404 for unknown
    /// handles.
    pub fn succeed(
        &self,
        handle: &ProviderHandle,
        outputs: Vec<AssetUrl>,
    ) -> ProviderResult<ProviderPrediction> {
        self.settle(handle, |prediction| {
            prediction.status = PredictionStatus::Succeeded;
            prediction.outputs = outputs;
        })
    }

    /// Marks a prediction as failed with `message`.
    ///
    /// # Errors
    ///
    /// Returns [`ProviderError::Rejected`] with status 404 for unknown
    /// handles.
    pub fn fail(
        &self,
        handle: &ProviderHandle,
        message: impl Into<String>,
    ) -> ProviderResult<ProviderPrediction> {
        let text = message.into();
        self.settle(handle, |prediction| {
            prediction.status = PredictionStatus::Failed;
            prediction.error = Some(text);
        })
    }

    fn settle(
        &self,
        handle: &ProviderHandle,
        update: impl FnOnce(&mut ProviderPrediction),
    ) -> ProviderResult<ProviderPrediction> {
        let mut state = self.lock()?;
        let prediction = state
            .predictions
            .get_mut(handle)
            .ok_or_else(|| not_found(handle))?;
        update(prediction);
        Ok(prediction.clone())
    }

    fn lock(&self) -> ProviderResult<MutexGuard<'_, State>> {
        self.state
            .lock()
            .map_err(|err| ProviderError::Transport(err.to_string()))
    }
}

fn not_found(handle: &ProviderHandle) -> ProviderError {
    ProviderError::Rejected {
        status_code: 404,
        message: format!("unknown prediction {handle}"),
    }
}

#[async_trait]
impl GenerationProvider for InMemoryProvider {
    async fn submit(&self, request: &ProviderRequest) -> ProviderResult<ProviderHandle> {
        let mut state = self.lock()?;
        state.requests.push(request.clone());
        if let Some(error) = state.submit_failures.pop_front() {
            return Err(error);
        }
        state.next_id = state.next_id.saturating_add(1);
        let handle = ProviderHandle::new(format!("pred-{}", state.next_id))
            .map_err(|err| ProviderError::InvalidResponse(err.to_string()))?;
        state.predictions.insert(
            handle.clone(),
            ProviderPrediction {
                handle: handle.clone(),
                status: PredictionStatus::Starting,
                outputs: Vec::new(),
                error: None,
            },
        );
        Ok(handle)
    }

    async fn check_status(&self, handle: &ProviderHandle) -> ProviderResult<ProviderPrediction> {
        self.lock()?
            .predictions
            .get(handle)
            .cloned()
            .ok_or_else(|| not_found(handle))
    }
}
