// src/core/driver.rs

use tracing::{info, warn};

use crate::core::auth::{Caller, SCAN_ACTION};
use crate::core::coordinator::BatchCoordinator;
use crate::core::error::CoordinatorError;
use crate::core::models::{ScanRequest, ScanStepResponse};

/// Client-side view of a full scan.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum DriverState {
    #[default]
    Idle,
    Scanning { offset: u64 },
    Complete,
    Failed(String),
}

impl DriverState {
    pub fn start() -> Self {
        DriverState::Scanning { offset: 0 }
    }

    /// Next request to send, if a scan is in flight.
    pub fn pending_request(&self) -> Option<ScanRequest> {
        match self {
            DriverState::Scanning { offset } => Some(ScanRequest::at(*offset)),
            _ => None,
        }
    }

    /// Folds a step response into the state.
    pub fn advance(self, response: &ScanStepResponse) -> Self {
        let DriverState::Scanning { offset } = self else {
            return self;
        };
        if response.remaining == 0 {
            return DriverState::Complete;
        }
        if response.progress <= offset {
            return DriverState::Failed(format!(
                "Scan stalled at offset {} with {} URLs remaining",
                offset, response.remaining
            ));
        }
        DriverState::Scanning {
            offset: response.progress,
        }
    }

    pub fn fail(self, message: impl Into<String>) -> Self {
        DriverState::Failed(message.into())
    }

    pub fn is_finished(&self) -> bool {
        matches!(self, DriverState::Complete | DriverState::Failed(_))
    }
}

/// Running totals across the steps of one scan.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanTotals {
    pub steps: usize,
    pub total: usize,
    pub progress: u64,
    pub passing: usize,
    pub failing: usize,
    pub failing_urls: Vec<String>,
}

impl ScanTotals {
    pub fn absorb(&mut self, response: &ScanStepResponse) {
        self.steps += 1;
        self.total = response.total;
        self.progress = response.progress;
        self.passing += response.passing;
        self.failing += response.failing;
        self.failing_urls.extend(response.failing_urls.iter().cloned());
    }
}

/// Steps `coordinator` from offset 0 until the corpus is exhausted.
///
/// Each step gets a freshly minted nonce for `caller`. `on_step` sees every
/// response as it arrives. A failed step ends the scan; the error is returned
/// after `on_step` has seen the steps that succeeded.
pub async fn run_scan<F>(
    coordinator: &BatchCoordinator,
    caller: &Caller,
    mut on_step: F,
) -> Result<ScanTotals, CoordinatorError>
where
    F: FnMut(&ScanStepResponse),
{
    let mut state = DriverState::start();
    let mut totals = ScanTotals::default();

    while let Some(request) = state.pending_request() {
        let credentials = coordinator.nonces().credentials_for(SCAN_ACTION, caller);
        let response = coordinator.step(request, &credentials).await?;
        totals.absorb(&response);
        on_step(&response);
        state = state.advance(&response);
    }

    match state {
        DriverState::Failed(message) => {
            warn!(%message, "Scan did not complete.");
            Err(CoordinatorError::Stalled(message))
        }
        _ => {
            info!(
                steps = totals.steps,
                total = totals.total,
                passing = totals.passing,
                failing = totals.failing,
                "Scan complete."
            );
            Ok(totals)
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn response(progress: u64, total: usize, remaining: usize) -> ScanStepResponse {
        ScanStepResponse {
            progress,
            total,
            remaining,
            batch_size: 10,
            passing: 0,
            failing: 0,
            failing_urls: Vec::new(),
        }
    }

    #[test]
    fn walks_offsets_until_remaining_hits_zero() {
        let mut state = DriverState::start();
        state = state.advance(&response(10, 25, 25));
        assert_eq!(state, DriverState::Scanning { offset: 10 });
        state = state.advance(&response(20, 25, 15));
        assert_eq!(state, DriverState::Scanning { offset: 20 });
        state = state.advance(&response(25, 25, 5));
        assert_eq!(state, DriverState::Scanning { offset: 25 });
        state = state.advance(&response(25, 25, 0));
        assert_eq!(state, DriverState::Complete);
        assert!(state.pending_request().is_none());
    }

    #[test]
    fn empty_corpus_completes_immediately() {
        let state = DriverState::start().advance(&response(0, 0, 0));
        assert_eq!(state, DriverState::Complete);
    }

    #[test]
    fn non_advancing_progress_fails() {
        let state = DriverState::Scanning { offset: 10 }.advance(&response(10, 25, 15));
        assert!(matches!(state, DriverState::Failed(_)));
        assert!(state.is_finished());
    }

    #[test]
    fn idle_ignores_responses() {
        assert_eq!(DriverState::Idle.advance(&response(10, 25, 25)), DriverState::Idle);
    }
}
