// src/core/coordinator.rs

use std::path::PathBuf;
use std::sync::Arc;

use serde_json::Value;
use tracing::{info, instrument};

use crate::core::auth::{Capability, Credentials, NonceIssuer, RESET_ACTION, SCAN_ACTION};
use crate::core::error::CoordinatorError;
use crate::core::extractor::UrlSource;
use crate::core::models::{BATCH_SIZE, BatchPlan, Envelope, ScanRequest, ScanStepResponse};
use crate::core::scanner::TlsScanner;
use crate::core::store::UrlStore;

/// Works out which slice of a `total`-sized corpus starts at `offset`.
pub fn plan_batch(offset: u64, total: usize) -> BatchPlan {
    let start = usize::try_from(offset).unwrap_or(usize::MAX).min(total);
    let end = start.saturating_add(BATCH_SIZE).min(total);
    BatchPlan {
        start,
        end,
        total,
        remaining: total - start,
    }
}

/// Drives one fixed-size batch of the scan per call.
///
/// Holds no cursor of its own: the caller resends `offset = progress` until
/// `remaining` reaches zero.
#[derive(Clone)]
pub struct BatchCoordinator {
    content_root: PathBuf,
    source: Arc<dyn UrlSource>,
    scanner: TlsScanner,
    nonces: NonceIssuer,
}

impl BatchCoordinator {
    pub fn new(
        content_root: impl Into<PathBuf>,
        source: Arc<dyn UrlSource>,
        scanner: TlsScanner,
        nonces: NonceIssuer,
    ) -> Self {
        Self {
            content_root: content_root.into(),
            source,
            scanner,
            nonces,
        }
    }

    pub fn nonces(&self) -> &NonceIssuer {
        &self.nonces
    }

    pub fn store(&self) -> &Arc<dyn UrlStore> {
        self.scanner.store()
    }

    pub fn content_root(&self) -> &std::path::Path {
        &self.content_root
    }

    /// Full ordered URL corpus of the content root.
    pub async fn corpus(&self) -> Result<Vec<String>, CoordinatorError> {
        let source = Arc::clone(&self.source);
        let root = self.content_root.clone();
        Ok(tokio::task::spawn_blocking(move || source.extract_urls(&root)).await??)
    }

    /// Processes the batch starting at `request.offset`.
    ///
    /// Authorization is checked before anything else; a rejected call
    /// extracts, probes and stores nothing.
    #[instrument(skip(self, credentials), fields(offset = request.offset, user = %credentials.caller.user))]
    pub async fn step(
        &self,
        request: ScanRequest,
        credentials: &Credentials,
    ) -> Result<ScanStepResponse, CoordinatorError> {
        self.nonces
            .authorize(credentials, SCAN_ACTION, Capability::ManageOptions)?;

        let urls = self.corpus().await?;
        let plan = plan_batch(request.offset, urls.len());
        let batch = &urls[plan.start..plan.end];

        let results = self.scanner.scan(batch).await?;

        let response = ScanStepResponse {
            progress: plan.progress(request.offset),
            total: plan.total,
            remaining: plan.remaining,
            batch_size: BATCH_SIZE,
            passing: results.passing.len(),
            failing: results.failing.len(),
            failing_urls: results.failing,
        };
        info!(
            progress = response.progress,
            total = response.total,
            remaining = response.remaining,
            passing = response.passing,
            failing = response.failing,
            "Scan step finished."
        );
        Ok(response)
    }

    /// Clears both accumulator sets so the next scan re-probes everything.
    #[instrument(skip(self, credentials), fields(user = %credentials.caller.user))]
    pub fn reset(&self, credentials: &Credentials) -> Result<(), CoordinatorError> {
        self.nonces
            .authorize(credentials, RESET_ACTION, Capability::ManageOptions)?;
        self.store().reset()?;
        info!("TLS compatibility data reset.");
        Ok(())
    }

    /// Runs a step and encodes the outcome as the JSON response envelope.
    pub async fn handle_scan_action(&self, request: ScanRequest, credentials: &Credentials) -> Value {
        encode_step(&self.step(request, credentials).await)
    }
}

/// `{"success": true, "data": {...}}` on success, `{"success": false, "data": "message"}` otherwise.
pub fn encode_step(result: &Result<ScanStepResponse, CoordinatorError>) -> Value {
    let encoded = match result {
        Ok(response) => serde_json::to_value(Envelope::ok(response)),
        Err(e) => serde_json::to_value(Envelope::error(e.to_string())),
    };
    encoded.unwrap_or_else(|e| {
        serde_json::json!({ "success": false, "data": format!("encoding response: {e}") })
    })
}
