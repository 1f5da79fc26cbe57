// src/core/scanner.rs

use std::collections::HashMap;
use std::sync::Arc;

use tokio::task::JoinSet;
use tracing::{debug, error, info};

use crate::core::error::CoordinatorError;
use crate::core::models::{BatchOutcome, ProbeOutcome};
use crate::core::probe::{ProbeFailure, TlsProbe};
use crate::core::store::UrlStore;

/// Probes a batch of URLs and folds the results into the store.
#[derive(Clone)]
pub struct TlsScanner {
    probe: Arc<dyn TlsProbe>,
    store: Arc<dyn UrlStore>,
}

impl TlsScanner {
    pub fn new(probe: Arc<dyn TlsProbe>, store: Arc<dyn UrlStore>) -> Self {
        Self { probe, store }
    }

    pub fn store(&self) -> &Arc<dyn UrlStore> {
        &self.store
    }

    /// Checks every URL of `batch` that is not already known to pass.
    ///
    /// Known-passing URLs count as passing without a new probe. The others are
    /// probed concurrently on the blocking pool; the batch size bounds how
    /// many handshakes are in flight. Both lists keep batch order.
    ///
    /// A task that panics counts as a failing URL; the rest of the batch is
    /// still recorded.
    pub async fn scan(&self, batch: &[String]) -> Result<BatchOutcome, CoordinatorError> {
        let known_passing = self.store.passing_urls()?;

        let mut tasks = JoinSet::new();
        let mut pending = HashMap::new();
        for (index, url) in batch.iter().enumerate() {
            if known_passing.contains(url) {
                debug!(url = %url, "Already passing, skipping probe.");
                continue;
            }
            let probe = Arc::clone(&self.probe);
            let url = url.clone();
            let handle = tasks.spawn_blocking(move || probe.probe(&url));
            pending.insert(handle.id(), index);
        }

        let mut probed: Vec<Option<ProbeOutcome>> = vec![None; batch.len()];
        while let Some(joined) = tasks.join_next_with_id().await {
            match joined {
                Ok((id, outcome)) => {
                    if let Some(index) = pending.remove(&id) {
                        probed[index] = Some(outcome);
                    }
                }
                Err(e) => {
                    let Some(index) = pending.remove(&e.id()) else {
                        continue;
                    };
                    let url = &batch[index];
                    error!(url = %url, error = %e, "Check task panicked.");
                    probed[index] = Some(ProbeOutcome::failed(
                        url.as_str(),
                        ProbeFailure::Connector(format!("check task panicked: {e}")),
                    ));
                }
            }
        }

        let mut outcome = BatchOutcome::default();
        for (url, probe) in batch.iter().zip(probed) {
            match probe {
                None => outcome.passing.push(url.clone()),
                Some(result) => {
                    if result.is_passing() {
                        outcome.passing.push(url.clone());
                    } else {
                        outcome.failing.push(url.clone());
                    }
                    outcome.probes.push(result);
                }
            }
        }

        self.store.record(&outcome.passing, &outcome.failing)?;

        info!(
            batch = batch.len(),
            probed = outcome.probes.len(),
            skipped = outcome.skipped(),
            passing = outcome.passing.len(),
            failing = outcome.failing.len(),
            "Batch scanned."
        );
        Ok(outcome)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::{Accumulator, ProbeVerdict};
    use crate::core::store::MemoryStore;
    use std::sync::Mutex;

    /// Passes every URL containing "good", records what it was asked to probe.
    #[derive(Default)]
    struct ScriptedProbe {
        calls: Mutex<Vec<String>>,
    }

    impl TlsProbe for ScriptedProbe {
        fn probe(&self, url: &str) -> ProbeOutcome {
            self.calls.lock().unwrap().push(url.to_string());
            if url.contains("good") {
                ProbeOutcome::passed(url, None)
            } else {
                ProbeOutcome::failed(url, ProbeFailure::Handshake("protocol version".into()))
            }
        }
    }

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[tokio::test]
    async fn partitions_in_batch_order_and_records() {
        let probe = Arc::new(ScriptedProbe::default());
        let store = Arc::new(MemoryStore::new());
        let scanner = TlsScanner::new(probe.clone(), store.clone());

        let batch = urls(&["https://bad1.test", "https://good1.test", "https://bad2.test", "https://good2.test"]);
        let outcome = scanner.scan(&batch).await.unwrap();

        assert_eq!(outcome.passing, urls(&["https://good1.test", "https://good2.test"]));
        assert_eq!(outcome.failing, urls(&["https://bad1.test", "https://bad2.test"]));
        assert_eq!(store.passing_urls().unwrap().len(), 2);
        assert_eq!(store.failing_urls().unwrap().len(), 2);
        assert_eq!(probe.calls.lock().unwrap().len(), 4);
    }

    #[tokio::test]
    async fn known_passing_urls_are_not_probed() {
        let probe = Arc::new(ScriptedProbe::default());
        let mut seeded = Accumulator::default();
        seeded.passing.insert("https://bad-but-passed.test".to_string());
        let store = Arc::new(MemoryStore::with_contents(seeded));
        let scanner = TlsScanner::new(probe.clone(), store.clone());

        let outcome = scanner
            .scan(&urls(&["https://bad-but-passed.test", "https://bad.test"]))
            .await
            .unwrap();

        assert_eq!(outcome.passing, urls(&["https://bad-but-passed.test"]));
        assert_eq!(outcome.failing, urls(&["https://bad.test"]));
        assert_eq!(outcome.skipped(), 1);
        assert_eq!(*probe.calls.lock().unwrap(), urls(&["https://bad.test"]));
    }

    /// Panics on one host, passes everything else.
    struct PanicsOnBoom;

    impl TlsProbe for PanicsOnBoom {
        fn probe(&self, url: &str) -> ProbeOutcome {
            if url.contains("boom") {
                panic!("handshake blew up");
            }
            ProbeOutcome::passed(url, None)
        }
    }

    #[tokio::test]
    async fn panicking_check_fails_only_its_own_url() {
        let store = Arc::new(MemoryStore::new());
        let scanner = TlsScanner::new(Arc::new(PanicsOnBoom), store.clone());

        let batch = urls(&["https://ok1.vendor.io", "https://boom.vendor.io", "https://ok2.vendor.io"]);
        let outcome = scanner.scan(&batch).await.unwrap();

        assert_eq!(outcome.passing, urls(&["https://ok1.vendor.io", "https://ok2.vendor.io"]));
        assert_eq!(outcome.failing, urls(&["https://boom.vendor.io"]));
        let failed = outcome
            .probes
            .iter()
            .find(|p| p.url == "https://boom.vendor.io")
            .unwrap();
        assert!(matches!(
            &failed.verdict,
            ProbeVerdict::Failed(ProbeFailure::Connector(msg)) if msg.contains("panicked")
        ));

        let stored = store.snapshot().unwrap();
        assert_eq!(stored.passing.len(), 2);
        assert!(stored.failing.contains("https://boom.vendor.io"));
    }

    #[tokio::test]
    async fn empty_batch_does_nothing() {
        let probe = Arc::new(ScriptedProbe::default());
        let store = Arc::new(MemoryStore::new());
        let scanner = TlsScanner::new(probe.clone(), store.clone());

        let outcome = scanner.scan(&[]).await.unwrap();
        assert!(outcome.passing.is_empty() && outcome.failing.is_empty());
        assert!(probe.calls.lock().unwrap().is_empty());
        assert!(store.snapshot().unwrap().is_empty());
    }
}
