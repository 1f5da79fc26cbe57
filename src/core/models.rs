// src/core/models.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};
use std::collections::{BTreeSet, HashMap};

use crate::core::probe::ProbeFailure;

/// Number of URLs processed by a single scan step.
pub const BATCH_SIZE: usize = 10;

// --- Scan Requests ---

/// A scan step request. `offset` is the caller-tracked cursor into the URL corpus.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanRequest {
    #[serde(default, deserialize_with = "lenient_offset")]
    pub offset: u64,
}

impl ScanRequest {
    pub fn at(offset: u64) -> Self {
        Self { offset }
    }

    /// Builds a request from loosely typed form fields.
    ///
    /// A missing, non-numeric or negative `offset` falls back to `0`.
    pub fn from_form(fields: &HashMap<String, String>) -> Self {
        let offset = fields
            .get("offset")
            .map(|raw| parse_offset(raw))
            .unwrap_or_default();
        Self { offset }
    }
}

fn parse_offset(raw: &str) -> u64 {
    raw.trim().parse::<u64>().unwrap_or(0)
}

// Accepts numbers, numeric strings, null or garbage; anything unusable becomes 0.
fn lenient_offset<'de, D>(deserializer: D) -> Result<u64, D::Error>
where
    D: Deserializer<'de>,
{
    let value = serde_json::Value::deserialize(deserializer)?;
    Ok(match value {
        serde_json::Value::Number(n) => n.as_u64().unwrap_or(0),
        serde_json::Value::String(s) => parse_offset(&s),
        _ => 0,
    })
}

// --- Batch Planning ---

/// The slice of the corpus a single step covers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BatchPlan {
    pub start: usize,
    pub end: usize,
    pub total: usize,
    pub remaining: usize,
}

impl BatchPlan {
    pub fn len(&self) -> usize {
        self.end - self.start
    }

    pub fn is_empty(&self) -> bool {
        self.start == self.end
    }

    /// Cursor value the caller should send next.
    pub fn progress(&self, offset: u64) -> u64 {
        offset + self.len() as u64
    }
}

// --- Scan Responses ---

/// Success payload of one scan step.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScanStepResponse {
    pub progress: u64,
    pub total: usize,
    pub remaining: usize,
    pub batch_size: usize,
    pub passing: usize,
    pub failing: usize,
    pub failing_urls: Vec<String>,
}

/// JSON envelope shared by successes and failures, distinguished by `success`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Envelope<T> {
    pub success: bool,
    pub data: T,
}

impl<T> Envelope<T> {
    pub fn ok(data: T) -> Self {
        Self { success: true, data }
    }
}

impl Envelope<String> {
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            data: message.into(),
        }
    }
}

// --- Probe Results ---

// Details extracted from the peer certificate of a successful handshake.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CertificateInfo {
    pub subject_name: String,
    pub issuer_name: String,
    pub not_after: DateTime<Utc>,
    pub days_until_expiry: i64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum ProbeVerdict {
    Passed { certificate: Option<CertificateInfo> },
    Failed(ProbeFailure),
}

// The result of probing a single URL.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProbeOutcome {
    pub url: String,
    pub verdict: ProbeVerdict,
}

impl ProbeOutcome {
    pub fn passed(url: impl Into<String>, certificate: Option<CertificateInfo>) -> Self {
        Self {
            url: url.into(),
            verdict: ProbeVerdict::Passed { certificate },
        }
    }

    pub fn failed(url: impl Into<String>, failure: ProbeFailure) -> Self {
        Self {
            url: url.into(),
            verdict: ProbeVerdict::Failed(failure),
        }
    }

    pub fn is_passing(&self) -> bool {
        matches!(self.verdict, ProbeVerdict::Passed { .. })
    }
}

/// Partition of one batch into passing and failing URLs, in batch order.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub passing: Vec<String>,
    pub failing: Vec<String>,
    /// Probes actually performed; URLs already known to pass are not probed.
    pub probes: Vec<ProbeOutcome>,
}

impl BatchOutcome {
    pub fn skipped(&self) -> usize {
        (self.passing.len() + self.failing.len()).saturating_sub(self.probes.len())
    }
}

// --- Accumulator ---

/// Cumulative passing and failing URL sets since the last reset.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Accumulator {
    #[serde(default)]
    pub passing: BTreeSet<String>,
    #[serde(default)]
    pub failing: BTreeSet<String>,
}

impl Accumulator {
    /// Merges batch results, keeping the two sets disjoint.
    pub fn merge(&mut self, passing: &[String], failing: &[String]) {
        for url in passing {
            self.failing.remove(url);
            self.passing.insert(url.clone());
        }
        for url in failing {
            if self.passing.contains(url) {
                continue;
            }
            self.failing.insert(url.clone());
        }
    }

    pub fn clear(&mut self) {
        self.passing.clear();
        self.failing.clear();
    }

    pub fn is_empty(&self) -> bool {
        self.passing.is_empty() && self.failing.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls(list: &[&str]) -> Vec<String> {
        list.iter().map(|s| s.to_string()).collect()
    }

    #[test]
    fn offset_defaults_to_zero_on_bad_input() {
        let mut form = HashMap::new();
        assert_eq!(ScanRequest::from_form(&form).offset, 0);

        form.insert("offset".to_string(), "abc".to_string());
        assert_eq!(ScanRequest::from_form(&form).offset, 0);

        form.insert("offset".to_string(), "-5".to_string());
        assert_eq!(ScanRequest::from_form(&form).offset, 0);

        form.insert("offset".to_string(), " 20 ".to_string());
        assert_eq!(ScanRequest::from_form(&form).offset, 20);
    }

    #[test]
    fn offset_deserializes_from_loose_json() {
        let req: ScanRequest = serde_json::from_str(r#"{"offset": "10"}"#).unwrap();
        assert_eq!(req.offset, 10);
        let req: ScanRequest = serde_json::from_str(r#"{"offset": -3}"#).unwrap();
        assert_eq!(req.offset, 0);
        let req: ScanRequest = serde_json::from_str(r#"{"offset": null}"#).unwrap();
        assert_eq!(req.offset, 0);
        let req: ScanRequest = serde_json::from_str("{}").unwrap();
        assert_eq!(req.offset, 0);
    }

    #[test]
    fn merge_keeps_sets_disjoint() {
        let mut acc = Accumulator::default();
        acc.merge(&[], &urls(&["https://a.test", "https://b.test"]));
        acc.merge(&urls(&["https://a.test"]), &[]);

        assert!(acc.passing.contains("https://a.test"));
        assert!(!acc.failing.contains("https://a.test"));
        assert!(acc.failing.contains("https://b.test"));

        // Once passing, a URL is not demoted by a later failure report.
        acc.merge(&[], &urls(&["https://a.test"]));
        assert!(acc.passing.contains("https://a.test"));
        assert!(!acc.failing.contains("https://a.test"));
    }

    #[test]
    fn envelope_serializes_with_success_flag() {
        let err = serde_json::to_value(Envelope::error("Unauthorized request")).unwrap();
        assert_eq!(err["success"], false);
        assert_eq!(err["data"], "Unauthorized request");
    }
}
