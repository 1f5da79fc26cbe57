// src/core/report.rs

use serde::Serialize;

use crate::core::models::Accumulator;

pub const NEVER_SCANNED_MESSAGE: &str =
    "No URLs failing TLS 1.2/1.3 connections found. Try running a scan.";
pub const ALL_PASSING_MESSAGE: &str =
    "All outgoing HTTP/HTTPS connections found are compatible with TLS 1.2/1.3.";
pub const FAILING_HEADER: &str =
    "The following URLs were found in your codebase that do not support TLS connections of 1.2 or higher.";

/// What the accumulator says about the site as a whole.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "status", content = "failing_urls", rename_all = "snake_case")]
pub enum ReportStatus {
    /// Both sets empty: no scan yet, or data was reset.
    NeverScanned,
    AllPassing,
    Failing(Vec<String>),
}

#[derive(Debug, Clone, Serialize)]
pub struct Report {
    pub passing: usize,
    pub failing: usize,
    #[serde(flatten)]
    pub status: ReportStatus,
}

impl Report {
    pub fn from_accumulator(acc: &Accumulator) -> Self {
        let status = if acc.is_empty() {
            ReportStatus::NeverScanned
        } else if acc.failing.is_empty() {
            ReportStatus::AllPassing
        } else {
            ReportStatus::Failing(acc.failing.iter().cloned().collect())
        };
        Self {
            passing: acc.passing.len(),
            failing: acc.failing.len(),
            status,
        }
    }

    /// Plain-text rendering for the terminal.
    pub fn to_text(&self) -> String {
        match &self.status {
            ReportStatus::NeverScanned => NEVER_SCANNED_MESSAGE.to_string(),
            ReportStatus::AllPassing => ALL_PASSING_MESSAGE.to_string(),
            ReportStatus::Failing(urls) => {
                let mut text = String::from(FAILING_HEADER);
                text.push('\n');
                for url in urls {
                    text.push_str(url);
                    text.push('\n');
                }
                text
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_the_three_states() {
        let mut acc = Accumulator::default();
        assert_eq!(Report::from_accumulator(&acc).status, ReportStatus::NeverScanned);

        acc.passing.insert("https://ok.vendor.io".into());
        assert_eq!(Report::from_accumulator(&acc).status, ReportStatus::AllPassing);

        acc.failing.insert("https://old.vendor.io".into());
        let report = Report::from_accumulator(&acc);
        assert_eq!(report.status, ReportStatus::Failing(vec!["https://old.vendor.io".into()]));
        assert!(report.to_text().contains("https://old.vendor.io\n"));
    }

    #[test]
    fn json_shape_is_flat() {
        let mut acc = Accumulator::default();
        acc.failing.insert("https://old.vendor.io".into());
        let value = serde_json::to_value(Report::from_accumulator(&acc)).unwrap();
        assert_eq!(value["status"], "failing");
        assert_eq!(value["failing"], 1);
        assert_eq!(value["failing_urls"][0], "https://old.vendor.io");
    }
}
