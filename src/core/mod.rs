// src/core/mod.rs

/// Data structures shared across the scanner: requests, responses, batch
/// outcomes and the pass/fail accumulator.
pub mod models;

pub mod error;

/// Finds outbound URLs in a content tree.
pub mod extractor;

/// The single-URL TLS compatibility check.
pub mod probe;

/// Persistence of passing and failing URLs across scans.
pub mod store;

/// Probes one batch and merges the results into the store.
pub mod scanner;

pub mod auth;

/// The batch scan step and the reset operation.
pub mod coordinator;

/// Client-side loop that steps a scan to completion.
pub mod driver;

pub mod report;
