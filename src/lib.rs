//! Scans a site's content tree for outbound HTTP/HTTPS URLs and checks
//! whether each target server accepts TLS 1.2 or newer.
//!
//! A full scan is split into batches of [`core::models::BATCH_SIZE`] URLs.
//! [`core::coordinator::BatchCoordinator::step`] handles one batch per call
//! and [`core::driver::run_scan`] loops it to completion.

pub mod app;
pub mod cli;
pub mod config;
pub mod core;
pub mod logging;
pub mod tui;
pub mod ui;

use std::sync::Arc;

use crate::config::Config;
use crate::core::coordinator::BatchCoordinator;
use crate::core::error::StoreError;
use crate::core::extractor::FileSystemExtractor;
use crate::core::probe::NativeTlsProbe;
use crate::core::scanner::TlsScanner;
use crate::core::store::JsonFileStore;

/// Wires the production collaborators from configuration.
pub fn build_coordinator(config: &Config) -> Result<BatchCoordinator, StoreError> {
    let store = Arc::new(JsonFileStore::open(config.store_file())?);
    let probe = Arc::new(NativeTlsProbe::new(&config.probe));
    let source = Arc::new(FileSystemExtractor::new(config.extract.clone()));
    Ok(BatchCoordinator::new(
        config.paths.content_root.clone(),
        source,
        TlsScanner::new(probe, store),
        config.nonce_issuer(),
    ))
}
