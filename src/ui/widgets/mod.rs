// src/ui/widgets/mod.rs

pub mod footer;   // Key hints for the current state.
pub mod header;   // Content root being scanned.
pub mod progress; // Batch progress gauge.
pub mod results;  // Failing URL list.
pub mod summary;  // Pass/fail counts.
