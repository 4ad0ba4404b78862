//! Runtime — drives the scan engine over a live or replayed page.
//!
//! [`ScanEngine`] owns all per-run state: learned identities, the carried
//! date, the sequence counter and the collected store. [`Scanner`] runs an
//! engine on a fixed period until it is stopped and exported.

pub mod diagnostics;
pub mod engine;
pub mod scheduler;
pub mod types;

#[cfg(test)]
mod testing;

pub use engine::ScanEngine;
pub use scheduler::{DocumentSource, Scanner, ScannerHandle};
pub use types::*;
