//! Runtime types.

use serde::Serialize;

use chatlens_core::{MessageRecord, Platform};
use chatlens_store::CollectionStats;

/// Lifecycle of a scan engine. `Stopped` is terminal.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum EngineState {
    Collecting,
    Stopped,
}

/// What one scan pass did.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ScanReport {
    /// Text and image nodes enumerated in the container.
    pub candidates: usize,
    /// New records inserted.
    pub added: usize,
    pub duplicates: usize,
    /// Text rejected by the noise filter.
    pub noise: usize,
    /// Off-screen or too small.
    pub hidden: usize,
    /// Images without a usable source.
    pub skipped: usize,
    /// Nodes whose processing failed.
    pub failed: usize,
    /// The engine was already stopped; nothing was read.
    pub stopped: bool,
}

impl ScanReport {
    pub fn stopped() -> Self {
        Self {
            stopped: true,
            ..Self::default()
        }
    }
}

/// Collected records plus what was learned about the conversation.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ExportReport {
    pub platform: Platform,
    /// Newest first.
    pub records: Vec<MessageRecord>,
    pub stats: CollectionStats,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub partner_name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub own_handle: Option<String>,
}

/// Short status line for an on-screen indicator.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "state", rename_all = "camelCase")]
pub enum StatusIndicator {
    /// Started, no scan completed yet.
    Armed { platform: Platform },
    Collecting { count: usize },
    Done { count: usize },
}

impl std::fmt::Display for StatusIndicator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Armed { platform } => write!(f, "🔴 {} scanner", platform),
            Self::Collecting { count } => write!(f, "📥 {} messages", count),
            Self::Done { count } => write!(f, "✅ Done! ({} messages)", count),
        }
    }
}
