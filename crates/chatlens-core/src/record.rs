//! Message records produced by the scan engine.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Kind of observed conversation event.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MessageKind {
    Text,
    Image,
}

impl MessageKind {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Text => "text",
            Self::Image => "image",
        }
    }
}

/// Which party authored a message.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Sender {
    /// The operator running the collector.
    Me,
    /// The conversation partner.
    Other,
}

impl Sender {
    pub fn name(&self) -> &'static str {
        match self {
            Self::Me => "me",
            Self::Other => "other",
        }
    }
}

/// One observed conversation event. Fields are fixed at first observation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MessageRecord {
    pub id: String,
    pub kind: MessageKind,
    pub sender: Sender,
    /// Normalized text, or the resolved image URL.
    pub content: String,
    /// Epoch milliseconds.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timestamp: Option<i64>,
    #[serde(skip_serializing_if = "Option::is_none", rename = "timestampLabel")]
    pub timestamp_label: Option<String>,
    pub sequence: u64,
    #[serde(rename = "observedAt")]
    pub observed_at: DateTime<Utc>,
}
