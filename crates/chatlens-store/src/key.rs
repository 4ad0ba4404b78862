use once_cell::sync::Lazy;
use regex::Regex;
use sha2::{Digest, Sha256};
use unicode_normalization::UnicodeNormalization;

use chatlens_core::MessageKind;

static WHITESPACE_RUN: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// Trim, collapse whitespace runs to one space, and compose to NFC.
pub fn normalize_text(text: &str) -> String {
    let collapsed = WHITESPACE_RUN.replace_all(text.trim(), " ");
    collapsed.nfc().collect()
}

/// Deterministic identity of a message: SHA-256 over its kind and content.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ContentKey(String);

impl ContentKey {
    /// Key for a text message. `normalized` must come from [`normalize_text`].
    pub fn text(normalized: &str) -> Self {
        Self::digest(MessageKind::Text, normalized)
    }

    /// Key for an image message by its resolved source URL.
    pub fn image(url: &str) -> Self {
        Self::digest(MessageKind::Image, url)
    }

    fn digest(kind: MessageKind, content: &str) -> Self {
        let mut hasher = Sha256::new();
        hasher.update(kind.name().as_bytes());
        hasher.update([0u8]);
        hasher.update(content.as_bytes());
        Self(hex::encode(hasher.finalize()))
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for ContentKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}
