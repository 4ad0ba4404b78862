//! Noise filter — rejects page chrome before it can become a message.
//!
//! Rules run in a fixed order and the first that fires decides. Anything no
//! rule claims is message content.

use serde::Serialize;

use crate::identity::Identities;
use crate::timestamp::TimeGrammar;

/// Why a text was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NoiseRule {
    Blank,
    SingleChar,
    PartnerName,
    OwnHandle,
    Denylist,
    BareTimestamp,
}

impl NoiseRule {
    /// Evaluation order.
    pub fn all() -> &'static [NoiseRule] {
        &[
            Self::Blank,
            Self::SingleChar,
            Self::PartnerName,
            Self::OwnHandle,
            Self::Denylist,
            Self::BareTimestamp,
        ]
    }
}

/// Per-scan view of the noise rules for one platform.
pub struct NoiseFilter<'a> {
    phrases: &'a [&'a str],
    grammar: Option<&'a TimeGrammar>,
    identities: &'a Identities,
}

impl<'a> NoiseFilter<'a> {
    pub fn new(
        phrases: &'a [&'a str],
        grammar: Option<&'a TimeGrammar>,
        identities: &'a Identities,
    ) -> Self {
        Self {
            phrases,
            grammar,
            identities,
        }
    }

    pub fn is_noise(&self, text: &str) -> bool {
        self.verdict(text).is_some()
    }

    /// The first rule that rejects `text`, if any.
    pub fn verdict(&self, text: &str) -> Option<NoiseRule> {
        let trimmed = text.trim();
        NoiseRule::all()
            .iter()
            .copied()
            .find(|rule| self.applies(*rule, trimmed))
    }

    fn applies(&self, rule: NoiseRule, trimmed: &str) -> bool {
        match rule {
            NoiseRule::Blank => trimmed.is_empty(),
            NoiseRule::SingleChar => trimmed.chars().count() == 1,
            NoiseRule::PartnerName => self.identities.partner_name.as_deref() == Some(trimmed),
            NoiseRule::OwnHandle => self.identities.own_handle.as_deref() == Some(trimmed),
            NoiseRule::Denylist => self.phrases.iter().any(|p| trimmed.contains(p)),
            NoiseRule::BareTimestamp => self
                .grammar
                .map_or(false, |grammar| grammar.is_bare_label(trimmed)),
        }
    }
}
