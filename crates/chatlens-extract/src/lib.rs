//! Heuristic extraction over a sampled chat page.
//!
//! Resolves time labels with a carried calendar date, rejects page chrome,
//! attributes messages to a party, and learns the two participants' names
//! from headings and profile links. Every rule here is a heuristic: none of
//! the supported sites mark these things up reliably.

pub mod identity;
pub mod nearest;
pub mod noise;
pub mod speaker;
pub mod timestamp;

pub use identity::{Identities, IdentityExtractor};
pub use nearest::find_nearest_time;
pub use noise::{NoiseFilter, NoiseRule};
pub use speaker::{SpeakerClassifier, SpeakerRule};
pub use timestamp::{DateContext, ResolvedTime, TimeGrammar, TimestampResolver};
