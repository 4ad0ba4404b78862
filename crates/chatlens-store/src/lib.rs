//! Collected message store.
//!
//! Records are keyed by a hash of their identity-bearing content so that a
//! message re-observed on every scan is stored once, with the fields fixed
//! at first sighting.

pub mod key;
pub mod store;
pub mod table;

pub use key::{normalize_text, ContentKey};
pub use store::{CollectedStore, CollectionStats};
pub use table::render_table;
