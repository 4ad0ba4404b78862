//! Chatlens Core — errors, scan configuration, platform profiles, message records.

pub mod config;
pub mod error;
pub mod platform;
pub mod record;

pub use config::ScanConfig;
pub use error::{Error, Result};
pub use platform::{ClassMarker, IdentityLocators, Platform, SpeakerCues, TimeTokens};
pub use record::{MessageKind, MessageRecord, Sender};
