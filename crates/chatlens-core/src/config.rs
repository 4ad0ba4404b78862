//! Scan configuration: cadence, geometry thresholds, search depths, time zone.

use std::path::Path;
use std::time::Duration;

use chrono::{FixedOffset, Local, Offset};
use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::error::{Error, Result};

/// Tunables for the scan engine and its scheduler.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScanConfig {
    /// Period between two scans.
    #[serde(default = "default_scan_interval", rename = "scanIntervalMs")]
    pub scan_interval_ms: u64,
    /// Minimum spacing between two diagnostic table dumps.
    #[serde(default = "default_table_dump", rename = "tableDumpIntervalMs")]
    pub table_dump_interval_ms: u64,
    /// Width and height an element must exceed to count as visible.
    #[serde(default = "default_min_visible", rename = "minVisibleSize")]
    pub min_visible_size: f64,
    /// Width and height an image must reach to count as message content.
    #[serde(default = "default_min_image", rename = "minImageSize")]
    pub min_image_size: f64,
    /// Ancestor levels inspected for structural speaker markers.
    #[serde(default = "default_speaker_depth", rename = "speakerDepth")]
    pub speaker_depth: usize,
    /// Ancestor levels walked by each nearest-time pass.
    #[serde(default = "default_time_depth", rename = "timeSearchDepth")]
    pub time_search_depth: usize,
    /// Offset used to build absolute instants; host local offset when absent.
    #[serde(default, skip_serializing_if = "Option::is_none", rename = "utcOffsetMinutes")]
    pub utc_offset_minutes: Option<i32>,
}

fn default_scan_interval() -> u64 {
    500
}
fn default_table_dump() -> u64 {
    3000
}
fn default_min_visible() -> f64 {
    5.0
}
fn default_min_image() -> f64 {
    50.0
}
fn default_speaker_depth() -> usize {
    10
}
fn default_time_depth() -> usize {
    20
}

impl Default for ScanConfig {
    fn default() -> Self {
        Self {
            scan_interval_ms: default_scan_interval(),
            table_dump_interval_ms: default_table_dump(),
            min_visible_size: default_min_visible(),
            min_image_size: default_min_image(),
            speaker_depth: default_speaker_depth(),
            time_search_depth: default_time_depth(),
            utc_offset_minutes: None,
        }
    }
}

impl ScanConfig {
    /// Build configuration from environment overrides on top of defaults.
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();

        if let Some(ms) = env_parse::<u64>("CHATLENS_SCAN_INTERVAL_MS")? {
            config.scan_interval_ms = ms;
        }
        if let Some(ms) = env_parse::<u64>("CHATLENS_TABLE_DUMP_MS")? {
            config.table_dump_interval_ms = ms;
        }
        if let Some(minutes) = env_parse::<i32>("CHATLENS_UTC_OFFSET_MINUTES")? {
            config.utc_offset_minutes = Some(minutes);
        }

        config.validate()?;
        Ok(config)
    }

    /// Load config from a JSON file; a missing file yields defaults.
    pub fn load(path: &Path) -> Result<Self> {
        let config: ScanConfig = match std::fs::read_to_string(path) {
            Ok(s) => serde_json::from_str(&s)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => Self::default(),
            Err(e) => return Err(e.into()),
        };
        config.validate()?;
        Ok(config)
    }

    /// Reject values the engine cannot run with.
    pub fn validate(&self) -> Result<()> {
        if self.scan_interval_ms == 0 {
            return Err(Error::Config("scanIntervalMs must be positive".into()));
        }
        if let Some(minutes) = self.utc_offset_minutes {
            if FixedOffset::east_opt(minutes * 60).is_none() {
                return Err(Error::Config(format!(
                    "utcOffsetMinutes out of range: {}",
                    minutes
                )));
            }
        }
        Ok(())
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_millis(self.scan_interval_ms)
    }

    pub fn table_dump_interval(&self) -> Duration {
        Duration::from_millis(self.table_dump_interval_ms)
    }

    /// Offset for wall-clock times read off the page.
    pub fn utc_offset(&self) -> FixedOffset {
        match self.utc_offset_minutes.and_then(|m| FixedOffset::east_opt(m * 60)) {
            Some(offset) => offset,
            None => Local::now().offset().fix(),
        }
    }
}

fn env_parse<T: std::str::FromStr>(name: &str) -> Result<Option<T>> {
    match std::env::var(name) {
        Ok(raw) => match raw.trim().parse::<T>() {
            Ok(v) => Ok(Some(v)),
            Err(_) => Err(Error::Config(format!("{} is not a valid value: {}", name, raw))),
        },
        Err(std::env::VarError::NotPresent) => Ok(None),
        Err(e) => {
            warn!("Ignoring {}: {}", name, e);
            Ok(None)
        }
    }
}
