//! Diagnostic output through `tracing`: the periodic record table and the
//! export summary.

use std::time::{Duration, Instant};

use tracing::info;

use chatlens_core::MessageRecord;
use chatlens_store::render_table;

use crate::types::ExportReport;

/// Rate limiter for the record table dump.
#[derive(Debug, Clone)]
pub struct TableDump {
    interval: Duration,
    last: Option<Instant>,
}

impl TableDump {
    pub fn new(interval: Duration) -> Self {
        Self {
            interval,
            last: None,
        }
    }

    /// True at most once per interval; the first call is always due.
    pub fn due(&mut self, now: Instant) -> bool {
        match self.last {
            Some(last) if now.duration_since(last) < self.interval => false,
            _ => {
                self.last = Some(now);
                true
            }
        }
    }

    /// Log the table when due and there is something to show.
    pub fn maybe_dump(&mut self, records: impl FnOnce() -> Vec<MessageRecord>) {
        if !self.due(Instant::now()) {
            return;
        }
        let records = records();
        if !records.is_empty() {
            info!("Collected {} messages\n{}", records.len(), render_table(&records));
        }
    }
}

/// Log the end-of-run summary.
pub fn log_export_summary(report: &ExportReport) {
    let stats = &report.stats;
    info!("=== Collection complete ({}) ===", report.platform);
    if let Some(name) = &report.partner_name {
        info!("Partner: {}", name);
    }
    if let Some(handle) = &report.own_handle {
        info!("Me: {}", handle);
    }
    info!("Total: {}", stats.total);
    info!("My messages: {} ({:.1}%)", stats.me, stats.percent(stats.me));
    info!(
        "Other messages: {} ({:.1}%)",
        stats.other,
        stats.percent(stats.other)
    );
    info!("Text: {}, images: {}", stats.text, stats.image);
    info!(
        "With timestamp: {}, without: {}",
        stats.with_timestamp, stats.without_timestamp
    );
    if !report.records.is_empty() {
        info!("All messages (latest first)\n{}", render_table(&report.records));
    }
}
