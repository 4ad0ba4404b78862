//! Periodic scanner — runs a [`ScanEngine`] on a tokio interval until stopped.

use std::sync::Arc;

use parking_lot::Mutex;
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio::time::MissedTickBehavior;
use tracing::{debug, error, info};

use chatlens_core::{MessageRecord, Result};
use chatlens_dom::DocumentView;
use chatlens_store::CollectionStats;

use crate::engine::ScanEngine;
use crate::types::{ExportReport, StatusIndicator};

/// Produces the current state of the page on every tick.
pub trait DocumentSource: Send + 'static {
    type Document: DocumentView;

    fn capture(&mut self) -> Result<Self::Document>;
}

/// Entry point for background scanning.
pub struct Scanner;

impl Scanner {
    /// Spawn the scan loop on the current tokio runtime.
    pub fn start<S: DocumentSource>(engine: ScanEngine, source: S) -> ScannerHandle {
        let period = engine.config().scan_interval();
        let (status_tx, status_rx) = watch::channel(engine.status());
        let (stop_tx, mut stop_rx) = watch::channel(false);
        let engine = Arc::new(Mutex::new(engine));

        let worker = engine.clone();
        let task = tokio::spawn(async move {
            let mut source = source;
            let mut ticker = tokio::time::interval(period);
            ticker.set_missed_tick_behavior(MissedTickBehavior::Delay);
            info!("Scanner started ({}ms period)", period.as_millis());

            loop {
                tokio::select! {
                    _ = ticker.tick() => {
                        let status = run_tick(&worker, &mut source);
                        status_tx.send_if_modified(|current| {
                            if *current == status {
                                return false;
                            }
                            *current = status;
                            true
                        });
                    }
                    // Also fires when the handle is dropped.
                    _ = stop_rx.changed() => {
                        info!("Scanner stopping");
                        break;
                    }
                }
            }
            status_tx
        });

        ScannerHandle {
            engine,
            stop_tx,
            status_rx,
            task,
        }
    }
}

/// One scan, entirely synchronous: the captured document never lives across
/// an await point.
fn run_tick<S: DocumentSource>(engine: &Mutex<ScanEngine>, source: &mut S) -> StatusIndicator {
    let doc = match source.capture() {
        Ok(doc) => doc,
        Err(e) => {
            error!("Capture failed: {}", e);
            return engine.lock().status();
        }
    };

    let mut engine = engine.lock();
    match engine.scan(&doc) {
        Ok(report) if report.added > 0 => debug!("Tick added {} messages", report.added),
        Ok(_) => {}
        Err(e) => error!("Scan failed: {}", e),
    }
    engine.status()
}

/// Control handle for a running scanner.
pub struct ScannerHandle {
    engine: Arc<Mutex<ScanEngine>>,
    stop_tx: watch::Sender<bool>,
    status_rx: watch::Receiver<StatusIndicator>,
    /// Hands the status sender back when the loop exits.
    task: JoinHandle<watch::Sender<StatusIndicator>>,
}

impl ScannerHandle {
    /// Records collected so far, newest first.
    pub fn snapshot(&self) -> Vec<MessageRecord> {
        self.engine.lock().snapshot()
    }

    pub fn stats(&self) -> CollectionStats {
        self.engine.lock().stats()
    }

    pub fn status(&self) -> StatusIndicator {
        self.status_rx.borrow().clone()
    }

    /// Receiver that sees every status change.
    pub fn subscribe(&self) -> watch::Receiver<StatusIndicator> {
        self.status_rx.clone()
    }

    /// Stop the loop, wait for the in-flight tick, and export.
    pub async fn stop(self) -> ExportReport {
        let _ = self.stop_tx.send(true);
        let status_tx = match self.task.await {
            Ok(tx) => Some(tx),
            Err(e) => {
                error!("Scanner task ended abnormally: {}", e);
                None
            }
        };

        let mut engine = self.engine.lock();
        let report = engine.stop();
        if let Some(tx) = status_tx {
            tx.send_replace(engine.status());
        }
        report
    }
}
