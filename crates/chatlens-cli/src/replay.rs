//! Offline runs over captured page snapshots.

use std::path::{Path, PathBuf};

use tracing::{info, warn};

use chatlens_core::{Result, ScanConfig};
use chatlens_dom::HtmlSnapshot;
use chatlens_runtime::{DocumentSource, ExportReport, ScanEngine};

/// `*.html` frames in `dir`, in file-name order.
pub fn list_frames(dir: &Path) -> Result<Vec<PathBuf>> {
    let mut frames = Vec::new();
    for entry in std::fs::read_dir(dir)? {
        let path = entry?.path();
        if path.is_file() && path.extension().map_or(false, |ext| ext == "html") {
            frames.push(path);
        }
    }
    frames.sort();
    Ok(frames)
}

/// Scan every frame once, in order, then stop and export.
///
/// A frame that cannot be read or scanned is logged and skipped.
pub fn replay(host: &str, dir: &Path, config: ScanConfig) -> Result<ExportReport> {
    let frames = list_frames(dir)?;
    let mut engine = ScanEngine::start(host, config)?;
    info!("Replaying {} frames from {}", frames.len(), dir.display());

    for frame in &frames {
        let outcome = HtmlSnapshot::from_file(frame).and_then(|doc| engine.scan(&doc));
        match outcome {
            Ok(report) => info!(
                "{}: +{} new, {} duplicates, {} noise",
                frame.display(),
                report.added,
                report.duplicates,
                report.noise
            ),
            Err(e) => warn!("Skipping {}: {}", frame.display(), e),
        }
    }

    Ok(engine.stop())
}

/// Re-reads one snapshot file on every tick, for a page that is being
/// re-captured in place.
pub struct SnapshotFile {
    path: PathBuf,
}

impl SnapshotFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

impl DocumentSource for SnapshotFile {
    type Document = HtmlSnapshot;

    fn capture(&mut self) -> Result<HtmlSnapshot> {
        HtmlSnapshot::from_file(&self.path)
    }
}
