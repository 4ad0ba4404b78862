//! Scan engine — one sampling pass over the page per call.

use chrono::Utc;
use tracing::{debug, error, info, warn};
use uuid::Uuid;

use chatlens_core::{Error, MessageKind, MessageRecord, Platform, Result, ScanConfig};
use chatlens_dom::DocumentView;
use chatlens_extract::{
    find_nearest_time, DateContext, Identities, IdentityExtractor, NoiseFilter, NoiseRule,
    SpeakerClassifier, TimeGrammar, TimestampResolver,
};
use chatlens_store::{normalize_text, CollectedStore, CollectionStats, ContentKey};

use crate::diagnostics::{log_export_summary, TableDump};
use crate::types::*;

/// What happened to one candidate node.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum NodeOutcome {
    Added,
    Duplicate,
    Noise(NoiseRule),
    Hidden,
    Skipped,
}

/// Per-run extraction state for one conversation page.
pub struct ScanEngine {
    platform: Platform,
    config: ScanConfig,
    identities: IdentityExtractor,
    resolver: TimestampResolver,
    speaker: SpeakerClassifier,
    store: CollectedStore,
    next_sequence: u64,
    scans: u64,
    state: EngineState,
    table_dump: TableDump,
}

impl ScanEngine {
    /// Start an engine for the page at `host`.
    ///
    /// Fails with [`Error::UnsupportedSource`] when no platform profile
    /// matches.
    pub fn start(host: &str, config: ScanConfig) -> Result<Self> {
        config.validate()?;
        let Some(platform) = Platform::detect(host) else {
            error!("Unsupported source: {}", host);
            return Err(Error::UnsupportedSource(host.to_string()));
        };

        let offset = config.utc_offset();
        let grammar = platform.time_tokens().map(TimeGrammar::new).transpose()?;
        let resolver = TimestampResolver::new(grammar, DateContext::today(offset), offset);

        info!(
            "Scan engine started: platform={}, interval={}ms, offset={}",
            platform, config.scan_interval_ms, offset
        );

        Ok(Self {
            platform,
            identities: IdentityExtractor::new(platform),
            resolver,
            speaker: SpeakerClassifier::new(platform.speaker_cues(), config.speaker_depth),
            store: CollectedStore::new(),
            next_sequence: 0,
            scans: 0,
            state: EngineState::Collecting,
            table_dump: TableDump::new(config.table_dump_interval()),
            config,
        })
    }

    /// Start with an explicit initial date instead of today's.
    pub fn start_at(host: &str, config: ScanConfig, context: DateContext) -> Result<Self> {
        let mut engine = Self::start(host, config)?;
        let offset = engine.config.utc_offset();
        let grammar = engine.resolver.grammar().cloned();
        engine.resolver = TimestampResolver::new(grammar, context, offset);
        Ok(engine)
    }

    pub fn platform(&self) -> Platform {
        self.platform
    }

    pub fn config(&self) -> &ScanConfig {
        &self.config
    }

    pub fn state(&self) -> EngineState {
        self.state
    }

    pub fn is_stopped(&self) -> bool {
        self.state == EngineState::Stopped
    }

    pub fn identities(&self) -> &Identities {
        self.identities.identities()
    }

    pub fn date_context(&self) -> DateContext {
        self.resolver.context()
    }

    pub fn len(&self) -> usize {
        self.store.len()
    }

    pub fn is_empty(&self) -> bool {
        self.store.is_empty()
    }

    /// Sample the page once and merge new messages into the store.
    ///
    /// A failing node is logged and counted; the remaining nodes are still
    /// processed. After [`stop`](Self::stop) this reads nothing.
    pub fn scan<D: DocumentView>(&mut self, doc: &D) -> Result<ScanReport> {
        if self.is_stopped() {
            return Ok(ScanReport::stopped());
        }

        self.identities.extract(doc)?;

        let root = doc.root();
        let container = doc
            .select_first(root, self.platform.container_selector())?
            .unwrap_or(root);
        let texts = doc.select(container, self.platform.text_selector())?;
        let images = doc.select(container, self.platform.image_selector())?;

        let mut report = ScanReport {
            candidates: texts.len() + images.len(),
            ..ScanReport::default()
        };

        for node in texts {
            let outcome = self.scan_text(doc, node);
            tally(&mut report, outcome, node);
        }
        for node in images {
            let outcome = self.scan_image(doc, node);
            tally(&mut report, outcome, node);
        }

        self.scans += 1;
        if report.added > 0 {
            debug!(
                "Scan {}: +{} ({} total, {} duplicates, {} noise)",
                self.scans,
                report.added,
                self.store.len(),
                report.duplicates,
                report.noise
            );
        }

        let store = &self.store;
        self.table_dump.maybe_dump(|| store.snapshot());

        Ok(report)
    }

    fn scan_text<D: DocumentView>(&mut self, doc: &D, node: D::Node) -> Result<NodeOutcome> {
        if !doc.is_visible(node, self.config.min_visible_size) {
            return Ok(NodeOutcome::Hidden);
        }

        let raw = doc.text(node);
        let text = raw.trim();
        let filter = NoiseFilter::new(
            self.platform.noise_phrases(),
            self.resolver.grammar(),
            self.identities.identities(),
        );
        if let Some(rule) = filter.verdict(text) {
            return Ok(NodeOutcome::Noise(rule));
        }

        let content = normalize_text(text);
        let key = ContentKey::text(&content);
        if self.store.contains(&key) {
            return Ok(NodeOutcome::Duplicate);
        }

        self.collect(doc, node, key, MessageKind::Text, content)
    }

    fn scan_image<D: DocumentView>(&mut self, doc: &D, node: D::Node) -> Result<NodeOutcome> {
        let Some(rect) = doc.rect(node) else {
            return Ok(NodeOutcome::Hidden);
        };
        if !rect.is_visible_in(&doc.viewport(), self.config.min_visible_size)
            || rect.width < self.config.min_image_size
            || rect.height < self.config.min_image_size
        {
            return Ok(NodeOutcome::Hidden);
        }

        let Some(url) = image_source(doc, node) else {
            return Ok(NodeOutcome::Skipped);
        };
        let key = ContentKey::image(&url);
        if self.store.contains(&key) {
            return Ok(NodeOutcome::Duplicate);
        }

        self.collect(doc, node, key, MessageKind::Image, url)
    }

    fn collect<D: DocumentView>(
        &mut self,
        doc: &D,
        node: D::Node,
        key: ContentKey,
        kind: MessageKind,
        content: String,
    ) -> Result<NodeOutcome> {
        let time = find_nearest_time(doc, node, &mut self.resolver, self.config.time_search_depth)?;
        let sequence = self.next_sequence;
        self.next_sequence += 1;
        let sender = self.speaker.classify(doc, node);

        let (timestamp, timestamp_label) = match time {
            Some(t) => (Some(t.timestamp), Some(t.label)),
            None => (None, None),
        };
        let record = MessageRecord {
            id: Uuid::new_v4().to_string(),
            kind,
            sender,
            content,
            timestamp,
            timestamp_label,
            sequence,
            observed_at: Utc::now(),
        };
        debug!(
            "#{} {} {}: {}",
            record.sequence,
            record.sender.name(),
            record.kind.name(),
            record.content
        );
        self.store.insert(key, record);
        Ok(NodeOutcome::Added)
    }

    /// Current records, newest first.
    pub fn snapshot(&self) -> Vec<MessageRecord> {
        self.store.snapshot()
    }

    pub fn stats(&self) -> CollectionStats {
        self.store.stats()
    }

    pub fn status(&self) -> StatusIndicator {
        match self.state {
            EngineState::Stopped => StatusIndicator::Done {
                count: self.store.len(),
            },
            EngineState::Collecting if self.scans == 0 => StatusIndicator::Armed {
                platform: self.platform,
            },
            EngineState::Collecting => StatusIndicator::Collecting {
                count: self.store.len(),
            },
        }
    }

    fn report(&self) -> ExportReport {
        let identities = self.identities.identities();
        ExportReport {
            platform: self.platform,
            records: self.store.snapshot(),
            stats: self.store.stats(),
            partner_name: identities.partner_name.clone(),
            own_handle: identities.own_handle.clone(),
        }
    }

    /// Take the final snapshot and halt collection. Same as [`stop`](Self::stop).
    pub fn export(&mut self) -> ExportReport {
        self.stop()
    }

    /// Stop collecting and export. Later scans are no-ops; stopping again
    /// returns the same export.
    pub fn stop(&mut self) -> ExportReport {
        let report = self.report();
        if self.state == EngineState::Collecting {
            self.state = EngineState::Stopped;
            log_export_summary(&report);
        }
        report
    }
}

fn tally<N: std::fmt::Debug>(report: &mut ScanReport, outcome: Result<NodeOutcome>, node: N) {
    match outcome {
        Ok(NodeOutcome::Added) => report.added += 1,
        Ok(NodeOutcome::Duplicate) => report.duplicates += 1,
        Ok(NodeOutcome::Noise(_)) => report.noise += 1,
        Ok(NodeOutcome::Hidden) => report.hidden += 1,
        Ok(NodeOutcome::Skipped) => report.skipped += 1,
        Err(e) => {
            warn!("Skipping node {:?}: {}", node, e);
            report.failed += 1;
        }
    }
}

/// Highest-resolution source of an image: the last `srcset` entry, else `src`.
fn image_source<D: DocumentView>(doc: &D, node: D::Node) -> Option<String> {
    let from_srcset = doc.attr(node, "srcset").and_then(|srcset| {
        srcset
            .split(',')
            .filter_map(|entry| entry.split_whitespace().next())
            .last()
            .map(str::to_string)
    });
    from_srcset.or_else(|| {
        doc.attr(node, "src")
            .map(|src| src.trim().to_string())
            .filter(|src| !src.is_empty())
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{Fault, FaultyDocument};
    use chatlens_core::Sender;
    use chatlens_dom::{HtmlSnapshot, Viewport};
    use chrono::NaiveDate;

    fn config() -> ScanConfig {
        ScanConfig {
            utc_offset_minutes: Some(540),
            ..ScanConfig::default()
        }
    }

    fn engine(host: &str) -> ScanEngine {
        ScanEngine::start_at(
            host,
            config(),
            DateContext::new(NaiveDate::from_ymd_opt(2025, 1, 20).unwrap()),
        )
        .unwrap()
    }

    fn page(body: &str) -> HtmlSnapshot {
        HtmlSnapshot::parse(
            &format!("<html><body>{}</body></html>", body),
            Viewport::new(1000.0, 800.0),
        )
    }

    #[test]
    fn test_unsupported_source() {
        let err = ScanEngine::start("example.com", config()).err().unwrap();
        assert!(matches!(err, Error::UnsupportedSource(host) if host == "example.com"));
    }

    #[test]
    fn test_rejects_invalid_config() {
        let bad = ScanConfig {
            scan_interval_ms: 0,
            ..ScanConfig::default()
        };
        assert!(matches!(
            ScanEngine::start("www.instagram.com", bad),
            Err(Error::Config(_))
        ));
    }

    #[test]
    fn test_container_defaults_to_root() {
        let mut engine = engine("www.instagram.com");
        let doc = page(r#"<div dir="auto" data-rect="30,30,200,20">안녕</div>"#);
        let report = engine.scan(&doc).unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(engine.snapshot()[0].content, "안녕");
    }

    #[test]
    fn test_hidden_and_noise_take_no_sequence() {
        let mut engine = engine("www.instagram.com");
        let doc = page(
            r#"<div role="grid">
                 <div dir="auto" data-rect="30,-100,200,20">scrolled away</div>
                 <div dir="auto" data-rect="30,10,200,20">오후 3:05</div>
                 <div dir="auto" data-rect="30,40,200,20">ㅋ</div>
                 <div dir="auto" data-rect="30,70,200,20">첫 메시지</div>
               </div>"#,
        );
        let report = engine.scan(&doc).unwrap();
        assert_eq!(report.candidates, 4);
        assert_eq!(report.hidden, 1);
        assert_eq!(report.noise, 2);
        assert_eq!(report.added, 1);
        assert_eq!(engine.snapshot()[0].sequence, 0);
    }

    #[test]
    fn test_images() {
        let mut engine = engine("web.telegram.org");
        let doc = page(
            r#"<div class="scrollable-y">
                 <div class="message is-out">
                   <img class="photo" data-rect="700,10,200,150"
                        src="https://cdn.example/s.jpg"
                        srcset="https://cdn.example/s.jpg 1x, https://cdn.example/l.jpg 2x">
                 </div>
                 <div class="message">
                   <img class="photo" data-rect="30,200,40,40" src="https://cdn.example/tiny.jpg">
                   <img class="photo" data-rect="30,260,200,150">
                 </div>
               </div>"#,
        );
        let report = engine.scan(&doc).unwrap();
        assert_eq!(report.added, 1);
        assert_eq!(report.hidden, 1);
        assert_eq!(report.skipped, 1);

        let records = engine.snapshot();
        assert_eq!(records[0].kind, MessageKind::Image);
        assert_eq!(records[0].content, "https://cdn.example/l.jpg");
        assert_eq!(records[0].sender, Sender::Me);
        assert!(records[0].timestamp.is_none());
    }

    #[test]
    fn test_image_source() {
        let doc = page(
            r#"<img id="a" src=" https://x/a.jpg ">
               <img id="b" srcset="https://x/1.jpg 320w,https://x/2.jpg 640w" src="https://x/a.jpg">
               <img id="c" src="">"#,
        );
        let node = |id: &str| doc.select_first(doc.root(), id).unwrap().unwrap();
        assert_eq!(image_source(&doc, node("#a")).as_deref(), Some("https://x/a.jpg"));
        assert_eq!(image_source(&doc, node("#b")).as_deref(), Some("https://x/2.jpg"));
        assert_eq!(image_source(&doc, node("#c")), None);
    }

    #[test]
    fn test_status_lifecycle() {
        let mut engine = engine("www.danggeun.com");
        assert_eq!(engine.status().to_string(), "🔴 danggeun scanner");

        let doc = page(
            r#"<div class="chat-messages">
                 <div class="my-message"><p class="message-text" data-rect="600,10,200,20">팔렸나요?</p></div>
               </div>"#,
        );
        engine.scan(&doc).unwrap();
        assert_eq!(engine.status().to_string(), "📥 1 messages");

        let export = engine.stop();
        assert_eq!(export.records.len(), 1);
        assert_eq!(export.records[0].sender, Sender::Me);
        assert_eq!(engine.status().to_string(), "✅ Done! (1 messages)");
    }

    #[test]
    fn test_stop_is_terminal() {
        let mut engine = engine("www.instagram.com");
        engine.stop();
        let doc = page(r#"<div dir="auto" data-rect="30,30,200,20">늦은 메시지</div>"#);
        let report = engine.scan(&doc).unwrap();
        assert!(report.stopped);
        assert!(engine.is_empty());
        assert_eq!(engine.state(), EngineState::Stopped);
        assert_eq!(engine.stop().records.len(), 0);
    }

    #[test]
    fn test_export_halts_scanning() {
        let mut engine = engine("www.instagram.com");
        engine
            .scan(&page(r#"<div dir="auto" data-rect="30,30,200,20">첫 메시지</div>"#))
            .unwrap();
        let export = engine.export();
        assert_eq!(export.records.len(), 1);
        assert_eq!(engine.state(), EngineState::Stopped);

        let report = engine
            .scan(&page(r#"<div dir="auto" data-rect="30,30,200,20">새 메시지</div>"#))
            .unwrap();
        assert!(report.stopped);
        assert_eq!(report.added, 0);
        assert_eq!(engine.len(), 1);
        assert_eq!(engine.status().to_string(), "✅ Done! (1 messages)");
    }

    #[test]
    fn test_failing_node_is_isolated() {
        let inner = page(
            r#"<div role="grid">
                 <div dir="auto" data-rect="30,10,200,20">앞 메시지</div>
                 <div id="bad" dir="auto" data-rect="30,40,200,20">깨진 메시지</div>
                 <div dir="auto" data-rect="30,70,200,20">뒤 메시지</div>
               </div>"#,
        );
        let bad = inner.select_first(inner.root(), "#bad").unwrap().unwrap();
        let doc = FaultyDocument {
            inner,
            fault: Some(Fault::Under(bad)),
        };

        let mut engine = engine("www.instagram.com");
        let report = engine.scan(&doc).unwrap();
        assert_eq!(report.candidates, 3);
        assert_eq!(report.failed, 1);
        assert_eq!(report.added, 2);

        let order: Vec<(u64, String)> = engine
            .snapshot()
            .into_iter()
            .map(|r| (r.sequence, r.content))
            .collect();
        assert_eq!(
            order,
            vec![(1, "뒤 메시지".to_string()), (0, "앞 메시지".to_string())]
        );
    }

    #[test]
    fn test_document_failure_fails_the_scan() {
        let doc = FaultyDocument {
            inner: page(r#"<div dir="auto" data-rect="30,30,200,20">안녕</div>"#),
            fault: Some(Fault::Everywhere),
        };
        let mut engine = engine("www.instagram.com");
        assert!(matches!(engine.scan(&doc), Err(Error::Document(_))));
        assert!(engine.is_empty());
        assert_eq!(engine.state(), EngineState::Collecting);
    }
}
