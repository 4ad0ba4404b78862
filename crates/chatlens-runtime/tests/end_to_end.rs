use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use chrono::{FixedOffset, NaiveDate, TimeZone};

use chatlens_core::{Error, MessageKind, Result, ScanConfig, Sender};
use chatlens_dom::HtmlSnapshot;
use chatlens_extract::DateContext;
use chatlens_runtime::{DocumentSource, ScanEngine, Scanner, StatusIndicator};

const VIEWPORT_META: &str = r#"<meta name="chatlens-viewport" content="1000x800">"#;

/// Two rows: a dated label with the partner's greeting on the left, then a
/// bare time with the operator's reply on the right.
fn conversation() -> String {
    format!(
        r#"<html><head>{VIEWPORT_META}</head><body>
        <header><h2>jisoo.kim</h2></header>
        <nav><a href="/direct/inbox/">DM</a><a href="/my.handle/">Profile</a></nav>
        <div role="grid" data-rect="0,0,1000,800">
          <div class="row" data-rect="0,0,1000,60">
            <div class="stamp" data-rect="400,5,200,20">25. 1. 15. 오후 3:05</div>
            <div class="bubble" data-rect="20,30,220,30">
              <div dir="auto" data-rect="30,35,200,20">안녕하세요</div>
            </div>
          </div>
          <div class="row" data-rect="0,70,1000,60">
            <div class="stamp" data-rect="400,75,200,20">오후 3:07</div>
            <div class="bubble" data-rect="680,100,220,30">
              <div dir="auto" data-rect="690,105,200,20">네 알겠습니다</div>
            </div>
          </div>
        </div>
        </body></html>"#
    )
}

fn config() -> ScanConfig {
    ScanConfig {
        utc_offset_minutes: Some(540),
        ..ScanConfig::default()
    }
}

fn kst_millis(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> i64 {
    FixedOffset::east_opt(540 * 60)
        .unwrap()
        .with_ymd_and_hms(y, mo, d, h, mi, 0)
        .unwrap()
        .timestamp_millis()
}

fn instagram_engine() -> ScanEngine {
    ScanEngine::start_at(
        "www.instagram.com",
        config(),
        DateContext::new(NaiveDate::from_ymd_opt(2026, 10, 15).unwrap()),
    )
    .unwrap()
}

fn doc(html: &str) -> HtmlSnapshot {
    HtmlSnapshot::parse_with_meta(html).unwrap()
}

#[test]
fn test_conversation_scenario() {
    let mut engine = instagram_engine();
    let report = engine.scan(&doc(&conversation())).unwrap();
    assert_eq!(report.added, 2);
    assert_eq!(report.failed, 0);

    let records = engine.snapshot();
    assert_eq!(records.len(), 2);

    let reply = &records[0];
    assert_eq!(reply.content, "네 알겠습니다");
    assert_eq!(reply.sender, Sender::Me);
    assert_eq!(reply.kind, MessageKind::Text);
    assert_eq!(reply.sequence, 1);
    assert_eq!(reply.timestamp, Some(kst_millis(2025, 1, 15, 15, 7)));
    assert_eq!(reply.timestamp_label.as_deref(), Some("25. 01. 15. 오후 3:07"));

    let greeting = &records[1];
    assert_eq!(greeting.content, "안녕하세요");
    assert_eq!(greeting.sender, Sender::Other);
    assert_eq!(greeting.sequence, 0);
    assert_eq!(greeting.timestamp, Some(kst_millis(2025, 1, 15, 15, 5)));
    assert_eq!(greeting.timestamp_label.as_deref(), Some("25. 1. 15. 오후 3:05"));

    let identities = engine.identities();
    assert_eq!(identities.partner_name.as_deref(), Some("jisoo.kim"));
    assert_eq!(identities.own_handle.as_deref(), Some("my.handle"));
}

#[test]
fn test_rescan_is_idempotent() {
    let mut engine = instagram_engine();
    let page = doc(&conversation());
    engine.scan(&page).unwrap();
    let first = engine.snapshot();

    let report = engine.scan(&page).unwrap();
    assert_eq!(report.added, 0);
    assert_eq!(report.duplicates, 2);
    assert_eq!(engine.snapshot(), first);
}

#[test]
fn test_partner_name_and_bare_time_are_noise() {
    let html = format!(
        r#"<html><head>{VIEWPORT_META}</head><body>
        <header><h2>jisoo.kim</h2></header>
        <div role="grid">
          <span dir="auto" data-rect="30,10,200,20">jisoo.kim</span>
          <span dir="auto" data-rect="30,40,200,20">오후 3:07</span>
          <span dir="auto" data-rect="30,70,200,20">jisoo.kim님의 스토리에 공감했습니다</span>
        </div></body></html>"#
    );
    let mut engine = instagram_engine();
    let report = engine.scan(&doc(&html)).unwrap();
    assert_eq!(report.noise, 3);
    assert!(engine.is_empty());
}

#[test]
fn test_date_carries_across_scans() {
    let mut engine = instagram_engine();
    let dated = format!(
        r#"<html><head>{VIEWPORT_META}</head><body><div role="grid">
          <div data-rect="400,5,200,20">24. 12. 31. 오후 11:50</div>
          <div><span dir="auto" data-rect="30,35,200,20">새해 복 많이 받아</span></div>
        </div></body></html>"#
    );
    engine.scan(&doc(&dated)).unwrap();
    assert_eq!(
        engine.date_context().date(),
        NaiveDate::from_ymd_opt(2024, 12, 31).unwrap()
    );

    // The dated label has scrolled out of the page.
    let later = format!(
        r#"<html><head>{VIEWPORT_META}</head><body><div role="grid">
          <div data-rect="400,5,200,20">오후 11:58</div>
          <div><span dir="auto" data-rect="690,35,200,20">너도!</span></div>
        </div></body></html>"#
    );
    engine.scan(&doc(&later)).unwrap();

    let latest = &engine.snapshot()[0];
    assert_eq!(latest.content, "너도!");
    assert_eq!(latest.timestamp, Some(kst_millis(2024, 12, 31, 23, 58)));
}

#[test]
fn test_sequences_follow_first_observation() {
    let mut engine = instagram_engine();
    let page = |text: &str| {
        doc(&format!(
            r#"<html><head>{VIEWPORT_META}</head><body><div role="grid">
              <span dir="auto" data-rect="30,35,200,20">{text}</span>
            </div></body></html>"#
        ))
    };
    engine.scan(&page("첫째")).unwrap();
    engine.scan(&page("둘째")).unwrap();
    engine.scan(&page("첫째")).unwrap();
    engine.scan(&page("셋째")).unwrap();

    let order: Vec<(u64, String)> = engine
        .snapshot()
        .into_iter()
        .map(|r| (r.sequence, r.content))
        .collect();
    assert_eq!(
        order,
        vec![
            (2, "셋째".to_string()),
            (1, "둘째".to_string()),
            (0, "첫째".to_string())
        ]
    );
}

#[test]
fn test_export_after_stop() {
    let mut engine = instagram_engine();
    engine.scan(&doc(&conversation())).unwrap();
    let export = engine.stop();
    assert_eq!(export.stats.total, 2);
    assert_eq!(export.stats.me, 1);
    assert_eq!(export.stats.with_timestamp, 2);
    assert_eq!(export.partner_name.as_deref(), Some("jisoo.kim"));

    let json = serde_json::to_value(&export).unwrap();
    assert_eq!(json["platform"], "instagram");
    assert_eq!(json["records"][0]["timestampLabel"], "25. 01. 15. 오후 3:07");
    assert_eq!(json["stats"]["withTimestamp"], 2);

    assert!(engine.scan(&doc(&conversation())).unwrap().stopped);
}

/// Serves the conversation page, failing every other capture.
struct FlakyPage {
    captures: Arc<AtomicUsize>,
}

impl DocumentSource for FlakyPage {
    type Document = HtmlSnapshot;

    fn capture(&mut self) -> Result<HtmlSnapshot> {
        let n = self.captures.fetch_add(1, Ordering::SeqCst);
        if n % 2 == 1 {
            return Err(Error::Document("page not ready".into()));
        }
        HtmlSnapshot::parse_with_meta(&conversation())
    }
}

#[tokio::test]
async fn test_scanner_runs_until_stopped() {
    let engine = ScanEngine::start(
        "www.instagram.com",
        ScanConfig {
            scan_interval_ms: 10,
            ..config()
        },
    )
    .unwrap();
    let captures = Arc::new(AtomicUsize::new(0));
    let handle = Scanner::start(
        engine,
        FlakyPage {
            captures: captures.clone(),
        },
    );
    assert_eq!(
        handle.status(),
        StatusIndicator::Armed {
            platform: chatlens_core::Platform::Instagram
        }
    );

    tokio::time::sleep(Duration::from_millis(120)).await;
    assert!(captures.load(Ordering::SeqCst) >= 3);
    assert_eq!(handle.snapshot().len(), 2);
    assert_eq!(handle.status(), StatusIndicator::Collecting { count: 2 });

    let mut status = handle.subscribe();
    let export = handle.stop().await;
    assert_eq!(export.records.len(), 2);
    assert_eq!(export.records[0].sender, Sender::Me);
    assert_eq!(*status.borrow_and_update(), StatusIndicator::Done { count: 2 });

    let after = captures.load(Ordering::SeqCst);
    tokio::time::sleep(Duration::from_millis(50)).await;
    assert_eq!(captures.load(Ordering::SeqCst), after);
}
