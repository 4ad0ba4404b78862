use std::fmt::Write;

use chatlens_core::MessageRecord;

const PREVIEW_CHARS: usize = 40;

/// Render records as a fixed-column text table, one row per record.
pub fn render_table(records: &[MessageRecord]) -> String {
    let mut out = String::new();
    let _ = writeln!(
        out,
        "{:>5}  {:<6} {:<6} {:<24} {}",
        "seq", "sender", "kind", "time", "content"
    );
    for record in records {
        let _ = writeln!(
            out,
            "{:>5}  {:<6} {:<6} {:<24} {}",
            record.sequence,
            record.sender.name(),
            record.kind.name(),
            record.timestamp_label.as_deref().unwrap_or("-"),
            preview(&record.content),
        );
    }
    out
}

fn preview(content: &str) -> String {
    if content.chars().count() <= PREVIEW_CHARS {
        return content.to_string();
    }
    let cut: String = content.chars().take(PREVIEW_CHARS).collect();
    format!("{}…", cut)
}
