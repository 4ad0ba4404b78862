//! Date-carry timestamp resolution.
//!
//! Chat UIs print a full date label once per day and only bare times for the
//! messages after it. The resolver remembers the last full date it parsed
//! (across scans) and uses it to place bare times on the calendar.

use chrono::{Datelike, FixedOffset, NaiveDate, NaiveDateTime, TimeZone};
use regex::Regex;
use serde::Serialize;
use tracing::debug;

use chatlens_core::{Error, Result, TimeTokens};

/// Most recently resolved calendar date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateContext {
    date: NaiveDate,
}

impl DateContext {
    pub fn new(date: NaiveDate) -> Self {
        Self { date }
    }

    /// Today's date at `offset`.
    pub fn today(offset: FixedOffset) -> Self {
        Self::new(chrono::Utc::now().with_timezone(&offset).date_naive())
    }

    pub fn date(&self) -> NaiveDate {
        self.date
    }
}

/// A time label resolved to an absolute instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedTime {
    /// Epoch milliseconds.
    pub timestamp: i64,
    /// The label as read, or reconstructed with the carried date.
    pub label: String,
    pub local: NaiveDateTime,
}

/// Compiled patterns for one locale's time labels.
#[derive(Debug, Clone)]
pub struct TimeGrammar {
    tokens: TimeTokens,
    /// `YY(YY). M. D. <marker> H:MM` anywhere in the text.
    full: Regex,
    /// `<marker> H:MM` and nothing else.
    bare: Regex,
    /// A full label and nothing else.
    full_only: Regex,
    /// `(<weekday>) <marker> H:MM` and nothing else.
    weekday_time: Regex,
}

impl TimeGrammar {
    pub fn new(tokens: TimeTokens) -> Result<Self> {
        let marker = format!(
            "({}|{})",
            regex::escape(tokens.am),
            regex::escape(tokens.pm)
        );
        let weekdays = tokens
            .weekdays
            .iter()
            .map(|w| regex::escape(w))
            .collect::<Vec<_>>()
            .join("|");
        let date = r"([0-9]{2,4})\.\s*([0-9]{1,2})\.\s*([0-9]{1,2})\.";
        let clock = r"([0-9]{1,2}):([0-9]{2})";

        Ok(Self {
            tokens,
            full: compile(&format!(r"{date}\s*{marker}\s*{clock}"))?,
            bare: compile(&format!(r"^{marker}\s*{clock}$"))?,
            full_only: compile(&format!(r"^{date}\s*{marker}\s*{clock}$"))?,
            weekday_time: compile(&format!(r"^\((?:{weekdays})\)\s*{marker}\s*{clock}$"))?,
        })
    }

    pub fn tokens(&self) -> TimeTokens {
        self.tokens
    }

    /// Whether the text is only a time label, with no message content.
    pub fn is_bare_label(&self, text: &str) -> bool {
        self.bare.is_match(text) || self.full_only.is_match(text) || self.weekday_time.is_match(text)
    }

    /// Convert a 12-hour value to 24-hour time. Hours above 12 are malformed.
    fn to_24h(&self, marker: &str, hour: u32) -> Option<u32> {
        if hour > 12 {
            return None;
        }
        if marker == self.tokens.pm && hour != 12 {
            Some(hour + 12)
        } else if marker == self.tokens.am && hour == 12 {
            Some(0)
        } else {
            Some(hour)
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).map_err(|e| Error::Config(format!("time grammar: {}", e)))
}

/// Parses time labels, carrying the last full date forward.
#[derive(Debug, Clone)]
pub struct TimestampResolver {
    grammar: Option<TimeGrammar>,
    context: DateContext,
    offset: FixedOffset,
}

impl TimestampResolver {
    pub fn new(grammar: Option<TimeGrammar>, context: DateContext, offset: FixedOffset) -> Self {
        Self {
            grammar,
            context,
            offset,
        }
    }

    pub fn grammar(&self) -> Option<&TimeGrammar> {
        self.grammar.as_ref()
    }

    pub fn context(&self) -> DateContext {
        self.context
    }

    /// Resolve a time label. Full labels move the carried date; bare labels read it.
    pub fn parse_time(&mut self, text: &str) -> Option<ResolvedTime> {
        let grammar = self.grammar.as_ref()?;
        let text = text.trim();

        if let Some(caps) = grammar.full.captures(text) {
            let year_raw = &caps[1];
            let year: i32 = match year_raw.len() {
                2 => 2000 + year_raw.parse::<i32>().ok()?,
                4 => year_raw.parse().ok()?,
                _ => return None,
            };
            let month: u32 = caps[2].parse().ok()?;
            let day: u32 = caps[3].parse().ok()?;
            let hour = grammar.to_24h(&caps[4], caps[5].parse().ok()?)?;
            let minute: u32 = caps[6].parse().ok()?;

            let date = NaiveDate::from_ymd_opt(year, month, day)?;
            let local = date.and_hms_opt(hour, minute, 0)?;
            let timestamp = self.instant(local)?;

            if self.context.date != date {
                debug!("Date context moved to {}", date);
            }
            self.context = DateContext::new(date);

            return Some(ResolvedTime {
                timestamp,
                label: text.to_string(),
                local,
            });
        }

        if let Some(caps) = grammar.bare.captures(text) {
            let hour = grammar.to_24h(&caps[1], caps[2].parse().ok()?)?;
            let minute: u32 = caps[3].parse().ok()?;

            let date = self.context.date;
            let local = date.and_hms_opt(hour, minute, 0)?;
            let timestamp = self.instant(local)?;

            return Some(ResolvedTime {
                timestamp,
                label: format!(
                    "{:02}. {:02}. {:02}. {}",
                    date.year().rem_euclid(100),
                    date.month(),
                    date.day(),
                    text
                ),
                local,
            });
        }

        None
    }

    fn instant(&self, local: NaiveDateTime) -> Option<i64> {
        self.offset
            .from_local_datetime(&local)
            .single()
            .map(|dt| dt.timestamp_millis())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Timelike;

    fn kst() -> FixedOffset {
        FixedOffset::east_opt(9 * 3600).unwrap()
    }

    fn resolver_at(year: i32, month: u32, day: u32) -> TimestampResolver {
        let grammar = TimeGrammar::new(TimeTokens::KOREAN).unwrap();
        TimestampResolver::new(
            Some(grammar),
            DateContext::new(NaiveDate::from_ymd_opt(year, month, day).unwrap()),
            kst(),
        )
    }

    fn local(y: i32, mo: u32, d: u32, h: u32, mi: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, mo, d)
            .unwrap()
            .and_hms_opt(h, mi, 0)
            .unwrap()
    }

    #[test]
    fn test_full_label() {
        let mut resolver = resolver_at(2026, 10, 15);
        let t = resolver.parse_time("25. 1. 15. 오후 3:05").unwrap();
        assert_eq!(t.local, local(2025, 1, 15, 15, 5));
        assert_eq!(t.label, "25. 1. 15. 오후 3:05");
        assert_eq!(
            t.timestamp,
            kst().from_local_datetime(&t.local).unwrap().timestamp_millis()
        );
        assert_eq!(
            resolver.context().date(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_full_label_four_digit_year_embedded() {
        let mut resolver = resolver_at(2026, 10, 15);
        let t = resolver.parse_time("보낸 시각 2024. 12. 31. 오전 9:41").unwrap();
        assert_eq!(t.local, local(2024, 12, 31, 9, 41));
    }

    #[test]
    fn test_bare_label_uses_context() {
        let mut resolver = resolver_at(2025, 3, 2);
        let t = resolver.parse_time("오후 3:07").unwrap();
        assert_eq!(t.local, local(2025, 3, 2, 15, 7));
        assert_eq!(t.label, "25. 03. 02. 오후 3:07");
        assert_eq!(
            resolver.context().date(),
            NaiveDate::from_ymd_opt(2025, 3, 2).unwrap()
        );
    }

    #[test]
    fn test_date_carry_forward() {
        let mut resolver = resolver_at(2026, 10, 15);
        resolver.parse_time("25. 1. 15. 오후 3:05").unwrap();
        let t = resolver.parse_time("오후 3:07").unwrap();
        assert_eq!(t.local, local(2025, 1, 15, 15, 7));
    }

    #[test]
    fn test_half_day_normalization() {
        let mut resolver = resolver_at(2025, 1, 15);
        assert_eq!(resolver.parse_time("오후 12:30").unwrap().local.hour(), 12);
        assert_eq!(resolver.parse_time("오전 12:15").unwrap().local.hour(), 0);
        assert_eq!(resolver.parse_time("오전 9:00").unwrap().local.hour(), 9);
        assert_eq!(resolver.parse_time("오후 11:59").unwrap().local.hour(), 23);
    }

    #[test]
    fn test_malformed_is_no_match() {
        let mut resolver = resolver_at(2025, 1, 15);
        assert!(resolver.parse_time("25. 13. 15. 오후 3:05").is_none());
        assert!(resolver.parse_time("125. 1. 15. 오후 3:05").is_none());
        assert!(resolver.parse_time("오후 13:05").is_none());
        assert!(resolver.parse_time("오전 3:75").is_none());
        assert_eq!(
            resolver.context().date(),
            NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()
        );
    }

    #[test]
    fn test_non_time_text() {
        let mut resolver = resolver_at(2025, 1, 15);
        assert!(resolver.parse_time("안녕하세요").is_none());
        assert!(resolver.parse_time("오후 3:07 에 만나요").is_none());
        assert!(resolver.parse_time("").is_none());
    }

    #[test]
    fn test_no_grammar() {
        let mut resolver = TimestampResolver::new(
            None,
            DateContext::new(NaiveDate::from_ymd_opt(2025, 1, 15).unwrap()),
            kst(),
        );
        assert!(resolver.parse_time("25. 1. 15. 오후 3:05").is_none());
    }

    #[test]
    fn test_other_locale_tokens() {
        let tokens = TimeTokens {
            am: "AM",
            pm: "PM",
            weekdays: &["Mon", "Tue"],
        };
        let mut resolver = TimestampResolver::new(
            Some(TimeGrammar::new(tokens).unwrap()),
            DateContext::new(NaiveDate::from_ymd_opt(2025, 6, 1).unwrap()),
            kst(),
        );
        assert_eq!(resolver.parse_time("PM 4:20").unwrap().local, local(2025, 6, 1, 16, 20));
        assert!(resolver.grammar().unwrap().is_bare_label("(Mon) AM 8:00"));
    }

    #[test]
    fn test_bare_label_shapes() {
        let grammar = TimeGrammar::new(TimeTokens::KOREAN).unwrap();
        assert!(grammar.is_bare_label("오후 3:07"));
        assert!(grammar.is_bare_label("(수) 오전 10:12"));
        assert!(grammar.is_bare_label("25. 1. 15. 오후 3:05"));
        assert!(!grammar.is_bare_label("25. 1. 15. 오후 3:05 약속"));
        assert!(!grammar.is_bare_label("3시에 봐요"));
    }
}
