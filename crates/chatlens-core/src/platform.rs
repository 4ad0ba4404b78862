//! Platform profiles — locators and rule data for each supported chat site.

use serde::{Deserialize, Serialize};

/// Supported chat sites.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Platform {
    Instagram,
    Telegram,
    Danggeun,
}

/// Locale tokens of a time grammar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeTokens {
    /// Half-day marker before noon.
    pub am: &'static str,
    /// Half-day marker after noon.
    pub pm: &'static str,
    /// Abbreviated weekday names used in parenthesized day labels.
    pub weekdays: &'static [&'static str],
}

impl TimeTokens {
    pub const KOREAN: TimeTokens = TimeTokens {
        am: "오전",
        pm: "오후",
        weekdays: &["월", "화", "수", "목", "금", "토", "일"],
    };
}

/// One class-name test used by structural speaker cues.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ClassMarker {
    /// Some class token contains the substring.
    Contains(&'static str),
    /// Some class token equals the value.
    Token(&'static str),
}

impl ClassMarker {
    pub fn matches(&self, classes: &[String]) -> bool {
        match self {
            Self::Contains(needle) => classes.iter().any(|c| c.contains(needle)),
            Self::Token(token) => classes.iter().any(|c| c == token),
        }
    }
}

/// How a platform encodes message ownership in markup.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SpeakerCues {
    /// Ownership is only visible through horizontal alignment.
    Geometric,
    /// Message containers carry `container`; own messages also carry `outgoing`.
    OutgoingClass {
        container: &'static str,
        outgoing: &'static str,
    },
    /// Class markers that name the owner directly.
    OwnerClass {
        mine: &'static [ClassMarker],
        other: &'static [ClassMarker],
    },
}

/// Where the partner name and the operator handle can be read from page chrome.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct IdentityLocators {
    /// Tried in order; the first acceptable element text wins.
    pub heading_selectors: &'static [&'static str],
    /// Headings containing any of these are navigation chrome.
    pub system_words: &'static [&'static str],
    /// Exclusive upper bound on partner name length, in characters.
    pub max_name_chars: usize,
    pub profile_link_selector: &'static str,
    /// Links whose path contains any of these are not profile links.
    pub excluded_path_words: &'static [&'static str],
    /// Exclusive upper bound on handle length, in characters.
    pub max_handle_chars: usize,
}

const INSTAGRAM_NOISE: &[&str] = &[
    "님의 스토리에 답장을 보냈습니다",
    "스토리를 볼 수 없습니다",
    "회원님이 자신에게 보낸 답장",
    "님의 스토리에 공감했습니다",
    "님이 회원님에게 보낸 답장",
    "스토리에 답장",
    "스토리에 공감",
    "회원님",
    "자신에게",
    "공감했습니다",
    "답장을 보냈습니다",
    "릴스",
    "릴",
    "Reels",
    "reel",
    "shared a reel",
    "shared a video",
    "영상을 공유했습니다",
    "동영상",
    "이용할 수 없는 메시지",
    "이 콘텐츠는 콘텐츠 소유자가 삭제했거나 공개 범위 설정에 의해 숨겨졌을 수 있습니다",
];

/// The short `me`/`other` markers match whole class tokens only; as
/// substrings, `me` would also hit `message`.
const DANGGEUN_MINE: &[ClassMarker] = &[ClassMarker::Contains("my-message"), ClassMarker::Token("me")];
const DANGGEUN_OTHER: &[ClassMarker] = &[
    ClassMarker::Contains("other-message"),
    ClassMarker::Token("other"),
];

const INSTAGRAM_IDENTITY: IdentityLocators = IdentityLocators {
    heading_selectors: &[
        r#"header [role="heading"]"#,
        "header h2",
        "header h1",
        "header span",
        r#"[role="navigation"] + div h1"#,
        r#"[role="banner"] h1"#,
    ],
    system_words: &["메시지", "검색", "설정", "새 메시지", "받은 메시지함"],
    max_name_chars: 50,
    profile_link_selector: r#"a[href*="/"]"#,
    excluded_path_words: &["explore", "direct"],
    max_handle_chars: 30,
};

impl Platform {
    pub fn all() -> &'static [Platform] {
        &[Self::Instagram, Self::Telegram, Self::Danggeun]
    }

    /// Select the profile for a source identity (normally the page hostname).
    pub fn detect(host: &str) -> Option<Self> {
        let host = host.trim().to_lowercase();
        if host.contains("instagram.com") {
            Some(Self::Instagram)
        } else if host.contains("web.telegram.org") {
            Some(Self::Telegram)
        } else if host.contains("danggeun.com") || host.contains("당근") {
            Some(Self::Danggeun)
        } else {
            None
        }
    }

    pub fn name(&self) -> &'static str {
        match self {
            Self::Instagram => "instagram",
            Self::Telegram => "telegram",
            Self::Danggeun => "danggeun",
        }
    }

    /// Root of the message list.
    pub fn container_selector(&self) -> &'static str {
        match self {
            Self::Instagram => r#"[role="grid"]"#,
            Self::Telegram => ".scrollable-y",
            Self::Danggeun => r#".chat-messages, [class*="message-list"]"#,
        }
    }

    /// Elements holding message text.
    pub fn text_selector(&self) -> &'static str {
        match self {
            Self::Instagram => r#"div[dir="auto"], span[dir="auto"]"#,
            Self::Telegram => ".message-text, .text-content",
            Self::Danggeun => ".message-text, .bubble-text",
        }
    }

    /// Elements that may be message images.
    pub fn image_selector(&self) -> &'static str {
        match self {
            Self::Instagram => "img",
            Self::Telegram => r#"img[class*="message"], img[class*="photo"]"#,
            Self::Danggeun => r#"img[class*="message"], img[class*="bubble"]"#,
        }
    }

    /// Time grammar tokens; `None` when the platform's time labels are not parsed.
    pub fn time_tokens(&self) -> Option<TimeTokens> {
        match self {
            Self::Instagram => Some(TimeTokens::KOREAN),
            Self::Telegram | Self::Danggeun => None,
        }
    }

    /// System-notice phrases, matched as case-sensitive substrings.
    pub fn noise_phrases(&self) -> &'static [&'static str] {
        match self {
            Self::Instagram => INSTAGRAM_NOISE,
            Self::Telegram | Self::Danggeun => &[],
        }
    }

    pub fn speaker_cues(&self) -> SpeakerCues {
        match self {
            Self::Instagram => SpeakerCues::Geometric,
            Self::Telegram => SpeakerCues::OutgoingClass {
                container: "message",
                outgoing: "is-out",
            },
            Self::Danggeun => SpeakerCues::OwnerClass {
                mine: DANGGEUN_MINE,
                other: DANGGEUN_OTHER,
            },
        }
    }

    pub fn identity_locators(&self) -> Option<&'static IdentityLocators> {
        match self {
            Self::Instagram => Some(&INSTAGRAM_IDENTITY),
            Self::Telegram | Self::Danggeun => None,
        }
    }
}

impl std::fmt::Display for Platform {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}
