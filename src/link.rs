//! Video link recognition.
//!
//! Extraction is purely syntactic: the first capture of the first matching
//! pattern wins, and nothing checks that the video exists.

use regex::Regex;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::LazyLock;

/// Watch and short-link forms, matched on the marker alone.
static ANY_HOST_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:watch\?v=|youtu\.be/)([^&\n?#]+)").unwrap(),
        Regex::new(r"embed/([^&\n?#]+)").unwrap(),
    ]
});

/// Same forms, but watch and embed links must be on youtube.com.
static YOUTUBE_PATTERNS: LazyLock<[Regex; 2]> = LazyLock::new(|| {
    [
        Regex::new(r"(?:youtube\.com/watch\?v=|youtu\.be/)([^&\n?#]+)").unwrap(),
        Regex::new(r"youtube\.com/embed/([^&\n?#]+)").unwrap(),
    ]
});

/// Opaque token captured from a video link.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Identifier(String);

impl Identifier {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_inner(self) -> String {
        self.0
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum HostPolicy {
    /// Accept `watch?v=`, `youtu.be/` and `embed/` on any host.
    #[default]
    Any,
    /// Require youtube.com for watch and embed links.
    #[serde(rename = "youtube")]
    YouTube,
}

impl HostPolicy {
    pub fn from_str(value: &str) -> Option<Self> {
        match value.trim().to_lowercase().as_str() {
            "any" | "loose" => Some(HostPolicy::Any),
            "youtube" | "strict" => Some(HostPolicy::YouTube),
            _ => None,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            HostPolicy::Any => "any",
            HostPolicy::YouTube => "youtube",
        }
    }

    fn patterns(self) -> &'static [Regex; 2] {
        match self {
            HostPolicy::Any => &ANY_HOST_PATTERNS,
            HostPolicy::YouTube => &YOUTUBE_PATTERNS,
        }
    }
}

/// Extracts the video identifier from `input`, or `None` when no recognized
/// link form is present.
pub fn extract_identifier(input: &str) -> Option<Identifier> {
    extract_identifier_with(input, HostPolicy::Any)
}

/// Surrounding whitespace of `input` is trimmed before matching, so
/// `watch?v=abc ` yields `abc`; the capture itself is never trimmed.
pub fn extract_identifier_with(input: &str, policy: HostPolicy) -> Option<Identifier> {
    let input = input.trim();
    if input.is_empty() {
        return None;
    }

    policy.patterns().iter().find_map(|pattern| {
        pattern
            .captures(input)
            .and_then(|captures| captures.get(1))
            .map(|capture| Identifier::new(capture.as_str()))
    })
}
