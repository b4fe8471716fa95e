//! Core domain types shared by the pipeline and its collaborators.

use std::collections::BTreeMap;
use std::sync::LazyLock;

use regex::Regex;
use serde::{Deserialize, Serialize};
use url::Url;
use uuid::Uuid;

use crate::error::{PersonaKitError, Result};

// ---------------------------------------------------------------------------
// RunId
// ---------------------------------------------------------------------------

/// A UUID v7 wrapper identifying one pipeline invocation (time-sortable).
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RunId(pub Uuid);

impl RunId {
    /// Generate a new time-sortable run identifier.
    pub fn new() -> Self {
        Self(Uuid::now_v7())
    }
}

impl Default for RunId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for RunId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

// ---------------------------------------------------------------------------
// SubjectId
// ---------------------------------------------------------------------------

static SUBJECT_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^[A-Za-z0-9_-]{3,20}$").expect("valid regex"));

/// A validated platform username.
///
/// Validation happens here, before a pipeline is ever started; stages only
/// ever see identifiers that passed [`SubjectId::parse`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SubjectId(String);

impl SubjectId {
    /// Validate a bare username.
    pub fn parse(raw: &str) -> Result<Self> {
        let name = raw.trim();
        if SUBJECT_RE.is_match(name) {
            Ok(Self(name.to_string()))
        } else {
            Err(PersonaKitError::validation(format!(
                "invalid username '{name}': expected 3-20 characters of letters, digits, '_' or '-'"
            )))
        }
    }

    /// Accept a profile URL (`https://www.reddit.com/user/<name>/`,
    /// `https://reddit.com/u/<name>`, with or without the scheme), a
    /// `u/<name>` shorthand, or a bare name.
    pub fn from_profile_url(input: &str) -> Result<Self> {
        let input = input.trim();

        let url_text = if input.contains("://") {
            Some(input.to_string())
        } else if input.to_ascii_lowercase().contains("reddit.com/") {
            // Host pasted without a scheme.
            Some(format!("https://{input}"))
        } else {
            None
        };

        if let Some(url_text) = url_text {
            let url = Url::parse(&url_text)
                .map_err(|e| PersonaKitError::validation(format!("invalid URL '{input}': {e}")))?;
            let segments: Vec<&str> = url
                .path_segments()
                .map(|s| s.filter(|seg| !seg.is_empty()).collect())
                .unwrap_or_default();

            return segments
                .windows(2)
                .find(|pair| pair[0] == "user" || pair[0] == "u")
                .map(|pair| Self::parse(pair[1]))
                .unwrap_or_else(|| {
                    Err(PersonaKitError::validation(format!(
                        "URL '{input}' is not a user profile URL"
                    )))
                });
        }

        let name = input
            .trim_start_matches('/')
            .strip_prefix("u/")
            .or_else(|| input.trim_start_matches('/').strip_prefix("user/"))
            .unwrap_or(input)
            .trim_end_matches('/');
        Self::parse(name)
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Display for SubjectId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

// ---------------------------------------------------------------------------
// Content
// ---------------------------------------------------------------------------

/// What a content source returns for one subject.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct UserContent {
    /// Submissions, each rendered as `Title: …\nBody: …`.
    pub posts: Vec<String>,
    /// Comment bodies.
    pub comments: Vec<String>,
}

impl UserContent {
    pub fn is_empty(&self) -> bool {
        self.posts.is_empty() && self.comments.is_empty()
    }
}

/// Where a [`Document`] came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DocumentSource {
    Post,
    Comment,
}

/// A unit of text handed to downstream stages.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Document {
    pub page_content: String,
    pub source: DocumentSource,
}

impl Document {
    pub fn new(page_content: impl Into<String>, source: DocumentSource) -> Self {
        Self {
            page_content: page_content.into(),
            source,
        }
    }
}

// ---------------------------------------------------------------------------
// HistoryEntry
// ---------------------------------------------------------------------------

/// One key-value record in the bounded history log.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct HistoryEntry(BTreeMap<String, String>);

impl HistoryEntry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder-style insert.
    pub fn with(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.0.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&str> {
        self.0.get(key).map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}
