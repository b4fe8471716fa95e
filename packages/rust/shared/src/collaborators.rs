//! Narrow interfaces to the external services the pipeline stages wrap.
//!
//! Implementations live in `personakit-source`, `personakit-llm` and
//! `personakit-writer`; tests substitute in-memory fakes.

use std::path::PathBuf;

use async_trait::async_trait;

use crate::error::Result;
use crate::types::{SubjectId, UserContent};

/// Fetches a subject's recent public activity.
#[async_trait]
pub trait ContentSource: Send + Sync {
    /// Return up to `limit` posts and up to `limit` comments. Either list may be empty.
    async fn fetch(&self, subject: &SubjectId, limit: u32) -> Result<UserContent>;
}

/// Turns a prompt into generated text.
#[async_trait]
pub trait Summarizer: Send + Sync {
    async fn summarize(&self, prompt: &str) -> Result<String>;
}

/// Stores a generated persona and reports where it went.
#[async_trait]
pub trait PersistenceSink: Send + Sync {
    async fn save(&self, subject: &SubjectId, text: &str) -> Result<PathBuf>;
}
