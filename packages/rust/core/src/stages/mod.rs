//! The concrete persona stages: fetch → analyze → format.
//!
//! Each wraps one external collaborator, turns its failures into the error
//! descriptor, and appends a single record to the history log.

mod analyze;
mod fetch;
mod format;

pub use analyze::AnalyzeStage;
pub use fetch::FetchStage;
pub use format::FormatStage;

use personakit_shared::{HistoryEntry, SubjectId};

/// Outcome label written into a stage's history record.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub(crate) enum Status {
    Ok,
    Empty,
    Error,
    Skipped,
}

impl Status {
    fn as_str(self) -> &'static str {
        match self {
            Self::Ok => "ok",
            Self::Empty => "empty",
            Self::Error => "error",
            Self::Skipped => "skipped",
        }
    }
}

/// History record `{stage, status, at}`.
pub(crate) fn history_record(stage: &str, status: Status) -> HistoryEntry {
    HistoryEntry::new()
        .with("stage", stage)
        .with("status", status.as_str())
        .with("at", chrono::Utc::now().to_rfc3339())
}

/// Re-validate the subject carried in the state.
pub(crate) fn subject_from_state(subject: Option<&str>) -> Result<SubjectId, String> {
    match subject.map(str::trim).filter(|s| !s.is_empty()) {
        Some(raw) => SubjectId::parse(raw).map_err(|e| e.to_string()),
        None => Err("no subject identifier in pipeline state".to_string()),
    }
}
