//! The state container threaded through the pipeline and the partial
//! updates stages return.
//!
//! [`PipelineState::merge`] is the only way a container changes: it
//! consumes the current value and returns the next one, folding each field
//! of a [`StateUpdate`] in with the strategy [`StateField::strategy`] assigns
//! to it. The update is destructured exhaustively, so a new field cannot be
//! added without also choosing how it merges.

use serde_json::Value;

use personakit_shared::{Document, HistoryEntry, SubjectId};

use crate::reducer::{self, HISTORY_LIMIT, MergeStrategy};

// ---------------------------------------------------------------------------
// PipelineState
// ---------------------------------------------------------------------------

/// Full typed record of one pipeline invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct PipelineState {
    /// Platform username the run is about.
    pub subject: Option<String>,
    /// Recent submissions, rendered as text.
    pub posts: Vec<String>,
    /// Recent comment bodies.
    pub comments: Vec<String>,
    /// Posts followed by comments, as documents for analysis.
    pub documents: Vec<Document>,
    /// Model output awaiting formatting.
    pub traits: Option<Value>,
    /// Final persona text (the terminal field).
    pub response: Option<String>,
    /// Last failure recorded by a stage.
    pub error: Option<String>,
    /// Bounded log of stage records, newest last.
    pub history: Vec<HistoryEntry>,
    /// Number of content fetches attempted.
    pub fetch_attempts: u64,
    pub is_subject_valid: bool,
    pub is_aggregated: bool,
    pub is_saved: bool,
}

impl Default for PipelineState {
    fn default() -> Self {
        Self {
            subject: None,
            posts: Vec::new(),
            comments: Vec::new(),
            documents: Vec::new(),
            traits: None,
            response: None,
            error: None,
            history: Vec::new(),
            fetch_attempts: 0,
            is_subject_valid: true,
            is_aggregated: false,
            is_saved: false,
        }
    }
}

impl PipelineState {
    /// Initial container: only the subject identifier is populated.
    pub fn seeded(subject: &SubjectId) -> Self {
        Self {
            subject: Some(subject.to_string()),
            ..Self::default()
        }
    }

    /// Fold a partial update into this state, producing the next state.
    pub fn merge(self, update: StateUpdate) -> Self {
        let StateUpdate {
            subject,
            posts,
            comments,
            documents,
            traits,
            response,
            error,
            history,
            fetch_attempts,
            is_subject_valid,
            is_aggregated,
            is_saved,
        } = update;

        Self {
            subject: reducer::replace_if_present(self.subject, subject.map(Some)),
            posts: reducer::replace_if_present(self.posts, posts),
            comments: reducer::replace_if_present(self.comments, comments),
            documents: reducer::replace_if_present(self.documents, documents),
            traits: reducer::replace_if_present(self.traits, traits.map(Some)),
            response: reducer::replace_if_present(self.response, response.map(Some)),
            error: reducer::replace_if_present(self.error, error.map(Some)),
            history: reducer::append_then_trim(self.history, history, HISTORY_LIMIT),
            fetch_attempts: reducer::increment_by_one(self.fetch_attempts, fetch_attempts),
            is_subject_valid: reducer::replace_if_present(self.is_subject_valid, is_subject_valid),
            is_aggregated: reducer::replace_if_present(self.is_aggregated, is_aggregated),
            is_saved: reducer::replace_if_present(self.is_saved, is_saved),
        }
    }

    /// The terminal output, if it carries any text.
    pub fn output(&self) -> Option<&str> {
        self.response.as_deref().filter(|s| !s.trim().is_empty())
    }
}

// ---------------------------------------------------------------------------
// StateUpdate
// ---------------------------------------------------------------------------

/// A partial record: `None` (or an empty `history`) means "not touched".
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StateUpdate {
    pub subject: Option<String>,
    pub posts: Option<Vec<String>>,
    pub comments: Option<Vec<String>>,
    pub documents: Option<Vec<Document>>,
    pub traits: Option<Value>,
    pub response: Option<String>,
    pub error: Option<String>,
    /// Records to append to the history log.
    pub history: Vec<HistoryEntry>,
    /// Any `Some` counts as one increment; the carried value is ignored.
    pub fetch_attempts: Option<u64>,
    pub is_subject_valid: Option<bool>,
    pub is_aggregated: Option<bool>,
    pub is_saved: Option<bool>,
}

impl StateUpdate {
    /// An update that only records a failure.
    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            error: Some(error.into()),
            ..Self::default()
        }
    }

    /// Append a history record to this update.
    pub fn record(mut self, entry: HistoryEntry) -> Self {
        self.history.push(entry);
        self
    }

    /// Fields this update would change on merge, in declaration order.
    pub fn touched_fields(&self) -> Vec<StateField> {
        StateField::ALL
            .into_iter()
            .filter(|field| match field {
                StateField::Subject => self.subject.is_some(),
                StateField::Posts => self.posts.is_some(),
                StateField::Comments => self.comments.is_some(),
                StateField::Documents => self.documents.is_some(),
                StateField::Traits => self.traits.is_some(),
                StateField::Response => self.response.is_some(),
                StateField::Error => self.error.is_some(),
                StateField::History => !self.history.is_empty(),
                StateField::FetchAttempts => self.fetch_attempts.is_some(),
                StateField::IsSubjectValid => self.is_subject_valid.is_some(),
                StateField::IsAggregated => self.is_aggregated.is_some(),
                StateField::IsSaved => self.is_saved.is_some(),
            })
            .collect()
    }

    pub fn is_empty(&self) -> bool {
        self.touched_fields().is_empty()
    }
}

// ---------------------------------------------------------------------------
// StateField
// ---------------------------------------------------------------------------

/// Names every field of [`PipelineState`] and binds it to one strategy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum StateField {
    Subject,
    Posts,
    Comments,
    Documents,
    Traits,
    Response,
    Error,
    History,
    FetchAttempts,
    IsSubjectValid,
    IsAggregated,
    IsSaved,
}

impl StateField {
    pub const ALL: [StateField; 12] = [
        Self::Subject,
        Self::Posts,
        Self::Comments,
        Self::Documents,
        Self::Traits,
        Self::Response,
        Self::Error,
        Self::History,
        Self::FetchAttempts,
        Self::IsSubjectValid,
        Self::IsAggregated,
        Self::IsSaved,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Self::Subject => "subject",
            Self::Posts => "posts",
            Self::Comments => "comments",
            Self::Documents => "documents",
            Self::Traits => "traits",
            Self::Response => "response",
            Self::Error => "error",
            Self::History => "history",
            Self::FetchAttempts => "fetch_attempts",
            Self::IsSubjectValid => "is_subject_valid",
            Self::IsAggregated => "is_aggregated",
            Self::IsSaved => "is_saved",
        }
    }

    /// The strategy [`PipelineState::merge`] applies to this field.
    pub fn strategy(self) -> MergeStrategy {
        match self {
            Self::History => MergeStrategy::AppendThenTrim {
                max_len: HISTORY_LIMIT,
            },
            Self::FetchAttempts => MergeStrategy::IncrementByOne,
            Self::Subject
            | Self::Posts
            | Self::Comments
            | Self::Documents
            | Self::Traits
            | Self::Response
            | Self::Error
            | Self::IsSubjectValid
            | Self::IsAggregated
            | Self::IsSaved => MergeStrategy::ReplaceIfPresent,
        }
    }
}

impl std::fmt::Display for StateField {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use personakit_shared::DocumentSource;
    use proptest::prelude::*;

    fn entry(n: usize) -> HistoryEntry {
        HistoryEntry::new().with("n", n.to_string())
    }

    fn populated() -> PipelineState {
        PipelineState {
            subject: Some("alice".into()),
            posts: vec!["Title: a\nBody: b".into()],
            comments: vec!["c".into()],
            documents: vec![Document::new("c", DocumentSource::Comment)],
            traits: Some(Value::String("curious".into())),
            response: Some("Alice is curious.".into()),
            error: Some("earlier failure".into()),
            history: vec![entry(0)],
            fetch_attempts: 3,
            is_subject_valid: true,
            is_aggregated: true,
            is_saved: false,
        }
    }

    #[test]
    fn seeded_state_only_has_subject() {
        let subject = SubjectId::parse("alice").unwrap();
        let state = PipelineState::seeded(&subject);
        assert_eq!(state.subject.as_deref(), Some("alice"));
        assert_eq!(
            state,
            PipelineState {
                subject: Some("alice".into()),
                ..PipelineState::default()
            }
        );
    }

    #[test]
    fn empty_update_is_noop() {
        let state = populated();
        assert_eq!(state.clone().merge(StateUpdate::default()), state);
    }

    #[test]
    fn replace_fields_take_new_values() {
        let next = populated().merge(StateUpdate {
            posts: Some(vec![]),
            response: Some("new".into()),
            is_saved: Some(true),
            ..StateUpdate::default()
        });
        assert!(next.posts.is_empty());
        assert_eq!(next.response.as_deref(), Some("new"));
        assert!(next.is_saved);
        // untouched
        assert_eq!(next.comments, vec!["c".to_string()]);
        assert_eq!(next.error.as_deref(), Some("earlier failure"));
    }

    #[test]
    fn history_is_bounded_fifo() {
        let mut state = PipelineState::default();
        for n in 0..8 {
            state = state.merge(StateUpdate::default().record(entry(n)));
        }
        assert_eq!(state.history.len(), HISTORY_LIMIT);
        let kept: Vec<_> = state.history.iter().map(|e| e.get("n").unwrap()).collect();
        assert_eq!(kept, vec!["3", "4", "5", "6", "7"]);
    }

    #[test]
    fn counter_ignores_carried_value() {
        let state = PipelineState::default()
            .merge(StateUpdate {
                fetch_attempts: Some(100),
                ..StateUpdate::default()
            })
            .merge(StateUpdate {
                fetch_attempts: Some(0),
                ..StateUpdate::default()
            });
        assert_eq!(state.fetch_attempts, 2);
    }

    #[test]
    fn touched_fields_lists_only_present() {
        let update = StateUpdate::failed("boom").record(entry(1));
        assert_eq!(update.touched_fields(), vec![StateField::Error, StateField::History]);
        assert!(StateUpdate::default().is_empty());
    }

    #[test]
    fn strategy_table() {
        for field in StateField::ALL {
            let expected = match field {
                StateField::History => MergeStrategy::AppendThenTrim { max_len: 5 },
                StateField::FetchAttempts => MergeStrategy::IncrementByOne,
                _ => MergeStrategy::ReplaceIfPresent,
            };
            assert_eq!(field.strategy(), expected, "field {field}");
        }
    }

    /// An update that touches only `field`, carrying a value derived from `n`.
    fn touching(field: StateField, n: usize) -> StateUpdate {
        let text = format!("{field}-{n}");
        let flag = n % 2 == 1;
        let mut update = StateUpdate::default();
        match field {
            StateField::Subject => update.subject = Some(text),
            StateField::Posts => update.posts = Some(vec![text]),
            StateField::Comments => update.comments = Some(vec![text]),
            StateField::Documents => update.documents = Some(vec![Document::new(text, DocumentSource::Post)]),
            StateField::Traits => update.traits = Some(Value::String(text)),
            StateField::Response => update.response = Some(text),
            StateField::Error => update.error = Some(text),
            StateField::History => update.history = vec![entry(n)],
            StateField::FetchAttempts => update.fetch_attempts = Some(n as u64),
            StateField::IsSubjectValid => update.is_subject_valid = Some(flag),
            StateField::IsAggregated => update.is_aggregated = Some(flag),
            StateField::IsSaved => update.is_saved = Some(flag),
        }
        update
    }

    /// Debug rendering of one field, for comparing merge results.
    fn observe(state: &PipelineState, field: StateField) -> String {
        match field {
            StateField::Subject => format!("{:?}", state.subject),
            StateField::Posts => format!("{:?}", state.posts),
            StateField::Comments => format!("{:?}", state.comments),
            StateField::Documents => format!("{:?}", state.documents),
            StateField::Traits => format!("{:?}", state.traits),
            StateField::Response => format!("{:?}", state.response),
            StateField::Error => format!("{:?}", state.error),
            StateField::History => format!("{:?}", state.history),
            StateField::FetchAttempts => format!("{:?}", state.fetch_attempts),
            StateField::IsSubjectValid => format!("{:?}", state.is_subject_valid),
            StateField::IsAggregated => format!("{:?}", state.is_aggregated),
            StateField::IsSaved => format!("{:?}", state.is_saved),
        }
    }

    #[test]
    fn merge_behaves_as_each_field_strategy_declares() {
        let merged = |updates: Vec<StateUpdate>| {
            updates
                .into_iter()
                .fold(PipelineState::default(), PipelineState::merge)
        };

        for field in StateField::ALL {
            match field.strategy() {
                MergeStrategy::ReplaceIfPresent => {
                    let both = merged(vec![touching(field, 1), touching(field, 2)]);
                    let last_only = merged(vec![touching(field, 2)]);
                    let first_only = merged(vec![touching(field, 1)]);
                    assert_eq!(observe(&both, field), observe(&last_only, field), "field {field}");
                    assert_ne!(observe(&both, field), observe(&first_only, field), "field {field}");

                    let kept = merged(vec![touching(field, 1), StateUpdate::default()]);
                    assert_eq!(observe(&kept, field), observe(&first_only, field), "field {field}");
                }
                MergeStrategy::AppendThenTrim { max_len } => {
                    let two = merged(vec![touching(field, 1), touching(field, 2)]);
                    assert_eq!(two.history.len(), 2, "field {field}");

                    let many = merged((0..max_len + 3).map(|n| touching(field, n)).collect());
                    assert_eq!(many.history.len(), max_len, "field {field}");
                    let newest = merged(vec![touching(field, max_len + 2)]);
                    assert_eq!(many.history.last(), newest.history.last(), "field {field}");
                }
                MergeStrategy::IncrementByOne => {
                    let counted = merged(vec![touching(field, 7), touching(field, 0)]);
                    assert_eq!(observe(&counted, field), "2", "field {field}");
                    let skipped = merged(vec![touching(field, 7), StateUpdate::default()]);
                    assert_eq!(observe(&skipped, field), "1", "field {field}");
                }
            }
        }
    }

    #[test]
    fn output_ignores_blank_response() {
        let mut state = PipelineState::default();
        assert_eq!(state.output(), None);
        state.response = Some("   ".into());
        assert_eq!(state.output(), None);
        state.response = Some("Alice is curious.".into());
        assert_eq!(state.output(), Some("Alice is curious."));
    }

    fn arb_update() -> impl Strategy<Value = StateUpdate> {
        (
            any::<Option<String>>(),
            any::<Option<Vec<String>>>(),
            any::<Option<String>>(),
            any::<Option<String>>(),
            prop::collection::vec(any::<u8>(), 0..3),
            any::<Option<u64>>(),
            any::<Option<bool>>(),
        )
            .prop_map(|(subject, posts, response, error, hist, attempts, aggregated)| {
                StateUpdate {
                    subject,
                    posts,
                    response,
                    error,
                    history: hist.into_iter().map(|n| entry(n as usize)).collect(),
                    fetch_attempts: attempts,
                    is_aggregated: aggregated,
                    ..StateUpdate::default()
                }
            })
    }

    proptest! {
        #[test]
        fn omitted_fields_never_change(update in arb_update()) {
            let before = populated();
            let touched = update.touched_fields();
            let after = before.clone().merge(update);

            if !touched.contains(&StateField::Comments) {
                prop_assert_eq!(&after.comments, &before.comments);
            }
            if !touched.contains(&StateField::Documents) {
                prop_assert_eq!(&after.documents, &before.documents);
            }
            if !touched.contains(&StateField::Traits) {
                prop_assert_eq!(&after.traits, &before.traits);
            }
            if !touched.contains(&StateField::Subject) {
                prop_assert_eq!(&after.subject, &before.subject);
            }
            if !touched.contains(&StateField::Response) {
                prop_assert_eq!(&after.response, &before.response);
            }
            if !touched.contains(&StateField::Error) {
                prop_assert_eq!(&after.error, &before.error);
            }
            if !touched.contains(&StateField::FetchAttempts) {
                prop_assert_eq!(after.fetch_attempts, before.fetch_attempts);
            }
            prop_assert_eq!(after.is_saved, before.is_saved);
            prop_assert!(after.history.len() <= HISTORY_LIMIT);
        }
    }
}
