use std::sync::Arc;

use async_trait::async_trait;
use tracing::{error, info, instrument, warn};

use personakit_shared::{ContentSource, Document, DocumentSource};

use super::{Status, history_record, subject_from_state};
use crate::stage::{Stage, StageOutput};
use crate::state::{PipelineState, StateUpdate};

/// Pulls a subject's recent posts and comments from the content source.
///
/// Outputs `posts`, `comments`, `documents` (posts first, then comments) and
/// `is_aggregated`. Every attempt bumps `fetch_attempts`. When nothing is
/// found, only an explanatory `response` is set.
pub struct FetchStage {
    source: Arc<dyn ContentSource>,
    limit: u32,
}

impl FetchStage {
    pub const NAME: &'static str = "fetch";

    pub fn new(source: Arc<dyn ContentSource>, limit: u32) -> Self {
        Self { source, limit }
    }
}

#[async_trait]
impl Stage for FetchStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip_all, fields(stage = Self::NAME, subject = state.subject.as_deref().unwrap_or("")))]
    async fn execute(&self, state: &PipelineState) -> StageOutput {
        let subject = match subject_from_state(state.subject.as_deref()) {
            Ok(subject) => subject,
            Err(reason) => {
                warn!(%reason, "cannot fetch without a valid subject");
                return StageOutput::update(
                    StateUpdate {
                        is_subject_valid: Some(false),
                        ..StateUpdate::failed(reason)
                    }
                    .record(history_record(Self::NAME, Status::Error)),
                );
            }
        };

        info!(limit = self.limit, "fetching user content");

        let update = match self.source.fetch(&subject, self.limit).await {
            Ok(content) if content.is_empty() => {
                warn!("no content found for subject");
                StateUpdate {
                    response: Some(format!("Could not find any Reddit posts for user '{subject}'.")),
                    fetch_attempts: Some(1),
                    ..StateUpdate::default()
                }
                .record(history_record(Self::NAME, Status::Empty))
            }
            Ok(content) => {
                let documents: Vec<Document> = content
                    .posts
                    .iter()
                    .map(|p| Document::new(p.clone(), DocumentSource::Post))
                    .chain(
                        content
                            .comments
                            .iter()
                            .map(|c| Document::new(c.clone(), DocumentSource::Comment)),
                    )
                    .collect();

                info!(
                    posts = content.posts.len(),
                    comments = content.comments.len(),
                    documents = documents.len(),
                    "fetched user content"
                );

                StateUpdate {
                    posts: Some(content.posts),
                    comments: Some(content.comments),
                    documents: Some(documents),
                    is_aggregated: Some(true),
                    fetch_attempts: Some(1),
                    ..StateUpdate::default()
                }
                .record(history_record(Self::NAME, Status::Ok))
            }
            Err(e) => {
                error!(error = %e, "content source failed");
                StateUpdate {
                    fetch_attempts: Some(1),
                    ..StateUpdate::failed(e.to_string())
                }
                .record(history_record(Self::NAME, Status::Error))
            }
        };

        StageOutput::update(update)
    }
}
