use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, instrument};

use personakit_shared::Summarizer;

use super::{Status, history_record};
use crate::prompt::PromptBuilder;
use crate::stage::{Stage, StageOutput};
use crate::state::{PipelineState, StateUpdate};

const NOTHING_TO_ANALYZE: &str = "No Reddit posts available to analyze.";

/// Turns the fetched documents into a free-text persona via the summarizer.
pub struct AnalyzeStage {
    summarizer: Arc<dyn Summarizer>,
    prompts: PromptBuilder,
}

impl AnalyzeStage {
    pub const NAME: &'static str = "analyze";

    pub fn new(summarizer: Arc<dyn Summarizer>, prompts: PromptBuilder) -> Self {
        Self { summarizer, prompts }
    }
}

#[async_trait]
impl Stage for AnalyzeStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip_all, fields(stage = Self::NAME, subject = state.subject.as_deref().unwrap_or("")))]
    async fn execute(&self, state: &PipelineState) -> StageOutput {
        if state.documents.is_empty() {
            info!("no documents, skipping analysis");
            // An earlier explanation or error is more specific; leave it alone.
            let response = (state.response.is_none() && state.error.is_none())
                .then(|| NOTHING_TO_ANALYZE.to_string());
            return StageOutput::update(
                StateUpdate {
                    response,
                    ..StateUpdate::default()
                }
                .record(history_record(Self::NAME, Status::Skipped)),
            );
        }

        let username = state.subject.as_deref().unwrap_or_default();
        let prompt = self.prompts.persona_prompt(username, &state.posts, &state.comments);
        info!(prompt_chars = prompt.chars().count(), "requesting persona summary");

        let update = match self.summarizer.summarize(&prompt).await {
            Ok(text) => {
                info!(chars = text.chars().count(), "persona summary received");
                StateUpdate {
                    traits: Some(Value::String(text)),
                    ..StateUpdate::default()
                }
                .record(history_record(Self::NAME, Status::Ok))
            }
            Err(e) => {
                error!(error = %e, "summarizer failed");
                StateUpdate::failed(e.to_string()).record(history_record(Self::NAME, Status::Error))
            }
        };

        StageOutput::update(update)
    }
}
