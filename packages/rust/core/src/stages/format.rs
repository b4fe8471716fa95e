use std::sync::Arc;

use async_trait::async_trait;
use serde_json::Value;
use tracing::{error, info, instrument, warn};

use personakit_shared::PersistenceSink;

use super::{Status, history_record, subject_from_state};
use crate::stage::{Stage, StageOutput};
use crate::state::{PipelineState, StateUpdate};

const MISSING_TRAITS: &str = "Unable to generate persona summary due to missing traits.";

/// Renders the traits as the final output and hands it to the sink.
pub struct FormatStage {
    sink: Arc<dyn PersistenceSink>,
}

impl FormatStage {
    pub const NAME: &'static str = "format";

    pub fn new(sink: Arc<dyn PersistenceSink>) -> Self {
        Self { sink }
    }
}

fn render(traits: &Value) -> String {
    match traits {
        Value::String(text) => text.clone(),
        other => other.to_string(),
    }
}

#[async_trait]
impl Stage for FormatStage {
    fn name(&self) -> &str {
        Self::NAME
    }

    #[instrument(skip_all, fields(stage = Self::NAME, subject = state.subject.as_deref().unwrap_or("")))]
    async fn execute(&self, state: &PipelineState) -> StageOutput {
        let Some(traits) = &state.traits else {
            info!("no traits, nothing to format");
            let response = (state.response.is_none() && state.error.is_none())
                .then(|| MISSING_TRAITS.to_string());
            return StageOutput::update(
                StateUpdate {
                    response,
                    ..StateUpdate::default()
                }
                .record(history_record(Self::NAME, Status::Skipped)),
            );
        };

        let subject = match subject_from_state(state.subject.as_deref()) {
            Ok(subject) => subject,
            Err(reason) => {
                warn!(%reason, "cannot save without a valid subject");
                return StageOutput::update(
                    StateUpdate::failed(reason).record(history_record(Self::NAME, Status::Error)),
                );
            }
        };

        let text = render(traits);
        let update = match self.sink.save(&subject, &text).await {
            Ok(path) => {
                info!(path = %path.display(), "persona saved");
                StateUpdate {
                    response: Some(text),
                    is_saved: Some(true),
                    ..StateUpdate::default()
                }
                .record(history_record(Self::NAME, Status::Ok))
            }
            Err(e) => {
                error!(error = %e, "failed to save persona");
                StateUpdate::failed(e.to_string()).record(history_record(Self::NAME, Status::Error))
            }
        };

        StageOutput::update(update)
    }
}
