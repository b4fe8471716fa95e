//! The persona workflow: `fetch → analyze → format` over one subject.
//!
//! This is the single entry point callers (the CLI, an HTTP layer) use. It
//! owns a built [`Pipeline`] and maps the terminal state to a [`RunOutcome`].

use std::sync::Arc;

use tracing::{info, instrument, warn};

use personakit_shared::{
    AppConfig, ContentSource, PersistenceSink, Result, SubjectId, Summarizer,
};

use crate::pipeline::{Pipeline, PipelineConfig, PipelineRun, ProgressReporter, SilentProgress};
use crate::prompt::PromptBuilder;
use crate::stages::{AnalyzeStage, FetchStage, FormatStage};
use crate::state::PipelineState;

/// Fallback error text when a run produced neither output nor a descriptor.
pub const GENERIC_FAILURE: &str = "Persona generation failed";

/// What a caller gets back once the pipeline reaches DONE.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    Output { text: String },
    Error { text: String },
}

impl RunOutcome {
    /// The output field wins when it is non-blank; otherwise surface the
    /// error descriptor.
    pub fn from_state(state: &PipelineState) -> Self {
        match state.output() {
            Some(text) => Self::Output {
                text: text.to_string(),
            },
            None => Self::Error {
                text: state
                    .error
                    .clone()
                    .unwrap_or_else(|| GENERIC_FAILURE.to_string()),
            },
        }
    }

    pub fn is_output(&self) -> bool {
        matches!(self, Self::Output { .. })
    }

    pub fn text(&self) -> &str {
        match self {
            Self::Output { text } | Self::Error { text } => text,
        }
    }
}

/// Pre-wired persona pipeline.
#[derive(Debug)]
pub struct PersonaWorkflow {
    pipeline: Pipeline,
}

impl PersonaWorkflow {
    pub const PIPELINE_NAME: &'static str = "persona";

    /// Stage names in execution order.
    pub const STAGES: [&'static str; 3] = [FetchStage::NAME, AnalyzeStage::NAME, FormatStage::NAME];

    /// Wire the three stages to their collaborators. Orchestrator settings
    /// and stage parameters come from `config`.
    pub fn new(
        config: &AppConfig,
        source: Arc<dyn ContentSource>,
        summarizer: Arc<dyn Summarizer>,
        sink: Arc<dyn PersistenceSink>,
    ) -> Result<Self> {
        let pipeline = Pipeline::builder(Self::PIPELINE_NAME)
            .config(PipelineConfig::from(config))
            .add_stage(FetchStage::new(source, config.defaults.fetch_limit))
            .add_stage(AnalyzeStage::new(
                summarizer,
                PromptBuilder::new(config.llm.max_prompt_chars),
            ))
            .add_stage(FormatStage::new(sink))
            .build()?;

        Ok(Self { pipeline })
    }

    pub fn pipeline(&self) -> &Pipeline {
        &self.pipeline
    }

    /// Generate a persona for `subject`.
    pub async fn run(&self, subject: &SubjectId) -> RunOutcome {
        let run = self.run_with_progress(subject, &SilentProgress).await;
        RunOutcome::from_state(&run.state)
    }

    /// Like [`run`](Self::run) but reports progress and returns the full
    /// run record.
    #[instrument(skip_all, fields(subject = %subject))]
    pub async fn run_with_progress(
        &self,
        subject: &SubjectId,
        progress: &dyn ProgressReporter,
    ) -> PipelineRun {
        let run = self
            .pipeline
            .execute_with_progress(PipelineState::seeded(subject), progress)
            .await;

        match run.state.output() {
            Some(_) => info!(run_id = %run.run_id, saved = run.state.is_saved, "persona run finished"),
            None => warn!(
                run_id = %run.run_id,
                error = run.state.error.as_deref().unwrap_or(GENERIC_FAILURE),
                "persona run produced no output"
            ),
        }
        run
    }
}
