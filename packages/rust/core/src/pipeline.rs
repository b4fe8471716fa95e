//! Pipeline orchestrator: drives an ordered chain of stages over one state
//! container.
//!
//! ```text
//! PENDING ─► RUNNING(0) ─► RUNNING(1) ─► … ─► RUNNING(last) ─► DONE
//! ```
//!
//! Each step hands the active stage an immutable snapshot, merges the
//! returned partial update exactly once, then advances. The orchestrator
//! performs no business logic of its own; it only sequences and merges.

use std::time::{Duration, Instant};

use tracing::{Span, debug, info, instrument, warn};

use personakit_shared::{AppConfig, FailurePolicy, PersonaKitError, Result, RunId};

use crate::stage::Stage;
use crate::state::{PipelineState, StateField};

// ---------------------------------------------------------------------------
// Configuration
// ---------------------------------------------------------------------------

/// Orchestrator settings, passed in at construction time.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct PipelineConfig {
    pub failure_policy: FailurePolicy,
}

impl From<&AppConfig> for PipelineConfig {
    fn from(config: &AppConfig) -> Self {
        Self {
            failure_policy: config.defaults.failure_policy,
        }
    }
}

// ---------------------------------------------------------------------------
// Run bookkeeping
// ---------------------------------------------------------------------------

/// Orchestrator state machine.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunPhase {
    Pending,
    Running(usize),
    Done,
}

/// Why a run reached [`RunPhase::Done`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StopReason {
    /// Every stage ran.
    Completed,
    /// A stage returned `terminated = true`.
    Terminated { stage: String },
    /// [`FailurePolicy::HaltOnError`] stopped the chain after this stage.
    HaltedOnError { stage: String },
}

/// Outcome of one stage invocation.
#[derive(Debug, Clone)]
pub struct StageReport {
    pub stage_name: String,
    pub duration: Duration,
    /// Error descriptor the stage's update carried, if any.
    pub error: Option<String>,
    /// Fields the stage's update touched.
    pub fields: Vec<StateField>,
    pub terminated: bool,
}

impl StageReport {
    pub fn success(&self) -> bool {
        self.error.is_none()
    }
}

/// Result of a complete pipeline execution.
#[derive(Debug, Clone)]
pub struct PipelineRun {
    pub run_id: RunId,
    pub pipeline_name: String,
    /// Terminal state container.
    pub state: PipelineState,
    pub stage_reports: Vec<StageReport>,
    pub total_duration: Duration,
    /// Lifecycle phase reached; `Done` once execution returns.
    pub phase: RunPhase,
    pub stop_reason: StopReason,
}

impl PipelineRun {
    /// Number of stages that were invoked.
    pub fn executed_stages(&self) -> usize {
        self.stage_reports.len()
    }

    /// First stage whose update recorded an error.
    pub fn failed_stage(&self) -> Option<&StageReport> {
        self.stage_reports.iter().find(|r| !r.success())
    }
}

// ---------------------------------------------------------------------------
// Progress reporting
// ---------------------------------------------------------------------------

/// Progress callback for reporting pipeline status.
pub trait ProgressReporter: Send + Sync {
    /// Called before a stage is invoked.
    fn stage_started(&self, name: &str, index: usize, total: usize);
    /// Called after a stage's update has been merged.
    fn stage_finished(&self, report: &StageReport);
    /// Called once the run reaches DONE.
    fn done(&self, run: &PipelineRun);
}

/// No-op progress reporter for headless/test usage.
pub struct SilentProgress;

impl ProgressReporter for SilentProgress {
    fn stage_started(&self, _name: &str, _index: usize, _total: usize) {}
    fn stage_finished(&self, _report: &StageReport) {}
    fn done(&self, _run: &PipelineRun) {}
}

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// A linear chain of stages with a single start and a single end.
pub struct Pipeline {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    config: PipelineConfig,
}

impl std::fmt::Debug for Pipeline {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Pipeline")
            .field("name", &self.name)
            .field("stages", &self.stage_names())
            .field("config", &self.config)
            .finish()
    }
}

impl Pipeline {
    pub fn builder(name: impl Into<String>) -> PipelineBuilder {
        PipelineBuilder::new(name)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn stage_count(&self) -> usize {
        self.stages.len()
    }

    /// Stage names in execution order.
    pub fn stage_names(&self) -> Vec<&str> {
        self.stages.iter().map(|s| s.name()).collect()
    }

    pub fn config(&self) -> &PipelineConfig {
        &self.config
    }

    /// Run every stage without progress reporting.
    pub async fn execute(&self, initial: PipelineState) -> PipelineRun {
        self.execute_with_progress(initial, &SilentProgress).await
    }

    /// Run the chain from `initial` to DONE.
    ///
    /// Stages execute strictly in declaration order. Under
    /// [`FailurePolicy::Continue`] a recorded error does not stop the chain;
    /// under [`FailurePolicy::HaltOnError`] the run finishes right after the
    /// merge of the first update carrying an error. A stage's `terminated`
    /// flag finishes the run after its merge under either policy.
    #[instrument(skip_all, fields(pipeline = %self.name, run_id = tracing::field::Empty))]
    pub async fn execute_with_progress(
        &self,
        initial: PipelineState,
        progress: &dyn ProgressReporter,
    ) -> PipelineRun {
        let run_id = RunId::new();
        Span::current().record("run_id", tracing::field::display(&run_id));

        let start = Instant::now();
        let total = self.stages.len();
        let mut phase = RunPhase::Pending;
        let mut state = initial;
        let mut reports = Vec::with_capacity(total);
        let mut stop_reason = StopReason::Completed;

        info!(?phase, stages = total, policy = ?self.config.failure_policy, "starting pipeline");

        for (index, stage) in self.stages.iter().enumerate() {
            phase = RunPhase::Running(index);
            debug!(?phase, stage = stage.name(), "transition");
            progress.stage_started(stage.name(), index, total);

            let stage_start = Instant::now();
            let output = stage.execute(&state).await;
            let duration = stage_start.elapsed();

            let report = StageReport {
                stage_name: stage.name().to_string(),
                duration,
                error: output.update.error.clone(),
                fields: output.update.touched_fields(),
                terminated: output.terminated,
            };

            state = state.merge(output.update);

            match &report.error {
                Some(error) => warn!(
                    stage = %report.stage_name,
                    %error,
                    elapsed_ms = duration.as_millis(),
                    "stage recorded an error"
                ),
                None => info!(
                    stage = %report.stage_name,
                    fields = ?report.fields,
                    elapsed_ms = duration.as_millis(),
                    "stage complete"
                ),
            }

            progress.stage_finished(&report);

            let halt = report.error.is_some()
                && self.config.failure_policy == FailurePolicy::HaltOnError;
            let terminated = report.terminated;
            let stage_name = report.stage_name.clone();
            reports.push(report);

            if terminated {
                stop_reason = StopReason::Terminated { stage: stage_name };
                break;
            }
            if halt {
                stop_reason = StopReason::HaltedOnError { stage: stage_name };
                break;
            }
        }

        phase = RunPhase::Done;

        let run = PipelineRun {
            run_id,
            pipeline_name: self.name.clone(),
            state,
            stage_reports: reports,
            total_duration: start.elapsed(),
            phase,
            stop_reason,
        };

        info!(
            phase = ?run.phase,
            executed = run.executed_stages(),
            stop = ?run.stop_reason,
            elapsed_ms = run.total_duration.as_millis(),
            "pipeline complete"
        );

        progress.done(&run);
        run
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builder for [`Pipeline`].
pub struct PipelineBuilder {
    name: String,
    stages: Vec<Box<dyn Stage>>,
    config: PipelineConfig,
}

impl PipelineBuilder {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            stages: Vec::new(),
            config: PipelineConfig::default(),
        }
    }

    /// Append a stage to the end of the chain.
    pub fn add_stage(mut self, stage: impl Stage + 'static) -> Self {
        self.stages.push(Box::new(stage));
        self
    }

    pub fn config(mut self, config: PipelineConfig) -> Self {
        self.config = config;
        self
    }

    pub fn failure_policy(mut self, policy: FailurePolicy) -> Self {
        self.config.failure_policy = policy;
        self
    }

    /// Validate and build. A pipeline needs at least one stage, and stage
    /// names must be unique.
    pub fn build(self) -> Result<Pipeline> {
        if self.stages.is_empty() {
            return Err(PersonaKitError::Pipeline(format!(
                "pipeline '{}' has no stages",
                self.name
            )));
        }

        let mut seen = std::collections::HashSet::new();
        for stage in &self.stages {
            if !seen.insert(stage.name()) {
                return Err(PersonaKitError::Pipeline(format!(
                    "pipeline '{}' has duplicate stage '{}'",
                    self.name,
                    stage.name()
                )));
            }
        }

        Ok(Pipeline {
            name: self.name,
            stages: self.stages,
            config: self.config,
        })
    }
}
