//! Pipeline orchestration and domain logic for PersonaKit.
//!
//! A run threads one [`state::PipelineState`] through an ordered chain of
//! [`stage::Stage`]s, merging each stage's partial update with the
//! per-field strategies in [`reducer`]. [`workflow::PersonaWorkflow`] wires
//! the concrete fetch → analyze → format chain.

pub mod graph;
pub mod pipeline;
pub mod prompt;
pub mod reducer;
pub mod stage;
pub mod stages;
pub mod state;
pub mod text;
pub mod workflow;

#[cfg(test)]
mod testing;

pub use pipeline::{
    Pipeline, PipelineBuilder, PipelineConfig, PipelineRun, ProgressReporter, RunPhase,
    SilentProgress, StageReport, StopReason,
};
pub use stage::{Stage, StageOutput};
pub use state::{PipelineState, StateField, StateUpdate};
pub use workflow::{PersonaWorkflow, RunOutcome};
