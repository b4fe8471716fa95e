use async_trait::async_trait;

use crate::state::{PipelineState, StateUpdate};

/// A single unit of pipeline work.
///
/// A stage reads an immutable snapshot of the state and returns only the
/// fields it computed. It never fails past its own boundary: collaborator
/// errors are written into [`StateUpdate::error`] and the orchestrator moves
/// on. A stage must not assume fields filled by later stages exist.
///
/// # Example
/// ```ignore
/// struct Shout;
///
/// #[async_trait]
/// impl Stage for Shout {
///     fn name(&self) -> &str {
///         "shout"
///     }
///
///     async fn execute(&self, state: &PipelineState) -> StageOutput {
///         let text = state.response.clone().unwrap_or_default().to_uppercase();
///         StageOutput::update(StateUpdate {
///             response: Some(text),
///             ..StateUpdate::default()
///         })
///     }
/// }
/// ```
#[async_trait]
pub trait Stage: Send + Sync {
    /// Stable identifier used in logs, reports and graph rendering.
    fn name(&self) -> &str;

    /// Run the stage against the current snapshot.
    async fn execute(&self, state: &PipelineState) -> StageOutput;
}

/// What a stage hands back to the orchestrator.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct StageOutput {
    /// Fields to merge into the running state.
    pub update: StateUpdate,
    /// Ask the orchestrator to finish after this stage's merge.
    pub terminated: bool,
}

impl StageOutput {
    /// Continue to the next stage after merging `update`.
    pub fn update(update: StateUpdate) -> Self {
        Self {
            update,
            terminated: false,
        }
    }

    /// Merge `update`, then finish the run.
    pub fn terminate(update: StateUpdate) -> Self {
        Self {
            update,
            terminated: true,
        }
    }
}
