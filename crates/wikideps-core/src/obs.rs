//! Structured lifecycle events for orchestrator runs.
//!
//! Every run executes inside a [`RunSpan`], so step events carry the
//! `run_id`. Events are emitted at `info!` (failures at `warn!`).

use tracing::{info, warn};

/// RAII guard for a run-scoped tracing span.
///
/// ```ignore
/// let _span = RunSpan::enter(&run_id, "wiki-diagrams");
/// ```
pub struct RunSpan {
    _span: tracing::span::EnteredSpan,
}

impl RunSpan {
    pub fn enter(run_id: &str, plan: &str) -> Self {
        let span = tracing::info_span!("wikideps.run", run_id = %run_id, plan = %plan);
        Self {
            _span: span.entered(),
        }
    }
}

pub fn emit_run_started(run_id: &str, plan: &str, mode: &str, steps: usize) {
    info!(event = "run.started", run_id = %run_id, plan = %plan, mode = %mode, steps = steps);
}

pub fn emit_run_finished(run_id: &str, duration_ms: u64, completed: usize, success: bool) {
    info!(
        event = "run.finished",
        run_id = %run_id,
        duration_ms = duration_ms,
        completed = completed,
        success = success,
    );
}

pub fn emit_step_started(step: &str, action: &str) {
    info!(event = "step.started", step = %step, action = %action);
}

pub fn emit_step_completed(step: &str, action: &str, duration_ms: u64) {
    info!(event = "step.completed", step = %step, action = %action, duration_ms = duration_ms);
}

/// Step failure (warning level)
pub fn emit_step_failed(step: &str, action: &str, error: &dyn std::fmt::Display) {
    warn!(event = "step.failed", step = %step, action = %action, error = %error);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_run_span_create() {
        let _span = RunSpan::enter("test-run-id", "test-plan");
        emit_step_started("Go toolchain", "verify");
    }
}
