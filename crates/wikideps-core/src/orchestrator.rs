//! Fail-fast sequencing of named dependency steps
//!
//! Steps run strictly in declaration order on the calling thread. The first
//! failure ends the run and is attributed to its step; later steps are never
//! touched. There is no partial success.

use std::time::Instant;

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::error::DepsError;
use crate::obs::{
    emit_run_finished, emit_run_started, emit_step_completed, emit_step_failed,
    emit_step_started, RunSpan,
};
use crate::resource::Dependency;
use crate::Result;

/// How a run treats its steps
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    /// `ensure` every step, then verify them all again
    Full,
    /// `verify` every step; nothing is installed
    VerifyOnly,
    /// `verify` only the steps that need no elevated privilege
    Minimal,
}

impl std::fmt::Display for Mode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Mode::Full => "full",
            Mode::VerifyOnly => "verify_only",
            Mode::Minimal => "minimal",
        };
        f.write_str(name)
    }
}

/// What was done to a step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum StepAction {
    Ensured,
    Verified,
}

impl StepAction {
    fn as_str(self) -> &'static str {
        match self {
            StepAction::Ensured => "ensure",
            StepAction::Verified => "verify",
        }
    }
}

/// A named unit of work in a plan
pub struct DependencyStep {
    pub name: String,
    /// Needs root (package manager, system directories)
    pub privileged: bool,
    pub dependency: Box<dyn Dependency>,
}

impl DependencyStep {
    pub fn new(name: impl Into<String>, dependency: impl Dependency + 'static) -> Self {
        DependencyStep {
            name: name.into(),
            privileged: false,
            dependency: Box::new(dependency),
        }
    }

    pub fn privileged(mut self) -> Self {
        self.privileged = true;
        self
    }
}

/// A step that completed successfully
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StepOutcome {
    pub step: String,
    pub action: StepAction,
    pub duration_ms: u64,
}

/// Summary of a successful run, serialisable for `--json`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunReport {
    pub run_id: Uuid,
    pub plan: String,
    pub mode: Mode,
    pub steps: Vec<StepOutcome>,
    pub started_at: DateTime<Utc>,
    pub finished_at: DateTime<Utc>,
}

/// Ordered list of named steps
pub struct Orchestrator {
    name: String,
    steps: Vec<DependencyStep>,
}

impl Orchestrator {
    pub fn new(name: impl Into<String>) -> Self {
        Orchestrator {
            name: name.into(),
            steps: Vec::new(),
        }
    }

    pub fn step(mut self, step: DependencyStep) -> Self {
        self.steps.push(step);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Step names in run order
    pub fn step_names(&self) -> Vec<&str> {
        self.steps.iter().map(|s| s.name.as_str()).collect()
    }

    /// Run every applicable step, stopping at the first failure.
    pub fn run(&self, mode: Mode) -> Result<RunReport> {
        let run_id = Uuid::new_v4();
        let run_id_str = run_id.to_string();
        let _span = RunSpan::enter(&run_id_str, &self.name);

        let started_at = Utc::now();
        let clock = Instant::now();
        emit_run_started(&run_id_str, &self.name, &mode.to_string(), self.steps.len());

        let mut outcomes = Vec::new();
        let result = self.drive(mode, &mut outcomes);

        let duration_ms = clock.elapsed().as_millis() as u64;
        emit_run_finished(&run_id_str, duration_ms, outcomes.len(), result.is_ok());
        result?;

        Ok(RunReport {
            run_id,
            plan: self.name.clone(),
            mode,
            steps: outcomes,
            started_at,
            finished_at: Utc::now(),
        })
    }

    fn drive(&self, mode: Mode, outcomes: &mut Vec<StepOutcome>) -> Result<()> {
        match mode {
            Mode::Full => {
                for step in &self.steps {
                    outcomes.push(run_step(step, StepAction::Ensured)?);
                }
                tracing::info!("running post-install verification");
                for step in &self.steps {
                    outcomes.push(run_step(step, StepAction::Verified)?);
                }
            }
            Mode::VerifyOnly => {
                for step in &self.steps {
                    outcomes.push(run_step(step, StepAction::Verified)?);
                }
            }
            Mode::Minimal => {
                for step in self.steps.iter().filter(|s| !s.privileged) {
                    outcomes.push(run_step(step, StepAction::Verified)?);
                }
            }
        }
        Ok(())
    }
}

fn run_step(step: &DependencyStep, action: StepAction) -> Result<StepOutcome> {
    emit_step_started(&step.name, action.as_str());
    let clock = Instant::now();

    let result = match action {
        StepAction::Ensured => step.dependency.ensure(),
        StepAction::Verified => step.dependency.verify(),
    };

    let duration_ms = clock.elapsed().as_millis() as u64;
    match result {
        Ok(()) => {
            emit_step_completed(&step.name, action.as_str(), duration_ms);
            Ok(StepOutcome {
                step: step.name.clone(),
                action,
                duration_ms,
            })
        }
        Err(e) => {
            emit_step_failed(&step.name, action.as_str(), &e);
            Err(DepsError::StepFailed {
                step: step.name.clone(),
                source: Box::new(e),
            })
        }
    }
}
