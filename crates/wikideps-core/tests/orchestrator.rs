//! Fail-fast ordering and mode selection across named steps.

use std::sync::{Arc, Mutex};

use wikideps_core::fakes::{MapEnv, ScriptedRunner, StaticFetcher};
use wikideps_core::plans;
use wikideps_core::{
    CommandOutput, Dependency, DependencyStep, DepsConfig, DepsError, Mode, Orchestrator, Result,
    StepAction, Toolbox,
};

type Journal = Arc<Mutex<Vec<String>>>;

/// Records every call; optionally fails ensure or verify.
struct Probe {
    name: &'static str,
    journal: Journal,
    fail_ensure: bool,
    fail_verify: bool,
}

impl Probe {
    fn ok(name: &'static str, journal: &Journal) -> Self {
        Probe {
            name,
            journal: journal.clone(),
            fail_ensure: false,
            fail_verify: false,
        }
    }

    fn failing_ensure(name: &'static str, journal: &Journal) -> Self {
        Probe {
            fail_ensure: true,
            ..Self::ok(name, journal)
        }
    }

    fn failing_verify(name: &'static str, journal: &Journal) -> Self {
        Probe {
            fail_verify: true,
            ..Self::ok(name, journal)
        }
    }

    fn failure(&self) -> DepsError {
        DepsError::NotInstalled {
            tool: self.name.to_string(),
            hint: "scripted failure".to_string(),
        }
    }
}

impl Dependency for Probe {
    fn verify(&self) -> Result<()> {
        self.journal.lock().unwrap().push(format!("verify {}", self.name));
        if self.fail_verify {
            return Err(self.failure());
        }
        Ok(())
    }

    fn ensure(&self) -> Result<()> {
        self.journal.lock().unwrap().push(format!("ensure {}", self.name));
        if self.fail_ensure {
            return Err(self.failure());
        }
        Ok(())
    }
}

fn entries(journal: &Journal) -> Vec<String> {
    journal.lock().unwrap().clone()
}

#[test]
fn full_mode_stops_at_first_failed_ensure() {
    let journal = Journal::default();
    let plan = Orchestrator::new("abc")
        .step(DependencyStep::new("A", Probe::ok("A", &journal)))
        .step(DependencyStep::new("B", Probe::failing_ensure("B", &journal)))
        .step(DependencyStep::new("C", Probe::ok("C", &journal)));

    let err = plan.run(Mode::Full).unwrap_err();

    assert!(matches!(err, DepsError::StepFailed { ref step, .. } if step == "B"));
    assert_eq!(err.to_string(), "B failed");
    assert_eq!(entries(&journal), vec!["ensure A", "ensure B"]);
}

#[test]
fn full_mode_runs_post_install_verification() {
    let journal = Journal::default();
    let plan = Orchestrator::new("ab")
        .step(DependencyStep::new("A", Probe::ok("A", &journal)))
        .step(DependencyStep::new("B", Probe::ok("B", &journal)));

    let report = plan.run(Mode::Full).unwrap();

    assert_eq!(
        entries(&journal),
        vec!["ensure A", "ensure B", "verify A", "verify B"]
    );
    assert_eq!(report.mode, Mode::Full);
    assert_eq!(report.plan, "ab");
}

#[test]
fn verify_only_never_ensures_and_stops_on_failure() {
    let journal = Journal::default();
    let plan = Orchestrator::new("abc")
        .step(DependencyStep::new("A", Probe::ok("A", &journal)))
        .step(DependencyStep::new("B", Probe::failing_verify("B", &journal)))
        .step(DependencyStep::new("C", Probe::ok("C", &journal)));

    let err = plan.run(Mode::VerifyOnly).unwrap_err();

    assert!(matches!(err, DepsError::StepFailed { ref step, .. } if step == "B"));
    assert_eq!(entries(&journal), vec!["verify A", "verify B"]);
}

#[test]
fn minimal_mode_only_verifies_unprivileged_steps() {
    let journal = Journal::default();
    let plan = Orchestrator::new("abc")
        .step(DependencyStep::new("A", Probe::failing_verify("A", &journal)).privileged())
        .step(DependencyStep::new("B", Probe::ok("B", &journal)))
        .step(DependencyStep::new("C", Probe::ok("C", &journal)));

    let report = plan.run(Mode::Minimal).unwrap();

    assert_eq!(entries(&journal), vec!["verify B", "verify C"]);
    assert!(report
        .steps
        .iter()
        .all(|s| s.action == StepAction::Verified));
}

#[test]
fn each_run_gets_a_fresh_id() {
    let plan = Orchestrator::new("empty");
    let first = plan.run(Mode::VerifyOnly).unwrap();
    let second = plan.run(Mode::VerifyOnly).unwrap();
    assert_ne!(first.run_id, second.run_id);
}

#[test]
fn wiki_diagrams_plan_attributes_go_failure() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.succeed("mmdc --version", "10.9.0");
    runner.succeed("git --version", "git version 2.43.0");

    let tools = Toolbox::new(
        DepsConfig {
            drift_check: false,
            ..DepsConfig::default()
        },
        runner.clone(),
        Arc::new(StaticFetcher::new()),
        Arc::new(MapEnv::new()),
    );

    let err = plans::wiki_diagrams(&tools).run(Mode::VerifyOnly).unwrap_err();
    assert!(matches!(err, DepsError::StepFailed { ref step, .. } if step == plans::GO_STEP));
    assert!(!runner.ran_prefix("mmdc"));

    // CI profile skips the privileged Go step
    let report = plans::wiki_diagrams(&tools).run(Mode::Minimal).unwrap();
    let names: Vec<&str> = report.steps.iter().map(|s| s.step.as_str()).collect();
    assert_eq!(names, vec![plans::MERMAID_STEP, plans::GIT_STEP]);
}

#[test]
fn container_plan_reports_unreachable_daemon() {
    let runner = Arc::new(ScriptedRunner::new());
    runner.on_path("docker");
    runner.respond(
        "docker version --format {{.Server.Version}}",
        CommandOutput::failed(
            1,
            "Cannot connect to the Docker daemon at unix:///var/run/docker.sock",
        ),
    );

    let tools = Toolbox::new(
        DepsConfig::default(),
        runner,
        Arc::new(StaticFetcher::new()),
        Arc::new(MapEnv::new()),
    );

    let err = plans::container(&tools).run(Mode::VerifyOnly).unwrap_err();
    assert!(matches!(err, DepsError::StepFailed { ref step, .. } if step == plans::DOCKER_STEP));
    assert!(matches!(err.root_cause(), DepsError::Unreachable { .. }));
}
