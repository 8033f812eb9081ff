//! In-memory fakes for the process, HTTP, environment and cluster seams
//! (testing only)
//!
//! Provides `ScriptedRunner`, `StaticFetcher`, `MapEnv` and `FakeCluster`
//! so resources can be exercised without real binaries or network.

use std::collections::{HashMap, HashSet, VecDeque};
use std::path::{Path, PathBuf};
use std::sync::Mutex;

use crate::credential::{ClusterControl, Environment, SecretCreate};
use crate::error::DepsError;
use crate::exec::{CommandOutput, CommandRunner, CommandSpec};
use crate::fetch::Fetcher;
use crate::Result;

// ---------------------------------------------------------------------------
// ScriptedRunner
// ---------------------------------------------------------------------------

/// Command runner answering from a script keyed by the full command line.
///
/// Responses for one command line are consumed in order; the last one is
/// sticky. Unscripted commands fail to start, like a missing binary.
#[derive(Debug, Default)]
pub struct ScriptedRunner {
    scripts: Mutex<HashMap<String, VecDeque<CommandOutput>>>,
    on_path: Mutex<HashSet<String>>,
    calls: Mutex<Vec<String>>,
}

impl ScriptedRunner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Queue a response for `command_line`.
    pub fn respond(&self, command_line: impl Into<String>, output: CommandOutput) -> &Self {
        self.scripts
            .lock()
            .unwrap()
            .entry(command_line.into())
            .or_default()
            .push_back(output);
        self
    }

    /// Shorthand for a successful response with `stdout`.
    pub fn succeed(&self, command_line: impl Into<String>, stdout: impl Into<String>) -> &Self {
        self.respond(command_line, CommandOutput::ok(stdout))
    }

    /// Make `locate(program)` succeed.
    pub fn on_path(&self, program: impl Into<String>) -> &Self {
        self.on_path.lock().unwrap().insert(program.into());
        self
    }

    /// Every command line run so far, in order
    pub fn calls(&self) -> Vec<String> {
        self.calls.lock().unwrap().clone()
    }

    /// Number of runs of `command_line`
    pub fn count(&self, command_line: &str) -> usize {
        self.calls
            .lock()
            .unwrap()
            .iter()
            .filter(|c| c.as_str() == command_line)
            .count()
    }

    /// Whether any command starting with `prefix` ran
    pub fn ran_prefix(&self, prefix: &str) -> bool {
        self.calls.lock().unwrap().iter().any(|c| c.starts_with(prefix))
    }
}

impl CommandRunner for ScriptedRunner {
    fn run(&self, spec: &CommandSpec) -> std::io::Result<CommandOutput> {
        let line = spec.to_string();
        self.calls.lock().unwrap().push(line.clone());

        let mut scripts = self.scripts.lock().unwrap();
        let queue = scripts.get_mut(&line).filter(|q| !q.is_empty()).ok_or_else(|| {
            std::io::Error::new(
                std::io::ErrorKind::NotFound,
                format!("{}: command not found", spec.program),
            )
        })?;

        if queue.len() > 1 {
            Ok(queue.pop_front().unwrap_or_default())
        } else {
            Ok(queue.front().cloned().unwrap_or_default())
        }
    }

    fn locate(&self, program: &str) -> Option<PathBuf> {
        self.on_path
            .lock()
            .unwrap()
            .contains(program)
            .then(|| PathBuf::from("/usr/bin").join(program))
    }
}

// ---------------------------------------------------------------------------
// StaticFetcher
// ---------------------------------------------------------------------------

/// Fetcher serving canned bodies; unknown URLs behave as offline.
#[derive(Debug, Default)]
pub struct StaticFetcher {
    bodies: Mutex<HashMap<String, Vec<u8>>>,
    requests: Mutex<Vec<String>>,
}

impl StaticFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn text(&self, url: impl Into<String>, body: impl Into<String>) -> &Self {
        self.bytes(url, body.into().into_bytes())
    }

    pub fn bytes(&self, url: impl Into<String>, body: Vec<u8>) -> &Self {
        self.bodies.lock().unwrap().insert(url.into(), body);
        self
    }

    /// Every URL requested so far, in order
    pub fn requests(&self) -> Vec<String> {
        self.requests.lock().unwrap().clone()
    }

    fn body(&self, url: &str) -> Result<Vec<u8>> {
        self.requests.lock().unwrap().push(url.to_string());
        self.bodies
            .lock()
            .unwrap()
            .get(url)
            .cloned()
            .ok_or_else(|| DepsError::Download {
                url: url.to_string(),
                reason: "network unavailable".to_string(),
            })
    }
}

impl Fetcher for StaticFetcher {
    fn get_text(&self, url: &str) -> Result<String> {
        Ok(String::from_utf8_lossy(&self.body(url)?).into_owned())
    }

    fn download(&self, url: &str, dest: &Path) -> Result<u64> {
        let body = self.body(url)?;
        std::fs::write(dest, &body)?;
        Ok(body.len() as u64)
    }
}

// ---------------------------------------------------------------------------
// MapEnv
// ---------------------------------------------------------------------------

/// Environment backed by a map, leaving the process environment untouched.
#[derive(Debug, Default)]
pub struct MapEnv {
    vars: Mutex<HashMap<String, String>>,
}

impl MapEnv {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.set(key, value);
        self
    }

    pub fn set(&self, key: impl Into<String>, value: impl Into<String>) {
        self.vars.lock().unwrap().insert(key.into(), value.into());
    }
}

impl Environment for MapEnv {
    fn var(&self, key: &str) -> Option<String> {
        self.vars.lock().unwrap().get(key).cloned()
    }
}

// ---------------------------------------------------------------------------
// FakeCluster
// ---------------------------------------------------------------------------

/// Scripted response to a secret creation request
#[derive(Debug, Clone)]
pub enum CreateBehavior {
    Create,
    AlreadyExists,
    Fail(String),
}

/// Cluster secret store with scripted membership and create behavior
#[derive(Debug)]
pub struct FakeCluster {
    controller: bool,
    behavior: CreateBehavior,
    membership_queries: Mutex<usize>,
    created: Mutex<Vec<(String, PathBuf)>>,
}

impl FakeCluster {
    /// A host that controls an active cluster
    pub fn controller(behavior: CreateBehavior) -> Self {
        FakeCluster {
            controller: true,
            behavior,
            membership_queries: Mutex::new(0),
            created: Mutex::new(Vec::new()),
        }
    }

    /// A standalone host
    pub fn standalone() -> Self {
        FakeCluster {
            controller: false,
            ..Self::controller(CreateBehavior::Create)
        }
    }

    pub fn membership_queries(&self) -> usize {
        *self.membership_queries.lock().unwrap()
    }

    /// Every create attempt (name, path), including rejected ones
    pub fn create_attempts(&self) -> Vec<(String, PathBuf)> {
        self.created.lock().unwrap().clone()
    }
}

impl ClusterControl for FakeCluster {
    fn is_controlling_node(&self) -> bool {
        *self.membership_queries.lock().unwrap() += 1;
        self.controller
    }

    fn create_secret(&self, name: &str, path: &Path) -> Result<SecretCreate> {
        self.created
            .lock()
            .unwrap()
            .push((name.to_string(), path.to_path_buf()));

        match &self.behavior {
            CreateBehavior::Create => Ok(SecretCreate::Created),
            CreateBehavior::AlreadyExists => Ok(SecretCreate::AlreadyExists),
            CreateBehavior::Fail(reason) => Err(DepsError::ProvisionFailed {
                secret: name.to_string(),
                reason: reason.clone(),
            }),
        }
    }
}
