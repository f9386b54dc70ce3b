//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "test"
//! simcon_description: "Mock backend collaborators for lifecycle integration tests."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
#![allow(dead_code)]

use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use simcon_core::backend::{
    ModelSource, RelayBackend, ResourceRecord, SimulationBackend, SimulationSession,
};
use simcon_core::{Action, ComponentError, Result, SolverConfig};

/// Scriptable relay backend double.
#[derive(Default)]
pub struct MockRelay {
    resources: Mutex<Vec<ResourceRecord>>,
    fail_queries: AtomicBool,
    running: AtomicBool,
    query_count: AtomicUsize,
    actions: Mutex<Vec<(String, Action)>>,
}

impl MockRelay {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn with_resources(resources: Vec<ResourceRecord>) -> Arc<Self> {
        let relay = Self::new();
        relay.set_resources(resources);
        relay
    }

    pub fn set_resources(&self, resources: Vec<ResourceRecord>) {
        *self.resources.lock().expect("resources poisoned") = resources;
    }

    pub fn set_fail_queries(&self, fail: bool) {
        self.fail_queries.store(fail, Ordering::SeqCst);
    }

    pub fn query_count(&self) -> usize {
        self.query_count.load(Ordering::SeqCst)
    }

    pub fn recorded_actions(&self) -> Vec<(String, Action)> {
        self.actions.lock().expect("actions poisoned").clone()
    }
}

#[async_trait]
impl RelayBackend for MockRelay {
    async fn version(&self) -> Result<String> {
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ComponentError::BackendUnavailable(
                "connection refused".into(),
            ));
        }
        Ok("0.0-test".into())
    }

    async fn is_running(&self) -> Result<bool> {
        Ok(self.running.load(Ordering::SeqCst))
    }

    async fn start(&self) -> Result<()> {
        self.running.store(true, Ordering::SeqCst);
        Ok(())
    }

    async fn stop(&self) -> Result<()> {
        self.running.store(false, Ordering::SeqCst);
        Ok(())
    }

    async fn pause(&self) -> Result<()> {
        Ok(())
    }

    async fn resume(&self) -> Result<()> {
        Ok(())
    }

    async fn restart(&self) -> Result<()> {
        Ok(())
    }

    async fn list_resources(&self) -> Result<Vec<ResourceRecord>> {
        self.query_count.fetch_add(1, Ordering::SeqCst);
        if self.fail_queries.load(Ordering::SeqCst) {
            return Err(ComponentError::BackendUnavailable(
                "connection refused".into(),
            ));
        }
        Ok(self.resources.lock().expect("resources poisoned").clone())
    }

    async fn resource_action(&self, name: &str, action: Action) -> Result<()> {
        self.actions
            .lock()
            .expect("actions poisoned")
            .push((name.to_owned(), action));
        Ok(())
    }
}

/// Failure switches shared between a simulation backend and its sessions.
#[derive(Default)]
pub struct SimFlags {
    pub fail_build: AtomicBool,
    pub fail_start: AtomicBool,
    pub fail_stop: AtomicBool,
    pub fail_pause: AtomicBool,
    pub fail_resume: AtomicBool,
}

/// Scriptable simulation backend double.
#[derive(Default)]
pub struct MockSimulation {
    pub flags: Arc<SimFlags>,
    build_count: AtomicUsize,
    models_seen: Mutex<Vec<Option<PathBuf>>>,
}

impl MockSimulation {
    pub fn new() -> Arc<Self> {
        Arc::new(Self::default())
    }

    pub fn build_count(&self) -> usize {
        self.build_count.load(Ordering::SeqCst)
    }

    pub fn models_seen(&self) -> Vec<Option<PathBuf>> {
        self.models_seen.lock().expect("models poisoned").clone()
    }
}

#[async_trait]
impl SimulationBackend for MockSimulation {
    async fn build_session(
        &self,
        model: Option<&Path>,
        _solver: &SolverConfig,
    ) -> Result<Box<dyn SimulationSession>> {
        self.build_count.fetch_add(1, Ordering::SeqCst);
        self.models_seen
            .lock()
            .expect("models poisoned")
            .push(model.map(Path::to_path_buf));
        if self.flags.fail_build.load(Ordering::SeqCst) {
            return Err(ComponentError::BackendUninitialized(
                "simulation engine not installed".into(),
            ));
        }
        Ok(Box::new(MockSession {
            flags: self.flags.clone(),
        }))
    }
}

struct MockSession {
    flags: Arc<SimFlags>,
}

impl MockSession {
    fn outcome(&self, flag: &AtomicBool, operation: &'static str) -> Result<()> {
        if flag.load(Ordering::SeqCst) {
            Err(ComponentError::backend_op(operation, "injected failure"))
        } else {
            Ok(())
        }
    }
}

#[async_trait]
impl SimulationSession for MockSession {
    async fn start(&self) -> Result<()> {
        self.outcome(&self.flags.fail_start, "start")
    }

    async fn stop(&self) -> Result<()> {
        self.outcome(&self.flags.fail_stop, "stop")
    }

    async fn pause(&self) -> Result<()> {
        self.outcome(&self.flags.fail_pause, "pause")
    }

    async fn resume(&self) -> Result<()> {
        self.outcome(&self.flags.fail_resume, "resume")
    }
}

/// Model source double returning a fixed path or an injected failure.
#[derive(Default)]
pub struct MockModels {
    pub path: Option<PathBuf>,
    pub fail: bool,
}

#[async_trait]
impl ModelSource for MockModels {
    async fn fetch(&self) -> Result<Option<PathBuf>> {
        if self.fail {
            return Err(ComponentError::BackendUnavailable(
                "model store unreachable".into(),
            ));
        }
        Ok(self.path.clone())
    }
}
