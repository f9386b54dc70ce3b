//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "code"
//! simcon_description: "Gateway reconciliation loop and remote resource proxies."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
use std::sync::{Arc, Weak};
use std::time::Duration;

use async_trait::async_trait;
use parking_lot::Mutex;
use serde_json::Value as JsonValue;
use tokio::sync::broadcast;
use tokio::task::JoinHandle;
use tracing::{debug, error, warn};
use uuid::Uuid;

use simcon_common::ComponentSpec;
use simcon_msg::ActionRequest;

use crate::backend::{RelayBackend, ResourceRecord};
use crate::component::{Action, Component, ComponentBase, StateSink};
use crate::controller::{handle_create, handle_delete};
use crate::error::ComponentError;
use crate::factory::ComponentFactory;
use crate::registry::Registry;
use crate::state::{ComponentCategory, ComponentState};
use crate::Result;

const DEFAULT_POLL_INTERVAL_SECS: f64 = 2.0;

/// Type tag assigned to proxies synthesized during reconciliation.
pub const RELAY_NODE_KIND: &str = "relay-node";

/// Controller specialization fronting one relay backend.
///
/// Owns a dedicated background task that periodically queries the backend
/// and reconciles the registry with the reported resources. The task is
/// signaled and joined by [`Gateway::shutdown`]; dropping the gateway
/// without an orderly shutdown aborts it.
pub struct Gateway {
    base: ComponentBase,
    registry: Registry,
    factory: Arc<ComponentFactory>,
    backend: Arc<dyn RelayBackend>,
    poll_interval: Duration,
    autostart: bool,
    reconcile_gate: tokio::sync::Mutex<()>,
    shutdown: broadcast::Sender<()>,
    task: Mutex<Option<JoinHandle<()>>>,
    weak: Weak<Gateway>,
}

impl Gateway {
    /// Build a gateway and start its reconciliation task.
    ///
    /// Must be called from within a tokio runtime. The first pass runs as
    /// soon as the task is scheduled, after the readiness hook.
    pub fn spawn(
        spec: &ComponentSpec,
        backend: Arc<dyn RelayBackend>,
        factory: Arc<ComponentFactory>,
        sink: Arc<dyn StateSink>,
    ) -> Arc<Self> {
        let poll_interval = Duration::from_secs_f64(
            spec.param_f64("poll-interval", DEFAULT_POLL_INTERVAL_SECS),
        );
        let autostart = spec.param_bool("autostart", false);
        let (shutdown_tx, _) = broadcast::channel(4);

        let gateway = Arc::new_cyclic(|weak| Self {
            base: ComponentBase::from_spec(spec, ComponentCategory::Gateway, sink),
            registry: Registry::new(),
            factory,
            backend,
            poll_interval,
            autostart,
            reconcile_gate: tokio::sync::Mutex::new(()),
            shutdown: shutdown_tx,
            task: Mutex::new(None),
            weak: weak.clone(),
        });

        let weak = Arc::downgrade(&gateway);
        let mut shutdown_rx = gateway.shutdown.subscribe();
        let handle = tokio::spawn(async move {
            if let Some(gateway) = weak.upgrade() {
                gateway.on_ready().await;
            }
            let mut ticker = tokio::time::interval(poll_interval);
            ticker.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);
            loop {
                tokio::select! {
                    _ = shutdown_rx.recv() => {
                        debug!("gateway reconciliation task shutting down");
                        break;
                    }
                    _ = ticker.tick() => {
                        let Some(gateway) = weak.upgrade() else { break };
                        gateway.reconcile().await;
                    }
                }
            }
        });
        *gateway.task.lock() = Some(handle);
        gateway
    }

    /// The registry of tracked components (explicitly created and
    /// reconciliation-discovered alike).
    pub fn registry(&self) -> &Registry {
        &self.registry
    }

    /// Identifiers discovered via reconciliation rather than `create`.
    pub fn known_remote_ids(&self) -> Vec<Uuid> {
        self.registry
            .components()
            .into_iter()
            .filter(|component| component.base().kind() == RELAY_NODE_KIND)
            .map(|component| component.base().id())
            .collect()
    }

    /// Signal the reconciliation task and wait for it to finish.
    ///
    /// Must run before the backend connection is released; after this
    /// returns no further pass will execute.
    pub async fn shutdown(&self) {
        let _ = self.shutdown.send(());
        let handle = self.task.lock().take();
        if let Some(handle) = handle {
            if let Err(err) = handle.await {
                error!(component = %self.base.name(), error = %err, "reconciliation task join error");
            }
        }
    }

    /// Run one reconciliation pass against the backend.
    ///
    /// Skipped entirely while disabled and while another pass is still in
    /// flight. A failed query is swallowed: the gateway degrades to
    /// `idle` and the registry is left untouched. Entries absent from the
    /// response keep their last observed state; stale entries are never
    /// auto-deleted.
    pub async fn reconcile(&self) {
        if !self.base.enabled() {
            return;
        }
        let Ok(_gate) = self.reconcile_gate.try_lock() else {
            debug!(component = %self.base.name(), "reconciliation pass already running; skipping tick");
            return;
        };
        match self.backend.list_resources().await {
            Ok(records) => {
                for record in records {
                    self.absorb_record(record);
                }
                self.base.change_state(ComponentState::Running, None);
            }
            Err(err) => {
                warn!(
                    component = %self.base.name(),
                    error = %err,
                    "relay backend query failed; marking gateway idle"
                );
                self.base.change_state(ComponentState::Idle, None);
            }
        }
    }

    fn absorb_record(&self, record: ResourceRecord) {
        let Some(uuid) = record.uuid else {
            warn!(
                component = %self.base.name(),
                resource = %record.name,
                "resource reported without uuid; skipping"
            );
            return;
        };
        if let Some(existing) = self.registry.get(uuid) {
            existing.base().change_state(record.state, None);
        } else {
            debug!(
                component = %self.base.name(),
                resource = %record.name,
                state = %record.state,
                "discovered new relay resource"
            );
            let proxy = NodeProxy::new(
                uuid,
                &record,
                self.weak.clone(),
                self.backend.clone(),
                self.base.sink(),
            );
            if let Err(err) = self.registry.insert(proxy) {
                warn!(
                    component = %self.base.name(),
                    resource = %record.name,
                    error = %err,
                    "failed to track discovered resource"
                );
            }
        }
    }

    /// Start the backend, then re-run reconciliation.
    pub async fn start(&self) -> Result<()> {
        self.backend.start().await?;
        self.base.change_state(ComponentState::Starting, None);
        self.reconcile().await;
        Ok(())
    }

    /// Stop the backend and fan `shutdown` out to every tracked proxy
    /// before returning.
    pub async fn stop(&self) -> Result<()> {
        match self.backend.is_running().await {
            Ok(true) => {
                if let Err(err) = self.backend.stop().await {
                    warn!(component = %self.base.name(), error = %err, "relay backend stop failed");
                }
            }
            Ok(false) => {}
            Err(err) => {
                warn!(component = %self.base.name(), error = %err, "could not query relay backend before stop");
            }
        }
        self.base.change_state(ComponentState::Idle, None);

        // Once the gateway shuts down, all of its resources are down too.
        for component in self.registry.components() {
            component.base().change_state(ComponentState::Shutdown, None);
        }
        Ok(())
    }

    /// Pause the backend and fan `paused` out to every tracked proxy.
    pub async fn pause(&self) -> Result<()> {
        self.backend.pause().await?;
        self.base.change_state(ComponentState::Paused, None);
        for component in self.registry.components() {
            component.base().change_state(ComponentState::Paused, None);
        }
        Ok(())
    }

    /// Resume the backend, then re-run reconciliation.
    pub async fn resume(&self) -> Result<()> {
        self.backend.resume().await?;
        self.reconcile().await;
        Ok(())
    }

    /// Restart the backend, then re-run reconciliation.
    pub async fn reset(&self) -> Result<()> {
        self.backend.restart().await?;
        self.reconcile().await;
        Ok(())
    }
}

#[async_trait]
impl Component for Gateway {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    async fn on_ready(&self) {
        match self.backend.version().await {
            Ok(version) => self.base.set_version(Some(version)),
            Err(err) => {
                self.base.change_state(
                    ComponentState::Error,
                    Some(&ComponentError::BackendUninitialized(err.to_string()).to_string()),
                );
            }
        }
        if self.autostart {
            match self.backend.is_running().await {
                Ok(false) => {
                    if let Err(err) = self.start().await {
                        warn!(component = %self.base.name(), error = %err, "autostart failed");
                    }
                }
                Ok(true) => {}
                Err(err) => {
                    warn!(component = %self.base.name(), error = %err, "autostart skipped; backend unreachable");
                }
            }
        }
    }

    async fn handle_action(&self, action: Action, request: &ActionRequest) -> Result<()> {
        match action {
            Action::Create => {
                handle_create(self.base.name(), request, |parameters| {
                    let spec = ComponentSpec::from_value(parameters)
                        .map_err(|err| ComponentError::InvalidParameters(err.to_string()))?;
                    let component = self.factory.build(&spec)?;
                    self.registry.insert(component.clone())?;
                    Ok(component)
                });
                Ok(())
            }
            Action::Delete => {
                handle_delete(self.base.name(), request, |uuid| {
                    self.registry.remove(uuid).map(|_| ())
                });
                Ok(())
            }
            Action::Start => self.start().await,
            Action::Stop => self.stop().await,
            Action::Pause => self.pause().await,
            Action::Resume => self.resume().await,
            Action::Reset => self.reset().await,
        }
    }
}

impl Drop for Gateway {
    fn drop(&mut self) {
        let _ = self.shutdown.send(());
        if let Some(handle) = self.task.lock().take() {
            // Last resort: shutdown() is the orderly path and joins.
            handle.abort();
        }
    }
}

impl std::fmt::Debug for Gateway {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Gateway")
            .field("base", &self.base)
            .field("poll_interval", &self.poll_interval)
            .field("autostart", &self.autostart)
            .finish()
    }
}

/// Local proxy for a resource owned by a gateway's backend.
///
/// Synthesized during reconciliation; its lifecycle actions are relayed
/// to the backend and followed by a reconciliation pass so the registry
/// reflects the backend's authoritative view.
pub struct NodeProxy {
    base: ComponentBase,
    name: String,
    gateway: Weak<Gateway>,
    backend: Arc<dyn RelayBackend>,
}

impl NodeProxy {
    fn new(
        uuid: Uuid,
        record: &ResourceRecord,
        gateway: Weak<Gateway>,
        backend: Arc<dyn RelayBackend>,
        sink: Arc<dyn StateSink>,
    ) -> Arc<Self> {
        let params = match &record.details {
            JsonValue::Object(map) => map.clone(),
            _ => serde_json::Map::new(),
        };
        Arc::new(Self {
            base: ComponentBase::new(
                uuid,
                record.name.clone(),
                RELAY_NODE_KIND,
                ComponentCategory::Node,
                true,
                params,
                sink,
                record.state,
            ),
            name: record.name.clone(),
            gateway,
            backend,
        })
    }

    async fn relay(&self, action: Action) -> Result<()> {
        if let Err(err) = self.backend.resource_action(&self.name, action).await {
            warn!(resource = %self.name, action = %action, error = %err, "failed to relay action to resource");
            return Err(err);
        }
        if let Some(gateway) = self.gateway.upgrade() {
            gateway.reconcile().await;
        }
        Ok(())
    }
}

#[async_trait]
impl Component for NodeProxy {
    fn base(&self) -> &ComponentBase {
        &self.base
    }

    async fn handle_action(&self, action: Action, _request: &ActionRequest) -> Result<()> {
        match action {
            Action::Create | Action::Delete => {
                Err(ComponentError::UnsupportedAction(action.to_string()))
            }
            _ => self.relay(action).await,
        }
    }
}

impl std::fmt::Debug for NodeProxy {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("NodeProxy")
            .field("base", &self.base)
            .field("name", &self.name)
            .finish()
    }
}
