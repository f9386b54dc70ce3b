//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "test"
//! simcon_description: "Randomized interleaving stress tests for the shared registry."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
mod support;

use std::collections::HashSet;
use std::sync::Arc;

use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use serde_json::json;
use uuid::Uuid;

use simcon_common::ComponentSpec;
use simcon_core::backend::ResourceRecord;
use simcon_core::{Component, ComponentFactory, ComponentState, Gateway, NullSink, StateSink};
use simcon_msg::ActionRequest;

use support::MockRelay;

const REMOTE_RESOURCES: usize = 6;
const MANAGEMENT_OPS: usize = 40;
const RECONCILE_PASSES: usize = 40;

fn spawn_gateway(relay: Arc<MockRelay>) -> Arc<Gateway> {
    let spec = ComponentSpec::from_value(&json!({
        "type": "relay-gateway",
        "name": "stress-gateway",
        "poll-interval": 0.005,
    }))
    .expect("parse spec");
    let sink: Arc<dyn StateSink> = Arc::new(NullSink);
    let factory = Arc::new(ComponentFactory::with_defaults(sink.clone()));
    Gateway::spawn(&spec, relay, factory, sink)
}

/// Interleaves explicit create/delete management actions with
/// reconciliation passes and checks that the registry is never corrupted:
/// every surviving create is present, every delete took effect, and every
/// remote resource is tracked exactly once.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn interleaved_management_and_reconciliation_keep_registry_consistent() {
    simcon_logging::init();
    for seed in 0..4u64 {
        let resources: Vec<ResourceRecord> = (0..REMOTE_RESOURCES)
            .map(|i| {
                ResourceRecord::new(
                    Some(Uuid::new_v4()),
                    format!("node-{i}"),
                    ComponentState::Running,
                )
            })
            .collect();
        let remote_ids: HashSet<Uuid> = resources.iter().filter_map(|r| r.uuid).collect();
        let relay = MockRelay::with_resources(resources);
        let gateway = spawn_gateway(relay);

        let manager = {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                let mut rng = StdRng::seed_from_u64(seed);
                let mut survivors = HashSet::new();
                let mut deleted = HashSet::new();
                for _ in 0..MANAGEMENT_OPS {
                    let uuid = Uuid::new_v4();
                    gateway
                        .dispatch(&ActionRequest::new(
                            "create",
                            json!({"type": "generic", "uuid": uuid.to_string()}),
                        ))
                        .await;
                    if rng.gen_bool(0.5) {
                        gateway
                            .dispatch(&ActionRequest::new(
                                "delete",
                                json!({"uuid": uuid.to_string()}),
                            ))
                            .await;
                        deleted.insert(uuid);
                    } else {
                        survivors.insert(uuid);
                    }
                    if rng.gen_bool(0.3) {
                        tokio::task::yield_now().await;
                    }
                }
                (survivors, deleted)
            })
        };

        let reconciler = {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                for _ in 0..RECONCILE_PASSES {
                    gateway.reconcile().await;
                    tokio::task::yield_now().await;
                }
            })
        };

        let (survivors, deleted) = manager.await.expect("manager task");
        reconciler.await.expect("reconciler task");

        // One final pass so every remote resource is guaranteed absorbed.
        gateway.reconcile().await;

        let ids: HashSet<Uuid> = gateway.registry().ids().into_iter().collect();
        assert_eq!(
            ids.len(),
            gateway.registry().len(),
            "registry keys must be unique"
        );
        for uuid in &survivors {
            assert!(ids.contains(uuid), "lost a surviving create: {uuid}");
        }
        for uuid in &deleted {
            assert!(!ids.contains(uuid), "delete did not take effect: {uuid}");
        }
        for uuid in &remote_ids {
            assert!(ids.contains(uuid), "remote resource untracked: {uuid}");
        }
        assert_eq!(
            ids.len(),
            survivors.len() + remote_ids.len(),
            "registry holds exactly the survivors and the remote resources"
        );

        let tracked_remote: HashSet<Uuid> = gateway.known_remote_ids().into_iter().collect();
        assert_eq!(tracked_remote, remote_ids);

        gateway.shutdown().await;
    }
}

/// Concurrent reconciliation passes must not double-track a resource.
#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_passes_never_duplicate_proxies() {
    let resources: Vec<ResourceRecord> = (0..REMOTE_RESOURCES)
        .map(|i| {
            ResourceRecord::new(
                Some(Uuid::new_v4()),
                format!("node-{i}"),
                ComponentState::Running,
            )
        })
        .collect();
    let relay = MockRelay::with_resources(resources);
    let gateway = spawn_gateway(relay);

    let passes: Vec<_> = (0..8)
        .map(|_| {
            let gateway = gateway.clone();
            tokio::spawn(async move {
                for _ in 0..10 {
                    gateway.reconcile().await;
                    tokio::task::yield_now().await;
                }
            })
        })
        .collect();
    for pass in passes {
        pass.await.expect("pass task");
    }
    gateway.reconcile().await;

    assert_eq!(gateway.registry().len(), REMOTE_RESOURCES);

    gateway.shutdown().await;
}
