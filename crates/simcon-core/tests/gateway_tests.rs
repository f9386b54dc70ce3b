//! ---
//! simcon_section: "01-control-plane"
//! simcon_type: "source"
//! simcon_scope: "test"
//! simcon_description: "Gateway reconciliation loop integration tests."
//! simcon_version: "v0.0.0-prealpha"
//! simcon_owner: "tbd"
//! ---
mod support;

use std::sync::Arc;
use std::time::Duration;

use serde_json::json;
use uuid::Uuid;

use simcon_common::ComponentSpec;
use simcon_core::backend::{RelayBackend, ResourceRecord};
use simcon_core::{
    Component, ComponentFactory, ComponentState, Gateway, NullSink, StateSink,
};
use simcon_msg::ActionRequest;

use support::MockRelay;

fn gateway_spec(params: serde_json::Value) -> ComponentSpec {
    let mut base = json!({
        "type": "relay-gateway",
        "name": "gateway-under-test",
        // Keep the periodic loop out of the way; tests drive passes manually.
        "poll-interval": 3600.0,
    });
    if let (Some(target), Some(extra)) = (base.as_object_mut(), params.as_object()) {
        for (key, value) in extra {
            target.insert(key.clone(), value.clone());
        }
    }
    ComponentSpec::from_value(&base).expect("parse gateway spec")
}

fn spawn_gateway(relay: Arc<MockRelay>, params: serde_json::Value) -> Arc<Gateway> {
    let sink: Arc<dyn StateSink> = Arc::new(NullSink);
    let factory = Arc::new(ComponentFactory::with_defaults(sink.clone()));
    Gateway::spawn(&gateway_spec(params), relay, factory, sink)
}

fn records(n: usize) -> Vec<ResourceRecord> {
    (0..n)
        .map(|i| {
            ResourceRecord::new(
                Some(Uuid::new_v4()),
                format!("node-{i}"),
                ComponentState::Running,
            )
        })
        .collect()
}

#[tokio::test]
async fn reconciliation_tracks_every_reported_resource() {
    simcon_logging::init();
    let resources = records(3);
    let relay = MockRelay::with_resources(resources.clone());
    let gateway = spawn_gateway(relay, json!({}));

    gateway.reconcile().await;

    assert_eq!(gateway.registry().len(), 3);
    for record in &resources {
        let proxy = gateway
            .registry()
            .get(record.uuid.expect("uuid"))
            .expect("proxy tracked");
        assert_eq!(proxy.base().state(), record.state);
        assert_eq!(proxy.base().kind(), simcon_core::RELAY_NODE_KIND);
    }
    assert_eq!(gateway.base().state(), ComponentState::Running);
    assert_eq!(gateway.known_remote_ids().len(), 3);

    gateway.shutdown().await;
}

#[tokio::test]
async fn known_resources_have_remote_state_propagated() {
    let mut resources = records(1);
    let uuid = resources[0].uuid.expect("uuid");
    let relay = MockRelay::with_resources(resources.clone());
    let gateway = spawn_gateway(relay.clone(), json!({}));

    gateway.reconcile().await;
    assert_eq!(
        gateway.registry().get(uuid).expect("proxy").base().state(),
        ComponentState::Running
    );

    resources[0].state = ComponentState::Paused;
    relay.set_resources(resources);
    gateway.reconcile().await;

    assert_eq!(gateway.registry().len(), 1);
    assert_eq!(
        gateway.registry().get(uuid).expect("proxy").base().state(),
        ComponentState::Paused
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn resources_without_uuid_are_skipped() {
    let relay = MockRelay::with_resources(vec![
        ResourceRecord::new(None, "anonymous", ComponentState::Running),
        ResourceRecord::new(Some(Uuid::new_v4()), "tracked", ComponentState::Idle),
    ]);
    let gateway = spawn_gateway(relay, json!({}));

    gateway.reconcile().await;
    assert_eq!(gateway.registry().len(), 1);

    gateway.shutdown().await;
}

#[tokio::test]
async fn failed_query_degrades_gateway_and_preserves_registry() {
    let relay = MockRelay::with_resources(records(2));
    let gateway = spawn_gateway(relay.clone(), json!({}));

    gateway.reconcile().await;
    assert_eq!(gateway.registry().len(), 2);
    assert_eq!(gateway.base().state(), ComponentState::Running);
    let ids_before = {
        let mut ids = gateway.registry().ids();
        ids.sort();
        ids
    };

    relay.set_fail_queries(true);
    gateway.reconcile().await;

    assert_eq!(gateway.base().state(), ComponentState::Idle);
    let mut ids_after = gateway.registry().ids();
    ids_after.sort();
    assert_eq!(ids_before, ids_after);

    gateway.shutdown().await;
}

#[tokio::test]
async fn vanished_resources_are_kept_at_last_observed_state() {
    let resources = records(2);
    let survivor = resources[0].clone();
    let vanished = resources[1].uuid.expect("uuid");
    let relay = MockRelay::with_resources(resources);
    let gateway = spawn_gateway(relay.clone(), json!({}));

    gateway.reconcile().await;
    assert_eq!(gateway.registry().len(), 2);

    relay.set_resources(vec![survivor]);
    gateway.reconcile().await;

    // Drift is tolerated: the vanished resource stays, never auto-deleted.
    assert_eq!(gateway.registry().len(), 2);
    assert_eq!(
        gateway
            .registry()
            .get(vanished)
            .expect("still tracked")
            .base()
            .state(),
        ComponentState::Running
    );

    gateway.shutdown().await;
}

#[tokio::test]
async fn disabled_gateway_skips_reconciliation_entirely() {
    let relay = MockRelay::with_resources(records(2));
    let queries_before = relay.query_count();
    let gateway = spawn_gateway(relay.clone(), json!({"enabled": false}));

    gateway.reconcile().await;

    assert_eq!(relay.query_count(), queries_before);
    assert!(gateway.registry().is_empty());
    assert_eq!(gateway.base().state(), ComponentState::Idle);

    gateway.shutdown().await;
}

#[tokio::test]
async fn stop_fans_shutdown_out_to_every_proxy_before_returning() {
    let relay = MockRelay::with_resources(records(4));
    let gateway = spawn_gateway(relay, json!({}));

    gateway.reconcile().await;
    assert_eq!(gateway.registry().len(), 4);

    gateway.stop().await.expect("stop succeeds");

    assert_eq!(gateway.base().state(), ComponentState::Idle);
    for proxy in gateway.registry().components() {
        assert_eq!(proxy.base().state(), ComponentState::Shutdown);
    }

    gateway.shutdown().await;
}

#[tokio::test]
async fn pause_fans_paused_out_to_every_proxy() {
    let relay = MockRelay::with_resources(records(2));
    let gateway = spawn_gateway(relay, json!({}));

    gateway.reconcile().await;
    gateway.pause().await.expect("pause succeeds");

    assert_eq!(gateway.base().state(), ComponentState::Paused);
    for proxy in gateway.registry().components() {
        assert_eq!(proxy.base().state(), ComponentState::Paused);
    }

    gateway.shutdown().await;
}

#[tokio::test]
async fn proxy_actions_are_relayed_to_the_backend() {
    let relay = MockRelay::with_resources(records(1));
    let gateway = spawn_gateway(relay.clone(), json!({}));

    gateway.reconcile().await;
    let proxy = gateway.registry().components().pop().expect("proxy");
    proxy
        .dispatch(&ActionRequest::new("restart", serde_json::Value::Null))
        .await;
    proxy
        .dispatch(&ActionRequest::new("stop", serde_json::Value::Null))
        .await;

    let actions = relay.recorded_actions();
    assert_eq!(actions.len(), 1, "unsupported action must not reach the backend");
    assert_eq!(actions[0].0, "node-0");

    gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn background_loop_reconciles_without_inbound_actions() {
    let relay = MockRelay::with_resources(records(2));
    let gateway = spawn_gateway(relay, json!({"poll-interval": 0.02}));

    let mut populated = false;
    for _ in 0..100 {
        if gateway.registry().len() == 2 {
            populated = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(populated, "expected the periodic loop to discover resources");

    gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn shutdown_joins_the_loop_and_stops_polling() {
    let relay = MockRelay::with_resources(records(1));
    let gateway = spawn_gateway(relay.clone(), json!({"poll-interval": 0.02}));

    tokio::time::sleep(Duration::from_millis(60)).await;
    gateway.shutdown().await;

    let queries_at_shutdown = relay.query_count();
    tokio::time::sleep(Duration::from_millis(80)).await;
    assert_eq!(relay.query_count(), queries_at_shutdown);
}

#[tokio::test]
async fn gateway_handles_create_and_delete_like_a_controller() {
    let relay = MockRelay::with_resources(records(1));
    let gateway = spawn_gateway(relay, json!({}));

    gateway.reconcile().await;
    let uuid = Uuid::new_v4();
    gateway
        .dispatch(&ActionRequest::new(
            "create",
            json!({"type": "generic", "uuid": uuid.to_string()}),
        ))
        .await;
    assert_eq!(gateway.registry().len(), 2);
    // Explicitly created components are not remote-discovered ones.
    assert_eq!(gateway.known_remote_ids().len(), 1);

    gateway
        .dispatch(&ActionRequest::new("delete", json!({"uuid": uuid.to_string()})))
        .await;
    assert_eq!(gateway.registry().len(), 1);

    gateway.shutdown().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 2)]
async fn autostart_brings_the_backend_up() {
    let relay = MockRelay::with_resources(records(1));
    let gateway = spawn_gateway(relay.clone(), json!({"autostart": true, "poll-interval": 0.02}));

    let mut started = false;
    for _ in 0..100 {
        if relay.is_running().await.expect("is_running") {
            started = true;
            break;
        }
        tokio::time::sleep(Duration::from_millis(5)).await;
    }
    assert!(started, "expected autostart to start the relay backend");

    let status = gateway.base().status();
    assert_eq!(status.version.as_deref(), Some("0.0-test"));

    gateway.shutdown().await;
}
