use std::collections::BTreeMap;

use beacon_core::{Agent, AgentState, SimConfig};
use beacon_store::adapter::{self, build_save_requests, decode_load, PersistenceAdapter};
use beacon_store::protocol::{LayerKey, LoadResponse, KIND_BIAS, KIND_WEIGHT};
use beacon_store::record::RecordStore;
use beacon_store::{service, StateService, StoreClient};
use serde_json::{json, Value};

fn agent(seed: u64) -> Agent {
    Agent::with_seed(&SimConfig::default(), seed).unwrap()
}

fn assert_layers_close(a: &[Vec<f64>], b: &[Vec<f64>]) {
    assert_eq!(a.len(), b.len());
    for (x, y) in a.iter().zip(b) {
        assert_eq!(x.len(), y.len());
        for (p, q) in x.iter().zip(y) {
            assert!((p - q).abs() < 1e-12, "{} vs {}", p, q);
        }
    }
}

fn memory_adapter() -> PersistenceAdapter {
    let handle = service::spawn(StateService::new(RecordStore::in_memory()));
    PersistenceAdapter::new(StoreClient::Memory(handle))
}

#[test]
fn test_one_request_per_layer_half_and_metadata_key() {
    let a = agent(1);
    let network = a.network().export_state();
    let requests = build_save_requests(&network, a.state());

    let depth = network.weights.len();
    let weights = requests.iter().filter(|r| r.kind == KIND_WEIGHT).count();
    let biases = requests.iter().filter(|r| r.kind == KIND_BIAS).count();
    assert_eq!(weights, depth);
    assert_eq!(biases, depth);

    let metadata: Vec<&str> = requests
        .iter()
        .filter(|r| r.layer == LayerKey::METADATA)
        .map(|r| r.kind.as_str())
        .collect();
    for key in [
        "epsilon",
        "exploredAreas",
        "collisionCounter",
        "beaconReachedCounter",
        "cumulativeReward",
        "totalReward",
        "rewardCount",
        "actionCooldown",
        "successStreak",
    ] {
        assert!(metadata.contains(&key), "missing metadata key {}", key);
    }
    assert_eq!(metadata.len(), 9);

    let first = &requests[0];
    assert_eq!(first.layer, LayerKey::Index(0));
    assert_eq!(first.data, Value::from(network.weights[0].clone()));
}

#[test]
fn test_decode_orders_layers_numerically() {
    let mut weights = BTreeMap::new();
    weights.insert("10".to_string(), json!([10.0]));
    weights.insert("2".to_string(), json!([2.0]));
    weights.insert("0".to_string(), json!([0.0]));
    let response = LoadResponse {
        weights,
        ..LoadResponse::default()
    };

    let restored = decode_load(&response);
    assert_eq!(restored.network.weights, Some(vec![vec![0.0], vec![2.0], vec![10.0]]));
    assert_eq!(restored.network.biases, None);
    assert!(restored.agent.is_none());
}

#[test]
fn test_decode_skips_non_numeric_layers_and_rejects_bad_vectors() {
    let mut weights = BTreeMap::new();
    weights.insert("0".to_string(), json!([1.0]));
    weights.insert("extra".to_string(), json!([5.0]));
    let mut biases = BTreeMap::new();
    biases.insert("0".to_string(), json!("not a vector"));

    let restored = decode_load(&LoadResponse {
        weights,
        biases,
        ..LoadResponse::default()
    });
    assert_eq!(restored.network.weights, Some(vec![vec![1.0]]));
    assert_eq!(restored.network.biases, None);
}

#[test]
fn test_metadata_merges_onto_defaults() {
    let mut metadata = BTreeMap::new();
    metadata.insert("epsilon".to_string(), json!(0.3));
    metadata.insert("collisionCounter".to_string(), json!("lots"));
    metadata.insert("exploredAreas".to_string(), json!([[1, 2], [3, 4]]));

    let restored = decode_load(&LoadResponse {
        metadata,
        ..LoadResponse::default()
    });
    let state = restored.agent.unwrap();
    let defaults = AgentState::default();

    assert_eq!(state.epsilon, 0.3);
    assert_eq!(state.collision_counter, defaults.collision_counter);
    assert_eq!(state.explored_areas.len(), 2);
    assert!(state.explored_areas.contains(&(3, 4)));
    assert_eq!(state.action_cooldown, defaults.action_cooldown);
}

#[test]
fn test_apply_rejected_network_keeps_weights() {
    let mut a = agent(3);
    let before = a.network().export_state();

    let restored = decode_load(&LoadResponse {
        weights: BTreeMap::from([("0".to_string(), json!([1.0]))]),
        biases: BTreeMap::from([("0".to_string(), json!([1.0]))]),
        metadata: BTreeMap::from([("epsilon".to_string(), json!(0.9))]),
    });
    assert!(!adapter::apply(&mut a, restored));
    assert_eq!(a.network().export_state(), before);
    // metadata still applies, clamped to the policy bounds
    assert_eq!(a.state().epsilon, 0.5);
}

#[tokio::test]
async fn test_empty_store_loads_nothing() {
    let adapter = memory_adapter();
    assert!(adapter.load().await.unwrap().is_none());
}

#[tokio::test]
async fn test_save_then_load_restores_agent() {
    let adapter = memory_adapter();

    let mut source = agent(11);
    source.state_mut().epsilon = 0.25;
    source.state_mut().collision_counter = 7;
    source.state_mut().explored_areas.insert((4, 5));

    let summary = adapter.save_all(&source).await;
    assert_eq!(summary.failed, 0);
    assert_eq!(summary.ok, build_save_requests(&source.network().export_state(), source.state()).len());

    let mut target = agent(99);
    assert_ne!(target.network().export_state(), source.network().export_state());

    let restored = adapter.load().await.unwrap().unwrap();
    assert!(adapter::apply(&mut target, restored));

    let (got, want) = (target.network().export_state(), source.network().export_state());
    assert_layers_close(&got.weights, &want.weights);
    assert_layers_close(&got.biases, &want.biases);
    assert_eq!(target.state().epsilon, 0.25);
    assert_eq!(target.state().collision_counter, 7);
    assert!(target.state().explored_areas.contains(&(4, 5)));
}

#[tokio::test]
async fn test_latest_save_wins() {
    let adapter = memory_adapter();
    let mut a = agent(5);
    adapter.save_all(&a).await;
    a.state_mut().collision_counter = 42;
    adapter.save_all(&a).await;

    let restored = adapter.load().await.unwrap().unwrap();
    assert_eq!(restored.agent.unwrap().collision_counter, 42);
}
