//! Bridges a running `Agent` and the state store.
//!
//! Saving splits the snapshot into one request per weight layer, bias layer
//! and metadata key. Loading reassembles those rows into a network import
//! and an `AgentState`.

use std::collections::BTreeMap;

use anyhow::Result;
use beacon_core::{Agent, AgentState, NetworkState, StateImport};
use futures::future::join_all;
use log::{debug, info, warn};
use serde_json::{Map, Value};

use crate::client::StoreClient;
use crate::protocol::{LayerKey, LoadResponse, SaveRequest, KIND_BIAS, KIND_WEIGHT};

/// State decoded from a load response.
#[derive(Debug, Clone, Default)]
pub struct Restored {
    pub network: StateImport,
    /// `None` when the response carried no metadata.
    pub agent: Option<AgentState>,
}

/// Outcome counts of an awaited save.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SaveSummary {
    pub ok: usize,
    pub failed: usize,
}

/// Every save request needed to persist `network` and `agent`.
pub fn build_save_requests(network: &NetworkState, agent: &AgentState) -> Vec<SaveRequest> {
    let mut requests = Vec::with_capacity(network.weights.len() * 2 + 9);

    for (layer, (weights, biases)) in network.weights.iter().zip(&network.biases).enumerate() {
        requests.push(SaveRequest {
            layer: LayerKey::Index(layer),
            kind: KIND_WEIGHT.to_string(),
            data: Value::from(weights.clone()),
        });
        requests.push(SaveRequest {
            layer: LayerKey::Index(layer),
            kind: KIND_BIAS.to_string(),
            data: Value::from(biases.clone()),
        });
    }

    match serde_json::to_value(agent) {
        Ok(Value::Object(fields)) => {
            for (key, data) in fields {
                requests.push(SaveRequest {
                    layer: LayerKey::METADATA,
                    kind: key,
                    data,
                });
            }
        }
        Ok(other) => warn!("Agent state encoded as non-object: {}", other),
        Err(e) => warn!("Failed to encode agent state: {}", e),
    }

    requests
}

/// Layer vectors ordered by numeric layer index. `None` if the map is empty
/// or any entry is unusable.
fn decode_layers(role: &str, map: &BTreeMap<String, Value>) -> Option<Vec<Vec<f64>>> {
    if map.is_empty() {
        return None;
    }
    let mut layers: Vec<(usize, Vec<f64>)> = Vec::with_capacity(map.len());
    for (key, value) in map {
        let Ok(index) = key.parse::<usize>() else {
            warn!("Skipping {} entry with non-numeric layer {:?}", role, key);
            continue;
        };
        match serde_json::from_value::<Vec<f64>>(value.clone()) {
            Ok(v) => layers.push((index, v)),
            Err(e) => {
                warn!("Unusable {} for layer {}: {}", role, index, e);
                return None;
            }
        }
    }
    layers.sort_by_key(|(index, _)| *index);
    Some(layers.into_iter().map(|(_, v)| v).collect())
}

/// Merge stored metadata onto default agent state. Keys that fail to decode
/// keep their defaults.
fn decode_metadata(metadata: &BTreeMap<String, Value>) -> Option<AgentState> {
    if metadata.is_empty() {
        return None;
    }
    let mut accepted = Map::new();
    for (key, value) in metadata {
        let mut candidate = accepted.clone();
        candidate.insert(key.clone(), value.clone());
        match serde_json::from_value::<AgentState>(Value::Object(candidate.clone())) {
            Ok(_) => accepted = candidate,
            Err(e) => warn!("Ignoring stored metadata {:?}: {}", key, e),
        }
    }
    serde_json::from_value(Value::Object(accepted)).ok()
}

/// Turn a load response into importable state.
pub fn decode_load(response: &LoadResponse) -> Restored {
    Restored {
        network: StateImport {
            weights: decode_layers("weights", &response.weights),
            biases: decode_layers("biases", &response.biases),
        },
        agent: decode_metadata(&response.metadata),
    }
}

/// Push restored state into `agent`. Returns whether the network was imported.
pub fn apply(agent: &mut Agent, restored: Restored) -> bool {
    let imported = agent.import_network(restored.network).is_ok();
    if let Some(state) = restored.agent {
        agent.restore_state(state);
    }
    imported
}

#[derive(Clone, Debug)]
pub struct PersistenceAdapter {
    client: StoreClient,
}

impl PersistenceAdapter {
    pub fn new(client: StoreClient) -> Self {
        Self { client }
    }

    pub fn client(&self) -> &StoreClient {
        &self.client
    }

    /// Fire one task per save request and return immediately. Outcomes are
    /// only logged.
    pub fn save_detached(&self, agent: &Agent) -> usize {
        let requests = build_save_requests(&agent.network().export_state(), agent.state());
        let count = requests.len();
        for req in requests {
            let client = self.client.clone();
            tokio::spawn(async move {
                match client.save(&req).await {
                    Ok(resp) if resp.is_ok() => debug!("Saved {} / {}", req.layer, req.kind),
                    Ok(resp) => warn!(
                        "Save of {} / {} refused ({}: {})",
                        req.layer,
                        req.kind,
                        resp.status,
                        resp.message_text().unwrap_or("no message")
                    ),
                    Err(e) => warn!("Save of {} / {} failed: {:#}", req.layer, req.kind, e),
                }
            });
        }
        debug!("Dispatched {} save requests", count);
        count
    }

    /// Save everything and wait for every response.
    pub async fn save_all(&self, agent: &Agent) -> SaveSummary {
        let requests = build_save_requests(&agent.network().export_state(), agent.state());
        let results = join_all(requests.iter().map(|req| self.client.save(req))).await;

        let mut summary = SaveSummary::default();
        for (req, result) in requests.iter().zip(results) {
            match result {
                Ok(resp) if resp.is_ok() => summary.ok += 1,
                Ok(resp) => {
                    warn!("Save of {} / {} refused ({})", req.layer, req.kind, resp.status);
                    summary.failed += 1;
                }
                Err(e) => {
                    warn!("Save of {} / {} failed: {:#}", req.layer, req.kind, e);
                    summary.failed += 1;
                }
            }
        }
        info!("Saved state: {} ok, {} failed", summary.ok, summary.failed);
        summary
    }

    /// Fetch and decode stored state. `Ok(None)` when the store has none.
    pub async fn load(&self) -> Result<Option<Restored>> {
        Ok(self.client.load().await?.map(|resp| decode_load(&resp)))
    }
}
