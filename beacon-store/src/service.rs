//! The state service: answers load/save requests against a `RecordStore`.
//!
//! `StateService` is plain synchronous logic. `spawn` moves it onto a
//! blocking task that owns the store and drains a request channel, so every
//! write is serialized no matter how many connections feed it.

use log::{debug, error, warn};
use serde_json::Value;
use tokio::sync::{mpsc, oneshot};

use crate::error::StoreError;
use crate::protocol::*;
use crate::record::RecordStore;

/// Channel buffer size for queued requests.
const REQUEST_CHANNEL_SIZE: usize = 1024;

#[derive(Debug)]
pub struct StateService {
    store: RecordStore,
}

impl StateService {
    pub fn new(store: RecordStore) -> Self {
        Self { store }
    }

    pub fn store(&self) -> &RecordStore {
        &self.store
    }

    /// Route one request.
    pub fn handle(&mut self, request: &Request) -> Response {
        match (request.path.as_str(), request.method) {
            (SAVE_PATH, Method::Post) => self.save(request.body.as_ref()),
            (LOAD_PATH, Method::Get) => self.load(),
            (SAVE_PATH, _) | (LOAD_PATH, _) => {
                Response::message(STATUS_METHOD_NOT_ALLOWED, MSG_METHOD_NOT_ALLOWED)
            }
            _ => Response::message(STATUS_NOT_FOUND, MSG_UNKNOWN_PATH),
        }
    }

    fn save(&mut self, body: Option<&Value>) -> Response {
        let Some(req) = SaveRequest::from_body(body) else {
            return Response::message(STATUS_BAD_REQUEST, MSG_INVALID_INPUT);
        };
        match self.store.append(req.layer, &req.kind, &req.data) {
            Ok(row) => {
                debug!("Saved row {} ({} / {})", row.id, row.layer, row.kind);
                Response::message(STATUS_OK, MSG_SAVED)
            }
            Err(e) => {
                error!("Failed to save {} / {}: {}", req.layer, req.kind, e);
                Response::message(STATUS_INTERNAL_ERROR, MSG_SAVE_FAILED)
            }
        }
    }

    fn load(&self) -> Response {
        let latest = self.store.latest();
        if latest.is_empty() {
            return Response::message(STATUS_NOT_FOUND, MSG_NO_STATE);
        }

        let mut state = LoadResponse::default();
        for row in latest {
            let data = match row.decode_data() {
                Ok(v) => v,
                Err(e) => {
                    warn!("Skipping row {} with undecodable data: {}", row.id, e);
                    continue;
                }
            };
            match (row.layer, row.kind.as_str()) {
                (LayerKey::Index(i), KIND_WEIGHT) => {
                    state.weights.insert(i.to_string(), data);
                }
                (LayerKey::Index(i), KIND_BIAS) => {
                    state.biases.insert(i.to_string(), data);
                }
                (LayerKey::Tag(_), key) => {
                    state.metadata.insert(key.to_string(), data);
                }
                (LayerKey::Index(i), other) => {
                    debug!("Ignoring row type {:?} on layer {}", other, i);
                }
            }
        }

        match serde_json::to_value(&state) {
            Ok(body) => Response { status: STATUS_OK, body },
            Err(e) => {
                error!("Failed to encode load response: {}", e);
                Response::message(STATUS_INTERNAL_ERROR, MSG_SAVE_FAILED)
            }
        }
    }
}

struct Envelope {
    request: Request,
    reply: oneshot::Sender<Response>,
}

/// Cloneable handle to a running service.
#[derive(Clone, Debug)]
pub struct ServiceHandle {
    tx: mpsc::Sender<Envelope>,
}

impl std::fmt::Debug for Envelope {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Envelope").field("request", &self.request).finish()
    }
}

impl ServiceHandle {
    pub async fn call(&self, request: Request) -> Result<Response, StoreError> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(Envelope { request, reply })
            .await
            .map_err(|_| StoreError::ServiceClosed)?;
        rx.await.map_err(|_| StoreError::ServiceClosed)
    }
}

/// Run `service` on a blocking task. It stops once every handle is dropped.
pub fn spawn(mut service: StateService) -> ServiceHandle {
    let (tx, mut rx) = mpsc::channel::<Envelope>(REQUEST_CHANNEL_SIZE);
    tokio::task::spawn_blocking(move || {
        while let Some(envelope) = rx.blocking_recv() {
            let response = service.handle(&envelope.request);
            // The caller may have given up waiting
            let _ = envelope.reply.send(response);
        }
        debug!("State service stopped after {} rows", service.store().len());
    });
    ServiceHandle { tx }
}
