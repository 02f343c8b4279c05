//! Beacon Store: persistence for beacon-core agents.
//!
//! An append-only record store behind a small line-delimited JSON service,
//! plus the client and adapter a trainer uses to save and restore its agent.

pub mod adapter;
pub mod client;
pub mod error;
pub mod protocol;
pub mod record;
pub mod server;
pub mod service;

pub use adapter::{PersistenceAdapter, Restored, SaveSummary};
pub use client::StoreClient;
pub use error::StoreError;
pub use record::RecordStore;
pub use service::{ServiceHandle, StateService};
