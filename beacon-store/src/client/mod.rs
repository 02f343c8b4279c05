//! State store client abstraction.
//!
//! A unified `StoreClient` enum that dispatches to either a remote server
//! over TCP or a service running in this process.

pub mod tcp;

pub use tcp::TcpClient;

use anyhow::{Context, Result};
use log::info;

use crate::protocol::{LoadResponse, Request, Response, SaveRequest};
use crate::service::ServiceHandle;

/// Store backend.
#[derive(Clone, Debug)]
pub enum StoreClient {
    Tcp(TcpClient),
    Memory(ServiceHandle),
}

impl StoreClient {
    pub fn tcp(addr: impl Into<String>) -> Self {
        StoreClient::Tcp(TcpClient::new(addr))
    }

    pub async fn call(&self, request: Request) -> Result<Response> {
        match self {
            StoreClient::Tcp(c) => c.call(request).await,
            StoreClient::Memory(h) => Ok(h.call(request).await?),
        }
    }

    pub async fn save(&self, req: &SaveRequest) -> Result<Response> {
        let body = serde_json::to_value(req)?;
        self.call(Request::save(body)).await
    }

    /// Fetch the latest stored state. Any non-200 answer means there is
    /// nothing usable to load.
    pub async fn load(&self) -> Result<Option<LoadResponse>> {
        let response = self.call(Request::load()).await?;
        if !response.is_ok() {
            info!(
                "No stored state ({}: {})",
                response.status,
                response.message_text().unwrap_or("no message")
            );
            return Ok(None);
        }
        let state = serde_json::from_value(response.body).context("Malformed load response")?;
        Ok(Some(state))
    }
}
