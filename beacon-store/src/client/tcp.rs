//! TCP client: one connection per request, one line each way.

use anyhow::{anyhow, Context, Result};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::TcpStream;

use crate::protocol::{encode_line, Request, Response};

#[derive(Clone, Debug)]
pub struct TcpClient {
    addr: String,
}

impl TcpClient {
    pub fn new(addr: impl Into<String>) -> Self {
        Self { addr: addr.into() }
    }

    pub fn addr(&self) -> &str {
        &self.addr
    }

    /// Send `request` and wait for the matching response line.
    pub async fn call(&self, request: Request) -> Result<Response> {
        let stream = TcpStream::connect(&self.addr)
            .await
            .with_context(|| format!("Failed to connect to state server at {}", self.addr))?;
        let (read_half, mut write_half) = stream.into_split();

        write_half
            .write_all(encode_line(&request)?.as_bytes())
            .await
            .context("Failed to send request")?;
        write_half.shutdown().await.ok();

        let mut line = String::new();
        let n = BufReader::new(read_half)
            .read_line(&mut line)
            .await
            .context("Failed to read response")?;
        if n == 0 {
            return Err(anyhow!("State server at {} closed the connection", self.addr));
        }
        serde_json::from_str(line.trim_end()).context("Malformed response line")
    }
}
