//! TCP front end for the state service.
//!
//! Each connection may carry any number of request lines; every line gets
//! exactly one response line. A line that is not a valid request is answered
//! with 400 and the connection stays open.

use log::{debug, info, warn};
use tokio::io::{AsyncBufReadExt, AsyncWriteExt, BufReader};
use tokio::net::{TcpListener, TcpStream};

use crate::error::StoreError;
use crate::protocol::{encode_line, Request, Response, MSG_INVALID_INPUT, STATUS_BAD_REQUEST};
use crate::service::ServiceHandle;

/// Accept connections until the listener fails.
pub async fn serve(listener: TcpListener, service: ServiceHandle) -> Result<(), StoreError> {
    info!("Listening on {}", listener.local_addr()?);
    loop {
        let (stream, peer) = listener.accept().await?;
        let service = service.clone();
        tokio::spawn(async move {
            debug!("Connection from {}", peer);
            if let Err(e) = handle_connection(stream, service).await {
                warn!("Connection {} ended with error: {}", peer, e);
            }
        });
    }
}

async fn handle_connection(stream: TcpStream, service: ServiceHandle) -> Result<(), StoreError> {
    let (read_half, mut write_half) = stream.into_split();
    let mut lines = BufReader::new(read_half).lines();

    while let Some(line) = lines.next_line().await? {
        if line.trim().is_empty() {
            continue;
        }
        let response = match serde_json::from_str::<Request>(&line) {
            Ok(request) => service.call(request).await?,
            Err(e) => {
                debug!("Rejecting malformed request: {}", e);
                Response::message(STATUS_BAD_REQUEST, MSG_INVALID_INPUT)
            }
        };
        write_half.write_all(encode_line(&response)?.as_bytes()).await?;
    }
    Ok(())
}
