use thiserror::Error;

/// Errors from the record store and the service channel.
#[derive(Error, Debug)]
pub enum StoreError {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Corrupt record #{record}: {reason}")]
    Corrupt { record: usize, reason: String },

    #[error("State service has shut down")]
    ServiceClosed,
}
