//! Clients for the backend capabilities the front-end uses

mod library;
mod similarity;

pub use library::{IngestOutcome, LibraryClient};
pub use similarity::SimilarityClient;

use crate::backend::Backend;
use crate::error::ClientError;
use log::warn;

/// Ping the backend. Failures are logged and otherwise harmless.
pub async fn health_check(backend: &dyn Backend) -> Result<(), ClientError> {
    backend.health_check().await.map_err(|e| {
        warn!("Backend health check failed: {}", e);
        ClientError::BackendUnreachable(e.to_string())
    })
}
