use crate::audio::Clip;
use crate::backend::Backend;
use crate::error::ClientError;
use crate::models::TrackResult;
use log::{debug, error};
use std::sync::Arc;

/// Sends recorded clips to the backend's similarity matcher
#[derive(Clone)]
pub struct SimilarityClient {
    backend: Arc<dyn Backend>,
}

impl SimilarityClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Ranked matches for a clip, in the order the backend returned them.
    /// The clip bytes are sent as-is.
    pub async fn find_similar(&self, clip: &Clip) -> Result<Vec<TrackResult>, ClientError> {
        debug!("Querying similar songs for a {} byte clip", clip.len());

        let matches = self.backend.similar_songs(clip.as_bytes()).await.map_err(|e| {
            error!("Similar song query failed: {}", e);
            ClientError::QueryFailed(e.to_string())
        })?;

        debug!("Backend returned {} match(es)", matches.len());
        Ok(matches)
    }
}
