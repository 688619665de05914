//! HTTP implementation of the backend boundary using reqwest

use super::{Backend, Capability};
use crate::error::BackendError;
use crate::models::TrackResult;
use async_trait::async_trait;
use log::{debug, trace};
use reqwest::{Client, Response, Url};
use serde::de::DeserializeOwned;
use serde_json::json;
use std::time::Duration;

/// Default request timeout. Ingestion downloads and fingerprints a whole
/// track before answering.
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(180);

pub struct HttpBackend {
    client: Client,
    base: Url,
}

impl HttpBackend {
    pub fn new(base_url: &str, timeout: Duration) -> Result<Self, BackendError> {
        let base = Url::parse(base_url).map_err(|e| BackendError::InvalidUrl(format!("{}: {}", base_url, e)))?;
        if base.cannot_be_a_base() {
            return Err(BackendError::InvalidUrl(base_url.to_string()));
        }

        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("sonicscan/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self { client, base })
    }

    pub fn base_url(&self) -> &Url {
        &self.base
    }

    /// Join percent-escaped path segments onto the base url
    fn endpoint(&self, segments: &[&str]) -> Result<Url, BackendError> {
        let mut url = self.base.clone();
        url.path_segments_mut()
            .map_err(|_| BackendError::InvalidUrl(self.base.to_string()))?
            .pop_if_empty()
            .extend(segments);
        Ok(url)
    }

    async fn check(capability: Capability, response: Response) -> Result<Response, BackendError> {
        let status = response.status();
        trace!("{} answered {}", capability, status);
        if status.is_success() {
            return Ok(response);
        }

        let message = response.text().await.unwrap_or_default();
        Err(BackendError::Status {
            status: status.as_u16(),
            message: message.trim().to_string(),
        })
    }

    async fn json<T: DeserializeOwned>(capability: Capability, response: Response) -> Result<T, BackendError> {
        let response = Self::check(capability, response).await?;
        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| BackendError::Decode(format!("{}: {}", capability, e)))
    }
}

#[async_trait]
impl Backend for HttpBackend {
    async fn health_check(&self) -> Result<(), BackendError> {
        let url = self.endpoint(&["health"])?;
        let response = self.client.get(url).send().await?;
        Self::check(Capability::HealthCheck, response).await?;
        Ok(())
    }

    async fn similar_songs(&self, clip: &[u8]) -> Result<Vec<TrackResult>, BackendError> {
        let url = self.endpoint(&["songs", "similar"])?;
        debug!("Sending {} byte clip to {}", clip.len(), url);
        let response = self
            .client
            .post(url)
            .header(reqwest::header::CONTENT_TYPE, "application/octet-stream")
            .body(clip.to_vec())
            .send()
            .await?;
        Self::json(Capability::SimilarSongs, response).await
    }

    async fn song_exists(&self, id: &str) -> Result<bool, BackendError> {
        let url = self.endpoint(&["songs", id, "exists"])?;
        let response = self.client.get(url).send().await?;
        Self::json(Capability::SongExists, response).await
    }

    async fn add_song(&self, track: &TrackResult) -> Result<(), BackendError> {
        let url = self.endpoint(&["songs"])?;
        let response = self.client.post(url).json(track).send().await?;
        Self::check(Capability::AddSong, response).await?;
        Ok(())
    }

    async fn add_youtube_song(&self, url: &str) -> Result<(), BackendError> {
        let endpoint = self.endpoint(&["songs", "youtube"])?;
        let response = self.client.post(endpoint).json(&json!({ "url": url })).send().await?;
        Self::check(Capability::AddYoutubeSong, response).await?;
        Ok(())
    }

    async fn find_songs(&self, query: &str) -> Result<Vec<TrackResult>, BackendError> {
        let url = self.endpoint(&["songs", "search"])?;
        let response = self.client.post(url).json(&json!({ "url": query })).send().await?;
        Self::json(Capability::FindSongs, response).await
    }

    async fn list_songs(&self) -> Result<Vec<TrackResult>, BackendError> {
        let url = self.endpoint(&["songs"])?;
        let response = self.client.get(url).send().await?;
        Self::json(Capability::ListSongs, response).await
    }

    async fn delete_song(&self, id: &str) -> Result<(), BackendError> {
        let url = self.endpoint(&["songs", id])?;
        let response = self.client.delete(url).send().await?;
        Self::check(Capability::DeleteSong, response).await?;
        Ok(())
    }
}
