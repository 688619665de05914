//! Typed boundary to the SonicScan backend
//!
//! Every remote capability is one method on [`Backend`]; there is no
//! stringly-typed command dispatch on this side of the boundary.

mod http;

#[cfg(test)]
pub(crate) mod fake;

use crate::error::BackendError;
use crate::models::TrackResult;
use async_trait::async_trait;

pub use http::{HttpBackend, DEFAULT_TIMEOUT};

/// The remote capabilities, named for logging
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Capability {
    HealthCheck,
    SimilarSongs,
    SongExists,
    AddSong,
    AddYoutubeSong,
    FindSongs,
    ListSongs,
    DeleteSong,
}

impl Capability {
    pub fn name(&self) -> &'static str {
        match self {
            Capability::HealthCheck => "health check",
            Capability::SimilarSongs => "similarity match",
            Capability::SongExists => "existence check",
            Capability::AddSong => "insert track",
            Capability::AddYoutubeSong => "url ingest",
            Capability::FindSongs => "url search",
            Capability::ListSongs => "list tracks",
            Capability::DeleteSong => "delete track",
        }
    }
}

impl std::fmt::Display for Capability {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.name())
    }
}

#[async_trait]
pub trait Backend: Send + Sync {
    /// Cache/health ping
    async fn health_check(&self) -> Result<(), BackendError>;

    /// Rank library tracks by similarity to an encoded clip
    async fn similar_songs(&self, clip: &[u8]) -> Result<Vec<TrackResult>, BackendError>;

    async fn song_exists(&self, id: &str) -> Result<bool, BackendError>;

    /// Download, fingerprint and store a track
    async fn add_song(&self, track: &TrackResult) -> Result<(), BackendError>;

    /// Ingest a YouTube link directly
    async fn add_youtube_song(&self, url: &str) -> Result<(), BackendError>;

    /// Resolve a link or text query into candidate tracks
    async fn find_songs(&self, query: &str) -> Result<Vec<TrackResult>, BackendError>;

    async fn list_songs(&self) -> Result<Vec<TrackResult>, BackendError>;

    async fn delete_song(&self, id: &str) -> Result<(), BackendError>;
}
