//! Library mutations: existence checks, inserts, URL ingestion and deletes

use crate::backend::Backend;
use crate::error::ClientError;
use crate::models::TrackResult;
use log::{debug, error, info};
use regex::Regex;
use std::sync::{Arc, LazyLock};

/// Links the backend can ingest without a manual pick
static DIRECT_PROVIDER: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"youtu\.?be").expect("direct provider pattern is valid"));

static SPOTIFY: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"spotify").expect("spotify pattern is valid"));

static JIOSAAVN: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"jiosaavn").expect("jiosaavn pattern is valid"));

/// Where a submitted link or query comes from
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Provider {
    YouTube,
    Spotify,
    JioSaavn,
    /// Free text or an unrecognised link
    Other,
}

impl Provider {
    pub fn detect(input: &str) -> Self {
        if DIRECT_PROVIDER.is_match(input) {
            Provider::YouTube
        } else if SPOTIFY.is_match(input) {
            Provider::Spotify
        } else if JIOSAAVN.is_match(input) {
            Provider::JioSaavn
        } else {
            Provider::Other
        }
    }
}

/// How a submission is handled
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum IngestRoute {
    /// The backend ingests the link itself
    Direct,
    /// The backend returns candidates for the user to pick from
    Search,
}

impl IngestRoute {
    pub fn classify(input: &str) -> Self {
        match Provider::detect(input) {
            Provider::YouTube => IngestRoute::Direct,
            _ => IngestRoute::Search,
        }
    }
}

/// Terminal result of a successful submission
#[derive(Debug, Clone, PartialEq)]
pub enum IngestOutcome {
    Ingested,
    Candidates(Vec<TrackResult>),
}

#[derive(Clone)]
pub struct LibraryClient {
    backend: Arc<dyn Backend>,
}

impl LibraryClient {
    pub fn new(backend: Arc<dyn Backend>) -> Self {
        Self { backend }
    }

    /// Whether the library already holds `id`. A failure means the caller
    /// cannot proceed, not that the track is absent.
    pub async fn exists(&self, id: &str) -> Result<bool, ClientError> {
        self.backend.song_exists(id).await.map_err(|e| {
            error!("Existence check for {} failed: {}", id, e);
            ClientError::LookupFailed(e.to_string())
        })
    }

    /// Insert into storage. Callers check [`LibraryClient::exists`] first.
    pub async fn add(&self, track: &TrackResult) -> Result<(), ClientError> {
        self.backend.add_song(track).await.map_err(|e| {
            error!("Insert of {} failed: {}", track.id, e);
            ClientError::InsertFailed(e.to_string())
        })
    }

    /// Submit a link or search text
    pub async fn ingest_from_url(&self, input: &str) -> Result<IngestOutcome, ClientError> {
        let input = input.trim();
        if input.is_empty() {
            return Err(ClientError::IngestFailed("nothing to search for".to_string()));
        }

        let route = IngestRoute::classify(input);
        debug!("Submission {:?} classified as {:?} ({:?})", input, route, Provider::detect(input));

        match route {
            IngestRoute::Direct => {
                self.backend.add_youtube_song(input).await.map_err(|e| {
                    error!("Direct ingest of {} failed: {}", input, e);
                    ClientError::IngestFailed(e.to_string())
                })?;
                info!("Ingested {}", input);
                Ok(IngestOutcome::Ingested)
            }
            IngestRoute::Search => {
                let candidates = self.backend.find_songs(input).await.map_err(|e| {
                    error!("Search for {} failed: {}", input, e);
                    ClientError::IngestFailed(e.to_string())
                })?;
                debug!("Search returned {} candidate(s)", candidates.len());
                Ok(IngestOutcome::Candidates(candidates))
            }
        }
    }

    pub async fn list(&self) -> Result<Vec<TrackResult>, ClientError> {
        self.backend.list_songs().await.map_err(|e| {
            error!("Listing songs failed: {}", e);
            ClientError::ListFailed(e.to_string())
        })
    }

    pub async fn delete(&self, id: &str) -> Result<(), ClientError> {
        self.backend.delete_song(id).await.map_err(|e| {
            error!("Delete of {} failed: {}", id, e);
            ClientError::DeleteFailed(e.to_string())
        })?;
        info!("Deleted {}", id);
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::backend::fake::{failure, Call, FakeBackend};
    use crate::models::sample_track;

    fn client() -> (Arc<FakeBackend>, LibraryClient) {
        let backend = Arc::new(FakeBackend::new());
        (backend.clone(), LibraryClient::new(backend))
    }

    #[test]
    fn test_classification() {
        assert_eq!(IngestRoute::classify("https://youtu.be/xyz"), IngestRoute::Direct);
        assert_eq!(IngestRoute::classify("https://www.youtube.com/watch?v=xyz"), IngestRoute::Direct);
        assert_eq!(IngestRoute::classify("https://open.spotify.com/track/1"), IngestRoute::Search);
        assert_eq!(IngestRoute::classify("some song title"), IngestRoute::Search);
        assert_eq!(Provider::detect("https://www.jiosaavn.com/song/x"), Provider::JioSaavn);
        assert_eq!(Provider::detect("some song title"), Provider::Other);
    }

    #[tokio::test]
    async fn test_lookup_failure_is_not_absence() {
        let (backend, client) = client();
        FakeBackend::set(&backend.exists, Err(failure("timeout")));

        assert!(matches!(client.exists("abc").await, Err(ClientError::LookupFailed(_))));
        assert_eq!(backend.calls(), vec![Call::SongExists("abc".into())]);
    }

    #[tokio::test]
    async fn test_insert_failure() {
        let (backend, client) = client();
        FakeBackend::set(&backend.add, Err(failure("redis down")));

        let result = client.add(&sample_track("abc", "Song")).await;
        assert!(matches!(result, Err(ClientError::InsertFailed(m)) if m.contains("redis down")));
    }

    #[tokio::test]
    async fn test_direct_link_never_searches() {
        let (backend, client) = client();
        FakeBackend::set(&backend.find, Ok(vec![sample_track("x", "X")]));

        let outcome = client.ingest_from_url("https://youtu.be/xyz").await.unwrap();

        assert_eq!(outcome, IngestOutcome::Ingested);
        assert_eq!(backend.calls(), vec![Call::AddYoutubeSong("https://youtu.be/xyz".into())]);
    }

    #[tokio::test]
    async fn test_failed_direct_ingest_does_not_fall_back_to_search() {
        let (backend, client) = client();
        FakeBackend::set(&backend.add_youtube, Err(failure("download failed")));

        let result = client.ingest_from_url("https://youtu.be/xyz").await;

        assert!(matches!(result, Err(ClientError::IngestFailed(_))));
        assert_eq!(backend.calls().len(), 1);
    }

    #[tokio::test]
    async fn test_text_goes_through_search_in_received_order() {
        let (backend, client) = client();
        FakeBackend::set(&backend.find, Ok(vec![sample_track("2", "Two"), sample_track("1", "One")]));

        let outcome = client.ingest_from_url("  some song title ").await.unwrap();

        let IngestOutcome::Candidates(list) = outcome else {
            panic!("expected candidates");
        };
        assert_eq!(list.len(), 2);
        assert_eq!(list[0].id, "2");
        assert_eq!(list[1].id, "1");
        assert_eq!(backend.calls(), vec![Call::FindSongs("some song title".into())]);
    }

    #[tokio::test]
    async fn test_empty_submission_is_rejected_locally() {
        let (backend, client) = client();
        assert!(matches!(
            client.ingest_from_url("   ").await,
            Err(ClientError::IngestFailed(_))
        ));
        assert!(backend.calls().is_empty());
    }

    #[tokio::test]
    async fn test_delete_and_list_errors() {
        let (backend, client) = client();
        FakeBackend::set(&backend.delete, Err(failure("gone")));
        FakeBackend::set(&backend.list, Err(failure("down")));

        assert!(matches!(client.delete("abc").await, Err(ClientError::DeleteFailed(_))));
        assert!(matches!(client.list().await, Err(ClientError::ListFailed(_))));
    }
}
