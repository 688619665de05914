//! Scripted backend for tests. Records every call in order.

use super::Backend;
use crate::error::BackendError;
use crate::models::TrackResult;
use async_trait::async_trait;
use std::sync::{Arc, Mutex};
use tokio::sync::Semaphore;

#[derive(Debug, Clone, PartialEq)]
pub enum Call {
    HealthCheck,
    SimilarSongs(usize),
    SongExists(String),
    AddSong(String),
    AddYoutubeSong(String),
    FindSongs(String),
    ListSongs,
    DeleteSong(String),
}

pub struct FakeBackend {
    calls: Mutex<Vec<Call>>,
    pub health: Mutex<Result<(), BackendError>>,
    pub similar: Mutex<Result<Vec<TrackResult>, BackendError>>,
    pub exists: Mutex<Result<bool, BackendError>>,
    pub add: Mutex<Result<(), BackendError>>,
    pub add_youtube: Mutex<Result<(), BackendError>>,
    pub find: Mutex<Result<Vec<TrackResult>, BackendError>>,
    pub list: Mutex<Result<Vec<TrackResult>, BackendError>>,
    pub delete: Mutex<Result<(), BackendError>>,
    /// When set, similarity and search calls wait for a permit before answering.
    /// The answer is taken from its slot when the call is made.
    gate: Mutex<Option<Arc<Semaphore>>>,
}

impl FakeBackend {
    pub fn new() -> Self {
        Self {
            calls: Mutex::new(Vec::new()),
            health: Mutex::new(Ok(())),
            similar: Mutex::new(Ok(Vec::new())),
            exists: Mutex::new(Ok(false)),
            add: Mutex::new(Ok(())),
            add_youtube: Mutex::new(Ok(())),
            find: Mutex::new(Ok(Vec::new())),
            list: Mutex::new(Ok(Vec::new())),
            delete: Mutex::new(Ok(())),
            gate: Mutex::new(None),
        }
    }

    pub fn gated(gate: Arc<Semaphore>) -> Self {
        let backend = Self::new();
        *backend.gate.lock().unwrap() = Some(gate);
        backend
    }

    /// Later calls answer at once; calls already waiting keep waiting
    pub fn ungate(&self) {
        *self.gate.lock().unwrap() = None;
    }

    pub fn calls(&self) -> Vec<Call> {
        self.calls.lock().unwrap().clone()
    }

    pub fn set<T: Clone>(slot: &Mutex<Result<T, BackendError>>, value: Result<T, BackendError>) {
        *slot.lock().unwrap() = value;
    }

    fn record(&self, call: Call) {
        self.calls.lock().unwrap().push(call);
    }

    async fn wait_for_gate(&self) {
        let gate = self.gate.lock().unwrap().clone();
        if let Some(gate) = gate {
            gate.acquire().await.unwrap().forget();
        }
    }
}

pub fn failure(message: &str) -> BackendError {
    BackendError::Transport(message.to_string())
}

#[async_trait]
impl Backend for FakeBackend {
    async fn health_check(&self) -> Result<(), BackendError> {
        self.record(Call::HealthCheck);
        self.health.lock().unwrap().clone()
    }

    async fn similar_songs(&self, clip: &[u8]) -> Result<Vec<TrackResult>, BackendError> {
        self.record(Call::SimilarSongs(clip.len()));
        let answer = self.similar.lock().unwrap().clone();
        self.wait_for_gate().await;
        answer
    }

    async fn song_exists(&self, id: &str) -> Result<bool, BackendError> {
        self.record(Call::SongExists(id.to_string()));
        self.exists.lock().unwrap().clone()
    }

    async fn add_song(&self, track: &TrackResult) -> Result<(), BackendError> {
        self.record(Call::AddSong(track.id.clone()));
        self.add.lock().unwrap().clone()
    }

    async fn add_youtube_song(&self, url: &str) -> Result<(), BackendError> {
        self.record(Call::AddYoutubeSong(url.to_string()));
        self.add_youtube.lock().unwrap().clone()
    }

    async fn find_songs(&self, query: &str) -> Result<Vec<TrackResult>, BackendError> {
        self.record(Call::FindSongs(query.to_string()));
        let answer = self.find.lock().unwrap().clone();
        self.wait_for_gate().await;
        answer
    }

    async fn list_songs(&self) -> Result<Vec<TrackResult>, BackendError> {
        self.record(Call::ListSongs);
        self.list.lock().unwrap().clone()
    }

    async fn delete_song(&self, id: &str) -> Result<(), BackendError> {
        self.record(Call::DeleteSong(id.to_string()));
        self.delete.lock().unwrap().clone()
    }
}
