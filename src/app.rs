//! Application controller for SonicScan
//!
//! Owns the UI state container and runs every user flow: recording and
//! identifying a clip, adding tracks by link or pick, and managing the stored
//! library. Each backend failure is logged by the client and surfaced here as
//! exactly one notification; local state only changes on confirmed success.

use crate::audio::{CaptureConfig, CaptureSession, ChunkSource, Clip, ClipArchive, Microphone, PipeWireSource};
use crate::backend::Backend;
use crate::client::{self, IngestOutcome, LibraryClient, SimilarityClient};
use crate::error::{CaptureError, ClientError};
use crate::models::TrackResult;
use crate::notify::Notifier;
use crate::state::{ActiveView, AppState};
use log::{debug, info, warn};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// Builds a fresh audio source for each capture session
pub type SourceFactory = Arc<dyn Fn() -> Box<dyn ChunkSource> + Send + Sync>;

/// Sessions record from the PipeWire default input
pub fn pipewire_sources() -> SourceFactory {
    Arc::new(|| Box::new(PipeWireSource::new()) as Box<dyn ChunkSource>)
}

type Session = CaptureSession<Box<dyn ChunkSource>>;

/// Result of adding a track through the exists-then-insert flow
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AddOutcome {
    Added,
    AlreadyPresent,
}

/// The root application controller
#[derive(Clone)]
pub struct SonicScan {
    backend: Arc<dyn Backend>,
    similarity: SimilarityClient,
    library: LibraryClient,
    notifier: Notifier,
    state: Arc<Mutex<AppState>>,
    microphone: Microphone,
    capture_config: CaptureConfig,
    source_factory: SourceFactory,
    session: Arc<Mutex<Option<Session>>>,
    archive: Option<Arc<ClipArchive>>,
}

impl SonicScan {
    pub fn new(backend: Arc<dyn Backend>, source_factory: SourceFactory) -> Self {
        Self {
            similarity: SimilarityClient::new(backend.clone()),
            library: LibraryClient::new(backend.clone()),
            backend,
            notifier: Notifier::new(),
            state: Arc::new(Mutex::new(AppState::new())),
            microphone: Microphone::new(),
            capture_config: CaptureConfig::default(),
            source_factory,
            session: Arc::new(Mutex::new(None)),
            archive: None,
        }
    }

    pub fn with_capture_config(mut self, config: CaptureConfig) -> Self {
        self.capture_config = config;
        self
    }

    /// Keep a copy of every recorded clip
    pub fn with_archive(mut self, archive: ClipArchive) -> Self {
        self.archive = Some(Arc::new(archive));
        self
    }

    pub fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    fn state(&self) -> MutexGuard<'_, AppState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Copy of the current state for rendering
    pub fn snapshot(&self) -> AppState {
        self.state().clone()
    }

    pub fn navigate_to(&self, view: ActiveView) {
        self.state().navigate_to(view);
    }

    /// Fire-and-forget health ping, as done when a view mounts
    pub fn startup(&self) {
        let backend = self.backend.clone();
        tokio::spawn(async move {
            let _ = client::health_check(backend.as_ref()).await;
        });
    }

    /// Health ping whose result the caller wants to see
    pub async fn health_check(&self) -> Result<(), ClientError> {
        client::health_check(self.backend.as_ref()).await
    }

    pub fn is_recording(&self) -> bool {
        self.state().is_recording
    }

    fn session(&self) -> MutexGuard<'_, Option<Session>> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Start a new capture session.
    ///
    /// Opening the device blocks until the stream connects, so it runs on the
    /// blocking pool and the event loop keeps serving other tasks meanwhile.
    pub async fn start_recording(&self) -> Result<(), CaptureError> {
        if self.session().as_ref().is_some_and(|s| s.is_recording()) || self.microphone.is_held() {
            return Err(CaptureError::AlreadyStarted);
        }

        let mut session = CaptureSession::new((self.source_factory)(), self.capture_config.clone(), &self.microphone);
        let started = tokio::task::spawn_blocking(move || session.start().map(|()| session))
            .await
            .unwrap_or_else(|e| Err(CaptureError::DeviceUnavailable(e.to_string())));

        match started {
            Ok(session) => {
                *self.session() = Some(session);
                self.state().is_recording = true;
                info!("Recording started");
                Ok(())
            }
            Err(e) => {
                warn!("Failed to start recording: {}", e);
                self.notifier.show(format!("Microphone unavailable: {}", e));
                Err(e)
            }
        }
    }

    /// Stop the active session and return its clip
    pub async fn stop_recording(&self) -> Result<Clip, CaptureError> {
        let session = self.session().take();
        self.state().is_recording = false;

        let Some(mut session) = session else {
            return Err(CaptureError::AlreadyStopped);
        };

        // Closing joins the capture thread and encodes the clip
        let stopped = tokio::task::spawn_blocking(move || session.stop())
            .await
            .unwrap_or_else(|e| Err(CaptureError::Encoding(e.to_string())));

        match stopped {
            Ok(clip) => {
                info!("Recording stopped ({} bytes)", clip.len());
                Ok(clip)
            }
            Err(e) => {
                warn!("Failed to stop recording: {}", e);
                self.notifier.show(format!("Recording failed: {}", e));
                Err(e)
            }
        }
    }

    /// Record button: start, or stop and identify what was recorded
    pub async fn toggle_recording(&self) -> Result<(), CaptureError> {
        if !self.is_recording() {
            return self.start_recording().await;
        }

        let clip = self.stop_recording().await?;
        // Query failures are already surfaced as a notification
        let _ = self.identify(clip).await;
        Ok(())
    }

    /// Ask the backend for tracks similar to `clip`.
    ///
    /// On failure the previous results stay on screen.
    pub async fn identify(&self, clip: Clip) -> Result<(), ClientError> {
        if clip.is_empty() {
            self.notifier.show("Nothing was recorded");
            return Ok(());
        }

        if let Some(archive) = &self.archive {
            match archive.save(&clip) {
                Ok(path) => info!("Clip saved to {}", path.display()),
                Err(e) => warn!("Failed to archive clip: {}", e),
            }
        }

        let ticket = self.state().similar.ticket();
        match self.similarity.find_similar(&clip).await {
            Ok(matches) => {
                if self.state().similar.replace(ticket, matches) {
                    self.notifier.show("Similar Songs Found");
                } else {
                    debug!("Dropping similar songs for a view that has moved on");
                }
                Ok(())
            }
            Err(e) => {
                self.notifier.show(format!("Similar Song Fetch Error: {}", e));
                Err(e)
            }
        }
    }

    /// Dismiss the similarity results
    pub fn clear_similar(&self) {
        self.state().similar.clear();
    }

    /// Add a track unless the library already has it
    pub async fn add_to_library(&self, track: &TrackResult) -> Result<AddOutcome, ClientError> {
        let name = track.display_name().to_string();

        let present = match self.library.exists(&track.id).await {
            Ok(present) => present,
            Err(e) => {
                self.notifier.show(format!("Error: {}", e));
                return Err(e);
            }
        };

        if present {
            self.notifier.show(format!("Song {} is already present in library", name));
            return Ok(AddOutcome::AlreadyPresent);
        }

        self.notifier
            .show(format!("Adding song {} to library, please wait 1-2 minutes", name));

        if let Err(e) = self.library.add(track).await {
            self.notifier.show(format!("Error: {}", e));
            return Err(e);
        }

        self.notifier.show(format!("Song {} added to library", name));
        self.state().search_results.remove(&track.id);
        Ok(AddOutcome::Added)
    }

    /// Add the search candidate at `index`
    pub async fn add_candidate(&self, index: usize) -> Option<Result<AddOutcome, ClientError>> {
        let track = self.state().search_results.get(index).cloned()?;
        Some(self.add_to_library(&track).await)
    }

    /// Submit a link or search text from the add form
    pub async fn submit_url(&self, input: &str) -> Result<IngestOutcome, ClientError> {
        let ticket = self.state().search_results.ticket();

        match self.library.ingest_from_url(input).await {
            Ok(IngestOutcome::Ingested) => {
                self.notifier.show("Added to database");
                Ok(IngestOutcome::Ingested)
            }
            Ok(IngestOutcome::Candidates(candidates)) => {
                let count = candidates.len();
                if self.state().search_results.replace(ticket, candidates.clone()) {
                    self.notifier.show(format!("Found {} songs", count));
                } else {
                    debug!("Dropping search results for a view that has moved on");
                }
                Ok(IngestOutcome::Candidates(candidates))
            }
            Err(e) => {
                self.notifier.show(format!("Error: {}", e));
                Err(e)
            }
        }
    }

    /// Reload the stored library
    pub async fn refresh_library(&self) -> Result<(), ClientError> {
        let ticket = self.state().library.ticket();

        match self.library.list().await {
            Ok(tracks) => {
                if self.state().library.replace(ticket, tracks) {
                    self.notifier.show("Successfully fetched songs");
                }
                Ok(())
            }
            Err(e) => {
                self.notifier.show("Failed to get songs");
                Err(e)
            }
        }
    }

    /// Delete a stored track; the local entry goes only once the backend agrees
    pub async fn delete_song(&self, id: &str) -> Result<(), ClientError> {
        match self.library.delete(id).await {
            Ok(()) => {
                self.state().library.remove(id);
                self.notifier.show("Successfully deleted song");
                Ok(())
            }
            Err(e) => {
                self.notifier.show("Failed to delete song");
                Err(e)
            }
        }
    }
}
