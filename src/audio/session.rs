//! Single-shot capture sessions
//!
//! A session moves `NotStarted -> Recording -> Stopped` exactly once. While
//! recording it holds the exclusive [`Microphone`] and collects encoded chunks
//! in arrival order; stopping concatenates them into one immutable [`Clip`].

use super::capture::CaptureConfig;
use crate::error::CaptureError;
use log::{debug, warn};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// A finished, encoded recording
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Clip(Vec<u8>);

impl Clip {
    pub fn new(bytes: Vec<u8>) -> Self {
        Self(bytes)
    }

    pub fn as_bytes(&self) -> &[u8] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

/// Append-only buffer of encoded chunks, shared with the producing source
#[derive(Clone, Default)]
pub struct ChunkBuffer {
    chunks: Arc<Mutex<Vec<Vec<u8>>>>,
}

impl ChunkBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    fn lock(&self) -> MutexGuard<'_, Vec<Vec<u8>>> {
        self.chunks.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Append a chunk. Empty chunks carry no data and are skipped.
    pub fn push(&self, chunk: Vec<u8>) {
        if chunk.is_empty() {
            return;
        }
        self.lock().push(chunk);
    }

    pub fn chunk_count(&self) -> usize {
        self.lock().len()
    }

    /// All chunks joined in insertion order
    pub fn concat(&self) -> Vec<u8> {
        self.lock().concat()
    }
}

/// Something that can stream encoded audio chunks into a [`ChunkBuffer`]
pub trait ChunkSource: Send {
    /// Acquire the input and start producing chunks into `sink`
    fn open(&mut self, config: &CaptureConfig, sink: ChunkBuffer) -> Result<(), CaptureError>;

    /// Finish encoding, flush the remaining chunks and release the input
    fn close(&mut self) -> Result<(), CaptureError>;
}

impl ChunkSource for Box<dyn ChunkSource> {
    fn open(&mut self, config: &CaptureConfig, sink: ChunkBuffer) -> Result<(), CaptureError> {
        (**self).open(config, sink)
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        (**self).close()
    }
}

/// Exclusive handle on the audio input. Only one session may hold it.
#[derive(Clone, Default)]
pub struct Microphone {
    held: Arc<AtomicBool>,
}

impl Microphone {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_held(&self) -> bool {
        self.held.load(Ordering::SeqCst)
    }

    fn acquire(&self) -> Result<MicrophoneGuard, CaptureError> {
        self.held
            .compare_exchange(false, true, Ordering::SeqCst, Ordering::SeqCst)
            .map_err(|_| {
                CaptureError::DeviceUnavailable(
                    "microphone is held by another capture session".to_string(),
                )
            })?;

        Ok(MicrophoneGuard {
            held: self.held.clone(),
        })
    }
}

/// Releases the microphone when dropped
struct MicrophoneGuard {
    held: Arc<AtomicBool>,
}

impl Drop for MicrophoneGuard {
    fn drop(&mut self) {
        self.held.store(false, Ordering::SeqCst);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SessionState {
    NotStarted,
    Recording,
    Stopped,
}

/// One recording lifecycle, from start to finalized clip
pub struct CaptureSession<S: ChunkSource> {
    source: S,
    config: CaptureConfig,
    microphone: Microphone,
    guard: Option<MicrophoneGuard>,
    buffer: ChunkBuffer,
    state: SessionState,
}

impl<S: ChunkSource> CaptureSession<S> {
    pub fn new(source: S, config: CaptureConfig, microphone: &Microphone) -> Self {
        Self {
            source,
            config,
            microphone: microphone.clone(),
            guard: None,
            buffer: ChunkBuffer::new(),
            state: SessionState::NotStarted,
        }
    }

    pub fn state(&self) -> SessionState {
        self.state
    }

    pub fn is_recording(&self) -> bool {
        self.state == SessionState::Recording
    }

    /// Acquire the microphone and start recording
    pub fn start(&mut self) -> Result<(), CaptureError> {
        match self.state {
            SessionState::NotStarted => {}
            SessionState::Recording => return Err(CaptureError::AlreadyStarted),
            SessionState::Stopped => return Err(CaptureError::AlreadyStopped),
        }

        let guard = self.microphone.acquire()?;

        // On failure the guard drops here and releases the microphone
        self.source.open(&self.config, self.buffer.clone())?;

        self.guard = Some(guard);
        self.state = SessionState::Recording;
        debug!("Capture session started");
        Ok(())
    }

    /// Stop recording and return every chunk since start, concatenated.
    ///
    /// Stopping before any chunk arrived yields an empty clip.
    pub fn stop(&mut self) -> Result<Clip, CaptureError> {
        match self.state {
            SessionState::Stopped => return Err(CaptureError::AlreadyStopped),
            SessionState::NotStarted => {
                self.state = SessionState::Stopped;
                return Ok(Clip::default());
            }
            SessionState::Recording => {}
        }

        let closed = self.source.close();
        self.guard = None;
        self.state = SessionState::Stopped;
        closed?;

        let clip = Clip::new(self.buffer.concat());
        debug!(
            "Capture session stopped: {} chunk(s), {} bytes",
            self.buffer.chunk_count(),
            clip.len()
        );
        Ok(clip)
    }
}

impl<S: ChunkSource> Drop for CaptureSession<S> {
    fn drop(&mut self) {
        if self.state == SessionState::Recording {
            if let Err(e) = self.source.close() {
                warn!("Failed to close abandoned capture session: {}", e);
            }
        }
    }
}

#[cfg(test)]
pub(crate) mod testing {
    use super::*;
    use std::sync::mpsc;
    use std::time::Duration;

    /// Observations shared between a [`ScriptedSource`] and its test
    #[derive(Clone, Default)]
    pub struct SourceProbe {
        pub opened: Arc<AtomicBool>,
        pub closed: Arc<AtomicBool>,
    }

    /// Source that emits a fixed list of chunks: some while open, the rest on close
    pub struct ScriptedSource {
        pub on_open: Vec<Vec<u8>>,
        pub on_close: Vec<Vec<u8>>,
        pub open_error: Option<CaptureError>,
        pub probe: SourceProbe,
        sink: Option<ChunkBuffer>,
    }

    impl ScriptedSource {
        pub fn new(on_open: Vec<Vec<u8>>, on_close: Vec<Vec<u8>>) -> Self {
            Self {
                on_open,
                on_close,
                open_error: None,
                probe: SourceProbe::default(),
                sink: None,
            }
        }

        pub fn failing(error: CaptureError) -> Self {
            let mut source = Self::new(Vec::new(), Vec::new());
            source.open_error = Some(error);
            source
        }
    }

    impl ChunkSource for ScriptedSource {
        fn open(&mut self, _config: &CaptureConfig, sink: ChunkBuffer) -> Result<(), CaptureError> {
            if let Some(e) = self.open_error.clone() {
                return Err(e);
            }
            for chunk in self.on_open.drain(..) {
                sink.push(chunk);
            }
            self.sink = Some(sink);
            self.probe.opened.store(true, Ordering::SeqCst);
            Ok(())
        }

        fn close(&mut self) -> Result<(), CaptureError> {
            if let Some(sink) = self.sink.take() {
                for chunk in self.on_close.drain(..) {
                    sink.push(chunk);
                }
            }
            self.probe.closed.store(true, Ordering::SeqCst);
            Ok(())
        }
    }

    /// Source whose open blocks until the test sends a release
    pub struct BlockingSource {
        pub release: mpsc::Receiver<()>,
        pub entered: Arc<AtomicBool>,
        pub released: Arc<AtomicBool>,
    }

    impl ChunkSource for BlockingSource {
        fn open(&mut self, _config: &CaptureConfig, _sink: ChunkBuffer) -> Result<(), CaptureError> {
            self.entered.store(true, Ordering::SeqCst);
            let released = self.release.recv_timeout(Duration::from_secs(2)).is_ok();
            self.released.store(released, Ordering::SeqCst);
            Ok(())
        }

        fn close(&mut self) -> Result<(), CaptureError> {
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::testing::ScriptedSource;
    use super::*;

    fn chunk(len: usize, fill: u8) -> Vec<u8> {
        vec![fill; len]
    }

    #[test]
    fn test_stop_concatenates_chunks_in_order() {
        let mic = Microphone::new();
        let source = ScriptedSource::new(vec![chunk(10, 1), chunk(20, 2)], vec![chunk(15, 3)]);
        let mut session = CaptureSession::new(source, CaptureConfig::default(), &mic);

        session.start().unwrap();
        let clip = session.stop().unwrap();

        assert_eq!(clip.len(), 45);
        let mut expected = chunk(10, 1);
        expected.extend(chunk(20, 2));
        expected.extend(chunk(15, 3));
        assert_eq!(clip.as_bytes(), expected.as_slice());
    }

    #[test]
    fn test_stop_without_chunks_is_empty_not_error() {
        let mic = Microphone::new();
        let mut session =
            CaptureSession::new(ScriptedSource::new(Vec::new(), Vec::new()), CaptureConfig::default(), &mic);

        session.start().unwrap();
        let clip = session.stop().unwrap();
        assert!(clip.is_empty());
    }

    #[test]
    fn test_empty_chunks_are_skipped() {
        let buffer = ChunkBuffer::new();
        buffer.push(Vec::new());
        buffer.push(vec![7]);
        assert_eq!(buffer.chunk_count(), 1);
        assert_eq!(buffer.concat(), vec![7]);
    }

    #[test]
    fn test_session_is_single_shot() {
        let mic = Microphone::new();
        let mut session =
            CaptureSession::new(ScriptedSource::new(Vec::new(), Vec::new()), CaptureConfig::default(), &mic);

        session.start().unwrap();
        assert_eq!(session.start(), Err(CaptureError::AlreadyStarted));
        session.stop().unwrap();
        assert_eq!(session.start(), Err(CaptureError::AlreadyStopped));
        assert_eq!(session.stop(), Err(CaptureError::AlreadyStopped));
    }

    #[test]
    fn test_microphone_is_exclusive_and_released_on_stop() {
        let mic = Microphone::new();
        let mut first =
            CaptureSession::new(ScriptedSource::new(Vec::new(), Vec::new()), CaptureConfig::default(), &mic);
        let mut second =
            CaptureSession::new(ScriptedSource::new(Vec::new(), Vec::new()), CaptureConfig::default(), &mic);

        first.start().unwrap();
        assert!(mic.is_held());
        assert!(matches!(second.start(), Err(CaptureError::DeviceUnavailable(_))));
        assert_eq!(second.state(), SessionState::NotStarted);

        first.stop().unwrap();
        assert!(!mic.is_held());

        let mut third =
            CaptureSession::new(ScriptedSource::new(Vec::new(), Vec::new()), CaptureConfig::default(), &mic);
        third.start().unwrap();
    }

    #[test]
    fn test_failed_open_releases_microphone() {
        let mic = Microphone::new();
        let source = ScriptedSource::failing(CaptureError::DeviceUnavailable("permission denied".into()));
        let mut session = CaptureSession::new(source, CaptureConfig::default(), &mic);

        assert_eq!(
            session.start(),
            Err(CaptureError::DeviceUnavailable("permission denied".into()))
        );
        assert!(!mic.is_held());
    }

    #[test]
    fn test_abandoned_session_closes_source_and_releases() {
        let mic = Microphone::new();
        let source = ScriptedSource::new(vec![chunk(4, 9)], Vec::new());
        let probe = source.probe.clone();

        {
            let mut session = CaptureSession::new(source, CaptureConfig::default(), &mic);
            session.start().unwrap();
            assert!(mic.is_held());
        }

        assert!(probe.closed.load(Ordering::SeqCst));
        assert!(!mic.is_held());
    }

    #[test]
    fn test_stop_before_start_yields_empty_clip() {
        let mic = Microphone::new();
        let source = ScriptedSource::new(vec![chunk(4, 9)], Vec::new());
        let probe = source.probe.clone();
        let mut session = CaptureSession::new(source, CaptureConfig::default(), &mic);

        assert!(session.stop().unwrap().is_empty());
        assert!(!probe.opened.load(Ordering::SeqCst));
    }
}
