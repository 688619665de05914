//! Microphone capture using PipeWire
//!
//! Runs the PipeWire main loop on a dedicated thread and hands the finished
//! WAV clip to the session's chunk buffer when capture stops.

use super::encoder::{apply_auto_gain, calculate_peak, calculate_rms, WavEncoder};
use super::session::{ChunkBuffer, ChunkSource};
use crate::error::CaptureError;
use log::{debug, info, warn};
use pipewire as pw;
use pw::spa;
use pw::spa::param::format::{MediaSubtype, MediaType};
use pw::spa::param::format_utils;
use pw::spa::pod::Pod;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::mpsc;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use std::thread::{self, JoinHandle};
use std::time::Duration;

/// How long `open` waits for the stream to connect
const CONNECT_TIMEOUT: Duration = Duration::from_secs(5);

/// Below this RMS level a recording is reported as nearly silent
const SILENCE_RMS: f32 = 0.001;

/// Current state of audio capture
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum CaptureState {
    Idle,
    Capturing,
    Error(String),
}

/// Audio capture configuration
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CaptureConfig {
    /// Sample rate (default: 44100)
    pub sample_rate: u32,
    /// Number of channels (default: 1 for mono)
    pub channels: u32,
    pub echo_cancellation: bool,
    pub noise_suppression: bool,
    /// Normalise the clip level when capture stops
    pub auto_gain: bool,
}

impl Default for CaptureConfig {
    fn default() -> Self {
        Self {
            sample_rate: 44100,
            channels: 1,
            echo_cancellation: true,
            noise_suppression: true,
            auto_gain: true,
        }
    }
}

impl CaptureConfig {
    /// PipeWire media role. The communication role is what the session
    /// manager routes through its echo-cancel and noise filter nodes.
    pub fn media_role(&self) -> &'static str {
        if self.echo_cancellation || self.noise_suppression {
            "Communication"
        } else {
            "Production"
        }
    }
}

/// Shared state between the capture thread and the session - thread-safe
#[derive(Clone)]
pub struct SharedCaptureState {
    inner: Arc<Mutex<CaptureStateInner>>,
}

struct CaptureStateInner {
    /// Captured mono samples
    samples: Vec<f32>,
    /// Negotiated sample rate, 0 until the format is known
    sample_rate: u32,
    state: CaptureState,
}

impl SharedCaptureState {
    pub fn new() -> Self {
        Self {
            inner: Arc::new(Mutex::new(CaptureStateInner {
                samples: Vec::new(),
                sample_rate: 0,
                state: CaptureState::Idle,
            })),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CaptureStateInner> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn state(&self) -> CaptureState {
        self.lock().state.clone()
    }

    pub fn sample_rate(&self) -> u32 {
        self.lock().sample_rate
    }

    pub fn set_state(&self, state: CaptureState) {
        self.lock().state = state;
    }

    pub fn set_error(&self, error: String) {
        self.lock().state = CaptureState::Error(error);
    }

    pub fn reset(&self) {
        let mut inner = self.lock();
        inner.samples.clear();
        inner.sample_rate = 0;
        inner.state = CaptureState::Idle;
    }

    /// Take the captured samples, leaving the buffer empty
    pub fn take_samples(&self) -> Vec<f32> {
        std::mem::take(&mut self.lock().samples)
    }

    /// Append incoming mono samples
    pub fn process_samples(&self, samples: &[f32], sample_rate: u32) {
        let mut inner = self.lock();
        inner.sample_rate = sample_rate;
        inner.samples.extend_from_slice(samples);
    }
}

impl Default for SharedCaptureState {
    fn default() -> Self {
        Self::new()
    }
}

enum PipeWireCommand {
    Stop,
}

/// Microphone source backed by a PipeWire capture stream
pub struct PipeWireSource {
    state: SharedCaptureState,
    is_running: Arc<AtomicBool>,
    thread_handle: Option<JoinHandle<()>>,
    sender: Option<pw::channel::Sender<PipeWireCommand>>,
    config: CaptureConfig,
    sink: Option<ChunkBuffer>,
}

impl PipeWireSource {
    pub fn new() -> Self {
        Self {
            state: SharedCaptureState::new(),
            is_running: Arc::new(AtomicBool::new(false)),
            thread_handle: None,
            sender: None,
            config: CaptureConfig::default(),
            sink: None,
        }
    }

    /// Stop the main loop and wait for the capture thread
    fn shutdown(&mut self) {
        if let Some(sender) = self.sender.take() {
            let _ = sender.send(PipeWireCommand::Stop);
        }

        if let Some(handle) = self.thread_handle.take() {
            if handle.join().is_err() {
                warn!("PipeWire capture thread panicked");
            }
        }

        self.is_running.store(false, Ordering::SeqCst);
    }
}

impl Default for PipeWireSource {
    fn default() -> Self {
        Self::new()
    }
}

impl ChunkSource for PipeWireSource {
    fn open(&mut self, config: &CaptureConfig, sink: ChunkBuffer) -> Result<(), CaptureError> {
        if self.is_running.load(Ordering::SeqCst) {
            return Err(CaptureError::AlreadyStarted);
        }

        self.state.reset();
        self.state.set_state(CaptureState::Capturing);
        self.is_running.store(true, Ordering::SeqCst);
        self.config = config.clone();

        let state = self.state.clone();
        let is_running = self.is_running.clone();
        let thread_config = config.clone();

        let (sender, receiver) = pw::channel::channel::<PipeWireCommand>();
        self.sender = Some(sender);

        let (ready_tx, ready_rx) = mpsc::channel::<Result<(), String>>();

        let handle = thread::spawn(move || {
            if let Err(e) = run_capture_loop(state.clone(), thread_config, receiver, ready_tx.clone()) {
                let _ = ready_tx.send(Err(e.clone()));
                state.set_error(e);
            }
            is_running.store(false, Ordering::SeqCst);
        });
        self.thread_handle = Some(handle);

        let outcome = match ready_rx.recv_timeout(CONNECT_TIMEOUT) {
            Ok(Ok(())) => Ok(()),
            Ok(Err(e)) => Err(e),
            Err(mpsc::RecvTimeoutError::Timeout) => {
                Err("timed out waiting for the audio input to connect".to_string())
            }
            Err(mpsc::RecvTimeoutError::Disconnected) => {
                Err("capture thread exited before connecting".to_string())
            }
        };

        match outcome {
            Ok(()) => {
                info!(
                    "Capturing from PipeWire at {} Hz, {} channel(s), role {}",
                    config.sample_rate,
                    config.channels,
                    config.media_role()
                );
                self.sink = Some(sink);
                Ok(())
            }
            Err(e) => {
                self.shutdown();
                self.state.reset();
                Err(CaptureError::DeviceUnavailable(e))
            }
        }
    }

    fn close(&mut self) -> Result<(), CaptureError> {
        let Some(sink) = self.sink.take() else {
            return Ok(());
        };

        self.shutdown();

        let failure = match self.state.state() {
            CaptureState::Error(e) => Some(e),
            _ => None,
        };
        self.state.set_state(CaptureState::Idle);

        let sample_rate = match self.state.sample_rate() {
            0 => self.config.sample_rate,
            rate => rate,
        };
        let mut samples = self.state.take_samples();

        if samples.is_empty() {
            if let Some(e) = failure {
                return Err(CaptureError::DeviceUnavailable(e));
            }
            debug!("No audio captured");
            return Ok(());
        }

        if let Some(e) = failure {
            warn!("Capture stream reported an error after recording started: {}", e);
        }

        if calculate_rms(&samples) < SILENCE_RMS {
            warn!("Recording is nearly silent");
        }

        if self.config.auto_gain {
            apply_auto_gain(&mut samples);
        }

        debug!(
            "Captured {:.2}s at {} Hz (peak {:.3})",
            samples.len() as f64 / sample_rate as f64,
            sample_rate,
            calculate_peak(&samples)
        );

        let wav = WavEncoder::new(sample_rate, 1)
            .encode(&samples)
            .map_err(CaptureError::Encoding)?;
        sink.push(wav);

        Ok(())
    }
}

impl Drop for PipeWireSource {
    fn drop(&mut self) {
        if self.is_running.load(Ordering::SeqCst) || self.thread_handle.is_some() {
            self.shutdown();
        }
    }
}

/// Run the PipeWire capture loop in a background thread
fn run_capture_loop(
    state: SharedCaptureState,
    config: CaptureConfig,
    receiver: pw::channel::Receiver<PipeWireCommand>,
    ready: mpsc::Sender<Result<(), String>>,
) -> Result<(), String> {
    pw::init();

    let mainloop = pw::main_loop::MainLoopRc::new(None)
        .map_err(|e| format!("Failed to create PipeWire main loop: {}", e))?;

    let context = pw::context::ContextRc::new(&mainloop, None)
        .map_err(|e| format!("Failed to create PipeWire context: {}", e))?;

    let core = context
        .connect_rc(None)
        .map_err(|e| format!("Failed to connect to PipeWire: {}", e))?;

    let mainloop_weak = mainloop.downgrade();
    let _receiver = receiver.attach(mainloop.loop_(), move |cmd| match cmd {
        PipeWireCommand::Stop => {
            if let Some(mainloop) = mainloop_weak.upgrade() {
                mainloop.quit();
            }
        }
    });

    struct UserData {
        format: spa::param::audio::AudioInfoRaw,
        state: SharedCaptureState,
    }

    let user_data = UserData {
        format: Default::default(),
        state: state.clone(),
    };

    let props = pw::properties::properties! {
        *pw::keys::MEDIA_TYPE => "Audio",
        *pw::keys::MEDIA_CATEGORY => "Capture",
        *pw::keys::MEDIA_ROLE => config.media_role(),
        *pw::keys::APP_NAME => "SonicScan",
    };

    let stream = pw::stream::StreamBox::new(&core, "sonicscan-capture", props)
        .map_err(|e| format!("Failed to create PipeWire stream: {}", e))?;

    let _listener = stream
        .add_local_listener_with_user_data(user_data)
        .state_changed(|_, user_data, _old, new| {
            if let pw::stream::StreamState::Error(e) = new {
                user_data.state.set_error(e);
            }
        })
        .param_changed(|_, user_data, id, param| {
            let Some(param) = param else { return };
            if id != spa::param::ParamType::Format.as_raw() {
                return;
            }

            let (media_type, media_subtype) = match format_utils::parse_format(param) {
                Ok(v) => v,
                Err(_) => return,
            };

            if media_type != MediaType::Audio || media_subtype != MediaSubtype::Raw {
                return;
            }

            if let Err(e) = user_data.format.parse(param) {
                user_data
                    .state
                    .set_error(format!("Failed to parse audio format: {:?}", e));
            }
        })
        .process(|stream, user_data| {
            let Some(mut buffer) = stream.dequeue_buffer() else {
                return;
            };

            let datas = buffer.datas_mut();
            if datas.is_empty() {
                return;
            }

            let data = &mut datas[0];
            let n_channels = user_data.format.channels().max(1) as usize;
            let sample_rate = user_data.format.rate();
            let size = data.chunk().size() as usize;

            if let Some(raw) = data.data() {
                let raw = &raw[..size.min(raw.len())];
                let frame_bytes = n_channels * std::mem::size_of::<f32>();
                let mut mono = Vec::with_capacity(raw.len() / frame_bytes);

                // Downmix interleaved frames to mono
                for frame in raw.chunks_exact(frame_bytes) {
                    let sum: f32 = frame
                        .chunks_exact(std::mem::size_of::<f32>())
                        .map(|b| f32::from_le_bytes([b[0], b[1], b[2], b[3]]))
                        .sum();
                    mono.push(sum / n_channels as f32);
                }

                user_data.state.process_samples(&mono, sample_rate);
            }
        })
        .register()
        .map_err(|e| format!("Failed to register stream listener: {}", e))?;

    let mut audio_info = spa::param::audio::AudioInfoRaw::new();
    audio_info.set_format(spa::param::audio::AudioFormat::F32LE);
    audio_info.set_rate(config.sample_rate);
    audio_info.set_channels(config.channels);

    let obj = spa::pod::Object {
        type_: spa::utils::SpaTypes::ObjectParamFormat.as_raw(),
        id: spa::param::ParamType::EnumFormat.as_raw(),
        properties: audio_info.into(),
    };

    let values: Vec<u8> = spa::pod::serialize::PodSerializer::serialize(
        std::io::Cursor::new(Vec::new()),
        &spa::pod::Value::Object(obj),
    )
    .map_err(|e| format!("Failed to serialize audio format: {:?}", e))?
    .0
    .into_inner();

    let pod = Pod::from_bytes(&values).ok_or("Failed to build audio format pod")?;
    let mut params = [pod];

    stream
        .connect(
            spa::utils::Direction::Input,
            None,
            pw::stream::StreamFlags::AUTOCONNECT
                | pw::stream::StreamFlags::MAP_BUFFERS
                | pw::stream::StreamFlags::RT_PROCESS,
            &mut params,
        )
        .map_err(|e| format!("Failed to connect stream: {}", e))?;

    let _ = ready.send(Ok(()));

    // Run until stopped
    mainloop.run();

    Ok(())
}
