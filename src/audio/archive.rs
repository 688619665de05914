//! On-disk archive of recorded clips
//!
//! Keeps a copy of each identified clip under the local data directory so a
//! query can be replayed later with `identify --file`.

use super::session::Clip;
use std::fs;
use std::path::{Path, PathBuf};

/// Archived clip with its basic WAV properties
#[derive(Debug, Clone)]
pub struct ArchivedClip {
    pub path: PathBuf,
    pub size_bytes: u64,
    /// `None` when the file is not a readable WAV
    pub duration_seconds: Option<f64>,
}

/// Directory of saved clips
pub struct ClipArchive {
    clips_dir: PathBuf,
}

impl ClipArchive {
    pub fn new() -> Self {
        let clips_dir = dirs::data_local_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("sonicscan")
            .join("clips");

        Self { clips_dir }
    }

    /// Set the clips directory
    pub fn with_dir(mut self, dir: impl AsRef<Path>) -> Self {
        self.clips_dir = dir.as_ref().to_path_buf();
        self
    }

    pub fn dir(&self) -> &Path {
        &self.clips_dir
    }

    pub fn ensure_dir(&self) -> std::io::Result<()> {
        fs::create_dir_all(&self.clips_dir)
    }

    /// Generate a unique filename for a new clip
    pub fn generate_filename(&self) -> PathBuf {
        let timestamp = chrono::Utc::now().format("%Y%m%d_%H%M%S");
        let uuid = uuid::Uuid::new_v4().to_string()[..8].to_string();
        self.clips_dir.join(format!("clip_{}_{}.wav", timestamp, uuid))
    }

    /// Save a clip and return its path
    pub fn save(&self, clip: &Clip) -> Result<PathBuf, String> {
        self.ensure_dir()
            .map_err(|e| format!("Failed to create clips directory: {}", e))?;

        let path = self.generate_filename();
        fs::write(&path, clip.as_bytes()).map_err(|e| format!("Failed to write clip: {}", e))?;

        Ok(path)
    }

    /// Read any audio file as a clip
    pub fn load(path: impl AsRef<Path>) -> Result<Clip, String> {
        fs::read(path.as_ref())
            .map(Clip::new)
            .map_err(|e| format!("Failed to read {}: {}", path.as_ref().display(), e))
    }

    /// List all clips, newest first
    pub fn list_clips(&self) -> Result<Vec<ArchivedClip>, String> {
        self.ensure_dir()
            .map_err(|e| format!("Failed to access clips directory: {}", e))?;

        let mut paths: Vec<PathBuf> = fs::read_dir(&self.clips_dir)
            .map_err(|e| format!("Failed to read clips directory: {}", e))?
            .filter_map(|entry| entry.ok())
            .map(|entry| entry.path())
            .filter(|path| {
                path.extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase() == "wav")
                    .unwrap_or(false)
            })
            .collect();

        // Sort by modification time, newest first
        paths.sort_by(|a, b| {
            let a_time = a.metadata().and_then(|m| m.modified()).ok();
            let b_time = b.metadata().and_then(|m| m.modified()).ok();
            b_time.cmp(&a_time)
        });

        Ok(paths
            .into_iter()
            .map(|path| ArchivedClip {
                size_bytes: path.metadata().map(|m| m.len()).unwrap_or(0),
                duration_seconds: wav_duration(&path),
                path,
            })
            .collect())
    }
}

impl Default for ClipArchive {
    fn default() -> Self {
        Self::new()
    }
}

fn wav_duration(path: &Path) -> Option<f64> {
    let reader = hound::WavReader::open(path).ok()?;
    let spec = reader.spec();
    if spec.sample_rate == 0 {
        return None;
    }
    Some(reader.duration() as f64 / spec.sample_rate as f64)
}
