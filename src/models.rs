use serde::{Deserialize, Serialize};

/// A track as returned by the backend
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TrackResult {
    pub id: String,
    pub name: String,
    #[serde(rename = "type")]
    pub kind: String,
    #[serde(default)]
    pub year: Option<String>,
    #[serde(default)]
    pub release_date: Option<String>,
    #[serde(default)]
    pub duration: Option<f64>,
    #[serde(default)]
    pub label: Option<String>,
    #[serde(default)]
    pub explicit_content: bool,
    #[serde(default)]
    pub play_count: Option<f64>,
    #[serde(default)]
    pub language: String,
    #[serde(default)]
    pub has_lyrics: bool,
    #[serde(default)]
    pub lyrics_id: Option<String>,
    pub url: String,
    #[serde(default)]
    pub copyright: Option<String>,
    #[serde(default)]
    pub album: Album,
    #[serde(default)]
    pub artists: Artists,
    #[serde(default)]
    pub image: Vec<ImageItem>,
    #[serde(default)]
    pub download_url: Vec<DownloadUrlItem>,
}

impl TrackResult {
    /// Name to show, falling back to "Unknown" for untitled tracks
    pub fn display_name(&self) -> &str {
        if self.name.trim().is_empty() {
            "Unknown"
        } else {
            &self.name
        }
    }

    /// Primary artist names joined for display
    pub fn primary_artist_names(&self) -> String {
        self.artists
            .primary
            .iter()
            .map(|artist| artist.name.as_str())
            .collect::<Vec<_>>()
            .join(", ")
    }

    /// Highest quality cover image, if any
    pub fn best_image(&self) -> Option<&ImageItem> {
        best_by_quality(&self.image)
    }

    /// Highest quality stream/download link, if any
    pub fn best_download(&self) -> Option<&DownloadUrlItem> {
        best_by_quality(&self.download_url)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Album {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub url: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artists {
    #[serde(default)]
    pub primary: Vec<Artist>,
    #[serde(default)]
    pub featured: Vec<Artist>,
    #[serde(default)]
    pub all: Vec<Artist>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Artist {
    pub id: String,
    pub name: String,
    #[serde(default)]
    pub role: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub image: Vec<ImageItem>,
    #[serde(default)]
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ImageItem {
    pub quality: String,
    pub url: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DownloadUrlItem {
    pub quality: String,
    pub url: String,
}

/// Items carrying a quality tier string
pub trait QualityTier {
    fn quality(&self) -> &str;
}

impl QualityTier for ImageItem {
    fn quality(&self) -> &str {
        &self.quality
    }
}

impl QualityTier for DownloadUrlItem {
    fn quality(&self) -> &str {
        &self.quality
    }
}

/// Comparable rank parsed from a quality tier string.
///
/// Tiers look like `320kbps` for audio, `500x500` for images, or a plain
/// name such as `high`. Anything else ranks as `Unknown`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum QualityRank {
    Unknown,
    Named(u8),
    Bitrate(u32),
    Resolution(u64),
}

impl QualityRank {
    pub fn parse(tier: &str) -> Self {
        let tier = tier.trim().to_ascii_lowercase();

        if let Some(kbps) = tier.strip_suffix("kbps") {
            if let Ok(rate) = kbps.trim().parse::<u32>() {
                return QualityRank::Bitrate(rate);
            }
        }

        if let Some((w, h)) = tier.split_once('x') {
            if let (Ok(w), Ok(h)) = (w.trim().parse::<u64>(), h.trim().parse::<u64>()) {
                return QualityRank::Resolution(w.saturating_mul(h));
            }
        }

        match tier.as_str() {
            "low" => QualityRank::Named(0),
            "medium" => QualityRank::Named(1),
            "high" => QualityRank::Named(2),
            _ => QualityRank::Unknown,
        }
    }
}

/// Pick the best-ranked item. Ties go to the later element, so a list of
/// unrankable tiers falls back to the usual ascending-order convention.
pub fn best_by_quality<T: QualityTier>(items: &[T]) -> Option<&T> {
    items
        .iter()
        .enumerate()
        .max_by_key(|(index, item)| (QualityRank::parse(item.quality()), *index))
        .map(|(_, item)| item)
}

#[cfg(test)]
pub(crate) fn sample_track(id: &str, name: &str) -> TrackResult {
    TrackResult {
        id: id.to_string(),
        name: name.to_string(),
        kind: "song".to_string(),
        year: None,
        release_date: None,
        duration: Some(200.0),
        label: None,
        explicit_content: false,
        play_count: None,
        language: "english".to_string(),
        has_lyrics: false,
        lyrics_id: None,
        url: format!("https://example.com/song/{}", id),
        copyright: None,
        album: Album::default(),
        artists: Artists {
            primary: vec![Artist {
                id: "a1".to_string(),
                name: "Some Artist".to_string(),
                role: "primary_artists".to_string(),
                kind: "artist".to_string(),
                image: Vec::new(),
                url: String::new(),
            }],
            featured: Vec::new(),
            all: Vec::new(),
        },
        image: Vec::new(),
        download_url: Vec::new(),
    }
}
