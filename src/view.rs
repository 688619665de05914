//! Plain-text rendering of tracks for the terminal front-end

use crate::audio::ArchivedClip;
use crate::models::TrackResult;
use std::fmt::Write;

const UNKNOWN: &str = "Unknown";

/// Format seconds as `m:ss`
pub fn format_duration(seconds: Option<f64>) -> String {
    match seconds {
        Some(s) if s.is_finite() && s >= 0.0 => {
            let total = s.round() as u64;
            format!("{}:{:02}", total / 60, total % 60)
        }
        _ => UNKNOWN.to_string(),
    }
}

fn or_unknown(value: Option<&str>) -> &str {
    match value {
        Some(v) if !v.trim().is_empty() => v,
        _ => UNKNOWN,
    }
}

/// One result card: name, artists, cover and stream links
pub fn track_card(track: &TrackResult) -> String {
    let mut out = String::new();
    let artists = track.primary_artist_names();
    let _ = writeln!(out, "{}", track.display_name());
    let _ = writeln!(out, "    by {}", if artists.is_empty() { UNKNOWN } else { &artists });
    if let Some(image) = track.best_image() {
        let _ = writeln!(out, "    cover:  {}", image.url);
    }
    if let Some(download) = track.best_download() {
        let _ = writeln!(out, "    listen: {} ({})", download.url, download.quality);
    }
    let _ = writeln!(out, "    {}", track.url);
    out
}

/// Numbered cards, 1-based so the numbers match `--pick`
pub fn candidate_list(tracks: &[TrackResult]) -> String {
    tracks
        .iter()
        .enumerate()
        .map(|(i, track)| format!("{:>2}. {}", i + 1, track_card(track)))
        .collect()
}

/// The stored library as a table
pub fn library_table(tracks: &[TrackResult]) -> String {
    let header = ["ID", "Name", "Artist", "Album", "Release Date", "Duration"];
    let rows: Vec<[String; 6]> = tracks
        .iter()
        .map(|t| {
            let artists = t.primary_artist_names();
            [
                t.id.clone(),
                t.display_name().to_string(),
                or_unknown(Some(artists.as_str())).to_string(),
                or_unknown(t.album.name.as_deref()).to_string(),
                or_unknown(t.release_date.as_deref().or(t.year.as_deref())).to_string(),
                format_duration(t.duration),
            ]
        })
        .collect();

    let mut widths = header.map(str::len);
    for row in &rows {
        for (width, cell) in widths.iter_mut().zip(row) {
            *width = (*width).max(cell.chars().count());
        }
    }

    let mut out = String::new();
    push_row(&mut out, &header.map(String::from), &widths);
    for row in &rows {
        push_row(&mut out, row, &widths);
    }
    out
}

fn push_row(out: &mut String, cells: &[String; 6], widths: &[usize; 6]) {
    let line = cells
        .iter()
        .zip(widths)
        .map(|(cell, width)| format!("{:<width$}", cell, width = *width))
        .collect::<Vec<_>>()
        .join("  ");
    let _ = writeln!(out, "{}", line.trim_end());
}

pub fn clip_line(clip: &ArchivedClip) -> String {
    let name = clip
        .path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    let duration = clip
        .duration_seconds
        .map(|d| format!("{:.1}s", d))
        .unwrap_or_else(|| UNKNOWN.to_string());
    format!("{}  {} bytes  {}", name, clip.size_bytes, duration)
}
