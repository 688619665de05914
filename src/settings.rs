//! Application settings persistence using dconf
//!
//! Settings are stored in dconf under `/com/sonicscan/desktop/`

use log::error;

const DCONF_PATH: &str = "/com/sonicscan/desktop/";

/// Used when neither the command line nor dconf names a backend
pub const DEFAULT_BACKEND_URL: &str = "http://127.0.0.1:8000";

/// Keys for dconf settings
mod keys {
    pub const BACKEND_URL: &str = "backend-url";
    pub const ARCHIVE_CLIPS: &str = "archive-clips";
}

/// Get the stored backend URL from dconf
pub fn get_backend_url() -> Option<String> {
    let key = format!("{}{}", DCONF_PATH, keys::BACKEND_URL);
    dconf_rs::get_string(&key).ok().filter(|url| !url.trim().is_empty())
}

/// Set the backend URL in dconf
pub fn set_backend_url(url: &str) {
    let key = format!("{}{}", DCONF_PATH, keys::BACKEND_URL);
    if let Err(e) = dconf_rs::set_string(&key, url) {
        error!("Failed to save backend URL to dconf: {}", e);
    }
}

/// Whether recorded clips are kept on disk (defaults to false)
pub fn get_archive_clips() -> bool {
    let key = format!("{}{}", DCONF_PATH, keys::ARCHIVE_CLIPS);
    dconf_rs::get_boolean(&key).unwrap_or(false)
}

pub fn set_archive_clips(archive: bool) {
    let key = format!("{}{}", DCONF_PATH, keys::ARCHIVE_CLIPS);
    if let Err(e) = dconf_rs::set_boolean(&key, archive) {
        error!("Failed to save archive setting to dconf: {}", e);
    }
}

/// Pick the backend URL: explicit override first, then dconf, then the default
pub fn resolve_backend_url(explicit: Option<String>, stored: Option<String>) -> String {
    explicit
        .filter(|url| !url.trim().is_empty())
        .or(stored)
        .unwrap_or_else(|| DEFAULT_BACKEND_URL.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_backend_url_precedence() {
        let stored = Some("http://stored:9000".to_string());

        assert_eq!(
            resolve_backend_url(Some("http://cli:1".into()), stored.clone()),
            "http://cli:1"
        );
        assert_eq!(resolve_backend_url(None, stored.clone()), "http://stored:9000");
        assert_eq!(resolve_backend_url(Some("  ".into()), stored), "http://stored:9000");
        assert_eq!(resolve_backend_url(None, None), DEFAULT_BACKEND_URL);
    }
}
