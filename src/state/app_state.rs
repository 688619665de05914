use super::candidates::CandidateList;

/// The currently active view/screen
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ActiveView {
    /// Recorder, similarity results and the add-by-link form
    #[default]
    Home,
    /// Stored library with delete actions
    Library,
}

/// Root application state
#[derive(Debug, Clone, Default)]
pub struct AppState {
    pub active_view: ActiveView,
    pub is_recording: bool,
    /// Matches for the last recorded clip (view-only)
    pub similar: CandidateList,
    /// Candidates from the last link/text search, awaiting confirm-add
    pub search_results: CandidateList,
    /// Tracks stored in the backend library
    pub library: CandidateList,
}

impl AppState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Navigate to a specific view. Answers still in flight for the view
    /// being left are dropped when they arrive.
    pub fn navigate_to(&mut self, view: ActiveView) {
        if self.active_view == view {
            return;
        }

        match self.active_view {
            ActiveView::Home => {
                self.similar.invalidate();
                self.search_results.invalidate();
            }
            ActiveView::Library => self.library.invalidate(),
        }
        self.active_view = view;
    }
}
