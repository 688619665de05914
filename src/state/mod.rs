mod app_state;
mod candidates;

pub use app_state::{ActiveView, AppState};
