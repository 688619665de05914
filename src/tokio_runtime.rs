//! Tokio runtime for the command-line front-end
//!
//! Every flow runs on one current-thread runtime. Shared state is only touched
//! between awaits, so no task observes a half-applied change.

use std::future::Future;
use tokio::runtime::{Builder, Runtime};

/// Build the runtime used by `main`
pub fn build() -> std::io::Result<Runtime> {
    Builder::new_current_thread().enable_all().build()
}

/// Run `future` to completion on a fresh runtime
pub fn block_on<F: Future>(future: F) -> std::io::Result<F::Output> {
    Ok(build()?.block_on(future))
}
