//! Blocking adapter over the async model-calling operations.
//!
//! The interviewer and tutor are implemented once, as async code. Callers on
//! plain threads (CLI tools, `spawn_blocking` jobs) drive the same futures to
//! completion here on a private current-thread runtime.
//!
//! Must not be called from inside a tokio runtime; tokio panics on nested
//! `block_on`.

use std::future::Future;

use anyhow::Context;

use crate::errors::AppError;

pub fn block_on<F: Future>(future: F) -> Result<F::Output, AppError> {
    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("Failed to build blocking runtime")?;
    Ok(runtime.block_on(future))
}
