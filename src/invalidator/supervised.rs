//! Per-event failure isolation.

use futures::FutureExt;
use std::backtrace::Backtrace;
use std::future::Future;
use std::panic::AssertUnwindSafe;

use crate::error::{panic_message, InvalidatorError, InvalidatorResult};

/// How a supervised handler call ended
#[derive(Debug)]
pub enum HandlerOutcome {
    Completed,
    Failed(InvalidatorError),
    Panicked { message: String, backtrace: String },
}

impl HandlerOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, HandlerOutcome::Completed)
    }
}

/// Run a handler future, converting both its error and any panic into a
/// [`HandlerOutcome`] so neither escapes to the caller.
pub async fn supervised<F>(handler: F) -> HandlerOutcome
where
    F: Future<Output = InvalidatorResult<()>>,
{
    match AssertUnwindSafe(handler).catch_unwind().await {
        Ok(Ok(())) => HandlerOutcome::Completed,
        Ok(Err(error)) => HandlerOutcome::Failed(error),
        Err(payload) => HandlerOutcome::Panicked {
            message: panic_message(payload.as_ref()),
            backtrace: Backtrace::force_capture().to_string(),
        },
    }
}
