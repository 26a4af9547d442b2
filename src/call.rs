//! Per-call state for the callback-driven path.
//!
//! Engine callbacks, the caller's completion handler, and the returned
//! handle all meet in one shared [`CallState`]. An atomic already-completed
//! flag makes the handler fire exactly once per call no matter which side
//! reports first, and the handle resolves only after the handler has fired.

use std::{
    future::Future,
    pin::Pin,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc, Mutex,
    },
    task::{Context, Poll},
};

use http::StatusCode;
use tokio::sync::oneshot;

use crate::{
    engine::{RawResponse, ResponseListener},
    error::{EngineError, ProcessingError},
    response::Response,
    translate::translate_response,
};

/// Receiver side of a call's completion events.
///
/// Exactly one of the two methods is invoked, exactly once per call,
/// possibly from an engine-owned thread.
pub trait CompletionHandler: Send + 'static {
    /// The response head arrived; the entity stream may still be filling.
    fn on_response(&mut self, response: Response);

    /// The call failed; no response was or will be delivered.
    ///
    /// The error arrives behind an [`Arc`] because the call handle may also
    /// observe it.
    fn on_failure(&mut self, error: Arc<ProcessingError>);
}

/// What a [`ResponseHandle`] resolves to, after the handler has fired.
#[derive(Debug, Clone)]
pub enum CallOutcome {
    /// The handler received a response with this status.
    Completed(StatusCode),
    /// The handler received this failure.
    Failed(Arc<ProcessingError>),
}

impl CallOutcome {
    pub fn is_completed(&self) -> bool {
        matches!(self, CallOutcome::Completed(_))
    }

    /// Status of the delivered response, when the call completed.
    pub fn status(&self) -> Option<StatusCode> {
        match self {
            CallOutcome::Completed(status) => Some(*status),
            CallOutcome::Failed(_) => None,
        }
    }
}

/// Shared per-call state: the handler, the handle's notifier, and the
/// single-fire guard.
pub(crate) struct CallState {
    completed: AtomicBool,
    handler: Mutex<Option<Box<dyn CompletionHandler>>>,
    outcome: Mutex<Option<oneshot::Sender<CallOutcome>>>,
}

impl CallState {
    pub(crate) fn new(handler: Box<dyn CompletionHandler>) -> (Arc<Self>, ResponseHandle) {
        let (tx, rx) = oneshot::channel();
        let state = Arc::new(CallState {
            completed: AtomicBool::new(false),
            handler: Mutex::new(Some(handler)),
            outcome: Mutex::new(Some(tx)),
        });
        (state, ResponseHandle { rx })
    }

    /// Deliver the success path. A late second delivery of either kind is
    /// discarded.
    pub(crate) fn complete(&self, response: Response) {
        if self.completed.swap(true, Ordering::AcqRel) {
            log::warn!("duplicate completion for one call discarded");
            return;
        }
        let status = response.status();
        if let Some(mut handler) = self.take_handler() {
            handler.on_response(response);
        }
        self.notify(CallOutcome::Completed(status));
    }

    /// Deliver the failure path. A late second delivery of either kind is
    /// discarded.
    pub(crate) fn fail(&self, error: ProcessingError) {
        if self.completed.swap(true, Ordering::AcqRel) {
            log::warn!("late failure for a settled call discarded: {error}");
            return;
        }
        let error = Arc::new(error);
        if let Some(mut handler) = self.take_handler() {
            handler.on_failure(Arc::clone(&error));
        }
        self.notify(CallOutcome::Failed(error));
    }

    fn take_handler(&self) -> Option<Box<dyn CompletionHandler>> {
        self.handler.lock().unwrap().take()
    }

    fn notify(&self, outcome: CallOutcome) {
        if let Some(tx) = self.outcome.lock().unwrap().take() {
            // the caller may have dropped the handle; that is fine
            let _ = tx.send(outcome);
        }
    }
}

impl Drop for CallState {
    fn drop(&mut self) {
        // a conforming engine always settles the listener; if one drops it
        // on the floor the failure path still fires exactly once
        if !self.completed.load(Ordering::Acquire) {
            self.fail(ProcessingError::Abandoned);
        }
    }
}

/// Engine-facing listener bridging callbacks into the shared call state.
pub(crate) struct StateListener {
    pub(crate) state: Arc<CallState>,
}

impl ResponseListener for StateListener {
    fn on_response(self: Box<Self>, response: RawResponse) {
        self.state.complete(translate_response(response));
    }

    fn on_failure(self: Box<Self>, error: EngineError) {
        self.state.fail(ProcessingError::Engine(error));
    }
}

/// Handle to an in-flight callback-driven call.
///
/// Resolves only after the completion handler has been invoked — never with
/// a placeholder for a response that has not arrived yet. The response
/// itself is owned by the handler; the handle reports the outcome.
#[must_use = "the handle reports the call outcome"]
pub struct ResponseHandle {
    rx: oneshot::Receiver<CallOutcome>,
}

impl ResponseHandle {
    /// Block the calling thread until the call settles.
    pub fn wait(self) -> CallOutcome {
        self.rx
            .blocking_recv()
            .unwrap_or_else(|_| CallOutcome::Failed(Arc::new(ProcessingError::Abandoned)))
    }
}

impl Future for ResponseHandle {
    type Output = CallOutcome;

    fn poll(self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Self::Output> {
        let this = self.get_mut();
        Pin::new(&mut this.rx).poll(cx).map(|result| {
            result.unwrap_or_else(|_| CallOutcome::Failed(Arc::new(ProcessingError::Abandoned)))
        })
    }
}
