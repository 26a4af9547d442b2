//! The connector: engine lifecycle plus the two invocation paths.

use std::{fmt, sync::Arc};

use crate::{
    body::{materialize, SerializeMode},
    call::{CallState, CompletionHandler, ResponseHandle, StateListener},
    config::{EngineSettings, Properties},
    engine::{Engine, EngineRequest},
    error::{BuildError, ProcessingError, ShutdownError, StartupError},
    request::Request,
    response::Response,
    translate::{translate_request, translate_response},
};

/// Adapter between the abstract request/response model and a concrete
/// engine `E`.
///
/// One engine instance is built and started at construction and shared by
/// every call for the connector's lifetime; connector-level configuration is
/// immutable afterwards. [`Connector::close`] consumes the connector, so no
/// call can be issued past shutdown.
pub struct Connector<E: Engine> {
    engine: E,
}

impl<E: Engine> Connector<E> {
    /// Validate the configuration, build the engine, and start it.
    ///
    /// A build or start failure from the engine aborts construction — the
    /// connector is unusable without a started engine.
    pub fn construct(properties: &Properties) -> Result<Self, BuildError> {
        let settings = EngineSettings::from_properties(properties)?;
        let engine = E::build(settings).map_err(StartupError::new)?;
        engine.start().map_err(StartupError::new)?;
        log::debug!("started engine {}", engine.name());
        Ok(Connector { engine })
    }

    /// Human-readable identity, including the engine version.
    pub fn name(&self) -> String {
        self.engine.name()
    }

    /// The wrapped engine instance.
    pub fn engine(&self) -> &E {
        &self.engine
    }

    /// Blocking invocation: sends on the calling thread and returns once the
    /// complete response is in.
    ///
    /// The entity, if any, is fully buffered before the send. A response
    /// that arrives with an empty body is settled immediately:
    /// [`Response::has_entity`] is `false` and no stream is left to read.
    pub fn send(&self, mut request: Request) -> Result<Response, ProcessingError> {
        if let Some(err) = request.take_error() {
            return Err(ProcessingError::Request(err));
        }

        let mut native = translate_request(&self.engine, &request)?;
        if let Some(entity) = request.take_entity() {
            let body = materialize(entity, SerializeMode::Buffered)?;
            native.set_body(body);
        }

        let raw = native.send().map_err(ProcessingError::Engine)?;
        let mut response = translate_response(raw);
        response.settle_empty_entity();
        Ok(response)
    }

    /// Callback-driven invocation: returns immediately; `handler` receives
    /// the outcome exactly once, possibly from an engine thread.
    ///
    /// Failures are never returned from this method — every failure,
    /// including those detected before the send, is delivered through the
    /// handler's failure path. The handle resolves after the handler fired.
    pub fn send_async(
        &self,
        mut request: Request,
        handler: impl CompletionHandler,
    ) -> ResponseHandle {
        let (state, handle) = CallState::new(Box::new(handler));

        if let Some(err) = request.take_error() {
            state.fail(ProcessingError::Request(err));
            return handle;
        }

        let mut native = match translate_request(&self.engine, &request) {
            Ok(native) => native,
            Err(err) => {
                state.fail(err.into());
                return handle;
            }
        };

        if let Some(entity) = request.take_entity() {
            match materialize(entity, SerializeMode::Streamed) {
                Ok(body) => native.set_body(body),
                Err(err) => {
                    state.fail(err.into());
                    return handle;
                }
            }
        }

        let listener = Box::new(StateListener {
            state: Arc::clone(&state),
        });
        if let Err(err) = native.send_async(listener) {
            // nothing was sent and no callback will fire
            state.fail(ProcessingError::Engine(err));
        }
        handle
    }

    /// Stop the engine.
    ///
    /// Must not race in-flight calls; consuming `self` rules out calls
    /// issued after close. A stop failure surfaces but the connector is gone
    /// either way.
    pub fn close(self) -> Result<(), ShutdownError> {
        log::debug!("stopping engine {}", self.engine.name());
        self.engine.stop().map_err(ShutdownError::new)
    }
}

impl<E: Engine> fmt::Debug for Connector<E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connector")
            .field("engine", &self.engine.name())
            .finish()
    }
}
