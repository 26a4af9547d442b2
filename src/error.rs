//! Connector error types.
//!
//! Construction failures surface as [`BuildError`]; anything that goes wrong
//! while a call is in flight surfaces as [`ProcessingError`]. On the
//! callback-driven path failures are never returned to the caller — they are
//! delivered through the completion handler, exactly once per call.

use std::{error::Error as StdError, fmt, io};

use derive_more::Display;

/// Opaque failure raised by the underlying engine.
///
/// Engines wrap whatever native error they produce; the connector never
/// inspects it beyond formatting and source chaining.
#[derive(Debug)]
pub struct EngineError {
    inner: Box<dyn StdError + Send + Sync>,
}

impl EngineError {
    /// Wrap an engine-native error.
    pub fn new(err: impl Into<Box<dyn StdError + Send + Sync>>) -> Self {
        EngineError { inner: err.into() }
    }

    /// Construct from a bare message.
    pub fn message(msg: impl Into<String>) -> Self {
        EngineError {
            inner: msg.into().into(),
        }
    }
}

impl fmt::Display for EngineError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Display::fmt(&self.inner, f)
    }
}

impl StdError for EngineError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        self.inner.source()
    }
}

impl From<io::Error> for EngineError {
    fn from(err: io::Error) -> Self {
        EngineError::new(err)
    }
}

/// The engine could not be built or started; the connector is unusable.
#[derive(Debug, Display)]
#[display("failed to start the client engine: {source}")]
pub struct StartupError {
    source: EngineError,
}

impl StartupError {
    pub(crate) fn new(source: EngineError) -> Self {
        StartupError { source }
    }
}

impl StdError for StartupError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

/// The engine failed to stop cleanly at close.
#[derive(Debug, Display)]
#[display("failed to stop the client engine: {source}")]
pub struct ShutdownError {
    source: EngineError,
}

impl ShutdownError {
    pub(crate) fn new(source: EngineError) -> Self {
        ShutdownError { source }
    }
}

impl StdError for ShutdownError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

/// The request method falls outside the closed set the connector supports.
///
/// Raised before any engine activity.
#[derive(Debug, Clone, Display)]
#[display("method {method} is not supported by this connector")]
pub struct UnsupportedMethodError {
    method: String,
}

impl UnsupportedMethodError {
    pub(crate) fn new(method: impl Into<String>) -> Self {
        UnsupportedMethodError {
            method: method.into(),
        }
    }

    /// The offending method name.
    pub fn method(&self) -> &str {
        &self.method
    }
}

impl StdError for UnsupportedMethodError {}

/// A configuration property carries a wrong-typed or invalid value.
#[derive(Debug, Display)]
pub enum ConfigurationError {
    /// A recognized option holds a value of the wrong type.
    #[display("property {name} expects a {expected} value, found {found}")]
    WrongType {
        name: String,
        expected: &'static str,
        found: &'static str,
    },
    /// The proxy URI string does not parse.
    #[display("invalid proxy uri {value:?}: {source}")]
    InvalidProxyUri {
        value: String,
        source: http::uri::InvalidUri,
    },
    /// The proxy URI lacks a host component.
    #[display("proxy uri {value:?} has no host")]
    ProxyUriMissingHost { value: String },
}

impl StdError for ConfigurationError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ConfigurationError::InvalidProxyUri { source, .. } => Some(source),
            _ => None,
        }
    }
}

/// Serializing the request entity failed; the call is aborted before
/// anything is sent.
#[derive(Debug, Display)]
#[display("failed to write request entity: {source}")]
pub struct EntityWriteError {
    source: io::Error,
}

impl EntityWriteError {
    pub(crate) fn new(source: io::Error) -> Self {
        EntityWriteError { source }
    }
}

impl StdError for EntityWriteError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        Some(&self.source)
    }
}

/// A request-builder failure, latched at build time and surfaced at send.
#[derive(Debug, Display)]
pub enum InvalidRequest {
    /// Malformed URI or header handed to the builder.
    #[display("{_0}")]
    Http(http::Error),
    /// JSON body serialization failed.
    #[display("json body serialization failed: {_0}")]
    Json(serde_json::Error),
    /// Form body serialization failed.
    #[display("form body serialization failed: {_0}")]
    Form(serde_urlencoded::ser::Error),
}

impl StdError for InvalidRequest {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            InvalidRequest::Http(err) => Some(err),
            InvalidRequest::Json(err) => Some(err),
            InvalidRequest::Form(err) => Some(err),
        }
    }
}

impl From<http::Error> for InvalidRequest {
    fn from(err: http::Error) -> Self {
        InvalidRequest::Http(err)
    }
}

impl From<serde_json::Error> for InvalidRequest {
    fn from(err: serde_json::Error) -> Self {
        InvalidRequest::Json(err)
    }
}

impl From<serde_urlencoded::ser::Error> for InvalidRequest {
    fn from(err: serde_urlencoded::ser::Error) -> Self {
        InvalidRequest::Form(err)
    }
}

/// Any failure while an invocation is in flight.
#[derive(Debug, Display)]
pub enum ProcessingError {
    /// Method outside the supported set; nothing was sent.
    #[display("{_0}")]
    Method(UnsupportedMethodError),
    /// Entity serialization failed; nothing was sent.
    #[display("{_0}")]
    Entity(EntityWriteError),
    /// The request was malformed at build time; nothing was sent.
    #[display("invalid request: {_0}")]
    Request(InvalidRequest),
    /// The engine reported a failure during send or receive.
    #[display("request processing failed: {_0}")]
    Engine(EngineError),
    /// The engine dropped the call without reporting an outcome.
    #[display("call abandoned by the engine before completion")]
    Abandoned,
}

impl StdError for ProcessingError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            ProcessingError::Method(err) => Some(err),
            ProcessingError::Entity(err) => Some(err),
            ProcessingError::Request(err) => Some(err),
            ProcessingError::Engine(err) => Some(err),
            ProcessingError::Abandoned => None,
        }
    }
}

impl From<UnsupportedMethodError> for ProcessingError {
    fn from(err: UnsupportedMethodError) -> Self {
        ProcessingError::Method(err)
    }
}

impl From<EntityWriteError> for ProcessingError {
    fn from(err: EntityWriteError) -> Self {
        ProcessingError::Entity(err)
    }
}

impl From<InvalidRequest> for ProcessingError {
    fn from(err: InvalidRequest) -> Self {
        ProcessingError::Request(err)
    }
}

impl From<EngineError> for ProcessingError {
    fn from(err: EngineError) -> Self {
        ProcessingError::Engine(err)
    }
}

/// Failure to construct a connector.
#[derive(Debug, Display)]
pub enum BuildError {
    /// The configuration did not validate.
    #[display("{_0}")]
    Configuration(ConfigurationError),
    /// The engine could not be built or started.
    #[display("{_0}")]
    Startup(StartupError),
}

impl StdError for BuildError {
    fn source(&self) -> Option<&(dyn StdError + 'static)> {
        match self {
            BuildError::Configuration(err) => Some(err),
            BuildError::Startup(err) => Some(err),
        }
    }
}

impl From<ConfigurationError> for BuildError {
    fn from(err: ConfigurationError) -> Self {
        BuildError::Configuration(err)
    }
}

impl From<StartupError> for BuildError {
    fn from(err: StartupError) -> Self {
        BuildError::Startup(err)
    }
}
