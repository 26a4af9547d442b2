//! The engine interface: what a concrete HTTP client must expose for the
//! connector to drive it.
//!
//! An engine owns everything wire-level — sockets, TLS, pooling, proxying,
//! cookie and authentication stores, redirect machinery, its own threads.
//! The connector only builds it from validated [`EngineSettings`], starts and
//! stops it, and pushes translated requests through it.

use std::{fmt, sync::mpsc, time::Duration};

use bytes::Bytes;
use http::{
    header::{HeaderName, HeaderValue},
    StatusCode, Uri,
};

use crate::{body::BodyProvider, config::EngineSettings, error::EngineError};

/// Request methods the connector will hand to an engine.
///
/// The abstract request model carries an open method type; translation
/// narrows it to this closed set and rejects everything else.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EngineMethod {
    Get,
    Post,
    Put,
    Delete,
    Head,
    Options,
    Trace,
    Connect,
    Move,
}

impl EngineMethod {
    /// Look up a method by its wire name. `None` for anything outside the set.
    pub fn from_name(name: &str) -> Option<Self> {
        match name {
            "GET" => Some(EngineMethod::Get),
            "POST" => Some(EngineMethod::Post),
            "PUT" => Some(EngineMethod::Put),
            "DELETE" => Some(EngineMethod::Delete),
            "HEAD" => Some(EngineMethod::Head),
            "OPTIONS" => Some(EngineMethod::Options),
            "TRACE" => Some(EngineMethod::Trace),
            "CONNECT" => Some(EngineMethod::Connect),
            "MOVE" => Some(EngineMethod::Move),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            EngineMethod::Get => "GET",
            EngineMethod::Post => "POST",
            EngineMethod::Put => "PUT",
            EngineMethod::Delete => "DELETE",
            EngineMethod::Head => "HEAD",
            EngineMethod::Options => "OPTIONS",
            EngineMethod::Trace => "TRACE",
            EngineMethod::Connect => "CONNECT",
            EngineMethod::Move => "MOVE",
        }
    }
}

impl fmt::Display for EngineMethod {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Body shapes an engine response can carry.
pub enum RawBody {
    /// No entity at all.
    None,
    /// Complete, buffered entity (blocking path).
    Bytes(Bytes),
    /// Chunks that may still be arriving (callback path).
    Channel(mpsc::Receiver<Bytes>),
}

impl fmt::Debug for RawBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RawBody::None => f.write_str("RawBody::None"),
            RawBody::Bytes(bytes) => write!(f, "RawBody::Bytes({} bytes)", bytes.len()),
            RawBody::Channel(_) => f.write_str("RawBody::Channel(..)"),
        }
    }
}

/// Engine-native response surface consumed during translation.
///
/// The connector never retains one of these past the call that produced it.
#[derive(Debug)]
pub struct RawResponse {
    pub status: StatusCode,
    /// Reason phrase as the engine saw it on the wire, when available.
    pub reason: Option<String>,
    /// Header sequence in arrival order; names may repeat.
    pub headers: Vec<(HeaderName, HeaderValue)>,
    pub body: RawBody,
}

/// Callback surface for the non-blocking send path.
///
/// An engine invokes exactly one of the two methods, at most once, possibly
/// from one of its own threads. Both consume the listener, so a second
/// delivery is unrepresentable for conforming engines.
pub trait ResponseListener: Send + 'static {
    /// The response head is available; the body may still be filling.
    fn on_response(self: Box<Self>, response: RawResponse);

    /// The call failed before a response head was delivered.
    fn on_failure(self: Box<Self>, error: EngineError);
}

/// One engine request under assembly, then in flight.
pub trait EngineRequest: Send {
    /// Add one already-flattened header line.
    fn add_header(&mut self, name: HeaderName, value: HeaderValue);

    /// Per-call response timeout override.
    fn set_read_timeout(&mut self, timeout: Duration);

    /// Per-call redirect-following override.
    fn set_follow_redirects(&mut self, follow: bool);

    /// Attach the serialized request body.
    fn set_body(&mut self, body: BodyProvider);

    /// Blocking send: returns once the complete response, or an error, is in.
    fn send(self) -> Result<RawResponse, EngineError>;

    /// Non-blocking send: events reach `listener` from engine threads.
    ///
    /// A synchronous `Err` means nothing was sent and no callback will fire.
    fn send_async(self, listener: Box<dyn ResponseListener>) -> Result<(), EngineError>;
}

/// A pluggable HTTP client engine.
///
/// Built and started once per connector, shared by every call for the
/// connector's lifetime, stopped exactly once at close.
pub trait Engine: Send + Sync + Sized + 'static {
    type Request: EngineRequest;

    /// Assemble an engine from validated settings. The instance is not yet
    /// started and must not perform I/O here.
    fn build(settings: EngineSettings) -> Result<Self, EngineError>;

    fn start(&self) -> Result<(), EngineError>;

    fn stop(&self) -> Result<(), EngineError>;

    /// The redirect-following default this engine was configured with.
    fn follows_redirects(&self) -> bool;

    /// Begin assembling a request. No network activity happens here.
    fn create_request(&self, method: EngineMethod, uri: &Uri) -> Self::Request;

    /// Human-readable identity including the engine version.
    fn name(&self) -> String;
}
