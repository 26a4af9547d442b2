//! Connector between a transport-agnostic HTTP client model and pluggable
//! client engines.
//!
//! A [`Connector`] owns one started [`engine::Engine`] instance and
//! translates abstract [`Request`]s into engine-native requests, and
//! engine-native responses back into [`Response`]s. Two invocation paths are
//! offered: [`Connector::send`] blocks the calling thread for the full round
//! trip, while [`Connector::send_async`] returns immediately and delivers
//! the outcome to a [`CompletionHandler`] exactly once, possibly from an
//! engine-owned thread.
//!
//! # Blocking call
//! ```
//! use http_connector::{test::MockEngine, Connector, Properties, Request};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = Connector::<MockEngine>::construct(&Properties::new())?;
//!
//! let response = connector.send(Request::get("http://localhost/info"))?;
//! println!("{} {}", response.status(), response.reason());
//!
//! connector.close()?;
//! # Ok(())
//! # }
//! ```
//!
//! # Callback-driven call
//! ```
//! use http_connector::{test, Connector, Properties, Request};
//!
//! # fn main() -> Result<(), Box<dyn std::error::Error>> {
//! let connector = test::connector(&Properties::new())?;
//!
//! let handler = test::CapturingHandler::new();
//! let handle = connector.send_async(Request::get("http://localhost/info"), handler.clone());
//!
//! // the handle settles only after the handler has fired
//! let outcome = handle.wait();
//! assert_eq!(handler.response_count() + handler.failure_count(), 1);
//! # let _ = outcome;
//! # Ok(())
//! # }
//! ```
//!
//! # Configuration
//! Connector-level options arrive in a loosely typed [`Properties`] bag and
//! are validated once, at construction, into the typed
//! [`EngineSettings`] the engine reads while assembling itself. Per-request
//! overrides (read timeout, redirect policy) shadow the connector defaults.

#![deny(rust_2018_idioms, nonstandard_style)]
#![warn(future_incompatible)]

mod body;
mod call;
mod config;
mod connector;
mod header;
mod request;
mod response;
mod translate;

pub mod engine;
pub mod error;

pub use self::body::{BodyProvider, Entity, EntityWriter};
pub use self::call::{CallOutcome, CompletionHandler, ResponseHandle};
pub use self::config::{
    props, BasicCredential, EngineSettings, FromValue, Properties, ProxyConfig, TlsContext, Value,
};
pub use self::connector::Connector;
pub use self::header::HeaderMap;
pub use self::request::Request;
pub use self::response::{EntityStream, Response};

pub mod http {
    //! HTTP vocabulary types used throughout the crate.
    pub use ::http::{header, Method, StatusCode, Uri};
}
