//! Connector configuration.
//!
//! The generic client framework hands the connector a loosely typed
//! [`Properties`] bag. Recognized options are validated exactly once, at
//! construction, into a typed [`EngineSettings`] the engine consumes while
//! assembling itself; after that point connector-level configuration is
//! immutable.

use std::{any::Any, collections::HashMap, fmt, sync::Arc, time::Duration};

use base64::prelude::{Engine as _, BASE64_STANDARD};
use http::{header::HeaderValue, Uri};

use crate::error::ConfigurationError;

/// Recognized configuration property names.
pub mod props {
    /// TLS context handed to the engine for HTTPS connections.
    pub const TLS_CONTEXT: &str = "client.engine.tls-context";
    /// Bound on the engine's internal worker pool. Applied only when positive.
    pub const WORKER_POOL_SIZE: &str = "client.engine.worker-pool-size";
    /// Cap on connection-establishment time.
    pub const CONNECT_TIMEOUT: &str = "client.connect-timeout";
    /// Cap on time to receive a response; also honored per request.
    pub const READ_TIMEOUT: &str = "client.read-timeout";
    /// Use a no-op cookie store instead of persisting cookies.
    pub const DISABLE_COOKIES: &str = "client.disable-cookies";
    /// Proxy to route requests through; a uri value or a parseable string.
    pub const PROXY_URI: &str = "client.proxy-uri";
    /// Credential installed into the engine's authentication store.
    pub const BASIC_AUTH_CREDENTIAL: &str = "client.basic-auth";
    /// Follow 3xx responses automatically; also honored per request.
    pub const FOLLOW_REDIRECTS: &str = "client.follow-redirects";
}

/// Opaque TLS configuration handle passed through to the engine.
///
/// The connector never interprets it; an engine downcasts to the concrete
/// configuration type it understands.
#[derive(Clone)]
pub struct TlsContext {
    inner: Arc<dyn Any + Send + Sync>,
}

impl TlsContext {
    pub fn new<T: Any + Send + Sync>(context: T) -> Self {
        TlsContext {
            inner: Arc::new(context),
        }
    }

    pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
        self.inner.downcast_ref()
    }
}

impl fmt::Debug for TlsContext {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("TlsContext(..)")
    }
}

/// Username/password pair for the engine's authentication store.
#[derive(Clone, PartialEq, Eq)]
pub struct BasicCredential {
    username: String,
    password: String,
}

impl BasicCredential {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        BasicCredential {
            username: username.into(),
            password: password.into(),
        }
    }

    pub fn username(&self) -> &str {
        &self.username
    }

    pub fn password(&self) -> &str {
        &self.password
    }

    /// Preemptive `Authorization` header value.
    pub fn header_value(&self) -> HeaderValue {
        let token = BASE64_STANDARD.encode(format!("{}:{}", self.username, self.password));
        // base64 output is always valid header material
        HeaderValue::from_str(&format!("Basic {token}")).unwrap()
    }
}

impl fmt::Debug for BasicCredential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BasicCredential")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}

/// A loosely typed configuration value.
#[derive(Clone)]
pub enum Value {
    Bool(bool),
    Int(i64),
    Str(String),
    Uri(Uri),
    Duration(Duration),
    Tls(TlsContext),
    Credential(BasicCredential),
}

impl Value {
    pub(crate) fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Str(_) => "string",
            Value::Uri(_) => "uri",
            Value::Duration(_) => "duration",
            Value::Tls(_) => "tls-context",
            Value::Credential(_) => "credential",
        }
    }
}

impl fmt::Debug for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(v) => write!(f, "Bool({v})"),
            Value::Int(v) => write!(f, "Int({v})"),
            Value::Str(v) => write!(f, "Str({v:?})"),
            Value::Uri(v) => write!(f, "Uri({v})"),
            Value::Duration(v) => write!(f, "Duration({v:?})"),
            Value::Tls(_) => f.write_str("Tls(..)"),
            Value::Credential(v) => write!(f, "Credential({:?})", v.username),
        }
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

impl From<i64> for Value {
    fn from(v: i64) -> Self {
        Value::Int(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::Str(v.to_owned())
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::Str(v)
    }
}

impl From<Uri> for Value {
    fn from(v: Uri) -> Self {
        Value::Uri(v)
    }
}

impl From<Duration> for Value {
    fn from(v: Duration) -> Self {
        Value::Duration(v)
    }
}

impl From<TlsContext> for Value {
    fn from(v: TlsContext) -> Self {
        Value::Tls(v)
    }
}

impl From<BasicCredential> for Value {
    fn from(v: BasicCredential) -> Self {
        Value::Credential(v)
    }
}

/// Typed extraction from a [`Value`].
pub trait FromValue: Sized {
    /// Human-readable name of the expected type, for diagnostics.
    const EXPECTED: &'static str;

    fn from_value(value: &Value) -> Option<Self>;
}

impl FromValue for bool {
    const EXPECTED: &'static str = "bool";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    const EXPECTED: &'static str = "int";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for String {
    const EXPECTED: &'static str = "string";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Str(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Uri {
    const EXPECTED: &'static str = "uri";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Uri(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Duration {
    const EXPECTED: &'static str = "duration";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Duration(v) => Some(*v),
            _ => None,
        }
    }
}

impl FromValue for TlsContext {
    const EXPECTED: &'static str = "tls-context";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Tls(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for BasicCredential {
    const EXPECTED: &'static str = "credential";

    fn from_value(value: &Value) -> Option<Self> {
        match value {
            Value::Credential(v) => Some(v.clone()),
            _ => None,
        }
    }
}

/// Read-only property bag handed to the connector at construction.
///
/// Lookup is typed: a present value of the wrong type reads as absent here.
/// Recognized options get strict validation in
/// [`EngineSettings::from_properties`], where a type mismatch is a
/// [`ConfigurationError`] instead.
#[derive(Clone, Debug, Default)]
pub struct Properties {
    entries: HashMap<String, Value>,
}

impl Properties {
    pub fn new() -> Self {
        Properties::default()
    }

    /// Builder-style insertion.
    pub fn with(mut self, name: impl Into<String>, value: impl Into<Value>) -> Self {
        self.set(name, value);
        self
    }

    pub fn set(&mut self, name: impl Into<String>, value: impl Into<Value>) {
        self.entries.insert(name.into(), value.into());
    }

    /// Typed lookup; `None` when the property is absent or wrong-typed.
    pub fn get<T: FromValue>(&self, name: &str) -> Option<T> {
        self.entries.get(name).and_then(T::from_value)
    }

    /// Typed lookup with a fallback.
    pub fn get_or<T: FromValue>(&self, name: &str, default: T) -> T {
        self.get(name).unwrap_or(default)
    }

    pub fn contains(&self, name: &str) -> bool {
        self.entries.contains_key(name)
    }

    pub(crate) fn raw(&self, name: &str) -> Option<&Value> {
        self.entries.get(name)
    }
}

/// Proxy endpoint extracted from the configured URI.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ProxyConfig {
    host: String,
    port: u16,
}

impl ProxyConfig {
    pub fn host(&self) -> &str {
        &self.host
    }

    pub fn port(&self) -> u16 {
        self.port
    }
}

/// Validated, typed view of the connector-level configuration.
///
/// Built once at construction. The source bag rides along for
/// engine-specific keys the connector itself does not recognize.
#[derive(Clone, Debug)]
pub struct EngineSettings {
    tls: Option<TlsContext>,
    worker_pool_size: Option<usize>,
    connect_timeout: Option<Duration>,
    read_timeout: Option<Duration>,
    disable_cookies: bool,
    proxy: Option<ProxyConfig>,
    basic_auth: Option<BasicCredential>,
    follow_redirects: bool,
    properties: Properties,
}

impl EngineSettings {
    pub fn from_properties(properties: &Properties) -> Result<Self, ConfigurationError> {
        let tls = checked::<TlsContext>(properties, props::TLS_CONTEXT)?;
        let worker_pool_size = checked::<i64>(properties, props::WORKER_POOL_SIZE)?
            .filter(|size| *size > 0)
            .map(|size| size as usize);
        let connect_timeout = checked::<Duration>(properties, props::CONNECT_TIMEOUT)?;
        let read_timeout = checked::<Duration>(properties, props::READ_TIMEOUT)?;
        let disable_cookies = checked::<bool>(properties, props::DISABLE_COOKIES)?.unwrap_or(false);
        let proxy = match properties.raw(props::PROXY_URI) {
            Some(value) => Some(proxy_from_value(value)?),
            None => None,
        };
        let basic_auth = checked::<BasicCredential>(properties, props::BASIC_AUTH_CREDENTIAL)?;
        let follow_redirects = checked::<bool>(properties, props::FOLLOW_REDIRECTS)?.unwrap_or(true);

        Ok(EngineSettings {
            tls,
            worker_pool_size,
            connect_timeout,
            read_timeout,
            disable_cookies,
            proxy,
            basic_auth,
            follow_redirects,
            properties: properties.clone(),
        })
    }

    pub fn tls(&self) -> Option<&TlsContext> {
        self.tls.as_ref()
    }

    pub fn worker_pool_size(&self) -> Option<usize> {
        self.worker_pool_size
    }

    pub fn connect_timeout(&self) -> Option<Duration> {
        self.connect_timeout
    }

    /// Engine-wide response timeout default; per-request values override it.
    pub fn read_timeout(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub fn cookies_disabled(&self) -> bool {
        self.disable_cookies
    }

    pub fn proxy(&self) -> Option<&ProxyConfig> {
        self.proxy.as_ref()
    }

    pub fn basic_auth(&self) -> Option<&BasicCredential> {
        self.basic_auth.as_ref()
    }

    /// Redirect-following default for requests that do not override it.
    pub fn follow_redirects(&self) -> bool {
        self.follow_redirects
    }

    /// The bag these settings were validated from.
    pub fn properties(&self) -> &Properties {
        &self.properties
    }
}

fn checked<T: FromValue>(
    properties: &Properties,
    name: &'static str,
) -> Result<Option<T>, ConfigurationError> {
    match properties.raw(name) {
        None => Ok(None),
        Some(value) => match T::from_value(value) {
            Some(v) => Ok(Some(v)),
            None => Err(ConfigurationError::WrongType {
                name: name.to_owned(),
                expected: T::EXPECTED,
                found: value.type_name(),
            }),
        },
    }
}

fn proxy_from_value(value: &Value) -> Result<ProxyConfig, ConfigurationError> {
    let uri = match value {
        Value::Uri(uri) => uri.clone(),
        Value::Str(raw) => {
            raw.parse::<Uri>()
                .map_err(|source| ConfigurationError::InvalidProxyUri {
                    value: raw.clone(),
                    source,
                })?
        }
        other => {
            return Err(ConfigurationError::WrongType {
                name: props::PROXY_URI.to_owned(),
                expected: "uri or string",
                found: other.type_name(),
            })
        }
    };

    let host = uri
        .host()
        .ok_or_else(|| ConfigurationError::ProxyUriMissingHost {
            value: uri.to_string(),
        })?
        .to_owned();
    // scheme default when the uri carries no explicit port
    let port = uri.port_u16().unwrap_or(match uri.scheme_str() {
        Some("https") => 443,
        _ => 80,
    });

    Ok(ProxyConfig { host, port })
}
