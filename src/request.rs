//! Abstract request model and builder.

use std::{fmt, time::Duration};

use bytes::Bytes;
use http::{
    header::{HeaderName, HeaderValue, AUTHORIZATION, CONTENT_TYPE},
    Error as HttpError, Method, Uri,
};
use serde::Serialize;

use crate::{
    body::{Entity, EntityWriter},
    error::InvalidRequest,
    header::HeaderMap,
};

/// An abstract HTTP request.
///
/// Construction follows a builder pattern. Malformed parts do not fail the
/// builder; they are latched and surface when the request is sent.
///
/// ```
/// use http_connector::Request;
///
/// let request = Request::get("http://localhost/resource")
///     .header("x-test", "111")
///     .follow_redirects(false);
/// ```
pub struct Request {
    method: Method,
    uri: Uri,
    headers: HeaderMap,
    entity: Option<Entity>,
    read_timeout: Option<Duration>,
    follow_redirects: Option<bool>,
    err: Option<InvalidRequest>,
}

impl Request {
    /// Start building a request with an explicit method.
    pub fn new<U>(method: Method, uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<HttpError>,
    {
        let mut req = Request {
            method,
            uri: Uri::default(),
            headers: HeaderMap::new(),
            entity: None,
            read_timeout: None,
            follow_redirects: None,
            err: None,
        };
        match Uri::try_from(uri) {
            Ok(uri) => req.uri = uri,
            Err(err) => req.latch(InvalidRequest::Http(err.into())),
        }
        req
    }

    pub fn get<U>(uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<HttpError>,
    {
        Request::new(Method::GET, uri)
    }

    pub fn post<U>(uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<HttpError>,
    {
        Request::new(Method::POST, uri)
    }

    pub fn put<U>(uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<HttpError>,
    {
        Request::new(Method::PUT, uri)
    }

    pub fn delete<U>(uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<HttpError>,
    {
        Request::new(Method::DELETE, uri)
    }

    pub fn head<U>(uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<HttpError>,
    {
        Request::new(Method::HEAD, uri)
    }

    pub fn options<U>(uri: U) -> Self
    where
        Uri: TryFrom<U>,
        <Uri as TryFrom<U>>::Error: Into<HttpError>,
    {
        Request::new(Method::OPTIONS, uri)
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn uri(&self) -> &Uri {
        &self.uri
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn headers_mut(&mut self) -> &mut HeaderMap {
        &mut self.headers
    }

    /// Append a header, keeping any existing values for the name.
    pub fn header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => self.headers.append(name, value),
            (Err(err), _) => self.latch(InvalidRequest::Http(err.into())),
            (_, Err(err)) => self.latch(InvalidRequest::Http(err.into())),
        }
        self
    }

    /// Set a header, replacing any existing values for the name.
    pub fn set_header<K, V>(mut self, name: K, value: V) -> Self
    where
        HeaderName: TryFrom<K>,
        <HeaderName as TryFrom<K>>::Error: Into<HttpError>,
        HeaderValue: TryFrom<V>,
        <HeaderValue as TryFrom<V>>::Error: Into<HttpError>,
    {
        match (HeaderName::try_from(name), HeaderValue::try_from(value)) {
            (Ok(name), Ok(value)) => self.headers.insert(name, value),
            (Err(err), _) => self.latch(InvalidRequest::Http(err.into())),
            (_, Err(err)) => self.latch(InvalidRequest::Http(err.into())),
        }
        self
    }

    /// Set the `content-type` header.
    pub fn content_type(mut self, mime: mime::Mime) -> Self {
        match HeaderValue::from_str(mime.as_ref()) {
            Ok(value) => self.headers.insert(CONTENT_TYPE, value),
            Err(err) => self.latch(InvalidRequest::Http(err.into())),
        }
        self
    }

    /// Set an HTTP basic authorization header on this request only.
    pub fn basic_auth<U>(mut self, username: U, password: Option<&str>) -> Self
    where
        U: fmt::Display,
    {
        let auth = match password {
            Some(password) => format!("{username}:{password}"),
            None => format!("{username}:"),
        };
        let token = {
            use base64::prelude::{Engine as _, BASE64_STANDARD};
            BASE64_STANDARD.encode(auth)
        };
        match HeaderValue::from_str(&format!("Basic {token}")) {
            Ok(value) => self.headers.insert(AUTHORIZATION, value),
            Err(err) => self.latch(InvalidRequest::Http(err.into())),
        }
        self
    }

    /// Set an HTTP bearer authentication header.
    pub fn bearer_auth<T>(mut self, token: T) -> Self
    where
        T: fmt::Display,
    {
        match HeaderValue::from_str(&format!("Bearer {token}")) {
            Ok(value) => self.headers.insert(AUTHORIZATION, value),
            Err(err) => self.latch(InvalidRequest::Http(err.into())),
        }
        self
    }

    /// Per-request read timeout, shadowing the connector-level default.
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.read_timeout = Some(timeout);
        self
    }

    /// Per-request redirect policy, shadowing the connector-level default.
    pub fn follow_redirects(mut self, follow: bool) -> Self {
        self.follow_redirects = Some(follow);
        self
    }

    /// Attach raw body bytes.
    pub fn body(mut self, body: impl Into<Bytes>) -> Self {
        self.entity = Some(Entity::bytes(body));
        self
    }

    /// Attach a deferred body writer, serialized only when the request is
    /// sent.
    pub fn body_writer(mut self, writer: impl EntityWriter + 'static) -> Self {
        self.entity = Some(Entity::writer(writer));
        self
    }

    /// Attach a JSON body and set `content-type: application/json`.
    pub fn json<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_json::to_vec(value) {
            Ok(body) => {
                self.entity = Some(Entity::bytes(body));
                self.headers
                    .insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));
            }
            Err(err) => self.latch(InvalidRequest::Json(err)),
        }
        self
    }

    /// Attach a form-urlencoded body and set the matching content type.
    pub fn form<T: Serialize + ?Sized>(mut self, value: &T) -> Self {
        match serde_urlencoded::to_string(value) {
            Ok(body) => {
                self.entity = Some(Entity::bytes(body));
                self.headers.insert(
                    CONTENT_TYPE,
                    HeaderValue::from_static("application/x-www-form-urlencoded"),
                );
            }
            Err(err) => self.latch(InvalidRequest::Form(err)),
        }
        self
    }

    pub fn has_entity(&self) -> bool {
        self.entity.is_some()
    }

    pub(crate) fn take_entity(&mut self) -> Option<Entity> {
        self.entity.take()
    }

    pub(crate) fn take_error(&mut self) -> Option<InvalidRequest> {
        self.err.take()
    }

    pub(crate) fn timeout_override(&self) -> Option<Duration> {
        self.read_timeout
    }

    pub(crate) fn follow_override(&self) -> Option<bool> {
        self.follow_redirects
    }

    // first failure wins; later ones would only obscure the root cause
    fn latch(&mut self, err: InvalidRequest) {
        if self.err.is_none() {
            self.err = Some(err);
        }
    }
}

impl fmt::Debug for Request {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(f, "\nRequest {} {}", self.method, self.uri)?;
        writeln!(f, "  headers:")?;
        for (key, val) in self.headers.iter() {
            writeln!(f, "    {key:?}: {val:?}")?;
        }
        Ok(())
    }
}
