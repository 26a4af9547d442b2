//! Translation between the abstract request/response model and the engine's.

use std::time::Duration;

use http::header::HeaderValue;

use crate::{
    engine::{Engine, EngineMethod, EngineRequest, RawBody, RawResponse},
    error::UnsupportedMethodError,
    header::HeaderMap,
    request::Request,
    response::{EntityStream, Response},
};

/// Map an abstract request onto a fresh engine request.
///
/// Fails before any engine activity when the method falls outside the closed
/// set. The entity is attached separately by the caller, since the two
/// invocation paths serialize it differently.
pub(crate) fn translate_request<E: Engine>(
    engine: &E,
    request: &Request,
) -> Result<E::Request, UnsupportedMethodError> {
    let method = EngineMethod::from_name(request.method().as_str())
        .ok_or_else(|| UnsupportedMethodError::new(request.method().as_str()))?;

    let mut native = engine.create_request(method, request.uri());

    // an explicit per-request policy wins; otherwise the engine default stands
    if let Some(follow) = request.follow_override() {
        native.set_follow_redirects(follow);
    }
    if let Some(timeout) = request.timeout_override() {
        if timeout > Duration::ZERO {
            native.set_read_timeout(timeout);
        }
    }

    write_headers(request.headers(), &mut native);
    Ok(native)
}

/// Flatten the multi-valued header map into single engine header lines.
///
/// Multiple values for one name are joined with a comma. Values that
/// themselves contain commas become indistinguishable after the join; the
/// engine receives the line as-is.
fn write_headers<R: EngineRequest>(headers: &HeaderMap, native: &mut R) {
    for (name, values) in headers.entries() {
        match values {
            [single] => native.add_header(name.clone(), single.clone()),
            values => {
                let mut joined = Vec::new();
                for value in values {
                    if !joined.is_empty() {
                        joined.push(b',');
                    }
                    joined.extend_from_slice(value.as_bytes());
                }
                // joining valid header values with commas stays valid
                let value = HeaderValue::from_bytes(&joined).unwrap();
                native.add_header(name.clone(), value);
            }
        }
    }
}

/// Rebuild an abstract response from the engine-native one. Cannot fail.
pub(crate) fn translate_response(raw: RawResponse) -> Response {
    let mut headers = HeaderMap::new();
    // arrival order; repeated names accumulate rather than replace
    for (name, value) in raw.headers {
        headers.append(name, value);
    }

    let entity = match raw.body {
        RawBody::None => None,
        RawBody::Bytes(bytes) => Some(EntityStream::buffered(bytes)),
        RawBody::Channel(rx) => Some(EntityStream::channel(rx)),
    };

    Response::new(raw.status, raw.reason, headers, entity)
}
