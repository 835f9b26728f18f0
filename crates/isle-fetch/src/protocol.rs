//! Request construction and response validation for the payload protocol.

use http::header::{ACCEPT, CONTENT_TYPE};
use http::{Method, Request, Response};
use isle_core::{Payload, RouteKey};

use crate::error::FetchError;

/// Content type of serialized tree payloads.
pub const RSC_CONTENT_TYPE: &str = "text/x-component";

/// Endpoint receiving server action calls.
pub const ACTION_ENDPOINT: &str = "/_rsc";

/// Header carrying the server action identifier.
pub const ACTION_HEADER: &str = "RSC-Action";

/// Build the partial tree request for a route.
pub fn route_request(key: &RouteKey) -> Result<Request<Vec<u8>>, FetchError> {
    Request::builder()
        .method(Method::GET)
        .uri(key.partial_url())
        .header(ACCEPT, RSC_CONTENT_TYPE)
        .body(Vec::new())
        .map_err(|e| FetchError::Request(e.to_string()))
}

/// Build a server action call.
pub fn action_request(
    action_id: &str,
    args: &[serde_json::Value],
) -> Result<Request<Vec<u8>>, FetchError> {
    let body = serde_json::to_vec(args).map_err(|e| FetchError::Request(e.to_string()))?;

    Request::builder()
        .method(Method::POST)
        .uri(ACTION_ENDPOINT)
        .header(CONTENT_TYPE, "application/json")
        .header(ACCEPT, RSC_CONTENT_TYPE)
        .header(ACTION_HEADER, action_id)
        .body(body)
        .map_err(|e| FetchError::Request(e.to_string()))
}

/// Validate a response and extract its payload.
///
/// Non-success status is a network error; a success with the wrong content
/// type is a protocol error.
pub fn payload_from_response(url: &str, response: Response<Vec<u8>>) -> Result<Payload, FetchError> {
    let status = response.status();
    if !status.is_success() {
        return Err(FetchError::Http {
            status: status.as_u16(),
            url: url.to_string(),
        });
    }

    let content_type = response
        .headers()
        .get(CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or_default();

    if !is_payload_content_type(content_type) {
        return Err(FetchError::Protocol {
            url: url.to_string(),
            content_type: content_type.to_string(),
        });
    }

    Ok(Payload::new(response.into_body()))
}

/// Check a `Content-Type` value, ignoring parameters such as charset.
pub fn is_payload_content_type(value: &str) -> bool {
    value
        .split(';')
        .next()
        .map(str::trim)
        .is_some_and(|mime| mime.eq_ignore_ascii_case(RSC_CONTENT_TYPE))
}
