//! See [`Response`].

use std::collections::BTreeMap;

use axum::{
    body::Body,
    http::{HeaderName, HeaderValue, StatusCode},
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::api::{Error, Resource};

/// The request headers browsers may send cross-origin.
const ALLOWED_HEADERS: &str = "Content-Type, X-User-Id, X-Auth-Token";

/// How long browsers may cache a preflight response, in seconds.
const PREFLIGHT_MAX_AGE: &str = "86400";

/// An HTTP-shaped response as returned by a handler.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Response {
    /// The response status code.
    pub status_code: u16,

    /// The response headers.
    pub headers: BTreeMap<String, String>,

    /// The response body: a JSON document, or empty for preflights.
    pub body: String,

    /// Always `false`; bodies are never binary.
    pub is_base64_encoded: bool,
}

impl Response {
    /// Constructs a body-less response to a CORS preflight request.
    pub fn preflight(allowed_methods: &str) -> Self {
        let headers = [
            ("Access-Control-Allow-Origin", "*"),
            ("Access-Control-Allow-Methods", allowed_methods),
            ("Access-Control-Allow-Headers", ALLOWED_HEADERS),
            ("Access-Control-Max-Age", PREFLIGHT_MAX_AGE),
        ];

        Self {
            status_code: StatusCode::OK.as_u16(),
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
            body: String::new(),
            is_base64_encoded: false,
        }
    }

    /// Constructs a JSON response.
    pub fn json(status: StatusCode, body: &Value) -> Self {
        let headers = [
            ("Content-Type", "application/json"),
            ("Access-Control-Allow-Origin", "*"),
        ];

        Self {
            status_code: status.as_u16(),
            headers: headers
                .into_iter()
                .map(|(name, value)| (name.to_owned(), value.to_owned()))
                .collect(),
            body: body.to_string(),
            is_base64_encoded: false,
        }
    }

    /// Constructs an `{"error": ...}` response for an error, logging it if it's a server error.
    pub fn from_error(resource: Resource, error: &Error) -> Self {
        let status = error.status();

        if status.is_server_error() {
            tracing::error!(resource = resource.name, %error, "request failed");
        } else {
            tracing::debug!(resource = resource.name, %status, %error, "request rejected");
        }

        Self::json(status, &json!({ "error": error.to_string() }))
    }

    /// Gets the response status code.
    pub fn status(&self) -> StatusCode {
        StatusCode::from_u16(self.status_code).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR)
    }

    /// Parses the body as JSON, or returns `None` if it's empty.
    ///
    /// # Errors
    ///
    /// Fails if the body isn't valid JSON.
    pub fn json_body(&self) -> serde_json::Result<Option<Value>> {
        if self.body.is_empty() {
            return Ok(None);
        }

        serde_json::from_str(&self.body).map(Some)
    }
}

impl axum::response::IntoResponse for Response {
    fn into_response(self) -> axum::response::Response {
        let status = self.status();
        let mut response = axum::response::Response::new(Body::from(self.body));
        *response.status_mut() = status;

        for (name, value) in self.headers {
            let (Ok(name), Ok(value)) = (
                HeaderName::try_from(name),
                HeaderValue::try_from(value),
            ) else {
                continue;
            };

            response.headers_mut().insert(name, value);
        }

        response
    }
}
