//! The request/response contract shared by every handler.
//!
//! A handler receives an [`Event`] and always produces a [`Response`]. [`handle`] owns everything
//! that isn't specific to a resource: answering CORS preflights without touching the store,
//! rejecting unknown methods, and rendering success or failure as a JSON response.

mod error;
mod response;
pub mod validation;

use std::{collections::HashMap, future::Future};

use axum::http::{Method, StatusCode};
pub use error::Error;
pub use response::Response;
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use serde_json::{map::Entry, Map, Value};

/// The result of routing a [`Request`]: a status and JSON body, or an [`Error`].
pub type Reply = Result<(StatusCode, Value), Error>;

/// An HTTP-shaped request as delivered to a handler.
#[derive(Deserialize, Serialize, Clone, PartialEq, Eq, Default, Debug)]
#[serde(rename_all = "camelCase")]
pub struct Event {
    /// The request method. Defaults to `GET` when absent.
    #[serde(default)]
    pub http_method: Option<String>,

    /// The raw request body, expected to be a JSON object.
    #[serde(default)]
    pub body: Option<String>,

    /// The request's query parameters.
    #[serde(default)]
    pub query_string_parameters: Option<HashMap<String, String>>,
}

/// A resource served by one handler.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct Resource {
    /// The resource's name, for logs.
    pub name: &'static str,

    /// The methods advertised to CORS preflight requests.
    pub allowed_methods: &'static str,
}

/// A non-preflight [`Event`] with its method parsed.
#[derive(Clone, Debug)]
pub struct Request {
    /// The request method.
    method: Method,

    /// The raw request body.
    body: Option<String>,

    /// The request's query parameters.
    query: HashMap<String, String>,
}

impl Request {
    /// Gets the request method.
    pub fn method(&self) -> &Method {
        &self.method
    }

    /// Deserializes the query parameters. Parameters with empty values count as absent.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidQuery`] if a parameter has the wrong type.
    pub fn query<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let params = self
            .query
            .iter()
            .filter(|(_, value)| !value.is_empty())
            .map(|(name, value)| (name.clone(), Value::String(value.clone())))
            .collect();

        serde_json::from_value(Value::Object(params))
            .map_err(|error| Error::InvalidQuery(error.to_string()))
    }

    /// Deserializes the body. A missing or blank body counts as `{}`.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidBody`] if the body isn't valid JSON of the expected shape.
    pub fn body<T: DeserializeOwned>(&self) -> Result<T, Error> {
        let body = self
            .body
            .as_deref()
            .filter(|body| !body.trim().is_empty())
            .unwrap_or("{}");

        serde_json::from_str(body).map_err(|error| Error::InvalidBody(error.to_string()))
    }

    /// Deserializes a body that's dispatched on a string `tag` field, filling in `default` as the
    /// tag if it's missing. A `null` tag is replaced with an empty one.
    ///
    /// Enums read this way should be internally tagged by `tag` and have a `#[serde(other)]`
    /// variant, so an empty tag selects that variant.
    ///
    /// # Errors
    ///
    /// Fails with [`Error::InvalidBody`] if the body isn't a JSON object of the expected shape.
    pub fn tagged_body<T: DeserializeOwned>(
        &self,
        tag: &'static str,
        default: &'static str,
    ) -> Result<T, Error> {
        let mut body: Map<String, Value> = self.body()?;

        match body.entry(tag) {
            Entry::Vacant(entry) => {
                entry.insert(default.into());
            }
            Entry::Occupied(mut entry) if entry.get().is_null() => {
                entry.insert("".into());
            }
            Entry::Occupied(_) => {}
        }

        serde_json::from_value(Value::Object(body))
            .map_err(|error| Error::InvalidBody(error.to_string()))
    }
}

/// Handles an [`Event`] for a resource, passing anything other than a preflight to `route`.
///
/// Preflights are answered without calling `route`, so they never reach the store.
pub async fn handle<F, Fut>(resource: Resource, event: Event, route: F) -> Response
where
    F: FnOnce(Request) -> Fut + Send,
    Fut: Future<Output = Reply> + Send,
{
    let method = event.http_method.as_deref().unwrap_or("GET");

    if method == Method::OPTIONS {
        return Response::preflight(resource.allowed_methods);
    }

    let Ok(method) = Method::from_bytes(method.as_bytes()) else {
        return Response::from_error(resource, &Error::MethodNotAllowed);
    };

    tracing::debug!(resource = resource.name, %method, "handling request");

    let request = Request {
        method,
        body: event.body,
        query: event.query_string_parameters.unwrap_or_default(),
    };

    match route(request).await {
        Ok((status, body)) => Response::json(status, &body),
        Err(error) => Response::from_error(resource, &error),
    }
}
