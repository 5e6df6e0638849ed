//! Forum topics.

use axum::http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{
        self,
        validation::{EntityId, NonBlank, TopicStatus},
        Error, Event, Reply, Request, Resource, Response,
    },
    store::{ForumStore, NewTopic},
};

/// The `/api/forum` resource.
pub const RESOURCE: Resource = Resource {
    name: "forum",
    allowed_methods: "GET, POST, PUT, OPTIONS",
};

/// `GET` query parameters.
#[derive(Deserialize, Debug)]
struct GetQuery {
    /// Fetches one topic instead of listing.
    id: Option<EntityId>,
}

/// A `POST` request body.
#[derive(Deserialize, Debug)]
struct PostRequest {
    /// The topic's title.
    title: Option<String>,

    /// The user opening the topic.
    author_id: Option<EntityId>,
}

/// A `PUT` request body.
#[derive(Deserialize, Debug)]
struct PutRequest {
    /// The topic to update.
    topic_id: Option<EntityId>,

    /// The new status, `open` or `closed`.
    status: Option<String>,
}

/// Handles an `/api/forum` event.
pub async fn handler<S: ForumStore>(store: &S, event: Event) -> Response {
    api::handle(RESOURCE, event, |request| route(store, request)).await
}

/// Routes a request by method.
async fn route<S: ForumStore>(store: &S, request: Request) -> Reply {
    match *request.method() {
        Method::GET => get(store, request.query()?).await,
        Method::POST => post(store, request.body()?).await,
        Method::PUT => put(store, request.body()?).await,
        _ => Err(Error::MethodNotAllowed),
    }
}

/// Fetches one topic, counting the view, or lists topics.
async fn get<S: ForumStore>(store: &S, query: GetQuery) -> Reply {
    let Some(id) = query.id else {
        let topics = store.list_topics().await?;

        return Ok((StatusCode::OK, json!({ "topics": topics })));
    };

    let Some(topic) = store.view_topic(id).await? else {
        return Err(Error::NotFound("Topic not found"));
    };

    Ok((StatusCode::OK, json!({ "topic": topic })))
}

/// Opens a topic.
async fn post<S: ForumStore>(store: &S, body: PostRequest) -> Reply {
    let (Some(title), Some(author_id)) = (
        NonBlank::trimmed(body.title),
        EntityId::required(body.author_id),
    ) else {
        return Err(Error::Validation("title and author_id are required"));
    };

    let topic = store.create_topic(NewTopic { title, author_id }).await?;

    Ok((StatusCode::CREATED, json!({ "success": true, "topic": topic })))
}

/// Opens or closes a topic.
async fn put<S: ForumStore>(store: &S, body: PutRequest) -> Reply {
    let status = body
        .status
        .and_then(|status| TopicStatus::try_from(status).ok());

    let (Some(topic_id), Some(status)) = (EntityId::required(body.topic_id), status) else {
        return Err(Error::Validation("topic_id and valid status required"));
    };

    let Some(topic) = store.set_topic_status(topic_id, status).await? else {
        return Err(Error::NotFound("Topic not found"));
    };

    tracing::info!(%topic_id, status = status.as_ref(), "topic status changed");

    Ok((StatusCode::OK, json!({ "success": true, "topic": topic })))
}
