//! Comments under scripts and replies under forum topics.

use axum::http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{
        self,
        validation::{EntityId, NonBlank},
        Error, Event, Reply, Request, Resource, Response,
    },
    store::{CommentStore, NewPost},
};

/// The `/api/comments` resource.
pub const RESOURCE: Resource = Resource {
    name: "comments",
    allowed_methods: "GET, POST, OPTIONS",
};

/// `GET` query parameters. Exactly one is expected.
#[derive(Deserialize, Debug)]
struct GetQuery {
    /// Lists this script's comments. Checked first.
    script_id: Option<EntityId>,

    /// Lists this topic's replies.
    topic_id: Option<EntityId>,
}

/// A `POST` request body.
#[derive(Deserialize, Debug)]
struct PostRequest {
    /// The posting user.
    author_id: Option<EntityId>,

    /// The post's text.
    content: Option<String>,

    /// What's being replied to.
    #[serde(flatten)]
    target: PostTarget,
}

/// What a post replies to, dispatched on the body's `type` field.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum PostTarget {
    /// A comment under a script.
    Script {
        /// The script being commented on.
        script_id: Option<EntityId>,
    },

    /// A reply under a forum topic.
    Forum {
        /// The topic being replied to.
        topic_id: Option<EntityId>,
    },

    /// Any other type.
    #[serde(other)]
    Unknown,
}

/// Handles an `/api/comments` event.
pub async fn handler<S: CommentStore>(store: &S, event: Event) -> Response {
    api::handle(RESOURCE, event, |request| route(store, request)).await
}

/// Routes a request by method.
async fn route<S: CommentStore>(store: &S, request: Request) -> Reply {
    match *request.method() {
        Method::GET => get(store, request.query()?).await,
        Method::POST => post(store, request.tagged_body("type", "script")?).await,
        _ => Err(Error::MethodNotAllowed),
    }
}

/// Lists a script's comments or a topic's replies.
async fn get<S: CommentStore>(store: &S, query: GetQuery) -> Reply {
    if let Some(script_id) = query.script_id {
        let comments = store.script_comments(script_id).await?;

        return Ok((StatusCode::OK, json!({ "comments": comments })));
    }

    if let Some(topic_id) = query.topic_id {
        let replies = store.topic_replies(topic_id).await?;

        return Ok((StatusCode::OK, json!({ "replies": replies })));
    }

    Err(Error::Validation("script_id or topic_id required"))
}

/// Posts a comment or reply.
async fn post<S: CommentStore>(store: &S, body: PostRequest) -> Reply {
    let (Some(author_id), Some(content)) = (
        EntityId::required(body.author_id),
        NonBlank::trimmed(body.content),
    ) else {
        return Err(Error::Validation("author_id and content are required"));
    };

    match body.target {
        PostTarget::Script { script_id } => {
            let Some(script_id) = EntityId::required(script_id) else {
                return Err(Error::Validation("script_id is required"));
            };

            let comment = store
                .create_script_comment(NewPost {
                    parent_id: script_id,
                    author_id,
                    content,
                })
                .await?;

            Ok((StatusCode::CREATED, json!({ "success": true, "comment": comment })))
        }
        PostTarget::Forum { topic_id } => {
            let Some(topic_id) = EntityId::required(topic_id) else {
                return Err(Error::Validation("topic_id is required"));
            };

            let reply = store
                .create_topic_reply(NewPost {
                    parent_id: topic_id,
                    author_id,
                    content,
                })
                .await?;

            Ok((StatusCode::CREATED, json!({ "success": true, "reply": reply })))
        }
        PostTarget::Unknown => Err(Error::Validation("Invalid type")),
    }
}
