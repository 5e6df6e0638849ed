//! The script catalog.

use axum::http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{
        self,
        validation::{EntityId, NonBlank},
        Error, Event, Reply, Request, Resource, Response,
    },
    store::{NewScript, ScriptFilter, ScriptStore},
};

/// The `/api/scripts` resource.
pub const RESOURCE: Resource = Resource {
    name: "scripts",
    allowed_methods: "GET, POST, PUT, OPTIONS",
};

/// `GET` query parameters.
#[derive(Deserialize, Debug)]
struct GetQuery {
    /// Fetches one script instead of listing.
    id: Option<EntityId>,

    /// Lists only this category. Takes precedence over `author_id`.
    category: Option<String>,

    /// Lists only this user's scripts.
    author_id: Option<EntityId>,
}

/// A `POST` request body, dispatched on its `action` field.
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
enum PostRequest {
    /// Uploads a script.
    Create {
        /// The script's title.
        title: Option<String>,

        /// The script's source code.
        code: Option<String>,

        /// The catalog category.
        category: Option<String>,

        /// An optional description.
        description: Option<String>,

        /// The uploading user.
        author_id: Option<EntityId>,
    },

    /// Likes a script on behalf of a user.
    Like {
        /// The script to like.
        script_id: Option<EntityId>,

        /// The user liking it.
        user_id: Option<EntityId>,
    },

    /// Counts a download.
    Download {
        /// The script downloaded.
        script_id: Option<EntityId>,
    },

    /// Any other action.
    #[serde(other)]
    Unknown,
}

/// Handles an `/api/scripts` event.
pub async fn handler<S: ScriptStore>(store: &S, event: Event) -> Response {
    api::handle(RESOURCE, event, |request| route(store, request)).await
}

/// Routes a request by method and action.
async fn route<S: ScriptStore>(store: &S, request: Request) -> Reply {
    match *request.method() {
        Method::GET => get(store, request.query()?).await,
        Method::POST => match request.tagged_body("action", "")? {
            PostRequest::Create {
                title,
                code,
                category,
                description,
                author_id,
            } => create(store, title, code, category, description, author_id).await,
            PostRequest::Like { script_id, user_id } => like(store, script_id, user_id).await,
            PostRequest::Download { script_id } => download(store, script_id).await,
            PostRequest::Unknown => Err(Error::Validation("Invalid action")),
        },
        _ => Err(Error::MethodNotAllowed),
    }
}

/// Fetches one script, or lists scripts under at most one filter.
async fn get<S: ScriptStore>(store: &S, query: GetQuery) -> Reply {
    if let Some(id) = query.id {
        let Some(script) = store.script(id).await? else {
            return Err(Error::NotFound("Script not found"));
        };

        return Ok((StatusCode::OK, json!({ "script": script })));
    }

    let filter = match (query.category, query.author_id) {
        (Some(category), _) => ScriptFilter::Category(category),
        (None, Some(author_id)) => ScriptFilter::Author(author_id),
        (None, None) => ScriptFilter::All,
    };

    let scripts = store.list_scripts(filter).await?;

    Ok((StatusCode::OK, json!({ "scripts": scripts })))
}

/// Uploads a script, awarding its author reputation.
async fn create<S: ScriptStore>(
    store: &S,
    title: Option<String>,
    code: Option<String>,
    category: Option<String>,
    description: Option<String>,
    author_id: Option<EntityId>,
) -> Reply {
    let (Some(title), Some(code), Some(category), Some(author_id)) = (
        NonBlank::trimmed(title),
        NonBlank::trimmed(code),
        NonBlank::trimmed(category),
        EntityId::required(author_id),
    ) else {
        return Err(Error::Validation(
            "Title, code, category and author_id are required",
        ));
    };

    let script = store
        .create_script(NewScript {
            title,
            code,
            category,
            description: description
                .map(|description| description.trim().to_owned())
                .unwrap_or_default(),
            author_id,
        })
        .await?;

    tracing::info!(script_id = %script.id, %author_id, "script created");

    Ok((StatusCode::CREATED, json!({ "success": true, "script": script })))
}

/// Likes a script. Repeat likes by the same user succeed without effect.
async fn like<S: ScriptStore>(
    store: &S,
    script_id: Option<EntityId>,
    user_id: Option<EntityId>,
) -> Reply {
    let (Some(script_id), Some(user_id)) =
        (EntityId::required(script_id), EntityId::required(user_id))
    else {
        return Err(Error::Validation("script_id and user_id are required"));
    };

    let liked = store.like_script(script_id, user_id).await?;

    Ok((StatusCode::OK, json!({ "success": true, "liked": liked })))
}

/// Counts a download of a script.
async fn download<S: ScriptStore>(store: &S, script_id: Option<EntityId>) -> Reply {
    let Some(script_id) = EntityId::required(script_id) else {
        return Err(Error::Validation("script_id is required"));
    };

    store.record_download(script_id).await?;

    Ok((StatusCode::OK, json!({ "success": true })))
}
