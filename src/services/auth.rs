//! Registration and sign-in.

use axum::http::{Method, StatusCode};
use serde::Deserialize;
use serde_json::json;

use crate::{
    api::{self, validation::NonBlank, Error, Event, Reply, Request, Resource, Response},
    crypto::hash_password,
    store::{self, NewUser, UserStore},
    token::Token,
};

/// The `/api/auth` resource.
pub const RESOURCE: Resource = Resource {
    name: "auth",
    allowed_methods: "GET, POST, OPTIONS",
};

/// A `POST` request body, dispatched on its `action` field.
#[derive(Deserialize, Debug)]
#[serde(tag = "action", rename_all = "snake_case")]
enum PostRequest {
    /// Creates an account.
    Register {
        /// The requested username.
        username: Option<String>,

        /// The user's email address.
        email: Option<String>,

        /// The user's password in plain text.
        password: Option<String>,
    },

    /// Signs in to an existing account.
    Login {
        /// The account's username.
        username: Option<String>,

        /// The account's password in plain text.
        password: Option<String>,
    },

    /// Any other action.
    #[serde(other)]
    Unknown,
}

/// Handles an `/api/auth` event.
pub async fn handler<S: UserStore>(store: &S, event: Event) -> Response {
    api::handle(RESOURCE, event, |request| route(store, request)).await
}

/// Routes a request by method and action.
async fn route<S: UserStore>(store: &S, request: Request) -> Reply {
    if *request.method() != Method::POST {
        return Err(Error::MethodNotAllowed);
    }

    match request.tagged_body("action", "")? {
        PostRequest::Register {
            username,
            email,
            password,
        } => register(store, username, email, password).await,
        PostRequest::Login { username, password } => login(store, username, password).await,
        PostRequest::Unknown => Err(Error::Validation("Invalid action")),
    }
}

/// Creates a user and issues them a session token.
async fn register<S: UserStore>(
    store: &S,
    username: Option<String>,
    email: Option<String>,
    password: Option<String>,
) -> Reply {
    let (Some(username), Some(email), Some(password)) = (
        NonBlank::trimmed(username),
        NonBlank::trimmed(email),
        NonBlank::verbatim(password),
    ) else {
        return Err(Error::Validation(
            "Username, email and password are required",
        ));
    };

    let user = store
        .create_user(NewUser {
            username,
            email,
            password_hash: hash_password(&password),
        })
        .await
        .map_err(|error| match error {
            store::Error::UniqueViolation(_) => Error::Conflict("Username or email already exists"),
            error => error.into(),
        })?;

    tracing::info!(user_id = %user.id, "user registered");

    Ok((
        StatusCode::CREATED,
        json!({ "success": true, "user": user, "token": Token::generate() }),
    ))
}

/// Signs a user in by username and password, issuing them a new session token.
async fn login<S: UserStore>(
    store: &S,
    username: Option<String>,
    password: Option<String>,
) -> Reply {
    let (Some(username), Some(password)) =
        (NonBlank::trimmed(username), NonBlank::verbatim(password))
    else {
        return Err(Error::Validation("Username and password are required"));
    };

    let Some(user) = store
        .sign_in(username.as_str(), &hash_password(&password))
        .await?
    else {
        return Err(Error::Unauthorized("Invalid username or password"));
    };

    Ok((
        StatusCode::OK,
        json!({ "success": true, "user": user, "token": Token::generate() }),
    ))
}
