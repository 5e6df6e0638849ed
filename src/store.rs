//! The relational store shared by every handler, seen through one trait per service.
//!
//! Each trait method is one unit of work: implementations must apply all of a method's writes or
//! none of them. Handlers make at most one store call per request, so this gives every request
//! all-or-nothing semantics.

#[cfg(test)]
pub(crate) mod memory;
pub mod postgres;

use std::future::Future;

use thiserror::Error;

use crate::{
    api::validation::{EntityId, NonBlank, TopicStatus},
    db,
    models::{
        ForumReply, ForumReplyEntry, Script, ScriptComment, ScriptCommentEntry, ScriptWithAuthor,
        Topic, TopicWithStats, UserProfile,
    },
};

/// The most rows any list operation returns.
pub const LIST_LIMIT: i64 = 50;

/// The reputation awarded to a user for uploading a script.
pub const SCRIPT_REPUTATION: i32 = 10;

/// The reputation awarded to a script's author each time a new user likes it.
pub const LIKE_REPUTATION: i32 = 1;

/// The rank given to newly registered users.
pub const DEFAULT_RANK: &str = "Newbie";

/// An error from the store.
#[derive(Error, Debug)]
pub enum Error {
    /// A write would have duplicated a value under a uniqueness constraint.
    #[error("duplicate value violates unique constraint \"{0}\"")]
    UniqueViolation(String),

    /// A write referenced a row that doesn't exist.
    #[error("insert or update violates foreign key constraint \"{0}\"")]
    ForeignKeyViolation(String),

    /// Any other database failure, including connectivity problems.
    #[error(transparent)]
    Database(sqlx::Error),
}

impl From<sqlx::Error> for Error {
    fn from(error: sqlx::Error) -> Self {
        let sqlx::Error::Database(database_error) = &error else {
            return Self::Database(error);
        };

        let constraint = database_error.constraint().unwrap_or_default().to_owned();

        match database_error.code().as_deref() {
            Some(db::UNIQUE_VIOLATION) => Self::UniqueViolation(constraint),
            Some(db::FOREIGN_KEY_VIOLATION) => Self::ForeignKeyViolation(constraint),
            _ => Self::Database(error),
        }
    }
}

/// The result of a store operation.
pub type Result<T> = std::result::Result<T, Error>;

/// A user account to register.
#[derive(Clone, Debug)]
pub struct NewUser {
    /// The requested username.
    pub username: NonBlank,

    /// The user's email address.
    pub email: NonBlank,

    /// The hash of the user's password.
    pub password_hash: String,
}

/// Persistence for user accounts.
pub trait UserStore: Sync {
    /// Inserts a user, returning its profile.
    ///
    /// Fails with [`Error::UniqueViolation`] if the username or email is taken.
    fn create_user(&self, user: NewUser) -> impl Future<Output = Result<UserProfile>> + Send;

    /// Finds the user whose username and password hash both match exactly, recording the current
    /// time as their last sign-in.
    fn sign_in(
        &self,
        username: &str,
        password_hash: &str,
    ) -> impl Future<Output = Result<Option<UserProfile>>> + Send;
}

/// Which scripts to list.
#[derive(Clone, PartialEq, Eq, Debug)]
pub enum ScriptFilter {
    /// Every script.
    All,

    /// Scripts in one category.
    Category(String),

    /// Scripts uploaded by one user.
    Author(EntityId),
}

/// A script to upload.
#[derive(Clone, Debug)]
pub struct NewScript {
    /// The script's title.
    pub title: NonBlank,

    /// The script's source code.
    pub code: NonBlank,

    /// The catalog category.
    pub category: NonBlank,

    /// The author's description, possibly empty.
    pub description: String,

    /// The uploading user.
    pub author_id: EntityId,
}

/// Persistence for the script catalog.
pub trait ScriptStore: Sync {
    /// Lists up to [`LIST_LIMIT`] scripts matching the filter, newest first.
    fn list_scripts(
        &self,
        filter: ScriptFilter,
    ) -> impl Future<Output = Result<Vec<ScriptWithAuthor>>> + Send;

    /// Gets a script by ID.
    fn script(&self, id: EntityId) -> impl Future<Output = Result<Option<ScriptWithAuthor>>> + Send;

    /// Inserts a script and awards its author [`SCRIPT_REPUTATION`].
    fn create_script(&self, script: NewScript) -> impl Future<Output = Result<Script>> + Send;

    /// Records that a user likes a script. Only if the like is new, increments the script's like
    /// count and awards its author [`LIKE_REPUTATION`].
    ///
    /// Returns whether the like was new.
    fn like_script(
        &self,
        script_id: EntityId,
        user_id: EntityId,
    ) -> impl Future<Output = Result<bool>> + Send;

    /// Increments a script's download count. A missing script is ignored.
    fn record_download(&self, script_id: EntityId) -> impl Future<Output = Result<()>> + Send;
}

/// A forum topic to open.
#[derive(Clone, Debug)]
pub struct NewTopic {
    /// The topic's title.
    pub title: NonBlank,

    /// The user opening the topic.
    pub author_id: EntityId,
}

/// Persistence for forum topics.
pub trait ForumStore: Sync {
    /// Lists up to [`LIST_LIMIT`] topics, newest first. Never changes view counts.
    fn list_topics(&self) -> impl Future<Output = Result<Vec<TopicWithStats>>> + Send;

    /// Gets a topic by ID and increments its view count.
    ///
    /// The returned topic shows the view count from before this fetch.
    fn view_topic(
        &self,
        id: EntityId,
    ) -> impl Future<Output = Result<Option<TopicWithStats>>> + Send;

    /// Inserts an open topic.
    fn create_topic(&self, topic: NewTopic) -> impl Future<Output = Result<Topic>> + Send;

    /// Sets a topic's status and touches its `updated_at`. Returns `None` if the topic is missing.
    fn set_topic_status(
        &self,
        id: EntityId,
        status: TopicStatus,
    ) -> impl Future<Output = Result<Option<Topic>>> + Send;
}

/// A comment or reply to post.
#[derive(Clone, Debug)]
pub struct NewPost {
    /// The script or topic being replied to.
    pub parent_id: EntityId,

    /// The posting user.
    pub author_id: EntityId,

    /// The post's text.
    pub content: NonBlank,
}

/// Persistence for script comments and forum replies.
pub trait CommentStore: Sync {
    /// Lists a script's comments, newest first.
    fn script_comments(
        &self,
        script_id: EntityId,
    ) -> impl Future<Output = Result<Vec<ScriptCommentEntry>>> + Send;

    /// Lists a topic's replies, oldest first.
    fn topic_replies(
        &self,
        topic_id: EntityId,
    ) -> impl Future<Output = Result<Vec<ForumReplyEntry>>> + Send;

    /// Inserts a comment under a script.
    fn create_script_comment(
        &self,
        comment: NewPost,
    ) -> impl Future<Output = Result<ScriptComment>> + Send;

    /// Inserts a reply under a topic.
    fn create_topic_reply(&self, reply: NewPost) -> impl Future<Output = Result<ForumReply>> + Send;
}
