//! Rows read from the database, in the shapes the handlers return them.

use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::FromRow;

use crate::api::validation::{EntityId, TopicStatus};

/// A user account, excluding its password hash.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct UserProfile {
    /// The user's ID.
    pub id: EntityId,

    /// The user's unique name.
    pub username: String,

    /// The user's unique email address.
    pub email: String,

    /// The user's displayed rank.
    pub rank: String,

    /// The user's reputation score.
    pub reputation: i32,

    /// How long the user has spent on the site.
    pub time_spent_minutes: i32,

    /// When the user last signed in, if ever.
    pub last_login: Option<DateTime<Utc>>,

    /// When the user registered.
    pub created_at: DateTime<Utc>,
}

/// A script as stored.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct Script {
    /// The script's ID.
    pub id: EntityId,

    /// The script's title.
    pub title: String,

    /// The script's source code.
    pub code: String,

    /// The catalog category the script is listed under.
    pub category: String,

    /// The author's description, possibly empty.
    pub description: String,

    /// The ID of the user who uploaded the script.
    pub author_id: EntityId,

    /// How many distinct users liked the script.
    pub likes: i32,

    /// How many times the script was downloaded.
    pub downloads: i32,

    /// When the script was uploaded.
    pub created_at: DateTime<Utc>,
}

/// A [`Script`] joined with its author's name.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct ScriptWithAuthor {
    /// The script.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub script: Script,

    /// The author's username.
    pub author_name: String,
}

/// A forum topic as stored.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct Topic {
    /// The topic's ID.
    pub id: EntityId,

    /// The topic's title.
    pub title: String,

    /// The ID of the user who opened the topic.
    pub author_id: EntityId,

    /// Whether the topic is open or closed.
    #[sqlx(try_from = "String")]
    pub status: TopicStatus,

    /// How many times the topic was fetched by ID.
    pub views: i32,

    /// When the topic was opened.
    pub created_at: DateTime<Utc>,

    /// When the topic's status last changed.
    pub updated_at: DateTime<Utc>,
}

/// A [`Topic`] joined with its author's name and reply count.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct TopicWithStats {
    /// The topic.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub topic: Topic,

    /// The author's username.
    pub author_name: String,

    /// How many replies the topic has.
    pub replies: i64,
}

/// A comment under a script.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct ScriptComment {
    /// The comment's ID.
    pub id: EntityId,

    /// The script the comment is under.
    pub script_id: EntityId,

    /// The commenter's user ID.
    pub author_id: EntityId,

    /// The comment's text.
    pub content: String,

    /// When the comment was posted.
    pub created_at: DateTime<Utc>,
}

/// A reply under a forum topic.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct ForumReply {
    /// The reply's ID.
    pub id: EntityId,

    /// The topic the reply is under.
    pub topic_id: EntityId,

    /// The replier's user ID.
    pub author_id: EntityId,

    /// The reply's text.
    pub content: String,

    /// When the reply was posted.
    pub created_at: DateTime<Utc>,
}

/// A [`ScriptComment`] joined with its author's name and rank.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct ScriptCommentEntry {
    /// The comment.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub comment: ScriptComment,

    /// The commenter's username.
    pub author_name: String,

    /// The commenter's rank.
    pub rank: String,
}

/// A [`ForumReply`] joined with its author's name and rank.
#[derive(FromRow, Serialize, Clone, PartialEq, Eq, Debug)]
pub struct ForumReplyEntry {
    /// The reply.
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub reply: ForumReply,

    /// The replier's username.
    pub author_name: String,

    /// The replier's rank.
    pub rank: String,
}
