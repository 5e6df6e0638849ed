//! See [`PgStore`].

use sqlx::{PgConnection, PgPool, Postgres, QueryBuilder};

use crate::{
    api::validation::{EntityId, TopicStatus},
    db,
    models::{
        ForumReply, ForumReplyEntry, Script, ScriptComment, ScriptCommentEntry, ScriptWithAuthor,
        Topic, TopicWithStats, UserProfile,
    },
    store::{
        CommentStore, ForumStore, NewPost, NewScript, NewTopic, NewUser, Result, ScriptFilter,
        ScriptStore, UserStore, LIKE_REPUTATION, LIST_LIMIT, SCRIPT_REPUTATION,
    },
};

/// Column list for user profiles, excluding the password hash.
const USER_COLUMNS: &str = "\
    id, username, email, rank, reputation, time_spent_minutes, last_login, created_at";

/// Column list for `scripts` queries, with `scripts` aliased as `s`.
const SCRIPT_COLUMNS: &str = "\
    s.id, s.title, s.code, s.category, s.description, s.author_id, \
    s.likes, s.downloads, s.created_at";

/// Column list for `forum_topics` queries, with `forum_topics` aliased as `t`.
const TOPIC_COLUMNS: &str = "\
    t.id, t.title, t.author_id, t.status, t.views, t.created_at, t.updated_at";

/// A [`ScriptStore`] and friends backed by PostgreSQL.
///
/// Each operation checks a connection out of the pool for its duration. Operations that write more
/// than one statement run in a transaction ended by [`db::finish`].
#[derive(Clone, Debug)]
pub struct PgStore {
    /// The database pool.
    pool: PgPool,
}

impl PgStore {
    /// Wraps a database pool.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

impl UserStore for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<UserProfile> {
        Ok(sqlx::query_as(&format!(
            "INSERT INTO users (username, email, password_hash)
                VALUES ($1, $2, $3)
                RETURNING {USER_COLUMNS}"
        ))
        .bind(user.username.as_str())
        .bind(user.email.as_str())
        .bind(&user.password_hash)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn sign_in(&self, username: &str, password_hash: &str) -> Result<Option<UserProfile>> {
        // Matching and stamping in one statement keeps the lookup and `last_login` update atomic.
        Ok(sqlx::query_as(&format!(
            "UPDATE users
                SET last_login = CURRENT_TIMESTAMP
                WHERE username = $1 AND password_hash = $2
                RETURNING {USER_COLUMNS}"
        ))
        .bind(username)
        .bind(password_hash)
        .fetch_optional(&self.pool)
        .await?)
    }
}

/// The `SELECT ... FROM` prefix for [`ScriptWithAuthor`] queries.
fn select_scripts_with_author() -> String {
    format!(
        "SELECT {SCRIPT_COLUMNS}, u.username AS author_name
            FROM scripts s JOIN users u ON u.id = s.author_id"
    )
}

impl ScriptStore for PgStore {
    async fn list_scripts(&self, filter: ScriptFilter) -> Result<Vec<ScriptWithAuthor>> {
        let mut query = QueryBuilder::<Postgres>::new(select_scripts_with_author());

        match filter {
            ScriptFilter::All => {}
            ScriptFilter::Category(category) => {
                query.push(" WHERE s.category = ").push_bind(category);
            }
            ScriptFilter::Author(author_id) => {
                query.push(" WHERE s.author_id = ").push_bind(author_id);
            }
        }

        query
            .push(" ORDER BY s.created_at DESC, s.id DESC LIMIT ")
            .push_bind(LIST_LIMIT);

        Ok(query
            .build_query_as::<ScriptWithAuthor>()
            .fetch_all(&self.pool)
            .await?)
    }

    async fn script(&self, id: EntityId) -> Result<Option<ScriptWithAuthor>> {
        Ok(sqlx::query_as(&format!(
            "{} WHERE s.id = $1",
            select_scripts_with_author()
        ))
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }

    async fn create_script(&self, script: NewScript) -> Result<Script> {
        let mut tx = self.pool.begin().await?;
        let result = insert_script(&mut tx, &script).await;

        db::finish(tx, result).await
    }

    async fn like_script(&self, script_id: EntityId, user_id: EntityId) -> Result<bool> {
        let mut tx = self.pool.begin().await?;
        let result = insert_like(&mut tx, script_id, user_id).await;

        db::finish(tx, result).await
    }

    async fn record_download(&self, script_id: EntityId) -> Result<()> {
        sqlx::query(
            "UPDATE scripts
                SET downloads = downloads + 1
                WHERE id = $1",
        )
        .bind(script_id)
        .execute(&self.pool)
        .await?;

        Ok(())
    }
}

/// Inserts a script and awards its author reputation for it.
async fn insert_script(conn: &mut PgConnection, script: &NewScript) -> Result<Script> {
    let inserted: Script = sqlx::query_as(&format!(
        "INSERT INTO scripts AS s (title, code, category, description, author_id)
            VALUES ($1, $2, $3, $4, $5)
            RETURNING {SCRIPT_COLUMNS}"
    ))
    .bind(script.title.as_str())
    .bind(script.code.as_str())
    .bind(script.category.as_str())
    .bind(&script.description)
    .bind(script.author_id)
    .fetch_one(&mut *conn)
    .await?;

    award_reputation(conn, inserted.author_id, SCRIPT_REPUTATION).await?;

    Ok(inserted)
}

/// Records a like, then applies its side effects only if the like wasn't already recorded.
async fn insert_like(
    conn: &mut PgConnection,
    script_id: EntityId,
    user_id: EntityId,
) -> Result<bool> {
    let inserted = sqlx::query(
        "INSERT INTO script_likes (script_id, user_id)
            VALUES ($1, $2)
            ON CONFLICT DO NOTHING",
    )
    .bind(script_id)
    .bind(user_id)
    .execute(&mut *conn)
    .await?
    .rows_affected();

    if inserted == 0 {
        return Ok(false);
    }

    let author_id: Option<EntityId> = sqlx::query_scalar(
        "UPDATE scripts
            SET likes = likes + 1
            WHERE id = $1
            RETURNING author_id",
    )
    .bind(script_id)
    .fetch_optional(&mut *conn)
    .await?;

    if let Some(author_id) = author_id {
        award_reputation(conn, author_id, LIKE_REPUTATION).await?;
    }

    Ok(true)
}

/// Adds to a user's reputation.
async fn award_reputation(conn: &mut PgConnection, user_id: EntityId, amount: i32) -> Result<()> {
    sqlx::query(
        "UPDATE users
            SET reputation = reputation + $1
            WHERE id = $2",
    )
    .bind(amount)
    .bind(user_id)
    .execute(&mut *conn)
    .await?;

    Ok(())
}

/// The `SELECT ... FROM` prefix for [`TopicWithStats`] queries.
fn select_topics_with_stats() -> String {
    format!(
        "SELECT {TOPIC_COLUMNS}, u.username AS author_name,
                (SELECT COUNT(*) FROM forum_replies r WHERE r.topic_id = t.id) AS replies
            FROM forum_topics t JOIN users u ON u.id = t.author_id"
    )
}

impl ForumStore for PgStore {
    async fn list_topics(&self) -> Result<Vec<TopicWithStats>> {
        Ok(sqlx::query_as(&format!(
            "{} ORDER BY t.created_at DESC, t.id DESC LIMIT $1",
            select_topics_with_stats()
        ))
        .bind(LIST_LIMIT)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn view_topic(&self, id: EntityId) -> Result<Option<TopicWithStats>> {
        let mut tx = self.pool.begin().await?;
        let result = fetch_and_count_view(&mut tx, id).await;

        db::finish(tx, result).await
    }

    async fn create_topic(&self, topic: NewTopic) -> Result<Topic> {
        Ok(sqlx::query_as(&format!(
            "INSERT INTO forum_topics AS t (title, author_id)
                VALUES ($1, $2)
                RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(topic.title.as_str())
        .bind(topic.author_id)
        .fetch_one(&self.pool)
        .await?)
    }

    async fn set_topic_status(&self, id: EntityId, status: TopicStatus) -> Result<Option<Topic>> {
        Ok(sqlx::query_as(&format!(
            "UPDATE forum_topics AS t
                SET status = $1, updated_at = CURRENT_TIMESTAMP
                WHERE t.id = $2
                RETURNING {TOPIC_COLUMNS}"
        ))
        .bind(status.as_ref())
        .bind(id)
        .fetch_optional(&self.pool)
        .await?)
    }
}

/// Fetches a topic, then counts the fetch as a view.
async fn fetch_and_count_view(
    conn: &mut PgConnection,
    id: EntityId,
) -> Result<Option<TopicWithStats>> {
    let topic: Option<TopicWithStats> = sqlx::query_as(&format!(
        "{} WHERE t.id = $1",
        select_topics_with_stats()
    ))
    .bind(id)
    .fetch_optional(&mut *conn)
    .await?;

    if topic.is_some() {
        sqlx::query(
            "UPDATE forum_topics
                SET views = views + 1
                WHERE id = $1",
        )
        .bind(id)
        .execute(&mut *conn)
        .await?;
    }

    Ok(topic)
}

impl CommentStore for PgStore {
    async fn script_comments(&self, script_id: EntityId) -> Result<Vec<ScriptCommentEntry>> {
        Ok(sqlx::query_as(
            "SELECT c.id, c.script_id, c.author_id, c.content, c.created_at,
                    u.username AS author_name, u.rank
                FROM script_comments c JOIN users u ON u.id = c.author_id
                WHERE c.script_id = $1
                ORDER BY c.created_at DESC, c.id DESC",
        )
        .bind(script_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn topic_replies(&self, topic_id: EntityId) -> Result<Vec<ForumReplyEntry>> {
        Ok(sqlx::query_as(
            "SELECT r.id, r.topic_id, r.author_id, r.content, r.created_at,
                    u.username AS author_name, u.rank
                FROM forum_replies r JOIN users u ON u.id = r.author_id
                WHERE r.topic_id = $1
                ORDER BY r.created_at ASC, r.id ASC",
        )
        .bind(topic_id)
        .fetch_all(&self.pool)
        .await?)
    }

    async fn create_script_comment(&self, comment: NewPost) -> Result<ScriptComment> {
        Ok(sqlx::query_as(
            "INSERT INTO script_comments (script_id, author_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, script_id, author_id, content, created_at",
        )
        .bind(comment.parent_id)
        .bind(comment.author_id)
        .bind(comment.content.as_str())
        .fetch_one(&self.pool)
        .await?)
    }

    async fn create_topic_reply(&self, reply: NewPost) -> Result<ForumReply> {
        Ok(sqlx::query_as(
            "INSERT INTO forum_replies (topic_id, author_id, content)
                VALUES ($1, $2, $3)
                RETURNING id, topic_id, author_id, content, created_at",
        )
        .bind(reply.parent_id)
        .bind(reply.author_id)
        .bind(reply.content.as_str())
        .fetch_one(&self.pool)
        .await?)
    }
}
