//! An in-memory store for handler tests.

use std::{
    cmp::Reverse,
    collections::HashSet,
    sync::{
        atomic::{AtomicBool, AtomicUsize, Ordering},
        Mutex, MutexGuard,
    },
};

use chrono::Utc;

use crate::{
    api::validation::{EntityId, TopicStatus},
    models::{
        ForumReply, ForumReplyEntry, Script, ScriptComment, ScriptCommentEntry, ScriptWithAuthor,
        Topic, TopicWithStats, UserProfile,
    },
    store::{
        CommentStore, Error, ForumStore, NewPost, NewScript, NewTopic, NewUser, Result,
        ScriptFilter, ScriptStore, UserStore, DEFAULT_RANK, LIKE_REPUTATION, LIST_LIMIT,
        SCRIPT_REPUTATION,
    },
};

/// A stored user with their password hash.
#[derive(Clone, Debug)]
struct UserRow {
    /// Everything but the password hash.
    profile: UserProfile,

    /// The password hash.
    password_hash: String,
}

/// Every table.
#[derive(Clone, Default, Debug)]
struct Tables {
    /// The last ID handed out, shared by all tables.
    last_id: i32,

    /// `users`
    users: Vec<UserRow>,

    /// `scripts`
    scripts: Vec<Script>,

    /// `script_likes`
    likes: HashSet<(EntityId, EntityId)>,

    /// `forum_topics`
    topics: Vec<Topic>,

    /// `script_comments`
    comments: Vec<ScriptComment>,

    /// `forum_replies`
    replies: Vec<ForumReply>,
}

impl Tables {
    /// Hands out the next row ID.
    fn next_id(&mut self) -> EntityId {
        self.last_id += 1;
        EntityId(self.last_id)
    }

    /// Finds a user by ID.
    fn user(&self, id: EntityId) -> Option<&UserRow> {
        self.users.iter().find(|user| user.profile.id == id)
    }

    /// Fails like a foreign key would if the user doesn't exist.
    fn require_user(&self, id: EntityId, constraint: &str) -> Result<&UserRow> {
        self.user(id)
            .ok_or_else(|| Error::ForeignKeyViolation(constraint.to_owned()))
    }

    /// Joins a script with its author's name.
    fn with_author(&self, script: &Script) -> Option<ScriptWithAuthor> {
        Some(ScriptWithAuthor {
            script: script.clone(),
            author_name: self.user(script.author_id)?.profile.username.clone(),
        })
    }

    /// Joins a topic with its author's name and reply count.
    fn with_stats(&self, topic: &Topic) -> Option<TopicWithStats> {
        let replies = self
            .replies
            .iter()
            .filter(|reply| reply.topic_id == topic.id)
            .count();

        Some(TopicWithStats {
            topic: topic.clone(),
            author_name: self.user(topic.author_id)?.profile.username.clone(),
            replies: i64::try_from(replies).unwrap_or(i64::MAX),
        })
    }
}

/// A store keeping every table in memory.
///
/// Writes are applied to a copy of the tables that only replaces the original if the whole
/// operation succeeds, mirroring a committed or rolled back transaction. Every trait method call is
/// counted, so tests can assert on whether a handler touched the store at all.
#[derive(Default, Debug)]
pub(crate) struct MemoryStore {
    /// The tables.
    tables: Mutex<Tables>,

    /// How many store operations have been called.
    calls: AtomicUsize,

    /// Whether updates to user rows should fail, as if the database rejected them.
    fail_user_updates: AtomicBool,
}

impl MemoryStore {
    /// Creates an empty store.
    pub(crate) fn new() -> Self {
        Self::default()
    }

    /// Gets how many store operations have been called.
    pub(crate) fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    /// Makes every later update to an existing user row fail.
    pub(crate) fn fail_user_updates(&self) {
        self.fail_user_updates.store(true, Ordering::SeqCst);
    }

    /// Gets a user's reputation.
    pub(crate) fn reputation(&self, user_id: EntityId) -> Option<i32> {
        Some(self.lock().user(user_id)?.profile.reputation)
    }

    /// Gets a script's like and download counts.
    pub(crate) fn script_counters(&self, script_id: EntityId) -> Option<(i32, i32)> {
        let tables = self.lock();
        let script = tables.scripts.iter().find(|script| script.id == script_id)?;

        Some((script.likes, script.downloads))
    }

    /// Gets a topic's view count.
    pub(crate) fn views(&self, topic_id: EntityId) -> Option<i32> {
        let tables = self.lock();
        let topic = tables.topics.iter().find(|topic| topic.id == topic_id)?;

        Some(topic.views)
    }

    /// Locks the tables without counting an operation.
    fn lock(&self) -> MutexGuard<'_, Tables> {
        self.tables.lock().expect("memory store should not be poisoned")
    }

    /// Counts an operation and reads the tables.
    fn read<T>(&self, read: impl FnOnce(&Tables) -> T) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        Ok(read(&*self.lock()))
    }

    /// Counts an operation and applies a write to the tables all at once, or not at all.
    fn write<T>(&self, write: impl FnOnce(&mut Tables) -> Result<T>) -> Result<T> {
        self.calls.fetch_add(1, Ordering::SeqCst);

        let mut tables = self.lock();
        let mut draft = tables.clone();
        let value = write(&mut draft)?;
        *tables = draft;

        Ok(value)
    }

    /// Updates a user row, failing if [`Self::fail_user_updates`] was called.
    fn update_user(
        &self,
        tables: &mut Tables,
        id: EntityId,
        update: impl FnOnce(&mut UserProfile),
    ) -> Result<()> {
        if self.fail_user_updates.load(Ordering::SeqCst) {
            return Err(Error::Database(sqlx::Error::Protocol(
                "simulated failure updating users".into(),
            )));
        }

        if let Some(user) = tables.users.iter_mut().find(|user| user.profile.id == id) {
            update(&mut user.profile);
        }

        Ok(())
    }
}

impl UserStore for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<UserProfile> {
        self.write(|tables| {
            for existing in &tables.users {
                if existing.profile.username == *user.username {
                    return Err(Error::UniqueViolation("users_username_key".into()));
                }
                if existing.profile.email == *user.email {
                    return Err(Error::UniqueViolation("users_email_key".into()));
                }
            }

            let profile = UserProfile {
                id: tables.next_id(),
                username: user.username.into_inner(),
                email: user.email.into_inner(),
                rank: DEFAULT_RANK.into(),
                reputation: 0,
                time_spent_minutes: 0,
                last_login: None,
                created_at: Utc::now(),
            };

            tables.users.push(UserRow {
                profile: profile.clone(),
                password_hash: user.password_hash,
            });

            Ok(profile)
        })
    }

    async fn sign_in(&self, username: &str, password_hash: &str) -> Result<Option<UserProfile>> {
        self.write(|tables| {
            let user = tables.users.iter_mut().find(|user| {
                user.profile.username == username && user.password_hash == password_hash
            });

            Ok(user.map(|user| {
                user.profile.last_login = Some(Utc::now());
                user.profile.clone()
            }))
        })
    }
}

impl ScriptStore for MemoryStore {
    async fn list_scripts(&self, filter: ScriptFilter) -> Result<Vec<ScriptWithAuthor>> {
        self.read(|tables| {
            let mut scripts: Vec<_> = tables
                .scripts
                .iter()
                .filter(|script| match &filter {
                    ScriptFilter::All => true,
                    ScriptFilter::Category(category) => script.category == *category,
                    ScriptFilter::Author(author_id) => script.author_id == *author_id,
                })
                .filter_map(|script| tables.with_author(script))
                .collect();

            scripts.sort_by_key(|entry| Reverse((entry.script.created_at, entry.script.id)));
            scripts.truncate(usize::try_from(LIST_LIMIT).unwrap_or(usize::MAX));
            scripts
        })
    }

    async fn script(&self, id: EntityId) -> Result<Option<ScriptWithAuthor>> {
        self.read(|tables| {
            let script = tables.scripts.iter().find(|script| script.id == id)?;
            tables.with_author(script)
        })
    }

    async fn create_script(&self, script: NewScript) -> Result<Script> {
        self.write(|tables| {
            tables.require_user(script.author_id, "scripts_author_id_fkey")?;

            let inserted = Script {
                id: tables.next_id(),
                title: script.title.into_inner(),
                code: script.code.into_inner(),
                category: script.category.into_inner(),
                description: script.description,
                author_id: script.author_id,
                likes: 0,
                downloads: 0,
                created_at: Utc::now(),
            };
            tables.scripts.push(inserted.clone());

            self.update_user(tables, inserted.author_id, |author| {
                author.reputation += SCRIPT_REPUTATION;
            })?;

            Ok(inserted)
        })
    }

    async fn like_script(&self, script_id: EntityId, user_id: EntityId) -> Result<bool> {
        self.write(|tables| {
            if !tables.scripts.iter().any(|script| script.id == script_id) {
                return Err(Error::ForeignKeyViolation("script_likes_script_id_fkey".into()));
            }
            tables.require_user(user_id, "script_likes_user_id_fkey")?;

            if !tables.likes.insert((script_id, user_id)) {
                return Ok(false);
            }

            let mut author_id = None;
            for script in tables.scripts.iter_mut().filter(|script| script.id == script_id) {
                script.likes += 1;
                author_id = Some(script.author_id);
            }

            if let Some(author_id) = author_id {
                self.update_user(tables, author_id, |author| {
                    author.reputation += LIKE_REPUTATION;
                })?;
            }

            Ok(true)
        })
    }

    async fn record_download(&self, script_id: EntityId) -> Result<()> {
        self.write(|tables| {
            for script in tables.scripts.iter_mut().filter(|script| script.id == script_id) {
                script.downloads += 1;
            }

            Ok(())
        })
    }
}

impl ForumStore for MemoryStore {
    async fn list_topics(&self) -> Result<Vec<TopicWithStats>> {
        self.read(|tables| {
            let mut topics: Vec<_> = tables
                .topics
                .iter()
                .filter_map(|topic| tables.with_stats(topic))
                .collect();

            topics.sort_by_key(|entry| Reverse((entry.topic.created_at, entry.topic.id)));
            topics.truncate(usize::try_from(LIST_LIMIT).unwrap_or(usize::MAX));
            topics
        })
    }

    async fn view_topic(&self, id: EntityId) -> Result<Option<TopicWithStats>> {
        self.write(|tables| {
            let Some(topic) = tables.topics.iter().find(|topic| topic.id == id) else {
                return Ok(None);
            };
            let viewed = tables.with_stats(topic);

            for topic in tables.topics.iter_mut().filter(|topic| topic.id == id) {
                topic.views += 1;
            }

            Ok(viewed)
        })
    }

    async fn create_topic(&self, topic: NewTopic) -> Result<Topic> {
        self.write(|tables| {
            tables.require_user(topic.author_id, "forum_topics_author_id_fkey")?;

            let now = Utc::now();
            let inserted = Topic {
                id: tables.next_id(),
                title: topic.title.into_inner(),
                author_id: topic.author_id,
                status: TopicStatus::default(),
                views: 0,
                created_at: now,
                updated_at: now,
            };
            tables.topics.push(inserted.clone());

            Ok(inserted)
        })
    }

    async fn set_topic_status(&self, id: EntityId, status: TopicStatus) -> Result<Option<Topic>> {
        self.write(|tables| {
            let topic = tables.topics.iter_mut().find(|topic| topic.id == id);

            Ok(topic.map(|topic| {
                topic.status = status;
                topic.updated_at = Utc::now();
                topic.clone()
            }))
        })
    }
}

impl CommentStore for MemoryStore {
    async fn script_comments(&self, script_id: EntityId) -> Result<Vec<ScriptCommentEntry>> {
        self.read(|tables| {
            let mut comments: Vec<_> = tables
                .comments
                .iter()
                .filter(|comment| comment.script_id == script_id)
                .filter_map(|comment| {
                    let author = tables.user(comment.author_id)?;

                    Some(ScriptCommentEntry {
                        comment: comment.clone(),
                        author_name: author.profile.username.clone(),
                        rank: author.profile.rank.clone(),
                    })
                })
                .collect();

            comments.sort_by_key(|entry| Reverse((entry.comment.created_at, entry.comment.id)));
            comments
        })
    }

    async fn topic_replies(&self, topic_id: EntityId) -> Result<Vec<ForumReplyEntry>> {
        self.read(|tables| {
            let mut replies: Vec<_> = tables
                .replies
                .iter()
                .filter(|reply| reply.topic_id == topic_id)
                .filter_map(|reply| {
                    let author = tables.user(reply.author_id)?;

                    Some(ForumReplyEntry {
                        reply: reply.clone(),
                        author_name: author.profile.username.clone(),
                        rank: author.profile.rank.clone(),
                    })
                })
                .collect();

            replies.sort_by_key(|entry| (entry.reply.created_at, entry.reply.id));
            replies
        })
    }

    async fn create_script_comment(&self, comment: NewPost) -> Result<ScriptComment> {
        self.write(|tables| {
            if !tables
                .scripts
                .iter()
                .any(|script| script.id == comment.parent_id)
            {
                return Err(Error::ForeignKeyViolation(
                    "script_comments_script_id_fkey".into(),
                ));
            }
            tables.require_user(comment.author_id, "script_comments_author_id_fkey")?;

            let inserted = ScriptComment {
                id: tables.next_id(),
                script_id: comment.parent_id,
                author_id: comment.author_id,
                content: comment.content.into_inner(),
                created_at: Utc::now(),
            };
            tables.comments.push(inserted.clone());

            Ok(inserted)
        })
    }

    async fn create_topic_reply(&self, reply: NewPost) -> Result<ForumReply> {
        self.write(|tables| {
            if !tables.topics.iter().any(|topic| topic.id == reply.parent_id) {
                return Err(Error::ForeignKeyViolation(
                    "forum_replies_topic_id_fkey".into(),
                ));
            }
            tables.require_user(reply.author_id, "forum_replies_author_id_fkey")?;

            let inserted = ForumReply {
                id: tables.next_id(),
                topic_id: reply.parent_id,
                author_id: reply.author_id,
                content: reply.content.into_inner(),
                created_at: Utc::now(),
            };
            tables.replies.push(inserted.clone());

            Ok(inserted)
        })
    }
}
