use std::path::Path;
use std::str::FromStr;
use std::sync::Arc;

use anyhow::{Context, Result};
use rusqlite::{Connection, OptionalExtension, params};

use super::models::*;

/// Async-safe handle to the blog database.
///
/// Wraps `BlogDb` behind `Arc<Mutex>` and runs all access on tokio's
/// blocking thread pool via `spawn_blocking`, preventing synchronous SQLite
/// I/O from tying up async worker threads.
#[derive(Clone)]
pub struct DbHandle {
    inner: Arc<std::sync::Mutex<BlogDb>>,
}

impl DbHandle {
    pub fn new(db: BlogDb) -> Self {
        Self {
            inner: Arc::new(std::sync::Mutex::new(db)),
        }
    }

    /// Run a closure with access to the database on a blocking thread.
    /// All data passed into `f` must be owned (`'static`).
    pub async fn call<F, R>(&self, f: F) -> Result<R>
    where
        F: FnOnce(&BlogDb) -> Result<R> + Send + 'static,
        R: Send + 'static,
    {
        let db = self.inner.clone();
        tokio::task::spawn_blocking(move || {
            let guard = db
                .lock()
                .map_err(|e| anyhow::anyhow!("DB lock poisoned: {}", e))?;
            f(&guard)
        })
        .await
        .context("DB task panicked")?
    }
}

pub struct BlogDb {
    conn: Connection,
}

impl BlogDb {
    /// Open (or create) a SQLite database at the given path and run migrations.
    pub fn new(path: &Path) -> Result<Self> {
        let conn = Connection::open(path).context("Failed to open SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    /// Create an in-memory SQLite database (for testing).
    pub fn new_in_memory() -> Result<Self> {
        let conn =
            Connection::open_in_memory().context("Failed to open in-memory SQLite database")?;
        let db = Self { conn };
        db.init()?;
        Ok(db)
    }

    fn init(&self) -> Result<()> {
        self.conn
            .execute_batch("PRAGMA foreign_keys = ON;")
            .context("Failed to enable foreign keys")?;
        self.run_migrations().context("Failed to run migrations")?;
        Ok(())
    }

    fn run_migrations(&self) -> Result<()> {
        self.conn
            .execute_batch(
                "
                CREATE TABLE IF NOT EXISTS users (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    username TEXT NOT NULL UNIQUE,
                    email TEXT NOT NULL UNIQUE,
                    password_hash TEXT NOT NULL,
                    is_active INTEGER NOT NULL DEFAULT 1,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS posts (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    youtube_url TEXT NOT NULL,
                    video_id TEXT NOT NULL,
                    title TEXT NOT NULL,
                    content TEXT NOT NULL,
                    word_count INTEGER NOT NULL DEFAULT 0,
                    created_at TEXT NOT NULL DEFAULT (datetime('now')),
                    updated_at TEXT NOT NULL DEFAULT (datetime('now'))
                );

                CREATE TABLE IF NOT EXISTS generation_runs (
                    id INTEGER PRIMARY KEY AUTOINCREMENT,
                    user_id INTEGER NOT NULL REFERENCES users(id) ON DELETE CASCADE,
                    post_id INTEGER REFERENCES posts(id) ON DELETE SET NULL,
                    video_id TEXT NOT NULL,
                    language TEXT NOT NULL DEFAULT 'en',
                    status TEXT NOT NULL DEFAULT 'queued',
                    error TEXT,
                    transcript_chars INTEGER,
                    article_chars INTEGER,
                    started_at TEXT NOT NULL DEFAULT (datetime('now')),
                    completed_at TEXT
                );

                CREATE INDEX IF NOT EXISTS idx_posts_user ON posts(user_id);
                CREATE INDEX IF NOT EXISTS idx_runs_user ON generation_runs(user_id);
                ",
            )
            .context("Failed to create tables")?;
        Ok(())
    }

    /// Liveness probe used by the health endpoint.
    pub fn ping(&self) -> Result<()> {
        self.conn
            .query_row("SELECT 1", [], |_| Ok(()))
            .context("Database ping failed")
    }

    // ── User CRUD ─────────────────────────────────────────────────────

    /// Create a user. Returns `Ok(None)` when the username or email is
    /// already taken; the caller turns that into a 409.
    pub fn create_user(
        &self,
        username: &str,
        email: &str,
        password_hash: &str,
    ) -> Result<Option<User>> {
        let taken: bool = self
            .conn
            .query_row(
                "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1 OR username = ?2)",
                params![email, username],
                |row| row.get(0),
            )
            .context("Failed to check for existing user")?;
        if taken {
            return Ok(None);
        }

        self.conn
            .execute(
                "INSERT INTO users (username, email, password_hash) VALUES (?1, ?2, ?3)",
                params![username, email, password_hash],
            )
            .context("Failed to insert user")?;
        let id = self.conn.last_insert_rowid();
        self.get_user(id)?
            .context("User not found after insert")
            .map(Some)
    }

    pub fn get_user(&self, id: i64) -> Result<Option<User>> {
        self.conn
            .query_row(
                "SELECT id, username, email, is_active, created_at, updated_at
                 FROM users WHERE id = ?1",
                params![id],
                Self::map_user,
            )
            .optional()
            .context("Failed to query user")
    }

    pub fn get_user_by_email(&self, email: &str) -> Result<Option<UserRecord>> {
        self.conn
            .query_row(
                "SELECT id, username, email, is_active, created_at, updated_at, password_hash
                 FROM users WHERE email = ?1",
                params![email],
                |row| {
                    Ok(UserRecord {
                        user: Self::map_user(row)?,
                        password_hash: row.get(6)?,
                    })
                },
            )
            .optional()
            .context("Failed to query user by email")
    }

    fn map_user(row: &rusqlite::Row<'_>) -> rusqlite::Result<User> {
        Ok(User {
            id: row.get(0)?,
            username: row.get(1)?,
            email: row.get(2)?,
            is_active: row.get::<_, i64>(3)? != 0,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    // ── Post CRUD ─────────────────────────────────────────────────────

    pub fn create_post(
        &self,
        user_id: i64,
        youtube_url: &str,
        video_id: &str,
        title: &str,
        content: &str,
        word_count: i64,
    ) -> Result<BlogPost> {
        self.conn
            .execute(
                "INSERT INTO posts (user_id, youtube_url, video_id, title, content, word_count)
                 VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
                params![user_id, youtube_url, video_id, title, content, word_count],
            )
            .context("Failed to insert post")?;
        let id = self.conn.last_insert_rowid();
        self.get_post(id, user_id)?
            .context("Post not found after insert")
    }

    /// Posts for a user, newest first. Reads are always scoped by user_id so
    /// one user can never see another's posts.
    pub fn list_posts(&self, user_id: i64, limit: i64, offset: i64) -> Result<Vec<BlogPost>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, youtube_url, video_id, title, content, word_count,
                        created_at, updated_at
                 FROM posts WHERE user_id = ?1
                 ORDER BY created_at DESC, id DESC
                 LIMIT ?2 OFFSET ?3",
            )
            .context("Failed to prepare list_posts")?;
        let rows = stmt
            .query_map(params![user_id, limit, offset], Self::map_post)
            .context("Failed to query posts")?;
        let mut posts = Vec::new();
        for row in rows {
            posts.push(row.context("Failed to read post row")?);
        }
        Ok(posts)
    }

    pub fn get_post(&self, id: i64, user_id: i64) -> Result<Option<BlogPost>> {
        self.conn
            .query_row(
                "SELECT id, user_id, youtube_url, video_id, title, content, word_count,
                        created_at, updated_at
                 FROM posts WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
                Self::map_post,
            )
            .optional()
            .context("Failed to query post")
    }

    pub fn delete_post(&self, id: i64, user_id: i64) -> Result<bool> {
        let deleted = self
            .conn
            .execute(
                "DELETE FROM posts WHERE id = ?1 AND user_id = ?2",
                params![id, user_id],
            )
            .context("Failed to delete post")?;
        Ok(deleted > 0)
    }

    pub fn count_posts(&self, user_id: i64) -> Result<i64> {
        self.conn
            .query_row(
                "SELECT COUNT(*) FROM posts WHERE user_id = ?1",
                params![user_id],
                |row| row.get(0),
            )
            .context("Failed to count posts")
    }

    fn map_post(row: &rusqlite::Row<'_>) -> rusqlite::Result<BlogPost> {
        Ok(BlogPost {
            id: row.get(0)?,
            user_id: row.get(1)?,
            youtube_url: row.get(2)?,
            video_id: row.get(3)?,
            title: row.get(4)?,
            content: row.get(5)?,
            word_count: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    // ── Generation runs ───────────────────────────────────────────────

    pub fn create_run(&self, user_id: i64, video_id: &str, language: &str) -> Result<i64> {
        self.conn
            .execute(
                "INSERT INTO generation_runs (user_id, video_id, language, status)
                 VALUES (?1, ?2, ?3, 'running')",
                params![user_id, video_id, language],
            )
            .context("Failed to insert generation run")?;
        Ok(self.conn.last_insert_rowid())
    }

    pub fn complete_run(
        &self,
        run_id: i64,
        post_id: i64,
        transcript_chars: i64,
        article_chars: i64,
    ) -> Result<()> {
        self.conn
            .execute(
                "UPDATE generation_runs
                 SET status = 'completed', post_id = ?2, transcript_chars = ?3,
                     article_chars = ?4, completed_at = datetime('now')
                 WHERE id = ?1",
                params![run_id, post_id, transcript_chars, article_chars],
            )
            .context("Failed to complete generation run")?;
        Ok(())
    }

    pub fn fail_run(&self, run_id: i64, error: &str) -> Result<()> {
        self.conn
            .execute(
                "UPDATE generation_runs
                 SET status = 'failed', error = ?2, completed_at = datetime('now')
                 WHERE id = ?1",
                params![run_id, error],
            )
            .context("Failed to mark generation run failed")?;
        Ok(())
    }

    pub fn get_run(&self, run_id: i64) -> Result<Option<GenerationRun>> {
        self.conn
            .query_row(
                "SELECT id, user_id, post_id, video_id, language, status, error,
                        transcript_chars, article_chars, started_at, completed_at
                 FROM generation_runs WHERE id = ?1",
                params![run_id],
                Self::map_run,
            )
            .optional()
            .context("Failed to query generation run")
    }

    fn map_run(row: &rusqlite::Row<'_>) -> rusqlite::Result<GenerationRun> {
        Ok(GenerationRun {
            id: row.get(0)?,
            user_id: row.get(1)?,
            post_id: row.get(2)?,
            video_id: row.get(3)?,
            language: row.get(4)?,
            status: RunStatus::from_str(&row.get::<_, String>(5)?).unwrap_or(RunStatus::Failed),
            error: row.get(6)?,
            transcript_chars: row.get(7)?,
            article_chars: row.get(8)?,
            started_at: row.get(9)?,
            completed_at: row.get(10)?,
        })
    }

    pub fn list_runs(&self, user_id: i64, limit: i64) -> Result<Vec<GenerationRun>> {
        let mut stmt = self
            .conn
            .prepare(
                "SELECT id, user_id, post_id, video_id, language, status, error,
                        transcript_chars, article_chars, started_at, completed_at
                 FROM generation_runs WHERE user_id = ?1
                 ORDER BY id DESC LIMIT ?2",
            )
            .context("Failed to prepare list_runs")?;
        let rows = stmt
            .query_map(params![user_id, limit], Self::map_run)
            .context("Failed to query runs")?;
        let mut runs = Vec::new();
        for row in rows {
            runs.push(row.context("Failed to read run row")?);
        }
        Ok(runs)
    }
}
