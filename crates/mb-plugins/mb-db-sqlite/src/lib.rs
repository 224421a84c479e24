//! # mb-db-sqlite Implementation
//!
//! This module implements the data mapping between the SQLite relational model
//! and the `mb-core` domain models. Boards, threads, and replies live in
//! parent-keyed tables guarded by foreign keys.

use std::str::FromStr;
use std::time::Duration;

use anyhow::{anyhow, Context};
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mb_core::models::{Board, Reply, Thread};
use mb_core::traits::BoardRepo;
use sqlx::migrate::Migrator;
use sqlx::sqlite::{SqliteConnectOptions, SqlitePool, SqlitePoolOptions, SqliteRow};
use sqlx::Row;
use uuid::Uuid;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

const THREAD_COLUMNS: &str =
    "id, board_id, text, delete_password, reported, created_on, bumped_on";
const REPLY_COLUMNS: &str = "id, thread_id, text, delete_password, reported, created_on";

#[derive(Clone)]
pub struct SqliteBoardRepo {
    pool: SqlitePool,
}

impl SqliteBoardRepo {
    /// Connects with a default pool size and applies pending migrations.
    pub async fn new(url: &str) -> anyhow::Result<Self> {
        Self::connect(url, 5).await
    }

    /// Opens the pool and applies pending migrations.
    ///
    /// In-memory databases live and die with their connection, so they get a
    /// single connection that is never recycled.
    pub async fn connect(url: &str, max_connections: u32) -> anyhow::Result<Self> {
        let options = SqliteConnectOptions::from_str(url)
            .with_context(|| format!("invalid sqlite url {url}"))?
            .create_if_missing(true)
            .foreign_keys(true);

        let in_memory = url.contains(":memory:") || url.contains("mode=memory");
        let pool_options = if in_memory {
            SqlitePoolOptions::new()
                .max_connections(1)
                .min_connections(1)
                .idle_timeout(None::<Duration>)
                .max_lifetime(None::<Duration>)
        } else {
            SqlitePoolOptions::new().max_connections(max_connections.max(1))
        };

        let pool = pool_options.connect_with(options).await?;
        MIGRATOR.run(&pool).await.context("running migrations")?;
        tracing::debug!(in_memory, "sqlite pool ready");

        Ok(Self { pool })
    }

    /// Waits for in-flight queries and closes every connection.
    pub async fn close(&self) {
        self.pool.close().await;
    }
}

// Helper for UUID conversion
fn uuid_to_blob(id: Uuid) -> Vec<u8> {
    id.as_bytes().to_vec()
}

fn blob_to_uuid(blob: &[u8]) -> Uuid {
    Uuid::from_slice(blob).unwrap_or_default()
}

fn board_from_row(row: &SqliteRow) -> Result<Board, sqlx::Error> {
    Ok(Board {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice()),
        name: row.try_get("name")?,
        created_at: row.try_get("created_at")?,
    })
}

fn thread_from_row(row: &SqliteRow) -> Result<Thread, sqlx::Error> {
    Ok(Thread {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice()),
        board_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("board_id")?.as_slice()),
        text: row.try_get("text")?,
        delete_password: row.try_get("delete_password")?,
        reported: row.try_get("reported")?,
        created_on: row.try_get("created_on")?,
        bumped_on: row.try_get("bumped_on")?,
    })
}

fn reply_from_row(row: &SqliteRow) -> Result<Reply, sqlx::Error> {
    Ok(Reply {
        id: blob_to_uuid(row.try_get::<Vec<u8>, _>("id")?.as_slice()),
        thread_id: blob_to_uuid(row.try_get::<Vec<u8>, _>("thread_id")?.as_slice()),
        text: row.try_get("text")?,
        delete_password: row.try_get("delete_password")?,
        reported: row.try_get("reported")?,
        created_on: row.try_get("created_on")?,
    })
}

fn collect<T>(
    rows: Vec<SqliteRow>,
    map: fn(&SqliteRow) -> Result<T, sqlx::Error>,
) -> anyhow::Result<Vec<T>> {
    rows.iter().map(|row| map(row).map_err(Into::into)).collect()
}

#[async_trait]
impl BoardRepo for SqliteBoardRepo {
    /// Retrieves a board by its name.
    async fn find_board(&self, name: &str) -> anyhow::Result<Option<Board>> {
        let row = sqlx::query("SELECT id, name, created_at FROM boards WHERE name = ?")
            .bind(name)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.as_ref().map(board_from_row).transpose()?)
    }

    /// Insert-or-ignore keyed on the unique name, so concurrent first posts
    /// to the same board converge on one row.
    async fn upsert_board(&self, name: &str) -> anyhow::Result<Board> {
        let inserted = sqlx::query(
            "INSERT INTO boards (id, name, created_at) VALUES (?, ?, ?) ON CONFLICT (name) DO NOTHING",
        )
        .bind(uuid_to_blob(Uuid::now_v7()))
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await?;

        if inserted.rows_affected() > 0 {
            tracing::info!(board = name, "board created");
        }

        self.find_board(name)
            .await?
            .ok_or_else(|| anyhow!("board {name} vanished after upsert"))
    }

    async fn insert_thread(&self, thread: &Thread) -> anyhow::Result<()> {
        sqlx::query("INSERT INTO threads (id, board_id, text, delete_password, reported, created_on, bumped_on) VALUES (?, ?, ?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(thread.id))
            .bind(uuid_to_blob(thread.board_id))
            .bind(&thread.text)
            .bind(&thread.delete_password)
            .bind(thread.reported)
            .bind(thread.created_on)
            .bind(thread.bumped_on)
            .execute(&self.pool)
            .await?;
        Ok(())
    }

    async fn find_thread(&self, board_id: Uuid, thread_id: Uuid) -> anyhow::Result<Option<Thread>> {
        let row = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE id = ? AND board_id = ?"
        ))
        .bind(uuid_to_blob(thread_id))
        .bind(uuid_to_blob(board_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(thread_from_row).transpose()?)
    }

    /// Ties on `bumped_on` fall back to newest insertion first.
    async fn list_threads(&self, board_id: Uuid, limit: Option<i64>) -> anyhow::Result<Vec<Thread>> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE board_id = ? ORDER BY bumped_on DESC, seq DESC LIMIT ?"
        ))
        .bind(uuid_to_blob(board_id))
        // SQLite treats a negative LIMIT as unbounded.
        .bind(limit.unwrap_or(-1))
        .fetch_all(&self.pool)
        .await?;

        collect(rows, thread_from_row)
    }

    async fn all_threads(&self, board_id: Uuid) -> anyhow::Result<Vec<Thread>> {
        let rows = sqlx::query(&format!(
            "SELECT {THREAD_COLUMNS} FROM threads WHERE board_id = ? ORDER BY seq ASC"
        ))
        .bind(uuid_to_blob(board_id))
        .fetch_all(&self.pool)
        .await?;

        collect(rows, thread_from_row)
    }

    async fn mark_thread_reported(&self, thread_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE threads SET reported = 1 WHERE id = ?")
            .bind(uuid_to_blob(thread_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    /// Explicit cascade inside one transaction: replies first, then the thread.
    async fn delete_thread(&self, thread_id: Uuid) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let replies = sqlx::query("DELETE FROM replies WHERE thread_id = ?")
            .bind(uuid_to_blob(thread_id))
            .execute(&mut *tx)
            .await?;

        let thread = sqlx::query("DELETE FROM threads WHERE id = ?")
            .bind(uuid_to_blob(thread_id))
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        tracing::debug!(
            %thread_id,
            replies = replies.rows_affected(),
            "thread rows removed"
        );
        Ok(thread.rows_affected() > 0)
    }

    /// Bumps the parent first so a thread deleted in the meantime rolls the
    /// whole insert back instead of tripping the foreign key. The bump only
    /// moves forward, whatever order concurrent replies commit in.
    async fn insert_reply(&self, reply: &Reply, bumped_on: DateTime<Utc>) -> anyhow::Result<bool> {
        let mut tx = self.pool.begin().await?;

        let bumped = sqlx::query("UPDATE threads SET bumped_on = MAX(bumped_on, ?) WHERE id = ?")
            .bind(bumped_on)
            .bind(uuid_to_blob(reply.thread_id))
            .execute(&mut *tx)
            .await?;
        if bumped.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        sqlx::query("INSERT INTO replies (id, thread_id, text, delete_password, reported, created_on) VALUES (?, ?, ?, ?, ?, ?)")
            .bind(uuid_to_blob(reply.id))
            .bind(uuid_to_blob(reply.thread_id))
            .bind(&reply.text)
            .bind(&reply.delete_password)
            .bind(reply.reported)
            .bind(reply.created_on)
            .execute(&mut *tx)
            .await?;

        tx.commit().await?;
        Ok(true)
    }

    async fn find_reply(&self, thread_id: Uuid, reply_id: Uuid) -> anyhow::Result<Option<Reply>> {
        let row = sqlx::query(&format!(
            "SELECT {REPLY_COLUMNS} FROM replies WHERE id = ? AND thread_id = ?"
        ))
        .bind(uuid_to_blob(reply_id))
        .bind(uuid_to_blob(thread_id))
        .fetch_optional(&self.pool)
        .await?;

        Ok(row.as_ref().map(reply_from_row).transpose()?)
    }

    async fn recent_replies(&self, thread_id: Uuid, limit: i64) -> anyhow::Result<Vec<Reply>> {
        let rows = sqlx::query(&format!(
            "SELECT {REPLY_COLUMNS} FROM replies WHERE thread_id = ? ORDER BY created_on DESC, seq DESC LIMIT ?"
        ))
        .bind(uuid_to_blob(thread_id))
        .bind(limit)
        .fetch_all(&self.pool)
        .await?;

        collect(rows, reply_from_row)
    }

    async fn all_replies(&self, thread_id: Uuid) -> anyhow::Result<Vec<Reply>> {
        let rows = sqlx::query(&format!(
            "SELECT {REPLY_COLUMNS} FROM replies WHERE thread_id = ? ORDER BY seq ASC"
        ))
        .bind(uuid_to_blob(thread_id))
        .fetch_all(&self.pool)
        .await?;

        collect(rows, reply_from_row)
    }

    async fn count_replies(&self, thread_id: Uuid) -> anyhow::Result<i64> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM replies WHERE thread_id = ?")
            .bind(uuid_to_blob(thread_id))
            .fetch_one(&self.pool)
            .await?;
        Ok(count)
    }

    async fn board_replies(&self, board_id: Uuid) -> anyhow::Result<Vec<Reply>> {
        let rows = sqlx::query(
            "SELECT r.id, r.thread_id, r.text, r.delete_password, r.reported, r.created_on
             FROM replies r
             JOIN threads t ON t.id = r.thread_id
             WHERE t.board_id = ?
             ORDER BY r.seq ASC",
        )
        .bind(uuid_to_blob(board_id))
        .fetch_all(&self.pool)
        .await?;

        collect(rows, reply_from_row)
    }

    async fn mark_reply_reported(&self, reply_id: Uuid) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE replies SET reported = 1 WHERE id = ?")
            .bind(uuid_to_blob(reply_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }

    async fn set_reply_text(&self, reply_id: Uuid, text: &str) -> anyhow::Result<bool> {
        let result = sqlx::query("UPDATE replies SET text = ? WHERE id = ?")
            .bind(text)
            .bind(uuid_to_blob(reply_id))
            .execute(&self.pool)
            .await?;
        Ok(result.rows_affected() > 0)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Duration;

    async fn repo() -> SqliteBoardRepo {
        SqliteBoardRepo::new("sqlite::memory:").await.unwrap()
    }

    fn thread_at(board_id: Uuid, text: &str, at: DateTime<Utc>) -> Thread {
        Thread::new(board_id, text.into(), "hash".into(), at)
    }

    #[tokio::test]
    async fn test_upsert_board_is_idempotent() {
        let repo = repo().await;
        let first = repo.upsert_board("test").await.unwrap();
        let second = repo.upsert_board("test").await.unwrap();
        assert_eq!(first.id, second.id);
        assert!(repo.find_board("other").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_create_and_get_thread() {
        let repo = repo().await;
        let board = repo.upsert_board("test").await.unwrap();

        let thread = thread_at(board.id, "OP", Utc::now());
        repo.insert_thread(&thread).await.expect("Failed to create thread");

        let found = repo.find_thread(board.id, thread.id).await.unwrap();
        assert_eq!(found.as_ref().map(|t| t.text.as_str()), Some("OP"));

        // Threads are scoped to their board.
        let other = repo.upsert_board("other").await.unwrap();
        assert!(repo.find_thread(other.id, thread.id).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_list_threads_orders_by_bump() {
        let repo = repo().await;
        let board = repo.upsert_board("test").await.unwrap();
        let base = Utc::now();

        for i in 0..12 {
            let t = thread_at(board.id, &format!("t{i}"), base + Duration::seconds(i));
            repo.insert_thread(&t).await.unwrap();
        }

        let listed = repo.list_threads(board.id, Some(10)).await.unwrap();
        assert_eq!(listed.len(), 10);
        assert_eq!(listed[0].text, "t11");
        assert!(listed.windows(2).all(|w| w[0].bumped_on >= w[1].bumped_on));

        let everything = repo.list_threads(board.id, None).await.unwrap();
        assert_eq!(everything.len(), 12);
    }

    #[tokio::test]
    async fn test_reply_insert_bumps_thread() {
        let repo = repo().await;
        let board = repo.upsert_board("test").await.unwrap();
        let base = Utc::now();
        let older = thread_at(board.id, "older", base);
        let newer = thread_at(board.id, "newer", base + Duration::seconds(1));
        repo.insert_thread(&older).await.unwrap();
        repo.insert_thread(&newer).await.unwrap();

        let at = base + Duration::seconds(5);
        let reply = Reply::new(older.id, "bump".into(), "hash".into(), at);
        assert!(repo.insert_reply(&reply, at).await.unwrap());

        let listed = repo.list_threads(board.id, None).await.unwrap();
        assert_eq!(listed[0].id, older.id);
        assert_eq!(repo.count_replies(older.id).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_late_bump_never_moves_thread_backwards() {
        let repo = repo().await;
        let board = repo.upsert_board("test").await.unwrap();
        let base = Utc::now();
        let thread = thread_at(board.id, "op", base);
        repo.insert_thread(&thread).await.unwrap();

        let later = base + Duration::seconds(10);
        let earlier = base + Duration::seconds(5);
        let first = Reply::new(thread.id, "later clock".into(), "hash".into(), later);
        let second = Reply::new(thread.id, "earlier clock".into(), "hash".into(), earlier);
        assert!(repo.insert_reply(&first, later).await.unwrap());
        assert!(repo.insert_reply(&second, earlier).await.unwrap());

        let stored = repo.find_thread(board.id, thread.id).await.unwrap().unwrap();
        assert_eq!(stored.bumped_on, later);
        assert_eq!(repo.count_replies(thread.id).await.unwrap(), 2);
    }

    #[tokio::test]
    async fn test_reply_to_missing_thread_is_rejected() {
        let repo = repo().await;
        let reply = Reply::new(Uuid::now_v7(), "orphan".into(), "hash".into(), Utc::now());
        assert!(!repo.insert_reply(&reply, Utc::now()).await.unwrap());
    }

    #[tokio::test]
    async fn test_delete_thread_cascades_to_replies() {
        let repo = repo().await;
        let board = repo.upsert_board("test").await.unwrap();
        let thread = thread_at(board.id, "doomed", Utc::now());
        repo.insert_thread(&thread).await.unwrap();
        for i in 0..3 {
            let r = Reply::new(thread.id, format!("r{i}"), "hash".into(), Utc::now());
            repo.insert_reply(&r, Utc::now()).await.unwrap();
        }

        assert!(repo.delete_thread(thread.id).await.unwrap());
        assert!(repo.find_thread(board.id, thread.id).await.unwrap().is_none());
        assert_eq!(repo.count_replies(thread.id).await.unwrap(), 0);
        assert!(!repo.delete_thread(thread.id).await.unwrap());
    }

    #[tokio::test]
    async fn test_recent_replies_newest_first() {
        let repo = repo().await;
        let board = repo.upsert_board("test").await.unwrap();
        let thread = thread_at(board.id, "op", Utc::now());
        repo.insert_thread(&thread).await.unwrap();

        let base = Utc::now();
        for i in 0..5 {
            let at = base + Duration::seconds(i);
            let r = Reply::new(thread.id, format!("r{i}"), "hash".into(), at);
            repo.insert_reply(&r, at).await.unwrap();
        }

        let recent = repo.recent_replies(thread.id, 3).await.unwrap();
        let texts: Vec<_> = recent.iter().map(|r| r.text.as_str()).collect();
        assert_eq!(texts, vec!["r4", "r3", "r2"]);

        let all = repo.all_replies(thread.id).await.unwrap();
        assert_eq!(all.first().map(|r| r.text.as_str()), Some("r0"));
        assert_eq!(repo.board_replies(board.id).await.unwrap().len(), 5);
    }

    #[tokio::test]
    async fn test_report_and_soft_delete_reply() {
        let repo = repo().await;
        let board = repo.upsert_board("test").await.unwrap();
        let thread = thread_at(board.id, "op", Utc::now());
        repo.insert_thread(&thread).await.unwrap();
        let reply = Reply::new(thread.id, "regret".into(), "hash".into(), Utc::now());
        repo.insert_reply(&reply, Utc::now()).await.unwrap();

        assert!(repo.mark_thread_reported(thread.id).await.unwrap());
        assert!(repo.mark_reply_reported(reply.id).await.unwrap());
        assert!(repo.set_reply_text(reply.id, "[deleted]").await.unwrap());

        let stored = repo.find_reply(thread.id, reply.id).await.unwrap().unwrap();
        assert!(stored.reported);
        assert_eq!(stored.text, "[deleted]");
        assert!(repo.find_thread(board.id, thread.id).await.unwrap().unwrap().reported);
        assert!(!repo.mark_reply_reported(Uuid::now_v7()).await.unwrap());
    }
}
