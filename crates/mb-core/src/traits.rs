//! # Core Traits (Ports)
//!
//! Any plugin must implement these traits to be used by the binary.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use uuid::Uuid;

use crate::models::{Board, Reply, Thread};

/// Data persistence contract for boards, threads, and replies.
///
/// Mutations return `false` when the target row no longer exists.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait BoardRepo: Send + Sync {
    // Board Operations
    async fn find_board(&self, name: &str) -> anyhow::Result<Option<Board>>;
    /// Returns the board named `name`, creating it first if needed.
    async fn upsert_board(&self, name: &str) -> anyhow::Result<Board>;

    // Thread Operations
    async fn insert_thread(&self, thread: &Thread) -> anyhow::Result<()>;
    async fn find_thread(&self, board_id: Uuid, thread_id: Uuid) -> anyhow::Result<Option<Thread>>;
    /// Newest `bumped_on` first; `None` means no limit.
    async fn list_threads(&self, board_id: Uuid, limit: Option<i64>) -> anyhow::Result<Vec<Thread>>;
    /// Insertion order.
    async fn all_threads(&self, board_id: Uuid) -> anyhow::Result<Vec<Thread>>;
    async fn mark_thread_reported(&self, thread_id: Uuid) -> anyhow::Result<bool>;
    /// Deletes the thread's replies, then the thread.
    async fn delete_thread(&self, thread_id: Uuid) -> anyhow::Result<bool>;

    // Reply Operations
    /// Inserts the reply and moves the parent's `bumped_on` in one step.
    async fn insert_reply(&self, reply: &Reply, bumped_on: DateTime<Utc>) -> anyhow::Result<bool>;
    async fn find_reply(&self, thread_id: Uuid, reply_id: Uuid) -> anyhow::Result<Option<Reply>>;
    /// Newest `created_on` first.
    async fn recent_replies(&self, thread_id: Uuid, limit: i64) -> anyhow::Result<Vec<Reply>>;
    /// Insertion order.
    async fn all_replies(&self, thread_id: Uuid) -> anyhow::Result<Vec<Reply>>;
    async fn count_replies(&self, thread_id: Uuid) -> anyhow::Result<i64>;
    /// Every reply on the board, insertion order.
    async fn board_replies(&self, board_id: Uuid) -> anyhow::Result<Vec<Reply>>;
    async fn mark_reply_reported(&self, reply_id: Uuid) -> anyhow::Result<bool>;
    async fn set_reply_text(&self, reply_id: Uuid, text: &str) -> anyhow::Result<bool>;
}

/// One-way credential contract for delete passwords.
#[cfg_attr(any(test, feature = "testing"), mockall::automock)]
#[async_trait]
pub trait CredentialVerifier: Send + Sync {
    /// Produces a salted hash suitable for storage.
    async fn hash_password(&self, password: &str) -> anyhow::Result<String>;

    /// Verifies a password against a stored hash. Malformed hashes never
    /// verify; `Err` means the check itself could not run.
    async fn verify_password(&self, password: &str, hash: &str) -> anyhow::Result<bool>;
}
