//! # Domain Models
//!
//! These structs represent the core entities of the message board.
//! We use UUID v7 for time-ordered, globally unique identification.
//!
//! Identifiers go over the wire as `_id`, the key existing clients read.
//! Credential hashes are never serialized.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Text a reply carries once its author has deleted it.
pub const DELETED_TEXT: &str = "[deleted]";

/// A named container for threads (e.g., "general").
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Board {
    #[serde(rename = "_id")]
    pub id: Uuid,
    /// Natural key taken from the URL path.
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// A top-level post.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Thread {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub board_id: Uuid,
    pub text: String,
    /// Salted one-way hash produced by a `CredentialVerifier`.
    #[serde(skip_serializing)]
    pub delete_password: String,
    pub reported: bool,
    pub created_on: DateTime<Utc>,
    /// The timestamp used for sorting threads by activity
    pub bumped_on: DateTime<Utc>,
}

/// A child post under a thread.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reply {
    #[serde(rename = "_id")]
    pub id: Uuid,
    #[serde(skip_serializing)]
    pub thread_id: Uuid,
    pub text: String,
    #[serde(skip_serializing)]
    pub delete_password: String,
    pub reported: bool,
    pub created_on: DateTime<Utc>,
}

impl Thread {
    pub fn new(board_id: Uuid, text: String, delete_password: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            board_id,
            text,
            delete_password,
            reported: false,
            created_on: now,
            bumped_on: now,
        }
    }
}

impl Reply {
    pub fn new(thread_id: Uuid, text: String, delete_password: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::now_v7(),
            thread_id,
            text,
            delete_password,
            reported: false,
            created_on: now,
        }
    }
}

/// A thread together with its replies, as returned by the create endpoints.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadDocument {
    #[serde(flatten)]
    pub thread: Thread,
    pub replies: Vec<Reply>,
}

/// The whole board: every thread with every reply, in insertion order.
#[derive(Debug, Clone, Serialize)]
pub struct BoardDocument {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub name: String,
    pub threads: Vec<ThreadDocument>,
}

/// Public projection of a reply: no password, no report flag.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ReplyView {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
}

impl From<Reply> for ReplyView {
    fn from(reply: Reply) -> Self {
        Self {
            id: reply.id,
            text: reply.text,
            created_on: reply.created_on,
        }
    }
}

/// Board index entry: the newest replies plus the total count.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadSummary {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub bumped_on: DateTime<Utc>,
    pub replies: Vec<ReplyView>,
    /// Reply count before truncation.
    pub replycount: usize,
}

/// Single thread view with every reply.
#[derive(Debug, Clone, Serialize)]
pub struct ThreadDetail {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub text: String,
    pub created_on: DateTime<Utc>,
    pub bumped_on: DateTime<Utc>,
    pub replies: Vec<ReplyView>,
}

/// How much of a board the index view shows.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ListLimits {
    pub threads: usize,
    pub replies: usize,
}

impl Default for ListLimits {
    fn default() -> Self {
        Self {
            threads: 10,
            replies: 3,
        }
    }
}
