//! # BoardService
//!
//! Board, thread, and reply operations on top of the `BoardRepo` and
//! `CredentialVerifier` ports. Every operation addresses a board by name;
//! a thread or reply id that is absent or malformed counts as a lookup miss.

use std::collections::HashMap;
use std::sync::Arc;

use chrono::Utc;
use uuid::Uuid;

use crate::error::{AppError, Resource, Result};
use crate::models::{
    Board, BoardDocument, ListLimits, Reply, ReplyView, Thread, ThreadDetail, ThreadDocument,
    ThreadSummary, DELETED_TEXT,
};
use crate::traits::{BoardRepo, CredentialVerifier};

pub struct BoardService {
    repo: Arc<dyn BoardRepo>,
    credentials: Arc<dyn CredentialVerifier>,
    limits: ListLimits,
}

impl BoardService {
    pub fn new(repo: Arc<dyn BoardRepo>, credentials: Arc<dyn CredentialVerifier>) -> Self {
        Self {
            repo,
            credentials,
            limits: ListLimits::default(),
        }
    }

    pub fn with_limits(mut self, limits: ListLimits) -> Self {
        self.limits = limits;
        self
    }

    /// Creates a thread, creating the board on first use.
    #[tracing::instrument(skip(self, text, password))]
    pub async fn create_thread(&self, board: &str, text: &str, password: &str) -> Result<ThreadDocument> {
        require("text", text)?;
        require("delete_password", password)?;

        let board = self.repo.upsert_board(board).await?;
        let hash = self.credentials.hash_password(password).await?;
        let thread = Thread::new(board.id, text.to_owned(), hash, Utc::now());
        self.repo.insert_thread(&thread).await?;

        tracing::info!(thread_id = %thread.id, "thread created");
        Ok(ThreadDocument {
            thread,
            replies: Vec::new(),
        })
    }

    /// The board index: most recently bumped threads with their newest replies.
    #[tracing::instrument(skip(self))]
    pub async fn list_threads(&self, board: &str) -> Result<Vec<ThreadSummary>> {
        let board = self.board(board).await?;
        let threads = self
            .repo
            .list_threads(board.id, Some(self.limits.threads as i64))
            .await?;

        let mut summaries = Vec::with_capacity(threads.len());
        for thread in threads {
            let replycount = self.repo.count_replies(thread.id).await?;
            let replies = self
                .repo
                .recent_replies(thread.id, self.limits.replies as i64)
                .await?;
            summaries.push(ThreadSummary {
                id: thread.id,
                text: thread.text,
                created_on: thread.created_on,
                bumped_on: thread.bumped_on,
                replies: replies.into_iter().map(ReplyView::from).collect(),
                replycount: usize::try_from(replycount).unwrap_or_default(),
            });
        }
        Ok(summaries)
    }

    /// Flags a thread for moderators. Needs no password.
    #[tracing::instrument(skip(self))]
    pub async fn report_thread(&self, board: &str, thread_id: &str) -> Result<()> {
        let board = self.board(board).await?;
        let thread = self.thread(&board, thread_id).await?;
        if !self.repo.mark_thread_reported(thread.id).await? {
            return Err(AppError::NotFound(Resource::Thread));
        }
        tracing::info!(thread_id = %thread.id, "thread reported");
        Ok(())
    }

    /// Removes a thread and all its replies.
    #[tracing::instrument(skip(self, password))]
    pub async fn delete_thread(&self, board: &str, thread_id: &str, password: &str) -> Result<()> {
        let board = self.board(board).await?;
        let thread = self.thread(&board, thread_id).await?;
        if !self
            .credentials
            .verify_password(password, &thread.delete_password)
            .await?
        {
            tracing::info!(thread_id = %thread.id, "thread delete rejected");
            return Err(AppError::IncorrectPassword);
        }
        if !self.repo.delete_thread(thread.id).await? {
            return Err(AppError::NotFound(Resource::Thread));
        }
        tracing::info!(thread_id = %thread.id, "thread deleted");
        Ok(())
    }

    /// Adds a reply, bumps its thread, and returns the whole board.
    #[tracing::instrument(skip(self, text, password))]
    pub async fn create_reply(
        &self,
        board: &str,
        thread_id: &str,
        text: &str,
        password: &str,
    ) -> Result<BoardDocument> {
        require("text", text)?;
        require("delete_password", password)?;
        require("thread_id", thread_id)?;

        let board = self.board(board).await?;
        let thread = self.thread(&board, thread_id).await?;
        let hash = self.credentials.hash_password(password).await?;

        let now = Utc::now();
        let reply = Reply::new(thread.id, text.to_owned(), hash, now);
        // Clock skew must never move a thread backwards.
        let bumped_on = now.max(thread.bumped_on);
        if !self.repo.insert_reply(&reply, bumped_on).await? {
            return Err(AppError::NotFound(Resource::Thread));
        }
        tracing::info!(thread_id = %thread.id, reply_id = %reply.id, "reply created");

        self.document(board).await
    }

    /// One thread with its full reply list.
    #[tracing::instrument(skip(self))]
    pub async fn thread_with_replies(&self, board: &str, thread_id: &str) -> Result<ThreadDetail> {
        require("thread_id", thread_id)?;

        let board = self.board(board).await?;
        let thread = self.thread(&board, thread_id).await?;
        let replies = self.repo.all_replies(thread.id).await?;

        Ok(ThreadDetail {
            id: thread.id,
            text: thread.text,
            created_on: thread.created_on,
            bumped_on: thread.bumped_on,
            replies: replies.into_iter().map(ReplyView::from).collect(),
        })
    }

    #[tracing::instrument(skip(self))]
    pub async fn report_reply(&self, board: &str, thread_id: &str, reply_id: &str) -> Result<()> {
        let board = self.board(board).await?;
        let thread = self.thread(&board, thread_id).await?;
        let reply = self.reply(&thread, reply_id).await?;
        if !self.repo.mark_reply_reported(reply.id).await? {
            return Err(AppError::NotFound(Resource::Reply));
        }
        tracing::info!(reply_id = %reply.id, "reply reported");
        Ok(())
    }

    /// Soft delete: the reply stays in place with its text replaced.
    #[tracing::instrument(skip(self, password))]
    pub async fn delete_reply(
        &self,
        board: &str,
        thread_id: &str,
        reply_id: &str,
        password: &str,
    ) -> Result<()> {
        let board = self.board(board).await?;
        let thread = self.thread(&board, thread_id).await?;
        let reply = self.reply(&thread, reply_id).await?;
        if !self
            .credentials
            .verify_password(password, &reply.delete_password)
            .await?
        {
            tracing::info!(reply_id = %reply.id, "reply delete rejected");
            return Err(AppError::IncorrectPassword);
        }
        if !self.repo.set_reply_text(reply.id, DELETED_TEXT).await? {
            return Err(AppError::NotFound(Resource::Reply));
        }
        tracing::info!(reply_id = %reply.id, "reply deleted");
        Ok(())
    }

    async fn board(&self, name: &str) -> Result<Board> {
        self.repo
            .find_board(name)
            .await?
            .ok_or(AppError::NotFound(Resource::Board))
    }

    async fn thread(&self, board: &Board, raw_id: &str) -> Result<Thread> {
        let id = parse_id(raw_id, Resource::Thread)?;
        self.repo
            .find_thread(board.id, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Thread))
    }

    async fn reply(&self, thread: &Thread, raw_id: &str) -> Result<Reply> {
        let id = parse_id(raw_id, Resource::Reply)?;
        self.repo
            .find_reply(thread.id, id)
            .await?
            .ok_or(AppError::NotFound(Resource::Reply))
    }

    async fn document(&self, board: Board) -> Result<BoardDocument> {
        let threads = self.repo.all_threads(board.id).await?;
        let mut by_thread: HashMap<Uuid, Vec<Reply>> = HashMap::new();
        for reply in self.repo.board_replies(board.id).await? {
            by_thread.entry(reply.thread_id).or_default().push(reply);
        }

        let threads = threads
            .into_iter()
            .map(|thread| {
                let replies = by_thread.remove(&thread.id).unwrap_or_default();
                ThreadDocument { thread, replies }
            })
            .collect();

        Ok(BoardDocument {
            id: board.id,
            name: board.name,
            threads,
        })
    }
}

fn require(field: &str, value: &str) -> Result<()> {
    if value.is_empty() {
        return Err(AppError::ValidationError(format!("{field} is required")));
    }
    Ok(())
}

fn parse_id(raw: &str, resource: Resource) -> Result<Uuid> {
    Uuid::parse_str(raw).map_err(|_| AppError::NotFound(resource))
}
