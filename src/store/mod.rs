// src/store/mod.rs

//! Persistence boundary.
//!
//! Handlers only talk to `dyn Store`. `PgStore` is the production backend,
//! `MemoryStore` keeps everything in process for tests and local demos.
//! Both must reject a second attempt for the same (student, paper) pair with
//! `AppError::DuplicateAttempt`.

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt},
        paper::{NewPaper, Paper, Question},
        user::{NewUser, User},
    },
};

pub mod memory;
pub mod pg;

pub use memory::MemoryStore;
pub use pg::PgStore;

pub const QUESTIONS_LOCKED: &str = "Questions cannot change once the paper has submissions";

/// Partial update applied by `Store::update_paper`.
#[derive(Debug, Clone, Default)]
pub struct PaperChanges {
    pub title: Option<String>,
    pub description: Option<String>,
    pub questions: Option<Vec<Question>>,
    pub deadline: Option<DateTime<Utc>>,
    pub time_limit: Option<i32>,
    pub published: Option<bool>,
}

impl PaperChanges {
    pub fn apply(self, paper: &mut Paper) {
        if let Some(title) = self.title {
            paper.title = title;
        }
        if let Some(description) = self.description {
            paper.description = Some(description);
        }
        if let Some(questions) = self.questions {
            paper.questions = questions;
        }
        if let Some(deadline) = self.deadline {
            paper.deadline = deadline;
        }
        if let Some(time_limit) = self.time_limit {
            paper.time_limit = time_limit;
        }
        if let Some(published) = self.published {
            paper.published = published;
        }
    }
}

#[async_trait]
pub trait Store: Send + Sync {
    // Users

    /// Fails with `AppError::Conflict` when the username is taken.
    async fn create_user(&self, user: NewUser) -> Result<User, AppError>;
    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError>;
    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError>;

    // Papers

    async fn create_paper(&self, paper: NewPaper) -> Result<Paper, AppError>;
    /// Returns archived and unpublished papers too. Callers decide visibility.
    async fn get_paper(&self, id: i64) -> Result<Option<Paper>, AppError>;
    async fn list_papers(&self) -> Result<Vec<Paper>, AppError>;
    /// Fails with `AppError::Conflict` when `changes.questions` is set and the
    /// paper already has attempts. The check and the write are one atomic step.
    async fn update_paper(&self, id: i64, changes: PaperChanges) -> Result<Option<Paper>, AppError>;
    /// Soft delete. Returns false when the paper does not exist.
    async fn archive_paper(&self, id: i64, at: DateTime<Utc>) -> Result<bool, AppError>;

    // Attempts

    /// Fails with `AppError::DuplicateAttempt` if the pair already has an attempt.
    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError>;
    async fn get_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError>;
    async fn find_attempt(&self, student_id: i64, paper_id: i64) -> Result<Option<Attempt>, AppError>;
    async fn list_attempts_for_student(&self, student_id: i64) -> Result<Vec<Attempt>, AppError>;
    async fn list_attempts_for_paper(&self, paper_id: i64) -> Result<Vec<Attempt>, AppError>;
    async fn count_attempts_for_paper(&self, paper_id: i64) -> Result<i64, AppError>;
    /// The only mutation allowed on a recorded attempt.
    async fn set_review_file(&self, attempt_id: i64, url: &str) -> Result<Option<Attempt>, AppError>;
}
