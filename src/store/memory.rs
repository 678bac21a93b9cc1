// src/store/memory.rs

use std::collections::HashMap;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use crate::{
    error::AppError,
    models::{
        attempt::{Attempt, NewAttempt},
        paper::{NewPaper, Paper},
        user::{NewUser, User},
    },
    store::{PaperChanges, QUESTIONS_LOCKED, Store},
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    papers: Vec<Paper>,
    attempts: Vec<Attempt>,
    next_user_id: i64,
    next_paper_id: i64,
    next_attempt_id: i64,
    /// (student_id, paper_id) -> attempt id
    attempt_index: HashMap<(i64, i64), i64>,
}

/// In-process `Store`. All writes go through one `RwLock` write guard, which
/// is what makes the attempt uniqueness check atomic.
#[derive(Default)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

#[async_trait]
impl Store for MemoryStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        let mut t = self.tables.write().await;
        if t.users.iter().any(|u| u.username == user.username) {
            return Err(AppError::Conflict(format!(
                "Username '{}' already exists",
                user.username
            )));
        }
        let created = User {
            id: next_id(&mut t.next_user_id),
            username: user.username,
            password: user.password,
            role: user.role.as_str().to_string(),
            created_at: Utc::now(),
        };
        t.users.push(created.clone());
        Ok(created)
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.username == username).cloned())
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let t = self.tables.read().await;
        Ok(t.users.iter().find(|u| u.id == id).cloned())
    }

    async fn create_paper(&self, paper: NewPaper) -> Result<Paper, AppError> {
        let mut t = self.tables.write().await;
        let created = Paper {
            id: next_id(&mut t.next_paper_id),
            title: paper.title,
            description: paper.description,
            questions: paper.questions,
            deadline: paper.deadline,
            time_limit: paper.time_limit,
            paper_type: paper.paper_type,
            published: paper.published,
            archived_at: None,
            created_by: paper.created_by,
            created_at: Utc::now(),
        };
        t.papers.push(created.clone());
        Ok(created)
    }

    async fn get_paper(&self, id: i64) -> Result<Option<Paper>, AppError> {
        let t = self.tables.read().await;
        Ok(t.papers.iter().find(|p| p.id == id).cloned())
    }

    async fn list_papers(&self) -> Result<Vec<Paper>, AppError> {
        let t = self.tables.read().await;
        let mut papers = t.papers.clone();
        papers.sort_by(|a, b| b.deadline.cmp(&a.deadline));
        Ok(papers)
    }

    async fn update_paper(&self, id: i64, changes: PaperChanges) -> Result<Option<Paper>, AppError> {
        let mut t = self.tables.write().await;
        if changes.questions.is_some() && t.attempt_index.keys().any(|(_, paper_id)| *paper_id == id) {
            return Err(AppError::Conflict(QUESTIONS_LOCKED.to_string()));
        }
        Ok(t.papers.iter_mut().find(|p| p.id == id).map(|paper| {
            changes.apply(paper);
            paper.clone()
        }))
    }

    async fn archive_paper(&self, id: i64, at: DateTime<Utc>) -> Result<bool, AppError> {
        let mut t = self.tables.write().await;
        match t.papers.iter_mut().find(|p| p.id == id) {
            Some(paper) => {
                paper.archived_at.get_or_insert(at);
                Ok(true)
            }
            None => Ok(false),
        }
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let mut t = self.tables.write().await;
        let key = (attempt.student_id, attempt.paper_id);
        if t.attempt_index.contains_key(&key) {
            return Err(AppError::DuplicateAttempt(
                "This paper has already been submitted".to_string(),
            ));
        }
        let created = Attempt {
            id: next_id(&mut t.next_attempt_id),
            student_id: attempt.student_id,
            paper_id: attempt.paper_id,
            answers: attempt.answers,
            score: attempt.score,
            total_questions: attempt.total_questions,
            percentage: attempt.percentage,
            time_spent: attempt.time_spent,
            submitted_at: attempt.submitted_at,
            answer_file_url: attempt.answer_file_url,
            teacher_review_file_url: None,
        };
        t.attempt_index.insert(key, created.id);
        t.attempts.push(created.clone());
        Ok(created)
    }

    async fn get_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        let t = self.tables.read().await;
        Ok(t.attempts.iter().find(|a| a.id == id).cloned())
    }

    async fn find_attempt(&self, student_id: i64, paper_id: i64) -> Result<Option<Attempt>, AppError> {
        let t = self.tables.read().await;
        Ok(t
            .attempts
            .iter()
            .find(|a| a.student_id == student_id && a.paper_id == paper_id)
            .cloned())
    }

    async fn list_attempts_for_student(&self, student_id: i64) -> Result<Vec<Attempt>, AppError> {
        let t = self.tables.read().await;
        let mut attempts: Vec<Attempt> = t
            .attempts
            .iter()
            .filter(|a| a.student_id == student_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(attempts)
    }

    async fn list_attempts_for_paper(&self, paper_id: i64) -> Result<Vec<Attempt>, AppError> {
        let t = self.tables.read().await;
        let mut attempts: Vec<Attempt> = t
            .attempts
            .iter()
            .filter(|a| a.paper_id == paper_id)
            .cloned()
            .collect();
        attempts.sort_by(|a, b| b.submitted_at.cmp(&a.submitted_at));
        Ok(attempts)
    }

    async fn count_attempts_for_paper(&self, paper_id: i64) -> Result<i64, AppError> {
        let t = self.tables.read().await;
        Ok(t.attempts.iter().filter(|a| a.paper_id == paper_id).count() as i64)
    }

    async fn set_review_file(&self, attempt_id: i64, url: &str) -> Result<Option<Attempt>, AppError> {
        let mut t = self.tables.write().await;
        Ok(t.attempts.iter_mut().find(|a| a.id == attempt_id).map(|attempt| {
            attempt.teacher_review_file_url = Some(url.to_string());
            attempt.clone()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    fn new_attempt(student_id: i64, paper_id: i64) -> NewAttempt {
        NewAttempt {
            student_id,
            paper_id,
            answers: Vec::new(),
            score: Some(1),
            total_questions: 2,
            percentage: Some(50),
            time_spent: 3,
            submitted_at: Utc::now(),
            answer_file_url: None,
        }
    }

    #[tokio::test]
    async fn test_concurrent_duplicate_attempts() {
        let store = Arc::new(MemoryStore::new());

        let handles: Vec<_> = (0..8)
            .map(|_| {
                let store = store.clone();
                tokio::spawn(async move { store.insert_attempt(new_attempt(1, 1)).await })
            })
            .collect();

        let mut created = 0;
        let mut duplicates = 0;
        for handle in handles {
            match handle.await.unwrap() {
                Ok(_) => created += 1,
                Err(AppError::DuplicateAttempt(_)) => duplicates += 1,
                Err(other) => panic!("unexpected error: {:?}", other),
            }
        }

        assert_eq!(created, 1);
        assert_eq!(duplicates, 7);
        assert_eq!(store.count_attempts_for_paper(1).await.unwrap(), 1);
    }

    #[tokio::test]
    async fn test_questions_locked_once_attempted() {
        use crate::models::paper::{NewPaper, PaperType};

        let store = MemoryStore::new();
        let paper = store
            .create_paper(NewPaper {
                title: "Locked".to_string(),
                description: None,
                questions: Vec::new(),
                deadline: Utc::now(),
                time_limit: 5,
                paper_type: PaperType::Mcq,
                published: true,
                created_by: 1,
            })
            .await
            .unwrap();

        let replace = || PaperChanges { questions: Some(Vec::new()), ..Default::default() };
        assert!(store.update_paper(paper.id, replace()).await.unwrap().is_some());

        store.insert_attempt(new_attempt(3, paper.id)).await.unwrap();

        let err = store.update_paper(paper.id, replace()).await.unwrap_err();
        assert!(matches!(err, AppError::Conflict(_)));

        let renamed = PaperChanges { title: Some("Renamed".to_string()), ..Default::default() };
        let updated = store.update_paper(paper.id, renamed).await.unwrap().unwrap();
        assert_eq!(updated.title, "Renamed");
    }

    #[tokio::test]
    async fn test_review_file_is_only_mutation() {
        let store = MemoryStore::new();
        let attempt = store.insert_attempt(new_attempt(2, 5)).await.unwrap();

        let updated = store
            .set_review_file(attempt.id, "/uploads/review.pdf")
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.teacher_review_file_url.as_deref(), Some("/uploads/review.pdf"));
        assert_eq!(updated.percentage, attempt.percentage);

        assert!(store.set_review_file(999, "/uploads/x.pdf").await.unwrap().is_none());
    }
}
