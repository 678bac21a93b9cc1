// src/store/pg.rs

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, PgPool, types::Json};

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerPair, Attempt, NewAttempt},
        paper::{NewPaper, Paper, PaperType, Question},
        user::{NewUser, User},
    },
    store::{PaperChanges, QUESTIONS_LOCKED, Store},
};

const PAPER_COLUMNS: &str = r#"
    id, title, description, questions, deadline, time_limit,
    paper_type, published, archived_at, created_by, created_at
"#;

const ATTEMPT_COLUMNS: &str = r#"
    id, student_id, paper_id, answers, score, total_questions, percentage,
    time_spent, submitted_at, answer_file_url, teacher_review_file_url
"#;

/// Row of the 'papers' table. Questions live in a JSONB column.
#[derive(Debug, FromRow)]
struct PaperRow {
    id: i64,
    title: String,
    description: Option<String>,
    questions: Json<Vec<Question>>,
    deadline: DateTime<Utc>,
    time_limit: i32,
    paper_type: String,
    published: bool,
    archived_at: Option<DateTime<Utc>>,
    created_by: i64,
    created_at: DateTime<Utc>,
}

impl TryFrom<PaperRow> for Paper {
    type Error = AppError;

    fn try_from(row: PaperRow) -> Result<Self, Self::Error> {
        let paper_type = PaperType::parse(&row.paper_type).ok_or_else(|| {
            AppError::InternalServerError(format!(
                "Paper {} has unknown type '{}'",
                row.id, row.paper_type
            ))
        })?;

        Ok(Paper {
            id: row.id,
            title: row.title,
            description: row.description,
            questions: row.questions.0,
            deadline: row.deadline,
            time_limit: row.time_limit,
            paper_type,
            published: row.published,
            archived_at: row.archived_at,
            created_by: row.created_by,
            created_at: row.created_at,
        })
    }
}

/// Row of the 'attempts' table.
#[derive(Debug, FromRow)]
struct AttemptRow {
    id: i64,
    student_id: i64,
    paper_id: i64,
    answers: Json<Vec<AnswerPair>>,
    score: Option<i32>,
    total_questions: i32,
    percentage: Option<i32>,
    time_spent: i32,
    submitted_at: DateTime<Utc>,
    answer_file_url: Option<String>,
    teacher_review_file_url: Option<String>,
}

impl From<AttemptRow> for Attempt {
    fn from(row: AttemptRow) -> Self {
        Attempt {
            id: row.id,
            student_id: row.student_id,
            paper_id: row.paper_id,
            answers: row.answers.0,
            score: row.score,
            total_questions: row.total_questions,
            percentage: row.percentage,
            time_spent: row.time_spent,
            submitted_at: row.submitted_at,
            answer_file_url: row.answer_file_url,
            teacher_review_file_url: row.teacher_review_file_url,
        }
    }
}

/// PostgreSQL-backed `Store`.
#[derive(Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl Store for PgStore {
    async fn create_user(&self, user: NewUser) -> Result<User, AppError> {
        sqlx::query_as::<_, User>(
            r#"
            INSERT INTO users (username, password, role)
            VALUES ($1, $2, $3)
            RETURNING id, username, password, role, created_at
            "#,
        )
        .bind(&user.username)
        .bind(&user.password)
        .bind(user.role.as_str())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if e.as_database_error().is_some_and(|d| d.is_unique_violation()) {
                AppError::Conflict(format!("Username '{}' already exists", user.username))
            } else {
                tracing::error!("Failed to create user: {:?}", e);
                AppError::from(e)
            }
        })
    }

    async fn find_user_by_username(&self, username: &str) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, created_at FROM users WHERE username = $1",
        )
        .bind(username)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn find_user(&self, id: i64) -> Result<Option<User>, AppError> {
        let user = sqlx::query_as::<_, User>(
            "SELECT id, username, password, role, created_at FROM users WHERE id = $1",
        )
        .bind(id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(user)
    }

    async fn create_paper(&self, paper: NewPaper) -> Result<Paper, AppError> {
        let sql = format!(
            r#"
            INSERT INTO papers
                (title, description, questions, deadline, time_limit, paper_type, published, created_by)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8)
            RETURNING {PAPER_COLUMNS}
            "#
        );

        let row = sqlx::query_as::<_, PaperRow>(&sql)
            .bind(&paper.title)
            .bind(&paper.description)
            .bind(Json(&paper.questions))
            .bind(paper.deadline)
            .bind(paper.time_limit)
            .bind(paper.paper_type.as_str())
            .bind(paper.published)
            .bind(paper.created_by)
            .fetch_one(&self.pool)
            .await
            .map_err(|e| {
                tracing::error!("Failed to create paper: {:?}", e);
                AppError::from(e)
            })?;

        Paper::try_from(row)
    }

    async fn get_paper(&self, id: i64) -> Result<Option<Paper>, AppError> {
        let sql = format!("SELECT {PAPER_COLUMNS} FROM papers WHERE id = $1");

        sqlx::query_as::<_, PaperRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Paper::try_from)
            .transpose()
    }

    async fn list_papers(&self) -> Result<Vec<Paper>, AppError> {
        let sql = format!("SELECT {PAPER_COLUMNS} FROM papers ORDER BY deadline DESC");

        sqlx::query_as::<_, PaperRow>(&sql)
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(Paper::try_from)
            .collect()
    }

    async fn update_paper(&self, id: i64, changes: PaperChanges) -> Result<Option<Paper>, AppError> {
        let replaces_questions = changes.questions.is_some();

        // Absent fields keep their current value via COALESCE. Question
        // replacement only applies while no attempt references the paper.
        let sql = format!(
            r#"
            UPDATE papers SET
                title = COALESCE($2, title),
                description = COALESCE($3, description),
                questions = COALESCE($4, questions),
                deadline = COALESCE($5, deadline),
                time_limit = COALESCE($6, time_limit),
                published = COALESCE($7, published)
            WHERE id = $1
              AND ($4::jsonb IS NULL OR NOT EXISTS (SELECT 1 FROM attempts WHERE paper_id = $1))
            RETURNING {PAPER_COLUMNS}
            "#
        );

        let updated = sqlx::query_as::<_, PaperRow>(&sql)
            .bind(id)
            .bind(changes.title)
            .bind(changes.description)
            .bind(changes.questions.map(Json))
            .bind(changes.deadline)
            .bind(changes.time_limit)
            .bind(changes.published)
            .fetch_optional(&self.pool)
            .await?
            .map(Paper::try_from)
            .transpose()?;

        if updated.is_none() && replaces_questions {
            let exists: bool = sqlx::query_scalar("SELECT EXISTS (SELECT 1 FROM papers WHERE id = $1)")
                .bind(id)
                .fetch_one(&self.pool)
                .await?;
            if exists {
                return Err(AppError::Conflict(QUESTIONS_LOCKED.to_string()));
            }
        }

        Ok(updated)
    }

    async fn archive_paper(&self, id: i64, at: DateTime<Utc>) -> Result<bool, AppError> {
        let result = sqlx::query(
            "UPDATE papers SET archived_at = COALESCE(archived_at, $2) WHERE id = $1",
        )
        .bind(id)
        .bind(at)
        .execute(&self.pool)
        .await?;

        Ok(result.rows_affected() > 0)
    }

    async fn insert_attempt(&self, attempt: NewAttempt) -> Result<Attempt, AppError> {
        let sql = format!(
            r#"
            INSERT INTO attempts
                (student_id, paper_id, answers, score, total_questions, percentage,
                 time_spent, submitted_at, answer_file_url)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9)
            RETURNING {ATTEMPT_COLUMNS}
            "#
        );

        // The unique constraint on (student_id, paper_id) turns a racing
        // second insert into `AppError::DuplicateAttempt` via `From<sqlx::Error>`.
        let row = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(attempt.student_id)
            .bind(attempt.paper_id)
            .bind(Json(&attempt.answers))
            .bind(attempt.score)
            .bind(attempt.total_questions)
            .bind(attempt.percentage)
            .bind(attempt.time_spent)
            .bind(attempt.submitted_at)
            .bind(&attempt.answer_file_url)
            .fetch_one(&self.pool)
            .await?;

        Ok(row.into())
    }

    async fn get_attempt(&self, id: i64) -> Result<Option<Attempt>, AppError> {
        let sql = format!("SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE id = $1");

        let row = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Attempt::from))
    }

    async fn find_attempt(&self, student_id: i64, paper_id: i64) -> Result<Option<Attempt>, AppError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE student_id = $1 AND paper_id = $2"
        );

        let row = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(student_id)
            .bind(paper_id)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Attempt::from))
    }

    async fn list_attempts_for_student(&self, student_id: i64) -> Result<Vec<Attempt>, AppError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE student_id = $1 ORDER BY submitted_at DESC"
        );

        let rows = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(student_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Attempt::from).collect())
    }

    async fn list_attempts_for_paper(&self, paper_id: i64) -> Result<Vec<Attempt>, AppError> {
        let sql = format!(
            "SELECT {ATTEMPT_COLUMNS} FROM attempts WHERE paper_id = $1 ORDER BY submitted_at DESC"
        );

        let rows = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(paper_id)
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(Attempt::from).collect())
    }

    async fn count_attempts_for_paper(&self, paper_id: i64) -> Result<i64, AppError> {
        let count: i64 = sqlx::query_scalar("SELECT COUNT(*) FROM attempts WHERE paper_id = $1")
            .bind(paper_id)
            .fetch_one(&self.pool)
            .await?;

        Ok(count)
    }

    async fn set_review_file(&self, attempt_id: i64, url: &str) -> Result<Option<Attempt>, AppError> {
        let sql = format!(
            "UPDATE attempts SET teacher_review_file_url = $2 WHERE id = $1 RETURNING {ATTEMPT_COLUMNS}"
        );

        let row = sqlx::query_as::<_, AttemptRow>(&sql)
            .bind(attempt_id)
            .bind(url)
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(Attempt::from))
    }
}
