// src/models/attempt.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{
    models::paper::{PaperListItem, PaperType, PaperView},
    services::{
        grading::Grade,
        reporting::{PaperSummary, StudentSummary},
    },
};

/// Upper bound for the self-reported `time_spent` (one week, in minutes).
pub const MAX_TIME_SPENT: i32 = 10_080;

/// One (question, selected option) pair. `None` means unanswered.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct AnswerPair {
    pub question_id: i64,
    pub selected_option_id: Option<i64>,
}

/// One student's submission for one paper (the `attempts` table).
/// Essay attempts carry no score until reviewed outside the engine.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Attempt {
    pub id: i64,
    pub student_id: i64,
    pub paper_id: i64,
    pub answers: Vec<AnswerPair>,
    pub score: Option<i32>,
    pub total_questions: i32,
    pub percentage: Option<i32>,
    /// Minutes, as reported by the client.
    pub time_spent: i32,
    pub submitted_at: DateTime<Utc>,
    pub answer_file_url: Option<String>,
    pub teacher_review_file_url: Option<String>,
}

impl Attempt {
    pub fn is_graded(&self) -> bool {
        self.percentage.is_some()
    }

    pub fn is_reviewed(&self) -> bool {
        self.teacher_review_file_url.is_some()
    }
}

/// An attempt ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewAttempt {
    pub student_id: i64,
    pub paper_id: i64,
    pub answers: Vec<AnswerPair>,
    pub score: Option<i32>,
    pub total_questions: i32,
    pub percentage: Option<i32>,
    pub time_spent: i32,
    pub submitted_at: DateTime<Utc>,
    pub answer_file_url: Option<String>,
}

/// DTO for submitting an MCQ paper.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitPaperRequest {
    #[validate(length(max = 500))]
    pub answers: Vec<AnswerPair>,
    #[validate(range(min = 0, max = MAX_TIME_SPENT))]
    #[serde(default)]
    pub time_spent: i32,
}

/// Response for a successful submission.
#[derive(Debug, Serialize)]
pub struct SubmitPaperResponse {
    pub attempt_id: i64,
    pub paper_type: PaperType,
    pub score: Option<i32>,
    pub total_questions: i32,
    pub percentage: Option<i32>,
    pub grade: Option<Grade>,
    pub submitted_at: DateTime<Utc>,
    pub answer_file_url: Option<String>,
}

impl SubmitPaperResponse {
    pub fn new(attempt: &Attempt, paper_type: PaperType) -> Self {
        Self {
            attempt_id: attempt.id,
            paper_type,
            score: attempt.score,
            total_questions: attempt.total_questions,
            percentage: attempt.percentage,
            grade: attempt.percentage.map(|p| crate::services::grading::grade_of(p.into())),
            submitted_at: attempt.submitted_at,
            answer_file_url: attempt.answer_file_url.clone(),
        }
    }
}

/// Paper fields embedded in each "my results" entry.
#[derive(Debug, Serialize)]
pub struct ResultPaperSummary {
    pub id: i64,
    pub title: String,
    pub deadline: DateTime<Utc>,
    pub paper_type: PaperType,
    /// Rounded mean percentage of all graded attempts on this paper.
    pub average_percentage: i64,
}

#[derive(Debug, Serialize)]
pub struct MyResultEntry {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub grade: Option<Grade>,
    pub reviewed: bool,
    pub paper: ResultPaperSummary,
}

#[derive(Debug, Serialize)]
pub struct MyResultsResponse {
    pub summary: StudentSummary,
    pub results: Vec<MyResultEntry>,
}

/// One row of the teacher's per-paper results table.
#[derive(Debug, Serialize)]
pub struct PaperResultRow {
    #[serde(flatten)]
    pub attempt: Attempt,
    pub student_username: Option<String>,
    pub grade: Option<Grade>,
    pub reviewed: bool,
}

#[derive(Debug, Serialize)]
pub struct PaperResultsResponse {
    pub paper: PaperListItem,
    pub stats: PaperSummary,
    pub attempts: Vec<PaperResultRow>,
}

/// Attempt detail for the review screen.
#[derive(Debug, Serialize)]
pub struct AttemptReviewResponse {
    pub attempt: Attempt,
    pub grade: Option<Grade>,
    pub reviewed: bool,
    pub paper: PaperView,
}
