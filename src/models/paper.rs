// src/models/paper.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use url::Url;
use validator::{Validate, ValidationError};

use crate::error::AppError;

/// Kind of paper. Only MCQ papers are scored automatically.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PaperType {
    #[serde(rename = "MCQ")]
    Mcq,
    #[serde(rename = "Structure-Essay")]
    StructureEssay,
}

impl PaperType {
    pub fn as_str(&self) -> &'static str {
        match self {
            PaperType::Mcq => "MCQ",
            PaperType::StructureEssay => "Structure-Essay",
        }
    }

    pub fn parse(value: &str) -> Option<Self> {
        match value {
            "MCQ" => Some(PaperType::Mcq),
            "Structure-Essay" => Some(PaperType::StructureEssay),
            _ => None,
        }
    }
}

/// A selectable answer. Ids are unique within the owning question.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct AnswerOption {
    pub id: i64,
    pub option_text: String,
    pub is_correct: bool,
    pub image_url: Option<String>,
}

/// A question. Ids are unique within the owning paper.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    pub id: i64,
    pub question_text: String,
    pub options: Vec<AnswerOption>,
    pub image_url: Option<String>,
    pub explanation: Option<String>,
    pub explanation_image_url: Option<String>,
}

impl Question {
    /// The option flagged correct, if exactly one exists.
    pub fn correct_option(&self) -> Option<&AnswerOption> {
        let mut correct = self.options.iter().filter(|o| o.is_correct);
        match (correct.next(), correct.next()) {
            (Some(option), None) => Some(option),
            _ => None,
        }
    }

    pub fn has_option(&self, option_id: i64) -> bool {
        self.options.iter().any(|o| o.id == option_id)
    }
}

/// A quiz definition as stored in the `papers` table.
/// Questions are kept as a JSONB document.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Paper {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub deadline: DateTime<Utc>,
    /// Minutes.
    pub time_limit: i32,
    pub paper_type: PaperType,
    pub published: bool,
    pub archived_at: Option<DateTime<Utc>>,
    pub created_by: i64,
    pub created_at: DateTime<Utc>,
}

impl Paper {
    /// Visible to students and open for submissions.
    pub fn is_available(&self) -> bool {
        self.published && self.archived_at.is_none()
    }

    pub fn question(&self, question_id: i64) -> Option<&Question> {
        self.questions.iter().find(|q| q.id == question_id)
    }
}

/// Paper listing entry, without questions.
#[derive(Debug, Clone, Serialize)]
pub struct PaperListItem {
    pub id: i64,
    pub title: String,
    pub description: Option<String>,
    pub deadline: DateTime<Utc>,
    pub time_limit: i32,
    pub paper_type: PaperType,
    pub published: bool,
    pub archived: bool,
    pub question_count: usize,
}

impl From<&Paper> for PaperListItem {
    fn from(paper: &Paper) -> Self {
        Self {
            id: paper.id,
            title: paper.title.clone(),
            description: paper.description.clone(),
            deadline: paper.deadline,
            time_limit: paper.time_limit,
            paper_type: paper.paper_type,
            published: paper.published,
            archived: paper.archived_at.is_some(),
            question_count: paper.questions.len(),
        }
    }
}

/// Option as shown to a student before submitting (no `is_correct`).
#[derive(Debug, Clone, Serialize)]
pub struct PublicOptionView {
    pub id: i64,
    pub option_text: String,
    pub image_url: Option<String>,
}

/// DTO for sending a question to a student taking the paper.
/// Excludes correctness flags and explanations.
#[derive(Debug, Clone, Serialize)]
pub struct PublicQuestionView {
    pub id: i64,
    pub question_text: String,
    pub image_url: Option<String>,
    pub options: Vec<PublicOptionView>,
}

impl From<&Question> for PublicQuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            image_url: q.image_url.clone(),
            options: q
                .options
                .iter()
                .map(|o| PublicOptionView {
                    id: o.id,
                    option_text: o.option_text.clone(),
                    image_url: o.image_url.clone(),
                })
                .collect(),
        }
    }
}

/// Question as shown in review mode (after submission, or to staff).
#[derive(Debug, Clone, Serialize)]
pub struct ReviewQuestionView {
    pub id: i64,
    pub question_text: String,
    pub image_url: Option<String>,
    pub options: Vec<AnswerOption>,
    pub explanation: Option<String>,
    pub explanation_image_url: Option<String>,
}

impl From<&Question> for ReviewQuestionView {
    fn from(q: &Question) -> Self {
        Self {
            id: q.id,
            question_text: q.question_text.clone(),
            image_url: q.image_url.clone(),
            options: q.options.clone(),
            explanation: q.explanation.clone(),
            explanation_image_url: q.explanation_image_url.clone(),
        }
    }
}

/// The two question projections a paper can be rendered with.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum QuestionProjection {
    Public(Vec<PublicQuestionView>),
    Review(Vec<ReviewQuestionView>),
}

/// Paper detail response. `questions` is either projection.
#[derive(Debug, Clone, Serialize)]
pub struct PaperView {
    #[serde(flatten)]
    pub summary: PaperListItem,
    pub review_mode: bool,
    pub questions: QuestionProjection,
}

impl PaperView {
    pub fn public(paper: &Paper) -> Self {
        Self {
            summary: PaperListItem::from(paper),
            review_mode: false,
            questions: QuestionProjection::Public(
                paper.questions.iter().map(PublicQuestionView::from).collect(),
            ),
        }
    }

    pub fn review(paper: &Paper) -> Self {
        Self {
            summary: PaperListItem::from(paper),
            review_mode: true,
            questions: QuestionProjection::Review(
                paper.questions.iter().map(ReviewQuestionView::from).collect(),
            ),
        }
    }
}

/// DTO for an option inside `CreateQuestionRequest`.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOptionRequest {
    #[validate(length(min = 1, max = 500))]
    pub option_text: String,
    #[serde(default)]
    pub is_correct: bool,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
}

/// DTO for a question inside `CreatePaperRequest`.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateQuestionRequest {
    #[validate(length(min = 1, max = 2000))]
    pub question_text: String,
    #[validate(length(min = 2, max = 10, message = "A question needs at least 2 options."), nested)]
    pub options: Vec<CreateOptionRequest>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub image_url: Option<String>,
    #[validate(length(max = 4000))]
    pub explanation: Option<String>,
    #[validate(length(max = 500), custom(function = validate_url_string))]
    pub explanation_image_url: Option<String>,
}

/// DTO for creating a new paper.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreatePaperRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: String,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(nested)]
    pub questions: Vec<CreateQuestionRequest>,
    pub deadline: DateTime<Utc>,
    #[validate(range(min = 1, max = 1440))]
    pub time_limit: i32,
    pub paper_type: PaperType,
    #[serde(default = "default_published")]
    pub published: bool,
}

fn default_published() -> bool {
    true
}

/// DTO for editing a paper. Fields are optional.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct UpdatePaperRequest {
    #[validate(length(min = 1, max = 200))]
    pub title: Option<String>,
    #[validate(length(max = 4000))]
    pub description: Option<String>,
    #[validate(nested)]
    pub questions: Option<Vec<CreateQuestionRequest>>,
    pub deadline: Option<DateTime<Utc>>,
    #[validate(range(min = 1, max = 1440))]
    pub time_limit: Option<i32>,
    pub published: Option<bool>,
}

/// A validated paper ready to be inserted.
#[derive(Debug, Clone)]
pub struct NewPaper {
    pub title: String,
    pub description: Option<String>,
    pub questions: Vec<Question>,
    pub deadline: DateTime<Utc>,
    pub time_limit: i32,
    pub paper_type: PaperType,
    pub published: bool,
    pub created_by: i64,
}

/// Turns validated question DTOs into stored questions, numbering questions
/// and options from 1 in the order given.
///
/// MCQ papers need exactly one correct option per question.
pub fn build_questions(
    requests: Vec<CreateQuestionRequest>,
    paper_type: PaperType,
) -> Result<Vec<Question>, AppError> {
    requests
        .into_iter()
        .zip(1..)
        .map(|(q, question_id)| {
            if q.options.len() < 2 {
                return Err(AppError::Validation(format!(
                    "Question {} needs at least 2 options",
                    question_id
                )));
            }
            let correct = q.options.iter().filter(|o| o.is_correct).count();
            if paper_type == PaperType::Mcq && correct != 1 {
                return Err(AppError::Validation(format!(
                    "Question {} must have exactly one correct option, found {}",
                    question_id, correct
                )));
            }

            Ok(Question {
                id: question_id,
                question_text: q.question_text,
                options: q
                    .options
                    .into_iter()
                    .zip(1..)
                    .map(|(o, option_id)| AnswerOption {
                        id: option_id,
                        option_text: o.option_text,
                        is_correct: o.is_correct,
                        image_url: o.image_url,
                    })
                    .collect(),
                image_url: q.image_url,
                explanation: q.explanation,
                explanation_image_url: q.explanation_image_url,
            })
        })
        .collect()
}

impl CreatePaperRequest {
    pub fn into_new_paper(self, created_by: i64) -> Result<NewPaper, AppError> {
        let questions = build_questions(self.questions, self.paper_type)?;
        Ok(NewPaper {
            title: self.title,
            description: self.description,
            questions,
            deadline: self.deadline,
            time_limit: self.time_limit,
            paper_type: self.paper_type,
            published: self.published,
            created_by,
        })
    }
}

/// Validates that a string is a correctly formatted URL.
/// Server-relative upload paths (`/uploads/...`) are accepted too.
fn validate_url_string(url: &str) -> Result<(), ValidationError> {
    if url.starts_with("/uploads/") {
        return Ok(());
    }
    if Url::parse(url).is_err() {
        return Err(ValidationError::new("invalid_url"));
    }
    Ok(())
}
