// src/services/scoring.rs

use std::collections::{HashMap, HashSet};

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerPair, NewAttempt},
        paper::{Paper, PaperType},
    },
};

/// Result of scoring an MCQ submission.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOutcome {
    pub score: i32,
    pub total_questions: i32,
    pub percentage: i32,
}

/// `numerator / denominator * 100`, rounded half up. Zero when `denominator` is zero.
pub fn percentage_of(numerator: i64, denominator: i64) -> i64 {
    if denominator <= 0 {
        return 0;
    }
    (numerator * 200 + denominator) / (denominator * 2)
}

/// Rejects answers that do not fit the paper.
///
/// * Every question id must belong to the paper.
/// * A question may be answered at most once.
/// * A selected option must belong to its question.
pub fn validate_answers(paper: &Paper, answers: &[AnswerPair]) -> Result<(), AppError> {
    let mut seen = HashSet::with_capacity(answers.len());

    for answer in answers {
        let question = paper.question(answer.question_id).ok_or_else(|| {
            AppError::Validation(format!(
                "Question {} does not belong to this paper",
                answer.question_id
            ))
        })?;

        if !seen.insert(answer.question_id) {
            return Err(AppError::Validation(format!(
                "Question {} was answered more than once",
                answer.question_id
            )));
        }

        if let Some(option_id) = answer.selected_option_id {
            if !question.has_option(option_id) {
                return Err(AppError::Validation(format!(
                    "Option {} does not belong to question {}",
                    option_id, answer.question_id
                )));
            }
        }
    }

    Ok(())
}

/// Counts correct answers against the paper's answer key.
///
/// A question is correct iff the selected option is the one flagged
/// `is_correct`. Unanswered questions count as wrong.
pub fn score_answers(paper: &Paper, answers: &[AnswerPair]) -> ScoreOutcome {
    let selected: HashMap<i64, i64> = answers
        .iter()
        .filter_map(|a| a.selected_option_id.map(|o| (a.question_id, o)))
        .collect();

    let score = paper
        .questions
        .iter()
        .filter(|q| {
            match (selected.get(&q.id), q.correct_option()) {
                (Some(chosen), Some(correct)) => *chosen == correct.id,
                _ => false,
            }
        })
        .count() as i64;

    let total = paper.questions.len() as i64;

    ScoreOutcome {
        score: score as i32,
        total_questions: total as i32,
        percentage: percentage_of(score, total) as i32,
    }
}

/// Checks availability and deadline for a submission made at `now`.
pub fn check_submission_window(paper: &Paper, now: DateTime<Utc>) -> Result<(), AppError> {
    if !paper.is_available() {
        return Err(AppError::NotFound("Paper not found".to_string()));
    }
    if now > paper.deadline {
        return Err(AppError::DeadlineExceeded(format!(
            "The deadline for '{}' passed at {}",
            paper.title,
            paper.deadline.to_rfc3339()
        )));
    }
    Ok(())
}

/// Scores an MCQ submission and builds the attempt to persist.
///
/// `time_spent` is stored as reported and never affects the score.
pub fn score_attempt(
    paper: &Paper,
    student_id: i64,
    answers: Vec<AnswerPair>,
    time_spent: i32,
    now: DateTime<Utc>,
) -> Result<NewAttempt, AppError> {
    check_submission_window(paper, now)?;

    if paper.paper_type != PaperType::Mcq {
        return Err(AppError::Validation(
            "Structure-Essay papers are submitted as a file".to_string(),
        ));
    }

    validate_answers(paper, &answers)?;
    let outcome = score_answers(paper, &answers);

    Ok(NewAttempt {
        student_id,
        paper_id: paper.id,
        answers,
        score: Some(outcome.score),
        total_questions: outcome.total_questions,
        percentage: Some(outcome.percentage),
        time_spent,
        submitted_at: now,
        answer_file_url: None,
    })
}

/// Builds an unscored essay attempt around an uploaded answer file.
pub fn essay_attempt(
    paper: &Paper,
    student_id: i64,
    answer_file_url: String,
    time_spent: i32,
    now: DateTime<Utc>,
) -> Result<NewAttempt, AppError> {
    check_submission_window(paper, now)?;

    if paper.paper_type != PaperType::StructureEssay {
        return Err(AppError::Validation(
            "MCQ papers are submitted as answers, not files".to_string(),
        ));
    }

    Ok(NewAttempt {
        student_id,
        paper_id: paper.id,
        answers: Vec::new(),
        score: None,
        total_questions: paper.questions.len() as i32,
        percentage: None,
        time_spent,
        submitted_at: now,
        answer_file_url: Some(answer_file_url),
    })
}
