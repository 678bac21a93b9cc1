// src/services/submissions.rs

//! Submission workflow around the pure scoring functions: load the paper,
//! enforce the one-attempt policy, persist.

use chrono::{DateTime, Utc};

use crate::{
    error::AppError,
    models::{
        attempt::{AnswerPair, Attempt, NewAttempt},
        paper::{Paper, PaperType},
    },
    services::{
        scoring::{check_submission_window, essay_attempt, score_attempt},
        uploads::{UploadForm, remove_stored_file, store_form_file},
    },
    store::Store,
};

/// Loads a paper a student may submit to. Unpublished and archived papers
/// are reported as missing.
pub async fn load_open_paper(store: &dyn Store, paper_id: i64) -> Result<Paper, AppError> {
    store
        .get_paper(paper_id)
        .await?
        .filter(Paper::is_available)
        .ok_or_else(|| AppError::NotFound("Paper not found".to_string()))
}

async fn ensure_first_attempt(
    store: &dyn Store,
    student_id: i64,
    paper_id: i64,
) -> Result<(), AppError> {
    if store.find_attempt(student_id, paper_id).await?.is_some() {
        return Err(AppError::DuplicateAttempt(
            "You have already submitted this paper".to_string(),
        ));
    }
    Ok(())
}

/// Scores and records an MCQ submission made at `now`.
///
/// The pre-check only gives a friendlier early answer. Two racing requests are
/// settled by the store's uniqueness guarantee.
pub async fn submit_answers(
    store: &dyn Store,
    paper_id: i64,
    student_id: i64,
    answers: Vec<AnswerPair>,
    time_spent: i32,
    now: DateTime<Utc>,
) -> Result<(Paper, Attempt), AppError> {
    let paper = load_open_paper(store, paper_id).await?;
    let new_attempt = score_attempt(&paper, student_id, answers, time_spent, now)?;
    ensure_first_attempt(store, student_id, paper_id).await?;

    let attempt = store.insert_attempt(new_attempt).await?;

    tracing::info!(
        paper_id,
        student_id,
        attempt_id = attempt.id,
        score = ?attempt.score,
        percentage = ?attempt.percentage,
        "Paper submitted"
    );

    Ok((paper, attempt))
}

/// Records a Structure-Essay submission. The file is only written once the
/// paper, deadline and duplicate checks have passed.
pub async fn submit_essay(
    store: &dyn Store,
    upload_dir: &str,
    paper_id: i64,
    student_id: i64,
    form: UploadForm,
    now: DateTime<Utc>,
) -> Result<(Paper, Attempt), AppError> {
    let paper = load_open_paper(store, paper_id).await?;
    check_submission_window(&paper, now)?;
    if paper.paper_type != PaperType::StructureEssay {
        return Err(AppError::Validation(
            "MCQ papers are submitted as answers, not files".to_string(),
        ));
    }
    ensure_first_attempt(store, student_id, paper_id).await?;

    let url = store_form_file(upload_dir, &form).await?;
    let new_attempt =
        match essay_attempt(&paper, student_id, url.clone(), form.time_spent.unwrap_or(0), now) {
            Ok(new_attempt) => new_attempt,
            Err(e) => {
                remove_stored_file(upload_dir, &url).await;
                return Err(e);
            }
        };
    let attempt = record_essay_attempt(store, upload_dir, new_attempt).await?;

    tracing::info!(
        paper_id,
        student_id,
        attempt_id = attempt.id,
        "Essay paper submitted"
    );

    Ok((paper, attempt))
}

/// Inserts an essay attempt. When the insert fails (a racing duplicate or a
/// storage error) the uploaded file is removed again.
pub async fn record_essay_attempt(
    store: &dyn Store,
    upload_dir: &str,
    new_attempt: NewAttempt,
) -> Result<Attempt, AppError> {
    let url = new_attempt.answer_file_url.clone();
    match store.insert_attempt(new_attempt).await {
        Ok(attempt) => Ok(attempt),
        Err(e) => {
            if let Some(url) = url {
                remove_stored_file(upload_dir, &url).await;
            }
            Err(e)
        }
    }
}

/// Stores a teacher's review file for an essay attempt.
///
/// MCQ attempts are scored automatically and take no review file. A replaced
/// review file is deleted once the attempt points at the new one.
pub async fn attach_review_file(
    store: &dyn Store,
    upload_dir: &str,
    attempt_id: i64,
    form: UploadForm,
) -> Result<Attempt, AppError> {
    let attempt = store
        .get_attempt(attempt_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Attempt not found".to_string()))?;
    let paper = store
        .get_paper(attempt.paper_id)
        .await?
        .ok_or_else(|| AppError::NotFound("Paper not found".to_string()))?;
    if paper.paper_type != PaperType::StructureEssay {
        return Err(AppError::Validation(
            "Review files can only be attached to Structure-Essay attempts".to_string(),
        ));
    }

    let url = store_form_file(upload_dir, &form).await?;
    let updated = match store.set_review_file(attempt_id, &url).await {
        Ok(Some(updated)) => updated,
        Ok(None) => {
            remove_stored_file(upload_dir, &url).await;
            return Err(AppError::NotFound("Attempt not found".to_string()));
        }
        Err(e) => {
            remove_stored_file(upload_dir, &url).await;
            return Err(e);
        }
    };

    if let Some(previous) = attempt.teacher_review_file_url.filter(|old| *old != url) {
        remove_stored_file(upload_dir, &previous).await;
    }

    Ok(updated)
}
