// src/handlers/submissions.rs

use axum::{
    Json,
    extract::{Multipart, Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    config::Config,
    error::AppError,
    models::attempt::{SubmitPaperRequest, SubmitPaperResponse},
    services::{
        submissions::{attach_review_file, submit_answers, submit_essay},
        uploads::read_upload_form,
    },
    state::SharedStore,
    utils::{extract::AppJson, jwt::Session},
};

/// Submits answers to an MCQ paper and returns the score.
///
/// * Rejects late, repeated and malformed submissions with a specific error kind.
/// * `time_spent` is stored but never used for grading.
pub async fn submit_paper(
    State(store): State<SharedStore>,
    session: Session,
    Path(paper_id): Path<i64>,
    AppJson(req): AppJson<SubmitPaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    session.require_student()?;
    req.validate()?;

    let (paper, attempt) = submit_answers(
        store.as_ref(),
        paper_id,
        session.user_id,
        req.answers,
        req.time_spent,
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitPaperResponse::new(&attempt, paper.paper_type)),
    ))
}

/// Submits a Structure-Essay answer file (`multipart/form-data`, field `file`).
pub async fn submit_paper_file(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    session: Session,
    Path(paper_id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    session.require_student()?;

    let form = read_upload_form(multipart, config.max_upload_bytes).await?;
    let (paper, attempt) = submit_essay(
        store.as_ref(),
        &config.upload_dir,
        paper_id,
        session.user_id,
        form,
        Utc::now(),
    )
    .await?;

    Ok((
        StatusCode::CREATED,
        Json(SubmitPaperResponse::new(&attempt, paper.paper_type)),
    ))
}

/// Attaches a teacher's review file to an essay attempt. Teacher/admin only.
pub async fn attach_review(
    State(store): State<SharedStore>,
    State(config): State<Config>,
    session: Session,
    Path(attempt_id): Path<i64>,
    multipart: Multipart,
) -> Result<impl IntoResponse, AppError> {
    session.require_staff()?;

    let form = read_upload_form(multipart, config.max_upload_bytes).await?;
    let attempt =
        attach_review_file(store.as_ref(), &config.upload_dir, attempt_id, form).await?;

    tracing::info!(attempt_id, reviewed_by = session.user_id, "Review file attached");

    Ok(Json(attempt))
}
