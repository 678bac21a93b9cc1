// src/handlers/papers.rs

use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};
use chrono::Utc;
use validator::Validate;

use crate::{
    error::AppError,
    models::paper::{
        CreatePaperRequest, PaperListItem, PaperView, UpdatePaperRequest, build_questions,
    },
    state::SharedStore,
    store::PaperChanges,
    utils::{
        html::{clean_paper_request, clean_paper_update},
        extract::AppJson,
        jwt::Session,
    },
};

/// Creates a paper. Teacher/admin only.
///
/// Question and option ids are assigned here, in the order supplied.
pub async fn create_paper(
    State(store): State<SharedStore>,
    session: Session,
    AppJson(mut payload): AppJson<CreatePaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    session.require_staff()?;
    payload.validate()?;
    clean_paper_request(&mut payload);

    let paper = store.create_paper(payload.into_new_paper(session.user_id)?).await?;

    tracing::info!(paper_id = paper.id, created_by = session.user_id, "Paper created");

    Ok((StatusCode::CREATED, Json(PaperView::review(&paper))))
}

/// Lists papers. Students only see published, non-archived papers.
pub async fn list_papers(
    State(store): State<SharedStore>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    let papers: Vec<PaperListItem> = store
        .list_papers()
        .await?
        .iter()
        .filter(|p| session.is_staff() || p.is_available())
        .map(PaperListItem::from)
        .collect();

    Ok(Json(papers))
}

/// Returns one paper.
///
/// Staff, and students who already submitted it, get the review projection
/// with correct answers. Everyone else gets the public projection.
pub async fn get_paper(
    State(store): State<SharedStore>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let paper = store
        .get_paper(id)
        .await?
        .filter(|p| session.is_staff() || p.is_available())
        .ok_or(AppError::NotFound("Paper not found".to_string()))?;

    let owner = if session.is_staff() {
        None
    } else {
        store
            .find_attempt(session.user_id, paper.id)
            .await?
            .map(|a| a.student_id)
    };

    let view = if session.can_review(owner) {
        PaperView::review(&paper)
    } else {
        PaperView::public(&paper)
    };

    Ok(Json(view))
}

/// Edits a paper. Teacher/admin only.
///
/// Questions can only be replaced while nobody has submitted the paper.
pub async fn update_paper(
    State(store): State<SharedStore>,
    session: Session,
    Path(id): Path<i64>,
    AppJson(mut payload): AppJson<UpdatePaperRequest>,
) -> Result<impl IntoResponse, AppError> {
    session.require_staff()?;
    payload.validate()?;
    clean_paper_update(&mut payload);

    let existing = store
        .get_paper(id)
        .await?
        .ok_or(AppError::NotFound("Paper not found".to_string()))?;

    // The store refuses the question replacement if the paper has attempts.
    let questions = payload
        .questions
        .map(|requests| build_questions(requests, existing.paper_type))
        .transpose()?;

    let changes = PaperChanges {
        title: payload.title,
        description: payload.description,
        questions,
        deadline: payload.deadline,
        time_limit: payload.time_limit,
        published: payload.published,
    };

    let paper = store
        .update_paper(id, changes)
        .await?
        .ok_or(AppError::NotFound("Paper not found".to_string()))?;

    tracing::info!(paper_id = paper.id, updated_by = session.user_id, "Paper updated");

    Ok(Json(PaperView::review(&paper)))
}

/// Archives a paper. Papers are never hard-deleted, attempts keep pointing
/// at them.
pub async fn archive_paper(
    State(store): State<SharedStore>,
    session: Session,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    session.require_staff()?;

    if !store.archive_paper(id, Utc::now()).await? {
        return Err(AppError::NotFound("Paper not found".to_string()));
    }

    tracing::info!(paper_id = id, archived_by = session.user_id, "Paper archived");

    Ok(StatusCode::NO_CONTENT)
}
