// src/handlers/results.rs

use std::collections::HashMap;

use axum::{
    Json,
    extract::{Path, State},
    response::IntoResponse,
};

use crate::{
    error::AppError,
    models::{
        attempt::{
            AttemptReviewResponse, MyResultEntry, MyResultsResponse, PaperResultRow,
            PaperResultsResponse, ResultPaperSummary,
        },
        paper::{PaperListItem, PaperView},
    },
    services::{
        grading::grade_of,
        reporting::{paper_average_percentage, summarize_for_paper, summarize_for_student},
    },
    state::SharedStore,
    utils::jwt::Session,
};

/// All attempts of the calling student, newest first, with headline stats.
pub async fn my_results(
    State(store): State<SharedStore>,
    session: Session,
) -> Result<impl IntoResponse, AppError> {
    session.require_student()?;

    let attempts = store.list_attempts_for_student(session.user_id).await?;
    let summary = summarize_for_student(&attempts);

    let mut results = Vec::with_capacity(attempts.len());
    for attempt in attempts {
        let paper = store
            .get_paper(attempt.paper_id)
            .await?
            .ok_or_else(|| {
                AppError::InternalServerError(format!(
                    "Attempt {} references missing paper {}",
                    attempt.id, attempt.paper_id
                ))
            })?;
        let paper_attempts = store.list_attempts_for_paper(paper.id).await?;

        results.push(MyResultEntry {
            grade: attempt.percentage.map(|p| grade_of(p.into())),
            reviewed: attempt.is_reviewed(),
            paper: ResultPaperSummary {
                id: paper.id,
                title: paper.title,
                deadline: paper.deadline,
                paper_type: paper.paper_type,
                average_percentage: paper_average_percentage(&paper_attempts),
            },
            attempt,
        });
    }

    Ok(Json(MyResultsResponse { summary, results }))
}

/// Every attempt on one paper plus aggregate statistics. Teacher/admin only.
pub async fn paper_results(
    State(store): State<SharedStore>,
    session: Session,
    Path(paper_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    session.require_staff()?;

    let paper = store
        .get_paper(paper_id)
        .await?
        .ok_or(AppError::NotFound("Paper not found".to_string()))?;

    let attempts = store.list_attempts_for_paper(paper_id).await?;
    let stats = summarize_for_paper(&attempts);

    let mut usernames: HashMap<i64, Option<String>> = HashMap::new();
    for attempt in &attempts {
        if !usernames.contains_key(&attempt.student_id) {
            let name = store.find_user(attempt.student_id).await?.map(|u| u.username);
            usernames.insert(attempt.student_id, name);
        }
    }

    let rows = attempts
        .into_iter()
        .map(|attempt| PaperResultRow {
            student_username: usernames.get(&attempt.student_id).cloned().flatten(),
            grade: attempt.percentage.map(|p| grade_of(p.into())),
            reviewed: attempt.is_reviewed(),
            attempt,
        })
        .collect();

    Ok(Json(PaperResultsResponse {
        paper: PaperListItem::from(&paper),
        stats,
        attempts: rows,
    }))
}

/// One attempt with its paper in review mode.
///
/// Students may only open their own attempts.
pub async fn get_attempt(
    State(store): State<SharedStore>,
    session: Session,
    Path(attempt_id): Path<i64>,
) -> Result<impl IntoResponse, AppError> {
    let attempt = store
        .get_attempt(attempt_id)
        .await?
        .ok_or(AppError::NotFound("Attempt not found".to_string()))?;

    if !session.can_review(Some(attempt.student_id)) {
        return Err(AppError::Forbidden(
            "You can only view your own attempts".to_string(),
        ));
    }

    let paper = store
        .get_paper(attempt.paper_id)
        .await?
        .ok_or(AppError::NotFound("Paper not found".to_string()))?;

    Ok(Json(AttemptReviewResponse {
        grade: attempt.percentage.map(|p| grade_of(p.into())),
        reviewed: attempt.is_reviewed(),
        attempt,
        paper: PaperView::review(&paper),
    }))
}
