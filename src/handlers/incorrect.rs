// src/handlers/incorrect.rs

use std::sync::Arc;

use axum::{Json, extract::State, http::StatusCode, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::run_blocking,
    models::session::{DeleteIncorrectRequest, StartIncorrectReviewRequest, SubmitAnswerRequest},
    quiz::QuizEngine,
};

/// Starts a review of the user's incorrect-answer notebook for one course.
pub async fn start_incorrect_review(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<StartIncorrectReviewRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let run = run_blocking(move || {
        engine.start_incorrect_review(
            &payload.user_id,
            &payload.course,
            payload.order_choice.as_deref(),
        )
    })
    .await?;

    Ok(Json(run))
}

/// Accepts an answer given while reviewing the notebook.
/// Moves the review on; entries leave the notebook only through `delete_incorrect`.
pub async fn submit_review_answer(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let recorded = run_blocking(move || {
        engine.submit_review_answer(
            &payload.user_id,
            &payload.quiz_question_id,
            &payload.user_answer,
            payload.was_correct,
        )
    })
    .await?;

    Ok(Json(recorded))
}

/// Removes a question from the notebook.
/// Answers 204 whether or not the entry existed.
pub async fn delete_incorrect(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<DeleteIncorrectRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    run_blocking(move || {
        engine.delete_incorrect(
            &payload.user_id,
            payload.course.as_deref(),
            &payload.original_chapter,
            &payload.original_question_number,
        )
    })
    .await?;

    Ok(StatusCode::NO_CONTENT)
}
