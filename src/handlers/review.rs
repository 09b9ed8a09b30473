// src/handlers/review.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::run_blocking,
    models::session::{Mode, StartRunRequest, UserRequest},
    quiz::QuizEngine,
};

/// Starts quick-review mode.
/// Returns every selected question with its answer; `/next` steps through them.
pub async fn start_quick_review(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<StartRunRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let run = run_blocking(move || {
        engine.start_run(
            Mode::QuickReview,
            &payload.user_id,
            &payload.course,
            &payload.chapter_choice,
            &payload.order_choice,
        )
    })
    .await?;

    Ok(Json(run))
}

/// Moves the quick-review cursor to the next question.
pub async fn next_question(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let advanced = run_blocking(move || engine.advance(&payload.user_id)).await?;

    Ok(Json(advanced))
}
