// src/handlers/quiz.rs

use std::sync::Arc;

use axum::{Json, extract::State, response::IntoResponse};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::run_blocking,
    models::session::{Mode, StartRunRequest, SubmitAnswerRequest},
    quiz::QuizEngine,
};

/// Starts quiz mode over the chosen chapters.
///
/// Returns the questions together with their answers.
/// The frontend hides each answer until the user has submitted.
pub async fn start_quiz(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<StartRunRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let run = run_blocking(move || {
        engine.start_run(
            Mode::Quiz,
            &payload.user_id,
            &payload.course,
            &payload.chapter_choice,
            &payload.order_choice,
        )
    })
    .await?;

    Ok(Json(run))
}

/// Records a quiz answer.
///
/// * Correctness is judged by the frontend and trusted as sent.
/// * Updates the user's statistics (correct / error counters).
/// * Adds missed questions to the course's incorrect-answer notebook.
pub async fn submit_answer(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<SubmitAnswerRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    tracing::debug!(
        "Quiz answer from {}: {} -> {:?} (correct: {})",
        payload.user_id,
        payload.quiz_question_id,
        payload.user_answer,
        payload.was_correct
    );

    let recorded = run_blocking(move || {
        engine.submit_answer(
            &payload.user_id,
            &payload.quiz_question_id,
            &payload.user_answer,
            payload.was_correct,
        )
    })
    .await?;

    Ok(Json(recorded))
}
