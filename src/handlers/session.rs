// src/handlers/session.rs

use std::sync::Arc;

use axum::{
    Json,
    extract::{Query, State},
    response::IntoResponse,
};
use validator::Validate;

use crate::{
    error::AppError,
    handlers::run_blocking,
    models::session::{ProgressParams, UserRequest},
    quiz::QuizEngine,
};

/// Establishes a session for a client-supplied user id.
///
/// * Creates the user's data directory on first contact.
/// * Reports whether the user is new.
pub async fn init_session(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    let initialized = run_blocking(move || engine.init_session(&payload.user_id)).await?;

    Ok(Json(initialized))
}

/// Returns the progress of the user's current run.
pub async fn get_progress(
    State(engine): State<Arc<QuizEngine>>,
    Query(params): Query<ProgressParams>,
) -> Result<impl IntoResponse, AppError> {
    params.validate()?;

    let progress = run_blocking(move || engine.progress(&params.user_id)).await?;

    Ok(Json(progress))
}

/// Archives the user's notebooks and statistics and drops the session.
pub async fn clear_user_data(
    State(engine): State<Arc<QuizEngine>>,
    Json(payload): Json<UserRequest>,
) -> Result<impl IntoResponse, AppError> {
    payload.validate()?;

    tracing::info!("User {} requested a data clear", payload.user_id);
    let cleared = run_blocking(move || engine.clear_user_data(&payload.user_id)).await?;

    Ok(Json(cleared))
}
