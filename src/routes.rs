// src/routes.rs

use axum::{
    Router,
    http::{Method, header},
    routing::{get, post},
};
use tower::ServiceBuilder;
use tower_http::{
    cors::{Any, CorsLayer},
    services::ServeDir,
    trace::TraceLayer,
};

use crate::{
    handlers::{incorrect, quiz, review, session},
    state::AppState,
};

/// Assembles the main application router.
///
/// * Merges all sub-routers (session, review, quiz, incorrect questions, user).
/// * Serves `STATIC_DIR` as a fallback when configured.
/// * Applies global middleware (Trace, CORS).
/// * Injects global state (quiz engine, config).
pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods([Method::GET, Method::POST])
        .allow_headers([header::CONTENT_TYPE]);

    let session_routes = Router::new()
        .route("/init", post(session::init_session))
        .route("/progress", get(session::get_progress));

    let review_routes = Router::new()
        .route("/start", post(review::start_quick_review))
        .route("/next", post(review::next_question));

    let quiz_routes = Router::new()
        .route("/start", post(quiz::start_quiz))
        .route("/submit_answer", post(quiz::submit_answer));

    let incorrect_routes = Router::new()
        .route("/review/start", post(incorrect::start_incorrect_review))
        .route("/review/submit_answer", post(incorrect::submit_review_answer))
        .route("/delete", post(incorrect::delete_incorrect));

    let user_routes = Router::new().route("/data/clear", post(session::clear_user_data));

    let mut app = Router::new()
        .nest("/api/session", session_routes)
        .nest("/api/review", review_routes)
        .nest("/api/quiz", quiz_routes)
        .nest("/api/incorrect_questions", incorrect_routes)
        .nest("/api/user", user_routes);

    if let Some(static_dir) = &state.config.static_dir {
        tracing::info!("Serving static files from {:?}", static_dir);
        app = app.fallback_service(ServeDir::new(static_dir));
    }

    app
        // Global Middleware (applied from outside in)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(cors),
        )
        .with_state(state)
}
