// src/main.rs

use std::sync::Arc;

use dotenvy::dotenv;
use quiz_backend::config::Config;
use quiz_backend::quiz::{QuizEngine, bank::QuestionBank, store::UserStore};
use quiz_backend::routes;
use quiz_backend::state::AppState;
use tracing_subscriber::{EnvFilter, fmt, layer::SubscriberExt, util::SubscriberInitExt};

#[tokio::main]
async fn main() {
    // Load .env file (if present)
    dotenv().ok();

    // Load configuration from environment
    let config = Config::from_env();

    let file_appender = tracing_appender::rolling::daily("logs", "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);
    let env_filter = EnvFilter::new(&config.rust_log);
    let stdout_layer = fmt::layer().with_writer(std::io::stdout).with_target(false);
    let file_layer = fmt::layer().with_writer(non_blocking).with_ansi(false);

    // Initialize Tracing (Logging)
    tracing_subscriber::registry()
        .with(env_filter)
        .with(stdout_layer)
        .with(file_layer)
        .init();

    // The user data root is required; without it nothing can be persisted.
    let store = UserStore::open(&config.user_data_dir).unwrap_or_else(|e| {
        panic!(
            "Failed to create user data directory {:?}: {}",
            config.user_data_dir, e
        )
    });
    tracing::info!("User data stored under {:?}", store.root());

    // Load the question bank before accepting traffic
    let bank = QuestionBank::load(&config.courses);
    if bank.question_count() == 0 {
        tracing::warn!(
            "Question bank under {:?} is empty, every run will have zero questions",
            config.question_data_dir
        );
    }

    let engine = QuizEngine::new(Arc::new(bank), store, config.courses.clone());

    // Create AppState
    let state = AppState {
        engine: Arc::new(engine),
        config: config.clone(),
    };

    // Create the Axum application router
    let app = routes::create_router(state);

    // Bind to the listening address
    let listener = tokio::net::TcpListener::bind(&config.bind_addr)
        .await
        .unwrap_or_else(|e| panic!("Failed to bind {}: {}", config.bind_addr, e));
    tracing::info!("Quiz backend listening on {}", config.bind_addr);

    // Start the server
    axum::serve(listener, app).await.expect("server error");
}
