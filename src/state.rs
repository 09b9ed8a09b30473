// src/state.rs

use std::sync::Arc;

use axum::extract::FromRef;

use crate::{config::Config, quiz::QuizEngine};

#[derive(Clone)]
pub struct AppState {
    pub engine: Arc<QuizEngine>,
    pub config: Config,
}

impl FromRef<AppState> for Arc<QuizEngine> {
    fn from_ref(state: &AppState) -> Self {
        state.engine.clone()
    }
}

impl FromRef<AppState> for Config {
    fn from_ref(state: &AppState) -> Self {
        state.config.clone()
    }
}
