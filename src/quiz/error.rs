// src/quiz/error.rs

use std::{io, path::PathBuf};

use thiserror::Error;

use crate::models::session::Mode;

/// Failures of the per-user JSON documents.
#[derive(Debug, Error)]
pub enum StoreError {
    #[error("invalid user id {0:?}")]
    InvalidUserId(String),

    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("corrupt user data in {path}: {source}")]
    CorruptUserData {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize user data: {0}")]
    Serialize(#[from] serde_json::Error),
}

impl StoreError {
    pub(crate) fn io(path: impl Into<PathBuf>, source: io::Error) -> Self {
        StoreError::Io {
            path: path.into(),
            source,
        }
    }
}

/// Errors reported by the quiz engine operations.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("invalid request: {0}")]
    Validation(String),

    #[error("unknown course {0:?}")]
    UnknownCourse(String),

    #[error("malformed question id {0:?}")]
    InvalidQuestionId(String),

    #[error("unknown question id {0:?}")]
    UnknownQuestionId(String),

    #[error("no session for user {0:?}")]
    SessionNotFound(String),

    #[error("operation requires {expected} mode, session is in {actual} mode")]
    InvalidModeForOperation { expected: Mode, actual: Mode },

    #[error("session has no course selected")]
    MissingCourseContext,

    #[error(transparent)]
    Storage(#[from] StoreError),
}

pub type QuizResult<T> = Result<T, QuizError>;
