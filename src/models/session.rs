// src/models/session.rs

use std::fmt;

use serde::{Deserialize, Serialize};
use validator::Validate;

use crate::{models::question::QuestionOutput, quiz::store::is_valid_user_id};

/// Active mode of a user session.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Mode {
    #[default]
    Idle,
    QuickReview,
    Quiz,
    IncorrectReview,
}

impl fmt::Display for Mode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Mode::Idle => "idle",
            Mode::QuickReview => "quick_review",
            Mode::Quiz => "quiz",
            Mode::IncorrectReview => "incorrect_review",
        };
        f.write_str(name)
    }
}

fn validate_user_id(user_id: &str) -> Result<(), validator::ValidationError> {
    if !is_valid_user_id(user_id) {
        return Err(validator::ValidationError::new("invalid_user_id")
            .with_message("user_id must be 1-50 characters without path separators".into()));
    }
    Ok(())
}

// --- Requests ---

/// DTO for `/api/session/init`, also used by requests that only carry a user.
#[derive(Debug, Deserialize, Validate)]
pub struct UserRequest {
    #[validate(custom(function = validate_user_id))]
    pub user_id: String,
}

/// DTO for starting a quick review or a quiz.
#[derive(Debug, Deserialize, Validate)]
pub struct StartRunRequest {
    #[validate(custom(function = validate_user_id))]
    pub user_id: String,

    #[validate(length(min = 1, max = 50))]
    pub course: String,

    /// Chapter keys such as `["0", "3"]`; `"all"` or `"9"` selects every chapter.
    #[validate(length(min = 1))]
    pub chapter_choice: Vec<String>,

    /// `"random"`/`"1"` shuffles, anything else keeps chapter order.
    #[validate(length(min = 1, max = 20))]
    pub order_choice: String,
}

/// DTO for starting a review of the incorrect-answer notebook.
#[derive(Debug, Deserialize, Validate)]
pub struct StartIncorrectReviewRequest {
    #[validate(custom(function = validate_user_id))]
    pub user_id: String,

    #[validate(length(min = 1, max = 50))]
    pub course: String,

    /// Defaults to random.
    #[serde(default)]
    #[validate(length(max = 20))]
    pub order_choice: Option<String>,
}

/// DTO for submitting an answer in quiz or incorrect-review mode.
#[derive(Debug, Deserialize, Validate)]
pub struct SubmitAnswerRequest {
    #[validate(custom(function = validate_user_id))]
    pub user_id: String,

    #[validate(length(min = 1, max = 200))]
    pub quiz_question_id: String,

    #[validate(length(min = 1, max = 50))]
    pub user_answer: String,

    /// Judged by the frontend and trusted as-is.
    #[serde(default)]
    pub was_correct: bool,
}

/// DTO for removing one entry from the incorrect-answer notebook.
#[derive(Debug, Deserialize, Validate)]
pub struct DeleteIncorrectRequest {
    #[validate(custom(function = validate_user_id))]
    pub user_id: String,

    #[validate(length(min = 1, max = 20))]
    pub original_chapter: String,

    #[validate(length(min = 1, max = 50))]
    pub original_question_number: String,

    /// Falls back to the session course, then the default course.
    #[serde(default)]
    #[validate(length(min = 1, max = 50))]
    pub course: Option<String>,
}

/// Query parameters for `/api/session/progress`.
#[derive(Debug, Deserialize, Validate)]
pub struct ProgressParams {
    #[validate(custom(function = validate_user_id))]
    pub user_id: String,
}

// --- Results ---

#[derive(Debug, Clone, Serialize)]
pub struct SessionInitialized {
    pub user_id: String,
    pub is_new_user: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct RunStarted {
    pub mode: Mode,
    pub course: String,
    pub total_questions: usize,
    pub questions: Vec<QuestionOutput>,
    /// Same as `questions[0]`, for step-wise clients.
    pub first_question: Option<QuestionOutput>,
}

#[derive(Debug, Clone, Serialize)]
pub struct Advanced {
    pub question: Option<QuestionOutput>,
    pub completed: bool,
}

#[derive(Debug, Clone, Serialize)]
pub struct AnswerRecorded {
    pub recorded: bool,
    pub next_question: Option<QuestionOutput>,
    pub completed: bool,
}

/// Whether a delete request matched a live notebook entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DeleteOutcome {
    Deleted,
    NotFound,
}

#[derive(Debug, Clone, Serialize)]
pub struct DataCleared {
    pub cleared: bool,
    /// Backup paths the user's documents were renamed to.
    pub archived_files: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
pub struct SessionProgress {
    pub user_id: String,
    pub mode: Mode,
    pub course: Option<String>,
    pub total_questions: usize,
    pub cursor: usize,
    pub completed: bool,
    pub answered_correct: usize,
    pub answered_incorrect: usize,
}
