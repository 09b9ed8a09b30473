// src/models/user_data.rs

use std::collections::{BTreeMap, HashMap};

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::models::question::Question;

/// Per-question answer statistics for one user.
/// Keyed by `<chapter>_<question_number>` inside `question_stats.json`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserQuestionStat {
    pub original_chapter_key: String,
    pub original_question_number: String,
    pub correct_count: u32,
    pub error_count: u32,
    pub last_answered: DateTime<Utc>,
}

/// The whole statistics document.
pub type QuestionStats = HashMap<String, UserQuestionStat>;

/// A missed question snapshotted into the user's notebook.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserIncorrectQuestion {
    pub question_number: String,
    pub question_type: String,
    pub question_text: String,
    #[serde(default)]
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
    pub original_chapter: String,

    /// Answer the user gave when the miss was recorded.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub user_answer: Option<String>,

    /// When the miss was recorded.
    pub timestamp: DateTime<Utc>,

    /// Set only on entries in the deletion history.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,

    /// Course the entry belonged to; absent in older documents.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub course: Option<String>,
}

impl UserIncorrectQuestion {
    pub fn from_question(question: &Question, user_answer: &str, now: DateTime<Utc>) -> Self {
        Self {
            question_number: question.question_number.clone(),
            question_type: question.question_type.clone(),
            question_text: question.question_text.clone(),
            options: question.options.clone(),
            correct_answer: question.correct_answer.clone(),
            original_chapter: question.chapter_key(),
            user_answer: Some(user_answer.to_string()),
            timestamp: now,
            deleted_at: None,
            course: Some(question.course.clone()),
        }
    }

    /// Two entries describe the same miss when text and chapter match.
    pub fn same_question(&self, other: &UserIncorrectQuestion) -> bool {
        self.question_text == other.question_text && self.original_chapter == other.original_chapter
    }
}
