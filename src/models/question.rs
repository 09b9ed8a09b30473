// src/models/question.rs

use std::{collections::BTreeMap, fmt, sync::LazyLock};

use regex::Regex;
use serde::{Deserialize, Serialize, Serializer};

/// A question as stored in a chapter file.
/// The `#[serde(skip)]` fields are stamped by the loader.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Question {
    /// Question number from the source material.
    pub question_number: String,

    /// e.g. "单选题" (single choice) or "多选题" (multiple choice).
    pub question_type: String,

    pub question_text: String,

    /// Option label -> option text.
    #[serde(default)]
    pub options: BTreeMap<String, String>,

    /// A single letter or a concatenation of letters ("ABD").
    pub correct_answer: String,

    #[serde(rename = "correct_count", default)]
    pub global_correct_count: u32,

    #[serde(rename = "error_count", default)]
    pub global_error_count: u32,

    #[serde(skip)]
    pub course: String,

    #[serde(skip)]
    pub original_chapter: u32,

    /// Zero-based position inside the chapter file.
    #[serde(skip)]
    pub original_index: usize,
}

impl Question {
    pub fn key(&self) -> QuestionKey {
        QuestionKey {
            course: self.course.clone(),
            chapter: self.original_chapter,
            index: self.original_index,
        }
    }

    pub fn chapter_key(&self) -> String {
        self.original_chapter.to_string()
    }

    /// Key of this question inside a user's statistics document.
    pub fn stat_key(&self) -> String {
        format!("{}_{}", self.original_chapter, self.question_number)
    }
}

/// Canonical identity of a loaded question: course, chapter and position in file.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct QuestionKey {
    pub course: String,
    pub chapter: u32,
    pub index: usize,
}

impl fmt::Display for QuestionKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}_{}_{}", self.course, self.chapter, self.index)
    }
}

static QUIZ_ID_RE: LazyLock<Regex> =
    LazyLock::new(|| Regex::new(r"^quiz_(.+)_(\d+)_(\d+)$").expect("static regex"));

/// Client-facing question identifier.
/// Only the string form crosses the wire.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum QuizQuestionId {
    /// `quiz_<course>_<chapter>_<index>`, reversible to a [`QuestionKey`].
    Quiz(QuestionKey),

    /// `incorrect_<course>_<chapter>_<number>_<listIndex>`.
    /// Embeds the position in the review list, so it is not stable across reviews.
    Incorrect {
        course: String,
        chapter: String,
        question_number: String,
        list_index: usize,
    },
}

impl QuizQuestionId {
    /// Recovers the question key from a `quiz_` identifier.
    /// Course names may contain `_`; chapter and index are the last two segments.
    pub fn parse_quiz(raw: &str) -> Option<QuestionKey> {
        let caps = QUIZ_ID_RE.captures(raw)?;
        Some(QuestionKey {
            course: caps[1].to_string(),
            chapter: caps[2].parse().ok()?,
            index: caps[3].parse().ok()?,
        })
    }
}

impl fmt::Display for QuizQuestionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            QuizQuestionId::Quiz(key) => write!(f, "quiz_{}", key),
            QuizQuestionId::Incorrect {
                course,
                chapter,
                question_number,
                list_index,
            } => write!(
                f,
                "incorrect_{}_{}_{}_{}",
                course, chapter, question_number, list_index
            ),
        }
    }
}

impl Serialize for QuizQuestionId {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

/// DTO for sending a question to the client.
/// Always carries the correct answer; the frontend hides it until submission.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct QuestionOutput {
    pub quiz_question_id: QuizQuestionId,

    /// 1-based position within the current list.
    pub display_number: usize,

    pub original_chapter: String,
    pub original_question_number: String,
    pub question_type: String,
    pub question_text: String,
    pub options: BTreeMap<String, String>,
    pub correct_answer: String,
}
