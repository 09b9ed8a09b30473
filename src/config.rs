// src/config.rs

use std::{
    env,
    path::{Path, PathBuf},
};

use dotenvy::dotenv;

/// Courses served when `QUIZ_COURSES` is unset or unusable.
pub const DEFAULT_COURSES: &str = "maogai:8,xigai:0";

/// Per-user statistics document.
pub const QUESTION_STATS_FILE: &str = "question_stats.json";

/// Per-user deletion history, shared by all courses.
pub const DELETED_INCORRECT_FILE: &str = "deleted_incorrect_questions.json";

/// One course partition of the question bank.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseConfig {
    pub name: String,

    /// Directory holding `<chapter>.json` files.
    pub source_dir: PathBuf,

    /// Chapters `0..=max_chapter_index` make up the course.
    pub max_chapter_index: u32,

    /// Name of this course's incorrect-answer notebook inside a user directory.
    pub incorrect_file: String,
}

impl CourseConfig {
    pub fn new(name: &str, data_dir: &Path, max_chapter_index: u32) -> Self {
        Self {
            name: name.to_string(),
            source_dir: data_dir.join(format!("{}_outputs", name)),
            max_chapter_index,
            incorrect_file: format!("{}_incorrect_questions.json", name),
        }
    }

    pub fn chapter_path(&self, chapter: u32) -> PathBuf {
        self.source_dir.join(format!("{}.json", chapter))
    }
}

#[derive(Debug, Clone)]
pub struct Config {
    pub question_data_dir: PathBuf,
    pub user_data_dir: PathBuf,
    pub courses: Vec<CourseConfig>,
    pub bind_addr: String,
    pub static_dir: Option<PathBuf>,
    pub rust_log: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenv().ok();

        let question_data_dir = PathBuf::from(
            env::var("QUESTION_DATA_DIR").unwrap_or_else(|_| "clean_outputs".to_string()),
        );

        let user_data_dir =
            PathBuf::from(env::var("USER_DATA_DIR").unwrap_or_else(|_| "user_data".to_string()));

        let courses_raw =
            env::var("QUIZ_COURSES").unwrap_or_else(|_| DEFAULT_COURSES.to_string());
        let mut courses = parse_courses(&courses_raw, &question_data_dir);
        if courses.is_empty() {
            tracing::warn!(
                "QUIZ_COURSES={:?} yielded no courses, falling back to {}",
                courses_raw,
                DEFAULT_COURSES
            );
            courses = parse_courses(DEFAULT_COURSES, &question_data_dir);
        }

        let bind_addr = env::var("BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:8888".to_string());

        let static_dir = env::var("STATIC_DIR").ok().map(PathBuf::from);

        let rust_log = env::var("RUST_LOG").unwrap_or_else(|_| "info".to_string());

        Self {
            question_data_dir,
            user_data_dir,
            courses,
            bind_addr,
            static_dir,
            rust_log,
        }
    }
}

/// Parses `name:maxChapter` pairs separated by commas.
/// Malformed entries are skipped with a warning.
pub fn parse_courses(raw: &str, data_dir: &Path) -> Vec<CourseConfig> {
    let mut courses: Vec<CourseConfig> = Vec::new();

    for entry in raw.split(',').map(str::trim).filter(|e| !e.is_empty()) {
        let Some((name, max)) = entry.split_once(':') else {
            tracing::warn!("Ignoring course entry without ':' separator: {:?}", entry);
            continue;
        };
        let name = name.trim();
        let Ok(max_chapter_index) = max.trim().parse::<u32>() else {
            tracing::warn!("Ignoring course entry with bad chapter index: {:?}", entry);
            continue;
        };
        if name.is_empty() || courses.iter().any(|c| c.name == name) {
            tracing::warn!("Ignoring empty or duplicate course name: {:?}", entry);
            continue;
        }
        courses.push(CourseConfig::new(name, data_dir, max_chapter_index));
    }

    courses
}
