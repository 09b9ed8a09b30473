// src/quiz/bank.rs

use std::{collections::HashMap, fs, path::Path};

use crate::{
    config::CourseConfig,
    models::question::{Question, QuestionKey},
};

/// Read-only access to the loaded question corpus.
pub trait QuestionRepository: Send + Sync {
    fn course(&self, name: &str) -> Option<&CourseBank>;

    /// Resolves a canonical key back to the question it was built from.
    fn get(&self, key: &QuestionKey) -> Option<&Question>;
}

/// Chapters `0..=max_chapter_index` of one course, in file order.
#[derive(Debug, Clone, Default)]
pub struct CourseBank {
    chapters: Vec<Vec<Question>>,
}

impl CourseBank {
    pub fn max_chapter_index(&self) -> Option<u32> {
        self.chapters.len().checked_sub(1).map(|i| i as u32)
    }

    pub fn chapter(&self, chapter: u32) -> Option<&[Question]> {
        self.chapters.get(chapter as usize).map(Vec::as_slice)
    }

    pub fn chapter_count(&self) -> usize {
        self.chapters.len()
    }

    pub fn question_count(&self) -> usize {
        self.chapters.iter().map(Vec::len).sum()
    }
}

/// In-memory question bank, loaded once before the server accepts traffic.
#[derive(Debug, Clone, Default)]
pub struct QuestionBank {
    courses: HashMap<String, CourseBank>,
}

impl QuestionBank {
    /// Loads every configured course from disk.
    ///
    /// A missing or malformed chapter file is logged and loaded as an empty
    /// chapter, so the service can still start.
    pub fn load(courses: &[CourseConfig]) -> Self {
        tracing::info!("Loading question bank for {} course(s)...", courses.len());

        let mut bank = Self::default();
        for course in courses {
            let chapters = (0..=course.max_chapter_index)
                .map(|chapter| load_chapter(&course.chapter_path(chapter), &course.name, chapter))
                .collect();
            bank.insert_course(&course.name, chapters);
        }

        tracing::info!("Question bank loaded: {} questions", bank.question_count());
        bank
    }

    /// Builds a bank from in-memory chapters; chapter `i` is `chapters[i]`.
    pub fn from_chapters<I, S>(courses: I) -> Self
    where
        I: IntoIterator<Item = (S, Vec<Vec<Question>>)>,
        S: AsRef<str>,
    {
        let mut bank = Self::default();
        for (name, chapters) in courses {
            bank.insert_course(name.as_ref(), chapters);
        }
        bank
    }

    fn insert_course(&mut self, name: &str, mut chapters: Vec<Vec<Question>>) {
        for (chapter, questions) in chapters.iter_mut().enumerate() {
            for (index, question) in questions.iter_mut().enumerate() {
                question.course = name.to_string();
                question.original_chapter = chapter as u32;
                question.original_index = index;
            }
        }
        self.courses.insert(name.to_string(), CourseBank { chapters });
    }

    pub fn question_count(&self) -> usize {
        self.courses.values().map(CourseBank::question_count).sum()
    }
}

impl QuestionRepository for QuestionBank {
    fn course(&self, name: &str) -> Option<&CourseBank> {
        self.courses.get(name)
    }

    fn get(&self, key: &QuestionKey) -> Option<&Question> {
        self.courses
            .get(&key.course)?
            .chapter(key.chapter)?
            .get(key.index)
    }
}

fn load_chapter(path: &Path, course: &str, chapter: u32) -> Vec<Question> {
    let data = match fs::read_to_string(path) {
        Ok(data) => data,
        Err(e) => {
            tracing::warn!(
                "Chapter {} of {} not loaded, file {:?} unreadable: {}",
                chapter,
                course,
                path,
                e
            );
            return Vec::new();
        }
    };

    match serde_json::from_str::<Vec<Question>>(&data) {
        Ok(questions) => {
            tracing::info!("Loaded {} questions for {} chapter {}", questions.len(), course, chapter);
            questions
        }
        Err(e) => {
            tracing::error!(
                "Failed to parse chapter {} of {} from {:?}: {}",
                chapter,
                course,
                path,
                e
            );
            Vec::new()
        }
    }
}
