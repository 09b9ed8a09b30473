// src/quiz/selector.rs

use std::collections::BTreeSet;

use rand::{Rng, seq::SliceRandom};

use crate::{models::question::Question, quiz::bank::CourseBank};

/// How the selected questions are ordered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OrderChoice {
    /// Chapter ascending, then file order.
    Sequential,
    /// Uniform shuffle of the whole selection.
    Random,
}

impl OrderChoice {
    /// `"random"` and `"1"` shuffle; every other value is sequential.
    pub fn parse(raw: &str) -> Self {
        match raw {
            "random" | "1" => OrderChoice::Random,
            _ => OrderChoice::Sequential,
        }
    }
}

fn selects_all(choice: &str) -> bool {
    choice.eq_ignore_ascii_case("all") || choice == "9"
}

/// Resolves chapter choices to chapter numbers in ascending order.
///
/// `"all"` (any case) or `"9"` anywhere in the list selects every chapter.
/// Non-numeric and out-of-range choices are skipped with a warning.
pub fn resolve_chapters(course_name: &str, course: &CourseBank, choices: &[String]) -> Vec<u32> {
    let Some(max) = course.max_chapter_index() else {
        return Vec::new();
    };

    if choices.iter().any(|c| selects_all(c.trim())) {
        return (0..=max).collect();
    }

    let mut chapters = BTreeSet::new();
    for choice in choices {
        match choice.trim().parse::<u32>() {
            Ok(chapter) if chapter <= max => {
                chapters.insert(chapter);
            }
            Ok(chapter) => {
                tracing::warn!("Chapter {} does not exist in {}, skipped", chapter, course_name);
            }
            Err(_) => {
                tracing::warn!("Invalid chapter choice {:?} for {}, skipped", choice, course_name);
            }
        }
    }
    chapters.into_iter().collect()
}

/// Picks the questions of the chosen chapters, shuffled if requested.
/// An empty result is a valid outcome, not an error.
pub fn select<'a, R>(
    course_name: &str,
    course: &'a CourseBank,
    choices: &[String],
    order: OrderChoice,
    rng: &mut R,
) -> Vec<&'a Question>
where
    R: Rng + ?Sized,
{
    let mut questions: Vec<&Question> = resolve_chapters(course_name, course, choices)
        .into_iter()
        .filter_map(|chapter| course.chapter(chapter))
        .flatten()
        .collect();

    if order == OrderChoice::Random {
        questions.shuffle(rng);
    }
    questions
}
