// src/quiz/engine.rs

use std::sync::Arc;

use chrono::Utc;
use rand::seq::SliceRandom;

use crate::{
    config::CourseConfig,
    models::{
        question::{QuestionOutput, QuizQuestionId},
        session::{
            Advanced, AnswerRecorded, DataCleared, DeleteOutcome, Mode, RunStarted,
            SessionInitialized, SessionProgress,
        },
        user_data::UserIncorrectQuestion,
    },
    quiz::{
        bank::QuestionRepository,
        encoder,
        error::{QuizError, QuizResult},
        selector::{self, OrderChoice},
        session::SessionRegistry,
        store::{UserStore, is_valid_user_id},
    },
};

/// Transport-independent quiz service.
///
/// Owns the session registry and routes every per-user file access through
/// that user's session lock, so operations on one user run one at a time while
/// different users never contend.
pub struct QuizEngine {
    bank: Arc<dyn QuestionRepository>,
    store: UserStore,
    courses: Vec<CourseConfig>,
    sessions: SessionRegistry,
}

impl QuizEngine {
    pub fn new(bank: Arc<dyn QuestionRepository>, store: UserStore, courses: Vec<CourseConfig>) -> Self {
        Self {
            bank,
            store,
            courses,
            sessions: SessionRegistry::new(),
        }
    }

    pub fn sessions(&self) -> &SessionRegistry {
        &self.sessions
    }

    pub fn store(&self) -> &UserStore {
        &self.store
    }

    fn course_config(&self, course: &str) -> QuizResult<&CourseConfig> {
        self.courses
            .iter()
            .find(|c| c.name == course)
            .ok_or_else(|| QuizError::UnknownCourse(course.to_string()))
    }

    fn check_user(user_id: &str) -> QuizResult<()> {
        if !is_valid_user_id(user_id) {
            return Err(QuizError::Validation(format!("invalid user_id {:?}", user_id)));
        }
        Ok(())
    }

    /// Registers the user, creating their data directory on first contact.
    pub fn init_session(&self, user_id: &str) -> QuizResult<SessionInitialized> {
        Self::check_user(user_id)?;

        let is_new_user = !self.store.user_exists(user_id)?;
        if is_new_user {
            self.store.ensure_user_dir(user_id)?;
            tracing::info!("New user {} initialized", user_id);
        }

        let user_id = self
            .sessions
            .with_session(user_id, |session| session.user_id().to_string());

        Ok(SessionInitialized {
            user_id,
            is_new_user,
        })
    }

    /// Starts a quick review or a quiz over the chosen chapters of `course`.
    pub fn start_run(
        &self,
        mode: Mode,
        user_id: &str,
        course: &str,
        chapter_choices: &[String],
        order_choice: &str,
    ) -> QuizResult<RunStarted> {
        Self::check_user(user_id)?;
        if !matches!(mode, Mode::QuickReview | Mode::Quiz) {
            return Err(QuizError::Validation(format!(
                "cannot start a {} run from the question bank",
                mode
            )));
        }
        let course_bank = self
            .bank
            .course(course)
            .ok_or_else(|| QuizError::UnknownCourse(course.to_string()))?;

        let order = OrderChoice::parse(order_choice);
        let selected = selector::select(
            course,
            course_bank,
            chapter_choices,
            order,
            &mut rand::thread_rng(),
        );
        let questions = encoder::to_output(&selected, 0, course);

        tracing::info!(
            "User {} started {} on {}, chapters {:?}, order {:?}: {} questions",
            user_id,
            mode,
            course,
            chapter_choices,
            order,
            questions.len()
        );

        self.sessions
            .with_session(user_id, |session| session.begin(mode, course, questions.clone()));
        Ok(run_started(mode, course, questions))
    }

    /// Starts a review of the user's notebook for `course`.
    /// Order defaults to random; `"sequential"`/`"0"` keeps notebook order.
    pub fn start_incorrect_review(
        &self,
        user_id: &str,
        course: &str,
        order_choice: Option<&str>,
    ) -> QuizResult<RunStarted> {
        Self::check_user(user_id)?;
        let course_config = self.course_config(course)?;

        self.sessions.with_session(user_id, |session| -> QuizResult<_> {
            let mut entries = self
                .store
                .load_incorrect(user_id, &course_config.incorrect_file)?;
            let order = order_choice.map_or(OrderChoice::Random, OrderChoice::parse);
            if order == OrderChoice::Random {
                entries.shuffle(&mut rand::thread_rng());
            }
            let questions = encoder::incorrect_to_output(&entries, 0, course);

            tracing::info!(
                "User {} started incorrect review on {}: {} questions",
                user_id,
                course,
                questions.len()
            );

            session.begin(Mode::IncorrectReview, course, questions.clone());
            Ok(run_started(Mode::IncorrectReview, course, questions))
        })
    }

    /// Steps to the next question of a quick review.
    pub fn advance(&self, user_id: &str) -> QuizResult<Advanced> {
        Self::check_user(user_id)?;
        self.sessions
            .with_existing(user_id, |session| -> QuizResult<_> {
                session.require_mode(Mode::QuickReview)?;

                let question = session.advance().cloned();
                if question.is_none() {
                    tracing::info!("User {} completed quick review", user_id);
                }

                Ok(Advanced {
                    completed: question.is_none(),
                    question,
                })
            })
            .ok_or_else(|| QuizError::SessionNotFound(user_id.to_string()))?
    }

    /// Records a quiz answer judged by the client.
    ///
    /// Updates the statistics document and, on a miss, the course notebook
    /// (at most one live entry per question). The two writes are separate:
    /// a crash between them leaves the statistics ahead of the notebook.
    pub fn submit_answer(
        &self,
        user_id: &str,
        quiz_question_id: &str,
        user_answer: &str,
        was_correct: bool,
    ) -> QuizResult<AnswerRecorded> {
        Self::check_user(user_id)?;
        let key = QuizQuestionId::parse_quiz(quiz_question_id)
            .ok_or_else(|| QuizError::InvalidQuestionId(quiz_question_id.to_string()))?;
        let question = self
            .bank
            .get(&key)
            .ok_or_else(|| QuizError::UnknownQuestionId(quiz_question_id.to_string()))?;

        self.sessions.with_session(user_id, |session| -> QuizResult<_> {
            let course = session
                .course()
                .ok_or(QuizError::MissingCourseContext)?
                .to_string();
            session.require_mode(Mode::Quiz)?;
            if key.course != course {
                return Err(QuizError::Validation(format!(
                    "question {} is not part of the active course {}",
                    quiz_question_id, course
                )));
            }
            let course_config = self.course_config(&course)?;

            let now = Utc::now();
            let stat = self.store.record_stat(user_id, question, was_correct, now)?;

            if !was_correct {
                let entry = UserIncorrectQuestion::from_question(question, user_answer, now);
                let added = self
                    .store
                    .append_incorrect(user_id, &course_config.incorrect_file, entry)?;
                if added {
                    tracing::info!(
                        "Question {} (chapter {}) added to {}'s {} notebook",
                        question.question_number,
                        question.original_chapter,
                        user_id,
                        course
                    );
                } else {
                    tracing::debug!(
                        "Question {} (chapter {}) already in {}'s {} notebook",
                        question.question_number,
                        question.original_chapter,
                        user_id,
                        course
                    );
                }
            }

            session.record_outcome(was_correct);
            let submitted = QuizQuestionId::Quiz(key);
            if session.current().is_some_and(|q| q.quiz_question_id == submitted) {
                session.advance();
            }

            tracing::info!(
                "User {} answered {} with {:?}, correct: {} (correct {} / error {})",
                user_id,
                quiz_question_id,
                user_answer,
                was_correct,
                stat.correct_count,
                stat.error_count
            );

            Ok(AnswerRecorded {
                recorded: true,
                next_question: session.current().cloned(),
                completed: session.is_complete(),
            })
        })
    }

    /// Accepts an answer given during incorrect review and steps the cursor.
    /// Statistics and the notebook are left as they are.
    pub fn submit_review_answer(
        &self,
        user_id: &str,
        quiz_question_id: &str,
        user_answer: &str,
        was_correct: bool,
    ) -> QuizResult<AnswerRecorded> {
        Self::check_user(user_id)?;
        self.sessions.with_session(user_id, |session| -> QuizResult<_> {
            session.require_mode(Mode::IncorrectReview)?;

            tracing::info!(
                "User {} reviewed {} with {:?}, correct: {}",
                user_id,
                quiz_question_id,
                user_answer,
                was_correct
            );

            session.record_outcome(was_correct);
            if session
                .current()
                .is_some_and(|q| q.quiz_question_id.to_string() == quiz_question_id)
            {
                session.advance();
            }
            if session.is_complete() {
                tracing::info!("User {} completed incorrect review", user_id);
            }

            Ok(AnswerRecorded {
                recorded: true,
                next_question: session.current().cloned(),
                completed: session.is_complete(),
            })
        })
    }

    /// Removes a question from a notebook and appends it to the deletion history.
    ///
    /// The notebook is `course` if given, else the session's course, else the
    /// first configured course.
    pub fn delete_incorrect(
        &self,
        user_id: &str,
        course: Option<&str>,
        chapter: &str,
        question_number: &str,
    ) -> QuizResult<DeleteOutcome> {
        Self::check_user(user_id)?;
        self.sessions.with_session(user_id, |session| -> QuizResult<_> {
            let course_config = match course.or(session.course()) {
                Some(name) => self.course_config(name)?,
                None => self
                    .courses
                    .first()
                    .ok_or_else(|| QuizError::UnknownCourse(String::new()))?,
            };

            let removed = self.store.delete_incorrect(
                user_id,
                &course_config.incorrect_file,
                chapter,
                question_number,
                Utc::now(),
            )?;

            match removed {
                Some(_) => {
                    tracing::info!(
                        "User {} deleted question {} (chapter {}) from {} notebook",
                        user_id,
                        question_number,
                        chapter,
                        course_config.name
                    );
                    Ok(DeleteOutcome::Deleted)
                }
                None => {
                    tracing::warn!(
                        "User {} asked to delete question {} (chapter {}) not in {} notebook",
                        user_id,
                        question_number,
                        chapter,
                        course_config.name
                    );
                    Ok(DeleteOutcome::NotFound)
                }
            }
        })
    }

    /// Archives the user's notebooks and statistics, then evicts the session.
    pub fn clear_user_data(&self, user_id: &str) -> QuizResult<DataCleared> {
        Self::check_user(user_id)?;
        let incorrect_files: Vec<&str> = self
            .courses
            .iter()
            .map(|c| c.incorrect_file.as_str())
            .collect();

        let archived = self
            .sessions
            .evict_with(user_id, |_| self.store.clear(user_id, &incorrect_files, Utc::now()))?;

        tracing::info!(
            "Cleared data of user {} ({} file(s) archived)",
            user_id,
            archived.len()
        );

        Ok(DataCleared {
            cleared: true,
            archived_files: archived.iter().map(|p| p.display().to_string()).collect(),
        })
    }

    /// Progress of the user's current run. Does not create a session.
    pub fn progress(&self, user_id: &str) -> QuizResult<SessionProgress> {
        Self::check_user(user_id)?;
        self.sessions
            .with_existing(user_id, |session| session.progress())
            .ok_or_else(|| QuizError::SessionNotFound(user_id.to_string()))
    }
}

fn run_started(mode: Mode, course: &str, questions: Vec<QuestionOutput>) -> RunStarted {
    RunStarted {
        mode,
        course: course.to_string(),
        total_questions: questions.len(),
        first_question: questions.first().cloned(),
        questions,
    }
}
