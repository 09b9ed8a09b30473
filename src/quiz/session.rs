// src/quiz/session.rs

use std::{
    collections::HashMap,
    sync::{Arc, Mutex, MutexGuard, PoisonError, RwLock},
};

use crate::{
    models::{
        question::QuestionOutput,
        session::{Mode, SessionProgress},
    },
    quiz::error::{QuizError, QuizResult},
};

/// In-memory state of one user's current run.
///
/// Invariant: `cursor <= questions.len()`; `cursor == questions.len()` means
/// the run is complete.
#[derive(Debug, Default)]
pub struct UserSession {
    user_id: String,
    mode: Mode,
    course: Option<String>,
    questions: Vec<QuestionOutput>,
    cursor: usize,
    answered_correct: usize,
    answered_incorrect: usize,
}

impl UserSession {
    pub fn new(user_id: &str) -> Self {
        Self {
            user_id: user_id.to_string(),
            ..Self::default()
        }
    }

    pub fn user_id(&self) -> &str {
        &self.user_id
    }

    pub fn mode(&self) -> Mode {
        self.mode
    }

    pub fn course(&self) -> Option<&str> {
        self.course.as_deref()
    }

    pub fn questions(&self) -> &[QuestionOutput] {
        &self.questions
    }

    pub fn cursor(&self) -> usize {
        self.cursor
    }

    /// Replaces the run: new mode, course and list, cursor back to the start.
    pub fn begin(&mut self, mode: Mode, course: &str, questions: Vec<QuestionOutput>) {
        self.mode = mode;
        self.course = Some(course.to_string());
        self.questions = questions;
        self.cursor = 0;
        self.answered_correct = 0;
        self.answered_incorrect = 0;
    }

    pub fn is_complete(&self) -> bool {
        self.cursor >= self.questions.len()
    }

    pub fn current(&self) -> Option<&QuestionOutput> {
        self.questions.get(self.cursor)
    }

    pub fn require_mode(&self, expected: Mode) -> QuizResult<()> {
        if self.mode != expected {
            return Err(QuizError::InvalidModeForOperation {
                expected,
                actual: self.mode,
            });
        }
        Ok(())
    }

    /// Moves the cursor forward, stopping at the end of the list.
    pub fn advance(&mut self) -> Option<&QuestionOutput> {
        self.cursor = (self.cursor + 1).min(self.questions.len());
        self.current()
    }

    pub fn record_outcome(&mut self, was_correct: bool) {
        if was_correct {
            self.answered_correct += 1;
        } else {
            self.answered_incorrect += 1;
        }
    }

    pub fn progress(&self) -> SessionProgress {
        SessionProgress {
            user_id: self.user_id.clone(),
            mode: self.mode,
            course: self.course.clone(),
            total_questions: self.questions.len(),
            cursor: self.cursor,
            completed: self.mode != Mode::Idle && self.is_complete(),
            answered_correct: self.answered_correct,
            answered_incorrect: self.answered_incorrect,
        }
    }
}

pub type SessionHandle = Arc<Mutex<UserSession>>;

/// Locks a session. A poisoned lock is recovered: every mutation leaves the
/// session consistent before anything that can panic.
pub fn lock_session(handle: &SessionHandle) -> MutexGuard<'_, UserSession> {
    handle.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Map from user id to session.
/// Lookups share a read lock; insertion and removal take the write lock.
#[derive(Debug, Default)]
pub struct SessionRegistry {
    sessions: RwLock<HashMap<String, SessionHandle>>,
}

impl SessionRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, user_id: &str) -> Option<SessionHandle> {
        self.sessions
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(user_id)
            .cloned()
    }

    /// Returns the user's session, creating it on first reference.
    /// The second lookup under the write lock keeps racing callers on one session.
    pub fn get_or_create(&self, user_id: &str) -> SessionHandle {
        if let Some(session) = self.get(user_id) {
            return session;
        }

        let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
        sessions
            .entry(user_id.to_string())
            .or_insert_with(|| {
                tracing::debug!("Created session for user {}", user_id);
                Arc::new(Mutex::new(UserSession::new(user_id)))
            })
            .clone()
    }

    /// Evicts a session. Returns whether one existed.
    pub fn remove(&self, user_id: &str) -> bool {
        self.sessions
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(user_id)
            .is_some()
    }

    fn is_current(&self, user_id: &str, handle: &SessionHandle) -> bool {
        self.get(user_id).is_some_and(|live| Arc::ptr_eq(&live, handle))
    }

    /// Runs `f` on the user's session under its lock, creating the session if needed.
    /// A handle evicted while this call waited for its lock is dropped and the lookup retried.
    pub fn with_session<T>(&self, user_id: &str, f: impl FnOnce(&mut UserSession) -> T) -> T {
        loop {
            let handle = self.get_or_create(user_id);
            let mut session = lock_session(&handle);
            if self.is_current(user_id, &handle) {
                return f(&mut *session);
            }
        }
    }

    /// Like [`with_session`](Self::with_session), but returns `None` instead of
    /// creating a session.
    pub fn with_existing<T>(&self, user_id: &str, f: impl FnOnce(&mut UserSession) -> T) -> Option<T> {
        loop {
            let handle = self.get(user_id)?;
            let mut session = lock_session(&handle);
            if self.is_current(user_id, &handle) {
                return Some(f(&mut *session));
            }
        }
    }

    /// Runs `f` under the user's session lock and, if it succeeds, evicts the
    /// session before releasing the lock.
    pub fn evict_with<T, E>(
        &self,
        user_id: &str,
        f: impl FnOnce(&mut UserSession) -> Result<T, E>,
    ) -> Result<T, E> {
        loop {
            let handle = self.get_or_create(user_id);
            let mut session = lock_session(&handle);
            if !self.is_current(user_id, &handle) {
                continue;
            }

            let out = f(&mut *session)?;
            let mut sessions = self.sessions.write().unwrap_or_else(PoisonError::into_inner);
            if sessions.get(user_id).is_some_and(|live| Arc::ptr_eq(live, &handle)) {
                sessions.remove(user_id);
            }
            return Ok(out);
        }
    }

    pub fn len(&self) -> usize {
        self.sessions.read().unwrap_or_else(PoisonError::into_inner).len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}
