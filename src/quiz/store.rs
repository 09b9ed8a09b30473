// src/quiz/store.rs

//! Durable per-user JSON documents.
//!
//! Layout under the store root:
//!
//! ```text
//! <root>/<user_id>/question_stats.json
//! <root>/<user_id>/<course>_incorrect_questions.json
//! <root>/<user_id>/deleted_incorrect_questions.json
//! ```
//!
//! Every access reads the whole document, mutates it and writes it back.
//! Callers serialize access per user by holding that user's session lock.

use std::{
    fs, io,
    path::{Path, PathBuf},
};

use chrono::{DateTime, Utc};
use serde::{Serialize, de::DeserializeOwned};

use crate::{
    config::{DELETED_INCORRECT_FILE, QUESTION_STATS_FILE},
    models::{
        question::Question,
        user_data::{QuestionStats, UserIncorrectQuestion, UserQuestionStat},
    },
    quiz::error::StoreError,
};

const MAX_USER_ID_LEN: usize = 50;

/// User ids become directory names, so they must stay inside the store root.
pub fn is_valid_user_id(user_id: &str) -> bool {
    !user_id.is_empty()
        && user_id.chars().count() <= MAX_USER_ID_LEN
        && !user_id.contains(['/', '\\', '\0'])
        && !user_id.contains("..")
        && user_id != "."
}

#[derive(Debug, Clone)]
pub struct UserStore {
    root: PathBuf,
}

impl UserStore {
    /// Opens the store, creating the root directory if needed.
    pub fn open(root: impl Into<PathBuf>) -> Result<Self, StoreError> {
        let root = root.into();
        fs::create_dir_all(&root).map_err(|e| StoreError::io(&root, e))?;
        Ok(Self { root })
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    pub fn user_dir(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        if !is_valid_user_id(user_id) {
            return Err(StoreError::InvalidUserId(user_id.to_string()));
        }
        Ok(self.root.join(user_id))
    }

    pub fn user_path(&self, user_id: &str, file_name: &str) -> Result<PathBuf, StoreError> {
        Ok(self.user_dir(user_id)?.join(file_name))
    }

    pub fn user_exists(&self, user_id: &str) -> Result<bool, StoreError> {
        let dir = self.user_dir(user_id)?;
        match fs::metadata(&dir) {
            Ok(meta) => Ok(meta.is_dir()),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(false),
            Err(e) => Err(StoreError::io(dir, e)),
        }
    }

    pub fn ensure_user_dir(&self, user_id: &str) -> Result<PathBuf, StoreError> {
        let dir = self.user_dir(user_id)?;
        fs::create_dir_all(&dir).map_err(|e| StoreError::io(&dir, e))?;
        Ok(dir)
    }

    /// Loads a document, yielding `T::default()` when the file is absent or empty.
    pub fn load<T>(&self, user_id: &str, file_name: &str) -> Result<T, StoreError>
    where
        T: DeserializeOwned + Default,
    {
        let path = self.user_path(user_id, file_name)?;
        let data = match fs::read(&path) {
            Ok(data) => data,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(T::default()),
            Err(e) => return Err(StoreError::io(path, e)),
        };

        if data.iter().all(u8::is_ascii_whitespace) {
            return Ok(T::default());
        }

        serde_json::from_slice(&data).map_err(|source| StoreError::CorruptUserData { path, source })
    }

    /// Overwrites a document with pretty-printed JSON.
    /// The new content is written to a sibling file and renamed into place.
    pub fn save<T>(&self, user_id: &str, file_name: &str, value: &T) -> Result<(), StoreError>
    where
        T: Serialize + ?Sized,
    {
        let dir = self.ensure_user_dir(user_id)?;
        let path = dir.join(file_name);
        let tmp_path = dir.join(format!(".{}.tmp", file_name));

        let json = serde_json::to_vec_pretty(value)?;
        fs::write(&tmp_path, json).map_err(|e| StoreError::io(&tmp_path, e))?;
        fs::rename(&tmp_path, &path).map_err(|e| StoreError::io(&path, e))?;
        Ok(())
    }

    pub fn load_stats(&self, user_id: &str) -> Result<QuestionStats, StoreError> {
        self.load(user_id, QUESTION_STATS_FILE)
    }

    /// Bumps the correct or error counter of `question` and stamps the answer time.
    pub fn record_stat(
        &self,
        user_id: &str,
        question: &Question,
        was_correct: bool,
        now: DateTime<Utc>,
    ) -> Result<UserQuestionStat, StoreError> {
        let mut stats = self.load_stats(user_id)?;

        let entry = stats
            .entry(question.stat_key())
            .or_insert_with(|| UserQuestionStat {
                original_chapter_key: question.chapter_key(),
                original_question_number: question.question_number.clone(),
                correct_count: 0,
                error_count: 0,
                last_answered: now,
            });
        if was_correct {
            entry.correct_count += 1;
        } else {
            entry.error_count += 1;
        }
        entry.last_answered = now;
        let updated = entry.clone();

        self.save(user_id, QUESTION_STATS_FILE, &stats)?;
        Ok(updated)
    }

    pub fn load_incorrect(
        &self,
        user_id: &str,
        file_name: &str,
    ) -> Result<Vec<UserIncorrectQuestion>, StoreError> {
        self.load(user_id, file_name)
    }

    pub fn load_deleted(&self, user_id: &str) -> Result<Vec<UserIncorrectQuestion>, StoreError> {
        self.load(user_id, DELETED_INCORRECT_FILE)
    }

    /// Appends `entry` unless the notebook already holds the same question.
    /// Returns whether the entry was added; an existing entry is left untouched.
    pub fn append_incorrect(
        &self,
        user_id: &str,
        file_name: &str,
        entry: UserIncorrectQuestion,
    ) -> Result<bool, StoreError> {
        let mut notebook = self.load_incorrect(user_id, file_name)?;

        if notebook.iter().any(|existing| existing.same_question(&entry)) {
            return Ok(false);
        }

        notebook.push(entry);
        self.save(user_id, file_name, &notebook)?;
        Ok(true)
    }

    /// Removes the notebook entry for `(chapter, question_number)`.
    ///
    /// The removed entry is stamped with `now` and appended to the deletion
    /// history. Writing the history is best-effort: a failure there is logged
    /// and does not fail the deletion. Returns `None` when nothing matched.
    pub fn delete_incorrect(
        &self,
        user_id: &str,
        file_name: &str,
        chapter: &str,
        question_number: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<UserIncorrectQuestion>, StoreError> {
        let mut notebook = self.load_incorrect(user_id, file_name)?;

        let Some(pos) = notebook
            .iter()
            .position(|iq| iq.original_chapter == chapter && iq.question_number == question_number)
        else {
            return Ok(None);
        };

        let mut removed = notebook.remove(pos);
        self.save(user_id, file_name, &notebook)?;

        removed.deleted_at = Some(now);
        if let Err(e) = self.append_deleted(user_id, removed.clone()) {
            tracing::warn!(
                "Failed to record deletion history for user {}: {}",
                user_id,
                e
            );
        }

        Ok(Some(removed))
    }

    fn append_deleted(&self, user_id: &str, entry: UserIncorrectQuestion) -> Result<(), StoreError> {
        let mut history = self.load_deleted(user_id)?;
        history.push(entry);
        self.save(user_id, DELETED_INCORRECT_FILE, &history)
    }

    /// Renames one document to `<name>.<timestamp>.bak`.
    /// Returns `None` if the document does not exist.
    pub fn archive(
        &self,
        user_id: &str,
        file_name: &str,
        now: DateTime<Utc>,
    ) -> Result<Option<PathBuf>, StoreError> {
        let path = self.user_path(user_id, file_name)?;
        match fs::metadata(&path) {
            Ok(_) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(StoreError::io(path, e)),
        }

        let stamp = now.format("%Y_%m_%d_%H_%M_%S");
        let mut backup = path.with_file_name(format!("{}.{}.bak", file_name, stamp));
        let mut attempt = 1;
        while backup.exists() {
            backup = path.with_file_name(format!("{}.{}_{}.bak", file_name, stamp, attempt));
            attempt += 1;
        }

        fs::rename(&path, &backup).map_err(|e| StoreError::io(&path, e))?;
        Ok(Some(backup))
    }

    /// Soft-deletes a user's notebooks and statistics by renaming them to backups.
    ///
    /// Notebook rename failures are logged and skipped; a statistics rename
    /// failure is returned. The deletion history is kept as is.
    pub fn clear(
        &self,
        user_id: &str,
        incorrect_files: &[&str],
        now: DateTime<Utc>,
    ) -> Result<Vec<PathBuf>, StoreError> {
        let mut archived = Vec::new();

        for file_name in incorrect_files {
            match self.archive(user_id, file_name, now) {
                Ok(Some(backup)) => {
                    tracing::info!("Archived {} for user {} to {:?}", file_name, user_id, backup);
                    archived.push(backup);
                }
                Ok(None) => {}
                Err(e) => {
                    tracing::error!("Failed to archive {} for user {}: {}", file_name, user_id, e)
                }
            }
        }

        if let Some(backup) = self.archive(user_id, QUESTION_STATS_FILE, now)? {
            tracing::info!("Archived statistics for user {} to {:?}", user_id, backup);
            archived.push(backup);
        }

        Ok(archived)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn question(chapter: u32, index: usize, number: &str, text: &str) -> Question {
        Question {
            question_number: number.to_string(),
            question_type: "单选题".to_string(),
            question_text: text.to_string(),
            options: [("A".to_string(), "yes".to_string()), ("B".to_string(), "no".to_string())]
                .into_iter()
                .collect(),
            correct_answer: "A".to_string(),
            global_correct_count: 0,
            global_error_count: 0,
            course: "c1".to_string(),
            original_chapter: chapter,
            original_index: index,
        }
    }

    fn at(secs: i64) -> DateTime<Utc> {
        Utc.timestamp_opt(1_700_000_000 + secs, 0).unwrap()
    }

    fn store() -> (tempfile::TempDir, UserStore) {
        let dir = tempfile::tempdir().unwrap();
        let store = UserStore::open(dir.path().join("user_data")).unwrap();
        (dir, store)
    }

    #[test]
    fn missing_or_empty_documents_load_as_default() {
        let (_dir, store) = store();
        let stats = store.load_stats("alice").unwrap();
        assert!(stats.is_empty());
        assert!(!store.user_exists("alice").unwrap());

        store.ensure_user_dir("alice").unwrap();
        fs::write(store.user_path("alice", QUESTION_STATS_FILE).unwrap(), "").unwrap();
        assert!(store.load_stats("alice").unwrap().is_empty());
    }

    #[test]
    fn malformed_document_is_corrupt_user_data() {
        let (_dir, store) = store();
        store.ensure_user_dir("alice").unwrap();
        fs::write(store.user_path("alice", "c1_incorrect_questions.json").unwrap(), "{not json").unwrap();

        let err = store.load_incorrect("alice", "c1_incorrect_questions.json").unwrap_err();
        assert!(matches!(err, StoreError::CorruptUserData { .. }), "{err:?}");
    }

    #[test]
    fn rejects_path_escaping_user_ids() {
        let (_dir, store) = store();
        assert!(matches!(store.user_dir("../x"), Err(StoreError::InvalidUserId(_))));
        assert!(matches!(store.save("a/b", "f.json", &1), Err(StoreError::InvalidUserId(_))));
    }

    #[test]
    fn save_pretty_prints_and_leaves_no_temp_file() {
        let (_dir, store) = store();
        store.save("alice", "doc.json", &vec![1, 2]).unwrap();

        let dir = store.user_dir("alice").unwrap();
        let text = fs::read_to_string(dir.join("doc.json")).unwrap();
        assert!(text.contains('\n'));
        let names: Vec<_> = fs::read_dir(&dir)
            .unwrap()
            .map(|e| e.unwrap().file_name().into_string().unwrap())
            .collect();
        assert_eq!(names, vec!["doc.json".to_string()]);
    }

    #[test]
    fn record_stat_counts_both_outcomes() {
        let (_dir, store) = store();
        let q = question(0, 0, "7", "q1");

        store.record_stat("alice", &q, false, at(1)).unwrap();
        store.record_stat("alice", &q, false, at(2)).unwrap();
        let stat = store.record_stat("alice", &q, true, at(3)).unwrap();

        assert_eq!(stat.error_count, 2);
        assert_eq!(stat.correct_count, 1);
        assert_eq!(stat.last_answered, at(3));

        let stats = store.load_stats("alice").unwrap();
        assert_eq!(stats["0_7"], stat);
        assert_eq!(stats["0_7"].original_chapter_key, "0");
    }

    #[test]
    fn duplicate_miss_is_recorded_once() {
        let (_dir, store) = store();
        let q = question(0, 0, "7", "q1");
        let file = "c1_incorrect_questions.json";

        let first = UserIncorrectQuestion::from_question(&q, "B", at(1));
        let second = UserIncorrectQuestion::from_question(&q, "C", at(2));
        assert!(store.append_incorrect("alice", file, first).unwrap());
        assert!(!store.append_incorrect("alice", file, second).unwrap());

        let notebook = store.load_incorrect("alice", file).unwrap();
        assert_eq!(notebook.len(), 1);
        assert_eq!(notebook[0].user_answer.as_deref(), Some("B"));
        assert_eq!(notebook[0].timestamp, at(1));
    }

    #[test]
    fn delete_moves_entry_to_history() {
        let (_dir, store) = store();
        let file = "c1_incorrect_questions.json";
        for (i, text) in ["q1", "q2"].iter().enumerate() {
            let q = question(1, i, &(i + 1).to_string(), text);
            store
                .append_incorrect("alice", file, UserIncorrectQuestion::from_question(&q, "B", at(0)))
                .unwrap();
        }

        let removed = store.delete_incorrect("alice", file, "1", "2", at(5)).unwrap().unwrap();
        assert_eq!(removed.question_text, "q2");
        assert_eq!(removed.deleted_at, Some(at(5)));

        let notebook = store.load_incorrect("alice", file).unwrap();
        assert_eq!(notebook.len(), 1);
        assert_eq!(notebook[0].question_text, "q1");

        let history = store.load_deleted("alice").unwrap();
        assert_eq!(history.len(), 1);
        assert_eq!(history[0].deleted_at, Some(at(5)));
    }

    #[test]
    fn delete_of_missing_entry_changes_nothing() {
        let (_dir, store) = store();
        let file = "c1_incorrect_questions.json";
        let q = question(1, 0, "1", "q1");
        store
            .append_incorrect("alice", file, UserIncorrectQuestion::from_question(&q, "B", at(0)))
            .unwrap();

        assert!(store.delete_incorrect("alice", file, "1", "99", at(5)).unwrap().is_none());
        assert_eq!(store.load_incorrect("alice", file).unwrap().len(), 1);
        assert!(store.load_deleted("alice").unwrap().is_empty());
    }

    #[test]
    fn history_failure_does_not_fail_delete() {
        let (_dir, store) = store();
        let file = "c1_incorrect_questions.json";
        let q = question(1, 0, "1", "q1");
        store
            .append_incorrect("alice", file, UserIncorrectQuestion::from_question(&q, "B", at(0)))
            .unwrap();
        fs::write(store.user_path("alice", DELETED_INCORRECT_FILE).unwrap(), "[oops").unwrap();

        assert!(store.delete_incorrect("alice", file, "1", "1", at(5)).unwrap().is_some());
        assert!(store.load_incorrect("alice", file).unwrap().is_empty());
    }

    #[test]
    fn clear_renames_existing_documents() {
        let (_dir, store) = store();
        let q = question(0, 0, "1", "q1");
        store.record_stat("alice", &q, false, at(0)).unwrap();
        store
            .append_incorrect("alice", "c1_incorrect_questions.json", UserIncorrectQuestion::from_question(&q, "B", at(0)))
            .unwrap();

        let archived = store
            .clear("alice", &["c1_incorrect_questions.json", "c2_incorrect_questions.json"], at(0))
            .unwrap();

        assert_eq!(archived.len(), 2);
        for path in &archived {
            assert!(path.exists());
            assert!(path.to_string_lossy().ends_with(".bak"));
        }
        assert!(store.load_stats("alice").unwrap().is_empty());
        assert!(store.load_incorrect("alice", "c1_incorrect_questions.json").unwrap().is_empty());
    }

    #[test]
    fn archive_does_not_overwrite_previous_backup() {
        let (_dir, store) = store();
        store.save("alice", QUESTION_STATS_FILE, &QuestionStats::new()).unwrap();
        let first = store.archive("alice", QUESTION_STATS_FILE, at(0)).unwrap().unwrap();
        store.save("alice", QUESTION_STATS_FILE, &QuestionStats::new()).unwrap();
        let second = store.archive("alice", QUESTION_STATS_FILE, at(0)).unwrap().unwrap();

        assert_ne!(first, second);
        assert!(first.exists() && second.exists());
    }
}
