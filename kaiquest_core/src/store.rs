//! JSON state persistence with file locking.
//!
//! Two stores live under the data directory: `state.json` (the acting
//! user's diagnoses, kai logs and quest progress) and `quests.json` (the
//! admin-owned quest list). Both use shared locks for reads, exclusive
//! locks plus atomic tempfile replacement for writes, and degrade to
//! defaults when the file is missing or corrupt.

use crate::types::{DiagnosisResult, Quest, QuestBook, QuestProgress, UserState};
use crate::{Error, Result};
use chrono::{DateTime, Utc};
use fs2::FileExt;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::fs::File;
use std::io::{Read, Write};
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Load a JSON store with a shared lock, defaulting on any failure.
///
/// A missing, unreadable, or corrupt file logs a warning and returns the
/// default value rather than an error.
fn load_json<T: DeserializeOwned + Default>(path: &Path, what: &str) -> Result<T> {
    if !path.exists() {
        tracing::info!("No {} file found, using default state", what);
        return Ok(T::default());
    }

    let file = match File::open(path) {
        Ok(f) => f,
        Err(e) => {
            tracing::warn!("Unable to open {} file {:?}: {}. Using defaults.", what, path, e);
            return Ok(T::default());
        }
    };

    if let Err(e) = file.lock_shared() {
        tracing::warn!("Unable to lock {} file {:?}: {}. Using defaults.", what, path, e);
        return Ok(T::default());
    }

    let mut contents = String::new();
    let mut reader = std::io::BufReader::new(&file);
    if let Err(e) = reader.read_to_string(&mut contents) {
        let _ = file.unlock();
        tracing::warn!("Failed to read {} file {:?}: {}. Using defaults.", what, path, e);
        return Ok(T::default());
    }

    file.unlock()?;

    match serde_json::from_str::<T>(&contents) {
        Ok(value) => {
            tracing::debug!("Loaded {} from {:?}", what, path);
            Ok(value)
        }
        Err(e) => {
            tracing::warn!("Failed to parse {} file {:?}: {}. Using defaults.", what, path, e);
            Ok(T::default())
        }
    }
}

/// Save a JSON store atomically: write to a locked temp file in the same
/// directory, sync, then rename over the original.
fn save_json<T: Serialize>(value: &T, path: &Path, what: &str) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "store path missing parent")
    })?)?;

    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        let contents = serde_json::to_string(value)?;
        writer.write_all(contents.as_bytes())?;
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;

    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    tracing::debug!("Saved {} to {:?}", what, path);
    Ok(())
}

impl UserState {
    /// Load user state, defaulting when missing or corrupt
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, "user state")
    }

    /// Save user state atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path, "user state")
    }

    /// Load state, modify it, and save it back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut UserState) -> Result<()>,
    {
        let mut state = Self::load(path)?;
        f(&mut state)?;
        state.save(path)?;
        Ok(state)
    }

    /// Newest diagnosis result, if the user has ever run the questionnaire
    pub fn last_diagnosis(&self) -> Option<&DiagnosisResult> {
        self.diagnoses.iter().max_by_key(|d| d.created_at)
    }

    /// Append a new diagnosis result (history is retained)
    pub fn push_diagnosis(&mut self, result: DiagnosisResult) {
        self.diagnoses.push(result);
    }

    /// Read-only progress lookup for one quest
    pub fn progress_for(&self, quest_id: Uuid) -> Option<&QuestProgress> {
        self.progress.iter().find(|p| p.quest_id == quest_id)
    }

    /// Lookup-or-create the progress row for one quest.
    ///
    /// Guarantees at most one row per quest: the existing row is returned
    /// when present, otherwise a fresh `not_started` row is inserted.
    pub fn progress_entry(&mut self, quest_id: Uuid, now: DateTime<Utc>) -> &mut QuestProgress {
        match self.progress.iter().position(|p| p.quest_id == quest_id) {
            Some(idx) => &mut self.progress[idx],
            None => {
                self.progress.push(QuestProgress::new(quest_id, now));
                let idx = self.progress.len() - 1;
                &mut self.progress[idx]
            }
        }
    }

    /// Drop all progress rows for a quest (used when the quest is deleted)
    pub fn remove_progress_for(&mut self, quest_id: Uuid) -> usize {
        let before = self.progress.len();
        self.progress.retain(|p| p.quest_id != quest_id);
        before - self.progress.len()
    }

    /// Wipe diagnoses, kai logs and progress; the profile survives
    pub fn reset(&mut self) {
        self.diagnoses.clear();
        self.kai_logs.clear();
        self.progress.clear();
    }
}

impl QuestBook {
    /// Load the quest list, defaulting when missing or corrupt
    pub fn load(path: &Path) -> Result<Self> {
        load_json(path, "quest book")
    }

    /// Save the quest list atomically
    pub fn save(&self, path: &Path) -> Result<()> {
        save_json(self, path, "quest book")
    }

    /// Load, modify, and save back atomically
    pub fn update<F>(path: &Path, f: F) -> Result<Self>
    where
        F: FnOnce(&mut QuestBook) -> Result<()>,
    {
        let mut book = Self::load(path)?;
        f(&mut book)?;
        book.save(path)?;
        Ok(book)
    }

    /// Find a quest by id
    pub fn find(&self, id: Uuid) -> Option<&Quest> {
        self.quests.iter().find(|q| q.id == id)
    }

    /// Find a quest by id, mutably
    pub fn find_mut(&mut self, id: Uuid) -> Option<&mut Quest> {
        self.quests.iter_mut().find(|q| q.id == id)
    }

    /// Resolve a quest from a full id or an unambiguous id prefix
    pub fn resolve(&self, id_or_prefix: &str) -> Result<&Quest> {
        if let Ok(id) = Uuid::parse_str(id_or_prefix) {
            return self
                .find(id)
                .ok_or_else(|| Error::NotFound(format!("quest {}", id)));
        }

        let matches: Vec<&Quest> = self
            .quests
            .iter()
            .filter(|q| q.id.to_string().starts_with(id_or_prefix))
            .collect();

        match matches.as_slice() {
            [quest] => Ok(quest),
            [] => Err(Error::NotFound(format!("quest {}", id_or_prefix))),
            _ => Err(Error::Store(format!(
                "quest id prefix {:?} is ambiguous",
                id_or_prefix
            ))),
        }
    }

    /// Remove a quest; returns whether anything was removed
    pub fn remove(&mut self, id: Uuid) -> bool {
        let before = self.quests.len();
        self.quests.retain(|q| q.id != id);
        self.quests.len() < before
    }

    /// Quests ordered by most recent update first
    pub fn by_recency(&self) -> Vec<&Quest> {
        let mut quests: Vec<&Quest> = self.quests.iter().collect();
        quests.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
        quests
    }
}
