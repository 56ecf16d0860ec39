//! JSONL journal persistence.
//!
//! Entries are appended to a JSON Lines file with file locking. Attaching
//! feedback to an entry or deleting one rewrites the file atomically via a
//! temp file in the same directory.

use crate::types::JournalEntry;
use crate::{Error, Result};
use fs2::FileExt;
use std::fs::{File, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Append-only journal sink with file locking
pub struct JournalSink {
    path: PathBuf,
}

impl JournalSink {
    /// Create a new sink for the given path
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append one entry as a JSON line
    pub fn append(&mut self, entry: &JournalEntry) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            std::fs::create_dir_all(parent)?;
        }

        let file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;

        file.lock_exclusive()?;

        let mut writer = std::io::BufWriter::new(&file);
        let line = serde_json::to_string(entry)?;
        writer.write_all(line.as_bytes())?;
        writer.write_all(b"\n")?;
        writer.flush()?;

        file.unlock()?;

        tracing::debug!("Appended journal entry {} to {:?}", entry.id, self.path);
        Ok(())
    }
}

/// Read all journal entries from a file.
///
/// Unparseable lines are skipped with a warning rather than failing the
/// whole read. Entries come back in file (chronological) order.
pub fn read_entries(path: &Path) -> Result<Vec<JournalEntry>> {
    if !path.exists() {
        return Ok(Vec::new());
    }

    let file = File::open(path)?;
    file.lock_shared()?;

    let reader = BufReader::new(&file);
    let mut entries = Vec::new();

    for (line_num, line_result) in reader.lines().enumerate() {
        let line = line_result?;
        if line.trim().is_empty() {
            continue;
        }

        match serde_json::from_str::<JournalEntry>(&line) {
            Ok(entry) => entries.push(entry),
            Err(e) => {
                tracing::warn!("Failed to parse journal entry at line {}: {}", line_num + 1, e);
            }
        }
    }

    file.unlock()?;
    tracing::debug!("Read {} journal entries", entries.len());
    Ok(entries)
}

/// Replace the journal file contents atomically
fn rewrite(path: &Path, entries: &[JournalEntry]) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }

    let temp = NamedTempFile::new_in(path.parent().ok_or_else(|| {
        std::io::Error::new(std::io::ErrorKind::Other, "journal path missing parent")
    })?)?;

    temp.as_file().lock_exclusive()?;

    {
        let mut writer = std::io::BufWriter::new(temp.as_file());
        for entry in entries {
            let line = serde_json::to_string(entry)?;
            writer.write_all(line.as_bytes())?;
            writer.write_all(b"\n")?;
        }
        writer.flush()?;
    }

    temp.as_file().sync_all()?;
    temp.as_file().unlock()?;
    temp.persist(path).map_err(|e| Error::Io(e.error))?;

    Ok(())
}

/// Attach feedback text to one entry; errors when the entry is missing
pub fn attach_feedback(path: &Path, entry_id: Uuid, feedback: &str) -> Result<()> {
    let mut entries = read_entries(path)?;

    let entry = entries
        .iter_mut()
        .find(|e| e.id == entry_id)
        .ok_or_else(|| Error::NotFound(format!("journal entry {}", entry_id)))?;
    entry.feedback = Some(feedback.to_string());

    rewrite(path, &entries)?;
    tracing::debug!("Attached feedback to journal entry {}", entry_id);
    Ok(())
}

/// Delete one entry; errors when the entry is missing
pub fn delete_entry(path: &Path, entry_id: Uuid) -> Result<()> {
    let mut entries = read_entries(path)?;
    let before = entries.len();
    entries.retain(|e| e.id != entry_id);

    if entries.len() == before {
        return Err(Error::NotFound(format!("journal entry {}", entry_id)));
    }

    rewrite(path, &entries)?;
    tracing::debug!("Deleted journal entry {}", entry_id);
    Ok(())
}

/// Remove the journal file entirely (user reset)
pub fn clear(path: &Path) -> Result<()> {
    if path.exists() {
        std::fs::remove_file(path)?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    fn entry(content: &str) -> JournalEntry {
        JournalEntry {
            id: Uuid::new_v4(),
            content: content.into(),
            created_at: Utc::now(),
            feedback: None,
        }
    }

    #[test]
    fn test_append_and_read_entries() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let mut sink = JournalSink::new(&path);
        sink.append(&entry("first day")).unwrap();
        sink.append(&entry("second day")).unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
        assert_eq!(entries[0].content, "first day");
        assert_eq!(entries[1].content, "second day");
    }

    #[test]
    fn test_read_missing_file_is_empty() {
        let temp_dir = tempfile::tempdir().unwrap();
        let entries = read_entries(&temp_dir.path().join("missing.jsonl")).unwrap();
        assert!(entries.is_empty());
    }

    #[test]
    fn test_bad_lines_are_skipped() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let mut sink = JournalSink::new(&path);
        sink.append(&entry("good")).unwrap();
        {
            use std::io::Write as _;
            let mut file = OpenOptions::new().append(true).open(&path).unwrap();
            writeln!(file, "not json at all").unwrap();
        }
        sink.append(&entry("also good")).unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 2);
    }

    #[test]
    fn test_attach_feedback() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let target = entry("needs feedback");
        let target_id = target.id;
        let mut sink = JournalSink::new(&path);
        sink.append(&target).unwrap();
        sink.append(&entry("other")).unwrap();

        attach_feedback(&path, target_id, "nice work").unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries[0].feedback.as_deref(), Some("nice work"));
        assert_eq!(entries[1].feedback, None);
    }

    #[test]
    fn test_attach_feedback_to_missing_entry_errors() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");
        JournalSink::new(&path).append(&entry("only")).unwrap();

        let result = attach_feedback(&path, Uuid::new_v4(), "lost");
        assert!(matches!(result, Err(Error::NotFound(_))));
    }

    #[test]
    fn test_delete_entry() {
        let temp_dir = tempfile::tempdir().unwrap();
        let path = temp_dir.path().join("journal.jsonl");

        let doomed = entry("doomed");
        let doomed_id = doomed.id;
        let mut sink = JournalSink::new(&path);
        sink.append(&doomed).unwrap();
        sink.append(&entry("survivor")).unwrap();

        delete_entry(&path, doomed_id).unwrap();

        let entries = read_entries(&path).unwrap();
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].content, "survivor");

        assert!(matches!(
            delete_entry(&path, doomed_id),
            Err(Error::NotFound(_))
        ));
    }
}
