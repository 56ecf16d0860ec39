//! Kai log deduplication.
//!
//! Candidate habit phrases (usually extracted from journal text) are merged
//! into the existing kai logs by fuzzy match rather than exact equality, so
//! "swim" and "swiming" count as one habit.

use crate::similarity::ratio;
use crate::types::KaiLog;
use chrono::{DateTime, Utc};

/// Default similarity threshold for treating two phrases as the same kai
pub const DEFAULT_THRESHOLD: f64 = 0.7;

/// Find the existing log most similar to `candidate`, if similar enough.
///
/// Returns the index of the best-scoring log when its score is at least
/// `threshold`, otherwise `None` (caller should create a new entry).
/// A blank candidate never matches. The strictly greatest score wins;
/// on ties the first log in iteration order is kept.
pub fn find_similar(logs: &[KaiLog], candidate: &str, threshold: f64) -> Option<usize> {
    let candidate = candidate.trim();
    if candidate.is_empty() {
        return None;
    }

    let mut best_idx = None;
    let mut best_score = 0.0;

    for (idx, log) in logs.iter().enumerate() {
        let score = ratio(&log.name, candidate);
        if score > best_score {
            best_score = score;
            best_idx = Some(idx);
        }
    }

    if best_score >= threshold {
        best_idx
    } else {
        None
    }
}

/// Merge a batch of candidate phrases into the kai logs.
///
/// Each phrase either increments the count of a similar existing log or is
/// appended as a new log with count 1. Newly created logs join the scan set
/// immediately, so repeated similar phrases within one batch collapse onto
/// a single new entry. Returns (merged, created) counts.
pub fn merge_phrases(
    logs: &mut Vec<KaiLog>,
    phrases: &[String],
    threshold: f64,
    now: DateTime<Utc>,
) -> (usize, usize) {
    let mut merged = 0;
    let mut created = 0;

    for raw_name in phrases {
        let name = raw_name.trim();
        if name.is_empty() {
            continue;
        }

        match find_similar(logs, name, threshold) {
            Some(idx) => {
                logs[idx].count += 1;
                merged += 1;
                tracing::debug!("Merged kai {:?} into existing {:?}", name, logs[idx].name);
            }
            None => {
                logs.push(KaiLog {
                    name: name.to_string(),
                    count: 1,
                    created_at: now,
                });
                created += 1;
                tracing::debug!("Registered new kai {:?}", name);
            }
        }
    }

    (merged, created)
}

/// Parse a bullet-list assist reply into bare phrases.
///
/// Strips common bullet markers and enumeration prefixes from each line and
/// drops lines that end up empty.
pub fn parse_phrase_lines(text: &str) -> Vec<String> {
    const MARKERS: &[char] = &[
        '・', '-', '＊', '*', '•', '●', '■', '□', '0', '1', '2', '3', '4', '5', '6', '7', '8',
        '9', '.', '①', '②', '③', '④', '⑤', ' ',
    ];

    text.lines()
        .map(|line| line.trim().trim_start_matches(MARKERS).trim())
        .filter(|line| !line.is_empty())
        .map(|line| line.to_string())
        .collect()
}
