//! Core domain types for the Kaiquest system.
//!
//! This module defines the fundamental types used throughout the system:
//! - Archetype keys and score sets
//! - Diagnosis results
//! - Quests, step structures and progress
//! - Kai logs and journal entries
//! - User profile and persistent state

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use uuid::Uuid;

// ============================================================================
// Archetype Types
// ============================================================================

/// One of the eight personality archetypes, plus the `common` catch-all.
///
/// `Common` tags quests that apply to everyone; it never receives scores.
#[derive(
    Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq, PartialOrd, Ord, Hash,
)]
#[serde(rename_all = "snake_case")]
pub enum TypeKey {
    Sage,
    Monk,
    Priest,
    Mage,
    Thief,
    Artist,
    Guardian,
    Commander,
    Common,
}

impl TypeKey {
    /// The eight scored archetypes in canonical order.
    ///
    /// This order is the committed tie-break order for `pick_top_type` and
    /// the iteration order everywhere a score set is walked.
    pub const SCORED: [TypeKey; 8] = [
        TypeKey::Sage,
        TypeKey::Monk,
        TypeKey::Priest,
        TypeKey::Mage,
        TypeKey::Thief,
        TypeKey::Artist,
        TypeKey::Guardian,
        TypeKey::Commander,
    ];

    /// Snake_case wire/storage name of this key
    pub fn as_str(&self) -> &'static str {
        match self {
            TypeKey::Sage => "sage",
            TypeKey::Monk => "monk",
            TypeKey::Priest => "priest",
            TypeKey::Mage => "mage",
            TypeKey::Thief => "thief",
            TypeKey::Artist => "artist",
            TypeKey::Guardian => "guardian",
            TypeKey::Commander => "commander",
            TypeKey::Common => "common",
        }
    }

    /// Parse an exact snake_case key name
    pub fn parse(s: &str) -> Option<TypeKey> {
        match s {
            "sage" => Some(TypeKey::Sage),
            "monk" => Some(TypeKey::Monk),
            "priest" => Some(TypeKey::Priest),
            "mage" => Some(TypeKey::Mage),
            "thief" => Some(TypeKey::Thief),
            "artist" => Some(TypeKey::Artist),
            "guardian" => Some(TypeKey::Guardian),
            "commander" => Some(TypeKey::Commander),
            "common" => Some(TypeKey::Common),
            _ => None,
        }
    }
}

impl std::fmt::Display for TypeKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Mapping from archetype to score, always fully populated over
/// [`TypeKey::SCORED`] and zero-initialized.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(transparent)]
pub struct ScoreSet(BTreeMap<TypeKey, i64>);

impl ScoreSet {
    /// A score set with every scored archetype at zero
    pub fn zeroed() -> Self {
        let mut map = BTreeMap::new();
        for key in TypeKey::SCORED {
            map.insert(key, 0);
        }
        Self(map)
    }

    /// Score for one archetype (zero if somehow absent)
    pub fn get(&self, key: TypeKey) -> i64 {
        self.0.get(&key).copied().unwrap_or(0)
    }

    /// Overwrite one archetype's score
    pub fn set(&mut self, key: TypeKey, value: i64) {
        self.0.insert(key, value);
    }

    /// Add to one archetype's score
    pub fn add(&mut self, key: TypeKey, delta: i64) {
        *self.0.entry(key).or_insert(0) += delta;
    }

    /// Iterate (key, score) pairs in canonical order
    pub fn iter(&self) -> impl Iterator<Item = (TypeKey, i64)> + '_ {
        TypeKey::SCORED.iter().map(|&k| (k, self.get(k)))
    }
}

// ============================================================================
// Diagnosis Types
// ============================================================================

/// One completed questionnaire run: raw scores, assist bonus, final scores
/// and the chosen top archetype.
///
/// Immutable once stored; a new run appends a new result, history is kept.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct DiagnosisResult {
    pub id: Uuid,
    pub created_at: DateTime<Utc>,
    pub top_type: TypeKey,
    pub raw_scores: ScoreSet,
    pub bonus_scores: ScoreSet,
    pub final_scores: ScoreSet,
    /// "What has been on your mind lately"
    pub written_thoughts: String,
    /// "Your day-to-day actions and habits"
    pub written_habits: String,
    /// "The person you would like to be"
    pub written_ideal: String,
}

// ============================================================================
// Quest Types
// ============================================================================

/// Whether a quest is a single task or a multi-step structure
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum QuestStructure {
    Single,
    MultiStep,
}

impl Default for QuestStructure {
    fn default() -> Self {
        QuestStructure::Single
    }
}

/// An admin-authored quest.
///
/// `steps` is kept exactly as submitted (string list, object list, or
/// anything in between); it is normalized on every read, never persisted
/// in normalized form.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Quest {
    pub id: Uuid,
    pub title: String,
    pub description: String,
    pub type_key: TypeKey,
    pub category: String,
    #[serde(default)]
    pub structure: QuestStructure,
    #[serde(default)]
    pub steps: serde_json::Value,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Kind of one normalized quest step
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum StepKind {
    Text,
    Grid,
    Choice,
}

/// Canonical representation of one quest step.
///
/// Invariants: `Grid` implies both dimensions positive; `Choice` implies
/// non-empty options.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq, Eq)]
pub struct CanonicalStep {
    pub title: String,
    pub kind: StepKind,
    pub grid_rows: u32,
    pub grid_cols: u32,
    pub options: Vec<String>,
}

// ============================================================================
// Progress Types
// ============================================================================

/// Progress status of a user against one quest
#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ProgressStatus {
    NotStarted,
    InProgress,
    Completed,
}

/// Per-quest progress row: at most one per quest in a user's state,
/// created lazily on first access.
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct QuestProgress {
    pub quest_id: Uuid,
    pub status: ProgressStatus,
    pub started_at: Option<DateTime<Utc>>,
    pub completed_at: Option<DateTime<Utc>>,
    pub updated_at: DateTime<Utc>,
}

// ============================================================================
// Kai and Journal Types
// ============================================================================

/// A tracked "kai" (pleasant/positive habit) phrase with a repetition count
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct KaiLog {
    pub name: String,
    pub count: u32,
    pub created_at: DateTime<Utc>,
}

/// One free-text journal entry, with optional assist feedback attached later
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub content: String,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub feedback: Option<String>,
}

// ============================================================================
// User State
// ============================================================================

/// Display profile for the acting user
#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct UserProfile {
    pub name: String,
    pub level: u32,
    pub created_at: DateTime<Utc>,
}

impl Default for UserProfile {
    fn default() -> Self {
        Self {
            name: "Adventurer".into(),
            level: 1,
            created_at: Utc::now(),
        }
    }
}

/// The user's persistent state: diagnosis history, kai logs and quest
/// progress. Journal entries live in their own JSONL file.
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct UserState {
    #[serde(default)]
    pub profile: UserProfile,
    #[serde(default)]
    pub diagnoses: Vec<DiagnosisResult>,
    #[serde(default)]
    pub kai_logs: Vec<KaiLog>,
    #[serde(default)]
    pub progress: Vec<QuestProgress>,
}

/// The admin-owned quest list
#[derive(Clone, Debug, Serialize, Deserialize, Default)]
pub struct QuestBook {
    #[serde(default)]
    pub quests: Vec<Quest>,
}
