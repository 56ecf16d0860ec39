#![forbid(unsafe_code)]

//! Core domain model and business logic for the Kaiquest system.
//!
//! This crate provides:
//! - Domain types (archetypes, score sets, quests, journal, kai logs)
//! - The built-in archetype catalog and questionnaire
//! - Diagnosis scoring engine (raw scores, bonus merge, top type)
//! - Quest step normalization and progress tracking
//! - Kai deduplication via fuzzy text matching
//! - Persistence (JSON state, JSONL journal)

pub mod types;
pub mod error;
pub mod catalog;
pub mod config;
pub mod logging;
pub mod similarity;
pub mod kai;
pub mod scoring;
pub mod steps;
pub mod progress;
pub mod assist;
pub mod store;
pub mod journal;
pub mod engine;

// Re-export commonly used types
pub use error::{Error, Result};
pub use types::*;
pub use catalog::{get_default_catalog, normalize_type_key};
pub use config::Config;
pub use similarity::ratio;
pub use kai::{find_similar, merge_phrases};
pub use scoring::{apply_bonus, pick_top_type, score_answers};
pub use steps::normalize_steps;
pub use assist::{Assist, AssistReply, DisabledAssist};
pub use journal::{read_entries, JournalSink};
pub use engine::{run_diagnosis, DiagnosisInput};
