//! High-level operations tying scoring, dedup, progress and the assist
//! collaborator together.
//!
//! Every assist-backed path here degrades gracefully: an unavailable or
//! malformed reply produces the deterministic fallback, never an error.

use crate::assist::{self, Assist, AssistReply};
use crate::catalog::Catalog;
use crate::kai;
use crate::scoring::{apply_bonus, pick_top_type, score_answers};
use crate::types::{DiagnosisResult, JournalEntry, TypeKey, UserState};
use crate::Result;
use chrono::{DateTime, Utc};
use std::collections::HashMap;
use std::path::Path;
use uuid::Uuid;

/// One questionnaire submission
#[derive(Clone, Debug, Default)]
pub struct DiagnosisInput {
    /// Question index -> answer label ("yes"/"maybe"/"neutral"/"no")
    pub answers: HashMap<usize, String>,
    pub written_thoughts: String,
    pub written_habits: String,
    pub written_ideal: String,
}

/// Run a full diagnosis: raw scores, assist bonus merge, top type.
///
/// The assist call is best-effort; when it is unavailable or the reply is
/// unusable the bonus is all zeros and final equals raw.
pub fn run_diagnosis(
    catalog: &Catalog,
    input: &DiagnosisInput,
    assist: &dyn Assist,
    now: DateTime<Utc>,
) -> DiagnosisResult {
    let assignment = catalog.assignment();
    let raw = score_answers(&input.answers, catalog.questions.len(), &assignment);

    let prompt = assist::bonus_prompt(
        catalog,
        &raw,
        &input.written_thoughts,
        &input.written_habits,
        &input.written_ideal,
    );

    let bonus_candidate = match assist.generate_json(&prompt) {
        AssistReply::Ready(value) => value.get("bonus_scores").cloned(),
        AssistReply::Unavailable => {
            tracing::debug!("Assist unavailable, scoring without bonus");
            None
        }
        AssistReply::Malformed => {
            tracing::warn!("Assist returned unusable bonus reply, scoring without bonus");
            None
        }
    };

    let (bonus_scores, final_scores) = apply_bonus(&raw, bonus_candidate.as_ref());
    let top_type = pick_top_type(&final_scores, &TypeKey::SCORED);

    tracing::info!("Diagnosis complete: top type {}", top_type);

    DiagnosisResult {
        id: Uuid::new_v4(),
        created_at: now,
        top_type,
        raw_scores: raw,
        bonus_scores,
        final_scores,
        written_thoughts: input.written_thoughts.clone(),
        written_habits: input.written_habits.clone(),
        written_ideal: input.written_ideal.clone(),
    }
}

/// Commentary text for a diagnosis result, with fallback
pub fn diagnosis_comment(
    catalog: &Catalog,
    result: &DiagnosisResult,
    assist: &dyn Assist,
) -> String {
    match assist.generate_text(&assist::comment_prompt(catalog, result)) {
        AssistReply::Ready(text) if !text.trim().is_empty() => text,
        _ => assist::FALLBACK_COMMENT.to_string(),
    }
}

/// Feedback text for quest-completion notes, with fallback.
///
/// Blank notes skip the collaborator entirely.
pub fn quest_feedback(notes: &str, assist: &dyn Assist) -> String {
    let notes = notes.trim();
    if notes.is_empty() {
        return assist::FALLBACK_QUEST_FEEDBACK.to_string();
    }

    match assist.generate_text(&assist::quest_feedback_prompt(notes)) {
        AssistReply::Ready(text) if !text.trim().is_empty() => text,
        _ => assist::FALLBACK_QUEST_FEEDBACK.to_string(),
    }
}

/// Tidy raw journal text into a composed entry; the original text is the
/// fallback
pub fn compose_journal(base_text: &str, assist: &dyn Assist) -> String {
    match assist.generate_text(&assist::journal_compose_prompt(base_text)) {
        AssistReply::Ready(text) if !text.trim().is_empty() => text,
        _ => base_text.to_string(),
    }
}

/// Extract candidate kai phrases from journal text.
///
/// Blank text or an unusable/unavailable reply yields an empty list.
pub fn extract_kai(content: &str, assist: &dyn Assist) -> Vec<String> {
    let content = content.trim();
    if content.is_empty() {
        return Vec::new();
    }

    match assist.generate_text(&assist::kai_extract_prompt(content)) {
        AssistReply::Ready(text) => kai::parse_phrase_lines(&text),
        _ => Vec::new(),
    }
}

/// Save a journal entry and merge extracted kai phrases into the user's
/// logs.
///
/// The entry is persisted first; a failure while merging kai phrases is
/// logged and swallowed so it can never lose the entry.
pub fn record_journal(
    journal_path: &Path,
    state_path: &Path,
    content: &str,
    phrases: &[String],
    threshold: f64,
    now: DateTime<Utc>,
) -> Result<JournalEntry> {
    let content = content.trim();
    if content.is_empty() {
        return Err(crate::Error::Store("journal content is empty".into()));
    }

    let entry = JournalEntry {
        id: Uuid::new_v4(),
        content: content.to_string(),
        created_at: now,
        feedback: None,
    };

    let mut sink = crate::journal::JournalSink::new(journal_path);
    sink.append(&entry)?;

    if !phrases.is_empty() {
        let merge = UserState::update(state_path, |state| {
            let (merged, created) =
                kai::merge_phrases(&mut state.kai_logs, phrases, threshold, now);
            tracing::info!("Kai update: {} merged, {} created", merged, created);
            Ok(())
        });
        if let Err(e) = merge {
            tracing::warn!("Kai log update failed, journal entry kept: {}", e);
        }
    }

    Ok(entry)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assist::DisabledAssist;
    use crate::catalog::get_default_catalog;
    use serde_json::Value;

    /// Test double replaying canned replies
    struct ScriptedAssist {
        text: AssistReply<String>,
        json: AssistReply<Value>,
    }

    impl Assist for ScriptedAssist {
        fn generate_text(&self, _prompt: &str) -> AssistReply<String> {
            self.text.clone()
        }

        fn generate_json(&self, _prompt: &str) -> AssistReply<Value> {
            self.json.clone()
        }
    }

    fn all_yes_input() -> DiagnosisInput {
        DiagnosisInput {
            answers: (0..32).map(|i| (i, "yes".to_string())).collect(),
            written_thoughts: "thinking a lot".into(),
            written_habits: "walking".into(),
            written_ideal: "calmer".into(),
        }
    }

    #[test]
    fn test_diagnosis_without_assist_is_raw_only() {
        let catalog = get_default_catalog();
        let result = run_diagnosis(catalog, &all_yes_input(), &DisabledAssist, Utc::now());

        for key in TypeKey::SCORED {
            assert_eq!(result.raw_scores.get(key), 12);
            assert_eq!(result.bonus_scores.get(key), 0);
            assert_eq!(result.final_scores.get(key), 12);
        }
        // All tied at 12: canonical order breaks the tie.
        assert_eq!(result.top_type, TypeKey::Sage);
    }

    #[test]
    fn test_diagnosis_applies_assist_bonus() {
        let catalog = get_default_catalog();
        let assist = ScriptedAssist {
            text: AssistReply::Unavailable,
            json: AssistReply::Ready(serde_json::json!({
                "bonus_scores": {"thief": 5, "mage": 2}
            })),
        };

        let result = run_diagnosis(catalog, &all_yes_input(), &assist, Utc::now());

        assert_eq!(result.bonus_scores.get(TypeKey::Thief), 5);
        assert_eq!(result.final_scores.get(TypeKey::Thief), 17);
        assert_eq!(result.top_type, TypeKey::Thief);
    }

    #[test]
    fn test_diagnosis_malformed_bonus_degrades_to_raw() {
        let catalog = get_default_catalog();
        let assist = ScriptedAssist {
            text: AssistReply::Unavailable,
            json: AssistReply::Ready(serde_json::json!({
                "bonus_scores": {"thief": 5, "mage": "huge"}
            })),
        };

        let result = run_diagnosis(catalog, &all_yes_input(), &assist, Utc::now());

        for key in TypeKey::SCORED {
            assert_eq!(result.bonus_scores.get(key), 0);
        }
        assert_eq!(result.top_type, TypeKey::Sage);
    }

    #[test]
    fn test_diagnosis_reply_without_bonus_key_degrades() {
        let catalog = get_default_catalog();
        let assist = ScriptedAssist {
            text: AssistReply::Unavailable,
            json: AssistReply::Ready(serde_json::json!({"something_else": 1})),
        };

        let result = run_diagnosis(catalog, &all_yes_input(), &assist, Utc::now());
        assert_eq!(result.final_scores, result.raw_scores);
    }

    #[test]
    fn test_comment_falls_back_when_unavailable() {
        let catalog = get_default_catalog();
        let result = run_diagnosis(catalog, &all_yes_input(), &DisabledAssist, Utc::now());
        let comment = diagnosis_comment(catalog, &result, &DisabledAssist);
        assert_eq!(comment, crate::assist::FALLBACK_COMMENT);
    }

    #[test]
    fn test_quest_feedback_uses_assist_text() {
        let assist = ScriptedAssist {
            text: AssistReply::Ready("You noticed something real today.".into()),
            json: AssistReply::Unavailable,
        };
        assert_eq!(
            quest_feedback("it went ok", &assist),
            "You noticed something real today."
        );
    }

    #[test]
    fn test_quest_feedback_fallbacks() {
        assert_eq!(
            quest_feedback("", &DisabledAssist),
            crate::assist::FALLBACK_QUEST_FEEDBACK
        );
        assert_eq!(
            quest_feedback("notes", &DisabledAssist),
            crate::assist::FALLBACK_QUEST_FEEDBACK
        );
    }

    #[test]
    fn test_extract_kai_parses_bullets() {
        let assist = ScriptedAssist {
            text: AssistReply::Ready("・hot tea\n- slow mornings".into()),
            json: AssistReply::Unavailable,
        };
        assert_eq!(
            extract_kai("journal text", &assist),
            vec!["hot tea", "slow mornings"]
        );
    }

    #[test]
    fn test_extract_kai_empty_without_assist() {
        assert!(extract_kai("journal text", &DisabledAssist).is_empty());
        assert!(extract_kai("   ", &DisabledAssist).is_empty());
    }

    #[test]
    fn test_record_journal_persists_entry_and_kai() {
        let temp_dir = tempfile::tempdir().unwrap();
        let journal_path = temp_dir.path().join("journal.jsonl");
        let state_path = temp_dir.path().join("state.json");

        let phrases = vec!["hot tea".to_string(), "hot teas".to_string()];
        let entry = record_journal(
            &journal_path,
            &state_path,
            "a good day",
            &phrases,
            0.7,
            Utc::now(),
        )
        .unwrap();
        assert_eq!(entry.content, "a good day");

        let entries = crate::journal::read_entries(&journal_path).unwrap();
        assert_eq!(entries.len(), 1);

        let state = UserState::load(&state_path).unwrap();
        assert_eq!(state.kai_logs.len(), 1);
        assert_eq!(state.kai_logs[0].count, 2);
    }

    #[test]
    fn test_record_journal_rejects_blank_content() {
        let temp_dir = tempfile::tempdir().unwrap();
        let result = record_journal(
            &temp_dir.path().join("j.jsonl"),
            &temp_dir.path().join("s.json"),
            "   ",
            &[],
            0.7,
            Utc::now(),
        );
        assert!(result.is_err());
    }
}
