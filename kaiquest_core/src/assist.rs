//! Text-completion collaborator boundary.
//!
//! Everything generative (bonus-score suggestion, diagnosis commentary,
//! quest feedback, journal composition, kai extraction) goes through the
//! [`Assist`] trait. The collaborator is best-effort by contract: it may
//! be unconfigured, unreachable, or return garbage, and every caller has
//! a deterministic fallback for each of those outcomes.

use crate::catalog::Catalog;
use crate::types::{DiagnosisResult, ScoreSet, TypeKey};
use serde_json::Value;

/// Outcome of one collaborator call.
///
/// Explicit variants instead of nested `Option`s so callers must decide
/// what "unavailable" and "malformed" mean for their feature.
#[derive(Clone, Debug, PartialEq)]
pub enum AssistReply<T> {
    /// Usable output
    Ready(T),
    /// Collaborator unconfigured or unreachable; expected, non-fatal
    Unavailable,
    /// Collaborator answered but the reply could not be used
    Malformed,
}

/// The generative-text collaborator
pub trait Assist {
    /// Free-form text completion
    fn generate_text(&self, prompt: &str) -> AssistReply<String>;

    /// JSON-shaped completion; implementations should run replies through
    /// [`extract_json_block`] before giving up
    fn generate_json(&self, prompt: &str) -> AssistReply<Value>;
}

/// The no-backend implementation: every call is `Unavailable`.
///
/// Used whenever `[assist]` is disabled in config or no backend is
/// compiled in; all features degrade to their deterministic fallbacks.
#[derive(Clone, Copy, Debug, Default)]
pub struct DisabledAssist;

impl Assist for DisabledAssist {
    fn generate_text(&self, _prompt: &str) -> AssistReply<String> {
        AssistReply::Unavailable
    }

    fn generate_json(&self, _prompt: &str) -> AssistReply<Value> {
        AssistReply::Unavailable
    }
}

/// Parse a JSON object out of a completion reply.
///
/// Prefers a fenced ```json block; falls back to the outermost braces.
/// Returns `None` when nothing parses.
pub fn extract_json_block(text: &str) -> Option<Value> {
    let text = text.trim();

    let fenced = text.find("```").and_then(|start| {
        let after = &text[start + 3..];
        let after = after.strip_prefix("json").unwrap_or(after);
        let after = after.trim_start();
        after.find("```").map(|end| after[..end].trim())
    });

    let candidate = match fenced {
        Some(inner) => inner,
        None => {
            let start = text.find('{')?;
            let end = text.rfind('}')?;
            if end < start {
                return None;
            }
            &text[start..=end]
        }
    };

    serde_json::from_str(candidate).ok()
}

// ============================================================================
// Fallback texts
// ============================================================================

/// Shown when diagnosis commentary cannot be generated
pub const FALLBACK_COMMENT: &str =
    "Commentary is off because no assist backend is configured.";

/// Shown when quest-completion feedback cannot be generated
pub const FALLBACK_QUEST_FEEDBACK: &str =
    "Well done finishing the quest! Take a moment to give yourself credit for what you managed today.";

// ============================================================================
// Prompt builders
// ============================================================================

/// Prompt asking for per-type bonus scores as strict JSON
pub fn bonus_prompt(
    catalog: &Catalog,
    raw: &ScoreSet,
    written_thoughts: &str,
    written_habits: &str,
    written_ideal: &str,
) -> String {
    let mut types = String::new();
    for key in TypeKey::SCORED {
        let info = catalog.info(key);
        types.push_str(&format!(
            "- {}: {} ({}; weak spot: {})\n",
            key, info.feature, info.strength, info.weakness
        ));
    }

    let raw_json = serde_json::to_string(raw).unwrap_or_else(|_| "{}".into());

    format!(
        "You are the tally assistant for an RPG-flavored personality quiz.\n\
         \n\
         Archetypes:\n{types}\n\
         raw_scores are the base scores from the questionnaire. Based on what\n\
         the free-text answers reveal, award each archetype a bonus of 0 to 5\n\
         points. Positive adjustments only; integers only.\n\
         \n\
         raw_scores: {raw_json}\n\
         What has been on their mind: {written_thoughts}\n\
         Day-to-day habits: {written_habits}\n\
         The person they want to be: {written_ideal}\n\
         \n\
         Reply with JSON only, in exactly this shape:\n\
         {{\"bonus_scores\": {{\"sage\": 0, \"monk\": 0, \"priest\": 0, \"mage\": 0, \
         \"thief\": 0, \"artist\": 0, \"guardian\": 0, \"commander\": 0}}}}"
    )
}

/// Prompt asking for a short, kind commentary on a diagnosis result
pub fn comment_prompt(catalog: &Catalog, result: &DiagnosisResult) -> String {
    let info = catalog.info(result.top_type);
    format!(
        "You are the commentator for an RPG-flavored personality quiz.\n\
         Top archetype: {} ({}).\n\
         Final scores: {}\n\
         What has been on their mind: {}\n\
         Day-to-day habits: {}\n\
         The person they want to be: {}\n\
         \n\
         Write a gentle comment of a few sentences that helps this person go\n\
         a little easier on themselves. No lecturing, no pushing the result\n\
         on them; quietly point out one or two good things.",
        result.top_type,
        info.name,
        serde_json::to_string(&result.final_scores).unwrap_or_else(|_| "{}".into()),
        result.written_thoughts,
        result.written_habits,
        result.written_ideal,
    )
}

/// Prompt asking for warm feedback on quest-completion notes
pub fn quest_feedback_prompt(notes: &str) -> String {
    format!(
        "You are a reflection coach. Below are a user's notes on what they\n\
         felt and noticed while working through a quest.\n\
         \n\
         {notes}\n\
         \n\
         Write warm feedback of a few sentences that leaves them glad they\n\
         did it. No lecturing, no dwelling on what went wrong; find one or\n\
         two things they did well."
    )
}

/// Prompt asking to tidy raw step notes into a readable journal entry
pub fn journal_compose_prompt(base_text: &str) -> String {
    format!(
        "You are a gentle editor. Rework the text below into a readable\n\
         journal entry while keeping the writer's feelings intact.\n\
         No criticism, no talking down; if possible add exactly one\n\
         positive observation.\n\
         \n\
         Original text:\n{base_text}"
    )
}

/// Prompt asking for a kind reaction to a saved journal entry
pub fn journal_feedback_prompt(content: &str) -> String {
    format!(
        "You are a counselor quietly keeping a journal writer company.\n\
         Read the entry below and write a short comment that helps them\n\
         feel a little lighter. No lecturing, no criticism; pick out one\n\
         or two things that went well.\n\
         \n\
         Journal entry:\n{content}"
    )
}

/// Prompt asking to extract 3-5 "kai" phrases from journal text as a
/// bullet list
pub fn kai_extract_prompt(content: &str) -> String {
    format!(
        "You specialize in spotting \"kai\" - small comforts, likes, and\n\
         things worth treasuring. From the journal text below, extract\n\
         3 to 5 of them as short single phrases.\n\
         Reply with a bullet list and nothing else.\n\
         \n\
         Journal text:\n{content}"
    )
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_disabled_assist_is_unavailable() {
        let assist = DisabledAssist;
        assert_eq!(assist.generate_text("hi"), AssistReply::Unavailable);
        assert_eq!(assist.generate_json("hi"), AssistReply::Unavailable);
    }

    #[test]
    fn test_extract_json_from_fenced_block() {
        let text = "Here you go:\n```json\n{\"bonus_scores\": {\"sage\": 2}}\n```\nthanks";
        let value = extract_json_block(text).unwrap();
        assert_eq!(value["bonus_scores"]["sage"], 2);
    }

    #[test]
    fn test_extract_json_from_plain_fence() {
        let text = "```\n{\"a\": 1}\n```";
        let value = extract_json_block(text).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_from_bare_braces() {
        let text = "noise before {\"a\": 1} noise after";
        let value = extract_json_block(text).unwrap();
        assert_eq!(value["a"], 1);
    }

    #[test]
    fn test_extract_json_garbage_is_none() {
        assert!(extract_json_block("no json here").is_none());
        assert!(extract_json_block("{broken").is_none());
    }

    #[test]
    fn test_bonus_prompt_names_every_archetype() {
        let catalog = crate::catalog::get_default_catalog();
        let prompt = bonus_prompt(catalog, &ScoreSet::zeroed(), "", "", "");
        for key in TypeKey::SCORED {
            assert!(prompt.contains(key.as_str()), "missing {}", key);
        }
        assert!(prompt.contains("bonus_scores"));
    }
}
