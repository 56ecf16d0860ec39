//! Diagnosis scoring engine.
//!
//! Three stages, run in order:
//! 1. `score_answers` - deterministic raw scores from questionnaire answers
//! 2. `apply_bonus` - merge the assist-suggested bonus under validation
//! 3. `pick_top_type` - choose the winning archetype

use crate::types::{ScoreSet, TypeKey};
use serde_json::Value;
use std::collections::HashMap;

/// Weight of one questionnaire answer label.
///
/// Unknown labels count as "no" (weight 0).
pub fn choice_weight(label: &str) -> i64 {
    match label {
        "yes" => 3,
        "maybe" => 1,
        "neutral" => 1,
        _ => 0,
    }
}

/// Inclusive upper bound for a per-type bonus score
pub const BONUS_MAX: i64 = 5;

/// Compute raw scores from questionnaire answers.
///
/// `answers` maps question index to answer label; a missing index counts
/// as "no". Each question's weight accrues to the archetype assigned to it
/// in `assignment`; indexes past the end of the assignment list wrap around
/// the canonical archetype order so malformed configuration can never index
/// out of range.
pub fn score_answers(
    answers: &HashMap<usize, String>,
    question_count: usize,
    assignment: &[TypeKey],
) -> ScoreSet {
    let mut raw = ScoreSet::zeroed();

    for i in 0..question_count {
        let weight = answers.get(&i).map(|label| choice_weight(label)).unwrap_or(0);
        let key = assignment
            .get(i)
            .copied()
            .unwrap_or(TypeKey::SCORED[i % TypeKey::SCORED.len()]);
        raw.add(key, weight);
    }

    raw
}

/// Merge an untrusted bonus suggestion into the raw scores.
///
/// Each archetype's candidate value is coerced to an integer and clamped
/// to [0, BONUS_MAX]; a missing key means 0. Coercion failure on ANY key
/// abandons the whole bonus set: all bonuses fall back to zero and the
/// final scores equal the raw scores. A partially-bonused set never
/// escapes this function. An absent or non-object candidate is the normal
/// degraded path (zero bonus), not an error.
pub fn apply_bonus(raw: &ScoreSet, candidate: Option<&Value>) -> (ScoreSet, ScoreSet) {
    let zero = (ScoreSet::zeroed(), raw.clone());

    let Some(obj) = candidate.and_then(|v| v.as_object()) else {
        return zero;
    };

    let mut staged = ScoreSet::zeroed();
    for key in TypeKey::SCORED {
        match obj.get(key.as_str()) {
            None => staged.set(key, 0),
            Some(value) => match coerce_int(value) {
                Some(n) => staged.set(key, n.clamp(0, BONUS_MAX)),
                None => {
                    tracing::warn!(
                        "Bonus value for {} is not an integer ({}), discarding entire bonus set",
                        key,
                        value
                    );
                    return zero;
                }
            },
        }
    }

    let mut final_scores = raw.clone();
    for key in TypeKey::SCORED {
        final_scores.add(key, staged.get(key));
    }
    (staged, final_scores)
}

/// Integer coercion for bonus values: numbers truncate, numeric strings
/// parse, booleans count as 0/1, anything else fails.
fn coerce_int(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n
            .as_i64()
            .or_else(|| n.as_f64().map(|f| f.trunc() as i64)),
        Value::String(s) => s.trim().parse::<i64>().ok(),
        Value::Bool(b) => Some(i64::from(*b)),
        _ => None,
    }
}

/// Choose the archetype with the highest final score.
///
/// Ties resolve to the earliest key in `tie_break` - pass
/// [`TypeKey::SCORED`] for the committed canonical order.
pub fn pick_top_type(final_scores: &ScoreSet, tie_break: &[TypeKey]) -> TypeKey {
    let mut top = tie_break.first().copied().unwrap_or(TypeKey::SCORED[0]);
    let mut top_score = final_scores.get(top);

    for &key in tie_break {
        let score = final_scores.get(key);
        if score > top_score {
            top = key;
            top_score = score;
        }
    }

    top
}
