//! Built-in archetype catalog and questionnaire.
//!
//! The eight archetypes, their display info, the 32-question diagnosis
//! questionnaire and its per-question archetype assignment, quest category
//! labels, and the legacy type-key alias table all live here as frozen
//! data.

use crate::types::TypeKey;
use once_cell::sync::Lazy;
use std::collections::HashMap;

/// Display information for one archetype
#[derive(Clone, Debug)]
pub struct TypeInfo {
    pub name: &'static str,
    pub feature: &'static str,
    pub strength: &'static str,
    pub weakness: &'static str,
}

/// One questionnaire question: prompt plus the archetype it scores toward
#[derive(Clone, Debug)]
pub struct Question {
    pub prompt: &'static str,
    pub type_key: TypeKey,
}

/// The complete frozen catalog
#[derive(Clone, Debug)]
pub struct Catalog {
    pub type_info: HashMap<TypeKey, TypeInfo>,
    pub questions: Vec<Question>,
    pub category_labels: Vec<(&'static str, &'static str)>,
}

impl Catalog {
    /// Display info for an archetype, falling back to the common entry
    pub fn info(&self, key: TypeKey) -> &TypeInfo {
        self.type_info
            .get(&key)
            .unwrap_or_else(|| &self.type_info[&TypeKey::Common])
    }

    /// Per-question archetype assignment in question order
    pub fn assignment(&self) -> Vec<TypeKey> {
        self.questions.iter().map(|q| q.type_key).collect()
    }

    /// Human label for a quest category key
    pub fn category_label(&self, category: &str) -> Option<&'static str> {
        self.category_labels
            .iter()
            .find(|(key, _)| *key == category)
            .map(|(_, label)| *label)
    }
}

/// Cached default catalog - built once and reused across all operations
static DEFAULT_CATALOG: Lazy<Catalog> = Lazy::new(build_default_catalog);

/// Get a reference to the cached default catalog
pub fn get_default_catalog() -> &'static Catalog {
    &DEFAULT_CATALOG
}

/// Normalize an externally supplied type-key value.
///
/// Accepts current canonical keys and true legacy spellings; anything
/// unrecognized (including blank input) falls back to `common`.
pub fn normalize_type_key(raw: &str) -> TypeKey {
    match raw.trim() {
        "all" => TypeKey::Common,
        "fighter" => TypeKey::Monk,
        "wizard" => TypeKey::Mage,
        "rogue" => TypeKey::Thief,
        other => TypeKey::parse(other).unwrap_or(TypeKey::Common),
    }
}

/// Pick the first usable value from a multi-select form field and
/// normalize it; no usable value means `common`.
pub fn choose_type_key<'a, I>(values: I) -> TypeKey
where
    I: IntoIterator<Item = &'a str>,
{
    values
        .into_iter()
        .map(str::trim)
        .find(|v| !v.is_empty())
        .map(normalize_type_key)
        .unwrap_or(TypeKey::Common)
}

fn build_default_catalog() -> Catalog {
    let mut type_info = HashMap::new();

    type_info.insert(
        TypeKey::Sage,
        TypeInfo {
            name: "Sage",
            feature: "Analyst who thinks things through",
            strength: "Insight and planning",
            weakness: "Can be slow to act",
        },
    );
    type_info.insert(
        TypeKey::Monk,
        TypeInfo {
            name: "Monk",
            feature: "Drive and quick reflexes",
            strength: "Execution and energy",
            weakness: "Can be impulsive",
        },
    );
    type_info.insert(
        TypeKey::Priest,
        TypeInfo {
            name: "Priest",
            feature: "Compassion and support",
            strength: "Empathy and care",
            weakness: "Tends to put self last",
        },
    );
    type_info.insert(
        TypeKey::Mage,
        TypeInfo {
            name: "Mage",
            feature: "Creation and strategy",
            strength: "Imagination and strategy",
            weakness: "Practical chores can suffer",
        },
    );
    type_info.insert(
        TypeKey::Thief,
        TypeInfo {
            name: "Thief",
            feature: "Flexible adaptability",
            strength: "Wit and exploration",
            weakness: "Restless, hard to settle",
        },
    );
    type_info.insert(
        TypeKey::Artist,
        TypeInfo {
            name: "Artist",
            feature: "Expresses through feeling",
            strength: "Expressive power",
            weakness: "Output can be uneven",
        },
    );
    type_info.insert(
        TypeKey::Guardian,
        TypeInfo {
            name: "Guardian",
            feature: "Steadiness and trust",
            strength: "Stability",
            weakness: "Cautious about change",
        },
    );
    type_info.insert(
        TypeKey::Commander,
        TypeInfo {
            name: "Commander",
            feature: "Leads and decides",
            strength: "Leadership",
            weakness: "Can push too hard",
        },
    );
    type_info.insert(
        TypeKey::Common,
        TypeInfo {
            name: "Common",
            feature: "Applies to every archetype",
            strength: "-",
            weakness: "-",
        },
    );

    // Four consecutive questions per archetype, canonical order.
    let prompts: [(&str, TypeKey); 32] = [
        (
            "I over-analyze things and my decisions end up slow",
            TypeKey::Sage,
        ),
        (
            "I usually cannot move until I have a plan",
            TypeKey::Sage,
        ),
        (
            "I tend to put logic ahead of feelings",
            TypeKey::Sage,
        ),
        (
            "In arguments I chase correctness too far",
            TypeKey::Sage,
        ),
        (
            "I often act before I think",
            TypeKey::Monk,
        ),
        (
            "I act on impulse and reflect on it afterwards",
            TypeKey::Monk,
        ),
        (
            "When emotions run high I come on too strong",
            TypeKey::Monk,
        ),
        (
            "My blunt way of speaking gets misread",
            TypeKey::Monk,
        ),
        (
            "I hold back my own opinion thinking of others",
            TypeKey::Priest,
        ),
        (
            "I cannot help reaching out when someone is struggling",
            TypeKey::Priest,
        ),
        (
            "I am sensitive to feelings and empathy wears me out",
            TypeKey::Priest,
        ),
        (
            "I pick my words carefully so nobody gets hurt",
            TypeKey::Priest,
        ),
        (
            "My views shift with my mood",
            TypeKey::Mage,
        ),
        (
            "I sometimes act on whatever I feel in the moment",
            TypeKey::Mage,
        ),
        (
            "My emotional ups and downs feel intense",
            TypeKey::Mage,
        ),
        (
            "I find it hard to put feelings into words",
            TypeKey::Mage,
        ),
        (
            "Free and flexible thinking matters to me",
            TypeKey::Thief,
        ),
        (
            "I follow intuition rather than rules",
            TypeKey::Thief,
        ),
        (
            "Having my freedom limited stresses me",
            TypeKey::Thief,
        ),
        (
            "Acting alone feels easier than being in a group",
            TypeKey::Thief,
        ),
        (
            "I like seeing things from my own angle",
            TypeKey::Artist,
        ),
        (
            "I want to give shape to ideas as soon as they come",
            TypeKey::Artist,
        ),
        (
            "Small things move me deeply",
            TypeKey::Artist,
        ),
        (
            "I protect my inner world and dislike intrusion",
            TypeKey::Artist,
        ),
        (
            "I think carefully, looking for stability",
            TypeKey::Guardian,
        ),
        (
            "I choose certainty over risk",
            TypeKey::Guardian,
        ),
        (
            "Big changes make me anxious",
            TypeKey::Guardian,
        ),
        (
            "I value cooperation and teamwork",
            TypeKey::Guardian,
        ),
        (
            "I look at the whole picture and optimize the path",
            TypeKey::Commander,
        ),
        (
            "I often step up and take the lead",
            TypeKey::Commander,
        ),
        (
            "I keep emotions in check and stay composed",
            TypeKey::Commander,
        ),
        (
            "I often end up directing and instructing people",
            TypeKey::Commander,
        ),
    ];

    let questions = prompts
        .iter()
        .map(|&(prompt, type_key)| Question { prompt, type_key })
        .collect();

    let category_labels = vec![
        ("growth", "Growth"),
        ("communication", "Communication"),
        ("habits", "Habits"),
        ("action", "Action"),
        ("reflection", "Reflection"),
        ("self_understanding", "Self-understanding"),
        ("common", "All types"),
    ];

    Catalog {
        type_info,
        questions,
        category_labels,
    }
}
