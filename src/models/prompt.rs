use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReflectionPrompt {
    pub short_title: String,
    pub full_prompt: String,
}

impl ReflectionPrompt {
    /// A prompt that only has a single line of text, e.g. a quote picked from
    /// the pause feed or a prompt read back from remote storage.
    pub fn from_text(text: impl Into<String>) -> Self {
        let text = text.into();
        Self {
            short_title: text.clone(),
            full_prompt: text,
        }
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct ReflectionTopic {
    pub title: String,
    pub prompts: Vec<ReflectionPrompt>,
}

const CATALOG: &[(&str, [(&str, &str); 3])] = &[
    (
        "self-awareness",
        [
            ("current state of mind", "take a moment to observe your current state of mind. what thoughts and feelings are present?"),
            ("personal growth", "what aspect of yourself would you like to understand better or improve?"),
            ("daily patterns", "what patterns or habits have you noticed about yourself lately?"),
        ],
    ),
    (
        "gratitude",
        [
            ("simple joys", "what's something simple that brought you joy today?"),
            ("helpful people", "who made your life easier this week? how did they impact you?"),
            ("challenging growth", "what challenge are you grateful for in hindsight? how did it help you grow?"),
        ],
    ),
    (
        "emotional clarity",
        [
            ("emotional awareness", "what emotion has been most present in your life lately? how does it manifest?"),
            ("emotional triggers", "what situations tend to trigger strong emotional responses in you?"),
            ("emotional balance", "how do you maintain emotional balance in challenging situations?"),
        ],
    ),
    (
        "values",
        [
            ("core values", "what values are most important to you? how do they guide your decisions?"),
            ("living values", "how well are your current actions aligned with your core values?"),
            ("value conflicts", "when have your values been challenged recently? how did you handle it?"),
        ],
    ),
    (
        "fear & acceptance",
        [
            ("current fears", "what fears or anxieties are you currently facing? what lies beneath them?"),
            ("acceptance journey", "what aspect of your life are you learning to accept? how has this process been?"),
            ("growth through fear", "how has facing your fears contributed to your personal growth?"),
        ],
    ),
    (
        "relationships",
        [
            ("connection quality", "how would you describe the quality of your relationships right now?"),
            ("relationship patterns", "what patterns do you notice in your relationships? what might they reveal?"),
            ("boundaries", "how well are you maintaining healthy boundaries in your relationships?"),
        ],
    ),
    (
        "discipline",
        [
            ("daily practice", "what daily practices help you maintain discipline in your life?"),
            ("resistance", "what do you resist most in your daily routine? why might that be?"),
            ("commitment", "how do you stay committed to your goals when motivation fades?"),
        ],
    ),
];

pub fn topics() -> Vec<ReflectionTopic> {
    CATALOG
        .iter()
        .map(|(title, prompts)| ReflectionTopic {
            title: title.to_string(),
            prompts: prompts
                .iter()
                .map(|(short, full)| ReflectionPrompt {
                    short_title: short.to_string(),
                    full_prompt: full.to_string(),
                })
                .collect(),
        })
        .collect()
}

/// Looks up a catalog prompt by its short title (case-insensitive).
pub fn find_prompt(short_title: &str) -> Option<ReflectionPrompt> {
    let needle = short_title.trim();
    CATALOG
        .iter()
        .flat_map(|(_, prompts)| prompts.iter())
        .find(|(short, _)| short.eq_ignore_ascii_case(needle))
        .map(|(short, full)| ReflectionPrompt {
            short_title: short.to_string(),
            full_prompt: full.to_string(),
        })
}
