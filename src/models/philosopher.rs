use rand::seq::SliceRandom;
use serde::Serialize;

pub const DEFAULT_PHILOSOPHER: &str = "Marcus Aurelius";
pub const FALLBACK_QUOTE: &str = "Wisdom comes from within.";

#[derive(Debug, Serialize)]
pub struct Philosopher {
    pub name: &'static str,
    pub title: &'static str,
    pub era: &'static str,
    pub philosophy: &'static str,
    pub quotes: &'static [&'static str],
}

pub static PHILOSOPHERS: [Philosopher; 3] = [
    Philosopher {
        name: "Marcus Aurelius",
        title: "Roman Emperor and Stoic Philosopher",
        era: "121-180 CE",
        philosophy: "Stoicism",
        quotes: &[
            "The happiness of your life depends upon the quality of your thoughts.",
            "Waste no more time arguing about what a good person should be. Be one.",
            "Everything we hear is an opinion, not a fact. Everything we see is a perspective, not the truth.",
            "Very little is needed to make a happy life; it is all within yourself, in your way of thinking.",
            "When you arise in the morning, think of what a precious privilege it is to be alive - to breathe, to think, to enjoy, to love.",
        ],
    },
    Philosopher {
        name: "Seneca",
        title: "Roman Stoic Philosopher",
        era: "4 BCE - 65 CE",
        philosophy: "Stoicism",
        quotes: &[
            "We suffer more often in imagination than in reality.",
            "Luck is what happens when preparation meets opportunity.",
            "As is a tale, so is life: not how long it is, but how good it is, is what matters.",
            "The greatest blessings of mankind are within us and within our reach.",
            "Life is long if you know how to use it.",
        ],
    },
    Philosopher {
        name: "Epictetus",
        title: "Greek Stoic Philosopher",
        era: "50-135 CE",
        philosophy: "Stoicism",
        quotes: &[
            "It's not what happens to you, but how you react to it that matters.",
            "First say to yourself what you would be; then do what you have to do.",
            "The key is to keep company only with people who uplift you.",
            "No man is free who is not master of himself.",
            "Don't explain your philosophy. Embody it.",
        ],
    },
];

impl Philosopher {
    pub fn by_name(name: &str) -> Option<&'static Philosopher> {
        PHILOSOPHERS.iter().find(|p| p.name == name)
    }

    /// Onboarding maps a self-described trait to a guide.
    pub fn for_trait(personality: &str) -> &'static Philosopher {
        match personality.trim().to_lowercase().as_str() {
            "stoic" => &PHILOSOPHERS[0],
            "analytical" => &PHILOSOPHERS[1],
            _ => &PHILOSOPHERS[2],
        }
    }

    pub fn random_quote(name: &str) -> &'static str {
        Self::by_name(name)
            .and_then(|p| p.quotes.choose(&mut rand::thread_rng()).copied())
            .unwrap_or(FALLBACK_QUOTE)
    }
}
