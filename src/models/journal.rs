use std::fmt;
use std::str::FromStr;

use chrono::{DateTime, Local, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::prompt::ReflectionPrompt;

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Mood {
    #[serde(rename = "very negative")]
    VeryNegative,
    #[serde(rename = "negative")]
    Negative,
    #[default]
    #[serde(rename = "neutral")]
    Neutral,
    #[serde(rename = "positive")]
    Positive,
    #[serde(rename = "very positive")]
    VeryPositive,
}

impl Mood {
    pub const ALL: [Mood; 5] = [
        Mood::VeryNegative,
        Mood::Negative,
        Mood::Neutral,
        Mood::Positive,
        Mood::VeryPositive,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            Mood::VeryNegative => "very negative",
            Mood::Negative => "negative",
            Mood::Neutral => "neutral",
            Mood::Positive => "positive",
            Mood::VeryPositive => "very positive",
        }
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Mood {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let normalized = s.trim().to_lowercase();
        Mood::ALL
            .into_iter()
            .find(|m| m.as_str() == normalized)
            .ok_or_else(|| format!("unknown mood: {s}"))
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct JournalEntry {
    pub id: Uuid,
    pub date: DateTime<Utc>,
    pub title: String,
    pub content: String,
    pub mood: Mood,
    pub prompt: Option<ReflectionPrompt>,
}

impl JournalEntry {
    pub fn new(
        title: String,
        content: String,
        mood: Mood,
        prompt: Option<ReflectionPrompt>,
    ) -> Self {
        Self {
            id: Uuid::new_v4(),
            date: Utc::now(),
            title,
            content,
            mood,
            prompt,
        }
    }

    /// Calendar day of the entry on this machine's clock.
    pub fn local_date(&self) -> NaiveDate {
        self.date.with_timezone(&Local).date_naive()
    }
}

/// Row shape of the remote `journal_entries` collection.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RemoteJournalEntry {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    pub user_id: String,
    pub title: String,
    pub content: String,
    pub mood: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub prompt: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub created_at: Option<String>,
}

impl RemoteJournalEntry {
    /// Insert payload; the server assigns `id` and `created_at`.
    pub fn for_upload(user_id: &str, entry: &JournalEntry) -> Self {
        Self {
            id: None,
            user_id: user_id.to_string(),
            title: entry.title.clone(),
            content: entry.content.clone(),
            mood: entry.mood.as_str().to_string(),
            prompt: entry.prompt.as_ref().map(|p| p.short_title.clone()),
            created_at: None,
        }
    }

    pub fn into_entry(self) -> JournalEntry {
        let id = self
            .id
            .as_deref()
            .and_then(|id| Uuid::parse_str(id).ok())
            .unwrap_or_else(Uuid::new_v4);
        let date = self
            .created_at
            .as_deref()
            .and_then(|raw| DateTime::parse_from_rfc3339(raw).ok())
            .map(|d| d.with_timezone(&Utc))
            .unwrap_or_else(Utc::now);
        let mood = self.mood.parse().unwrap_or_else(|e| {
            tracing::warn!(error = %e, "Unknown mood in remote entry, using neutral");
            Mood::Neutral
        });

        JournalEntry {
            id,
            date,
            title: self.title,
            content: self.content,
            mood,
            prompt: self.prompt.map(ReflectionPrompt::from_text),
        }
    }
}
