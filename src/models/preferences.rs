use chrono::NaiveTime;
use serde::{Deserialize, Serialize};

use crate::models::philosopher::DEFAULT_PHILOSOPHER;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct UserPreferences {
    pub is_dark_mode: bool,
    pub selected_philosopher: String,
    pub notifications_enabled: bool,
    pub reminder_time: Option<NaiveTime>,
    pub has_completed_onboarding: bool,
}

impl Default for UserPreferences {
    fn default() -> Self {
        Self {
            is_dark_mode: false,
            selected_philosopher: DEFAULT_PHILOSOPHER.to_string(),
            notifications_enabled: false,
            reminder_time: None,
            has_completed_onboarding: false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_partial_stored_value_fills_defaults() {
        let prefs: UserPreferences = serde_json::from_str(r#"{"is_dark_mode":true}"#).unwrap();
        assert!(prefs.is_dark_mode);
        assert_eq!(prefs.selected_philosopher, "Marcus Aurelius");
        assert!(!prefs.has_completed_onboarding);
    }
}
