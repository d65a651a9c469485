use chrono::NaiveTime;
use serde::Deserialize;

use crate::error::{AppError, AppResult};
use crate::models::philosopher::Philosopher;
use crate::models::preferences::UserPreferences;
use crate::store::kv::KeyValueStore;

const PREFERENCES_KEY: &str = "preferences";

/// Partial update; absent fields keep their stored value.
#[derive(Debug, Default, Deserialize)]
pub struct PreferencesUpdate {
    pub is_dark_mode: Option<bool>,
    pub selected_philosopher: Option<String>,
    pub notifications_enabled: Option<bool>,
    pub reminder_time: Option<NaiveTime>,
}

#[derive(Clone)]
pub struct PreferencesStore {
    kv: KeyValueStore,
}

impl PreferencesStore {
    pub fn new(kv: KeyValueStore) -> Self {
        Self { kv }
    }

    pub async fn get(&self) -> UserPreferences {
        self.kv.get(PREFERENCES_KEY).await.unwrap_or_default()
    }

    pub async fn apply(&self, update: PreferencesUpdate) -> AppResult<UserPreferences> {
        let philosopher = match update.selected_philosopher.as_deref() {
            Some(name) => Some(
                Philosopher::by_name(name.trim())
                    .ok_or_else(|| AppError::Validation(format!("Unknown philosopher: {name}")))?,
            ),
            None => None,
        };

        self.modify(|prefs| {
            if let Some(philosopher) = philosopher {
                prefs.selected_philosopher = philosopher.name.to_string();
            }
            if let Some(dark) = update.is_dark_mode {
                prefs.is_dark_mode = dark;
            }
            if let Some(enabled) = update.notifications_enabled {
                prefs.notifications_enabled = enabled;
            }
            if let Some(time) = update.reminder_time {
                prefs.reminder_time = Some(time);
            }
        })
        .await
    }

    /// Finishes onboarding with the philosopher matching the chosen trait.
    pub async fn complete_onboarding(&self, personality: &str) -> AppResult<UserPreferences> {
        let philosopher = Philosopher::for_trait(personality);
        let prefs = self
            .modify(|prefs| {
                prefs.selected_philosopher = philosopher.name.to_string();
                prefs.has_completed_onboarding = true;
            })
            .await?;

        tracing::info!(philosopher = %prefs.selected_philosopher, "Onboarding completed");
        Ok(prefs)
    }

    /// Merges into the stored preferences inside one key-value transaction.
    async fn modify<F>(&self, f: F) -> AppResult<UserPreferences>
    where
        F: FnOnce(&mut UserPreferences),
    {
        self.kv
            .try_update(|values| {
                let mut prefs = match values.get(PREFERENCES_KEY) {
                    Some(raw) => serde_json::from_value(raw.clone()).unwrap_or_else(|e| {
                        tracing::warn!(error = %e, "Unreadable stored preferences, using defaults");
                        UserPreferences::default()
                    }),
                    None => UserPreferences::default(),
                };
                f(&mut prefs);
                values.insert(PREFERENCES_KEY.to_string(), serde_json::to_value(&prefs)?);
                Ok(prefs)
            })
            .await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn store(dir: &tempfile::TempDir) -> PreferencesStore {
        PreferencesStore::new(KeyValueStore::open(dir.path().join("store.json")).await.unwrap())
    }

    #[tokio::test]
    async fn test_defaults_when_unset() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = store(&dir).await.get().await;
        assert_eq!(prefs, UserPreferences::default());
    }

    #[tokio::test]
    async fn test_partial_update_persists() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = store(&dir)
            .await
            .apply(PreferencesUpdate {
                is_dark_mode: Some(true),
                selected_philosopher: Some("Seneca".into()),
                ..Default::default()
            })
            .await
            .unwrap();
        assert!(prefs.is_dark_mode);

        let reloaded = store(&dir).await.get().await;
        assert_eq!(reloaded.selected_philosopher, "Seneca");
        assert!(reloaded.is_dark_mode);
        assert!(!reloaded.notifications_enabled);
    }

    #[tokio::test]
    async fn test_unknown_philosopher_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let result = store(&dir)
            .await
            .apply(PreferencesUpdate {
                selected_philosopher: Some("Diogenes".into()),
                ..Default::default()
            })
            .await;
        assert!(matches!(result, Err(AppError::Validation(_))));
    }

    #[tokio::test]
    async fn test_onboarding_maps_trait() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = store(&dir).await.complete_onboarding("analytical").await.unwrap();
        assert_eq!(prefs.selected_philosopher, "Seneca");
        assert!(prefs.has_completed_onboarding);
    }

    #[tokio::test]
    async fn test_concurrent_updates_are_not_lost() {
        let dir = tempfile::tempdir().unwrap();
        let prefs = store(&dir).await;

        let mut tasks = Vec::new();
        for i in 0..20 {
            let prefs = prefs.clone();
            tasks.push(tokio::spawn(async move {
                let update = if i % 2 == 0 {
                    PreferencesUpdate { is_dark_mode: Some(true), ..Default::default() }
                } else {
                    PreferencesUpdate { notifications_enabled: Some(true), ..Default::default() }
                };
                prefs.apply(update).await.unwrap();
            }));
        }
        for task in tasks {
            task.await.unwrap();
        }

        let stored = prefs.get().await;
        assert!(stored.is_dark_mode);
        assert!(stored.notifications_enabled);
    }
}
