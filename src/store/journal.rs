use std::collections::VecDeque;
use std::sync::Arc;

use serde::Serialize;
use tokio::sync::{broadcast, RwLock};

use crate::models::journal::JournalEntry;

const EVENT_CAPACITY: usize = 256;

/// Change notifications for anything that renders the journal.
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum JournalEvent {
    EntryAdded { entry: JournalEntry },
    EntriesReplaced { count: usize },
    EntriesCleared,
}

/// Newest-first list of entries shared by the journal and insights views.
#[derive(Clone)]
pub struct JournalStore {
    entries: Arc<RwLock<VecDeque<JournalEntry>>>,
    events: broadcast::Sender<JournalEvent>,
}

impl JournalStore {
    pub fn new() -> Self {
        Self::with_capacity(EVENT_CAPACITY)
    }

    /// `capacity` bounds how far a subscriber may fall behind before it lags.
    pub fn with_capacity(capacity: usize) -> Self {
        let (events, _) = broadcast::channel(capacity);
        Self {
            entries: Arc::new(RwLock::new(VecDeque::new())),
            events,
        }
    }

    pub async fn add_entry(&self, entry: JournalEntry) {
        self.entries.write().await.push_front(entry.clone());
        self.publish(JournalEvent::EntryAdded { entry });
    }

    /// Swaps in a list fetched from remote storage, keeping its order.
    pub async fn replace_all(&self, entries: Vec<JournalEntry>) {
        let count = entries.len();
        *self.entries.write().await = entries.into();
        self.publish(JournalEvent::EntriesReplaced { count });
    }

    pub async fn clear(&self) {
        self.entries.write().await.clear();
        self.publish(JournalEvent::EntriesCleared);
    }

    pub async fn entries(&self) -> Vec<JournalEntry> {
        self.entries.read().await.iter().cloned().collect()
    }

    pub async fn len(&self) -> usize {
        self.entries.read().await.len()
    }

    /// Receives every event published after this call. A receiver that falls
    /// more than the channel capacity behind skips the missed events.
    pub fn subscribe(&self) -> broadcast::Receiver<JournalEvent> {
        self.events.subscribe()
    }

    #[cfg(test)]
    pub fn subscriber_count(&self) -> usize {
        self.events.receiver_count()
    }

    fn publish(&self, event: JournalEvent) {
        // No subscribers is fine; the store itself is the source of truth.
        let _ = self.events.send(event);
    }
}

impl Default for JournalStore {
    fn default() -> Self {
        Self::new()
    }
}
