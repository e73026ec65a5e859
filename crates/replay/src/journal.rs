use std::sync::{Arc, Mutex};

use campaign_shared::models::{FolderPlacement, ItemPlacement};
use campaign_shared::persistence::{FolderPlacementStore, ItemPlacementStore, PersistFuture};
use campaign_shared::PersistenceError;
use serde::Serialize;

/// One persistence call, in the order the board issued it.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "entity", rename_all = "camelCase")]
pub enum JournalEntry {
    Item(ItemPlacement),
    Folder(FolderPlacement),
}

/// In-memory stand-in for the data layer. Records every call and answers
/// after a scheduler yield, optionally with a rejection.
#[derive(Debug, Clone, Default)]
pub struct JournalStore {
    entries: Arc<Mutex<Vec<JournalEntry>>>,
    reject: bool,
}

impl JournalStore {
    pub fn new(reject: bool) -> Self {
        Self {
            entries: Arc::default(),
            reject,
        }
    }

    pub fn entries(&self) -> Vec<JournalEntry> {
        self.entries.lock().map(|e| e.clone()).unwrap_or_default()
    }

    fn record(&self, entry: JournalEntry) -> PersistFuture {
        if let Ok(mut entries) = self.entries.lock() {
            entries.push(entry);
        }
        let reject = self.reject;
        Box::pin(async move {
            tokio::task::yield_now().await;
            if reject {
                Err(PersistenceError::Rejected("journal is read-only".to_string()))
            } else {
                Ok(())
            }
        })
    }
}

impl ItemPlacementStore for JournalStore {
    fn update_item_placement(&self, placement: ItemPlacement) -> PersistFuture {
        self.record(JournalEntry::Item(placement))
    }
}

impl FolderPlacementStore for JournalStore {
    fn update_folder_placement(&self, placement: FolderPlacement) -> PersistFuture {
        self.record(JournalEntry::Folder(placement))
    }
}
