use std::collections::BTreeMap;

use crate::models::{ContainerId, Folder, FolderId, FolderPlacement, Item, ItemId, ItemPlacement};
use crate::position::PositionAllocator;

/// Local committed view of items and folders.
///
/// Loaded from the external data layer and updated optimistically when a
/// drop completes. A failed persistence call does not roll anything back.
#[derive(Debug, Clone, Default)]
pub struct PlacementCache {
    items: BTreeMap<ItemId, Item>,
    folders: BTreeMap<FolderId, Folder>,
}

impl PlacementCache {
    pub fn new(items: impl IntoIterator<Item = Item>, folders: impl IntoIterator<Item = Folder>) -> Self {
        let mut cache = Self::default();
        cache.sync(items, folders);
        cache
    }

    /// Replace the cached state with a fresh read from the data layer.
    pub fn sync(&mut self, items: impl IntoIterator<Item = Item>, folders: impl IntoIterator<Item = Folder>) {
        self.items = items.into_iter().map(|i| (i.id.clone(), i)).collect();
        self.folders = folders.into_iter().map(|f| (f.id.clone(), f)).collect();
    }

    pub fn item(&self, id: &ItemId) -> Option<&Item> {
        self.items.get(id)
    }

    pub fn folder(&self, id: &FolderId) -> Option<&Folder> {
        self.folders.get(id)
    }

    pub fn items(&self) -> impl Iterator<Item = &Item> {
        self.items.values()
    }

    pub fn folders(&self) -> impl Iterator<Item = &Folder> {
        self.folders.values()
    }

    /// Unordered members of one container.
    pub fn items_in<'a>(&'a self, container: &ContainerId) -> impl Iterator<Item = &'a Item> + 'a {
        let container = container.clone();
        self.items.values().filter(move |i| i.container_id == container)
    }

    /// Whether a container can receive items. The unassigned group always
    /// exists.
    pub fn has_container(&self, container: &ContainerId) -> bool {
        container.as_ref().map_or(true, |id| self.folders.contains_key(id))
    }

    /// Insert a new item at the end of its initial container.
    ///
    /// Replaces any existing item with the same id.
    pub fn create_item(&mut self, allocator: &PositionAllocator, id: ItemId, container: ContainerId) -> Item {
        self.items.remove(&id);
        let siblings: Vec<&Item> = self.items_in(&container).collect();
        let alloc = allocator.last_position(&siblings);
        for rekey in alloc.rebalanced {
            if let Some(item) = self.items.get_mut(&rekey.id) {
                item.position = rekey.position;
            }
        }
        let item = Item {
            id: id.clone(),
            container_id: container,
            position: alloc.position,
        };
        self.items.insert(id, item.clone());
        item
    }

    pub fn create_folder(&mut self, allocator: &PositionAllocator, id: FolderId) -> Folder {
        self.folders.remove(&id);
        let siblings: Vec<&Folder> = self.folders.values().collect();
        let alloc = allocator.last_position(&siblings);
        for rekey in alloc.rebalanced {
            if let Some(folder) = self.folders.get_mut(&rekey.id) {
                folder.position = rekey.position;
            }
        }
        let folder = Folder {
            id: id.clone(),
            position: alloc.position,
        };
        self.folders.insert(id, folder.clone());
        folder
    }

    pub fn remove_item(&mut self, id: &ItemId) -> Option<Item> {
        self.items.remove(id)
    }

    /// Remove a folder. Items still pointing at it are left alone; the data
    /// layer decides what happens to them.
    pub fn remove_folder(&mut self, id: &FolderId) -> Option<Folder> {
        self.folders.remove(id)
    }

    /// Commit a dropped placement locally: the moved item and any rekeyed
    /// siblings.
    pub fn apply_item_placement(&mut self, placement: &ItemPlacement) {
        if let Some(item) = self.items.get_mut(&placement.id) {
            item.container_id = placement.container_id.clone();
            item.position = placement.position.clone();
        }
        for rekey in &placement.rebalanced {
            if let Some(item) = self.items.get_mut(&rekey.id) {
                item.position = rekey.position.clone();
            }
        }
    }

    pub fn apply_folder_placement(&mut self, placement: &FolderPlacement) {
        if let Some(folder) = self.folders.get_mut(&placement.id) {
            folder.position = placement.position.clone();
        }
        for rekey in &placement.rebalanced {
            if let Some(folder) = self.folders.get_mut(&rekey.id) {
                folder.position = rekey.position.clone();
            }
        }
    }
}
