use crate::cache::PlacementCache;
use crate::config::OrderingConfig;
use crate::error::ConfigError;
use crate::models::{
    ContainerId, DropTarget, Folder, FolderDropTarget, FolderId, FolderPlacement, Item, ItemId, ItemPlacement,
};
use crate::persistence::{FolderPlacementStore, ItemPlacementStore};
use crate::position::PositionAllocator;
use crate::reconciler::{DragReconciler, DropOutcome, FolderReconciler};

/// Everything a UI layer needs to render and reorder one board of items and
/// folders.
///
/// The host owns the board and feeds it pointer events; there is no ambient
/// drag state anywhere else. Only one gesture runs at a time, whether it
/// moves an item or a folder.
pub struct Board<I, F> {
    allocator: PositionAllocator,
    cache: PlacementCache,
    items: DragReconciler<I>,
    folders: FolderReconciler<F>,
}

impl<I: ItemPlacementStore, F: FolderPlacementStore> Board<I, F> {
    /// Fails when `config` does not validate.
    pub fn new(
        config: OrderingConfig,
        item_store: I,
        folder_store: F,
        items: impl IntoIterator<Item = Item>,
        folders: impl IntoIterator<Item = Folder>,
    ) -> Result<Self, ConfigError> {
        let allocator = PositionAllocator::try_new(config)?;
        Ok(Self {
            allocator,
            cache: PlacementCache::new(items, folders),
            items: DragReconciler::new(allocator, item_store),
            folders: FolderReconciler::new(allocator, folder_store),
        })
    }

    pub fn cache(&self) -> &PlacementCache {
        &self.cache
    }

    pub fn is_dragging(&self) -> bool {
        self.items.is_dragging() || self.folders.is_dragging()
    }

    pub fn on_drag_start(&mut self, id: &ItemId) -> bool {
        if self.folders.is_dragging() {
            tracing::debug!(item = %id, "Ignoring item drag start during a folder drag");
            return false;
        }
        self.items.on_drag_start(&self.cache, id)
    }

    pub fn on_drag_over(&mut self, target: &DropTarget) -> Option<&ItemPlacement> {
        self.items.on_drag_over(&self.cache, target)
    }

    pub fn on_drag_end(&mut self, target: &DropTarget) -> Option<DropOutcome<ItemPlacement>> {
        self.items.on_drag_end(&mut self.cache, target)
    }

    pub fn on_drag_cancel(&mut self) -> bool {
        self.items.on_drag_cancel()
    }

    pub fn on_folder_drag_start(&mut self, id: &FolderId) -> bool {
        if self.items.is_dragging() {
            tracing::debug!(folder = %id, "Ignoring folder drag start during an item drag");
            return false;
        }
        self.folders.on_drag_start(&self.cache, id)
    }

    pub fn on_folder_drag_over(&mut self, target: &FolderDropTarget) -> Option<&FolderPlacement> {
        self.folders.on_drag_over(&self.cache, target)
    }

    pub fn on_folder_drag_end(&mut self, target: &FolderDropTarget) -> Option<DropOutcome<FolderPlacement>> {
        self.folders.on_drag_end(&mut self.cache, target)
    }

    pub fn on_folder_drag_cancel(&mut self) -> bool {
        self.folders.on_drag_cancel()
    }

    /// Members of `container` in display order, provisional moves included.
    pub fn get_ordered_items(&self, container: &ContainerId) -> Vec<Item> {
        self.items.ordered_items(&self.cache, container)
    }

    pub fn get_ordered_folders(&self) -> Vec<Folder> {
        self.folders.ordered_folders(&self.cache)
    }

    /// Add an item at the end of `container`. Storing the new item is up to
    /// the data layer; this only assigns its position.
    pub fn create_item(&mut self, id: ItemId, container: ContainerId) -> Item {
        let item = self.cache.create_item(&self.allocator, id, container);
        tracing::debug!(item = %item.id, position = %item.position, "Item created");
        self.refresh_gestures();
        item
    }

    pub fn create_folder(&mut self, id: FolderId) -> Folder {
        let folder = self.cache.create_folder(&self.allocator, id);
        tracing::debug!(folder = %folder.id, position = %folder.position, "Folder created");
        self.refresh_gestures();
        folder
    }

    pub fn remove_item(&mut self, id: &ItemId) -> Option<Item> {
        let removed = self.cache.remove_item(id);
        self.refresh_gestures();
        removed
    }

    pub fn remove_folder(&mut self, id: &FolderId) -> Option<Folder> {
        let removed = self.cache.remove_folder(id);
        self.refresh_gestures();
        removed
    }

    /// Replace committed data with a fresh read. A running gesture keeps going
    /// with its placement re-derived against the new data.
    pub fn sync(&mut self, items: impl IntoIterator<Item = Item>, folders: impl IntoIterator<Item = Folder>) {
        self.cache.sync(items, folders);
        self.refresh_gestures();
    }

    fn refresh_gestures(&mut self) {
        self.items.refresh(&self.cache);
        self.folders.refresh(&self.cache);
    }
}
