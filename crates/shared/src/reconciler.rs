//! Drag reconciliation for items and folders.
//!
//! A reconciler turns the four UI drag events into provisional placements
//! (visible through the ordered reads while the gesture runs) and, on drop,
//! into exactly one persistence call. Provisional placements are always
//! derived from the committed [`PlacementCache`] plus the current target, never
//! from an earlier provisional result or a pending persistence response.

use crate::cache::PlacementCache;
use crate::gesture::{ActiveDrag, DragState};
use crate::models::{
    ContainerId, ContainerPulse, DropTarget, Folder, FolderDropTarget, FolderId, FolderPlacement,
    Item, ItemId, ItemPlacement, Side,
};
use crate::persistence::{self, FolderPlacementStore, ItemPlacementStore, PersistFuture};
use crate::position::PositionAllocator;
use crate::sibling::sort_siblings;

/// What a completed drop produced.
pub struct DropOutcome<P> {
    pub placement: P,
    /// Set when an item landed in a different container than it started in.
    pub pulse: Option<ContainerPulse>,
    /// The single persistence call for this gesture, not yet awaited.
    pub persist: PersistFuture,
}

impl<P: std::fmt::Debug> std::fmt::Debug for DropOutcome<P> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("DropOutcome")
            .field("placement", &self.placement)
            .field("pulse", &self.pulse)
            .finish_non_exhaustive()
    }
}

type ItemDrag = DragState<ItemId, ContainerId, ItemPlacement>;
type FolderDrag = DragState<FolderId, (), FolderPlacement>;

pub struct DragReconciler<S> {
    allocator: PositionAllocator,
    store: S,
    state: ItemDrag,
    /// Target behind the current provisional placement.
    target: Option<DropTarget>,
}

impl<S: ItemPlacementStore> DragReconciler<S> {
    pub fn new(allocator: PositionAllocator, store: S) -> Self {
        Self {
            allocator,
            store,
            state: DragState::Idle,
            target: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    pub fn active(&self) -> Option<&ActiveDrag<ItemId, ContainerId, ItemPlacement>> {
        self.state.active()
    }

    /// Record the dragged item and its source container. Ignored while
    /// another gesture runs or when the item is unknown.
    pub fn on_drag_start(&mut self, cache: &PlacementCache, id: &ItemId) -> bool {
        if self.state.is_dragging() {
            tracing::debug!(item = %id, "Ignoring drag start while another drag is active");
            return false;
        }
        let Some(item) = cache.item(id) else {
            tracing::debug!(item = %id, "Ignoring drag start for unknown item");
            return false;
        };
        self.target = None;
        self.state.start(id.clone(), item.container_id.clone())
    }

    /// Recompute the provisional placement for the hovered target.
    ///
    /// A stale target keeps the previous provisional placement. Once the
    /// dragged item itself is gone the placement is dropped and every later
    /// hover returns `None`.
    pub fn on_drag_over(&mut self, cache: &PlacementCache, target: &DropTarget) -> Option<&ItemPlacement> {
        let id = self.state.active()?.id.clone();
        if cache.item(&id).is_none() {
            tracing::debug!(item = %id, "Dragged item no longer exists");
            self.state.clear_provisional();
            self.target = None;
            return None;
        }
        match self.resolve(cache, &id, target) {
            Some(placement) => {
                self.state.set_provisional(placement);
                self.target = Some(target.clone());
            }
            None => tracing::debug!(item = %id, ?target, "Stale hover target"),
        }
        self.state.active()?.provisional.as_ref()
    }

    /// Re-derive the provisional placement after the committed data changed
    /// under a running gesture. The placement is dropped when the dragged
    /// item or the hovered target no longer exists.
    pub fn refresh(&mut self, cache: &PlacementCache) {
        let Some(drag) = self.state.active() else {
            return;
        };
        let placement = self
            .target
            .as_ref()
            .and_then(|target| self.resolve(cache, &drag.id, target));
        match placement {
            Some(placement) => self.state.set_provisional(placement),
            None => {
                self.state.clear_provisional();
                self.target = None;
            }
        }
    }

    /// Commit the drop locally and issue the one persistence call.
    ///
    /// Returns `None` (and persists nothing) when idle or when the target or
    /// the dragged item is gone. The gesture ends either way.
    pub fn on_drag_end(&mut self, cache: &mut PlacementCache, target: &DropTarget) -> Option<DropOutcome<ItemPlacement>> {
        let drag = self.state.finish()?;
        self.target = None;
        let Some(placement) = self.resolve(cache, &drag.id, target) else {
            tracing::debug!(item = %drag.id, ?target, "Dropped on stale target; nothing to persist");
            return None;
        };

        cache.apply_item_placement(&placement);
        let pulse = (placement.container_id != drag.origin).then(|| ContainerPulse {
            container_id: placement.container_id.clone(),
        });
        tracing::info!(
            item = %placement.id,
            container = ?placement.container_id,
            position = %placement.position,
            rebalanced = placement.rebalanced.len(),
            "Item dropped"
        );

        let persist = persistence::logged(
            "item",
            placement.id.to_string(),
            self.store.update_item_placement(placement.clone()),
        );
        Some(DropOutcome {
            placement,
            pulse,
            persist,
        })
    }

    /// Discard the gesture. No persistence, no mutation.
    pub fn on_drag_cancel(&mut self) -> bool {
        self.target = None;
        self.state.cancel()
    }

    /// Items of one container in display order, including the provisional
    /// placement of a running gesture.
    pub fn ordered_items(&self, cache: &PlacementCache, container: &ContainerId) -> Vec<Item> {
        let provisional = self
            .state
            .active()
            .and_then(|d| d.provisional.as_ref())
            .filter(|p| cache.item(&p.id).is_some() && cache.has_container(&p.container_id));
        let view = cache.items().map(|item| match provisional {
            Some(p) => overlay_item(item, p),
            None => item.clone(),
        });
        sort_siblings(view.filter(|i| &i.container_id == container))
    }

    fn resolve(&self, cache: &PlacementCache, id: &ItemId, target: &DropTarget) -> Option<ItemPlacement> {
        cache.item(id)?;
        let (container, slot) = match target {
            DropTarget::Item { id: anchor_id, side } => {
                if anchor_id == id {
                    return None;
                }
                let anchor = cache.item(anchor_id)?;
                (anchor.container_id.clone(), Slot::Beside(anchor_id.clone(), *side))
            }
            DropTarget::ContainerHeader { container_id } => (container_id.clone(), Slot::First),
            DropTarget::ContainerFooter { container_id } => (container_id.clone(), Slot::Last),
            DropTarget::Unassigned => (None, Slot::First),
        };
        if !cache.has_container(&container) {
            return None;
        }

        let siblings: Vec<&Item> = cache.items_in(&container).filter(|i| &i.id != id).collect();
        let alloc = match slot {
            Slot::First => self.allocator.first_position(&siblings),
            Slot::Last => self.allocator.last_position(&siblings),
            Slot::Beside(anchor, Side::Before) => self.allocator.position_before_sibling(&anchor, &siblings),
            Slot::Beside(anchor, Side::After) => self.allocator.position_after_sibling(&anchor, &siblings),
        };
        Some(ItemPlacement {
            id: id.clone(),
            container_id: container,
            position: alloc.position,
            rebalanced: alloc.rebalanced,
        })
    }
}

/// Where in the target container a drop lands.
enum Slot {
    First,
    Last,
    Beside(ItemId, Side),
}

fn overlay_item(item: &Item, placement: &ItemPlacement) -> Item {
    let mut item = item.clone();
    if item.id == placement.id {
        item.container_id = placement.container_id.clone();
        item.position = placement.position.clone();
    } else if let Some(rekey) = placement.rebalanced.iter().find(|r| r.id == item.id) {
        item.position = rekey.position.clone();
    }
    item
}

pub struct FolderReconciler<S> {
    allocator: PositionAllocator,
    store: S,
    state: FolderDrag,
    target: Option<FolderDropTarget>,
}

impl<S: FolderPlacementStore> FolderReconciler<S> {
    pub fn new(allocator: PositionAllocator, store: S) -> Self {
        Self {
            allocator,
            store,
            state: DragState::Idle,
            target: None,
        }
    }

    pub fn is_dragging(&self) -> bool {
        self.state.is_dragging()
    }

    pub fn active(&self) -> Option<&ActiveDrag<FolderId, (), FolderPlacement>> {
        self.state.active()
    }

    pub fn on_drag_start(&mut self, cache: &PlacementCache, id: &FolderId) -> bool {
        if self.state.is_dragging() {
            tracing::debug!(folder = %id, "Ignoring drag start while another drag is active");
            return false;
        }
        if cache.folder(id).is_none() {
            tracing::debug!(folder = %id, "Ignoring drag start for unknown folder");
            return false;
        }
        self.target = None;
        self.state.start(id.clone(), ())
    }

    pub fn on_drag_over(&mut self, cache: &PlacementCache, target: &FolderDropTarget) -> Option<&FolderPlacement> {
        let id = self.state.active()?.id.clone();
        if cache.folder(&id).is_none() {
            tracing::debug!(folder = %id, "Dragged folder no longer exists");
            self.state.clear_provisional();
            self.target = None;
            return None;
        }
        match self.resolve(cache, &id, target) {
            Some(placement) => {
                self.state.set_provisional(placement);
                self.target = Some(target.clone());
            }
            None => tracing::debug!(folder = %id, ?target, "Stale hover target"),
        }
        self.state.active()?.provisional.as_ref()
    }

    pub fn refresh(&mut self, cache: &PlacementCache) {
        let Some(drag) = self.state.active() else {
            return;
        };
        let placement = self
            .target
            .as_ref()
            .and_then(|target| self.resolve(cache, &drag.id, target));
        match placement {
            Some(placement) => self.state.set_provisional(placement),
            None => {
                self.state.clear_provisional();
                self.target = None;
            }
        }
    }

    pub fn on_drag_end(
        &mut self,
        cache: &mut PlacementCache,
        target: &FolderDropTarget,
    ) -> Option<DropOutcome<FolderPlacement>> {
        let drag = self.state.finish()?;
        self.target = None;
        let Some(placement) = self.resolve(cache, &drag.id, target) else {
            tracing::debug!(folder = %drag.id, ?target, "Dropped on stale target; nothing to persist");
            return None;
        };

        cache.apply_folder_placement(&placement);
        tracing::info!(
            folder = %placement.id,
            position = %placement.position,
            rebalanced = placement.rebalanced.len(),
            "Folder dropped"
        );

        let persist = persistence::logged(
            "folder",
            placement.id.to_string(),
            self.store.update_folder_placement(placement.clone()),
        );
        Some(DropOutcome {
            placement,
            pulse: None,
            persist,
        })
    }

    pub fn on_drag_cancel(&mut self) -> bool {
        self.target = None;
        self.state.cancel()
    }

    pub fn ordered_folders(&self, cache: &PlacementCache) -> Vec<Folder> {
        let provisional = self
            .state
            .active()
            .and_then(|d| d.provisional.as_ref())
            .filter(|p| cache.folder(&p.id).is_some());
        sort_siblings(cache.folders().map(|folder| {
            let mut folder = folder.clone();
            if let Some(p) = provisional {
                if folder.id == p.id {
                    folder.position = p.position.clone();
                } else if let Some(rekey) = p.rebalanced.iter().find(|r| r.id == folder.id) {
                    folder.position = rekey.position.clone();
                }
            }
            folder
        }))
    }

    fn resolve(&self, cache: &PlacementCache, id: &FolderId, target: &FolderDropTarget) -> Option<FolderPlacement> {
        cache.folder(id)?;
        let siblings: Vec<&Folder> = cache.folders().filter(|f| &f.id != id).collect();
        let alloc = match target {
            FolderDropTarget::Folder { id: anchor_id, side } => {
                if anchor_id == id {
                    return None;
                }
                cache.folder(anchor_id)?;
                match side {
                    Side::Before => self.allocator.position_before_sibling(anchor_id, &siblings),
                    Side::After => self.allocator.position_after_sibling(anchor_id, &siblings),
                }
            }
            FolderDropTarget::ListHeader => self.allocator.first_position(&siblings),
            FolderDropTarget::ListFooter => self.allocator.last_position(&siblings),
        };
        Some(FolderPlacement {
            id: id.clone(),
            position: alloc.position,
            rebalanced: alloc.rebalanced,
        })
    }
}
