use std::future::Future;
use std::pin::Pin;

use crate::error::PersistenceError;
use crate::models::{FolderPlacement, ItemPlacement};

/// Pending persistence call. The reconciler never awaits it; the host spawns
/// or awaits it as it sees fit.
pub type PersistFuture = Pin<Box<dyn Future<Output = Result<(), PersistenceError>> + Send + 'static>>;

/// External collaborator that stores item placements.
///
/// Called at most once per completed gesture. No retry happens inside the
/// engine.
pub trait ItemPlacementStore {
    fn update_item_placement(&self, placement: ItemPlacement) -> PersistFuture;
}

/// External collaborator that stores folder placements.
pub trait FolderPlacementStore {
    fn update_folder_placement(&self, placement: FolderPlacement) -> PersistFuture;
}

impl<T: ItemPlacementStore + ?Sized> ItemPlacementStore for std::sync::Arc<T> {
    fn update_item_placement(&self, placement: ItemPlacement) -> PersistFuture {
        (**self).update_item_placement(placement)
    }
}

impl<T: FolderPlacementStore + ?Sized> FolderPlacementStore for std::sync::Arc<T> {
    fn update_folder_placement(&self, placement: FolderPlacement) -> PersistFuture {
        (**self).update_folder_placement(placement)
    }
}

/// Wrap a store future so a failure is logged before it reaches the caller.
pub(crate) fn logged(entity: &'static str, id: String, future: PersistFuture) -> PersistFuture {
    Box::pin(async move {
        let result = future.await;
        if let Err(err) = &result {
            tracing::warn!(entity, id = %id, error = %err, "Placement was not persisted; keeping local order");
        }
        result
    })
}
