use std::cmp::Ordering;

use crate::models::{Folder, FolderId, Item, ItemId};
use crate::order_key::OrderKey;

/// Anything ordered among siblings by an order key.
pub trait Sibling {
    type Id: Ord + Clone;

    fn id(&self) -> &Self::Id;
    fn position(&self) -> &OrderKey;
}

impl Sibling for Item {
    type Id = ItemId;

    fn id(&self) -> &ItemId {
        &self.id
    }

    fn position(&self) -> &OrderKey {
        &self.position
    }
}

impl Sibling for Folder {
    type Id = FolderId;

    fn id(&self) -> &FolderId {
        &self.id
    }

    fn position(&self) -> &OrderKey {
        &self.position
    }
}

impl<T: Sibling> Sibling for &T {
    type Id = T::Id;

    fn id(&self) -> &T::Id {
        (*self).id()
    }

    fn position(&self) -> &OrderKey {
        (*self).position()
    }
}

/// Total order over siblings: position first, then id.
///
/// Two distinct entries never compare equal, even if their keys collide.
pub fn compare<T: Sibling>(a: &T, b: &T) -> Ordering {
    a.position()
        .cmp(b.position())
        .then_with(|| a.id().cmp(b.id()))
}

/// Stable sort by [`compare`]. Every ordered read goes through here.
pub fn sort_siblings<T: Sibling>(items: impl IntoIterator<Item = T>) -> Vec<T> {
    let mut items: Vec<T> = items.into_iter().collect();
    items.sort_by(compare);
    items
}
