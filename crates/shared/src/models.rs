use serde::{Deserialize, Serialize};

use crate::order_key::OrderKey;

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ItemId(pub String);

#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct FolderId(pub String);

macro_rules! string_id {
    ($ty:ident) => {
        impl $ty {
            pub fn new(id: impl Into<String>) -> Self {
                $ty(id.into())
            }

            pub fn as_str(&self) -> &str {
                &self.0
            }

            /// Random v4 identifier for entries created locally.
            #[cfg(feature = "uuid-support")]
            pub fn generate() -> Self {
                $ty(uuid::Uuid::new_v4().to_string())
            }
        }

        impl std::fmt::Display for $ty {
            fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
                f.write_str(&self.0)
            }
        }

        impl From<&str> for $ty {
            fn from(s: &str) -> Self {
                $ty(s.to_string())
            }
        }
    };
}

string_id!(ItemId);
string_id!(FolderId);

/// Ordering namespace of an item: its folder, or `None` for the unassigned
/// group. The unassigned group orders exactly like a folder.
pub type ContainerId = Option<FolderId>;

/// A reorderable leaf, e.g. a map marker.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Item {
    pub id: ItemId,
    pub container_id: ContainerId,
    pub position: OrderKey,
}

/// Folder positions live in their own namespace and never interleave with
/// item positions.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Folder {
    pub id: FolderId,
    pub position: OrderKey,
}

/// A sibling whose key was re-derived by a rebalance.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Rekey<Id> {
    pub id: Id,
    pub position: OrderKey,
}

/// Payload of the single persistence call issued for a dropped item.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ItemPlacement {
    pub id: ItemId,
    pub container_id: ContainerId,
    pub position: OrderKey,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rebalanced: Vec<Rekey<ItemId>>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderPlacement {
    pub id: FolderId,
    pub position: OrderKey,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub rebalanced: Vec<Rekey<FolderId>>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Side {
    Before,
    After,
}

/// Hover or drop target of an item gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum DropTarget {
    /// Next to another item, inside that item's container.
    Item { id: ItemId, side: Side },
    /// First position of a container.
    #[serde(rename_all = "camelCase")]
    ContainerHeader { container_id: ContainerId },
    /// Last position of a container.
    #[serde(rename_all = "camelCase")]
    ContainerFooter { container_id: ContainerId },
    /// First position among unassigned items.
    Unassigned,
}

/// Hover or drop target of a folder gesture.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "camelCase")]
pub enum FolderDropTarget {
    Folder { id: FolderId, side: Side },
    ListHeader,
    ListFooter,
}

/// Transient highlight request for the container that received a
/// cross-container drop.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerPulse {
    pub container_id: ContainerId,
}
