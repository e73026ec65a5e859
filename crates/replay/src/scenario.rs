use std::path::{Path, PathBuf};

use campaign_shared::models::{ContainerId, DropTarget, Folder, FolderDropTarget, FolderId, Item, ItemId};
use campaign_shared::{ConfigError, OrderingConfig};
use serde::Deserialize;

#[derive(Debug, thiserror::Error)]
pub enum ScenarioError {
    #[error("failed to read scenario {}: {source}", path.display())]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid scenario: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("invalid ordering config: {0}")]
    Config(#[from] ConfigError),
}

/// A recorded board plus the gesture events to replay against it.
#[derive(Debug, Clone, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Scenario {
    /// Overrides the environment-derived config when present.
    #[serde(default)]
    pub config: Option<OrderingConfig>,
    #[serde(default)]
    pub folders: Vec<Folder>,
    #[serde(default)]
    pub items: Vec<Item>,
    #[serde(default)]
    pub steps: Vec<Step>,
    /// Make every persistence call fail.
    #[serde(default)]
    pub reject_persistence: bool,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(tag = "step", rename_all = "camelCase")]
pub enum Step {
    DragStart {
        id: ItemId,
    },
    DragOver {
        target: DropTarget,
    },
    DragEnd {
        target: DropTarget,
    },
    DragCancel,
    FolderDragStart {
        id: FolderId,
    },
    FolderDragOver {
        target: FolderDropTarget,
    },
    FolderDragEnd {
        target: FolderDropTarget,
    },
    FolderDragCancel,
    CreateItem {
        #[serde(default)]
        id: Option<ItemId>,
        #[serde(default, rename = "containerId")]
        container_id: ContainerId,
    },
    CreateFolder {
        #[serde(default)]
        id: Option<FolderId>,
    },
    RemoveItem {
        id: ItemId,
    },
    RemoveFolder {
        id: FolderId,
    },
}

impl Scenario {
    pub fn load(path: &Path) -> Result<Self, ScenarioError> {
        let raw = std::fs::read_to_string(path).map_err(|source| ScenarioError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&raw)
    }

    pub fn parse(raw: &str) -> Result<Self, ScenarioError> {
        let scenario: Scenario = serde_json::from_str(raw)?;
        if let Some(config) = &scenario.config {
            config.validate()?;
        }
        Ok(scenario)
    }
}
