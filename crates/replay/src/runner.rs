use campaign_shared::models::{ContainerId, ContainerPulse, Folder, FolderId, Item, ItemId};
use campaign_shared::persistence::PersistFuture;
use campaign_shared::{Board, ConfigError, OrderingConfig, PersistenceError};
use serde::Serialize;
use tokio::task::JoinHandle;

use crate::journal::{JournalEntry, JournalStore};
use crate::scenario::{Scenario, Step};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ContainerReport {
    pub container_id: ContainerId,
    pub items: Vec<Item>,
}

/// Final state of a replayed scenario.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub folders: Vec<Folder>,
    /// Unassigned group first, then one entry per folder in folder order.
    pub containers: Vec<ContainerReport>,
    pub journal: Vec<JournalEntry>,
    pub pulses: Vec<ContainerPulse>,
    pub failed_persists: usize,
    /// Steps the board ignored: double or blocked starts, drops on stale
    /// targets, removals of unknown ids, events while idle. A stale hover
    /// keeps the previous provisional placement and counts as applied, unless
    /// no placement was ever established.
    pub ignored_steps: usize,
}

/// Replay every step against a fresh board, letting persistence calls run
/// in the background, then collect the outcome once they have all settled.
pub async fn run(scenario: Scenario, config: OrderingConfig) -> Result<Report, ConfigError> {
    let store = JournalStore::new(scenario.reject_persistence);
    let mut board = Board::new(config, store.clone(), store.clone(), scenario.items, scenario.folders)?;
    let mut pending: Vec<JoinHandle<Result<(), PersistenceError>>> = Vec::new();
    let mut pulses = Vec::new();
    let mut ignored_steps = 0;

    for (index, step) in scenario.steps.iter().enumerate() {
        tracing::debug!(index, ?step, "Replaying step");
        let applied = match step {
            Step::DragStart { id } => board.on_drag_start(id),
            Step::DragOver { target } => board.on_drag_over(target).is_some(),
            Step::DragEnd { target } => match board.on_drag_end(target) {
                Some(outcome) => {
                    pulses.extend(outcome.pulse);
                    pending.push(spawn(outcome.persist));
                    true
                }
                None => false,
            },
            Step::DragCancel => board.on_drag_cancel(),
            Step::FolderDragStart { id } => board.on_folder_drag_start(id),
            Step::FolderDragOver { target } => board.on_folder_drag_over(target).is_some(),
            Step::FolderDragEnd { target } => match board.on_folder_drag_end(target) {
                Some(outcome) => {
                    pending.push(spawn(outcome.persist));
                    true
                }
                None => false,
            },
            Step::FolderDragCancel => board.on_folder_drag_cancel(),
            Step::CreateItem { id, container_id } => {
                let id = id.clone().unwrap_or_else(ItemId::generate);
                board.create_item(id, container_id.clone());
                true
            }
            Step::CreateFolder { id } => {
                let id = id.clone().unwrap_or_else(FolderId::generate);
                board.create_folder(id);
                true
            }
            Step::RemoveItem { id } => board.remove_item(id).is_some(),
            Step::RemoveFolder { id } => board.remove_folder(id).is_some(),
        };
        if !applied {
            tracing::debug!(index, "Step had no effect");
            ignored_steps += 1;
        }
    }

    let mut failed_persists = 0;
    for handle in pending {
        match handle.await {
            Ok(Ok(())) => {}
            Ok(Err(_)) => failed_persists += 1,
            Err(err) => {
                tracing::error!(error = %err, "Persistence task did not complete");
                failed_persists += 1;
            }
        }
    }

    let folders = board.get_ordered_folders();
    let containers = std::iter::once(None)
        .chain(folders.iter().map(|f| Some(f.id.clone())))
        .map(|container_id| ContainerReport {
            items: board.get_ordered_items(&container_id),
            container_id,
        })
        .collect();

    tracing::info!(
        steps = scenario.steps.len(),
        persisted = store.entries().len(),
        failed = failed_persists,
        "Replay finished"
    );

    Ok(Report {
        folders,
        containers,
        journal: store.entries(),
        pulses,
        failed_persists,
        ignored_steps,
    })
}

fn spawn(persist: PersistFuture) -> JoinHandle<Result<(), PersistenceError>> {
    tokio::spawn(persist)
}

#[cfg(test)]
mod tests {
    use super::*;
    use campaign_shared::OrderKey;

    fn scenario(json: &str) -> Scenario {
        Scenario::parse(json).unwrap()
    }

    fn ids(report: &Report, container: usize) -> Vec<&str> {
        report.containers[container].items.iter().map(|i| i.id.as_str()).collect()
    }

    const BOARD: &str = r#"
        "folders": [{ "id": "F1", "position": "1" }, { "id": "F2", "position": "2" }],
        "items": [
            { "id": "A", "containerId": "F1", "position": "1" },
            { "id": "B", "containerId": "F1", "position": "2" },
            { "id": "C", "containerId": null, "position": "1" }
        ]
    "#;

    #[tokio::test]
    async fn test_replay_cross_container_drop() {
        let scenario = scenario(&format!(
            r#"{{ {BOARD}, "steps": [
                {{ "step": "dragStart", "id": "C" }},
                {{ "step": "dragOver", "target": {{ "kind": "unassigned" }} }},
                {{ "step": "dragOver", "target": {{ "kind": "item", "id": "B", "side": "before" }} }},
                {{ "step": "dragEnd", "target": {{ "kind": "item", "id": "B", "side": "before" }} }}
            ] }}"#
        ));
        let report = run(scenario, OrderingConfig::default()).await.unwrap();

        assert!(ids(&report, 0).is_empty());
        assert_eq!(ids(&report, 1), vec!["A", "C", "B"]);
        assert_eq!(report.journal.len(), 1);
        assert_eq!(
            report.pulses,
            vec![ContainerPulse {
                container_id: Some(FolderId::new("F1"))
            }]
        );
        assert_eq!(report.failed_persists, 0);
        assert_eq!(report.ignored_steps, 0);
    }

    #[tokio::test]
    async fn test_replay_cancel_and_stale_steps() {
        let scenario = scenario(&format!(
            r#"{{ {BOARD}, "steps": [
                {{ "step": "dragStart", "id": "A" }},
                {{ "step": "dragStart", "id": "B" }},
                {{ "step": "folderDragStart", "id": "F1" }},
                {{ "step": "dragOver", "target": {{ "kind": "unassigned" }} }},
                {{ "step": "dragCancel" }},
                {{ "step": "dragStart", "id": "A" }},
                {{ "step": "dragEnd", "target": {{ "kind": "item", "id": "gone", "side": "after" }} }}
            ] }}"#
        ));
        let report = run(scenario, OrderingConfig::default()).await.unwrap();

        assert_eq!(ids(&report, 1), vec!["A", "B"]);
        assert!(report.journal.is_empty());
        assert_eq!(report.ignored_steps, 3);
    }

    #[tokio::test]
    async fn test_stale_hover_counting() {
        let scenario = scenario(&format!(
            r#"{{ {BOARD}, "steps": [
                {{ "step": "dragStart", "id": "C" }},
                {{ "step": "dragOver", "target": {{ "kind": "item", "id": "gone", "side": "after" }} }},
                {{ "step": "dragOver", "target": {{ "kind": "unassigned" }} }},
                {{ "step": "dragOver", "target": {{ "kind": "item", "id": "gone", "side": "after" }} }},
                {{ "step": "dragCancel" }}
            ] }}"#
        ));
        let report = run(scenario, OrderingConfig::default()).await.unwrap();

        // Only the first stale hover had nothing to fall back on.
        assert_eq!(report.ignored_steps, 1);
        assert!(report.journal.is_empty());
    }

    #[tokio::test]
    async fn test_invalid_config_fails_run() {
        let config = OrderingConfig {
            max_key_len: 0,
            rebalance_key_len: 0,
        };
        let err = run(scenario(&format!("{{ {BOARD} }}")), config).await.unwrap_err();
        assert!(matches!(err, ConfigError::MaxKeyLen { .. }));
    }

    #[tokio::test]
    async fn test_rejected_persistence_keeps_local_order() {
        let scenario = scenario(&format!(
            r#"{{ {BOARD}, "rejectPersistence": true, "steps": [
                {{ "step": "folderDragStart", "id": "F2" }},
                {{ "step": "folderDragEnd", "target": {{ "kind": "listHeader" }} }},
                {{ "step": "dragStart", "id": "B" }},
                {{ "step": "dragEnd", "target": {{ "kind": "containerHeader", "containerId": "F1" }} }}
            ] }}"#
        ));
        let report = run(scenario, OrderingConfig::default()).await.unwrap();

        assert_eq!(report.failed_persists, 2);
        assert_eq!(report.journal.len(), 2);
        let folders: Vec<&str> = report.folders.iter().map(|f| f.id.as_str()).collect();
        assert_eq!(folders, vec!["F2", "F1"]);
        // F2 now reports before F1.
        assert_eq!(ids(&report, 2), vec!["B", "A"]);
        assert!(report.pulses.is_empty());
    }

    #[tokio::test]
    async fn test_create_and_remove_steps() {
        let scenario = scenario(&format!(
            r#"{{ {BOARD}, "steps": [
                {{ "step": "createItem", "id": "D", "containerId": "F2" }},
                {{ "step": "createItem", "containerId": null }},
                {{ "step": "createFolder", "id": "F3" }},
                {{ "step": "removeItem", "id": "A" }},
                {{ "step": "removeFolder", "id": "F1" }},
                {{ "step": "removeFolder", "id": "F1" }}
            ] }}"#
        ));
        let report = run(scenario, OrderingConfig::default()).await.unwrap();

        assert_eq!(report.containers.len(), 3);
        let unassigned = &report.containers[0].items;
        assert_eq!(unassigned.len(), 2);
        assert_eq!(unassigned[0].id.as_str(), "C");
        assert!(unassigned[1].position > OrderKey::parse("1").unwrap());
        assert_eq!(ids(&report, 1), vec!["D"]);
        assert!(ids(&report, 2).is_empty());
        assert_eq!(report.ignored_steps, 1);
        assert!(report.journal.is_empty());
    }

    #[tokio::test]
    async fn test_report_json_shape() {
        let report = run(scenario(&format!("{{ {BOARD} }}")), OrderingConfig::default()).await.unwrap();
        let json = serde_json::to_value(&report).unwrap();
        assert_eq!(json["containers"][0]["containerId"], serde_json::Value::Null);
        assert_eq!(json["containers"][1]["containerId"], "F1");
        assert_eq!(json["failedPersists"], 0);
        assert_eq!(json["folders"][1]["id"], "F2");
    }
}
