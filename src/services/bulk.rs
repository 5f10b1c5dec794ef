use std::fmt;

use uuid::Uuid;

use crate::{
    models::{
        campaign::{Campaign, CampaignStatus},
        store::Store,
    },
    services::campaigns::{
        DuplicateCampaignParameters, activate_campaign, archive_campaign, delete_campaign,
        duplicate_campaign, pause_campaign, restore_campaign,
    },
    storage::Storage,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum BulkAction {
    Activate,
    Pause,
    Archive,
    Restore,
    Duplicate,
    Delete,
}

impl BulkAction {
    pub const ALL: [BulkAction; 6] = [
        BulkAction::Activate,
        BulkAction::Pause,
        BulkAction::Archive,
        BulkAction::Restore,
        BulkAction::Duplicate,
        BulkAction::Delete,
    ];

    /// Destructive or hard-to-undo actions ask before running
    pub fn requires_confirmation(&self) -> bool {
        matches!(self, BulkAction::Delete | BulkAction::Archive)
    }

    fn allows(&self, status: CampaignStatus) -> bool {
        match self {
            BulkAction::Activate => {
                matches!(status, CampaignStatus::Draft | CampaignStatus::Paused)
            }
            BulkAction::Pause => status == CampaignStatus::Active,
            BulkAction::Archive => status != CampaignStatus::Archived,
            BulkAction::Restore => status == CampaignStatus::Archived,
            BulkAction::Duplicate => true,
            BulkAction::Delete => status == CampaignStatus::Draft,
        }
    }
}

impl fmt::Display for BulkAction {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            BulkAction::Activate => "activate",
            BulkAction::Pause => "pause",
            BulkAction::Archive => "archive",
            BulkAction::Restore => "restore",
            BulkAction::Duplicate => "duplicate",
            BulkAction::Delete => "delete",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for BulkAction {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        BulkAction::ALL
            .into_iter()
            .find(|action| action.to_string().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| format!("Unknown bulk action '{}'", s))
    }
}

/// An action is enabled only when every selected campaign allows it.
/// Unknown ids disable everything.
pub fn is_enabled(action: BulkAction, selected: &[Uuid], campaigns: &[Campaign]) -> bool {
    !selected.is_empty()
        && selected.iter().all(|id| {
            campaigns
                .iter()
                .find(|c| c.id == *id)
                .is_some_and(|c| action.allows(c.status))
        })
}

pub fn enabled_actions(selected: &[Uuid], campaigns: &[Campaign]) -> Vec<BulkAction> {
    BulkAction::ALL
        .into_iter()
        .filter(|action| is_enabled(*action, selected, campaigns))
        .collect()
}

#[derive(Debug, Default, PartialEq)]
pub struct BulkResult {
    pub succeeded: Vec<Uuid>,
    pub failed: Vec<(Uuid, String)>,
}

impl BulkResult {
    pub fn is_complete_success(&self) -> bool {
        self.failed.is_empty()
    }
}

/// Applies the action to each id in order. A failing item is recorded
/// and the remaining ids are still attempted.
pub fn execute_bulk(
    store: &mut Store,
    storage: &impl Storage,
    action: BulkAction,
    ids: &[Uuid],
) -> BulkResult {
    let mut result = BulkResult::default();

    for &id in ids {
        let outcome = match action {
            BulkAction::Activate => activate_campaign(store, storage, id)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            BulkAction::Pause => pause_campaign(store, storage, id)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            BulkAction::Archive => archive_campaign(store, storage, id)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            BulkAction::Restore => restore_campaign(store, storage, id)
                .map(|_| ())
                .map_err(|e| e.to_string()),
            BulkAction::Duplicate => duplicate_campaign(
                store,
                storage,
                DuplicateCampaignParameters { id, new_name: None },
            )
            .map(|_| ())
            .map_err(|e| e.to_string()),
            BulkAction::Delete => delete_campaign(store, storage, id)
                .map(|_| ())
                .map_err(|e| e.to_string()),
        };

        match outcome {
            Ok(()) => result.succeeded.push(id),
            Err(message) => {
                tracing::warn!(%id, %action, error = %message, "bulk item failed");
                result.failed.push((id, message));
            }
        }
    }

    tracing::info!(
        %action,
        succeeded = result.succeeded.len(),
        failed = result.failed.len(),
        "bulk action finished"
    );

    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::storage::memory::MemoryStorage;

    fn campaign(name: &str, status: CampaignStatus) -> Campaign {
        let mut campaign = Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            ..Campaign::default()
        };
        campaign.set_status(status, jiff::Timestamp::now());
        campaign
    }

    fn sample_store() -> Store {
        Store {
            campaigns: vec![
                campaign("Draft A", CampaignStatus::Draft),
                campaign("Draft B", CampaignStatus::Draft),
                campaign("Live", CampaignStatus::Active),
                campaign("Old", CampaignStatus::Archived),
            ],
            ..Store::default()
        }
    }

    #[test]
    fn test_delete_disabled_with_any_non_draft() {
        let store = sample_store();
        let drafts = [store.campaigns[0].id, store.campaigns[1].id];
        let mixed = [store.campaigns[0].id, store.campaigns[2].id];

        assert!(is_enabled(BulkAction::Delete, &drafts, &store.campaigns));
        assert!(!is_enabled(BulkAction::Delete, &mixed, &store.campaigns));
        assert!(!is_enabled(BulkAction::Delete, &[], &store.campaigns));
        assert!(!is_enabled(BulkAction::Delete, &[Uuid::new_v4()], &store.campaigns));
    }

    #[test]
    fn test_enabled_actions_for_selection() {
        let store = sample_store();

        assert_eq!(
            enabled_actions(&[store.campaigns[2].id], &store.campaigns),
            vec![BulkAction::Pause, BulkAction::Archive, BulkAction::Duplicate]
        );
        assert_eq!(
            enabled_actions(&[store.campaigns[3].id], &store.campaigns),
            vec![BulkAction::Restore, BulkAction::Duplicate]
        );
    }

    #[test]
    fn test_confirmation() {
        assert!(BulkAction::Delete.requires_confirmation());
        assert!(BulkAction::Archive.requires_confirmation());
        assert!(!BulkAction::Pause.requires_confirmation());
    }

    #[test]
    fn test_execute_continues_after_failure() {
        let mut store = sample_store();
        let storage = MemoryStorage::default();
        let ids = [
            store.campaigns[0].id,
            store.campaigns[2].id,
            store.campaigns[1].id,
        ];

        let result = execute_bulk(&mut store, &storage, BulkAction::Delete, &ids);

        assert_eq!(result.succeeded, vec![ids[0], ids[2]]);
        assert_eq!(result.failed.len(), 1);
        assert_eq!(result.failed[0].0, ids[1]);
        assert!(!result.is_complete_success());
        assert_eq!(store.campaigns.len(), 2);
    }

    #[test]
    fn test_execute_archive_all() {
        let mut store = sample_store();
        let storage = MemoryStorage::default();
        let ids: Vec<_> = store.campaigns[..3].iter().map(|c| c.id).collect();

        let result = execute_bulk(&mut store, &storage, BulkAction::Archive, &ids);

        assert!(result.is_complete_success());
        assert!(store.campaigns.iter().all(|c| c.is_archived()));
        assert!(store.campaigns.iter().all(|c| c.archived_at.is_some()));
    }

    #[test]
    fn test_storage_failure_is_reported_per_item() {
        let mut store = sample_store();
        let storage = MemoryStorage::default();
        storage.fail_saves.set(true);
        let ids = [store.campaigns[0].id, store.campaigns[1].id];

        let result = execute_bulk(&mut store, &storage, BulkAction::Activate, &ids);

        assert!(result.succeeded.is_empty());
        assert_eq!(result.failed.len(), 2);
    }

    #[test]
    fn test_parse_action() {
        assert_eq!("Delete".parse::<BulkAction>(), Ok(BulkAction::Delete));
        assert!("nuke".parse::<BulkAction>().is_err());
    }
}
