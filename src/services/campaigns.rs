use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        campaign::{
            Campaign, CampaignSettings, CampaignStatus, KeywordTargeting, LocationTargeting,
            ScheduleConfig,
        },
        keyword::{Keyword, NegativeKeyword},
        store::Store,
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error, PartialEq)]
pub enum CampaignLookupError {
    #[error("Campaign '{0}' not found")]
    NotFound(String),

    #[error("Campaign reference is ambiguous. Multiple campaigns found: {}", .0.join(", "))]
    Ambiguous(Vec<String>),
}

/// Resolves a user supplied reference: full id, unique id prefix, exact
/// name, or unique case-insensitive name fragment, in that order.
pub fn resolve_campaign(store: &Store, reference: &str) -> Result<Uuid, CampaignLookupError> {
    let reference = reference.trim();

    if let Ok(id) = reference.parse::<Uuid>() {
        return store
            .get_campaign(id)
            .map(|c| c.id)
            .ok_or_else(|| CampaignLookupError::NotFound(reference.to_string()));
    }

    let needle = reference.to_lowercase();

    let by_prefix: Vec<_> = store
        .campaigns
        .iter()
        .filter(|c| needle.len() >= 4 && c.id.to_string().starts_with(&needle))
        .collect();
    if by_prefix.len() == 1 {
        return Ok(by_prefix[0].id);
    }

    if let Some(exact) = store
        .campaigns
        .iter()
        .find(|c| c.name.to_lowercase() == needle)
    {
        return Ok(exact.id);
    }

    let matching: Vec<_> = store
        .campaigns
        .iter()
        .filter(|c| c.name.to_lowercase().contains(&needle))
        .collect();

    match matching.len() {
        0 => Err(CampaignLookupError::NotFound(reference.to_string())),
        1 => Ok(matching[0].id),
        _ => Err(CampaignLookupError::Ambiguous(
            matching.iter().map(|c| c.name.clone()).collect(),
        )),
    }
}

pub fn list_campaigns(store: &Store) -> Vec<&Campaign> {
    let mut campaigns: Vec<_> = store.campaigns.iter().collect();
    campaigns.sort_by(|a, b| b.updated_at.cmp(&a.updated_at));
    campaigns
}

#[derive(Debug, Error)]
pub enum CreateCampaignError {
    #[error("Campaign name is required")]
    EmptyName,

    #[error("Category {0} does not exist")]
    CategoryNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

#[derive(Default)]
pub struct CreateCampaignParameters {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    /// Defaults to draft
    pub status: Option<CampaignStatus>,
    pub settings: Option<CampaignSettings>,
    pub location_targeting: Option<LocationTargeting>,
    pub keyword_targeting: Option<KeywordTargeting>,
    pub schedule: Option<ScheduleConfig>,
}

pub fn create_campaign(
    store: &mut Store,
    storage: &impl Storage,
    parameters: CreateCampaignParameters,
) -> Result<Campaign, CreateCampaignError> {
    let name = parameters.name.trim().to_string();
    if name.is_empty() {
        return Err(CreateCampaignError::EmptyName);
    }

    if let Some(category_id) = parameters.category_id
        && store.get_category(category_id).is_none()
    {
        return Err(CreateCampaignError::CategoryNotFound(category_id));
    }

    let now = Timestamp::now();
    let mut campaign = Campaign {
        id: Uuid::new_v4(),
        name,
        category_id: parameters.category_id,
        description: parameters.description,
        settings: parameters.settings,
        location_targeting: parameters.location_targeting,
        keyword_targeting: parameters.keyword_targeting,
        schedule: parameters.schedule,
        created_at: now,
        ..Campaign::default()
    };
    campaign.set_status(parameters.status.unwrap_or_default(), now);

    tracing::info!(id = %campaign.id, name = %campaign.name, status = %campaign.status, "campaign created");
    store.campaigns.push(campaign.clone());

    storage.save(store)?;

    Ok(campaign)
}

#[derive(Debug, Error)]
pub enum UpdateCampaignError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Campaign name is required")]
    EmptyName,

    #[error("Category {0} does not exist")]
    CategoryNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Field-wise patch; `None` leaves a field untouched, `Some(None)` clears
/// an optional one.
#[derive(Default, Clone)]
pub struct UpdateCampaignParameters {
    pub id: Uuid,
    pub name: Option<String>,
    pub category_id: Option<Option<Uuid>>,
    pub description: Option<Option<String>>,
    pub status: Option<CampaignStatus>,
    pub settings: Option<Option<CampaignSettings>>,
    pub location_targeting: Option<Option<LocationTargeting>>,
    pub keyword_targeting: Option<Option<KeywordTargeting>>,
    pub schedule: Option<Option<ScheduleConfig>>,
}

pub fn update_campaign(
    store: &mut Store,
    storage: &impl Storage,
    parameters: UpdateCampaignParameters,
) -> Result<Campaign, UpdateCampaignError> {
    if let Some(Some(category_id)) = parameters.category_id
        && store.get_category(category_id).is_none()
    {
        return Err(UpdateCampaignError::CategoryNotFound(category_id));
    }

    let campaign = store
        .get_campaign_mut(parameters.id)
        .ok_or(UpdateCampaignError::CampaignNotFound(parameters.id))?;

    if let Some(name) = parameters.name {
        let name = name.trim().to_string();
        if name.is_empty() {
            return Err(UpdateCampaignError::EmptyName);
        }
        campaign.name = name;
    }
    if let Some(category_id) = parameters.category_id {
        campaign.category_id = category_id;
    }
    if let Some(description) = parameters.description {
        campaign.description = description;
    }
    if let Some(settings) = parameters.settings {
        campaign.settings = settings;
    }
    if let Some(location_targeting) = parameters.location_targeting {
        campaign.location_targeting = location_targeting;
    }
    if let Some(keyword_targeting) = parameters.keyword_targeting {
        campaign.keyword_targeting = keyword_targeting;
    }
    if let Some(schedule) = parameters.schedule {
        campaign.schedule = schedule;
    }

    let now = Timestamp::now();
    match parameters.status {
        Some(status) if status != campaign.status => campaign.set_status(status, now),
        _ => campaign.updated_at = now,
    }

    let updated = campaign.clone();
    tracing::info!(id = %updated.id, "campaign updated");

    storage.save(store)?;

    Ok(updated)
}

#[derive(Debug, Error)]
pub enum DuplicateCampaignError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct DuplicateCampaignParameters {
    pub id: Uuid,
    /// Defaults to "<name> (Copy)"
    pub new_name: Option<String>,
}

pub fn duplicate_campaign(
    store: &mut Store,
    storage: &impl Storage,
    parameters: DuplicateCampaignParameters,
) -> Result<Campaign, DuplicateCampaignError> {
    let source = store
        .get_campaign(parameters.id)
        .ok_or(DuplicateCampaignError::CampaignNotFound(parameters.id))?;

    let now = Timestamp::now();
    let copy = Campaign {
        id: Uuid::new_v4(),
        name: parameters
            .new_name
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| format!("{} (Copy)", source.name)),
        status: CampaignStatus::Draft,
        created_at: now,
        updated_at: now,
        archived_at: None,
        ..source.clone()
    };

    let keywords: Vec<_> = store
        .get_keywords_for_campaign(source.id)
        .map(|k| Keyword {
            id: Uuid::new_v4(),
            campaign_id: copy.id,
            stats: None,
            created_at: now,
            ..k.clone()
        })
        .collect();
    let negative_keywords: Vec<_> = store
        .get_negative_keywords_for_campaign(source.id)
        .map(|k| NegativeKeyword {
            id: Uuid::new_v4(),
            campaign_id: copy.id,
            created_at: now,
            ..k.clone()
        })
        .collect();

    tracing::info!(
        source = %parameters.id,
        id = %copy.id,
        keywords = keywords.len(),
        "campaign duplicated"
    );
    store.keywords.extend(keywords);
    store.negative_keywords.extend(negative_keywords);
    store.campaigns.push(copy.clone());

    storage.save(store)?;

    Ok(copy)
}

#[derive(Debug, Error)]
pub enum ArchiveCampaignError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Campaign '{0}' is already archived")]
    AlreadyArchived(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn archive_campaign(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
) -> Result<Campaign, ArchiveCampaignError> {
    let campaign = store
        .get_campaign_mut(id)
        .ok_or(ArchiveCampaignError::CampaignNotFound(id))?;

    if campaign.is_archived() {
        return Err(ArchiveCampaignError::AlreadyArchived(campaign.name.clone()));
    }

    campaign.set_status(CampaignStatus::Archived, Timestamp::now());
    let archived = campaign.clone();
    tracing::info!(%id, "campaign archived");

    storage.save(store)?;

    Ok(archived)
}

#[derive(Debug, Error)]
pub enum RestoreCampaignError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Campaign '{0}' is not archived")]
    NotArchived(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Restored campaigns come back as drafts, never straight to active
pub fn restore_campaign(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
) -> Result<Campaign, RestoreCampaignError> {
    let campaign = store
        .get_campaign_mut(id)
        .ok_or(RestoreCampaignError::CampaignNotFound(id))?;

    if !campaign.is_archived() {
        return Err(RestoreCampaignError::NotArchived(campaign.name.clone()));
    }

    campaign.set_status(CampaignStatus::Draft, Timestamp::now());
    let restored = campaign.clone();
    tracing::info!(%id, "campaign restored");

    storage.save(store)?;

    Ok(restored)
}

#[derive(Debug, Error)]
pub enum ChangeStatusError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Campaign '{name}' cannot go from {from} to {to}")]
    InvalidTransition {
        name: String,
        from: CampaignStatus,
        to: CampaignStatus,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

fn change_status(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
    to: CampaignStatus,
    allowed_from: &[CampaignStatus],
) -> Result<Campaign, ChangeStatusError> {
    let campaign = store
        .get_campaign_mut(id)
        .ok_or(ChangeStatusError::CampaignNotFound(id))?;

    if !allowed_from.contains(&campaign.status) {
        return Err(ChangeStatusError::InvalidTransition {
            name: campaign.name.clone(),
            from: campaign.status,
            to,
        });
    }

    campaign.set_status(to, Timestamp::now());
    let changed = campaign.clone();
    tracing::info!(%id, status = %to, "campaign status changed");

    storage.save(store)?;

    Ok(changed)
}

pub fn activate_campaign(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
) -> Result<Campaign, ChangeStatusError> {
    change_status(
        store,
        storage,
        id,
        CampaignStatus::Active,
        &[CampaignStatus::Draft, CampaignStatus::Paused],
    )
}

pub fn pause_campaign(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
) -> Result<Campaign, ChangeStatusError> {
    change_status(
        store,
        storage,
        id,
        CampaignStatus::Paused,
        &[CampaignStatus::Active],
    )
}

#[derive(Debug, Error)]
pub enum DeleteCampaignError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Campaign '{name}' is {status}; only drafts can be deleted (archive it instead)")]
    NotDraft { name: String, status: CampaignStatus },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn delete_campaign(
    store: &mut Store,
    storage: &impl Storage,
    id: Uuid,
) -> Result<Campaign, DeleteCampaignError> {
    let campaign = store
        .get_campaign(id)
        .ok_or(DeleteCampaignError::CampaignNotFound(id))?;

    if campaign.status != CampaignStatus::Draft {
        return Err(DeleteCampaignError::NotDraft {
            name: campaign.name.clone(),
            status: campaign.status,
        });
    }

    let removed = store
        .remove_campaign(id)
        .ok_or(DeleteCampaignError::CampaignNotFound(id))?;
    tracing::info!(%id, name = %removed.name, "campaign deleted");

    storage.save(store)?;

    Ok(removed)
}
