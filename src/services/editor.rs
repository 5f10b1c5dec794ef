use std::fmt;

use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        campaign::{
            Campaign, CampaignSettings, CampaignStatus, KeywordTargeting, LocationTargeting,
            ScheduleConfig,
        },
        keyword::MatchType,
        location::{ParseLocationRefError, TargetingType},
        store::Store,
    },
    services::{
        campaigns::{
            CreateCampaignError, CreateCampaignParameters, UpdateCampaignError,
            UpdateCampaignParameters, create_campaign, update_campaign,
        },
        keywords::{normalize_keyword, sync_keyword_rows},
        locations::{LocationSelection, validate_selection},
    },
    storage::{Storage, StorageError},
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EditorStep {
    Details,
    Locations,
    Keywords,
    Schedule,
    Review,
}

impl EditorStep {
    pub const ALL: [EditorStep; 5] = [
        EditorStep::Details,
        EditorStep::Locations,
        EditorStep::Keywords,
        EditorStep::Schedule,
        EditorStep::Review,
    ];

    fn index(self) -> usize {
        self as usize
    }

    pub fn next(self) -> Option<EditorStep> {
        EditorStep::ALL.get(self.index() + 1).copied()
    }
}

impl fmt::Display for EditorStep {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            EditorStep::Details => "Details",
            EditorStep::Locations => "Locations",
            EditorStep::Keywords => "Keywords",
            EditorStep::Schedule => "Schedule",
            EditorStep::Review => "Review",
        };
        f.write_str(name)
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct StepStatus {
    pub completed: bool,
    pub has_errors: bool,
}

/// Everything the wizard edits, before it becomes a `Campaign`
#[derive(Clone, Debug, Default)]
pub struct CampaignDraft {
    pub name: String,
    pub category_id: Option<Uuid>,
    pub description: Option<String>,
    pub settings: Option<CampaignSettings>,
    pub targeting_type: TargetingType,
    pub locations: LocationSelection,
    pub excluded_locations: LocationSelection,
    pub radius_miles: Option<f64>,
    pub keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
    pub match_types: Vec<MatchType>,
    pub schedule: Option<ScheduleConfig>,
}

impl CampaignDraft {
    pub fn from_campaign(campaign: &Campaign) -> Result<Self, ParseLocationRefError> {
        let targeting = campaign.location_targeting.clone().unwrap_or_default();
        let keywords = campaign.keyword_targeting.clone().unwrap_or_default();

        Ok(Self {
            name: campaign.name.clone(),
            category_id: campaign.category_id,
            description: campaign.description.clone(),
            settings: campaign.settings.clone(),
            targeting_type: targeting.targeting_type,
            locations: LocationSelection::from_tagged(&targeting.included)?,
            excluded_locations: LocationSelection::from_tagged(&targeting.excluded)?,
            radius_miles: targeting.radius_miles,
            keywords: keywords.keywords,
            negative_keywords: keywords.negative_keywords,
            match_types: keywords.match_types,
            schedule: campaign.schedule.clone(),
        })
    }

    fn location_targeting(&self) -> Option<LocationTargeting> {
        if self.locations.is_empty()
            && self.excluded_locations.is_empty()
            && self.radius_miles.is_none()
        {
            return None;
        }
        Some(LocationTargeting {
            targeting_type: self.targeting_type,
            included: self.locations.to_tagged(),
            excluded: self.excluded_locations.to_tagged(),
            radius_miles: self.radius_miles,
        })
    }

    fn keyword_targeting(&self) -> Option<KeywordTargeting> {
        if self.keywords.is_empty() && self.negative_keywords.is_empty() {
            return None;
        }
        Some(KeywordTargeting {
            keywords: self.keywords.clone(),
            negative_keywords: self.negative_keywords.clone(),
            match_types: self.match_types.clone(),
        })
    }
}

#[derive(Debug, Error)]
pub enum SaveCampaignError {
    #[error("Campaign has validation errors: {}", .0.join("; "))]
    Validation(Vec<String>),

    #[error(transparent)]
    Create(#[from] CreateCampaignError),

    #[error(transparent)]
    Update(#[from] UpdateCampaignError),

    #[error(transparent)]
    Storage(#[from] StorageError),
}

/// Linear campaign wizard: details, locations, keywords, schedule, review.
///
/// Each step tracks whether it was completed and whether its last
/// validation failed. Completing a step validates it and moves on.
#[derive(Clone, Debug)]
pub struct CampaignEditor {
    pub draft: CampaignDraft,
    editing: Option<Uuid>,
    current: EditorStep,
    statuses: [StepStatus; 5],
}

impl Default for CampaignEditor {
    fn default() -> Self {
        Self::new()
    }
}

impl CampaignEditor {
    pub fn new() -> Self {
        Self {
            draft: CampaignDraft::default(),
            editing: None,
            current: EditorStep::Details,
            statuses: [StepStatus::default(); 5],
        }
    }

    pub fn edit(campaign: &Campaign) -> Result<Self, ParseLocationRefError> {
        Ok(Self {
            draft: CampaignDraft::from_campaign(campaign)?,
            editing: Some(campaign.id),
            ..Self::new()
        })
    }

    pub fn current_step(&self) -> EditorStep {
        self.current
    }

    pub fn step_status(&self, step: EditorStep) -> StepStatus {
        self.statuses[step.index()]
    }

    /// Tabs can be visited in any order; only `complete_step` validates
    pub fn go_to(&mut self, step: EditorStep) {
        self.current = step;
    }

    pub fn validate_step(&self, step: EditorStep) -> Vec<String> {
        let draft = &self.draft;
        let mut errors = vec![];

        match step {
            EditorStep::Details => {
                if draft.name.trim().is_empty() {
                    errors.push(String::from("Campaign name is required"));
                }
                if draft.category_id.is_none() {
                    errors.push(String::from("Category selection is required"));
                }
                if let Some(settings) = &draft.settings {
                    for (label, value) in [
                        ("Daily budget", settings.daily_budget),
                        ("Total budget", settings.total_budget),
                    ] {
                        if value.is_some_and(|v| v <= 0.0) {
                            errors.push(format!("{} must be greater than zero", label));
                        }
                    }
                    if let (Some(daily), Some(total)) = (settings.daily_budget, settings.total_budget)
                        && daily > total
                    {
                        errors.push(String::from("Daily budget cannot exceed the total budget"));
                    }
                }
            }
            EditorStep::Locations => {
                // No locations means no geographic restriction
                if !draft.locations.is_empty()
                    && let Err(e) = validate_selection(draft.targeting_type, &draft.locations)
                {
                    errors.push(e.to_string());
                }
                if draft.radius_miles.is_some_and(|r| r <= 0.0) {
                    errors.push(String::from("Radius must be greater than zero"));
                }
            }
            EditorStep::Keywords => {
                if draft.keywords.iter().any(|k| normalize_keyword(k).is_empty())
                    || draft
                        .negative_keywords
                        .iter()
                        .any(|k| normalize_keyword(k).is_empty())
                {
                    errors.push(String::from("Keywords cannot be blank"));
                }
            }
            EditorStep::Schedule => {
                if let Some(schedule) = &draft.schedule {
                    if schedule.end_date.is_some_and(|end| end < schedule.start_date) {
                        errors.push(String::from("End date must be on or after the start date"));
                    }
                    if schedule.weekdays.iter().any(|d| !(1..=7).contains(d)) {
                        errors.push(String::from("Weekdays must be numbered 1 (Monday) to 7"));
                    }
                    if let Some((start, end)) = schedule.hours
                        && !(start < end && end <= 24)
                    {
                        errors.push(String::from("Schedule hours must satisfy start < end <= 24"));
                    }
                    if schedule.timezone.trim().is_empty() {
                        errors.push(String::from("Schedule timezone is required"));
                    }
                }
            }
            EditorStep::Review => {
                for step in &EditorStep::ALL[..EditorStep::Review.index()] {
                    errors.extend(self.validate_step(*step));
                }
            }
        }

        errors
    }

    /// Non-blocking findings shown on the review step
    pub fn review_warnings(&self) -> Vec<String> {
        let negatives: Vec<_> = self
            .draft
            .negative_keywords
            .iter()
            .map(|k| normalize_keyword(k))
            .collect();

        self.draft
            .keywords
            .iter()
            .map(|k| normalize_keyword(k))
            .filter(|k| negatives.contains(k))
            .map(|k| format!("'{}' is both a keyword and a negative keyword", k))
            .collect()
    }

    /// Validates the current step. On success marks it completed and
    /// advances; on failure stays put and returns the messages.
    pub fn complete_step(&mut self) -> Result<EditorStep, Vec<String>> {
        let step = self.current;
        let errors = self.validate_step(step);
        let status = &mut self.statuses[step.index()];

        if !errors.is_empty() {
            status.has_errors = true;
            tracing::debug!(%step, errors = errors.len(), "step rejected");
            return Err(errors);
        }

        status.completed = true;
        status.has_errors = false;
        if let Some(next) = step.next() {
            self.current = next;
        }

        Ok(self.current)
    }

    pub fn can_save(&self) -> bool {
        !self.draft.name.trim().is_empty() && self.draft.category_id.is_some()
    }

    /// Creates or updates the campaign from the draft
    pub fn save(
        &mut self,
        store: &mut Store,
        storage: &impl Storage,
    ) -> Result<Campaign, SaveCampaignError> {
        let errors = self.validate_step(EditorStep::Review);
        if !errors.is_empty() {
            for step in EditorStep::ALL {
                self.statuses[step.index()].has_errors = !self.validate_step(step).is_empty();
            }
            return Err(SaveCampaignError::Validation(errors));
        }

        let draft = self.draft.clone();
        let campaign = match self.editing {
            Some(id) => update_campaign(
                store,
                storage,
                UpdateCampaignParameters {
                    id,
                    name: Some(draft.name.clone()),
                    category_id: Some(draft.category_id),
                    description: Some(draft.description.clone()),
                    status: None,
                    settings: Some(draft.settings.clone()),
                    location_targeting: Some(draft.location_targeting()),
                    keyword_targeting: Some(draft.keyword_targeting()),
                    schedule: Some(draft.schedule.clone()),
                },
            )?,
            None => create_campaign(
                store,
                storage,
                CreateCampaignParameters {
                    name: draft.name.clone(),
                    category_id: draft.category_id,
                    description: draft.description.clone(),
                    status: Some(CampaignStatus::Draft),
                    settings: draft.settings.clone(),
                    location_targeting: draft.location_targeting(),
                    keyword_targeting: draft.keyword_targeting(),
                    schedule: draft.schedule.clone(),
                },
            )?,
        };

        // Listings, exports and the dashboard read keyword rows, not the targeting
        if let Some(targeting) = &campaign.keyword_targeting
            && sync_keyword_rows(store, campaign.id, targeting) > 0
        {
            storage.save(store)?;
        }

        self.editing = Some(campaign.id);
        for status in &mut self.statuses {
            status.completed = true;
            status.has_errors = false;
        }

        Ok(campaign)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        models::{category::Category, location::LocationRef},
        services::{
            campaigns::list_campaigns,
            export::campaigns_to_csv,
            filters::{CampaignFilters, apply_filters},
        },
        storage::memory::MemoryStorage,
    };
    use jiff::civil::date;

    fn store_with_category() -> (Store, Uuid) {
        let category = Category {
            id: Uuid::new_v4(),
            name: String::from("Legal"),
            slug: String::from("legal"),
            parent_id: None,
        };
        let id = category.id;
        (
            Store {
                categories: vec![category],
                ..Store::default()
            },
            id,
        )
    }

    #[test]
    fn test_save_requires_category_then_succeeds() {
        let (mut store, category_id) = store_with_category();
        let storage = MemoryStorage::default();
        let mut editor = CampaignEditor::new();
        editor.draft.name = String::from("Test");

        assert!(!editor.can_save());
        match editor.save(&mut store, &storage) {
            Err(SaveCampaignError::Validation(errors)) => {
                assert!(errors.contains(&String::from("Category selection is required")));
            }
            other => panic!("Expected validation error, got {:?}", other),
        }
        assert!(editor.step_status(EditorStep::Details).has_errors);
        assert!(store.campaigns.is_empty());

        editor.draft.category_id = Some(category_id);
        assert!(editor.can_save());
        let campaign = editor.save(&mut store, &storage).unwrap();

        assert_eq!(campaign.status, CampaignStatus::Draft);
        let listed = list_campaigns(&store);
        assert_eq!(listed.len(), 1);
        assert_eq!(listed[0].name, "Test");
        assert_eq!(
            apply_filters(&store.campaigns, &CampaignFilters::default()).len(),
            1
        );
    }

    #[test]
    fn test_complete_step_advances() {
        let (_, category_id) = store_with_category();
        let mut editor = CampaignEditor::new();

        assert!(editor.complete_step().is_err());
        assert_eq!(editor.current_step(), EditorStep::Details);
        assert!(editor.step_status(EditorStep::Details).has_errors);

        editor.draft.name = String::from("Promo");
        editor.draft.category_id = Some(category_id);
        assert_eq!(editor.complete_step(), Ok(EditorStep::Locations));
        assert_eq!(
            editor.step_status(EditorStep::Details),
            StepStatus {
                completed: true,
                has_errors: false
            }
        );

        assert_eq!(editor.complete_step(), Ok(EditorStep::Keywords));
        assert_eq!(editor.complete_step(), Ok(EditorStep::Schedule));
        assert_eq!(editor.complete_step(), Ok(EditorStep::Review));
        assert_eq!(editor.complete_step(), Ok(EditorStep::Review));
    }

    #[test]
    fn test_local_cap_blocks_location_step() {
        let mut editor = CampaignEditor::new();
        editor.go_to(EditorStep::Locations);
        editor.draft.targeting_type = TargetingType::Local;
        for i in 0..51 {
            editor
                .draft
                .locations
                .insert(LocationRef::city(&format!("Town{}", i), "OH"));
        }

        let errors = editor.complete_step().unwrap_err();
        assert_eq!(errors.len(), 1);
        assert!(errors[0].contains("at most 50"));
        assert_eq!(editor.current_step(), EditorStep::Locations);
        assert!(!editor.step_status(EditorStep::Locations).completed);
    }

    #[test]
    fn test_schedule_validation() {
        let mut editor = CampaignEditor::new();
        editor.draft.schedule = Some(ScheduleConfig {
            start_date: date(2026, 5, 1),
            end_date: Some(date(2026, 4, 1)),
            weekdays: vec![1, 8],
            hours: Some((18, 9)),
            timezone: String::from("America/Chicago"),
        });

        let errors = editor.validate_step(EditorStep::Schedule);
        assert_eq!(errors.len(), 3);
    }

    #[test]
    fn test_edit_existing_campaign_updates_it() {
        let (mut store, category_id) = store_with_category();
        let storage = MemoryStorage::default();
        let mut editor = CampaignEditor::new();
        editor.draft.name = String::from("Injury Leads");
        editor.draft.category_id = Some(category_id);
        editor.draft.keywords = vec![String::from("injury lawyer")];
        let created = editor.save(&mut store, &storage).unwrap();

        let mut editor = CampaignEditor::edit(&created).unwrap();
        assert_eq!(editor.draft.keywords, vec![String::from("injury lawyer")]);
        editor.draft.name = String::from("Injury Leads 2");
        editor.draft.locations.insert(LocationRef::city("Dayton", "OH"));
        let updated = editor.save(&mut store, &storage).unwrap();

        assert_eq!(updated.id, created.id);
        assert_eq!(store.campaigns.len(), 1);
        assert_eq!(updated.name, "Injury Leads 2");
        assert_eq!(
            updated.location_targeting.unwrap().included,
            vec![String::from("city:Dayton-OH")]
        );
    }

    #[test]
    fn test_saved_keywords_reach_keyword_rows_and_export() {
        let (mut store, category_id) = store_with_category();
        let storage = MemoryStorage::default();
        let mut editor = CampaignEditor::new();
        editor.draft.name = String::from("Injury Leads");
        editor.draft.category_id = Some(category_id);
        editor.draft.keywords = vec![String::from("Injury  Lawyer")];
        editor.draft.negative_keywords = vec![String::from("free")];
        editor.draft.match_types = vec![MatchType::Phrase, MatchType::Exact];
        let campaign = editor.save(&mut store, &storage).unwrap();

        let keywords: Vec<_> = store.get_keywords_for_campaign(campaign.id).collect();
        assert_eq!(keywords.len(), 2);
        assert!(keywords.iter().all(|k| k.text == "injury lawyer"));
        assert_eq!(store.get_negative_keywords_for_campaign(campaign.id).count(), 2);

        let csv = campaigns_to_csv(&store, &[&campaign]);
        assert!(csv.contains("injury lawyer"));

        // Saving again adds nothing new
        editor.save(&mut store, &storage).unwrap();
        assert_eq!(store.keywords.len(), 2);
        assert_eq!(store.negative_keywords.len(), 2);
    }

    #[test]
    fn test_radius_survives_edit_without_locations() {
        let (mut store, category_id) = store_with_category();
        let storage = MemoryStorage::default();
        let mut editor = CampaignEditor::new();
        editor.draft.name = String::from("Nearby");
        editor.draft.category_id = Some(category_id);
        editor.draft.targeting_type = TargetingType::Local;
        editor.draft.radius_miles = Some(15.0);
        let created = editor.save(&mut store, &storage).unwrap();

        let targeting = created.location_targeting.clone().unwrap();
        assert_eq!(targeting.radius_miles, Some(15.0));
        assert!(targeting.included.is_empty());

        let mut editor = CampaignEditor::edit(&created).unwrap();
        editor.draft.name = String::from("Nearby 2");
        let updated = editor.save(&mut store, &storage).unwrap();

        let targeting = updated.location_targeting.unwrap();
        assert_eq!(targeting.targeting_type, TargetingType::Local);
        assert_eq!(targeting.radius_miles, Some(15.0));
    }

    #[test]
    fn test_review_warnings_for_conflicting_keywords() {
        let mut editor = CampaignEditor::new();
        editor.draft.keywords = vec![String::from("Free Quote"), String::from("lawyer")];
        editor.draft.negative_keywords = vec![String::from("free  quote")];

        assert_eq!(editor.review_warnings().len(), 1);
    }
}
