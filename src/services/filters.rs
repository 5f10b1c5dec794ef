use std::{cmp::Ordering, collections::HashSet};

use jiff::{Timestamp, civil::Date, tz::TimeZone};
use uuid::Uuid;

use crate::models::campaign::{Campaign, CampaignStatus};

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortKey {
    Name,
    Status,
    CreatedAt,
    #[default]
    UpdatedAt,
}

impl std::str::FromStr for SortKey {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "name" => Ok(SortKey::Name),
            "status" => Ok(SortKey::Status),
            "created" | "created_at" => Ok(SortKey::CreatedAt),
            "updated" | "updated_at" => Ok(SortKey::UpdatedAt),
            other => Err(format!("Unknown sort key '{}'", other)),
        }
    }
}

#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub enum SortDirection {
    Ascending,
    #[default]
    Descending,
}

/// Inclusive calendar-date range; either end may be open
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<Date>,
    pub to: Option<Date>,
}

impl DateRange {
    pub fn is_open(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains(&self, timestamp: Timestamp, tz: &TimeZone) -> bool {
        let date = timestamp.to_zoned(tz.clone()).date();
        self.from.is_none_or(|from| date >= from) && self.to.is_none_or(|to| date <= to)
    }
}

/// Screen-local filter state, never persisted
#[derive(Clone, Debug, Default)]
pub struct CampaignFilters {
    pub search: String,
    pub statuses: HashSet<CampaignStatus>,
    pub categories: HashSet<Uuid>,
    pub created: DateRange,
    pub updated: DateRange,
    pub sort_key: SortKey,
    pub sort_direction: SortDirection,
}

impl CampaignFilters {
    pub fn is_active(&self) -> bool {
        !self.search.trim().is_empty()
            || !self.statuses.is_empty()
            || !self.categories.is_empty()
            || !self.created.is_open()
            || !self.updated.is_open()
    }

    fn matches(&self, campaign: &Campaign, tz: &TimeZone) -> bool {
        let search = self.search.trim().to_lowercase();
        let matches_search = search.is_empty()
            || campaign.name.to_lowercase().contains(&search)
            || campaign
                .description
                .as_ref()
                .is_some_and(|d| d.to_lowercase().contains(&search));

        let matches_category = self.categories.is_empty()
            || campaign
                .category_id
                .is_some_and(|id| self.categories.contains(&id));

        matches_search
            && (self.statuses.is_empty() || self.statuses.contains(&campaign.status))
            && matches_category
            && self.created.contains(campaign.created_at, tz)
            && self.updated.contains(campaign.updated_at, tz)
    }

    fn compare(&self, a: &Campaign, b: &Campaign) -> Ordering {
        let ordering = match self.sort_key {
            SortKey::Name => a.name.to_lowercase().cmp(&b.name.to_lowercase()),
            SortKey::Status => a.status.as_str().cmp(b.status.as_str()),
            SortKey::CreatedAt => a.created_at.cmp(&b.created_at),
            SortKey::UpdatedAt => a.updated_at.cmp(&b.updated_at),
        };

        match self.sort_direction {
            SortDirection::Ascending => ordering,
            SortDirection::Descending => ordering.reverse(),
        }
    }
}

/// Filters and sorts in memory. Dates are compared in the system zone.
pub fn apply_filters<'a>(campaigns: &'a [Campaign], filters: &CampaignFilters) -> Vec<&'a Campaign> {
    apply_filters_in(campaigns, filters, &TimeZone::system())
}

pub fn apply_filters_in<'a>(
    campaigns: &'a [Campaign],
    filters: &CampaignFilters,
    tz: &TimeZone,
) -> Vec<&'a Campaign> {
    let mut result: Vec<_> = campaigns.iter().filter(|c| filters.matches(c, tz)).collect();
    // Stable, so equal keys keep their stored order
    result.sort_by(|a, b| filters.compare(a, b));
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use jiff::civil::date;

    fn campaign(name: &str, status: CampaignStatus, created: &str) -> Campaign {
        let created_at: Timestamp = created.parse().unwrap();
        Campaign {
            id: Uuid::new_v4(),
            name: name.to_string(),
            status,
            created_at,
            updated_at: created_at,
            ..Campaign::default()
        }
    }

    fn sample() -> Vec<Campaign> {
        vec![
            campaign("Spring Promo", CampaignStatus::Active, "2025-03-01T10:00:00Z"),
            campaign("Summer Sale", CampaignStatus::Paused, "2025-06-01T10:00:00Z"),
            campaign("Autumn Leads", CampaignStatus::Draft, "2025-09-01T10:00:00Z"),
            campaign("Old Winter", CampaignStatus::Archived, "2024-12-01T10:00:00Z"),
        ]
    }

    #[test]
    fn test_no_filters_returns_everything() {
        let campaigns = sample();
        let filters = CampaignFilters::default();

        assert!(!filters.is_active());
        assert_eq!(apply_filters_in(&campaigns, &filters, &TimeZone::UTC).len(), 4);
    }

    #[test]
    fn test_status_filter_only_returns_matching_status() {
        let campaigns = sample();
        let filters = CampaignFilters {
            statuses: HashSet::from([CampaignStatus::Active]),
            ..CampaignFilters::default()
        };

        let result = apply_filters_in(&campaigns, &filters, &TimeZone::UTC);
        assert_eq!(result.len(), 1);
        assert!(result.iter().all(|c| c.status == CampaignStatus::Active));
    }

    #[test]
    fn test_search_matches_name_and_description() {
        let mut campaigns = sample();
        campaigns[2].description = Some(String::from("Lead gen for SALE season"));
        let filters = CampaignFilters {
            search: String::from("sale"),
            ..CampaignFilters::default()
        };

        let names: Vec<_> = apply_filters_in(&campaigns, &filters, &TimeZone::UTC)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Autumn Leads", "Summer Sale"]);
    }

    #[test]
    fn test_category_filter_excludes_uncategorised() {
        let mut campaigns = sample();
        let category = Uuid::new_v4();
        campaigns[0].category_id = Some(category);
        let filters = CampaignFilters {
            categories: HashSet::from([category]),
            ..CampaignFilters::default()
        };

        let result = apply_filters_in(&campaigns, &filters, &TimeZone::UTC);
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].name, "Spring Promo");
    }

    #[test]
    fn test_created_date_range_is_inclusive() {
        let campaigns = sample();
        let filters = CampaignFilters {
            created: DateRange {
                from: Some(date(2025, 3, 1)),
                to: Some(date(2025, 6, 1)),
            },
            sort_key: SortKey::CreatedAt,
            sort_direction: SortDirection::Ascending,
            ..CampaignFilters::default()
        };

        let names: Vec<_> = apply_filters_in(&campaigns, &filters, &TimeZone::UTC)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(names, vec!["Spring Promo", "Summer Sale"]);
    }

    #[test]
    fn test_sort_by_name() {
        let campaigns = sample();
        let filters = CampaignFilters {
            sort_key: SortKey::Name,
            sort_direction: SortDirection::Ascending,
            ..CampaignFilters::default()
        };

        let names: Vec<_> = apply_filters_in(&campaigns, &filters, &TimeZone::UTC)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(
            names,
            vec!["Autumn Leads", "Old Winter", "Spring Promo", "Summer Sale"]
        );
    }

    #[test]
    fn test_filtered_is_always_subset() {
        let campaigns = sample();
        let states = [
            CampaignFilters {
                search: String::from("o"),
                ..CampaignFilters::default()
            },
            CampaignFilters {
                statuses: HashSet::from([CampaignStatus::Draft, CampaignStatus::Paused]),
                ..CampaignFilters::default()
            },
            CampaignFilters {
                updated: DateRange {
                    from: Some(date(2030, 1, 1)),
                    to: None,
                },
                ..CampaignFilters::default()
            },
        ];

        for filters in &states {
            let result = apply_filters_in(&campaigns, filters, &TimeZone::UTC);
            assert!(result.len() <= campaigns.len());
            assert!(result.iter().all(|r| campaigns.iter().any(|c| c.id == r.id)));
        }
    }
}
