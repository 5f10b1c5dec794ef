use std::fmt;

use jiff::Timestamp;
use jiff::civil::{Date, Weekday};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{keyword::MatchType, location::TargetingType};

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Campaign {
    /// UUID of the campaign
    pub id: Uuid,
    /// Display name of the campaign
    pub name: String,
    /// Category the campaign is filed under
    pub category_id: Option<Uuid>,
    /// Free text description
    pub description: Option<String>,
    /// Lifecycle status
    pub status: CampaignStatus,
    /// Bidding and budget settings
    pub settings: Option<CampaignSettings>,
    /// Geographic targeting
    pub location_targeting: Option<LocationTargeting>,
    /// Keyword targeting configuration
    pub keyword_targeting: Option<KeywordTargeting>,
    /// When the campaign is allowed to serve
    pub schedule: Option<ScheduleConfig>,
    /// When the campaign was created
    pub created_at: Timestamp,
    /// Last modification of any field
    pub updated_at: Timestamp,
    /// Set iff status is archived
    pub archived_at: Option<Timestamp>,
}

impl Campaign {
    pub fn is_archived(&self) -> bool {
        self.status == CampaignStatus::Archived
    }

    /// Applies a status change keeping `archived_at` in sync with it.
    pub fn set_status(&mut self, status: CampaignStatus, now: Timestamp) {
        self.archived_at = match status {
            CampaignStatus::Archived => self.archived_at.or(Some(now)),
            _ => None,
        };
        self.status = status;
        self.updated_at = now;
    }

    pub fn location_count(&self) -> usize {
        self.location_targeting
            .as_ref()
            .map(|t| t.included.len())
            .unwrap_or(0)
    }
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum CampaignStatus {
    Active,
    Paused,
    #[default]
    Draft,
    Archived,
}

impl CampaignStatus {
    pub const ALL: [CampaignStatus; 4] = [
        CampaignStatus::Active,
        CampaignStatus::Paused,
        CampaignStatus::Draft,
        CampaignStatus::Archived,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            CampaignStatus::Active => "active",
            CampaignStatus::Paused => "paused",
            CampaignStatus::Draft => "draft",
            CampaignStatus::Archived => "archived",
        }
    }
}

impl fmt::Display for CampaignStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, thiserror::Error)]
#[error("Unknown campaign status '{0}' (expected active, paused, draft or archived)")]
pub struct ParseStatusError(pub String);

impl std::str::FromStr for CampaignStatus {
    type Err = ParseStatusError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        CampaignStatus::ALL
            .into_iter()
            .find(|status| status.as_str().eq_ignore_ascii_case(s.trim()))
            .ok_or_else(|| ParseStatusError(s.to_string()))
    }
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct CampaignSettings {
    pub bid_strategy: BidStrategy,
    pub daily_budget: Option<f64>,
    pub total_budget: Option<f64>,
    pub target_cpa: Option<f64>,
    pub target_roas: Option<f64>,
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum BidStrategy {
    #[default]
    ManualCpc,
    MaximizeClicks,
    TargetCpa,
    TargetRoas,
}

impl std::str::FromStr for BidStrategy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().replace('-', "_").as_str() {
            "manual_cpc" => Ok(BidStrategy::ManualCpc),
            "maximize_clicks" => Ok(BidStrategy::MaximizeClicks),
            "target_cpa" => Ok(BidStrategy::TargetCpa),
            "target_roas" => Ok(BidStrategy::TargetRoas),
            other => Err(format!("Unknown bid strategy '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct LocationTargeting {
    pub targeting_type: TargetingType,
    /// Tagged location refs, see `models::location::LocationRef`
    pub included: Vec<String>,
    pub excluded: Vec<String>,
    pub radius_miles: Option<f64>,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct KeywordTargeting {
    pub keywords: Vec<String>,
    pub negative_keywords: Vec<String>,
    pub match_types: Vec<MatchType>,
}

#[derive(Serialize, Deserialize, Clone, Debug, PartialEq)]
pub struct ScheduleConfig {
    pub start_date: Date,
    pub end_date: Option<Date>,
    /// ISO weekday numbers, Monday = 1. Empty means every day
    pub weekdays: Vec<u8>,
    /// Inclusive start hour, exclusive end hour, both 0..=24
    pub hours: Option<(u8, u8)>,
    pub timezone: String,
}

impl ScheduleConfig {
    pub fn runs_on(&self, weekday: Weekday) -> bool {
        self.weekdays.is_empty()
            || self
                .weekdays
                .contains(&(weekday.to_monday_one_offset() as u8))
    }
}
