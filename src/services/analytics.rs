use std::collections::BTreeMap;

use serde::Serialize;
use uuid::Uuid;

use crate::models::{campaign::CampaignStatus, keyword::KeywordStats, store::Store};

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct CampaignPerformance {
    pub campaign_id: Uuid,
    pub name: String,
    pub status: CampaignStatus,
    pub keywords: usize,
    pub totals: KeywordStats,
    pub ctr: Option<f64>,
    pub cpc: Option<f64>,
}

#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct DashboardSummary {
    pub campaigns_by_status: BTreeMap<String, usize>,
    pub totals: KeywordStats,
    pub ctr: Option<f64>,
    pub cpc: Option<f64>,
    /// Cost per conversion
    pub cpa: Option<f64>,
    /// Most expensive first
    pub campaigns: Vec<CampaignPerformance>,
}

fn campaign_performance(store: &Store, campaign_id: Uuid) -> Option<CampaignPerformance> {
    let campaign = store.get_campaign(campaign_id)?;
    let mut totals = KeywordStats::default();
    let mut keywords = 0;

    for keyword in store.get_keywords_for_campaign(campaign_id) {
        keywords += 1;
        if let Some(stats) = &keyword.stats {
            totals.accumulate(stats);
        }
    }

    Some(CampaignPerformance {
        campaign_id,
        name: campaign.name.clone(),
        status: campaign.status,
        keywords,
        ctr: totals.ctr(),
        cpc: totals.cpc(),
        totals,
    })
}

/// Aggregates keyword stats into the dashboard numbers. Archived
/// campaigns are counted but left out of the performance table.
pub fn dashboard_summary(store: &Store) -> DashboardSummary {
    let mut campaigns_by_status: BTreeMap<String, usize> = CampaignStatus::ALL
        .iter()
        .map(|s| (s.to_string(), 0))
        .collect();
    for campaign in &store.campaigns {
        *campaigns_by_status
            .entry(campaign.status.to_string())
            .or_default() += 1;
    }

    let mut campaigns: Vec<_> = store
        .campaigns
        .iter()
        .filter(|c| !c.is_archived())
        .filter_map(|c| campaign_performance(store, c.id))
        .collect();
    campaigns.sort_by(|a, b| b.totals.cost.total_cmp(&a.totals.cost));

    let mut totals = KeywordStats::default();
    for performance in &campaigns {
        totals.accumulate(&performance.totals);
    }

    DashboardSummary {
        campaigns_by_status,
        ctr: totals.ctr(),
        cpc: totals.cpc(),
        cpa: (totals.conversions > 0).then(|| totals.cost / totals.conversions as f64),
        totals,
        campaigns,
    }
}
