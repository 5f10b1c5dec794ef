use serde::Serialize;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{campaign::Campaign, store::Store},
    services::analytics::DashboardSummary,
};

#[derive(Debug, Error)]
pub enum ExportError {
    #[error("Failed to serialize export: {0}")]
    Serialize(#[from] serde_json::Error),
}

/// Quotes a field when it contains a delimiter, quote or line break
fn csv_field(value: &str) -> String {
    if value.contains([',', '"', '\n', '\r']) {
        format!("\"{}\"", value.replace('"', "\"\""))
    } else {
        value.to_string()
    }
}

fn csv_row(fields: &[String]) -> String {
    let mut line = fields
        .iter()
        .map(|f| csv_field(f))
        .collect::<Vec<_>>()
        .join(",");
    line.push_str("\r\n");
    line
}

fn optional_number(value: Option<f64>, precision: usize) -> String {
    value
        .map(|v| format!("{:.*}", precision, v))
        .unwrap_or_default()
}

pub fn campaigns_to_csv(store: &Store, campaigns: &[&Campaign]) -> String {
    let mut out = csv_row(
        &[
            "id", "name", "status", "category", "created_at", "updated_at", "keywords",
            "locations",
        ]
        .map(String::from),
    );

    for campaign in campaigns {
        let keywords = store
            .get_keywords_for_campaign(campaign.id)
            .map(|k| k.text.as_str())
            .collect::<Vec<_>>()
            .join("; ");
        out.push_str(&csv_row(&[
            campaign.id.to_string(),
            campaign.name.clone(),
            campaign.status.to_string(),
            store
                .category_name(campaign.category_id)
                .unwrap_or_default()
                .to_string(),
            campaign.created_at.to_string(),
            campaign.updated_at.to_string(),
            keywords,
            campaign.location_count().to_string(),
        ]));
    }

    out
}

#[derive(Serialize)]
struct CampaignExport<'a> {
    #[serde(flatten)]
    campaign: &'a Campaign,
    category: Option<&'a str>,
    keywords: Vec<&'a str>,
    negative_keywords: Vec<&'a str>,
}

pub fn campaigns_to_json(store: &Store, campaigns: &[&Campaign]) -> Result<String, ExportError> {
    let rows: Vec<_> = campaigns
        .iter()
        .map(|&campaign| CampaignExport {
            campaign,
            category: store.category_name(campaign.category_id),
            keywords: store
                .get_keywords_for_campaign(campaign.id)
                .map(|k| k.text.as_str())
                .collect(),
            negative_keywords: store
                .get_negative_keywords_for_campaign(campaign.id)
                .map(|k| k.text.as_str())
                .collect(),
        })
        .collect();

    Ok(serde_json::to_string_pretty(&rows)?)
}

pub fn analytics_to_csv(summary: &DashboardSummary) -> String {
    let mut out = csv_row(
        &[
            "campaign_id", "name", "status", "keywords", "impressions", "clicks", "cost",
            "conversions", "ctr", "cpc",
        ]
        .map(String::from),
    );

    for row in &summary.campaigns {
        out.push_str(&csv_row(&[
            row.campaign_id.to_string(),
            row.name.clone(),
            row.status.to_string(),
            row.keywords.to_string(),
            row.totals.impressions.to_string(),
            row.totals.clicks.to_string(),
            format!("{:.2}", row.totals.cost),
            row.totals.conversions.to_string(),
            optional_number(row.ctr, 4),
            optional_number(row.cpc, 2),
        ]));
    }

    out.push_str(&csv_row(&[
        Uuid::nil().to_string(),
        String::from("TOTAL"),
        String::new(),
        summary.campaigns.iter().map(|c| c.keywords).sum::<usize>().to_string(),
        summary.totals.impressions.to_string(),
        summary.totals.clicks.to_string(),
        format!("{:.2}", summary.totals.cost),
        summary.totals.conversions.to_string(),
        optional_number(summary.ctr, 4),
        optional_number(summary.cpc, 2),
    ]));

    out
}

pub fn analytics_to_json(summary: &DashboardSummary) -> Result<String, ExportError> {
    Ok(serde_json::to_string_pretty(summary)?)
}
