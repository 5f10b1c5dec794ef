use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum MatchType {
    #[default]
    Broad,
    Phrase,
    Exact,
}

impl fmt::Display for MatchType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            MatchType::Broad => "broad",
            MatchType::Phrase => "phrase",
            MatchType::Exact => "exact",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for MatchType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "broad" => Ok(MatchType::Broad),
            "phrase" => Ok(MatchType::Phrase),
            "exact" => Ok(MatchType::Exact),
            other => Err(format!("Unknown match type '{}'", other)),
        }
    }
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Keyword {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub text: String,
    pub match_type: MatchType,
    /// Performance numbers, fetched separately from the keyword itself
    pub stats: Option<KeywordStats>,
    pub created_at: Timestamp,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct NegativeKeyword {
    pub id: Uuid,
    pub campaign_id: Uuid,
    pub text: String,
    pub match_type: MatchType,
    pub created_at: Timestamp,
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq)]
pub struct KeywordStats {
    pub impressions: u64,
    pub clicks: u64,
    pub cost: f64,
    pub conversions: u64,
}

impl KeywordStats {
    /// Click-through rate as a fraction, `None` without impressions
    pub fn ctr(&self) -> Option<f64> {
        (self.impressions > 0).then(|| self.clicks as f64 / self.impressions as f64)
    }

    /// Cost per click, `None` without clicks
    pub fn cpc(&self) -> Option<f64> {
        (self.clicks > 0).then(|| self.cost / self.clicks as f64)
    }

    pub fn accumulate(&mut self, other: &KeywordStats) {
        self.impressions += other.impressions;
        self.clicks += other.clicks;
        self.cost += other.cost;
        self.conversions += other.conversions;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ctr_and_cpc_without_traffic() {
        let stats = KeywordStats::default();
        assert_eq!(stats.ctr(), None);
        assert_eq!(stats.cpc(), None);
    }

    #[test]
    fn test_ctr_and_cpc() {
        let stats = KeywordStats {
            impressions: 200,
            clicks: 10,
            cost: 25.0,
            conversions: 1,
        };
        assert_eq!(stats.ctr(), Some(0.05));
        assert_eq!(stats.cpc(), Some(2.5));
    }
}
