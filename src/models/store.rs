use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::models::{
    campaign::Campaign,
    category::Category,
    keyword::{Keyword, NegativeKeyword},
    location::{City, County, LocationList},
};

/// Current schema version
pub const CURRENT_VERSION: u32 = 2;

#[derive(Serialize, Deserialize, Clone, Debug)]
pub struct Store {
    pub version: u32,
    pub campaigns: Vec<Campaign>,
    pub keywords: Vec<Keyword>,
    pub negative_keywords: Vec<NegativeKeyword>,
    pub categories: Vec<Category>,
    pub counties: Vec<County>,
    pub cities: Vec<City>,
    pub location_lists: Vec<LocationList>,
}

impl Default for Store {
    fn default() -> Self {
        Self {
            version: CURRENT_VERSION,
            campaigns: vec![],
            keywords: vec![],
            negative_keywords: vec![],
            categories: vec![],
            counties: vec![],
            cities: vec![],
            location_lists: vec![],
        }
    }
}

impl Store {
    pub fn get_campaign(&self, id: Uuid) -> Option<&Campaign> {
        self.campaigns.iter().find(|c| c.id == id)
    }

    pub fn get_campaign_mut(&mut self, id: Uuid) -> Option<&mut Campaign> {
        self.campaigns.iter_mut().find(|c| c.id == id)
    }

    pub fn get_category(&self, id: Uuid) -> Option<&Category> {
        self.categories.iter().find(|c| c.id == id)
    }

    pub fn get_county(&self, id: Uuid) -> Option<&County> {
        self.counties.iter().find(|c| c.id == id)
    }

    pub fn get_keywords_for_campaign(&self, campaign_id: Uuid) -> impl Iterator<Item = &Keyword> {
        self.keywords
            .iter()
            .filter(move |k| k.campaign_id == campaign_id)
    }

    pub fn get_negative_keywords_for_campaign(
        &self,
        campaign_id: Uuid,
    ) -> impl Iterator<Item = &NegativeKeyword> {
        self.negative_keywords
            .iter()
            .filter(move |k| k.campaign_id == campaign_id)
    }

    pub fn category_name(&self, id: Option<Uuid>) -> Option<&str> {
        id.and_then(|id| self.get_category(id))
            .map(|c| c.name.as_str())
    }

    /// Removes a campaign together with its keyword rows
    pub fn remove_campaign(&mut self, id: Uuid) -> Option<Campaign> {
        let index = self.campaigns.iter().position(|c| c.id == id)?;
        self.keywords.retain(|k| k.campaign_id != id);
        self.negative_keywords.retain(|k| k.campaign_id != id);
        Some(self.campaigns.remove(index))
    }
}
