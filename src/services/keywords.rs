use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        campaign::KeywordTargeting,
        keyword::{Keyword, KeywordStats, MatchType, NegativeKeyword},
        store::Store,
    },
    storage::{Storage, StorageError},
};

#[derive(Debug, Error)]
pub enum KeywordError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error("Keyword text is required")]
    EmptyText,

    #[error("Keyword '{text}' ({match_type}) already exists on this campaign")]
    AlreadyExists { text: String, match_type: MatchType },

    #[error("Keyword '{0}' not found on this campaign")]
    KeywordNotFound(String),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

/// Collapses whitespace and lowercases, which is how keywords compare
pub fn normalize_keyword(text: &str) -> String {
    text.split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

pub struct AddKeywordParameters {
    pub campaign_id: Uuid,
    pub text: String,
    pub match_type: MatchType,
}

pub fn add_keyword(
    store: &mut Store,
    storage: &impl Storage,
    parameters: AddKeywordParameters,
) -> Result<Keyword, KeywordError> {
    let text = prepare(store, parameters.campaign_id, &parameters.text)?;

    if store
        .get_keywords_for_campaign(parameters.campaign_id)
        .any(|k| k.text == text && k.match_type == parameters.match_type)
    {
        return Err(KeywordError::AlreadyExists {
            text,
            match_type: parameters.match_type,
        });
    }

    let keyword = Keyword {
        id: Uuid::new_v4(),
        campaign_id: parameters.campaign_id,
        text,
        match_type: parameters.match_type,
        stats: None,
        created_at: Timestamp::now(),
    };
    store.keywords.push(keyword.clone());
    touch_campaign(store, parameters.campaign_id);
    tracing::info!(campaign = %parameters.campaign_id, text = %keyword.text, "keyword added");

    storage.save(store)?;

    Ok(keyword)
}

pub fn add_negative_keyword(
    store: &mut Store,
    storage: &impl Storage,
    parameters: AddKeywordParameters,
) -> Result<NegativeKeyword, KeywordError> {
    let text = prepare(store, parameters.campaign_id, &parameters.text)?;

    if store
        .get_negative_keywords_for_campaign(parameters.campaign_id)
        .any(|k| k.text == text && k.match_type == parameters.match_type)
    {
        return Err(KeywordError::AlreadyExists {
            text,
            match_type: parameters.match_type,
        });
    }

    let negative = NegativeKeyword {
        id: Uuid::new_v4(),
        campaign_id: parameters.campaign_id,
        text,
        match_type: parameters.match_type,
        created_at: Timestamp::now(),
    };
    store.negative_keywords.push(negative.clone());
    touch_campaign(store, parameters.campaign_id);
    tracing::info!(campaign = %parameters.campaign_id, text = %negative.text, "negative keyword added");

    storage.save(store)?;

    Ok(negative)
}

/// Adds a row for every targeted keyword and match type the campaign does not
/// already have. Existing rows, and their stats, are never removed here.
/// Returns how many rows were added; the caller saves.
pub fn sync_keyword_rows(
    store: &mut Store,
    campaign_id: Uuid,
    targeting: &KeywordTargeting,
) -> usize {
    let match_types: &[MatchType] = if targeting.match_types.is_empty() {
        &[MatchType::Broad]
    } else {
        &targeting.match_types
    };
    let now = Timestamp::now();
    let mut added = 0;

    for text in targeting.keywords.iter().map(|k| normalize_keyword(k)) {
        if text.is_empty() {
            continue;
        }
        for &match_type in match_types {
            if store
                .get_keywords_for_campaign(campaign_id)
                .any(|k| k.text == text && k.match_type == match_type)
            {
                continue;
            }
            store.keywords.push(Keyword {
                id: Uuid::new_v4(),
                campaign_id,
                text: text.clone(),
                match_type,
                stats: None,
                created_at: now,
            });
            added += 1;
        }
    }

    for text in targeting.negative_keywords.iter().map(|k| normalize_keyword(k)) {
        if text.is_empty() {
            continue;
        }
        for &match_type in match_types {
            if store
                .get_negative_keywords_for_campaign(campaign_id)
                .any(|k| k.text == text && k.match_type == match_type)
            {
                continue;
            }
            store.negative_keywords.push(NegativeKeyword {
                id: Uuid::new_v4(),
                campaign_id,
                text: text.clone(),
                match_type,
                created_at: now,
            });
            added += 1;
        }
    }

    if added > 0 {
        tracing::debug!(campaign = %campaign_id, added, "keyword rows synced from targeting");
    }
    added
}

fn prepare(store: &Store, campaign_id: Uuid, text: &str) -> Result<String, KeywordError> {
    if store.get_campaign(campaign_id).is_none() {
        return Err(KeywordError::CampaignNotFound(campaign_id));
    }
    let text = normalize_keyword(text);
    if text.is_empty() {
        return Err(KeywordError::EmptyText);
    }
    Ok(text)
}

fn touch_campaign(store: &mut Store, campaign_id: Uuid) {
    if let Some(campaign) = store.get_campaign_mut(campaign_id) {
        campaign.updated_at = Timestamp::now();
    }
}

/// Removes every match type of the keyword text; returns how many rows went
pub fn remove_keyword(
    store: &mut Store,
    storage: &impl Storage,
    campaign_id: Uuid,
    text: &str,
    negative: bool,
) -> Result<usize, KeywordError> {
    let text = prepare(store, campaign_id, text)?;

    let before = store.keywords.len() + store.negative_keywords.len();
    if negative {
        store
            .negative_keywords
            .retain(|k| !(k.campaign_id == campaign_id && k.text == text));
    } else {
        store
            .keywords
            .retain(|k| !(k.campaign_id == campaign_id && k.text == text));
    }
    let removed = before - store.keywords.len() - store.negative_keywords.len();

    if removed == 0 {
        return Err(KeywordError::KeywordNotFound(text));
    }

    touch_campaign(store, campaign_id);
    storage.save(store)?;

    Ok(removed)
}

pub fn record_keyword_stats(
    store: &mut Store,
    storage: &impl Storage,
    campaign_id: Uuid,
    text: &str,
    stats: KeywordStats,
) -> Result<Keyword, KeywordError> {
    let text = prepare(store, campaign_id, text)?;

    let keyword = store
        .keywords
        .iter_mut()
        .find(|k| k.campaign_id == campaign_id && k.text == text)
        .ok_or_else(|| KeywordError::KeywordNotFound(text.clone()))?;
    keyword.stats = Some(stats);
    let updated = keyword.clone();

    storage.save(store)?;

    Ok(updated)
}

/// Texts present in both the keyword and negative keyword lists. Nothing
/// prevents this, but such a keyword can never serve.
pub fn conflicting_keywords(store: &Store, campaign_id: Uuid) -> Vec<String> {
    let mut conflicts: Vec<_> = store
        .get_keywords_for_campaign(campaign_id)
        .filter(|k| {
            store
                .get_negative_keywords_for_campaign(campaign_id)
                .any(|n| n.text == k.text)
        })
        .map(|k| k.text.clone())
        .collect();
    conflicts.sort();
    conflicts.dedup();
    conflicts
}
