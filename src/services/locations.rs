use std::{
    collections::HashSet,
    path::{Path, PathBuf},
};

use jiff::Timestamp;
use thiserror::Error;
use uuid::Uuid;

use crate::{
    models::{
        campaign::LocationTargeting,
        location::{
            City, County, Demographics, LocationList, LocationRef, ParseLocationRefError,
            TargetingType,
        },
        store::Store,
    },
    storage::{Storage, StorageError},
};

pub struct CountySearch<'a> {
    pub query: &'a str,
    pub state: Option<&'a str>,
    pub min_population: Option<u64>,
    pub limit: usize,
}

impl Default for CountySearch<'_> {
    fn default() -> Self {
        Self {
            query: "",
            state: None,
            min_population: None,
            limit: 100,
        }
    }
}

/// Counties whose name contains the query, most populous first
pub fn search_counties<'a>(store: &'a Store, search: &CountySearch) -> Vec<&'a County> {
    let query = search.query.trim().to_lowercase();

    let mut counties: Vec<_> = store
        .counties
        .iter()
        .filter(|c| query.is_empty() || c.name.to_lowercase().contains(&query))
        .filter(|c| {
            search
                .state
                .is_none_or(|state| c.state.eq_ignore_ascii_case(state.trim()))
        })
        .filter(|c| {
            search
                .min_population
                .is_none_or(|min| c.demographics.population >= min)
        })
        .collect();

    counties.sort_by(|a, b| {
        b.demographics
            .population
            .cmp(&a.demographics.population)
            .then_with(|| a.name.cmp(&b.name))
    });
    counties.truncate(search.limit);
    counties
}

fn same_name(a: &str, b: &str) -> bool {
    a.trim().eq_ignore_ascii_case(b.trim())
}

/// Cities belong to a county only through matching county name and state
pub fn cities_in_county<'a>(store: &'a Store, county: &County) -> Vec<&'a City> {
    let mut cities: Vec<_> = store
        .cities
        .iter()
        .filter(|city| same_name(&city.county_name, &county.name) && same_name(&city.state, &county.state))
        .collect();
    cities.sort_by(|a, b| b.demographics.population.cmp(&a.demographics.population));
    cities
}

pub fn find_city<'a>(store: &'a Store, name: &str, state: &str) -> Option<&'a City> {
    store
        .cities
        .iter()
        .find(|c| same_name(&c.name, name) && same_name(&c.state, state))
}

/// Ordered set of selected locations, as curated in the location step
#[derive(Clone, Debug, Default, PartialEq)]
pub struct LocationSelection {
    refs: Vec<LocationRef>,
}

impl LocationSelection {
    pub fn from_tagged<S: AsRef<str>>(items: &[S]) -> Result<Self, ParseLocationRefError> {
        let mut selection = Self::default();
        for item in items {
            selection.insert(item.as_ref().parse()?);
        }
        Ok(selection)
    }

    pub fn to_tagged(&self) -> Vec<String> {
        self.refs.iter().map(LocationRef::to_string).collect()
    }

    pub fn contains(&self, location: &LocationRef) -> bool {
        self.refs.contains(location)
    }

    pub fn insert(&mut self, location: LocationRef) -> bool {
        if self.contains(&location) {
            return false;
        }
        self.refs.push(location);
        true
    }

    /// Adds the location if missing, removes it otherwise. Returns whether
    /// it is selected afterwards.
    pub fn toggle(&mut self, location: LocationRef) -> bool {
        if let Some(index) = self.refs.iter().position(|r| *r == location) {
            self.refs.remove(index);
            false
        } else {
            self.refs.push(location);
            true
        }
    }

    pub fn len(&self) -> usize {
        self.refs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.refs.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &LocationRef> {
        self.refs.iter()
    }
}

#[derive(Debug, Error, PartialEq)]
pub enum LocationValidationError {
    #[error("Select at least one location")]
    Empty,

    #[error("{targeting_type} targeting allows at most {max} locations ({selected} selected)")]
    TooMany {
        targeting_type: TargetingType,
        max: usize,
        selected: usize,
    },
}

/// Caps apply when the user tries to continue, not on every toggle
pub fn validate_selection(
    targeting_type: TargetingType,
    selection: &LocationSelection,
) -> Result<(), LocationValidationError> {
    if selection.is_empty() {
        return Err(LocationValidationError::Empty);
    }

    match targeting_type.max_locations() {
        Some(max) if selection.len() > max => Err(LocationValidationError::TooMany {
            targeting_type,
            max,
            selected: selection.len(),
        }),
        _ => Ok(()),
    }
}

#[derive(Clone, Debug, Default, PartialEq)]
pub struct SelectionSummary {
    pub counties: usize,
    pub cities: usize,
    /// Refs that no longer match a stored row
    pub unresolved: usize,
    pub total_population: u64,
    /// Population-weighted over rows that report an income
    pub weighted_median_income: Option<f64>,
}

#[derive(Clone, Copy, Debug, PartialEq)]
pub struct BoundingBox {
    pub min_latitude: f64,
    pub min_longitude: f64,
    pub max_latitude: f64,
    pub max_longitude: f64,
}

impl BoundingBox {
    pub fn center(&self) -> (f64, f64) {
        (
            (self.min_latitude + self.max_latitude) / 2.0,
            (self.min_longitude + self.max_longitude) / 2.0,
        )
    }
}

fn resolved_points<'a>(
    store: &'a Store,
    selection: &'a LocationSelection,
) -> impl Iterator<Item = Option<(&'a Demographics, f64, f64, bool)>> + 'a {
    selection.iter().map(move |location| match location {
        LocationRef::County(id) => store
            .get_county(*id)
            .map(|c| (&c.demographics, c.latitude, c.longitude, true)),
        LocationRef::City { name, state } => {
            find_city(store, name, state).map(|c| (&c.demographics, c.latitude, c.longitude, false))
        }
    })
}

pub fn summarize_selection(store: &Store, selection: &LocationSelection) -> SelectionSummary {
    let mut summary = SelectionSummary::default();
    let mut income_weight = 0u64;
    let mut income_sum = 0.0;

    for point in resolved_points(store, selection) {
        let Some((demographics, _, _, is_county)) = point else {
            summary.unresolved += 1;
            continue;
        };

        if is_county {
            summary.counties += 1;
        } else {
            summary.cities += 1;
        }
        summary.total_population += demographics.population;

        if let Some(income) = demographics.median_household_income {
            income_weight += demographics.population;
            income_sum += income * demographics.population as f64;
        }
    }

    if income_weight > 0 {
        summary.weighted_median_income = Some(income_sum / income_weight as f64);
    }

    summary
}

/// Map viewport covering every resolvable location in the selection
pub fn selection_bounds(store: &Store, selection: &LocationSelection) -> Option<BoundingBox> {
    resolved_points(store, selection)
        .flatten()
        .map(|(_, lat, lon, _)| (lat, lon))
        .fold(None, |bounds: Option<BoundingBox>, (lat, lon)| {
            Some(match bounds {
                None => BoundingBox {
                    min_latitude: lat,
                    min_longitude: lon,
                    max_latitude: lat,
                    max_longitude: lon,
                },
                Some(b) => BoundingBox {
                    min_latitude: b.min_latitude.min(lat),
                    min_longitude: b.min_longitude.min(lon),
                    max_latitude: b.max_latitude.max(lat),
                    max_longitude: b.max_longitude.max(lon),
                },
            })
        })
}

#[derive(Debug, Error)]
pub enum SetCampaignLocationsError {
    #[error("Campaign {0} not found")]
    CampaignNotFound(Uuid),

    #[error(transparent)]
    Invalid(#[from] LocationValidationError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub struct SetCampaignLocationsParameters {
    pub campaign_id: Uuid,
    pub targeting_type: TargetingType,
    pub selection: LocationSelection,
    pub excluded: LocationSelection,
    pub radius_miles: Option<f64>,
}

/// An empty selection clears the targeting, leaving the campaign without
/// a geographic restriction. Otherwise the targeting cap applies.
pub fn set_campaign_locations(
    store: &mut Store,
    storage: &impl Storage,
    parameters: SetCampaignLocationsParameters,
) -> Result<Option<LocationTargeting>, SetCampaignLocationsError> {
    let targeting = if parameters.selection.is_empty() {
        None
    } else {
        validate_selection(parameters.targeting_type, &parameters.selection)?;
        Some(LocationTargeting {
            targeting_type: parameters.targeting_type,
            included: parameters.selection.to_tagged(),
            excluded: parameters.excluded.to_tagged(),
            radius_miles: parameters.radius_miles,
        })
    };

    let campaign = store
        .get_campaign_mut(parameters.campaign_id)
        .ok_or(SetCampaignLocationsError::CampaignNotFound(parameters.campaign_id))?;

    campaign.location_targeting = targeting.clone();
    campaign.updated_at = Timestamp::now();
    tracing::info!(
        campaign = %parameters.campaign_id,
        locations = targeting.as_ref().map_or(0, |t| t.included.len()),
        "campaign locations set"
    );

    storage.save(store)?;

    Ok(targeting)
}

#[derive(Debug, Error)]
pub enum ImportLocationsError {
    #[error("Failed to read '{path}': {source}")]
    Read {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse '{path}': {source}")]
    Parse {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

trait LocationRow: serde::de::DeserializeOwned {
    fn id_mut(&mut self) -> &mut Uuid;
}

impl LocationRow for County {
    fn id_mut(&mut self) -> &mut Uuid {
        &mut self.id
    }
}

impl LocationRow for City {
    fn id_mut(&mut self) -> &mut Uuid {
        &mut self.id
    }
}

/// Rows without an id get a fresh one
fn read_rows<T: LocationRow>(path: &Path) -> Result<Vec<T>, ImportLocationsError> {
    let display = path.display().to_string();
    let content = std::fs::read_to_string(path).map_err(|e| ImportLocationsError::Read {
        path: display.clone(),
        source: e,
    })?;
    let mut rows: Vec<T> = serde_json::from_str(&content).map_err(|e| ImportLocationsError::Parse {
        path: display,
        source: e,
    })?;

    for row in &mut rows {
        let id = row.id_mut();
        if id.is_nil() {
            *id = Uuid::new_v4();
        }
    }

    Ok(rows)
}

pub struct ImportLocationsParameters {
    pub counties: Option<PathBuf>,
    pub cities: Option<PathBuf>,
}

#[derive(Debug, Default, PartialEq)]
pub struct ImportLocationsResult {
    pub counties: usize,
    pub cities: usize,
}

/// Replaces every row of each granularity that is given
pub fn import_locations(
    store: &mut Store,
    storage: &impl Storage,
    parameters: ImportLocationsParameters,
) -> Result<ImportLocationsResult, ImportLocationsError> {
    let mut result = ImportLocationsResult::default();

    if let Some(path) = parameters.counties {
        store.counties = read_rows(&path)?;
        result.counties = store.counties.len();
    }
    if let Some(path) = parameters.cities {
        store.cities = read_rows(&path)?;
        result.cities = store.cities.len();
    }

    tracing::info!(counties = result.counties, cities = result.cities, "locations imported");
    storage.save(store)?;

    Ok(result)
}

#[derive(Debug, Error)]
pub enum LocationListError {
    #[error("Location list name is required")]
    EmptyName,

    #[error("Location list '{0}' already exists")]
    AlreadyExists(String),

    #[error("Location list '{0}' not found")]
    NotFound(String),

    #[error(transparent)]
    InvalidLocation(#[from] ParseLocationRefError),

    #[error("Storage error: {0}")]
    Storage(#[from] StorageError),
}

pub fn create_location_list(
    store: &mut Store,
    storage: &impl Storage,
    name: &str,
    selection: &LocationSelection,
) -> Result<LocationList, LocationListError> {
    let name = name.trim();
    if name.is_empty() {
        return Err(LocationListError::EmptyName);
    }
    if store
        .location_lists
        .iter()
        .any(|l| l.name.eq_ignore_ascii_case(name))
    {
        return Err(LocationListError::AlreadyExists(name.to_string()));
    }

    let list = LocationList {
        id: Uuid::new_v4(),
        name: name.to_string(),
        items: selection.to_tagged(),
        created_at: Timestamp::now(),
    };
    store.location_lists.push(list.clone());
    tracing::info!(name = %list.name, items = list.items.len(), "location list saved");

    storage.save(store)?;

    Ok(list)
}

pub fn find_location_list<'a>(store: &'a Store, name: &str) -> Option<&'a LocationList> {
    store
        .location_lists
        .iter()
        .find(|l| l.name.eq_ignore_ascii_case(name.trim()))
}

pub fn load_location_list(store: &Store, name: &str) -> Result<LocationSelection, LocationListError> {
    let list = find_location_list(store, name)
        .ok_or_else(|| LocationListError::NotFound(name.to_string()))?;
    Ok(LocationSelection::from_tagged(&list.items)?)
}

pub fn delete_location_list(
    store: &mut Store,
    storage: &impl Storage,
    name: &str,
) -> Result<LocationList, LocationListError> {
    let index = store
        .location_lists
        .iter()
        .position(|l| l.name.eq_ignore_ascii_case(name.trim()))
        .ok_or_else(|| LocationListError::NotFound(name.to_string()))?;
    let removed = store.location_lists.remove(index);

    storage.save(store)?;

    Ok(removed)
}

/// States present in the county table, for the state picker
pub fn known_states(store: &Store) -> Vec<String> {
    let mut states: Vec<_> = store
        .counties
        .iter()
        .map(|c| c.state.trim().to_uppercase())
        .collect::<HashSet<_>>()
        .into_iter()
        .collect();
    states.sort();
    states
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{models::campaign::Campaign, storage::memory::MemoryStorage};

    fn county(name: &str, state: &str, population: u64, lat: f64, lon: f64) -> County {
        County {
            id: Uuid::new_v4(),
            name: name.to_string(),
            state: state.to_string(),
            demographics: Demographics {
                population,
                median_household_income: Some(60_000.0),
                ..Demographics::default()
            },
            latitude: lat,
            longitude: lon,
        }
    }

    fn city(name: &str, county_name: &str, state: &str, population: u64) -> City {
        City {
            id: Uuid::new_v4(),
            name: name.to_string(),
            county_name: county_name.to_string(),
            state: state.to_string(),
            demographics: Demographics {
                population,
                median_household_income: Some(90_000.0),
                ..Demographics::default()
            },
            latitude: 30.0,
            longitude: -97.0,
        }
    }

    fn sample_store() -> Store {
        Store {
            counties: vec![
                county("Travis", "TX", 1_300_000, 30.3, -97.7),
                county("Harris", "TX", 4_700_000, 29.8, -95.4),
                county("Travis", "OK", 10_000, 35.0, -96.0),
            ],
            cities: vec![
                city("Austin", "Travis", "TX", 960_000),
                city("Pflugerville", "travis ", "tx", 65_000),
                city("Houston", "Harris", "TX", 2_300_000),
            ],
            ..Store::default()
        }
    }

    #[test]
    fn test_search_counties_by_name_and_state() {
        let store = sample_store();

        let all_travis = search_counties(
            &store,
            &CountySearch {
                query: "trav",
                ..CountySearch::default()
            },
        );
        assert_eq!(all_travis.len(), 2);
        assert_eq!(all_travis[0].state, "TX");

        let texas = search_counties(
            &store,
            &CountySearch {
                state: Some("tx"),
                ..CountySearch::default()
            },
        );
        let names: Vec<_> = texas.iter().map(|c| c.name.as_str()).collect();
        assert_eq!(names, vec!["Harris", "Travis"]);
    }

    #[test]
    fn test_cities_join_on_name_and_state() {
        let store = sample_store();
        let travis_tx = &store.counties[0];

        let cities: Vec<_> = cities_in_county(&store, travis_tx)
            .iter()
            .map(|c| c.name.as_str())
            .collect();
        assert_eq!(cities, vec!["Austin", "Pflugerville"]);

        let travis_ok = &store.counties[2];
        assert!(cities_in_county(&store, travis_ok).is_empty());
    }

    #[test]
    fn test_toggle_and_serialize() {
        let store = sample_store();
        let mut selection = LocationSelection::default();

        assert!(selection.toggle(LocationRef::County(store.counties[0].id)));
        assert!(selection.toggle(LocationRef::city("Austin", "TX")));
        assert!(!selection.toggle(LocationRef::County(store.counties[0].id)));

        assert_eq!(selection.to_tagged(), vec![String::from("city:Austin-TX")]);

        let reparsed = LocationSelection::from_tagged(&selection.to_tagged()).unwrap();
        assert_eq!(reparsed, selection);
    }

    #[test]
    fn test_local_cap_rejects_fifty_one() {
        let mut selection = LocationSelection::default();
        for i in 0..51 {
            selection.insert(LocationRef::city(&format!("Town{}", i), "TX"));
        }

        assert_eq!(
            validate_selection(TargetingType::Local, &selection),
            Err(LocationValidationError::TooMany {
                targeting_type: TargetingType::Local,
                max: 50,
                selected: 51,
            })
        );
        assert!(validate_selection(TargetingType::Regional, &selection).is_ok());
        assert!(validate_selection(TargetingType::National, &selection).is_ok());
    }

    #[test]
    fn test_empty_selection_is_invalid() {
        assert_eq!(
            validate_selection(TargetingType::National, &LocationSelection::default()),
            Err(LocationValidationError::Empty)
        );
    }

    #[test]
    fn test_empty_selection_clears_campaign_targeting() {
        let mut store = sample_store();
        let campaign = Campaign {
            id: Uuid::new_v4(),
            name: String::from("Spring Promo"),
            ..Campaign::default()
        };
        let campaign_id = campaign.id;
        store.campaigns.push(campaign);
        let storage = MemoryStorage::default();

        let mut selection = LocationSelection::default();
        selection.insert(LocationRef::County(store.counties[0].id));
        let targeting = set_campaign_locations(
            &mut store,
            &storage,
            SetCampaignLocationsParameters {
                campaign_id,
                targeting_type: TargetingType::Regional,
                selection,
                excluded: LocationSelection::default(),
                radius_miles: Some(25.0),
            },
        )
        .unwrap();
        assert_eq!(targeting.map(|t| t.included.len()), Some(1));

        let cleared = set_campaign_locations(
            &mut store,
            &storage,
            SetCampaignLocationsParameters {
                campaign_id,
                targeting_type: TargetingType::Regional,
                selection: LocationSelection::default(),
                excluded: LocationSelection::default(),
                radius_miles: None,
            },
        )
        .unwrap();
        assert!(cleared.is_none());
        assert!(store.get_campaign(campaign_id).unwrap().location_targeting.is_none());
        assert_eq!(storage.saves.get(), 2);
    }

    #[test]
    fn test_summary_and_bounds() {
        let store = sample_store();
        let mut selection = LocationSelection::default();
        selection.insert(LocationRef::County(store.counties[1].id));
        selection.insert(LocationRef::city("Austin", "TX"));
        selection.insert(LocationRef::city("Gone", "TX"));

        let summary = summarize_selection(&store, &selection);
        assert_eq!(summary.counties, 1);
        assert_eq!(summary.cities, 1);
        assert_eq!(summary.unresolved, 1);
        assert_eq!(summary.total_population, 4_700_000 + 960_000);
        let income = summary.weighted_median_income.unwrap();
        assert!(income > 60_000.0 && income < 90_000.0);

        let bounds = selection_bounds(&store, &selection).unwrap();
        assert_eq!(bounds.min_latitude, 29.8);
        assert_eq!(bounds.max_latitude, 30.0);
        assert_eq!(bounds.min_longitude, -97.0);
        assert_eq!(bounds.max_longitude, -95.4);
    }

    #[test]
    fn test_location_lists() {
        let mut store = sample_store();
        let storage = MemoryStorage::default();
        let mut selection = LocationSelection::default();
        selection.insert(LocationRef::city("Austin", "TX"));

        create_location_list(&mut store, &storage, "Central Texas", &selection).unwrap();
        let duplicate = create_location_list(&mut store, &storage, "central texas", &selection);
        assert!(matches!(duplicate, Err(LocationListError::AlreadyExists(_))));

        let loaded = load_location_list(&store, "CENTRAL TEXAS").unwrap();
        assert_eq!(loaded, selection);

        delete_location_list(&mut store, &storage, "Central Texas").unwrap();
        assert!(matches!(
            load_location_list(&store, "Central Texas"),
            Err(LocationListError::NotFound(_))
        ));
    }

    #[test]
    fn test_import_assigns_missing_ids() {
        let dir = std::env::temp_dir().join(format!("adcamp-import-{}", Uuid::new_v4()));
        std::fs::create_dir_all(&dir).unwrap();
        let counties_path = dir.join("counties.json");
        std::fs::write(
            &counties_path,
            r#"[{"name": "Travis", "state": "TX", "population": 1300000,
                 "median_household_income": 85000.0, "latitude": 30.3, "longitude": -97.7}]"#,
        )
        .unwrap();

        let mut store = Store::default();
        let storage = MemoryStorage::default();
        let result = import_locations(
            &mut store,
            &storage,
            ImportLocationsParameters {
                counties: Some(counties_path),
                cities: None,
            },
        )
        .unwrap();

        assert_eq!(result.counties, 1);
        assert!(!store.counties[0].id.is_nil());
        assert_eq!(store.counties[0].demographics.population, 1_300_000);
        assert_eq!(known_states(&store), vec![String::from("TX")]);

        std::fs::remove_dir_all(&dir).unwrap();
    }
}
