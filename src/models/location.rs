use std::fmt;

use jiff::Timestamp;
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Demographic columns shared by counties and cities
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct Demographics {
    pub population: u64,
    pub median_household_income: Option<f64>,
    pub median_home_value: Option<f64>,
    /// Share of adults with a bachelor's degree, 0..=100
    pub bachelors_degree_pct: Option<f64>,
    pub white_pct: Option<f64>,
    pub black_pct: Option<f64>,
    pub asian_pct: Option<f64>,
    pub hispanic_pct: Option<f64>,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct County {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    pub state: String,
    #[serde(flatten)]
    pub demographics: Demographics,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct City {
    #[serde(default)]
    pub id: Uuid,
    pub name: String,
    /// Joined against `County::name` by string, not by id
    pub county_name: String,
    pub state: String,
    #[serde(flatten)]
    pub demographics: Demographics,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Serialize, Deserialize, Default, Clone, Copy, Debug, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum TargetingType {
    #[default]
    Local,
    Regional,
    National,
}

impl TargetingType {
    /// Upper bound on selected locations, `None` when unbounded
    pub fn max_locations(&self) -> Option<usize> {
        match self {
            TargetingType::Local => Some(50),
            TargetingType::Regional => Some(100),
            TargetingType::National => None,
        }
    }
}

impl fmt::Display for TargetingType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            TargetingType::Local => "local",
            TargetingType::Regional => "regional",
            TargetingType::National => "national",
        };
        f.write_str(name)
    }
}

impl std::str::FromStr for TargetingType {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "local" => Ok(TargetingType::Local),
            "regional" => Ok(TargetingType::Regional),
            "national" => Ok(TargetingType::National),
            other => Err(format!("Unknown targeting type '{}'", other)),
        }
    }
}

/// A selected location, stored on campaigns as `county:<id>` or
/// `city:<name>-<state>`.
#[derive(Clone, Debug, PartialEq, Eq, Hash)]
pub enum LocationRef {
    County(Uuid),
    City { name: String, state: String },
}

#[derive(Debug, thiserror::Error, PartialEq)]
pub enum ParseLocationRefError {
    #[error("Location '{0}' is missing a 'county:' or 'city:' prefix")]
    UnknownKind(String),

    #[error("Invalid county id in '{0}'")]
    InvalidCountyId(String),

    #[error("City '{0}' must look like 'city:<name>-<state>'")]
    InvalidCity(String),
}

impl LocationRef {
    pub fn city(name: &str, state: &str) -> Self {
        LocationRef::City {
            name: name.to_string(),
            state: state.to_string(),
        }
    }
}

impl fmt::Display for LocationRef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LocationRef::County(id) => write!(f, "county:{}", id),
            LocationRef::City { name, state } => write!(f, "city:{}-{}", name, state),
        }
    }
}

impl std::str::FromStr for LocationRef {
    type Err = ParseLocationRefError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        if let Some(id) = s.strip_prefix("county:") {
            return id
                .parse()
                .map(LocationRef::County)
                .map_err(|_| ParseLocationRefError::InvalidCountyId(s.to_string()));
        }

        if let Some(rest) = s.strip_prefix("city:") {
            // City names may contain dashes ("Winston-Salem"), states never do
            return match rest.rsplit_once('-') {
                Some((name, state)) if !name.is_empty() && !state.is_empty() => {
                    Ok(LocationRef::city(name, state))
                }
                _ => Err(ParseLocationRefError::InvalidCity(s.to_string())),
            };
        }

        Err(ParseLocationRefError::UnknownKind(s.to_string()))
    }
}

/// A named, reusable set of location refs
#[derive(Serialize, Deserialize, Default, Clone, Debug, PartialEq)]
pub struct LocationList {
    pub id: Uuid,
    pub name: String,
    pub items: Vec<String>,
    pub created_at: Timestamp,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_city_ref_with_dash_in_name() {
        let parsed: LocationRef = "city:Winston-Salem-NC".parse().unwrap();
        assert_eq!(parsed, LocationRef::city("Winston-Salem", "NC"));
        assert_eq!(parsed.to_string(), "city:Winston-Salem-NC");
    }

    #[test]
    fn test_county_ref_parses_uuid() {
        let id = Uuid::new_v4();
        let parsed: LocationRef = format!("county:{}", id).parse().unwrap();
        assert_eq!(parsed, LocationRef::County(id));
    }

    #[test]
    fn test_invalid_refs() {
        assert!(matches!(
            "zip:90210".parse::<LocationRef>(),
            Err(ParseLocationRefError::UnknownKind(_))
        ));
        assert!(matches!(
            "county:not-a-uuid".parse::<LocationRef>(),
            Err(ParseLocationRefError::InvalidCountyId(_))
        ));
        assert!(matches!(
            "city:Springfield".parse::<LocationRef>(),
            Err(ParseLocationRefError::InvalidCity(_))
        ));
    }

    #[test]
    fn test_targeting_caps() {
        assert_eq!(TargetingType::Local.max_locations(), Some(50));
        assert_eq!(TargetingType::Regional.max_locations(), Some(100));
        assert_eq!(TargetingType::National.max_locations(), None);
    }
}
