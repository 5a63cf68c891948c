use std::cmp::Ordering;

use serde::{Deserialize, Serialize};

/// A city record as received from the city source.
///
/// Cities carry no stable id; rows are identified by position in the view.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct City {
    pub name: String,
    pub country: String,
    pub timezone: String,
    pub population: u64,
    pub latitude: f64,
    pub longitude: f64,
}

impl City {
    /// Compare two cities by a single attribute in its natural order.
    ///
    /// Strings compare lexicographically (case-sensitive), numbers numerically.
    pub fn compare_by(&self, other: &City, key: SortKey) -> Ordering {
        match key {
            SortKey::Name => self.name.cmp(&other.name),
            SortKey::Country => self.country.cmp(&other.country),
            SortKey::Timezone => self.timezone.cmp(&other.timezone),
            SortKey::Population => self.population.cmp(&other.population),
            SortKey::Latitude => self.latitude.total_cmp(&other.latitude),
            SortKey::Longitude => self.longitude.total_cmp(&other.longitude),
        }
    }

    /// `(latitude, longitude)` passed along when navigating to the weather view.
    pub fn coordinates(&self) -> (f64, f64) {
        (self.latitude, self.longitude)
    }
}

/// Sortable city attributes, in column order.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortKey {
    Name,
    Country,
    Timezone,
    Population,
    Latitude,
    Longitude,
}

impl SortKey {
    pub const ALL: [SortKey; 6] = [
        SortKey::Name,
        SortKey::Country,
        SortKey::Timezone,
        SortKey::Population,
        SortKey::Latitude,
        SortKey::Longitude,
    ];

    /// Column header label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Name => "City Name",
            Self::Country => "Country",
            Self::Timezone => "Timezone",
            Self::Population => "Population",
            Self::Latitude => "Latitude",
            Self::Longitude => "Longitude",
        }
    }

    /// Key for a zero-based column index
    pub fn from_column(index: usize) -> Option<Self> {
        Self::ALL.get(index).copied()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SortDirection {
    #[default]
    Ascending,
    Descending,
}

/// Active sort: attribute plus direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SortSpec {
    pub key: SortKey,
    pub direction: SortDirection,
}

impl SortSpec {
    pub fn ascending(key: SortKey) -> Self {
        Self {
            key,
            direction: SortDirection::Ascending,
        }
    }

    /// The spec that results from clicking `key` while `current` is active.
    ///
    /// Same key while ascending flips to descending; anything else starts
    /// over at ascending.
    pub fn toggle(current: Option<SortSpec>, key: SortKey) -> SortSpec {
        match current {
            Some(spec) if spec.key == key && spec.direction == SortDirection::Ascending => {
                SortSpec {
                    key,
                    direction: SortDirection::Descending,
                }
            }
            _ => SortSpec::ascending(key),
        }
    }

    /// Order two cities under this spec.
    pub fn compare(&self, a: &City, b: &City) -> Ordering {
        match self.direction {
            SortDirection::Ascending => a.compare_by(b, self.key),
            SortDirection::Descending => b.compare_by(a, self.key),
        }
    }

    /// Header arrow for `key`: ▲ or ▼ when it is the active key, empty otherwise.
    pub fn indicator(spec: Option<SortSpec>, key: SortKey) -> &'static str {
        match spec {
            Some(s) if s.key == key => match s.direction {
                SortDirection::Ascending => "▲",
                SortDirection::Descending => "▼",
            },
            _ => "",
        }
    }
}

/// City source errors
#[derive(Debug, thiserror::Error)]
pub enum CityError {
    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),
    #[error("City source returned {status}: {message}")]
    Status { status: u16, message: String },
    #[error("Parse error: {0}")]
    Parse(String),
    #[error("Invalid city source configuration: {0}")]
    InvalidConfig(String),
}
