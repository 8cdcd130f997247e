use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

/// WGS84 coordinate pair
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct Coordinates {
    pub latitude: f64,
    pub longitude: f64,
}

impl Coordinates {
    /// Build a coordinate pair, rejecting values outside WGS84 bounds
    pub fn new(latitude: f64, longitude: f64) -> Result<Self, String> {
        if !latitude.is_finite() || !(-90.0..=90.0).contains(&latitude) {
            return Err(format!("latitude must be between -90 and 90 (got {})", latitude));
        }
        if !longitude.is_finite() || !(-180.0..=180.0).contains(&longitude) {
            return Err(format!(
                "longitude must be between -180 and 180 (got {})",
                longitude
            ));
        }
        Ok(Self {
            latitude,
            longitude,
        })
    }
}

/// Where a report is.
///
/// Coordinates are authoritative for mapping, the address for human display.
/// When both are present neither replaces the other.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(tag = "kind", rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Location {
    CoordinatesOnly {
        coordinates: Coordinates,
    },
    AddressOnly {
        address: String,
    },
    Both {
        coordinates: Coordinates,
        address: String,
    },
}

impl Location {
    /// Assemble a location from optional parts. Blank addresses count as absent.
    /// Returns `None` when neither part is present.
    pub fn from_parts(coordinates: Option<Coordinates>, address: Option<String>) -> Option<Self> {
        let address = address
            .map(|a| a.trim().to_string())
            .filter(|a| !a.is_empty());

        match (coordinates, address) {
            (Some(coordinates), Some(address)) => Some(Location::Both {
                coordinates,
                address,
            }),
            (Some(coordinates), None) => Some(Location::CoordinatesOnly { coordinates }),
            (None, Some(address)) => Some(Location::AddressOnly { address }),
            (None, None) => None,
        }
    }

    pub fn coordinates(&self) -> Option<Coordinates> {
        match self {
            Location::CoordinatesOnly { coordinates } | Location::Both { coordinates, .. } => {
                Some(*coordinates)
            }
            Location::AddressOnly { .. } => None,
        }
    }

    pub fn address(&self) -> Option<&str> {
        match self {
            Location::AddressOnly { address } | Location::Both { address, .. } => Some(address),
            Location::CoordinatesOnly { .. } => None,
        }
    }

    /// Text for people: the address when known, otherwise the coordinates
    pub fn display_label(&self) -> String {
        match self {
            Location::AddressOnly { address } | Location::Both { address, .. } => address.clone(),
            Location::CoordinatesOnly { coordinates } => {
                format!("{:.6}, {:.6}", coordinates.latitude, coordinates.longitude)
            }
        }
    }
}
