//! Location types shared by geocoding, distance sorting and the UI.

use serde::{Deserialize, Serialize};

/// A WGS84 latitude/longitude pair in degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Coordinates {
    pub lat: f64,
    pub lng: f64,
}

impl Coordinates {
    pub fn new(lat: f64, lng: f64) -> Self {
        Self { lat, lng }
    }

    /// Great-circle distance to `other` in kilometres.
    pub fn distance_km(&self, other: &Coordinates) -> f64 {
        crate::geo::haversine_km(*self, *other)
    }
}

/// Where the user's location came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LocationSource {
    Device,
    Address,
    Autocomplete,
}

/// The point distances are measured from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserLocation {
    pub coordinates: Coordinates,
    pub address: Option<String>,
    pub source: LocationSource,
}

impl UserLocation {
    /// Text shown in the location field.
    pub fn label(&self) -> String {
        match (&self.address, self.source) {
            (Some(address), _) if !address.trim().is_empty() => address.clone(),
            (_, LocationSource::Device) => "Current location".to_string(),
            _ => "Saved location".to_string(),
        }
    }
}

/// An autocomplete suggestion from the Places API.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PlacePrediction {
    pub description: String,
    pub place_id: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_location_label() {
        let coords = Coordinates::new(1.3, 103.9);
        let device = UserLocation {
            coordinates: coords,
            address: None,
            source: LocationSource::Device,
        };
        assert_eq!(device.label(), "Current location");

        let typed = UserLocation {
            coordinates: coords,
            address: Some("Marine Parade Central, Singapore".to_string()),
            source: LocationSource::Address,
        };
        assert_eq!(typed.label(), "Marine Parade Central, Singapore");

        let bare = UserLocation {
            coordinates: coords,
            address: Some("  ".to_string()),
            source: LocationSource::Autocomplete,
        };
        assert_eq!(bare.label(), "Saved location");
    }
}
