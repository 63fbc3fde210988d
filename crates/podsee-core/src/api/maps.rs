//! Google Maps web service client.
//!
//! Geocoding, Places autocomplete and place details, all restricted to
//! Singapore. The API key is required up front.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::debug;

use super::ApiError;
use crate::models::{Coordinates, LocationSource, PlacePrediction, UserLocation};

const DEFAULT_BASE_URL: &str = "https://maps.googleapis.com";
const GEOCODE_PATH: &str = "/maps/api/geocode/json";
const AUTOCOMPLETE_PATH: &str = "/maps/api/place/autocomplete/json";
const PLACE_DETAILS_PATH: &str = "/maps/api/place/details/json";

/// HTTP request timeout in seconds.
const REQUEST_TIMEOUT_SECS: u64 = 15;

/// Geocoding results are restricted to Singapore.
const GEOCODE_COMPONENTS: &str = "country:SG";
const AUTOCOMPLETE_COMPONENTS: &str = "country:sg";

#[derive(Error, Debug)]
pub enum GeocodeError {
    #[error("Google Maps API key not found")]
    MissingApiKey,

    #[error("No address or postal code available")]
    NoQuery,

    #[error("Location not found. Please try again.")]
    NotFound,

    #[error("Geocoding failed: {0}")]
    Status(String),

    #[error(transparent)]
    Api(#[from] ApiError),
}

/// The API key rides in the query string, so the URL is dropped from
/// transport errors before they reach messages or logs.
impl From<reqwest::Error> for GeocodeError {
    fn from(e: reqwest::Error) -> Self {
        GeocodeError::Api(ApiError::NetworkError(e.without_url()))
    }
}

/// A geocoded point with Google's formatted address.
#[derive(Debug, Clone, PartialEq)]
pub struct GeocodeResult {
    pub coordinates: Coordinates,
    pub formatted_address: Option<String>,
}

#[derive(Debug, Deserialize)]
struct GeocodeResponse {
    status: String,
    #[serde(default)]
    results: Vec<PlaceResult>,
}

#[derive(Debug, Deserialize)]
struct PlaceResult {
    formatted_address: Option<String>,
    geometry: Option<Geometry>,
}

#[derive(Debug, Deserialize)]
struct Geometry {
    location: LatLng,
}

#[derive(Debug, Deserialize)]
struct LatLng {
    lat: f64,
    lng: f64,
}

#[derive(Debug, Deserialize)]
struct AutocompleteResponse {
    status: String,
    #[serde(default)]
    predictions: Vec<PlacePrediction>,
}

#[derive(Debug, Deserialize)]
struct PlaceDetailsResponse {
    status: String,
    result: Option<PlaceResult>,
}

impl PlaceResult {
    fn into_geocode_result(self) -> Option<GeocodeResult> {
        let location = self.geometry?.location;
        Some(GeocodeResult {
            coordinates: Coordinates::new(location.lat, location.lng),
            formatted_address: self.formatted_address,
        })
    }
}

/// Map a non-OK Google status onto an error.
fn status_error(status: &str) -> GeocodeError {
    match status {
        "ZERO_RESULTS" | "NOT_FOUND" => GeocodeError::NotFound,
        other => GeocodeError::Status(other.to_string()),
    }
}

/// Google Maps client. Clone is cheap; the underlying client is shared.
#[derive(Clone)]
pub struct MapsClient {
    client: Client,
    api_key: String,
    base_url: String,
}

impl MapsClient {
    /// Create a client, failing fast when no API key is configured.
    pub fn new(api_key: &str) -> Result<Self, GeocodeError> {
        let api_key = api_key.trim();
        if api_key.is_empty() {
            return Err(GeocodeError::MissingApiKey);
        }

        let client = Client::builder()
            .timeout(Duration::from_secs(REQUEST_TIMEOUT_SECS))
            .build()?;

        Ok(Self {
            client,
            api_key: api_key.to_string(),
            base_url: DEFAULT_BASE_URL.to_string(),
        })
    }

    /// Point the client at another host (used by tests).
    pub fn with_base_url(mut self, base_url: &str) -> Self {
        self.base_url = base_url.trim_end_matches('/').to_string();
        self
    }

    async fn get<T: serde::de::DeserializeOwned>(
        &self,
        path: &str,
        params: &[(&str, &str)],
    ) -> Result<T, GeocodeError> {
        let url = format!("{}{}", self.base_url, path);
        let response = self
            .client
            .get(&url)
            .query(params)
            .query(&[("key", self.api_key.as_str())])
            .send()
            .await?;

        let response = ApiError::check(response).await?;
        Ok(response.json().await?)
    }

    /// Geocode free text within Singapore.
    pub async fn geocode(&self, query: &str) -> Result<GeocodeResult, GeocodeError> {
        let query = query.trim();
        if query.is_empty() {
            return Err(GeocodeError::NoQuery);
        }

        let body: GeocodeResponse = self
            .get(
                GEOCODE_PATH,
                &[("address", query), ("components", GEOCODE_COMPONENTS)],
            )
            .await?;

        if body.status != "OK" {
            debug!(status = %body.status, query, "Geocode returned non-OK status");
            return Err(status_error(&body.status));
        }

        body.results
            .into_iter()
            .next()
            .and_then(PlaceResult::into_geocode_result)
            .ok_or(GeocodeError::NotFound)
    }

    /// Geocode a typed address into a user location.
    pub async fn locate_address(&self, input: &str) -> Result<UserLocation, GeocodeError> {
        let result = self.geocode(input).await?;
        Ok(UserLocation {
            coordinates: result.coordinates,
            address: result.formatted_address,
            source: LocationSource::Address,
        })
    }

    /// Place suggestions for partial input. No matches is an empty list.
    pub async fn autocomplete(&self, input: &str) -> Result<Vec<PlacePrediction>, GeocodeError> {
        let input = input.trim();
        if input.is_empty() {
            return Ok(Vec::new());
        }

        let body: AutocompleteResponse = self
            .get(
                AUTOCOMPLETE_PATH,
                &[("input", input), ("components", AUTOCOMPLETE_COMPONENTS)],
            )
            .await?;

        match body.status.as_str() {
            "OK" => Ok(body.predictions),
            "ZERO_RESULTS" => Ok(Vec::new()),
            other => Err(GeocodeError::Status(other.to_string())),
        }
    }

    /// Resolve a selected autocomplete suggestion.
    pub async fn place_details(&self, place_id: &str) -> Result<UserLocation, GeocodeError> {
        let body: PlaceDetailsResponse = self
            .get(
                PLACE_DETAILS_PATH,
                &[("place_id", place_id), ("fields", "geometry,formatted_address")],
            )
            .await?;

        if body.status != "OK" {
            return Err(status_error(&body.status));
        }

        let result = body
            .result
            .and_then(PlaceResult::into_geocode_result)
            .ok_or(GeocodeError::NotFound)?;

        Ok(UserLocation {
            coordinates: result.coordinates,
            address: result.formatted_address,
            source: LocationSource::Autocomplete,
        })
    }
}
