//! Approximate device location from the public IP address.
//!
//! Terminals have no geolocation prompt, so the user's opt-in lives in
//! config: a disabled locator reports permission denied.

use std::time::Duration;

use reqwest::Client;
use serde::Deserialize;
use thiserror::Error;
use tracing::{debug, info};

use crate::models::{Coordinates, LocationSource, UserLocation};

const DEFAULT_LOCATOR_URL: &str = "https://ipapi.co/json/";

/// Device location lookups give up after this long.
const LOCATE_TIMEOUT_SECS: u64 = 10;

/// Geolocation failures, each with its own user-facing message.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum LocationError {
    #[error("Location permission denied")]
    PermissionDenied,

    #[error("Location information unavailable")]
    Unavailable,

    #[error("Location request timed out")]
    Timeout,

    #[error("Geolocation is not supported")]
    Unsupported,
}

impl From<reqwest::Error> for LocationError {
    fn from(e: reqwest::Error) -> Self {
        if e.is_timeout() {
            LocationError::Timeout
        } else {
            LocationError::Unavailable
        }
    }
}

#[derive(Debug, Deserialize)]
struct LocatorResponse {
    latitude: Option<f64>,
    longitude: Option<f64>,
    city: Option<String>,
}

#[derive(Clone)]
pub struct IpLocator {
    client: Option<Client>,
    url: String,
    enabled: bool,
}

impl IpLocator {
    /// Create a locator. `enabled` reflects whether the user allows
    /// device location lookups.
    pub fn new(enabled: bool) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(LOCATE_TIMEOUT_SECS))
            .build()
            .map_err(|e| debug!(error = %e, "Failed to create locator client"))
            .ok();

        Self {
            client,
            url: DEFAULT_LOCATOR_URL.to_string(),
            enabled,
        }
    }

    /// Use a different lookup endpoint (used by tests).
    pub fn with_url(mut self, url: &str) -> Self {
        self.url = url.to_string();
        self
    }

    pub async fn locate(&self) -> Result<UserLocation, LocationError> {
        if !self.enabled {
            return Err(LocationError::PermissionDenied);
        }
        let client = self.client.as_ref().ok_or(LocationError::Unsupported)?;

        let response = client.get(&self.url).send().await?;
        match response.status().as_u16() {
            200..=299 => {}
            401 | 403 => return Err(LocationError::PermissionDenied),
            status => {
                debug!(status, "Locator returned error status");
                return Err(LocationError::Unavailable);
            }
        }

        let body: LocatorResponse = response.json().await?;
        let (Some(lat), Some(lng)) = (body.latitude, body.longitude) else {
            return Err(LocationError::Unavailable);
        };

        info!(city = ?body.city, "Resolved device location");
        Ok(UserLocation {
            coordinates: Coordinates::new(lat, lng),
            address: None,
            source: LocationSource::Device,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_disabled_locator_reports_permission_denied() {
        let locator = IpLocator::new(false);
        assert_eq!(locator.locate().await, Err(LocationError::PermissionDenied));
    }

    #[test]
    fn test_error_messages_are_distinct() {
        let messages = [
            LocationError::PermissionDenied.to_string(),
            LocationError::Unavailable.to_string(),
            LocationError::Timeout.to_string(),
            LocationError::Unsupported.to_string(),
        ];
        for (i, a) in messages.iter().enumerate() {
            for b in &messages[i + 1..] {
                assert_ne!(a, b);
            }
        }
    }
}
