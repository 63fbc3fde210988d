//! Centre geocoding and progressive distance resolution.
//!
//! Centres are geocoded one at a time through the geocode cache, pausing
//! between network lookups so a long result list does not hammer the Maps
//! API. Distances are published in batches so the UI can re-sort while the
//! rest are still resolving.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::time::Duration;

use tracing::{debug, info, warn};

use crate::api::{GeocodeError, MapsClient};
use crate::cache::GeocodeCache;
use crate::models::{Centre, Coordinates};

/// Pause after each network geocode.
const REQUEST_PAUSE_MS: u64 = 100;

/// Publish distances after this many centres.
const PROGRESS_BATCH: usize = 5;

/// Distances resolved so far, keyed by centre name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceSnapshot {
    pub distances: HashMap<String, f64>,
    /// Centres attempted so far, resolved or not.
    pub processed: usize,
    pub total: usize,
}

impl DistanceSnapshot {
    pub fn is_complete(&self) -> bool {
        self.processed >= self.total
    }
}

/// Geocoding query for a centre: postal code first, then address.
pub fn centre_query(centre: &Centre) -> Option<String> {
    centre
        .postal_code_trimmed()
        .or_else(|| centre.address_trimmed())
        .map(|q| format!("{}, Singapore", q))
}

pub struct LocationService {
    maps: MapsClient,
    cache: GeocodeCache,
    request_pause: Duration,
}

impl LocationService {
    pub fn new(maps: MapsClient, cache: GeocodeCache) -> Self {
        Self {
            maps,
            cache,
            request_pause: Duration::from_millis(REQUEST_PAUSE_MS),
        }
    }

    pub fn with_request_pause(mut self, pause: Duration) -> Self {
        self.request_pause = pause;
        self
    }

    pub fn maps(&self) -> &MapsClient {
        &self.maps
    }

    /// Coordinates for a centre, from cache when possible. The flag is true
    /// when a network lookup was made.
    pub async fn geocode_centre(
        &mut self,
        centre: &Centre,
    ) -> Result<(Coordinates, bool), GeocodeError> {
        let postal = centre.postal_code_trimmed();
        if let Some(coords) = self.cache.get(&centre.name, postal) {
            return Ok((coords, false));
        }

        let query = centre_query(centre).ok_or(GeocodeError::NoQuery)?;
        let result = self.maps.geocode(&query).await?;
        self.cache.set(&centre.name, postal, result.coordinates);
        debug!(centre = %centre.name, query, "Geocoded centre");
        Ok((result.coordinates, true))
    }

    /// Distances from `origin` to each centre. Failures leave a centre
    /// without a distance; `on_progress` sees every batch and the final set.
    pub async fn resolve_distances<F>(
        &mut self,
        origin: Coordinates,
        centres: &[Centre],
        on_progress: F,
    ) -> DistanceSnapshot
    where
        F: FnMut(&DistanceSnapshot),
    {
        let never = AtomicBool::new(false);
        self.resolve_distances_until(origin, centres, &never, on_progress)
            .await
    }

    /// Like [`resolve_distances`](Self::resolve_distances), but stops before
    /// the next centre once `cancel` is set. A cancelled run returns what it
    /// has so far and skips the final progress call.
    pub async fn resolve_distances_until<F>(
        &mut self,
        origin: Coordinates,
        centres: &[Centre],
        cancel: &AtomicBool,
        mut on_progress: F,
    ) -> DistanceSnapshot
    where
        F: FnMut(&DistanceSnapshot),
    {
        let mut snapshot = DistanceSnapshot {
            distances: HashMap::new(),
            processed: 0,
            total: centres.len(),
        };

        for centre in centres {
            if cancel.load(Ordering::Relaxed) {
                debug!(
                    processed = snapshot.processed,
                    total = snapshot.total,
                    "Distance resolution cancelled"
                );
                return snapshot;
            }

            match self.geocode_centre(centre).await {
                Ok((coords, fetched)) => {
                    snapshot
                        .distances
                        .insert(centre.name.clone(), origin.distance_km(&coords));
                    if fetched && !self.request_pause.is_zero() {
                        tokio::time::sleep(self.request_pause).await;
                    }
                }
                Err(e) => {
                    warn!(centre = %centre.name, error = %e, "Failed to geocode centre");
                }
            }

            snapshot.processed += 1;
            if snapshot.processed % PROGRESS_BATCH == 0 && !snapshot.is_complete() {
                on_progress(&snapshot);
            }
        }

        info!(
            resolved = snapshot.distances.len(),
            total = snapshot.total,
            "Distance resolution finished"
        );
        on_progress(&snapshot);
        snapshot
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn centre(address: Option<&str>, postal: Option<&str>) -> Centre {
        Centre {
            name: "Bright Minds".to_string(),
            address: address.map(str::to_string),
            postal_code: postal.map(str::to_string),
            ..Default::default()
        }
    }

    #[test]
    fn test_centre_query_prefers_postal_code() {
        assert_eq!(
            centre_query(&centre(Some("80 Marine Parade Rd"), Some(" 449269 "))).as_deref(),
            Some("449269, Singapore")
        );
        assert_eq!(
            centre_query(&centre(Some("80 Marine Parade Rd"), Some(""))).as_deref(),
            Some("80 Marine Parade Rd, Singapore")
        );
        assert_eq!(centre_query(&centre(None, None)), None);
        assert_eq!(centre_query(&centre(Some("  "), None)), None);
    }

    #[test]
    fn test_snapshot_completion() {
        let mut snapshot = DistanceSnapshot {
            total: 2,
            ..Default::default()
        };
        assert!(!snapshot.is_complete());
        snapshot.processed = 2;
        assert!(snapshot.is_complete());
        assert!(DistanceSnapshot::default().is_complete());
    }
}
