//! Geocode cache for centre coordinates.
//!
//! Entries are keyed by `geocache_<name>_<postal code>` and persisted in a
//! single JSON file. Reads check the in-memory session layer first, then the
//! file; entries at least 30 days old are evicted on read.

use std::collections::HashMap;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use chrono::Duration;
use tracing::{debug, warn};

use super::CachedData;
use crate::models::Coordinates;

/// Days before a persisted centre location must be looked up again.
pub const GEOCODE_EXPIRY_DAYS: i64 = 30;

const CACHE_KEY_PREFIX: &str = "geocache_";
const GEOCODE_CACHE_FILE: &str = "geocache.json";

/// Cache key for a centre. A missing postal code keys as empty.
pub fn cache_key(centre_name: &str, postal_code: Option<&str>) -> String {
    format!(
        "{}{}_{}",
        CACHE_KEY_PREFIX,
        centre_name,
        postal_code.unwrap_or_default()
    )
}

pub struct GeocodeCache {
    path: PathBuf,
    entries: HashMap<String, CachedData<Coordinates>>,
    session: HashMap<String, Coordinates>,
}

impl GeocodeCache {
    /// Open the cache in `cache_dir`. An unreadable file starts an empty cache.
    pub fn open(cache_dir: &Path) -> Result<Self> {
        std::fs::create_dir_all(cache_dir)
            .with_context(|| format!("Failed to create cache dir: {}", cache_dir.display()))?;
        let path = cache_dir.join(GEOCODE_CACHE_FILE);

        let entries = match Self::read_entries(&path) {
            Ok(entries) => entries,
            Err(e) => {
                warn!(error = %e, "Error reading geocode cache, starting empty");
                HashMap::new()
            }
        };
        debug!(entries = entries.len(), "Geocode cache opened");

        Ok(Self {
            path,
            entries,
            session: HashMap::new(),
        })
    }

    fn read_entries(path: &Path) -> Result<HashMap<String, CachedData<Coordinates>>> {
        if !path.exists() {
            return Ok(HashMap::new());
        }
        let contents = std::fs::read_to_string(path).context("Failed to read geocode cache")?;
        serde_json::from_str(&contents).context("Failed to parse geocode cache")
    }

    fn persist(&self) {
        let result = serde_json::to_string_pretty(&self.entries)
            .context("Failed to serialize geocode cache")
            .and_then(|contents| {
                std::fs::write(&self.path, contents).context("Failed to write geocode cache")
            });
        if let Err(e) = result {
            warn!(error = %e, "Error saving to geocode cache");
        }
    }

    /// Cached coordinates for a centre, if present and not expired.
    pub fn get(&mut self, centre_name: &str, postal_code: Option<&str>) -> Option<Coordinates> {
        let key = cache_key(centre_name, postal_code);

        if let Some(coords) = self.session.get(&key) {
            return Some(*coords);
        }

        let cached = self.entries.get(&key)?;
        if cached.is_expired(Duration::days(GEOCODE_EXPIRY_DAYS)) {
            debug!(key = %key, "Geocode cache entry expired");
            self.entries.remove(&key);
            self.persist();
            return None;
        }

        let coords = cached.data;
        self.session.insert(key, coords);
        Some(coords)
    }

    /// Store coordinates for a centre in both layers.
    pub fn set(&mut self, centre_name: &str, postal_code: Option<&str>, coords: Coordinates) {
        let key = cache_key(centre_name, postal_code);
        self.session.insert(key.clone(), coords);
        self.entries.insert(key, CachedData::new(coords));
        self.persist();
    }

    /// Number of persisted entries.
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Utc;

    #[test]
    fn test_cache_key_format() {
        assert_eq!(cache_key("Bright Minds", Some("449269")), "geocache_Bright Minds_449269");
        assert_eq!(cache_key("Bright Minds", None), "geocache_Bright Minds_");
    }

    #[test]
    fn test_set_then_get_round_trip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let mut cache = GeocodeCache::open(dir.path()).expect("open");
        let coords = Coordinates::new(1.3023, 103.9072);

        assert_eq!(cache.get("Bright Minds", Some("449269")), None);
        cache.set("Bright Minds", Some("449269"), coords);
        assert_eq!(cache.get("Bright Minds", Some("449269")), Some(coords));

        // Different postal code is a different key
        assert_eq!(cache.get("Bright Minds", Some("449270")), None);
    }

    #[test]
    fn test_entries_survive_reopen() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let coords = Coordinates::new(1.30, 103.90);
        {
            let mut cache = GeocodeCache::open(dir.path()).expect("open");
            cache.set("Parade Tutors", Some("440035"), coords);
        }

        let mut reopened = GeocodeCache::open(dir.path()).expect("reopen");
        assert_eq!(reopened.len(), 1);
        assert_eq!(reopened.get("Parade Tutors", Some("440035")), Some(coords));
    }

    #[test]
    fn test_expired_entry_is_evicted() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let coords = Coordinates::new(1.30, 103.90);
        {
            let mut cache = GeocodeCache::open(dir.path()).expect("open");
            cache.set("Parade Tutors", Some("440035"), coords);
        }

        // Age the stored timestamp past the expiry window
        let path = dir.path().join(GEOCODE_CACHE_FILE);
        let contents = std::fs::read_to_string(&path).expect("read");
        let mut entries: HashMap<String, CachedData<Coordinates>> =
            serde_json::from_str(&contents).expect("parse");
        for entry in entries.values_mut() {
            entry.cached_at = Utc::now() - Duration::days(GEOCODE_EXPIRY_DAYS + 1);
        }
        std::fs::write(&path, serde_json::to_string(&entries).expect("serialize")).expect("write");

        let mut cache = GeocodeCache::open(dir.path()).expect("open");
        assert_eq!(cache.get("Parade Tutors", Some("440035")), None);
        assert!(cache.is_empty());

        let reopened = GeocodeCache::open(dir.path()).expect("reopen");
        assert!(reopened.is_empty());
    }

    #[test]
    fn test_corrupt_file_starts_empty() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        std::fs::write(dir.path().join(GEOCODE_CACHE_FILE), "not json").expect("write");

        let cache = GeocodeCache::open(dir.path()).expect("open");
        assert!(cache.is_empty());
    }
}
