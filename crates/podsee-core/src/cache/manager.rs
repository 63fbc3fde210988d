use std::path::PathBuf;

use anyhow::{Context, Result};
use chrono::{DateTime, Duration, Utc};
use serde::{de::DeserializeOwned, Deserialize, Serialize};
use tracing::debug;

use crate::models::UserLocation;

/// Saved user location is restored only while younger than this.
pub const SAVED_LOCATION_TTL_MINUTES: i64 = 10;

const SAVED_LOCATION_FILE: &str = "saved_location";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CachedData<T> {
    pub data: T,
    pub cached_at: DateTime<Utc>,
}

impl<T> CachedData<T> {
    pub fn new(data: T) -> Self {
        Self {
            data,
            cached_at: Utc::now(),
        }
    }

    pub fn age(&self) -> Duration {
        Utc::now() - self.cached_at
    }

    pub fn age_minutes(&self) -> i64 {
        self.age().num_minutes()
    }

    pub fn age_display(&self) -> String {
        let minutes = self.age_minutes();
        if minutes < 1 {
            // Also covers clock skew
            "just now".to_string()
        } else if minutes < 60 {
            format!("{}m ago", minutes)
        } else if minutes < 1440 {
            format!("{}h ago", minutes / 60)
        } else {
            format!("{}d ago", minutes / 1440)
        }
    }

    /// True once the entry is at least `max_age` old.
    pub fn is_expired(&self, max_age: Duration) -> bool {
        self.age() >= max_age
    }
}

pub struct CacheManager {
    cache_dir: PathBuf,
}

impl CacheManager {
    pub fn new(cache_dir: PathBuf) -> Result<Self> {
        std::fs::create_dir_all(&cache_dir)
            .with_context(|| format!("Failed to create cache dir: {}", cache_dir.display()))?;
        Ok(Self { cache_dir })
    }

    pub(crate) fn cache_path(&self, name: &str) -> PathBuf {
        self.cache_dir.join(format!("{}.json", name))
    }

    pub fn load<T: DeserializeOwned>(&self, name: &str) -> Result<Option<CachedData<T>>> {
        let path = self.cache_path(name);
        if !path.exists() {
            return Ok(None);
        }

        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read cache file: {}", name))?;

        let cached: CachedData<T> = serde_json::from_str(&contents)
            .with_context(|| format!("Failed to parse cache file: {}", name))?;

        Ok(Some(cached))
    }

    pub fn save<T: Serialize>(&self, name: &str, data: &T) -> Result<()> {
        let cached = CachedData::new(data);
        self.write(name, &cached)
    }

    /// Write an already-wrapped value, keeping its timestamp.
    pub fn write<T: Serialize>(&self, name: &str, cached: &CachedData<T>) -> Result<()> {
        let path = self.cache_path(name);
        let contents = serde_json::to_string_pretty(cached)?;
        std::fs::write(&path, contents)
            .with_context(|| format!("Failed to write cache file: {}", name))?;
        Ok(())
    }

    pub fn remove(&self, name: &str) -> Result<()> {
        let path = self.cache_path(name);
        if path.exists() {
            std::fs::remove_file(&path)
                .with_context(|| format!("Failed to remove cache file: {}", name))?;
        }
        Ok(())
    }

    // ===== Saved Location =====

    /// Restore the saved location if it is still fresh. Stale entries are removed.
    pub fn load_saved_location(&self) -> Result<Option<CachedData<UserLocation>>> {
        let Some(cached) = self.load::<UserLocation>(SAVED_LOCATION_FILE)? else {
            return Ok(None);
        };

        if cached.is_expired(Duration::minutes(SAVED_LOCATION_TTL_MINUTES)) {
            debug!(age_minutes = cached.age_minutes(), "Saved location expired");
            self.remove(SAVED_LOCATION_FILE)?;
            return Ok(None);
        }

        Ok(Some(cached))
    }

    pub fn save_saved_location(&self, location: &UserLocation) -> Result<()> {
        self.save(SAVED_LOCATION_FILE, location)
    }

    pub fn clear_saved_location(&self) -> Result<()> {
        self.remove(SAVED_LOCATION_FILE)
    }
}

// ============================================================================
// Tests
// ============================================================================

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Coordinates, LocationSource};

    fn location() -> UserLocation {
        UserLocation {
            coordinates: Coordinates::new(1.3023, 103.9072),
            address: Some("Marine Parade, Singapore".to_string()),
            source: LocationSource::Address,
        }
    }

    #[test]
    fn test_cached_data_age_display_just_now() {
        let cached = CachedData::new(vec![1, 2, 3]);
        assert_eq!(cached.age_display(), "just now");
    }

    #[test]
    fn test_cached_data_is_expired() {
        let fresh = CachedData::new(1);
        assert!(!fresh.is_expired(Duration::minutes(10)));

        let mut old = CachedData::new(1);
        old.cached_at = Utc::now() - Duration::minutes(11);
        assert!(old.is_expired(Duration::minutes(10)));
        assert_eq!(old.age_display(), "11m ago");
    }

    #[test]
    fn test_saved_location_round_trip() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let cache = CacheManager::new(dir.path().to_path_buf()).expect("cache");

        assert!(cache.load_saved_location().expect("load").is_none());

        cache.save_saved_location(&location()).expect("save");
        let restored = cache.load_saved_location().expect("load").expect("present");
        assert_eq!(restored.data, location());

        cache.clear_saved_location().expect("clear");
        assert!(cache.load_saved_location().expect("load").is_none());
    }

    #[test]
    fn test_stale_saved_location_is_removed() {
        let dir = tempfile::tempdir().expect("Failed to create temp dir");
        let cache = CacheManager::new(dir.path().to_path_buf()).expect("cache");

        let mut stale = CachedData::new(location());
        stale.cached_at = Utc::now() - Duration::minutes(SAVED_LOCATION_TTL_MINUTES + 1);
        cache.write(SAVED_LOCATION_FILE, &stale).expect("write");

        assert!(cache.load_saved_location().expect("load").is_none());
        assert!(!cache.cache_path(SAVED_LOCATION_FILE).exists());
    }
}
