//! Local caching module.
//!
//! - `CacheManager`: JSON files in the cache directory, each wrapped in
//!   `CachedData` with the time it was written. Holds the saved user
//!   location, which is only restored while younger than 10 minutes.
//! - `GeocodeCache`: centre coordinates keyed by name and postal code,
//!   persisted for 30 days, with an in-memory layer for the current run.

pub mod geocode;
pub mod manager;

pub use geocode::GeocodeCache;
pub use manager::{CacheManager, CachedData};
